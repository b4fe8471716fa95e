//! Shared types, error model, configuration, and collaborator interfaces for PersonaKit.
//!
//! This crate is the foundation depended on by all other PersonaKit crates.
//! It provides:
//! - [`PersonaKitError`], the unified error type
//! - Domain types ([`SubjectId`], [`Document`], [`HistoryEntry`], [`RunId`])
//! - Configuration ([`AppConfig`], config loading, credential lookup)
//! - The [`ContentSource`], [`Summarizer`] and [`PersistenceSink`] traits

pub mod collaborators;
pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use collaborators::{ContentSource, PersistenceSink, Summarizer};
pub use config::{
    AppConfig, DefaultsConfig, FailurePolicy, LlmConfig, RedditConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from, resolve_secret,
    validate_credentials,
};
pub use error::{PersonaKitError, Result};
pub use types::{Document, DocumentSource, HistoryEntry, RunId, SubjectId, UserContent};
