//! PersonaKit CLI: build a user persona from a Reddit profile.
//!
//! Fetches the user's recent posts and comments, asks a language model to
//! summarize them, and saves the persona as a text file.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
