//! Application configuration for PersonaKit.
//!
//! User config lives at `~/.personakit/personakit.toml`.
//! CLI flags override config file values, which override defaults.
//! Secrets are never stored in the file; it only names the environment
//! variables that hold them.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PersonaKitError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "personakit.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".personakit";

// ---------------------------------------------------------------------------
// Config structs (matching personakit.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Language model settings.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Reddit API settings.
    #[serde(default)]
    pub reddit: RedditConfig,
}

/// What the orchestrator does once a stage has recorded an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Run every remaining stage regardless of recorded errors.
    #[default]
    Continue,
    /// Stop after the first stage whose update sets the error descriptor.
    #[serde(alias = "halt")]
    HaltOnError,
}

impl std::str::FromStr for FailurePolicy {
    type Err = PersonaKitError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "continue" => Ok(Self::Continue),
            "halt" | "halt-on-error" => Ok(Self::HaltOnError),
            other => Err(PersonaKitError::config(format!(
                "unknown failure policy '{other}': expected 'continue' or 'halt'"
            ))),
        }
    }
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Directory persona files are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Number of posts and of comments requested from the content source.
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: u32,

    /// Pipeline behavior after a stage records an error.
    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            fetch_limit: default_fetch_limit(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

fn default_output_dir() -> String {
    "outputs".into()
}
fn default_fetch_limit() -> u32 {
    10
}

/// `[llm]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_llm_key_env")]
    pub api_key_env: String,

    /// Base URL of the OpenAI-compatible API.
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout in seconds.
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,

    /// Character budget for the joined posts/comments inside a prompt.
    #[serde(default = "default_max_prompt_chars")]
    pub max_prompt_chars: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_llm_key_env(),
            base_url: default_llm_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            timeout_secs: default_llm_timeout(),
            max_prompt_chars: default_max_prompt_chars(),
        }
    }
}

fn default_llm_key_env() -> String {
    "GROQ_API_KEY".into()
}
fn default_llm_base_url() -> String {
    "https://api.groq.com/openai/v1".into()
}
fn default_model() -> String {
    "meta-llama/llama-4-scout-17b-16e-instruct".into()
}
fn default_temperature() -> f32 {
    0.3
}
fn default_llm_timeout() -> u64 {
    60
}
fn default_max_prompt_chars() -> usize {
    2000
}

/// `[reddit]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditConfig {
    /// Env var holding the OAuth client id.
    #[serde(default = "default_client_id_env")]
    pub client_id_env: String,

    /// Env var holding the OAuth client secret.
    #[serde(default = "default_client_secret_env")]
    pub client_secret_env: String,

    /// User-Agent sent with every request (Reddit rejects generic agents).
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Token endpoint for the client-credentials grant.
    #[serde(default = "default_auth_url")]
    pub auth_url: String,

    /// Base URL of the authenticated API.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_reddit_timeout")]
    pub timeout_secs: u64,
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            client_id_env: default_client_id_env(),
            client_secret_env: default_client_secret_env(),
            user_agent: default_user_agent(),
            auth_url: default_auth_url(),
            api_url: default_api_url(),
            timeout_secs: default_reddit_timeout(),
        }
    }
}

fn default_client_id_env() -> String {
    "REDDIT_CLIENT_ID".into()
}
fn default_client_secret_env() -> String {
    "REDDIT_CLIENT_SECRET".into()
}
fn default_user_agent() -> String {
    concat!("personakit/", env!("CARGO_PKG_VERSION")).into()
}
fn default_auth_url() -> String {
    "https://www.reddit.com/api/v1/access_token".into()
}
fn default_api_url() -> String {
    "https://oauth.reddit.com".into()
}
fn default_reddit_timeout() -> u64 {
    30
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.personakit/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| PersonaKitError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.personakit/personakit.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| PersonaKitError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        PersonaKitError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| PersonaKitError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| PersonaKitError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| PersonaKitError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read a secret from the named environment variable.
pub fn resolve_secret(var_name: &str) -> Result<String> {
    match std::env::var(var_name) {
        Ok(val) if !val.trim().is_empty() => Ok(val),
        _ => Err(PersonaKitError::config(format!(
            "credential not found. Set the {var_name} environment variable."
        ))),
    }
}

/// Check that every credential the pipeline needs is present in the environment.
pub fn validate_credentials(config: &AppConfig) -> Result<()> {
    for var in [
        &config.llm.api_key_env,
        &config.reddit.client_id_env,
        &config.reddit.client_secret_env,
    ] {
        resolve_secret(var)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("output_dir"));
        assert!(toml_str.contains("GROQ_API_KEY"));
        assert!(toml_str.contains("failure_policy = \"continue\""));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.defaults.fetch_limit, 10);
        assert_eq!(parsed.llm.max_prompt_chars, 2000);
        assert_eq!(parsed.reddit.client_id_env, "REDDIT_CLIENT_ID");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let toml_str = r#"
[defaults]
output_dir = "/tmp/personas"
failure_policy = "halt"

[llm]
model = "llama-3.1-8b-instant"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.defaults.output_dir, "/tmp/personas");
        assert_eq!(config.defaults.failure_policy, FailurePolicy::HaltOnError);
        assert_eq!(config.defaults.fetch_limit, 10);
        assert_eq!(config.llm.model, "llama-3.1-8b-instant");
        assert_eq!(config.llm.api_key_env, "GROQ_API_KEY");
    }

    #[test]
    fn failure_policy_from_str() {
        assert_eq!("continue".parse::<FailurePolicy>().unwrap(), FailurePolicy::Continue);
        assert_eq!("halt".parse::<FailurePolicy>().unwrap(), FailurePolicy::HaltOnError);
        assert!("abort".parse::<FailurePolicy>().is_err());
    }

    #[test]
    fn credential_validation() {
        let mut config = AppConfig::default();
        // Use a unique env var name to avoid interfering with other tests
        config.llm.api_key_env = "PK_TEST_NONEXISTENT_KEY_12345".into();
        let result = validate_credentials(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("PK_TEST_NONEXISTENT_KEY_12345"));
    }

    #[test]
    fn load_from_file_and_report_bad_toml() {
        let tmp = tempfile::tempdir().unwrap();
        let good = tmp.path().join("personakit.toml");
        std::fs::write(&good, "[defaults]\nfetch_limit = 3\n").unwrap();
        assert_eq!(load_config_from(&good).unwrap().defaults.fetch_limit, 3);

        let bad = tmp.path().join("broken.toml");
        std::fs::write(&bad, "[defaults\n").unwrap();
        let err = load_config_from(&bad).unwrap_err();
        assert!(matches!(err, PersonaKitError::Config { .. }));

        let missing = load_config_from(&tmp.path().join("absent.toml")).unwrap_err();
        assert!(matches!(missing, PersonaKitError::Io { .. }));
    }
}
