//! Reddit content source.
//!
//! Authenticates with an application-only OAuth token (client-credentials
//! grant) and reads a user's newest submissions and comments from the
//! authenticated API. Submissions are rendered as `Title: …\nBody: …`;
//! comments are their raw body text.

mod listing;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use personakit_shared::{
    ContentSource, PersonaKitError, RedditConfig, Result, SubjectId, UserContent, resolve_secret,
};

use listing::{Comment, Listing, Submission, TokenResponse};

/// Refresh the token this long before Reddit says it expires.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Cache lifetime used when the advertised one cannot be represented.
const FALLBACK_LIFETIME: Duration = Duration::from_secs(3600);

struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// OAuth client credentials.
#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// [`ContentSource`] backed by the Reddit API.
pub struct RedditSource {
    client: Client,
    credentials: Credentials,
    auth_url: String,
    api_url: String,
    token: Mutex<Option<CachedToken>>,
}

impl RedditSource {
    /// Build a source, reading credentials from the env vars `config` names.
    pub fn from_config(config: &RedditConfig) -> Result<Self> {
        let credentials = Credentials {
            client_id: resolve_secret(&config.client_id_env)?,
            client_secret: resolve_secret(&config.client_secret_env)?,
        };
        Self::new(config, credentials)
    }

    pub fn new(config: &RedditConfig, credentials: Credentials) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PersonaKitError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            credentials,
            auth_url: config.auth_url.clone(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token: Mutex::new(None),
        })
    }

    /// Return a valid bearer token, requesting a new one when the cached
    /// token is missing or about to expire.
    async fn access_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.expires_at > Instant::now()) {
            return Ok(token.value.clone());
        }

        debug!(auth_url = %self.auth_url, "requesting access token");
        let response = self
            .client
            .post(&self.auth_url)
            .basic_auth(&self.credentials.client_id, Some(&self.credentials.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| PersonaKitError::Network(format!("{}: {e}", self.auth_url)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PersonaKitError::Source(format!(
                "authentication failed: HTTP {status}"
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| PersonaKitError::Source(format!("malformed token response: {e}")))?;

        let now = Instant::now();
        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(EXPIRY_MARGIN);
        let expires_at = now.checked_add(lifetime).unwrap_or_else(|| {
            warn!(expires_in = token.expires_in, "token lifetime out of range, using fallback");
            now + FALLBACK_LIFETIME
        });
        let value = token.access_token;
        *cached = Some(CachedToken {
            value: value.clone(),
            expires_at,
        });
        Ok(value)
    }

    async fn listing<T: DeserializeOwned>(
        &self,
        token: &str,
        subject: &SubjectId,
        kind: &str,
        limit: u32,
    ) -> Result<Vec<T>> {
        let url = format!("{}/user/{}/{kind}", self.api_url, subject.as_str());
        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .query(&[("limit", limit.to_string()), ("sort", "new".to_string())])
            .send()
            .await
            .map_err(|e| PersonaKitError::Network(format!("{url}: {e}")))?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND => {
                return Err(PersonaKitError::Source(format!(
                    "Reddit user '{subject}' not found"
                )));
            }
            status => {
                return Err(PersonaKitError::Source(format!("{url}: HTTP {status}")));
            }
        }

        let listing: Listing<T> = response
            .json()
            .await
            .map_err(|e| PersonaKitError::Source(format!("{url}: malformed listing: {e}")))?;
        Ok(listing.into_items().collect())
    }
}

#[async_trait]
impl ContentSource for RedditSource {
    #[instrument(skip_all, fields(subject = %subject, limit = limit))]
    async fn fetch(&self, subject: &SubjectId, limit: u32) -> Result<UserContent> {
        let token = self.access_token().await?;

        let (submissions, comments) = tokio::try_join!(
            self.listing::<Submission>(&token, subject, "submitted", limit),
            self.listing::<Comment>(&token, subject, "comments", limit),
        )?;

        let content = UserContent {
            posts: submissions.iter().map(Submission::render).collect(),
            comments: comments.into_iter().map(|c| c.body).collect(),
        };

        info!(
            posts = content.posts.len(),
            comments = content.comments.len(),
            "fetched Reddit activity"
        );
        Ok(content)
    }
}
