//! GCP Authentication
//!
//! Access tokens for the Cloud DNS API, minted from a service account key
//! given in the provider's config block.

use crate::error::BoxError;
use async_trait::async_trait;
use gcp_auth::{CustomServiceAccount, TokenProvider};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Read-only scope is enough to list zones and record sets
pub const DNS_SCOPES: &[&str] = &["https://www.googleapis.com/auth/ndev.clouddns.readonly"];

/// Token expiry buffer - refresh tokens this much before they actually expire
const TOKEN_EXPIRY_BUFFER: Duration = Duration::from_secs(60);

/// Default token TTL if we can't determine expiry (conservative: 30 minutes)
const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(30 * 60);

/// Source of bearer tokens for API calls
#[async_trait]
pub trait AccessToken: Send + Sync {
    async fn access_token(&self) -> Result<String, BoxError>;
}

/// Fixed token, for pre-minted credentials and tests
#[derive(Clone)]
pub struct StaticToken(pub String);

#[async_trait]
impl AccessToken for StaticToken {
    async fn access_token(&self) -> Result<String, BoxError> {
        Ok(self.0.clone())
    }
}

/// Service account credentials with token caching
#[derive(Clone)]
pub struct ServiceAccountCredentials {
    provider: Arc<dyn TokenProvider>,
    token_cache: Arc<RwLock<Option<CachedToken>>>,
}

#[derive(Clone)]
struct CachedToken {
    token: String,
    /// When this token expires (with buffer applied)
    expires_at: Instant,
}

impl CachedToken {
    fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

impl ServiceAccountCredentials {
    /// Parse a service account key (JSON)
    pub fn from_json(key: &str) -> Result<Self, gcp_auth::Error> {
        let account = CustomServiceAccount::from_json(key)?;

        Ok(Self {
            provider: Arc::new(account),
            token_cache: Arc::new(RwLock::new(None)),
        })
    }
}

#[async_trait]
impl AccessToken for ServiceAccountCredentials {
    async fn access_token(&self) -> Result<String, BoxError> {
        {
            let cache = self.token_cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.is_valid() {
                    return Ok(cached.token.clone());
                }
                tracing::debug!("Cached token expired, fetching new token");
            }
        }

        let token = self.provider.token(DNS_SCOPES).await?;
        let token_str = token.as_str().to_string();

        let expires_at = Instant::now() + DEFAULT_TOKEN_TTL - TOKEN_EXPIRY_BUFFER;
        {
            let mut cache = self.token_cache.write().await;
            *cache = Some(CachedToken {
                token: token_str.clone(),
                expires_at,
            });
        }

        Ok(token_str)
    }
}

/// `project_id` field of a service account key, if present
pub fn key_project_id(key: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(key).ok()?;
    value
        .get("project_id")
        .and_then(|v| v.as_str())
        .filter(|p| !p.is_empty())
        .map(str::to_string)
}
