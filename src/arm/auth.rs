//! AAD client-credentials authentication for the ARM control plane
//!
//! Fetches bearer tokens from the tenant's token endpoint and caches them
//! in-process until shortly before expiry. Missing credentials are not
//! validated up front; they surface here as an authentication error the
//! first time a token is needed.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tokio::sync::RwLock;
use tracing::debug;

use crate::arm::error::ArmError;
use crate::arm::models::{TokenErrorResponse, TokenResponse};
use crate::config::AzureCredentials;

/// Public-cloud AAD endpoint; sovereign clouds use a different authority
pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com";

/// Assumed token lifetime when the endpoint omits `expires_in`
const DEFAULT_TOKEN_EXPIRY_SECS: u64 = 3600;

/// Refresh this many seconds before the reported expiry
const TOKEN_EXPIRY_SAFETY_MARGIN_SECS: u64 = 60;

/// Cached bearer-token source for management requests
pub struct TokenProvider {
    http: reqwest::Client,
    credentials: AzureCredentials,
    authority: String,
    scope: String,
    cache: RwLock<Option<CachedToken>>,
}

struct CachedToken {
    token: String,
    expires_at: Instant,
}

impl TokenProvider {
    /// Create a provider for the given credentials.
    ///
    /// `authority` is the AAD base URL and `management_endpoint` determines
    /// the requested scope (`{endpoint}/.default`).
    pub fn new(
        http: reqwest::Client,
        credentials: AzureCredentials,
        authority: &str,
        management_endpoint: &str,
    ) -> Self {
        Self {
            http,
            credentials,
            authority: authority.trim_end_matches('/').to_string(),
            scope: format!("{}/.default", management_endpoint.trim_end_matches('/')),
            cache: RwLock::new(None),
        }
    }

    /// Get a bearer token, reusing the cached one while it is still fresh.
    pub async fn bearer_token(&self) -> Result<String> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.expires_at > Instant::now() {
                    return Ok(cached.token.clone());
                }
            }
        }

        let mut cache = self.cache.write().await;
        // Another task may have refreshed while we waited for the write lock
        if let Some(cached) = cache.as_ref() {
            if cached.expires_at > Instant::now() {
                return Ok(cached.token.clone());
            }
        }

        let response = self.request_token().await?;
        let expires_in = response.expires_in.unwrap_or(DEFAULT_TOKEN_EXPIRY_SECS);
        let expires_at = Instant::now()
            + Duration::from_secs(expires_in.saturating_sub(TOKEN_EXPIRY_SAFETY_MARGIN_SECS));
        debug!(expires_in, "Acquired management token");

        let token = response.access_token;
        *cache = Some(CachedToken {
            token: token.clone(),
            expires_at,
        });
        Ok(token)
    }

    async fn request_token(&self) -> Result<TokenResponse> {
        let (Some(client_id), Some(client_secret), Some(tenant_id)) = (
            self.credentials.client_id.as_deref(),
            self.credentials.client_secret.as_deref(),
            self.credentials.tenant_id.as_deref(),
        ) else {
            return Err(ArmError::Auth {
                message: "AZURE_CLIENT_ID, AZURE_CLIENT_SECRET, and AZURE_TENANT_ID must all be set"
                    .to_string(),
            }
            .into());
        };

        let url = format!("{}/{}/oauth2/v2.0/token", self.authority, tenant_id);
        let response = self
            .http
            .post(&url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("scope", self.scope.as_str()),
            ])
            .send()
            .await
            .context("Failed to reach the token endpoint")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<TokenErrorResponse>(&body) {
                Ok(detail) => format!(
                    "token endpoint returned {}: {} ({})",
                    status.as_u16(),
                    detail.error.as_deref().unwrap_or("unknown error"),
                    detail
                        .error_description
                        .as_deref()
                        .unwrap_or("no description")
                ),
                Err(_) => format!("token endpoint returned {}", status.as_u16()),
            };
            return Err(ArmError::Auth { message }.into());
        }

        response
            .json::<TokenResponse>()
            .await
            .context("Failed to decode token response")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_credentials_fail_before_any_request() {
        let provider = TokenProvider::new(
            reqwest::Client::new(),
            AzureCredentials::default(),
            DEFAULT_AUTHORITY,
            "https://management.azure.com",
        );

        let err = provider.bearer_token().await.unwrap_err();
        let auth = err
            .chain()
            .find_map(|cause| cause.downcast_ref::<ArmError>())
            .unwrap_or_else(|| panic!("expected an ArmError, got: {err:?}"));
        assert!(auth.is_auth());
    }

    #[test]
    fn scope_derived_from_management_endpoint() {
        let provider = TokenProvider::new(
            reqwest::Client::new(),
            AzureCredentials::default(),
            "https://login.microsoftonline.com/",
            "https://management.azure.com/",
        );
        assert_eq!(provider.scope, "https://management.azure.com/.default");
        assert_eq!(provider.authority, "https://login.microsoftonline.com");
    }
}
