use std::sync::Arc;
use std::time::Duration;

use reqwest::header::ACCEPT;
use serde::Deserialize;
use serde_json::json;

use crate::config::{Credentials, RefreshTokenPolicy};
use crate::error::UserlinkError;
use crate::store::{client_token_key, user_refresh_key, user_token_key, TokenStore};

/// Raw response from the token endpoints.
///
/// A declined grant still comes back as HTTP 200, with `errMsg` set and
/// no `access_token`.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
    refresh_token: Option<String>,
    #[serde(rename = "errMsg")]
    err_msg: Option<String>,
}

/// Guarantees a valid bearer token for a given purpose, with the injected
/// store as source of truth and the remote token endpoint as fallback.
pub struct TokenProvider {
    credentials: Credentials,
    store: Arc<dyn TokenStore>,
    http: reqwest::Client,
    refresh_policy: RefreshTokenPolicy,
    // Serializes token acquisition so concurrent cold-cache callers issue
    // one endpoint call; losers re-check the store after acquiring.
    acquire_guard: tokio::sync::Mutex<()>,
}

impl TokenProvider {
    pub fn new(
        credentials: Credentials,
        store: Arc<dyn TokenStore>,
        http: reqwest::Client,
        refresh_policy: RefreshTokenPolicy,
    ) -> Self {
        Self {
            credentials,
            store,
            http,
            refresh_policy,
            acquire_guard: tokio::sync::Mutex::new(()),
        }
    }

    /// Return the machine-to-machine access token, minting one via the
    /// `client_credentials` grant on a cache miss.
    ///
    /// `Ok(None)` means the issuer answered but declined the grant;
    /// `Err` means the endpoint could not be reached or misbehaved.
    /// Callers decide whether to fail fast or proceed unauthenticated.
    /// A response without `expires_in` is returned but not cached.
    pub async fn ensure_client_token(&self) -> Result<Option<String>, UserlinkError> {
        let key = client_token_key(&self.credentials.app_id);
        if let Some(token) = self.store.get(&key).await {
            return Ok(Some(token));
        }

        let _guard = self.acquire_guard.lock().await;
        if let Some(token) = self.store.get(&key).await {
            return Ok(Some(token));
        }

        let body = json!({
            "grant_type": "client_credentials",
            "client_id": self.credentials.app_id,
            "client_secret": self.credentials.app_secret,
            "scope": "",
        });
        let resp = self.token_request("/auth/accessToken", &body).await?;
        match resp.access_token {
            Some(token) => {
                if let Some(secs) = resp.expires_in {
                    self.store
                        .put(&key, &token, Duration::from_secs(secs))
                        .await;
                    tracing::debug!(%key, ttl = secs, "cached client access token");
                }
                Ok(Some(token))
            }
            None => {
                tracing::warn!(
                    err_msg = resp.err_msg.as_deref().unwrap_or(""),
                    "client-credentials grant declined"
                );
                Ok(None)
            }
        }
    }

    /// Return the end-user access token for the authorization-code flow.
    ///
    /// Order of precedence: cached access token, then a refresh-token
    /// grant if one is cached, then the authorization-code exchange with
    /// the supplied `code` and `redirect_uri`. Tokens are cached with
    /// TTL equal to the issuer's `expires_in`; a response without one is
    /// treated as uncacheable.
    pub async fn ensure_user_token(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<Option<String>, UserlinkError> {
        let key = user_token_key(&self.credentials.app_id);
        if let Some(token) = self.store.get(&key).await {
            return Ok(Some(token));
        }

        let _guard = self.acquire_guard.lock().await;
        if let Some(token) = self.store.get(&key).await {
            return Ok(Some(token));
        }

        let refresh_key = user_refresh_key(&self.credentials.app_id);
        let cached_refresh = self.store.get(&refresh_key).await;
        let resp = match &cached_refresh {
            Some(refresh_token) => {
                let body = json!({
                    "grant_type": "refresh_token",
                    "refresh_token": refresh_token,
                    "client_id": self.credentials.app_id,
                    "client_secret": self.credentials.app_secret,
                });
                self.token_request("/auth/refreshAccessToken", &body).await?
            }
            None => {
                let body = json!({
                    "grant_type": "authorization_code",
                    "code": code,
                    "redirect_uri": redirect_uri,
                    "client_id": self.credentials.app_id,
                    "client_secret": self.credentials.app_secret,
                });
                self.token_request("/auth/accessToken", &body).await?
            }
        };

        match resp.access_token {
            Some(token) => {
                // A grant without expires_in carries no TTL to trust; such a
                // response is handed back but cached nowhere, refresh token
                // included.
                if let Some(secs) = resp.expires_in {
                    let ttl = Duration::from_secs(secs);
                    self.store.put(&key, &token, ttl).await;
                    if let Some(new_refresh) = &resp.refresh_token {
                        self.store.put(&refresh_key, new_refresh, ttl).await;
                    }
                }
                if resp.refresh_token.is_none()
                    && self.refresh_policy == RefreshTokenPolicy::AlwaysOverwrite
                {
                    self.store.delete(&refresh_key).await;
                }
                Ok(Some(token))
            }
            None => {
                if cached_refresh.is_some() {
                    // The issuer rejected the cached refresh token; drop it
                    // so the next attempt runs the code exchange.
                    self.store.delete(&refresh_key).await;
                }
                tracing::warn!(
                    err_msg = resp.err_msg.as_deref().unwrap_or(""),
                    "user token grant declined"
                );
                Ok(None)
            }
        }
    }

    async fn token_request(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<TokenResponse, UserlinkError> {
        let url = format!("{}{}", self.credentials.oauth_base_url, path);
        let resp = self
            .http
            .post(&url)
            .header(ACCEPT, "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| UserlinkError::Transport(e.to_string()))?;

        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            return Err(UserlinkError::Status {
                code: status.as_u16(),
                reason: status
                    .canonical_reason()
                    .map(str::to_string)
                    .unwrap_or_else(|| status.as_u16().to_string()),
            });
        }

        resp.json::<TokenResponse>()
            .await
            .map_err(|e| UserlinkError::Transport(format!("failed to parse token response: {e}")))
    }
}
