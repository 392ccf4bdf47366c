use std::sync::Arc;

use reqwest::Method;
use serde_json::json;

use crate::config::{ClientMode, Credentials, RefreshTokenPolicy};
use crate::dispatch::{Dispatcher, RequestOptions};
use crate::error::UserlinkError;
use crate::oauth::{Authorizer, TokenProvider};
use crate::store::TokenStore;
use crate::types::ApiPayload;

/// Client for the remote user-service API.
///
/// Owns a [`TokenProvider`] over the injected store and a [`Dispatcher`]
/// sharing one `reqwest::Client`. Every domain operation ensures a client
/// bearer token first, then dispatches; a failed token acquisition is
/// logged and the request proceeds unauthenticated, so the remote 401/403
/// surfaces as an ordinary status error.
pub struct UserClient {
    credentials: Credentials,
    mode: ClientMode,
    store: Arc<dyn TokenStore>,
    dispatcher: Dispatcher,
    tokens: TokenProvider,
}

impl UserClient {
    /// Full-capability client with the default refresh-token policy.
    pub fn new(credentials: Credentials, store: Arc<dyn TokenStore>) -> Self {
        Self::with_options(
            credentials,
            store,
            ClientMode::Full,
            RefreshTokenPolicy::default(),
        )
    }

    /// Restricted deployment: member tagging and direct login are gated.
    pub fn restricted(credentials: Credentials, store: Arc<dyn TokenStore>) -> Self {
        Self::with_options(
            credentials,
            store,
            ClientMode::Restricted,
            RefreshTokenPolicy::default(),
        )
    }

    pub fn with_options(
        credentials: Credentials,
        store: Arc<dyn TokenStore>,
        mode: ClientMode,
        refresh_policy: RefreshTokenPolicy,
    ) -> Self {
        let http = reqwest::Client::new();
        let tokens = TokenProvider::new(
            credentials.clone(),
            store.clone(),
            http.clone(),
            refresh_policy,
        );
        Self {
            credentials,
            mode,
            store,
            dispatcher: Dispatcher::new(http),
            tokens,
        }
    }

    /// Authorize-redirect builder sharing this client's store.
    pub fn authorizer(&self) -> Authorizer {
        Authorizer::new(self.credentials.clone(), self.store.clone())
    }

    /// Exchange an authorization code (or cached refresh token) for the
    /// end-user access token. Gated in restricted mode.
    pub async fn user_token(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<Option<String>, UserlinkError> {
        if self.mode == ClientMode::Restricted {
            return Err(UserlinkError::PermissionDenied);
        }
        self.tokens.ensure_user_token(code, redirect_uri).await
    }

    /// Create a user record.
    pub async fn add_user(&self, data: &serde_json::Value) -> Result<ApiPayload, UserlinkError> {
        self.call(Method::POST, "user", Some(data.clone()), Vec::new())
            .await
    }

    /// Update fields of an existing user.
    pub async fn update_user(
        &self,
        uid: u64,
        data: &serde_json::Value,
    ) -> Result<ApiPayload, UserlinkError> {
        self.call(
            Method::PUT,
            &format!("user/{uid}"),
            Some(data.clone()),
            Vec::new(),
        )
        .await
    }

    /// Fetch several users by id.
    pub async fn get_users(&self, uids: &[u64]) -> Result<ApiPayload, UserlinkError> {
        self.call(
            Method::POST,
            "user/get",
            Some(json!({ "uid": uids })),
            Vec::new(),
        )
        .await
    }

    /// Fetch one user by id.
    pub async fn get_user(&self, uid: u64) -> Result<ApiPayload, UserlinkError> {
        self.call(Method::GET, &format!("user/get/{uid}"), None, Vec::new())
            .await
    }

    /// Keyword search with paging.
    pub async fn search_users(
        &self,
        keyword: &str,
        page: u32,
    ) -> Result<ApiPayload, UserlinkError> {
        let query = vec![
            ("q".to_string(), keyword.to_string()),
            ("page".to_string(), page.to_string()),
        ];
        self.call(Method::GET, "user/search", None, query).await
    }

    /// Push a message to a set of users.
    pub async fn send_message(
        &self,
        users: &[u64],
        data: &serde_json::Value,
    ) -> Result<ApiPayload, UserlinkError> {
        self.call(
            Method::POST,
            "user/sendMsg",
            Some(json!({ "users": users, "data": data })),
            Vec::new(),
        )
        .await
    }

    /// Attach a tag to a member. Gated in restricted mode.
    pub async fn tag_members(&self, uid: u64, tag_id: u64) -> Result<ApiPayload, UserlinkError> {
        if self.mode == ClientMode::Restricted {
            return Err(UserlinkError::PermissionDenied);
        }
        self.call(
            Method::PATCH,
            "user/tag",
            Some(json!({ "uid": uid, "tagId": tag_id })),
            Vec::new(),
        )
        .await
    }

    /// Remove a tag from a member. Gated in restricted mode.
    pub async fn untag_members(&self, uid: u64, tag_id: u64) -> Result<ApiPayload, UserlinkError> {
        if self.mode == ClientMode::Restricted {
            return Err(UserlinkError::PermissionDenied);
        }
        self.call(
            Method::DELETE,
            "user/tag",
            Some(json!({ "uid": uid, "tagId": tag_id })),
            Vec::new(),
        )
        .await
    }

    /// Fetch the profile behind a user token obtained from the
    /// authorization-code flow.
    pub async fn oauth_userinfo(&self, user_token: &str) -> Result<ApiPayload, UserlinkError> {
        self.dispatcher
            .dispatch(
                Method::GET,
                &self.api_url("user"),
                RequestOptions {
                    bearer: Some(user_token.to_string()),
                    ..Default::default()
                },
            )
            .await
    }

    /// Update the profile behind a user token.
    pub async fn update_oauth_user(
        &self,
        user_token: &str,
        data: &serde_json::Value,
    ) -> Result<ApiPayload, UserlinkError> {
        self.dispatcher
            .dispatch(
                Method::PATCH,
                &self.api_url("user"),
                RequestOptions {
                    json: Some(data.clone()),
                    bearer: Some(user_token.to_string()),
                    ..Default::default()
                },
            )
            .await
    }

    async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
        query: Vec<(String, String)>,
    ) -> Result<ApiPayload, UserlinkError> {
        let bearer = self.client_bearer().await;
        self.dispatcher
            .dispatch(
                method,
                &self.api_url(path),
                RequestOptions {
                    json: body,
                    query,
                    bearer,
                },
            )
            .await
    }

    /// Best-effort client token. Acquisition failures are logged and the
    /// request goes out unauthenticated; the remote rejection is the
    /// error the caller sees.
    async fn client_bearer(&self) -> Option<String> {
        match self.tokens.ensure_client_token().await {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(error = %e, "client token unavailable, sending unauthenticated");
                None
            }
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/{}", self.credentials.api_base_url, path)
    }
}
