use serde::{Deserialize, Serialize};

/// Immutable credentials and endpoints for one remote application.
///
/// `oauth_base_url` is where tokens are minted (`/auth/accessToken` etc.);
/// `api_base_url` is the user-service API root the domain operations hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub app_id: String,
    pub app_secret: String,
    pub oauth_base_url: String,
    pub api_base_url: String,
}

impl Credentials {
    pub fn new(
        app_id: impl Into<String>,
        app_secret: impl Into<String>,
        oauth_base_url: &str,
        api_base_url: &str,
    ) -> Self {
        Self {
            app_id: app_id.into(),
            app_secret: app_secret.into(),
            oauth_base_url: oauth_base_url.trim_end_matches('/').to_string(),
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
        }
    }
}

/// Deployment mode of the client.
///
/// `Restricted` deployments may not tag/untag members or run the direct
/// user-login exchange; those calls are rejected locally with
/// [`UserlinkError::PermissionDenied`](crate::UserlinkError::PermissionDenied)
/// and no request is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClientMode {
    #[default]
    Full,
    Restricted,
}

/// What to do with the cached refresh token when a refresh-grant response
/// does not include a new one.
///
/// Issuer revisions differ on whether a refresh response echoes the
/// refresh token back, so the policy is explicit rather than guessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshTokenPolicy {
    /// Keep the previously cached refresh token when the response omits one.
    #[default]
    KeepExistingIfAbsent,
    /// Mirror the response exactly: a response without a refresh token
    /// drops the cached one.
    AlwaysOverwrite,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_urls_are_normalized() {
        let creds = Credentials::new(
            "app1",
            "secret",
            "https://oauth.example.com/",
            "https://api.example.com/v1///",
        );
        assert_eq!(creds.oauth_base_url, "https://oauth.example.com");
        assert_eq!(creds.api_base_url, "https://api.example.com/v1");
    }

    #[test]
    fn default_mode_is_full() {
        assert_eq!(ClientMode::default(), ClientMode::Full);
    }

    #[test]
    fn default_refresh_policy_keeps_existing() {
        assert_eq!(
            RefreshTokenPolicy::default(),
            RefreshTokenPolicy::KeepExistingIfAbsent
        );
    }
}
