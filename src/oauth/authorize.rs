use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::config::Credentials;
use crate::store::TokenStore;

/// Lifetime of a state nonce awaiting its callback.
const STATE_TTL: Duration = Duration::from_secs(300);
/// Marker value stored under the nonce key.
const STATE_VALUE: &str = "state";

/// Redirect response the caller should serve to start the
/// authorization-code flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizeRedirect {
    /// Always 301; the callback handler lives at the same path that
    /// initiated the flow.
    pub status: u16,
    pub location: String,
    /// The state bound to this request, for callers that verify the
    /// callback themselves.
    pub state: String,
}

/// Builds authorize-redirect URLs and verifies returning state nonces.
pub struct Authorizer {
    credentials: Credentials,
    store: Arc<dyn TokenStore>,
}

impl Authorizer {
    pub fn new(credentials: Credentials, store: Arc<dyn TokenStore>) -> Self {
        Self { credentials, store }
    }

    /// Build the redirect that sends the user to the authorize endpoint.
    ///
    /// `scheme`, `host` and `path` describe the request the redirect
    /// handler received; the same path doubles as the callback target,
    /// so `redirect_uri` is `{scheme}://{host}{path}`. When `state` is
    /// `None` a fresh nonce is generated and stored with a 300 s TTL;
    /// a caller-supplied value is passed through untouched (for callers
    /// running their own CSRF bookkeeping).
    pub async fn build_authorize_redirect(
        &self,
        scheme: &str,
        host: &str,
        path: &str,
        scope: &str,
        state: Option<&str>,
    ) -> AuthorizeRedirect {
        let redirect_uri = format!("{scheme}://{host}{path}");
        let state = match state {
            Some(s) => s.to_string(),
            None => {
                let nonce = generate_state_nonce();
                self.store.put(&nonce, STATE_VALUE, STATE_TTL).await;
                nonce
            }
        };
        let location = format!(
            "{}/auth/authorize?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}",
            self.credentials.oauth_base_url,
            self.credentials.app_id,
            urlencoded(&redirect_uri),
            scope,
            state,
        );
        AuthorizeRedirect {
            status: 301,
            location,
            state,
        }
    }

    /// Consume a state nonce returned on the callback.
    ///
    /// True iff the nonce was issued here and is still live. The entry is
    /// deleted on sight, so a nonce verifies at most once.
    pub async fn verify_state(&self, state: &str) -> bool {
        match self.store.get(state).await {
            Some(value) => {
                self.store.delete(state).await;
                value == STATE_VALUE
            }
            None => false,
        }
    }
}

fn generate_state_nonce() -> String {
    let mut buf = [0u8; 24];
    rand::Rng::fill_bytes(&mut rand::rng(), &mut buf);
    URL_SAFE_NO_PAD.encode(buf)
}

fn urlencoded(s: &str) -> String {
    let mut result = String::with_capacity(s.len() * 2);
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                result.push(b as char);
            }
            _ => {
                result.push('%');
                result.push_str(&format!("{b:02X}"));
            }
        }
    }
    result
}
