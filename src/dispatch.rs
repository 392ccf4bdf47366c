use reqwest::header::{ACCEPT, CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};

use crate::error::UserlinkError;
use crate::types::{ApiPayload, RawPayload};

/// Per-request knobs for [`Dispatcher::dispatch`].
#[derive(Debug, Default)]
pub struct RequestOptions {
    pub json: Option<serde_json::Value>,
    pub query: Vec<(String, String)>,
    /// Bearer token for the `Authorization` header. `None` sends the
    /// request unauthenticated and lets the remote reject it.
    pub bearer: Option<String>,
}

/// Issues one HTTP call and normalizes the outcome.
///
/// Timeouts, connection pooling and TLS belong to the underlying
/// `reqwest::Client`. There is no retry logic here: every failure is
/// surfaced once to the caller.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    http: reqwest::Client,
}

impl Dispatcher {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Send the request and normalize the response.
    ///
    /// Status 200 with a JSON or plain-text content-type is parsed as
    /// JSON; a body carrying `errMsg` counts as a remote application
    /// error even though the HTTP status was 200 (an API quirk this
    /// client tolerates). Unparseable or non-JSON bodies come back as
    /// [`ApiPayload::Raw`] rather than failing.
    pub async fn dispatch(
        &self,
        method: Method,
        url: &str,
        opts: RequestOptions,
    ) -> Result<ApiPayload, UserlinkError> {
        let mut req = self
            .http
            .request(method.clone(), url)
            .header(ACCEPT, "application/json");
        if let Some(token) = &opts.bearer {
            req = req.bearer_auth(token);
        }
        if !opts.query.is_empty() {
            req = req.query(&opts.query);
        }
        if let Some(body) = &opts.json {
            req = req.json(body);
        }

        tracing::debug!(%method, url, "dispatching request");
        let resp = req
            .send()
            .await
            .map_err(|e| UserlinkError::Transport(e.to_string()))?;

        let status = resp.status();
        let content_type = header_string(resp.headers(), CONTENT_TYPE).unwrap_or_default();
        let content_disposition = header_string(resp.headers(), CONTENT_DISPOSITION);
        let body = resp.bytes().await.map_err(|e| {
            // A response arrived but its body could not be read; keep the
            // status context in the message.
            UserlinkError::Transport(format!(
                "{e}\n{} {}",
                status.as_u16(),
                reason_phrase(status)
            ))
        })?;

        normalize(status, &content_type, content_disposition, body.to_vec())
    }
}

fn header_string(
    headers: &reqwest::header::HeaderMap,
    name: reqwest::header::HeaderName,
) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn reason_phrase(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.as_u16().to_string())
}

/// Pure normalization over (status, content-type, content-disposition, body).
fn normalize(
    status: StatusCode,
    content_type: &str,
    content_disposition: Option<String>,
    body: Vec<u8>,
) -> Result<ApiPayload, UserlinkError> {
    if status != StatusCode::OK {
        return Err(UserlinkError::Status {
            code: status.as_u16(),
            reason: reason_phrase(status),
        });
    }

    if content_type.contains("application/json") || content_type.contains("text/plain") {
        if let Ok(value) = serde_json::from_slice::<serde_json::Value>(&body) {
            if let Some(err) = value.get("errMsg") {
                let message = err
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| err.to_string());
                return Err(UserlinkError::Application(message));
            }
            return Ok(ApiPayload::Json(value));
        }
    }

    Ok(ApiPayload::Raw(RawPayload {
        content_type: content_type.to_string(),
        content_disposition,
        body,
    }))
}
