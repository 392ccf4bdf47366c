use crate::error::UserlinkError;

/// Normalized outcome of one API call.
///
/// The remote reports results either as JSON (arbitrary shape, depending
/// on the endpoint) or as a binary/raw body for download-style endpoints.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiPayload {
    /// Parsed JSON body. The shape is whatever the endpoint returned;
    /// this client does not validate it.
    Json(serde_json::Value),
    /// Anything that was not parseable JSON. The body is passed through
    /// byte-for-byte.
    Raw(RawPayload),
}

/// A non-JSON response body with the headers a caller needs to re-serve it.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPayload {
    pub content_type: String,
    pub content_disposition: Option<String>,
    pub body: Vec<u8>,
}

impl ApiPayload {
    /// The JSON value, if this payload is JSON.
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            ApiPayload::Json(value) => Some(value),
            ApiPayload::Raw(_) => None,
        }
    }

    /// Deserialize the JSON payload as a typed value.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, UserlinkError> {
        match self {
            ApiPayload::Json(value) => serde_json::from_value(value.clone())
                .map_err(|e| UserlinkError::Decode(format!("failed to deserialize response: {e}"))),
            ApiPayload::Raw(raw) => Err(UserlinkError::Decode(format!(
                "expected JSON response, got {}",
                raw.content_type
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn as_json_on_json_payload() {
        let payload = ApiPayload::Json(json!({"id": 7}));
        assert_eq!(payload.as_json().unwrap()["id"], 7);
    }

    #[test]
    fn as_json_on_raw_payload() {
        let payload = ApiPayload::Raw(RawPayload {
            content_type: "image/png".into(),
            content_disposition: None,
            body: vec![0x89, 0x50],
        });
        assert!(payload.as_json().is_none());
    }

    #[test]
    fn typed_deserialization() {
        #[derive(serde::Deserialize)]
        struct User {
            id: u64,
            name: String,
        }
        let payload = ApiPayload::Json(json!({"id": 3, "name": "wang"}));
        let user: User = payload.json().unwrap();
        assert_eq!(user.id, 3);
        assert_eq!(user.name, "wang");
    }

    #[test]
    fn typed_deserialization_of_raw_fails() {
        let payload = ApiPayload::Raw(RawPayload {
            content_type: "application/octet-stream".into(),
            content_disposition: Some("attachment".into()),
            body: vec![1, 2, 3],
        });
        let err = payload.json::<serde_json::Value>().unwrap_err();
        assert!(matches!(err, UserlinkError::Decode(_)));
        assert_eq!(err.status_code(), None);
    }

    #[test]
    fn shape_mismatch_is_a_decode_error() {
        #[derive(Debug, serde::Deserialize)]
        #[allow(dead_code)]
        struct User {
            id: u64,
        }
        let payload = ApiPayload::Json(json!({"id": "not-a-number"}));
        let err = payload.json::<User>().unwrap_err();
        assert!(matches!(err, UserlinkError::Decode(_)));
    }
}
