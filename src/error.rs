#[derive(Debug, thiserror::Error)]
pub enum UserlinkError {
    /// The request never produced a usable HTTP response (connect failure,
    /// timeout, or the body could not be read).
    #[error("{0}")]
    Transport(String),

    /// The remote answered with a non-200 status.
    #[error("{reason}")]
    Status { code: u16, reason: String },

    /// The remote answered 200 but declared an application-level error
    /// via an `errMsg` field in the JSON body.
    #[error("{0}")]
    Application(String),

    /// The operation is not available in the current client mode.
    /// No request was issued.
    #[error("permission denied")]
    PermissionDenied,

    /// A response arrived and normalized fine, but could not be converted
    /// into the type the caller asked for. Local, nothing remote declared
    /// an error.
    #[error("{0}")]
    Decode(String),
}

impl UserlinkError {
    /// Numeric code for the error, where one exists.
    ///
    /// HTTP status for `Status`, the fixed 400 the remote API uses for
    /// `errMsg` responses, 403 for mode gating. Transport failures carry
    /// no code.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            UserlinkError::Transport(_) => None,
            UserlinkError::Status { code, .. } => Some(*code),
            UserlinkError::Application(_) => Some(400),
            UserlinkError::PermissionDenied => Some(403),
            UserlinkError::Decode(_) => None,
        }
    }

    /// Error code string for structured logging.
    pub fn code(&self) -> &'static str {
        match self {
            UserlinkError::Transport(_) => "transport_error",
            UserlinkError::Status { .. } => "remote_status",
            UserlinkError::Application(_) => "remote_application",
            UserlinkError::PermissionDenied => "permission_denied",
            UserlinkError::Decode(_) => "decode_error",
        }
    }
}
