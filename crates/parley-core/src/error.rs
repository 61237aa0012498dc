use thiserror::Error;

/// A convenience `Result` alias using [`ParleyError`].
pub type ParleyResult<T> = Result<T, ParleyError>;

/// Top-level error type for the Parley conversation engine.
///
/// Each variant corresponds to a failure class a caller may want to surface
/// differently. None of them leave a session in an unusable state.
#[derive(Error, Debug)]
pub enum ParleyError {
    /// A send was attempted while the duplex link was not open. The payload
    /// was dropped, not queued.
    #[error("Transport unavailable: {0}")]
    TransportUnavailable(String),

    /// A request/reply exchange with the assistant service failed.
    #[error("Exchange error: {0}")]
    Exchange(String),

    /// An attachment upload failed.
    #[error("Upload error: {0}")]
    Upload(String),

    /// The contact directory could not be read.
    #[error("Directory error: {0}")]
    Directory(String),

    /// A message could not be put on the wire.
    #[error("Codec error: {0}")]
    Codec(String),

    /// The credential was missing, malformed or refused by a service.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Configuration could not be loaded or failed validation.
    #[error("Config error: {0}")]
    Config(String),

    /// An operation needed a selected conversation target.
    #[error("No active conversation")]
    NoActiveConversation,

    /// Transport-level HTTP failure (connect, timeout, bad status).
    #[error("HTTP error: {0}")]
    Http(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Credential failures.
///
/// Navigation (e.g. back to a login screen) is up to whoever sees this error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No bearer token was available.
    #[error("no credential available")]
    MissingToken,

    /// The token could not be decoded into an identity.
    #[error("malformed token: {0}")]
    MalformedToken(String),

    /// A service answered 401 or 403.
    #[error("credential rejected (HTTP {0})")]
    Rejected(u16),
}

impl ParleyError {
    /// Whether this error means the user has to authenticate again.
    pub fn is_auth(&self) -> bool {
        matches!(self, ParleyError::Auth(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_errors_convert_and_classify() {
        let err: ParleyError = AuthError::Rejected(401).into();
        assert!(err.is_auth());
        assert_eq!(
            err.to_string(),
            "Auth error: credential rejected (HTTP 401)"
        );
    }

    #[test]
    fn test_transport_errors_are_not_auth() {
        let err = ParleyError::TransportUnavailable("closed".into());
        assert!(!err.is_auth());
        assert_eq!(err.to_string(), "Transport unavailable: closed");
    }
}
