//! Error types for the envelope client.
//!
//! # Design
//! Every failure is terminal for the call that produced it; nothing here is
//! retried. `Remote` displays as the bare server message so callers can show
//! it verbatim, while `UnknownStatus` keeps the raw status code because the
//! body carried no recoverable message.

use thiserror::Error;

/// Errors returned by `TrustStore` construction and `HttpClient` calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The CA input contained no parseable certificate.
    #[error("unable to parse certificate: {0}")]
    CertificateParse(String),

    /// Method, URL or headers could not form a valid request.
    #[error("invalid request: {0}")]
    RequestConstruction(String),

    /// DNS, connect, TLS handshake, timeout or body read failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body exceeded the client's buffering limit (bytes).
    #[error("response body is larger than {0} bytes")]
    BodyTooLarge(u64),

    /// The server answered non-200 with an error envelope.
    #[error("{message}")]
    Remote { code: i64, message: String },

    /// The server answered non-200 with a body that is not an error envelope.
    #[error("unknown error, status code: {0}")]
    UnknownStatus(u16),

    /// The server answered 200 but the success envelope did not decode.
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl From<ureq::Error> for ApiError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::BadUri(msg) => ApiError::RequestConstruction(msg),
            ureq::Error::Http(e) => ApiError::RequestConstruction(e.to_string()),
            ureq::Error::BodyExceedsLimit(limit) => ApiError::BodyTooLarge(limit),
            other => ApiError::Transport(other.to_string()),
        }
    }
}
