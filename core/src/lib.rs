//! Blocking HTTPS client core for an envelope-style REST service.
//!
//! # Overview
//! Builds a client that trusts only an explicitly supplied CA, authenticates
//! with Basic credentials or a bearer token, and decodes the service's
//! uniform JSON envelope into either typed data or an `ApiError`.
//!
//! # Design
//! - `TrustStore` parses PEM bytes; reading the file is left to the caller.
//! - `HttpClient` is immutable after construction. Requests are first
//!   described as plain `HttpRequest` data, then executed.
//! - The codec branches on the HTTP status before parsing, so callers never
//!   inspect status codes themselves.
//! - One call, one result: no retries, no partial data.

pub mod client;
pub mod codec;
pub mod error;
pub mod http;
pub mod trust;
pub mod types;

pub use client::{HttpClient, DEFAULT_BODY_LIMIT, JSON_CONTENT_TYPE, REQUEST_TIMEOUT};
pub use codec::decode;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use trust::TrustStore;
pub use types::{Credentials, ErrorEnvelope, Page, SuccessEnvelope};
