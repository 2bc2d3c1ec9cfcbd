//! Credentials, pagination parameters and the JSON envelope shapes.
//!
//! # Design
//! The remote service wraps every body in the same top-level object and
//! distinguishes success from failure only by the HTTP status. The two shapes
//! are kept as separate types so the codec can pick one before parsing.

use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};

/// How a client authenticates. Exactly one variant is active per client.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    Basic { username: String, password: String },
    Bearer { token: String },
}

impl Credentials {
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        Credentials::Bearer {
            token: token.into(),
        }
    }

    /// Value for the `Authorization` header.
    pub fn authorization(&self) -> String {
        match self {
            Credentials::Basic { username, password } => {
                let raw = format!("{username}:{password}");
                format!("Basic {}", general_purpose::STANDARD.encode(raw))
            }
            Credentials::Bearer { token } => format!("Bearer {token}"),
        }
    }
}

// Secrets stay out of logs and panic messages.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Credentials::Bearer { .. } => f
                .debug_struct("Bearer")
                .field("token", &"<redacted>")
                .finish(),
        }
    }
}

/// Pagination parameters passed through to the server untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
    pub limit: Option<u32>,
    pub page: Option<u32>,
}

impl Page {
    pub fn is_empty(&self) -> bool {
        self.limit.is_none() && self.page.is_none()
    }

    /// Render as a query string without the leading `?`.
    pub fn query(&self) -> String {
        let mut parts = Vec::new();
        if let Some(limit) = self.limit {
            parts.push(format!("limit={limit}"));
        }
        if let Some(page) = self.page {
            parts.push(format!("page={page}"));
        }
        parts.join("&")
    }
}

/// Body of a non-200 response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorEnvelope {
    #[serde(default)]
    pub code: i64,
    pub message: String,
}

/// Body of a 200 response; `data` is decoded straight into the caller's type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SuccessEnvelope<T> {
    #[serde(default)]
    pub code: i64,
    pub data: T,
}

impl<T> SuccessEnvelope<T> {
    pub fn into_data(self) -> T {
        self.data
    }
}
