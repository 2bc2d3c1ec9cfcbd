//! Blocking HTTPS client for the envelope API.
//!
//! # Design
//! `HttpClient` holds a normalised `base_url`, one set of `Credentials` and a
//! `ureq::Agent` whose only roots of trust come from a `TrustStore`. Each call
//! is split in two: `build_request` describes the request as plain data
//! without I/O, then `execute` performs the round-trip and buffers the body
//! for the Envelope Codec. Nothing is mutated after construction.

use std::fmt;
use std::io::Read;
use std::time::Duration;

use serde::de::DeserializeOwned;
use ureq::http::Request;
use ureq::{Agent, SendBody};

use crate::codec;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::trust::TrustStore;
use crate::types::{Credentials, Page, SuccessEnvelope};

/// Fixed wall-clock limit for one request, including the body read.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Default cap on a buffered response body. Larger bodies fail with
/// `ApiError::BodyTooLarge`; see `HttpClient::with_body_limit`.
pub const DEFAULT_BODY_LIMIT: u64 = 256 * 1024 * 1024;

/// Default `Accept` and `Content-Type` value.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

const HTTPS_SCHEME: &str = "https://";

pub struct HttpClient {
    base_url: String,
    credentials: Credentials,
    agent: Agent,
    body_limit: u64,
}

impl HttpClient {
    /// Create a client for `base_url`, trusting only the CAs in `trust`.
    ///
    /// `https://` is prepended when missing and trailing slashes are
    /// dropped. The URL is otherwise not validated here; a malformed one
    /// surfaces as `ApiError::RequestConstruction` on the first call.
    pub fn new(base_url: &str, trust: TrustStore, credentials: Credentials) -> Self {
        let agent = Agent::config_builder()
            .tls_config(trust.tls_config())
            .timeout_global(Some(REQUEST_TIMEOUT))
            .http_status_as_error(false)
            .build()
            .new_agent();

        Self {
            base_url: normalize_base_url(base_url),
            credentials,
            agent,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    /// Replace the response body cap. Meant to be applied right after `new`.
    pub fn with_body_limit(mut self, limit: u64) -> Self {
        self.body_limit = limit;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Describe a request to `{base_url}/{path}` without sending it.
    ///
    /// `content_type` only applies to methods with a body and defaults to
    /// `JSON_CONTENT_TYPE`.
    pub fn build_request(
        &self,
        method: HttpMethod,
        path: &str,
        page: Page,
        content_type: Option<&str>,
    ) -> HttpRequest {
        let mut url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        if !page.is_empty() {
            url.push(if url.contains('?') { '&' } else { '?' });
            url.push_str(&page.query());
        }

        let mut headers = vec![
            ("Accept".to_string(), JSON_CONTENT_TYPE.to_string()),
            ("Authorization".to_string(), self.credentials.authorization()),
        ];
        if method.has_body() {
            headers.push((
                "Content-Type".to_string(),
                content_type.unwrap_or(JSON_CONTENT_TYPE).to_string(),
            ));
        }

        HttpRequest {
            method,
            url,
            headers,
        }
    }

    /// Perform one round-trip and buffer the whole response body.
    ///
    /// `body` is read exactly once; it is never retained or rewound.
    pub fn execute(
        &self,
        request: &HttpRequest,
        body: Option<&mut dyn Read>,
    ) -> Result<HttpResponse, ApiError> {
        let mut builder = Request::builder()
            .method(request.method.as_str())
            .uri(request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        log::debug!("{} {}", request.method, request.url);

        let mut response = match body {
            Some(reader) => {
                let req = builder
                    .body(SendBody::from_reader(reader))
                    .map_err(|e| ApiError::RequestConstruction(e.to_string()))?;
                self.agent.run(req)?
            }
            None => {
                let req = builder
                    .body(())
                    .map_err(|e| ApiError::RequestConstruction(e.to_string()))?;
                self.agent.run(req)?
            }
        };

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response
            .body_mut()
            .with_config()
            .limit(self.body_limit)
            .read_to_vec()?;

        log::debug!("{} {} -> {status} ({} bytes)", request.method, request.url, body.len());

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }

    /// Build, execute and decode in one step.
    pub fn send<T: DeserializeOwned>(
        &self,
        method: HttpMethod,
        path: &str,
        page: Page,
        body: Option<&mut dyn Read>,
        content_type: Option<&str>,
    ) -> Result<SuccessEnvelope<T>, ApiError> {
        let request = self.build_request(method, path, page, content_type);
        let response = self.execute(&request, body)?;
        codec::decode_response(&response)
    }

    /// `GET {base_url}/{key}`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<SuccessEnvelope<T>, ApiError> {
        self.send(HttpMethod::Get, key, Page::default(), None, None)
    }

    /// `GET {base_url}/{key}?limit=..&page=..`.
    pub fn get_page<T: DeserializeOwned>(
        &self,
        key: &str,
        page: Page,
    ) -> Result<SuccessEnvelope<T>, ApiError> {
        self.send(HttpMethod::Get, key, page, None, None)
    }

    /// `POST {base_url}/{path}` with `body` as the request payload.
    pub fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &mut dyn Read,
        content_type: Option<&str>,
    ) -> Result<SuccessEnvelope<T>, ApiError> {
        self.send(HttpMethod::Post, path, Page::default(), Some(body), content_type)
    }

    /// `PUT {base_url}/{path}` with `body` as the request payload.
    pub fn put<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &mut dyn Read,
        content_type: Option<&str>,
    ) -> Result<SuccessEnvelope<T>, ApiError> {
        self.send(HttpMethod::Put, path, Page::default(), Some(body), content_type)
    }
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url)
            .field("credentials", &self.credentials)
            .field("body_limit", &self.body_limit)
            .finish_non_exhaustive()
    }
}

fn normalize_base_url(base_url: &str) -> String {
    let trimmed = base_url.trim_end_matches('/');
    let has_scheme = trimmed
        .get(..HTTPS_SCHEME.len())
        .is_some_and(|s| s.eq_ignore_ascii_case(HTTPS_SCHEME));
    if has_scheme {
        trimmed.to_string()
    } else {
        format!("{HTTPS_SCHEME}{trimmed}")
    }
}
