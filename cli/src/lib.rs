//! Command-line caller for `restclient-core`.
//!
//! Loads the trusted CA once, builds one `HttpClient` from a validated
//! `Config`, performs exactly one request and hands back the decoded `data`.

pub mod config;

use std::fs::File;
use std::io::{BufReader, Read};

use anyhow::{anyhow, Context};
use restclient_core::{HttpClient, HttpMethod, Page, TrustStore};
use serde_json::Value;

pub use config::{Action, Args, Config, ConfigError, Exec};

/// Execute the request described by `config` and return the envelope data.
///
/// `ApiError` values are propagated unchanged so callers can downcast them.
pub fn run(config: &Config) -> anyhow::Result<Value> {
    let pem = std::fs::read(&config.cert_file)
        .with_context(|| format!("reading CA certificate {}", config.cert_file.display()))?;
    let trust = TrustStore::from_pem(&pem)?;
    log::info!(
        "loaded {} trusted certificate(s) from {}",
        trust.len(),
        config.cert_file.display()
    );

    let client = HttpClient::new(&config.addr, trust, config.credentials.clone());
    let content_type = config.content_type.as_deref();

    let envelope = match &config.action {
        Action::Get { key, page } => client.get_page::<Value>(key, *page)?,
        Action::Upload { method, file } => {
            let path = file
                .file_name()
                .and_then(|name| name.to_str())
                .ok_or_else(|| anyhow!("invalid message file name: {}", file.display()))?;
            let handle = File::open(file)
                .with_context(|| format!("opening message file {}", file.display()))?;
            let mut reader = BufReader::new(handle);
            let body: &mut dyn Read = &mut reader;
            client.send::<Value>(*method, path, Page::default(), Some(body), content_type)?
        }
    };

    Ok(envelope.into_data())
}

/// Method the configured action will use on the wire.
pub fn method_of(action: &Action) -> HttpMethod {
    match action {
        Action::Get { .. } => HttpMethod::Get,
        Action::Upload { method, .. } => *method,
    }
}
