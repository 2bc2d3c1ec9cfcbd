//! Command-line flags and the validated configuration built from them.
//!
//! `Args` is what clap parses; `Config` is the immutable result of checking
//! flag combinations. Nothing touches the network or the filesystem until a
//! `Config` exists.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use restclient_core::{Credentials, HttpMethod, Page};
use thiserror::Error;

#[derive(Debug, Parser)]
#[command(name = "restclient", version, about = "HTTPS client for envelope-style REST services")]
pub struct Args {
    /// HTTPS server address, host[:port]
    #[arg(long)]
    pub addr: String,

    /// Trusted CA certificate (PEM)
    #[arg(long, default_value = "cert.pem")]
    pub certfile: PathBuf,

    /// Username for Basic authentication
    #[arg(long, conflicts_with = "token")]
    pub user: Option<String>,

    /// Password for Basic authentication
    #[arg(long, conflicts_with = "token")]
    pub pass: Option<String>,

    /// Bearer API key, used instead of Basic credentials
    #[arg(long)]
    pub token: Option<String>,

    /// JSON message file sent as the POST/PUT body
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// REST method to execute
    #[arg(long, value_enum, ignore_case = true)]
    pub exec: Exec,

    /// Resource key for GET
    #[arg(long, default_value = "")]
    pub key: String,

    /// Page size passed through as `limit`
    #[arg(long)]
    pub limit: Option<u32>,

    /// Page number passed through as `page`
    #[arg(long)]
    pub page: Option<u32>,

    /// Content-Type of the POST/PUT body
    #[arg(long = "content-type")]
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Exec {
    Get,
    Post,
    Put,
}

impl From<Exec> for HttpMethod {
    fn from(exec: Exec) -> Self {
        match exec {
            Exec::Get => HttpMethod::Get,
            Exec::Post => HttpMethod::Post,
            Exec::Put => HttpMethod::Put,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("specify the request address")]
    MissingAddr,

    #[error("specify the JSON message file for {0}")]
    MissingFile(HttpMethod),
}

/// What a single invocation sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Get { key: String, page: Page },
    Upload { method: HttpMethod, file: PathBuf },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: String,
    pub cert_file: PathBuf,
    pub credentials: Credentials,
    pub action: Action,
    pub content_type: Option<String>,
}

impl TryFrom<Args> for Config {
    type Error = ConfigError;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        if args.addr.trim().is_empty() {
            return Err(ConfigError::MissingAddr);
        }

        let method = HttpMethod::from(args.exec);
        let action = match (method, args.file) {
            (HttpMethod::Get, _) => Action::Get {
                key: args.key,
                page: Page {
                    limit: args.limit,
                    page: args.page,
                },
            },
            (method, Some(file)) => Action::Upload { method, file },
            (method, None) => return Err(ConfigError::MissingFile(method)),
        };

        let credentials = match args.token {
            Some(token) => Credentials::bearer(token),
            None => Credentials::basic(
                args.user.unwrap_or_default(),
                args.pass.unwrap_or_default(),
            ),
        };

        Ok(Config {
            addr: args.addr,
            cert_file: args.certfile,
            credentials,
            action,
            content_type: args.content_type,
        })
    }
}
