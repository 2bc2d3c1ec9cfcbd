use std::{collections::BTreeMap, io, net::SocketAddr, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Path, Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
pub use axum_server::Handle;
use axum_server::tls_rustls::RustlsConfig;
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};

/// Credentials the server accepts. With neither set, every request passes.
#[derive(Debug, Clone, Default)]
pub struct Auth {
    pub basic: Option<(String, String)>,
    pub token: Option<String>,
}

impl Auth {
    pub fn basic(username: &str, password: &str) -> Self {
        Self {
            basic: Some((username.to_string(), password.to_string())),
            token: None,
        }
    }

    pub fn bearer(token: &str) -> Self {
        Self {
            basic: None,
            token: Some(token.to_string()),
        }
    }

    fn accepts(&self, authorization: Option<&str>) -> bool {
        if self.basic.is_none() && self.token.is_none() {
            return true;
        }
        let Some(value) = authorization else {
            return false;
        };
        if let (Some(encoded), Some((user, pass))) = (value.strip_prefix("Basic "), &self.basic) {
            return general_purpose::STANDARD
                .decode(encoded)
                .map(|raw| raw == format!("{user}:{pass}").as_bytes())
                .unwrap_or(false);
        }
        if let (Some(token), Some(expected)) = (value.strip_prefix("Bearer "), &self.token) {
            return token == expected;
        }
        false
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entry {
    pub key: String,
    pub value: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Stored {
    pub key: String,
    pub created: bool,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    pub limit: Option<usize>,
    pub page: Option<usize>,
}

pub struct AppState {
    auth: Auth,
    records: RwLock<BTreeMap<String, Value>>,
}

pub type Db = Arc<AppState>;

pub fn app(auth: Auth) -> Router {
    app_with(auth, BTreeMap::new())
}

/// Router pre-populated with `records`.
pub fn app_with(auth: Auth, records: BTreeMap<String, Value>) -> Router {
    let state: Db = Arc::new(AppState {
        auth,
        records: RwLock::new(records),
    });
    Router::new()
        .route("/", get(list_records))
        .route("/_garbled", get(garbled))
        .route("/_status/{code}", get(raw_status))
        .route(
            "/{key}",
            get(get_record).post(create_record).put(put_record),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state)
}

pub async fn run(listener: TcpListener, app: Router) -> Result<(), io::Error> {
    axum::serve(listener, app).await
}

/// Install `ring` as the process-wide rustls provider. Later calls are no-ops.
pub fn install_crypto_provider() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}

pub async fn tls_config(cert_pem: Vec<u8>, key_pem: Vec<u8>) -> io::Result<RustlsConfig> {
    install_crypto_provider();
    RustlsConfig::from_pem(cert_pem, key_pem).await
}

pub async fn serve_tls(
    addr: SocketAddr,
    config: RustlsConfig,
    app: Router,
    handle: Handle,
) -> Result<(), io::Error> {
    axum_server::bind_rustls(addr, config)
        .handle(handle)
        .serve(app.into_make_service())
        .await
}

/// Start an HTTPS server on an ephemeral loopback port in a background
/// thread and return its address once it is accepting connections.
pub fn spawn_tls(app: Router, cert_pem: Vec<u8>, key_pem: Vec<u8>) -> io::Result<SocketAddr> {
    let (tx, rx) = std::sync::mpsc::channel::<io::Result<SocketAddr>>();

    std::thread::spawn(move || {
        let rt = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                let _ = tx.send(Err(e));
                return;
            }
        };
        rt.block_on(async move {
            let config = match tls_config(cert_pem, key_pem).await {
                Ok(config) => config,
                Err(e) => {
                    let _ = tx.send(Err(e));
                    return;
                }
            };
            let handle = Handle::new();
            let addr = SocketAddr::from(([127, 0, 0, 1], 0));
            let server = serve_tls(addr, config, app, handle.clone());
            let notify = async {
                let bound = handle
                    .listening()
                    .await
                    .ok_or_else(|| io::Error::other("server stopped before listening"));
                let _ = tx.send(bound);
            };
            let (served, ()) = tokio::join!(server, notify);
            if let Err(e) = served {
                eprintln!("mock server exited: {e}");
            }
        });
    });

    rx.recv()
        .map_err(|_| io::Error::other("server thread exited"))?
}

fn success<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(json!({ "code": 0, "data": data }))).into_response()
}

fn failure(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(json!({ "code": status.as_u16(), "message": message })),
    )
        .into_response()
}

async fn require_auth(State(db): State<Db>, request: Request, next: Next) -> Response {
    let authorization = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    if !db.auth.accepts(authorization) {
        return failure(StatusCode::UNAUTHORIZED, "unauthorized");
    }
    next.run(request).await
}

async fn list_records(State(db): State<Db>, Query(p): Query<Pagination>) -> Response {
    let records = db.records.read().await;
    let limit = p.limit.unwrap_or(usize::MAX).max(1);
    let skip = p.page.unwrap_or(1).saturating_sub(1).saturating_mul(limit);
    let entries: Vec<Entry> = records
        .iter()
        .skip(skip)
        .take(limit)
        .map(|(key, value)| Entry {
            key: key.clone(),
            value: value.clone(),
        })
        .collect();
    success(entries)
}

async fn get_record(State(db): State<Db>, Path(key): Path<String>) -> Response {
    match db.records.read().await.get(&key) {
        Some(value) => success(value),
        None => failure(StatusCode::NOT_FOUND, "no such key"),
    }
}

async fn create_record(
    State(db): State<Db>,
    Path(key): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let value = match parse_body(&headers, &body) {
        Ok(value) => value,
        Err(resp) => return resp,
    };
    let mut records = db.records.write().await;
    if records.contains_key(&key) {
        return failure(StatusCode::CONFLICT, "key already exists");
    }
    records.insert(key.clone(), value);
    success(Stored { key, created: true })
}

async fn put_record(
    State(db): State<Db>,
    Path(key): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let value = match parse_body(&headers, &body) {
        Ok(value) => value,
        Err(resp) => return resp,
    };
    let created = db.records.write().await.insert(key.clone(), value).is_none();
    success(Stored { key, created })
}

async fn raw_status(Path(code): Path<u16>) -> Response {
    match StatusCode::from_u16(code) {
        Ok(status) => (status, "raw failure").into_response(),
        Err(_) => failure(StatusCode::BAD_REQUEST, "invalid status code"),
    }
}

async fn garbled() -> Response {
    (StatusCode::OK, "this is not an envelope").into_response()
}

/// JSON bodies are stored as-is; anything else is kept as a string.
fn parse_body(headers: &HeaderMap, body: &[u8]) -> Result<Value, Response> {
    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"));
    if is_json {
        return serde_json::from_slice(body)
            .map_err(|_| failure(StatusCode::BAD_REQUEST, "invalid JSON body"));
    }
    Ok(Value::String(String::from_utf8_lossy(body).into_owned()))
}
