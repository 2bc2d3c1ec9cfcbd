//! End-to-end scenarios against the mock server over real HTTPS.
//!
//! Each test starts its own server on an ephemeral loopback port with the
//! fixture certificates from `test-certs/`, then drives `HttpClient` exactly
//! as a caller would.

use std::collections::BTreeMap;
use std::io::Cursor;
use std::net::SocketAddr;

use mock_server::{Auth, Entry, Stored};
use restclient_core::{ApiError, Credentials, HttpClient, Page, TrustStore};
use serde::Deserialize;
use serde_json::{json, Value};

const CA_PEM: &[u8] = include_bytes!("../../test-certs/ca.pem");
const OTHER_CA_PEM: &[u8] = include_bytes!("../../test-certs/other-ca.pem");
const SERVER_PEM: &[u8] = include_bytes!("../../test-certs/server.pem");
const SERVER_KEY: &[u8] = include_bytes!("../../test-certs/server.key");

#[derive(Debug, Deserialize, PartialEq)]
struct Named {
    name: String,
}

fn start(auth: Auth, records: BTreeMap<String, Value>) -> SocketAddr {
    let app = mock_server::app_with(auth, records);
    mock_server::spawn_tls(app, SERVER_PEM.to_vec(), SERVER_KEY.to_vec()).unwrap()
}

fn client(addr: SocketAddr, credentials: Credentials) -> HttpClient {
    let trust = TrustStore::from_pem(CA_PEM).unwrap();
    HttpClient::new(&addr.to_string(), trust, credentials)
}

fn seeded() -> BTreeMap<String, Value> {
    let mut records = BTreeMap::new();
    records.insert("abc".to_string(), json!({ "name": "abc" }));
    records
}

#[test]
fn basic_get_returns_data() {
    let addr = start(Auth::basic("u", "p"), seeded());
    let client = client(addr, Credentials::basic("u", "p"));

    let named = client.get::<Named>("abc").unwrap().into_data();
    assert_eq!(
        named,
        Named {
            name: "abc".to_string()
        }
    );
}

#[test]
fn missing_key_surfaces_remote_message() {
    let addr = start(Auth::basic("u", "p"), seeded());
    let client = client(addr, Credentials::basic("u", "p"));

    let err = client.get::<Named>("missing").unwrap_err();
    assert!(matches!(err, ApiError::Remote { code: 404, .. }), "got {err:?}");
    assert_eq!(err.to_string(), "no such key");
}

#[test]
fn unrelated_ca_fails_in_transport() {
    let addr = start(Auth::basic("u", "p"), seeded());
    let trust = TrustStore::from_pem(OTHER_CA_PEM).unwrap();
    let client = HttpClient::new(&addr.to_string(), trust, Credentials::basic("u", "p"));

    let err = client.get::<Named>("abc").unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)), "got {err:?}");
}

#[test]
fn wrong_password_is_rejected_remotely() {
    let addr = start(Auth::basic("u", "p"), seeded());
    let client = client(addr, Credentials::basic("u", "nope"));

    let err = client.get::<Named>("abc").unwrap_err();
    assert_eq!(err.to_string(), "unauthorized");
}

#[test]
fn bearer_token_authenticates() {
    let addr = start(Auth::bearer("tok"), seeded());

    let named = client(addr, Credentials::bearer("tok"))
        .get::<Named>("abc")
        .unwrap()
        .into_data();
    assert_eq!(named.name, "abc");

    let err = client(addr, Credentials::bearer("other"))
        .get::<Named>("abc")
        .unwrap_err();
    assert!(matches!(err, ApiError::Remote { code: 401, .. }), "got {err:?}");
}

#[test]
fn post_then_put_then_get() {
    let addr = start(Auth::basic("u", "p"), BTreeMap::new());
    let client = client(addr, Credentials::basic("u", "p"));

    let mut body = Cursor::new(br#"{"name":"first"}"#.to_vec());
    let stored = client.post::<Stored>("face.json", &mut body, None).unwrap().into_data();
    assert_eq!(stored.key, "face.json");
    assert!(stored.created);

    // a second POST to the same key is a remote conflict
    let mut body = Cursor::new(br#"{"name":"again"}"#.to_vec());
    let err = client.post::<Stored>("face.json", &mut body, None).unwrap_err();
    assert_eq!(err.to_string(), "key already exists");

    let mut body = Cursor::new(br#"{"name":"second"}"#.to_vec());
    let stored = client.put::<Stored>("face.json", &mut body, None).unwrap().into_data();
    assert!(!stored.created);

    let named = client.get::<Named>("face.json").unwrap().into_data();
    assert_eq!(named.name, "second");
}

#[test]
fn content_type_is_passed_through() {
    let addr = start(Auth::basic("u", "p"), BTreeMap::new());
    let client = client(addr, Credentials::basic("u", "p"));

    let mut body = Cursor::new(b"plain words".to_vec());
    client
        .put::<Stored>("note", &mut body, Some("text/plain"))
        .unwrap();

    let value = client.get::<Value>("note").unwrap().into_data();
    assert_eq!(value, json!("plain words"));
}

#[test]
fn pagination_is_passed_through() {
    let mut records = BTreeMap::new();
    for key in ["a", "b", "c", "d", "e"] {
        records.insert(key.to_string(), json!({ "name": key }));
    }
    let addr = start(Auth::basic("u", "p"), records);
    let client = client(addr, Credentials::basic("u", "p"));

    let page = Page {
        limit: Some(2),
        page: Some(3),
    };
    let entries = client.get_page::<Vec<Entry>>("", page).unwrap().into_data();
    let keys: Vec<&str> = entries.iter().map(|e| e.key.as_str()).collect();
    assert_eq!(keys, vec!["e"]);
}

#[test]
fn non_json_failure_keeps_status() {
    let addr = start(Auth::basic("u", "p"), seeded());
    let client = client(addr, Credentials::basic("u", "p"));

    let err = client.get::<Value>("_status/502").unwrap_err();
    assert!(matches!(err, ApiError::UnknownStatus(502)), "got {err:?}");
}

#[test]
fn garbled_success_is_decode_error() {
    let addr = start(Auth::basic("u", "p"), seeded());
    let client = client(addr, Credentials::basic("u", "p"));

    let err = client.get::<Value>("_garbled").unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)), "got {err:?}");
}

#[test]
fn shape_mismatch_is_decode_error() {
    let mut records = BTreeMap::new();
    records.insert("abc".to_string(), json!({ "name": 42 }));
    let addr = start(Auth::basic("u", "p"), records);
    let client = client(addr, Credentials::basic("u", "p"));

    let err = client.get::<Named>("abc").unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)), "got {err:?}");
}

#[test]
fn body_above_ureq_default_limit_is_buffered() {
    // 11 MiB of payload, past ureq's own 10 MiB default.
    let big = "x".repeat(11 * 1024 * 1024);
    let mut records = BTreeMap::new();
    records.insert("big".to_string(), json!(big));
    let addr = start(Auth::basic("u", "p"), records);
    let client = client(addr, Credentials::basic("u", "p"));

    let data = client.get::<String>("big").unwrap().into_data();
    assert_eq!(data.len(), big.len());
}

#[test]
fn body_over_configured_limit_is_its_own_error() {
    let addr = start(Auth::basic("u", "p"), seeded());
    let client = client(addr, Credentials::basic("u", "p")).with_body_limit(8);

    let err = client.get::<Named>("abc").unwrap_err();
    assert!(matches!(err, ApiError::BodyTooLarge(8)), "got {err:?}");
}

#[test]
fn connection_refused_is_transport_error() {
    // Reserve a port, then release it so nothing is listening there.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(addr, Credentials::basic("u", "p"))
        .get::<Value>("abc")
        .unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)), "got {err:?}");
}

#[test]
fn response_headers_are_buffered() {
    let addr = start(Auth::basic("u", "p"), seeded());
    let client = client(addr, Credentials::basic("u", "p"));

    let request = client.build_request(restclient_core::HttpMethod::Get, "abc", Page::default(), None);
    let response = client.execute(&request, None).unwrap();
    assert_eq!(response.status, 200);
    assert!(response
        .headers
        .iter()
        .any(|(k, v)| k.eq_ignore_ascii_case("content-type") && v.starts_with("application/json")));
    let value: Value = serde_json::from_slice(&response.body).unwrap();
    assert_eq!(value["data"]["name"], "abc");
}
