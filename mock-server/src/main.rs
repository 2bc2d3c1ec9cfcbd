use std::net::SocketAddr;

use mock_server::{Auth, Handle};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let port = std::env::var("PORT").unwrap_or_else(|_| "8443".to_string());
    let addr = format!("127.0.0.1:{port}");

    let auth = match std::env::var("MOCK_TOKEN") {
        Ok(token) => Auth::bearer(&token),
        Err(_) => Auth::basic(
            &std::env::var("MOCK_USER").unwrap_or_else(|_| "user".to_string()),
            &std::env::var("MOCK_PASS").unwrap_or_else(|_| "pass".to_string()),
        ),
    };
    let app = mock_server::app(auth);

    match (std::env::var("CERT_FILE"), std::env::var("KEY_FILE")) {
        (Ok(cert), Ok(key)) => {
            let config = mock_server::tls_config(std::fs::read(cert)?, std::fs::read(key)?).await?;
            let addr: SocketAddr = addr
                .parse()
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
            println!("listening on https://{addr}");
            mock_server::serve_tls(addr, config, app, Handle::new()).await
        }
        _ => {
            let listener = TcpListener::bind(&addr).await?;
            println!("listening on http://{addr}");
            mock_server::run(listener, app).await
        }
    }
}
