// Register an OAuth client in Google Cloud console with
// - Redirect URI: http(s)://<your host>/login/google/authorized
// Then export (or put in .env)
// ```.env
// GOOGLE_CLIENT_ID="your_client_id"
// GOOGLE_CLIENT_SECRET="your_client_secret"
// ```
// finally ```cargo run```
use std::net::{Ipv4Addr, SocketAddrV4};

use anyhow::Context;
use google_oauth_userid::{config::Config, routes::app, session::SessionKey, state::AppState};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const PORT: u16 = 8080;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Log settings
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Empty credentials are allowed, Google will just refuse the login
    let config = Config::from_env();
    if config.client_id().is_empty() {
        warn!("GOOGLE_CLIENT_ID is not set");
    }
    // New key per process: restarting invalidates every session
    let key = SessionKey::generate().context("Failed to generate session key")?;
    let app = app(AppState::new(config, key));

    let addr = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, PORT);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("serving on {}:{}", addr.ip(), addr.port());

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
