use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use reqwest::Client;

use crate::{config::Config, forwarded::ExternalOrigin, routes::AUTHORIZED_PATH, session::SessionKey};

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    key: Key,
    client: Client,
}

impl AppState {
    pub fn new(config: Config, key: SessionKey) -> Self {
        Self {
            config: Arc::new(config),
            key: key.into(),
            client: Client::new(),
        }
    }

    pub fn config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Pooled HTTP client for calls to Google.
    pub fn client(&self) -> Client {
        self.client.clone()
    }

    /// The callback URL Google redirects back to.
    pub fn redirect_uri(&self, origin: &ExternalOrigin) -> String {
        match self.config.redirect_uri() {
            Some(fixed) => fixed.to_string(),
            None => origin.url(AUTHORIZED_PATH),
        }
    }
}

// PrivateCookieJar requires Key to be extractable from state
impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.key.clone()
    }
}
