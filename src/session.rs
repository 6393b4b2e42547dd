//! Cookie-backed session.
//!
//! Everything the service remembers about a browser lives in private
//! (encrypted and authenticated) cookies sealed with a `SessionKey`:
//! - `google_oauth_state`: the state token of a login in progress.
//! - `google_oauth_token`: the `StoredToken` once Google granted access.
//!
//! The key is generated at startup, so restarting the process logs everyone out.
use std::{convert::Infallible, sync::Arc};

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, Key, SameSite},
};
use rand::{TryRngCore, rngs::OsRng};
use time::Duration;
use tracing::{error, warn};

use crate::{
    config::Config,
    error::Error,
    executer::{Executer, UserInfoExe},
    routes::LOGIN_PATH,
    state::AppState,
    state_token::StateToken,
    token::{StoredToken, unix_now},
    user_info::{UserInfo, UserInfoRequest},
};

pub const STATE_COOKIE: &str = "google_oauth_state";
pub const TOKEN_COOKIE: &str = "google_oauth_token";

/// Secret used to seal session cookies.
#[derive(Clone)]
pub struct SessionKey(Key);

impl SessionKey {
    /// 64 bytes from `OsRng`.
    pub fn generate() -> Result<Self, Error> {
        let mut bytes = [0u8; 64];
        OsRng.try_fill_bytes(&mut bytes).map_err(|e| {
            error!("Failed to generate session key: {:?}", e);
            Error::SessionKey
        })?;
        Self::from_bytes(&bytes)
    }

    /// Needs at least 64 bytes of key material.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        Key::try_from(bytes).map(Self).map_err(|e| {
            error!("Invalid session key: {:?}", e);
            Error::SessionKey
        })
    }
}

impl From<SessionKey> for Key {
    fn from(value: SessionKey) -> Self {
        value.0
    }
}

/// State cookie for a login in progress, scoped to the login routes.
pub(crate) fn state_cookie(state: &StateToken, secure: bool) -> Cookie<'static> {
    Cookie::build((STATE_COOKIE, state.value().to_string()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path(LOGIN_PATH)
        .max_age(Duration::minutes(10))
        .build()
}

pub(crate) fn clear_state_cookie() -> Cookie<'static> {
    Cookie::build((STATE_COOKIE, "")).path(LOGIN_PATH).build()
}

pub(crate) fn pending_state(jar: &PrivateCookieJar) -> Option<StateToken> {
    jar.get(STATE_COOKIE)
        .map(|c| StateToken::from(c.value().to_string()))
}

/// Lives as long as the browser session.
pub(crate) fn token_cookie(token: &StoredToken, secure: bool) -> Result<Cookie<'static>, Error> {
    let value = serde_json::to_string(token).map_err(|e| {
        error!("Failed to serialize token: {}", e);
        Error::Session
    })?;
    Ok(Cookie::build((TOKEN_COOKIE, value))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .build())
}

fn stored_token(jar: &PrivateCookieJar) -> Option<StoredToken> {
    let cookie = jar.get(TOKEN_COOKIE)?;
    serde_json::from_str(cookie.value())
        .inspect_err(|e| warn!("Discarding unreadable token cookie: {}", e))
        .ok()
}

/// The current browser's Google grant, if any.
///
/// Extracting it never fails: a missing, forged or expired token just means
/// `authorized()` is false.
pub struct GoogleSession {
    token: Option<StoredToken>,
    config: Arc<Config>,
    exe: UserInfoExe,
}

impl GoogleSession {
    pub fn new(token: Option<StoredToken>, config: Arc<Config>, exe: UserInfoExe) -> Self {
        Self { token, config, exe }
    }

    fn valid_token(&self) -> Option<&StoredToken> {
        self.token.as_ref().filter(|t| !t.is_expired(unix_now()))
    }

    pub fn authorized(&self) -> bool {
        self.valid_token().is_some()
    }

    /// Calls the userinfo endpoint on behalf of the signed-in user.
    pub async fn user_info(&self) -> Result<UserInfo, Error> {
        let token = self.valid_token().ok_or(Error::Unauthorized)?;
        let req = UserInfoRequest::new(&self.config, &token.access_token);
        Ok(self.exe.execute(&req).await?)
    }
}

impl FromRequestParts<AppState> for GoogleSession {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar: PrivateCookieJar<Key> = PrivateCookieJar::from_request_parts(parts, state).await?;
        Ok(Self::new(
            stored_token(&jar),
            state.config(),
            UserInfoExe::new(state.client()),
        ))
    }
}
