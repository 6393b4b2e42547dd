//! Provides the code-for-token exchange and the token kept in the session.
//!
//! This module:
//! TokenRequest: The form posted to the token endpoint.
//! TokenResponse: The JSON returned by the token endpoint.
//! AccessToken: The bearer credential used to call Google APIs.
//! StoredToken: What the session cookie remembers after a successful login.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::{
    code::Code,
    config::{ClientID, ClientSecret, Config, TokenEndPoint},
};

/// Represents an OAuth 2.0 access token.
/// This token is used to access Google APIs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessToken(pub(crate) String);

impl AccessToken {
    pub fn new(value: &str) -> Self {
        Self(value.to_string())
    }

    /// Retrieves the access token as a string.
    pub fn value(&self) -> &str {
        &self.0
    }
}

/// A structure used to send the authorization code to Google's token endpoint.
#[derive(Debug, Clone)]
pub struct TokenRequest {
    token_endpoint: TokenEndPoint,
    code: Code,
    client_id: ClientID,
    client_secret: ClientSecret,
    redirect_uri: String,
    grant_type: String,
}

impl TokenRequest {
    /// `redirect_uri` must match the one sent in the authorization request.
    pub fn new(config: &Config, code: Code, redirect_uri: &str) -> Self {
        Self {
            token_endpoint: config.token_endpoint.to_owned(),
            code,
            client_id: config.client_id.to_owned(),
            client_secret: config.client_secret.to_owned(),
            redirect_uri: redirect_uri.to_string(),
            grant_type: "authorization_code".to_string(),
        }
    }

    pub fn token_endpoint(&self) -> &str {
        &self.token_endpoint.0
    }

    pub fn code(&self) -> &str {
        &self.code.0
    }

    pub fn client_id(&self) -> &str {
        &self.client_id.0
    }

    pub fn client_secret(&self) -> &str {
        &self.client_secret.0
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    pub fn grant_type(&self) -> &str {
        &self.grant_type
    }
}

/// Represents the response from Google's token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    access_token: AccessToken,
    expires_in: Option<u64>,
    scope: Option<String>,
    token_type: String,
}

impl TokenResponse {
    pub fn access_token(&self) -> &AccessToken {
        &self.access_token
    }

    pub fn expires_in(&self) -> Option<u64> {
        self.expires_in
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    pub fn token_type(&self) -> &str {
        &self.token_type
    }
}

/// The grant remembered by the session cookie.
///
/// `expires_at` is absolute UNIX seconds, so the cookie stays meaningful across
/// requests without knowing when it was issued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: AccessToken,
    pub token_type: String,
    pub scope: Option<String>,
    pub expires_at: Option<u64>,
}

impl StoredToken {
    pub fn from_response(res: TokenResponse, now: u64) -> Self {
        Self {
            expires_at: res.expires_in.map(|secs| now.saturating_add(secs)),
            access_token: res.access_token,
            token_type: res.token_type,
            scope: res.scope,
        }
    }

    /// A token without an expiry never expires.
    pub fn is_expired(&self, now: u64) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Current UNIX time in seconds.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
