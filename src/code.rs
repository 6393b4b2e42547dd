//! This module handles the authorization request and the callback carrying the authorization code.
//!
//! # Key Structures
//!
//! ## `AuthorizationRequest`
//! Builds the URL the browser is redirected to when the login starts.
//! Includes the client id, scope, redirect URI, access type and state token.
//!
//! ## `UnCheckedCodeResponse`
//! The query Google sends back to the redirect URI. The code inside can only be
//! taken out after the state has been checked.
//!
//! ## `Code`
//! A verified authorization code, ready to be exchanged for an access token.
//!
//! # Flow
//! 1. Generate a `StateToken` and keep it in the state cookie.
//! 2. Redirect the user to `AuthorizationRequest::into_url()`.
//! 3. Google redirects back with `code` and `state` (`UnCheckedCodeResponse`).
//! 4. `UnCheckedCodeResponse::exchange_with_code()` checks the state and yields a `Code`.
use itertools::Itertools;
use serde::Deserialize;
use tracing::error;

use crate::{
    config::Config,
    error::Error,
    state_token::{StateToken, UnCheckedStateToken},
};

/// Scopes that can be requested during login.
///
/// The service only needs `profile`, which is what Google requires before it
/// returns the account `id` from the userinfo endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    OpenID,
    Email,
    Profile,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::OpenID => "openid",
            Scope::Email => "email",
            Scope::Profile => "profile",
        }
    }
}

/// A verified authorization code.
///
/// Only obtainable through `UnCheckedCodeResponse::exchange_with_code`.
#[derive(Debug, Clone, PartialEq)]
pub struct Code(pub(crate) String);

impl Code {
    pub fn value(&self) -> &str {
        &self.0
    }
}

/// Generates the URL that starts the authorization code flow.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest<'a> {
    config: &'a Config,
    redirect_uri: &'a str,
    state: &'a StateToken,
}

impl<'a> AuthorizationRequest<'a> {
    /// `redirect_uri` must be the exact URL later sent with the code exchange.
    pub fn new(config: &'a Config, redirect_uri: &'a str, state: &'a StateToken) -> Self {
        Self {
            config,
            redirect_uri,
            state,
        }
    }

    /// Space separated, de-duplicated and sorted.
    fn scope(&self) -> String {
        self.config
            .scopes
            .iter()
            .map(Scope::as_str)
            .unique()
            .sorted()
            .join(" ")
    }

    /// Constructs the authorization URL with every parameter percent-encoded.
    pub fn into_url(&self) -> Result<String, Error> {
        let access_type = if self.config.offline {
            "offline"
        } else {
            "online"
        };
        let scope = self.scope();

        let url = url::Url::parse_with_params(
            &self.config.auth_endpoint.0,
            &[
                ("response_type", "code"),
                ("client_id", self.config.client_id.0.as_str()),
                ("redirect_uri", self.redirect_uri),
                ("scope", scope.as_str()),
                ("access_type", access_type),
                ("state", self.state.value()),
            ],
        )
        .map_err(|e| {
            error!("Failed to build authorization url: {}", e);
            Error::URL
        })?;
        Ok(url.into())
    }
}

/// Query parameters Google appends to the redirect URI.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// A response from Google containing an unverified authorization code and state.
#[derive(Debug, Clone)]
pub struct UnCheckedCodeResponse {
    state: UnCheckedStateToken,
    code: Code,
}

impl UnCheckedCodeResponse {
    /// Fails with `Error::Denied` when Google reported an error and with
    /// `Error::MissingParam` when `code` or `state` is absent.
    pub fn from_params(params: CallbackParams) -> Result<Self, Error> {
        if let Some(reason) = params.error {
            return Err(Error::Denied(reason));
        }
        let code = params.code.ok_or(Error::MissingParam("code"))?;
        let state = params.state.ok_or(Error::MissingParam("state"))?;
        Ok(Self {
            state: state.into(),
            code: Code(code),
        })
    }

    /// Must be validated using the issued state token before use.
    pub fn exchange_with_code(self, issued: &StateToken) -> Result<Code, Error> {
        self.state.verify(issued)?;
        Ok(self.code)
    }
}
