//! Provides the `state` token that ties an authorization callback to the login that started it.
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{TryRngCore, rngs::OsRng};
use tracing::error;

use crate::error::Error;

/// A randomly generated state token created using `OsRng` and Base64URL-encoded.
///
/// One is issued per login attempt, sent to Google as the `state` parameter and
/// kept in the private state cookie until the callback arrives.
/// # Example
/// ```rust,no_run
/// use google_oauth_userid::state_token::StateToken;
///
/// let state = StateToken::new().expect("Failed to generate state token");
/// println!("Generated state: {}", state.value());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct StateToken(pub(crate) String);

impl StateToken {
    /// Generates a new state token from 32 bytes of OS randomness.
    /// Returns `Error::GenToken` if the random generation fails.
    pub fn new() -> Result<Self, Error> {
        let mut key = [0u8; 32];
        OsRng.try_fill_bytes(&mut key).map_err(|e| {
            error!("Failed to generate state token: {:?}", e);
            Error::GenToken
        })?;
        Ok(Self(URL_SAFE_NO_PAD.encode(key)))
    }

    /// Returns the state token as a string reference.
    pub fn value(&self) -> &str {
        &self.0
    }
}

impl From<String> for StateToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A state value received on the callback.
///
/// This token **has not been verified yet** and must be checked against the stored `StateToken`.
#[derive(Debug, Clone)]
pub struct UnCheckedStateToken(pub(crate) String);

impl UnCheckedStateToken {
    /// Compares against the token that was issued for this browser.
    pub fn verify(&self, issued: &StateToken) -> Result<(), Error> {
        if self.0 == issued.0 {
            Ok(())
        } else {
            Err(Error::StateNotMatch)
        }
    }
}

impl From<String> for UnCheckedStateToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}
