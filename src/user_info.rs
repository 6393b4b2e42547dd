//! The userinfo call and the identifier it returns.
use std::fmt;

use serde::Deserialize;

use crate::{config::Config, token::AccessToken};

pub const USER_INFO_PATH: &str = "/oauth2/v2/userinfo";

/// Google account identifier.
///
/// The v2 endpoint sends it as a string, but numbers are accepted too.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SubjectId {
    Text(String),
    Number(u64),
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubjectId::Text(v) => f.write_str(v),
            SubjectId::Number(v) => write!(f, "{v}"),
        }
    }
}

/// The part of the userinfo payload the service reads. Other fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct UserInfo {
    pub id: SubjectId,
}

/// An authenticated GET against the userinfo endpoint.
#[derive(Debug, Clone)]
pub struct UserInfoRequest {
    pub(crate) endpoint: String,
    pub(crate) access_token: AccessToken,
}

impl UserInfoRequest {
    pub fn new(config: &Config, access_token: &AccessToken) -> Self {
        Self {
            endpoint: format!(
                "{}{}",
                config.api_base_url.0.trim_end_matches('/'),
                USER_INFO_PATH
            ),
            access_token: access_token.to_owned(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}
