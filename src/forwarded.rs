//! Reverse-proxy fix-up.
//!
//! The service is expected to run behind exactly one trusted proxy that
//! terminates TLS. Its `X-Forwarded-*` headers decide the scheme and host used
//! for absolute URLs and the client address written to the logs.
use std::convert::Infallible;

use axum::extract::FromRequestParts;
use http::{HeaderMap, header::HOST, request::Parts};

const X_FORWARDED_PROTO: &str = "x-forwarded-proto";
const X_FORWARDED_HOST: &str = "x-forwarded-host";
const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Where the browser thinks it is talking to.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalOrigin {
    pub scheme: String,
    pub host: String,
    pub client_ip: Option<String>,
}

impl ExternalOrigin {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let scheme = forwarded(headers, X_FORWARDED_PROTO).unwrap_or_else(|| "http".to_string());
        let host = forwarded(headers, X_FORWARDED_HOST)
            .or_else(|| header(headers, HOST.as_str()).map(str::to_string))
            .unwrap_or_else(|| "localhost".to_string());
        Self {
            scheme,
            host,
            client_ip: forwarded(headers, X_FORWARDED_FOR),
        }
    }

    pub fn is_secure(&self) -> bool {
        self.scheme.eq_ignore_ascii_case("https")
    }

    /// Absolute URL for `path` on this origin.
    pub fn url(&self, path: &str) -> String {
        format!("{}://{}{}", self.scheme, self.host, path)
    }
}

fn header<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// The entry appended by the immediate proxy, i.e. the last one.
fn forwarded(headers: &HeaderMap, name: &str) -> Option<String> {
    header(headers, name)
        .and_then(|s| s.rsplit(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl<S> FromRequestParts<S> for ExternalOrigin
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}
