//! Sign in with Google and show the account id.
//!
//! A small axum service built around Google's OAuth 2.0 authorization code flow.
//! [google document](https://developers.google.com/identity/protocols/oauth2/web-server)
//! # Feature
//! - `/` renders `Your Google OAuth ID is: <id>` for a signed-in browser, and
//!   redirects anyone else to `/login/google`
//! - State token generation and verification on the callback
//! - Exchange code for access token (using reqwest)
//! - Call the userinfo endpoint with the bearer token (using reqwest)
//! - Session kept in private cookies sealed with a key generated at startup
//! - Absolute URLs computed from `X-Forwarded-*` headers of a trusted proxy
//! # Caution
//! - Deploy this only behind a reverse proxy you control: forwarded headers are trusted as-is.
//! - The id is rendered without HTML escaping.
pub mod code;
pub mod config;
pub mod error;
pub mod executer;
pub mod forwarded;
pub mod routes;
pub mod session;
pub mod state;
pub mod state_token;
pub mod token;
pub mod user_info;
