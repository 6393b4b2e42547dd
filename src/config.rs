//! Defines the OAuth client configuration and its builder.
//!
//! Holds the credentials and endpoints needed to send a user through Google's
//! authorization code flow and to call the userinfo API afterwards.
//!
//! ## Structures
//! - `Config`: Stores all the information the service needs at runtime.
//! - `ConfigBuilder`: A builder for constructing a `Config` instance.
//!
//! # Example
//! ```rust,no_run
//! use google_oauth_userid::config::Config;
//!
//! // Reads GOOGLE_CLIENT_ID / GOOGLE_CLIENT_SECRET, empty when unset.
//! let config = Config::from_env();
//!
//! // Or spell everything out.
//! let config = Config::builder()
//!     .client_id("your-client-id")
//!     .client_secret("your-client-secret")
//!     .build();
//! ```

use crate::code::Scope;

pub const CLIENT_ID_ENV: &str = "GOOGLE_CLIENT_ID";
pub const CLIENT_SECRET_ENV: &str = "GOOGLE_CLIENT_SECRET";

pub const GOOGLE_AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/auth";
pub const GOOGLE_TOKEN_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/token";
pub const GOOGLE_API_BASE_URL: &str = "https://www.googleapis.com";

#[derive(Debug, Clone)]
pub(crate) struct AuthEndPoint(pub String);

impl Default for AuthEndPoint {
    fn default() -> Self {
        Self(GOOGLE_AUTH_ENDPOINT.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ClientID(pub String);

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ClientSecret(pub String);

#[derive(Debug, Clone)]
pub(crate) struct TokenEndPoint(pub String);

impl Default for TokenEndPoint {
    fn default() -> Self {
        Self(GOOGLE_TOKEN_ENDPOINT.to_string())
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ApiBaseUrl(pub String);

impl Default for ApiBaseUrl {
    fn default() -> Self {
        Self(GOOGLE_API_BASE_URL.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct RedirectURI(pub String);

/// Holds everything the service needs to talk to Google.
///
/// It is immutable once constructed and is shared between requests behind an `Arc`.
///
/// # Fields
/// - `auth_endpoint`: The authorization endpoint the browser is redirected to.
/// - `client_id`: The client ID obtained from Google Cloud Console.
/// - `client_secret`: The client secret linked to the client ID.
/// - `token_endpoint`: The endpoint the authorization code is exchanged at.
/// - `api_base_url`: Base URL of the Google REST API (userinfo lives under it).
/// - `redirect_uri`: Fixed callback URL. When unset it is derived per request
///   from the external origin.
/// - `scopes`: Scopes requested during login.
/// - `offline`: Whether to ask for offline access.
#[derive(Debug, Clone)]
pub struct Config {
    pub(crate) auth_endpoint: AuthEndPoint,
    pub(crate) client_id: ClientID,
    pub(crate) client_secret: ClientSecret,
    pub(crate) token_endpoint: TokenEndPoint,
    pub(crate) api_base_url: ApiBaseUrl,
    pub(crate) redirect_uri: Option<RedirectURI>,
    pub(crate) scopes: Vec<Scope>,
    pub(crate) offline: bool,
}

// ==========impl Config==========
impl Config {
    /// Returns a new `ConfigBuilder` instance to create a `Config` object.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Builds a `Config` from the process environment (and a `.env` file if present).
    ///
    /// Missing credentials are not an error: they fall back to empty strings and
    /// the resulting client simply won't be accepted by Google.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| dotenvy::var(key).ok())
    }

    /// Builds a `Config` with credentials resolved through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let client_id = lookup(CLIENT_ID_ENV).unwrap_or_default();
        let client_secret = lookup(CLIENT_SECRET_ENV).unwrap_or_default();
        Config::builder()
            .client_id(&client_id)
            .client_secret(&client_secret)
            .build()
    }

    pub fn client_id(&self) -> &str {
        &self.client_id.0
    }

    pub fn auth_endpoint(&self) -> &str {
        &self.auth_endpoint.0
    }

    pub fn token_endpoint(&self) -> &str {
        &self.token_endpoint.0
    }

    pub fn api_base_url(&self) -> &str {
        &self.api_base_url.0
    }

    /// The configured callback URL, if one was fixed at build time.
    pub fn redirect_uri(&self) -> Option<&str> {
        self.redirect_uri.as_ref().map(|v| v.0.as_str())
    }

    pub fn scopes(&self) -> &[Scope] {
        &self.scopes
    }
}

/// Provides a convenient way to create a `Config` instance step by step.
///
/// Every endpoint defaults to Google's production URL and the scope defaults
/// to `profile`, so only the credentials normally need to be set.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    auth_endpoint: AuthEndPoint,
    client_id: ClientID,
    client_secret: ClientSecret,
    token_endpoint: TokenEndPoint,
    api_base_url: ApiBaseUrl,
    redirect_uri: Option<RedirectURI>,
    scopes: Vec<Scope>,
    offline: bool,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self {
            auth_endpoint: AuthEndPoint::default(),
            client_id: ClientID::default(),
            client_secret: ClientSecret::default(),
            token_endpoint: TokenEndPoint::default(),
            api_base_url: ApiBaseUrl::default(),
            redirect_uri: None,
            scopes: vec![Scope::Profile],
            offline: false,
        }
    }
}

// ==========impl ConfigBuilder==========
impl ConfigBuilder {
    /// Creates a new `ConfigBuilder` instance with default values.
    pub fn new() -> Self {
        ConfigBuilder::default()
    }

    /// Sets the authorization endpoint URL.
    pub fn auth_endpoint(mut self, auth_endpoint: &str) -> Self {
        self.auth_endpoint = AuthEndPoint(auth_endpoint.to_string());
        self
    }

    /// Sets the client ID obtained from Google Cloud Console.
    pub fn client_id(mut self, client_id: &str) -> Self {
        self.client_id = ClientID(client_id.to_string());
        self
    }

    /// Sets the client secret associated with the client ID.
    pub fn client_secret(mut self, client_secret: &str) -> Self {
        self.client_secret = ClientSecret(client_secret.to_string());
        self
    }

    /// Sets the token exchange endpoint URL.
    pub fn token_endpoint(mut self, token_endpoint: &str) -> Self {
        self.token_endpoint = TokenEndPoint(token_endpoint.to_string());
        self
    }

    /// Sets the base URL of the REST API serving `/oauth2/v2/userinfo`.
    pub fn api_base_url(mut self, api_base_url: &str) -> Self {
        self.api_base_url = ApiBaseUrl(api_base_url.to_string());
        self
    }

    /// Pins the redirect URI instead of deriving it from each request.
    pub fn redirect_uri(mut self, redirect_uri: &str) -> Self {
        self.redirect_uri = Some(RedirectURI(redirect_uri.to_string()));
        self
    }

    /// Replaces the requested scopes.
    pub fn scopes<I>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = Scope>,
    {
        self.scopes = scopes.into_iter().collect();
        self
    }

    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Constructs a `Config` instance with the provided values.
    pub fn build(self) -> Config {
        Config {
            auth_endpoint: self.auth_endpoint,
            client_id: self.client_id,
            client_secret: self.client_secret,
            token_endpoint: self.token_endpoint,
            api_base_url: self.api_base_url,
            redirect_uri: self.redirect_uri,
            scopes: self.scopes,
            offline: self.offline,
        }
    }
}
