//! HTTP surface.
//!
//! - `/`: shows the signed-in user's Google id, or sends them to log in.
//! - `/login/google`: starts the authorization code flow.
//! - `/login/google/authorized`: redirect URI registered in Google Cloud Console.
use axum::{
    Router,
    extract::{Query, State},
    http::{StatusCode, header::LOCATION},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use axum_extra::extract::PrivateCookieJar;
use tracing::{debug, info};

use crate::{
    code::{AuthorizationRequest, CallbackParams, UnCheckedCodeResponse},
    error::Error,
    executer::{Executer, TokenExe},
    forwarded::ExternalOrigin,
    session::{self, GoogleSession},
    state::AppState,
    state_token::StateToken,
    token::{StoredToken, TokenRequest, unix_now},
    user_info::SubjectId,
};

pub const LOGIN_PATH: &str = "/login/google";
pub const AUTHORIZED_PATH: &str = "/login/google/authorized";

/// Builds the whole application: `/` plus the login sub-router under `/login`.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .nest("/login", login_routes())
        .with_state(state)
}

fn login_routes() -> Router<AppState> {
    Router::new()
        .route("/google", get(login))
        .route("/google/authorized", get(authorized))
}

/// `302 Found` to `location`.
fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(LOCATION, location.to_string())]).into_response()
}

/// The id is inserted as-is.
pub fn render_identity(id: &SubjectId) -> Html<String> {
    Html(format!("<h2>Your Google OAuth ID is: {id}</h2>"))
}

async fn index(google: GoogleSession, origin: ExternalOrigin) -> Result<Response, Error> {
    if !google.authorized() {
        return Ok(found(LOGIN_PATH));
    }
    let user_info = google.user_info().await?;
    debug!(client_ip = ?origin.client_ip, "Rendering identity");
    Ok(render_identity(&user_info.id).into_response())
}

async fn login(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    origin: ExternalOrigin,
) -> Result<(PrivateCookieJar, Response), Error> {
    // Fresh state token for each attempt
    let token = StateToken::new()?;
    let redirect_uri = state.redirect_uri(&origin);
    let config = state.config();
    let url = AuthorizationRequest::new(&config, &redirect_uri, &token).into_url()?;

    let jar = jar.add(session::state_cookie(&token, origin.is_secure()));
    Ok((jar, found(&url)))
}

async fn authorized(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    origin: ExternalOrigin,
    Query(params): Query<CallbackParams>,
) -> Result<(PrivateCookieJar, Response), Error> {
    let code_res = UnCheckedCodeResponse::from_params(params)?;
    let issued = session::pending_state(&jar).ok_or(Error::NoPendingLogin)?;
    let code = code_res.exchange_with_code(&issued)?;

    let redirect_uri = state.redirect_uri(&origin);
    let token_req = TokenRequest::new(&state.config(), code, &redirect_uri);
    let exe = TokenExe::new(state.client());
    let token_res = exe.execute(&token_req).await?;
    let token = StoredToken::from_response(token_res, unix_now());

    let jar = jar
        .remove(session::clear_state_cookie())
        .add(session::token_cookie(&token, origin.is_secure())?);

    info!(client_ip = ?origin.client_ip, "Google login successful");
    Ok((jar, found("/")))
}

// ==========Tests==========
#[cfg(test)]
mod tests {
    use std::{collections::HashMap, time::Duration};

    use axum::{
        Form, Json, Router,
        body::{Body, to_bytes},
        extract::State,
        http::{
            HeaderMap, Request, StatusCode,
            header::{AUTHORIZATION, COOKIE, HOST, LOCATION, SET_COOKIE},
        },
        response::{IntoResponse, Response},
        routing::{get, post},
    };
    use serde_json::json;
    use tokio::task::JoinSet;
    use tower::ServiceExt;
    use url::Url;

    use crate::{
        config::Config,
        session::{STATE_COOKIE, SessionKey, TOKEN_COOKIE},
        state::AppState,
        user_info::SubjectId,
    };

    use super::{app, render_identity};

    #[derive(Clone)]
    struct Stub {
        status: StatusCode,
        body: &'static str,
        delay: Duration,
    }

    impl Stub {
        fn ok(body: &'static str) -> Self {
            Self {
                status: StatusCode::OK,
                body,
                delay: Duration::ZERO,
            }
        }
    }

    async fn stub_token(Form(form): Form<HashMap<String, String>>) -> Response {
        match form.get("code").map(String::as_str) {
            Some("bad") => (StatusCode::BAD_REQUEST, "invalid_grant").into_response(),
            Some("expired") => Json(json!({
                "access_token": "stub-token",
                "expires_in": 0,
                "token_type": "Bearer",
            }))
            .into_response(),
            _ => Json(json!({
                "access_token": "stub-token",
                "expires_in": 3600,
                "scope": "profile",
                "token_type": "Bearer",
            }))
            .into_response(),
        }
    }

    async fn stub_userinfo(State(stub): State<Stub>, headers: HeaderMap) -> Response {
        tokio::time::sleep(stub.delay).await;
        match headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
            Some("Bearer stub-token") => (
                stub.status,
                [("content-type", "application/json")],
                stub.body,
            )
                .into_response(),
            _ => StatusCode::UNAUTHORIZED.into_response(),
        }
    }

    /// Serves the token and userinfo endpoints, returns the base URL.
    async fn spawn_provider(stub: Stub) -> String {
        let provider = Router::new()
            .route("/token", post(stub_token))
            .route("/oauth2/v2/userinfo", get(stub_userinfo))
            .with_state(stub);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, provider).await.unwrap() });
        format!("http://{addr}")
    }

    async fn setup(stub: Stub) -> Router {
        let base = spawn_provider(stub).await;
        let config = Config::builder()
            .client_id("client-id")
            .client_secret("client-secret")
            .auth_endpoint(&format!("{base}/auth"))
            .token_endpoint(&format!("{base}/token"))
            .api_base_url(&base)
            .build();
        app(AppState::new(config, SessionKey::generate().unwrap()))
    }

    async fn send(app: &Router, uri: &str, cookie: Option<&str>) -> Response {
        let mut req = Request::builder().uri(uri).header(HOST, "app.test");
        if let Some(cookie) = cookie {
            req = req.header(COOKIE, cookie);
        }
        app.clone()
            .oneshot(req.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn body(res: Response) -> String {
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn location(res: &Response) -> &str {
        res.headers().get(LOCATION).unwrap().to_str().unwrap()
    }

    /// `name=value` of a non-empty Set-Cookie for `name`.
    fn set_cookie(res: &Response, name: &str) -> Option<String> {
        res.headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|v| v.split(';').next())
            .find(|pair| {
                pair.strip_prefix(name)
                    .and_then(|rest| rest.strip_prefix('='))
                    .is_some_and(|value| !value.is_empty())
            })
            .map(str::to_string)
    }

    fn query(url: &str, key: &str) -> String {
        Url::parse(url)
            .unwrap()
            .query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
            .unwrap()
    }

    fn callback_uri(code: &str, state: &str) -> String {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("code", code)
            .append_pair("state", state)
            .finish();
        format!("/login/google/authorized?{query}")
    }

    /// Starts a login and returns the state cookie and the state sent to Google.
    async fn start_login(app: &Router) -> (String, String) {
        let res = send(app, "/login/google", None).await;
        assert_eq!(res.status(), StatusCode::FOUND);
        let state = query(location(&res), "state");
        (set_cookie(&res, STATE_COOKIE).unwrap(), state)
    }

    /// Runs the whole flow and returns the session cookie.
    async fn sign_in(app: &Router, code: &str) -> String {
        let (state_cookie, state) = start_login(app).await;
        let res = send(app, &callback_uri(code, &state), Some(&state_cookie)).await;
        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(location(&res), "/");
        set_cookie(&res, TOKEN_COOKIE).unwrap()
    }

    #[test]
    fn test_render_identity() {
        let html = render_identity(&SubjectId::Text("12345".to_string()));
        assert_eq!(html.0, "<h2>Your Google OAuth ID is: 12345</h2>");
    }

    #[tokio::test]
    async fn test_index_without_session_redirects_to_login() {
        let app = setup(Stub::ok(r#"{"id": "12345"}"#)).await;

        let res = send(&app, "/", None).await;
        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(location(&res), "/login/google");
    }

    #[tokio::test]
    async fn test_login_redirects_to_google() {
        let app = setup(Stub::ok(r#"{"id": "12345"}"#)).await;

        let res = send(&app, "/login/google", None).await;
        assert_eq!(res.status(), StatusCode::FOUND);
        let url = location(&res);
        assert!(url.contains("/auth?"));
        assert_eq!(query(url, "client_id"), "client-id");
        assert_eq!(query(url, "scope"), "profile");
        assert_eq!(
            query(url, "redirect_uri"),
            "http://app.test/login/google/authorized"
        );

        let raw = res.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(raw.starts_with("google_oauth_state="));
        assert!(raw.contains("HttpOnly"));
        assert!(raw.contains("Path=/login/google"));
        // sealed, so the state itself never shows in the cookie
        assert!(!raw.contains(&query(url, "state")));
    }

    #[tokio::test]
    async fn test_login_behind_proxy() {
        let app = setup(Stub::ok(r#"{"id": "12345"}"#)).await;

        let req = Request::builder()
            .uri("/login/google")
            .header(HOST, "10.0.0.7:8080")
            .header("x-forwarded-proto", "https")
            .header("x-forwarded-host", "id.example.com")
            .body(Body::empty())
            .unwrap();
        let res = app.oneshot(req).await.unwrap();

        assert_eq!(
            query(location(&res), "redirect_uri"),
            "https://id.example.com/login/google/authorized"
        );
        let raw = res.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(raw.contains("Secure"));
    }

    #[tokio::test]
    async fn test_index_renders_id() {
        let app = setup(Stub::ok(r#"{"id": "12345", "picture": "https://x"}"#)).await;
        let cookie = sign_in(&app, "good").await;

        let res = send(&app, "/", Some(&cookie)).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert!(body(res).await.contains("Your Google OAuth ID is: 12345"));
    }

    #[tokio::test]
    async fn test_index_renders_id_unescaped() {
        let app = setup(Stub::ok(r#"{"id": "<b>7</b>"}"#)).await;
        let cookie = sign_in(&app, "good").await;

        let res = send(&app, "/", Some(&cookie)).await;
        assert_eq!(body(res).await, "<h2>Your Google OAuth ID is: <b>7</b></h2>");
    }

    #[tokio::test]
    async fn test_index_upstream_failure_is_server_error() {
        let app = setup(Stub {
            status: StatusCode::SERVICE_UNAVAILABLE,
            body: r#"{"error": "backend down"}"#,
            delay: Duration::ZERO,
        })
        .await;
        let cookie = sign_in(&app, "good").await;

        for _ in 0..2 {
            let res = send(&app, "/", Some(&cookie)).await;
            assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
            assert!(!body(res).await.contains("backend down"));
        }
    }

    #[tokio::test]
    async fn test_index_malformed_userinfo_is_server_error() {
        let app = setup(Stub::ok(r#"{"name": "no id here"}"#)).await;
        let cookie = sign_in(&app, "good").await;

        let res = send(&app, "/", Some(&cookie)).await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let app = setup(Stub::ok(r#"{"id": "12345"}"#)).await;
        let signed_in = sign_in(&app, "good").await;
        // second browser only got as far as the login redirect
        let (pending, _) = start_login(&app).await;

        let res = send(&app, "/", Some(&signed_in)).await;
        assert_eq!(res.status(), StatusCode::OK);

        let res = send(&app, "/", Some(&pending)).await;
        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(location(&res), "/login/google");
    }

    #[tokio::test]
    async fn test_session_from_other_key_is_rejected() {
        let first = setup(Stub::ok(r#"{"id": "12345"}"#)).await;
        let restarted = setup(Stub::ok(r#"{"id": "12345"}"#)).await;
        let cookie = sign_in(&first, "good").await;

        let res = send(&restarted, "/", Some(&cookie)).await;
        assert_eq!(res.status(), StatusCode::FOUND);
    }

    #[tokio::test]
    async fn test_expired_token_redirects_to_login() {
        let app = setup(Stub::ok(r#"{"id": "12345"}"#)).await;
        let cookie = sign_in(&app, "expired").await;

        let res = send(&app, "/", Some(&cookie)).await;
        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(location(&res), "/login/google");
    }

    #[tokio::test]
    async fn test_callback_rejects_bad_state() {
        let app = setup(Stub::ok(r#"{"id": "12345"}"#)).await;
        let (state_cookie, _) = start_login(&app).await;

        let res = send(&app, &callback_uri("good", "forged"), Some(&state_cookie)).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert!(set_cookie(&res, TOKEN_COOKIE).is_none());
    }

    #[tokio::test]
    async fn test_callback_without_pending_login() {
        let app = setup(Stub::ok(r#"{"id": "12345"}"#)).await;
        let (_, state) = start_login(&app).await;

        let res = send(&app, &callback_uri("good", &state), None).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let res = send(&app, "/login/google/authorized?state=x", None).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_callback_denied() {
        let app = setup(Stub::ok(r#"{"id": "12345"}"#)).await;

        let res = send(&app, "/login/google/authorized?error=access_denied", None).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_callback_token_exchange_failure() {
        let app = setup(Stub::ok(r#"{"id": "12345"}"#)).await;
        let (state_cookie, state) = start_login(&app).await;

        let res = send(&app, &callback_uri("bad", &state), Some(&state_cookie)).await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_app_builds_with_empty_credentials() {
        let config = Config::from_lookup(|_| None);
        let app = app(AppState::new(config, SessionKey::generate().unwrap()));

        let res = send(&app, "/login/google", None).await;
        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(query(location(&res), "client_id"), "");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_burst() {
        let app = setup(Stub {
            status: StatusCode::OK,
            body: r#"{"id": "12345"}"#,
            delay: Duration::from_millis(300),
        })
        .await;
        let cookie = sign_in(&app, "good").await;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = app.clone();
        tokio::spawn(async move { axum::serve(listener, server).await.unwrap() });

        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap();
        let mut requests = JoinSet::new();
        for _ in 0..50 {
            let client = client.clone();
            let cookie = cookie.clone();
            requests.spawn(async move {
                let res = client
                    .get(format!("http://{addr}/"))
                    .header(COOKIE, cookie)
                    .send()
                    .await
                    .unwrap();
                (res.status(), res.text().await.unwrap())
            });
        }

        // 50 sequential calls would take 15s
        let results = tokio::time::timeout(Duration::from_secs(10), requests.join_all())
            .await
            .unwrap();
        assert_eq!(results.len(), 50);
        for (status, text) in results {
            assert_eq!(status, StatusCode::OK);
            assert!(text.contains("Your Google OAuth ID is: 12345"));
        }
    }
}
