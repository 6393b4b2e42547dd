//! Provides an asynchronous execution framework for sending HTTP requests to Google.
//!
//! This module:
//! - Defines the Executer trait, which provides a unified interface for making HTTP requests.
//! - Implements executers for the code exchange and the userinfo call.

use std::{collections::HashMap, error::Error, pin::Pin};

use reqwest::{Client, Response, Url};
use thiserror::Error;
use tracing::error;

use crate::{
    token::{TokenRequest, TokenResponse},
    user_info::{UserInfo, UserInfoRequest},
};

/// generic asynchronous execution interface for sending HTTP requests.
/// Key Components:
/// - Req: The request type that the executer will handle.
/// - Response: The expected response type.
/// - Error: The error type that will be returned on failure.
/// - Future: The asynchronous execution result, returning either Response or Error
pub trait Executer<'a, Req>
where
    Req: Send,
{
    type Response;
    type Error: Error;
    type Future: Future<Output = Result<Self::Response, Self::Error>> + Send + 'a;

    fn execute(&'a self, req: &'a Req) -> Self::Future;
}

/// Defines possible errors that can occur during request execution.
#[derive(Debug, Clone, Error)]
pub enum ExecuteError {
    #[error("Failed to parse data")]
    Parse,
    #[error("Failed to send request")]
    Send,
    #[error("Failed to parse url")]
    URL,
    #[error("Upstream responded with {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Turns a non-success status into `ExecuteError::Rejected`, keeping the body for the logs.
async fn ensure_success(res: Response) -> Result<Response, ExecuteError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let body = res.text().await.unwrap_or_default();
    error!("Upstream responded with {}: {}", status, body);
    Err(ExecuteError::Rejected {
        status: status.as_u16(),
        body,
    })
}

/// Exchanges an authorization code for an access token.
#[derive(Debug, Clone)]
pub struct TokenExe {
    client: Client,
}

impl TokenExe {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

/// Request Workflow
/// 1. Parse the token endpoint URL.
/// 2. Prepare the form parameters.
/// 3. Send an HTTP POST request.
/// 4. Check the status and parse the body as TokenResponse.
impl<'a> Executer<'a, TokenRequest> for TokenExe {
    type Response = TokenResponse;
    type Error = ExecuteError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'a>>;

    fn execute(&'a self, req: &'a TokenRequest) -> Self::Future {
        Box::pin(async move {
            let url = Url::parse(req.token_endpoint()).map_err(|e| {
                error!("Failed to parse url: {:?}", e);
                ExecuteError::URL
            })?;

            let mut params = HashMap::new();
            params.insert("code", req.code());
            params.insert("client_id", req.client_id());
            params.insert("client_secret", req.client_secret());
            params.insert("redirect_uri", req.redirect_uri());
            params.insert("grant_type", req.grant_type());

            let res = self
                .client
                .post(url)
                .form(&params)
                .send()
                .await
                .map_err(|e| {
                    error!("Failed to send request: {:?}", e);
                    ExecuteError::Send
                })?;
            let res_json = ensure_success(res)
                .await?
                .json::<TokenResponse>()
                .await
                .map_err(|e| {
                    error!("Failed to parse JSON: {:?}", e);
                    ExecuteError::Parse
                })?;
            Ok(res_json)
        })
    }
}

/// Fetches the signed-in user's profile with a bearer token.
#[derive(Debug, Clone)]
pub struct UserInfoExe {
    client: Client,
}

impl UserInfoExe {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

/// Request Workflow
/// 1. Parse the userinfo endpoint URL.
/// 2. Send an HTTP GET request with `Authorization: Bearer`.
/// 3. Reject any non-success status with its body.
/// 4. Parse the body as UserInfo.
impl<'a> Executer<'a, UserInfoRequest> for UserInfoExe {
    type Response = UserInfo;
    type Error = ExecuteError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'a>>;

    fn execute(&'a self, req: &'a UserInfoRequest) -> Self::Future {
        Box::pin(async move {
            let url = Url::parse(req.endpoint()).map_err(|e| {
                error!("Failed to parse url: {:?}", e);
                ExecuteError::URL
            })?;

            let res = self
                .client
                .get(url)
                .bearer_auth(req.access_token.value())
                .send()
                .await
                .map_err(|e| {
                    error!("Failed to send request: {:?}", e);
                    ExecuteError::Send
                })?;
            let user_info = ensure_success(res)
                .await?
                .json::<UserInfo>()
                .await
                .map_err(|e| {
                    error!("Malformed userinfo response: {:?}", e);
                    ExecuteError::Parse
                })?;
            Ok(user_info)
        })
    }
}
