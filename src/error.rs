use axum::response::{IntoResponse, Response};
use http::StatusCode;
use thiserror::Error;
use tracing::{error, warn};

use crate::executer::ExecuteError;

#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("Failed to generate state token")]
    GenToken,
    #[error("Failed to generate session key")]
    SessionKey,
    #[error("State token not matched")]
    StateNotMatch,
    #[error("Missing `{0}` in callback")]
    MissingParam(&'static str),
    #[error("Session holds no valid Google grant")]
    Unauthorized,
    #[error("No login in progress for this session")]
    NoPendingLogin,
    #[error("Authorization denied by provider: {0}")]
    Denied(String),
    #[error("Failed to store session")]
    Session,
    #[error("Failed to parse url")]
    URL,
    #[error(transparent)]
    Execute(#[from] ExecuteError),
}

/// Client mistakes get their reason, everything else a bare 500.
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Self::StateNotMatch | Self::MissingParam(_) | Self::NoPendingLogin => {
                warn!(error = %self, "Rejected callback");
                (StatusCode::BAD_REQUEST, self.to_string()).into_response()
            }
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()).into_response(),
            Self::Denied(_) => {
                warn!(error = %self, "Login not granted");
                (StatusCode::FORBIDDEN, self.to_string()).into_response()
            }
            Self::GenToken | Self::SessionKey | Self::Session | Self::URL | Self::Execute(_) => {
                error!(error = %self, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
            }
        }
    }
}

// ==========Tests==========
#[cfg(test)]
mod tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use crate::executer::ExecuteError;

    use super::Error;

    #[test]
    fn test_error_status() {
        assert_eq!(
            Error::StateNotMatch.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::MissingParam("code").into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::Denied("access_denied".to_string()).into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            Error::from(ExecuteError::Parse).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_rejected_body_not_exposed() {
        let err = Error::from(ExecuteError::Rejected {
            status: 503,
            body: "upstream secret".to_string(),
        });
        // logged, not served
        assert!(err.to_string().contains("upstream secret"));
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
