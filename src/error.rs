/*
 * Responsibility
 * - Failure surface of the plugin: AuthError definition
 * - IntoResponse implementation (HTTP status / JSON error body)
 * - Authorization failures are 401 with a message from `Messages`;
 *   integration bugs (Misconfigured) are 500, never a 401
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Which authorization condition rejected the request.
///
/// The kind is stable; the human-readable message attached to it comes from
/// `Messages` and is caller-overridable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnauthorizedKind {
    /// No session, failed lookup, or an unreadable cache entry.
    InvalidToken,
    /// The session exists but is past its expiry.
    ExpiredToken,
    /// The user's role is not in the configured allow-list.
    InvalidPermissions,
    /// No credential supplied while `require_auth` is on.
    AuthRequired,
}

#[derive(Debug, Error)]
pub enum AuthError {
    /// The `Authorization` header carried a scheme other than `Bearer`.
    /// Raised by the extractor before any provider or cache call.
    #[error("invalid token scheme: {scheme}")]
    InvalidTokenScheme { scheme: String },

    /// An expected client-side failure. Aborts the request with a 401.
    #[error("{message}")]
    Unauthorized {
        kind: UnauthorizedKind,
        message: String,
    },

    /// Integration error on the host side (e.g. the context-build step ran
    /// without the auth middleware). Not a client condition, so not a 401.
    #[error("auth integration misconfigured: {0}")]
    Misconfigured(&'static str),
}

impl AuthError {
    pub fn unauthorized(kind: UnauthorizedKind, message: impl Into<String>) -> Self {
        Self::Unauthorized {
            kind,
            message: message.into(),
        }
    }

    /// Stable machine-readable code, also used in the JSON body.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidTokenScheme { .. } => "INVALID_TOKEN_SCHEME",
            AuthError::Unauthorized { kind, .. } => match kind {
                UnauthorizedKind::InvalidToken => "INVALID_TOKEN",
                UnauthorizedKind::ExpiredToken => "EXPIRED_TOKEN",
                UnauthorizedKind::InvalidPermissions => "INVALID_PERMISSIONS",
                UnauthorizedKind::AuthRequired => "AUTH_REQUIRED",
            },
            AuthError::Misconfigured(_) => "MISCONFIGURED",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::InvalidTokenScheme { .. } | AuthError::Unauthorized { .. } => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::Misconfigured(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.code(),
                message: self.to_string(),
            },
        };

        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_maps_to_401() {
        let err = AuthError::unauthorized(UnauthorizedKind::InvalidToken, "invalid token");
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.code(), "INVALID_TOKEN");
    }

    #[test]
    fn scheme_error_is_401_and_names_the_scheme() {
        let err = AuthError::InvalidTokenScheme {
            scheme: "Basic".into(),
        };
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.to_string(), "invalid token scheme: Basic");
    }

    #[test]
    fn misconfigured_is_500_not_401() {
        let err = AuthError::Misconfigured("auth middleware not applied");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), "MISCONFIGURED");
    }

    #[test]
    fn each_unauthorized_kind_has_its_own_code() {
        let codes: Vec<&str> = [
            UnauthorizedKind::InvalidToken,
            UnauthorizedKind::ExpiredToken,
            UnauthorizedKind::InvalidPermissions,
            UnauthorizedKind::AuthRequired,
        ]
        .into_iter()
        .map(|kind| AuthError::unauthorized(kind, "x").code())
        .collect();

        assert_eq!(
            codes,
            vec![
                "INVALID_TOKEN",
                "EXPIRED_TOKEN",
                "INVALID_PERMISSIONS",
                "AUTH_REQUIRED"
            ]
        );
    }
}
