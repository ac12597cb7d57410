/*
 * Responsibility
 * - Pull the bearer credential out of the request head
 * - Absent header is not an error; a non-Bearer scheme is
 * - Callers can swap in their own TokenExtractor (the `getToken` override)
 */
use async_trait::async_trait;
use axum::http::{header, request::Parts};

use crate::error::AuthError;

/// Credential extraction contract. The default reads the `authorization`
/// header; replacements may look anywhere in the request head (query,
/// cookies, custom headers) and may suspend.
#[async_trait]
pub trait TokenExtractor: Send + Sync {
    /// `Ok(None)` means no credential was presented; only a malformed
    /// presentation (wrong scheme) is an error.
    async fn extract(&self, parts: &Parts) -> Result<Option<String>, AuthError>;
}

/// Default extractor: `Authorization: Bearer <token>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BearerHeaderExtractor;

#[async_trait]
impl TokenExtractor for BearerHeaderExtractor {
    async fn extract(&self, parts: &Parts) -> Result<Option<String>, AuthError> {
        let Some(raw) = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
        else {
            return Ok(None);
        };

        // Split on the first space. A header with no space is all scheme,
        // so `Authorization: Bearer` yields an empty token and anything else
        // fails the scheme check below.
        let (scheme, token) = raw.split_once(' ').unwrap_or((raw, ""));

        if scheme != "Bearer" {
            return Err(AuthError::InvalidTokenScheme {
                scheme: scheme.to_string(),
            });
        }

        // An empty token is passed through on purpose: the session lookup
        // is the one that decides whether to reject it.
        Ok(Some(token.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with_header(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/graphql");
        if let Some(v) = value {
            builder = builder.header(header::AUTHORIZATION, v);
        }
        let (parts, ()) = builder.body(()).unwrap().into_parts();
        parts
    }

    #[tokio::test]
    async fn bearer_token_is_extracted() {
        let parts = parts_with_header(Some("Bearer abc123"));
        let token = BearerHeaderExtractor.extract(&parts).await.unwrap();
        assert_eq!(token.as_deref(), Some("abc123"));
    }

    #[tokio::test]
    async fn missing_header_is_absent_not_an_error() {
        let parts = parts_with_header(None);
        let token = BearerHeaderExtractor.extract(&parts).await.unwrap();
        assert_eq!(token, None);
    }

    #[tokio::test]
    async fn non_bearer_scheme_is_rejected_with_the_scheme_name() {
        let parts = parts_with_header(Some("Basic dXNlcjpwYXNz"));
        let err = BearerHeaderExtractor.extract(&parts).await.unwrap_err();

        match err {
            AuthError::InvalidTokenScheme { scheme } => assert_eq!(scheme, "Basic"),
            other => panic!("expected InvalidTokenScheme, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_bearer_value_passes_through() {
        let parts = parts_with_header(Some("Bearer "));
        let token = BearerHeaderExtractor.extract(&parts).await.unwrap();
        assert_eq!(token.as_deref(), Some(""));
    }

    #[tokio::test]
    async fn bare_bearer_with_no_space_passes_an_empty_token() {
        let parts = parts_with_header(Some("Bearer"));
        let token = BearerHeaderExtractor.extract(&parts).await.unwrap();
        assert_eq!(token.as_deref(), Some(""));
    }
}
