use async_trait::async_trait;
use reqwest::StatusCode;

use crate::services::auth::session::SessionData;
use crate::services::provider::{IdentityProvider, ProviderError};

/// HTTP implementation of the provider boundary.
///
/// Exchanges the bearer credential for session data at
/// `GET <base_url>/session`. The token is forwarded exactly as extracted,
/// including an empty one: rejecting it is the provider's call.
#[derive(Clone, Debug)]
pub struct HttpIdentityProvider {
    http: reqwest::Client,
    base_url: String,
    role_claims: bool,
}

impl HttpIdentityProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Self {
            http: reqwest::Client::new(),
            base_url,
            role_claims: false,
        }
    }

    /// Marks this provider as role-aware (suppresses the allow-list startup
    /// warning). Set it when the deployment enables role claims upstream.
    #[must_use]
    pub fn with_role_claims(mut self, enabled: bool) -> Self {
        self.role_claims = enabled;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Pulls an error code out of a provider error body, tolerating both
/// `{"code": "..."}` and `{"error": {"code": "..."}}` shapes.
fn error_code(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;

    value
        .get("code")
        .or_else(|| value.get("error").and_then(|e| e.get("code")))
        .and_then(|c| c.as_str())
        .map(str::to_string)
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn get_session(&self, token: &str) -> Result<SessionData, ProviderError> {
        let url = format!("{}/session", self.base_url);

        let resp = self
            .http
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = resp.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = resp.text().await.unwrap_or_default();

            // Providers that distinguish expiry do so via an error code.
            if error_code(&body).is_some_and(|code| code.contains("expired")) {
                return Err(ProviderError::SessionExpired);
            }

            return Err(ProviderError::Rejected(format!("status {}", status)));
        }

        if !status.is_success() {
            return Err(ProviderError::Transport(format!(
                "unexpected status {}",
                status
            )));
        }

        resp.json::<SessionData>()
            .await
            .map_err(|e| ProviderError::InvalidPayload(e.to_string()))
    }

    fn exposes_roles(&self) -> bool {
        self.role_claims
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_reads_both_body_shapes() {
        assert_eq!(
            error_code(r#"{"code":"expired-token"}"#).as_deref(),
            Some("expired-token")
        );
        assert_eq!(
            error_code(r#"{"error":{"code":"invalid"}}"#).as_deref(),
            Some("invalid")
        );
        assert_eq!(error_code("not json"), None);
        assert_eq!(error_code(r#"{"message":"no code"}"#), None);
    }

    #[test]
    fn base_url_loses_trailing_slash() {
        let provider = HttpIdentityProvider::new("https://id.example.com/");
        assert_eq!(provider.base_url(), "https://id.example.com");
    }
}
