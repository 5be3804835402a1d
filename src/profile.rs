// src/profile.rs
use crate::config::LinkedInConfig;
use crate::error::FetchError;
use reqwest::{Client, StatusCode};
use tracing::{info, warn};

/// Result of one profile request that reached the API.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// HTTP 200 with the parsed JSON body.
    Profile(serde_json::Value),
    /// Any other status, with the raw response text.
    Rejected { status: StatusCode, body: String },
}

pub struct ProfileClient {
    client: Client,
    profile_url: String,
}

impl ProfileClient {
    pub fn new(config: &LinkedInConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            client,
            profile_url: config.profile_url(),
        })
    }

    pub fn profile_url(&self) -> &str {
        &self.profile_url
    }

    /// Issue a single bearer-authenticated GET against the profile endpoint.
    pub async fn fetch_profile(&self, access_token: &str) -> Result<FetchOutcome, FetchError> {
        if access_token.trim().is_empty() {
            return Err(FetchError::MissingToken);
        }

        info!("Fetching profile: {}", self.profile_url);

        let response = self
            .client
            .get(&self.profile_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: self.profile_url.clone(),
                source,
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| FetchError::Transport {
                url: self.profile_url.clone(),
                source,
            })?;

        if status == StatusCode::OK {
            let profile = serde_json::from_str(&body)?;
            info!("Profile fetched successfully");
            Ok(FetchOutcome::Profile(profile))
        } else {
            warn!("Profile request rejected with status {}", status);
            Ok(FetchOutcome::Rejected { status, body })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> ProfileClient {
        let mut config = AppConfig::default().linkedin;
        config.api_base_url = server.uri();
        ProfileClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_ok_returns_parsed_profile() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/me"))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"id":"123"}"#))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = client_for(&server).fetch_profile("test-token").await.unwrap();
        assert_eq!(outcome, FetchOutcome::Profile(json!({"id": "123"})));
    }

    #[tokio::test]
    async fn test_forbidden_returns_raw_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/me"))
            .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
            .mount(&server)
            .await;

        let outcome = client_for(&server).fetch_profile("expired").await.unwrap();
        match outcome {
            FetchOutcome::Rejected { status, body } => {
                assert_eq!(status, StatusCode::FORBIDDEN);
                assert_eq!(body, "Forbidden");
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_other_success_codes_are_rejections() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let outcome = client_for(&server).fetch_profile("token").await.unwrap();
        assert!(matches!(
            outcome,
            FetchOutcome::Rejected { status, .. } if status == StatusCode::NO_CONTENT
        ));
    }

    #[tokio::test]
    async fn test_ok_with_non_json_body_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = client_for(&server).fetch_profile("token").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidJson(_)));
    }

    #[tokio::test]
    async fn test_no_retry_on_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = client_for(&server).fetch_profile("token").await.unwrap();
        assert!(matches!(outcome, FetchOutcome::Rejected { .. }));
        server.verify().await;
    }

    #[tokio::test]
    async fn test_empty_token_fails_before_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = client_for(&server).fetch_profile("  ").await.unwrap_err();
        assert!(matches!(err, FetchError::MissingToken));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let mut config = AppConfig::default().linkedin;
        config.api_base_url = "http://127.0.0.1:1".to_string();
        let client = ProfileClient::new(&config).unwrap();

        let err = client.fetch_profile("token").await.unwrap_err();
        assert!(matches!(err, FetchError::Transport { .. }));
    }
}
