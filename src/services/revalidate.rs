use crate::{config::Config, error::Result};
use serde_json::json;
use tracing::{debug, warn};

/// Notifies the presentation layer that the cached rendering of a path
/// is stale. The signal is one-way: delivery failures are logged and
/// never propagate to the operation that triggered them.
#[derive(Clone)]
pub struct RevalidationService {
    endpoint: String,
    http: reqwest::Client,
}

impl RevalidationService {
    pub async fn new(config: &Config) -> Result<Self> {
        Ok(Self::with_endpoint(format!("{}/api/revalidate", config.frontend_url)))
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            http: reqwest::Client::new(),
        }
    }

    /// Fire-and-forget notification, detached from the calling request.
    pub fn revalidate(&self, path: &str) {
        let service = self.clone();
        let path = path.to_string();

        tokio::spawn(async move {
            if let Err(e) = service.send(&path).await {
                warn!("Failed to revalidate path {}: {}", path, e);
            }
        });
    }

    async fn send(&self, path: &str) -> Result<()> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&json!({ "path": path }))
            .send()
            .await?;

        if response.status().is_success() {
            debug!("Revalidated path: {}", path);
        } else {
            warn!("Revalidation for {} returned {}", path, response.status());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_send_posts_path_to_endpoint() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/revalidate"))
            .and(body_json(json!({ "path": "/" })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let service = RevalidationService::with_endpoint(format!("{}/api/revalidate", server.uri()));
        service.send("/").await.unwrap();
    }

    #[tokio::test]
    async fn test_send_tolerates_error_status() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/revalidate"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let service = RevalidationService::with_endpoint(format!("{}/api/revalidate", server.uri()));
        // Non-2xx responses are logged, not surfaced
        assert!(service.send("/prompt/abc").await.is_ok());
    }
}
