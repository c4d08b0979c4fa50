use crate::{
    config::Config,
    error::{AppError, Result},
};
use serde_json::Value;
use tracing::{debug, info};

/// Boundary to the hosted upload service. The core only ever sees the
/// resulting URL, which it stores as an opaque string.
#[derive(Clone)]
pub struct MediaService {
    config: Config,
    http: reqwest::Client,
}

impl MediaService {
    pub async fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
            http: reqwest::Client::new(),
        })
    }

    /// Forward an uploaded image to the upload service and return the
    /// hosted URL.
    pub async fn upload_image(
        &self,
        file_name: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<String> {
        debug!("Uploading image {} ({} bytes)", file_name, data.len());

        if data.is_empty() {
            return Err(AppError::FileUpload("Uploaded file is empty".to_string()));
        }

        if data.len() as u64 > self.config.max_upload_size {
            return Err(AppError::FileUpload(format!(
                "Uploaded file exceeds the {} byte limit",
                self.config.max_upload_size
            )));
        }

        if !content_type.starts_with("image/") {
            return Err(AppError::FileUpload(format!(
                "Unsupported content type: {}",
                content_type
            )));
        }

        let part = reqwest::multipart::Part::bytes(data)
            .file_name(file_name.to_string())
            .mime_str(content_type)?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .http
            .post(format!("{}/api/upload", self.config.upload_service_url))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::FileUpload(format!(
                "Upload service returned {}",
                response.status()
            )));
        }

        let body: Value = response.json().await?;
        let url = body["url"]
            .as_str()
            .ok_or_else(|| AppError::FileUpload("Upload service response missing url".to_string()))?
            .to_string();

        info!("Uploaded image {} -> {}", file_name, url);
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(upload_url: &str) -> Config {
        Config {
            server_host: "127.0.0.1".to_string(),
            server_port: 3000,
            environment: "test".to_string(),
            database_url: "mem://".to_string(),
            database_namespace: "test".to_string(),
            database_name: "test".to_string(),
            database_username: String::new(),
            database_password: String::new(),
            jwt_secret: "test-secret".to_string(),
            upload_service_url: upload_url.to_string(),
            max_upload_size: 1024,
            frontend_url: "http://localhost:3001".to_string(),
            default_prompts_per_page: 20,
            rate_limit_requests: 100,
            cors_allowed_origins: "http://localhost:3001".to_string(),
        }
    }

    #[tokio::test]
    async fn test_upload_image_returns_hosted_url() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/upload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "url": "https://cdn.example.com/abc.png"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let media = MediaService::new(&test_config(&server.uri())).await.unwrap();
        let url = media
            .upload_image("avatar.png", "image/png", vec![1, 2, 3])
            .await
            .unwrap();

        assert_eq!(url, "https://cdn.example.com/abc.png");
    }

    #[tokio::test]
    async fn test_upload_image_rejects_bad_input() {
        let media = MediaService::new(&test_config("http://localhost:9000")).await.unwrap();

        assert!(matches!(
            media.upload_image("a.png", "image/png", Vec::new()).await,
            Err(AppError::FileUpload(_))
        ));

        assert!(matches!(
            media.upload_image("a.txt", "text/plain", vec![1]).await,
            Err(AppError::FileUpload(_))
        ));

        assert!(matches!(
            media.upload_image("a.png", "image/png", vec![0; 2048]).await,
            Err(AppError::FileUpload(_))
        ));
    }
}
