//! Google Gemini `generateContent` client.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};
use url::Url;

use super::{GatewayError, GenerateContentRequest, GenerateContentResponse, GenerativeModel};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Connection settings for the Gemini API.
#[derive(Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl GeminiConfig {
    /// Defaults for everything but the key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// `{base_url}/models/{model}:generateContent`
    pub fn endpoint(&self) -> Result<Url, GatewayError> {
        let raw = format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );
        Url::parse(&raw).map_err(|e| GatewayError::Config(format!("invalid Gemini URL {raw}: {e}")))
    }
}

// Keeps the key out of logs.
impl fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// HTTP client for one Gemini model.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    endpoint: Url,
    api_key: String,
}

impl fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiClient")
            .field("endpoint", &self.endpoint.as_str())
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Result<Self, GatewayError> {
        let endpoint = config.endpoint()?;
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Config(format!("failed to build HTTP client: {e}")))?;
        info!(model = %config.model, endpoint = %endpoint, "Gemini client ready");
        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GatewayError> {
        let resp = self
            .client
            .post(self.endpoint.clone())
            .header(API_KEY_HEADER, &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                GatewayError::provider(
                    e.status().map(|s| s.as_u16()),
                    format!("Gemini request failed: {e}"),
                )
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(GatewayError::provider(
                Some(status.as_u16()),
                format!("Gemini generateContent failed: {status} {body}"),
            ));
        }

        let response: GenerateContentResponse = resp.json().await.map_err(|e| {
            GatewayError::provider(None, format!("Gemini response parse error: {e}"))
        })?;
        debug!(candidates = response.candidates.len(), "Gemini response decoded");
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    use super::*;
    use crate::gateway::{PromptInput, build_request};

    /// Serve one canned HTTP response on a local port and hand back the raw
    /// request that was received.
    async fn fake_upstream(status: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}/v1beta", listener.local_addr().unwrap());
        let response = format!(
            "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                raw.extend_from_slice(&buf[..n]);
                if n == 0 || request_complete(&raw) {
                    break;
                }
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&raw).into_owned()
        });

        (base_url, handle)
    }

    fn request_complete(raw: &[u8]) -> bool {
        let text = String::from_utf8_lossy(raw);
        let Some(head_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let content_length = text[..head_end]
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        raw.len() >= head_end + 4 + content_length
    }

    fn client_for(base_url: String) -> GeminiClient {
        let mut config = GeminiConfig::new("test-key");
        config.base_url = base_url;
        config.timeout = Duration::from_secs(5);
        GeminiClient::new(&config).unwrap()
    }

    fn hello_request() -> GenerateContentRequest {
        build_request(&PromptInput {
            context: " hi",
            input: "hi",
            ..Default::default()
        })
    }

    #[test]
    fn endpoint_uses_model_and_base() {
        let mut config = GeminiConfig::new("key");
        assert_eq!(
            config.endpoint().unwrap().as_str(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
        );

        config.base_url = "http://localhost:8089/v1beta/".into();
        config.model = "gemini-2.0-flash".into();
        assert_eq!(
            config.endpoint().unwrap().as_str(),
            "http://localhost:8089/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn bad_base_url_is_config_error() {
        let mut config = GeminiConfig::new("key");
        config.base_url = "not a url".into();
        assert!(matches!(config.endpoint(), Err(GatewayError::Config(_))));
    }

    #[test]
    fn debug_redacts_key() {
        let config = GeminiConfig::new("super-secret");
        let printed = format!("{config:?}");
        assert!(!printed.contains("super-secret"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn client_builds_from_defaults() {
        let client = GeminiClient::new(&GeminiConfig::new("secret-key")).unwrap();
        let printed = format!("{client:?}");
        assert!(printed.contains(":generateContent"));
        assert!(!printed.contains("secret-key"));
    }

    #[tokio::test]
    async fn success_is_decoded_and_key_is_sent() {
        let (base_url, upstream) = fake_upstream(
            "200 OK",
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"ok"}]}}]}"#,
        )
        .await;

        let response = client_for(base_url)
            .generate_content(&hello_request())
            .await
            .unwrap();
        assert_eq!(response.first_text(), Some("ok"));

        let raw = upstream.await.unwrap();
        let head = raw.to_ascii_lowercase();
        assert!(
            head.starts_with("post /v1beta/models/gemini-1.5-flash:generatecontent "),
            "{raw}"
        );
        assert!(head.contains("x-goog-api-key: test-key"), "{raw}");
        assert!(raw.contains(r#""text":"Context:  hi\nYou: hi""#), "{raw}");
    }

    #[tokio::test]
    async fn error_status_is_kept() {
        let (base_url, upstream) = fake_upstream(
            "429 Too Many Requests",
            r#"{"error":{"code":429,"message":"quota"}}"#,
        )
        .await;

        let err = client_for(base_url)
            .generate_content(&hello_request())
            .await
            .unwrap_err();
        assert!(
            matches!(err, GatewayError::Provider { status: Some(429), .. }),
            "{err:?}"
        );
        upstream.await.unwrap();
    }

    #[tokio::test]
    async fn undecodable_body_has_no_status() {
        let (base_url, _upstream) = fake_upstream("200 OK", "not json").await;

        let err = client_for(base_url)
            .generate_content(&hello_request())
            .await
            .unwrap_err();
        assert!(
            matches!(err, GatewayError::Provider { status: None, .. }),
            "{err:?}"
        );
    }
}
