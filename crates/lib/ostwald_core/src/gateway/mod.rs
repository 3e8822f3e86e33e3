//! Generation gateway: turns a chat turn into one `generateContent` call.
//!
//! One best-effort call per turn: no retry, no backoff. The reply is
//! `candidates[0].content.parts[0].text`; anything else is an invalid
//! response.

pub mod gemini;
pub mod prompt;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use crate::upload::UploadedFile;

pub use gemini::{GeminiClient, GeminiConfig};
pub use prompt::{
    Attachment, GenerateContentRequest, GenerateContentResponse, Part, PromptInput,
    build_request,
};

/// Errors that can occur while generating a reply.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The provider answered but without a usable first candidate.
    #[error("Invalid response format from AI model")]
    InvalidResponse,

    /// The provider call failed. `status` is the upstream HTTP status, if any.
    #[error("Provider error (status {status:?}): {message}")]
    Provider { status: Option<u16>, message: String },

    #[error("Attachment unreadable: {0}")]
    Attachment(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),
}

impl GatewayError {
    pub fn provider(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Provider {
            status,
            message: message.into(),
        }
    }
}

/// A generative model reachable through the `generateContent` contract.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GatewayError>;
}

/// Ask the model for a reply.
///
/// The upload, if any, is read and inlined after the text part, then
/// removed from disk whether the call succeeded or not.
pub async fn generate_reply(
    model: &dyn GenerativeModel,
    context: &str,
    input: &str,
    history: Option<&str>,
    upload: Option<UploadedFile>,
) -> Result<String, GatewayError> {
    let result = call_model(model, context, input, history, upload.as_ref()).await;
    if let Some(upload) = upload {
        upload.discard();
    }
    result
}

async fn call_model(
    model: &dyn GenerativeModel,
    context: &str,
    input: &str,
    history: Option<&str>,
    upload: Option<&UploadedFile>,
) -> Result<String, GatewayError> {
    let attachment = match upload {
        Some(upload) => Some(Attachment {
            mime_type: upload.mime_type().to_string(),
            bytes: upload.read().await?,
        }),
        None => None,
    };

    let request = build_request(&PromptInput {
        context,
        input,
        history,
        attachment: attachment.as_ref(),
    });

    let response = model.generate_content(&request).await?;
    debug!(candidates = response.candidates.len(), "model responded");

    match response.first_text() {
        Some(text) => Ok(text.to_string()),
        None => {
            warn!(?response, "model response has no text candidate");
            Err(GatewayError::InvalidResponse)
        }
    }
}

#[cfg(any(test, feature = "testing"))]
pub mod scripted {
    //! A model that replays canned results and records what it was asked.

    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::{GatewayError, GenerateContentRequest, GenerateContentResponse, GenerativeModel};

    /// Canned outcome of one call.
    #[derive(Debug, Clone)]
    pub enum Script {
        Reply(GenerateContentResponse),
        Fail { status: Option<u16> },
    }

    #[derive(Debug, Default)]
    pub struct ScriptedModel {
        script: Mutex<VecDeque<Script>>,
        requests: Mutex<Vec<GenerateContentRequest>>,
    }

    impl ScriptedModel {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn replying(text: &str) -> Self {
            Self::new().then(Script::Reply(GenerateContentResponse::from_text(text)))
        }

        pub fn then(self, step: Script) -> Self {
            self.script.lock().unwrap().push_back(step);
            self
        }

        pub fn requests(&self) -> Vec<GenerateContentRequest> {
            self.requests.lock().unwrap().clone()
        }

        pub fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl GenerativeModel for ScriptedModel {
        async fn generate_content(
            &self,
            request: &GenerateContentRequest,
        ) -> Result<GenerateContentResponse, GatewayError> {
            self.requests.lock().unwrap().push(request.clone());
            let step = self.script.lock().unwrap().pop_front();
            match step {
                Some(Script::Reply(response)) => Ok(response),
                Some(Script::Fail { status }) => {
                    Err(GatewayError::provider(status, "scripted failure"))
                }
                None => Err(GatewayError::provider(None, "script exhausted")),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::scripted::{Script, ScriptedModel};
    use super::*;

    async fn upload_in(dir: &std::path::Path) -> UploadedFile {
        UploadedFile::spool(dir, "photo.jpg", "image/jpeg", b"jpeg-bytes")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn returns_first_candidate_text() {
        let model = ScriptedModel::replying("Hello!");
        let reply = generate_reply(&model, " hi", "hi", None, None).await.unwrap();
        assert_eq!(reply, "Hello!");
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn missing_candidate_is_invalid_response() {
        let model = ScriptedModel::new().then(Script::Reply(GenerateContentResponse::default()));
        let err = generate_reply(&model, "", "hi", None, None).await.unwrap_err();
        assert!(matches!(err, GatewayError::InvalidResponse));
        assert_eq!(err.to_string(), "Invalid response format from AI model");
    }

    #[tokio::test]
    async fn provider_status_is_preserved() {
        let model = ScriptedModel::new().then(Script::Fail { status: Some(429) });
        let err = generate_reply(&model, "", "hi", None, None).await.unwrap_err();
        assert!(matches!(err, GatewayError::Provider { status: Some(429), .. }));
    }

    #[tokio::test]
    async fn upload_is_inlined_and_removed_on_success() {
        let dir = tempfile::tempdir().unwrap();
        let upload = upload_in(dir.path()).await;
        let path = upload.path().to_path_buf();

        let model = ScriptedModel::replying("Nice photo.");
        let reply = generate_reply(&model, " ", "", None, Some(upload)).await.unwrap();
        assert_eq!(reply, "Nice photo.");
        assert!(!path.exists());

        let request = &model.requests()[0];
        let inline: Vec<_> = request.parts().filter_map(|p| p.inline_data.as_ref()).collect();
        assert_eq!(inline.len(), 1);
        assert_eq!(inline[0].mime_type, "image/jpeg");
    }

    #[tokio::test]
    async fn upload_is_removed_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let upload = upload_in(dir.path()).await;
        let path = upload.path().to_path_buf();

        let model = ScriptedModel::new().then(Script::Fail { status: None });
        assert!(generate_reply(&model, "", "x", None, Some(upload)).await.is_err());
        assert!(!path.exists());
    }
}
