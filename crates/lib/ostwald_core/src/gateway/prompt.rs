//! `generateContent` request and response shapes, and prompt assembly.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

/// Base64 payload sent inline with the prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

/// One prompt or response part: text, inline data, or (in responses we do
/// not use) something else entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    pub fn inline(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: mime_type.into(),
                data: STANDARD.encode(bytes),
            }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
}

impl GenerateContentRequest {
    /// All parts of the single user turn.
    pub fn parts(&self) -> impl Iterator<Item = &Part> {
        self.contents.iter().flat_map(|c| c.parts.iter())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    /// `candidates[0].content.parts[0].text`, when present and non-empty.
    pub fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .first()?
            .text
            .as_deref()
            .filter(|t| !t.is_empty())
    }

    /// A response carrying a single text candidate.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            candidates: vec![Candidate {
                content: Some(Content {
                    role: Some("model".into()),
                    parts: vec![Part::text(text)],
                }),
                finish_reason: Some("STOP".into()),
            }],
        }
    }
}

/// A binary attachment inlined into the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Inputs of one prompt.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptInput<'a> {
    pub context: &'a str,
    pub input: &'a str,
    /// Rendered conversation history, when history is sent to the model.
    pub history: Option<&'a str>,
    pub attachment: Option<&'a Attachment>,
}

/// Text part of the prompt.
pub fn prompt_text(prompt: &PromptInput<'_>) -> String {
    let body = format!("Context: {}\nYou: {}", prompt.context, prompt.input);
    match prompt.history {
        Some(history) if !history.is_empty() => format!("History:\n{history}\n{body}"),
        _ => body,
    }
}

/// Build the request: the text part first, then the attachment (if any).
pub fn build_request(prompt: &PromptInput<'_>) -> GenerateContentRequest {
    let mut parts = vec![Part::text(prompt_text(prompt))];
    if let Some(attachment) = prompt.attachment {
        parts.push(Part::inline(&attachment.mime_type, &attachment.bytes));
    }
    GenerateContentRequest {
        contents: vec![Content {
            role: Some("user".into()),
            parts,
        }],
    }
}
