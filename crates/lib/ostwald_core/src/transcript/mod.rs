//! Chat transcript model and HTML rendering.
//!
//! Mirrors what the browser builds: a scrolling list of message bubbles,
//! bot bubbles addressable by `botMessage-{n}` ids so their body can be
//! filled by a [`reveal::Reveal`].

pub mod reveal;

use crate::models::StoredMessage;
use crate::{BOT_SENDER, USER_SENDER};

/// Sender used for transport failures.
pub const ERROR_SENDER: &str = "model error";

/// Shown in place of an empty message that carried a file.
pub const FILE_SENT_NOTICE: &str = "File Sent";

/// Shown when the server could not be reached.
pub const FETCH_FAILED_NOTICE: &str = "Failed to fetch a response from the server.";

/// One message bubble.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bubble {
    pub sender: String,
    pub body: String,
    /// DOM id of the body element, set for bot bubbles.
    pub element_id: Option<String>,
}

impl Bubble {
    /// Bot replies (and legacy `model` replies) get a copy button.
    pub fn has_copy_button(&self) -> bool {
        self.sender == BOT_SENDER || self.sender == "model"
    }

    pub fn to_html(&self) -> String {
        let id_attr = self
            .element_id
            .as_deref()
            .map(|id| format!(r#" id="{}""#, escape_html(id)))
            .unwrap_or_default();
        let copy_button = if self.has_copy_button() {
            r#"<button class="copy-button bg-primary">Copy</button>"#
        } else {
            ""
        };
        format!(
            r#"<div class="message {sender}"><div class="msg-header">{header}</div><div class="msg-body"{id_attr}>{body}</div>{copy_button}</div>"#,
            sender = escape_html(&self.sender),
            header = escape_html(&capitalize_first_letter(&self.sender)),
            body = escape_html(&self.body),
        )
    }
}

/// Ordered bubbles of one page.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    bubbles: Vec<Bubble>,
    bot_messages: usize,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a transcript from logged messages.
    pub fn from_history(messages: &[StoredMessage]) -> Self {
        let mut transcript = Self::new();
        for message in messages {
            match message.sender.as_str() {
                BOT_SENDER => {
                    transcript.push_bot_reply(&message.text);
                }
                USER_SENDER => transcript.push_user_message(&message.text),
                sender => transcript.push(sender, &message.text),
            }
        }
        transcript
    }

    pub fn bubbles(&self) -> &[Bubble] {
        &self.bubbles
    }

    /// Append a bubble without an element id.
    pub fn push(&mut self, sender: &str, body: &str) {
        self.bubbles.push(Bubble {
            sender: sender.to_string(),
            body: body.to_string(),
            element_id: None,
        });
    }

    /// The optimistic bubble for a sent message.
    pub fn push_user_message(&mut self, text: &str) {
        let body = if text.is_empty() { FILE_SENT_NOTICE } else { text };
        self.push(USER_SENDER, body);
    }

    pub fn push_file_selected(&mut self, file_name: &str) {
        self.push(USER_SENDER, &format!("Selected File: {file_name}"));
    }

    pub fn push_fetch_error(&mut self) {
        self.push(ERROR_SENDER, FETCH_FAILED_NOTICE);
    }

    /// Append an empty bot bubble and return its element id.
    pub fn begin_bot_reply(&mut self) -> String {
        let id = format!("botMessage-{}", self.bot_messages);
        self.bot_messages += 1;
        self.bubbles.push(Bubble {
            sender: BOT_SENDER.to_string(),
            body: String::new(),
            element_id: Some(id.clone()),
        });
        id
    }

    /// Append a fully revealed bot bubble.
    pub fn push_bot_reply(&mut self, text: &str) -> String {
        let id = self.begin_bot_reply();
        if let Some(bubble) = self.bubbles.last_mut() {
            bubble.body = text.to_string();
        }
        id
    }

    pub fn to_html(&self) -> String {
        self.bubbles.iter().map(Bubble::to_html).collect()
    }
}

/// `"ostwald"` → `"Ostwald"`.
pub fn capitalize_first_letter(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Escape text for use in HTML content and quoted attributes.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
