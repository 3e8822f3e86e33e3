//! Shortcut intents answered without calling the model.
//!
//! Matching is case-insensitive on the ASCII markers. Names are stored in
//! the context string as `(name: X)` markers with no escaping, so a name
//! containing `)` is cut short when recalled.

use std::sync::LazyLock;

use regex::Regex;

const NAME_DECLARATION: &str = "my name is ";
const NAME_QUERIES: [&str; 2] = ["who am i", "tell me my name"];
const IDENTITY_QUERY: &str = "who are you";

/// Fixed introduction returned for "who are you".
pub const IDENTITY_REPLY: &str = "🌍 Hello, world! 🌍 I'm Ostwald, an AI assistant created to make your life easier, more productive, and a lot more fun. Whether you're curious, seeking support, or just in need of a good chat, I'm here for you. Let's explore the endless possibilities together!.";

/// Returned for a name query when no name was ever declared.
pub const FORGOTTEN_NAME_REPLY: &str =
    "I'm sorry, I don't remember your name. Could you tell me again?";

static NAME_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(name: (.+?)\)").expect("name marker pattern is valid"));

/// What a user message asks for, if it is a shortcut.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// "my name is X" with a non-empty X.
    NameDeclaration(String),
    /// "who am i" / "tell me my name".
    NameQuery,
    /// Exactly "who are you".
    Identity,
    /// Anything else; goes to the model.
    None,
}

/// Classify a raw user message.
pub fn classify(input: &str) -> Intent {
    let lowered = input.to_ascii_lowercase();

    if let Some(pos) = lowered.find(NAME_DECLARATION) {
        // ASCII lowercasing keeps byte offsets, so `pos` indexes `input` too.
        let name = input[pos + NAME_DECLARATION.len()..].trim();
        if !name.is_empty() {
            return Intent::NameDeclaration(name.to_string());
        }
    }

    if NAME_QUERIES.iter().any(|q| lowered.contains(q)) {
        return Intent::NameQuery;
    }

    if lowered == IDENTITY_QUERY {
        return Intent::Identity;
    }

    Intent::None
}

/// Context fragment recording a declared name.
pub fn name_marker(name: &str) -> String {
    format!(" (name: {name})")
}

/// Acknowledgement for a name declaration.
pub fn acknowledge_name(name: &str) -> String {
    format!("Got it, {name}!")
}

/// The most recently declared name in a context string.
pub fn recall_name(context: &str) -> Option<&str> {
    NAME_MARKER
        .captures_iter(context)
        .last()
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Reply to a name query against the given context.
pub fn answer_name_query(context: &str) -> String {
    match recall_name(context) {
        Some(name) => format!("You are {name}."),
        None => FORGOTTEN_NAME_REPLY.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declaration_extracts_trimmed_name() {
        assert_eq!(
            classify("hi, my name is   Alice  "),
            Intent::NameDeclaration("Alice".into())
        );
    }

    #[test]
    fn declaration_marker_is_case_insensitive_but_name_keeps_case() {
        assert_eq!(
            classify("My Name Is Bob"),
            Intent::NameDeclaration("Bob".into())
        );
    }

    #[test]
    fn declaration_keeps_everything_after_marker() {
        assert_eq!(
            classify("my name is Alice and I like tea"),
            Intent::NameDeclaration("Alice and I like tea".into())
        );
    }

    #[test]
    fn empty_declaration_is_not_a_shortcut() {
        assert_eq!(classify("my name is    "), Intent::None);
    }

    #[test]
    fn name_queries() {
        assert_eq!(classify("Who am I?"), Intent::NameQuery);
        assert_eq!(classify("please tell me my name"), Intent::NameQuery);
    }

    #[test]
    fn identity_is_whole_message_only() {
        assert_eq!(classify("who are you"), Intent::Identity);
        assert_eq!(classify("Who Are You"), Intent::Identity);
        assert_eq!(classify("who are you?"), Intent::None);
        assert_eq!(classify("so who are you"), Intent::None);
    }

    #[test]
    fn declaration_wins_over_query() {
        assert_eq!(
            classify("who am i? my name is Carol"),
            Intent::NameDeclaration("Carol".into())
        );
    }

    #[test]
    fn ordinary_text_goes_to_model() {
        assert_eq!(classify("what is the capital of France?"), Intent::None);
        assert_eq!(classify(""), Intent::None);
    }

    #[test]
    fn recall_uses_most_recent_marker() {
        let context = " my name is Alice (name: Alice) hello my name is Bob (name: Bob)";
        assert_eq!(recall_name(context), Some("Bob"));
    }

    #[test]
    fn recall_without_marker() {
        assert_eq!(recall_name(" hello there"), None);
        assert_eq!(answer_name_query(" hello there"), FORGOTTEN_NAME_REPLY);
    }

    #[test]
    fn answer_and_acknowledge() {
        let context = format!(" my name is Alice{}", name_marker("Alice"));
        assert_eq!(answer_name_query(&context), "You are Alice.");
        assert_eq!(acknowledge_name("Alice"), "Got it, Alice!");
    }
}
