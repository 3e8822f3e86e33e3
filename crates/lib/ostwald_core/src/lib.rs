//! # ostwald_core
//!
//! Core chat logic for Ostwald.
//!
//! A turn flows through [`chat::handle_turn`]: the user message is logged,
//! the shared context is appended, [`intents`] get a chance to answer, and
//! otherwise the [`gateway`] asks the generative model.

pub mod chat;
pub mod gateway;
pub mod intents;
pub mod migrate;
pub mod models;
pub mod store;
pub mod transcript;
pub mod upload;
pub mod uuid;

/// User id of the single context row.
///
/// Every browser session reads and appends the same row, so a name declared
/// by one visitor is answered back to all of them. Known defect, kept until
/// the front-end carries a session identity.
pub const SHARED_USER_ID: &str = "unique_user_id";

/// Sender recorded for user turns.
pub const USER_SENDER: &str = "user";

/// Sender recorded for generated replies.
pub const BOT_SENDER: &str = "Ostwald";

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
