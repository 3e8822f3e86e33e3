//! `POST /get`: the chat endpoint.

use std::path::Path;

use axum::extract::{Multipart, State};
use ostwald_core::chat::{self, Reply, Turn};
use ostwald_core::upload::UploadedFile;
use tracing::{debug, info};

use crate::AppState;
use crate::error::AppResult;

const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Read the `msg` and `file` fields of a chat form.
///
/// Unknown fields are ignored. An empty `file` part (a form submitted with
/// no file chosen) counts as no file.
pub async fn read_chat_form(mut multipart: Multipart, upload_dir: &Path) -> AppResult<Turn> {
    let mut turn = Turn::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("msg") => turn.text = field.text().await?,
            Some("file") => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let mime_type = field
                    .content_type()
                    .unwrap_or(DEFAULT_MIME_TYPE)
                    .to_string();
                let bytes = field.bytes().await?;
                if bytes.is_empty() && file_name.is_empty() {
                    continue;
                }
                turn.upload =
                    Some(UploadedFile::spool(upload_dir, &file_name, &mime_type, &bytes).await?);
            }
            other => debug!(field = ?other, "ignoring form field"),
        }
    }

    Ok(turn)
}

/// Run a turn against the configured store and model.
pub async fn run_turn(state: &AppState, turn: Turn) -> AppResult<Reply> {
    info!(
        text_len = turn.text.len(),
        file = ?turn.upload.as_ref().map(|u| u.file_name()),
        "chat turn"
    );
    let reply = chat::handle_turn(
        state.store.as_ref(),
        state.model.as_ref(),
        &state.turn_settings(),
        turn,
    )
    .await?;
    debug!(source = ?reply.source, len = reply.text.len(), "reply ready");
    Ok(reply)
}

/// `POST /get`: multipart `msg` + optional `file`; replies in plain text.
pub async fn chat_handler(State(state): State<AppState>, multipart: Multipart) -> AppResult<String> {
    let turn = read_chat_form(multipart, &state.config.upload_dir).await?;
    let reply = run_turn(&state, turn).await?;
    Ok(reply.text)
}
