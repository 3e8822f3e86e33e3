//! One chat turn, end to end.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::gateway::{self, GatewayError, GenerativeModel};
use crate::intents::{self, Intent};
use crate::store::{ChatStore, StoreError, render_history};
use crate::upload::UploadedFile;
use crate::{BOT_SENDER, SHARED_USER_ID, USER_SENDER};

/// Errors that end a turn without a reply.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Per-server turn settings.
#[derive(Debug, Clone)]
pub struct TurnSettings {
    /// Context row every turn reads and appends.
    pub user_id: String,
    /// Prefix the prompt with the logged conversation.
    pub include_history: bool,
}

impl Default for TurnSettings {
    fn default() -> Self {
        Self {
            user_id: SHARED_USER_ID.to_string(),
            include_history: false,
        }
    }
}

/// A submitted message.
#[derive(Debug, Default)]
pub struct Turn {
    pub text: String,
    pub upload: Option<UploadedFile>,
}

/// Where a reply came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    Shortcut,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub source: ReplySource,
}

impl Reply {
    fn shortcut(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: ReplySource::Shortcut,
        }
    }
}

/// Handle one turn.
///
/// The user message is logged and the context appended (with the name
/// marker, for a declaration) in a single update before any shortcut or
/// model call. Generated replies are logged; shortcut replies are not.
pub async fn handle_turn(
    store: &dyn ChatStore,
    model: &dyn GenerativeModel,
    settings: &TurnSettings,
    turn: Turn,
) -> Result<Reply, ChatError> {
    let Turn { text, upload } = turn;

    store.record_message(USER_SENDER, &text).await?;

    let intent = intents::classify(&text);
    let mut fragment = format!(" {text}");
    if let Intent::NameDeclaration(name) = &intent {
        fragment.push_str(&intents::name_marker(name));
    }
    let context = store.append_context(&settings.user_id, &fragment).await?;
    debug!(?intent, context_len = context.context.len(), "context updated");

    match intent {
        Intent::NameDeclaration(name) => {
            info!(name = %name, "name declared");
            return Ok(Reply::shortcut(intents::acknowledge_name(&name)));
        }
        Intent::NameQuery => {
            return Ok(Reply::shortcut(intents::answer_name_query(&context.context)));
        }
        Intent::Identity => return Ok(Reply::shortcut(intents::IDENTITY_REPLY)),
        Intent::None => {}
    }

    let history = if settings.include_history {
        Some(render_history(&store.history(None).await?))
    } else {
        None
    };

    let generated = gateway::generate_reply(
        model,
        &context.context,
        &text,
        history.as_deref(),
        upload,
    )
    .await?;

    if let Err(e) = store.record_message(BOT_SENDER, &generated).await {
        warn!("failed to record bot reply: {e}");
    }

    Ok(Reply {
        text: generated,
        source: ReplySource::Model,
    })
}
