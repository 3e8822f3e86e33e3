//! `POST /stream`: the chat endpoint with a server-paced reveal.
//!
//! Emits one `char` event per reveal frame and a final `done` event. The
//! stream ends early when the client disconnects or the server shuts down.

use std::convert::Infallible;

use axum::extract::{Multipart, State};
use axum::response::sse::{Event, Sse};
use futures_util::{Stream, StreamExt, stream};
use ostwald_core::transcript::reveal::reveal_stream;

use crate::AppState;
use crate::error::AppResult;
use crate::handlers::chat::{read_chat_form, run_turn};

pub async fn stream_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let turn = read_chat_form(multipart, &state.config.upload_dir).await?;
    let reply = run_turn(&state, turn).await?;

    let frames = reveal_stream(
        reply.text,
        state.config.reveal_interval,
        state.shutdown.child_token(),
    )
    .map(|frame| Ok::<_, Infallible>(Event::default().event("char").data(frame)));
    let done = stream::once(async { Ok::<_, Infallible>(Event::default().event("done").data("")) });

    Ok(Sse::new(frames.chain(done)))
}
