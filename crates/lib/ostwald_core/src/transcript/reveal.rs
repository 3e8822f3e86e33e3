//! Character-by-character reveal of a bot reply.
//!
//! [`Reveal`] is a lazy, finite sequence of HTML frames, one per character.
//! Build a new one to restart. [`reveal_stream`] paces the frames on a
//! timer and stops as soon as its cancellation token fires or the consumer
//! drops it.

use std::ops::Range;
use std::sync::LazyLock;
use std::time::Duration;

use futures_util::Stream;
use futures_util::stream;
use regex::Regex;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

use super::escape_html;

/// Delay between two revealed characters.
pub const REVEAL_INTERVAL: Duration = Duration::from_millis(30);

/// Term whose characters are wrapped with the `highlight` class.
pub const HIGHLIGHT_TERM: &str = "india";

static HIGHLIGHT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("(?i){}", regex::escape(HIGHLIGHT_TERM)))
        .expect("highlight pattern is valid")
});

/// Frames for one reply.
#[derive(Debug, Clone)]
pub struct Reveal {
    chars: Vec<char>,
    highlighted: Vec<bool>,
    pos: usize,
}

impl Reveal {
    pub fn new(text: &str) -> Self {
        let highlighted = highlight_mask(text);
        Self {
            chars: text.chars().collect(),
            highlighted,
            pos: 0,
        }
    }

    /// Number of frames still to come.
    pub fn remaining(&self) -> usize {
        self.chars.len() - self.pos
    }
}

impl Iterator for Reveal {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let c = *self.chars.get(self.pos)?;
        let highlight = self.highlighted[self.pos];
        self.pos += 1;
        Some(render_frame(c, highlight))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining(), Some(self.remaining()))
    }
}

impl ExactSizeIterator for Reveal {}

/// HTML appended for one character.
///
/// Spaces stay bare, newlines become `<br>`, carriage returns vanish;
/// everything else is wrapped in a span.
pub fn render_frame(c: char, highlight: bool) -> String {
    match c {
        ' ' => " ".to_string(),
        '\n' => "<br>".to_string(),
        '\r' => String::new(),
        _ => {
            let class = if highlight { "highlight" } else { "" };
            format!(
                r#"<span class="{class}">{}</span>"#,
                escape_html(c.encode_utf8(&mut [0; 4]))
            )
        }
    }
}

/// One flag per character of `text`, set inside a match of [`HIGHLIGHT_TERM`].
fn highlight_mask(text: &str) -> Vec<bool> {
    let hits: Vec<Range<usize>> = HIGHLIGHT.find_iter(text).map(|m| m.range()).collect();
    text.char_indices()
        .map(|(at, _)| hits.iter().any(|hit| hit.contains(&at)))
        .collect()
}

/// Pace `text`'s frames at `every`, stopping early on `cancel`.
///
/// The first frame is emitted immediately.
pub fn reveal_stream(
    text: String,
    every: Duration,
    cancel: CancellationToken,
) -> impl Stream<Item = String> + Send + 'static {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    stream::unfold(
        (Reveal::new(&text), ticker, cancel),
        |(mut reveal, mut ticker, cancel)| async move {
            let cancelled = tokio::select! {
                biased;
                _ = cancel.cancelled() => true,
                _ = ticker.tick() => false,
            };
            if cancelled {
                return None;
            }
            let frame = reveal.next()?;
            Some((frame, (reveal, ticker, cancel)))
        },
    )
}
