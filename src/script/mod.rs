//! Scripts and segments
//!
//! A `Script` is the ordered list of speech and pause segments a run turns
//! into audio. The simple pipeline builds one by chunking raw text; the
//! meditation pipeline gets one from the chat model (see `producer`).

mod producer;

pub use producer::{build_prompt, parse_script, OpenAiScriptWriter, ScriptGenerator};

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Longest single pause a script may ask for, in seconds
pub const MAX_PAUSE_SECONDS: f64 = 600.0;

/// One unit of a script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "lowercase")]
pub enum Segment {
    /// Text to be spoken
    Speech(String),
    /// Silence, in seconds
    Pause(f64),
}

impl Segment {
    pub fn is_pause(&self) -> bool {
        matches!(self, Segment::Pause(_))
    }
}

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Failed to reach the chat API: {0}")]
    Request(#[from] reqwest::Error),

    #[error("OpenAI chat error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Chat API returned no message content")]
    EmptyResponse,

    #[error("Generated script is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Generated script has no segments")]
    NoSegments,

    #[error("Segment {index} has an invalid pause of {seconds} seconds")]
    InvalidPause { index: usize, seconds: f64 },

    #[error("Segment {index} is speech with no text")]
    EmptySpeech { index: usize },
}

/// Ordered sequence of segments
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Script {
    segments: Vec<Segment>,
}

impl Script {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// Speech-only script made of fixed-size chunks of `text`
    pub fn from_text(text: &str, max_chars: usize) -> Self {
        Self::new(
            chunk_text(text, max_chars)
                .into_iter()
                .map(|chunk| Segment::Speech(chunk.to_string()))
                .collect(),
        )
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Total silence requested by pause segments
    pub fn total_pause(&self) -> Duration {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Pause(secs) => Duration::try_from_secs_f64(*secs).ok(),
                Segment::Speech(_) => None,
            })
            .sum()
    }

    /// Check that every pause lies in `0..=MAX_PAUSE_SECONDS` and every
    /// speech segment has text.
    pub fn validate(&self) -> Result<(), ScriptError> {
        if self.segments.is_empty() {
            return Err(ScriptError::NoSegments);
        }
        for (index, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Pause(seconds) if !is_valid_pause(*seconds) => {
                    return Err(ScriptError::InvalidPause {
                        index,
                        seconds: *seconds,
                    });
                }
                Segment::Speech(text) if text.trim().is_empty() => {
                    return Err(ScriptError::EmptySpeech { index });
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// Finite, non-negative and no longer than `MAX_PAUSE_SECONDS`
pub fn is_valid_pause(seconds: f64) -> bool {
    (0.0..=MAX_PAUSE_SECONDS).contains(&seconds)
}

/// Split `text` into consecutive pieces of at most `max_chars` characters.
///
/// Lengths count characters, not bytes, so a piece never ends inside a
/// multi-byte character. Concatenating the pieces gives back `text`. A
/// `max_chars` of zero is treated as one.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<&str> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        let cut = rest
            .char_indices()
            .nth(max_chars)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let (head, tail) = rest.split_at(cut);
        chunks.push(head);
        rest = tail;
    }

    chunks
}
