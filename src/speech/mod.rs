//! Speech Synthesis Module
//!
//! Text-to-speech over the OpenAI `/audio/speech` endpoint, behind the
//! `SpeechSynthesizer` trait so the pipeline can run against any backend.

mod service;

pub use service::OpenAiSpeech;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Largest input the speech endpoint accepts, in characters
pub const MAX_INPUT_CHARS: usize = 4096;

/// Voices offered by the speech endpoint
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Voice {
    #[default]
    Alloy,
    Echo,
    Fable,
    Onyx,
    Nova,
    Shimmer,
}

impl Voice {
    pub const ALL: [Voice; 6] = [
        Voice::Alloy,
        Voice::Echo,
        Voice::Fable,
        Voice::Onyx,
        Voice::Nova,
        Voice::Shimmer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Voice::Alloy => "alloy",
            Voice::Echo => "echo",
            Voice::Fable => "fable",
            Voice::Onyx => "onyx",
            Voice::Nova => "nova",
            Voice::Shimmer => "shimmer",
        }
    }
}

impl fmt::Display for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("Failed to reach the speech API: {0}")]
    Request(#[from] reqwest::Error),

    #[error("OpenAI TTS error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Speech API returned no audio")]
    EmptyAudio,

    #[error("Input of {chars} characters exceeds the {max} character limit")]
    InputTooLong { chars: usize, max: usize },
}

/// A backend that turns one piece of text into encoded audio bytes
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, voice: Voice) -> Result<Vec<u8>, SynthesisError>;

    /// Short name used in logs
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::ValueEnum;

    #[test]
    fn test_voice_names_match_api() {
        let names: Vec<&str> = Voice::ALL.iter().map(|v| v.as_str()).collect();
        assert_eq!(
            names,
            vec!["alloy", "echo", "fable", "onyx", "nova", "shimmer"]
        );
    }

    #[test]
    fn test_voice_serde_is_lowercase() {
        let json = serde_json::to_string(&Voice::Shimmer).unwrap();
        assert_eq!(json, r#""shimmer""#);
        let voice: Voice = serde_json::from_str(r#""onyx""#).unwrap();
        assert_eq!(voice, Voice::Onyx);
        assert!(serde_json::from_str::<Voice>(r#""ash""#).is_err());
    }

    #[test]
    fn test_voice_cli_parse() {
        assert_eq!(Voice::from_str("fable", true).unwrap(), Voice::Fable);
        assert!(Voice::from_str("robot", true).is_err());
    }

    #[test]
    fn test_default_voice() {
        assert_eq!(Voice::default(), Voice::Alloy);
        assert_eq!(Voice::default().to_string(), "alloy");
    }
}
