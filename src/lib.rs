//! Speechcraft - text-to-speech and guided meditations from the terminal
//!
//! Turns text into a single audio file through the OpenAI speech endpoint,
//! or asks a chat model for a meditation script of speech and pauses and
//! voices that.
//!
//! ## Features
//!
//! - **Speak:** Long text is split into chunks the speech endpoint accepts and stitched back together
//! - **Meditate:** Scripts with timed silences, rendered as real silence in the output
//! - **Formats:** MP3 (LAME) or WAV output under a fixed file name
//! - **Fail-fast:** The first failed request ends the run; nothing partial is written
//!
//! ## Quick Start
//!
//! ```bash
//! export OPENAI_API_KEY=sk-...
//!
//! # Text to speech
//! speechcraft speak --text "Hello from the terminal" --voice nova
//!
//! # Guided meditation
//! speechcraft meditate --text "calming down before sleep" --play
//! ```

pub mod audio;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod script;
pub mod speech;
pub mod utils;

// Re-export commonly used types
pub use error::{ErrorCode, SpeechcraftError};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
