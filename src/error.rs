//! Top-level error type
//!
//! Each pipeline stage has its own error enum; `SpeechcraftError` gathers them
//! so the CLI can map any failure to a stable exit code.

use thiserror::Error;

use crate::audio::AudioError;
use crate::pipeline::PipelineError;
use crate::script::ScriptError;
use crate::speech::SynthesisError;

/// Stable classification used for process exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    MissingCredential,
    InvalidInput,
    Synthesis,
    Script,
    Audio,
    Io,
    Config,
}

impl ErrorCode {
    /// Exit status reported by the binary
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorCode::MissingCredential => 2,
            ErrorCode::InvalidInput => 3,
            ErrorCode::Synthesis => 10,
            ErrorCode::Script => 11,
            ErrorCode::Audio => 12,
            ErrorCode::Io => 13,
            ErrorCode::Config => 78,
        }
    }
}

#[derive(Debug, Error)]
pub enum SpeechcraftError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    #[error(transparent)]
    Script(#[from] ScriptError),

    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SpeechcraftError {
    pub fn code(&self) -> ErrorCode {
        match self {
            SpeechcraftError::Pipeline(e) => e.code(),
            SpeechcraftError::Synthesis(_) => ErrorCode::Synthesis,
            SpeechcraftError::Script(_) => ErrorCode::Script,
            SpeechcraftError::Audio(_) => ErrorCode::Audio,
            SpeechcraftError::Io(_) => ErrorCode::Io,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credential_maps_to_dedicated_code() {
        let err = SpeechcraftError::from(PipelineError::MissingCredential);
        assert_eq!(err.code(), ErrorCode::MissingCredential);
        assert_eq!(err.code().exit_code(), 2);
    }

    #[test]
    fn test_synthesis_failure_inside_pipeline_keeps_its_code() {
        let err = SpeechcraftError::from(PipelineError::Synthesis {
            unit: "chunk 3".to_string(),
            source: SynthesisError::EmptyAudio,
        });
        assert_eq!(err.code(), ErrorCode::Synthesis);
        assert!(err.to_string().contains("chunk 3"));
    }

    #[test]
    fn test_io_error_code() {
        let err = SpeechcraftError::from(std::io::Error::other("disk full"));
        assert_eq!(err.code(), ErrorCode::Io);
        assert_eq!(err.code().exit_code(), 13);
    }
}
