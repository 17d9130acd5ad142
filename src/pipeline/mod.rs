//! Pipeline Module
//!
//! Runs collect → (generate) → synthesize → assemble → present for one
//! request. Every external call is awaited before the next one starts, and
//! the first failure ends the run with nothing presented.

mod clients;
mod present;
mod state;

pub use clients::{ClientFactory, OpenAiClients};
pub use present::{Presentation, Presenter};
pub use state::{RunState, RunTracker};

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::audio::{self, AudioError, CombinedAudio, Fragment};
use crate::config::{Config, SecretString};
use crate::error::ErrorCode;
use crate::script::{chunk_text, is_valid_pause, Script, ScriptError, Segment};
use crate::speech::{SpeechSynthesizer, SynthesisError, Voice};
use crate::utils::preview;

/// Fixed artifact names (without extension)
pub const SPEECH_FILE_STEM: &str = "speech";
pub const MEDITATION_FILE_STEM: &str = "meditation";

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(
        "Please add your OpenAI API key to continue: pass --api-key, set OPENAI_API_KEY, \
         or add api_key under [openai] in the config file."
    )]
    MissingCredential,

    #[error("Nothing to convert: the input text is empty")]
    EmptyInput,

    #[error("Failed to create API client: {0}")]
    Client(String),

    #[error("Script generation failed: {0}")]
    Generation(#[from] ScriptError),

    #[error("Error in text-to-speech conversion for {unit}: {source}")]
    Synthesis {
        unit: String,
        #[source]
        source: SynthesisError,
    },

    #[error("Could not decode audio for {unit}: {source}")]
    Decode {
        unit: String,
        #[source]
        source: AudioError,
    },

    #[error("Could not assemble audio: {0}")]
    Assembly(#[source] AudioError),

    #[error("Failed to write {}: {source}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid run transition from {from} to {to}")]
    InvalidTransition { from: RunState, to: RunState },
}

impl PipelineError {
    pub fn code(&self) -> ErrorCode {
        match self {
            PipelineError::MissingCredential => ErrorCode::MissingCredential,
            PipelineError::EmptyInput => ErrorCode::InvalidInput,
            PipelineError::Client(_) => ErrorCode::Config,
            PipelineError::Generation(_) => ErrorCode::Script,
            PipelineError::Synthesis { .. } => ErrorCode::Synthesis,
            PipelineError::Decode { .. } | PipelineError::Assembly(_) => ErrorCode::Audio,
            PipelineError::Output { .. } => ErrorCode::Io,
            PipelineError::InvalidTransition { .. } => ErrorCode::Config,
        }
    }
}

/// Everything one run needs from the user
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub text: String,
    pub voice: Voice,
    pub credential: Option<SecretString>,
}

/// Knobs that come from configuration rather than the user
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub max_chunk_chars: usize,
    pub target_seconds: u32,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_chunk_chars: config.synthesis.max_chunk_chars,
            target_seconds: config.meditation.target_seconds,
        }
    }
}

/// Result of a successful run
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub script: Script,
    pub combined: CombinedAudio,
    pub presentation: Presentation,
}

pub struct Pipeline<F: ClientFactory> {
    clients: F,
    settings: PipelineSettings,
    presenter: Presenter,
}

impl<F: ClientFactory> Pipeline<F> {
    pub fn new(clients: F, settings: PipelineSettings, presenter: Presenter) -> Self {
        Self {
            clients,
            settings,
            presenter,
        }
    }

    /// Simple pipeline: raw text in fixed-size chunks, no pauses
    pub async fn speak(
        &self,
        request: RunRequest,
        tracker: &mut RunTracker,
    ) -> Result<RunOutput, PipelineError> {
        let result = self.speak_inner(request, tracker).await;
        if let Err(ref e) = result {
            tracker.fail(e);
        }
        result
    }

    /// Meditation pipeline: the chat model writes a script of speech and
    /// pauses, which is then voiced
    pub async fn meditate(
        &self,
        request: RunRequest,
        tracker: &mut RunTracker,
    ) -> Result<RunOutput, PipelineError> {
        let result = self.meditate_inner(request, tracker).await;
        if let Err(ref e) = result {
            tracker.fail(e);
        }
        result
    }

    async fn speak_inner(
        &self,
        request: RunRequest,
        tracker: &mut RunTracker,
    ) -> Result<RunOutput, PipelineError> {
        tracker.advance(RunState::Collecting)?;
        let api_key = collect(&request)?;

        let script = Script::from_text(&request.text, self.settings.max_chunk_chars);
        tracing::info!(
            run_id = %tracker.run_id(),
            "Converting {} characters in {} chunk(s) with voice {}",
            request.text.chars().count(),
            script.len(),
            request.voice
        );

        let synthesizer = self.clients.speech(api_key)?;

        tracker.advance(RunState::Synthesizing)?;
        let fragments = synthesize_script(
            &script,
            synthesizer.as_ref(),
            request.voice,
            self.settings.max_chunk_chars,
            "chunk",
        )
        .await?;

        self.finish(script, fragments, SPEECH_FILE_STEM, tracker)
            .await
    }

    async fn meditate_inner(
        &self,
        request: RunRequest,
        tracker: &mut RunTracker,
    ) -> Result<RunOutput, PipelineError> {
        tracker.advance(RunState::Collecting)?;
        let api_key = collect(&request)?;

        let writer = self.clients.script_writer(api_key.clone())?;

        tracker.advance(RunState::Generating)?;
        tracing::info!(
            run_id = %tracker.run_id(),
            "Generating a {}s meditation for: {}",
            self.settings.target_seconds,
            preview(&request.text, 80)
        );
        let script = writer
            .generate(&request.text, self.settings.target_seconds)
            .await?;

        let synthesizer = self.clients.speech(api_key)?;

        tracker.advance(RunState::Synthesizing)?;
        let fragments = synthesize_script(
            &script,
            synthesizer.as_ref(),
            request.voice,
            self.settings.max_chunk_chars,
            "segment",
        )
        .await?;

        self.finish(script, fragments, MEDITATION_FILE_STEM, tracker)
            .await
    }

    async fn finish(
        &self,
        script: Script,
        fragments: Vec<Fragment>,
        stem: &str,
        tracker: &mut RunTracker,
    ) -> Result<RunOutput, PipelineError> {
        tracker.advance(RunState::Assembling)?;
        let combined = audio::assemble(fragments).map_err(PipelineError::Assembly)?;
        let bytes = audio::encode(combined.audio(), self.presenter.format())
            .map_err(PipelineError::Assembly)?;

        let presentation = self
            .presenter
            .present(&bytes, combined.duration(), stem)
            .await?;

        tracker.advance(RunState::Ready)?;
        Ok(RunOutput {
            script,
            combined,
            presentation,
        })
    }
}

/// Pre-flight checks before any API call
fn collect(request: &RunRequest) -> Result<SecretString, PipelineError> {
    let api_key = request
        .credential
        .as_ref()
        .filter(|k| !k.is_empty())
        .cloned()
        .ok_or(PipelineError::MissingCredential)?;

    if request.text.trim().is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    Ok(api_key)
}

/// Turn each segment into one fragment, strictly in order.
///
/// Speech longer than `max_chunk_chars` is voiced in several requests whose
/// audio is joined into a single fragment. Pauses never reach the API. The
/// first failure stops the loop, so no later unit is requested.
pub async fn synthesize_script(
    script: &Script,
    synthesizer: &dyn SpeechSynthesizer,
    voice: Voice,
    max_chunk_chars: usize,
    unit_label: &str,
) -> Result<Vec<Fragment>, PipelineError> {
    let total = script.len();
    let mut fragments = Vec::with_capacity(total);

    for (index, segment) in script.segments().iter().enumerate() {
        let unit = format!("{} {}", unit_label, index);

        let fragment = match segment {
            Segment::Pause(seconds) => {
                let duration = Some(*seconds)
                    .filter(|s| is_valid_pause(*s))
                    .and_then(|s| Duration::try_from_secs_f64(s).ok())
                    .ok_or(PipelineError::Generation(ScriptError::InvalidPause {
                        index,
                        seconds: *seconds,
                    }))?;
                tracing::debug!("{}/{}: {:.2}s pause", index + 1, total, seconds);
                Fragment::Silence(duration)
            }
            Segment::Speech(text) => {
                tracing::info!(
                    "{}/{}: synthesizing {} ({} chars) via {}",
                    index + 1,
                    total,
                    unit,
                    text.chars().count(),
                    synthesizer.name()
                );

                let mut joined: Option<audio::AudioFragment> = None;
                for piece in chunk_text(text, max_chunk_chars) {
                    let bytes = synthesizer.synthesize(piece, voice).await.map_err(|source| {
                        PipelineError::Synthesis {
                            unit: unit.clone(),
                            source,
                        }
                    })?;
                    let decoded =
                        audio::decode_audio(bytes).map_err(|source| PipelineError::Decode {
                            unit: unit.clone(),
                            source,
                        })?;
                    match joined.as_mut() {
                        Some(existing) => {
                            existing
                                .append(&decoded)
                                .map_err(|source| PipelineError::Decode {
                                    unit: unit.clone(),
                                    source,
                                })?
                        }
                        None => joined = Some(decoded),
                    }
                }

                match joined {
                    Some(audio) => Fragment::Audio(audio),
                    None => Fragment::Silence(Duration::ZERO),
                }
            }
        };

        fragments.push(fragment);
    }

    Ok(fragments)
}
