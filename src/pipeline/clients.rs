//! API client construction
//!
//! Clients need the credential, which is only known once input has been
//! collected, so the pipeline builds them through a factory.

use std::sync::Arc;

use super::PipelineError;
use crate::config::{Config, SecretString};
use crate::script::{OpenAiScriptWriter, ScriptGenerator};
use crate::speech::{OpenAiSpeech, SpeechSynthesizer};

pub trait ClientFactory: Send + Sync {
    fn speech(&self, api_key: SecretString) -> Result<Arc<dyn SpeechSynthesizer>, PipelineError>;

    fn script_writer(
        &self,
        api_key: SecretString,
    ) -> Result<Arc<dyn ScriptGenerator>, PipelineError>;
}

/// Clients for the OpenAI API (or any server exposing the same endpoints)
#[derive(Debug, Clone)]
pub struct OpenAiClients {
    base_url: String,
    tts_model: String,
    chat_model: String,
}

impl OpenAiClients {
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.openai.base_url.clone(),
            tts_model: config.openai.tts_model.clone(),
            chat_model: config.openai.chat_model.clone(),
        }
    }
}

impl ClientFactory for OpenAiClients {
    fn speech(&self, api_key: SecretString) -> Result<Arc<dyn SpeechSynthesizer>, PipelineError> {
        tracing::debug!(
            "Using OpenAI speech at {} (model={})",
            self.base_url,
            self.tts_model
        );
        let speech = OpenAiSpeech::new(api_key, &self.base_url, &self.tts_model)
            .map_err(|source| PipelineError::Client(source.to_string()))?;
        Ok(Arc::new(speech))
    }

    fn script_writer(
        &self,
        api_key: SecretString,
    ) -> Result<Arc<dyn ScriptGenerator>, PipelineError> {
        tracing::debug!(
            "Using OpenAI chat at {} (model={})",
            self.base_url,
            self.chat_model
        );
        let writer = OpenAiScriptWriter::new(api_key, &self.base_url, &self.chat_model)
            .map_err(|source| PipelineError::Client(source.to_string()))?;
        Ok(Arc::new(writer))
    }
}
