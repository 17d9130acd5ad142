//! OpenAI TTS client

use async_trait::async_trait;
use reqwest::Client;

use super::{SpeechSynthesizer, SynthesisError, Voice, MAX_INPUT_CHARS};
use crate::config::SecretString;
use crate::utils::{endpoint, http_client};

/// Speech synthesis through `POST {base_url}/audio/speech`
#[derive(Clone)]
pub struct OpenAiSpeech {
    client: Client,
    api_key: SecretString,
    url: String,
    model: String,
}

impl OpenAiSpeech {
    pub fn new(api_key: SecretString, base_url: &str, model: &str) -> Result<Self, SynthesisError> {
        Ok(Self::with_client(http_client()?, api_key, base_url, model))
    }

    /// Create with custom HTTP client
    pub fn with_client(client: Client, api_key: SecretString, base_url: &str, model: &str) -> Self {
        Self {
            client,
            api_key,
            url: endpoint(base_url, "audio/speech"),
            model: model.to_string(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAiSpeech {
    async fn synthesize(&self, text: &str, voice: Voice) -> Result<Vec<u8>, SynthesisError> {
        let chars = text.chars().count();
        if chars > MAX_INPUT_CHARS {
            return Err(SynthesisError::InputTooLong {
                chars,
                max: MAX_INPUT_CHARS,
            });
        }

        let body = serde_json::json!({
            "model": self.model,
            "input": text,
            "voice": voice.as_str(),
            "response_format": "mp3",
        });

        tracing::debug!("OpenAI TTS request: {} chars, voice={}", chars, voice);

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SynthesisError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let audio_bytes = response.bytes().await?.to_vec();
        if audio_bytes.is_empty() {
            return Err(SynthesisError::EmptyAudio);
        }

        tracing::info!(
            "OpenAI TTS: generated {} bytes of audio (voice={}, model={})",
            audio_bytes.len(),
            voice,
            self.model,
        );

        Ok(audio_bytes)
    }

    fn name(&self) -> &str {
        "openai"
    }
}
