//! Meditation script generation
//!
//! Asks the chat model for a JSON script of speech and pause segments and
//! parses the reply into a `Script`.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{Script, ScriptError, Segment};
use crate::config::SecretString;
use crate::utils::{endpoint, http_client, preview};

/// Produces a script from a free-text description of the listener's state
#[async_trait]
pub trait ScriptGenerator: Send + Sync {
    async fn generate(&self, description: &str, target_seconds: u32)
    -> Result<Script, ScriptError>;
}

/// Instruction sent to the chat model
pub fn build_prompt(description: &str, target_seconds: u32) -> String {
    format!(
        "Write a short guided meditation for someone who describes their current state as:\n\
         \"{description}\"\n\n\
         The whole session, spoken text plus pauses, should last about {target_seconds} seconds. \
         Assume the text is read at a calm pace of roughly 130 words per minute.\n\n\
         Respond with a single JSON object and nothing else, in this exact shape:\n\
         {{\"segments\": [{{\"type\": \"speech\", \"content\": \"text to speak\"}}, \
         {{\"type\": \"pause\", \"content\": 3}}]}}\n\n\
         Rules:\n\
         - \"type\" is either \"speech\" or \"pause\".\n\
         - For speech, \"content\" is the text to say.\n\
         - For pause, \"content\" is the silence length in seconds as a number.\n\
         - Keep the segments in the order they should be played."
    )
}

#[derive(Debug, Deserialize)]
struct ScriptDocument {
    segments: Vec<Segment>,
}

/// Parse the model's JSON reply into a validated script
pub fn parse_script(content: &str) -> Result<Script, ScriptError> {
    let document: ScriptDocument = serde_json::from_str(content.trim())?;
    let script = Script::new(document.segments);
    script.validate()?;
    Ok(script)
}

/// Script generation through `POST {base_url}/chat/completions`
#[derive(Clone)]
pub struct OpenAiScriptWriter {
    client: Client,
    api_key: SecretString,
    url: String,
    model: String,
}

impl OpenAiScriptWriter {
    pub fn new(api_key: SecretString, base_url: &str, model: &str) -> Result<Self, ScriptError> {
        Ok(Self {
            client: http_client()?,
            api_key,
            url: endpoint(base_url, "chat/completions"),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl ScriptGenerator for OpenAiScriptWriter {
    async fn generate(
        &self,
        description: &str,
        target_seconds: u32,
    ) -> Result<Script, ScriptError> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {
                    "role": "system",
                    "content": "You are a calm meditation teacher who writes scripts as JSON.",
                },
                {
                    "role": "user",
                    "content": build_prompt(description, target_seconds),
                },
            ],
            "response_format": { "type": "json_object" },
        });

        tracing::info!(
            "OpenAI chat request: model={}, target={}s",
            self.model,
            target_seconds
        );

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
            return Err(ScriptError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let chat: ChatResponse = response.json().await?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(ScriptError::EmptyResponse)?;

        tracing::debug!("Generated script: {}", preview(&content, 500));

        let script = parse_script(&content)?;
        tracing::info!(
            "Script generated: {} segments, {:.1}s of pauses",
            script.len(),
            script.total_pause().as_secs_f64()
        );
        Ok(script)
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}
