//! Writer stage — turns a transcript into a Markdown article via OpenAI.

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use tracing::info;

use crate::errors::PipelineError;

/// Transcripts beyond this are truncated before prompting; long videos would
/// otherwise blow past the model's context for no quality gain.
const MAX_TRANSCRIPT_CHARS: usize = 15_000;
const MAX_COMPLETION_TOKENS: u32 = 5000;
const TEMPERATURE: f32 = 0.2;

/// How an agent is primed, in the role/goal/backstory framing the original
/// crew used. Rendered into the chat system prompt.
#[derive(Debug, Clone)]
pub struct AgentProfile {
    pub role: &'static str,
    pub goal: &'static str,
    pub backstory: &'static str,
}

impl AgentProfile {
    pub fn writer() -> Self {
        Self {
            role: "Blog Writer",
            goal: "Write a detailed blog article from the video transcript",
            backstory: "A professional technical writer who creates clean, \
                        well-formatted blog posts without markdown artifacts, \
                        preserving every specific tool name, comparison, and \
                        recommendation from the source material.",
        }
    }

    pub fn system_prompt(&self) -> String {
        format!("You are a {}. {} {}", self.role, self.goal, self.backstory)
    }
}

fn user_prompt(transcript: &str) -> String {
    let truncated: String = transcript.chars().take(MAX_TRANSCRIPT_CHARS).collect();
    format!(
        "Create a comprehensive, well-formatted blog article from the following \
         YouTube transcript.\n\n\
         FORMATTING REQUIREMENTS:\n\
         - Use clean Markdown formatting\n\
         - Start with a compelling title using # (single hash only)\n\
         - Use ## for main sections and ### for subsections\n\
         - Write in complete sentences and paragraphs\n\
         - Use bullet points (-) for lists, not asterisks\n\
         - Proper spacing between sections\n\n\
         CONTENT REQUIREMENTS:\n\
         - Preserve all specific tool names, company names, and technical terms\n\
         - Include detailed explanations and comparisons\n\
         - Maintain the original structure and recommendations\n\
         - Add an engaging introduction and conclusion\n\n\
         AVOID:\n\
         - Markdown artifacts (**, ---, ||, etc.)\n\
         - Excessive symbols or decorative elements\n\
         - Vague generalizations\n\n\
         Transcript:\n{truncated}"
    )
}

/// Produces the article body from a transcript. Real implementation:
/// `OpenAiWriter`. Tests substitute a double.
#[async_trait]
pub trait ArticleWriter: Send + Sync {
    async fn write(&self, transcript: &str) -> Result<String, PipelineError>;
}

pub struct OpenAiWriter {
    client: Client<OpenAIConfig>,
    model: String,
    profile: AgentProfile,
}

impl OpenAiWriter {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key.into());
        Self {
            client: Client::with_config(config),
            model: model.into(),
            profile: AgentProfile::writer(),
        }
    }
}

#[async_trait]
impl ArticleWriter for OpenAiWriter {
    async fn write(&self, transcript: &str) -> Result<String, PipelineError> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .temperature(TEMPERATURE)
            .max_tokens(MAX_COMPLETION_TOKENS)
            .messages([
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(self.profile.system_prompt())
                    .build()
                    .map_err(|e| PipelineError::Writer(e.to_string()))?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(user_prompt(transcript))
                    .build()
                    .map_err(|e| PipelineError::Writer(e.to_string()))?
                    .into(),
            ])
            .build()
            .map_err(|e| PipelineError::Writer(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| PipelineError::Writer(e.to_string()))?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(PipelineError::Writer(
                "model returned an empty completion".to_string(),
            ));
        }

        info!(model = %self.model, chars = content.chars().count(), "article drafted");
        Ok(content)
    }
}
