//! Sequential pipeline runner: transcriber stage, then writer stage.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{error, info};

use super::markdown;
use super::transcript::TranscriptSource;
use super::writer::ArticleWriter;
use crate::errors::PipelineError;

/// Articles under this length mean the model produced nothing usable.
const MIN_ARTICLE_CHARS: usize = 100;

/// Title used when the writer fails to emit a `# ` heading.
const FALLBACK_TITLE: &str = "YouTube Blog Post";

/// Finished pipeline output, ready to persist.
#[derive(Debug, Clone)]
pub struct GeneratedArticle {
    pub title: String,
    pub content: String,
    pub video_id: String,
    pub transcript_chars: usize,
    pub word_count: usize,
    pub transcript_ms: u128,
    pub writer_ms: u128,
}

/// Abstraction over end-to-end blog generation for testability.
/// Real implementation: `BlogPipeline`. Server tests use a stub.
#[async_trait]
pub trait BlogGenerator: Send + Sync {
    async fn generate(
        &self,
        youtube_url: &str,
        video_id: &str,
        language: &str,
    ) -> Result<GeneratedArticle, PipelineError>;
}

/// The two-stage pipeline. Stages are trait objects so either end can be
/// swapped (a different transcript vendor, a different model family) without
/// touching the orchestration.
pub struct BlogPipeline {
    transcripts: Arc<dyn TranscriptSource>,
    writer: Arc<dyn ArticleWriter>,
}

impl BlogPipeline {
    pub fn new(transcripts: Arc<dyn TranscriptSource>, writer: Arc<dyn ArticleWriter>) -> Self {
        Self {
            transcripts,
            writer,
        }
    }
}

#[async_trait]
impl BlogGenerator for BlogPipeline {
    async fn generate(
        &self,
        youtube_url: &str,
        video_id: &str,
        language: &str,
    ) -> Result<GeneratedArticle, PipelineError> {
        // Stage 1: transcriber
        let stage_start = Instant::now();
        let transcript = self
            .transcripts
            .fetch(youtube_url, video_id, language)
            .await
            .inspect_err(|e| error!(video_id, error = %e, "transcriber stage failed"))?;
        let transcript_ms = stage_start.elapsed().as_millis();
        info!(
            video_id,
            chars = transcript.chars(),
            language = %transcript.language,
            elapsed_ms = transcript_ms as u64,
            "transcriber stage complete"
        );

        // Stage 2: writer
        let stage_start = Instant::now();
        let draft = self
            .writer
            .write(&transcript.text)
            .await
            .inspect_err(|e| error!(video_id, error = %e, "writer stage failed"))?;
        let writer_ms = stage_start.elapsed().as_millis();

        let content = markdown::clean_article(&draft);
        let chars = content.chars().count();
        if chars < MIN_ARTICLE_CHARS {
            return Err(PipelineError::ContentTooShort { chars });
        }

        let title =
            markdown::extract_title(&content).unwrap_or_else(|| FALLBACK_TITLE.to_string());
        let word_count = markdown::word_count(&content);
        info!(
            video_id,
            title = %title,
            words = word_count,
            elapsed_ms = writer_ms as u64,
            "writer stage complete"
        );

        Ok(GeneratedArticle {
            title,
            content,
            video_id: video_id.to_string(),
            transcript_chars: transcript.chars(),
            word_count,
            transcript_ms,
            writer_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TranscriptError;
    use crate::pipeline::transcript::Transcript;

    struct FixedTranscript(&'static str);

    #[async_trait]
    impl TranscriptSource for FixedTranscript {
        async fn fetch(
            &self,
            _youtube_url: &str,
            _video_id: &str,
            language: &str,
        ) -> Result<Transcript, TranscriptError> {
            Ok(Transcript {
                text: self.0.to_string(),
                language: language.to_string(),
            })
        }
    }

    struct FailingTranscript;

    #[async_trait]
    impl TranscriptSource for FailingTranscript {
        async fn fetch(
            &self,
            _youtube_url: &str,
            video_id: &str,
            _language: &str,
        ) -> Result<Transcript, TranscriptError> {
            Err(TranscriptError::NotFound {
                video_id: video_id.to_string(),
            })
        }
    }

    struct FixedWriter(String);

    #[async_trait]
    impl ArticleWriter for FixedWriter {
        async fn write(&self, _transcript: &str) -> Result<String, PipelineError> {
            Ok(self.0.clone())
        }
    }

    fn long_article(title: bool) -> String {
        let heading = if title { "# Rust in Production\n\n" } else { "" };
        format!("{heading}{}", "A sentence about systems programming. ".repeat(20))
    }

    #[tokio::test]
    async fn happy_path_produces_article() {
        let pipeline = BlogPipeline::new(
            Arc::new(FixedTranscript("a transcript about rust")),
            Arc::new(FixedWriter(long_article(true))),
        );
        let article = pipeline
            .generate("https://youtu.be/FdeioVndUhs", "FdeioVndUhs", "en")
            .await
            .unwrap();
        assert_eq!(article.title, "Rust in Production");
        assert_eq!(article.video_id, "FdeioVndUhs");
        assert!(article.word_count > 50);
        assert_eq!(article.transcript_chars, "a transcript about rust".len());
    }

    #[tokio::test]
    async fn missing_heading_falls_back_to_default_title() {
        let pipeline = BlogPipeline::new(
            Arc::new(FixedTranscript("t")),
            Arc::new(FixedWriter(long_article(false))),
        );
        let article = pipeline
            .generate("https://youtu.be/FdeioVndUhs", "FdeioVndUhs", "en")
            .await
            .unwrap();
        assert_eq!(article.title, FALLBACK_TITLE);
    }

    #[tokio::test]
    async fn short_output_is_rejected() {
        let pipeline = BlogPipeline::new(
            Arc::new(FixedTranscript("t")),
            Arc::new(FixedWriter("# Tiny\n\ntoo short".to_string())),
        );
        let err = pipeline
            .generate("https://youtu.be/FdeioVndUhs", "FdeioVndUhs", "en")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::ContentTooShort { .. }));
    }

    #[tokio::test]
    async fn transcript_failure_short_circuits_writer() {
        let pipeline = BlogPipeline::new(
            Arc::new(FailingTranscript),
            Arc::new(FixedWriter(long_article(true))),
        );
        let err = pipeline
            .generate("https://youtu.be/FdeioVndUhs", "FdeioVndUhs", "en")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Transcript(TranscriptError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn writer_output_is_cleaned_before_persisting() {
        let messy = format!("# Title\n\nSome **bold** claims. {}", "More text here. ".repeat(10));
        let pipeline = BlogPipeline::new(
            Arc::new(FixedTranscript("t")),
            Arc::new(FixedWriter(messy)),
        );
        let article = pipeline
            .generate("https://youtu.be/FdeioVndUhs", "FdeioVndUhs", "en")
            .await
            .unwrap();
        assert!(!article.content.contains("**"));
    }
}
