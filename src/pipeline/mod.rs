//! Blog generation pipeline — transcript in, article out.
//!
//! ## Module Map
//!
//! ```text
//!   youtube_url, language
//!          │
//!          v
//!   runner.rs      BlogPipeline (implements BlogGenerator)
//!          │
//!          │ stage 1: transcriber
//!          v
//!   transcript.rs  SupadataClient (implements TranscriptSource)
//!          │
//!          │ stage 2: writer
//!          v
//!   writer.rs      OpenAiWriter (implements ArticleWriter)
//!          │
//!          v
//!   markdown.rs    clean_article / extract_title / word_count
//! ```
//!
//! The two stages run strictly in sequence: the writer consumes the
//! transcriber's output the way the original crew wired task context. Both
//! stage implementations sit behind traits (`TranscriptSource`,
//! `ArticleWriter`) so the server tests substitute doubles without touching
//! the network.

pub mod markdown;
pub mod runner;
pub mod transcript;
pub mod writer;

pub use runner::{BlogGenerator, BlogPipeline, GeneratedArticle};
pub use transcript::{SupadataClient, Transcript, TranscriptSource};
pub use writer::{AgentProfile, ArticleWriter, OpenAiWriter};
