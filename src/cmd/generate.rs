//! One-shot generation command — `blogsmith generate <url>`.
//!
//! Runs the same two-stage pipeline the server uses, without touching the
//! database, and writes the article (and optionally a PDF) to disk.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};

use blogsmith::config::AppConfig;
use blogsmith::pipeline::{BlogGenerator, BlogPipeline, OpenAiWriter, SupadataClient};
use blogsmith::validate;

pub async fn cmd_generate(
    youtube_url: &str,
    language: &str,
    output: Option<PathBuf>,
    pdf: bool,
) -> Result<()> {
    let config = AppConfig::from_env().context("Failed to load configuration")?;

    if !validate::validate_youtube_url(youtube_url) {
        bail!("Not a valid YouTube URL: {}", youtube_url);
    }
    let video_id = validate::extract_video_id(youtube_url)
        .with_context(|| format!("Could not extract a video ID from {}", youtube_url))?;

    let pipeline = BlogPipeline::new(
        Arc::new(SupadataClient::new(config.supadata_api_key.clone())),
        Arc::new(OpenAiWriter::new(
            config.openai_api_key.clone(),
            config.openai_model.clone(),
        )),
    );

    println!("Generating article for video {}...", video_id);
    let article = pipeline
        .generate(youtube_url, &video_id, language)
        .await
        .context("Blog generation failed")?;

    let stem = validate::sanitize_filename(&article.title);
    let md_path = output.unwrap_or_else(|| PathBuf::from(format!("{}.md", stem)));

    let header = format!(
        "<!-- generated from {} on {} -->\n\n",
        youtube_url,
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    );
    std::fs::write(&md_path, format!("{}{}", header, article.content))
        .with_context(|| format!("Failed to write {}", md_path.display()))?;
    println!(
        "Wrote {} ({} words, transcript {} chars)",
        md_path.display(),
        article.word_count,
        article.transcript_chars
    );

    if pdf {
        let pdf_path = md_path.with_extension("pdf");
        let bytes = blogsmith::pdf::render(&article.content)?;
        std::fs::write(&pdf_path, bytes)
            .with_context(|| format!("Failed to write {}", pdf_path.display()))?;
        println!("Wrote {}", pdf_path.display());
    }

    Ok(())
}
