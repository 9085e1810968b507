use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod cmd;

#[derive(Parser)]
#[command(name = "blogsmith")]
#[command(version, about = "Turn YouTube videos into publishable blog articles")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP service
    Serve {
        /// Port to serve on
        #[arg(short, long, default_value = "8080")]
        port: u16,

        /// Database path (overrides BLOGSMITH_DB_PATH)
        #[arg(long)]
        db_path: Option<PathBuf>,

        /// Enable dev mode (bind 0.0.0.0, CORS permissive for a local UI dev server)
        #[arg(long)]
        dev: bool,
    },
    /// Initialize the database and exit
    InitDb {
        /// Database path (overrides BLOGSMITH_DB_PATH)
        #[arg(long)]
        db_path: Option<PathBuf>,
    },
    /// Generate an article from a single video, writing Markdown to disk
    Generate {
        /// YouTube video URL
        youtube_url: String,

        /// Transcript language
        #[arg(short, long, default_value = "en")]
        language: String,

        /// Output path (defaults to <title>.md)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also export a PDF next to the Markdown file
        #[arg(long)]
        pdf: bool,
    },
    /// View or validate configuration
    Config {
        /// Only check that required variables are present
        #[arg(long)]
        validate: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, db_path, dev } => cmd::cmd_serve(port, db_path, dev).await?,
        Commands::InitDb { db_path } => cmd::cmd_init_db(db_path)?,
        Commands::Generate {
            youtube_url,
            language,
            output,
            pdf,
        } => cmd::cmd_generate(&youtube_url, &language, output, pdf).await?,
        Commands::Config { validate } => cmd::cmd_config(validate)?,
    }

    Ok(())
}
