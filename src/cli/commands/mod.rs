//! CLI parser and dispatch.

mod classify;
mod crawl;
mod evaluate;
mod ocr;
mod patterns;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::models::SourceTag;

#[derive(Parser)]
#[command(name = "sponsorlens")]
#[command(about = "Sponsored post detection for Naver blog search")]
#[command(version)]
pub struct Cli {
    /// Patterns file (overrides auto-discovery)
    #[arg(short, long, global = true, env = "SPONSOR_PATTERNS_FILE")]
    patterns: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

/// Options shared by the commands that touch the network.
#[derive(clap::Args, Debug, Clone)]
struct FetchArgs {
    /// User agent: omit for desktop Chrome, "impersonate" for a random browser
    #[arg(long, env = "HTTP_USER_AGENT")]
    user_agent: Option<String>,

    /// Tesseract binary
    #[arg(long, env = "TESSERACT_PATH", default_value = "tesseract")]
    tesseract: String,

    /// Image proxy used when a direct download fails
    #[arg(long, env = "WORKER_URL")]
    worker_url: Option<String>,
}

/// Text origin for `classify`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
enum TextSource {
    #[default]
    Description,
    Paragraph,
    ImageOcr,
    StickerOcr,
}

impl From<TextSource> for SourceTag {
    fn from(value: TextSource) -> Self {
        match value {
            TextSource::Description => SourceTag::Description,
            TextSource::Paragraph => SourceTag::Paragraph,
            TextSource::ImageOcr => SourceTag::ImageOcr,
            TextSource::StickerOcr => SourceTag::StickerOcr,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server and OCR worker (default)
    Serve,

    /// Classify a piece of text against the pattern tables
    Classify {
        /// Text to classify (reads stdin when omitted)
        text: Option<String>,
        /// Where the text came from
        #[arg(short, long, value_enum, default_value_t = TextSource::Description)]
        source: TextSource,
    },

    /// Crawl a blog post and print the extracted fields
    Crawl {
        url: String,
        /// Treat the post as recent-era (only first-of-each fields)
        #[arg(long)]
        recent: bool,
        #[command(flatten)]
        fetch: FetchArgs,
    },

    /// Run OCR on one image URL
    Ocr {
        url: String,
        #[command(flatten)]
        fetch: FetchArgs,
    },

    /// Evaluate one blog post end to end
    Evaluate {
        url: String,
        /// Search snippet to classify before crawling
        #[arg(short, long, default_value = "")]
        description: String,
        /// Post date as YYYYMMDD
        #[arg(long, default_value = "")]
        date: String,
        /// Process background OCR inline until the job completes
        #[arg(short, long)]
        follow: bool,
        /// Print the verdict as JSON
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        fetch: FetchArgs,
    },

    /// Print the effective pattern tables as TOML
    Patterns,
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let patterns = cli.patterns.as_deref();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve::cmd_serve(patterns).await,
        Commands::Classify { text, source } => {
            classify::cmd_classify(patterns, text, source.into()).await
        }
        Commands::Crawl { url, recent, fetch } => {
            crawl::cmd_crawl(patterns, &url, recent, &fetch).await
        }
        Commands::Ocr { url, fetch } => ocr::cmd_ocr(&url, &fetch).await,
        Commands::Evaluate {
            url,
            description,
            date,
            follow,
            json,
            fetch,
        } => {
            let options = evaluate::EvaluateOptions {
                description,
                date,
                follow,
                json,
            };
            evaluate::cmd_evaluate(patterns, &url, options, &fetch).await
        }
        Commands::Patterns => patterns::cmd_patterns(patterns).await,
    }
}
