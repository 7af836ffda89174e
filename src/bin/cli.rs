//! webcorpus CLI
//!
//! Crawl news sources of a language, then extract validated articles.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use webcorpus::{
    error::{AppError, Result},
    language,
    models::Config,
    pipeline,
};

/// webcorpus - Per-language News Corpus Builder
#[derive(Parser, Debug)]
#[command(
    name = "webcorpus",
    version,
    about = "Build per-language text corpora from news websites"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl all registered sources of a language, pass after pass
    Fetch {
        /// Language code or name (e.g. `hi` or `hindi`)
        #[arg(short, long)]
        lang: String,

        /// Stop after this many passes (default: run until interrupted)
        #[arg(long)]
        passes: Option<usize>,
    },

    /// Extract validated articles from the crawled pages
    Process {
        #[arg(short, long)]
        lang: String,
    },

    /// Register news site home pages as sources
    AddSources {
        #[arg(short, long)]
        lang: String,

        /// Home page URLs
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// Validate the configuration file
    Validate,

    /// Show corpus status for a language
    Info {
        #[arg(short, long)]
        lang: String,
    },
}

/// Initialize logging with a default filter, overridable by `RUST_LOG`.
fn init_logging(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn resolve_lang(lang: &str) -> Result<String> {
    language::resolve_code(lang).ok_or_else(|| AppError::UnsupportedLanguage(lang.to_string()))
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = Config::load(&cli.config);
    let level = match (&loaded, cli.verbose) {
        (_, true) => "debug".to_string(),
        (Ok(config), false) => config.logging.level.clone(),
        (Err(_), false) => "info".to_string(),
    };
    init_logging(&level);

    let config = match loaded {
        Ok(config) => {
            log::info!("Loaded configuration from {}", cli.config.display());
            config
        }
        Err(e) => {
            log::warn!(
                "Config load failed from {}: {}. Using defaults.",
                cli.config.display(),
                e
            );
            Config::default()
        }
    };
    if let Err(e) = config.validate() {
        log::error!("Config validation failed: {}", e);
        return Err(e);
    }
    let config = Arc::new(config);

    match cli.command {
        Command::Fetch { lang, passes } => {
            let lang = resolve_lang(&lang)?;
            let completed = pipeline::run_fetch(Arc::clone(&config), &lang, passes).await?;
            log::info!("Finished after {} pass(es)", completed);
        }

        Command::Process { lang } => {
            let lang = resolve_lang(&lang)?;
            pipeline::run_process(&config, &lang).await?;
        }

        Command::AddSources { lang, urls } => {
            let lang = resolve_lang(&lang)?;
            pipeline::run_add_sources(&config, &lang, &urls)?;
        }

        Command::Validate => {
            log::info!("Validating configuration...");
            // Reaching this point means validation already passed
            log::info!("✓ Config OK");
            log::info!("  Sources:    {}", config.paths.sources_dir.display());
            log::info!("  Corpus:     {}", config.paths.corpus_dir.display());
            log::info!("  Job state:  {}", config.paths.jobdir_root.display());
            log::info!("  Logs:       {}", config.paths.log_dir.display());
        }

        Command::Info { lang } => {
            let lang = resolve_lang(&lang)?;
            pipeline::run_info(&config, &lang).await?;
        }
    }

    log::info!("Done!");

    Ok(())
}
