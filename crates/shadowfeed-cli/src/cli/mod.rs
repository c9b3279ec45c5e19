//! CLI for the shadowfeed discovery pipeline.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use shadowfeed_core::collect::SourceKind;
use shadowfeed_core::config;
use std::path::PathBuf;

use commands::{run_ingest, run_normalize, run_score, IngestArgs};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "shadowfeed")]
#[command(about = "Discover new AI tools from public feeds and record them as a threat feed", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

/// Feeds selectable with `--source`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceArg {
    Github,
    Reddit,
    Hackernews,
    Directory,
}

impl From<SourceArg> for SourceKind {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Github => SourceKind::GitHub,
            SourceArg::Reddit => SourceKind::Reddit,
            SourceArg::Hackernews => SourceKind::HackerNews,
            SourceArg::Directory => SourceKind::Directory,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Collect from all feeds, process candidates and append new records.
    Run {
        /// Worker pool size (default from config, 20).
        #[arg(long, value_name = "N")]
        workers: Option<usize>,
        /// Record store CSV path.
        #[arg(long, value_name = "PATH")]
        db: Option<PathBuf>,
        /// Newline-delimited allowlist of domains never to report.
        #[arg(long, value_name = "PATH")]
        allowlist: Option<PathBuf>,
        /// Where to write the run statistics JSON.
        #[arg(long, value_name = "PATH")]
        stats_out: Option<PathBuf>,
        /// Restrict to these feeds (repeatable). Default: all.
        #[arg(long = "source", value_enum, value_name = "FEED")]
        sources: Vec<SourceArg>,
    },

    /// Print the canonical key for each URL, or "filtered".
    Normalize {
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// Enrich and score a single domain (live DNS).
    Score {
        domain: String,
        /// Source label used for the source weight.
        #[arg(long, default_value = "Hacker News")]
        source: String,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Run {
                workers,
                db,
                allowlist,
                stats_out,
                sources,
            } => {
                let cfg = config::load_or_init()?;
                tracing::debug!("loaded config: {:?}", cfg);
                let args = IngestArgs {
                    workers,
                    db,
                    allowlist,
                    stats_out,
                    sources: sources.into_iter().map(SourceKind::from).collect(),
                };
                run_ingest(&cfg, args).await?;
            }
            CliCommand::Normalize { urls } => run_normalize(&urls),
            CliCommand::Score { domain, source } => {
                let cfg = config::load_or_init()?;
                run_score(&cfg, &domain, &source).await?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
