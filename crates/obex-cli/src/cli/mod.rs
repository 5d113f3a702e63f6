//! CLI for obex-dl.

mod report;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use obex_core::config::{self, DownloadMode, ObexConfig, LISTING_PAGE_URL};
use obex_core::fetch::CurlTransport;
use obex_core::run::{self, ListingSource, RunOptions};
use std::path::PathBuf;
use std::time::Instant;

/// Download every project of the Parallax Object Exchange from a saved listing page.
#[derive(Debug, Parser)]
#[command(name = "obex-dl", version)]
#[command(about = "Download every project of a saved OBEX listing", long_about = None)]
#[command(after_help = listing_help())]
pub struct Cli {
    /// Path to the saved HTML listing page.
    #[arg(short, long, value_name = "LISTING", default_value = "obex.html")]
    pub listing: PathBuf,

    /// Download the listing page (`listing_url` in the config) instead of reading a saved copy.
    #[arg(long, conflicts_with = "listing")]
    pub fetch_listing: bool,

    /// Destination of the CSV table of projects.
    #[arg(short, long, value_name = "TABLE", default_value = "obex_table.csv")]
    pub table: PathBuf,

    /// Do not write the CSV table.
    #[arg(long, conflicts_with = "table")]
    pub no_table: bool,

    /// Directory for downloaded projects. MUST NOT exist.
    #[arg(short, long, value_name = "OUTPUT", default_value = "complete_obex")]
    pub output: PathBuf,

    /// Read configuration from this file instead of ~/.config/obex-dl/config.toml.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Save the download endpoint body, or every file on the detail page.
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Unpack downloaded zip archives.
    #[arg(long)]
    pub extract: bool,

    /// Base URL for relative links in the listing.
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Direct,
    Attachments,
}

impl From<ModeArg> for DownloadMode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Direct => DownloadMode::Direct,
            ModeArg::Attachments => DownloadMode::Attachments,
        }
    }
}

/// How a run that got through its preconditions ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    /// Items were attempted and every one failed.
    AllFailed,
}

fn listing_help() -> String {
    format!(
        "Save the listing page first, or pass --fetch-listing (the site needs these parameters):\n  {LISTING_PAGE_URL}"
    )
}

impl Cli {
    pub fn run_from_args() -> Result<Outcome> {
        Cli::parse().run()
    }

    fn load_config(&self) -> Result<ObexConfig> {
        let mut cfg = match &self.config {
            Some(path) => config::load_from_path(path)?,
            None => config::load_or_init()?,
        };
        self.apply_overrides(&mut cfg);
        cfg.base()?;
        tracing::debug!("loaded config: {:?}", cfg);
        Ok(cfg)
    }

    /// Command-line values win over the config file.
    pub fn apply_overrides(&self, cfg: &mut ObexConfig) {
        if let Some(mode) = self.mode {
            cfg.mode = mode.into();
        }
        if self.extract {
            cfg.extract_archives = true;
        }
        if let Some(base_url) = &self.base_url {
            cfg.base_url = base_url.clone();
        }
        if let Some(secs) = self.timeout {
            cfg.http.timeout_secs = secs;
        }
    }

    pub fn options(&self, cfg: &ObexConfig) -> RunOptions {
        let listing = if self.fetch_listing {
            ListingSource::Url(cfg.listing_url.clone())
        } else {
            ListingSource::File(self.listing.clone())
        };
        RunOptions {
            listing,
            table: (!self.no_table).then(|| self.table.clone()),
            output_dir: self.output.clone(),
        }
    }

    pub fn run(&self) -> Result<Outcome> {
        let cfg = self.load_config()?;
        let opts = self.options(&cfg);
        let transport = CurlTransport::new(cfg.http.clone());

        println!("Downloading. Please wait...");
        let start = Instant::now();
        let summary = run::run(&opts, &cfg, &transport, report::print_item)?;
        report::print_summary(&summary, start.elapsed());

        Ok(if summary.all_failed() {
            Outcome::AllFailed
        } else {
            Outcome::Completed
        })
    }
}
