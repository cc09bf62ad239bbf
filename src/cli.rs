//! Command-line front end: loads the catalog and renders views, sources and exports

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::{Arc, PoisonError};
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

use crate::catalog::aggregator::{FeedAggregator, FeedOutcome};
use crate::catalog::feed::HttpFeedSource;
use crate::catalog::query::{NsfwFilter, SortDirection, SortField, SortState};
use crate::catalog::session::{LOAD_FAILED_MESSAGE, Session, ViewStatus};
use crate::catalog::types::Extension;
use crate::config::{CatalogConfig, config_path};
use crate::export::{self, ExportFormat};
use crate::probe::board::{ProbeBoard, ProbeKey, SlotState};
use crate::probe::checker::{LivenessChecker, slot_label};

#[derive(Parser)]
#[command(name = "extension-catalog")]
#[command(
    version,
    about = "Browse, search and probe extension catalogs merged from several feeds"
)]
pub struct Cli {
    /// Config file (defaults to $XDG_CONFIG_HOME/extension-catalog/config.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Mirror logs to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the filtered and sorted catalog
    List(ViewArgs),
    /// Show the sources of one extension
    Sources {
        /// Package name of the extension
        pkg: String,
        /// Probe every source for liveness
        #[arg(long)]
        check: bool,
    },
    /// Write the filtered and sorted catalog as CSV, or JSON with --json
    Export {
        #[command(flatten)]
        view: ViewArgs,
        /// Output file (defaults to extensions_<date>.csv or .json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Probe a single URL
    Probe { url: String },
}

/// Filter and sort options shared by `list` and `export`
#[derive(Args, Debug, Clone, Default)]
pub struct ViewArgs {
    /// Free-text search over names, packages, versions and source URLs
    #[arg(short, long, default_value = "")]
    pub query: String,
    /// Exact language tag
    #[arg(long)]
    pub lang: Option<String>,
    /// yes / no; all records when omitted
    #[arg(long)]
    pub nsfw: Option<NsfwFilter>,
    /// name, pkg, lang, version, nsfw, sources or repo
    #[arg(long, default_value = "name")]
    pub sort: SortField,
    /// Sort descending
    #[arg(long)]
    pub desc: bool,
    /// JSON instead of a table or CSV
    #[arg(long)]
    pub json: bool,
}

impl ViewArgs {
    fn apply_to(&self, session: &mut Session) {
        session.set_query_text(&self.query);
        session.set_language(self.lang.clone());
        session.set_nsfw(self.nsfw.unwrap_or_default());
        let direction = if self.desc {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        };
        session.set_sort(SortState::new(self.sort, direction));
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config_file = cli.config.unwrap_or_else(config_path);
    let config = CatalogConfig::load(&config_file)?;
    info!("Using config {:?}", config_file);

    match cli.command {
        Command::List(args) => {
            let mut session = load_session(&config).await?;
            args.apply_to(&mut session);
            let mut out = io::stdout().lock();
            if args.json {
                serde_json::to_writer_pretty(&mut out, &session.view())?;
                writeln!(out)?;
            } else {
                render_table(&session.view(), &mut out)?;
                render_summary(&session, &mut out)?;
            }
        }
        Command::Sources { pkg, check } => {
            let session = load_session(&config).await?;
            let Some(ext) = session.find(&pkg) else {
                bail!("Extension {pkg} not found");
            };
            let board = session.probe_board();
            if check {
                let checker = LivenessChecker::from_config(&config.probe);
                checker.check_into(ext, &board).await;
            }
            let board = board.lock().unwrap_or_else(PoisonError::into_inner);
            render_sources(ext, &board, &mut io::stdout().lock())?;
        }
        Command::Export { view, output } => {
            let mut session = load_session(&config).await?;
            view.apply_to(&mut session);
            let format = if view.json {
                ExportFormat::Json
            } else {
                ExportFormat::Csv
            };
            let path = output.unwrap_or_else(|| export::default_file_name_today(format));
            let file =
                File::create(&path).with_context(|| format!("Failed to create {path:?}"))?;
            let rows = session.view();
            export::write(format, &rows, &mut BufWriter::new(file))?;
            writeln!(
                io::stdout().lock(),
                "Exported {} extensions to {}",
                rows.len(),
                path.display()
            )?;
        }
        Command::Probe { url } => {
            let checker = LivenessChecker::from_config(&config.probe);
            let result = checker.probe(&url).await;
            writeln!(
                io::stdout().lock(),
                "{}  {}",
                slot_label(&url, Some(SlotState::Done(result))),
                url
            )?;
        }
    }

    Ok(())
}

async fn load_session(config: &CatalogConfig) -> anyhow::Result<Session> {
    let source = HttpFeedSource::new(Duration::from_millis(config.fetch.timeout_ms));
    let aggregator = FeedAggregator::new(Arc::new(source), &config.target_language);
    let mut session = Session::new();

    match session.load(&aggregator, &config.feeds).await {
        Ok(catalog) => {
            for report in catalog.feed_reports() {
                if let FeedOutcome::Failed(reason) = &report.outcome {
                    warn!("Feed {} skipped: {}", report.name, reason);
                    eprintln!("Feed {} skipped: {}", report.name, reason);
                }
            }
        }
        Err(e) => {
            eprintln!("{LOAD_FAILED_MESSAGE}");
            return Err(e).context("failed to load catalog");
        }
    }

    Ok(session)
}

fn nsfw_badge(nsfw: bool) -> &'static str {
    if nsfw { "NSFW" } else { "SFW" }
}

/// Render the view as an aligned text table
pub fn render_table<W: Write>(view: &[&Extension], out: &mut W) -> io::Result<()> {
    let header = [
        "NAME", "PACKAGE", "LANG", "VERSION", "NSFW", "REPO", "SOURCES",
    ]
    .map(str::to_string);

    let rows: Vec<[String; 7]> = view
        .iter()
        .map(|ext| {
            [
                ext.short_name().to_string(),
                ext.pkg.clone(),
                if ext.lang.is_empty() {
                    "N/A".to_string()
                } else {
                    ext.lang.clone()
                },
                format!("v{}", ext.version),
                nsfw_badge(ext.nsfw).to_string(),
                ext.repo_origin.repo_name.clone(),
                ext.sources.len().to_string(),
            ]
        })
        .collect();

    let mut widths = header.clone().map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    for row in std::iter::once(&header).chain(rows.iter()) {
        let cells: Vec<String> = row
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect();
        writeln!(out, "{}", cells.join("  ").trim_end())?;
    }

    Ok(())
}

/// Result count line, or the empty / failure message
pub fn render_summary<W: Write>(session: &Session, out: &mut W) -> io::Result<()> {
    let status = session.status();
    match status {
        ViewStatus::Results { .. } => {
            let summary = session.summary();
            writeln!(
                out,
                "{} ({} sources)",
                status.message(),
                summary.sources
            )
        }
        _ => writeln!(out, "{}", status.message()),
    }
}

/// Render one extension's sources with their probe status
pub fn render_sources<W: Write>(ext: &Extension, board: &ProbeBoard, out: &mut W) -> io::Result<()> {
    writeln!(out, "{} - Sources", ext.name)?;
    writeln!(out, "Code: {}", ext.source_code_url())?;

    if ext.sources.is_empty() {
        return writeln!(out, "Không có sources");
    }

    writeln!(out, "Danh sách {} nguồn", ext.sources.len())?;
    for (index, source) in ext.sources.iter().enumerate() {
        let slot = board.get(&ProbeKey::new(&ext.pkg, index));
        writeln!(
            out,
            "  [{}] {} ({}) id={} {}",
            slot_label(&source.base_url, slot),
            source.name,
            source.lang,
            source.id,
            source.base_url
        )?;
    }

    Ok(())
}
