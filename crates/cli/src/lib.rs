use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pdf_overlay_core::{
    plan_draw_calls, restore, EditorConfig, JsonFileSessionStore, MemorySessionStore,
    PageGeometry, RestoreOutcome, Rotation, SessionStore, StaticRasterizer,
};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "pdf-overlay")]
#[command(about = "PDF text overlay CLI")]
pub struct Cli {
    /// Editor configuration file (JSON); defaults and PDF_OVERLAY_* variables otherwise.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the text runs a save of the session would write, as JSON.
    Plan {
        #[arg(long, value_name = "FILE")]
        session: PathBuf,
        #[arg(long, value_name = "FILE")]
        pages: PathBuf,
    },
    /// Report whether a saved session would restore against the given pages.
    CheckSession {
        #[arg(long, value_name = "FILE")]
        session: PathBuf,
        #[arg(long, value_name = "FILE")]
        pages: PathBuf,
    },
    /// Print CLI version.
    Version,
}

/// One page as listed in a `--pages` file
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageSpec {
    width: f32,
    height: f32,
    #[serde(default)]
    rotation: Rotation,
    #[serde(default)]
    offset_x: f32,
    #[serde(default)]
    offset_y: f32,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
enum CheckOutput {
    Restored {
        annotations: usize,
        #[serde(rename = "currentPage")]
        current_page: u32,
        pages: u32,
    },
    Discarded {
        reason: String,
    },
    Empty,
}

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    match cli.command {
        Commands::Plan { session, pages } => {
            let config = load_config(cli.config.as_deref())?;
            run_plan(&session, &pages, &config)
        }
        Commands::CheckSession { session, pages } => {
            let config = load_config(cli.config.as_deref())?;
            run_check_session(&session, &pages, &config)
        }
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn run_plan(session: &Path, pages: &Path, config: &EditorConfig) -> Result<()> {
    ensure_file_exists(session)?;
    let geometries = load_pages(pages)?;

    let snapshot = JsonFileSessionStore::with_path(session)
        .load()
        .context("failed to read session")?
        .with_context(|| format!("no session in {}", session.display()))?;

    let calls = plan_draw_calls(&snapshot.annotations, &geometries, config)
        .context("session cannot be saved")?;
    log::info!("planned {} text runs", calls.len());

    let json = serde_json::to_string_pretty(&calls)?;
    println!("{json}");

    Ok(())
}

fn run_check_session(session: &Path, pages: &Path, config: &EditorConfig) -> Result<()> {
    ensure_file_exists(session)?;
    let geometries = load_pages(pages)?;

    // Restore clears a discarded session; check a copy so the file stays put.
    let output = match JsonFileSessionStore::with_path(session).load() {
        Ok(Some(snapshot)) => {
            let mut store = MemorySessionStore::with_snapshot(snapshot);
            let mut rasterizer = StaticRasterizer::new(geometries);
            match restore(&mut store, &mut rasterizer, config) {
                RestoreOutcome::Restored(restored) => CheckOutput::Restored {
                    annotations: restored.controller.store().len(),
                    current_page: restored.controller.current_page(),
                    pages: restored.controller.page_count(),
                },
                RestoreOutcome::Discarded(error) => CheckOutput::Discarded {
                    reason: error.to_string(),
                },
                RestoreOutcome::Empty => CheckOutput::Empty,
            }
        }
        Ok(None) => CheckOutput::Empty,
        Err(error) => CheckOutput::Discarded {
            reason: error.to_string(),
        },
    };

    let json = serde_json::to_string_pretty(&output)?;
    println!("{json}");

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<EditorConfig> {
    match path {
        Some(path) => EditorConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => EditorConfig::from_env().context("invalid PDF_OVERLAY_* environment"),
    }
}

fn load_pages(path: &Path) -> Result<Vec<PageGeometry>> {
    ensure_file_exists(path)?;

    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let specs: Vec<PageSpec> = serde_json::from_slice(&bytes)
        .with_context(|| format!("failed to parse page list {}", path.display()))?;

    if specs.is_empty() {
        anyhow::bail!("page list is empty: {}", path.display());
    }

    Ok(specs
        .into_iter()
        .map(|spec| {
            PageGeometry::new(spec.width, spec.height, spec.rotation)
                .with_offset(spec.offset_x, spec.offset_y)
        })
        .collect())
}

fn ensure_file_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("file does not exist: {}", path.display());
    }

    if !path.is_file() {
        anyhow::bail!("path is not a file: {}", path.display());
    }

    Ok(())
}
