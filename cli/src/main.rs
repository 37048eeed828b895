use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use feather_kernel::config::{PersistConfig, PersistMode};
use feather_kernel::context::AppContext;
use feather_kernel::dataset::{DatasetId, Meta, Row};
use feather_kernel::ingest::{columns_of, ingest_upload};

/// Feather dataset store CLI
#[derive(Parser, Debug)]
#[command(name = "feather")]
#[command(about = "Store and inspect uploaded tabular datasets", long_about = None)]
struct Cli {
    /// Persistence mode (memory | files); overrides PERSIST_MODE
    #[arg(long)]
    mode: Option<String>,

    /// Data directory for the files backend; overrides DATA_DIR
    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Store rows from a JSON array file under an explicit name
    Save {
        #[arg(long)]
        name: String,

        /// JSON array of row objects
        #[arg(long)]
        rows: PathBuf,

        /// JSON object of metadata (defaults to empty)
        #[arg(long)]
        meta: Option<PathBuf>,
    },

    /// Ingest a JSON array file the way the upload endpoint does
    Upload { file: PathBuf },

    /// Print one dataset, rows included
    Get { id: String },

    /// Print every dataset summary
    List,
}

/// Wrapper for JSON output of `save`
#[derive(Debug, Serialize)]
struct SaveOutput {
    dataset_id: DatasetId,
}

impl Cli {
    fn persist_config(&self) -> PersistConfig {
        let mut config = PersistConfig::from_env();
        if let Some(mode) = &self.mode {
            config.mode = PersistMode::parse(mode);
        }
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        config
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // ----------------------------
    // Select backend (once)
    // ----------------------------
    let ctx = AppContext::from_config(&cli.persist_config())
        .context("failed to initialise dataset backend")?;

    run(&ctx, cli.command)
}

fn run(ctx: &AppContext, command: Command) -> Result<()> {
    match command {
        Command::Save { name, rows, meta } => {
            let rows = read_rows(&rows)?;
            let meta = match meta {
                Some(path) => read_json::<Meta>(&path)?,
                None => Meta::new(),
            };

            let dataset_id = ctx.store().save(&name, meta, rows)?;
            print_json(&SaveOutput { dataset_id })
        }
        Command::Upload { file } => {
            let rows = read_rows(&file)?;
            let filename = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let columns = columns_of(&rows);

            let receipt = ingest_upload(ctx, &filename, &columns, rows)?;
            print_json(&receipt)
        }
        Command::Get { id } => match ctx.store().get(&DatasetId::from(id.as_str()))? {
            Some(dataset) => print_json(&dataset),
            None => bail!("dataset not found: {id}"),
        },
        Command::List => print_json(&ctx.store().list()?),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("invalid JSON in {}", path.display()))
}

fn read_rows(path: &Path) -> Result<Vec<Row>> {
    read_json::<Vec<Row>>(path)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
