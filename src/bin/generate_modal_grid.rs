//! Generate the modal stability table.
//!
//! Usage: `generate-modal-grid [OUTPUT] [CONFIG]`

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;
use membrane_modal_grid::{run_grid, RunConfig};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Precompute eigenvalues and flutter margins over a 4D membrane parameter grid."
)]
struct Cli {
    /// Output JSON file
    #[arg(default_value = "modal-grid.json")]
    output: PathBuf,

    /// Run configuration (JSON with optional `axes` and `modal` sections);
    /// the reference grid is used when omitted
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => RunConfig::from_file(path).with_context(|| {
            format!("failed to load run configuration from {}", path.display())
        })?,
        None => RunConfig::default(),
    };

    let start = Instant::now();
    let outcome = run_grid(&config.axes, &config.modal).context("grid run rejected")?;

    outcome
        .grid
        .write_json(&cli.output)
        .with_context(|| format!("failed to write {}", cli.output.display()))?;

    let bytes = std::fs::metadata(&cli.output).map(|m| m.len()).unwrap_or(0);
    log::info!(
        "Saved {} records to {} ({:.1} KB) in {:.1}s",
        outcome.grid.points.len(),
        cli.output.display(),
        bytes as f64 / 1024.0,
        start.elapsed().as_secs_f64()
    );

    if !outcome.is_complete() {
        for failure in &outcome.failures {
            log::error!("  {:?}: {}", failure.indices, failure.error);
        }
        bail!("{} grid points failed", outcome.failures.len());
    }
    Ok(())
}
