use anyhow::{bail, Context, Result};
use clap::Parser;
use fqc_lib::graph::ViewerGraph;
use fqc_lib::scan::Scanner;
use fqc_server::{AppState, ServerOpts};
use log::info;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "fqc",
    version,
    about = "Serve a browser-based viewer for fMRIPrep QC figures"
)]
struct Cli {
    /// fMRIPrep derivatives folder (the directory holding sub-*)
    derivatives_path: PathBuf,
    /// Server port
    #[arg(long, default_value_t = 8050)]
    port: u16,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    if !cli.derivatives_path.is_dir() {
        bail!("{} is not a directory", cli.derivatives_path.display());
    }
    let scanner = Scanner::new(&cli.derivatives_path);
    let graph = ViewerGraph::open(scanner)
        .with_context(|| format!("scanning {}", cli.derivatives_path.display()))?;
    info!(
        "{} subject(s) under {}",
        graph.subjects().len(),
        cli.derivatives_path.display()
    );
    let state = AppState::new(cli.derivatives_path, graph);
    fqc_server::run(state, ServerOpts { port: cli.port })?;
    Ok(())
}
