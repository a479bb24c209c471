//! arxivdigest CLI — daily arXiv listing digest tool.
//!
//! Crawls the new-submission listings for configured categories, enriches
//! each paper with an LLM digest, and renders a categorized markdown report.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
