//! prompttree CLI: aggregate a partitioned documentation tree into a single
//! LLM-ready bundle, and check that tree against the host project.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli)
}
