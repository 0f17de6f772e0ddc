use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;

use scan_align::{pipeline, Cli};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();

    pipeline::run(&cli).with_context(|| {
        format!(
            "failed to align {} against {}",
            cli.input.display(),
            cli.template.display()
        )
    })
}
