use clap::Parser;
use tracing::{debug, Level};

use vod_namer::cli::Cli;

fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Logs go to stderr so stdout only carries the path
    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(std::io::stderr)
        .init();

    debug!("Starting vod-namer v{}", env!("CARGO_PKG_VERSION"));

    cli.run()?;

    Ok(())
}
