//! MeshIO command line tool
//!
//! Usage:
//!   meshio info cube.stl
//!   meshio convert cube.obj cube.stl --format ascii

use clap::Parser;
use meshio_cli::Cli;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    meshio_cli::run(cli)
}
