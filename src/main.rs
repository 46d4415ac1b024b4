use clap::Parser;
use landrec::cli::Cli;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    cli.execute().await?;
    Ok(())
}

/// Log to stderr so stdout only carries results. `RUST_LOG` wins over flags.
fn init_tracing(verbose: bool, quiet: bool) {
    let default = if verbose {
        "landrec=debug"
    } else if quiet {
        "landrec=warn"
    } else {
        "landrec=info"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
