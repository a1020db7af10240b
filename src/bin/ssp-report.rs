use anyhow::{Context, Result};
use clap::Parser;
use ssp::cli::ReportCli;
use ssp::report::{Report, ReportConfig};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

fn main() -> Result<()> {
    let args = ReportCli::parse();
    init_tracing(args.debug);

    let config = ReportConfig {
        dir: args.dir,
        sort: args.sort,
        reverse: args.reverse,
        format: args.format,
        running: args.running,
    };

    let report = Report::collect(&config)
        .with_context(|| format!("Failed to read statistics from {}", config.dir.display()))?;
    print!("{}", report.render(config.format)?);
    Ok(())
}
