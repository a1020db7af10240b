use clap::error::ErrorKind;
use ssp::cli::{Cli, Mode, USAGE};
use ssp::timer::{CallTimer, TimerConfig};
use std::process::ExitCode;
use std::time::Duration;
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

/// Record one enter or leave event; failures only cost accuracy
fn run_timer(args: &Cli) {
    let mut config = TimerConfig::new(&args.dir, &args.function);
    if args.lock {
        config = config.with_lock(Duration::from_millis(args.lock_timeout_ms));
    }
    let timer = CallTimer::new(config);

    let result = match args.mode() {
        Mode::Enter => timer.enter().map(|outcome| tracing::debug!(?outcome, "enter")),
        Mode::Leave => timer.leave().map(|outcome| tracing::debug!(?outcome, "leave")),
    };
    if let Err(e) = result {
        tracing::warn!(function = %args.function, "{}", e);
    }
}

fn main() -> ExitCode {
    let args = match Cli::try_parse_invocation(std::env::args_os()) {
        Ok(args) => args,
        Err(e) if e.kind() == ErrorKind::MissingRequiredArgument => {
            println!("{USAGE}");
            return ExitCode::FAILURE;
        }
        // --help, --version, or a malformed option before the mode
        Err(e) => e.exit(),
    };

    init_tracing(args.debug);
    run_timer(&args);

    // The status is the caller's, truncated like any process exit status
    ExitCode::from(args.exit_code() as u8)
}
