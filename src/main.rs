use std::{
    io,
    process::{self, ExitCode},
    sync::atomic::Ordering,
};

use qrcaption::{cli::Cli, config::Config};
use tracing::warn;
use tracing_subscriber::EnvFilter;

// Shell convention for a process ended by SIGINT.
const INTERRUPTED: i32 = 130;

fn main() -> ExitCode {
    // Logs go to stderr so they never interleave with the prompts. Override with RUST_LOG.
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let mut cli = Cli::new(config, io::stdin().lock(), io::stdout());

    let prompting = cli.prompting_flag();
    let handler = ctrlc::set_handler(move || {
        if prompting.load(Ordering::SeqCst) {
            println!("\nCancelled.");
            process::exit(0);
        }
        process::exit(INTERRUPTED);
    });
    if let Err(e) = handler {
        warn!("Could not install the interrupt handler: {e}");
    }

    ExitCode::from(cli.run().code())
}
