use clap::Parser;
use omron_sensor_listener::app::{Options, RunError, run_with_io};
use omron_sensor_listener::source::BackendSource;
use std::panic::{self, PanicHookInfo};

/// Exit codes for the application
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_PANIC: i32 = 2;

/// Log filter used when `RUST_LOG` is unset. Reported errors are logged at
/// `debug` and shown to the user through the run loop's error writer instead.
fn default_log_filter(verbose: bool) -> &'static str {
    if verbose { "info" } else { "warn" }
}

fn init_logging(verbose: bool) {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_log_filter(verbose)),
    )
    .init();
}

async fn run(options: Options) -> Result<(), RunError> {
    let source = BackendSource(options.source_backend());
    log::info!("reading advertisements from {} backend", source.0);

    let mut out = std::io::stdout();
    let mut err = std::io::stderr();
    run_with_io(options, &source, &mut out, &mut err).await
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Set up panic hook to ensure clean exit codes for process managers
    // (e.g., systemd, Telegraf execd) that monitor exit status
    panic::set_hook(Box::new(move |info: &PanicHookInfo| {
        eprintln!("Panic! {}", info);
        std::process::exit(EXIT_PANIC);
    }));

    let options = Options::parse();
    init_logging(options.verbose);

    match run(options).await {
        Ok(_) => std::process::exit(EXIT_SUCCESS),
        Err(why) => {
            eprintln!("error: {}", why);
            std::process::exit(EXIT_ERROR);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_log_filter_hides_debug() {
        assert_eq!(default_log_filter(false), "warn");
        assert_eq!(default_log_filter(true), "info");
    }
}
