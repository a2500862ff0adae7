use std::future::Future;

use tokio::io::{BufWriter, Stdout};
use tracing::{Level, warn};

use super::error::AppError;

/// Output handles passed to the application's main function
pub struct Writers {
    pub stdout: BufWriter<Stdout>,
}

/// Reusable CLI application runner that handles:
/// - Argument parsing before the runtime starts
/// - Signal handling (SIGINT, SIGTERM, SIGHUP)
/// - Stdout buffering
/// - Exit codes (0 = success, 1 = error, 130 = SIGINT, 143 = SIGTERM, 129 = SIGHUP)
pub struct CliApp<A = ()> {
    name: String,
    args: Result<A, AppError>,
}

impl CliApp<()> {
    /// Create a new CLI application runner
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            args: Ok(()),
        }
    }
}

impl<A> CliApp<A> {
    /// Parse the process arguments (including the program name) with `parse`
    pub fn with_args<B, P>(self, parse: P) -> CliApp<B>
    where
        P: FnOnce(Vec<String>) -> Result<B, AppError>,
    {
        CliApp {
            name: self.name,
            args: parse(std::env::args().collect()),
        }
    }

    /// Run the application on a multi-threaded tokio runtime
    ///
    /// This function never returns - it calls std::process::exit with the appropriate code
    pub fn run<F, Fut>(self, main_fn: F) -> !
    where
        F: FnOnce(Writers, A) -> Fut,
        Fut: Future<Output = Result<(), AppError>>,
    {
        let args = match self.args {
            Ok(args) => args,
            Err(e) => {
                eprintln!("{}: {}", self.name, e);
                std::process::exit(1);
            }
        };

        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(e) => {
                eprintln!("{}: failed to start runtime: {}", self.name, e);
                std::process::exit(1);
            }
        };

        let name = self.name;
        let code = runtime.block_on(async move {
            let writers = Writers {
                stdout: BufWriter::new(tokio::io::stdout()),
            };

            // Race main application logic against signal reception
            tokio::select! {
                result = main_fn(writers, args) => match result {
                    Ok(()) => 0,
                    Err(e) => {
                        eprintln!("{}: {}", name, e);
                        1
                    }
                },
                signal_code = wait_for_signal() => signal_code,
            }
        });

        std::process::exit(code);
    }
}

/// Install the stderr log subscriber; stdout is reserved for data
pub fn init_logging(level: Level) {
    let installed = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .try_init();

    if installed.is_err() {
        warn!("Log subscriber already installed");
    }
}

/// Wait for any Unix signal (SIGINT, SIGTERM, SIGHUP) or Ctrl+C
/// Returns the exit code to use (130 for SIGINT, 143 for SIGTERM, etc.)
async fn wait_for_signal() -> i32 {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let handlers = (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
            signal(SignalKind::hangup()),
        );
        let (mut sigterm, mut sigint, mut sighup) = match handlers {
            (Ok(term), Ok(int), Ok(hup)) => (term, int, hup),
            _ => {
                warn!("Failed to install signal handlers");
                return std::future::pending().await;
            }
        };

        tokio::select! {
            _ = sigterm.recv() => {
                eprintln!("Received SIGTERM");
                143 // 128 + 15
            }
            _ = sigint.recv() => {
                eprintln!("Received SIGINT");
                130 // 128 + 2
            }
            _ = sighup.recv() => {
                eprintln!("Received SIGHUP");
                129 // 128 + 1
            }
        }
    }

    #[cfg(not(unix))]
    {
        if tokio::signal::ctrl_c().await.is_err() {
            warn!("Failed to install Ctrl+C handler");
            return std::future::pending().await;
        }
        eprintln!("Received Ctrl+C");
        130
    }
}
