use std::process::ExitCode;

use tracing::error;

const MAIN_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");

fn main() -> ExitCode {
    match inputpollerd::run_poller() {
        Ok(()) => ExitCode::SUCCESS,
        Err(launch_error) => {
            error!(
                target: MAIN_TARGET,
                severity = "FATAL",
                error = %launch_error,
                "input poller terminated"
            );
            if !inputpollerd::telemetry::is_installed() {
                eprintln!("inputpollerd: {launch_error}");
            }
            ExitCode::FAILURE
        }
    }
}
