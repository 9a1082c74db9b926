use std::process::ExitCode;

use pdfgen_lib::{BrowserManager, Config};

/// Resolve the control endpoint through discovery and print it.
pub async fn run_endpoint(config: Config) -> ExitCode {
    let manager = match BrowserManager::from_config(&config) {
        Ok(manager) => manager,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };

    match manager.resolver().resolve().await {
        Ok(endpoint) => {
            println!("{endpoint}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Endpoint discovery failed: {err}");
            ExitCode::FAILURE
        }
    }
}
