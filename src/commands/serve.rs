use std::net::SocketAddr;
use std::process::ExitCode;

use pdfgen_lib::{server, Config};

/// Run the HTTP service until shutdown.
pub async fn run_serve(mut config: Config, bind: Option<SocketAddr>) -> ExitCode {
    if let Some(bind) = bind {
        config.server.bind = bind;
    }

    tracing::info!("Starting pdfgen v{}", env!("CARGO_PKG_VERSION"));
    match server::serve(&config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "Server failed");
            ExitCode::FAILURE
        }
    }
}
