mod cli;
mod commands;

use std::process::ExitCode;

use cli::Commands;
use commands::{run_endpoint, run_serve};
use pdfgen_lib::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::parse();
    init_tracing(args.verbose);

    let config = match Config::load(args.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(err) => {
            tracing::error!(error = %err, "Failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    match args.command {
        Commands::Serve { bind } => run_serve(config, bind).await,
        Commands::Endpoint => run_endpoint(config).await,
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "pdfgen=debug,pdfgen_lib=debug,tower_http=debug"
    } else {
        "pdfgen=info,pdfgen_lib=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
