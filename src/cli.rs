use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pdfgen")]
#[command(
    version,
    about = "PDF Generator - Render URLs to PDF through a shared headless Chromium",
    long_about = "PDF Generator (pdfgen)\n\nModes:\n- serve: run the HTTP service (POST /pdf with {\"url\", \"filename\"}).\n- endpoint: resolve the browser's control endpoint the way the service does and print it.\n\nThe browser must already be running with remote debugging enabled."
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, help = "Enable verbose (debug) logging")]
    pub verbose: bool,

    #[arg(
        long,
        global = true,
        value_name = "PATH",
        help = "Optional config file (TOML) for bind address, discovery URL, timeouts and paper settings"
    )]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP service
    Serve {
        #[arg(long, value_name = "ADDR", help = "Address to listen on (overrides config)")]
        bind: Option<SocketAddr>,
    },
    /// Resolve and print the browser's control endpoint
    Endpoint,
}

pub fn parse() -> Cli {
    Cli::parse()
}
