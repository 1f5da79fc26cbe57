// src/main.rs

use clap::Parser;
use color_eyre::eyre::Result;
use tls_compat_checker::cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = cli::Args::parse();
    cli::dispatch(args).await
}
