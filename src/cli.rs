// src/cli.rs

use clap::{Parser, Subcommand};
use color_eyre::eyre::{eyre, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::info;

use crate::build_coordinator;
use crate::config::Config;
use crate::core::auth::{Credentials, RESET_ACTION, SCAN_ACTION};
use crate::core::driver::run_scan;
use crate::core::models::ScanRequest;
use crate::core::report::Report;
use crate::logging;
use crate::tui;

#[derive(Parser, Debug)]
#[command(name = "tls-compat-checker")]
#[command(about = "Find outbound URLs in a codebase and check their servers for TLS 1.2+ support")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Option<Command>,

    /// Path to config TOML. If omitted, uses ./tls-compat-checker.toml if present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the content root to scan.
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Interactive terminal UI (default).
    Tui,
    /// Run a full scan in batches until every URL is checked.
    Scan,
    /// Run a single batch and print the JSON response.
    Step {
        /// Cursor into the URL list; invalid values mean 0.
        #[arg(long, allow_hyphen_values = true)]
        offset: Option<String>,
        /// Present this nonce instead of minting one.
        #[arg(long)]
        nonce: Option<String>,
    },
    /// Clear stored passing and failing URLs.
    Reset,
    /// Show stored results.
    Report {
        #[arg(long)]
        json: bool,
    },
    /// List the URLs found in the content root.
    Urls,
    /// Print a nonce for an action (needs `auth.secret` to be useful across runs).
    Nonce {
        #[arg(long, default_value = SCAN_ACTION)]
        action: String,
    },
}

pub async fn dispatch(args: Args) -> Result<()> {
    let mut cfg = Config::resolve(args.config.as_deref())?;
    if let Some(root) = &args.root {
        cfg.paths.content_root = root.clone();
    }
    let level = args.log_level.clone().unwrap_or_else(|| cfg.logging.level.clone());
    let command = args.cmd.unwrap_or(Command::Tui);
    let log_path = logging::initialize_logging(&level, !matches!(command, Command::Tui))?;
    info!(log = %log_path.display(), root = %cfg.paths.content_root.display(), "Starting.");

    let coordinator = build_coordinator(&cfg)?;
    let operator = cfg.operator();

    match command {
        Command::Tui => tui::run(coordinator, operator).await,
        Command::Scan => {
            let totals = run_scan(&coordinator, &operator, |step| {
                println!(
                    "{:>5}/{:<5} passing {:>2}  failing {:>2}",
                    step.progress.min(step.total as u64),
                    step.total,
                    step.passing,
                    step.failing
                );
                for url in &step.failing_urls {
                    println!("      ✗ {}", url);
                }
            })
            .await?;
            println!(
                "Checked {} URLs: {} passing, {} failing.",
                totals.total, totals.passing, totals.failing
            );
            println!();
            println!("{}", Report::from_accumulator(&coordinator.store().snapshot()?).to_text());
            Ok(())
        }
        Command::Step { offset, nonce } => {
            let mut form = HashMap::new();
            if let Some(offset) = offset {
                form.insert("offset".to_string(), offset);
            }
            let credentials = match nonce {
                Some(nonce) => Credentials { caller: operator, nonce },
                None => coordinator.nonces().credentials_for(SCAN_ACTION, &operator),
            };
            let response = coordinator
                .handle_scan_action(ScanRequest::from_form(&form), &credentials)
                .await;
            println!("{}", serde_json::to_string_pretty(&response)?);
            if response["success"] == true {
                Ok(())
            } else {
                Err(eyre!("scan step failed"))
            }
        }
        Command::Reset => {
            let credentials = coordinator.nonces().credentials_for(RESET_ACTION, &operator);
            coordinator.reset(&credentials)?;
            println!("TLS compatibility data has been reset.");
            Ok(())
        }
        Command::Report { json } => {
            let report = Report::from_accumulator(&coordinator.store().snapshot()?);
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", report.to_text());
            }
            Ok(())
        }
        Command::Urls => {
            for url in coordinator.corpus().await? {
                println!("{}", url);
            }
            Ok(())
        }
        Command::Nonce { action } => {
            println!("{}", coordinator.nonces().create(&action, &operator));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_tui() {
        let args = Args::try_parse_from(["tls-compat-checker"]).unwrap();
        assert!(args.cmd.is_none());
    }

    #[test]
    fn step_accepts_loose_offset() {
        let args = Args::try_parse_from(["tls-compat-checker", "step", "--offset", "abc"]).unwrap();
        match args.cmd {
            Some(Command::Step { offset, nonce }) => {
                assert_eq!(offset.as_deref(), Some("abc"));
                assert!(nonce.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn step_negative_offset_reaches_the_lenient_parser() {
        let args = Args::try_parse_from(["tls-compat-checker", "step", "--offset", "-5"]).unwrap();
        let Some(Command::Step { offset, .. }) = args.cmd else {
            panic!("expected step");
        };
        assert_eq!(offset.as_deref(), Some("-5"));

        let form = HashMap::from([("offset".to_string(), "-5".to_string())]);
        assert_eq!(ScanRequest::from_form(&form).offset, 0);
    }

    #[test]
    fn global_root_after_subcommand() {
        let args = Args::try_parse_from(["tls-compat-checker", "urls", "--root", "/srv/wp-content"]).unwrap();
        assert_eq!(args.root, Some(PathBuf::from("/srv/wp-content")));
    }
}
