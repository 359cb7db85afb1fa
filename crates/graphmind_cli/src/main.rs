//! CLI smoke entry point.
//!
//! # Responsibility
//! - Resolve `GRAPHMIND_*` configuration and open the configured vault.
//! - Print deterministic `key=value` lines for quick local sanity checks.

use graphmind_core::{open_vault, GraphmindConfig, VaultQuery};
use log::error;
use std::process::ExitCode;

const PROBE_OWNER: &str = "graphmind-cli-probe";

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_probe module=cli status=error error={err}");
            eprintln!("graphmind error={err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = GraphmindConfig::from_env()?;
    let file_logging = config.init_logging()?;

    println!("graphmind_core ping={}", graphmind_core::ping());
    println!("graphmind_core version={}", graphmind_core::core_version());
    println!("graphmind store={}", config.store.as_str());
    println!("graphmind file_logging={file_logging}");

    let vault = open_vault(&config)?;
    let listed = vault.list_summary(PROBE_OWNER, &VaultQuery::new())?;
    println!("graphmind probe_items={}", listed.len());
    Ok(())
}
