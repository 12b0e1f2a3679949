//! CLI for the flowgate relay server.

use anyhow::Result;
use clap::{Parser, Subcommand};
use flowgate_core::config;

/// Top-level CLI for the flowgate workflow relay.
#[derive(Debug, Parser)]
#[command(name = "flowgate")]
#[command(about = "flowgate: workflow webhook relay backend", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Run the HTTP server.
    Serve {
        /// Listen address, overriding config and environment.
        #[arg(long, value_name = "ADDR")]
        listen: Option<String>,
    },

    /// Load and validate the configuration, then print it.
    CheckConfig,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        match cli.command {
            CliCommand::Serve { listen } => {
                let mut cfg = config::load_or_init()?;
                if let Some(addr) = listen {
                    cfg.server.listen_addr = addr;
                    cfg.validate()?;
                }
                crate::server::serve(cfg).await
            }
            CliCommand::CheckConfig => {
                let cfg = config::load_or_init()?;
                println!("{}", config_summary(&cfg)?);
                Ok(())
            }
        }
    }
}

/// Render the effective config with secrets masked.
fn config_summary(cfg: &config::AppConfig) -> Result<String> {
    let mut masked = cfg.clone();
    if !masked.workflow.api_key.is_empty() {
        masked.workflow.api_key = "***".to_string();
    }
    if !masked.server.internal_api_key.is_empty() {
        masked.server.internal_api_key = "***".to_string();
    }
    Ok(serde_json::to_string_pretty(&masked)?)
}
