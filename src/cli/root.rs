use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, info};

use super::{run::RunCommand, sessions::SessionsCommand};
use crate::app::App;
use crate::config::Config;

/// ReadSum - study with an AI tutor from your terminal
#[derive(Parser)]
#[command(
    name = "readsum",
    version,
    about = "Study with an AI tutor from your terminal",
    long_about = r#"ReadSum keeps your tutoring conversations as named chat sessions.
Without a stored API token it runs in preview mode with demo sessions and
simulated replies.

Examples:
  readsum                              # Start the interactive shell
  readsum run "explain recursion"      # Ask a single question
  readsum sessions                     # List your chat sessions
  readsum --base-url http://host:8080  # Use another backend"#
)]
pub struct Cli {
    /// Current working directory
    #[arg(short = 'c', long = "cwd", global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short = 'd', long = "debug", global = true)]
    pub debug: bool,

    /// Base URL of the ReadSum backend
    #[arg(long = "base-url", global = true)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ask a single question non-interactively
    Run(RunCommand),

    /// List chat sessions
    Sessions(SessionsCommand),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        if self.debug {
            debug!("Debug logging enabled");
        }

        // Change working directory if specified, so local config files resolve there
        if let Some(cwd) = &self.cwd {
            std::env::set_current_dir(cwd)
                .map_err(|e| anyhow::anyhow!("Failed to change directory to {}: {}", cwd.display(), e))?;
            info!("Changed working directory to: {}", cwd.display());
        }

        let mut config = Config::init().await?;
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        config.validate()?;
        debug!("Configuration initialized");

        match self.command {
            Some(Commands::Run(run_cmd)) => run_cmd.execute(&config).await,
            Some(Commands::Sessions(sessions_cmd)) => sessions_cmd.execute(&config).await,
            None => Self::start_interactive_mode(&config).await,
        }
    }

    async fn start_interactive_mode(config: &Config) -> Result<()> {
        Self::setup_signal_handling();

        let mut app = App::new(config)?;
        app.run_interactive().await?;
        app.shutdown().await?;

        info!("Application finished");
        Ok(())
    }

    fn setup_signal_handling() {
        tokio::spawn(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Received Ctrl+C, shutting down");
                    std::process::exit(130);
                }
                Err(e) => debug!("Could not listen for Ctrl+C: {}", e),
            }
        });
    }
}
