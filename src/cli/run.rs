use anyhow::{anyhow, Result};
use clap::Args;
use std::io::{self, Read};
use tracing::{debug, info};

use crate::app::App;
use crate::config::Config;

/// Ask a single question non-interactively
#[derive(Args)]
pub struct RunCommand {
    /// The question to ask. If not provided, will read from stdin
    pub prompt: Vec<String>,

    /// Suppress progress output
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,
}

impl RunCommand {
    pub async fn execute(&self, config: &Config) -> Result<()> {
        debug!("Executing run command");

        let prompt = self.get_prompt()?;
        if prompt.trim().is_empty() {
            return Err(anyhow!("No prompt provided. Use arguments or pipe input via stdin."));
        }

        info!("Running prompt: {}", prompt.chars().take(50).collect::<String>());

        let mut app = App::new(config)?;
        let reply = app.run_non_interactive(prompt.trim(), self.quiet).await?;

        println!("{}", reply);

        Ok(())
    }

    fn get_prompt(&self) -> Result<String> {
        if !self.prompt.is_empty() {
            Ok(self.prompt.join(" "))
        } else {
            debug!("Reading prompt from stdin");
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|e| anyhow!("Failed to read from stdin: {}", e))?;
            Ok(buffer)
        }
    }
}
