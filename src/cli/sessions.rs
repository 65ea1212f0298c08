use anyhow::Result;
use clap::Args;
use tracing::debug;

use crate::app::App;
use crate::config::Config;

/// List chat sessions
#[derive(Args)]
pub struct SessionsCommand {
    /// Print the sessions as JSON
    #[arg(long = "json")]
    pub json: bool,
}

impl SessionsCommand {
    pub async fn execute(&self, config: &Config) -> Result<()> {
        debug!("Executing sessions command");

        let mut app = App::new(config)?;
        let sessions = app.list_sessions().await?;

        if self.json {
            let rows: Vec<_> = sessions
                .iter()
                .map(|s| serde_json::json!({ "id": s.id, "title": s.display_title() }))
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
            return Ok(());
        }

        if sessions.is_empty() {
            println!("No chats yet.");
        }
        for session in &sessions {
            println!("{:>6}  {}", session.id, session.display_title());
        }

        Ok(())
    }
}
