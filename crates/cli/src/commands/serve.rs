//! Serve command handler.

use agentic_core::{AppConfig, AppResult};
use clap::Args;

/// Start the HTTP API server
#[derive(Args, Debug)]
pub struct ServeCommand {
    /// Address to bind
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(long)]
    pub port: Option<u16>,
}

impl ServeCommand {
    pub async fn execute(&self, mut config: AppConfig) -> AppResult<()> {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }

        agentic_server::serve(config).await
    }
}
