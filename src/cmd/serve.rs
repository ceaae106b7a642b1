use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;

use crate::config::ServerConfig;
use crate::context::AppContext;
use crate::error::AppResult;
use crate::infra::jira::JiraClient;
use crate::server;

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Port to listen on (defaults to $PORT, then 3001).
    #[arg(short, long)]
    pub port: Option<u16>,
    /// Directory holding the UI bundle served for unmatched GET routes.
    #[arg(long)]
    pub static_dir: Option<PathBuf>,
}

pub async fn run(args: ServeArgs) -> AppResult<()> {
    let config = ServerConfig::load(args.port, args.static_dir)?;
    let context = AppContext::new(config, Arc::new(JiraClient::new()));
    server::serve(context).await
}
