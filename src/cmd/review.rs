use std::sync::Arc;

use clap::Args;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::config::SettingsStore;
use crate::error::AppResult;
use crate::review::controller::ReviewController;
use crate::review::proxy::{ProxyClient, TicketProxy};
use crate::review::terminal::{ReviewScreen, ScreenAction, TerminalGuard, spawn_key_reader};

pub const DEFAULT_QUERY: &str =
    r#"project = "YOUR_PROJECT" AND status != "Done" ORDER BY created DESC"#;

#[derive(Args, Debug, Clone)]
pub struct ReviewArgs {
    /// Base URL of the running proxy server.
    #[arg(long, env = "SWIPE_PROXY_URL", default_value = "http://127.0.0.1:3001")]
    pub proxy: String,
    /// Initial JQL query; press Enter in the review screen to load it.
    #[arg(long, default_value = DEFAULT_QUERY)]
    pub jql: String,
}

pub async fn run(args: ReviewArgs) -> AppResult<()> {
    // Settings are read once; every call in this session uses this snapshot.
    let settings = SettingsStore::open()?.load();
    if settings.credentials().is_err() {
        warn!("Jira settings incomplete; run `swipe config init` first");
    }

    let proxy: Arc<dyn TicketProxy> = Arc::new(ProxyClient::new(args.proxy.clone()));
    let (event_tx, mut events) = mpsc::unbounded_channel();
    let (key_tx, mut keys) = mpsc::unbounded_channel();
    let mut controller = ReviewController::new(proxy, settings, event_tx);
    let mut screen = ReviewScreen::new(args.jql);

    info!(proxy = %args.proxy, "starting review session");
    let mut terminal = TerminalGuard::enter()?;
    let _reader = spawn_key_reader(key_tx);

    loop {
        terminal.draw(&screen, &controller)?;
        tokio::select! {
            Some(key) = keys.recv() => match screen.handle_key(key) {
                Some(ScreenAction::Quit) => break,
                Some(action) => apply(&mut controller, action),
                None => {}
            },
            Some(event) = events.recv() => controller.handle(event),
            else => break,
        }
    }

    // Dropping the receiver stops the key reader on its next poll.
    drop(keys);
    info!("review session ended");
    Ok(())
}

fn apply(controller: &mut ReviewController, action: ScreenAction) {
    match action {
        ScreenAction::Search(query) => controller.search(&query),
        ScreenAction::Swipe(direction) => controller.swipe(direction),
        ScreenAction::Skip => controller.skip(),
        ScreenAction::Restart => controller.restart(),
        ScreenAction::Details => controller.show_details(),
        ScreenAction::Quit => {}
    }
}
