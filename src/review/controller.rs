use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use crate::domain::settings::{Credentials, Settings};
use crate::domain::ticket::{Ticket, TicketLabel};
use crate::error::AppResult;
use crate::review::proxy::TicketProxy;
use crate::review::session::{ExitDirection, ReviewSession, SwipeDirection};

pub const EXIT_ANIMATION: Duration = Duration::from_millis(300);
pub const NOTICE_HISTORY: usize = 4;

/// Completions of work spawned by the controller, fed back through `handle`.
#[derive(Debug)]
pub enum ReviewEvent {
    SearchFinished {
        limit: u32,
        result: AppResult<Vec<Ticket>>,
    },
    LabelFinished {
        ticket_id: String,
        label: TicketLabel,
        result: AppResult<String>,
    },
    DetailsFinished {
        ticket_id: String,
        result: AppResult<Ticket>,
    },
    AnimationFinished,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

/// Drives a review session. Remote calls and exit animations run as
/// independent tasks; the cursor only ever waits on the animation.
pub struct ReviewController {
    proxy: Arc<dyn TicketProxy>,
    settings: Settings,
    session: ReviewSession,
    events: UnboundedSender<ReviewEvent>,
    notices: VecDeque<Notice>,
    animation: Duration,
}

impl ReviewController {
    pub fn new(
        proxy: Arc<dyn TicketProxy>,
        settings: Settings,
        events: UnboundedSender<ReviewEvent>,
    ) -> Self {
        Self {
            proxy,
            settings,
            session: ReviewSession::new(),
            events,
            notices: VecDeque::with_capacity(NOTICE_HISTORY),
            animation: EXIT_ANIMATION,
        }
    }

    pub fn session(&self) -> &ReviewSession {
        &self.session
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn notices(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter()
    }

    pub fn search(&mut self, query: &str) {
        let query = query.trim();
        if query.is_empty() {
            self.notify(Notice::Error("Enter a JQL query".to_string()));
            return;
        }
        let Some(credentials) = self.credentials() else {
            return;
        };
        if !self.session.begin_search() {
            debug!("search already in flight");
            return;
        }

        let limit = self.settings.page_size();
        let proxy = Arc::clone(&self.proxy);
        let events = self.events.clone();
        let query = query.to_string();
        tokio::spawn(async move {
            let result = proxy.search(&query, limit, &credentials).await;
            let _ = events.send(ReviewEvent::SearchFinished { limit, result });
        });
    }

    pub fn swipe(&mut self, direction: SwipeDirection) {
        let Some(ticket) = self.start_exit(direction.into()) else {
            return;
        };
        let Some(credentials) = self.credentials() else {
            return;
        };

        let label = direction.label();
        let proxy = Arc::clone(&self.proxy);
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = proxy.add_label(&ticket.id, label, &credentials).await;
            let _ = events.send(ReviewEvent::LabelFinished {
                ticket_id: ticket.id,
                label,
                result,
            });
        });
    }

    pub fn skip(&mut self) {
        if let Some(ticket) = self.start_exit(ExitDirection::Skip) {
            self.notify(Notice::Info(format!("Ticket {} skipped", ticket.id)));
        }
    }

    pub fn restart(&mut self) {
        if self.session.restart() {
            debug!("review restarted");
        }
    }

    pub fn show_details(&mut self) {
        if self.session.is_animating() {
            return;
        }
        let Some(ticket_id) = self.session.current().map(|ticket| ticket.id.clone()) else {
            return;
        };
        let Some(credentials) = self.credentials() else {
            return;
        };

        let proxy = Arc::clone(&self.proxy);
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = proxy.ticket(&ticket_id, &credentials).await;
            let _ = events.send(ReviewEvent::DetailsFinished { ticket_id, result });
        });
    }

    pub fn handle(&mut self, event: ReviewEvent) {
        match event {
            ReviewEvent::SearchFinished { limit, result } => match result {
                Ok(tickets) => {
                    let loaded = tickets.len();
                    self.session.finish_search(tickets);
                    self.notify(Notice::Info(format!(
                        "Loaded {loaded} tickets (limit: {limit})"
                    )));
                }
                Err(err) => {
                    warn!(error = %err, "search failed");
                    self.session.fail_search();
                    self.notify(Notice::Error(format!(
                        "Failed to load tickets: {}",
                        err.detail()
                    )));
                }
            },
            ReviewEvent::LabelFinished {
                ticket_id,
                label,
                result,
            } => match result {
                Ok(message) => self.notify(Notice::Info(message)),
                Err(err) => {
                    warn!(%ticket_id, %label, error = %err, "label failed");
                    self.notify(Notice::Error(format!(
                        "Failed to add label \"{label}\" to {ticket_id}: {}",
                        err.detail()
                    )));
                }
            },
            ReviewEvent::DetailsFinished { ticket_id, result } => match result {
                Ok(ticket) => {
                    let labels = ticket.labels.unwrap_or_default();
                    let text = if labels.is_empty() {
                        format!("{ticket_id} has no labels")
                    } else {
                        format!("{ticket_id} labels: {}", labels.join(", "))
                    };
                    self.notify(Notice::Info(text));
                }
                Err(err) => self.notify(Notice::Error(format!(
                    "Failed to fetch {ticket_id}: {}",
                    err.detail()
                ))),
            },
            ReviewEvent::AnimationFinished => self.session.advance(),
        }
    }

    fn start_exit(&mut self, direction: ExitDirection) -> Option<Ticket> {
        let ticket = self.session.begin_exit(direction)?;
        let events = self.events.clone();
        let delay = self.animation;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(ReviewEvent::AnimationFinished);
        });
        Some(ticket)
    }

    fn credentials(&mut self) -> Option<Credentials> {
        match self.settings.credentials() {
            Ok(credentials) => Some(credentials),
            Err(_) => {
                self.notify(Notice::Error(
                    "Configure Jira first: run `swipe config init`".to_string(),
                ));
                None
            }
        }
    }

    fn notify(&mut self, notice: Notice) {
        if self.notices.len() == NOTICE_HISTORY {
            self.notices.pop_front();
        }
        self.notices.push_back(notice);
    }
}
