use crate::domain::ticket::{Ticket, TicketLabel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewState {
    Idle,
    Loading,
    Reviewing,
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDirection {
    Left,
    Right,
}

impl SwipeDirection {
    pub fn label(self) -> TicketLabel {
        match self {
            SwipeDirection::Left => TicketLabel::Change,
            SwipeDirection::Right => TicketLabel::Run,
        }
    }
}

/// Which way the current card leaves the screen; only drives rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitDirection {
    Left,
    Right,
    Skip,
}

impl From<SwipeDirection> for ExitDirection {
    fn from(direction: SwipeDirection) -> Self {
        match direction {
            SwipeDirection::Left => ExitDirection::Left,
            SwipeDirection::Right => ExitDirection::Right,
        }
    }
}

/// Ordered ticket list plus a cursor in `0..=len`.
#[derive(Debug, Default)]
pub struct ReviewSession {
    tickets: Vec<Ticket>,
    cursor: usize,
    loading: bool,
    exit: Option<ExitDirection>,
}

impl ReviewSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ReviewState {
        if self.loading {
            ReviewState::Loading
        } else if self.tickets.is_empty() {
            ReviewState::Idle
        } else if self.cursor >= self.tickets.len() {
            ReviewState::Exhausted
        } else {
            ReviewState::Reviewing
        }
    }

    pub fn tickets(&self) -> &[Ticket] {
        &self.tickets
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current(&self) -> Option<&Ticket> {
        if self.loading {
            return None;
        }
        self.tickets.get(self.cursor)
    }

    pub fn exit_direction(&self) -> Option<ExitDirection> {
        self.exit
    }

    pub fn is_animating(&self) -> bool {
        self.exit.is_some()
    }

    /// Returns false when a search is already in flight.
    pub fn begin_search(&mut self) -> bool {
        if self.loading {
            return false;
        }
        self.loading = true;
        true
    }

    pub fn finish_search(&mut self, tickets: Vec<Ticket>) {
        self.tickets = tickets;
        self.cursor = 0;
        self.exit = None;
        self.loading = false;
    }

    /// Failed searches leave the previous list and cursor untouched.
    pub fn fail_search(&mut self) {
        self.loading = false;
    }

    /// Marks the current card as leaving and returns it, or `None` when there
    /// is no card or one is already on its way out.
    pub fn begin_exit(&mut self, direction: ExitDirection) -> Option<Ticket> {
        if self.is_animating() {
            return None;
        }
        let ticket = self.current()?.clone();
        self.exit = Some(direction);
        Some(ticket)
    }

    /// Moves past the card that is leaving. A no-op when nothing is leaving,
    /// e.g. when a new search replaced the list mid-animation.
    pub fn advance(&mut self) {
        if self.exit.take().is_none() {
            return;
        }
        if self.cursor < self.tickets.len() {
            self.cursor += 1;
        }
    }

    pub fn restart(&mut self) -> bool {
        if self.state() != ReviewState::Exhausted {
            return false;
        }
        self.cursor = 0;
        self.exit = None;
        true
    }
}
