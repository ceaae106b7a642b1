use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Flat ticket record handed from the proxy to the review client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: String,
    pub summary: String,
    pub description: String,
    pub components: Vec<String>,
    pub time_estimate: u64,
    pub issue_type: String,
    pub priority: String,
    pub assignee: String,
    pub reporter: String,
    /// Only populated when a single ticket is fetched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    pub link: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketLabel {
    Run,
    Change,
}

impl TicketLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketLabel::Run => "run",
            TicketLabel::Change => "change",
        }
    }

    pub fn parse(value: Option<&str>) -> AppResult<Self> {
        value.unwrap_or_default().parse()
    }
}

impl FromStr for TicketLabel {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "run" => Ok(TicketLabel::Run),
            "change" => Ok(TicketLabel::Change),
            _ => Err(AppError::Validation(
                "Label must be either \"run\" or \"change\"".to_string(),
            )),
        }
    }
}

impl fmt::Display for TicketLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of an idempotent label add.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelOutcome {
    Added,
    AlreadyPresent,
}

/// Number of tickets requested from the tracker, always within `1..=1000`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSize(u32);

impl PageSize {
    pub fn new(requested: Option<i64>) -> AppResult<Self> {
        let requested = requested.unwrap_or(i64::from(DEFAULT_PAGE_SIZE));
        if !(1..=i64::from(MAX_PAGE_SIZE)).contains(&requested) {
            return Err(AppError::Validation(format!(
                "maxResults must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        Ok(Self(requested as u32))
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerUser {
    pub display_name: String,
    pub email: Option<String>,
    pub active: bool,
}
