use std::io::{self, Write};

use clap::{Args, Subcommand};
use reqwest::Url;

use crate::config::SettingsStore;
use crate::domain::settings::Settings;
use crate::domain::ticket::MAX_PAGE_SIZE;
use crate::error::{AppError, AppResult};
use crate::infra::jira::JiraClient;
use crate::services::IssueTrackerService;

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Edit the stored Jira settings interactively.
    Init,
    /// Show the stored settings (token masked).
    Show,
    /// Check the stored credentials directly against Jira.
    Verify,
}

pub async fn run(command: ConfigCommand) -> AppResult<()> {
    match command {
        ConfigCommand::Init => run_init(),
        ConfigCommand::Show => run_show(),
        ConfigCommand::Verify => run_verify().await,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsField {
    JiraUrl,
    JiraToken,
    TaskLimit,
}

impl SettingsField {
    pub const ALL: [SettingsField; 3] = [
        SettingsField::JiraUrl,
        SettingsField::JiraToken,
        SettingsField::TaskLimit,
    ];

    fn prompt(self) -> &'static str {
        match self {
            SettingsField::JiraUrl => "Jira server URL (e.g., https://your-jira-instance.com)",
            SettingsField::JiraToken => "Jira personal access token",
            SettingsField::TaskLimit => "Default task limit (1-1000)",
        }
    }

    fn is_secret(self) -> bool {
        matches!(self, SettingsField::JiraToken)
    }
}

/// Draft copy of the settings; nothing is persisted until `save` succeeds.
pub struct SettingsForm {
    saved: Settings,
    jira_url: String,
    jira_token: String,
    task_limit: String,
}

impl SettingsForm {
    pub fn open(saved: Settings) -> Self {
        let mut form = Self {
            saved,
            jira_url: String::new(),
            jira_token: String::new(),
            task_limit: String::new(),
        };
        form.cancel();
        form
    }

    pub fn value(&self, field: SettingsField) -> &str {
        match field {
            SettingsField::JiraUrl => &self.jira_url,
            SettingsField::JiraToken => &self.jira_token,
            SettingsField::TaskLimit => &self.task_limit,
        }
    }

    pub fn set(&mut self, field: SettingsField, value: impl Into<String>) {
        let value = value.into();
        match field {
            SettingsField::JiraUrl => self.jira_url = value,
            SettingsField::JiraToken => self.jira_token = value,
            SettingsField::TaskLimit => self.task_limit = value,
        }
    }

    pub fn validate(&self) -> AppResult<Settings> {
        let jira_url = self.jira_url.trim();
        if jira_url.is_empty() {
            return Err(AppError::Validation("Jira URL is required".to_string()));
        }
        let parsed = Url::parse(jira_url).map_err(|_| {
            AppError::Validation(format!("'{jira_url}' is not a valid URL"))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(AppError::Validation(
                "Jira URL must be an http(s) address".to_string(),
            ));
        }

        let jira_token = self.jira_token.trim();
        if jira_token.is_empty() {
            return Err(AppError::Validation("Jira token is required".to_string()));
        }

        let task_limit = self
            .task_limit
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|limit| (1..=MAX_PAGE_SIZE).contains(limit))
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "Task limit must be a number between 1 and {MAX_PAGE_SIZE}"
                ))
            })?;

        Ok(Settings {
            jira_url: jira_url.to_string(),
            jira_token: jira_token.to_string(),
            task_limit,
        })
    }

    /// Validates the draft, hands it to `persist`, and on success makes it
    /// the new saved snapshot.
    pub fn save(
        &mut self,
        persist: impl FnOnce(&Settings) -> AppResult<()>,
    ) -> AppResult<Settings> {
        let settings = self.validate()?;
        persist(&settings)?;
        self.saved = settings.clone();
        Ok(settings)
    }

    /// Discards the draft and restores the last saved snapshot.
    pub fn cancel(&mut self) {
        self.jira_url = self.saved.jira_url.clone();
        self.jira_token = self.saved.jira_token.clone();
        self.task_limit = self.saved.task_limit.to_string();
    }
}

fn run_init() -> AppResult<()> {
    let store = SettingsStore::open()?;
    let mut form = SettingsForm::open(store.load());

    println!("Configuring Jira settings.");
    println!("Press Enter to keep the current value, '-' to clear it.");
    println!("The token is stored in the local settings file; protect your filesystem accordingly.");

    loop {
        println!();
        for field in SettingsField::ALL {
            apply_prompt(&mut form, field)?;
        }

        if !confirm("Save settings?")? {
            form.cancel();
            println!("Changes discarded.");
            return Ok(());
        }

        match form.save(|settings| store.save(settings)) {
            Ok(_) => {
                println!("\nSettings saved to {}", store.path().display());
                return Ok(());
            }
            Err(AppError::Validation(message)) => {
                eprintln!("{message}");
                println!("Please correct the settings.");
            }
            Err(err) => return Err(err),
        }
    }
}

fn run_show() -> AppResult<()> {
    let store = SettingsStore::open()?;
    let settings = store.load();

    println!("Settings file: {}", store.path().display());
    println!("Jira URL: {}", display_value(&settings.jira_url));
    println!("Jira token: {}", mask_secret(&settings.jira_token));
    println!("Task limit: {}", settings.task_limit);

    Ok(())
}

async fn run_verify() -> AppResult<()> {
    let settings = SettingsStore::open()?.load();
    let credentials = settings.credentials()?;

    println!("Checking connection to {}...", credentials.base_url);
    let user = JiraClient::new().current_user(&credentials).await?;

    println!("Connection OK.");
    println!("User: {}", user.display_name);
    println!(
        "Email: {}",
        user.email.as_deref().unwrap_or("<not available>")
    );
    println!("Active: {}", if user.active { "yes" } else { "no" });
    Ok(())
}

fn apply_prompt(form: &mut SettingsForm, field: SettingsField) -> AppResult<()> {
    let current = form.value(field).to_string();
    match prompt(field.prompt(), &current, field.is_secret())? {
        PromptAction::Keep => {}
        PromptAction::Clear => form.set(field, ""),
        PromptAction::Set(value) => form.set(field, value),
    }
    Ok(())
}

fn prompt(field: &str, current: &str, secret: bool) -> AppResult<PromptAction> {
    let mut stdout = io::stdout();

    match (current.is_empty(), secret) {
        (false, true) => write!(stdout, "{field} [****] (Enter to keep, '-' to clear): ")?,
        (false, false) => {
            write!(stdout, "{field} [{current}] (Enter to keep, '-' to clear): ")?
        }
        (true, _) => write!(stdout, "{field}: ")?,
    }
    stdout.flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(parse_prompt_input(&input))
}

fn parse_prompt_input(input: &str) -> PromptAction {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        PromptAction::Keep
    } else if trimmed == "-" {
        PromptAction::Clear
    } else {
        PromptAction::Set(trimmed.to_string())
    }
}

fn confirm(question: &str) -> AppResult<bool> {
    let mut stdout = io::stdout();
    write!(stdout, "{question} [Y/n]: ")?;
    stdout.flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(!matches!(input.trim().to_lowercase().as_str(), "n" | "no"))
}

fn display_value(value: &str) -> String {
    if value.is_empty() {
        "<not set>".to_string()
    } else {
        value.to_string()
    }
}

fn mask_secret(value: &str) -> String {
    match value.chars().count() {
        0 => "<not set>".to_string(),
        1..=6 => "***".to_string(),
        len => {
            let prefix: String = value.chars().take(3).collect();
            let suffix: String = value.chars().skip(len - 3).collect();
            format!("{prefix}***{suffix}")
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum PromptAction {
    Keep,
    Clear,
    Set(String),
}
