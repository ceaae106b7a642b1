use std::io::{self, Stdout};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use tokio::sync::mpsc::UnboundedSender;
use tracing::warn;

use crate::domain::ticket::Ticket;
use crate::error::{AppError, AppResult};
use crate::review::controller::{NOTICE_HISTORY, Notice, ReviewController};
use crate::review::session::{ExitDirection, ReviewState, SwipeDirection};

const DESCRIPTION_PREVIEW_CHARS: usize = 500;
const KEY_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenAction {
    Search(String),
    Swipe(SwipeDirection),
    Skip,
    Restart,
    Details,
    Quit,
}

/// Raw mode plus the alternate screen for as long as the guard lives.
pub struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalGuard {
    pub fn enter() -> AppResult<Self> {
        terminal::enable_raw_mode()
            .map_err(|err| AppError::Terminal(format!("failed to enable raw mode: {err}")))?;
        let mut stdout = io::stdout();
        if let Err(err) = execute!(stdout, EnterAlternateScreen) {
            let _ = terminal::disable_raw_mode();
            return Err(AppError::Terminal(format!("failed to prepare screen: {err}")));
        }
        let terminal = Terminal::new(CrosstermBackend::new(stdout))
            .map_err(|err| AppError::Terminal(format!("failed to create terminal: {err}")))?;
        Ok(Self { terminal })
    }

    pub fn draw(&mut self, screen: &ReviewScreen, controller: &ReviewController) -> AppResult<()> {
        self.terminal.draw(|frame| screen.render(frame, controller))?;
        Ok(())
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Forwards key presses until the receiving side goes away.
pub fn spawn_key_reader(keys: UnboundedSender<KeyEvent>) -> JoinHandle<()> {
    thread::spawn(move || {
        while !keys.is_closed() {
            match event::poll(KEY_POLL_INTERVAL) {
                Ok(false) => {}
                Ok(true) => match event::read() {
                    Ok(Event::Key(key)) => {
                        if keys.send(key).is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(err) => {
                        warn!(error = %err, "failed to read terminal event");
                        break;
                    }
                },
                Err(err) => {
                    warn!(error = %err, "failed to poll terminal events");
                    break;
                }
            }
        }
    })
}

pub struct ReviewScreen {
    query: String,
    editing: bool,
}

impl ReviewScreen {
    pub fn new(query: String) -> Self {
        Self {
            query,
            editing: false,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<ScreenAction> {
        if key.kind == KeyEventKind::Release {
            return None;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Some(ScreenAction::Quit);
        }

        if self.editing {
            match key.code {
                KeyCode::Enter => {
                    self.editing = false;
                    Some(ScreenAction::Search(self.query.clone()))
                }
                KeyCode::Esc => {
                    self.editing = false;
                    None
                }
                KeyCode::Backspace => {
                    self.query.pop();
                    None
                }
                KeyCode::Char(c) => {
                    self.query.push(c);
                    None
                }
                _ => None,
            }
        } else {
            match key.code {
                KeyCode::Left => Some(ScreenAction::Swipe(SwipeDirection::Left)),
                KeyCode::Right => Some(ScreenAction::Swipe(SwipeDirection::Right)),
                KeyCode::Down => Some(ScreenAction::Skip),
                KeyCode::Char('r') => Some(ScreenAction::Restart),
                KeyCode::Char('i') => Some(ScreenAction::Details),
                KeyCode::Char('/') => {
                    self.editing = true;
                    None
                }
                KeyCode::Enter => Some(ScreenAction::Search(self.query.clone())),
                KeyCode::Char('q') | KeyCode::Esc => Some(ScreenAction::Quit),
                _ => None,
            }
        }
    }

    /// Query header, card, notices and key bar from top to bottom.
    pub fn render(&self, frame: &mut Frame, controller: &ReviewController) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(3),
                Constraint::Length(NOTICE_HISTORY as u16 + 1),
                Constraint::Length(1),
            ])
            .split(frame.area());

        self.render_header(frame, chunks[0]);
        render_card(frame, chunks[1], controller);
        render_notices(frame, chunks[2], controller);
        render_key_bar(frame, chunks[3], controller);
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let query = if self.editing {
            Line::from(vec![
                Span::raw("Query: "),
                Span::styled(
                    format!("{}_", self.query),
                    Style::default().fg(Color::Yellow),
                ),
                Span::styled(
                    "  (Enter to load, Esc to cancel)",
                    Style::default().fg(Color::DarkGray),
                ),
            ])
        } else {
            Line::from(format!("Query: {}", self.query))
        };
        let header = Paragraph::new(query).block(
            Block::default()
                .borders(Borders::BOTTOM)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(Line::styled(
                    "Jira Swipe: left for change, right for run",
                    Style::default().fg(Color::Cyan),
                )),
        );
        frame.render_widget(header, area);
    }
}

fn render_card(frame: &mut Frame, area: Rect, controller: &ReviewController) {
    let session = controller.session();
    let mut block = Block::default().borders(Borders::ALL);

    let content = match session.state() {
        ReviewState::Idle => vec![
            Line::raw("No tickets to review."),
            Line::styled(
                "Press Enter to load tickets for the query, / to edit it.",
                Style::default().fg(Color::DarkGray),
            ),
        ],
        ReviewState::Loading => vec![Line::styled(
            "Loading tickets...",
            Style::default().fg(Color::Yellow),
        )],
        ReviewState::Exhausted => vec![
            Line::styled("All tickets processed!", Style::default().fg(Color::Green)),
            Line::raw(format!(
                "You reviewed all {} tickets. Press r to start over.",
                session.tickets().len()
            )),
        ],
        ReviewState::Reviewing => match session.current() {
            Some(ticket) => {
                block = block.title(format!(
                    " {} of {} ",
                    session.cursor() + 1,
                    session.tickets().len()
                ));
                card_lines(ticket, session.exit_direction())
            }
            None => Vec::new(),
        },
    };

    let card = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(card, area);
}

fn render_notices(frame: &mut Frame, area: Rect, controller: &ReviewController) {
    let lines: Vec<Line> = controller
        .notices()
        .map(|notice| match notice {
            Notice::Info(message) => {
                Line::styled(format!("+ {message}"), Style::default().fg(Color::Green))
            }
            Notice::Error(message) => {
                Line::styled(format!("! {message}"), Style::default().fg(Color::Red))
            }
        })
        .collect();
    let notices = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    frame.render_widget(notices, area);
}

fn render_key_bar(frame: &mut Frame, area: Rect, controller: &ReviewController) {
    let keys = Line::from(vec![
        Span::styled(
            " <- change   -> run   v skip ",
            Style::default().fg(Color::Black).bg(Color::Cyan),
        ),
        Span::styled(
            format!(
                "  i labels   / query   q quit   (limit {})",
                controller.settings().page_size()
            ),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    frame.render_widget(Paragraph::new(keys), area);
}

fn card_lines(ticket: &Ticket, exit: Option<ExitDirection>) -> Vec<Line<'static>> {
    let (marker, color) = match exit {
        Some(ExitDirection::Left) => ("  <<< change", Color::Red),
        Some(ExitDirection::Right) => ("  run >>>", Color::Green),
        Some(ExitDirection::Skip) => ("  (skipped)", Color::DarkGray),
        None => ("", Color::Reset),
    };
    let marker = Span::styled(marker, Style::default().fg(color));
    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                ticket.id.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!("  [{}]  {}", ticket.issue_type, ticket.priority)),
            marker,
        ]),
        Line::styled(
            ticket.summary.clone(),
            Style::default().fg(Color::Cyan),
        ),
        Line::raw(""),
    ];
    lines.extend(
        preview_description(&ticket.description)
            .lines()
            .map(|line| Line::raw(line.to_string())),
    );
    lines.push(Line::raw(""));
    lines.push(Line::raw(format!("Assignee: {}", ticket.assignee)));
    lines.push(Line::raw(format!("Reporter: {}", ticket.reporter)));
    lines.push(Line::raw(format!(
        "Components: {}",
        format_components(&ticket.components)
    )));
    lines.push(Line::raw(format!(
        "Estimate: {}",
        format_estimate(ticket.time_estimate)
    )));
    lines.push(Line::raw(format!("Open in Jira: {}", ticket.link)));
    lines
}

fn preview_description(description: &str) -> String {
    if description.chars().count() > DESCRIPTION_PREVIEW_CHARS {
        let preview: String = description.chars().take(DESCRIPTION_PREVIEW_CHARS).collect();
        format!("{preview}...")
    } else {
        description.to_string()
    }
}

fn format_components(components: &[String]) -> String {
    if components.is_empty() {
        "Not specified".to_string()
    } else {
        components.join(", ")
    }
}

fn format_estimate(seconds: u64) -> String {
    if seconds == 0 {
        "Not estimated".to_string()
    } else {
        format!("{}h", (seconds as f64 / 3600.0).round() as u64)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use ratatui::backend::TestBackend;
    use ratatui::buffer::Buffer;
    use tokio::sync::mpsc;

    use super::*;
    use crate::domain::settings::{Credentials, Settings};
    use crate::domain::ticket::TicketLabel;
    use crate::review::proxy::TicketProxy;
    use crate::review::session::tests::ticket;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn arrow_keys_map_to_review_actions() {
        let mut screen = ReviewScreen::new("project = A".to_string());
        assert_eq!(
            screen.handle_key(press(KeyCode::Left)),
            Some(ScreenAction::Swipe(SwipeDirection::Left))
        );
        assert_eq!(
            screen.handle_key(press(KeyCode::Right)),
            Some(ScreenAction::Swipe(SwipeDirection::Right))
        );
        assert_eq!(
            screen.handle_key(press(KeyCode::Down)),
            Some(ScreenAction::Skip)
        );
        assert_eq!(screen.handle_key(press(KeyCode::Up)), None);
        assert_eq!(
            screen.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(ScreenAction::Quit)
        );
    }

    #[test]
    fn query_editing_captures_typed_keys() {
        let mut screen = ReviewScreen::new("project = A".to_string());
        assert_eq!(screen.handle_key(press(KeyCode::Char('/'))), None);
        screen.handle_key(press(KeyCode::Backspace));
        assert_eq!(screen.handle_key(press(KeyCode::Char('B'))), None);
        assert_eq!(screen.handle_key(press(KeyCode::Left)), None);
        assert_eq!(
            screen.handle_key(press(KeyCode::Enter)),
            Some(ScreenAction::Search("project = B".to_string()))
        );
        assert_eq!(screen.query, "project = B");
        assert_eq!(
            screen.handle_key(press(KeyCode::Char('q'))),
            Some(ScreenAction::Quit)
        );
    }

    #[test]
    fn truncates_long_descriptions() {
        let long = "x".repeat(600);
        let preview = preview_description(&long);
        assert_eq!(preview.len(), 503);
        assert!(preview.ends_with("..."));
        assert_eq!(preview_description("short"), "short");
    }

    #[test]
    fn formats_estimates_and_components() {
        assert_eq!(format_estimate(0), "Not estimated");
        assert_eq!(format_estimate(1800), "1h");
        assert_eq!(format_estimate(7200), "2h");
        assert_eq!(format_components(&[]), "Not specified");
        assert_eq!(
            format_components(&["api".to_string(), "ui".to_string()]),
            "api, ui"
        );
    }

    struct StaticProxy(Vec<Ticket>);

    #[async_trait]
    impl TicketProxy for StaticProxy {
        async fn search(&self, _: &str, _: u32, _: &Credentials) -> AppResult<Vec<Ticket>> {
            Ok(self.0.clone())
        }

        async fn add_label(&self, _: &str, _: TicketLabel, _: &Credentials) -> AppResult<String> {
            Ok(String::new())
        }

        async fn ticket(&self, id: &str, _: &Credentials) -> AppResult<Ticket> {
            Ok(ticket(id))
        }
    }

    fn buffer_text(buffer: &Buffer) -> String {
        let area = buffer.area;
        let mut text = String::new();
        for y in area.top()..area.bottom() {
            for x in area.left()..area.right() {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    fn draw(
        screen: &ReviewScreen,
        controller: &ReviewController,
        width: u16,
        height: u16,
    ) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal
            .draw(|frame| screen.render(frame, controller))
            .unwrap();
        buffer_text(terminal.backend().buffer())
    }

    fn settings() -> Settings {
        Settings {
            jira_url: "https://jira".to_string(),
            jira_token: "token".to_string(),
            task_limit: 10,
        }
    }

    #[tokio::test]
    async fn renders_current_card_with_counter() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let proxy = Arc::new(StaticProxy(vec![ticket("A-1"), ticket("A-2")]));
        let mut controller = ReviewController::new(proxy, settings(), tx);
        let screen = ReviewScreen::new("project = A".to_string());

        let idle = draw(&screen, &controller, 80, 24);
        assert!(idle.contains("No tickets to review."));

        controller.search("project = A");
        controller.handle(rx.recv().await.unwrap());

        let text = draw(&screen, &controller, 80, 30);
        assert!(text.contains("A-1  [Task]  Medium"));
        assert!(text.contains("Summary of A-1"));
        assert!(text.contains(" 1 of 2 "));
        assert!(text.contains("Estimate: Not estimated"));
        assert!(text.contains("+ Loaded 2 tickets (limit: 10)"));
        assert!(text.contains("q quit"));
    }

    #[tokio::test]
    async fn long_descriptions_stay_inside_the_card() {
        let mut long = ticket("A-1");
        long.description = (0..80)
            .map(|i| format!("line {i}"))
            .collect::<Vec<_>>()
            .join("\n");
        let (tx, mut rx) = mpsc::unbounded_channel();
        let proxy = Arc::new(StaticProxy(vec![long]));
        let mut controller = ReviewController::new(proxy, settings(), tx);
        controller.search("project = A");
        controller.handle(rx.recv().await.unwrap());
        let screen = ReviewScreen::new("project = A".to_string());

        let text = draw(&screen, &controller, 80, 20);
        let rows: Vec<&str> = text.lines().collect();
        assert_eq!(rows.len(), 20);
        assert!(rows[0].contains("Jira Swipe"));
        assert!(rows[19].contains("q quit"));
        assert!(text.contains("line 0"));
        assert!(!text.contains("line 20"));
    }

    #[test]
    fn card_marks_the_exit_direction() {
        let lines = card_lines(&ticket("A-1"), Some(ExitDirection::Left));
        assert_eq!(lines[0].to_string(), "A-1  [Task]  Medium  <<< change");
        let lines = card_lines(&ticket("A-1"), None);
        assert_eq!(lines[0].to_string(), "A-1  [Task]  Medium");
    }
}
