//! Main application state and logic for the YCD dashboard.
//!
//! The `App` holds the latest subscription and batch snapshots and nothing
//! derived from them. Every frame re-evaluates the snapshot, so a refreshed
//! file shows up on the next draw.

use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::{Local, NaiveDate};
use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};
use tracing::{debug, info};
use ycd_core::{Result, YcdError};
use ycd_plans::{BatchJobItem, CellLimits, PlanCatalog, SubscriptionStatus, UsageEvaluator, UsageReport};

use crate::banner::SubscriptionBanner;
use crate::batch_cell::BatchResultsTable;
use crate::event::{AppEvent, InputHandler};
use crate::plan_card::PlanComparison;
use crate::status_card::SubscriptionStatusCard;
use crate::theme::ThemeColors;
use crate::watcher::{
    SnapshotEvent, SnapshotKind, SnapshotWatcher, SnapshotWatcherConfig, WatcherResult,
    load_snapshot,
};

/// Target frame rate.
const TARGET_FPS: u64 = 30;
const FRAME_DURATION: Duration = Duration::from_millis(1000 / TARGET_FPS);

/// Redraw at least this often so date-relative labels stay current.
const IDLE_REDRAW_INTERVAL: Duration = Duration::from_secs(1);

/// Below this width the status card and batch table stack vertically.
const SIDE_BY_SIDE_MIN_WIDTH: u16 = 100;

/// Callback fired when the user asks to upgrade. Receives nothing: the
/// dashboard never builds checkout links.
pub type UpgradeCallback = Box<dyn FnMut()>;

/// Dashboard panel holding focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Panel {
    #[default]
    Status,
    Batch,
}

impl Panel {
    /// The other panel.
    pub fn next(self) -> Self {
        match self {
            Panel::Status => Panel::Batch,
            Panel::Batch => Panel::Status,
        }
    }
}

/// Main application state.
pub struct App {
    /// Evaluator (and catalog) for the subscription snapshot
    evaluator: UsageEvaluator,
    /// Truncation lengths for batch cells
    cell_limits: CellLimits,
    /// Subscription snapshot file
    status_file: Option<PathBuf>,
    /// Batch snapshot file
    batch_file: Option<PathBuf>,
    /// Latest subscription snapshot
    status: Option<SubscriptionStatus>,
    /// Latest batch snapshot
    batch: Option<Vec<BatchJobItem>>,
    /// File watcher, when live reload is on
    watcher: Option<SnapshotWatcher>,
    /// Input handler for key events
    input_handler: InputHandler,
    /// Upgrade trigger
    on_upgrade: Option<UpgradeCallback>,
    /// Focused panel
    focus: Panel,
    /// Whether the app should quit
    should_quit: bool,
    /// Whether to show the help overlay
    show_help: bool,
    /// Whether to show the plan comparison overlay
    show_plans: bool,
    /// Transient message for the footer
    status_message: Option<String>,
    /// Last snapshot read failure
    last_error: Option<String>,
    /// Fixed "today" for date labels; the local date when unset
    today: Option<NaiveDate>,
    /// Redraw needed
    dirty: bool,
}

impl App {
    /// Create an app evaluating snapshots with the given evaluator.
    pub fn new(evaluator: UsageEvaluator) -> Self {
        Self {
            evaluator,
            cell_limits: CellLimits::default(),
            status_file: None,
            batch_file: None,
            status: None,
            batch: None,
            watcher: None,
            input_handler: InputHandler::new(),
            on_upgrade: None,
            focus: Panel::default(),
            should_quit: false,
            show_help: false,
            show_plans: false,
            status_message: None,
            last_error: None,
            today: None,
            dirty: true,
        }
    }

    /// Set truncation lengths for batch cells.
    pub fn with_cell_limits(mut self, limits: CellLimits) -> Self {
        self.cell_limits = limits;
        self
    }

    /// Read the subscription snapshot from this file.
    pub fn with_status_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.status_file = Some(path.into());
        self
    }

    /// Read the batch snapshot from this file.
    pub fn with_batch_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.batch_file = Some(path.into());
        self
    }

    /// Start with a subscription snapshot.
    pub fn with_status(mut self, status: SubscriptionStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Start with a batch snapshot.
    pub fn with_batch(mut self, items: Vec<BatchJobItem>) -> Self {
        self.batch = Some(items);
        self
    }

    /// Pin the date used for expiry labels.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// Set the upgrade trigger.
    pub fn on_upgrade(mut self, callback: impl FnMut() + 'static) -> Self {
        self.on_upgrade = Some(Box::new(callback));
        self
    }

    /// The plan catalog in use.
    pub fn catalog(&self) -> &PlanCatalog {
        self.evaluator.catalog()
    }

    /// Evaluate the current subscription snapshot, if any.
    pub fn report(&self) -> Option<UsageReport> {
        let today = self.today.unwrap_or_else(|| Local::now().date_naive());
        self.status
            .as_ref()
            .map(|status| self.evaluator.evaluate(status, today))
    }

    /// Latest batch snapshot.
    pub fn batch(&self) -> Option<&[BatchJobItem]> {
        self.batch.as_deref()
    }

    /// Returns whether the app should quit.
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Panel that currently has focus.
    pub fn focused_panel(&self) -> Panel {
        self.focus
    }

    /// Returns whether the plan comparison is open.
    pub fn is_showing_plans(&self) -> bool {
        self.show_plans
    }

    /// Returns whether the help overlay is open.
    pub fn is_showing_help(&self) -> bool {
        self.show_help
    }

    /// Footer message from the last action.
    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    /// Last snapshot read failure.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Watch the snapshot files for changes.
    ///
    /// Does nothing when no snapshot file is configured.
    pub fn start_watching(&mut self, debounce_ms: u64) -> WatcherResult<()> {
        if self.status_file.is_none() && self.batch_file.is_none() {
            debug!("No snapshot files configured, live reload off");
            return Ok(());
        }

        let mut config = SnapshotWatcherConfig::default().with_debounce_ms(debounce_ms);
        config.status_file = self.status_file.clone();
        config.batch_file = self.batch_file.clone();

        self.watcher = Some(SnapshotWatcher::new(config)?);
        Ok(())
    }

    /// Re-read every configured snapshot file.
    ///
    /// A file that does not exist yet is skipped; the panel keeps showing its
    /// loading state until the file appears.
    pub fn reload(&mut self) {
        let targets = [
            (SnapshotKind::Status, self.status_file.clone()),
            (SnapshotKind::Batch, self.batch_file.clone()),
        ];

        for (kind, path) in targets {
            let Some(path) = path else { continue };
            if !path.exists() {
                debug!(path = ?path, "Snapshot file not present yet");
                continue;
            }
            self.apply_snapshot_event(load_snapshot(kind, &path));
        }
    }

    /// Drain pending watcher events. Returns true if anything changed.
    pub fn poll_snapshots(&mut self) -> bool {
        let mut events = Vec::new();
        if let Some(watcher) = &self.watcher {
            while let Some(event) = watcher.try_recv() {
                events.push(event);
            }
        }

        let changed = !events.is_empty();
        for event in events {
            self.apply_snapshot_event(event);
        }
        changed
    }

    /// Replace the held snapshot with a newly read one.
    ///
    /// A failed read keeps the previous snapshot and records the error.
    pub fn apply_snapshot_event(&mut self, event: SnapshotEvent) {
        match event {
            SnapshotEvent::StatusUpdated(status) => {
                debug!(tier = %status.tier, "Subscription snapshot updated");
                self.status = Some(status);
                self.last_error = None;
            }
            SnapshotEvent::BatchUpdated(items) => {
                debug!(items = items.len(), "Batch snapshot updated");
                self.batch = Some(items);
                self.last_error = None;
            }
            SnapshotEvent::Error { path, error, .. } => {
                self.last_error = Some(format!("{}: {}", path.display(), error));
            }
        }
        self.dirty = true;
    }

    /// Handle a key event.
    pub fn handle_key_event(&mut self, key: KeyEvent) {
        let event = self.input_handler.handle_key(key);

        // Any key closes the help overlay, except a force quit
        if self.show_help && event != AppEvent::ForceQuit {
            self.show_help = false;
            self.dirty = true;
            return;
        }

        self.handle_app_event(event);
    }

    /// Handle an application event.
    pub fn handle_app_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Quit | AppEvent::ForceQuit => {
                self.should_quit = true;
            }
            AppEvent::Reload => {
                self.reload();
                self.status_message = Some("Reloaded snapshots".to_string());
            }
            AppEvent::Upgrade => self.trigger_upgrade(),
            AppEvent::FocusNext => {
                self.focus = self.focus.next();
            }
            AppEvent::TogglePlans => {
                self.show_plans = !self.show_plans;
            }
            AppEvent::ShowHelp => {
                self.show_help = true;
            }
            AppEvent::Cancel => {
                self.show_plans = false;
                self.show_help = false;
                self.status_message = None;
            }
            AppEvent::None => return,
        }
        self.dirty = true;
    }

    /// Fire the upgrade trigger if there is a plan to upgrade to.
    fn trigger_upgrade(&mut self) {
        let Some(report) = self.report() else {
            self.status_message = Some("Subscription not loaded yet".to_string());
            return;
        };

        let Some(target) = report.display_tier().upgrade_target() else {
            self.status_message = Some("Already on the top plan".to_string());
            return;
        };

        info!(from = %report.tier, to = %target, "Upgrade requested");
        match self.on_upgrade.as_mut() {
            Some(callback) => {
                callback();
                self.status_message = Some(format!(
                    "Upgrade to {} requested",
                    self.evaluator.catalog().plan(target).name
                ));
            }
            None => {
                self.status_message = Some("Upgrades are not available here".to_string());
            }
        }
    }

    /// Run the main application loop.
    ///
    /// Failing to take over the terminal is [`YcdError::TerminalInit`]; I/O
    /// failures once the dashboard is up are [`YcdError::Terminal`].
    pub fn run(&mut self) -> Result<()> {
        let mut terminal = setup_terminal().map_err(|e| YcdError::TerminalInit {
            message: e.to_string(),
        })?;

        // Main loop
        let result = self.run_loop(&mut terminal);

        let restored =
            restore_terminal(&mut terminal).map_err(|e| YcdError::terminal("restoring the terminal", e));
        result.and(restored)
    }

    /// The inner event loop.
    fn run_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        let mut last_draw = Instant::now();

        while !self.should_quit {
            if self.poll_snapshots() {
                self.dirty = true;
            }

            if self.dirty || last_draw.elapsed() >= IDLE_REDRAW_INTERVAL {
                terminal
                    .draw(|frame| self.draw(frame))
                    .map_err(|e| YcdError::terminal("drawing the dashboard", e))?;
                self.dirty = false;
                last_draw = Instant::now();
            }

            let input = |e: io::Error| YcdError::terminal("reading input", e);
            if event::poll(FRAME_DURATION).map_err(input)? {
                match event::read().map_err(input)? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        self.handle_key_event(key);
                    }
                    Event::Resize(_, _) => self.dirty = true,
                    _ => {}
                }
            }
        }
        Ok(())
    }

    /// Draw the UI.
    pub fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let report = self.report();

        // Main layout: banner, content, footer
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4), // Banner
                Constraint::Min(8),    // Content
                Constraint::Length(2), // Footer
            ])
            .split(area);

        frame.render_widget(
            SubscriptionBanner::new(report.as_ref(), self.catalog()),
            chunks[0],
        );
        self.draw_content(frame, chunks[1], report.as_ref());
        self.draw_footer(frame, chunks[2]);

        if self.show_plans {
            self.draw_plans_overlay(frame, area, report.as_ref());
        }
        if self.show_help {
            self.draw_help_overlay(frame, area);
        }
    }

    /// Status card and batch results, side by side when there is room.
    fn draw_content(&self, frame: &mut Frame, area: Rect, report: Option<&UsageReport>) {
        let direction = if area.width >= SIDE_BY_SIDE_MIN_WIDTH {
            Direction::Horizontal
        } else {
            Direction::Vertical
        };
        let panels = Layout::default()
            .direction(direction)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(area);

        frame.render_widget(
            SubscriptionStatusCard::new(report).focused(self.focus == Panel::Status),
            panels[0],
        );
        frame.render_widget(
            BatchResultsTable::new(self.batch(), self.cell_limits)
                .focused(self.focus == Panel::Batch),
            panels[1],
        );
    }

    /// Footer with hotkey hints and the latest message.
    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let colors = ThemeColors::default();
        let hotkey_style = Style::default().fg(colors.hotkey);
        let hints = vec![
            Span::styled("[u]", hotkey_style),
            Span::raw("Upgrade "),
            Span::styled("[p]", hotkey_style),
            Span::raw("Plans "),
            Span::styled("[r]", hotkey_style),
            Span::raw("Reload "),
            Span::styled("[?]", hotkey_style),
            Span::raw("Help "),
            Span::styled("[q]", hotkey_style),
            Span::raw("Quit"),
        ];

        let (message, message_color) = match (&self.last_error, &self.status_message) {
            (Some(error), _) => (format!(" {} ", error), colors.status_error),
            (None, Some(message)) => (format!(" {} ", message), colors.text_dim),
            (None, None) => (String::new(), colors.text_dim),
        };

        let footer = Paragraph::new(Line::from(hints))
            .style(Style::default().fg(colors.text_dim))
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(colors.border_dim))
                    .title(Span::styled(message, Style::default().fg(message_color)))
                    .title_alignment(Alignment::Right),
            );

        frame.render_widget(footer, area);
    }

    /// Draw the plan comparison overlay.
    fn draw_plans_overlay(&self, frame: &mut Frame, area: Rect, report: Option<&UsageReport>) {
        let overlay_area = centered(area, 96, 20);
        frame.render_widget(Clear, overlay_area);

        let current = report.and_then(|r| r.tier.tier());
        frame.render_widget(PlanComparison::new(self.catalog(), current), overlay_area);
    }

    /// Draw the help overlay.
    fn draw_help_overlay(&self, frame: &mut Frame, area: Rect) {
        let colors = ThemeColors::default();
        let overlay_area = centered(area, 50, 15);
        frame.render_widget(Clear, overlay_area);

        let help_text = "\
YCD Hotkey Reference

  u        Upgrade plan
  p        Compare plans
  r        Reload snapshots
  Tab      Switch panel
  ?  h     Show this help
  Esc      Close overlay
  q        Quit
  Ctrl+C   Force quit

Press any key to close this help.";

        let help = Paragraph::new(help_text)
            .style(Style::default().fg(colors.text))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(colors.header))
                    .title(Span::styled(
                        " Help ",
                        Style::default().fg(colors.header).add_modifier(Modifier::BOLD),
                    ))
                    .style(Style::default().bg(Color::Black)),
            );

        frame.render_widget(help, overlay_area);
    }
}

fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<io::Stdout>>> {
    crossterm::terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, crossterm::terminal::EnterAlternateScreen)?;
    Terminal::new(CrosstermBackend::new(stdout))
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> io::Result<()> {
    crossterm::terminal::disable_raw_mode()?;
    crossterm::execute!(
        terminal.backend_mut(),
        crossterm::terminal::LeaveAlternateScreen
    )?;
    terminal.show_cursor()
}

/// Rect of at most `width` x `height` centered in `area`.
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(2));
    let height = height.min(area.height.saturating_sub(2));
    let x = area.x + (area.width - width) / 2;
    let y = area.y + (area.height - height) / 2;
    Rect::new(x, y, width, height)
}
