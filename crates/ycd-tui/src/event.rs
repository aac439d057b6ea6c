//! Keyboard input handling for the dashboard.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Application-level events that can trigger state changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    /// Request application quit
    Quit,
    /// Force quit (Ctrl+C)
    ForceQuit,
    /// Re-read snapshot files from disk
    Reload,
    /// Fire the upgrade trigger
    Upgrade,
    /// Move focus to the other panel
    FocusNext,
    /// Show or hide the plan comparison
    TogglePlans,
    /// Show help overlay
    ShowHelp,
    /// Close the open overlay
    Cancel,
    /// No action needed
    None,
}

/// Input handler for converting key events to app events.
#[derive(Debug, Default)]
pub struct InputHandler;

impl InputHandler {
    /// Create a new input handler.
    pub fn new() -> Self {
        Self
    }

    /// Handle a key event and return the corresponding app event.
    pub fn handle_key(&mut self, key: KeyEvent) -> AppEvent {
        // Ctrl+C always force quits
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return AppEvent::ForceQuit;
        }

        // Ctrl+L reloads, like the plain r key
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('l') {
            return AppEvent::Reload;
        }

        match key.code {
            KeyCode::Esc => AppEvent::Cancel,
            KeyCode::Tab | KeyCode::BackTab => AppEvent::FocusNext,
            KeyCode::Char('q') | KeyCode::Char('Q') => AppEvent::Quit,
            KeyCode::Char('r') | KeyCode::Char('R') | KeyCode::F(5) => AppEvent::Reload,
            KeyCode::Char('u') | KeyCode::Char('U') => AppEvent::Upgrade,
            KeyCode::Char('p') | KeyCode::Char('P') => AppEvent::TogglePlans,
            KeyCode::Char('?') | KeyCode::Char('h') | KeyCode::Char('H') => AppEvent::ShowHelp,
            _ => AppEvent::None,
        }
    }
}
