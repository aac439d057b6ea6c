//! Colors and shared styling for the YCD widgets.
//!
//! Widgets take their palette from here so that tier badges, progress bars
//! and batch status icons read the same everywhere on screen.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;
use ratatui::widgets::{Block, Borders};
use ycd_plans::{BatchStatus, PlanTier, ProgressTone};

/// Color palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemeColors {
    /// Primary headers and focused borders
    pub header: Color,
    /// Hotkey hints
    pub hotkey: Color,
    /// Normal text
    pub text: Color,
    /// Secondary text
    pub text_dim: Color,
    /// Unfocused borders and empty bar cells
    pub border_dim: Color,
    /// Focused panel border and title
    pub focus_highlight: Color,
    /// Healthy usage
    pub status_ok: Color,
    /// Usage getting close to the limit
    pub status_warning: Color,
    /// Usage at or over the limit, failures
    pub status_error: Color,
}

impl Default for ThemeColors {
    fn default() -> Self {
        Self {
            header: Color::Cyan,
            hotkey: Color::Yellow,
            text: Color::White,
            text_dim: Color::Gray,
            border_dim: Color::DarkGray,
            focus_highlight: Color::LightCyan,
            status_ok: Color::Green,
            status_warning: Color::Yellow,
            status_error: Color::Red,
        }
    }
}

impl ThemeColors {
    /// Bar and label color for a progress bucket.
    pub fn tone(&self, tone: ProgressTone) -> Color {
        match tone {
            ProgressTone::Ok => self.status_ok,
            ProgressTone::Warning => self.status_warning,
            ProgressTone::Danger => self.status_error,
        }
    }

    /// Color for a batch item status.
    pub fn batch_status(&self, status: &BatchStatus) -> Color {
        match status {
            BatchStatus::Queued => self.text_dim,
            BatchStatus::Processing => self.header,
            BatchStatus::Completed => self.status_ok,
            BatchStatus::Failed => self.status_error,
            BatchStatus::Unknown(_) => self.border_dim,
        }
    }
}

/// Accent color for a tier.
pub fn tier_color(tier: PlanTier) -> Color {
    match tier {
        PlanTier::Free => Color::Gray,
        PlanTier::Pro => Color::Cyan,
        PlanTier::Premium => Color::Magenta,
    }
}

/// Badge text for a tier, e.g. "PRO".
pub fn tier_badge(tier: PlanTier) -> &'static str {
    match tier {
        PlanTier::Free => "FREE",
        PlanTier::Pro => "PRO",
        PlanTier::Premium => "PREMIUM",
    }
}

/// Bold reversed badge span for a tier.
pub fn tier_badge_span(tier: PlanTier) -> Span<'static> {
    Span::styled(
        format!(" {} ", tier_badge(tier)),
        Style::default()
            .fg(Color::Black)
            .bg(tier_color(tier))
            .add_modifier(Modifier::BOLD),
    )
}

/// Bordered panel block with a focus marker in the title.
pub fn panel_block(title: &str, focused: bool, colors: &ThemeColors) -> Block<'static> {
    // "◆" for focused, "◇" for unfocused
    let focus_icon = if focused { "◆" } else { "◇" };

    let (border_style, title_style) = if focused {
        (
            Style::default().fg(colors.focus_highlight),
            Style::default()
                .fg(colors.focus_highlight)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        (
            Style::default().fg(colors.border_dim),
            Style::default().fg(colors.text_dim),
        )
    };

    Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(Span::styled(format!(" {} {} ", focus_icon, title), title_style))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tone_colors() {
        let colors = ThemeColors::default();
        assert_eq!(colors.tone(ProgressTone::Ok), Color::Green);
        assert_eq!(colors.tone(ProgressTone::Warning), Color::Yellow);
        assert_eq!(colors.tone(ProgressTone::Danger), Color::Red);
    }

    #[test]
    fn test_tier_badges() {
        assert_eq!(tier_badge(PlanTier::Pro), "PRO");
        assert_eq!(tier_badge_span(PlanTier::Premium).content, " PREMIUM ");
        assert_ne!(tier_color(PlanTier::Free), tier_color(PlanTier::Premium));
    }

    #[test]
    fn test_batch_status_colors() {
        let colors = ThemeColors::default();
        assert_eq!(colors.batch_status(&BatchStatus::Failed), Color::Red);
        assert_eq!(
            colors.batch_status(&BatchStatus::Unknown("x".into())),
            Color::DarkGray
        );
    }
}
