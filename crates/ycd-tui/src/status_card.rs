//! Subscription status card: one usage bar per resource kind.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};
use ycd_plans::{Limit, ResourceUsage, UsageReport};

use crate::text::{expiry_line, remaining_label};
use crate::theme::{ThemeColors, panel_block, tier_badge_span};

/// Width reserved for the label and numbers beside a bar.
const BAR_LABEL_WIDTH: u16 = 30;

/// Render a horizontal progress bar.
pub fn render_usage_bar(percent: u8, width: usize, color: Color) -> Line<'static> {
    let percent = percent.min(100) as f64;
    let filled = ((percent / 100.0) * width as f64).round() as usize;
    let empty = width.saturating_sub(filled);

    Line::from(vec![
        Span::styled("█".repeat(filled), Style::default().fg(color)),
        Span::styled("░".repeat(empty), Style::default().fg(Color::DarkGray)),
    ])
}

/// Usage table for the current subscription.
pub struct SubscriptionStatusCard<'a> {
    report: Option<&'a UsageReport>,
    focused: bool,
    colors: ThemeColors,
}

impl<'a> SubscriptionStatusCard<'a> {
    /// Create a card. `None` renders the loading state.
    pub fn new(report: Option<&'a UsageReport>) -> Self {
        Self {
            report,
            focused: false,
            colors: ThemeColors::default(),
        }
    }

    /// Set focus state.
    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    fn resource_line(&self, row: &ResourceUsage, bar_width: usize) -> Line<'static> {
        let name = Span::styled(
            format!("{:<8}", row.kind.short_name()),
            Style::default().fg(self.colors.text),
        );

        let mut spans = vec![name];
        match row.limit {
            Limit::Unlimited => {
                spans.push(Span::styled(
                    format!("{:<width$}", "Unlimited", width = bar_width),
                    Style::default().fg(self.colors.status_ok),
                ));
            }
            Limit::Finite(_) => {
                let color = self.colors.tone(row.tone);
                spans.extend(render_usage_bar(row.percent, bar_width, color).spans);
            }
        }

        let numbers_style = if row.exhausted {
            Style::default()
                .fg(self.colors.status_error)
                .add_modifier(Modifier::BOLD)
        } else if row.nearing_limit {
            Style::default().fg(self.colors.status_warning)
        } else {
            Style::default().fg(self.colors.text_dim)
        };
        spans.push(Span::styled(
            format!(" {:>7} {:>3}%", row.usage_label(), row.percent),
            numbers_style,
        ));
        spans.push(Span::styled(
            format!("  {}", remaining_label(row.remaining)),
            Style::default().fg(self.colors.text_dim),
        ));

        Line::from(spans)
    }

    fn lines(&self, report: &UsageReport, width: u16) -> Vec<Line<'static>> {
        let bar_width = width.saturating_sub(BAR_LABEL_WIDTH).clamp(4, 24) as usize;

        let mut lines = vec![
            Line::from(vec![
                tier_badge_span(report.display_tier()),
                Span::raw(" "),
                Span::styled(
                    report.plan_name.clone(),
                    Style::default()
                        .fg(self.colors.text)
                        .add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from(""),
        ];

        lines.extend(
            report
                .resources
                .iter()
                .map(|row| self.resource_line(row, bar_width)),
        );

        if let (Some(expiry), Some(text)) = (report.expiry, expiry_line(report)) {
            let color = if expiry.is_expired() {
                self.colors.status_error
            } else if expiry.expires_soon() {
                self.colors.status_warning
            } else {
                self.colors.text_dim
            };
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(text, Style::default().fg(color))));
        }

        lines
    }
}

impl Widget for SubscriptionStatusCard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = panel_block("Subscription", self.focused, &self.colors);
        let inner = block.inner(area);
        block.render(area, buf);

        let Some(report) = self.report else {
            Paragraph::new("Loading subscription...")
                .style(Style::default().fg(self.colors.status_warning))
                .render(inner, buf);
            return;
        };

        Paragraph::new(self.lines(report, inner.width)).render(inner, buf);
    }
}
