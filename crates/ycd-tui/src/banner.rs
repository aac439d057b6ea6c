//! Subscription banner shown across the top of the dashboard.
//!
//! The banner states the plan, warns when any quota is close to running out,
//! and offers the upgrade trigger. It holds no state of its own: every frame
//! it is rebuilt from the latest [`UsageReport`].

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};
use ycd_plans::{PlanCatalog, UsageReport};

use crate::text::{banner_headline, limit_warning, upgrade_hint};
use crate::theme::{ThemeColors, tier_badge_span, tier_color};

/// Banner widget.
pub struct SubscriptionBanner<'a> {
    report: Option<&'a UsageReport>,
    catalog: &'a PlanCatalog,
    colors: ThemeColors,
}

impl<'a> SubscriptionBanner<'a> {
    /// Create a banner. `None` renders the loading placeholder.
    pub fn new(report: Option<&'a UsageReport>, catalog: &'a PlanCatalog) -> Self {
        Self {
            report,
            catalog,
            colors: ThemeColors::default(),
        }
    }

    fn lines(&self, report: &UsageReport) -> Vec<Line<'static>> {
        let tier = report.display_tier();
        let mut headline = vec![
            tier_badge_span(tier),
            Span::raw(" "),
            Span::styled(
                banner_headline(report),
                Style::default()
                    .fg(tier_color(tier))
                    .add_modifier(Modifier::BOLD),
            ),
        ];

        if let Some(hint) = upgrade_hint(report, self.catalog) {
            headline.push(Span::raw("   "));
            headline.push(Span::styled("[u]", Style::default().fg(self.colors.hotkey)));
            headline.push(Span::styled(
                format!(" {}", hint),
                Style::default().fg(self.colors.text),
            ));
        }

        let mut lines = vec![Line::from(headline)];

        if let Some(warning) = limit_warning(report) {
            let color = if report.any_exhausted() {
                self.colors.status_error
            } else {
                self.colors.status_warning
            };
            lines.push(Line::from(Span::styled(
                format!("⚠ {}", warning),
                Style::default().fg(color),
            )));
        }

        lines
    }
}

impl Widget for SubscriptionBanner<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_color = match self.report {
            Some(report) if report.any_exhausted() => self.colors.status_error,
            Some(report) if report.any_nearing_limit() => self.colors.status_warning,
            _ => self.colors.border_dim,
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color))
            .title(Span::styled(
                " YCD ",
                Style::default()
                    .fg(self.colors.header)
                    .add_modifier(Modifier::BOLD),
            ));

        let Some(report) = self.report else {
            Paragraph::new("Loading subscription...")
                .style(Style::default().fg(self.colors.text_dim))
                .block(block)
                .render(area, buf);
            return;
        };

        Paragraph::new(self.lines(report))
            .wrap(Wrap { trim: true })
            .block(block)
            .render(area, buf);
    }
}
