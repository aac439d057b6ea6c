//! Plan cards and the side-by-side plan comparison.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};
use ycd_plans::{Plan, PlanCatalog, PlanTier, ResourceKind};

use crate::theme::{ThemeColors, tier_color};

/// Card describing one plan.
pub struct SubscriptionPlanCard<'a> {
    plan: &'a Plan,
    current: bool,
    colors: ThemeColors,
}

impl<'a> SubscriptionPlanCard<'a> {
    /// Create a card for a plan.
    pub fn new(plan: &'a Plan) -> Self {
        Self {
            plan,
            current: false,
            colors: ThemeColors::default(),
        }
    }

    /// Mark the plan as the user's current one.
    pub fn current(mut self, current: bool) -> Self {
        self.current = current;
        self
    }

    fn lines(&self) -> Vec<Line<'static>> {
        let accent = tier_color(self.plan.tier);
        let mut lines = vec![Line::from(Span::styled(
            self.plan.price_label(),
            Style::default().fg(accent).add_modifier(Modifier::BOLD),
        ))];

        if self.plan.popular {
            lines.push(Line::from(Span::styled(
                "★ Most popular",
                Style::default().fg(self.colors.hotkey),
            )));
        }
        if self.current {
            lines.push(Line::from(Span::styled(
                "✓ Current plan",
                Style::default().fg(self.colors.status_ok),
            )));
        }
        lines.push(Line::from(""));

        for kind in ResourceKind::ALL {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("{:<8}", kind.short_name()),
                    Style::default().fg(self.colors.text_dim),
                ),
                Span::styled(
                    self.plan.limit(kind).to_string(),
                    Style::default().fg(self.colors.text),
                ),
            ]));
        }

        if !self.plan.features.is_empty() {
            lines.push(Line::from(""));
            lines.extend(self.plan.features.iter().map(|feature| {
                Line::from(Span::styled(
                    format!("• {}", feature),
                    Style::default().fg(self.colors.text_dim),
                ))
            }));
        }

        lines
    }
}

impl Widget for SubscriptionPlanCard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let accent = tier_color(self.plan.tier);
        let border_style = if self.current {
            Style::default().fg(accent).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(self.colors.border_dim)
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(Span::styled(
                format!(" {} ", self.plan.name),
                Style::default().fg(accent).add_modifier(Modifier::BOLD),
            ));

        Paragraph::new(self.lines())
            .wrap(Wrap { trim: true })
            .block(block)
            .render(area, buf);
    }
}

/// All three plans side by side, free to premium.
pub struct PlanComparison<'a> {
    catalog: &'a PlanCatalog,
    current: Option<PlanTier>,
}

impl<'a> PlanComparison<'a> {
    /// Create a comparison. `current` marks the user's plan, if known.
    pub fn new(catalog: &'a PlanCatalog, current: Option<PlanTier>) -> Self {
        Self { catalog, current }
    }
}

impl Widget for PlanComparison<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
            ])
            .split(area);

        for (plan, column) in self.catalog.plans().into_iter().zip(columns.iter()) {
            SubscriptionPlanCard::new(plan)
                .current(self.current == Some(plan.tier))
                .render(*column, buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{Terminal, backend::TestBackend};

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn test_plan_card_content() {
        let catalog = PlanCatalog::builtin();
        let mut terminal = Terminal::new(TestBackend::new(40, 20)).unwrap();
        terminal
            .draw(|frame| {
                frame.render_widget(
                    SubscriptionPlanCard::new(catalog.plan(PlanTier::Pro)).current(true),
                    frame.area(),
                )
            })
            .unwrap();

        let out = buffer_text(&terminal);
        assert!(out.contains(" Pro "));
        assert!(out.contains("$9.99/mo"));
        assert!(out.contains("Most popular"));
        assert!(out.contains("Current plan"));
        assert!(out.contains("Video   20"));
    }

    #[test]
    fn test_comparison_shows_all_plans() {
        let catalog = PlanCatalog::builtin();
        let mut terminal = Terminal::new(TestBackend::new(96, 20)).unwrap();
        terminal
            .draw(|frame| {
                frame.render_widget(
                    PlanComparison::new(&catalog, Some(PlanTier::Free)),
                    frame.area(),
                )
            })
            .unwrap();

        let out = buffer_text(&terminal);
        assert!(out.contains("Free"));
        assert!(out.contains("$19.99/mo"));
        assert!(out.contains("Unlimited"));
        assert_eq!(out.matches("Current plan").count(), 1);
    }
}
