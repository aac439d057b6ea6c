//! Batch result cells and the batch results table.
//!
//! A [`BatchResultCell`] renders one [`BatchCellView`]; the table projects
//! each item afresh on every frame, so a status change in the snapshot shows
//! up on the next draw with nothing cached in between.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table, Widget},
};
use ycd_plans::{BatchCellView, BatchJobItem, BatchStatus, BatchSummary, CellLimits};

use crate::text::{PLACEHOLDER, batch_item_label, batch_summary_line};
use crate::theme::{ThemeColors, panel_block};

/// Width of the item label column.
const LABEL_COLUMN_WIDTH: u16 = 24;

/// Styled line for a cell view.
pub fn cell_line(view: &BatchCellView, colors: &ThemeColors) -> Line<'static> {
    match view {
        BatchCellView::Status {
            status,
            icon,
            label,
            message,
        } => {
            let color = colors.batch_status(status);
            let mut spans = vec![
                Span::styled(format!("{} ", icon), Style::default().fg(color)),
                Span::styled(*label, Style::default().fg(color)),
            ];
            if let Some(message) = message {
                spans.push(Span::styled(
                    format!(" · {}", message),
                    Style::default().fg(colors.text_dim),
                ));
            }
            Line::from(spans)
        }
        BatchCellView::Completed {
            links,
            file_size,
            title,
        } => {
            let mut spans = Vec::new();
            for link in links {
                spans.push(Span::styled(
                    format!("[{}]", link.kind.label()),
                    Style::default()
                        .fg(colors.status_ok)
                        .add_modifier(Modifier::UNDERLINED),
                ));
                spans.push(Span::raw(" "));
            }
            if let Some(size) = file_size {
                spans.push(Span::styled(
                    format!("{} ", size),
                    Style::default().fg(colors.text_dim),
                ));
            }
            if let Some(title) = title {
                spans.push(Span::styled(title.clone(), Style::default().fg(colors.text)));
            }
            Line::from(spans)
        }
        BatchCellView::Failed { message, retryable } => {
            let color = colors.batch_status(&BatchStatus::Failed);
            let mut spans = vec![Span::styled("✖ Failed", Style::default().fg(color))];
            if let Some(message) = message {
                spans.push(Span::styled(
                    format!(": {}", message),
                    Style::default().fg(colors.text_dim),
                ));
            }
            if *retryable {
                spans.push(Span::raw(" "));
                spans.push(Span::styled("[Retry]", Style::default().fg(colors.hotkey)));
            }
            Line::from(spans)
        }
        BatchCellView::Placeholder => Line::from(Span::styled(
            PLACEHOLDER,
            Style::default().fg(colors.border_dim),
        )),
    }
}

/// One batch item's result.
pub struct BatchResultCell<'a> {
    item: &'a BatchJobItem,
    limits: CellLimits,
}

impl<'a> BatchResultCell<'a> {
    /// Create a cell for an item.
    pub fn new(item: &'a BatchJobItem, limits: CellLimits) -> Self {
        Self { item, limits }
    }

    /// The projected view for the item.
    pub fn view(&self) -> BatchCellView {
        BatchCellView::project(self.item, self.limits)
    }
}

impl Widget for BatchResultCell<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let line = cell_line(&self.view(), &ThemeColors::default());
        Paragraph::new(line).render(area, buf);
    }
}

/// Batch results panel: one row per item with a summary in the title.
pub struct BatchResultsTable<'a> {
    items: Option<&'a [BatchJobItem]>,
    limits: CellLimits,
    focused: bool,
    colors: ThemeColors,
}

impl<'a> BatchResultsTable<'a> {
    /// Create a table. `None` means no batch snapshot is loaded.
    pub fn new(items: Option<&'a [BatchJobItem]>, limits: CellLimits) -> Self {
        Self {
            items,
            limits,
            focused: false,
            colors: ThemeColors::default(),
        }
    }

    /// Set focus state.
    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }
}

impl Widget for BatchResultsTable<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let title = match self.items {
            Some(items) if !items.is_empty() => {
                format!("Batch Results · {}", batch_summary_line(&BatchSummary::from_items(items)))
            }
            _ => "Batch Results".to_string(),
        };
        let block = panel_block(&title, self.focused, &self.colors);
        let inner = block.inner(area);
        block.render(area, buf);

        let items = match self.items {
            None => {
                Paragraph::new("No batch loaded")
                    .style(Style::default().fg(self.colors.text_dim))
                    .render(inner, buf);
                return;
            }
            Some([]) => {
                Paragraph::new("Batch is empty")
                    .style(Style::default().fg(self.colors.text_dim))
                    .render(inner, buf);
                return;
            }
            Some(items) => items,
        };

        let rows: Vec<Row> = items
            .iter()
            .map(|item| {
                let view = BatchCellView::project(item, self.limits);
                Row::new(vec![
                    Cell::from(batch_item_label(item, LABEL_COLUMN_WIDTH as usize)),
                    Cell::from(cell_line(&view, &self.colors)),
                ])
            })
            .collect();

        let header = Row::new(vec!["Video", "Result"]).style(
            Style::default()
                .fg(self.colors.text_dim)
                .add_modifier(Modifier::BOLD),
        );

        let widths = [Constraint::Length(LABEL_COLUMN_WIDTH), Constraint::Min(10)];
        let table = Table::new(rows, widths).header(header).column_spacing(1);

        Widget::render(table, inner, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{Terminal, backend::TestBackend};
    use ycd_plans::LinkKind;

    fn draw(widget: impl Widget, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal
            .draw(|frame| frame.render_widget(widget, frame.area()))
            .unwrap();
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
    fn test_cell_line_placeholder() {
        let line = cell_line(&BatchCellView::Placeholder, &ThemeColors::default());
        assert_eq!(line.spans[0].content, "—");
    }

    #[test]
    fn test_cell_renders_each_status() {
        let limits = CellLimits::default();

        let processing = BatchJobItem::new(BatchStatus::Processing).with_message("Downloading");
        let out = draw(BatchResultCell::new(&processing, limits), 40, 1);
        assert!(out.contains("Processing · Downloading"));

        let failed = BatchJobItem::new(BatchStatus::Failed).with_message("Age restricted");
        let out = draw(BatchResultCell::new(&failed, limits), 60, 1);
        assert!(out.contains("Failed: Age restricted [Retry]"));

        let completed = BatchJobItem::new(BatchStatus::Completed)
            .with_link(LinkKind::View, "https://app/v/1")
            .with_link(LinkKind::Transcript, "https://cdn/1.txt")
            .with_file(800 * 1024, "Lecture 1");
        let out = draw(BatchResultCell::new(&completed, limits), 60, 1);
        assert!(out.contains("[Transcript] [View] 800KB Lecture 1"));

        let bare = BatchJobItem::new(BatchStatus::Completed);
        assert!(BatchResultCell::new(&bare, limits).view().is_placeholder());
    }

    #[test]
    fn test_table_states() {
        let limits = CellLimits::default();
        let out = draw(BatchResultsTable::new(None, limits), 50, 5);
        assert!(out.contains("No batch loaded"));

        let out = draw(BatchResultsTable::new(Some(&[][..]), limits), 50, 5);
        assert!(out.contains("Batch is empty"));
    }

    #[test]
    fn test_table_rows_and_summary() {
        let mut first = BatchJobItem::new(BatchStatus::Completed)
            .with_link(LinkKind::Audio, "https://cdn/a.mp3");
        first.video_id = Some("vid-1".into());
        let mut second = BatchJobItem::new(BatchStatus::Queued);
        second.video_id = Some("vid-2".into());
        let items = vec![first, second];

        let out = draw(
            BatchResultsTable::new(Some(items.as_slice()), CellLimits::default()).focused(true),
            80,
            6,
        );
        assert!(out.contains("Batch Results · 1/2 done"));
        assert!(out.contains("vid-1"));
        assert!(out.contains("[Audio]"));
        assert!(out.contains("Queued"));
    }
}
