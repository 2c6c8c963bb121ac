//! Tabular views for the payout dashboard.
//!
//! Renders the raw filtered rows as a bordered
//! [`ratatui::widgets::Table`], plus the shared empty state.

use ratatui::{
    layout::{Constraint, Rect},
    style::Style,
    text::{Line, Span, Text},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use insights_core::formatting;
use insights_core::models::{PayoutRecord, PayoutTable};

use crate::themes::Theme;

/// Widest a free-text cell (id, customer, endpoint) may grow.
const MAX_TEXT_WIDTH: usize = 24;

// ── Raw table ─────────────────────────────────────────────────────────────────

/// Render the filtered rows, starting at row `offset`.
///
/// An empty table renders the empty state instead.
pub fn render_raw_table(
    frame: &mut Frame,
    area: Rect,
    table: &PayoutTable,
    offset: usize,
    focused: bool,
    theme: &Theme,
) {
    if table.is_empty() {
        render_no_data(frame, area, "Raw filtered output", theme);
        return;
    }

    let header = Row::new(
        table
            .columns()
            .iter()
            .map(|h| Cell::from(*h).style(theme.table_header)),
    )
    .height(1);

    // Border (2) plus header (1).
    let visible = area.height.saturating_sub(3) as usize;
    let start = offset.min(table.len().saturating_sub(1));

    let rows: Vec<Row> = table
        .iter()
        .enumerate()
        .skip(start)
        .take(visible.max(1))
        .map(|(i, record)| raw_row(record).style(zebra(i, theme)))
        .collect();

    let widths = [
        Constraint::Length(19),
        Constraint::Length(12),
        Constraint::Length(12),
        Constraint::Length(5),
        Constraint::Length(7),
        Constraint::Length(16),
        Constraint::Length(8),
        Constraint::Length(14),
        Constraint::Length(MAX_TEXT_WIDTH as u16),
        Constraint::Length(24),
        Constraint::Length(MAX_TEXT_WIDTH as u16),
        Constraint::Length(MAX_TEXT_WIDTH as u16),
    ];

    let title = format!(
        " Raw filtered output ({}-{} of {}) ",
        start + 1,
        (start + rows.len()).min(table.len()),
        table.len()
    );

    let widget = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.border_style(focused))
                .title(title),
        )
        .style(theme.text);

    frame.render_widget(widget, area);
}

fn raw_row(record: &PayoutRecord) -> Row<'static> {
    Row::new(vec![
        Cell::from(record.created_at.format("%Y-%m-%d %H:%M:%S").to_string()),
        Cell::from(formatting::format_optional_amount(record.total_amount)),
        Cell::from(formatting::format_optional_amount(record.payout_amount)),
        Cell::from(flag(record.paid)),
        Cell::from(flag(record.paidout)),
        Cell::from(formatting::format_optional_amount(record.additional_amount)),
        Cell::from(flag(record.refunded)),
        Cell::from(formatting::format_optional_amount(record.refunded_amount)),
        Cell::from(truncate(record.id.as_deref().unwrap_or(""), MAX_TEXT_WIDTH)),
        Cell::from(formatting::format_optional_amount(record.plan_price)),
        Cell::from(truncate(&record.customer, MAX_TEXT_WIDTH)),
        Cell::from(truncate(&record.endpoint, MAX_TEXT_WIDTH)),
    ])
}

fn flag(value: Option<bool>) -> &'static str {
    match value {
        Some(true) => "yes",
        Some(false) => "no",
        None => "-",
    }
}

// ── Empty state ───────────────────────────────────────────────────────────────

/// Render the empty state used when a filter leaves nothing to show.
pub fn render_no_data(frame: &mut Frame, area: Rect, title: &str, theme: &Theme) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled("No rows match the current filters", theme.warning)),
        Line::from(Span::styled("Press 'c' to clear all filters", theme.dim)),
    ];
    frame.render_widget(
        Paragraph::new(Text::from(text)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.table_border)
                .title(format!(" {} ", title)),
        ),
        area,
    );
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn zebra(index: usize, theme: &Theme) -> Style {
    if index % 2 == 0 {
        theme.table_row
    } else {
        theme.table_row_alt
    }
}

/// Cut `s` to at most `max_width` display columns, marking the cut with `…`.
pub fn truncate(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    let budget = max_width.saturating_sub(1);
    let mut out = String::new();
    let mut used = 0;
    for ch in s.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(ch);
    }
    out.push('…');
    out
}

// ── Tests ──────────────────────────────────────────────────────────────────────
