//! The main dashboard screen.
//!
//! Layout, top to bottom: header, then a filter sidebar on the left and on
//! the right KPI cards, the endpoint and customer bar charts, the monthly
//! payout line, and the raw filtered rows.  A one-line footer shows key
//! help or the latest status message.

use std::collections::BTreeSet;

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::Style,
    symbols,
    text::{Line, Span, Text},
    widgets::{
        Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Dataset, GraphType, List, ListItem,
        ListState, Paragraph,
    },
    Frame,
};

use insights_core::formatting;
use insights_core::models::{FilterSelection, SummaryTable};
use insights_runtime::session::DashboardSnapshot;

use crate::app::{Focus, StatusLine};
use crate::components::header::Header;
use crate::components::kpi_card::KpiCard;
use crate::table_view::{self, truncate};
use crate::themes::Theme;

/// Width of the filter sidebar in columns.
const SIDEBAR_WIDTH: u16 = 32;

const HELP: &str =
    "Tab focus  ↑/↓ move  Space toggle  [ ] start day  { } end day  c clear  x export  q quit";

/// Everything needed to draw one dashboard frame.
pub struct DashboardView<'a> {
    pub snapshot: &'a DashboardSnapshot,
    pub selection: &'a FilterSelection,
    pub source: Option<&'a str>,
    pub focus: Focus,
    pub endpoint_cursor: usize,
    pub customer_cursor: usize,
    pub table_offset: usize,
    pub status: Option<&'a StatusLine>,
}

// ── Main render ───────────────────────────────────────────────────────────────

pub fn render_dashboard(frame: &mut Frame, area: Rect, view: &DashboardView<'_>, theme: &Theme) {
    let [header_area, body, footer] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    let header = Header::new(
        view.source,
        view.snapshot.metadata.rows_filtered,
        view.snapshot.metadata.rows_total,
        theme,
    );
    frame.render_widget(Paragraph::new(Text::from(header.to_lines())), header_area);

    let [sidebar, main] =
        Layout::horizontal([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)]).areas(body);

    render_sidebar(frame, sidebar, view, theme);

    let [kpi_area, bars_area, month_area, table_area] = Layout::vertical([
        Constraint::Length(4),
        Constraint::Length(12),
        Constraint::Length(10),
        Constraint::Min(5),
    ])
    .areas(main);

    render_kpis(frame, kpi_area, view.snapshot, theme);

    let [endpoint_area, customer_area] =
        Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
            .areas(bars_area);
    render_bar_chart(
        frame,
        endpoint_area,
        "Payout by API endpoint",
        &view.snapshot.by_endpoint,
        theme.bar_endpoint,
        theme,
    );
    render_bar_chart(
        frame,
        customer_area,
        "Payout by customer",
        &view.snapshot.by_customer,
        theme.bar_customer,
        theme,
    );
    render_month_chart(frame, month_area, &view.snapshot.by_month, theme);

    table_view::render_raw_table(
        frame,
        table_area,
        &view.snapshot.filtered,
        view.table_offset,
        view.focus == Focus::Table,
        theme,
    );

    render_footer(frame, footer, view.status, theme);
}

/// Screen shown before any export has been loaded.
pub fn render_welcome(frame: &mut Frame, area: Rect, theme: &Theme) {
    let mut lines = Header::new(None, 0, 0, theme).to_lines();
    lines.extend([
        Line::from(""),
        Line::from(Span::styled("Upload your json file here", theme.info)),
        Line::from(Span::styled(
            "Start again with the path of a billing export: payout-insights <export.json>",
            theme.dim,
        )),
        Line::from(Span::styled("Press 'q' or Ctrl+C to exit", theme.dim)),
    ]);
    frame.render_widget(
        Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL)),
        area,
    );
}

// ── KPIs ──────────────────────────────────────────────────────────────────────

fn render_kpis(frame: &mut Frame, area: Rect, snapshot: &DashboardSnapshot, theme: &Theme) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.table_border)
        .title(" KPIs ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let cards = KpiCard::from_kpis(&snapshot.kpis, theme);
    let columns = Layout::horizontal([Constraint::Ratio(1, 3); 3]).split(inner);
    for (card, column) in cards.iter().zip(columns.iter()) {
        frame.render_widget(Paragraph::new(Text::from(card.to_lines())), *column);
    }
}

// ── Charts ────────────────────────────────────────────────────────────────────

fn render_bar_chart(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    summary: &SummaryTable,
    bar_style: Style,
    theme: &Theme,
) {
    if summary.is_empty() {
        table_view::render_no_data(frame, area, title, theme);
        return;
    }

    let inner_width = area.width.saturating_sub(2) as usize;
    let bar_width = (inner_width / summary.len())
        .saturating_sub(1)
        .clamp(1, 12);

    // Bars are integer-valued; negative sums draw as empty bars.
    let bars: Vec<Bar> = summary
        .rows
        .iter()
        .map(|row| {
            let payout = row.totals.payout_amount;
            Bar::default()
                .value(payout.max(0.0).round() as u64)
                .text_value(formatting::format_number(payout, 0))
                .label(Line::from(truncate(&row.key, bar_width)))
                .style(bar_style)
                .value_style(theme.bar_value)
        })
        .collect();

    let chart = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.table_border)
                .title(format!(" {} ", title)),
        )
        .data(BarGroup::default().bars(&bars))
        .bar_width(bar_width as u16)
        .bar_gap(1);

    frame.render_widget(chart, area);
}

fn render_month_chart(frame: &mut Frame, area: Rect, summary: &SummaryTable, theme: &Theme) {
    let title = "Payout by month";
    if summary.is_empty() {
        table_view::render_no_data(frame, area, title, theme);
        return;
    }

    let points = month_points(summary);
    let (min_y, max_y) = y_bounds(&points);
    let x_max = (points.len().saturating_sub(1)).max(1) as f64;

    let first = summary.rows.first().map(|r| r.key.clone()).unwrap_or_default();
    let last = summary.rows.last().map(|r| r.key.clone()).unwrap_or_default();

    let dataset = Dataset::default()
        .name("payout")
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(theme.line_month)
        .data(&points);

    let chart = Chart::new(vec![dataset])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.table_border)
                .title(format!(" {} ", title)),
        )
        .x_axis(
            Axis::default()
                .style(theme.axis)
                .bounds([0.0, x_max])
                .labels(vec![Span::raw(first), Span::raw(last)]),
        )
        .y_axis(
            Axis::default()
                .style(theme.axis)
                .bounds([min_y, max_y])
                .labels(vec![
                    Span::raw(formatting::format_number(min_y, 0)),
                    Span::raw(formatting::format_number(max_y, 0)),
                ]),
        );

    frame.render_widget(chart, area);
}

/// One `(index, payout)` point per month, in chronological order.
fn month_points(summary: &SummaryTable) -> Vec<(f64, f64)> {
    summary
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| (i as f64, row.totals.payout_amount))
        .collect()
}

/// Y range that always includes zero and never collapses to a point.
fn y_bounds(points: &[(f64, f64)]) -> (f64, f64) {
    let min = points.iter().map(|p| p.1).fold(0.0, f64::min);
    let max = points.iter().map(|p| p.1).fold(0.0, f64::max);
    if max - min < f64::EPSILON {
        (min, min + 1.0)
    } else {
        (min, max)
    }
}

// ── Sidebar ───────────────────────────────────────────────────────────────────

fn render_sidebar(frame: &mut Frame, area: Rect, view: &DashboardView<'_>, theme: &Theme) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.table_border)
        .title(" Filter section ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [dates, endpoints, customers] = Layout::vertical([
        Constraint::Length(4),
        Constraint::Percentage(50),
        Constraint::Percentage(50),
    ])
    .areas(inner);

    render_date_range(frame, dates, view, theme);
    render_option_list(
        frame,
        endpoints,
        "Filter by API endpoint",
        &view.snapshot.endpoint_options,
        &view.selection.endpoints,
        view.endpoint_cursor,
        view.focus == Focus::Endpoints,
        theme,
    );
    render_option_list(
        frame,
        customers,
        "Filter by customer",
        &view.snapshot.customer_options,
        &view.selection.customers,
        view.customer_cursor,
        view.focus == Focus::Customers,
        theme,
    );
}

fn render_date_range(frame: &mut Frame, area: Rect, view: &DashboardView<'_>, theme: &Theme) {
    let (from, to) = match view.snapshot.date_range {
        Some(range) => (range.from.to_string(), range.to.to_string()),
        None => ("-".to_string(), "-".to_string()),
    };
    let lines = vec![
        Line::from(Span::styled("Filter by time range", theme.label)),
        Line::from(vec![
            Span::styled("from ", theme.dim),
            Span::styled(from, theme.value),
        ]),
        Line::from(vec![
            Span::styled("to   ", theme.dim),
            Span::styled(to, theme.value),
        ]),
    ];
    frame.render_widget(Paragraph::new(Text::from(lines)), area);
}

#[allow(clippy::too_many_arguments)]
fn render_option_list(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    options: &[String],
    selected: &BTreeSet<String>,
    cursor: usize,
    focused: bool,
    theme: &Theme,
) {
    let name_width = area.width.saturating_sub(6) as usize;
    let items: Vec<ListItem> = options
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let is_selected = selected.contains(name);
            let mark = if is_selected { "[x] " } else { "[ ] " };
            ListItem::new(Line::from(Span::styled(
                format!("{}{}", mark, truncate(name, name_width)),
                theme.option_style(focused && i == cursor, is_selected),
            )))
        })
        .collect();

    let count = if selected.is_empty() {
        "all".to_string()
    } else {
        format!("{} selected", selected.len())
    };

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border_style(focused))
            .title(format!(" {} ({}) ", title, count)),
    );

    // The selection only drives scrolling; styling is applied per item.
    let mut state = ListState::default();
    if focused && !options.is_empty() {
        state.select(Some(cursor.min(options.len() - 1)));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

// ── Footer ────────────────────────────────────────────────────────────────────

fn render_footer(frame: &mut Frame, area: Rect, status: Option<&StatusLine>, theme: &Theme) {
    let line = match status {
        Some(StatusLine::Info(msg)) => Line::from(Span::styled(msg.clone(), theme.success)),
        Some(StatusLine::Error(msg)) => Line::from(Span::styled(msg.clone(), theme.error)),
        None => Line::from(Span::styled(HELP, theme.dim)),
    };
    frame.render_widget(Paragraph::new(line), area);
}

// ── Tests ──────────────────────────────────────────────────────────────────────
