use crate::themes::Theme;
use insights_core::formatting::{format_number, format_usd};
use insights_core::models::Kpis;
use ratatui::text::{Line, Span};

/// Left border drawn in front of every card line.
pub const CARD_BORDER: &str = "▌ ";

/// A metric card: a label line and a value line, both behind a coloured
/// left border.
pub struct KpiCard<'a> {
    pub label: &'a str,
    pub value: String,
    pub theme: &'a Theme,
}

impl<'a> KpiCard<'a> {
    pub fn new(label: &'a str, value: String, theme: &'a Theme) -> Self {
        Self {
            label,
            value,
            theme,
        }
    }

    /// The three cards shown above the charts, in display order.
    pub fn from_kpis(kpis: &Kpis, theme: &'a Theme) -> [KpiCard<'a>; 3] {
        [
            KpiCard::new("Total Amount", format_usd(kpis.total_amount), theme),
            KpiCard::new("Payout Amount", format_usd(kpis.payout_amount), theme),
            KpiCard::new("Rows", format_number(kpis.rows as f64, 0), theme),
        ]
    }

    pub fn to_lines(&self) -> Vec<Line<'a>> {
        vec![
            Line::from(vec![
                Span::styled(CARD_BORDER, self.theme.kpi_border),
                Span::styled(self.label, self.theme.label),
            ]),
            Line::from(vec![
                Span::styled(CARD_BORDER, self.theme.kpi_border),
                Span::styled(self.value.clone(), self.theme.kpi_value),
            ]),
        ]
    }
}
