use crate::themes::Theme;
use ratatui::text::{Line, Span};

/// Accent placed either side of the application title.
pub const ACCENT: &str = "◆ ◇ ◆";

/// Dashboard header rendering three lines:
///
/// 1. Application title (ALL CAPS) between accents.
/// 2. A 60-column `=` separator.
/// 3. Source file and row counts in `[ file | rows ]` format.
pub struct Header<'a> {
    /// Name of the loaded export, or `None` before anything is loaded.
    pub source: Option<&'a str>,
    /// Rows left after filtering.
    pub rows_filtered: usize,
    /// Rows in the full table.
    pub rows_total: usize,
    pub theme: &'a Theme,
}

impl<'a> Header<'a> {
    pub fn new(
        source: Option<&'a str>,
        rows_filtered: usize,
        rows_total: usize,
        theme: &'a Theme,
    ) -> Self {
        Self {
            source,
            rows_filtered,
            rows_total,
            theme,
        }
    }

    pub fn to_lines(&self) -> Vec<Line<'a>> {
        let separator = "=".repeat(60);
        let source = self.source.unwrap_or("no file loaded").to_string();

        vec![
            Line::from(vec![
                Span::styled(ACCENT, self.theme.header_accent),
                Span::styled(" PAYOUT INSIGHTS ", self.theme.header),
                Span::styled(ACCENT, self.theme.header_accent),
            ]),
            Line::from(Span::styled(separator, self.theme.separator)),
            Line::from(vec![
                Span::styled("[ ", self.theme.label),
                Span::styled(source, self.theme.value),
                Span::styled(" | ", self.theme.label),
                Span::styled(
                    format!("{} of {} rows", self.rows_filtered, self.rows_total),
                    self.theme.value,
                ),
                Span::styled(" ]", self.theme.label),
            ]),
        ]
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn text(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_header_line_count() {
        let theme = Theme::dark();
        let header = Header::new(Some("export.json"), 3, 10, &theme);
        assert_eq!(header.to_lines().len(), 3);
    }

    #[test]
    fn test_header_title() {
        let theme = Theme::dark();
        let lines = Header::new(None, 0, 0, &theme).to_lines();
        let title = text(&lines[0]);
        assert!(title.contains("PAYOUT INSIGHTS"), "got: {title}");
        assert!(title.starts_with(ACCENT));
    }

    #[test]
    fn test_header_separator() {
        let theme = Theme::dark();
        let lines = Header::new(None, 0, 0, &theme).to_lines();
        let sep = text(&lines[1]);
        assert_eq!(sep.chars().count(), 60);
        assert!(sep.chars().all(|c| c == '='));
    }

    #[test]
    fn test_header_info_line() {
        let theme = Theme::dark();
        let lines = Header::new(Some("export.json"), 3, 10, &theme).to_lines();
        assert_eq!(text(&lines[2]), "[ export.json | 3 of 10 rows ]");
        assert_eq!(lines[2].spans.len(), 5);
    }

    #[test]
    fn test_header_without_source() {
        let theme = Theme::dark();
        let lines = Header::new(None, 0, 0, &theme).to_lines();
        assert!(text(&lines[2]).contains("no file loaded"));
    }
}
