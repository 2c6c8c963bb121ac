use ratatui::style::{Color, Modifier, Style};

/// Terminal background type detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackgroundType {
    Dark,
    Light,
    Unknown,
}

/// Detect terminal background type from the `COLORFGBG` environment variable.
///
/// The variable has the format `"foreground;background"`.  Background values
/// 0–6 are considered dark; 7–15 are considered light.  If the variable is
/// absent or unparseable, `BackgroundType::Dark` is returned.
pub fn detect_background() -> BackgroundType {
    if let Ok(val) = std::env::var("COLORFGBG") {
        if let Some(bg) = val.split(';').next_back() {
            if let Ok(bg_num) = bg.parse::<u8>() {
                return if bg_num <= 6 {
                    BackgroundType::Dark
                } else {
                    BackgroundType::Light
                };
            }
        }
    }
    BackgroundType::Dark
}

/// Every style the dashboard widgets draw with.
#[derive(Debug, Clone)]
pub struct Theme {
    // ── Header ───────────────────────────────────────────────────────────────
    pub header: Style,
    pub header_accent: Style,
    pub separator: Style,

    // ── Text ─────────────────────────────────────────────────────────────────
    pub text: Style,
    pub dim: Style,
    pub bold: Style,
    pub label: Style,
    pub value: Style,

    // ── Status ───────────────────────────────────────────────────────────────
    pub info: Style,
    pub success: Style,
    pub warning: Style,
    pub error: Style,

    // ── KPI cards ────────────────────────────────────────────────────────────
    /// Left border of a KPI card.
    pub kpi_border: Style,
    pub kpi_value: Style,

    // ── Charts ───────────────────────────────────────────────────────────────
    pub bar_endpoint: Style,
    pub bar_customer: Style,
    pub bar_value: Style,
    pub line_month: Style,
    pub axis: Style,

    // ── Table ────────────────────────────────────────────────────────────────
    pub table_header: Style,
    pub table_border: Style,
    pub table_row: Style,
    pub table_row_alt: Style,

    // ── Sidebar ──────────────────────────────────────────────────────────────
    /// Border of the panel that has keyboard focus.
    pub focus_border: Style,
    /// Row under the cursor.
    pub cursor: Style,
    /// Option that is part of the current selection.
    pub selected: Style,
}

impl Theme {
    // ── Constructors ─────────────────────────────────────────────────────────

    /// Dark-background terminal theme (default).
    pub fn dark() -> Self {
        Self {
            header: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            header_accent: Style::default().fg(Color::Yellow),
            separator: Style::default().fg(Color::DarkGray),

            text: Style::default().fg(Color::White),
            dim: Style::default().fg(Color::DarkGray),
            bold: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
            label: Style::default().fg(Color::Gray),
            value: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),

            info: Style::default().fg(Color::Cyan),
            success: Style::default().fg(Color::Green),
            warning: Style::default().fg(Color::Yellow),
            error: Style::default().fg(Color::Red),

            kpi_border: Style::default().fg(Color::Blue),
            kpi_value: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),

            bar_endpoint: Style::default().fg(Color::Cyan),
            bar_customer: Style::default().fg(Color::Magenta),
            bar_value: Style::default().fg(Color::Black).bg(Color::Cyan),
            line_month: Style::default().fg(Color::Green),
            axis: Style::default().fg(Color::Gray),

            table_header: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            table_border: Style::default().fg(Color::DarkGray),
            table_row: Style::default().fg(Color::White),
            table_row_alt: Style::default().fg(Color::Gray),

            focus_border: Style::default().fg(Color::Yellow),
            cursor: Style::default().add_modifier(Modifier::REVERSED),
            selected: Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        }
    }

    /// Light-background terminal theme.
    ///
    /// Uses dark colours for text so that content stays legible against a
    /// white or light-grey terminal canvas.
    pub fn light() -> Self {
        Self {
            header: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            header_accent: Style::default().fg(Color::Magenta),
            separator: Style::default().fg(Color::Gray),

            text: Style::default().fg(Color::Black),
            dim: Style::default().fg(Color::Gray),
            bold: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
            label: Style::default().fg(Color::DarkGray),
            value: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),

            info: Style::default().fg(Color::Blue),
            success: Style::default().fg(Color::Green),
            warning: Style::default().fg(Color::Yellow),
            error: Style::default().fg(Color::Red),

            kpi_border: Style::default().fg(Color::Blue),
            kpi_value: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),

            bar_endpoint: Style::default().fg(Color::Blue),
            bar_customer: Style::default().fg(Color::Magenta),
            bar_value: Style::default().fg(Color::White).bg(Color::Blue),
            line_month: Style::default().fg(Color::Green),
            axis: Style::default().fg(Color::DarkGray),

            table_header: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            table_border: Style::default().fg(Color::Gray),
            table_row: Style::default().fg(Color::Black),
            table_row_alt: Style::default().fg(Color::DarkGray),

            focus_border: Style::default().fg(Color::Magenta),
            cursor: Style::default().add_modifier(Modifier::REVERSED),
            selected: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
        }
    }

    /// Classic theme using only the basic 8-colour ANSI palette.
    ///
    /// No bold modifiers, for minimal terminal emulators.
    pub fn classic() -> Self {
        Self {
            header: Style::default().fg(Color::Cyan),
            header_accent: Style::default().fg(Color::White),
            separator: Style::default().fg(Color::DarkGray),

            text: Style::default().fg(Color::White),
            dim: Style::default().fg(Color::DarkGray),
            bold: Style::default().fg(Color::White),
            label: Style::default().fg(Color::Gray),
            value: Style::default().fg(Color::White),

            info: Style::default().fg(Color::Cyan),
            success: Style::default().fg(Color::Green),
            warning: Style::default().fg(Color::Yellow),
            error: Style::default().fg(Color::Red),

            kpi_border: Style::default().fg(Color::Blue),
            kpi_value: Style::default().fg(Color::White),

            bar_endpoint: Style::default().fg(Color::Cyan),
            bar_customer: Style::default().fg(Color::Magenta),
            bar_value: Style::default().fg(Color::Black).bg(Color::White),
            line_month: Style::default().fg(Color::Green),
            axis: Style::default().fg(Color::White),

            table_header: Style::default().fg(Color::Cyan),
            table_border: Style::default().fg(Color::DarkGray),
            table_row: Style::default().fg(Color::White),
            table_row_alt: Style::default().fg(Color::Gray),

            focus_border: Style::default().fg(Color::Yellow),
            cursor: Style::default().add_modifier(Modifier::REVERSED),
            selected: Style::default().fg(Color::Green),
        }
    }

    /// Choose a theme automatically based on the detected terminal background.
    pub fn auto_detect() -> Self {
        match detect_background() {
            BackgroundType::Light => Self::light(),
            _ => Self::dark(),
        }
    }

    /// Construct a theme by name.  Falls back to `auto_detect` for unknown
    /// names.
    pub fn from_name(name: &str) -> Self {
        match name {
            "light" => Self::light(),
            "dark" => Self::dark(),
            "classic" => Self::classic(),
            _ => Self::auto_detect(),
        }
    }

    // ── Style helpers ────────────────────────────────────────────────────────

    /// Border style of a panel depending on whether it has focus.
    pub fn border_style(&self, focused: bool) -> Style {
        if focused {
            self.focus_border
        } else {
            self.table_border
        }
    }

    /// Style of a filter option given its cursor and selection state.
    pub fn option_style(&self, under_cursor: bool, selected: bool) -> Style {
        let base = if selected { self.selected } else { self.text };
        if under_cursor {
            base.patch(self.cursor)
        } else {
            base
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
