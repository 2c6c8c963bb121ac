//! Application state and TUI event loop for Payout Insights.
//!
//! [`App`] owns the theme, the [`SessionContext`] of the loaded export, the
//! keyboard focus and cursors, and the latest [`DashboardSnapshot`].  Every
//! key that changes a filter re-runs the pipeline once.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Frame, Terminal};
use tracing::{debug, warn};

use insights_runtime::session::{DashboardSnapshot, SessionContext};

use crate::dashboard_view::{self, DashboardView};
use crate::themes::Theme;

// ── Focus / StatusLine ────────────────────────────────────────────────────────

/// Which panel receives the arrow and space keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Endpoints,
    Customers,
    Table,
}

impl Focus {
    pub fn next(self) -> Self {
        match self {
            Focus::Endpoints => Focus::Customers,
            Focus::Customers => Focus::Table,
            Focus::Table => Focus::Endpoints,
        }
    }
}

/// One-line message shown in the footer until the next key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusLine {
    Info(String),
    Error(String),
}

// ── App ───────────────────────────────────────────────────────────────────────

/// Root application state for the dashboard.
pub struct App {
    pub theme: Theme,
    /// `None` until an export is loaded; renders the welcome screen.
    session: Option<SessionContext>,
    snapshot: Option<DashboardSnapshot>,
    pub focus: Focus,
    pub endpoint_cursor: usize,
    pub customer_cursor: usize,
    pub table_offset: usize,
    /// Where `x` writes the filtered CSV.
    export_path: PathBuf,
    pub status: Option<StatusLine>,
    /// Set to `true` to break out of the event loop on the next iteration.
    pub should_quit: bool,
}

impl App {
    pub fn new(theme_name: &str, session: Option<SessionContext>, export_path: PathBuf) -> Self {
        let snapshot = session.as_ref().map(SessionContext::snapshot);
        Self {
            theme: Theme::from_name(theme_name),
            session,
            snapshot,
            focus: Focus::Endpoints,
            endpoint_cursor: 0,
            customer_cursor: 0,
            table_offset: 0,
            export_path,
            status: None,
            should_quit: false,
        }
    }

    // ── Event loop ────────────────────────────────────────────────────────────

    /// Run the interactive dashboard until `q`, `Q`, or `Ctrl+C`.
    ///
    /// Uses `crossterm::event::poll` with a 250 ms timeout so the loop stays
    /// on the current thread and the caller can race it against a signal.
    pub async fn run_dashboard(mut self) -> io::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let tick_rate = Duration::from_millis(250);

        let result = loop {
            if let Err(e) = terminal.draw(|frame| self.render(frame)) {
                break Err(e);
            }

            match event::poll(tick_rate) {
                Ok(true) => match event::read() {
                    Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                        self.handle_key(key)
                    }
                    Ok(_) => {}
                    Err(e) => break Err(e),
                },
                Ok(false) => {}
                Err(e) => break Err(e),
            }

            if self.should_quit {
                break Ok(());
            }
        };

        // Restore terminal state unconditionally.
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    // ── Key handling ──────────────────────────────────────────────────────────

    /// Apply one key press to the application state.
    pub fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
                return;
            }
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.should_quit = true;
                return;
            }
            _ => {}
        }

        if self.session.is_none() {
            return;
        }
        self.status = None;

        let changed = match key.code {
            KeyCode::Tab => {
                self.focus = self.focus.next();
                false
            }
            KeyCode::Up => {
                self.move_cursor(-1);
                false
            }
            KeyCode::Down => {
                self.move_cursor(1);
                false
            }
            KeyCode::Char(' ') => self.toggle_under_cursor(),
            KeyCode::Char('[') => self.update_session(|s| s.shift_start(-1)),
            KeyCode::Char(']') => self.update_session(|s| s.shift_start(1)),
            KeyCode::Char('{') => self.update_session(|s| s.shift_end(-1)),
            KeyCode::Char('}') => self.update_session(|s| s.shift_end(1)),
            KeyCode::Char('c') => self.update_session(SessionContext::clear_filters),
            KeyCode::Char('x') => {
                self.export();
                false
            }
            _ => false,
        };

        if changed {
            self.refresh();
        }
    }

    // ── Private helpers ───────────────────────────────────────────────────────

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        let (Some(session), Some(snapshot)) = (self.session.as_ref(), self.snapshot.as_ref())
        else {
            dashboard_view::render_welcome(frame, area, &self.theme);
            return;
        };

        let source = session
            .source()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str());

        let view = DashboardView {
            snapshot,
            selection: session.selection(),
            source,
            focus: self.focus,
            endpoint_cursor: self.endpoint_cursor,
            customer_cursor: self.customer_cursor,
            table_offset: self.table_offset,
            status: self.status.as_ref(),
        };
        dashboard_view::render_dashboard(frame, area, &view, &self.theme);
    }

    /// Apply `f` to the session.  Returns whether there was one.
    fn update_session(&mut self, f: impl FnOnce(&mut SessionContext)) -> bool {
        match self.session.as_mut() {
            Some(session) => {
                f(session);
                true
            }
            None => false,
        }
    }

    /// Re-run the pipeline and keep the table scroll position in range.
    fn refresh(&mut self) {
        self.snapshot = self.session.as_ref().map(SessionContext::snapshot);
        let rows = self.snapshot.as_ref().map_or(0, |s| s.filtered.len());
        self.table_offset = self.table_offset.min(rows.saturating_sub(1));
    }

    fn move_cursor(&mut self, delta: isize) {
        let Some(snapshot) = self.snapshot.as_ref() else {
            return;
        };
        let (cursor, len) = match self.focus {
            Focus::Endpoints => (&mut self.endpoint_cursor, snapshot.endpoint_options.len()),
            Focus::Customers => (&mut self.customer_cursor, snapshot.customer_options.len()),
            Focus::Table => (&mut self.table_offset, snapshot.filtered.len()),
        };
        if len == 0 {
            *cursor = 0;
            return;
        }
        *cursor = cursor.saturating_add_signed(delta).min(len - 1);
    }

    /// Toggle the option under the cursor.  Returns whether a filter changed.
    fn toggle_under_cursor(&mut self) -> bool {
        let (Some(session), Some(snapshot)) = (self.session.as_mut(), self.snapshot.as_ref())
        else {
            return false;
        };
        match self.focus {
            Focus::Endpoints => match snapshot.endpoint_options.get(self.endpoint_cursor) {
                Some(name) => {
                    session.toggle_endpoint(name);
                    true
                }
                None => false,
            },
            Focus::Customers => match snapshot.customer_options.get(self.customer_cursor) {
                Some(name) => {
                    session.toggle_customer(name);
                    true
                }
                None => false,
            },
            Focus::Table => false,
        }
    }

    fn export(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        self.status = Some(match session.export_filtered(&self.export_path) {
            Ok(rows) => {
                debug!("Exported {} rows to {}", rows, self.export_path.display());
                StatusLine::Info(format!(
                    "Exported {} rows to {}",
                    rows,
                    self.export_path.display()
                ))
            }
            Err(e) => {
                warn!("Export to {} failed: {}", self.export_path.display(), e);
                StatusLine::Error(e.to_string())
            }
        });
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
