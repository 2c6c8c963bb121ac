mod bootstrap;
mod report;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use insights_core::models::DateRange;
use insights_core::settings::Settings;
use insights_data::export::DEFAULT_EXPORT_NAME;
use insights_runtime::session::SessionContext;
use insights_ui::app::App;

/// The only message shown when an upload cannot be used.
const INVALID_FILE_MESSAGE: &str = "Please upload a valid JSON file";

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let settings = Settings::load_with_last_used();
    let interactive = settings.export.is_none() && settings.view == "dashboard";

    bootstrap::ensure_directories()?;
    // The dashboard owns the terminal, so its events go to a file.
    let log_file = settings
        .log_file
        .clone()
        .or_else(|| interactive.then(bootstrap::default_log_file));
    bootstrap::setup_logging(&settings.log_level, log_file.as_ref())?;

    tracing::info!("Payout Insights v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!("View: {}, Theme: {}", settings.view, settings.theme);

    let mut session = match &settings.input {
        Some(path) => match SessionContext::load(path, &settings.input_limits()) {
            Ok(session) => Some(session),
            Err(e) if e.is_invalid_input() => {
                tracing::error!("Rejected {}: {}", path.display(), e);
                eprintln!("{}", INVALID_FILE_MESSAGE);
                return Ok(ExitCode::FAILURE);
            }
            Err(e) => {
                return Err(e).with_context(|| format!("could not load {}", path.display()));
            }
        },
        None => None,
    };

    if let Some(session) = session.as_mut() {
        apply_cli_filters(session, &settings)?;
    }

    if !interactive {
        let Some(session) = session.as_ref() else {
            bail!("an input file is required for --view report and --export");
        };

        if let Some(path) = &settings.export {
            let written = session
                .export_filtered(path)
                .with_context(|| format!("could not write {}", path.display()))?;
            println!("Wrote {} rows to {}", written, path.display());
        }

        if settings.view == "report" {
            let snapshot = session.snapshot();
            let mut stdout = std::io::stdout().lock();
            report::write_report(&mut stdout, &snapshot)?;
        }

        return Ok(ExitCode::SUCCESS);
    }

    tracing::info!("Starting dashboard...");
    let app = App::new(&settings.theme, session, PathBuf::from(DEFAULT_EXPORT_NAME));

    // The dashboard exits on 'q' / Ctrl+C inside the TUI; the OS-level
    // handler covers signals delivered outside raw mode.
    tokio::select! {
        result = app.run_dashboard() => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Ctrl+C received; shutting down");
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Apply `--endpoint`, `--customer`, `--from` and `--to` to a fresh session.
///
/// An omitted date bound falls back to the matching bound of the loaded data.
fn apply_cli_filters(session: &mut SessionContext, settings: &Settings) -> Result<()> {
    if !settings.endpoints.is_empty() {
        session.set_endpoints(settings.endpoints.iter().cloned());
    }
    if !settings.customers.is_empty() {
        session.set_customers(settings.customers.iter().cloned());
    }

    if settings.from.is_some() || settings.to.is_some() {
        let bounds = session.date_bounds();
        let from = settings.from.or(bounds.map(|(lo, _)| lo));
        let to = settings.to.or(bounds.map(|(_, hi)| hi));
        if let (Some(from), Some(to)) = (from, to) {
            session.set_date_range(Some(DateRange::new(from, to)?));
        }
    }
    Ok(())
}
