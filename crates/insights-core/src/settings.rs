use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use chrono::NaiveDate;

use crate::models::InputLimits;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Payout analytics dashboard for billing exports
#[derive(Parser, Debug, Clone)]
#[command(
    name = "payout-insights",
    about = "Payout analytics dashboard for billing exports",
    version
)]
pub struct Settings {
    /// JSON export of payout records
    pub input: Option<PathBuf>,

    /// First day of the date filter (YYYY-MM-DD, inclusive)
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Last day of the date filter (YYYY-MM-DD, inclusive)
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// Restrict to an API endpoint (repeatable; none means all)
    #[arg(long = "endpoint")]
    pub endpoints: Vec<String>,

    /// Restrict to a customer (repeatable; none means all)
    #[arg(long = "customer")]
    pub customers: Vec<String>,

    /// View mode
    #[arg(long, default_value = "dashboard", value_parser = ["dashboard", "report"])]
    pub view: String,

    /// Write the filtered rows as CSV to this path and exit
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Display theme
    #[arg(long, default_value = "auto", value_parser = ["light", "dark", "classic", "auto"])]
    pub theme: String,

    /// Maximum accepted upload size in bytes
    #[arg(long, default_value_t = InputLimits::DEFAULT_MAX_BYTES)]
    pub max_bytes: u64,

    /// Maximum accepted number of records
    #[arg(long, default_value_t = InputLimits::DEFAULT_MAX_ROWS)]
    pub max_rows: u64,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Display preferences saved to `~/.payout-insights/last_used.json`.
///
/// Only presentation settings are kept here; uploaded data and filter
/// selections never outlive the session.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_rows: Option<u64>,
}

impl LastUsedParams {
    /// Return the default path to the persisted config file.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Return the config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &std::path::Path) -> PathBuf {
        base_dir.join(".payout-insights").join("last_used.json")
    }

    /// Load persisted params from an explicit path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load_from(path: &std::path::Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write params to an explicit path, creating parent
    /// directories if needed.
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file at an explicit path if it exists.
    pub fn clear_at(path: &std::path::Path) -> Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments and merge with last-used params where no explicit
    /// CLI value was provided, then persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Full implementation; accepts args and an explicit config path so that
    /// tests can redirect to a temporary directory.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &std::path::Path,
    ) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            let _ = LastUsedParams::clear_at(config_path);
            return Self::resolve_flags(settings);
        }

        let last = LastUsedParams::load_from(config_path);

        // CLI always wins.
        if !is_arg_explicitly_set(&matches, "theme") {
            if let Some(v) = last.theme {
                settings.theme = v;
            }
        }
        // NOTE: clap stores the arg id using the *field name* (underscores).
        if !is_arg_explicitly_set(&matches, "max_bytes") {
            if let Some(v) = last.max_bytes {
                settings.max_bytes = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "max_rows") {
            if let Some(v) = last.max_rows {
                settings.max_rows = v;
            }
        }

        settings = Self::resolve_flags(settings);

        let params = LastUsedParams::from(&settings);
        if let Err(e) = params.save_to(config_path) {
            tracing::debug!("could not persist last-used params: {}", e);
        }

        settings
    }

    /// Upload limits configured for this run.
    pub fn input_limits(&self) -> InputLimits {
        InputLimits {
            max_bytes: self.max_bytes,
            max_rows: self.max_rows,
        }
    }

    /// Apply the `--debug` flag.
    fn resolve_flags(mut settings: Settings) -> Settings {
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            theme: Some(s.theme.clone()),
            max_bytes: Some(s.max_bytes),
            max_rows: Some(s.max_rows),
        }
    }
}

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn tmp_config_path(tmp: &TempDir) -> PathBuf {
        LastUsedParams::config_path_in(tmp.path())
    }

    #[test]
    fn test_last_used_params_save_load() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        let params = LastUsedParams {
            theme: Some("dark".to_string()),
            max_bytes: Some(1024),
            max_rows: Some(10),
        };
        params.save_to(&path).expect("save");

        let loaded = LastUsedParams::load_from(&path);
        assert_eq!(loaded.theme, Some("dark".to_string()));
        assert_eq!(loaded.max_bytes, Some(1024));
        assert_eq!(loaded.max_rows, Some(10));
    }

    #[test]
    fn test_last_used_params_default_when_missing() {
        let tmp = TempDir::new().expect("tempdir");
        let loaded = LastUsedParams::load_from(&tmp_config_path(&tmp));
        assert!(loaded.theme.is_none());
        assert!(loaded.max_rows.is_none());
    }

    #[test]
    fn test_last_used_params_clear() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        LastUsedParams {
            theme: Some("light".to_string()),
            ..Default::default()
        }
        .save_to(&path)
        .expect("save");
        assert!(path.exists());

        LastUsedParams::clear_at(&path).expect("clear");
        assert!(!path.exists());
    }

    #[test]
    fn test_settings_default_values() {
        let settings = Settings::parse_from(["payout-insights"]);

        assert!(settings.input.is_none());
        assert!(settings.from.is_none());
        assert!(settings.to.is_none());
        assert!(settings.endpoints.is_empty());
        assert!(settings.customers.is_empty());
        assert_eq!(settings.view, "dashboard");
        assert!(settings.export.is_none());
        assert_eq!(settings.theme, "auto");
        assert_eq!(settings.max_bytes, InputLimits::DEFAULT_MAX_BYTES);
        assert_eq!(settings.max_rows, InputLimits::DEFAULT_MAX_ROWS);
        assert_eq!(settings.log_level, "INFO");
        assert!(!settings.debug);
        assert!(!settings.clear);
    }

    #[test]
    fn test_settings_cli_filters() {
        let settings = Settings::parse_from([
            "payout-insights",
            "export.json",
            "--from",
            "2021-01-01",
            "--to",
            "2021-12-31",
            "--endpoint",
            "foo",
            "--endpoint",
            "bar",
            "--customer",
            "acme",
        ]);
        assert_eq!(settings.input, Some(PathBuf::from("export.json")));
        assert_eq!(settings.from, NaiveDate::from_ymd_opt(2021, 1, 1));
        assert_eq!(settings.to, NaiveDate::from_ymd_opt(2021, 12, 31));
        assert_eq!(settings.endpoints, vec!["foo", "bar"]);
        assert_eq!(settings.customers, vec!["acme"]);
    }

    #[test]
    fn test_settings_input_limits() {
        let settings =
            Settings::parse_from(["payout-insights", "--max-bytes", "2048", "--max-rows", "5"]);
        assert_eq!(
            settings.input_limits(),
            InputLimits {
                max_bytes: 2048,
                max_rows: 5
            }
        );
    }

    #[test]
    fn test_settings_rejects_bad_date() {
        let result = Settings::try_parse_from(["payout-insights", "--from", "15/03/2021"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_with_last_used_merges_persisted_theme() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        LastUsedParams {
            theme: Some("dark".to_string()),
            max_rows: Some(42),
            ..Default::default()
        }
        .save_to(&config_path)
        .expect("save");

        let settings =
            Settings::load_with_last_used_impl(vec!["payout-insights".into()], &config_path);
        assert_eq!(settings.theme, "dark");
        assert_eq!(settings.max_rows, 42);
    }

    #[test]
    fn test_load_with_last_used_cli_overrides_persisted() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        LastUsedParams {
            theme: Some("dark".to_string()),
            ..Default::default()
        }
        .save_to(&config_path)
        .expect("save");

        let settings = Settings::load_with_last_used_impl(
            vec!["payout-insights".into(), "--theme".into(), "light".into()],
            &config_path,
        );
        assert_eq!(settings.theme, "light");
    }

    #[test]
    fn test_load_with_last_used_clear_removes_file() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        LastUsedParams {
            theme: Some("classic".to_string()),
            ..Default::default()
        }
        .save_to(&config_path)
        .expect("save");

        Settings::load_with_last_used_impl(
            vec!["payout-insights".into(), "--clear".into()],
            &config_path,
        );
        assert!(!config_path.exists(), "file must be gone after --clear");
    }

    #[test]
    fn test_load_with_last_used_debug_overrides_log_level() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);

        let settings = Settings::load_with_last_used_impl(
            vec!["payout-insights".into(), "--debug".into()],
            &config_path,
        );
        assert_eq!(settings.log_level, "DEBUG");
    }

    #[test]
    fn test_load_with_last_used_persists_preferences_only() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);

        Settings::load_with_last_used_impl(
            vec![
                "payout-insights".into(),
                "--theme".into(),
                "classic".into(),
                "--customer".into(),
                "acme".into(),
            ],
            &config_path,
        );

        let raw = std::fs::read_to_string(&config_path).expect("persisted");
        assert!(raw.contains("classic"));
        assert!(!raw.contains("acme"), "filters must not be persisted");
    }

    #[test]
    fn test_report_view_is_not_carried_into_later_runs() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);

        Settings::load_with_last_used_impl(
            vec![
                "payout-insights".into(),
                "data.json".into(),
                "--view".into(),
                "report".into(),
            ],
            &config_path,
        );

        let settings =
            Settings::load_with_last_used_impl(vec!["payout-insights".into()], &config_path);
        assert_eq!(settings.view, "dashboard");
        assert!(settings.input.is_none());
        assert!(settings.export.is_none());
    }

    #[test]
    fn test_legacy_saved_view_is_ignored() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        std::fs::create_dir_all(config_path.parent().expect("parent")).expect("mkdir");
        std::fs::write(&config_path, r#"{"theme":"light","view":"report"}"#).expect("write");

        let settings =
            Settings::load_with_last_used_impl(vec!["payout-insights".into()], &config_path);
        assert_eq!(settings.view, "dashboard");
        assert_eq!(settings.theme, "light");
    }
}
