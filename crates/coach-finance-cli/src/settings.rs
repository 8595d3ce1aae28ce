use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs;

use coach_finance_core::lending::commercial::DEFAULT_DSCR_THRESHOLD;
use coach_finance_core::preferences::{DisplayPreferences, ScheduleView};
use coach_finance_core::Currency;

use crate::input::file::resolve_path;

/// Environment variable naming the settings file when `--config` is absent.
pub const CONFIG_ENV: &str = "CFC_CONFIG";

/// Optional user settings, read from a YAML file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Display symbol only; amounts are never converted
    #[serde(default)]
    pub currency: Currency,
    #[serde(default)]
    pub schedule_view: ScheduleView,
    #[serde(default = "default_dscr_threshold")]
    pub dscr_threshold: Decimal,
    /// Fallback tracing filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_dscr_threshold() -> Decimal {
    DEFAULT_DSCR_THRESHOLD
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            currency: Currency::default(),
            schedule_view: ScheduleView::default(),
            dscr_threshold: default_dscr_threshold(),
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Load from `path`, else from `$CFC_CONFIG`, else defaults.
    pub fn load(path: Option<&str>) -> Result<Self, Box<dyn std::error::Error>> {
        let from_env = std::env::var(CONFIG_ENV).ok();
        match path.or(from_env.as_deref()) {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }

    fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let canonical = resolve_path(path)?;
        let contents = fs::read_to_string(&canonical)
            .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
        Self::parse(&contents)
            .map_err(|e| format!("Invalid settings in '{}': {}", canonical.display(), e).into())
    }

    pub fn parse(contents: &str) -> Result<Self, Box<dyn std::error::Error>> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        let settings: Settings = serde_yaml::from_str(contents)?;
        if settings.dscr_threshold <= Decimal::ZERO {
            return Err("dscr_threshold must be positive".into());
        }
        Ok(settings)
    }

    pub fn display_preferences(&self) -> DisplayPreferences {
        DisplayPreferences {
            currency: self.currency.clone(),
            schedule_view: self.schedule_view,
        }
    }
}
