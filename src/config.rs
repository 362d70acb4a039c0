// Run settings: read from `timelog.json` when present, defaults otherwise.
use crate::aggregate::PeriodColumn;
use crate::error::ReportResult;
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::Path;
use tracing::info;

pub const SETTINGS_FILE: &str = "timelog.json";
pub const LOCALE_ENV: &str = "TIMELOG_LOCALE";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub locale: String,
    pub entries_path: String,
    pub catalog_path: String,
    pub criterias: Vec<String>,
    pub columns: PeriodColumn,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// Scope the breadcrumb and activity list to this project.
    pub project: Option<u32>,
    pub issue: Option<u32>,
    /// Period filter preselected in the option list.
    pub period: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            locale: "en".to_string(),
            entries_path: "time_entries.csv".to_string(),
            catalog_path: "catalog.json".to_string(),
            criterias: vec!["project".to_string(), "activity".to_string()],
            columns: PeriodColumn::Month,
            from: None,
            to: None,
            project: None,
            issue: None,
            period: "all".to_string(),
        }
    }
}

impl Settings {
    /// Load `path` if it exists, then apply the `TIMELOG_LOCALE` override.
    pub fn load(path: impl AsRef<Path>) -> ReportResult<Settings> {
        let path = path.as_ref();
        let mut settings = if path.exists() {
            let text = std::fs::read_to_string(path)?;
            info!(path = %path.display(), "loaded settings");
            serde_json::from_str(&text)?
        } else {
            Settings::default()
        };
        if let Ok(code) = std::env::var(LOCALE_ENV) {
            if !code.trim().is_empty() {
                settings.locale = code;
            }
        }
        Ok(settings)
    }
}
