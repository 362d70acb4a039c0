use crate::util::coerce_hours;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One line of `time_entries.csv` before validation. Custom field columns
/// (`cf_<id>`) are picked up separately by the loader.
#[derive(Debug, Deserialize)]
pub struct RawEntry {
    #[serde(rename = "spent_on")]
    pub spent_on: Option<String>,
    #[serde(rename = "user_id")]
    pub user_id: Option<String>,
    #[serde(rename = "activity_id")]
    pub activity_id: Option<String>,
    #[serde(rename = "project_id")]
    pub project_id: Option<String>,
    #[serde(rename = "issue_id")]
    pub issue_id: Option<String>,
    #[serde(rename = "hours")]
    pub hours: Option<String>,
    #[serde(rename = "comments")]
    pub comments: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TimeEntry {
    pub spent_on: NaiveDate,
    pub user_id: u32,
    pub activity_id: u32,
    pub project_id: u32,
    pub issue_id: Option<u32>,
    pub hours: f64,
    pub comments: String,
    pub custom_values: HashMap<u32, String>,
}

impl TimeEntry {
    pub fn custom_value_for(&self, field: &CustomField) -> Option<&str> {
        self.custom_values.get(&field.id).map(String::as_str)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Project {
    pub id: u32,
    pub name: String,
    pub identifier: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct User {
    pub id: u32,
    pub firstname: String,
    pub lastname: String,
}

impl User {
    pub fn name(&self) -> String {
        format!("{} {}", self.firstname, self.lastname).trim().to_string()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Tracker {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Issue {
    pub id: u32,
    pub tracker_id: u32,
    pub project_id: u32,
    pub subject: String,
    /// Whether the current viewer may see this issue.
    #[serde(default = "default_true")]
    pub visible: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TimeEntryActivity {
    pub id: u32,
    pub name: String,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub position: u32,
    /// `None` for shared activities.
    #[serde(default)]
    pub project_id: Option<u32>,
    /// Shared activity overridden by this project-specific one.
    #[serde(default)]
    pub parent_id: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FieldFormat {
    #[default]
    String,
    Int,
    Float,
    Date,
    Bool,
    List,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CustomField {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub field_format: FieldFormat,
}

fn default_true() -> bool {
    true
}

/// Reference data the exporter resolves ids against.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Catalog {
    pub projects: Vec<Project>,
    pub users: Vec<User>,
    pub trackers: Vec<Tracker>,
    pub issues: Vec<Issue>,
    pub activities: Vec<TimeEntryActivity>,
    pub custom_fields: Vec<CustomField>,
}

impl Catalog {
    pub fn find_project(&self, id: u32) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn find_user(&self, id: u32) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn find_tracker(&self, id: u32) -> Option<&Tracker> {
        self.trackers.iter().find(|t| t.id == id)
    }

    pub fn find_issue(&self, id: u32) -> Option<&Issue> {
        self.issues.iter().find(|i| i.id == id)
    }

    pub fn find_activity(&self, id: u32) -> Option<&TimeEntryActivity> {
        self.activities.iter().find(|a| a.id == id)
    }

    /// Active shared activities, ordered by position.
    pub fn shared_activities(&self) -> Vec<&TimeEntryActivity> {
        let mut v: Vec<&TimeEntryActivity> = self
            .activities
            .iter()
            .filter(|a| a.project_id.is_none() && a.active)
            .collect();
        v.sort_by_key(|a| a.position);
        v
    }

    /// Activities available to a project: the shared ones, with any
    /// project-specific override taking the place of its parent.
    /// Inactive overrides hide their parent.
    pub fn project_activities(&self, project_id: u32) -> Vec<&TimeEntryActivity> {
        let overrides: Vec<&TimeEntryActivity> = self
            .activities
            .iter()
            .filter(|a| a.project_id == Some(project_id))
            .collect();
        let mut v: Vec<&TimeEntryActivity> = self
            .activities
            .iter()
            .filter(|a| a.project_id.is_none())
            .filter(|a| !overrides.iter().any(|o| o.parent_id == Some(a.id)))
            .chain(overrides.iter().copied())
            .filter(|a| a.active)
            .collect();
        v.sort_by_key(|a| a.position);
        v
    }
}

/// One aggregated bucket: grouping field name -> value, plus `hours`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: HashMap<String, String>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: &str, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: &str, value: impl Into<String>) {
        self.fields.insert(field.to_string(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// The `hours` field as a number; missing or non-numeric counts as zero.
    pub fn hours(&self) -> f64 {
        coerce_hours(self.get("hours"))
    }
}

#[derive(Debug, Serialize)]
pub struct SummaryStats {
    pub total_entries: usize,
    pub total_hours: f64,
    pub total_users: usize,
    pub total_projects: usize,
    pub report_groups: usize,
    pub periods: usize,
}
