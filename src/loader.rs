use crate::error::ReportResult;
use crate::types::{Catalog, RawEntry, TimeEntry};
use crate::util::{parse_date_safe, parse_hours, parse_u32_safe};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub parse_errors: usize,
}

fn clean_entry(row: RawEntry, custom_values: HashMap<u32, String>) -> Option<TimeEntry> {
    let spent_on = parse_date_safe(row.spent_on.as_deref())?;
    let user_id = parse_u32_safe(row.user_id.as_deref())?;
    let activity_id = parse_u32_safe(row.activity_id.as_deref())?;
    let project_id = parse_u32_safe(row.project_id.as_deref())?;
    let hours = match parse_hours(row.hours.as_deref()) {
        Some(h) if h >= 0.0 => h,
        _ => return None,
    };
    Some(TimeEntry {
        spent_on,
        user_id,
        activity_id,
        project_id,
        issue_id: parse_u32_safe(row.issue_id.as_deref()),
        hours,
        comments: row.comments.unwrap_or_default().trim().to_string(),
        custom_values,
    })
}

/// Read time entries; rows missing a date, user, activity, project or a
/// valid hours value are skipped and counted.
pub fn load_entries(path: impl AsRef<Path>) -> ReportResult<(Vec<TimeEntry>, LoadReport)> {
    let path = path.as_ref();
    let mut rdr = ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers = rdr.headers()?.clone();
    let custom_columns: Vec<(usize, u32)> = headers
        .iter()
        .enumerate()
        .filter_map(|(i, h)| {
            let id = h.trim().strip_prefix("cf_")?.parse::<u32>().ok()?;
            Some((i, id))
        })
        .collect();

    let mut total_rows = 0usize;
    let mut parse_errors = 0usize;
    let mut entries: Vec<TimeEntry> = Vec::new();

    for result in rdr.records() {
        total_rows += 1;
        let record = match result {
            Ok(r) => r,
            Err(_) => {
                parse_errors += 1;
                continue;
            }
        };
        let row: RawEntry = match record.deserialize(Some(&headers)) {
            Ok(r) => r,
            Err(_) => {
                parse_errors += 1;
                continue;
            }
        };
        let custom_values: HashMap<u32, String> = custom_columns
            .iter()
            .filter_map(|(i, id)| {
                let v = record.get(*i)?.trim();
                (!v.is_empty()).then(|| (*id, v.to_string()))
            })
            .collect();
        match clean_entry(row, custom_values) {
            Some(e) => entries.push(e),
            None => {
                debug!(row = total_rows, "skipping invalid time entry");
                parse_errors += 1;
            }
        }
    }

    let report = LoadReport { total_rows, loaded_rows: entries.len(), parse_errors };
    info!(path = %path.display(), loaded = report.loaded_rows, skipped = report.parse_errors, "loaded time entries");
    Ok((entries, report))
}

pub fn load_catalog(path: impl AsRef<Path>) -> ReportResult<Catalog> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let catalog: Catalog = serde_json::from_str(&text)?;
    info!(
        path = %path.display(),
        projects = catalog.projects.len(),
        issues = catalog.issues.len(),
        activities = catalog.activities.len(),
        "loaded catalog"
    );
    Ok(catalog)
}
