// Turns raw time entries into aggregated records (one per distinct
// criteria values + period) and the list of period columns.
use crate::criteria::CriteriaDef;
use crate::types::{Catalog, Record, TimeEntry};
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

pub const MAX_CRITERIAS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PeriodColumn {
    Year,
    #[default]
    Month,
    Week,
    Day,
}

impl PeriodColumn {
    /// Field name the period label is stored under in each record.
    pub fn key(&self) -> &'static str {
        match self {
            PeriodColumn::Year => "year",
            PeriodColumn::Month => "month",
            PeriodColumn::Week => "week",
            PeriodColumn::Day => "day",
        }
    }

    pub fn label_for(&self, date: NaiveDate) -> String {
        match self {
            PeriodColumn::Year => date.year().to_string(),
            PeriodColumn::Month => format!("{}-{:02}", date.year(), date.month()),
            PeriodColumn::Week => {
                let w = date.iso_week();
                format!("{}-W{:02}", w.year(), w.week())
            }
            PeriodColumn::Day => date.format("%Y-%m-%d").to_string(),
        }
    }

    /// Every period label between `from` and `to`, inclusive, in order.
    pub fn periods(&self, from: NaiveDate, to: NaiveDate) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        let mut d = from;
        while d <= to {
            let label = self.label_for(d);
            if out.last() != Some(&label) {
                out.push(label);
            }
            d += Duration::days(1);
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportQuery {
    pub criterias: Vec<String>,
    pub columns: PeriodColumn,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl ReportQuery {
    /// Keeps only known criteria, without duplicates, at most three.
    pub fn new(
        requested: &[String],
        available: &[CriteriaDef],
        columns: PeriodColumn,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Self {
        let mut criterias: Vec<String> = Vec::new();
        for c in requested {
            let c = c.trim();
            if available.iter().any(|a| a.key == c) && !criterias.iter().any(|k| k == c) {
                criterias.push(c.to_string());
            }
        }
        criterias.truncate(MAX_CRITERIAS);
        ReportQuery { criterias, columns, from, to }
    }
}

#[derive(Debug, Clone)]
pub struct HoursReport {
    pub criterias: Vec<String>,
    pub columns: PeriodColumn,
    pub periods: Vec<String>,
    pub records: Vec<Record>,
}

fn criteria_value(entry: &TimeEntry, criteria: &str, catalog: &Catalog) -> String {
    match criteria {
        "project" => entry.project_id.to_string(),
        "member" => entry.user_id.to_string(),
        "activity" => entry.activity_id.to_string(),
        "issue" => entry.issue_id.map(|i| i.to_string()).unwrap_or_default(),
        "tracker" => entry
            .issue_id
            .and_then(|i| catalog.find_issue(i))
            .map(|i| i.tracker_id.to_string())
            .unwrap_or_default(),
        other => other
            .strip_prefix("cf_")
            .and_then(|id| id.parse::<u32>().ok())
            .and_then(|id| entry.custom_values.get(&id).cloned())
            .unwrap_or_default(),
    }
}

/// Sum hours per distinct (criteria values, period), in first-seen order.
pub fn aggregate(entries: &[TimeEntry], catalog: &Catalog, query: &ReportQuery) -> HoursReport {
    let in_range = |e: &&TimeEntry| {
        query.from.map_or(true, |f| e.spent_on >= f) && query.to.map_or(true, |t| e.spent_on <= t)
    };
    let selected: Vec<&TimeEntry> = entries.iter().filter(in_range).collect();

    let mut index: HashMap<Vec<String>, usize> = HashMap::new();
    let mut buckets: Vec<(Vec<String>, f64)> = Vec::new();
    for e in &selected {
        let mut key: Vec<String> = query
            .criterias
            .iter()
            .map(|c| criteria_value(e, c, catalog))
            .collect();
        key.push(query.columns.label_for(e.spent_on));
        match index.get(&key) {
            Some(&i) => buckets[i].1 += e.hours,
            None => {
                index.insert(key.clone(), buckets.len());
                buckets.push((key, e.hours));
            }
        }
    }

    let records: Vec<Record> = buckets
        .into_iter()
        .map(|(key, hours)| {
            let mut r = Record::new();
            for (c, v) in query.criterias.iter().zip(key.iter()) {
                r.set(c, v.clone());
            }
            if let Some(period) = key.last() {
                r.set(query.columns.key(), period.clone());
            }
            r.set("hours", hours.to_string());
            r
        })
        .collect();

    let from = query.from.or_else(|| selected.iter().map(|e| e.spent_on).min());
    let to = query.to.or_else(|| selected.iter().map(|e| e.spent_on).max());
    let periods = match (from, to) {
        (Some(f), Some(t)) => query.columns.periods(f, t),
        _ => Vec::new(),
    };
    debug!(
        entries = selected.len(),
        records = records.len(),
        periods = periods.len(),
        "aggregated hours"
    );

    HoursReport {
        criterias: query.criterias.clone(),
        columns: query.columns,
        periods,
        records,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::available_criterias;
    use crate::types::Issue;

    fn entry(date: &str, user: u32, activity: u32, issue: Option<u32>, hours: f64) -> TimeEntry {
        TimeEntry {
            spent_on: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            user_id: user,
            activity_id: activity,
            project_id: 1,
            issue_id: issue,
            hours,
            comments: String::new(),
            custom_values: HashMap::new(),
        }
    }

    fn query(criterias: &[&str], columns: PeriodColumn) -> ReportQuery {
        let requested: Vec<String> = criterias.iter().map(|s| s.to_string()).collect();
        ReportQuery::new(&requested, &available_criterias(&[]), columns, None, None)
    }

    #[test]
    fn query_drops_unknown_and_duplicate_criteria() {
        let q = query(&["activity", "bogus", "activity", "project", "member", "issue"], PeriodColumn::Month);
        assert_eq!(q.criterias, vec!["activity", "project", "member"]);
    }

    #[test]
    fn period_labels_cover_range() {
        let from = NaiveDate::from_ymd_opt(2023, 12, 30).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        assert_eq!(PeriodColumn::Month.periods(from, to), vec!["2023-12", "2024-01", "2024-02"]);
        assert_eq!(PeriodColumn::Year.periods(from, to), vec!["2023", "2024"]);
        assert_eq!(PeriodColumn::Week.label_for(from), "2023-W52");
        assert_eq!(PeriodColumn::Day.periods(to, to), vec!["2024-02-01"]);
    }

    #[test]
    fn buckets_by_criteria_and_period() {
        let entries = vec![
            entry("2024-01-03", 1, 9, None, 2.0),
            entry("2024-01-20", 1, 9, None, 0.5),
            entry("2024-02-01", 1, 9, None, 1.0),
            entry("2024-01-04", 2, 9, None, 4.0),
        ];
        let r = aggregate(&entries, &Catalog::default(), &query(&["member"], PeriodColumn::Month));
        assert_eq!(r.periods, vec!["2024-01", "2024-02"]);
        assert_eq!(r.records.len(), 3);
        assert_eq!(r.records[0].get("member"), Some("1"));
        assert_eq!(r.records[0].get("month"), Some("2024-01"));
        assert_eq!(r.records[0].hours(), 2.5);
        assert_eq!(r.records[2].get("member"), Some("2"));
    }

    #[test]
    fn tracker_comes_from_issue_and_is_blank_without_one() {
        let catalog = Catalog {
            issues: vec![Issue { id: 5, tracker_id: 3, project_id: 1, subject: "x".into(), visible: true }],
            ..Default::default()
        };
        let entries = vec![entry("2024-01-03", 1, 9, Some(5), 1.0), entry("2024-01-03", 1, 9, None, 1.0)];
        let r = aggregate(&entries, &catalog, &query(&["tracker"], PeriodColumn::Year));
        assert_eq!(r.records[0].get("tracker"), Some("3"));
        assert_eq!(r.records[1].get("tracker"), Some(""));
    }

    #[test]
    fn explicit_range_filters_entries() {
        let entries = vec![entry("2024-01-03", 1, 9, None, 2.0), entry("2024-03-03", 1, 9, None, 1.0)];
        let mut q = query(&["member"], PeriodColumn::Month);
        q.from = NaiveDate::from_ymd_opt(2024, 2, 1);
        q.to = NaiveDate::from_ymd_opt(2024, 3, 31);
        let r = aggregate(&entries, &Catalog::default(), &q);
        assert_eq!(r.periods, vec!["2024-02", "2024-03"]);
        assert_eq!(r.records.len(), 1);
        assert_eq!(r.records[0].hours(), 1.0);
    }
}
