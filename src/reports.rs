use crate::criteria::{show_value, ReportContext};
use crate::error::{ReportError, ReportResult};
use crate::output::encode_csv;
use crate::types::{Record, SummaryStats, TimeEntry};
use crate::util::{format_hours, format_hours_or_blank, hours_to_s};
use std::collections::HashSet;
use tracing::info;

fn field_value<'r>(record: &'r Record, field: &str) -> &'r str {
    record.get(field).unwrap_or("")
}

/// Records whose `criteria` field equals `value`. A blank `value` matches
/// records where the field is blank or missing.
pub fn select_hours<'a, I>(data: I, criteria: &str, value: &str) -> Vec<&'a Record>
where
    I: IntoIterator<Item = &'a Record>,
{
    if value.is_empty() {
        data.into_iter()
            .filter(|r| field_value(r, criteria).trim().is_empty())
            .collect()
    } else {
        data.into_iter()
            .filter(|r| field_value(r, criteria) == value)
            .collect()
    }
}

pub fn sum_hours<'a, I>(data: I) -> f64
where
    I: IntoIterator<Item = &'a Record>,
{
    data.into_iter().map(Record::hours).sum()
}

/// One group at some depth of the report.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupNode {
    pub criteria: String,
    /// Raw grouping value; empty for the "none" group.
    pub value: String,
    pub level: usize,
    pub period_hours: Vec<f64>,
    pub total: f64,
    pub children: Vec<GroupNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportTree {
    pub criterias: Vec<String>,
    pub periods: Vec<String>,
    pub groups: Vec<GroupNode>,
    pub period_totals: Vec<f64>,
    pub total: f64,
}

fn period_sums(records: &[&Record], column: &str, periods: &[String]) -> (Vec<f64>, f64) {
    let sums: Vec<f64> = periods
        .iter()
        .map(|p| sum_hours(select_hours(records.iter().copied(), column, p)))
        .collect();
    let total: f64 = sums.iter().sum();
    (sums, total)
}

fn build_groups(
    records: &[&Record],
    criterias: &[String],
    level: usize,
    column: &str,
    periods: &[String],
) -> Vec<GroupNode> {
    let criteria = &criterias[level];
    let mut seen: HashSet<&str> = HashSet::new();
    let mut values: Vec<&str> = Vec::new();
    for r in records {
        // Whitespace-only values belong to the blank group.
        let v = field_value(r, criteria);
        let v = if v.trim().is_empty() { "" } else { v };
        if seen.insert(v) {
            values.push(v);
        }
    }

    let mut groups = Vec::new();
    for value in values {
        let matching = select_hours(records.iter().copied(), criteria, value);
        if matching.is_empty() {
            continue;
        }
        let (period_hours, total) = period_sums(&matching, column, periods);
        let children = if criterias.len() > level + 1 {
            build_groups(&matching, criterias, level + 1, column, periods)
        } else {
            Vec::new()
        };
        groups.push(GroupNode {
            criteria: criteria.clone(),
            value: value.to_string(),
            level,
            period_hours,
            total,
            children,
        });
    }
    groups
}

/// Partition `records` by each criteria in turn, first-seen order at every
/// level, summing hours per period. `column` is the record field holding
/// the period label.
pub fn build_report_tree(
    records: &[Record],
    criterias: &[String],
    column: &str,
    periods: &[String],
) -> ReportResult<ReportTree> {
    if criterias.is_empty() {
        return Err(ReportError::NoCriteria);
    }
    let all: Vec<&Record> = records.iter().collect();
    let groups = build_groups(&all, criterias, 0, column, periods);
    let (period_totals, total) = period_sums(&all, column, periods);
    Ok(ReportTree {
        criterias: criterias.to_vec(),
        periods: periods.to_vec(),
        groups,
        period_totals,
        total,
    })
}

impl ReportTree {
    pub fn group_count(&self) -> usize {
        fn count(nodes: &[GroupNode]) -> usize {
            nodes.iter().map(|n| 1 + count(&n.children)).sum()
        }
        count(&self.groups)
    }

    /// Flatten into text rows: header, one row per group (children right
    /// after their parent, indented by blank cells), then the Total row.
    pub fn to_rows(&self, ctx: &ReportContext) -> Vec<Vec<String>> {
        let sep = ctx.locale.csv_decimal_separator.as_str();
        let mut rows = Vec::new();

        let mut header: Vec<String> = self.criterias.iter().map(|c| ctx.criteria_label(c)).collect();
        header.extend(self.periods.iter().cloned());
        header.push(ctx.locale.l("label_total"));
        rows.push(header);

        for g in &self.groups {
            self.push_group_rows(g, ctx, &mut rows);
        }

        let mut total_row = vec![ctx.locale.l("label_total")];
        total_row.extend(std::iter::repeat(String::new()).take(self.criterias.len() - 1));
        total_row.extend(self.period_totals.iter().map(|s| format_hours_or_blank(*s, sep)));
        total_row.push(format_hours(self.total, sep));
        rows.push(total_row);
        rows
    }

    /// Rows from [`ReportTree::to_rows`] as CSV bytes in the locale's encoding.
    pub fn to_csv(&self, ctx: &ReportContext) -> ReportResult<Vec<u8>> {
        let rows = self.to_rows(ctx);
        info!(groups = self.group_count(), rows = rows.len(), "built report csv");
        encode_csv(&rows, ctx.locale)
    }

    fn push_group_rows(&self, node: &GroupNode, ctx: &ReportContext, rows: &mut Vec<Vec<String>>) {
        let sep = ctx.locale.csv_decimal_separator.as_str();
        let mut row: Vec<String> = vec![String::new(); node.level];
        row.push(ctx.format_criteria_value(&node.criteria, &node.value));
        row.extend(std::iter::repeat(String::new()).take(self.criterias.len() - node.level - 1));
        row.extend(node.period_hours.iter().map(|s| format_hours_or_blank(*s, sep)));
        row.push(format_hours(node.total, sep));
        rows.push(row);
        for child in &node.children {
            self.push_group_rows(child, ctx, rows);
        }
    }
}

/// Hierarchical report as CSV bytes in the locale's encoding.
pub fn report_to_csv(
    records: &[Record],
    criterias: &[String],
    column: &str,
    periods: &[String],
    ctx: &ReportContext,
) -> ReportResult<Vec<u8>> {
    build_report_tree(records, criterias, column, periods)?.to_csv(ctx)
}

/// Flat export rows: header then one row per entry.
pub fn entries_to_rows(entries: &[TimeEntry], ctx: &ReportContext) -> Vec<Vec<String>> {
    let (l, c) = (ctx.locale, ctx.catalog);
    let sep = l.csv_decimal_separator.as_str();
    let custom_fields = &c.custom_fields;

    let mut header: Vec<String> = [
        "field_spent_on",
        "field_user",
        "field_activity",
        "field_project",
        "field_issue",
        "field_tracker",
        "field_subject",
        "field_hours",
        "field_comments",
    ]
    .iter()
    .map(|k| l.l(k))
    .collect();
    header.extend(custom_fields.iter().map(|f| f.name.clone()));

    let mut rows = vec![header];
    for e in entries {
        let issue = e.issue_id.and_then(|id| c.find_issue(id));
        let mut row = vec![
            e.spent_on.format(&l.date_format).to_string(),
            c.find_user(e.user_id).map(|u| u.name()).unwrap_or_default(),
            c.find_activity(e.activity_id).map(|a| a.name.clone()).unwrap_or_default(),
            c.find_project(e.project_id).map(|p| p.name.clone()).unwrap_or_default(),
            e.issue_id.map(|id| id.to_string()).unwrap_or_default(),
            issue
                .and_then(|i| c.find_tracker(i.tracker_id))
                .map(|t| t.name.clone())
                .unwrap_or_default(),
            issue.map(|i| i.subject.clone()).unwrap_or_default(),
            hours_to_s(e.hours, sep),
            e.comments.clone(),
        ];
        row.extend(
            custom_fields
                .iter()
                .map(|f| show_value(e.custom_value_for(f), f.field_format, l)),
        );
        rows.push(row);
    }
    rows
}

/// Flat time entry export as CSV bytes in the locale's encoding.
pub fn entries_to_csv(entries: &[TimeEntry], ctx: &ReportContext) -> ReportResult<Vec<u8>> {
    let rows = entries_to_rows(entries, ctx);
    info!(entries = entries.len(), "built entries csv");
    encode_csv(&rows, ctx.locale)
}

pub fn generate_summary(entries: &[TimeEntry], tree: &ReportTree) -> SummaryStats {
    let users: HashSet<u32> = entries.iter().map(|e| e.user_id).collect();
    let projects: HashSet<u32> = entries.iter().map(|e| e.project_id).collect();
    SummaryStats {
        total_entries: entries.len(),
        total_hours: entries.iter().map(|e| e.hours).sum(),
        total_users: users.len(),
        total_projects: projects.len(),
        report_groups: tree.group_count(),
        periods: tree.periods.len(),
    }
}
