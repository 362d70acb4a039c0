// HTML fragments for the time log pages: breadcrumb and select options.
use crate::locale::Locale;
use crate::types::{Catalog, Issue, Project, TimeEntry};
use crate::util::escape_html;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
    pub selected: bool,
}

impl SelectOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        SelectOption {
            label: label.into(),
            value: value.into(),
            selected: false,
        }
    }
}

fn link_to(label: &str, href: &str, class: Option<&str>) -> String {
    match class {
        Some(c) => format!(
            "<a href=\"{}\" class=\"{}\">{}</a>",
            escape_html(href),
            c,
            escape_html(label)
        ),
        None => format!("<a href=\"{}\">{}</a>", escape_html(href), escape_html(label)),
    }
}

/// `All Projects » <project> » <issue> » ` as a breadcrumb paragraph.
/// Issues the viewer cannot see appear as a bare `#id`.
pub fn render_timelog_breadcrumb(
    catalog: &Catalog,
    locale: &Locale,
    project: Option<&Project>,
    issue: Option<&Issue>,
) -> String {
    let mut links = vec![link_to(&locale.l("label_project_all"), "/time_entries", None)];
    if let Some(p) = project {
        links.push(link_to(
            &p.name,
            &format!("/projects/{}/time_entries", p.identifier),
            None,
        ));
    }
    if let Some(issue) = issue {
        if issue.visible {
            let tracker = catalog
                .find_tracker(issue.tracker_id)
                .map(|t| t.name.as_str())
                .unwrap_or("");
            let label = format!("{} #{}", tracker, issue.id);
            links.push(link_to(
                label.trim(),
                &format!("/issues/{}", issue.id),
                Some("issue"),
            ));
        } else {
            links.push(format!("#{}", issue.id));
        }
    }
    format!(
        "<p class=\"breadcrumb\">{} \u{bb} </p>",
        links.join(" \u{bb} ")
    )
}

/// Activities offered when logging time, preceded by a blank choice when
/// the entry's current activity is inactive or no activity is the default.
pub fn activity_collection_for_select_options(
    catalog: &Catalog,
    locale: &Locale,
    time_entry: Option<&TimeEntry>,
    project_id: Option<u32>,
) -> Vec<SelectOption> {
    let activities = match project_id {
        Some(p) => catalog.project_activities(p),
        None => catalog.shared_activities(),
    };
    let current_inactive = time_entry
        .and_then(|e| catalog.find_activity(e.activity_id))
        .map_or(false, |a| !a.active);

    let mut collection = Vec::new();
    if current_inactive || !activities.iter().any(|a| a.is_default) {
        let blank = format!("--- {} ---", locale.l("actionview_instancetag_blank_option"));
        collection.push(SelectOption::new(blank, ""));
    }
    collection.extend(
        activities
            .iter()
            .map(|a| SelectOption::new(a.name.clone(), a.id.to_string())),
    );
    collection
}

pub fn options_for_period_select(locale: &Locale, value: &str) -> Vec<SelectOption> {
    let options = vec![
        SelectOption::new(locale.l("label_all_time"), "all"),
        SelectOption::new(locale.l("label_today"), "today"),
        SelectOption::new(locale.l("label_yesterday"), "yesterday"),
        SelectOption::new(locale.l("label_this_week"), "current_week"),
        SelectOption::new(locale.l("label_last_week"), "last_week"),
        SelectOption::new(locale.l_count("label_last_n_days", 7), "7_days"),
        SelectOption::new(locale.l("label_this_month"), "current_month"),
        SelectOption::new(locale.l("label_last_month"), "last_month"),
        SelectOption::new(locale.l_count("label_last_n_days", 30), "30_days"),
        SelectOption::new(locale.l("label_this_year"), "current_year"),
    ];
    options
        .into_iter()
        .map(|mut o| {
            o.selected = o.value == value;
            o
        })
        .collect()
}

pub fn render_options(options: &[SelectOption]) -> String {
    options
        .iter()
        .map(|o| {
            let selected = if o.selected { " selected=\"selected\"" } else { "" };
            format!(
                "<option value=\"{}\"{}>{}</option>",
                escape_html(&o.value),
                selected,
                escape_html(&o.label)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TimeEntryActivity, Tracker};
    use chrono::NaiveDate;
    use std::collections::HashMap;

    fn activity(id: u32, name: &str, active: bool, is_default: bool) -> TimeEntryActivity {
        TimeEntryActivity {
            id,
            name: name.into(),
            active,
            is_default,
            position: id,
            project_id: None,
            parent_id: None,
        }
    }

    fn entry(activity_id: u32) -> TimeEntry {
        TimeEntry {
            spent_on: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            user_id: 1,
            activity_id,
            project_id: 1,
            issue_id: None,
            hours: 1.0,
            comments: String::new(),
            custom_values: HashMap::new(),
        }
    }

    #[test]
    fn breadcrumb_links_project_and_visible_issue() {
        let catalog = Catalog {
            trackers: vec![Tracker { id: 1, name: "Bug".into() }],
            ..Default::default()
        };
        let project = Project { id: 3, name: "R&D".into(), identifier: "rnd".into() };
        let issue = Issue { id: 12, tracker_id: 1, project_id: 3, subject: "x".into(), visible: true };
        let html = render_timelog_breadcrumb(&catalog, &Locale::default(), Some(&project), Some(&issue));
        assert_eq!(
            html,
            "<p class=\"breadcrumb\"><a href=\"/time_entries\">All Projects</a> \u{bb} \
             <a href=\"/projects/rnd/time_entries\">R&amp;D</a> \u{bb} \
             <a href=\"/issues/12\" class=\"issue\">Bug #12</a> \u{bb} </p>"
        );
    }

    #[test]
    fn breadcrumb_hides_invisible_issue() {
        let issue = Issue { id: 12, tracker_id: 1, project_id: 3, subject: "x".into(), visible: false };
        let html = render_timelog_breadcrumb(&Catalog::default(), &Locale::default(), None, Some(&issue));
        assert!(html.ends_with("</a> \u{bb} #12 \u{bb} </p>"));
        assert!(!html.contains("/issues/12"));
    }

    #[test]
    fn blank_option_only_without_default() {
        let locale = Locale::default();
        let with_default = Catalog {
            activities: vec![activity(1, "Design", true, true), activity(2, "Dev", true, false)],
            ..Default::default()
        };
        let opts = activity_collection_for_select_options(&with_default, &locale, None, None);
        assert_eq!(opts, vec![SelectOption::new("Design", "1"), SelectOption::new("Dev", "2")]);

        let without_default = Catalog {
            activities: vec![activity(2, "Dev", true, false)],
            ..Default::default()
        };
        let opts = activity_collection_for_select_options(&without_default, &locale, None, None);
        assert_eq!(opts[0], SelectOption::new("--- Please select ---", ""));
        assert_eq!(opts.len(), 2);
    }

    #[test]
    fn blank_option_when_entry_activity_is_inactive() {
        let catalog = Catalog {
            activities: vec![activity(1, "Design", true, true), activity(5, "Old", false, false)],
            ..Default::default()
        };
        let e = entry(5);
        let opts = activity_collection_for_select_options(&catalog, &Locale::default(), Some(&e), None);
        assert_eq!(opts[0].value, "");
        assert_eq!(opts.len(), 2);
    }

    #[test]
    fn period_options_mark_selection() {
        let opts = options_for_period_select(&Locale::default(), "7_days");
        assert_eq!(opts.len(), 10);
        let selected: Vec<&str> = opts.iter().filter(|o| o.selected).map(|o| o.label.as_str()).collect();
        assert_eq!(selected, vec!["last 7 days"]);
        let html = render_options(&opts[..2]);
        assert_eq!(
            html,
            "<option value=\"all\">all time</option>\n<option value=\"today\">today</option>"
        );
    }
}
