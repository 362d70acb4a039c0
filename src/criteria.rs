// Grouping criteria the report can be broken down by, and how their raw
// values are turned into display strings.
use crate::locale::Locale;
use crate::types::{Catalog, CustomField, FieldFormat};
use crate::util::{format_hours, parse_date_safe, parse_f64_safe};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Project,
    User,
    Activity,
    Tracker,
    Issue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CriteriaLabel {
    /// Translation key.
    Key(&'static str),
    /// Literal text, e.g. a custom field name.
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CriteriaDef {
    pub key: String,
    pub label: CriteriaLabel,
    /// Set when values are ids of this entity kind.
    pub klass: Option<EntityKind>,
    pub format: FieldFormat,
}

impl CriteriaDef {
    fn entity(key: &str, label: &'static str, klass: EntityKind) -> Self {
        CriteriaDef {
            key: key.to_string(),
            label: CriteriaLabel::Key(label),
            klass: Some(klass),
            format: FieldFormat::Int,
        }
    }

    fn custom(field: &CustomField) -> Self {
        CriteriaDef {
            key: format!("cf_{}", field.id),
            label: CriteriaLabel::Text(field.name.clone()),
            klass: None,
            format: field.field_format,
        }
    }

    pub fn label(&self, locale: &Locale) -> String {
        match &self.label {
            CriteriaLabel::Key(k) => locale.l(k),
            CriteriaLabel::Text(t) => t.clone(),
        }
    }
}

/// Built-in criteria followed by one per custom field.
pub fn available_criterias(custom_fields: &[CustomField]) -> Vec<CriteriaDef> {
    let mut v = vec![
        CriteriaDef::entity("project", "field_project", EntityKind::Project),
        CriteriaDef::entity("member", "label_member", EntityKind::User),
        CriteriaDef::entity("activity", "field_activity", EntityKind::Activity),
        CriteriaDef::entity("tracker", "field_tracker", EntityKind::Tracker),
        CriteriaDef::entity("issue", "field_issue", EntityKind::Issue),
    ];
    v.extend(custom_fields.iter().map(CriteriaDef::custom));
    v
}

/// Generic formatting of a raw value by declared field format.
pub fn format_value(value: &str, format: FieldFormat, locale: &Locale) -> String {
    match format {
        FieldFormat::Date => match parse_date_safe(Some(value)) {
            Some(d) => d.format(&locale.date_format).to_string(),
            None => value.to_string(),
        },
        FieldFormat::Bool => match value.trim() {
            "1" | "true" => locale.l("general_text_Yes"),
            "0" | "false" => locale.l("general_text_No"),
            other => other.to_string(),
        },
        FieldFormat::Float => match parse_f64_safe(Some(value)) {
            Some(f) => format_hours(f, &locale.csv_decimal_separator),
            None => value.to_string(),
        },
        FieldFormat::String | FieldFormat::Int | FieldFormat::List => value.to_string(),
    }
}

/// Display a custom value; a missing value shows as blank.
pub fn show_value(value: Option<&str>, format: FieldFormat, locale: &Locale) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => format_value(v, format, locale),
        _ => String::new(),
    }
}

/// Everything needed to label report rows.
pub struct ReportContext<'a> {
    pub catalog: &'a Catalog,
    pub locale: &'a Locale,
    pub criterias: Vec<CriteriaDef>,
}

impl<'a> ReportContext<'a> {
    pub fn new(catalog: &'a Catalog, locale: &'a Locale) -> Self {
        ReportContext {
            catalog,
            locale,
            criterias: available_criterias(&catalog.custom_fields),
        }
    }

    pub fn criteria(&self, key: &str) -> Option<&CriteriaDef> {
        self.criterias.iter().find(|c| c.key == key)
    }

    pub fn criteria_label(&self, key: &str) -> String {
        match self.criteria(key) {
            Some(c) => c.label(self.locale),
            None => key.to_string(),
        }
    }

    /// Resolve a raw grouping value to its display string.
    ///
    /// Blank values read as "none". Entity criteria look the id up in the
    /// catalog; an issue the viewer cannot see shows only as `#id`, and an
    /// id that resolves to nothing shows as the raw value.
    pub fn format_criteria_value(&self, criteria: &str, value: &str) -> String {
        if value.trim().is_empty() {
            return self.locale.l("label_none");
        }
        let Some(def) = self.criteria(criteria) else {
            return value.to_string();
        };
        let Some(klass) = def.klass else {
            return format_value(value, def.format, self.locale);
        };
        let id = value.trim().parse::<u32>().ok();
        let resolved = id.and_then(|id| self.entity_label(klass, id));
        resolved.unwrap_or_else(|| value.to_string())
    }

    fn entity_label(&self, klass: EntityKind, id: u32) -> Option<String> {
        let c = self.catalog;
        match klass {
            EntityKind::Project => c.find_project(id).map(|p| p.name.clone()),
            EntityKind::User => c.find_user(id).map(|u| u.name()),
            EntityKind::Activity => c.find_activity(id).map(|a| a.name.clone()),
            EntityKind::Tracker => c.find_tracker(id).map(|t| t.name.clone()),
            EntityKind::Issue => c.find_issue(id).map(|issue| {
                if issue.visible {
                    let tracker = c
                        .find_tracker(issue.tracker_id)
                        .map(|t| t.name.as_str())
                        .unwrap_or("");
                    format!("{} #{}: {}", tracker, issue.id, issue.subject)
                } else {
                    format!("#{}", issue.id)
                }
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Issue, Project, Tracker};

    fn catalog() -> Catalog {
        Catalog {
            projects: vec![Project { id: 1, name: "Website".into(), identifier: "web".into() }],
            trackers: vec![Tracker { id: 2, name: "Bug".into() }],
            issues: vec![
                Issue { id: 7, tracker_id: 2, project_id: 1, subject: "Crash".into(), visible: true },
                Issue { id: 8, tracker_id: 2, project_id: 1, subject: "Secret".into(), visible: false },
            ],
            custom_fields: vec![
                CustomField { id: 3, name: "Billable".into(), field_format: FieldFormat::Bool },
                CustomField { id: 4, name: "Due".into(), field_format: FieldFormat::Date },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn blank_value_is_none_label() {
        let (c, l) = (catalog(), Locale::default());
        let ctx = ReportContext::new(&c, &l);
        assert_eq!(ctx.format_criteria_value("project", ""), "[none]");
        assert_eq!(ctx.format_criteria_value("cf_3", "  "), "[none]");
    }

    #[test]
    fn entity_values_resolve_through_catalog() {
        let (c, l) = (catalog(), Locale::default());
        let ctx = ReportContext::new(&c, &l);
        assert_eq!(ctx.format_criteria_value("project", "1"), "Website");
        assert_eq!(ctx.format_criteria_value("issue", "7"), "Bug #7: Crash");
        assert_eq!(ctx.format_criteria_value("issue", "8"), "#8");
        assert_eq!(ctx.format_criteria_value("project", "99"), "99");
    }

    #[test]
    fn custom_values_use_field_format() {
        let c = catalog();
        let l = Locale::for_code("de");
        let ctx = ReportContext::new(&c, &l);
        assert_eq!(ctx.format_criteria_value("cf_3", "1"), "Ja");
        assert_eq!(ctx.format_criteria_value("cf_4", "2024-03-05"), "05.03.2024");
        assert_eq!(ctx.criteria_label("cf_4"), "Due");
        assert_eq!(ctx.criteria_label("activity"), "Aktivität");
    }

    #[test]
    fn float_values_use_decimal_separator() {
        let l = Locale::for_code("fr");
        assert_eq!(format_value("1.5", FieldFormat::Float, &l), "1,50");
        assert_eq!(show_value(None, FieldFormat::Float, &l), "");
    }
}
