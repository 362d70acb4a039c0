// Built-in translations and CSV export conventions per language.
use once_cell::sync::Lazy;
use std::collections::HashMap;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct Locale {
    pub code: String,
    pub csv_separator: char,
    pub csv_decimal_separator: String,
    /// WHATWG encoding label the CSV cells are transcoded to.
    pub csv_encoding: String,
    /// `chrono` strftime pattern used for dates in exports.
    pub date_format: String,
    labels: HashMap<&'static str, &'static str>,
}

const EN: &[(&str, &str)] = &[
    ("label_project_all", "All Projects"),
    ("label_total", "Total"),
    ("label_none", "[none]"),
    ("actionview_instancetag_blank_option", "Please select"),
    ("label_all_time", "all time"),
    ("label_today", "today"),
    ("label_yesterday", "yesterday"),
    ("label_this_week", "this week"),
    ("label_last_week", "last week"),
    ("label_last_n_days", "last %{count} days"),
    ("label_this_month", "this month"),
    ("label_last_month", "last month"),
    ("label_this_year", "this year"),
    ("label_member", "Member"),
    ("field_spent_on", "Date"),
    ("field_user", "User"),
    ("field_activity", "Activity"),
    ("field_project", "Project"),
    ("field_issue", "Issue"),
    ("field_tracker", "Tracker"),
    ("field_subject", "Subject"),
    ("field_hours", "Hours"),
    ("field_comments", "Comment"),
    ("general_text_Yes", "Yes"),
    ("general_text_No", "No"),
];

const FR: &[(&str, &str)] = &[
    ("label_project_all", "Tous les projets"),
    ("label_total", "Total"),
    ("label_none", "[aucun]"),
    ("actionview_instancetag_blank_option", "Choisir"),
    ("label_all_time", "toute la période"),
    ("label_today", "aujourd'hui"),
    ("label_yesterday", "hier"),
    ("label_this_week", "cette semaine"),
    ("label_last_week", "la semaine dernière"),
    ("label_last_n_days", "les %{count} derniers jours"),
    ("label_this_month", "ce mois-ci"),
    ("label_last_month", "le mois dernier"),
    ("label_this_year", "cette année"),
    ("label_member", "Membre"),
    ("field_spent_on", "Date"),
    ("field_user", "Utilisateur"),
    ("field_activity", "Activité"),
    ("field_project", "Projet"),
    ("field_issue", "Demande"),
    ("field_tracker", "Tracker"),
    ("field_subject", "Sujet"),
    ("field_hours", "Heures"),
    ("field_comments", "Commentaire"),
    ("general_text_Yes", "oui"),
    ("general_text_No", "non"),
];

const DE: &[(&str, &str)] = &[
    ("label_project_all", "Alle Projekte"),
    ("label_total", "Gesamtzahl"),
    ("label_none", "kein"),
    ("actionview_instancetag_blank_option", "Bitte auswählen"),
    ("label_all_time", "gesamter Zeitraum"),
    ("label_today", "heute"),
    ("label_yesterday", "gestern"),
    ("label_this_week", "aktuelle Woche"),
    ("label_last_week", "vorige Woche"),
    ("label_last_n_days", "die letzten %{count} Tage"),
    ("label_this_month", "aktueller Monat"),
    ("label_last_month", "voriger Monat"),
    ("label_this_year", "aktuelles Jahr"),
    ("label_member", "Mitglied"),
    ("field_spent_on", "Datum"),
    ("field_user", "Benutzer"),
    ("field_activity", "Aktivität"),
    ("field_project", "Projekt"),
    ("field_issue", "Ticket"),
    ("field_tracker", "Tracker"),
    ("field_subject", "Thema"),
    ("field_hours", "Stunden"),
    ("field_comments", "Kommentar"),
    ("general_text_Yes", "Ja"),
    ("general_text_No", "Nein"),
];

// Encoding labels resolve per WHATWG: "ISO-8859-1" is windows-1252, so
// characters like `€` export as their cp1252 byte (0x80) rather than `?`.
static LOCALES: Lazy<HashMap<&'static str, Locale>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("en", Locale::build("en", ',', ".", "ISO-8859-1", "%Y-%m-%d", EN));
    m.insert("fr", Locale::build("fr", ';', ",", "ISO-8859-1", "%d/%m/%Y", FR));
    m.insert("de", Locale::build("de", ';', ",", "ISO-8859-1", "%d.%m.%Y", DE));
    m
});

impl Locale {
    fn build(
        code: &str,
        csv_separator: char,
        csv_decimal_separator: &str,
        csv_encoding: &str,
        date_format: &str,
        labels: &[(&'static str, &'static str)],
    ) -> Locale {
        Locale {
            code: code.to_string(),
            csv_separator,
            csv_decimal_separator: csv_decimal_separator.to_string(),
            csv_encoding: csv_encoding.to_string(),
            date_format: date_format.to_string(),
            labels: labels.iter().copied().collect(),
        }
    }

    pub fn find(code: &str) -> Option<&'static Locale> {
        LOCALES.get(code.trim().to_lowercase().as_str())
    }

    /// The built-in locale for `code`, falling back to English.
    pub fn for_code(code: &str) -> Locale {
        match Locale::find(code) {
            Some(l) => l.clone(),
            None => {
                warn!(locale = code, "unknown locale, falling back to en");
                LOCALES["en"].clone()
            }
        }
    }

    /// Translate `key`; an untranslated key comes back as itself.
    pub fn l(&self, key: &str) -> String {
        self.labels
            .get(key)
            .or_else(|| LOCALES["en"].labels.get(key))
            .map(|s| s.to_string())
            .unwrap_or_else(|| key.to_string())
    }

    pub fn l_count(&self, key: &str, count: i64) -> String {
        self.l(key).replace("%{count}", &count.to_string())
    }
}

impl Default for Locale {
    fn default() -> Self {
        LOCALES["en"].clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_with_english_fallback() {
        let fr = Locale::for_code("fr");
        assert_eq!(fr.l("field_hours"), "Heures");
        assert_eq!(fr.l("no_such_key"), "no_such_key");
        assert_eq!(fr.csv_separator, ';');
        assert_eq!(fr.csv_decimal_separator, ",");
    }

    #[test]
    fn interpolates_counts() {
        let en = Locale::default();
        assert_eq!(en.l_count("label_last_n_days", 7), "last 7 days");
    }

    #[test]
    fn unknown_code_falls_back_to_english() {
        assert_eq!(Locale::for_code("xx").code, "en");
        assert_eq!(Locale::for_code(" DE ").code, "de");
    }
}
