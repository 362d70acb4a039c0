// Entry point and high-level CLI flow.
//
// - Option [1] loads time entries and the reference catalog.
// - Option [2] exports the flat time entry CSV.
// - Option [3] builds the grouped hours report and a JSON summary.
// - Option [4] prints the breadcrumb and filter options for the scope.
mod aggregate;
mod config;
mod criteria;
mod error;
mod helpers;
mod loader;
mod locale;
mod output;
mod reports;
mod types;
mod util;

use aggregate::{aggregate, ReportQuery};
use config::Settings;
use criteria::ReportContext;
use error::ReportResult;
use locale::Locale;
use once_cell::sync::Lazy;
use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};
use types::{Catalog, TimeEntry};

const ENTRIES_EXPORT: &str = "time_entries_export.csv";
const REPORT_EXPORT: &str = "timelog_report.csv";
const SUMMARY_EXPORT: &str = "report_summary.json";

// Loaded once, reused by every export in the same run.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| Mutex::new(AppState { data: None }));

struct AppState {
    data: Option<LoadedData>,
}

#[derive(Clone)]
struct LoadedData {
    entries: Vec<TimeEntry>,
    catalog: Catalog,
}

fn state() -> MutexGuard<'static, AppState> {
    APP_STATE.lock().unwrap_or_else(|e| e.into_inner())
}

fn loaded_data() -> Option<LoadedData> {
    let data = state().data.clone();
    if data.is_none() {
        println!("Error: No data loaded. Please load the time entries first (option 1).\n");
    }
    data
}

/// Read a single line of input after printing the common "Enter choice:" prompt.
///
/// Returns `None` once stdin is closed.
fn read_choice() -> Option<String> {
    print!("Enter choice: ");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match io::stdin().read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

/// Returns `true` if the user chose `Y`, `false` if they chose `N`.
fn prompt_back_to_menu() -> bool {
    loop {
        print!("Back to Report Selection (Y/N): ");
        let _ = io::stdout().flush();
        let mut buf = String::new();
        if matches!(io::stdin().read_line(&mut buf), Ok(0) | Err(_)) {
            return false;
        }
        match buf.trim().to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

fn handle_load(settings: &Settings) {
    let result = loader::load_catalog(&settings.catalog_path).and_then(|catalog| {
        loader::load_entries(&settings.entries_path).map(|(entries, report)| (catalog, entries, report))
    });
    match result {
        Ok((catalog, entries, load_report)) => {
            println!(
                "Processing time log... ({} rows read, {} entries loaded)",
                util::format_int(load_report.total_rows as i64),
                util::format_int(load_report.loaded_rows as i64)
            );
            if load_report.parse_errors > 0 {
                println!(
                    "Note: {} rows skipped due to parse/validation errors.",
                    util::format_int(load_report.parse_errors as i64)
                );
            }
            println!();
            state().data = Some(LoadedData { entries, catalog });
        }
        Err(e) => {
            error!(error = %e, "load failed");
            eprintln!("Failed to load files: {}\n", e);
        }
    }
}

fn handle_export_entries(locale: &Locale) -> ReportResult<()> {
    let Some(data) = loaded_data() else {
        return Ok(());
    };
    let ctx = ReportContext::new(&data.catalog, locale);
    let rows = reports::entries_to_rows(&data.entries, &ctx);
    let bytes = reports::entries_to_csv(&data.entries, &ctx)?;
    output::write_bytes(ENTRIES_EXPORT, &bytes)?;
    println!("Time Entries\n");
    output::preview_rows(&rows, 3);
    println!("(Full table exported to {})\n", ENTRIES_EXPORT);
    Ok(())
}

fn handle_generate_report(settings: &Settings, locale: &Locale) -> ReportResult<()> {
    let Some(data) = loaded_data() else {
        return Ok(());
    };
    let ctx = ReportContext::new(&data.catalog, locale);
    let query = ReportQuery::new(
        &settings.criterias,
        &ctx.criterias,
        settings.columns,
        settings.from,
        settings.to,
    );
    let report = aggregate(&data.entries, &data.catalog, &query);
    let column = report.columns.key();

    let tree = reports::build_report_tree(&report.records, &report.criterias, column, &report.periods)?;
    let bytes = tree.to_csv(&ctx)?;
    output::write_bytes(REPORT_EXPORT, &bytes)?;

    println!("Spent Time Report");
    println!(
        "(Grouped by {}, per {})\n",
        report
            .criterias
            .iter()
            .map(|c| ctx.criteria_label(c))
            .collect::<Vec<_>>()
            .join(" / "),
        column
    );
    output::preview_rows(&tree.to_rows(&ctx), 5);
    println!("(Full table exported to {})\n", REPORT_EXPORT);

    let summary = reports::generate_summary(&data.entries, &tree);
    output::write_json(SUMMARY_EXPORT, &summary)?;
    println!("Summary Stats ({}):", SUMMARY_EXPORT);
    println!(
        "{{\"total_hours\": {}, \"report_groups\": {}}}\n",
        util::format_number(summary.total_hours, 2),
        util::format_int(summary.report_groups as i64)
    );
    Ok(())
}

fn handle_show_filters(settings: &Settings, locale: &Locale) {
    let Some(data) = loaded_data() else {
        return;
    };
    let catalog = &data.catalog;
    let project = settings.project.and_then(|id| catalog.find_project(id));
    let issue = settings.issue.and_then(|id| catalog.find_issue(id));
    println!(
        "{}\n",
        helpers::render_timelog_breadcrumb(catalog, locale, project, issue)
    );
    let activities = helpers::activity_collection_for_select_options(
        catalog,
        locale,
        None,
        project.map(|p| p.id),
    );
    println!("{}\n", helpers::render_options(&activities));
    let periods = helpers::options_for_period_select(locale, &settings.period);
    println!("{}\n", helpers::render_options(&periods));
}

fn report_failure(result: ReportResult<()>) {
    if let Err(e) = result {
        error!(error = %e, "export failed");
        eprintln!("Export error: {}\n", e);
    }
}

fn main() {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(io::stderr)
        .init();

    let settings = match Settings::load(config::SETTINGS_FILE) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Invalid {} ({}); using defaults.\n", config::SETTINGS_FILE, e);
            Settings::default()
        }
    };
    let locale = Locale::for_code(&settings.locale);
    info!(locale = %locale.code, encoding = %locale.csv_encoding, "startup");

    loop {
        println!("Time Log Export:");
        println!("[1] Load time entries");
        println!("[2] Export time entries");
        println!("[3] Generate time report");
        println!("[4] Show filters\n");
        let Some(choice) = read_choice() else {
            break;
        };
        match choice.as_str() {
            "1" => handle_load(&settings),
            "2" => report_failure(handle_export_entries(&locale)),
            "3" => {
                println!();
                report_failure(handle_generate_report(&settings, &locale));
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            "4" => handle_show_filters(&settings, &locale),
            _ => println!("Invalid choice. Please enter 1, 2, 3 or 4.\n"),
        }
    }
}
