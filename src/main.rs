// src/main.rs

mod app_logic;
mod core;

use crate::app_logic::{AppDetailController, AppListController, MessageSeverity, ViewCommand};
use crate::core::diff_engine;
use crate::core::format_utils::{format_date, format_date_time, format_optional_size, format_size};
use crate::core::{
    AppDetails, ApplicationRecord, ConfigManagerOperations, CoreConfigManager, FootprintPolicy,
    InventorySource, RecordStore, RefreshCoordinator, SortCriterion, path_utils,
};
use simplelog::{
    ColorChoice, CombinedLogger, Config, LevelFilter, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};
use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

pub const APP_NAME_FOR_PROFILES: &str = "AppView";

const USAGE: &str = "Usage: appview <inventory.json> [--filter TEXT] [--sort name|package|type|date|size] [--detail PACKAGE [--manifest]]";
const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Default)]
struct CommandLine {
    inventory_path: PathBuf,
    filter: Option<String>,
    sort: Option<SortCriterion>,
    detail: Option<String>,
    manifest: bool,
}

fn parse_command_line(args: impl IntoIterator<Item = String>) -> Result<CommandLine, String> {
    let mut args = args.into_iter();
    let mut parsed = CommandLine::default();
    let mut inventory_path = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--filter" => {
                parsed.filter = Some(args.next().ok_or("--filter needs a value")?);
            }
            "--sort" => {
                let value = args.next().ok_or("--sort needs a value")?;
                parsed.sort = Some(
                    SortCriterion::parse(&value).ok_or_else(|| {
                        let known: Vec<String> =
                            SortCriterion::ALL.iter().map(ToString::to_string).collect();
                        format!(
                            "Unknown sort criterion '{value}', expected one of: {}",
                            known.join(", ")
                        )
                    })?,
                );
            }
            "--detail" => {
                parsed.detail = Some(args.next().ok_or("--detail needs a package name")?);
            }
            "--manifest" => parsed.manifest = true,
            other if other.starts_with("--") => return Err(format!("Unknown option '{other}'")),
            other => {
                if inventory_path.replace(PathBuf::from(other)).is_some() {
                    return Err("Only one inventory file may be given".to_string());
                }
            }
        }
    }

    parsed.inventory_path = inventory_path.ok_or("Missing inventory file")?;
    if parsed.manifest && parsed.detail.is_none() {
        return Err("--manifest requires --detail".to_string());
    }
    Ok(parsed)
}

fn init_logging() {
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        LevelFilter::Warn,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];
    match path_utils::get_log_file_path(APP_NAME_FOR_PROFILES).map(File::create) {
        Some(Ok(file)) => loggers.push(WriteLogger::new(LevelFilter::Debug, Config::default(), file)),
        Some(Err(e)) => eprintln!("Could not create log file: {e}"),
        None => eprintln!("No configuration directory available, logging to terminal only."),
    }
    if let Err(e) = CombinedLogger::init(loggers) {
        eprintln!("Failed to initialize logging: {e}");
    }
}

/*
 * Console stand-in for a list widget. It only ever changes through the edit
 * scripts the controller emits, so the printed table is exactly what an
 * incrementally updated UI would show.
 */
struct ConsoleView {
    rows: Vec<ApplicationRecord>,
    failed: bool,
}

impl ConsoleView {
    fn new() -> Self {
        ConsoleView {
            rows: Vec::new(),
            failed: false,
        }
    }

    fn execute(&mut self, commands: Vec<ViewCommand>) {
        for command in commands {
            match command {
                ViewCommand::ApplyEdits { edits } => {
                    match diff_engine::apply(&self.rows, &edits) {
                        Ok(rows) => self.rows = rows,
                        Err(e) => log::error!("ConsoleView: Discarding edit script: {e}"),
                    }
                }
                ViewCommand::SetLoading(loading) => {
                    log::debug!("ConsoleView: Loading = {loading}");
                }
                ViewCommand::ShowStatus(text) => log::info!("ConsoleView: {text}"),
                ViewCommand::ShowMessage { severity, text } => {
                    if severity == MessageSeverity::Error {
                        self.failed = true;
                    }
                    eprintln!("{severity:?}: {text}");
                }
                ViewCommand::ShowDetails(details) => print_details(&details),
                ViewCommand::ShowManifest(text) => print!("{text}"),
                ViewCommand::NavigateBack => log::debug!("ConsoleView: Navigate back."),
            }
        }
    }

    fn print_rows(&self) {
        for record in &self.rows {
            println!(
                "{:<32} {:<40} {:>12} {:>10} {:>10}{}",
                record.display_name(),
                record.package_id(),
                record.version_name(),
                format_date(record.installed_at()),
                format_optional_size(record.storage_footprint_bytes()),
                if record.is_system_owned() { "  [system]" } else { "" }
            );
        }
    }
}

fn print_details(details: &AppDetails) {
    let record = &details.record;
    println!("{}", record.display_name());
    println!("  Package:       {}", record.package_id());
    println!(
        "  Version:       {} ({})",
        record.version_name(),
        record.version_code()
    );
    println!("  Installed:     {}", format_date_time(record.installed_at()));
    println!("  Updated:       {}", format_date_time(record.last_updated_at()));
    println!("  System app:    {}", record.is_system_owned());
    println!("  UID:           {}", details.uid);
    if let Some(shared) = &details.shared_user_id {
        println!("  Shared user:   {shared}");
    }
    if let Some(path) = &details.source_path {
        println!("  Source:        {}", path.display());
    }
    let sizes = &details.sizes;
    println!("  Storage:       {}", format_size(sizes.total()));
    for (label, bytes) in [
        ("code", sizes.code),
        ("data", sizes.data),
        ("cache", sizes.cache),
        ("external data", sizes.external_data),
        ("external cache", sizes.external_cache),
        ("obb", sizes.obb),
        ("media", sizes.media),
    ] {
        println!("    {label:<15}{}", format_size(bytes));
    }
    println!("  Permissions:   {}", details.requested_permissions.len());
    for certificate in &details.signing_certificates {
        println!(
            "  Signer SHA-256: {} ({} bytes)",
            certificate.sha256_fingerprint, certificate.byte_len
        );
    }
}

fn run(command_line: CommandLine) -> ExitCode {
    let source = Arc::new(InventorySource::new(command_line.inventory_path.clone()));
    let mut view = ConsoleView::new();

    if let Some(package_id) = &command_line.detail {
        let mut detail_controller = AppDetailController::new(source);
        view.execute(detail_controller.open(package_id));
        while detail_controller.is_loading() {
            thread::sleep(POLL_INTERVAL);
            view.execute(detail_controller.poll_details());
        }
        if command_line.manifest && detail_controller.current().is_some() {
            view.execute(detail_controller.show_manifest());
        }
        return if view.failed {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        };
    }

    let config_manager = Arc::new(CoreConfigManager::new());
    let footprint_policy = match config_manager.load_view_preferences(APP_NAME_FOR_PROFILES) {
        Ok(preferences) if !preferences.measure_footprints => FootprintPolicy::Skip,
        _ => FootprintPolicy::Measure,
    };
    let coordinator = Arc::new(RefreshCoordinator::new(
        Arc::new(RecordStore::new()),
        source,
        footprint_policy,
    ));
    let mut list_controller =
        AppListController::new(coordinator, config_manager, APP_NAME_FOR_PROFILES);

    if let Some(filter) = &command_line.filter {
        view.execute(list_controller.set_filter(filter));
    }
    if let Some(sort) = command_line.sort {
        view.execute(list_controller.set_sort(sort));
    }

    view.execute(list_controller.request_refresh());
    while list_controller.is_refreshing() {
        thread::sleep(POLL_INTERVAL);
        view.execute(list_controller.poll_refresh());
    }

    view.print_rows();
    if view.failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn main() -> ExitCode {
    init_logging();
    log::info!("Application starting...");

    let command_line = match parse_command_line(std::env::args().skip(1)) {
        Ok(command_line) => command_line,
        Err(message) => {
            eprintln!("{message}\n{USAGE}");
            return ExitCode::from(2);
        }
    };

    let exit_code = run(command_line);
    log::info!("Application exiting.");
    exit_code
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_command_line_full() {
        let parsed = parse_command_line(args(&[
            "inv.json", "--filter", "mail", "--sort", "SIZE",
        ]))
        .unwrap();
        assert_eq!(parsed.inventory_path, PathBuf::from("inv.json"));
        assert_eq!(parsed.filter.as_deref(), Some("mail"));
        assert_eq!(parsed.sort, Some(SortCriterion::Size));
        assert!(parsed.detail.is_none());
    }

    #[test]
    fn test_parse_command_line_errors() {
        assert!(parse_command_line(args(&[])).is_err());
        let sort_error = parse_command_line(args(&["inv.json", "--sort", "bogus"])).unwrap_err();
        assert!(sort_error.contains("name, package, type, date, size"), "{sort_error}");
        assert!(parse_command_line(args(&["inv.json", "--filter"])).is_err());
        assert!(parse_command_line(args(&["a.json", "b.json"])).is_err());
        assert!(parse_command_line(args(&["inv.json", "--manifest"])).is_err());
        assert!(parse_command_line(args(&["inv.json", "--verbose"])).is_err());
    }

    #[test]
    fn test_console_view_follows_edit_scripts() {
        let mut view = ConsoleView::new();
        let first = vec![
            ApplicationRecord::new("a.pkg", "A"),
            ApplicationRecord::new("b.pkg", "B"),
        ];
        view.execute(vec![ViewCommand::ApplyEdits {
            edits: diff_engine::diff(&[], &first),
        }]);
        assert_eq!(view.rows, first);

        let second = vec![ApplicationRecord::new("b.pkg", "B")];
        view.execute(vec![
            ViewCommand::ApplyEdits {
                edits: diff_engine::diff(&first, &second),
            },
            ViewCommand::ShowMessage {
                severity: MessageSeverity::Error,
                text: "boom".to_string(),
            },
        ]);
        assert_eq!(view.rows, second);
        assert!(view.failed);
    }
}
