use chrono::Local;
use log::{Level, LevelFilter, Log, Metadata, Record};
use serde_json::Value;
use std::{
    env,
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
    process::ExitCode,
    str::FromStr,
    sync::{Arc, Mutex},
};

use theme_bundle::commands::{
    create_theme, delete_theme, duplicate_theme, export_theme, import_theme, list_themes,
    select_theme, ThemeState,
};
use theme_bundle::services::{EventSink, FsAccessBroker};

// ============================================================================
// Logging
// ============================================================================

struct CliLogger {
    file: Mutex<std::fs::File>,
    level: LevelFilter,
}

impl CliLogger {
    fn new(log_dir: &Path, level: LevelFilter) -> Result<Self, Box<dyn std::error::Error>> {
        std::fs::create_dir_all(log_dir)?;
        let log_path = log_dir.join("theme-bundle.log");
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;
        Ok(Self {
            file: Mutex::new(file),
            level,
        })
    }
}

impl Log for CliLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let timestamp = Local::now();
        let date = timestamp.format("%Y-%m-%d");
        let time = timestamp.format("%H:%M:%S");
        let target = record.target();
        let level = record.level();
        let message = format!("{}", record.args());
        let line = format!("[{date}][{time}][{target}][{level}] {message}");

        if let Ok(mut file) = self.file.try_lock() {
            let _ = writeln!(file, "{line}");
        }

        if level <= Level::Warn {
            eprintln!("{level}: {message}");
        }
    }

    fn flush(&self) {}
}

fn init_logger(log_dir: &Path, level: LevelFilter) -> Result<(), Box<dyn std::error::Error>> {
    let logger = CliLogger::new(log_dir, level)?;
    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(level);
    Ok(())
}

// ============================================================================
// Events
// ============================================================================

/// Prints settings change notifications so scripts can follow along
struct StdoutEventSink;

impl EventSink for StdoutEventSink {
    fn emit(&self, event: &str, payload: Value) {
        println!("event {event}: {payload}");
    }
}

// ============================================================================
// Commands
// ============================================================================

const USAGE: &str = "Usage: theme-bundle <command>

Commands:
  list                     List installed themes
  create                   Create a new theme from the built-in one
  import <archive>         Import a theme archive (.zip)
  export <id> [dest_dir]   Export a theme; moves the archive to dest_dir if given
  duplicate <id>           Duplicate a theme
  delete <id>              Delete a theme
  select <id>              Make a theme the active one
  watch                    Print settings changes made by other processes until Ctrl+C

Environment:
  THEME_BUNDLE_DATA_DIR    Data directory (settings.json, theme-assets/)
  THEME_BUNDLE_LOG_DIR     Log directory (default: <data_dir>/logs)
  THEME_BUNDLE_LOG_LEVEL   error | warn | info | debug | trace (default: info)";

fn default_data_dir() -> PathBuf {
    dirs_next::data_dir()
        .map(|dir| dir.join("theme-bundle"))
        .unwrap_or_else(|| PathBuf::from("data"))
}

/// Move an exported archive to its final destination, copying across filesystems
fn hand_off_archive(archive: &Path, dest_dir: &Path) -> Result<PathBuf, String> {
    std::fs::create_dir_all(dest_dir)
        .map_err(|e| format!("Failed to create destination directory: {e}"))?;
    let file_name = archive
        .file_name()
        .ok_or_else(|| "Exported archive has no file name".to_string())?;
    let dest = dest_dir.join(file_name);

    if std::fs::rename(archive, &dest).is_err() {
        std::fs::copy(archive, &dest).map_err(|e| format!("Failed to move archive: {e}"))?;
    }
    if let Some(staging) = archive.parent() {
        let _ = std::fs::remove_dir_all(staging);
    }
    Ok(dest)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    println!("{text}");
    Ok(())
}

async fn run(state: &ThemeState, args: &[String]) -> Result<(), String> {
    let arg = |i: usize| {
        args.get(i)
            .map(String::as_str)
            .ok_or_else(|| format!("Missing argument\n\n{USAGE}"))
    };

    match arg(0)? {
        "list" => print_json(&list_themes(state)?),
        "create" => print_json(&create_theme(state)?),
        "import" => match import_theme(state, PathBuf::from(arg(1)?)).await? {
            Some(summary) => print_json(&summary),
            None => Err("Cannot read the selected archive".to_string()),
        },
        "export" => {
            let archive = export_theme(state, arg(1)?.to_string()).await?;
            let archive = match args.get(2) {
                Some(dest_dir) => hand_off_archive(&archive, Path::new(dest_dir))?,
                None => archive,
            };
            println!("{}", archive.display());
            Ok(())
        }
        "duplicate" => print_json(&duplicate_theme(state, arg(1)?)?),
        "delete" => delete_theme(state, arg(1)?),
        "select" => {
            let outcome = select_theme(state, arg(1)?)?;
            if outcome.restart_required {
                println!("Restart the app to fully apply the new theme");
            }
            print_json(&outcome)
        }
        "watch" => {
            state.settings.start_watcher();
            println!("Watching {} for changes", state.settings.settings_path().display());
            tokio::signal::ctrl_c()
                .await
                .map_err(|e| format!("Failed to wait for Ctrl+C: {e}"))
        }
        other => Err(format!("Unknown command '{other}'\n\n{USAGE}")),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load configuration from environment
    let data_dir = env::var("THEME_BUNDLE_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| default_data_dir());
    let log_dir = env::var("THEME_BUNDLE_LOG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| data_dir.join("logs"));
    let log_level = env::var("THEME_BUNDLE_LOG_LEVEL")
        .ok()
        .and_then(|level| LevelFilter::from_str(&level).ok())
        .unwrap_or(LevelFilter::Info);

    if let Err(e) = init_logger(&log_dir, log_level) {
        eprintln!("Failed to initialize logging in {}: {e}", log_dir.display());
    }
    log::info!("theme-bundle starting. Data dir: {:?}", data_dir);

    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() || args[0] == "help" || args[0] == "--help" {
        println!("{USAGE}");
        return ExitCode::SUCCESS;
    }

    let state = ThemeState::new(&data_dir, Arc::new(FsAccessBroker));
    state.observe(Arc::new(StdoutEventSink));

    match run(&state, &args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
