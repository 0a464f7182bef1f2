//! Command-line surface: argument parsing and terminal output.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::commands::upload::{self, ShareCallbacks, ShareOverrides, ShareReport, UploadState};
use crate::commands::{history, network, services, settings};
use crate::models::settings::AppSettings;
use crate::models::upload::UploadProgress;
use crate::services::archiver::ArchiveProgress;
use crate::services::validation::format_file_size;

#[derive(Parser, Debug)]
#[command(name = "easyshare", version)]
#[command(about = "Drop a file or folder, get a shareable download link", long_about = None)]
pub struct Cli {
    /// Directory holding settings.json and history.json
    #[arg(long, env = "EASYSHARE_DATA_DIR", default_value = ".easyshare", global = true)]
    pub data_dir: PathBuf,

    /// Override the storage proxy base URL for this run
    #[arg(long, env = "EASYSHARE_API_URL", global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Upload a file, or a folder as one zip archive
    Share {
        #[arg(required = true)]
        paths: Vec<String>,
        /// Upload service to try first
        #[arg(short, long)]
        service: Option<String>,
        /// Expiration hint, e.g. 1d or 1w
        #[arg(short, long)]
        expires: Option<String>,
        #[arg(long)]
        max_downloads: Option<u32>,
        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },
    /// List registered upload services
    Services,
    /// Check the storage proxy health endpoint
    Health,
    /// Show or edit upload history
    History {
        #[command(subcommand)]
        action: Option<HistoryAction>,
    },
    /// Show or edit settings
    Settings {
        #[command(subcommand)]
        action: Option<SettingsAction>,
    },
}

#[derive(Subcommand, Debug)]
pub enum HistoryAction {
    List,
    Delete { id: String },
    Clear,
}

#[derive(Subcommand, Debug)]
pub enum SettingsAction {
    Show,
    /// Set one value by its camelCase key, e.g. `defaultService 0x0.st`
    Set { key: String, value: String },
}

/// Run one command. Returns `Ok(false)` when the command finished but the
/// upload itself failed.
pub async fn run(cli: Cli) -> crate::error::Result<bool> {
    let data_dir = cli.data_dir;
    let mut app_settings = settings::get_settings(&data_dir)?;
    if let Some(url) = cli.api_url {
        app_settings.api_base_url = url;
    }

    match cli.command {
        Command::Share {
            paths,
            service,
            expires,
            max_downloads,
            json,
        } => {
            let state = UploadState::new(&data_dir, app_settings)?;
            let overrides = ShareOverrides {
                service,
                expiration: expires,
                max_downloads,
            };
            let callbacks = if json {
                ShareCallbacks::default()
            } else {
                terminal_callbacks()
            };
            let report = upload::share(&state, paths, overrides, callbacks).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                eprintln!();
                print_report(&report);
            }
            Ok(report.outcome.result.is_success())
        }
        Command::Services => {
            let registry = upload::build_registry(&app_settings)?;
            for info in services::list_services(&registry) {
                println!(
                    "{}{:<10} max {}",
                    if info.is_default { "* " } else { "  " },
                    info.name,
                    format_file_size(info.max_file_size)
                );
            }
            Ok(true)
        }
        Command::Health => {
            let status = network::check_health(&app_settings).await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
            Ok(status.healthy)
        }
        Command::History { action } => {
            match action.unwrap_or(HistoryAction::List) {
                HistoryAction::List => {
                    for record in history::get_history(&data_dir)? {
                        println!(
                            "{}  {}  {}  {}  {}",
                            record.id,
                            record.uploaded_at,
                            record.service_name,
                            record.file_name,
                            record.download_url
                        );
                    }
                }
                HistoryAction::Delete { id } => history::delete_history(&data_dir, &id)?,
                HistoryAction::Clear => history::clear_history(&data_dir)?,
            }
            Ok(true)
        }
        Command::Settings { action } => {
            let shown: AppSettings = match action.unwrap_or(SettingsAction::Show) {
                SettingsAction::Show => app_settings,
                SettingsAction::Set { key, value } => settings::set_setting(&data_dir, &key, &value)?,
            };
            println!("{}", serde_json::to_string_pretty(&shown)?);
            Ok(true)
        }
    }
}

/// Progress lines on stderr, rewritten in place.
fn terminal_callbacks() -> ShareCallbacks {
    ShareCallbacks {
        on_archive: Some(Arc::new(|p: ArchiveProgress| {
            eprint!("\r{:<40} {:>3}%", p.message, p.percentage);
            let _ = std::io::stderr().flush();
        })),
        on_upload: Some(Arc::new(|p: UploadProgress| {
            eprint!("\r{:<40} {:>3}%", "Uploading...", p.percentage);
            let _ = std::io::stderr().flush();
        })),
    }
}

fn print_report(report: &ShareReport) {
    if let Some(err) = &report.archive_error {
        eprintln!("Could not archive folder ({}); uploaded the first file only", err);
    }
    for warning in &report.outcome.warnings {
        eprintln!("Warning: {}", warning);
    }

    match report.outcome.result.link() {
        Some(link) => {
            eprintln!(
                "Uploaded {} ({}) via {}",
                report.file_name,
                format_file_size(report.file_size),
                report.outcome.service
            );
            if let Some(expiry) = &link.expiry {
                eprintln!("Expires: {}", expiry);
            }
            println!("{}", link.url);
        }
        None => {
            eprintln!(
                "Upload failed: {}",
                report.outcome.result.error().unwrap_or("unknown error")
            );
            let attempts = report.outcome.attempt_errors();
            if attempts.len() > 1 {
                eprintln!("Tried:");
                for attempt in attempts {
                    eprintln!("  {}", attempt);
                }
            }
            if !report.suggestions.is_empty() {
                eprintln!("Try these solutions:");
                for suggestion in &report.suggestions {
                    eprintln!("  - {}", suggestion);
                }
            }
        }
    }
}
