use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::broadcast::error::RecvError;
use walkdir::WalkDir;

use tagscan::logging::{self, LogFormat};
use tagscan::processor::DocumentFormat;
use tagscan::{
    load_config, BatchCoordinator, BatchEvent, BatchEventBroadcaster, BatchState,
    BroadcastProgress, FileStatus,
};

/// Exit status of a cancelled run, as for SIGINT.
const EXIT_CANCELLED: u8 = 130;

#[derive(Parser, Debug)]
#[command(name = "tagscan", version, about = "Extract equipment tags from engineering drawings")]
struct Cli {
    /// Configuration file (defaults to <config dir>/tagscan/config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Folder the tag index is written to
    #[arg(short, long)]
    output: PathBuf,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Documents or folders to scan; folders are searched recursively
    #[arg(required = true)]
    paths: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init_tracing(cli.log_format) {
        eprintln!("{}", e);
    }

    let Some(config_path) = cli.config.clone().or_else(default_config_path) else {
        tracing::error!("No --config given and no platform config directory available");
        return ExitCode::FAILURE;
    };
    let config = match load_config(&config_path) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(path = %config_path.display(), "{}", e);
            return ExitCode::FAILURE;
        }
    };

    let broadcaster = BatchEventBroadcaster::default();
    let events = broadcaster.subscribe();
    let progress = Arc::new(BroadcastProgress::new(broadcaster));

    let coordinator = match BatchCoordinator::from_config(&config, progress) {
        Ok(coordinator) => coordinator,
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let cancel = coordinator.cancel_handle();
    if let Err(e) = ctrlc::set_handler(move || {
        eprintln!("Cancelling after the current page...");
        cancel.cancel();
    }) {
        tracing::warn!("Failed to install Ctrl-C handler: {}", e);
    }

    let printer = tokio::spawn(print_events(events, cli.log_format));

    let files = expand_inputs(&cli.paths);
    let outcome = coordinator.start(files, cli.output).await;

    if let Err(e) = printer.await {
        tracing::warn!("Event printer stopped: {}", e);
    }

    match outcome.state {
        BatchState::Completed => ExitCode::SUCCESS,
        BatchState::Cancelled => ExitCode::from(EXIT_CANCELLED),
        _ => ExitCode::FAILURE,
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("tagscan").join("config.json"))
}

/// Files are kept as given; folders expand to the supported documents below
/// them, sorted by name.
fn expand_inputs(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for path in paths {
        if !path.is_dir() {
            files.push(path.clone());
            continue;
        }

        for entry in WalkDir::new(path).sort_by_file_name() {
            match entry {
                Ok(entry) if entry.file_type().is_file() && is_supported(entry.path()) => {
                    files.push(entry.into_path());
                }
                Ok(_) => {}
                Err(e) => tracing::warn!("Skipping unreadable entry: {}", e),
            }
        }
    }

    files
}

fn is_supported(path: &Path) -> bool {
    DocumentFormat::from_path(path).is_some()
}

async fn print_events(
    mut events: tokio::sync::broadcast::Receiver<BatchEvent>,
    format: LogFormat,
) {
    loop {
        match events.recv().await {
            Ok(event) => {
                let done = matches!(event, BatchEvent::RunCompleted(_));
                match format {
                    LogFormat::Json => match serde_json::to_string(&event) {
                        Ok(line) => println!("{}", line),
                        Err(e) => tracing::warn!("Failed to serialize event: {}", e),
                    },
                    LogFormat::Text => print_human(&event),
                }
                if done {
                    break;
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!("Event printer lagged; {} event(s) dropped", skipped);
            }
            Err(RecvError::Closed) => break,
        }
    }
}

fn print_human(event: &BatchEvent) {
    match event {
        BatchEvent::FileStarted { name, index, total } => {
            println!("[{}/{}] {}", index, total, name);
        }
        BatchEvent::FileFinished {
            name,
            status: FileStatus::Error,
            error,
            ..
        } => {
            println!("  {} failed: {}", name, error.as_deref().unwrap_or("unknown error"));
        }
        BatchEvent::FileFinished {
            name,
            status: FileStatus::Cancelled,
            ..
        } => {
            println!("  {} cancelled", name);
        }
        BatchEvent::FileFinished { .. } => {}
        BatchEvent::ProgressPercent { value } => {
            println!("  {:.0}%", value);
        }
        BatchEvent::RunCompleted(summary) => {
            println!("{}: {}", summary.state, summary.message);
            if let Some(path) = &summary.output_path {
                println!("Tag index written to {}", path.display());
            }
        }
    }
}
