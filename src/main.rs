mod app;
mod config;
mod constants;
mod deletion;
mod export;
mod input;
mod query;
mod search;
mod ui;

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::App;
use crate::app::fetch::Collaborators;
use crate::config::Config;
use crate::query::MemoryEngine;

fn setup_logging() {
    use std::fs::OpenOptions;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,vaultnav=debug"));

    // Try to create a log file in the config directory
    let log_file = Config::config_dir()
        .ok()
        .map(|dir| dir.join("vaultnav.log"))
        .and_then(|path| {
            OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&path)
                .ok()
        });

    if let Some(file) = log_file {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::sync::Mutex::new(file))
                    .with_ansi(false),
            )
            .init();
    } else {
        // Fallback to stderr if file logging fails
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .init();
    }
}

fn print_usage() {
    eprintln!(
        r#"vaultnav - Terminal explorer for local message archives

Usage: vaultnav [--archive <path>] [command]

Commands:
    (none)      Start the explorer
    pending     List deletion batches staged for review
    version     Show the version
    help        Show this help message

Configuration file: ~/.config/vaultnav/config.toml
"#
    );
}

/// Command line: an optional `--archive <path>` and at most one command
#[derive(Debug, Default, PartialEq)]
struct Args {
    archive: Option<PathBuf>,
    command: Option<String>,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Args> {
    let mut parsed = Args::default();
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        if arg == "--archive" {
            let path = iter.next().context("--archive requires a path")?;
            parsed.archive = Some(PathBuf::from(path));
        } else if let Some(path) = arg.strip_prefix("--archive=") {
            parsed.archive = Some(PathBuf::from(path));
        } else if parsed.command.is_none() {
            parsed.command = Some(arg);
        } else {
            anyhow::bail!("Unexpected argument: {}", arg);
        }
    }
    Ok(parsed)
}

fn list_pending(config: &Config) -> Result<()> {
    let manager = deletion::Manager::new(config.deletions_dir()?);
    let manifests = manager
        .list_pending()
        .context("Failed to read pending deletion batches")?;

    if manifests.is_empty() {
        println!("No pending deletion batches.");
        return Ok(());
    }
    for manifest in &manifests {
        println!(
            "{}  {:>6} messages  {}",
            manifest.id,
            manifest.message_count(),
            manifest.description
        );
    }
    Ok(())
}

async fn run_explorer(mut config: Config, archive: Option<PathBuf>) -> Result<()> {
    if archive.is_some() {
        config.archive.path = archive;
    }
    config.ensure_dirs()?;

    let archive_path = config.archive_path()?;
    let engine = MemoryEngine::load(&archive_path)
        .with_context(|| format!("Failed to open archive {}", archive_path.display()))?;
    let engine = Arc::new(engine);

    let collab = Collaborators {
        engine: engine.clone(),
        search: engine,
        deletions: Arc::new(deletion::Manager::new(config.deletions_dir()?)),
        attachments_dir: config.attachments_dir()?,
        export_dir: config.export_dir(),
    };

    tracing::info!("Starting vaultnav on {}", archive_path.display());
    let mut app = App::new(config, collab);
    app.run().await
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = match parse_args(env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}", e);
            print_usage();
            std::process::exit(1);
        }
    };

    match args.command.as_deref() {
        Some("help") | Some("--help") | Some("-h") => {
            print_usage();
            Ok(())
        }
        Some("version") | Some("--version") | Some("-V") => {
            println!("vaultnav {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Some("pending") => list_pending(&Config::load()?),
        Some(cmd) => {
            eprintln!("Unknown command: {}", cmd);
            print_usage();
            std::process::exit(1);
        }
        None => {
            setup_logging();
            let config = Config::load()?;
            run_explorer(config, args.archive).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Args> {
        parse_args(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parse_args() {
        assert_eq!(args(&[]).unwrap(), Args::default());
        assert_eq!(
            args(&["--archive", "/tmp/a.json"]).unwrap(),
            Args {
                archive: Some(PathBuf::from("/tmp/a.json")),
                command: None,
            }
        );
        assert_eq!(
            args(&["pending", "--archive=x.json"]).unwrap(),
            Args {
                archive: Some(PathBuf::from("x.json")),
                command: Some("pending".into()),
            }
        );
        assert!(args(&["--archive"]).is_err());
        assert!(args(&["pending", "extra"]).is_err());
    }

    #[test]
    fn test_list_pending_reads_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.archive.data_dir = Some(dir.path().to_path_buf());
        list_pending(&config).unwrap();

        let manager = deletion::Manager::new(config.deletions_dir().unwrap());
        manager
            .save_manifest(&deletion::Manifest::new("Sender-x", vec!["a".into()]))
            .unwrap();
        assert_eq!(manager.list_pending().unwrap().len(), 1);
        list_pending(&config).unwrap();
    }
}
