mod config;
mod logging;
mod seed;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use dioxus::LaunchBuilder;
use dioxus::desktop::{Config as DesktopConfig, WindowBuilder};
use services::{AppServices, Clock, LogMailer};
use storage::objects::FsAvatarStore;
use ui::{App, UiApp, build_app_context};

use crate::config::{AppConfig, Overrides};

#[derive(Debug, Parser)]
#[command(name = "feedback", version, about = "Classroom feedback sessions")]
struct Cli {
    /// SQLite database URL or file path.
    #[arg(long, global = true, value_name = "URL")]
    db: Option<String>,

    /// Extra TOML config file, applied after the default locations.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
enum Command {
    /// Launch the desktop app (default).
    Ui,
    /// Create demo accounts and a sample session.
    Seed,
}

fn normalize_sqlite_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == "sqlite::memory:" || trimmed.starts_with("sqlite://") {
        return trimmed.to_string();
    }

    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> anyhow::Result<()> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let Some(path) = db_url.strip_prefix("sqlite://") else {
        bail!("invalid database url: {db_url}");
    };
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        bail!("invalid database url: {db_url}");
    }

    if let Some(parent) = Path::new(path).parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    Ok(())
}

async fn open_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    prepare_sqlite_file(&config.database.url)?;
    let avatars = Arc::new(FsAvatarStore::new(
        config.avatar_dir(),
        config.avatars.public_base_url.clone(),
    ));
    AppServices::new_sqlite(
        &config.database.url,
        config.database.max_connections,
        avatars,
        Arc::new(LogMailer),
        Clock::system(),
    )
    .await
    .with_context(|| format!("opening {}", config.database.url))
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let overrides = Overrides {
        database_url: cli.db.clone(),
        config_file: cli.config.clone(),
    };
    let mut config = AppConfig::load(&overrides).context("loading configuration")?;
    config.database.url = normalize_sqlite_url(&config.database.url);
    logging::init_logging(&config.logging.level)?;
    tracing::debug!(?config, "configuration loaded");

    let services = open_services(&config).await?;

    match cli.command.unwrap_or(Command::Ui) {
        Command::Ui => {
            let app: Arc<dyn UiApp> = Arc::new(services);
            let context = build_app_context(&app);

            // Some tao setups default to always-on-top.
            let desktop_cfg = DesktopConfig::new().with_window(
                WindowBuilder::new()
                    .with_title("Classroom Feedback")
                    .with_always_on_top(false),
            );

            tracing::info!("launching desktop ui");
            LaunchBuilder::desktop()
                .with_cfg(desktop_cfg)
                .with_context(context)
                .launch(App);
            Ok(())
        }
        Command::Seed => {
            let report = seed::seed(&services).await?;
            println!(
                "teacher: {} / {}",
                report.teacher.email(),
                seed::DEMO_PASSWORD
            );
            println!(
                "student: {} / {}",
                report.student.email(),
                seed::DEMO_PASSWORD
            );
            match report.created_code {
                Some(code) => println!("sample session code: {code}"),
                None => println!("sample session already present"),
            }
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err:#}");
        std::process::exit(2);
    }
}
