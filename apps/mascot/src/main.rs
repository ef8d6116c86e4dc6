use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use shared::domain::Viewport;
use storage::SqliteStore;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use widget_core::{Orchestrator, WidgetDependencies};

mod commands;
mod headless;
mod settings;

use commands::Command;
use headless::{ConsoleEngine, ConsoleStage, ConsoleStatus, ConsoleTips, FileModelLoader};
use settings::{load_settings, render_default_settings};

const SAY_DURATION: Duration = Duration::from_secs(6);

#[derive(Parser, Debug)]
#[command(about = "Headless host for the mascot widget")]
struct Args {
    /// TOML settings file; `./mascot.toml` is read when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    database_url: Option<String>,
    #[arg(long)]
    models_root: Option<PathBuf>,
    #[arg(long)]
    print_default_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();

    if args.print_default_config {
        println!("{}", render_default_settings()?);
        return Ok(());
    }

    let mut settings = load_settings(args.config.as_deref())?;
    if let Some(database_url) = args.database_url {
        settings.database_url = database_url;
    }
    if let Some(models_root) = args.models_root {
        settings.models_root = models_root;
    }

    let store = SqliteStore::new(&settings.database_url)
        .await
        .with_context(|| format!("failed to open state database '{}'", settings.database_url))?;
    info!(database_url = %settings.database_url, "mascot: state database ready");

    let widget = Orchestrator::new(
        settings.widget,
        WidgetDependencies {
            loader: Arc::new(FileModelLoader::new(settings.models_root)),
            engine: Arc::new(ConsoleEngine),
            stage_view: Arc::new(ConsoleStage),
            status_view: Arc::new(ConsoleStatus),
            tips_view: Arc::new(ConsoleTips),
            store: Arc::new(store),
            word_of_the_day: None,
            viewport: Viewport::new(settings.viewport_width, settings.viewport_height),
        },
    )
    .await;
    widget.start().await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let command = match Command::parse(&line) {
            Ok(command) => command,
            Err(err) => {
                warn!("mascot: {err:#}");
                continue;
            }
        };
        if command == Command::Quit {
            break;
        }
        run(&widget, command).await;
    }

    info!("mascot: shutting down");
    widget.stage_slide_out().await;
    Ok(())
}

async fn run(widget: &Arc<Orchestrator>, command: Command) {
    match command {
        Command::Next => widget.switch_to_next().await,
        Command::Random => widget.switch_to_random().await,
        Command::Index(index, clothes) => widget.switch_by_index(index, clothes).await,
        Command::Name(name, clothes) => widget.switch_by_name(&name, clothes).await,
        Command::Clothes => widget.switch_to_next_clothes().await,
        Command::Reload | Command::Wake => widget.reload().await,
        Command::Resize(width, height) => {
            widget.on_viewport_resize(Viewport::new(width, height)).await
        }
        Command::Copy => widget.on_copy(),
        Command::Return => widget.on_visibility_return(),
        Command::Say(text) => {
            if !widget.say(text, SAY_DURATION) {
                info!("mascot: a higher-priority tip is showing");
            }
        }
        Command::Sleep => widget.sleep().await,
        Command::Quit => {}
    }
}
