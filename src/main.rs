use anyhow::{Context, Result};
use clap::Parser;
use copy_json::app::{AppState, document::build_document};
use copy_json::cli::{Cli, Commands};
use copy_json::clipboard::system_clipboard;
use copy_json::config::Config;
use copy_json::dom::Document;
use copy_json::handler::{
    CONFIRM_LABEL, COPY_CONTROL_ID, IDLE_LABEL, copy_once, install_copy_handler,
};
use copy_json::page::Page;
use copy_json::payload::load_payload;
use copy_json::ui::{self, theme::Theme};
use copy_json::utils::paths::{ensure_app_dir_exists, get_log_path};
use std::fs::OpenOptions;
use std::sync::Mutex;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

/// How long headless mode waits for the clipboard to accept the payload.
const COPY_TIMEOUT: Duration = Duration::from_secs(5);

/// How long a headless write waits for a clipboard manager to take the
/// selection over (Linux only).
const CLIPBOARD_HANDOFF: Duration = Duration::from_millis(250);

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;
    let payload = load_payload(cli.file.as_deref())?;

    match cli.command {
        Some(Commands::Copy) => {
            init_stderr_logging();
            handle_copy(&payload, &config)?;
        }
        None => {
            init_file_logging()?;
            let page = build_page(&payload, &config);
            let state = AppState::new(page, Theme::from_config(&config));
            ui::run_tui(state)?;
        }
    }

    Ok(())
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn init_stderr_logging() {
    fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .init();
}

// The terminal belongs to the UI, so the page logs to a file instead.
fn init_file_logging() -> Result<()> {
    ensure_app_dir_exists()?;
    let log_path = get_log_path()?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    fmt()
        .with_env_filter(env_filter())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    Ok(())
}

fn build_page(payload: &str, config: &Config) -> Page {
    let mut page = Page::new(build_document(payload));
    install_copy_handler(&mut page, system_clipboard(None), config.confirm_delay());
    page
}

fn copy_label(doc: &Document) -> &str {
    doc.element_by_id(COPY_CONTROL_ID)
        .map(|control| control.text.as_str())
        .unwrap_or_default()
}

fn handle_copy(payload: &str, config: &Config) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(async {
        let mut page = Page::new(build_document(payload));
        let clipboard = system_clipboard(Some(CLIPBOARD_HANDOFF));

        copy_once(&mut page, clipboard, config.confirm_delay(), COPY_TIMEOUT).await?;
        println!("{CONFIRM_LABEL}");
        info!(bytes = payload.len(), "payload copied");

        // On Linux the selection is only served while this process runs, plus
        // whatever a clipboard manager picked up during the handoff window.
        page.run_until(config.confirm_delay() + COPY_TIMEOUT, |doc| {
            copy_label(doc) == IDLE_LABEL
        })
        .await;
        info!(label = copy_label(page.document()), "confirmation window closed");

        Ok(())
    })
}
