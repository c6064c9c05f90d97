mod app;
mod clipboard;
mod handler;
mod logging;
mod tui;
mod ui;

use std::time::Duration;

use anyhow::Result;
use cann_core::Config;

use crate::app::{App, GENERIC_ERROR_TOAST};
use crate::tui::EventHandler;

const TICK_RATE: Duration = Duration::from_millis(250);

#[tokio::main]
async fn main() -> Result<()> {
    // Must happen before the terminal is taken over
    if let Err(e) = logging::init() {
        eprintln!("Warning: logging disabled: {}", e);
    }

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Config::new()
        }
    };
    tracing::info!("Starting CANN assistant (theme: {})", config.theme.as_str());

    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let result = run(&mut terminal, App::new(config)).await;

    tui::restore()?;
    if let Err(e) = &result {
        tracing::error!("Exited with error: {:#}", e);
    }
    result
}

async fn run(terminal: &mut tui::Tui, mut app: App) -> Result<()> {
    let mut events = EventHandler::new(TICK_RATE);

    while !app.should_quit {
        terminal.draw(|frame| ui::render(&mut app, frame))?;

        let Some(event) = events.next().await else {
            break;
        };

        if let Err(e) = handler::handle_event(&mut app, event).await {
            tracing::error!("Event handling failed: {:#}", e);
            app.show_toast(GENERIC_ERROR_TOAST);
        }
        if let Err(e) = app.poll_tasks().await {
            tracing::error!("Background task failed: {:#}", e);
            app.show_toast(GENERIC_ERROR_TOAST);
        }
    }

    tracing::info!("Shutting down");
    Ok(())
}
