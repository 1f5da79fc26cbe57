// src/tui.rs

use color_eyre::eyre::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::prelude::*;
use std::io::stdout;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::app::{App, Notice, ScanEvent};
use crate::core::auth::{Caller, RESET_ACTION};
use crate::core::coordinator::BatchCoordinator;
use crate::core::driver::run_scan;
use crate::ui;

/// Runs the terminal UI until the user quits.
pub async fn run(coordinator: BatchCoordinator, operator: Caller) -> Result<()> {
    stdout().execute(EnterAlternateScreen)?;
    stdout().execute(EnableMouseCapture)?;
    enable_raw_mode()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    terminal.clear()?;

    let result = event_loop(&mut terminal, &coordinator, &operator).await;

    // --- Restore Terminal ---
    stdout().execute(LeaveAlternateScreen)?;
    stdout().execute(DisableMouseCapture)?;
    disable_raw_mode()?;
    result
}

async fn event_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    coordinator: &BatchCoordinator,
    operator: &Caller,
) -> Result<()> {
    let snapshot = coordinator.store().snapshot()?;
    let mut app = App::new(coordinator.content_root().display().to_string(), &snapshot);
    let (tx, mut rx) = mpsc::unbounded_channel();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(&mut app, frame))?;

        if event::poll(Duration::from_millis(100))? {
            handle_events(&mut app, coordinator, operator, &tx)?;
        }

        while let Ok(scan_event) = rx.try_recv() {
            app.apply(scan_event);
            match coordinator.store().snapshot() {
                Ok(snapshot) => app.set_report(&snapshot),
                Err(e) => app.notice = Notice::Error(e.to_string()),
            }
        }
    }
    Ok(())
}

fn handle_events(
    app: &mut App,
    coordinator: &BatchCoordinator,
    operator: &Caller,
    tx: &mpsc::UnboundedSender<ScanEvent>,
) -> Result<()> {
    if let Event::Key(key) = event::read()? {
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }
        match key.code {
            KeyCode::Char('q') => app.quit(),
            KeyCode::Up => app.scroll_up(),
            KeyCode::Down => app.scroll_down(),
            KeyCode::Char('s') if !app.is_scanning() => start_scan(app, coordinator, operator, tx),
            KeyCode::Char('r') if !app.is_scanning() => reset(app, coordinator, operator),
            _ => {}
        }
    }
    Ok(())
}

fn start_scan(
    app: &mut App,
    coordinator: &BatchCoordinator,
    operator: &Caller,
    tx: &mpsc::UnboundedSender<ScanEvent>,
) {
    app.begin_scan();
    let coordinator = coordinator.clone();
    let operator = operator.clone();
    let tx = tx.clone();

    tokio::spawn(async move {
        let step_tx = tx.clone();
        let result = run_scan(&coordinator, &operator, |response| {
            let _ = step_tx.send(ScanEvent::Step(response.clone()));
        })
        .await
        .map_err(|e| {
            error!(error = %e, "Scan failed.");
            e.to_string()
        });
        let _ = tx.send(ScanEvent::Finished(result));
    });
}

fn reset(app: &mut App, coordinator: &BatchCoordinator, operator: &Caller) {
    let credentials = coordinator.nonces().credentials_for(RESET_ACTION, operator);
    match coordinator
        .reset(&credentials)
        .and_then(|_| Ok(coordinator.store().snapshot()?))
    {
        Ok(snapshot) => {
            info!("Reset from terminal UI.");
            app.set_report(&snapshot);
            app.notice = Notice::Success("TLS compatibility data has been reset.".to_string());
        }
        Err(e) => app.notice = Notice::Error(e.to_string()),
    }
}
