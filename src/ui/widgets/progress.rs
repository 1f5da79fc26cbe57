// src/ui/widgets/progress.rs

use crate::app::App;
use crate::core::driver::DriverState;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Gauge},
};

/// Renders the scan progress gauge.
///
/// The label reflects the driver state: the current offset while scanning,
/// the final count once complete, or the failure message.
pub fn render_progress(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("Progress");

    let (label, color) = match (&app.driver, &app.last_step) {
        (DriverState::Idle, _) => ("Press S to scan".to_string(), Color::DarkGray),
        (DriverState::Scanning { offset }, Some(step)) => (
            format!("Scanning... {} / {} URLs", offset, step.total),
            Color::Cyan,
        ),
        (DriverState::Scanning { .. }, None) => ("Discovering URLs...".to_string(), Color::Cyan),
        (DriverState::Complete, Some(step)) => {
            (format!("Complete: {} URLs checked", step.total), Color::Green)
        }
        (DriverState::Complete, None) => ("Complete".to_string(), Color::Green),
        (DriverState::Failed(message), _) => (format!("Failed: {}", message), Color::Red),
    };

    let gauge = Gauge::default()
        .block(block)
        .gauge_style(Style::default().fg(color))
        .ratio(app.progress_ratio())
        .label(label);
    frame.render_widget(gauge, area);
}
