// src/ui/widgets/summary.rs

use crate::app::{App, Notice};
use ratatui::{
    prelude::*,
    text::Line,
    widgets::{Block, Borders, Paragraph, Wrap},
};

/// Renders the summary panel: stored pass/fail counts, the last batch and
/// totals for the scan in progress.
pub fn render_summary(frame: &mut Frame, app: &App, area: Rect) {
    let summary_container = Block::default().borders(Borders::ALL).title("Summary");
    frame.render_widget(summary_container, area);

    let summary_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // Stored results
            Constraint::Length(1), // Spacer
            Constraint::Length(4), // This scan
            Constraint::Length(1), // Spacer
            Constraint::Min(0),    // Notice
        ])
        .split(area);

    // --- Stored Results ---
    let stored = Text::from(vec![
        Line::from("STORED RESULTS".bold()),
        Line::from(vec![
            Span::raw("Passing: "),
            Span::styled(app.report.passing.to_string(), Style::default().fg(Color::Green)),
        ]),
        Line::from(vec![
            Span::raw("Failing: "),
            Span::styled(app.report.failing.to_string(), Style::default().fg(Color::Red)),
        ]),
    ]);
    frame.render_widget(Paragraph::new(stored), summary_chunks[0]);

    // --- This Scan ---
    let mut scan_lines = vec![Line::from("THIS SCAN".bold())];
    if let Some(step) = &app.last_step {
        scan_lines.push(Line::from(format!("Checked: {}/{}", step.progress.min(step.total as u64), step.total)));
        scan_lines.push(Line::from(format!("Passing: {}", app.totals.passing)));
        scan_lines.push(Line::from(format!("Failing: {}", app.totals.failing)));
    } else {
        scan_lines.push(Line::from("No scan run yet."));
    }
    frame.render_widget(Paragraph::new(scan_lines), summary_chunks[2]);

    // --- Notice ---
    let notice = match &app.notice {
        Notice::None => return,
        Notice::Success(msg) => Paragraph::new(msg.as_str()).style(Style::default().fg(Color::Green)),
        Notice::Error(msg) => Paragraph::new(msg.as_str()).style(Style::default().fg(Color::Red)),
    };
    frame.render_widget(notice.wrap(Wrap { trim: true }), summary_chunks[4]);
}
