// src/ui/widgets/results.rs

use crate::app::App;
use crate::core::report::{ReportStatus, ALL_PASSING_MESSAGE, NEVER_SCANNED_MESSAGE};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, Wrap},
};

/// Renders the cumulative list of URLs that failed the TLS check.
pub fn render_results(frame: &mut Frame, app: &mut App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("URLs without TLS 1.2+ support (↑ ↓)");

    let urls = match &app.report.status {
        ReportStatus::NeverScanned => {
            let p = Paragraph::new(NEVER_SCANNED_MESSAGE)
                .block(block)
                .wrap(Wrap { trim: true });
            frame.render_widget(p, area);
            return;
        }
        ReportStatus::AllPassing => {
            let p = Paragraph::new(ALL_PASSING_MESSAGE)
                .block(block)
                .style(Style::default().fg(Color::Green))
                .wrap(Wrap { trim: true });
            frame.render_widget(p, area);
            return;
        }
        ReportStatus::Failing(urls) => urls,
    };

    let lines: Vec<Line> = urls
        .iter()
        .map(|url| {
            Line::from(vec![
                Span::styled("✗ ", Style::default().fg(Color::Red)),
                Span::raw(url.as_str()),
            ])
        })
        .collect();

    let inner_area = block.inner(area);
    let paragraph = Paragraph::new(lines)
        .block(block)
        .scroll((app.scroll_offset as u16, 0));
    frame.render_widget(paragraph, area);

    let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight);
    frame.render_stateful_widget(scrollbar, inner_area, &mut app.list_scroll_state);
}
