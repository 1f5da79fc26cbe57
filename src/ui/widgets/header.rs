// src/ui/widgets/header.rs
use ratatui::{prelude::*, widgets::{Block, Borders, Paragraph}};
use crate::app::App;

/// Renders the title bar showing which content tree is scanned.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("TLS Compatibility Checker");
    let line = Line::from(vec![
        Span::raw("Content root: "),
        Span::styled(app.content_root.as_str(), Style::default().fg(Color::Yellow)),
    ]);
    frame.render_widget(Paragraph::new(line).block(block), area);
}
