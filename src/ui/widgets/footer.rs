// src/ui/widgets/footer.rs

use crate::app::App;
use crate::core::driver::DriverState;
use ratatui::{
    prelude::*,
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::Paragraph,
};

fn key(label: &'static str) -> Span<'static> {
    Span::styled(label, Style::new().bold().fg(Color::Yellow))
}

/// Renders the footer widget, which displays available actions.
pub fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let spans = match app.driver {
        DriverState::Scanning { .. } => Line::from("Scanning... Press Q to quit."),
        _ => Line::from(vec![
            key("[S]"),
            Span::raw("can site, "),
            key("[R]"),
            Span::raw("eset data, "),
            key("↑ ↓"),
            Span::raw(" scroll, "),
            key("[Q]"),
            Span::raw("uit"),
        ]),
    };

    let footer = Paragraph::new(spans).alignment(Alignment::Center);
    frame.render_widget(footer, area);
}
