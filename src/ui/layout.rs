// src/ui/layout.rs

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Screen regions of the scanner UI.
pub struct AppLayout {
    pub header: Rect,
    pub progress: Rect,
    pub results: Rect,
    pub summary: Rect,
    pub footer: Rect,
}

/// Splits the frame into header, progress bar, results/summary row and footer.
///
/// The middle row gives the failing URL list 70% of the width and the
/// summary the rest.
pub fn create_layout(frame_size: Rect) -> AppLayout {
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame_size);

    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(main_chunks[2]);

    AppLayout {
        header: main_chunks[0],
        progress: main_chunks[1],
        results: content_chunks[0],
        summary: content_chunks[1],
        footer: main_chunks[3],
    }
}
