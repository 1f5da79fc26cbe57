// src/app.rs

use crate::core::driver::{DriverState, ScanTotals};
use crate::core::models::{Accumulator, ScanStepResponse};
use crate::core::report::Report;
use ratatui::widgets::ScrollbarState;

/// Messages from the background scan task to the UI loop.
#[derive(Debug)]
pub enum ScanEvent {
    Step(ScanStepResponse),
    Finished(Result<ScanTotals, String>),
}

pub enum Notice {
    None,
    Success(String),
    Error(String),
}

pub struct App {
    pub should_quit: bool,
    pub driver: DriverState,
    pub content_root: String,
    pub totals: ScanTotals,
    pub last_step: Option<ScanStepResponse>,
    pub report: Report,
    pub scroll_offset: usize,
    pub list_scroll_state: ScrollbarState,
    pub notice: Notice,
}

impl App {
    pub fn new(content_root: impl Into<String>, accumulator: &Accumulator) -> Self {
        Self {
            should_quit: false,
            driver: DriverState::Idle,
            content_root: content_root.into(),
            totals: ScanTotals::default(),
            last_step: None,
            report: Report::from_accumulator(accumulator),
            scroll_offset: 0,
            list_scroll_state: ScrollbarState::default(),
            notice: Notice::None,
        }
    }

    pub fn is_scanning(&self) -> bool {
        matches!(self.driver, DriverState::Scanning { .. })
    }

    pub fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(1);
        self.list_scroll_state = self.list_scroll_state.position(self.scroll_offset);
    }

    pub fn scroll_down(&mut self) {
        let max = self.report.failing.saturating_sub(1);
        self.scroll_offset = self.scroll_offset.saturating_add(1).min(max);
        self.list_scroll_state = self.list_scroll_state.position(self.scroll_offset);
    }

    pub fn begin_scan(&mut self) {
        self.driver = DriverState::start();
        self.totals = ScanTotals::default();
        self.last_step = None;
        self.notice = Notice::None;
    }

    pub fn apply(&mut self, event: ScanEvent) {
        match event {
            ScanEvent::Step(response) => {
                self.totals.absorb(&response);
                self.driver = std::mem::take(&mut self.driver).advance(&response);
                self.last_step = Some(response);
            }
            ScanEvent::Finished(Ok(totals)) => {
                self.driver = DriverState::Complete;
                self.notice = Notice::Success(format!(
                    "Scan complete: {} URLs checked, {} failing in this run.",
                    totals.total, totals.failing
                ));
            }
            ScanEvent::Finished(Err(message)) => {
                self.driver = DriverState::Failed(message.clone());
                self.notice = Notice::Error(message);
            }
        }
    }

    pub fn set_report(&mut self, accumulator: &Accumulator) {
        self.report = Report::from_accumulator(accumulator);
        self.list_scroll_state = self.list_scroll_state.content_length(self.report.failing);
        if self.scroll_offset >= self.report.failing {
            self.scroll_offset = 0;
            self.list_scroll_state = self.list_scroll_state.position(0);
        }
    }

    /// Fraction of the corpus covered by the current or last scan.
    pub fn progress_ratio(&self) -> f64 {
        match &self.last_step {
            Some(step) if step.total > 0 => (step.progress as f64 / step.total as f64).min(1.0),
            Some(_) => 1.0,
            None => 0.0,
        }
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(progress: u64, total: usize, remaining: usize, failing: &[&str]) -> ScanStepResponse {
        ScanStepResponse {
            progress,
            total,
            remaining,
            batch_size: 10,
            passing: 0,
            failing: failing.len(),
            failing_urls: failing.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn steps_move_the_driver_and_progress() {
        let mut app = App::new(".", &Accumulator::default());
        app.begin_scan();
        app.apply(ScanEvent::Step(step(10, 15, 15, &["https://old.vendor.io"])));
        assert_eq!(app.driver, DriverState::Scanning { offset: 10 });
        assert!((app.progress_ratio() - 10.0 / 15.0).abs() < f64::EPSILON);

        app.apply(ScanEvent::Step(step(15, 15, 5, &[])));
        app.apply(ScanEvent::Step(step(15, 15, 0, &[])));
        assert_eq!(app.driver, DriverState::Complete);
        assert_eq!(app.totals.failing_urls, vec!["https://old.vendor.io"]);
    }

    #[test]
    fn failure_is_surfaced() {
        let mut app = App::new(".", &Accumulator::default());
        app.begin_scan();
        app.apply(ScanEvent::Finished(Err("Unauthorized request".into())));
        assert!(matches!(app.driver, DriverState::Failed(_)));
        assert!(matches!(app.notice, Notice::Error(ref m) if m == "Unauthorized request"));
    }
}
