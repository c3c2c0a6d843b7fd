use std::collections::VecDeque;
use std::time::{Duration, Instant};

pub const DEFAULT_FPS_WINDOW: usize = 10;

/// Rolling frames-per-second estimate over the last few tick intervals.
#[derive(Debug, Clone)]
pub struct FpsCounter {
    window_size: usize,
    intervals: VecDeque<Duration>,
    last_tick: Option<Instant>,
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new(DEFAULT_FPS_WINDOW)
    }
}

impl FpsCounter {
    pub fn new(window_size: usize) -> Self {
        let window_size = window_size.max(1);
        Self {
            window_size,
            intervals: VecDeque::with_capacity(window_size),
            last_tick: None,
        }
    }

    /// Record a tick at `now` and return the current estimate, rounded to two
    /// decimals. The first tick reports `0.0`.
    pub fn tick(&mut self, now: Instant) -> f64 {
        if let Some(last) = self.last_tick.replace(now) {
            if self.intervals.len() == self.window_size {
                self.intervals.pop_front();
            }
            self.intervals.push_back(now.saturating_duration_since(last));
        }
        self.fps()
    }

    pub fn fps(&self) -> f64 {
        if self.intervals.is_empty() {
            return 0.0;
        }
        let total: Duration = self.intervals.iter().sum();
        let avg_ms = total.as_secs_f64() * 1000.0 / self.intervals.len() as f64;
        if avg_ms <= 0.0 {
            return 0.0;
        }
        (1000.0 / avg_ms * 100.0).round() / 100.0
    }
}

pub fn format_fps(fps: f64) -> String {
    format!("FPS:{fps}")
}
