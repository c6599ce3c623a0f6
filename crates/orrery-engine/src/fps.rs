//! Rolling frame rate, refreshed once per second

use std::time::{Duration, Instant};

const WINDOW: Duration = Duration::from_secs(1);

#[derive(Clone, Debug, Default)]
pub struct FpsCounter {
    window_start: Option<Instant>,
    frames: u32,
    fps: f64,
}

impl FpsCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a frame presented at `now`; returns the current rate
    pub fn tick(&mut self, now: Instant) -> f64 {
        let start = *self.window_start.get_or_insert(now);
        self.frames += 1;

        let elapsed = now.saturating_duration_since(start);
        if elapsed >= WINDOW {
            self.fps = self.frames as f64 / elapsed.as_secs_f64();
            self.frames = 0;
            self.window_start = Some(now);
        }
        self.fps
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_until_first_second() {
        let t0 = Instant::now();
        let mut fps = FpsCounter::new();
        for i in 0..10 {
            assert_eq!(fps.tick(t0 + Duration::from_millis(i * 50)), 0.0);
        }
    }

    #[test]
    fn test_refreshes_each_second() {
        let t0 = Instant::now();
        let mut fps = FpsCounter::new();
        // 60 frames at 60 Hz: the 61st tick lands exactly on the one second mark
        for i in 0..=60u64 {
            fps.tick(t0 + Duration::from_micros(i * 1_000_000 / 60));
        }
        assert!((fps.fps() - 61.0).abs() < 1e-6, "{}", fps.fps());

        // Next window at 30 Hz
        let t1 = t0 + Duration::from_secs(1);
        for i in 1..=30u64 {
            fps.tick(t1 + Duration::from_micros(i * 1_000_000 / 30));
        }
        assert!((fps.fps() - 30.0).abs() < 1e-6, "{}", fps.fps());
    }
}
