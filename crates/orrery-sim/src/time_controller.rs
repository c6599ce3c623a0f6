//! Simulation clock for real-time and time-lapse playback

use hifitime::{Duration, Epoch};

/// Simulation clock with variable rate playback
#[derive(Clone, Debug)]
pub struct TimeController {
    /// Current simulation time
    current: Epoch,
    /// Earliest reachable time (start of the planetary element table's range)
    min_epoch: Epoch,
    /// Latest reachable time
    max_epoch: Epoch,
    /// Simulation rate (sim seconds per real second)
    /// 1.0 = realtime, 86400.0 = 1 day per second
    rate: f64,
    paused: bool,
}

impl TimeController {
    pub fn new(start: Epoch) -> Self {
        let mut tc = Self {
            current: start,
            min_epoch: Epoch::from_gregorian_utc(1800, 1, 1, 0, 0, 0, 0),
            max_epoch: Epoch::from_gregorian_utc(2100, 1, 1, 0, 0, 0, 0),
            rate: rates::REALTIME,
            paused: false,
        };
        tc.set_time(start);
        tc
    }

    /// Get current simulation time
    pub fn current(&self) -> Epoch {
        self.current
    }

    /// Set absolute time
    pub fn set_time(&mut self, epoch: Epoch) {
        self.current = epoch.clamp(self.min_epoch, self.max_epoch);
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Set simulation rate (sim seconds per real second); negative runs backward
    pub fn set_rate(&mut self, rate: f64) {
        if rate.is_finite() {
            self.rate = rate.clamp(-rates::YEAR_PER_SEC, rates::YEAR_PER_SEC);
        }
    }

    pub fn set_rate_days_per_second(&mut self, days: f64) {
        self.set_rate(days * rates::DAY_PER_SEC);
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Advance simulation by real-world delta time
    /// Returns new epoch
    pub fn tick(&mut self, real_dt_seconds: f64) -> Epoch {
        if self.paused || !real_dt_seconds.is_finite() {
            return self.current;
        }

        let sim_dt = real_dt_seconds * self.rate;
        self.current = (self.current + Duration::from_seconds(sim_dt))
            .clamp(self.min_epoch, self.max_epoch);

        self.current
    }

    /// Jump forward/backward by duration
    pub fn jump(&mut self, duration: Duration) {
        self.current = (self.current + duration).clamp(self.min_epoch, self.max_epoch);
    }

    /// Index of the coarse bucket the current time falls in
    pub fn bucket(&self, width: Duration) -> i64 {
        time_bucket(self.current, width)
    }
}

/// Index of the `width`-sized bucket (counted from J2000) containing `epoch`
pub fn time_bucket(epoch: Epoch, width: Duration) -> i64 {
    let width_s = width.to_seconds();
    if width_s <= 0.0 {
        return 0;
    }
    let j2000 = Epoch::from_gregorian_utc(2000, 1, 1, 12, 0, 0, 0);
    ((epoch - j2000).to_seconds() / width_s).floor() as i64
}

/// Preset time rates
pub mod rates {
    /// Real-time
    pub const REALTIME: f64 = 1.0;
    /// 1 minute per second
    pub const MINUTE_PER_SEC: f64 = 60.0;
    /// 1 hour per second
    pub const HOUR_PER_SEC: f64 = 3600.0;
    /// 1 sidereal day per second
    pub const SIDEREAL_DAY_PER_SEC: f64 = 86_164.0905;
    /// 1 day per second
    pub const DAY_PER_SEC: f64 = 86400.0;
    /// 1 week per second
    pub const WEEK_PER_SEC: f64 = 7.0 * 86400.0;
    /// 1 year per second
    pub const YEAR_PER_SEC: f64 = 365.25 * 86400.0;
}
