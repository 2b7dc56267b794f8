//! Calendar-year source for counter keys.

use chrono::{Datelike, Utc};

/// Supplies the current calendar year.
pub trait Clock: Send + Sync {
    fn current_year(&self) -> i32;
}

/// Wall clock (UTC).
#[derive(Debug, Default, Copy, Clone)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn current_year(&self) -> i32 {
        Utc::now().year()
    }
}

/// Clock pinned to one year (tests, replays).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FixedClock(pub i32);

impl Clock for FixedClock {
    fn current_year(&self) -> i32 {
        self.0
    }
}
