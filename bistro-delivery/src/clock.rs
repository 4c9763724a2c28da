use chrono::{DateTime, Local, Timelike, Utc};

/// Source of wall-clock time for rush-hour lookups and default scheduling
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Hour of day in the restaurant's local time
    fn local_hour(&self) -> u32;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn local_hour(&self) -> u32 {
        Local::now().hour()
    }
}

/// Frozen clock for tests and replays
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    pub now: DateTime<Utc>,
    pub hour: u32,
}

impl FixedClock {
    pub fn at_hour(hour: u32) -> Self {
        Self { now: Utc::now(), hour: hour % 24 }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn local_hour(&self) -> u32 {
        self.hour
    }
}
