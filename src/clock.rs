use chrono::{Local, NaiveDateTime};

/// Storage format for all persisted timestamps. Local time, space separator.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

pub fn format_timestamp(at: NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Deterministic clock for tests: every call advances by a fixed step, so
/// consecutive writes get strictly increasing timestamps.
#[cfg(test)]
pub struct StepClock {
    start: NaiveDateTime,
    step_secs: i64,
    ticks: std::sync::atomic::AtomicI64,
}

#[cfg(test)]
impl StepClock {
    pub fn new() -> Self {
        let start = chrono::NaiveDate::from_ymd_opt(2025, 6, 1)
            .expect("valid date")
            .and_hms_opt(12, 0, 0)
            .expect("valid time");
        Self {
            start,
            step_secs: 60,
            ticks: std::sync::atomic::AtomicI64::new(0),
        }
    }
}

#[cfg(test)]
impl Clock for StepClock {
    fn now(&self) -> NaiveDateTime {
        let tick = self
            .ticks
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.start + chrono::Duration::seconds(tick * self.step_secs)
    }
}
