use crate::ports::clock::Clock as ClockTrait;
use chrono::{DateTime, Utc};

/// システム時刻を返すClock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl ClockTrait for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
