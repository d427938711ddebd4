use chrono::{DateTime, TimeDelta, Utc};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatermarkStatus {
    OnTime,
    Expired,
}

impl WatermarkStatus {
    pub fn is_expired(&self) -> bool {
        matches!(self, WatermarkStatus::Expired)
    }
}

impl From<WatermarkStatus> for Value {
    fn from(value: WatermarkStatus) -> Self {
        Value::Bool(value.is_expired())
    }
}

/// Event-time watermark: the maximum timestamp seen so far minus a fixed
/// delay. Records older than the watermark are expired.
#[derive(Debug, Clone, PartialEq)]
pub struct Watermark {
    delay: TimeDelta,
    max_event_time: Option<DateTime<Utc>>,
}

impl Default for Watermark {
    fn default() -> Self {
        Self::new(TimeDelta::minutes(2))
    }
}

impl Watermark {
    pub fn new(delay: TimeDelta) -> Self {
        Self {
            delay,
            max_event_time: None,
        }
    }

    pub fn delay(&self) -> TimeDelta {
        self.delay
    }

    pub fn max_event_time(&self) -> Option<DateTime<Utc>> {
        self.max_event_time
    }

    pub fn current(&self) -> Option<DateTime<Utc>> {
        self.max_event_time.map(|max| max - self.delay)
    }

    /// Restores the maximum event time, e.g. from a checkpoint.
    pub fn restore(&mut self, max_event_time: Option<DateTime<Utc>>) {
        self.max_event_time = max_event_time;
    }

    /// Classifies a record against the watermark as it stood before the
    /// record, then advances it. A record without event time is on time and
    /// leaves the watermark untouched.
    pub fn observe(&mut self, event_time: Option<DateTime<Utc>>) -> WatermarkStatus {
        let Some(event_time) = event_time else {
            return WatermarkStatus::OnTime;
        };

        let status = match self.current() {
            Some(watermark) if event_time < watermark => WatermarkStatus::Expired,
            _ => WatermarkStatus::OnTime,
        };

        if self.max_event_time.map_or(true, |max| event_time > max) {
            self.max_event_time = Some(event_time);
        }

        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(minute: u32, second: u32) -> Option<DateTime<Utc>> {
        Some(Utc.with_ymd_and_hms(2024, 1, 1, 8, minute, second).unwrap())
    }

    #[test]
    fn expires_records_more_than_two_minutes_behind() {
        let mut watermark = Watermark::default();

        assert_eq!(watermark.observe(at(10, 0)), WatermarkStatus::OnTime);
        assert_eq!(watermark.observe(at(8, 0)), WatermarkStatus::OnTime);
        assert_eq!(watermark.observe(at(7, 59)), WatermarkStatus::Expired);
        assert_eq!(watermark.max_event_time(), at(10, 0));
    }

    #[test]
    fn late_records_do_not_move_the_watermark_back() {
        let mut watermark = Watermark::default();

        watermark.observe(at(10, 0));
        watermark.observe(at(5, 0));

        assert_eq!(watermark.current(), at(8, 0));
    }

    #[test]
    fn null_event_time_is_on_time() {
        let mut watermark = Watermark::default();
        watermark.observe(at(10, 0));

        assert_eq!(watermark.observe(None), WatermarkStatus::OnTime);
        assert_eq!(watermark.max_event_time(), at(10, 0));
    }
}
