/*!
Decoded readings and the snapshots handed to query callers.
*/

use crate::unit::ForceUnit;
use serde::Serialize;
use std::time::{Duration, Instant};

/// One successfully decoded frame. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub value: f64,
    pub unit: ForceUnit,
    pub timestamp: Instant,
}

impl Reading {
    /// Create a reading stamped with the current time
    pub fn new(value: f64, unit: ForceUnit) -> Self {
        Self::at(value, unit, Instant::now())
    }

    /// Create a reading with an explicit timestamp
    pub fn at(value: f64, unit: ForceUnit, timestamp: Instant) -> Self {
        Self {
            value,
            unit,
            timestamp,
        }
    }

    /// Time elapsed since this reading was decoded
    pub fn age(&self) -> Duration {
        self.timestamp.elapsed()
    }
}

/// Latest reading as seen by a query caller.
///
/// Before the first frame completes the snapshot is absent: `value` is 0,
/// `unit` is `None` and `age` is [`Duration::MAX`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Snapshot {
    pub value: f64,
    pub unit: Option<ForceUnit>,
    #[serde(rename = "age_seconds", serialize_with = "serialize_secs")]
    pub age: Duration,
}

impl Snapshot {
    /// Snapshot reported while no frame has been decoded yet
    pub const ABSENT: Snapshot = Snapshot {
        value: 0.0,
        unit: None,
        age: Duration::MAX,
    };

    /// Snapshot of `reading` taken at `now`
    pub fn of(reading: &Reading, now: Instant) -> Self {
        Self {
            value: reading.value,
            unit: Some(reading.unit),
            age: now.saturating_duration_since(reading.timestamp),
        }
    }

    /// Whether any frame has been decoded yet
    pub fn has_data(&self) -> bool {
        self.unit.is_some()
    }

    /// Age in seconds, as reported by the query API
    pub fn age_secs(&self) -> f64 {
        self.age.as_secs_f64()
    }

    /// Whether the reading is older than `max_age` (always true when absent)
    pub fn is_stale(&self, max_age: Duration) -> bool {
        self.age > max_age
    }

    /// Convert the snapshot to newtons
    pub fn to_force(&self) -> ForceReading {
        let newtons = match self.unit {
            Some(unit) => unit.to_newtons(self.value),
            None => self.value,
        };
        ForceReading {
            newtons,
            age: self.age,
        }
    }
}

/// Force in newtons plus the age of the reading it came from
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForceReading {
    pub newtons: f64,
    #[serde(rename = "age_seconds", serialize_with = "serialize_secs")]
    pub age: Duration,
}

impl ForceReading {
    /// Age in seconds, as reported by the query API
    pub fn age_secs(&self) -> f64 {
        self.age.as_secs_f64()
    }
}

fn serialize_secs<S: serde::Serializer>(age: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_f64(age.as_secs_f64())
}
