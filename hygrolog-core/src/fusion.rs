//! Reading Fusion State Machine
//!
//! ## Overview
//!
//! In continuous acquisition the device pushes temperature and humidity as
//! independent notifications, at its own pace and in no guaranteed order. The
//! fusion state machine pairs them into one composite [`Reading`]:
//!
//! ```text
//!            temperature                   humidity
//!                │                            │
//!  Empty ───────┴──▶ PartialTemperature ─────┴──▶ (Complete) ──▶ emit + reset
//!    │                                                              │
//!    └──────────▶ PartialHumidity ──▶ (Complete) ──▶ emit + reset ──┘
//! ```
//!
//! `Complete` is transient: it is entered and left within a single
//! `offer_*` call, so the observable states are only [`FusionState::Empty`],
//! [`FusionState::PartialTemperature`] and [`FusionState::PartialHumidity`].
//!
//! ## Rules
//!
//! - A value whose counterpart is already held emits a composite reading
//!   (timestamp = now, battery = last known or absent) and resets to `Empty`.
//! - A value of the same kind as the held partial overwrites it; the machine
//!   stays in the same partial state.
//! - A partial older than the configured `max_partial_age` is discarded
//!   before the transition runs, so a stale temperature can never fuse with
//!   a much newer humidity into a time-skewed composite. The source behavior
//!   had no such bound; the bound is deliberate and configurable.
//! - Whatever partial state remains at shutdown is dropped, never flushed.
//!   That bounded data loss is intentional.
//!
//! The machine is pure: callers pass `now` explicitly, which keeps every
//! transition, including staleness, fully deterministic under test.

use std::time::Duration;

use chrono::{DateTime, Utc};
use log::debug;

use crate::reading::Reading;

/// Observable fusion states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FusionState {
    /// No partial value held
    Empty,
    /// Temperature held, waiting for humidity
    PartialTemperature,
    /// Humidity held, waiting for temperature
    PartialHumidity,
}

/// Pairs independently-arriving measurements into composite readings
#[derive(Debug, Clone)]
pub struct ReadingFuser {
    device_id: String,
    max_partial_age: Duration,
    temperature: Option<f64>,
    humidity: Option<f64>,
    battery: Option<u8>,
    last_update: Option<DateTime<Utc>>,
}

impl ReadingFuser {
    /// Create an empty fuser for one device
    pub fn new(device_id: impl Into<String>, max_partial_age: Duration) -> Self {
        Self {
            device_id: device_id.into(),
            max_partial_age,
            temperature: None,
            humidity: None,
            battery: None,
            last_update: None,
        }
    }

    /// Current observable state
    pub fn state(&self) -> FusionState {
        match (self.temperature, self.humidity) {
            (Some(_), None) => FusionState::PartialTemperature,
            (None, Some(_)) => FusionState::PartialHumidity,
            _ => FusionState::Empty,
        }
    }

    /// Record the last known battery level
    ///
    /// Battery is not part of the pairing rule; it rides along on whatever
    /// composite is emitted next.
    pub fn note_battery(&mut self, level: u8) {
        self.battery = Some(level);
    }

    /// Offer a decoded temperature value
    ///
    /// Returns a composite reading when a humidity partial was waiting.
    pub fn offer_temperature(&mut self, value: f64, now: DateTime<Utc>) -> Option<Reading> {
        self.discard_stale(now);
        if let Some(humidity) = self.humidity {
            return Some(self.emit(value, humidity, now));
        }
        self.temperature = Some(value);
        self.last_update = Some(now);
        None
    }

    /// Offer a decoded humidity value
    ///
    /// Returns a composite reading when a temperature partial was waiting.
    pub fn offer_humidity(&mut self, value: f64, now: DateTime<Utc>) -> Option<Reading> {
        self.discard_stale(now);
        if let Some(temperature) = self.temperature {
            return Some(self.emit(temperature, value, now));
        }
        self.humidity = Some(value);
        self.last_update = Some(now);
        None
    }

    /// Drop any partial state
    pub fn reset(&mut self) {
        self.temperature = None;
        self.humidity = None;
        self.last_update = None;
    }

    fn emit(&mut self, temperature: f64, humidity: f64, now: DateTime<Utc>) -> Reading {
        self.reset();
        Reading::new(now, self.device_id.clone(), temperature, humidity, self.battery)
    }

    /// Drop a held partial that has outlived the fusion window
    fn discard_stale(&mut self, now: DateTime<Utc>) {
        let Some(last) = self.last_update else {
            return;
        };
        let expired = now
            .signed_duration_since(last)
            .to_std()
            .map(|age| age > self.max_partial_age)
            .unwrap_or(false);
        if expired {
            debug!(
                "discarding stale partial ({:?}) older than {:?}",
                self.state(),
                self.max_partial_age
            );
            self.reset();
        }
    }
}
