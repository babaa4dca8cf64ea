//! Error Types for the Acquisition Path
//!
//! ## Design Philosophy
//!
//! Errors are split by concern rather than pooled into one crate-wide enum,
//! mirroring the failure taxonomy of the acquisition path:
//!
//! 1. **`DecodeError`**: a payload that cannot be decoded. Permanent for that
//!    payload - there is no retry that fixes a two-byte read that arrived
//!    with one byte.
//!
//! 2. **`LinkError`**: everything the radio side can do wrong - connection,
//!    characteristic reads, notification setup. Carried as plain data
//!    (channel names, reason strings) so this crate never depends on a
//!    particular BLE backend.
//!
//! 3. **`StoreError`**: storage I/O. Persistence failure is never fatal to
//!    acquisition; callers log it and keep going.
//!
//! ## Propagation Policy
//!
//! Per-measurement failures are isolated from one another: a failed humidity
//! read does not abort the temperature read. One-shot acquisition voids the
//! whole attempt when temperature or humidity is missing; a missing battery
//! never voids it. Continuous acquisition simply leaves the corresponding
//! fusion field unset until the next notification arrives.

use std::time::Duration;

use thiserror::Error;

use crate::traits::SensorChannel;

/// Payload decode failures - kept small, errors travel through hot paths
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Payload shorter than the encoding requires
    #[error("payload too short: need {needed} bytes, got {got}")]
    TooShort {
        /// Bytes the encoding requires
        needed: usize,
        /// Bytes actually received
        got: usize,
    },
}

/// BLE link failures
///
/// Backend errors are flattened to reason strings so the core crate stays
/// free of radio-stack types. The variants map onto the acquisition failure
/// taxonomy: `Connect`/`ConnectTimeout` (device unreachable), `Read`
/// (characteristic read), `Subscribe`/`NotifyUnsupported`/`NotificationStream`
/// (notification setup), `Unsubscribe`/`Disconnect` (session teardown).
#[derive(Error, Debug)]
pub enum LinkError {
    /// Device could not be reached
    #[error("connection to {device} failed: {reason}")]
    Connect {
        /// Device identifier the connection targeted
        device: String,
        /// Backend-reported reason
        reason: String,
    },

    /// Connection attempt exceeded its deadline
    #[error("connection attempt timed out after {0:?}")]
    ConnectTimeout(Duration),

    /// Operation issued while no connection is held
    #[error("not connected")]
    NotConnected,

    /// Device does not expose the expected characteristic
    #[error("{channel} characteristic not found on device")]
    CharacteristicMissing {
        /// Channel whose characteristic is absent
        channel: SensorChannel,
    },

    /// Single-attempt characteristic read failed
    #[error("{channel} read failed: {reason}")]
    Read {
        /// Channel being read
        channel: SensorChannel,
        /// Backend-reported reason
        reason: String,
    },

    /// Notification subscription could not be established
    #[error("{channel} subscription failed: {reason}")]
    Subscribe {
        /// Channel being subscribed
        channel: SensorChannel,
        /// Backend-reported reason
        reason: String,
    },

    /// Notification unsubscribe failed during teardown
    #[error("{channel} unsubscribe failed: {reason}")]
    Unsubscribe {
        /// Channel being unsubscribed
        channel: SensorChannel,
        /// Backend-reported reason
        reason: String,
    },

    /// Characteristic exists but does not support notifications
    #[error("{channel} characteristic does not support notifications")]
    NotifyUnsupported {
        /// Channel lacking the NOTIFY property
        channel: SensorChannel,
    },

    /// Notification event stream could not be opened
    #[error("notification stream unavailable: {reason}")]
    NotificationStream {
        /// Backend-reported reason
        reason: String,
    },

    /// Disconnect failed; the session still ends
    #[error("disconnect failed: {reason}")]
    Disconnect {
        /// Backend-reported reason
        reason: String,
    },
}

/// Storage failures
#[derive(Error, Debug)]
pub enum StoreError {
    /// Underlying SQLite error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Persisted timestamp that no longer parses as RFC 3339
    #[error("corrupt timestamp in store: {0}")]
    CorruptTimestamp(String),
}
