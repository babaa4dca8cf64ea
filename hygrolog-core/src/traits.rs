//! Link Abstraction for Sensor Acquisition
//!
//! ## Overview
//!
//! The acquisition orchestrator talks to the device through the [`SensorLink`]
//! trait rather than a concrete radio stack. This keeps the core crate free of
//! BLE backend types, lets tests drive the orchestrator with a scripted mock,
//! and pins down the concurrency contract in one place.
//!
//! ## Concurrency Contract
//!
//! GATT operations are serialized by the radio: a link never has two
//! characteristic operations in flight on one connection. The trait encodes
//! this by taking `&mut self` on every operation - callers cannot overlap
//! requests without an explicit queue of their own.
//!
//! ## Notifications as Messages
//!
//! Incoming notifications are not delivered through shared-closure callbacks.
//! The link forwards them into a single-consumer channel; the orchestrator
//! drains that channel in arrival order. No reordering, no batching, no
//! shared mutable capture.
//!
//! ```text
//! Device ──notify──▶ Link pump ──mpsc──▶ Orchestrator ──▶ Fusion ──▶ Store
//! ```

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::errors::LinkError;

/// The three measurement channels a supported device exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorChannel {
    /// Signed 16-bit little-endian, hundredths of a degree Celsius
    Temperature,
    /// Unsigned 16-bit little-endian, hundredths of a percent
    Humidity,
    /// Unsigned 8-bit percentage
    Battery,
}

impl SensorChannel {
    /// Human-readable channel name
    pub const fn name(&self) -> &'static str {
        match self {
            SensorChannel::Temperature => "temperature",
            SensorChannel::Humidity => "humidity",
            SensorChannel::Battery => "battery",
        }
    }

    /// Unit of the decoded value
    pub const fn unit(&self) -> &'static str {
        match self {
            SensorChannel::Temperature => "°C",
            SensorChannel::Humidity => "%",
            SensorChannel::Battery => "%",
        }
    }
}

impl fmt::Display for SensorChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One raw notification pushed by the device
///
/// Payloads stay undecoded here; decoding happens in the orchestrator so a
/// malformed payload is an isolated, logged failure rather than a dead pump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Channel the notification belongs to
    pub channel: SensorChannel,
    /// Raw characteristic value
    pub payload: Vec<u8>,
}

/// Async link to a single environmental sensor
///
/// Implementations own the device connection and must release it on
/// `disconnect`. All operations are single-attempt: retry policy, if any,
/// belongs to the caller.
#[async_trait]
pub trait SensorLink: Send {
    /// Establish the connection, bounded by `timeout`
    ///
    /// Fails with [`LinkError::Connect`] when the device cannot be reached
    /// and [`LinkError::ConnectTimeout`] when the deadline elapses first.
    async fn connect(&mut self, timeout: Duration) -> Result<(), LinkError>;

    /// Read a characteristic value once
    ///
    /// Each channel is read independently so one failure does not block the
    /// others.
    async fn read(&mut self, channel: SensorChannel) -> Result<Vec<u8>, LinkError>;

    /// Enable notifications for a channel
    ///
    /// Fails with [`LinkError::NotifyUnsupported`] when the characteristic
    /// lacks the NOTIFY property.
    async fn subscribe(&mut self, channel: SensorChannel) -> Result<(), LinkError>;

    /// Disable notifications for a channel
    async fn unsubscribe(&mut self, channel: SensorChannel) -> Result<(), LinkError>;

    /// Open the single-consumer notification channel
    ///
    /// Notifications for all subscribed channels arrive here in the order the
    /// device sent them.
    async fn notifications(&mut self) -> Result<mpsc::Receiver<Notification>, LinkError>;

    /// Release the connection
    async fn disconnect(&mut self) -> Result<(), LinkError>;
}
