//! Core acquisition engine for Hygrolog
//!
//! Turns raw GATT payloads from a single BLE environmental sensor into a
//! small, durable, bounded history of composite readings. The crate holds
//! everything that does not touch a radio: the binary decoder, the fusion
//! state machine that pairs independently-arriving temperature and humidity
//! events, and the SQLite-backed ring store that keeps only the most recent
//! readings.
//!
//! Key constraints:
//! - A persisted [`Reading`] always carries both temperature and humidity;
//!   partial state lives only in [`ReadingFuser`] and is deliberately lost
//!   on shutdown.
//! - The store never exceeds its configured capacity after a completed save,
//!   even under concurrent writers.
//! - Nothing in this crate terminates the process; failures surface as
//!   `Result`s for the caller to handle.
//!
//! ```no_run
//! use hygrolog_core::{MonitorConfig, RingStore};
//!
//! let config = MonitorConfig::default().with_device_id("A4:C1:38:00:00:00");
//! let store = RingStore::open(&config.db_path, config.capacity).unwrap();
//!
//! // Latest composite reading, if any acquisition has completed
//! match store.latest() {
//!     Ok(Some(reading)) => println!("{:.2} °C", reading.temperature),
//!     Ok(None) => println!("no data yet"),
//!     Err(e) => eprintln!("store error: {e}"),
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod decode;
pub mod errors;
pub mod fusion;
pub mod reading;
pub mod store;
pub mod traits;

// Public API
pub use config::MonitorConfig;
pub use decode::{decode_battery, decode_humidity, decode_temperature};
pub use errors::{DecodeError, LinkError, StoreError};
pub use fusion::{FusionState, ReadingFuser};
pub use reading::Reading;
pub use store::RingStore;
pub use traits::{Notification, SensorChannel, SensorLink};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
