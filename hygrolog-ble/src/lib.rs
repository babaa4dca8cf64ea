//! BLE Acquisition for Hygrolog
//!
//! ## Overview
//!
//! This crate owns everything that touches the radio: a btleplug-backed
//! implementation of the core [`SensorLink`](hygrolog_core::SensorLink)
//! trait, and the acquisition orchestrator that composes link, decoder,
//! fusion and store into the two acquisition modes.
//!
//! ```text
//! Orchestrator ──▶ BleLink ──▶ Decoder ──▶ Fusion ──▶ RingStore
//!                                (continuous mode only)
//! ```
//!
//! - **One-shot**: connect, read temperature/humidity/battery independently,
//!   persist a composite reading only when both measurements succeeded.
//! - **Continuous**: connect, subscribe both characteristics, fuse
//!   notifications as they arrive, persist every completed pair until the
//!   caller's shutdown future fires.
//!
//! ## Device Surface
//!
//! The supported device class (Xiaomi LYWSD03MMC and other hygrometers
//! running firmware that exposes the standard profile) publishes the
//! Bluetooth SIG Environmental Sensing and Battery services; the UUID
//! constants below are those fixed, standard assignments.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod acquire;
pub mod link;

pub use acquire::Acquisition;
pub use link::{BleLink, CharacteristicInfo, ServiceInfo};

use uuid::Uuid;

/// Environmental Sensing service (0x181A)
pub const ENVIRONMENTAL_SENSING_SERVICE: Uuid =
    Uuid::from_u128(0x0000181a_0000_1000_8000_00805f9b34fb);

/// Temperature characteristic (0x2A6E): sint16 LE, hundredths of °C
pub const TEMPERATURE_CHAR: Uuid = Uuid::from_u128(0x00002a6e_0000_1000_8000_00805f9b34fb);

/// Humidity characteristic (0x2A6F): uint16 LE, hundredths of %
pub const HUMIDITY_CHAR: Uuid = Uuid::from_u128(0x00002a6f_0000_1000_8000_00805f9b34fb);

/// Battery service (0x180F)
pub const BATTERY_SERVICE: Uuid = Uuid::from_u128(0x0000180f_0000_1000_8000_00805f9b34fb);

/// Battery Level characteristic (0x2A19): uint8 percentage
pub const BATTERY_CHAR: Uuid = Uuid::from_u128(0x00002a19_0000_1000_8000_00805f9b34fb);
