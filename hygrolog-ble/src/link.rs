//! btleplug-backed Link Manager
//!
//! ## Overview
//!
//! [`BleLink`] owns the connection to one peripheral and implements the core
//! [`SensorLink`] contract over btleplug: scoped bring-up bounded by a single
//! timeout, single-attempt characteristic reads, and notification delivery
//! through a single-consumer channel.
//!
//! ## Serialization
//!
//! GATT operations are serialized by the radio stack, so the link never
//! issues two characteristic operations concurrently on one connection.
//! Every trait method takes `&mut self`, which makes that queueing a
//! compile-time property rather than a runtime convention. The one spawned
//! task - the notification pump - only forwards stream events into the
//! channel and performs no GATT calls of its own.
//!
//! ## Connection Bring-Up
//!
//! ```text
//! connect(timeout)
//!   └─ tokio::time::timeout
//!        ├─ adapter discovery
//!        ├─ scan filtered on Environmental Sensing
//!        ├─ locate peripheral by address
//!        ├─ peripheral.connect()
//!        └─ discover_services()
//! ```
//!
//! The deadline covers the whole bring-up; a device that advertises slowly
//! and then stalls during service discovery still fails within `timeout`.
//! A bring-up that fails or is cancelled after the radio-level connect
//! succeeded still releases the connection before the error is returned.

use std::time::Duration;

use async_trait::async_trait;
use btleplug::api::{
    Central, CharPropFlags, Characteristic, Manager as _, Peripheral as _, ScanFilter,
};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures::StreamExt;
use log::{debug, info, trace, warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use hygrolog_core::{LinkError, Notification, SensorChannel, SensorLink};

use crate::{
    BATTERY_CHAR, ENVIRONMENTAL_SENSING_SERVICE, HUMIDITY_CHAR, TEMPERATURE_CHAR,
};

/// Delay between peripheral-list polls while scanning
const SCAN_POLL: Duration = Duration::from_millis(200);

/// Depth of the notification channel; generous for a sub-Hz sensor
const NOTIFICATION_QUEUE: usize = 32;

/// Standard UUID for a measurement channel
fn channel_uuid(channel: SensorChannel) -> Uuid {
    match channel {
        SensorChannel::Temperature => TEMPERATURE_CHAR,
        SensorChannel::Humidity => HUMIDITY_CHAR,
        SensorChannel::Battery => BATTERY_CHAR,
    }
}

/// One characteristic of a discovered service
#[derive(Debug, Clone)]
pub struct CharacteristicInfo {
    /// Characteristic UUID
    pub uuid: Uuid,
    /// GATT property flags (READ, NOTIFY, ...)
    pub properties: CharPropFlags,
}

/// One service discovered on the connected peripheral
#[derive(Debug, Clone)]
pub struct ServiceInfo {
    /// Service UUID
    pub uuid: Uuid,
    /// Whether the device marks this as a primary service
    pub primary: bool,
    /// Characteristics the service exposes
    pub characteristics: Vec<CharacteristicInfo>,
}

/// BLE link to a single environmental sensor
pub struct BleLink {
    device_id: String,
    peripheral: Option<Peripheral>,
    pump: Option<JoinHandle<()>>,
}

impl BleLink {
    /// Create an unconnected link targeting `device_id` (MAC address string)
    pub fn new(device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            peripheral: None,
            pump: None,
        }
    }

    /// List the services and characteristics of the connected peripheral
    ///
    /// Debugging aid for bringing up a new device: shows what the firmware
    /// actually exposes without reading any values.
    pub fn discover(&self) -> Result<Vec<ServiceInfo>, LinkError> {
        let peripheral = self.peripheral.as_ref().ok_or(LinkError::NotConnected)?;
        Ok(peripheral
            .services()
            .into_iter()
            .map(|service| ServiceInfo {
                uuid: service.uuid,
                primary: service.primary,
                characteristics: service
                    .characteristics
                    .into_iter()
                    .map(|c| CharacteristicInfo {
                        uuid: c.uuid,
                        properties: c.properties,
                    })
                    .collect(),
            })
            .collect())
    }

    fn connect_error(&self, reason: impl ToString) -> LinkError {
        LinkError::Connect {
            device: self.device_id.clone(),
            reason: reason.to_string(),
        }
    }

    async fn bring_up(&mut self) -> Result<(), LinkError> {
        let manager = Manager::new().await.map_err(|e| self.connect_error(e))?;
        let adapter = manager
            .adapters()
            .await
            .map_err(|e| self.connect_error(e))?
            .into_iter()
            .next()
            .ok_or_else(|| self.connect_error("no Bluetooth adapter present"))?;

        adapter
            .start_scan(ScanFilter {
                services: vec![ENVIRONMENTAL_SENSING_SERVICE],
            })
            .await
            .map_err(|e| self.connect_error(e))?;
        debug!("scanning for {}", self.device_id);

        let peripheral = self.locate(&adapter).await?;
        if let Err(e) = adapter.stop_scan().await {
            warn!("failed to stop scan: {e}");
        }

        peripheral.connect().await.map_err(|e| self.connect_error(e))?;
        // Held from this point on: if discovery fails or the caller's timeout
        // cancels this future, the radio-level link can still be released.
        // Dropping a Peripheral does not tear down the OS connection.
        self.peripheral = Some(peripheral.clone());
        peripheral
            .discover_services()
            .await
            .map_err(|e| self.connect_error(e))?;

        info!("connected to {}", self.device_id);
        Ok(())
    }

    /// Poll the adapter until the target address shows up
    ///
    /// Unbounded by itself; the caller's connect timeout bounds it.
    async fn locate(&self, adapter: &Adapter) -> Result<Peripheral, LinkError> {
        loop {
            let peripherals = adapter
                .peripherals()
                .await
                .map_err(|e| self.connect_error(e))?;
            for peripheral in peripherals {
                if peripheral
                    .address()
                    .to_string()
                    .eq_ignore_ascii_case(&self.device_id)
                {
                    return Ok(peripheral);
                }
            }
            tokio::time::sleep(SCAN_POLL).await;
        }
    }

    /// Look up the characteristic backing a channel on the live connection
    fn characteristic(
        &self,
        channel: SensorChannel,
    ) -> Result<(&Peripheral, Characteristic), LinkError> {
        let peripheral = self.peripheral.as_ref().ok_or(LinkError::NotConnected)?;
        let characteristic = peripheral
            .characteristics()
            .into_iter()
            .find(|c| c.uuid == channel_uuid(channel))
            .ok_or(LinkError::CharacteristicMissing { channel })?;
        Ok((peripheral, characteristic))
    }
}

#[async_trait]
impl SensorLink for BleLink {
    async fn connect(&mut self, timeout: Duration) -> Result<(), LinkError> {
        let result = match tokio::time::timeout(timeout, self.bring_up()).await {
            Ok(result) => result,
            Err(_) => Err(LinkError::ConnectTimeout(timeout)),
        };
        if result.is_err() {
            // Bring-up may have reached the radio-level connect before
            // failing or being cancelled; release whatever it left behind.
            if let Some(peripheral) = self.peripheral.take() {
                if let Err(e) = peripheral.disconnect().await {
                    warn!("cleanup disconnect failed: {e}");
                }
            }
        }
        result
    }

    async fn read(&mut self, channel: SensorChannel) -> Result<Vec<u8>, LinkError> {
        let (peripheral, characteristic) = self.characteristic(channel)?;
        peripheral
            .read(&characteristic)
            .await
            .map_err(|e| LinkError::Read {
                channel,
                reason: e.to_string(),
            })
    }

    async fn subscribe(&mut self, channel: SensorChannel) -> Result<(), LinkError> {
        let (peripheral, characteristic) = self.characteristic(channel)?;
        if !characteristic.properties.contains(CharPropFlags::NOTIFY) {
            return Err(LinkError::NotifyUnsupported { channel });
        }
        peripheral
            .subscribe(&characteristic)
            .await
            .map_err(|e| LinkError::Subscribe {
                channel,
                reason: e.to_string(),
            })?;
        info!("{channel} notifications enabled");
        Ok(())
    }

    async fn unsubscribe(&mut self, channel: SensorChannel) -> Result<(), LinkError> {
        let (peripheral, characteristic) = self.characteristic(channel)?;
        peripheral
            .unsubscribe(&characteristic)
            .await
            .map_err(|e| LinkError::Unsubscribe {
                channel,
                reason: e.to_string(),
            })?;
        debug!("{channel} notifications disabled");
        Ok(())
    }

    async fn notifications(&mut self) -> Result<mpsc::Receiver<Notification>, LinkError> {
        let peripheral = self.peripheral.as_ref().ok_or(LinkError::NotConnected)?;
        let mut stream =
            peripheral
                .notifications()
                .await
                .map_err(|e| LinkError::NotificationStream {
                    reason: e.to_string(),
                })?;

        let (tx, rx) = mpsc::channel(NOTIFICATION_QUEUE);
        let pump = tokio::spawn(async move {
            while let Some(event) = stream.next().await {
                let channel = if event.uuid == TEMPERATURE_CHAR {
                    SensorChannel::Temperature
                } else if event.uuid == HUMIDITY_CHAR {
                    SensorChannel::Humidity
                } else if event.uuid == BATTERY_CHAR {
                    SensorChannel::Battery
                } else {
                    trace!("ignoring notification from {}", event.uuid);
                    continue;
                };
                let forwarded = tx
                    .send(Notification {
                        channel,
                        payload: event.value,
                    })
                    .await;
                if forwarded.is_err() {
                    // Consumer hung up; the session is over
                    break;
                }
            }
        });

        if let Some(previous) = self.pump.replace(pump) {
            previous.abort();
        }
        Ok(rx)
    }

    async fn disconnect(&mut self) -> Result<(), LinkError> {
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
        let Some(peripheral) = self.peripheral.take() else {
            return Ok(());
        };
        peripheral
            .disconnect()
            .await
            .map_err(|e| LinkError::Disconnect {
                reason: e.to_string(),
            })?;
        info!("disconnected from {}", self.device_id);
        Ok(())
    }
}
