//! Acquisition Orchestrator
//!
//! ## Overview
//!
//! [`Acquisition`] composes the link, the decoder, the fusion state machine
//! and the ring store into the two acquisition modes. It is generic over
//! [`SensorLink`] so the whole control flow runs under test against a
//! scripted mock with no radio in sight.
//!
//! ## Mode Semantics
//!
//! **One-shot** is strict: temperature, humidity and battery are read
//! independently (one failure never aborts the others), but a composite
//! reading is produced and persisted only when *both* temperature and
//! humidity succeeded. Battery failure never voids the attempt.
//!
//! **Continuous** is tolerant: measurements arrive asynchronously and a
//! missing notification just leaves the fusion partial until its counterpart
//! shows up. Every completed fusion is saved immediately. The loop idles on a
//! fixed tick so the caller's shutdown signal is observed even when the
//! device goes quiet, and the session always ends with unsubscribe plus
//! disconnect - partial fusion state is discarded, not flushed.
//!
//! Persistence failures are logged and never abort a session; the store
//! signals them, the orchestrator decides, and here the decision is to keep
//! acquiring.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use log::{debug, info, trace, warn};

use hygrolog_core::{
    decode_battery, decode_humidity, decode_temperature, DecodeError, FusionState, LinkError,
    MonitorConfig, Notification, Reading, ReadingFuser, RingStore, SensorChannel, SensorLink,
    StoreError,
};

/// Orchestrates one device's acquisition against a shared ring store
pub struct Acquisition<L: SensorLink> {
    link: L,
    store: Arc<RingStore>,
    config: MonitorConfig,
}

impl<L: SensorLink> Acquisition<L> {
    /// Build an orchestrator from its collaborators
    pub fn new(link: L, store: Arc<RingStore>, config: MonitorConfig) -> Self {
        Self {
            link,
            store,
            config,
        }
    }

    /// Shared store handle, the query surface for external collaborators
    pub fn store(&self) -> &Arc<RingStore> {
        &self.store
    }

    /// Latest persisted reading, if any
    pub fn latest(&self) -> Result<Option<Reading>, StoreError> {
        self.store.latest()
    }

    /// Most-recent persisted readings, newest first
    pub fn recent(&self, limit: usize) -> Result<Vec<Reading>, StoreError> {
        self.store.recent(limit)
    }

    /// Connect, read all three measurements once, persist when complete
    ///
    /// Returns `Ok(None)` when temperature or humidity could not be obtained;
    /// nothing is persisted in that case. The connection is released on every
    /// exit path.
    ///
    /// # Errors
    ///
    /// Only connection establishment reports an error; per-measurement
    /// failures are isolated and logged.
    pub async fn one_shot_read(&mut self) -> Result<Option<Reading>, LinkError> {
        self.link.connect(self.config.connect_timeout).await?;
        let outcome = self.one_shot_inner().await;
        if let Err(e) = self.link.disconnect().await {
            warn!("disconnect after one-shot read failed: {e}");
        }
        Ok(outcome)
    }

    async fn one_shot_inner(&mut self) -> Option<Reading> {
        let temperature = self.read_decoded(SensorChannel::Temperature, decode_temperature).await;
        let humidity = self.read_decoded(SensorChannel::Humidity, decode_humidity).await;
        let battery = self.read_decoded(SensorChannel::Battery, decode_battery).await;

        let (Some(temperature), Some(humidity)) = (temperature, humidity) else {
            info!("incomplete measurement pair; nothing persisted");
            return None;
        };

        let reading = Reading::new(
            Utc::now(),
            self.config.device_id.clone(),
            temperature,
            humidity,
            battery,
        );
        self.persist(&reading);
        Some(reading)
    }

    /// Read one channel and decode it, isolating any failure into `None`
    async fn read_decoded<T>(
        &mut self,
        channel: SensorChannel,
        decode: fn(&[u8]) -> Result<T, DecodeError>,
    ) -> Option<T> {
        let payload = match self.link.read(channel).await {
            Ok(payload) => payload,
            Err(e) => {
                warn!("{channel} read failed: {e}");
                return None;
            }
        };
        match decode(&payload) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("{channel} decode failed: {e}");
                None
            }
        }
    }

    /// Connect, subscribe, and fuse notifications until `shutdown` fires
    ///
    /// The session ends with unsubscribe and disconnect on every exit path;
    /// partial fusion state is discarded.
    ///
    /// # Errors
    ///
    /// Connection, subscription and notification-stream setup errors abort
    /// the session. Decode and persistence failures do not.
    pub async fn continuous_monitor<F>(&mut self, shutdown: F) -> Result<(), LinkError>
    where
        F: Future<Output = ()>,
    {
        self.link.connect(self.config.connect_timeout).await?;
        let outcome = self.monitor_session(shutdown).await;
        for channel in [SensorChannel::Temperature, SensorChannel::Humidity] {
            if let Err(e) = self.link.unsubscribe(channel).await {
                warn!("{channel} unsubscribe failed: {e}");
            }
        }
        if let Err(e) = self.link.disconnect().await {
            warn!("disconnect after monitoring failed: {e}");
        }
        outcome
    }

    async fn monitor_session<F>(&mut self, shutdown: F) -> Result<(), LinkError>
    where
        F: Future<Output = ()>,
    {
        let mut fuser = ReadingFuser::new(&self.config.device_id, self.config.max_partial_age);

        // Battery does not notify on this device class; read it once so it
        // rides along on every composite as "last known".
        if let Some(level) = self.read_decoded(SensorChannel::Battery, decode_battery).await {
            fuser.note_battery(level);
        }

        // Stream first, then subscribe: a notification pushed the instant the
        // device is subscribed already has a consumer and cannot be dropped.
        let mut events = self.link.notifications().await?;
        self.link.subscribe(SensorChannel::Temperature).await?;
        self.link.subscribe(SensorChannel::Humidity).await?;

        let mut ticker = tokio::time::interval(self.config.poll_interval);
        tokio::pin!(shutdown);
        info!("monitoring {}", self.config.device_id);

        loop {
            tokio::select! {
                // Pending notifications drain before a shutdown is honored,
                // keeping arrival-order processing strict.
                biased;

                event = events.recv() => match event {
                    Some(notification) => self.handle_notification(&mut fuser, notification),
                    None => {
                        warn!("notification stream ended");
                        break;
                    }
                },
                _ = &mut shutdown => {
                    info!("shutdown requested");
                    break;
                }
                _ = ticker.tick() => {
                    trace!("idle tick");
                }
            }
        }

        if fuser.state() != FusionState::Empty {
            debug!("discarding partial fusion state at session end: {:?}", fuser.state());
        }
        Ok(())
    }

    /// Decode one notification, advance fusion, persist any completed pair
    fn handle_notification(&self, fuser: &mut ReadingFuser, notification: Notification) {
        let now = Utc::now();
        let completed = match notification.channel {
            SensorChannel::Temperature => match decode_temperature(&notification.payload) {
                Ok(value) => {
                    debug!("temperature update: {value:.2} °C");
                    fuser.offer_temperature(value, now)
                }
                Err(e) => {
                    warn!("temperature notification undecodable: {e}");
                    None
                }
            },
            SensorChannel::Humidity => match decode_humidity(&notification.payload) {
                Ok(value) => {
                    debug!("humidity update: {value:.2} %");
                    fuser.offer_humidity(value, now)
                }
                Err(e) => {
                    warn!("humidity notification undecodable: {e}");
                    None
                }
            },
            SensorChannel::Battery => {
                match decode_battery(&notification.payload) {
                    Ok(level) => fuser.note_battery(level),
                    Err(e) => warn!("battery notification undecodable: {e}"),
                }
                None
            }
        };

        if let Some(reading) = completed {
            self.persist(&reading);
        }
    }

    /// Save a reading, downgrading failure to a warning
    fn persist(&self, reading: &Reading) {
        match self.store.save(reading) {
            Ok(()) => info!(
                "persisted reading: {:.2} °C, {:.2} %",
                reading.temperature, reading.humidity
            ),
            Err(e) => warn!("failed to persist reading: {e}"),
        }
    }
}
