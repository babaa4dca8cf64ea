//! Integration tests for the acquisition orchestrator
//!
//! Drives one-shot and continuous acquisition end to end against a scripted
//! mock link: per-measurement failure isolation, the strict one-shot pairing
//! rule, fusion of asynchronous notifications, and scoped connection release
//! on every exit path.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use hygrolog_core::{
    LinkError, MonitorConfig, Notification, RingStore, SensorChannel, SensorLink,
};
use hygrolog_ble::Acquisition;

const DEVICE: &str = "A4:C1:38:AA:BB:CC";

/// Little-endian encodings of the reference measurements
const TEMP_2536: [u8; 2] = [0xE8, 0x09]; // 25.36 °C
const HUM_6234: [u8; 2] = [0x5A, 0x18]; // 62.34 %
const BATT_77: [u8; 1] = [77];

/// Scripted link: canned read responses, a pre-wired notification channel,
/// and a call log for asserting lifecycle order.
struct MockLink {
    responses: HashMap<SensorChannel, Vec<u8>>,
    notifications: Option<mpsc::Receiver<Notification>>,
    refuse_connect: bool,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockLink {
    fn new() -> Self {
        Self {
            responses: HashMap::new(),
            notifications: None,
            refuse_connect: false,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn respond(mut self, channel: SensorChannel, payload: &[u8]) -> Self {
        self.responses.insert(channel, payload.to_vec());
        self
    }

    fn with_notifications(mut self, rx: mpsc::Receiver<Notification>) -> Self {
        self.notifications = Some(rx);
        self
    }

    fn refusing_connect(mut self) -> Self {
        self.refuse_connect = true;
        self
    }

    fn call_log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.calls)
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }
}

#[async_trait]
impl SensorLink for MockLink {
    async fn connect(&mut self, _timeout: Duration) -> Result<(), LinkError> {
        self.record("connect");
        if self.refuse_connect {
            return Err(LinkError::Connect {
                device: DEVICE.into(),
                reason: "scripted refusal".into(),
            });
        }
        Ok(())
    }

    async fn read(&mut self, channel: SensorChannel) -> Result<Vec<u8>, LinkError> {
        self.record(format!("read {channel}"));
        self.responses
            .get(&channel)
            .cloned()
            .ok_or(LinkError::Read {
                channel,
                reason: "scripted failure".into(),
            })
    }

    async fn subscribe(&mut self, channel: SensorChannel) -> Result<(), LinkError> {
        self.record(format!("subscribe {channel}"));
        Ok(())
    }

    async fn unsubscribe(&mut self, channel: SensorChannel) -> Result<(), LinkError> {
        self.record(format!("unsubscribe {channel}"));
        Ok(())
    }

    async fn notifications(&mut self) -> Result<mpsc::Receiver<Notification>, LinkError> {
        self.record("notifications");
        self.notifications
            .take()
            .ok_or(LinkError::NotificationStream {
                reason: "no scripted stream".into(),
            })
    }

    async fn disconnect(&mut self) -> Result<(), LinkError> {
        self.record("disconnect");
        Ok(())
    }
}

fn config() -> MonitorConfig {
    MonitorConfig::default().with_device_id(DEVICE)
}

fn notify(channel: SensorChannel, payload: &[u8]) -> Notification {
    Notification {
        channel,
        payload: payload.to_vec(),
    }
}

#[tokio::test]
async fn one_shot_persists_complete_reading() {
    let link = MockLink::new()
        .respond(SensorChannel::Temperature, &TEMP_2536)
        .respond(SensorChannel::Humidity, &HUM_6234)
        .respond(SensorChannel::Battery, &BATT_77);
    let calls = link.call_log();
    let store = Arc::new(RingStore::in_memory(3).unwrap());
    let mut acquisition = Acquisition::new(link, Arc::clone(&store), config());

    let reading = acquisition.one_shot_read().await.unwrap().expect("complete pair");
    assert_eq!(reading.temperature, 25.36);
    assert_eq!(reading.humidity, 62.34);
    assert_eq!(reading.battery, Some(77));
    assert_eq!(reading.device_id, DEVICE);

    assert_eq!(store.count().unwrap(), 1);
    assert_eq!(store.latest().unwrap().unwrap(), reading);

    let calls = calls.lock().unwrap();
    assert_eq!(calls.first().map(String::as_str), Some("connect"));
    assert_eq!(calls.last().map(String::as_str), Some("disconnect"));
}

#[tokio::test]
async fn one_shot_voids_attempt_when_humidity_fails() {
    let link = MockLink::new()
        .respond(SensorChannel::Temperature, &TEMP_2536)
        .respond(SensorChannel::Battery, &BATT_77);
    let calls = link.call_log();
    let store = Arc::new(RingStore::in_memory(3).unwrap());
    let mut acquisition = Acquisition::new(link, Arc::clone(&store), config());

    assert!(acquisition.one_shot_read().await.unwrap().is_none());
    // A partial pair yields no Reading and no save call
    assert_eq!(store.count().unwrap(), 0);

    // The failed humidity read did not stop the battery read, and the
    // connection was still released.
    let calls = calls.lock().unwrap();
    assert!(calls.contains(&"read battery".to_string()));
    assert_eq!(calls.last().map(String::as_str), Some("disconnect"));
}

#[tokio::test]
async fn one_shot_tolerates_missing_battery() {
    let link = MockLink::new()
        .respond(SensorChannel::Temperature, &TEMP_2536)
        .respond(SensorChannel::Humidity, &HUM_6234);
    let store = Arc::new(RingStore::in_memory(3).unwrap());
    let mut acquisition = Acquisition::new(link, Arc::clone(&store), config());

    let reading = acquisition.one_shot_read().await.unwrap().expect("complete pair");
    assert_eq!(reading.battery, None);
    assert_eq!(store.count().unwrap(), 1);
}

#[tokio::test]
async fn one_shot_surfaces_connection_failure() {
    let link = MockLink::new().refusing_connect();
    let calls = link.call_log();
    let store = Arc::new(RingStore::in_memory(3).unwrap());
    let mut acquisition = Acquisition::new(link, Arc::clone(&store), config());

    assert!(matches!(
        acquisition.one_shot_read().await,
        Err(LinkError::Connect { .. })
    ));
    assert_eq!(store.count().unwrap(), 0);
    // Nothing to release when the connection never came up
    assert!(!calls.lock().unwrap().contains(&"disconnect".to_string()));
}

#[tokio::test]
async fn continuous_fuses_temperature_then_humidity() {
    let (tx, rx) = mpsc::channel(8);
    tx.send(notify(SensorChannel::Temperature, &TEMP_2536)).await.unwrap();
    tx.send(notify(SensorChannel::Humidity, &HUM_6234)).await.unwrap();
    drop(tx); // stream ends once both are drained

    let link = MockLink::new()
        .respond(SensorChannel::Battery, &BATT_77)
        .with_notifications(rx);
    let calls = link.call_log();
    let store = Arc::new(RingStore::in_memory(3).unwrap());
    let mut acquisition = Acquisition::new(link, Arc::clone(&store), config());

    acquisition.continuous_monitor(std::future::pending()).await.unwrap();

    let readings = store.recent_default().unwrap();
    assert_eq!(readings.len(), 1, "exactly one composite reading");
    assert_eq!(readings[0].temperature, 25.36);
    assert_eq!(readings[0].humidity, 62.34);
    assert_eq!(readings[0].battery, Some(77), "last known battery rides along");

    let calls = calls.lock().unwrap();
    assert!(calls.contains(&"subscribe temperature".to_string()));
    assert!(calls.contains(&"subscribe humidity".to_string()));
    assert!(calls.contains(&"unsubscribe temperature".to_string()));
    assert!(calls.contains(&"unsubscribe humidity".to_string()));
    assert_eq!(calls.last().map(String::as_str), Some("disconnect"));
}

#[tokio::test]
async fn continuous_opens_stream_before_subscribing() {
    let (tx, rx) = mpsc::channel(8);
    tx.send(notify(SensorChannel::Temperature, &TEMP_2536)).await.unwrap();
    tx.send(notify(SensorChannel::Humidity, &HUM_6234)).await.unwrap();
    drop(tx);

    let link = MockLink::new().with_notifications(rx);
    let calls = link.call_log();
    let store = Arc::new(RingStore::in_memory(3).unwrap());
    let mut acquisition = Acquisition::new(link, Arc::clone(&store), config());

    acquisition.continuous_monitor(std::future::pending()).await.unwrap();

    // The consumer must exist before the device is told to notify, or an
    // immediate first notification would have nowhere to go.
    let calls = calls.lock().unwrap();
    let stream = calls.iter().position(|c| c == "notifications").unwrap();
    let first_subscribe = calls
        .iter()
        .position(|c| c.starts_with("subscribe"))
        .unwrap();
    assert!(stream < first_subscribe);
}

#[tokio::test]
async fn continuous_fuses_humidity_then_temperature() {
    let (tx, rx) = mpsc::channel(8);
    tx.send(notify(SensorChannel::Humidity, &HUM_6234)).await.unwrap();
    tx.send(notify(SensorChannel::Temperature, &TEMP_2536)).await.unwrap();
    drop(tx);

    let link = MockLink::new().with_notifications(rx);
    let store = Arc::new(RingStore::in_memory(3).unwrap());
    let mut acquisition = Acquisition::new(link, Arc::clone(&store), config());

    acquisition.continuous_monitor(std::future::pending()).await.unwrap();

    let readings = store.recent_default().unwrap();
    assert_eq!(readings.len(), 1);
    assert_eq!(readings[0].temperature, 25.36);
    assert_eq!(readings[0].humidity, 62.34);
    // Battery read failed (unscripted) and that never voids continuous mode
    assert_eq!(readings[0].battery, None);
}

#[tokio::test]
async fn continuous_lone_temperature_persists_nothing() {
    let (tx, rx) = mpsc::channel(8);
    tx.send(notify(SensorChannel::Temperature, &TEMP_2536)).await.unwrap();
    drop(tx);

    let link = MockLink::new().with_notifications(rx);
    let store = Arc::new(RingStore::in_memory(3).unwrap());
    let mut acquisition = Acquisition::new(link, Arc::clone(&store), config());

    acquisition.continuous_monitor(std::future::pending()).await.unwrap();

    // The unpaired partial is discarded at shutdown, never flushed
    assert_eq!(store.count().unwrap(), 0);
}

#[tokio::test]
async fn continuous_skips_malformed_notifications() {
    let (tx, rx) = mpsc::channel(8);
    // One-byte temperature payload cannot decode; it must not poison the pair
    tx.send(notify(SensorChannel::Temperature, &[0xE8])).await.unwrap();
    tx.send(notify(SensorChannel::Temperature, &TEMP_2536)).await.unwrap();
    tx.send(notify(SensorChannel::Humidity, &HUM_6234)).await.unwrap();
    drop(tx);

    let link = MockLink::new().with_notifications(rx);
    let store = Arc::new(RingStore::in_memory(3).unwrap());
    let mut acquisition = Acquisition::new(link, Arc::clone(&store), config());

    acquisition.continuous_monitor(std::future::pending()).await.unwrap();

    let readings = store.recent_default().unwrap();
    assert_eq!(readings.len(), 1);
    assert_eq!(readings[0].temperature, 25.36);
}

#[tokio::test]
async fn continuous_shutdown_releases_session() {
    let (tx, rx) = mpsc::channel::<Notification>(8);

    let link = MockLink::new().with_notifications(rx);
    let calls = link.call_log();
    let store = Arc::new(RingStore::in_memory(3).unwrap());
    let mut acquisition = Acquisition::new(link, Arc::clone(&store), config());

    // Shutdown is already signaled; with no pending notifications the loop
    // must observe it immediately instead of idling forever.
    acquisition.continuous_monitor(std::future::ready(())).await.unwrap();
    drop(tx);

    assert_eq!(store.count().unwrap(), 0);
    let calls = calls.lock().unwrap();
    assert!(calls.contains(&"unsubscribe temperature".to_string()));
    assert!(calls.contains(&"unsubscribe humidity".to_string()));
    assert_eq!(calls.last().map(String::as_str), Some("disconnect"));
}
