//! Continuous monitoring: subscribe to notifications and persist every
//! completed temperature/humidity pair until Ctrl+C.
//!
//! ```bash
//! cargo run --example monitor -- A4:C1:38:AA:BB:CC
//! ```

use std::sync::Arc;

use hygrolog_ble::{Acquisition, BleLink};
use hygrolog_core::{MonitorConfig, RingStore};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let device_id = std::env::args()
        .nth(1)
        .expect("usage: monitor <DEVICE-MAC>");

    let config = MonitorConfig::default().with_device_id(&device_id);
    let store = Arc::new(RingStore::open(&config.db_path, config.capacity)?);
    let link = BleLink::new(&config.device_id);
    let mut acquisition = Acquisition::new(link, Arc::clone(&store), config);

    println!("monitoring {device_id}; press Ctrl+C to stop");
    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    acquisition.continuous_monitor(shutdown).await?;

    println!("\nmost recent readings:");
    for reading in store.recent_default()? {
        println!("{}", serde_json::to_string(&reading)?);
    }
    Ok(())
}
