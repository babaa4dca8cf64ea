//! One-shot acquisition: connect, read once, persist, print.
//!
//! ```bash
//! cargo run --example one_shot -- A4:C1:38:AA:BB:CC
//! ```

use std::sync::Arc;

use hygrolog_ble::{Acquisition, BleLink};
use hygrolog_core::{MonitorConfig, RingStore};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let device_id = std::env::args()
        .nth(1)
        .expect("usage: one_shot <DEVICE-MAC>");

    let config = MonitorConfig::default().with_device_id(&device_id);
    let store = Arc::new(RingStore::open(&config.db_path, config.capacity)?);
    let link = BleLink::new(&config.device_id);
    let mut acquisition = Acquisition::new(link, Arc::clone(&store), config);

    match acquisition.one_shot_read().await? {
        Some(reading) => println!("{}", serde_json::to_string_pretty(&reading)?),
        None => println!("incomplete measurement pair; nothing saved"),
    }

    println!("store now holds {} reading(s)", store.count()?);
    Ok(())
}
