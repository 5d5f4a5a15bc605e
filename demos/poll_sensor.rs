//! Poll a Jinou sensor on a fixed interval, acting as the host framework.
//!
//! Run with: cargo run --example poll_sensor -- AA:BB:CC:DD:EE:FF [name]

use jinou_ble::{setup_platform_with_bluetooth, Entity, Error, JinouDevice, Result, SensorConfig};
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("jinou_ble=debug".parse().unwrap()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let address = args.next().ok_or_else(|| Error::InvalidConfig {
        name: "address".to_string(),
        value: String::new(),
    })?;
    let name = args.next().unwrap_or_default();

    let config = SensorConfig::new(address)
        .with_name(name)
        .with_read_timeout(Some(Duration::from_secs(10)));

    println!("Connecting to {}...", config.address);
    let device = setup_platform_with_bluetooth(&config).await?;
    println!("Connected. Press Ctrl+C to exit.\n");

    loop {
        // A failed poll is logged and skipped; entities keep their last values.
        if let Err(e) = device.poll().await {
            eprintln!("Poll failed: {}", e);
        }
        display(&device);

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("\nExiting...");
                break;
            }
            _ = tokio::time::sleep(POLL_INTERVAL) => {}
        }
    }

    device.shutdown().await?;

    Ok(())
}

fn display(device: &JinouDevice) {
    for entity in device.entities() {
        match entity.state() {
            Some(value) => println!(
                "{:>12}: {:5.1}{}",
                entity.name(),
                value,
                entity.unit_of_measurement()
            ),
            None => println!("{:>12}: unknown", entity.name()),
        }

        for (key, value) in entity.attributes().entries() {
            println!("{:>12}  {} = {}", "", key, value);
        }
    }

    if let Some(at) = device.temperature().last_updated() {
        println!("{:>12}  updated {}\n", "", at.format("%H:%M:%S"));
    }
}
