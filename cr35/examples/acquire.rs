//! Acquisition example: connect, scan once, print the result

use cr35::{Device, Event};

#[tokio::main]
async fn main() -> cr35::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let ip = std::env::var("DEVICE_IP").unwrap_or_else(|_| "192.168.1.40".to_string());
    let mode: u32 = std::env::var("SCAN_MODE")
        .ok()
        .and_then(|m| m.parse().ok())
        .unwrap_or(1);

    let mut device = Device::new(ip, 2006);
    device.connect().await?;

    // Give the bootstrap a moment, then show what the device offers.
    tokio::time::sleep(std::time::Duration::from_secs(2)).await;
    println!("Device state: {}", device.state());
    for mode in device.mode_list() {
        println!("  mode: {}", mode);
    }

    device.start(mode);

    while let Some(event) = device.next_event().await {
        match event {
            Event::Started => println!("acquisition started"),
            Event::NewData => println!("receiving data..."),
            Event::ImageReady(image) => {
                println!(
                    "scan complete: {}x{} pixels ({} KiB)",
                    image.width,
                    image.height,
                    image.pixels.len() * 2 / 1024
                );
                device.stop();
            }
            Event::Stopped => break,
            Event::Error(msg) => {
                eprintln!("device error: {}", msg);
                break;
            }
            other => println!("{}", other),
        }
    }

    device.disconnect().await;
    Ok(())
}
