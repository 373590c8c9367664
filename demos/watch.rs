//! Example: Attach to the hub and print state changes and notable events.

use homehub::{HubConfig, HubEvent, NotableEvent, StateHub};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = HubConfig::builder()
        .broker_host("broker.hivemq.com")
        .broker_port(1883)
        .namespace("yuvraj/home")
        .build();

    let hub = StateHub::new(config);
    let mut sub = hub.attach();

    println!("Watching the smart home (Ctrl+C to stop)...\n");

    loop {
        tokio::select! {
            event = sub.recv() => {
                match event {
                    Ok(HubEvent::StateChanged(state)) => {
                        println!(
                            "{:5.1}°C {:5.1}%  bulb={:3} fan={:3} @{:3}%  mode={}  motion={}  [{}]",
                            state.sensors.temperature,
                            state.sensors.humidity,
                            state.sensors.bulb.as_payload(),
                            state.sensors.fan.as_payload(),
                            state.sensors.fan_speed,
                            state.sensors.mode.as_payload(),
                            state.sensors.motion.as_payload(),
                            if state.connection.connected { "online" } else { "offline" },
                        );
                    }
                    Ok(HubEvent::Notable(NotableEvent::MotionDetected)) => {
                        println!("  ! motion detected");
                    }
                    Ok(HubEvent::Notable(NotableEvent::Alert(message))) => {
                        println!("  ! alert: {message}");
                    }
                    Ok(HubEvent::PublishRejected { channel }) => {
                        println!("  ! command dropped on {channel}");
                    }
                    Err(e) => {
                        println!("Event channel error: {e}");
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!("\nDetaching...");
                break;
            }
        }
    }

    Ok(())
}
