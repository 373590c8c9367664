//! Example: Send a few device commands through the hub.

use homehub::{HubConfig, HubEvent, StateHub, SwitchState};
use tokio::time::{sleep, Duration};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let hub = StateHub::new(HubConfig::default());
    let mut sub = hub.attach();

    // Wait for the link to come up before sending anything; commands
    // issued while offline are dropped, not queued.
    println!("Waiting for connection...");
    loop {
        match sub.recv().await? {
            HubEvent::StateChanged(state) if state.connection.connected => break,
            _ => {}
        }
    }

    println!("Turning bulb on...");
    hub.set_bulb(SwitchState::On);

    println!("Setting fan to 60%...");
    hub.set_fan(SwitchState::On);
    hub.set_fan_speed(60);

    println!("Evening color...");
    hub.set_color("#FFD580");

    // Give the transport a moment to flush before exiting
    sleep(Duration::from_secs(1)).await;

    println!("Done.");
    Ok(())
}
