// MIT License - Copyright (c) 2026 Peter Wright
// Shared connection manager

use std::sync::Arc;

use chrono::Local;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use tokio::sync::{mpsc, RwLock};
use tokio::time::{sleep, sleep_until, Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::HubConfig;
use crate::error::{HubError, Result};
use crate::event::{event_channel, EventReceiver, EventSender, HubEvent};
use crate::state::{self, ConnectionStatus, DashboardState, DisconnectReason, SwitchState};
use crate::topic::{self, Channel, Command};

/// Events surfaced by a transport pump to the hub task.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent {
    /// Transport session established (or re-established).
    Up,
    /// Transport session lost; the pump keeps retrying.
    Down { reason: DisconnectReason },
    /// Raw inbound message.
    Message { topic: String, payload: Vec<u8> },
}

/// Non-blocking control surface of one broker connection.
///
/// All methods enqueue work on the transport and return immediately; a
/// rejected request is a local failure, never a retry.
pub trait BrokerLink: Send {
    fn request_subscribe(&self, topics: &[String]) -> Result<()>;
    fn request_publish(&self, topic: &str, payload: &str) -> Result<()>;
    fn request_disconnect(&self) -> Result<()>;
}

/// A live link produced by a [`LinkFactory`]: the control handle, the
/// inbound event stream, and the pump task driving it.
pub struct LinkHandle {
    pub link: Box<dyn BrokerLink>,
    pub events: mpsc::Receiver<LinkEvent>,
    pub pump: Option<tokio::task::JoinHandle<()>>,
}

/// Creates a fresh link each time the hub leaves the Absent state.
pub type LinkFactory = Box<dyn FnMut() -> LinkHandle + Send>;

/// Connection lifecycle phases. `Absent` is both the initial state and
/// the only state teardown returns to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkState {
    Absent,
    Connecting,
    Live,
    Disconnected,
}

/// Requests from hub handles to the core task.
enum HubRequest {
    Attach,
    Detach,
    Publish(Command),
}

/// The shared state hub.
///
/// Owns at most one broker connection for all consumers. The link is
/// created lazily on the first [`attach`](StateHub::attach), survives as
/// long as any subscription is alive, and is torn down after a grace
/// period once the last subscription is dropped. The snapshot is
/// retained across teardown so late consumers still see recent data.
///
/// Handles are cheap to clone; all of them drive the same hub.
///
/// # Example
///
/// ```no_run
/// use homehub::{HubConfig, HubEvent, StateHub, SwitchState};
///
/// #[tokio::main]
/// async fn main() {
///     let hub = StateHub::new(HubConfig::default());
///
///     let mut sub = hub.attach();
///     tokio::spawn(async move {
///         while let Ok(event) = sub.recv().await {
///             if let HubEvent::StateChanged(state) = event {
///                 println!("{:.1} C", state.sensors.temperature);
///             }
///         }
///     });
///
///     hub.set_bulb(SwitchState::On);
/// }
/// ```
#[derive(Clone)]
pub struct StateHub {
    req_tx: mpsc::UnboundedSender<HubRequest>,
    event_tx: EventSender,
    state: Arc<RwLock<DashboardState>>,
}

impl StateHub {
    /// Create a hub backed by a real MQTT connection.
    pub fn new(config: HubConfig) -> Self {
        let factory = mqtt_link_factory(&config);
        Self::with_factory(config, factory)
    }

    /// Create a hub with a custom link factory. This is the seam tests
    /// use to drive the lifecycle without a broker.
    pub fn with_factory(config: HubConfig, factory: LinkFactory) -> Self {
        let (event_tx, _) = event_channel(config.event_capacity);
        let state = Arc::new(RwLock::new(DashboardState::default()));
        let (req_tx, req_rx) = mpsc::unbounded_channel();

        let core = HubCore {
            namespace: config.namespace,
            idle_grace: config.idle_grace,
            factory,
            state: state.clone(),
            event_tx: event_tx.clone(),
            interest: 0,
            link: None,
            link_state: LinkState::Absent,
            idle_deadline: None,
        };
        tokio::spawn(core.run(req_rx));

        Self { req_tx, event_tx, state }
    }

    /// Register interest and subscribe to hub events.
    ///
    /// Ensures a broker link exists and cancels any pending idle
    /// teardown. Dropping the returned subscription releases the
    /// interest again.
    pub fn attach(&self) -> HubSubscription {
        let events = self.event_tx.subscribe();
        let _ = self.req_tx.send(HubRequest::Attach);
        HubSubscription { events, req_tx: self.req_tx.clone() }
    }

    /// Clone of the current snapshot (last known values, retained even
    /// while disconnected).
    pub async fn snapshot(&self) -> DashboardState {
        self.state.read().await.clone()
    }

    // --- Commands ---
    //
    // All of these return immediately. A command issued while the link
    // is not live is dropped and reported as HubEvent::PublishRejected.

    pub fn set_bulb(&self, state: SwitchState) {
        self.dispatch(Command::Bulb(state));
    }

    pub fn set_fan(&self, state: SwitchState) {
        self.dispatch(Command::Fan(state));
    }

    pub fn set_fan_speed(&self, speed: u8) {
        self.dispatch(Command::FanSpeed(speed));
    }

    pub fn set_color(&self, color: impl Into<String>) {
        self.dispatch(Command::Color(color.into()));
    }

    pub fn toggle_mode(&self) {
        self.dispatch(Command::ToggleMode);
    }

    fn dispatch(&self, command: Command) {
        if self.req_tx.send(HubRequest::Publish(command)).is_err() {
            warn!("Hub task gone, command dropped");
        }
    }
}

/// A registered consumer: an event stream plus the interest it holds.
///
/// Dropping the subscription releases the interest; when the last one
/// goes, the hub arms its idle-teardown timer.
pub struct HubSubscription {
    events: EventReceiver,
    req_tx: mpsc::UnboundedSender<HubRequest>,
}

impl HubSubscription {
    /// Receive the next hub event.
    ///
    /// Propagates `broadcast` errors so slow consumers can observe
    /// `Lagged` and resume; lag never affects other subscribers.
    pub async fn recv(&mut self) -> std::result::Result<HubEvent, tokio::sync::broadcast::error::RecvError> {
        self.events.recv().await
    }
}

impl Drop for HubSubscription {
    fn drop(&mut self) {
        let _ = self.req_tx.send(HubRequest::Detach);
    }
}

// --- Core task ---

/// What woke the core up. Selected first, handled with full ownership.
enum Tick {
    Request(Option<HubRequest>),
    Link(Option<LinkEvent>),
    IdleFired,
}

struct HubCore {
    namespace: String,
    idle_grace: Duration,
    factory: LinkFactory,
    state: Arc<RwLock<DashboardState>>,
    event_tx: EventSender,
    interest: usize,
    link: Option<LinkHandle>,
    link_state: LinkState,
    idle_deadline: Option<Instant>,
}

impl HubCore {
    /// Single task serializing consumer requests, transport events and
    /// the idle timer; every state transition happens here.
    async fn run(mut self, mut req_rx: mpsc::UnboundedReceiver<HubRequest>) {
        loop {
            let tick = {
                let link_events = self.link.as_mut().map(|l| &mut l.events);
                let deadline = self.idle_deadline;
                tokio::select! {
                    request = req_rx.recv() => Tick::Request(request),
                    event = next_link_event(link_events) => Tick::Link(event),
                    () = idle_wait(deadline) => Tick::IdleFired,
                }
            };

            match tick {
                Tick::Request(Some(request)) => self.handle_request(request).await,
                // All hub handles dropped: shut down for good.
                Tick::Request(None) => break,
                Tick::Link(Some(event)) => self.handle_link_event(event).await,
                Tick::Link(None) => self.handle_link_lost().await,
                Tick::IdleFired => self.handle_idle_fired().await,
            }
        }
        self.close_link(DisconnectReason::None).await;
    }

    async fn handle_request(&mut self, request: HubRequest) {
        match request {
            HubRequest::Attach => {
                self.interest += 1;
                // Cancelling is idempotent; a remount inside the grace
                // window must never flap the connection.
                self.idle_deadline = None;
                if self.link.is_none() {
                    self.open_link();
                }
            }
            HubRequest::Detach => {
                self.interest = self.interest.saturating_sub(1);
                if self.interest == 0 && self.link.is_some() {
                    debug!("Last consumer detached, idle teardown in {:?}", self.idle_grace);
                    self.idle_deadline = Some(Instant::now() + self.idle_grace);
                }
            }
            HubRequest::Publish(command) => self.publish(command).await,
        }
    }

    /// Create the single shared link. Only called while no link exists;
    /// the core task owning the only link slot rules out a second
    /// in-flight creation.
    fn open_link(&mut self) {
        info!("Opening broker link");
        self.link = Some((self.factory)());
        self.link_state = LinkState::Connecting;
    }

    async fn handle_link_event(&mut self, event: LinkEvent) {
        match event {
            LinkEvent::Up => {
                if matches!(self.link_state, LinkState::Connecting | LinkState::Disconnected) {
                    let topics: Vec<String> =
                        Channel::ALL.iter().map(|c| c.topic(&self.namespace)).collect();
                    if let Some(handle) = &self.link {
                        match handle.link.request_subscribe(&topics) {
                            Ok(()) => info!("Broker link up, {} channels subscribed", topics.len()),
                            Err(e) => warn!("Subscribe failed: {e}"),
                        }
                    }
                    self.link_state = LinkState::Live;
                    self.update_connection(true, DisconnectReason::None).await;
                }
            }
            LinkEvent::Down { reason } => {
                if self.link_state == LinkState::Live {
                    self.link_state = LinkState::Disconnected;
                    warn!("Broker link lost ({reason:?}), reconnecting");
                }
                // Repeated Down events during a reconnect storm collapse
                // into a single status change.
                self.update_connection(false, reason).await;
            }
            LinkEvent::Message { topic, payload } => self.handle_message(&topic, &payload).await,
        }
    }

    /// The pump's event channel closed without a teardown request.
    async fn handle_link_lost(&mut self) {
        warn!("Transport pump stopped unexpectedly");
        self.close_link(DisconnectReason::Error).await;
        if self.interest > 0 {
            self.open_link();
        }
    }

    async fn handle_idle_fired(&mut self) {
        self.idle_deadline = None;
        if self.interest > 0 {
            return;
        }
        info!("No consumers for {:?}, closing broker link", self.idle_grace);
        self.close_link(DisconnectReason::IdleTimeout).await;
    }

    async fn handle_message(&mut self, topic: &str, payload: &[u8]) {
        let Some(channel) = Channel::from_topic(&self.namespace, topic) else {
            debug!("Ignoring message on unknown topic {topic}");
            return;
        };
        let Some(reading) = topic::decode(channel, payload) else {
            warn!("Malformed payload on {topic}, keeping previous value");
            return;
        };

        let next = {
            let mut state = self.state.write().await;
            let (next, notable) = state::reduce(&state, &reading, Local::now());
            *state = next.clone();
            drop(state);
            if let Some(notable) = notable {
                let _ = self.event_tx.send(HubEvent::Notable(notable));
            }
            next
        };
        let _ = self.event_tx.send(HubEvent::StateChanged(next));
    }

    async fn publish(&mut self, command: Command) {
        if self.link_state == LinkState::Live {
            if let Some(handle) = &self.link {
                match handle.link.request_publish(&command.topic(&self.namespace), &command.payload())
                {
                    Ok(()) => {
                        debug!("Published {} = {}", command.suffix(), command.payload());
                        return;
                    }
                    Err(e) => warn!("Publish failed on {}: {e}", command.suffix()),
                }
            }
        } else {
            warn!("Publish skipped, broker link not live: {}", command.suffix());
        }
        let _ = self.event_tx.send(HubEvent::PublishRejected {
            channel: command.suffix().to_string(),
        });
    }

    async fn close_link(&mut self, reason: DisconnectReason) {
        if let Some(mut handle) = self.link.take() {
            if let Err(e) = handle.link.request_disconnect() {
                debug!("Disconnect request failed: {e}");
            }
            if let Some(pump) = handle.pump.take() {
                pump.abort();
            }
        }
        self.link_state = LinkState::Absent;
        // Snapshot values are retained for late consumers; only the
        // connection status changes.
        self.update_connection(false, reason).await;
    }

    async fn update_connection(&mut self, connected: bool, reason: DisconnectReason) {
        let status = ConnectionStatus { connected, reason };
        let next = {
            let mut state = self.state.write().await;
            if state.connection == status {
                return;
            }
            let mut next = state.clone();
            next.connection = status;
            *state = next.clone();
            next
        };
        let _ = self.event_tx.send(HubEvent::StateChanged(next));
    }
}

async fn next_link_event(events: Option<&mut mpsc::Receiver<LinkEvent>>) -> Option<LinkEvent> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn idle_wait(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

// --- MQTT transport ---

struct MqttLink {
    client: AsyncClient,
}

impl BrokerLink for MqttLink {
    fn request_subscribe(&self, topics: &[String]) -> Result<()> {
        for topic in topics {
            self.client
                .try_subscribe(topic.clone(), QoS::AtMostOnce)
                .map_err(|e| HubError::Transport { details: e.to_string() })?;
        }
        Ok(())
    }

    fn request_publish(&self, topic: &str, payload: &str) -> Result<()> {
        self.client
            .try_publish(topic, QoS::AtMostOnce, false, payload)
            .map_err(|e| HubError::Transport { details: e.to_string() })
    }

    fn request_disconnect(&self) -> Result<()> {
        self.client
            .try_disconnect()
            .map_err(|e| HubError::Transport { details: e.to_string() })
    }
}

fn mqtt_link_factory(config: &HubConfig) -> LinkFactory {
    let host = config.broker_host.clone();
    let port = config.broker_port;
    let client_id = config.client_id.clone();
    let reconnect = config.reconnect;

    Box::new(move || {
        let mut options = MqttOptions::new(client_id.clone(), host.clone(), port);
        options.set_keep_alive(reconnect.keep_alive);
        let (client, eventloop) = AsyncClient::new(options, 64);
        let (tx, rx) = mpsc::channel(256);
        let pump = tokio::spawn(pump_events(eventloop, tx, reconnect.pause));
        LinkHandle {
            link: Box::new(MqttLink { client }),
            events: rx,
            pump: Some(pump),
        }
    })
}

/// Drive the rumqttc event loop and translate packets into link events.
///
/// Poll errors are retried indefinitely with the configured pause;
/// rumqttc re-establishes the session on the next poll. Exits once the
/// hub drops its receiver.
async fn pump_events(mut eventloop: EventLoop, tx: mpsc::Sender<LinkEvent>, pause: Duration) {
    loop {
        let event = match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => Some(LinkEvent::Up),
            Ok(Event::Incoming(Packet::Publish(publish))) => Some(LinkEvent::Message {
                topic: publish.topic.clone(),
                payload: publish.payload.to_vec(),
            }),
            Ok(Event::Incoming(Packet::Disconnect)) => Some(LinkEvent::Down {
                reason: DisconnectReason::BrokerLost,
            }),
            Ok(_) => None,
            Err(e) => {
                debug!("MQTT poll error: {e}");
                if tx
                    .send(LinkEvent::Down { reason: DisconnectReason::Error })
                    .await
                    .is_err()
                {
                    return;
                }
                sleep(pause).await;
                continue;
            }
        };
        if let Some(event) = event {
            if tx.send(event).await.is_err() {
                return;
            }
        }
    }
}
