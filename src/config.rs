// MIT License - Copyright (c) 2026 Peter Wright
// Hub configuration

use std::time::Duration;

use crate::policy::ReconnectPolicy;

/// Configuration for a [`StateHub`](crate::hub::StateHub).
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Broker hostname.
    pub broker_host: String,
    /// Broker TCP port.
    pub broker_port: u16,
    /// MQTT client identifier.
    pub client_id: String,
    /// Namespace prefix for all topics (e.g. "yuvraj/home").
    pub namespace: String,
    /// Grace period before tearing down an idle link.
    pub idle_grace: Duration,
    /// Capacity of the observer broadcast channel.
    pub event_capacity: usize,
    pub reconnect: ReconnectPolicy,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            broker_host: "broker.hivemq.com".to_string(),
            broker_port: 1883,
            client_id: "homehub".to_string(),
            namespace: "yuvraj/home".to_string(),
            idle_grace: Duration::from_secs(60),
            event_capacity: 256,
            reconnect: ReconnectPolicy::default(),
        }
    }
}

impl HubConfig {
    /// Create a new config builder starting from defaults.
    pub fn builder() -> HubConfigBuilder {
        HubConfigBuilder::default()
    }
}

/// Builder for HubConfig.
#[derive(Debug, Clone, Default)]
pub struct HubConfigBuilder {
    config: HubConfig,
}

impl HubConfigBuilder {
    pub fn broker_host(mut self, host: impl Into<String>) -> Self {
        self.config.broker_host = host.into();
        self
    }

    pub fn broker_port(mut self, port: u16) -> Self {
        self.config.broker_port = port;
        self
    }

    pub fn client_id(mut self, id: impl Into<String>) -> Self {
        self.config.client_id = id.into();
        self
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config.namespace = namespace.into();
        self
    }

    pub fn idle_grace(mut self, grace: Duration) -> Self {
        self.config.idle_grace = grace;
        self
    }

    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.config.event_capacity = capacity;
        self
    }

    pub fn reconnect(mut self, policy: ReconnectPolicy) -> Self {
        self.config.reconnect = policy;
        self
    }

    pub fn build(self) -> HubConfig {
        self.config
    }
}
