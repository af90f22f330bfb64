use serde::Deserialize;

/// Top-level configuration settings for the bridge.
///
/// Includes the WebSocket listener, the MQTT broker connection and logging.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Settings {
    pub server: ServerSettings,
    pub mqtt: MqttSettings,
    pub log: LogSettings,
}

/// Where the WebSocket listener binds.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl ServerSettings {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Broker address, topic filters and reconnection policy.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct MqttSettings {
    /// `mqtt://host[:port]`
    pub url: String,
    /// Prefix of the MQTT client id. A random suffix is added per process.
    pub client_id: String,
    pub topics: Vec<String>,
    pub keep_alive_secs: u64,
    pub reconnect_base_ms: u64,
    pub reconnect_max_ms: u64,
    /// Largest packet accepted from or sent to the broker.
    pub max_packet_bytes: usize,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LogSettings {
    pub level: String,
}

/// Partial configuration settings loaded from files or environment.
///
/// Missing values are filled from `Settings::default()`.
#[derive(Debug, Default, Deserialize)]
pub struct PartialSettings {
    pub server: Option<PartialServerSettings>,
    pub mqtt: Option<PartialMqttSettings>,
    pub log: Option<PartialLogSettings>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PartialServerSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PartialMqttSettings {
    pub url: Option<String>,
    pub client_id: Option<String>,
    pub topics: Option<Vec<String>>,
    pub keep_alive_secs: Option<u64>,
    pub reconnect_base_ms: Option<u64>,
    pub reconnect_max_ms: Option<u64>,
    pub max_packet_bytes: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PartialLogSettings {
    pub level: Option<String>,
}

impl PartialSettings {
    /// Merges whatever was provided over `defaults`, field by field.
    pub fn merge_over(self, defaults: Settings) -> Settings {
        let server = self.server.unwrap_or_default();
        let mqtt = self.mqtt.unwrap_or_default();
        let log = self.log.unwrap_or_default();

        Settings {
            server: ServerSettings {
                host: server.host.unwrap_or(defaults.server.host),
                port: server.port.unwrap_or(defaults.server.port),
            },
            mqtt: MqttSettings {
                url: mqtt.url.unwrap_or(defaults.mqtt.url),
                client_id: mqtt.client_id.unwrap_or(defaults.mqtt.client_id),
                topics: mqtt
                    .topics
                    .filter(|topics| !topics.is_empty())
                    .unwrap_or(defaults.mqtt.topics),
                keep_alive_secs: mqtt
                    .keep_alive_secs
                    .unwrap_or(defaults.mqtt.keep_alive_secs),
                reconnect_base_ms: mqtt
                    .reconnect_base_ms
                    .unwrap_or(defaults.mqtt.reconnect_base_ms),
                reconnect_max_ms: mqtt
                    .reconnect_max_ms
                    .unwrap_or(defaults.mqtt.reconnect_max_ms),
                max_packet_bytes: mqtt
                    .max_packet_bytes
                    .unwrap_or(defaults.mqtt.max_packet_bytes),
            },
            log: LogSettings {
                level: log.level.unwrap_or(defaults.log.level),
            },
        }
    }
}

/// Provides default values for `Settings`.
///
/// These are the addresses and filters the bridge runs with when nothing is configured.
impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            mqtt: MqttSettings {
                url: "mqtt://captain.dev0.pandor.cloud:1884".to_string(),
                client_id: "mqttbridge".to_string(),
                topics: vec![
                    "classroom/+/telemetry".to_string(),
                    "flipper/+/+".to_string(),
                ],
                keep_alive_secs: 30,
                reconnect_base_ms: 500,
                reconnect_max_ms: 30_000,
                // MQTT's own limit: the largest remaining length a fixed header can encode
                max_packet_bytes: 268_435_455,
            },
            log: LogSettings {
                level: "info".to_string(),
            },
        }
    }
}
