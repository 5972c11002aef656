use serde::{Deserialize, Serialize};

/// Connection parameters handed to the connectivity manager. Opaque to the
/// core; provisioning them (WiFi association, credentials storage) is the
/// surrounding firmware's job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    /// Empty string means the broker requires no authentication.
    pub username: String,
    pub password: String,
    /// mDNS name the update subsystem announces itself under.
    pub hostname: String,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: "192.168.1.100".to_string(),
            port: 1883,
            client_id: "alarmclock".to_string(),
            username: String::new(),
            password: String::new(),
            hostname: "alarmclock".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlarmConfig {
    pub toggle_period_ms: u64,
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            toggle_period_ms: 500,
        }
    }
}

impl AlarmConfig {
    /// A zero or near-zero period would flip the buzzer on every tick.
    pub fn sanitize(&mut self) {
        self.toggle_period_ms = self.toggle_period_ms.clamp(50, 60_000);
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub broker: BrokerConfig,
    pub alarm: AlarmConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_clamps_toggle_period() {
        let mut config = AlarmConfig {
            toggle_period_ms: 0,
        };
        config.sanitize();
        assert_eq!(config.toggle_period_ms, 50);

        config.toggle_period_ms = 120_000;
        config.sanitize();
        assert_eq!(config.toggle_period_ms, 60_000);
    }

    #[test]
    fn runtime_config_round_trips_through_json() {
        let config = RuntimeConfig::default();
        let raw = serde_json::to_string(&config).unwrap();
        let parsed: RuntimeConfig = serde_json::from_str(&raw).unwrap();

        assert_eq!(parsed.broker.port, 1883);
        assert_eq!(parsed.broker.client_id, "alarmclock");
        assert_eq!(parsed.alarm.toggle_period_ms, 500);
    }
}
