use serde::Deserialize;
use std::env;
use std::path::Path;
use std::time::Duration;

use crate::registry::{RegistryConfig, DEFAULT_EVENT_CAPACITY, DEFAULT_LOCK_DURATION, DEFAULT_SEAT_COUNT};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub seats: SeatsConfig,
    pub events: EventsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SeatsConfig {
    pub count: u32,
    pub lock_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EventsConfig {
    pub capacity: usize,
}

impl Config {
    /// Loads `config/` relative to the working directory.
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("config")
    }

    pub fn load_from(dir: impl AsRef<Path>) -> Result<Self, config::ConfigError> {
        let dir = dir.as_ref();
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
        let file = |name: &str| dir.join(name).to_string_lossy().into_owned();

        let s = config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000i64)?
            .set_default("seats.count", i64::from(DEFAULT_SEAT_COUNT))?
            .set_default("seats.lock_seconds", DEFAULT_LOCK_DURATION.as_secs() as i64)?
            .set_default("events.capacity", DEFAULT_EVENT_CAPACITY as i64)?
            .add_source(config::File::with_name(&file("default")))
            // Per-environment overrides, optional
            .add_source(config::File::with_name(&file(&run_mode)).required(false))
            // Untracked local overrides
            .add_source(config::File::with_name(&file("local")).required(false))
            // Eg. `SEATLOCK__SEATS__COUNT=20`
            .add_source(config::Environment::with_prefix("SEATLOCK").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            seat_count: self.seats.count,
            lock_duration: Duration::from_secs(self.seats.lock_seconds),
            event_capacity: self.events.capacity,
        }
    }
}
