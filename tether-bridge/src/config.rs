//! Configuration of [`ControlBridge`](crate::ControlBridge).
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`ControlBridge`](crate::ControlBridge).
///
/// Owned by the surrounding system (mission setup, scenario files); the
/// bridge only consumes it.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct BridgeConfig {
    /// Base URL of the remote agent service.
    pub server_address: String,

    /// Deadline in seconds for each action exchange.
    pub timeout: f64,

    /// Simulated seconds between exchanges.
    ///
    /// Must be at least the physics tick duration; a shorter interval
    /// degenerates to one exchange per tick.
    pub decision_interval: f64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            server_address: "http://127.0.0.1:50051".to_string(),
            timeout: 60.0,
            decision_interval: 1.0,
        }
    }
}

impl BridgeConfig {
    /// Sets the base URL of the remote agent service.
    pub fn server_address(mut self, v: impl Into<String>) -> Self {
        self.server_address = v.into();
        self
    }

    /// Sets the exchange deadline in seconds.
    pub fn timeout(mut self, v: f64) -> Self {
        self.timeout = v;
        self
    }

    /// Sets the decision interval in simulated seconds.
    pub fn decision_interval(mut self, v: f64) -> Self {
        self.decision_interval = v;
        self
    }

    /// Constructs [`BridgeConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`BridgeConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
