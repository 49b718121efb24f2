use anyhow::Result;
use posture_vision::pipeline::SessionConfig;
use serde::{Deserialize, Serialize};
use std::fs;

/// Server settings, loaded from a TOML file next to the binary. Every field
/// has a default so a missing or partial file still yields a working server.
#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.
    pub bind_addr: String,
    /// Directory uploaded videos are staged in.
    pub upload_dir: String,
    /// Directory the compiled web client is served from.
    pub client_dir: String,
    /// Tunables for sessions spawned by the analyze endpoint.
    pub session: SessionConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5000".to_string(),
            upload_dir: "uploads".to_string(),
            client_dir: "client/dist".to_string(),
            session: SessionConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}
