use std::env;

use anyhow::{Context, Result};
use bloc_core::BlocConfig;

/// Demo server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub host: String,
    pub port: u16,
    /// Route serving the current count.
    pub path: String,
    pub bloc: BlocConfig,
}

impl DemoConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: env::var("DEMO_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("DEMO_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("DEMO_PORT must be a number")?,
            path: env::var("DEMO_PATH").unwrap_or_else(|_| "/".to_string()),
            bloc: BlocConfig::from_env()?,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
