// Gateway configuration: bind address plus the ledger it serves

use beneficiary_ledger::Config as LedgerConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub bind_addr: String,
    /// Emit JSON log lines
    pub json_logs: bool,
    pub ledger: LedgerConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8000".to_string(),
            json_logs: false,
            ledger: LedgerConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// `GATEWAY_CONFIG` names an optional TOML file; environment variables
    /// override whatever it sets.
    pub fn load() -> anyhow::Result<Self> {
        let mut config = match std::env::var("GATEWAY_CONFIG") {
            Ok(path) => {
                let content = std::fs::read_to_string(&path)?;
                toml::from_str(&content)?
            }
            Err(_) => GatewayConfig::default(),
        };

        if let Ok(addr) = std::env::var("GATEWAY_BIND_ADDR") {
            config.bind_addr = addr;
        }

        if let Ok(format) = std::env::var("LOG_FORMAT") {
            config.json_logs = format.eq_ignore_ascii_case("json");
        }

        config.ledger.apply_env()?;
        Ok(config)
    }
}
