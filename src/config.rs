use std::time::Duration;

use config::{ConfigError, Environment};
use serde::Deserialize;

use crate::blockchain::Amount;

/// Node configuration, layered from defaults and `LEDGER__*` environment
/// variables (e.g. `LEDGER__SERVER__PORT=5006`)
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub mining: MiningConfig,
    pub ledger: LedgerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MiningConfig {
    /// Upper bound on one proof search, in seconds
    pub timeout_secs: u64,
    /// Amount credited to this node for each mined block
    pub reward: Amount,
}

impl MiningConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Seal a first block at startup so the node can accept transactions
    pub seed_genesis: bool,
    pub genesis_proof: u64,
    pub genesis_previous_hash: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::builder()?
            .add_source(Environment::with_prefix("LEDGER").separator("__").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        config::Config::builder()
            // Server defaults
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 5005)?
            // Mining defaults
            .set_default("mining.timeout_secs", 60)?
            .set_default("mining.reward", 1)?
            // Genesis block
            .set_default("ledger.seed_genesis", true)?
            .set_default("ledger.genesis_proof", 100)?
            .set_default("ledger.genesis_previous_hash", "1")
    }
}
