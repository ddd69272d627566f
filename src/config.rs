//! Configuration management for StakeChain

use crate::error::ChainError;
use crate::validators::MIN_STAKE;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub consensus: ConsensusConfig,
    #[serde(default)]
    pub block_production: BlockProductionConfig,
    #[serde(default)]
    pub genesis: GenesisConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    #[serde(default = "default_network_id")]
    pub network_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConsensusConfig {
    /// Seed for leader election and vote sampling. Unset means OS entropy.
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlockProductionConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Humantime string, e.g. "400ms" or "2s".
    #[serde(default = "default_block_interval")]
    pub interval: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SeedValidator {
    pub name: String,
    pub stake: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenesisConfig {
    #[serde(default = "default_seed_validators")]
    pub validators: Vec<SeedValidator>,
    #[serde(default = "default_authors")]
    pub authors: Vec<String>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            api_port: default_api_port(),
            network_id: default_network_id(),
        }
    }
}

impl Default for BlockProductionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval: default_block_interval(),
        }
    }
}

impl Default for GenesisConfig {
    fn default() -> Self {
        Self {
            validators: default_seed_validators(),
            authors: default_authors(),
        }
    }
}

impl BlockProductionConfig {
    pub fn interval(&self) -> Result<Duration, ChainError> {
        humantime::parse_duration(&self.interval).map_err(|e| {
            ChainError::Config(format!(
                "block_production.interval '{}' is not a duration: {}",
                self.interval, e
            ))
        })
    }
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self, ChainError> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that serde cannot.
    pub fn validate(&self) -> Result<(), ChainError> {
        if let Some(low) = self.genesis.validators.iter().find(|v| v.stake < MIN_STAKE) {
            return Err(ChainError::Config(format!(
                "genesis validator '{}' has stake {} below minimum {}",
                low.name, low.stake, MIN_STAKE
            )));
        }

        if self.genesis.authors.iter().any(|a| a.is_empty()) {
            return Err(ChainError::Config(
                "genesis.authors must not contain empty labels".to_string(),
            ));
        }

        if self.block_production.interval()?.is_zero() {
            return Err(ChainError::Config(
                "block_production.interval must be non-zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// Load `path`, falling back to defaults when the file does not exist.
pub fn load_config_from(path: impl AsRef<Path>) -> Result<Config, ChainError> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Config::default());
    }
    let config_str = fs::read_to_string(path)?;
    Config::from_toml_str(&config_str)
}

pub fn load_config() -> Result<Config, ChainError> {
    load_config_from(DEFAULT_CONFIG_PATH)
}

fn default_api_port() -> u16 {
    3000
}

fn default_network_id() -> String {
    "devnet".to_string()
}

fn default_block_interval() -> String {
    "400ms".to_string()
}

fn default_seed_validators() -> Vec<SeedValidator> {
    [("Alpha", 5000), ("Beta", 3000), ("Gamma", 4000), ("Delta", 2500)]
        .into_iter()
        .map(|(name, stake)| SeedValidator {
            name: name.to_string(),
            stake,
        })
        .collect()
}

fn default_authors() -> Vec<String> {
    ["author-alpha", "author-beta", "author-gamma"]
        .into_iter()
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.network.api_port, 3000);
        assert_eq!(config.genesis.validators.len(), 4);
        assert_eq!(config.genesis.authors.len(), 3);
        assert!(!config.block_production.enabled);
        assert_eq!(config.block_production.interval().unwrap(), Duration::from_millis(400));
        assert!(config.consensus.rng_seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            [network]
            api_port = 8080

            [consensus]
            rng_seed = 42
            "#,
        )
        .unwrap();
        assert_eq!(config.network.api_port, 8080);
        assert_eq!(config.network.network_id, "devnet");
        assert_eq!(config.consensus.rng_seed, Some(42));
        assert_eq!(config.genesis.validators[0].name, "Alpha");
    }

    #[test]
    fn test_low_seed_stake_rejected() {
        let err = Config::from_toml_str(
            r#"
            [[genesis.validators]]
            name = "tiny"
            stake = 10
            "#,
        )
        .unwrap_err();
        assert_eq!(err.kind(), "ConfigError");
        assert!(err.to_string().contains("tiny"));
    }

    #[test]
    fn test_bad_interval_rejected() {
        let err = Config::from_toml_str(
            r#"
            [block_production]
            enabled = true
            interval = "soon"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("soon"));

        assert!(Config::from_toml_str("[block_production]\ninterval = \"0s\"").is_err());
    }

    #[test]
    fn test_load_from_file_and_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.network.api_port, 3000);

        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "[block_production]\nenabled = true\ninterval = \"2s\"").unwrap();
        let config = load_config_from(&path).unwrap();
        assert!(config.block_production.enabled);
        assert_eq!(config.block_production.interval().unwrap(), Duration::from_secs(2));
    }

    #[test]
    fn test_malformed_toml() {
        assert_eq!(Config::from_toml_str("network = 5").unwrap_err().kind(), "ConfigError");
    }
}
