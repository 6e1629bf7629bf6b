//! Configuration management for minichain

use crate::error::{ChainError, Result};
use crate::mempool::DEFAULT_TRANSACTION_LIMIT;
use crate::miner::{DEFAULT_DIFFICULTY, MAX_DIFFICULTY};
use crate::transaction::{is_usable_identity, Identity, Participants};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Maximum number of pending transactions; the oldest is pruned beyond it.
    #[serde(default = "default_transaction_limit")]
    pub transaction_limit: usize,
    /// Required leading '0' characters of a sealed block's hash.
    #[serde(default = "default_difficulty")]
    pub difficulty: usize,
    #[serde(default = "default_participants")]
    pub participants: Participants,
    /// Starting balances for the caller-side balance view.
    #[serde(default = "default_opening_balances")]
    pub opening_balances: BTreeMap<Identity, f64>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            transaction_limit: default_transaction_limit(),
            difficulty: default_difficulty(),
            participants: default_participants(),
            opening_balances: default_opening_balances(),
        }
    }
}

impl LedgerConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: LedgerConfig =
            toml::from_str(s).map_err(|e| ChainError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.transaction_limit == 0 {
            return Err(ChainError::ConfigError(
                "transaction_limit must be a positive integer".to_string(),
            ));
        }

        if self.difficulty > MAX_DIFFICULTY {
            return Err(ChainError::ConfigError(format!(
                "difficulty must be at most {}, got {}",
                MAX_DIFFICULTY, self.difficulty
            )));
        }

        if self.participants.len() < 2 {
            return Err(ChainError::ConfigError(
                "participants must name at least two identities".to_string(),
            ));
        }

        if let Some(name) = self.participants.iter().find(|name| !is_usable_identity(name)) {
            return Err(ChainError::ConfigError(format!(
                "participant name {:?} is empty or clashes with transaction text",
                name
            )));
        }

        if let Some(name) = self
            .opening_balances
            .keys()
            .find(|name| !self.participants.contains(*name))
        {
            return Err(ChainError::ConfigError(format!(
                "opening balance given for unknown participant {}",
                name
            )));
        }

        Ok(())
    }
}

/// Load configuration from a TOML file, using defaults when it is absent.
pub fn load_config(path: impl AsRef<Path>) -> Result<LedgerConfig> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(LedgerConfig::default());
    }

    let config_str = fs::read_to_string(path)
        .map_err(|e| ChainError::ConfigError(format!("Failed to read {}: {}", path.display(), e)))?;
    LedgerConfig::from_toml_str(&config_str)
}

fn default_transaction_limit() -> usize {
    DEFAULT_TRANSACTION_LIMIT
}

fn default_difficulty() -> usize {
    DEFAULT_DIFFICULTY
}

fn default_participants() -> Participants {
    ["Alice", "Bob"].into_iter().map(String::from).collect()
}

fn default_opening_balances() -> BTreeMap<Identity, f64> {
    BTreeMap::from([("Alice".to_string(), 100.0), ("Bob".to_string(), 50.0)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = LedgerConfig::default();
        assert_eq!(config.transaction_limit, 2);
        assert_eq!(config.difficulty, 3);
        assert!(config.participants.contains("Alice"));
        assert!(config.participants.contains("Bob"));
        assert_eq!(config.opening_balances["Alice"], 100.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config = LedgerConfig::from_toml_str("difficulty = 1\n").unwrap();
        assert_eq!(config.difficulty, 1);
        assert_eq!(config.transaction_limit, 2);
        assert_eq!(config.participants.len(), 2);
    }

    #[test]
    fn test_custom_participants() {
        let config = LedgerConfig::from_toml_str(
            r#"
            transaction_limit = 5
            participants = ["Alice", "Bob", "Carol"]

            [opening_balances]
            Carol = 20.0
            "#,
        )
        .unwrap();
        assert_eq!(config.transaction_limit, 5);
        assert!(config.participants.contains("Carol"));
        assert_eq!(config.opening_balances.len(), 1);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(LedgerConfig::from_toml_str("transaction_limit = 0").is_err());
        assert!(LedgerConfig::from_toml_str("difficulty = 65").is_err());
        assert!(LedgerConfig::from_toml_str("participants = [\"Alice\"]").is_err());
        assert!(LedgerConfig::from_toml_str("difficulty = -1").is_err());
        assert!(LedgerConfig::from_toml_str("[opening_balances]\nEve = 1.0").is_err());
    }

    #[test]
    fn test_participant_names_must_survive_canonical_text() {
        for name in ["Al sends Bo", "Alice to Bob", "A | B", "", "  "] {
            let config = LedgerConfig {
                participants: ["Bob", name].into_iter().map(String::from).collect(),
                opening_balances: BTreeMap::new(),
                ..LedgerConfig::default()
            };
            assert!(
                matches!(config.validate(), Err(ChainError::ConfigError(_))),
                "{:?} should be refused",
                name
            );
        }

        let config = LedgerConfig::from_toml_str(
            "participants = [\"Anne-Marie\", \"Tom Sendsworth\"]\n[opening_balances]\n",
        )
        .unwrap();
        assert_eq!(config.participants.len(), 2);
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "difficulty = 0").unwrap();
        writeln!(file, "transaction_limit = 4").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.difficulty, 0);
        assert_eq!(config.transaction_limit, 4);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = load_config(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, LedgerConfig::default());
    }
}
