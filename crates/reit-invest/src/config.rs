//! Runtime configuration
//!
//! Values are read through [`ConfigSource`] at action time, never cached, so a
//! host can rotate the admin wallet or cluster without rebuilding the
//! orchestrator.

use anchor_lang::prelude::Pubkey;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::*;
use crate::errors::ConfigError;

pub const ADMIN_WALLET_ENV: &str = "REIT_ADMIN_WALLET";
pub const CLUSTER_ENV: &str = "REIT_CLUSTER";
pub const USDC_MINT_ENV: &str = "REIT_USDC_MINT";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cluster {
    Mainnet,
    #[default]
    Devnet,
    Testnet,
    Localnet,
}

impl Cluster {
    pub fn rpc_endpoint(&self) -> &'static str {
        match self {
            Cluster::Mainnet => "https://api.mainnet-beta.solana.com",
            Cluster::Devnet => "https://api.devnet.solana.com",
            Cluster::Testnet => "https://api.testnet.solana.com",
            Cluster::Localnet => "http://localhost:8899",
        }
    }

    /// Currency mint used when none is configured. Localnet mints are
    /// created per deployment so there is no default.
    pub fn default_usdc_mint(&self) -> Option<Pubkey> {
        match self {
            Cluster::Devnet => Some(DEVNET_USDC_MINT),
            _ => None,
        }
    }

    fn explorer_query(&self) -> &'static str {
        match self {
            Cluster::Mainnet => "",
            Cluster::Devnet => "?cluster=devnet",
            Cluster::Testnet => "?cluster=testnet",
            Cluster::Localnet => "?cluster=custom&customUrl=http%3A%2F%2Flocalhost%3A8899",
        }
    }

    pub fn explorer_tx_url(&self, signature: &impl fmt::Display) -> String {
        format!("https://explorer.solana.com/tx/{signature}{}", self.explorer_query())
    }

    pub fn explorer_address_url(&self, address: &Pubkey) -> String {
        format!(
            "https://explorer.solana.com/address/{address}{}",
            self.explorer_query()
        )
    }
}

impl FromStr for Cluster {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" | "mainnet-beta" => Ok(Cluster::Mainnet),
            "devnet" => Ok(Cluster::Devnet),
            "testnet" => Ok(Cluster::Testnet),
            "localnet" | "localhost" | "local" => Ok(Cluster::Localnet),
            other => Err(ConfigError::UnknownCluster(other.to_string())),
        }
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Cluster::Mainnet => "mainnet",
            Cluster::Devnet => "devnet",
            Cluster::Testnet => "testnet",
            Cluster::Localnet => "localnet",
        };
        f.write_str(name)
    }
}

/// Externally supplied settings gating admin actions and currency selection
pub trait ConfigSource: Send + Sync {
    /// `Ok(None)` when unset; gated actions must then refuse to run
    fn admin_wallet(&self) -> Result<Option<Pubkey>, ConfigError>;

    fn cluster(&self) -> Result<Cluster, ConfigError>;

    fn usdc_mint_override(&self) -> Result<Option<Pubkey>, ConfigError>;

    /// Configured currency mint, falling back to the cluster default
    fn usdc_mint(&self) -> Result<Option<Pubkey>, ConfigError> {
        match self.usdc_mint_override()? {
            Some(mint) => Ok(Some(mint)),
            None => Ok(self.cluster()?.default_usdc_mint()),
        }
    }
}

fn parse_pubkey(name: &'static str, value: &str) -> Result<Pubkey, ConfigError> {
    Pubkey::from_str(value.trim()).map_err(|_| ConfigError::InvalidPubkey {
        name,
        value: value.to_string(),
    })
}

/// Reads `REIT_ADMIN_WALLET`, `REIT_CLUSTER` and `REIT_USDC_MINT` on every call
#[derive(Clone, Copy, Debug, Default)]
pub struct EnvConfig;

impl EnvConfig {
    fn var(name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|v| !v.trim().is_empty())
    }
}

impl ConfigSource for EnvConfig {
    fn admin_wallet(&self) -> Result<Option<Pubkey>, ConfigError> {
        Self::var(ADMIN_WALLET_ENV)
            .map(|v| parse_pubkey(ADMIN_WALLET_ENV, &v))
            .transpose()
    }

    fn cluster(&self) -> Result<Cluster, ConfigError> {
        Self::var(CLUSTER_ENV)
            .map(|v| v.parse())
            .unwrap_or(Ok(Cluster::default()))
    }

    fn usdc_mint_override(&self) -> Result<Option<Pubkey>, ConfigError> {
        Self::var(USDC_MINT_ENV)
            .map(|v| parse_pubkey(USDC_MINT_ENV, &v))
            .transpose()
    }
}

/// Fixed configuration, deserializable from a host's config file
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticConfig {
    #[serde(with = "opt_pubkey")]
    pub admin_wallet: Option<Pubkey>,
    pub cluster: Cluster,
    #[serde(with = "opt_pubkey")]
    pub usdc_mint: Option<Pubkey>,
}

impl ConfigSource for StaticConfig {
    fn admin_wallet(&self) -> Result<Option<Pubkey>, ConfigError> {
        Ok(self.admin_wallet)
    }

    fn cluster(&self) -> Result<Cluster, ConfigError> {
        Ok(self.cluster)
    }

    fn usdc_mint_override(&self) -> Result<Option<Pubkey>, ConfigError> {
        Ok(self.usdc_mint)
    }
}

/// base58 string <-> Option<Pubkey>
mod opt_pubkey {
    use anchor_lang::prelude::Pubkey;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use std::str::FromStr;

    pub fn serialize<S: Serializer>(value: &Option<Pubkey>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(key) => s.serialize_some(&key.to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Pubkey>, D::Error> {
        Option::<String>::deserialize(d)?
            .map(|raw| Pubkey::from_str(&raw).map_err(D::Error::custom))
            .transpose()
    }
}

/// Signature status polling budget
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConfirmationPolicy {
    pub poll_interval: Duration,
    pub max_attempts: u32,
}

impl Default for ConfirmationPolicy {
    fn default() -> Self {
        Self {
            poll_interval: CONFIRMATION_POLL_INTERVAL,
            max_attempts: CONFIRMATION_MAX_ATTEMPTS,
        }
    }
}

/// Freshness of cached listing views
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RefreshPolicy {
    pub stale_after: Duration,
    pub interval: Duration,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            stale_after: VIEW_STALE_AFTER,
            interval: VIEW_REFRESH_INTERVAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explorer_urls() {
        let sig = "5VERv8NMvzbJMEkV8xnrLkEaWRtSz9CosKDYjCJjBRnbJLgp8uirBgmQpjKhoR4tjF3ZpRzrFmBV6UjKdiSZkQUW";
        assert_eq!(
            Cluster::Devnet.explorer_tx_url(&sig),
            format!("https://explorer.solana.com/tx/{sig}?cluster=devnet")
        );
        assert_eq!(
            Cluster::Mainnet.explorer_tx_url(&sig),
            format!("https://explorer.solana.com/tx/{sig}")
        );
        assert!(Cluster::Localnet
            .explorer_address_url(&Pubkey::default())
            .ends_with("?cluster=custom&customUrl=http%3A%2F%2Flocalhost%3A8899"));
    }

    #[test]
    fn test_cluster_parsing() {
        assert_eq!("mainnet-beta".parse::<Cluster>().unwrap(), Cluster::Mainnet);
        assert_eq!("LOCALHOST".parse::<Cluster>().unwrap(), Cluster::Localnet);
        assert!(matches!(
            "moon".parse::<Cluster>(),
            Err(ConfigError::UnknownCluster(_))
        ));
    }

    #[test]
    fn test_usdc_mint_falls_back_to_cluster_default() {
        let devnet = StaticConfig::default();
        assert_eq!(devnet.usdc_mint().unwrap(), Some(DEVNET_USDC_MINT));

        let localnet = StaticConfig {
            cluster: Cluster::Localnet,
            ..Default::default()
        };
        assert_eq!(localnet.usdc_mint().unwrap(), None);

        let custom = Pubkey::new_unique();
        let overridden = StaticConfig {
            cluster: Cluster::Localnet,
            usdc_mint: Some(custom),
            ..Default::default()
        };
        assert_eq!(overridden.usdc_mint().unwrap(), Some(custom));
    }

    #[test]
    fn test_static_config_from_json() {
        let admin = Pubkey::new_unique();
        let json = format!(r#"{{"admin_wallet":"{admin}","cluster":"localnet"}}"#);
        let config: StaticConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config.admin_wallet, Some(admin));
        assert_eq!(config.cluster, Cluster::Localnet);
        assert_eq!(config.usdc_mint, None);

        assert!(serde_json::from_str::<StaticConfig>(r#"{"admin_wallet":"nope"}"#).is_err());
    }

    #[test]
    fn test_default_policies() {
        let confirmation = ConfirmationPolicy::default();
        assert_eq!(confirmation.poll_interval, Duration::from_millis(1000));
        assert_eq!(confirmation.max_attempts, 30);
        assert_eq!(RefreshPolicy::default().interval, Duration::from_secs(10));
    }
}
