//! Pool registry: catalog of known upstream pools with per-network overrides.

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::network::Network;

/// Connection parameters of a known upstream pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolEntry {
    pub name: String,
    pub address: String,
    pub port: u16,
    pub authority_pubkey: String,
    /// Default for the translator's `aggregate_channels` when this pool is the upstream.
    pub aggregate_channels: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jds_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jds_port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub networks: HashMap<Network, PoolOverride>,
}

/// Partial pool parameters for a single network. Unset fields keep the base value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authority_pubkey: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate_channels: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jds_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jds_port: Option<u16>,
}

impl PoolEntry {
    /// Shallow-merge an override onto this entry.
    fn with_override(&self, o: &PoolOverride) -> PoolEntry {
        PoolEntry {
            name: o.name.clone().unwrap_or_else(|| self.name.clone()),
            address: o.address.clone().unwrap_or_else(|| self.address.clone()),
            port: o.port.unwrap_or(self.port),
            authority_pubkey: o
                .authority_pubkey
                .clone()
                .unwrap_or_else(|| self.authority_pubkey.clone()),
            aggregate_channels: o.aggregate_channels.unwrap_or(self.aggregate_channels),
            jds_address: o.jds_address.clone().or_else(|| self.jds_address.clone()),
            jds_port: o.jds_port.or(self.jds_port),
            icon_url: self.icon_url.clone(),
            networks: self.networks.clone(),
        }
    }

    /// Whether the pool exposes a job declarator server.
    pub fn supports_job_declaration(&self) -> bool {
        self.jds_address.is_some() && self.jds_port.is_some()
    }
}

/// Read-only registry of pools keyed by their selection value.
#[derive(Debug, Clone, Default)]
pub struct PoolRegistry {
    pools: HashMap<String, PoolEntry>,
}

impl PoolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from `(key, entry)` pairs.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, PoolEntry)>,
    {
        Self {
            pools: entries.into_iter().collect(),
        }
    }

    /// Parse a JSON object mapping pool keys to entries.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let pools: HashMap<String, PoolEntry> =
            serde_json::from_str(json).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        Ok(Self { pools })
    }

    /// The process-wide catalog of pools the wizard offers.
    pub fn builtin() -> &'static PoolRegistry {
        static BUILTIN: OnceLock<PoolRegistry> = OnceLock::new();
        BUILTIN.get_or_init(builtin_catalog)
    }

    /// Resolve a pool, applying the override for `network` when one exists.
    ///
    /// Unknown keys resolve to `None`; callers fall back to local defaults.
    pub fn lookup(&self, key: &str, network: Option<Network>) -> Option<PoolEntry> {
        let base = self.pools.get(key)?;
        let resolved = match network.and_then(|n| base.networks.get(&n)) {
            Some(o) => base.with_override(o),
            None => base.clone(),
        };
        tracing::debug!(
            pool = key,
            network = ?network,
            address = %resolved.address,
            port = resolved.port,
            "Resolved pool entry"
        );
        Some(resolved)
    }

    /// Check if a pool key is registered.
    pub fn contains(&self, key: &str) -> bool {
        self.pools.contains_key(key)
    }

    /// List all pool keys, sorted.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.pools.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Number of registered pools.
    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}

/// Pool selection keys used by the built-in flows.
pub mod pool_keys {
    pub const BRAIINS: &str = "braiins";
    pub const COMMUNITY_SRI: &str = "community_sri";
    pub const DEMAND: &str = "demand";
}

fn builtin_catalog() -> PoolRegistry {
    let braiins = PoolEntry {
        name: "Braiins Pool".to_string(),
        address: "107.170.42.64".to_string(),
        port: 3333,
        authority_pubkey: "9awtMD5KQgvRUh2yFbjVeT7b6hjipWcAsQHd6wEhgtDT9soosna".to_string(),
        aggregate_channels: true,
        jds_address: None,
        jds_port: None,
        icon_url: Some("https://avatars.githubusercontent.com/u/9007738?s=280&v=4".to_string()),
        networks: HashMap::new(),
    };

    let community_sri = PoolEntry {
        name: "Community SRI Pool".to_string(),
        address: "75.119.150.111".to_string(),
        port: 3333,
        authority_pubkey: "9auqWEzQDVyd2oe1JVGFLMLHZtCo2FFqZwtKA5gd9xbuEu7PH72".to_string(),
        aggregate_channels: false,
        jds_address: Some("75.119.150.111".to_string()),
        jds_port: Some(3334),
        icon_url: Some("https://stratumprotocol.org/assets/sv2-logo.png".to_string()),
        networks: HashMap::from([
            (
                Network::Mainnet,
                PoolOverride {
                    port: Some(3333),
                    jds_port: Some(3334),
                    ..Default::default()
                },
            ),
            (
                Network::Testnet4,
                PoolOverride {
                    port: Some(43333),
                    jds_port: Some(43334),
                    ..Default::default()
                },
            ),
        ]),
    };

    // DMND endpoints are placeholders until the pool opens publicly.
    let demand = PoolEntry {
        name: "DMND".to_string(),
        address: "127.0.0.1".to_string(),
        port: 34254,
        authority_pubkey: "9auqWEzQDVyd2oe1JVGFLMLHZtCo2FFqZwtKA5gd9xbuEu7PH72".to_string(),
        aggregate_channels: false,
        jds_address: Some("127.0.0.1".to_string()),
        jds_port: Some(34264),
        icon_url: None,
        networks: HashMap::new(),
    };

    PoolRegistry::from_entries([
        (pool_keys::BRAIINS.to_string(), braiins),
        (pool_keys::COMMUNITY_SRI.to_string(), community_sri),
        (pool_keys::DEMAND.to_string(), demand),
    ])
}
