//! Session data accumulated across the wizard lifetime.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A scalar answer value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SessionValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl SessionValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<&str> for SessionValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for SessionValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for SessionValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<u32> for SessionValue {
    fn from(n: u32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<bool> for SessionValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl std::fmt::Display for SessionValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Field name → answer mapping. Keys are only removed by [`SessionData::clear`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionData {
    fields: BTreeMap<String, SessionValue>,
}

impl SessionData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `patch` into `self`; patch keys overwrite existing keys.
    pub fn merge(&mut self, patch: &SessionData) {
        for (key, value) in &patch.fields {
            self.fields.insert(key.clone(), value.clone());
        }
    }

    /// Non-mutating form of [`SessionData::merge`].
    pub fn merged(&self, patch: &SessionData) -> SessionData {
        let mut out = self.clone();
        out.merge(patch);
        out
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<SessionValue>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Builder-style [`SessionData::set`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<SessionValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&SessionValue> {
        self.fields.get(key)
    }

    /// Text value for `key`; blank strings count as unanswered.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key)
            .and_then(SessionValue::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    /// Numeric value for `key`. Numeric text (as typed into a form) is accepted.
    pub fn number(&self, key: &str) -> Option<f64> {
        match self.get(key)? {
            SessionValue::Number(n) => Some(*n),
            SessionValue::Text(s) => s.trim().parse().ok(),
            SessionValue::Bool(_) => None,
        }
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            SessionValue::Bool(b) => Some(*b),
            SessionValue::Text(s) => match s.trim() {
                "true" | "yes" => Some(true),
                "false" | "no" => Some(false),
                _ => None,
            },
            SessionValue::Number(_) => None,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SessionValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Drop every field. Only the engine's reset calls this.
    pub fn clear(&mut self) {
        self.fields.clear();
    }
}

impl<K: Into<String>, V: Into<SessionValue>> FromIterator<(K, V)> for SessionData {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Session field names written by the built-in flows and read by the
/// template mapping.
pub mod fields {
    pub const SELECTED_POOL: &str = "selected_pool";
    pub const SELECTED_NETWORK: &str = "selected_network";
    pub const CONSTRUCT_TEMPLATES: &str = "construct_templates";
    pub const DEPLOYMENT_METHOD: &str = "deployment_method";

    pub const BITCOIN_SOCKET_PATH: &str = "bitcoin_socket_path";
    pub const BITCOIN_DATA_DIR: &str = "bitcoin_data_dir";

    pub const USER_IDENTITY: &str = "user_identity";
    pub const JDC_SIGNATURE: &str = "jdc_signature";
    pub const COINBASE_REWARD_ADDRESS: &str = "coinbase_reward_address";
    pub const CLIENT_SHARES_PER_MINUTE: &str = "client_shares_per_minute";
    pub const CLIENT_SHARE_BATCH_SIZE: &str = "client_share_batch_size";
    pub const CLIENT_FEE_THRESHOLD: &str = "client_fee_threshold";
    pub const CLIENT_MIN_INTERVAL: &str = "client_min_interval";

    pub const MIN_INDIVIDUAL_MINER_HASHRATE: &str = "min_individual_miner_hashrate";
    pub const AGGREGATE_CHANNELS: &str = "aggregate_channels";
    pub const TPROXY_UPSTREAM_AUTHORITY_PUBKEY: &str = "tproxy_upstream_authority_pubkey";

    pub const POOL_SIGNATURE: &str = "pool_signature";
    pub const POOL_PAYOUT_ADDRESS: &str = "pool_payout_address";
    pub const LISTEN_ADDRESS: &str = "listen_address";
    pub const SHARES_PER_MINUTE: &str = "shares_per_minute";
    pub const SHARE_BATCH_SIZE: &str = "share_batch_size";
    pub const FEE_THRESHOLD: &str = "fee_threshold";
    pub const MIN_INTERVAL: &str = "min_interval";

    pub const CORE_RPC_USER: &str = "core_rpc_user";
    pub const CORE_RPC_PASS: &str = "core_rpc_pass";
}
