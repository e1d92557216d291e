//! Input snapshot for the config builders.

use serde::{Deserialize, Serialize};

use crate::network::Network;
use crate::wizard::session::{SessionData, fields};

/// Everything a builder may read. Every field is optional; builders fall back
/// to the pool registry and then to [`defaults`](super::defaults).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ConfigTemplateData {
    pub authority_public_key: Option<String>,
    pub authority_secret_key: Option<String>,

    pub user_identity: Option<String>,

    pub network: Option<Network>,
    pub socket_path: Option<String>,
    pub data_dir: Option<String>,

    pub pool_signature: Option<String>,
    pub pool_payout_address: Option<String>,
    pub listen_address: Option<String>,

    pub jdc_signature: Option<String>,
    pub coinbase_reward_address: Option<String>,

    pub shares_per_minute: Option<f64>,
    pub share_batch_size: Option<f64>,
    pub min_individual_miner_hashrate: Option<f64>,
    pub client_shares_per_minute: Option<f64>,

    pub fee_threshold: Option<f64>,
    pub min_interval: Option<f64>,

    pub aggregate_channels: Option<bool>,
    pub enable_vardiff: Option<bool>,

    pub core_rpc_url: Option<String>,
    pub core_rpc_port: Option<u16>,
    pub core_rpc_user: Option<String>,
    pub core_rpc_pass: Option<String>,

    pub upstream_address: Option<String>,
    pub upstream_port: Option<u16>,
    /// Pool authority key for the job declarator client; overrides the
    /// selected pool's key.
    pub upstream_authority_pubkey: Option<String>,
    /// Key of whatever the translator connects to. Behind a job declarator
    /// client that is the operator's own client, never the pool.
    pub tproxy_upstream_authority_pubkey: Option<String>,

    pub selected_pool: Option<String>,
}

/// Non-blank text.
pub(crate) fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

impl ConfigTemplateData {
    /// Snapshot the answers a wizard session accumulated.
    ///
    /// Client-side share settings collected on the job declarator form fill the
    /// shared fields unless the pool form already set them.
    pub fn from_session(data: &SessionData) -> Self {
        let text = |key: &str| data.text(key).map(str::to_string);
        let first_number = |keys: &[&str]| keys.iter().find_map(|key| data.number(key));

        Self {
            user_identity: text(fields::USER_IDENTITY),
            network: data.text(fields::SELECTED_NETWORK).and_then(Network::parse),
            socket_path: text(fields::BITCOIN_SOCKET_PATH),
            data_dir: text(fields::BITCOIN_DATA_DIR),
            pool_signature: text(fields::POOL_SIGNATURE),
            pool_payout_address: text(fields::POOL_PAYOUT_ADDRESS),
            listen_address: text(fields::LISTEN_ADDRESS),
            jdc_signature: text(fields::JDC_SIGNATURE),
            coinbase_reward_address: text(fields::COINBASE_REWARD_ADDRESS),
            shares_per_minute: data.number(fields::SHARES_PER_MINUTE),
            share_batch_size: first_number(&[
                fields::SHARE_BATCH_SIZE,
                fields::CLIENT_SHARE_BATCH_SIZE,
            ]),
            min_individual_miner_hashrate: data.number(fields::MIN_INDIVIDUAL_MINER_HASHRATE),
            client_shares_per_minute: data.number(fields::CLIENT_SHARES_PER_MINUTE),
            fee_threshold: first_number(&[fields::FEE_THRESHOLD, fields::CLIENT_FEE_THRESHOLD]),
            min_interval: first_number(&[fields::MIN_INTERVAL, fields::CLIENT_MIN_INTERVAL]),
            aggregate_channels: data.flag(fields::AGGREGATE_CHANNELS),
            core_rpc_user: text(fields::CORE_RPC_USER),
            core_rpc_pass: text(fields::CORE_RPC_PASS),
            tproxy_upstream_authority_pubkey: text(fields::TPROXY_UPSTREAM_AUTHORITY_PUBKEY),
            selected_pool: text(fields::SELECTED_POOL),
            ..Self::default()
        }
    }

    pub fn network_or_default(&self) -> Network {
        self.network.unwrap_or_default()
    }

    /// Builder-style setter used by tests and callers that skip the wizard.
    pub fn with_network(mut self, network: Network) -> Self {
        self.network = Some(network);
        self
    }

    pub fn with_selected_pool(mut self, pool: impl Into<String>) -> Self {
        self.selected_pool = Some(pool.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_pool_connection_answers() {
        let session = SessionData::new()
            .with(fields::SELECTED_NETWORK, "testnet4")
            .with(fields::SELECTED_POOL, "community_sri")
            .with(fields::USER_IDENTITY, "alice")
            .with(fields::CLIENT_SHARE_BATCH_SIZE, 20u32)
            .with(fields::CLIENT_FEE_THRESHOLD, "250")
            .with(fields::AGGREGATE_CHANNELS, false)
            .with(fields::BITCOIN_SOCKET_PATH, "/tmp/node.sock");

        let data = ConfigTemplateData::from_session(&session);
        assert_eq!(data.network, Some(Network::Testnet4));
        assert_eq!(data.selected_pool.as_deref(), Some("community_sri"));
        assert_eq!(data.share_batch_size, Some(20.0));
        assert_eq!(data.fee_threshold, Some(250.0));
        assert_eq!(data.aggregate_channels, Some(false));
        assert_eq!(data.socket_path.as_deref(), Some("/tmp/node.sock"));
        assert_eq!(data.shares_per_minute, None);
    }

    #[test]
    fn translator_key_stays_with_the_translator() {
        let session =
            SessionData::new().with(fields::TPROXY_UPSTREAM_AUTHORITY_PUBKEY, "MyJdcKey");
        let data = ConfigTemplateData::from_session(&session);
        assert_eq!(data.tproxy_upstream_authority_pubkey.as_deref(), Some("MyJdcKey"));
        assert_eq!(data.upstream_authority_pubkey, None);
    }

    #[test]
    fn pool_form_values_win_over_client_values() {
        let session = SessionData::new()
            .with(fields::SHARE_BATCH_SIZE, 5u32)
            .with(fields::CLIENT_SHARE_BATCH_SIZE, 20u32);
        let data = ConfigTemplateData::from_session(&session);
        assert_eq!(data.share_batch_size, Some(5.0));
    }

    #[test]
    fn blank_answers_are_absent() {
        let session = SessionData::new()
            .with(fields::USER_IDENTITY, "   ")
            .with(fields::SELECTED_NETWORK, "regtest");
        let data = ConfigTemplateData::from_session(&session);
        assert_eq!(data.user_identity, None);
        assert_eq!(data.network, None);
        assert_eq!(data.aggregate_channels, None);
        assert_eq!(data.network_or_default(), Network::Mainnet);
    }

    #[test]
    fn present_filters_blank() {
        assert_eq!(present(&Some("x".into())), Some("x"));
        assert_eq!(present(&Some("".into())), None);
        assert_eq!(present(&None), None);
    }
}
