//! Config kind dispatch and shared field resolution.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TemplateError;
use crate::pools::PoolRegistry;

use super::data::{ConfigTemplateData, present};
use super::defaults;
use super::render::{TemplateValue, validate_quoted};
use super::{jd_client, jds, pool_server, translator};

/// The four artifacts the builder can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConfigKind {
    JdClient,
    Translator,
    PoolServer,
    Jds,
}

impl ConfigKind {
    pub const ALL: [ConfigKind; 4] = [
        ConfigKind::JdClient,
        ConfigKind::Translator,
        ConfigKind::PoolServer,
        ConfigKind::Jds,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigKind::JdClient => "jd-client",
            ConfigKind::Translator => "translator",
            ConfigKind::PoolServer => "pool-server",
            ConfigKind::Jds => "jds",
        }
    }

    /// Suggested file name for the rendered artifact.
    pub fn file_name(&self) -> &'static str {
        match self {
            ConfigKind::JdClient => "jd-client-config.toml",
            ConfigKind::Translator => "translator-config.toml",
            ConfigKind::PoolServer => "pool-config.toml",
            ConfigKind::Jds => "jd-server-config.toml",
        }
    }
}

impl fmt::Display for ConfigKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigKind {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConfigKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| TemplateError::UnknownConfigKind(s.to_string()))
    }
}

/// Options that only some kinds read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Translator only: route through a local job declarator client. When
    /// unset, a node socket path in the data implies `true`.
    pub use_jdc: Option<bool>,
}

impl BuildOptions {
    pub fn use_jdc(use_jdc: bool) -> Self {
        Self {
            use_jdc: Some(use_jdc),
        }
    }
}

/// Render `kind` against the built-in pool registry.
pub fn build(
    kind: ConfigKind,
    data: &ConfigTemplateData,
    options: BuildOptions,
) -> Result<String, TemplateError> {
    build_with(PoolRegistry::builtin(), kind, data, options)
}

/// Render `kind` against an explicit pool registry.
pub fn build_with(
    registry: &PoolRegistry,
    kind: ConfigKind,
    data: &ConfigTemplateData,
    options: BuildOptions,
) -> Result<String, TemplateError> {
    match kind {
        ConfigKind::JdClient => jd_client::build(data, registry),
        ConfigKind::Translator => translator::build(data, options, registry),
        ConfigKind::PoolServer => pool_server::build(data),
        ConfigKind::Jds => jds::build(data),
    }
}

/// Fields of `kind` that would be filled from well-known placeholder values.
///
/// An artifact with any of these still runs, but it shares keys, credentials
/// or a payout address with every other default deployment.
pub fn insecure_defaults_used(kind: ConfigKind, data: &ConfigTemplateData) -> Vec<&'static str> {
    let keys = [
        ("authority_public_key", &data.authority_public_key),
        ("authority_secret_key", &data.authority_secret_key),
    ];
    let candidates: Vec<(&'static str, &Option<String>)> = match kind {
        ConfigKind::JdClient => keys
            .into_iter()
            .chain([
                ("user_identity", &data.user_identity),
                ("coinbase_reward_address", &data.coinbase_reward_address),
            ])
            .collect(),
        ConfigKind::Translator => vec![("user_identity", &data.user_identity)],
        ConfigKind::PoolServer => keys
            .into_iter()
            .chain([("pool_payout_address", &data.pool_payout_address)])
            .collect(),
        ConfigKind::Jds => keys
            .into_iter()
            .chain([
                ("pool_payout_address", &data.pool_payout_address),
                ("core_rpc_user", &data.core_rpc_user),
                ("core_rpc_pass", &data.core_rpc_pass),
            ])
            .collect(),
    };

    let mut missing: Vec<&'static str> = candidates
        .into_iter()
        .filter(|(_, value)| present(value).is_none())
        .map(|(field, _)| field)
        .collect();

    // Without a pool or any key, the translator trusts the example key.
    if kind == ConfigKind::Translator
        && present(&data.tproxy_upstream_authority_pubkey).is_none()
        && present(&data.upstream_authority_pubkey).is_none()
        && present(&data.authority_public_key).is_none()
        && present(&data.selected_pool).is_none()
    {
        missing.push("upstream_authority_pubkey");
    }
    missing
}

/// Explicit non-blank text, else `fallback`.
pub(crate) fn text_or<'a>(value: &'a Option<String>, fallback: &'a str) -> &'a str {
    present(value).unwrap_or(fallback)
}

/// Explicit number (zero included), else `fallback`.
pub(crate) fn number(value: Option<f64>, fallback: f64) -> TemplateValue {
    TemplateValue::Number(value.unwrap_or(fallback))
}

/// Like [`number`], for fields the applications read as integers.
pub(crate) fn whole(value: Option<f64>, fallback: f64) -> TemplateValue {
    TemplateValue::Whole(value.unwrap_or(fallback))
}

/// `data_dir = "<dir>"` when a custom node data dir was given, else a
/// commented example line.
pub(crate) fn data_dir_line(data: &ConfigTemplateData) -> Result<TemplateValue, TemplateError> {
    match present(&data.data_dir) {
        Some(dir) => {
            validate_quoted("data_dir", dir)?;
            Ok(TemplateValue::Block(format!("data_dir = \"{dir}\"")))
        }
        None => Ok(TemplateValue::Block(defaults::DATA_DIR_EXAMPLE_LINE.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::Network;
    use crate::pools::pool_keys;

    fn full_data() -> ConfigTemplateData {
        ConfigTemplateData {
            authority_public_key: Some("PubKey".into()),
            authority_secret_key: Some("SecKey".into()),
            user_identity: Some("alice".into()),
            coinbase_reward_address: Some("bc1qalice".into()),
            pool_payout_address: Some("bc1qpool".into()),
            core_rpc_user: Some("rpc".into()),
            core_rpc_pass: Some("hunter2".into()),
            ..Default::default()
        }
    }

    #[test]
    fn kind_parses_from_str() {
        for kind in ConfigKind::ALL {
            assert_eq!(kind.as_str().parse::<ConfigKind>().unwrap(), kind);
        }
        assert_eq!(
            "proxy".parse::<ConfigKind>().unwrap_err(),
            TemplateError::UnknownConfigKind("proxy".into())
        );
    }

    #[test]
    fn every_kind_renders_without_leftover_tokens() {
        for kind in ConfigKind::ALL {
            for data in [ConfigTemplateData::default(), full_data()] {
                let out = build(kind, &data, BuildOptions::default()).unwrap();
                assert!(!out.contains("{{"), "{kind}");
                assert!(!out.contains("}}"), "{kind}");
            }
        }
    }

    #[test]
    fn build_is_deterministic() {
        let data = full_data()
            .with_network(Network::Testnet4)
            .with_selected_pool(pool_keys::COMMUNITY_SRI);
        for kind in ConfigKind::ALL {
            let a = build(kind, &data, BuildOptions::use_jdc(true)).unwrap();
            let b = build(kind, &data, BuildOptions::use_jdc(true)).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn custom_registry_is_consulted() {
        let registry = PoolRegistry::from_json(
            r#"{"mine": {"name": "Mine", "address": "10.0.0.5", "port": 4444,
                "authority_pubkey": "MineKey", "aggregate_channels": true}}"#,
        )
        .unwrap();
        let data = ConfigTemplateData::default().with_selected_pool("mine");
        let out = build_with(&registry, ConfigKind::Translator, &data, BuildOptions::use_jdc(false))
            .unwrap();
        assert!(out.contains("address = \"10.0.0.5\"\nport = 4444"));
        assert!(out.contains("authority_pubkey = \"MineKey\""));
    }

    #[test]
    fn insecure_defaults_reported() {
        let flagged = insecure_defaults_used(ConfigKind::Jds, &ConfigTemplateData::default());
        assert_eq!(
            flagged,
            vec![
                "authority_public_key",
                "authority_secret_key",
                "pool_payout_address",
                "core_rpc_user",
                "core_rpc_pass"
            ]
        );
        for kind in ConfigKind::ALL {
            assert!(insecure_defaults_used(kind, &full_data()).is_empty(), "{kind}");
        }
    }

    #[test]
    fn file_names() {
        assert_eq!(ConfigKind::PoolServer.file_name(), "pool-config.toml");
        assert_eq!(ConfigKind::Jds.file_name(), "jd-server-config.toml");
    }
}
