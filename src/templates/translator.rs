use crate::error::TemplateError;
use crate::pools::PoolRegistry;

use super::builder::{BuildOptions, ConfigKind, number, text_or};
use super::data::{ConfigTemplateData, present};
use super::defaults;
use super::render::{TemplateValue, render};

const TEMPLATE: &str = r#"# Local Mining Device Downstream Connection
downstream_address = "0.0.0.0"
downstream_port = 34255


# Version support
max_supported_version = 2
min_supported_version = 2


# Extranonce2 size for downstream connections
# This controls the rollable part of the extranonce for downstream miners
# Max value for CGminer: 8
# Min value: 2
downstream_extranonce2_size = 4


# User identity/username for pool connection
# This will be appended with a counter for each mining client (e.g., username.miner1, username.miner2)
user_identity = "{{USER_IDENTITY}}"


# Aggregate channels: if true, all miners share one upstream channel; if false, each miner gets its own channel
aggregate_channels = {{AGGREGATE_CHANNELS}}


# Enable this option to set a predefined log file path.
# When enabled, logs will always be written to this file.
# The CLI option --log-file (or -f) will override this setting if provided.
# log_file = "./tproxy.log"


{{SUPPORTED_EXTENSIONS_BLOCK}}


{{REQUIRED_EXTENSIONS_BLOCK}}

# Monitoring HTTP server address for exposing channel data (optional)
monitoring_address = "0.0.0.0:9092"

# Difficulty params
[downstream_difficulty_config]
# hashes/s of the weakest miner that will be connecting (e.g.: 10 Th/s = 10_000_000_000_000.0)
min_individual_miner_hashrate= {{MIN_INDIVIDUAL_MINER_HASHRATE}}
# target number of shares per minute the miner should be sending
shares_per_minute = {{SHARES_PER_MINUTE}}
# enable variable difficulty adjustment (true by default, set to false when using with JDC)
enable_vardiff = {{ENABLE_VARDIFF}}
# Interval in seconds for sending keepalive jobs to prevent miner timeout during low upstream activity (set to 0 to disable)
job_keepalive_interval_secs = 60

[[upstreams]]
address = "{{UPSTREAM_ADDRESS}}"
port = {{UPSTREAM_PORT}}
authority_pubkey = "{{AUTHORITY_PUBLIC_KEY}}"
"#;

/// Worker-specific hashrate tracking.
const WORKER_HASHRATE_EXTENSION: &str = "0x0002,  # Worker-Specific Hashrate Tracking";

fn extension_line(active: bool) -> String {
    if active {
        format!("    {WORKER_HASHRATE_EXTENSION}")
    } else {
        format!("#    {WORKER_HASHRATE_EXTENSION}")
    }
}

fn supported_extensions_block(active: bool) -> String {
    format!(
        "# Protocol extensions configuration\n\
         # Extensions that the translator supports (will request if required by server)\n\
         # Example: supported_extensions = [0x0002, 0x0003]\n\
         supported_extensions = [\n{}\n]\n",
        extension_line(active)
    )
}

fn required_extensions_block(active: bool) -> String {
    format!(
        "# Extensions that the translator requires (server must support these)\n\
         # If the upstream server doesn't support these, the translator will fail over to another upstream\n\
         required_extensions = [\n{}\n]\n",
        extension_line(active)
    )
}

/// Where the translator sends its upstream connection.
#[derive(Debug, Clone, PartialEq)]
struct Upstream<'a> {
    address: &'a str,
    port: u16,
    authority_pubkey: &'a str,
    aggregate_channels: bool,
}

/// Translator proxy config.
///
/// Behind a local job declarator client the upstream is the client's listener,
/// vardiff is off and worker hashrate tracking is enabled. Otherwise the
/// upstream is the selected pool for the chosen network, or a local pool when
/// none is selected.
pub fn build(
    data: &ConfigTemplateData,
    options: BuildOptions,
    registry: &PoolRegistry,
) -> Result<String, TemplateError> {
    let network = data.network_or_default();
    let use_jdc = options
        .use_jdc
        .unwrap_or_else(|| present(&data.socket_path).is_some());
    let pool = if use_jdc {
        None
    } else {
        present(&data.selected_pool).and_then(|key| registry.lookup(key, Some(network)))
    };

    let explicit_address = present(&data.upstream_address);
    let explicit_key = present(&data.tproxy_upstream_authority_pubkey)
        .or(present(&data.upstream_authority_pubkey));
    let local_key = present(&data.authority_public_key);

    let upstream = match (&pool, use_jdc) {
        (_, true) => Upstream {
            address: explicit_address.unwrap_or(defaults::LOCALHOST),
            port: data.upstream_port.unwrap_or(defaults::JDC_PORT),
            authority_pubkey: explicit_key
                .or(local_key)
                .unwrap_or(defaults::DEFAULT_AUTHORITY_PUBLIC_KEY),
            aggregate_channels: data.aggregate_channels.unwrap_or(false),
        },
        (Some(pool), false) => Upstream {
            address: explicit_address.unwrap_or(pool.address.as_str()),
            port: data.upstream_port.unwrap_or(pool.port),
            authority_pubkey: explicit_key.unwrap_or(pool.authority_pubkey.as_str()),
            aggregate_channels: data.aggregate_channels.unwrap_or(pool.aggregate_channels),
        },
        (None, false) => Upstream {
            address: explicit_address.unwrap_or(defaults::LOCALHOST),
            port: data.upstream_port.unwrap_or(defaults::POOL_PORT),
            authority_pubkey: explicit_key
                .or(local_key)
                .unwrap_or(defaults::DEFAULT_AUTHORITY_PUBLIC_KEY),
            aggregate_channels: data.aggregate_channels.unwrap_or(true),
        },
    };
    let enable_vardiff = data.enable_vardiff.unwrap_or(!use_jdc);

    tracing::debug!(
        kind = %ConfigKind::Translator,
        use_jdc,
        upstream_address = upstream.address,
        upstream_port = upstream.port,
        "resolved translator upstream"
    );

    render(
        ConfigKind::Translator.as_str(),
        TEMPLATE,
        &[
            (
                "USER_IDENTITY",
                TemplateValue::text(text_or(&data.user_identity, defaults::USER_IDENTITY)),
            ),
            ("ENABLE_VARDIFF", TemplateValue::Bool(enable_vardiff)),
            ("AGGREGATE_CHANNELS", TemplateValue::Bool(upstream.aggregate_channels)),
            ("UPSTREAM_ADDRESS", TemplateValue::text(upstream.address)),
            ("UPSTREAM_PORT", TemplateValue::Integer(upstream.port.into())),
            ("AUTHORITY_PUBLIC_KEY", TemplateValue::text(upstream.authority_pubkey)),
            (
                "MIN_INDIVIDUAL_MINER_HASHRATE",
                number(
                    data.min_individual_miner_hashrate,
                    defaults::MIN_INDIVIDUAL_MINER_HASHRATE,
                ),
            ),
            (
                "SHARES_PER_MINUTE",
                number(
                    data.shares_per_minute.or(data.client_shares_per_minute),
                    defaults::SHARES_PER_MINUTE,
                ),
            ),
            (
                "SUPPORTED_EXTENSIONS_BLOCK",
                TemplateValue::Block(supported_extensions_block(use_jdc)),
            ),
            (
                "REQUIRED_EXTENSIONS_BLOCK",
                TemplateValue::Block(required_extensions_block(use_jdc)),
            ),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::Network;
    use crate::pools::pool_keys;

    fn build_default(data: &ConfigTemplateData, use_jdc: Option<bool>) -> String {
        build(data, BuildOptions { use_jdc }, PoolRegistry::builtin()).unwrap()
    }

    #[test]
    fn behind_jdc_disables_vardiff_and_enables_extension() {
        let out = build_default(&ConfigTemplateData::default(), Some(true));
        assert!(out.contains("enable_vardiff = false"));
        assert!(out.contains("aggregate_channels = false"));
        assert!(out.contains("address = \"127.0.0.1\"\nport = 34265"));
        assert!(out.contains("supported_extensions = [\n    0x0002,"));
        assert!(out.contains("required_extensions = [\n    0x0002,"));
    }

    #[test]
    fn direct_to_pool_keeps_vardiff_and_comments_extension() {
        let data = ConfigTemplateData::default().with_selected_pool(pool_keys::BRAIINS);
        let out = build_default(&data, Some(false));
        assert!(out.contains("enable_vardiff = true"));
        assert!(out.contains("aggregate_channels = true"));
        assert!(out.contains("address = \"107.170.42.64\"\nport = 3333"));
        assert!(out.contains(
            "authority_pubkey = \"9awtMD5KQgvRUh2yFbjVeT7b6hjipWcAsQHd6wEhgtDT9soosna\""
        ));
        assert!(out.contains("supported_extensions = [\n#    0x0002,"));
        assert!(out.contains("required_extensions = [\n#    0x0002,"));
    }

    #[test]
    fn pool_aggregation_default_is_used() {
        let data = ConfigTemplateData::default().with_selected_pool(pool_keys::COMMUNITY_SRI);
        let out = build_default(&data, Some(false));
        assert!(out.contains("aggregate_channels = false"));
    }

    #[test]
    fn explicit_aggregation_wins_over_pool() {
        let data = ConfigTemplateData {
            aggregate_channels: Some(false),
            ..ConfigTemplateData::default().with_selected_pool(pool_keys::BRAIINS)
        };
        let out = build_default(&data, Some(false));
        assert!(out.contains("aggregate_channels = false"));
    }

    #[test]
    fn no_pool_means_local_pool_with_aggregation() {
        let out = build_default(&ConfigTemplateData::default(), Some(false));
        assert!(out.contains("aggregate_channels = true"));
        assert!(out.contains("address = \"127.0.0.1\"\nport = 34254"));
    }

    #[test]
    fn socket_path_implies_jdc() {
        let data = ConfigTemplateData {
            socket_path: Some("/home/me/.bitcoin/node.sock".into()),
            ..Default::default()
        };
        let out = build_default(&data, None);
        assert!(out.contains("enable_vardiff = false"));
        assert!(out.contains("port = 34265"));
    }

    #[test]
    fn translator_key_is_used_behind_jdc() {
        let data = ConfigTemplateData {
            tproxy_upstream_authority_pubkey: Some("MyJdcKey".into()),
            ..ConfigTemplateData::default().with_selected_pool(pool_keys::BRAIINS)
        };
        let out = build_default(&data, Some(true));
        assert!(out.contains("authority_pubkey = \"MyJdcKey\""));
    }

    #[test]
    fn negative_hashrate_is_rejected() {
        let data = ConfigTemplateData {
            min_individual_miner_hashrate: Some(-1.0),
            ..Default::default()
        };
        let err = build(&data, BuildOptions::default(), PoolRegistry::builtin()).unwrap_err();
        assert!(matches!(err, TemplateError::InvalidFieldValue { field, .. }
            if field == "min_individual_miner_hashrate"));
    }

    #[test]
    fn explicit_vardiff_wins() {
        let data = ConfigTemplateData {
            enable_vardiff: Some(true),
            ..Default::default()
        };
        let out = build_default(&data, Some(true));
        assert!(out.contains("enable_vardiff = true"));
    }

    #[test]
    fn testnet4_pool_override_applies() {
        let data = ConfigTemplateData::default()
            .with_network(Network::Testnet4)
            .with_selected_pool(pool_keys::COMMUNITY_SRI);
        let out = build_default(&data, Some(false));
        assert!(out.contains("port = 43333"));
    }

    #[test]
    fn hashrate_renders_without_exponent() {
        let out = build_default(&ConfigTemplateData::default(), Some(false));
        assert!(out.contains("min_individual_miner_hashrate= 10000000000000\n"));
        assert!(out.contains("shares_per_minute = 6\n"));
    }
}
