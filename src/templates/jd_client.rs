use crate::error::TemplateError;
use crate::pools::PoolRegistry;

use super::builder::{ConfigKind, data_dir_line, number, text_or, whole};
use super::data::{ConfigTemplateData, present};
use super::defaults;
use super::render::{TemplateValue, render};

const TEMPLATE: &str = r#"# SRI JDC config

listening_address = "127.0.0.1:34265"


# Version support
max_supported_version = 2
min_supported_version = 2


# Auth keys for open encrypted connection downstream
authority_public_key = "{{AUTHORITY_PUBLIC_KEY}}"
authority_secret_key = "{{AUTHORITY_SECRET_KEY}}"
cert_validity_sec = 3600


# User identity/username for pool connection
user_identity = "{{USER_IDENTITY}}"


# How many shares we expect to receive in a minute (determines difficulty targets)
shares_per_minute = {{SHARES_PER_MINUTE}}


# How many shares do we want to acknowledge in a batch
share_batch_size = {{SHARE_BATCH_SIZE}}


# JDC supports two modes:
# "FULLTEMPLATE"  - full template mining
# "COINBASEONLY" - coinbase-only mining
mode = "FULLTEMPLATE"


# string to be added into the Coinbase scriptSig
jdc_signature = "{{JDC_SIGNATURE}}"


# Solo Mining config
# Coinbase output used to build the coinbase tx in case of Solo Mining (as last-resort solution of the pools fallback system)
#
# Coinbase outputs are specified as descriptors. A full list of descriptors is available at
#     https://github.com/bitcoin/bips/blob/master/bip-0380.mediawiki#appendix-b-index-of-script-expressions
# Although the `musig` descriptor is not yet supported and the legacy `combo` descriptor never
# will be. If you have an address, embed it in a descriptor like `addr(<address here>)`.
coinbase_reward_script = "addr({{COINBASE_REWARD_SCRIPT}})"


# Enable this option to set a predefined log file path.
# When enabled, logs will always be written to this file.
# The CLI option --log-file (or -f) will override this setting if provided.
# log_file = "./jd-client.log"


# Protocol Extensions Configuration
# Extensions that the JDC supports (will accept if requested by downstream clients)
# Comment/uncomment to enable/disable specific extensions:
supported_extensions = [
    0x0002,  # Worker-Specific Hashrate Tracking
]


# Extensions that the JDC requires (downstream clients must support these to connect)
# Use with caution - requiring extensions may prevent some clients from connecting
required_extensions = [
    # Example: require Worker-Specific Hashrate Tracking
    # 0x0002,
]


# Monitoring HTTP server address for exposing channel data (optional)
monitoring_address = "0.0.0.0:9091"

# List of upstreams (Pool and JDS) used as backup endpoints
# In case of shares refused by the Pool or JDS, the fallback system will propose the same job to the next upstream in this list
[[upstreams]]
authority_pubkey = "{{UPSTREAM_AUTHORITY_PUBKEY}}"
pool_address = "{{JDC_POOL_ADDRESS}}"
pool_port = {{JDC_POOL_PORT}}
jds_address = "{{JDC_UPSTREAM_JDS_ADDRESS}}"
jds_port = {{JDC_UPSTREAM_JDS_PORT}}

# Bitcoin Core IPC config
# Supported networks: mainnet, testnet4, signet, regtest
# Default data_dir: ~/.bitcoin (Linux) or ~/Library/Application Support/Bitcoin (macOS)
[template_provider_type.BitcoinCoreIpc]
network = "{{NETWORK}}"
{{DATA_DIR_LINE}}
fee_threshold = {{FEE_THRESHOLD}}
min_interval = {{MIN_INTERVAL}}
"#;

/// Job declarator client config.
///
/// The upstream pool and JDS endpoints come from the selected pool's entry for
/// the chosen network, falling back to a pool and JDS on localhost.
pub fn build(data: &ConfigTemplateData, registry: &PoolRegistry) -> Result<String, TemplateError> {
    let network = data.network_or_default();
    let pool = present(&data.selected_pool).and_then(|key| registry.lookup(key, Some(network)));

    let local_key = text_or(&data.authority_public_key, defaults::DEFAULT_AUTHORITY_PUBLIC_KEY);
    let upstream_key = present(&data.upstream_authority_pubkey)
        .or(pool.as_ref().map(|p| p.authority_pubkey.as_str()))
        .unwrap_or(local_key);

    let pool_address = pool.as_ref().map_or(defaults::LOCALHOST, |p| p.address.as_str());
    let pool_port = pool.as_ref().map_or(defaults::POOL_PORT, |p| p.port);
    let jds_address = pool
        .as_ref()
        .and_then(|p| p.jds_address.as_deref())
        .unwrap_or(defaults::LOCALHOST);
    let jds_port = pool
        .as_ref()
        .and_then(|p| p.jds_port)
        .unwrap_or(defaults::JDS_PORT);

    tracing::debug!(
        kind = %ConfigKind::JdClient,
        network = %network,
        pool = pool.as_ref().map(|p| p.name.as_str()),
        "resolved job declarator upstream"
    );

    render(
        ConfigKind::JdClient.as_str(),
        TEMPLATE,
        &[
            ("AUTHORITY_PUBLIC_KEY", TemplateValue::text(local_key)),
            (
                "AUTHORITY_SECRET_KEY",
                TemplateValue::text(text_or(
                    &data.authority_secret_key,
                    defaults::DEFAULT_AUTHORITY_SECRET_KEY,
                )),
            ),
            (
                "USER_IDENTITY",
                TemplateValue::text(text_or(&data.user_identity, defaults::USER_IDENTITY)),
            ),
            (
                "JDC_SIGNATURE",
                TemplateValue::text(text_or(&data.jdc_signature, defaults::JDC_SIGNATURE)),
            ),
            (
                "COINBASE_REWARD_SCRIPT",
                TemplateValue::text(text_or(
                    &data.coinbase_reward_address,
                    network.address_placeholder(),
                )),
            ),
            (
                "SHARES_PER_MINUTE",
                number(
                    data.shares_per_minute.or(data.client_shares_per_minute),
                    defaults::SHARES_PER_MINUTE,
                ),
            ),
            (
                "SHARE_BATCH_SIZE",
                whole(data.share_batch_size, defaults::SHARE_BATCH_SIZE),
            ),
            ("FEE_THRESHOLD", whole(data.fee_threshold, defaults::FEE_THRESHOLD)),
            ("MIN_INTERVAL", whole(data.min_interval, defaults::MIN_INTERVAL)),
            ("UPSTREAM_AUTHORITY_PUBKEY", TemplateValue::text(upstream_key)),
            ("JDC_POOL_ADDRESS", TemplateValue::text(pool_address)),
            ("JDC_POOL_PORT", TemplateValue::Integer(pool_port.into())),
            ("JDC_UPSTREAM_JDS_ADDRESS", TemplateValue::text(jds_address)),
            ("JDC_UPSTREAM_JDS_PORT", TemplateValue::Integer(jds_port.into())),
            ("NETWORK", TemplateValue::text(network.as_str())),
            ("DATA_DIR_LINE", data_dir_line(data)?),
        ],
    )
}
