use crate::error::TemplateError;

use super::builder::{ConfigKind, text_or};
use super::data::ConfigTemplateData;
use super::defaults;
use super::render::{TemplateValue, render};

const TEMPLATE: &str = r#"# SRI JDS config
authority_public_key = "{{AUTHORITY_PUBLIC_KEY}}"
authority_secret_key = "{{AUTHORITY_SECRET_KEY}}"
cert_validity_sec = 3600

# Coinbase outputs are specified as descriptors. A full list of descriptors is available at
#     https://github.com/bitcoin/bips/blob/master/bip-0380.mediawiki#appendix-b-index-of-script-expressions
coinbase_reward_script = "{{COINBASE_REWARD_SCRIPT}}"

# Enable this option to set a predefined log file path.
# When enabled, logs will always be written to this file.
# The CLI option --log-file (or -f) will override this setting if provided.
# log_file = "./jd-server.log"

# SRI Pool JD config
listen_jd_address = "{{LISTEN_JD_ADDRESS}}"

# Bitcoin Core RPC config, used to validate declared transactions
core_rpc_url = "http://{{CORE_RPC_URL}}"
core_rpc_port = {{CORE_RPC_PORT}}
core_rpc_user = "{{CORE_RPC_USER}}"
core_rpc_pass = "{{CORE_RPC_PASS}}"

# Time interval used for JDS mempool update
[mempool_update_interval]
unit = "secs"
value = 1
"#;

/// Job declarator server config. The payout address is inserted as-is and the
/// RPC port follows the network unless given explicitly.
pub fn build(data: &ConfigTemplateData) -> Result<String, TemplateError> {
    let network = data.network_or_default();
    let rpc_port = data.core_rpc_port.unwrap_or_else(|| network.rpc_port());

    tracing::debug!(kind = %ConfigKind::Jds, network = %network, rpc_port, "building jds config");

    render(
        ConfigKind::Jds.as_str(),
        TEMPLATE,
        &[
            (
                "AUTHORITY_PUBLIC_KEY",
                TemplateValue::text(text_or(
                    &data.authority_public_key,
                    defaults::DEFAULT_AUTHORITY_PUBLIC_KEY,
                )),
            ),
            (
                "AUTHORITY_SECRET_KEY",
                TemplateValue::text(text_or(
                    &data.authority_secret_key,
                    defaults::DEFAULT_AUTHORITY_SECRET_KEY,
                )),
            ),
            (
                "COINBASE_REWARD_SCRIPT",
                TemplateValue::text(text_or(
                    &data.pool_payout_address,
                    network.address_placeholder(),
                )),
            ),
            (
                "LISTEN_JD_ADDRESS",
                TemplateValue::Text(format!("{}:{}", defaults::ANY_ADDRESS, defaults::JDS_PORT)),
            ),
            (
                "CORE_RPC_URL",
                TemplateValue::text(text_or(&data.core_rpc_url, defaults::LOCALHOST)),
            ),
            ("CORE_RPC_PORT", TemplateValue::Integer(rpc_port.into())),
            (
                "CORE_RPC_USER",
                TemplateValue::text(text_or(&data.core_rpc_user, defaults::CORE_RPC_USER)),
            ),
            (
                "CORE_RPC_PASS",
                TemplateValue::text(text_or(&data.core_rpc_pass, defaults::CORE_RPC_PASS)),
            ),
        ],
    )
}
