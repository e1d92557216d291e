//! The built-in wizard flows.

use crate::deploy::{DeploymentFlavor, DeploymentMethod};
use crate::network::Network;
use crate::pools::pool_keys;
use crate::templates::defaults;

use super::graph::{
    FieldKind, FormField, IconKind, Step, StepContent, StepGraph, ValueBinding, WizardOption,
};
use super::session::fields;

const DMND_URL: &str = "https://dmnd.work/";
const SRI_WARNING: &str =
    "Not for production use, any blocks found will be donated to the SRI project";

pub fn for_flavor(flavor: DeploymentFlavor) -> StepGraph {
    match flavor {
        DeploymentFlavor::PoolConnection => pool_connection(),
        DeploymentFlavor::FullStack => full_stack(),
    }
}

fn sri_option(next: &str) -> WizardOption {
    WizardOption::new("pool_sri", "Community SRI Pool", pool_keys::COMMUNITY_SRI, next)
        .sub_label("Community Hosted Stratum V2 Reference Implementation")
        .icon(IconKind::Globe)
        .badge("Testing")
        .warning(SRI_WARNING)
}

fn braiins_option(next: &str) -> WizardOption {
    WizardOption::new("pool_braiins", "Braiins Pool", pool_keys::BRAIINS, next)
        .sub_label("Leading Mining Pool")
        .icon(IconKind::Cloud)
}

fn dmnd_option(next: &str) -> WizardOption {
    WizardOption::new("pool_demand", "DMND", pool_keys::DEMAND, next)
        .icon(IconKind::Zap)
        .warning("Pool for registered businesses only at the moment")
        .disabled_with_link(DMND_URL)
}

fn network_question(id: &str, description: &str, mainnet_next: &str, testnet_next: &str) -> Step {
    Step::question(
        id,
        "Select Bitcoin Network",
        vec![
            WizardOption::new("opt_main", "Mainnet", Network::Mainnet.as_str(), mainnet_next)
                .sub_label("Production Network")
                .icon(IconKind::Globe),
            WizardOption::new("opt_test", "Testnet4", Network::Testnet4.as_str(), testnet_next)
                .sub_label("Testing Network")
                .icon(IconKind::Activity),
        ],
    )
    .describe(description)
    .writes_to(ValueBinding::text(fields::SELECTED_NETWORK))
}

fn node_guide(id: &str, network: Network, show_bitcoin_conf: bool, next: &str) -> Step {
    let label = match network {
        Network::Mainnet => "Mainnet",
        Network::Testnet4 => "Testnet4",
        Network::Signet => "Signet",
    };
    Step::instruction(
        id,
        format!("Bitcoin Core Setup ({label})"),
        StepContent::NodeSetup {
            network,
            show_bitcoin_conf,
        },
        Some(next),
    )
}

fn deployment_question(id: &str, docker_next: &str, binaries_next: &str) -> Step {
    Step::question(
        id,
        "Choose Deployment Method",
        vec![
            WizardOption::new(
                "deploy_docker",
                "Docker",
                DeploymentMethod::Docker.as_str(),
                docker_next,
            )
            .sub_label("Recommended for ease of use")
            .icon(IconKind::Container),
            WizardOption::new(
                "deploy_bin",
                "Binaries",
                DeploymentMethod::Binaries.as_str(),
                binaries_next,
            )
            .sub_label("Manual setup for advanced users")
            .icon(IconKind::Terminal),
        ],
    )
    .writes_to(ValueBinding::text(fields::DEPLOYMENT_METHOD))
}

fn result_step(id: &str, title: &str, flavor: DeploymentFlavor, method: DeploymentMethod) -> Step {
    Step::result(id, title, StepContent::Deployment { flavor, method })
}

fn jd_client_form() -> StepContent {
    StepContent::Form {
        fields: vec![
            FormField::new(fields::USER_IDENTITY, "Pool username", FieldKind::Text)
                .required()
                .placeholder(defaults::USER_IDENTITY),
            FormField::new(fields::JDC_SIGNATURE, "Coinbase signature", FieldKind::Text)
                .placeholder(defaults::JDC_SIGNATURE),
            FormField::new(
                fields::COINBASE_REWARD_ADDRESS,
                "Solo mining fallback reward address",
                FieldKind::Text,
            )
            .placeholder("bc1q..."),
            FormField::new(fields::CLIENT_SHARES_PER_MINUTE, "Shares per minute", FieldKind::Number)
                .default_value(defaults::SHARES_PER_MINUTE),
            FormField::new(fields::CLIENT_SHARE_BATCH_SIZE, "Share batch size", FieldKind::Integer)
                .default_value(defaults::SHARE_BATCH_SIZE),
            FormField::new(fields::CLIENT_FEE_THRESHOLD, "Fee threshold (sats)", FieldKind::Integer)
                .default_value(defaults::FEE_THRESHOLD),
            FormField::new(fields::CLIENT_MIN_INTERVAL, "Template min interval (s)", FieldKind::Integer)
                .default_value(defaults::MIN_INTERVAL),
        ],
    }
}

fn translator_form() -> StepContent {
    StepContent::Form {
        fields: vec![
            FormField::new(fields::USER_IDENTITY, "Pool username", FieldKind::Text)
                .required()
                .placeholder(defaults::USER_IDENTITY),
            FormField::new(
                fields::MIN_INDIVIDUAL_MINER_HASHRATE,
                "Weakest miner hashrate (H/s)",
                FieldKind::Number,
            )
            .default_value(defaults::MIN_INDIVIDUAL_MINER_HASHRATE),
            FormField::new(fields::AGGREGATE_CHANNELS, "Aggregate channels", FieldKind::Toggle),
            FormField::new(fields::CLIENT_SHARES_PER_MINUTE, "Shares per minute", FieldKind::Number)
                .default_value(defaults::SHARES_PER_MINUTE),
            FormField::new(
                fields::TPROXY_UPSTREAM_AUTHORITY_PUBKEY,
                "Upstream authority public key",
                FieldKind::Text,
            ),
        ],
    }
}

fn pool_form(with_rpc: bool) -> StepContent {
    let mut form = vec![
        FormField::new(fields::POOL_SIGNATURE, "Pool signature", FieldKind::Text)
            .default_value(defaults::POOL_SIGNATURE),
        FormField::new(fields::POOL_PAYOUT_ADDRESS, "Payout address", FieldKind::Text)
            .required()
            .placeholder("bc1q..."),
        FormField::new(fields::SHARES_PER_MINUTE, "Shares per minute", FieldKind::Number)
            .default_value(defaults::SHARES_PER_MINUTE),
        FormField::new(fields::FEE_THRESHOLD, "Fee threshold (sats)", FieldKind::Integer)
            .default_value(defaults::FEE_THRESHOLD),
        FormField::new(fields::MIN_INTERVAL, "Template min interval (s)", FieldKind::Integer)
            .default_value(defaults::MIN_INTERVAL),
        FormField::new(fields::SHARE_BATCH_SIZE, "Share batch size", FieldKind::Integer)
            .default_value(defaults::SHARE_BATCH_SIZE),
    ];
    if with_rpc {
        form.push(
            FormField::new(fields::CORE_RPC_USER, "Bitcoin Core RPC user", FieldKind::Text)
                .placeholder(defaults::CORE_RPC_USER),
        );
        form.push(
            FormField::new(fields::CORE_RPC_PASS, "Bitcoin Core RPC password", FieldKind::Text)
                .placeholder(defaults::CORE_RPC_PASS),
        );
    }
    StepContent::Form { fields: form }
}

/// Connect miners to an existing pool through a translator proxy, optionally
/// building templates locally with a job declarator client.
pub fn pool_connection() -> StepGraph {
    StepGraph::new("block_template_construction")
        .titled(
            "Pool Connection Wizard",
            "Connect your miners to Stratum V2 pools through SRI proxies. Choose whether to use pool templates or construct your own.",
        )
        .with_step(
            Step::question(
                "block_template_construction",
                "Block Template Construction",
                vec![
                    WizardOption::new("opt_own", "Yes, construct my own", "yes", "bitcoin_network_selection")
                        .sub_label("I have a Bitcoin Core node")
                        .icon(IconKind::Layers),
                    WizardOption::new("opt_pool_tpl", "No, use pool's templates", "no", "pool_network_selection")
                        .sub_label("Standard mining setup")
                        .icon(IconKind::Cloud),
                ],
            )
            .describe("Would you like to construct your own block templates? (Requires a Bitcoin Core node)")
            .writes_to(ValueBinding::yes_no(fields::CONSTRUCT_TEMPLATES)),
        )
        .with_step(network_question(
            "pool_network_selection",
            "Which network is the pool operating on?",
            "select_pool_all_mainnet",
            "select_pool_all_testnet4",
        ))
        .with_step(network_question(
            "bitcoin_network_selection",
            "Which network will your Bitcoin Node operate on?",
            "bitcoin_guide_mainnet",
            "bitcoin_guide_testnet",
        ))
        .with_step(node_guide(
            "bitcoin_guide_mainnet",
            Network::Mainnet,
            false,
            "select_pool_construct_mainnet",
        ))
        .with_step(node_guide(
            "bitcoin_guide_testnet",
            Network::Testnet4,
            false,
            "select_pool_construct_testnet4",
        ))
        .with_step(
            Step::question(
                "select_pool_construct_mainnet",
                "Select Mining Pool",
                vec![
                    sri_option("jd_client_configuration"),
                    dmnd_option("jd_client_configuration"),
                ],
            )
            .describe("Choose a pool that supports custom block templates.")
            .writes_to(ValueBinding::text(fields::SELECTED_POOL)),
        )
        .with_step(
            Step::question(
                "select_pool_construct_testnet4",
                "Select Mining Pool",
                vec![sri_option("jd_client_configuration")],
            )
            .describe("Choose a pool that supports custom block templates.")
            .writes_to(ValueBinding::text(fields::SELECTED_POOL)),
        )
        .with_step(
            Step::question(
                "select_pool_all_mainnet",
                "Select Mining Pool",
                vec![
                    sri_option("translator_proxy_configuration"),
                    braiins_option("translator_proxy_configuration"),
                    dmnd_option("translator_proxy_configuration"),
                ],
            )
            .describe("Choose the Stratum V2 pool you want to connect to.")
            .writes_to(ValueBinding::text(fields::SELECTED_POOL)),
        )
        .with_step(
            Step::question(
                "select_pool_all_testnet4",
                "Select Mining Pool",
                vec![sri_option("translator_proxy_configuration")],
            )
            .describe("Choose the Stratum V2 pool you want to connect to.")
            .writes_to(ValueBinding::text(fields::SELECTED_POOL)),
        )
        .with_step(
            Step::custom(
                "jd_client_configuration",
                "JD Client Configuration",
                jd_client_form(),
                Some("translator_proxy_configuration"),
            )
            .describe("Configure your Job Declarator Client settings."),
        )
        .with_step(
            Step::custom(
                "translator_proxy_configuration",
                "Translator Proxy Configuration",
                translator_form(),
                Some("deployment_pool"),
            )
            .describe("Configure the translator proxy settings."),
        )
        .with_step(
            deployment_question("deployment_pool", "result_pool_docker", "result_pool_binaries")
                .describe("How would you like to deploy the Proxy components?"),
        )
        .with_step(result_step(
            "result_pool_docker",
            "Proxy via Docker",
            DeploymentFlavor::PoolConnection,
            DeploymentMethod::Docker,
        ))
        .with_step(result_step(
            "result_pool_binaries",
            "Proxy via Binaries",
            DeploymentFlavor::PoolConnection,
            DeploymentMethod::Binaries,
        ))
}

/// Run the whole stack locally: pool, optional job declaration, translator.
pub fn full_stack() -> StepGraph {
    StepGraph::new("bitcoin_network_selection")
        .titled(
            "Full Stack Wizard",
            "Run your own Stratum V2 pool, job declarator and translator proxy against your Bitcoin Core node.",
        )
        .with_step(network_question(
            "bitcoin_network_selection",
            "Which network will your Bitcoin Node operate on?",
            "bitcoin_guide_mainnet",
            "bitcoin_guide_testnet",
        ))
        .with_step(node_guide(
            "bitcoin_guide_mainnet",
            Network::Mainnet,
            true,
            "client_template_decision",
        ))
        .with_step(node_guide(
            "bitcoin_guide_testnet",
            Network::Testnet4,
            true,
            "client_template_decision",
        ))
        .with_step(
            Step::question(
                "client_template_decision",
                "Job Declaration",
                vec![
                    WizardOption::new("opt_jd", "Yes, run job declaration", "yes", "pool_configuration_jd")
                        .sub_label("Miners build their own templates through a JD client")
                        .icon(IconKind::Layers),
                    WizardOption::new("opt_pool_only", "No, pool templates only", "no", "pool_configuration")
                        .sub_label("Translator connects straight to the pool")
                        .icon(IconKind::Server),
                ],
            )
            .describe("Should miners construct their own block templates through a job declarator?")
            .writes_to(ValueBinding::yes_no(fields::CONSTRUCT_TEMPLATES)),
        )
        .with_step(
            Step::custom(
                "pool_configuration_jd",
                "Pool Configuration",
                pool_form(true),
                Some("jd_client_configuration"),
            )
            .describe("Configure the pool and job declarator server."),
        )
        .with_step(
            Step::custom(
                "pool_configuration",
                "Pool Configuration",
                pool_form(false),
                Some("translator_proxy_configuration"),
            )
            .describe("Configure the pool server."),
        )
        .with_step(
            Step::custom(
                "jd_client_configuration",
                "JD Client Configuration",
                jd_client_form(),
                Some("translator_proxy_configuration"),
            )
            .describe("Configure your Job Declarator Client settings."),
        )
        .with_step(
            Step::custom(
                "translator_proxy_configuration",
                "Translator Proxy Configuration",
                translator_form(),
                Some("deployment_full"),
            )
            .describe("Configure the translator proxy settings."),
        )
        .with_step(
            deployment_question("deployment_full", "result_full_docker", "result_full_binaries")
                .describe("How would you like to deploy the stack?"),
        )
        .with_step(result_step(
            "result_full_docker",
            "Full Stack via Docker",
            DeploymentFlavor::FullStack,
            DeploymentMethod::Docker,
        ))
        .with_step(result_step(
            "result_full_binaries",
            "Full Stack via Binaries",
            DeploymentFlavor::FullStack,
            DeploymentMethod::Binaries,
        ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::graph::StepKind;

    #[test]
    fn builtin_flows_validate() {
        for flavor in [DeploymentFlavor::PoolConnection, DeploymentFlavor::FullStack] {
            let graph = for_flavor(flavor);
            graph.validate().unwrap();
            assert_eq!(graph.reachable().len(), graph.steps.len(), "{flavor}");
        }
    }

    #[test]
    fn every_question_writes_to_session() {
        for graph in [pool_connection(), full_stack()] {
            for step in graph.steps.values() {
                if !step.options().is_empty() {
                    assert!(
                        matches!(&step.kind, StepKind::Question { writes_to: Some(_), .. }),
                        "{} has no binding",
                        step.id
                    );
                }
            }
        }
    }

    #[test]
    fn dmnd_is_disabled_with_link() {
        let graph = pool_connection();
        let step = graph.step("select_pool_all_mainnet").unwrap();
        let dmnd = step.option("pool_demand").unwrap();
        assert!(dmnd.disabled);
        assert_eq!(dmnd.url.as_deref(), Some(DMND_URL));
    }

    #[test]
    fn results_carry_deployment_content() {
        let graph = full_stack();
        let result = graph.step("result_full_binaries").unwrap();
        assert!(result.is_result());
        assert_eq!(
            result.content(),
            Some(&StepContent::Deployment {
                flavor: DeploymentFlavor::FullStack,
                method: DeploymentMethod::Binaries,
            })
        );
    }
}
