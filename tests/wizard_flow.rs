//! End-to-end tests: walk the built-in flows through the engine and the
//! terminal front-end, and check the generated deployment.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use sv2_wizard::config::EngineConfig;
use sv2_wizard::deploy::{
    DeploymentFlavor, DeploymentMethod, DeploymentPlan, DirectorySink, ReleasePlatform,
};
use sv2_wizard::terminal::TerminalFrontEnd;
use sv2_wizard::wizard::session::fields;
use sv2_wizard::wizard::{OptionActivation, SessionData, Transition, WizardEngine, flows};
use tempfile::TempDir;

fn engine(flavor: DeploymentFlavor) -> WizardEngine {
    WizardEngine::new(flows::for_flavor(flavor), EngineConfig::default()).unwrap()
}

fn choose(engine: &WizardEngine, option_id: &str) {
    let activation = engine.activate_option(option_id).unwrap();
    assert!(
        matches!(activation, OptionActivation::Navigated(Transition::Moved { .. })),
        "{option_id}: {activation:?}"
    );
}

fn names(plan: &DeploymentPlan) -> Vec<&str> {
    plan.artifacts.iter().map(|a| a.file_name.as_str()).collect()
}

// ── Engine ──────────────────────────────────────────────────────────────

#[test]
fn pool_connection_with_job_declaration() {
    let completions = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&completions);
    let engine = engine(DeploymentFlavor::PoolConnection).with_completion_handler(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    choose(&engine, "opt_own");
    choose(&engine, "opt_test");
    assert_eq!(engine.current_step_id(), "bitcoin_guide_testnet");

    engine.update_data(&SessionData::new().with(
        fields::BITCOIN_SOCKET_PATH,
        "/home/miner/.bitcoin/testnet4/node.sock",
    ));
    engine.proceed().unwrap();
    assert_eq!(engine.current_step_id(), "select_pool_construct_testnet4");

    choose(&engine, "pool_sri");
    engine.update_data(
        &SessionData::new()
            .with(fields::USER_IDENTITY, "alice")
            .with(fields::COINBASE_REWARD_ADDRESS, "tb1qalice"),
    );
    engine.proceed().unwrap();
    engine.proceed().unwrap();
    choose(&engine, "deploy_bin");
    assert_eq!(engine.current_step_id(), "result_pool_binaries");

    let data = engine.data();
    assert_eq!(data.flag(fields::CONSTRUCT_TEMPLATES), Some(true));
    assert_eq!(data.text(fields::SELECTED_NETWORK), Some("testnet4"));

    let plan = DeploymentPlan::for_session(
        DeploymentFlavor::PoolConnection,
        DeploymentMethod::Binaries,
        &data,
        ReleasePlatform::LinuxX64,
    )
    .unwrap();
    assert_eq!(names(&plan), vec!["jd-client-config.toml", "translator-config.toml"]);

    let jdc = &plan.artifact("jd-client-config.toml").unwrap().contents;
    assert!(jdc.contains("pool_port = 43333"));
    assert!(jdc.contains("user_identity = \"alice\""));
    assert!(jdc.contains("addr(tb1qalice)"));
    let translator = &plan.artifact("translator-config.toml").unwrap().contents;
    assert!(translator.contains("address = \"127.0.0.1\"\nport = 34265"));

    assert_eq!(
        engine.proceed().unwrap(),
        Transition::Completed {
            step_id: "result_pool_binaries".to_string()
        }
    );
    assert_eq!(completions.load(Ordering::SeqCst), 1);
    assert_eq!(engine.current_step_id(), "result_pool_binaries");
}

#[test]
fn full_stack_without_job_declaration() {
    let engine = engine(DeploymentFlavor::FullStack);

    choose(&engine, "opt_main");
    engine.update_data(
        &SessionData::new().with(fields::BITCOIN_SOCKET_PATH, "/home/op/.bitcoin/node.sock"),
    );
    engine.proceed().unwrap();
    choose(&engine, "opt_pool_only");
    assert_eq!(engine.current_step_id(), "pool_configuration");

    engine.update_data(&SessionData::new().with(fields::POOL_PAYOUT_ADDRESS, "bc1qpayout"));
    engine.proceed().unwrap();
    engine.update_data(&SessionData::new().with(fields::USER_IDENTITY, "miner"));
    engine.proceed().unwrap();
    choose(&engine, "deploy_docker");
    assert_eq!(engine.current_step_id(), "result_full_docker");

    let plan = DeploymentPlan::for_session(
        DeploymentFlavor::FullStack,
        DeploymentMethod::Docker,
        &engine.data(),
        ReleasePlatform::LinuxX64,
    )
    .unwrap();
    assert!(!plan.construct_templates);
    assert_eq!(names(&plan), vec!["pool-config.toml", "translator-config.toml"]);
    assert_eq!(
        plan.run_commands,
        vec!["docker compose --profile pool --profile tproxy up --build"]
    );
    let pool = &plan.artifact("pool-config.toml").unwrap().contents;
    assert!(pool.contains("coinbase_reward_script = \"addr(bc1qpayout)\""));
}

#[test]
fn translator_key_is_kept_off_the_pool_link() {
    let session = SessionData::new()
        .with(fields::CONSTRUCT_TEMPLATES, true)
        .with(fields::SELECTED_NETWORK, "mainnet")
        .with(fields::SELECTED_POOL, "braiins")
        .with(fields::BITCOIN_SOCKET_PATH, "/home/miner/.bitcoin/node.sock")
        .with(fields::TPROXY_UPSTREAM_AUTHORITY_PUBKEY, "MyJdcKey");

    let plan = DeploymentPlan::for_session(
        DeploymentFlavor::PoolConnection,
        DeploymentMethod::Binaries,
        &session,
        ReleasePlatform::LinuxX64,
    )
    .unwrap();

    let jdc = &plan.artifact("jd-client-config.toml").unwrap().contents;
    assert!(!jdc.contains("MyJdcKey"));
    assert!(jdc.contains(
        "authority_pubkey = \"9awtMD5KQgvRUh2yFbjVeT7b6hjipWcAsQHd6wEhgtDT9soosna\""
    ));
    let translator = &plan.artifact("translator-config.toml").unwrap().contents;
    assert!(translator.contains("authority_pubkey = \"MyJdcKey\""));
}

#[test]
fn back_retraces_the_branch_taken() {
    let engine = engine(DeploymentFlavor::PoolConnection);
    choose(&engine, "opt_pool_tpl");
    choose(&engine, "opt_main");
    assert_eq!(engine.current_step_id(), "select_pool_all_mainnet");

    engine.back();
    engine.back();
    assert_eq!(engine.current_step_id(), "block_template_construction");
    assert_eq!(engine.back(), Transition::Unchanged);
}

// ── Terminal ────────────────────────────────────────────────────────────

fn terminal<'a>(
    flavor: DeploymentFlavor,
    dir: &TempDir,
    script: &'a str,
) -> TerminalFrontEnd<&'a [u8], Vec<u8>> {
    let engine = WizardEngine::new(
        flows::for_flavor(flavor),
        EngineConfig {
            reset_delay: Duration::from_millis(500),
            ..EngineConfig::default()
        },
    )
    .unwrap();
    TerminalFrontEnd::new(
        engine,
        Box::new(DirectorySink::new(dir.path())),
        ReleasePlatform::LinuxX64,
        script.as_bytes(),
        Vec::new(),
    )
}

/// Pool templates, mainnet, Braiins, translator form, binaries.
const BRAIINS_BINARIES: &str = "2\n1\n2\nalice\n\n\n\n\n2\n";

#[tokio::test]
async fn terminal_writes_configs_and_prints_commands() {
    let dir = TempDir::new().unwrap();
    let script = format!("{BRAIINS_BINARIES}:quit\n");
    let mut term = terminal(DeploymentFlavor::PoolConnection, &dir, &script);
    term.run().await.unwrap();

    assert_eq!(term.engine().current_step_id(), "result_pool_binaries");
    let out = String::from_utf8(term.into_output()).unwrap();
    assert!(out.contains("=== Pool Connection Wizard ==="));
    assert!(out.contains("config/translator-config.toml"));
    assert!(out.contains("./translator/translator_sv2 -c config/translator-config.toml"));
    assert!(out.contains("stratum+tcp://<this-host-ip>:34255"));

    let written =
        std::fs::read_to_string(dir.path().join("config/translator-config.toml")).unwrap();
    assert!(written.contains("user_identity = \"alice\""));
    assert!(written.contains("address = \"107.170.42.64\""));
}

#[tokio::test]
async fn terminal_disabled_option_shows_link() {
    let dir = TempDir::new().unwrap();
    let mut term = terminal(DeploymentFlavor::PoolConnection, &dir, "2\n1\n3\n:quit\n");
    term.run().await.unwrap();

    assert_eq!(term.engine().current_step_id(), "select_pool_all_mainnet");
    let out = String::from_utf8(term.into_output()).unwrap();
    assert!(out.contains("https://dmnd.work/"));
}

#[tokio::test]
async fn terminal_reprompts_required_and_invalid_fields() {
    let dir = TempDir::new().unwrap();
    // Blank username, then a non-numeric hashrate.
    let mut term = terminal(
        DeploymentFlavor::PoolConnection,
        &dir,
        "2\n1\n2\n\nbob\nlots\n\n\n\n\n:quit\n",
    );
    term.run().await.unwrap();

    assert_eq!(term.engine().current_step_id(), "deployment_pool");
    assert_eq!(term.engine().data().text(fields::USER_IDENTITY), Some("bob"));
    let out = String::from_utf8(term.into_output()).unwrap();
    assert!(out.contains("This field is required."));
    assert!(out.contains("Invalid value, try again."));
}

#[tokio::test]
async fn terminal_reprompts_unusable_numbers() {
    let dir = TempDir::new().unwrap();
    // Own templates on testnet4, then a negative share rate and a fractional batch size.
    let mut term = terminal(
        DeploymentFlavor::PoolConnection,
        &dir,
        "1\n2\n/tmp/node.sock\n\n1\nalice\n\n\n-1\n\n2.5\n\n\n\n:quit\n",
    );
    term.run().await.unwrap();

    assert_eq!(term.engine().current_step_id(), "translator_proxy_configuration");
    let data = term.engine().data();
    assert_eq!(data.number(fields::CLIENT_SHARES_PER_MINUTE), Some(6.0));
    assert_eq!(data.number(fields::CLIENT_SHARE_BATCH_SIZE), Some(10.0));
    let out = String::from_utf8(term.into_output()).unwrap();
    assert_eq!(out.matches("Invalid value, try again.").count(), 2);
}

#[tokio::test]
async fn terminal_reports_unrenderable_answers() {
    let dir = TempDir::new().unwrap();
    let mut term = terminal(
        DeploymentFlavor::PoolConnection,
        &dir,
        "2\n1\n2\nali\"ce\n\n\n\n\n2\n:back\n:quit\n",
    );
    term.run().await.unwrap();

    assert_eq!(term.engine().current_step_id(), "deployment_pool");
    let out = String::from_utf8(term.into_output()).unwrap();
    assert!(out.contains("Cannot generate configs"));
    assert!(out.contains("user_identity"));
    assert!(!dir.path().join("config/translator-config.toml").exists());
}

#[tokio::test]
async fn terminal_back_from_form() {
    let dir = TempDir::new().unwrap();
    let mut term = terminal(DeploymentFlavor::PoolConnection, &dir, "2\n1\n2\n:back\n:quit\n");
    term.run().await.unwrap();
    assert_eq!(term.engine().current_step_id(), "select_pool_all_mainnet");
}

#[tokio::test(start_paused = true)]
async fn terminal_starts_over_after_completion() {
    let dir = TempDir::new().unwrap();
    let script = format!("{BRAIINS_BINARIES}\n:quit\n");
    let mut term = terminal(DeploymentFlavor::PoolConnection, &dir, &script);
    term.run().await.unwrap();

    assert_eq!(term.engine().current_step_id(), "block_template_construction");
    assert!(term.engine().data().is_empty());
    assert!(!term.engine().completion_acknowledged());
    let out = String::from_utf8(term.into_output()).unwrap();
    assert!(out.contains("Starting a new session."));
}

#[tokio::test]
async fn terminal_stops_at_end_of_input() {
    let dir = TempDir::new().unwrap();
    let mut term = terminal(DeploymentFlavor::FullStack, &dir, "1\n");
    term.run().await.unwrap();
    assert_eq!(term.engine().current_step_id(), "bitcoin_guide_mainnet");
}
