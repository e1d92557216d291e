//! Which artifacts and commands a finished session produces.

use serde::{Deserialize, Serialize};

use crate::error::TemplateError;
use crate::pools::PoolRegistry;
use crate::templates::{BuildOptions, ConfigKind, ConfigTemplateData, build_with, insecure_defaults_used};
use crate::wizard::session::{SessionData, fields};

use super::release::{self, ReleasePlatform, Tarball};
use super::{DeploymentFlavor, DeploymentMethod};

/// Port the translator listens on for mining devices.
pub const MINER_PORT: u16 = 34255;

/// Directory, relative to the deployment root, that holds generated configs.
pub const CONFIG_DIR: &str = "config";

/// A named generated file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub file_name: String,
    pub contents: String,
}

impl Artifact {
    pub fn new(file_name: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            contents: contents.into(),
        }
    }
}

/// Everything the operator needs to bring a deployment up.
///
/// Commands assume the working directory is the deployment root, with
/// artifacts under [`CONFIG_DIR`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentPlan {
    pub flavor: DeploymentFlavor,
    pub method: DeploymentMethod,
    pub platform: ReleasePlatform,
    /// Whether templates are built locally through a job declarator client.
    pub construct_templates: bool,
    pub artifacts: Vec<Artifact>,
    pub setup_commands: Vec<String>,
    pub run_commands: Vec<String>,
    /// One line per artifact still relying on placeholder keys or credentials.
    pub warnings: Vec<String>,
}

/// Services a plan runs, in start order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Service {
    Pool,
    JdServer,
    JdClient,
    Translator,
}

impl Service {
    fn kind(&self) -> ConfigKind {
        match self {
            Self::Pool => ConfigKind::PoolServer,
            Self::JdServer => ConfigKind::Jds,
            Self::JdClient => ConfigKind::JdClient,
            Self::Translator => ConfigKind::Translator,
        }
    }

    fn binary(&self) -> &'static str {
        match self {
            Self::Pool => "./pool/pool_sv2",
            Self::JdServer => "./jd-server/jd_server",
            Self::JdClient => "./jd-client/jd_client_sv2",
            Self::Translator => "./translator/translator_sv2",
        }
    }
}

impl DeploymentPlan {
    /// Plan a deployment from a finished wizard session.
    ///
    /// `construct_templates` comes from the session when answered. Otherwise a
    /// pool connection builds templates only when a node socket was given, and
    /// a full stack always does.
    pub fn for_session(
        flavor: DeploymentFlavor,
        method: DeploymentMethod,
        session: &SessionData,
        platform: ReleasePlatform,
    ) -> Result<Self, TemplateError> {
        let data = ConfigTemplateData::from_session(session);
        let construct_templates = session
            .flag(fields::CONSTRUCT_TEMPLATES)
            .unwrap_or(match flavor {
                DeploymentFlavor::PoolConnection => data.socket_path.is_some(),
                DeploymentFlavor::FullStack => true,
            });
        Self::build(
            PoolRegistry::builtin(),
            flavor,
            method,
            construct_templates,
            &data,
            platform,
        )
    }

    pub fn build(
        registry: &PoolRegistry,
        flavor: DeploymentFlavor,
        method: DeploymentMethod,
        construct_templates: bool,
        data: &ConfigTemplateData,
        platform: ReleasePlatform,
    ) -> Result<Self, TemplateError> {
        let services = services(flavor, construct_templates);
        let options = BuildOptions::use_jdc(construct_templates);

        let mut artifacts = Vec::with_capacity(services.len());
        let mut warnings = Vec::new();
        for service in &services {
            let kind = service.kind();
            let contents = build_with(registry, kind, data, options)?;
            artifacts.push(Artifact::new(kind.file_name(), contents));

            let insecure = insecure_defaults_used(kind, data);
            if !insecure.is_empty() {
                warnings.push(format!(
                    "{} uses placeholder values for: {}",
                    kind.file_name(),
                    insecure.join(", ")
                ));
            }
        }

        let (setup_commands, run_commands) = match method {
            DeploymentMethod::Binaries => binaries_commands(&services, platform),
            DeploymentMethod::Docker => docker_commands(flavor, construct_templates),
        };

        tracing::info!(
            flavor = %flavor,
            method = %method,
            construct_templates,
            artifacts = artifacts.len(),
            "deployment planned"
        );

        Ok(Self {
            flavor,
            method,
            platform,
            construct_templates,
            artifacts,
            setup_commands,
            run_commands,
            warnings,
        })
    }

    pub fn artifact(&self, file_name: &str) -> Option<&Artifact> {
        self.artifacts.iter().find(|a| a.file_name == file_name)
    }

    /// Where mining devices should point once the stack is running.
    pub fn miner_endpoint(&self) -> String {
        format!("stratum+tcp://<this-host-ip>:{MINER_PORT}")
    }
}

fn services(flavor: DeploymentFlavor, construct_templates: bool) -> Vec<Service> {
    match (flavor, construct_templates) {
        (DeploymentFlavor::PoolConnection, true) => vec![Service::JdClient, Service::Translator],
        (DeploymentFlavor::PoolConnection, false) => vec![Service::Translator],
        (DeploymentFlavor::FullStack, true) => vec![
            Service::Pool,
            Service::JdServer,
            Service::JdClient,
            Service::Translator,
        ],
        (DeploymentFlavor::FullStack, false) => vec![Service::Pool, Service::Translator],
    }
}

fn binaries_commands(services: &[Service], platform: ReleasePlatform) -> (Vec<String>, Vec<String>) {
    let mut tarballs = Vec::new();
    if services
        .iter()
        .any(|s| matches!(s, Service::Pool | Service::JdServer))
    {
        tarballs.push(Tarball::PoolApps);
    }
    tarballs.push(Tarball::MinerApps);

    let mut setup = Vec::new();
    for tarball in tarballs {
        let file = tarball.file_name(platform);
        setup.push(format!("curl -L -O {}", release::download_url(tarball, platform)));
        setup.push(format!("tar -xzf {file} --strip-components=1 && rm {file}"));
    }

    let run = services
        .iter()
        .map(|s| format!("{} -c {CONFIG_DIR}/{}", s.binary(), s.kind().file_name()))
        .collect();
    (setup, run)
}

fn docker_commands(
    flavor: DeploymentFlavor,
    construct_templates: bool,
) -> (Vec<String>, Vec<String>) {
    let setup = vec![
        format!("git clone {}", release::APPS_REPOSITORY),
        "cd sv2-apps".to_string(),
        format!("git checkout {}", release::RELEASE_VERSION),
        "cd docker".to_string(),
        format!("cp -r ../../{CONFIG_DIR} ."),
    ];
    let profiles = match (flavor, construct_templates) {
        (DeploymentFlavor::PoolConnection, true) => "--profile miner_apps",
        (DeploymentFlavor::PoolConnection, false) => "--profile tproxy",
        (DeploymentFlavor::FullStack, true) => "--profile pool_apps --profile miner_apps",
        (DeploymentFlavor::FullStack, false) => "--profile pool --profile tproxy",
    };
    (setup, vec![format!("docker compose {profiles} up --build")])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pools::pool_keys;

    fn names(plan: &DeploymentPlan) -> Vec<&str> {
        plan.artifacts.iter().map(|a| a.file_name.as_str()).collect()
    }

    #[test]
    fn pool_connection_without_templates_is_translator_only() {
        let session = SessionData::new()
            .with(fields::CONSTRUCT_TEMPLATES, false)
            .with(fields::SELECTED_POOL, pool_keys::BRAIINS);
        let plan = DeploymentPlan::for_session(
            DeploymentFlavor::PoolConnection,
            DeploymentMethod::Binaries,
            &session,
            ReleasePlatform::LinuxX64,
        )
        .unwrap();

        assert_eq!(names(&plan), vec!["translator-config.toml"]);
        assert_eq!(
            plan.run_commands,
            vec!["./translator/translator_sv2 -c config/translator-config.toml"]
        );
        assert!(plan.setup_commands[0].ends_with("miner-apps-x86_64-unknown-linux-musl.tar.gz"));
        assert!(!plan.setup_commands.iter().any(|c| c.contains("pool-apps")));
        let translator = plan.artifact("translator-config.toml").unwrap();
        assert!(translator.contents.contains("address = \"107.170.42.64\""));
    }

    #[test]
    fn pool_connection_with_templates_adds_jd_client() {
        let session = SessionData::new()
            .with(fields::CONSTRUCT_TEMPLATES, true)
            .with(fields::SELECTED_POOL, pool_keys::COMMUNITY_SRI)
            .with(fields::BITCOIN_SOCKET_PATH, "/home/me/.bitcoin/node.sock");
        let plan = DeploymentPlan::for_session(
            DeploymentFlavor::PoolConnection,
            DeploymentMethod::Docker,
            &session,
            ReleasePlatform::LinuxX64,
        )
        .unwrap();

        assert_eq!(names(&plan), vec!["jd-client-config.toml", "translator-config.toml"]);
        assert_eq!(plan.run_commands, vec!["docker compose --profile miner_apps up --build"]);
        let translator = plan.artifact("translator-config.toml").unwrap();
        assert!(translator.contents.contains("port = 34265"));
        assert!(translator.contents.contains("enable_vardiff = false"));
    }

    #[test]
    fn full_stack_builds_all_four() {
        let plan = DeploymentPlan::for_session(
            DeploymentFlavor::FullStack,
            DeploymentMethod::Binaries,
            &SessionData::new(),
            ReleasePlatform::MacosArm64,
        )
        .unwrap();

        assert!(plan.construct_templates);
        assert_eq!(
            names(&plan),
            vec![
                "pool-config.toml",
                "jd-server-config.toml",
                "jd-client-config.toml",
                "translator-config.toml"
            ]
        );
        assert_eq!(plan.run_commands.len(), 4);
        assert!(plan.setup_commands.iter().any(|c| c.contains("pool-apps-aarch64-apple-darwin")));
        assert!(!plan.warnings.is_empty());
    }

    #[test]
    fn full_stack_without_templates_skips_job_declaration() {
        let session = SessionData::new().with(fields::CONSTRUCT_TEMPLATES, "no");
        let plan = DeploymentPlan::for_session(
            DeploymentFlavor::FullStack,
            DeploymentMethod::Binaries,
            &session,
            ReleasePlatform::LinuxX64,
        )
        .unwrap();

        assert_eq!(names(&plan), vec!["pool-config.toml", "translator-config.toml"]);
        let translator = plan.artifact("translator-config.toml").unwrap();
        assert!(translator.contents.contains("address = \"127.0.0.1\"\nport = 34254"));
    }

    #[test]
    fn invalid_field_fails_the_plan() {
        let session = SessionData::new().with(fields::USER_IDENTITY, "bad\"name");
        let err = DeploymentPlan::for_session(
            DeploymentFlavor::PoolConnection,
            DeploymentMethod::Binaries,
            &session,
            ReleasePlatform::LinuxX64,
        )
        .unwrap_err();
        assert!(matches!(err, TemplateError::InvalidFieldValue { .. }));
    }
}
