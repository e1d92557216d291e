//! Turning finished wizard sessions into deployable artifacts.

pub mod bundle;
pub mod release;
pub mod sink;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use bundle::{Artifact, DeploymentPlan};
pub use release::{HostOs, ReleasePlatform, Tarball};
pub use sink::{ArtifactSink, DirectorySink};

/// Which stack the operator is deploying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentFlavor {
    /// Translator (and optionally a job declarator client) in front of an
    /// existing pool.
    PoolConnection,
    /// Pool, job declarator server and client, and translator, all local.
    FullStack,
}

impl DeploymentFlavor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PoolConnection => "pool",
            Self::FullStack => "full-stack",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pool" | "pool-connection" | "pool_connection" => Some(Self::PoolConnection),
            "full-stack" | "fullstack" | "full_stack" => Some(Self::FullStack),
            _ => None,
        }
    }
}

impl fmt::Display for DeploymentFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the generated configs will be run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentMethod {
    Docker,
    Binaries,
}

impl DeploymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Docker => "docker",
            Self::Binaries => "binaries",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "docker" => Some(Self::Docker),
            "binaries" | "binary" => Some(Self::Binaries),
            _ => None,
        }
    }
}

impl fmt::Display for DeploymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flavor_parse_accepts_aliases() {
        assert_eq!(DeploymentFlavor::parse("pool"), Some(DeploymentFlavor::PoolConnection));
        assert_eq!(DeploymentFlavor::parse("Full-Stack"), Some(DeploymentFlavor::FullStack));
        assert_eq!(DeploymentFlavor::parse("solo"), None);
    }

    #[test]
    fn method_round_trips_through_as_str() {
        for method in [DeploymentMethod::Docker, DeploymentMethod::Binaries] {
            assert_eq!(DeploymentMethod::parse(method.as_str()), Some(method));
        }
    }
}
