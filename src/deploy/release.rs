//! Published sv2-apps release binaries.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::network::Network;

pub const RELEASE_VERSION: &str = "v0.2.0";
pub const RELEASE_BASE_URL: &str =
    "https://github.com/stratum-mining/sv2-apps/releases/download/v0.2.0";
pub const RELEASE_PAGE: &str = "https://github.com/stratum-mining/sv2-apps/releases/tag/v0.2.0";
pub const APPS_REPOSITORY: &str = "https://github.com/stratum-mining/sv2-apps.git";

/// Target platform of a release tarball. Always chosen explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleasePlatform {
    LinuxX64,
    LinuxArm64,
    MacosX64,
    MacosArm64,
}

impl ReleasePlatform {
    pub const ALL: [ReleasePlatform; 4] = [
        ReleasePlatform::LinuxX64,
        ReleasePlatform::LinuxArm64,
        ReleasePlatform::MacosX64,
        ReleasePlatform::MacosArm64,
    ];

    pub fn target_triple(&self) -> &'static str {
        match self {
            Self::LinuxX64 => "x86_64-unknown-linux-musl",
            Self::LinuxArm64 => "aarch64-unknown-linux-musl",
            Self::MacosX64 => "x86_64-apple-darwin",
            Self::MacosArm64 => "aarch64-apple-darwin",
        }
    }

    /// Accepts a target triple or the short `<os>-<arch>` form.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.target_triple() == s)
            .or(match s.as_str() {
                "linux-x64" | "linux-x86_64" => Some(Self::LinuxX64),
                "linux-arm64" | "linux-aarch64" => Some(Self::LinuxArm64),
                "macos-x64" | "macos-x86_64" => Some(Self::MacosX64),
                "macos-arm64" | "macos-aarch64" => Some(Self::MacosArm64),
                _ => None,
            })
    }

    pub fn host_os(&self) -> HostOs {
        match self {
            Self::LinuxX64 | Self::LinuxArm64 => HostOs::Linux,
            Self::MacosX64 | Self::MacosArm64 => HostOs::Macos,
        }
    }
}

impl fmt::Display for ReleasePlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.target_triple())
    }
}

/// The two archives a release ships.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tarball {
    /// pool and jd-server
    PoolApps,
    /// jd-client and translator
    MinerApps,
}

impl Tarball {
    pub fn base_name(&self) -> &'static str {
        match self {
            Self::PoolApps => "pool-apps",
            Self::MinerApps => "miner-apps",
        }
    }

    pub fn file_name(&self, platform: ReleasePlatform) -> String {
        format!("{}-{}.tar.gz", self.base_name(), platform.target_triple())
    }
}

pub fn download_url(tarball: Tarball, platform: ReleasePlatform) -> String {
    format!("{RELEASE_BASE_URL}/{}", tarball.file_name(platform))
}

/// Operating system family, used only to suggest node paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOs {
    Linux,
    Macos,
}

impl HostOs {
    fn bitcoin_home(&self) -> &'static str {
        match self {
            Self::Linux => "/home/<username>/.bitcoin",
            Self::Macos => "/Users/<username>/Library/Application Support/Bitcoin",
        }
    }
}

/// Where Bitcoin Core puts its IPC socket by default, with a `<username>`
/// placeholder for the operator to fill in.
pub fn default_socket_path(network: Network, os: HostOs) -> String {
    match network.data_subdir() {
        Some(sub) => format!("{}/{sub}/node.sock", os.bitcoin_home()),
        None => format!("{}/node.sock", os.bitcoin_home()),
    }
}

/// Minimum Bitcoin Core release with the IPC interface the template providers use.
pub const BITCOIN_CORE_VERSION: &str = "30.2";

/// `bitcoin.conf` lines the job declarator server needs for RPC access.
pub const BITCOIN_CONF_RPC: &str = "server=1
rpcuser=username
rpcpassword=password
rpcbind=0.0.0.0
rpcallowip=0.0.0.0/0";

/// Command starting Bitcoin Core with the IPC socket bound for `network`.
pub fn node_start_command(network: Network) -> String {
    let base = format!("./bitcoin-{BITCOIN_CORE_VERSION}/bin/bitcoin -m node -ipcbind=unix");
    match network {
        Network::Mainnet => base,
        Network::Testnet4 => format!("{base} -testnet4"),
        Network::Signet => format!("{base} -signet"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_url_for_platform() {
        assert_eq!(
            download_url(Tarball::MinerApps, ReleasePlatform::LinuxArm64),
            "https://github.com/stratum-mining/sv2-apps/releases/download/v0.2.0/miner-apps-aarch64-unknown-linux-musl.tar.gz"
        );
    }

    #[test]
    fn parse_accepts_triples_and_short_names() {
        for platform in ReleasePlatform::ALL {
            assert_eq!(ReleasePlatform::parse(platform.target_triple()), Some(platform));
        }
        assert_eq!(ReleasePlatform::parse("macos-arm64"), Some(ReleasePlatform::MacosArm64));
        assert_eq!(ReleasePlatform::parse("windows"), None);
    }

    #[test]
    fn node_start_command_selects_network() {
        assert!(node_start_command(Network::Mainnet).ends_with("-ipcbind=unix"));
        assert!(node_start_command(Network::Testnet4).ends_with("-ipcbind=unix -testnet4"));
    }

    #[test]
    fn socket_paths() {
        assert_eq!(
            default_socket_path(Network::Mainnet, HostOs::Linux),
            "/home/<username>/.bitcoin/node.sock"
        );
        assert_eq!(
            default_socket_path(Network::Testnet4, HostOs::Macos),
            "/Users/<username>/Library/Application Support/Bitcoin/testnet4/node.sock"
        );
    }
}
