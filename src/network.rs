//! Bitcoin networks the generated stack can target.

use serde::{Deserialize, Serialize};

/// A Bitcoin network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Network {
    #[default]
    Mainnet,
    Testnet4,
    Signet,
}

impl Network {
    /// All supported networks.
    pub const ALL: [Network; 3] = [Network::Mainnet, Network::Testnet4, Network::Signet];

    /// Canonical lowercase name, as written into node IPC config sections.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Testnet4 => "testnet4",
            Self::Signet => "signet",
        }
    }

    /// Parse a network name. Unknown names yield `None`.
    pub fn parse(s: &str) -> Option<Network> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" | "main" | "bitcoin" => Some(Self::Mainnet),
            "testnet4" => Some(Self::Testnet4),
            "signet" => Some(Self::Signet),
            _ => None,
        }
    }

    /// Bitcoin Core RPC port for this network.
    pub fn rpc_port(&self) -> u16 {
        match self {
            Self::Mainnet => 8332,
            Self::Testnet4 => 48332,
            Self::Signet => 38332,
        }
    }

    /// Placeholder reward address used when the operator supplied none.
    pub fn address_placeholder(&self) -> &'static str {
        match self {
            Self::Mainnet => "bc1q...",
            Self::Testnet4 | Self::Signet => "tb1q...",
        }
    }

    /// Subdirectory of the node data dir holding this network's files.
    pub fn data_subdir(&self) -> Option<&'static str> {
        match self {
            Self::Mainnet => None,
            Self::Testnet4 => Some("testnet4"),
            Self::Signet => Some("signet"),
        }
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
