//! SV2 Wizard: guided deployment of Stratum V2 mining setups.

pub mod config;
pub mod deploy;
pub mod error;
pub mod network;
pub mod pools;
pub mod templates;
pub mod terminal;
pub mod wizard;
