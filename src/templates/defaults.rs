//! Fallback values used when neither the operator nor the pool registry
//! supplies a field.
//!
//! The authority keypair, identity, reward address and RPC credentials below
//! are well-known placeholders. Artifacts built on them are convenient for a
//! first local run and unsafe anywhere else; see
//! [`insecure_defaults_used`](super::builder::insecure_defaults_used).

/// Reference-implementation example authority public key.
pub const DEFAULT_AUTHORITY_PUBLIC_KEY: &str = "9auqWEzQDVyd2oe1JVGFLMLHZtCo2FFqZwtKA5gd9xbuEu7PH72";
/// Reference-implementation example authority secret key.
pub const DEFAULT_AUTHORITY_SECRET_KEY: &str = "mkDLTBBRxdBv998612qipDYoTK3YUrqLe8uWw7gu3iXbSrn2n";

pub const LOCALHOST: &str = "127.0.0.1";
pub const ANY_ADDRESS: &str = "0.0.0.0";

pub const POOL_PORT: u16 = 34254;
pub const JDS_PORT: u16 = 34264;
pub const JDC_PORT: u16 = 34265;

pub const FEE_THRESHOLD: f64 = 100.0;
pub const MIN_INTERVAL: f64 = 5.0;
pub const SHARES_PER_MINUTE: f64 = 6.0;
pub const SHARE_BATCH_SIZE: f64 = 10.0;
/// 10 TH/s expressed in H/s.
pub const MIN_INDIVIDUAL_MINER_HASHRATE: f64 = 10_000_000_000_000.0;

pub const USER_IDENTITY: &str = "your_username_here";
pub const JDC_SIGNATURE: &str = "Sv2MinerSignature";
pub const POOL_SIGNATURE: &str = "Stratum V2 SRI Pool";

pub const CORE_RPC_USER: &str = "username";
pub const CORE_RPC_PASS: &str = "password";

/// Commented example written when no custom node data dir was given.
pub const DATA_DIR_EXAMPLE_LINE: &str = "# data_dir = \"/path/to/bitcoin/datadir\"";
