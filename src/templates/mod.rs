//! Config file generation for the SV2 applications.
//!
//! Each builder resolves its fields in the same order: an explicit value from
//! [`ConfigTemplateData`], then the selected pool's registry entry for the
//! chosen network (upstream fields only), then a constant from [`defaults`].

pub mod builder;
pub mod data;
pub mod defaults;
pub mod jd_client;
pub mod jds;
pub mod pool_server;
pub mod render;
pub mod translator;

pub use builder::{BuildOptions, ConfigKind, build, build_with, insecure_defaults_used};
pub use data::ConfigTemplateData;
