//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use crate::deploy::{DeploymentFlavor, ReleasePlatform};
use crate::error::ConfigError;

/// Navigation engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How long the completion acknowledgement stays up before `reset` clears the session.
    pub reset_delay: Duration,
    /// Progress percentage added per visited step.
    pub progress_step_weight: u32,
    /// Capacity of the wizard event broadcast channel.
    pub event_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reset_delay: Duration::from_secs(2),
            progress_step_weight: 15,
            event_capacity: 64,
        }
    }
}

/// Terminal front-end configuration.
#[derive(Debug, Clone)]
pub struct WizardConfig {
    /// Which built-in flow to run.
    pub flow: DeploymentFlavor,
    /// Directory generated artifacts are written under.
    pub output_dir: PathBuf,
    /// Platform used for release download URLs.
    pub platform: ReleasePlatform,
    pub engine: EngineConfig,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            flow: DeploymentFlavor::PoolConnection,
            output_dir: PathBuf::from("./sv2-config"),
            platform: ReleasePlatform::LinuxX64,
            engine: EngineConfig::default(),
        }
    }
}

/// Environment variables read by [`WizardConfig::from_env`].
pub mod env_keys {
    pub const FLOW: &str = "SV2_WIZARD_FLOW";
    pub const OUTPUT_DIR: &str = "SV2_WIZARD_OUTPUT_DIR";
    pub const RESET_DELAY_MS: &str = "SV2_WIZARD_RESET_DELAY_MS";
    pub const STEP_WEIGHT: &str = "SV2_WIZARD_STEP_WEIGHT";
    pub const PLATFORM: &str = "SV2_WIZARD_PLATFORM";
}

impl WizardConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup. Unset keys keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(flow) = lookup(env_keys::FLOW) {
            config.flow = DeploymentFlavor::parse(&flow).ok_or_else(|| ConfigError::InvalidValue {
                key: env_keys::FLOW.to_string(),
                message: format!("expected 'pool' or 'full-stack', got '{flow}'"),
            })?;
        }

        if let Some(dir) = lookup(env_keys::OUTPUT_DIR)
            && !dir.trim().is_empty()
        {
            config.output_dir = PathBuf::from(dir);
        }

        if let Some(ms) = lookup(env_keys::RESET_DELAY_MS) {
            let ms: u64 = ms.trim().parse().map_err(|e| ConfigError::InvalidValue {
                key: env_keys::RESET_DELAY_MS.to_string(),
                message: format!("{e}"),
            })?;
            config.engine.reset_delay = Duration::from_millis(ms);
        }

        if let Some(weight) = lookup(env_keys::STEP_WEIGHT) {
            let weight: u32 = weight.trim().parse().map_err(|e| ConfigError::InvalidValue {
                key: env_keys::STEP_WEIGHT.to_string(),
                message: format!("{e}"),
            })?;
            if weight == 0 {
                return Err(ConfigError::InvalidValue {
                    key: env_keys::STEP_WEIGHT.to_string(),
                    message: "must be greater than zero".to_string(),
                });
            }
            config.engine.progress_step_weight = weight;
        }

        if let Some(platform) = lookup(env_keys::PLATFORM) {
            config.platform =
                ReleasePlatform::parse(&platform).ok_or_else(|| ConfigError::InvalidValue {
                    key: env_keys::PLATFORM.to_string(),
                    message: format!("unknown release platform '{platform}'"),
                })?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = WizardConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.flow, DeploymentFlavor::PoolConnection);
        assert_eq!(config.engine.reset_delay, Duration::from_secs(2));
        assert_eq!(config.engine.progress_step_weight, 15);
        assert_eq!(config.output_dir, PathBuf::from("./sv2-config"));
    }

    #[test]
    fn reads_all_keys() {
        let config = WizardConfig::from_lookup(lookup(&[
            (env_keys::FLOW, "full-stack"),
            (env_keys::OUTPUT_DIR, "/tmp/out"),
            (env_keys::RESET_DELAY_MS, "250"),
            (env_keys::STEP_WEIGHT, "20"),
            (env_keys::PLATFORM, "aarch64-apple-darwin"),
        ]))
        .unwrap();
        assert_eq!(config.flow, DeploymentFlavor::FullStack);
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.engine.reset_delay, Duration::from_millis(250));
        assert_eq!(config.engine.progress_step_weight, 20);
        assert_eq!(config.platform, ReleasePlatform::MacosArm64);
    }

    #[test]
    fn invalid_delay_is_error() {
        let err = WizardConfig::from_lookup(lookup(&[(env_keys::RESET_DELAY_MS, "soon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key, .. } if key == env_keys::RESET_DELAY_MS));
    }

    #[test]
    fn zero_step_weight_is_error() {
        assert!(WizardConfig::from_lookup(lookup(&[(env_keys::STEP_WEIGHT, "0")])).is_err());
    }

    #[test]
    fn unknown_flow_is_error() {
        assert!(WizardConfig::from_lookup(lookup(&[(env_keys::FLOW, "solo")])).is_err());
    }
}
