//! Dispatch configuration.
//!
//! Limits are read once, when call-site nodes are created. Changing a
//! configuration never affects nodes that already exist.

use garnet_core::ConfigurationError;
use std::sync::Arc;
use tracing::warn;

/// Environment variable overriding [`DispatchConfig::specialization_limit`].
pub const SPECIALIZATION_LIMIT_VAR: &str = "GARNET_SPECIALIZATION_LIMIT";

/// Environment variable overriding [`DispatchConfig::storage_strategy_limit`].
pub const STORAGE_STRATEGY_LIMIT_VAR: &str = "GARNET_STORAGE_STRATEGY_LIMIT";

/// Largest limit accepted for either cache. The installed list is scanned
/// linearly, so larger caches stop paying for themselves.
pub const MAX_LIMIT: usize = 64;

/// Configuration for self-specializing call sites.
///
/// # Example
///
/// ```ignore
/// use garnet_vm::DispatchConfig;
///
/// // Sites that give up on caching after two shapes
/// let config = DispatchConfig {
///     specialization_limit: 2,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Maximum number of specializations a value-dispatching node installs
    /// before it goes megamorphic.
    ///
    /// 0 disables caching: every call runs the generic fallback.
    ///
    /// Default: 8
    pub specialization_limit: usize,

    /// Maximum number of storage kinds an array site caches a strategy for.
    ///
    /// Default: 4
    pub storage_strategy_limit: usize,

    /// Method called to convert objects to integers.
    ///
    /// Default: `to_int`
    pub conversion_method: Arc<str>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            specialization_limit: 8,
            storage_strategy_limit: 4,
            conversion_method: Arc::from("to_int"),
        }
    }
}

impl DispatchConfig {
    /// Every site caches a single shape.
    pub fn monomorphic() -> Self {
        Self {
            specialization_limit: 1,
            storage_strategy_limit: 1,
            ..Default::default()
        }
    }

    /// No caching anywhere; every call takes the generic path.
    pub fn uncached() -> Self {
        Self {
            specialization_limit: 0,
            storage_strategy_limit: 0,
            ..Default::default()
        }
    }

    /// Defaults overlaid with the `GARNET_*` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env(|var| std::env::var(var).ok());
        config
    }

    /// Overlay limits from `lookup`. Unparseable values are ignored with a
    /// warning.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(limit) = Self::env_limit(&lookup, SPECIALIZATION_LIMIT_VAR) {
            self.specialization_limit = limit;
        }
        if let Some(limit) = Self::env_limit(&lookup, STORAGE_STRATEGY_LIMIT_VAR) {
            self.storage_strategy_limit = limit;
        }
    }

    fn env_limit(lookup: &impl Fn(&str) -> Option<String>, var: &'static str) -> Option<usize> {
        let raw = lookup(var)?;
        match raw.trim().parse::<usize>() {
            Ok(limit) => Some(limit),
            Err(_) => {
                warn!(var, value = %raw, "ignoring non-numeric dispatch limit");
                None
            }
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        Self::check_limit("specialization_limit", self.specialization_limit)?;
        Self::check_limit("storage_strategy_limit", self.storage_strategy_limit)?;
        Ok(())
    }

    fn check_limit(name: &'static str, value: usize) -> Result<(), ConfigurationError> {
        if value > MAX_LIMIT {
            return Err(ConfigurationError::InvalidLimit {
                name,
                value,
                max: MAX_LIMIT,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |var: &str| {
            pairs
                .iter()
                .find(|(name, _)| *name == var)
                .map(|(_, value)| value.to_string())
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = DispatchConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.specialization_limit, 8);
        assert_eq!(config.storage_strategy_limit, 4);
        assert_eq!(&*config.conversion_method, "to_int");
    }

    #[test]
    fn test_preset_configs_are_valid() {
        assert!(DispatchConfig::monomorphic().validate().is_ok());
        assert!(DispatchConfig::uncached().validate().is_ok());
        assert_eq!(DispatchConfig::uncached().specialization_limit, 0);
    }

    #[test]
    fn test_limit_too_large() {
        let config = DispatchConfig {
            storage_strategy_limit: MAX_LIMIT + 1,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigurationError::InvalidLimit {
                name: "storage_strategy_limit",
                value: MAX_LIMIT + 1,
                max: MAX_LIMIT,
            })
        );
    }

    #[test]
    fn test_env_overrides_limits() {
        let mut config = DispatchConfig::default();
        config.apply_env(env(&[
            (SPECIALIZATION_LIMIT_VAR, "3"),
            (STORAGE_STRATEGY_LIMIT_VAR, " 2 "),
        ]));
        assert_eq!(config.specialization_limit, 3);
        assert_eq!(config.storage_strategy_limit, 2);
    }

    #[test]
    fn test_env_ignores_garbage() {
        let mut config = DispatchConfig::default();
        config.apply_env(env(&[(SPECIALIZATION_LIMIT_VAR, "lots")]));
        assert_eq!(config, DispatchConfig::default());
    }
}
