//! Runtime configuration
//!
//! The only knob is the `debug` flag, which turns on `tracing` diagnostics for
//! container and store activity. It can be set programmatically with
//! [`configure`] or loaded from the `LOCUS_DEBUG` environment variable.

use crate::errors::CoreError;
use std::env;
use std::sync::RwLock;

/// Environment variable read by [`LocatorConfig::from_env`]
pub const DEBUG_ENV_VAR: &str = "LOCUS_DEBUG";

static CONFIG: RwLock<LocatorConfig> = RwLock::new(LocatorConfig { debug: false });

/// Process-wide configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocatorConfig {
    /// Emit debug diagnostics
    pub debug: bool,
}

impl LocatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Load configuration from environment variables
    ///
    /// An unset variable keeps the default.
    pub fn from_env() -> Result<Self, CoreError> {
        match env::var(DEBUG_ENV_VAR) {
            Ok(value) => Ok(Self::new().with_debug(parse_flag(&value)?)),
            Err(env::VarError::NotPresent) => Ok(Self::new()),
            Err(env::VarError::NotUnicode(_)) => Err(CoreError::configuration(format!(
                "{} is not valid unicode",
                DEBUG_ENV_VAR
            ))),
        }
    }
}

fn parse_flag(value: &str) -> Result<bool, CoreError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(CoreError::configuration(format!(
            "{} must be a boolean flag, got '{}'",
            DEBUG_ENV_VAR, other
        ))),
    }
}

/// Replace the process-wide configuration
pub fn configure(config: LocatorConfig) {
    match CONFIG.write() {
        Ok(mut current) => *current = config,
        Err(poisoned) => *poisoned.into_inner() = config,
    }
}

/// Get a copy of the process-wide configuration
pub fn config() -> LocatorConfig {
    match CONFIG.read() {
        Ok(current) => current.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

/// Check the debug flag
pub fn is_debug() -> bool {
    config().debug
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("TRUE").unwrap());
        assert!(parse_flag(" on ").unwrap());
        assert!(!parse_flag("0").unwrap());
        assert!(!parse_flag("").unwrap());
        assert!(parse_flag("maybe").is_err());
    }

    #[test]
    #[serial]
    fn test_from_env() {
        env::set_var(DEBUG_ENV_VAR, "yes");
        assert!(LocatorConfig::from_env().unwrap().debug);

        env::set_var(DEBUG_ENV_VAR, "sometimes");
        assert!(LocatorConfig::from_env().is_err());

        env::remove_var(DEBUG_ENV_VAR);
        assert_eq!(LocatorConfig::from_env().unwrap(), LocatorConfig::default());
    }

    #[test]
    #[serial]
    fn test_configure_round_trip() {
        configure(LocatorConfig::new().with_debug(true));
        assert!(is_debug());

        configure(LocatorConfig::default());
        assert!(!is_debug());
    }
}
