// crates/fitslim-config/tests/common/mod.rs
// =============================================================================
// Module: Config Test Helpers
// Description: Shared helpers for config validation tests.
// Purpose: Reduce duplication across integration tests for fitslim-config.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use std::io::Write;

use fitslim_config::ConfigError;
use fitslim_config::FitSlimConfig;
use tempfile::NamedTempFile;

/// Result type used by config tests.
pub type TestResult = Result<(), String>;

/// Parses a TOML string into a `FitSlimConfig` for tests.
pub fn config_from_toml(toml_str: &str) -> Result<FitSlimConfig, toml::de::Error> {
    toml::from_str(toml_str)
}

/// Returns a minimal config with all defaults applied.
pub fn minimal_config() -> Result<FitSlimConfig, toml::de::Error> {
    config_from_toml("")
}

/// Writes `content` to a temporary file that lives as long as the handle.
pub fn config_file(content: &[u8]) -> Result<NamedTempFile, String> {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(content).map_err(|err| err.to_string())?;
    file.flush().map_err(|err| err.to_string())?;
    Ok(file)
}

/// Asserts that `result` failed with a message containing `needle`.
pub fn assert_invalid<T>(result: Result<T, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config".to_string()),
    }
}
