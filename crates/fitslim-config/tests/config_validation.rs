//! Config defaults, loading and validation tests for fitslim-config.
// crates/fitslim-config/tests/config_validation.rs
// =============================================================================
// Module: Config Validation Tests
// Description: Validate defaults, file loading and fail-closed limits.
// Purpose: Ensure an empty config is usable and bad values are rejected.
// =============================================================================

use fitslim_config::AuditSinkKind;
use fitslim_config::ConfigError;
use fitslim_config::FitSlimConfig;
use fitslim_config::ServerTransport;

mod common;

use common::TestResult;
use common::assert_invalid;
use common::config_file;
use common::config_from_toml;
use common::minimal_config;

// ============================================================================
// SECTION: Defaults
// ============================================================================

#[test]
fn default_config_validates() -> TestResult {
    let config = minimal_config().map_err(|err| err.to_string())?;
    config.validate().map_err(|err| err.to_string())?;
    if config.server.transport != ServerTransport::Tcp {
        return Err("default transport should be tcp".to_string());
    }
    if config.server.protocol_version != "0.3" {
        return Err(format!("unexpected protocol version {}", config.server.protocol_version));
    }
    if config.audit.sink != AuditSinkKind::Stderr {
        return Err("default audit sink should be stderr".to_string());
    }
    let addr = config.server.bind_addr().map_err(|err| err.to_string())?;
    if !addr.ip().is_loopback() {
        return Err(format!("default bind {addr} should be loopback"));
    }
    Ok(())
}

#[test]
fn full_config_parses_every_section() -> TestResult {
    let config = config_from_toml(
        r#"
        [server]
        transport = "stdio"
        max_message_bytes = 4096
        protocol_version = "0.4"

        [audit]
        sink = "none"

        [exclusions]
        patterns = ["^\\.", "\\.bak$"]
        "#,
    )
    .map_err(|err| err.to_string())?;
    config.validate().map_err(|err| err.to_string())?;
    if config.server.transport != ServerTransport::Stdio || config.server.max_message_bytes != 4096 {
        return Err("server section not applied".to_string());
    }
    let exclusions = config.file_exclusions().map_err(|err| err.to_string())?;
    if exclusions.len() != 2 {
        return Err(format!("expected 2 exclusions, got {}", exclusions.len()));
    }
    Ok(())
}

// ============================================================================
// SECTION: Server Validation
// ============================================================================

#[test]
fn tcp_requires_valid_bind() -> TestResult {
    let mut config = minimal_config().map_err(|err| err.to_string())?;
    config.server.bind = None;
    assert_invalid(config.validate(), "tcp transport requires bind address")?;
    config.server.bind = Some("not an address".to_string());
    assert_invalid(config.validate(), "invalid bind address")?;
    Ok(())
}

#[test]
fn non_loopback_bind_requires_opt_in() -> TestResult {
    let mut config = minimal_config().map_err(|err| err.to_string())?;
    config.server.bind = Some("0.0.0.0:8085".to_string());
    assert_invalid(config.validate(), "allow_non_loopback")?;
    config.server.allow_non_loopback = true;
    config.validate().map_err(|err| err.to_string())?;
    Ok(())
}

#[test]
fn stdio_ignores_bind() -> TestResult {
    let mut config = minimal_config().map_err(|err| err.to_string())?;
    config.server.transport = ServerTransport::Stdio;
    config.server.bind = None;
    config.validate().map_err(|err| err.to_string())
}

#[test]
fn message_limit_must_be_positive_and_bounded() -> TestResult {
    let mut config = minimal_config().map_err(|err| err.to_string())?;
    config.server.max_message_bytes = 0;
    assert_invalid(config.validate(), "greater than zero")?;
    config.server.max_message_bytes = usize::MAX;
    assert_invalid(config.validate(), "exceeds limit")?;
    Ok(())
}

#[test]
fn protocol_version_is_restricted() -> TestResult {
    let mut config = minimal_config().map_err(|err| err.to_string())?;
    config.server.protocol_version = "0.3\nextra".to_string();
    assert_invalid(config.validate(), "protocol_version")?;
    config.server.protocol_version = String::new();
    assert_invalid(config.validate(), "protocol_version")?;
    Ok(())
}

// ============================================================================
// SECTION: Audit And Exclusions
// ============================================================================

#[test]
fn file_sink_requires_path() -> TestResult {
    let mut config = minimal_config().map_err(|err| err.to_string())?;
    config.audit.sink = AuditSinkKind::File;
    assert_invalid(config.validate(), "audit.sink=file requires audit.path")?;
    config.audit.path = Some("   ".to_string());
    assert_invalid(config.validate(), "audit.path must be non-empty")?;
    config.audit.path = Some("audit.jsonl".to_string());
    config.validate().map_err(|err| err.to_string())
}

#[test]
fn audit_path_limits_name_the_field_and_sizes() -> TestResult {
    let mut config = minimal_config().map_err(|err| err.to_string())?;
    config.audit.path = Some(format!("logs/{}.jsonl", "a".repeat(300)));
    assert_invalid(config.validate(), "audit.path has a 306-byte path component, limit is 255")?;
    config.audit.path = Some(vec!["d"; 2100].join("/"));
    assert_invalid(config.validate(), "audit.path path is 4199 bytes, limit is 4096")?;
    config.audit.path = Some(format!("logs/{}.jsonl", "a".repeat(249)));
    config.validate().map_err(|err| err.to_string())
}

#[test]
fn invalid_exclusion_pattern_is_rejected() -> TestResult {
    let mut config = minimal_config().map_err(|err| err.to_string())?;
    config.exclusions.patterns = vec!["(unclosed".to_string()];
    assert_invalid(config.validate(), "invalid pattern (unclosed")?;
    config.exclusions.patterns = vec![String::new()];
    assert_invalid(config.validate(), "must be non-empty")?;
    Ok(())
}

// ============================================================================
// SECTION: Loading
// ============================================================================

#[test]
fn load_reads_explicit_path() -> TestResult {
    let file = config_file(b"[server]\ntransport = \"stdio\"\n")?;
    let config = FitSlimConfig::load(Some(file.path())).map_err(|err| err.to_string())?;
    if config.server.transport != ServerTransport::Stdio {
        return Err("transport not loaded from file".to_string());
    }
    Ok(())
}

#[test]
fn load_rejects_unparseable_toml() -> TestResult {
    let file = config_file(b"[server\n")?;
    match FitSlimConfig::load(Some(file.path())) {
        Err(ConfigError::Parse(_)) => Ok(()),
        other => Err(format!("expected parse error, got {}", describe(&other))),
    }
}

#[test]
fn load_rejects_non_utf8() -> TestResult {
    let file = config_file(&[0xff, 0xfe, 0xfd])?;
    assert_invalid(FitSlimConfig::load(Some(file.path())), "config file must be utf-8")
}

#[test]
fn load_rejects_oversized_file() -> TestResult {
    let mut content = b"# padding\n".to_vec();
    content.resize(1024 * 1024 + 1, b'#');
    let file = config_file(&content)?;
    assert_invalid(
        FitSlimConfig::load(Some(file.path())),
        "exceeds size limit (1048577 bytes, limit is 1048576)",
    )
}

#[test]
fn load_rejects_overlong_flag_path_before_reading() -> TestResult {
    let path = std::path::PathBuf::from(format!("{}.toml", "c".repeat(256)));
    assert_invalid(
        FitSlimConfig::load(Some(&path)),
        "--config has a 261-byte path component, limit is 255",
    )
}

#[test]
fn load_validates_after_parsing() -> TestResult {
    let file = config_file(b"[audit]\nsink = \"file\"\n")?;
    assert_invalid(FitSlimConfig::load(Some(file.path())), "requires audit.path")
}

#[test]
fn load_reports_missing_file_as_io() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    match FitSlimConfig::load(Some(&dir.path().join("missing.toml"))) {
        Err(ConfigError::Io(message)) if message.contains("missing.toml") => Ok(()),
        other => Err(format!("expected io error, got {}", describe(&other))),
    }
}

/// Describes a load outcome without requiring `Debug`.
fn describe(result: &Result<FitSlimConfig, ConfigError>) -> String {
    match result {
        Ok(_) => "ok".to_string(),
        Err(error) => error.to_string(),
    }
}
