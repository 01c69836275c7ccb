// tests/config_loading.rs

use std::error::Error;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use tempfile::{NamedTempFile, TempDir};

use schedgraph::config::{load_and_validate, load_or_default, ConfigFile, RawConfigFile};
use schedgraph::errors::ScheduleError;

type TestResult = Result<(), Box<dyn Error>>;

fn write_config(contents: &str) -> Result<NamedTempFile, Box<dyn Error>> {
    let mut file = NamedTempFile::new()?;
    write!(file, "{contents}")?;
    Ok(file)
}

#[test]
fn full_config_is_loaded() -> TestResult {
    let file = write_config(
        r#"
[store]
timeout_ms = 250

[topology]
path = "data/topo.json"

[semantic]
path = "data/docs.json"
"#,
    )?;

    let cfg = load_and_validate(file.path())?;
    assert_eq!(cfg.store_timeout(), Duration::from_millis(250));
    assert_eq!(cfg.topology.path, PathBuf::from("data/topo.json"));
    assert_eq!(cfg.semantic.path, PathBuf::from("data/docs.json"));
    Ok(())
}

#[test]
fn empty_file_uses_defaults() -> TestResult {
    let file = write_config("")?;

    let cfg = load_and_validate(file.path())?;
    assert_eq!(cfg.store.timeout_ms, 5_000);
    assert_eq!(cfg.topology.path, PathBuf::from(".schedgraph/topology.json"));
    assert_eq!(cfg.semantic.path, PathBuf::from(".schedgraph/semantic.json"));
    Ok(())
}

#[test]
fn missing_file_falls_back_to_defaults() -> TestResult {
    let dir = TempDir::new()?;
    let cfg = load_or_default(dir.path().join("Schedgraph.toml"))?;
    assert_eq!(cfg.store_timeout(), Duration::from_secs(5));
    Ok(())
}

#[test]
fn missing_file_is_an_io_error_for_strict_loading() -> TestResult {
    let dir = TempDir::new()?;
    match load_and_validate(dir.path().join("nope.toml")) {
        Err(ScheduleError::Io(_)) => {}
        other => panic!("Expected Io error, got: {other:?}"),
    }
    Ok(())
}

#[test]
fn zero_timeout_returns_config_error() -> TestResult {
    let file = write_config("[store]\ntimeout_ms = 0\n")?;

    match load_and_validate(file.path()) {
        Err(ScheduleError::Config(msg)) => assert!(msg.contains("timeout_ms")),
        other => panic!("Expected Config error, got: {other:?}"),
    }
    Ok(())
}

#[test]
fn shared_store_path_returns_config_error() -> TestResult {
    let file = write_config(
        r#"
[topology]
path = "same.json"

[semantic]
path = "same.json"
"#,
    )?;

    match load_and_validate(file.path()) {
        Err(ScheduleError::Config(msg)) => assert!(msg.contains("must differ")),
        other => panic!("Expected Config error, got: {other:?}"),
    }
    Ok(())
}

#[test]
fn unknown_key_returns_toml_error() -> TestResult {
    let file = write_config("[store]\ntimeout = 10\n")?;

    match load_and_validate(file.path()) {
        Err(ScheduleError::Toml(_)) => {}
        other => panic!("Expected Toml error, got: {other:?}"),
    }
    Ok(())
}

#[test]
fn empty_path_is_rejected_by_try_from() {
    let mut raw = RawConfigFile::default();
    raw.semantic.path = PathBuf::new();

    match ConfigFile::try_from(raw) {
        Err(ScheduleError::Config(msg)) => assert!(msg.contains("[semantic].path")),
        other => panic!("Expected Config error, got: {other:?}"),
    }
}
