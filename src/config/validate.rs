// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, ScheduleError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = ScheduleError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.store, raw.topology, raw.semantic))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_store(cfg)?;
    validate_paths(cfg)?;
    Ok(())
}

fn validate_store(cfg: &RawConfigFile) -> Result<()> {
    if cfg.store.timeout_ms == 0 {
        return Err(ScheduleError::Config(
            "[store].timeout_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_paths(cfg: &RawConfigFile) -> Result<()> {
    if cfg.topology.path.as_os_str().is_empty() {
        return Err(ScheduleError::Config(
            "[topology].path must not be empty".to_string(),
        ));
    }
    if cfg.semantic.path.as_os_str().is_empty() {
        return Err(ScheduleError::Config(
            "[semantic].path must not be empty".to_string(),
        ));
    }
    if cfg.topology.path == cfg.semantic.path {
        return Err(ScheduleError::Config(format!(
            "[topology].path and [semantic].path must differ (both are {:?})",
            cfg.topology.path
        )));
    }
    Ok(())
}
