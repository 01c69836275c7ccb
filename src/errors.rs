// src/errors.rs

//! Crate-wide error types.
//!
//! `ScheduleError` is what every public operation returns. Callers that
//! present errors to users must distinguish "nothing happened" from "state
//! needs repair"; use [`ScheduleError::needs_repair`] for that.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::model::EntityId;

/// Failure of a single call against one of the two stores.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{store} call `{op}` timed out after {elapsed:?}")]
    Timeout {
        store: StoreKind,
        op: &'static str,
        elapsed: Duration,
    },

    #[error("{0} store unavailable")]
    Unavailable(StoreKind),

    #[error("store rejected write: {0}")]
    Rejected(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StoreError {
    /// True when the call may have taken effect despite the error.
    ///
    /// Only a timeout leaves the outcome open; every other error is a
    /// definite refusal.
    pub fn outcome_unknown(&self) -> bool {
        matches!(self, StoreError::Timeout { .. })
    }
}

/// Which of the two persistent stores a call went to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Topology,
    Semantic,
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreKind::Topology => write!(f, "topology"),
            StoreKind::Semantic => write!(f, "semantic"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid relationship: {0}")]
    InvalidRelationship(String),

    #[error("Not found: {0}")]
    NotFound(EntityId),

    #[error("Dangling reference: {0} does not resolve to a complete activity")]
    DanglingReference(EntityId),

    #[error("Commit failed for {}: {source}", display_ids(.entities))]
    Commit {
        entities: Vec<EntityId>,
        #[source]
        source: StoreError,
    },

    #[error(
        "Partial commit for {}: {cause}; rollback failed ({} step(s)); entities flagged for repair",
        display_ids(.entities),
        .rollback_failures.len()
    )]
    PartialCommit {
        entities: Vec<EntityId>,
        cause: StoreError,
        rollback_failures: Vec<StoreError>,
    },

    /// A read failed; nothing was written.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Cycle detected in schedule graph: {0}")]
    Cycle(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ScheduleError {
    /// True when the stores may disagree and need out-of-band repair.
    ///
    /// Every other error means no durable change was made.
    pub fn needs_repair(&self) -> bool {
        matches!(self, ScheduleError::PartialCommit { .. })
    }

    /// Entity ids carried by commit-class errors.
    pub fn entities(&self) -> &[EntityId] {
        match self {
            ScheduleError::Commit { entities, .. }
            | ScheduleError::PartialCommit { entities, .. } => entities,
            _ => &[],
        }
    }
}

fn display_ids(ids: &[EntityId]) -> String {
    let parts: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
    format!("[{}]", parts.join(", "))
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, ScheduleError>;
