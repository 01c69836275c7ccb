// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Configuration as read from TOML, before validation.
///
/// ```toml
/// [store]
/// timeout_ms = 5000
///
/// [topology]
/// path = ".schedgraph/topology.json"
///
/// [semantic]
/// path = ".schedgraph/semantic.json"
/// ```
///
/// All sections are optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub store: StoreSection,

    #[serde(default)]
    pub topology: TopologySection,

    #[serde(default)]
    pub semantic: SemanticSection,
}

/// Validated configuration. Build it with `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub store: StoreSection,
    pub topology: TopologySection,
    pub semantic: SemanticSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        store: StoreSection,
        topology: TopologySection,
        semantic: SemanticSection,
    ) -> Self {
        Self {
            store,
            topology,
            semantic,
        }
    }

    /// Per-call store timeout.
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store.timeout_ms)
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::new_unchecked(
            StoreSection::default(),
            TopologySection::default(),
            SemanticSection::default(),
        )
    }
}

/// `[store]` section: behaviour shared by both store adapters.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreSection {
    /// Timeout applied to every single store call, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    5_000
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// `[topology]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TopologySection {
    /// JSON file backing the topology store.
    #[serde(default = "default_topology_path")]
    pub path: PathBuf,
}

fn default_topology_path() -> PathBuf {
    PathBuf::from(".schedgraph/topology.json")
}

impl Default for TopologySection {
    fn default() -> Self {
        Self {
            path: default_topology_path(),
        }
    }
}

/// `[semantic]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SemanticSection {
    /// JSON file backing the semantic index.
    #[serde(default = "default_semantic_path")]
    pub path: PathBuf,
}

fn default_semantic_path() -> PathBuf {
    PathBuf::from(".schedgraph/semantic.json")
}

impl Default for SemanticSection {
    fn default() -> Self {
        Self {
            path: default_semantic_path(),
        }
    }
}
