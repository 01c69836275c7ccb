// src/lib.rs

pub mod cli;
pub mod config;
pub mod coordinator;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod model;
pub mod store;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use serde_json::json;
use tracing::debug;

use crate::cli::{CliArgs, Command};
use crate::config::{load_or_default, ConfigFile};
use crate::dag::CriticalPath;
use crate::engine::{AuditReport, TopologyEngine};
use crate::fs::RealFileSystem;
use crate::store::{FileSemanticIndex, FileTopologyStore};

/// High-level entry point used by `main.rs`.
///
/// Loads the config, opens the file-backed stores and runs one command.
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_or_default(&config_path)?;
    let root = config_root_dir(&config_path);
    let engine = open_engine(&cfg, &root);
    let json = args.json;

    match args.command {
        Command::AddActivity {
            name,
            description,
            duration,
        } => {
            let id = engine.add_activity(&name, &description, &duration).await?;
            println!("{id}");
        }
        Command::AddRelationship {
            relationship_type,
            predecessor,
            successor,
            lag,
        } => {
            let id = engine
                .add_relationship(relationship_type, predecessor, successor, lag)
                .await?;
            println!("{id}");
        }
        Command::DeleteActivity { id } => {
            let outcome = engine.delete_activity(id).await?;
            println!(
                "deleted activity {id} ({} relationship(s) removed)",
                outcome.removed_relationships.len()
            );
        }
        Command::DeleteRelationship { id } => {
            engine.delete_relationship(id).await?;
            println!("deleted relationship {id}");
        }
        Command::Dissolve { id } => {
            let outcome = engine.dissolve_activity(id).await?;
            println!(
                "dissolved activity {id}: {} removed, {} created",
                outcome.removed_relationships.len(),
                outcome.created.len()
            );
            for rel in &outcome.created {
                println!(
                    "  {} {} {} -> {} lag {}",
                    rel.id, rel.relationship_type, rel.predecessor, rel.successor, rel.lag
                );
            }
        }
        Command::CriticalPath => {
            let path = engine.critical_path().await?;
            print_critical_path(&path, json)?;
        }
        Command::List => {
            let activities = engine.activities().await?;
            let relationships = engine.relationships().await?;
            if json {
                let out = json!({ "activities": activities, "relationships": relationships });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!("activities ({}):", activities.len());
                for a in &activities {
                    println!("  - {} {:?} duration={}", a.id, a.name, a.duration);
                }
                println!("relationships ({}):", relationships.len());
                for r in &relationships {
                    println!(
                        "  - {} {} {} -> {} lag={}",
                        r.id, r.relationship_type, r.predecessor_id, r.successor_id, r.lag
                    );
                }
            }
        }
        Command::Audit => {
            let report = engine.audit().await?;
            print_audit(&report);
        }
        Command::Status => {
            let health = engine.health().await;
            println!("topology: {}", if health.topology { "up" } else { "down" });
            println!("semantic: {}", if health.semantic { "up" } else { "down" });
            if !health.all_up() {
                anyhow::bail!("one or more stores are unreachable");
            }
        }
    }

    Ok(())
}

/// Build an engine over the JSON file stores named in `cfg`.
///
/// Relative store paths are resolved against `root`.
pub fn open_engine(cfg: &ConfigFile, root: &Path) -> TopologyEngine {
    let topology_path = root.join(&cfg.topology.path);
    let semantic_path = root.join(&cfg.semantic.path);
    debug!(
        topology = %topology_path.display(),
        semantic = %semantic_path.display(),
        timeout_ms = cfg.store.timeout_ms,
        "opening stores"
    );

    TopologyEngine::with_stores(
        Arc::new(FileTopologyStore::new(RealFileSystem, topology_path)),
        Arc::new(FileSemanticIndex::new(RealFileSystem, semantic_path)),
        cfg.store_timeout(),
    )
}

/// Directory holding the config file, or the working directory for a bare
/// file name.
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

fn print_critical_path(path: &CriticalPath, json: bool) -> Result<()> {
    if json {
        let activities: Vec<String> = path.activities().iter().map(|a| a.to_string()).collect();
        let out = json!({
            "total": path.total,
            "nodes": path.nodes,
            "activities": activities,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("critical path total = {}", path.total);
    for activity in path.activities() {
        println!("  - {activity}");
    }
    Ok(())
}

fn print_audit(report: &AuditReport) {
    if report.is_clean() {
        println!("audit: no inconsistencies");
        return;
    }
    println!("audit: {} finding(s)", report.findings.len());
    for finding in &report.findings {
        println!("  - {finding}");
    }
    if !report.flagged.is_empty() {
        println!("flagged for repair:");
        for id in &report.flagged {
            println!("  - {id}");
        }
    }
}
