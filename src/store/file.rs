// src/store/file.rs

//! JSON-file-backed stores.
//!
//! Each store owns one file and rewrites it on every call, loading the
//! current contents first. A missing file reads as an empty store.
//!
//! File IO runs on Tokio's blocking pool so that a stalled disk cannot pin
//! an async worker, and the coordinator's per-call timeout still fires. The
//! per-file lock is held until the blocking call returns, even when the
//! awaiting caller has already given up.
//!
//! Layout on disk (paths come from `[topology]` / `[semantic]` in the config):
//!
//! ```json
//! { "nodes": [{"id": "s-…", "weight": 0.0}], "edges": [{"from": "…", "to": "…"}] }
//! { "activities": [ … ], "relationships": [ … ] }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::errors::StoreError;
use crate::fs::FileSystem;
use crate::model::{ActivityDoc, ActivityId, RelationshipDoc, RelationshipId};
use crate::store::{
    rank_by_overlap, SemanticIndex, StoreResult, TopologyEdge, TopologyNode, TopologyStore,
};

#[derive(Debug, Default, Serialize, Deserialize)]
struct TopologyFile {
    #[serde(default)]
    nodes: Vec<TopologyNode>,
    #[serde(default)]
    edges: Vec<TopologyEdge>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SemanticFile {
    #[serde(default)]
    activities: Vec<ActivityDoc>,
    #[serde(default)]
    relationships: Vec<RelationshipDoc>,
}

fn load_json<T, F>(fs: &F, path: &Path) -> StoreResult<T>
where
    T: DeserializeOwned + Default,
    F: FileSystem,
{
    if !fs.exists(path) {
        return Ok(T::default());
    }
    let raw = fs.read_to_string(path)?;
    if raw.trim().is_empty() {
        return Ok(T::default());
    }
    Ok(serde_json::from_str(&raw)?)
}

fn save_json<T, F>(fs: &F, path: &Path, value: &T) -> StoreResult<()>
where
    T: Serialize,
    F: FileSystem,
{
    let bytes = serde_json::to_vec_pretty(value)?;
    fs.write(path, &bytes)?;
    debug!(path = ?path, bytes = bytes.len(), "persisted store file");
    Ok(())
}

/// One JSON document on a [`FileSystem`], guarded by a per-file lock.
#[derive(Debug)]
struct JsonFile<F> {
    fs: Arc<F>,
    path: PathBuf,
    io: Arc<Mutex<()>>,
}

impl<F: FileSystem + 'static> JsonFile<F> {
    fn new(fs: F, path: PathBuf) -> Self {
        Self {
            fs: Arc::new(fs),
            path,
            io: Arc::new(Mutex::new(())),
        }
    }

    async fn read<T>(&self) -> StoreResult<T>
    where
        T: DeserializeOwned + Default + Send + 'static,
    {
        self.blocking(|fs, path| load_json(fs, path)).await
    }

    /// Load, mutate and save as one blocking call.
    async fn update<T, R>(
        &self,
        f: impl FnOnce(&mut T) -> StoreResult<R> + Send + 'static,
    ) -> StoreResult<R>
    where
        T: DeserializeOwned + Serialize + Default + 'static,
        R: Send + 'static,
    {
        self.blocking(move |fs, path| {
            let mut file: T = load_json(fs, path)?;
            let out = f(&mut file)?;
            save_json(fs, path, &file)?;
            Ok(out)
        })
        .await
    }

    async fn blocking<R>(
        &self,
        f: impl FnOnce(&F, &Path) -> StoreResult<R> + Send + 'static,
    ) -> StoreResult<R>
    where
        R: Send + 'static,
    {
        let guard = Arc::clone(&self.io).lock_owned().await;
        let fs = Arc::clone(&self.fs);
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || {
            let _io = guard;
            f(fs.as_ref(), &path)
        })
        .await
        .map_err(|e| StoreError::Other(anyhow!("file store task failed: {e}")))?
    }
}

/// Topology store persisted as a single JSON document.
#[derive(Debug)]
pub struct FileTopologyStore<F: FileSystem> {
    file: JsonFile<F>,
}

impl<F: FileSystem + 'static> FileTopologyStore<F> {
    pub fn new(fs: F, path: impl Into<PathBuf>) -> Self {
        Self {
            file: JsonFile::new(fs, path.into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.file.path
    }
}

#[async_trait]
impl<F: FileSystem + 'static> TopologyStore for FileTopologyStore<F> {
    async fn upsert_node(&self, id: &str, weight: f64) -> StoreResult<()> {
        let id = id.to_string();
        self.file
            .update(move |file: &mut TopologyFile| {
                match file.nodes.iter().position(|n| n.id == id) {
                    Some(ix) => file.nodes[ix].weight = weight,
                    None => file.nodes.push(TopologyNode { id, weight }),
                }
                Ok(())
            })
            .await
    }

    async fn delete_node(&self, id: &str) -> StoreResult<()> {
        let id = id.to_string();
        self.file
            .update(move |file: &mut TopologyFile| {
                file.nodes.retain(|n| n.id != id);
                file.edges.retain(|e| e.from != id && e.to != id);
                Ok(())
            })
            .await
    }

    async fn upsert_edge(&self, from: &str, to: &str) -> StoreResult<()> {
        let (from, to) = (from.to_string(), to.to_string());
        self.file
            .update(move |file: &mut TopologyFile| {
                for end in [&from, &to] {
                    if !file.nodes.iter().any(|n| &n.id == end) {
                        return Err(StoreError::Rejected(format!(
                            "edge {from} -> {to} references missing node {end}"
                        )));
                    }
                }
                if !file.edges.iter().any(|e| e.from == from && e.to == to) {
                    file.edges.push(TopologyEdge { from, to });
                }
                Ok(())
            })
            .await
    }

    async fn delete_edge(&self, from: &str, to: &str) -> StoreResult<()> {
        let (from, to) = (from.to_string(), to.to_string());
        self.file
            .update(move |file: &mut TopologyFile| {
                file.edges.retain(|e| !(e.from == from && e.to == to));
                Ok(())
            })
            .await
    }

    async fn load_all(&self) -> StoreResult<(Vec<TopologyNode>, Vec<TopologyEdge>)> {
        let file: TopologyFile = self.file.read().await?;
        Ok((file.nodes, file.edges))
    }

    async fn ping(&self) -> bool {
        match self.file.read::<TopologyFile>().await {
            Ok(_) => true,
            Err(e) => {
                warn!(path = ?self.file.path, error = %e, "topology store file unreadable");
                false
            }
        }
    }
}

/// Semantic index persisted as a single JSON document.
///
/// There are no embeddings here; `query` falls back to token overlap.
#[derive(Debug)]
pub struct FileSemanticIndex<F: FileSystem> {
    file: JsonFile<F>,
}

impl<F: FileSystem + 'static> FileSemanticIndex<F> {
    pub fn new(fs: F, path: impl Into<PathBuf>) -> Self {
        Self {
            file: JsonFile::new(fs, path.into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.file.path
    }

    async fn load(&self) -> StoreResult<SemanticFile> {
        self.file.read().await
    }

    async fn update(&self, f: impl FnOnce(&mut SemanticFile) + Send + 'static) -> StoreResult<()> {
        self.file
            .update(move |file: &mut SemanticFile| {
                f(file);
                Ok(())
            })
            .await
    }
}

#[async_trait]
impl<F: FileSystem + 'static> SemanticIndex for FileSemanticIndex<F> {
    async fn upsert_activity_doc(&self, doc: &ActivityDoc) -> StoreResult<()> {
        let doc = doc.clone();
        self.update(move |file| {
            file.activities.retain(|d| d.id != doc.id);
            file.activities.push(doc);
        })
        .await
    }

    async fn delete_activity_doc(&self, id: ActivityId) -> StoreResult<()> {
        self.update(move |file| file.activities.retain(|d| d.id != id))
            .await
    }

    async fn upsert_relationship_doc(&self, doc: &RelationshipDoc) -> StoreResult<()> {
        let doc = doc.clone();
        self.update(move |file| {
            file.relationships.retain(|d| d.id != doc.id);
            file.relationships.push(doc);
        })
        .await
    }

    async fn delete_relationship_doc(&self, id: RelationshipId) -> StoreResult<()> {
        self.update(move |file| file.relationships.retain(|d| d.id != id))
            .await
    }

    async fn activity_doc(&self, id: ActivityId) -> StoreResult<Option<ActivityDoc>> {
        Ok(self.load().await?.activities.into_iter().find(|d| d.id == id))
    }

    async fn relationship_doc(&self, id: RelationshipId) -> StoreResult<Option<RelationshipDoc>> {
        Ok(self
            .load()
            .await?
            .relationships
            .into_iter()
            .find(|d| d.id == id))
    }

    async fn activity_docs(&self) -> StoreResult<Vec<ActivityDoc>> {
        let docs: BTreeMap<_, _> = self
            .load()
            .await?
            .activities
            .into_iter()
            .map(|d| (d.id, d))
            .collect();
        Ok(docs.into_values().collect())
    }

    async fn relationship_docs(&self) -> StoreResult<Vec<RelationshipDoc>> {
        let docs: BTreeMap<_, _> = self
            .load()
            .await?
            .relationships
            .into_iter()
            .map(|d| (d.id, d))
            .collect();
        Ok(docs.into_values().collect())
    }

    async fn query(&self, text: &str, k: usize) -> StoreResult<Vec<String>> {
        let file = self.load().await?;
        let candidates = file
            .activities
            .iter()
            .map(|d| (d.id.to_string(), d.search_text()))
            .chain(
                file.relationships
                    .iter()
                    .map(|d| (d.id.to_string(), d.search_text())),
            )
            .collect::<Vec<_>>();
        Ok(rank_by_overlap(text, candidates, k))
    }

    async fn ping(&self) -> bool {
        match self.load().await {
            Ok(_) => true,
            Err(e) => {
                warn!(path = ?self.file.path, error = %e, "semantic index file unreadable");
                false
            }
        }
    }
}
