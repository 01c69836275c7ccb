// src/coordinator/writeset.rs

//! Ordered write sets for the two stores, and the transaction that bundles
//! them.

use crate::model::EntityId;
use crate::store::{SemanticWrite, TopologyWrite};

/// Writes for the topology store, applied in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopologyWriteSet {
    writes: Vec<TopologyWrite>,
}

impl TopologyWriteSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, write: TopologyWrite) {
        self.writes.push(write);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TopologyWrite> {
        self.writes.iter()
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

impl Extend<TopologyWrite> for TopologyWriteSet {
    fn extend<I: IntoIterator<Item = TopologyWrite>>(&mut self, iter: I) {
        self.writes.extend(iter);
    }
}

impl FromIterator<TopologyWrite> for TopologyWriteSet {
    fn from_iter<I: IntoIterator<Item = TopologyWrite>>(iter: I) -> Self {
        Self {
            writes: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a TopologyWriteSet {
    type Item = &'a TopologyWrite;
    type IntoIter = std::slice::Iter<'a, TopologyWrite>;

    fn into_iter(self) -> Self::IntoIter {
        self.writes.iter()
    }
}

/// Writes for the semantic index, applied in insertion order after all
/// topology writes succeeded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SemanticWriteSet {
    writes: Vec<SemanticWrite>,
}

impl SemanticWriteSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, write: SemanticWrite) {
        self.writes.push(write);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SemanticWrite> {
        self.writes.iter()
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

impl Extend<SemanticWrite> for SemanticWriteSet {
    fn extend<I: IntoIterator<Item = SemanticWrite>>(&mut self, iter: I) {
        self.writes.extend(iter);
    }
}

impl FromIterator<SemanticWrite> for SemanticWriteSet {
    fn from_iter<I: IntoIterator<Item = SemanticWrite>>(iter: I) -> Self {
        Self {
            writes: iter.into_iter().collect(),
        }
    }
}

/// A planned mutation: both write sets, the entities they touch (reported on
/// failure), and the value handed back to the caller on success.
#[derive(Debug, Clone)]
pub struct Transaction<T> {
    pub topology: TopologyWriteSet,
    pub semantic: SemanticWriteSet,
    pub entities: Vec<EntityId>,
    pub output: T,
}

impl<T> Transaction<T> {
    pub fn new(output: T) -> Self {
        Self {
            topology: TopologyWriteSet::new(),
            semantic: SemanticWriteSet::new(),
            entities: Vec::new(),
            output,
        }
    }

    pub fn touch(&mut self, entity: impl Into<EntityId>) {
        let entity = entity.into();
        if !self.entities.contains(&entity) {
            self.entities.push(entity);
        }
    }
}
