// src/dag/mod.rs

//! Derived schedule graph and critical-path computation.
//!
//! - [`graph`] rebuilds a petgraph `DiGraph` from a topology snapshot.
//! - [`critical_path`] computes the longest weighted path over it.

pub mod critical_path;
pub mod graph;

pub use critical_path::CriticalPath;
pub use graph::{ScheduleGraph, ScheduleNode};
