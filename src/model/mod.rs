// src/model/mod.rs

//! Schedule entity model.
//!
//! - [`ids`]: typed ids plus the string keys of physical topology nodes.
//! - [`duration`]: accepted duration encodings and their expected values.
//! - [`activity`]: the three-node activity aggregate and index documents.
//! - [`relationship`]: FS/SS/FF/SF relationships and their anchors.
//! - [`schedule`]: reads a topology snapshot back into entities.

pub mod activity;
pub mod duration;
pub mod ids;
pub mod relationship;
pub mod schedule;

pub use activity::{ActivityDoc, ActivityTopology, Entity, RelationshipDoc};
pub use duration::DurationSpec;
pub use ids::{ActivityId, Anchor, EntityId, NodeKey, RelationshipId};
pub use relationship::{Relationship, RelationshipType};
pub use schedule::{ModelIssue, ScheduleModel};
