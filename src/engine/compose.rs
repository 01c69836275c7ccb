// src/engine/compose.rs

//! Relationship composition used when an activity is dissolved.
//!
//! Given `B -(t_BA, l_BA)-> A -(t_AC, l_AC)-> C`, the direct `B -> C`
//! relationship keeps B's side of `t_BA` and C's side of `t_AC`:
//!
//! | t_BA \ t_AC | FS        | SS      | FF        | SF      |
//! |-------------|-----------|---------|-----------|---------|
//! | FS          | FS (sum)  | FS (max)| FF (sum)  | FF (max)|
//! | SS          | SS (sum)  | SS (max)| SF (sum)  | SF (max)|
//! | FF          | FS (max)  | FS (max)| FF (max)  | FF (max)|
//! | SF          | SS (max)  | SS (max)| SF (max)  | SF (max)|
//!
//! "sum" is `l_BA + dur(A) + l_AC` and applies when the path enters A at its
//! start and leaves from its end, so A's intra node lies on it. Every other
//! combination uses `max(l_BA, l_AC)`.

use crate::model::RelationshipType;

use RelationshipType::{FF, FS, SF, SS};

/// How the lag of a composed relationship is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LagRule {
    /// `l_BA + dur(A) + l_AC`.
    ThroughDuration,
    /// `max(l_BA, l_AC)`.
    Max,
}

/// One cell of the composition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Composition {
    pub relationship_type: RelationshipType,
    pub lag_rule: LagRule,
}

impl Composition {
    const fn new(relationship_type: RelationshipType, lag_rule: LagRule) -> Self {
        Self {
            relationship_type,
            lag_rule,
        }
    }

    pub fn lag(&self, lag_ba: f64, duration: f64, lag_ac: f64) -> f64 {
        match self.lag_rule {
            LagRule::ThroughDuration => lag_ba + duration + lag_ac,
            LagRule::Max => lag_ba.max(lag_ac),
        }
    }
}

const SUM: LagRule = LagRule::ThroughDuration;
const MAX: LagRule = LagRule::Max;

/// Rows are indexed by `t_BA`, columns by `t_AC`, both in
/// [`RelationshipType::ALL`] order (FS, SS, FF, SF).
pub const COMPOSITION_TABLE: [[Composition; 4]; 4] = [
    [
        Composition::new(FS, SUM),
        Composition::new(FS, MAX),
        Composition::new(FF, SUM),
        Composition::new(FF, MAX),
    ],
    [
        Composition::new(SS, SUM),
        Composition::new(SS, MAX),
        Composition::new(SF, SUM),
        Composition::new(SF, MAX),
    ],
    [
        Composition::new(FS, MAX),
        Composition::new(FS, MAX),
        Composition::new(FF, MAX),
        Composition::new(FF, MAX),
    ],
    [
        Composition::new(SS, MAX),
        Composition::new(SS, MAX),
        Composition::new(SF, MAX),
        Composition::new(SF, MAX),
    ],
];

const fn slot(t: RelationshipType) -> usize {
    match t {
        FS => 0,
        SS => 1,
        FF => 2,
        SF => 3,
    }
}

/// Look up the composition of `t_ba` followed by `t_ac`.
pub fn compose(t_ba: RelationshipType, t_ac: RelationshipType) -> Composition {
    COMPOSITION_TABLE[slot(t_ba)][slot(t_ac)]
}
