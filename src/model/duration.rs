// src/model/duration.rs

//! Activity duration encodings.
//!
//! Durations arrive as strings from collaborators. Accepted forms:
//!
//! - plain numbers: `"5"`, `"2.5"`
//! - `tri(min,mode,max)` triangular distribution
//! - `pert(min,mode,max)` PERT (beta) estimate
//! - `uniform(min,max)`
//! - `normal(mean,stddev)`
//!
//! The topology store only holds a single weight per node, so every encoding
//! reduces to its expected value via [`DurationSpec::expected`].

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::errors::ScheduleError;

static DISTRIBUTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i)(tri|pert|uniform|normal)\s*\(\s*([^)]*)\)$")
        .expect("distribution regex is valid")
});

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DurationSpec {
    Fixed(f64),
    Triangular { min: f64, mode: f64, max: f64 },
    Pert { min: f64, mode: f64, max: f64 },
    Uniform { min: f64, max: f64 },
    Normal { mean: f64, stddev: f64 },
}

impl DurationSpec {
    /// Expected value, used as the intra node weight.
    pub fn expected(&self) -> f64 {
        match *self {
            DurationSpec::Fixed(v) => v,
            DurationSpec::Triangular { min, mode, max } => (min + mode + max) / 3.0,
            DurationSpec::Pert { min, mode, max } => (min + 4.0 * mode + max) / 6.0,
            DurationSpec::Uniform { min, max } => (min + max) / 2.0,
            DurationSpec::Normal { mean, .. } => mean,
        }
    }

    fn validate(self) -> Result<Self, ScheduleError> {
        let params: Vec<f64> = match self {
            DurationSpec::Fixed(v) => vec![v],
            DurationSpec::Triangular { min, mode, max } | DurationSpec::Pert { min, mode, max } => {
                if !(min <= mode && mode <= max) {
                    return Err(invalid(format!(
                        "distribution requires min <= mode <= max (got {min}, {mode}, {max})"
                    )));
                }
                vec![min, mode, max]
            }
            DurationSpec::Uniform { min, max } => {
                if min > max {
                    return Err(invalid(format!(
                        "uniform requires min <= max (got {min}, {max})"
                    )));
                }
                vec![min, max]
            }
            DurationSpec::Normal { mean, stddev } => vec![mean, stddev],
        };

        if let Some(bad) = params.iter().find(|v| !v.is_finite() || **v < 0.0) {
            return Err(invalid(format!(
                "duration parameters must be finite and non-negative (got {bad})"
            )));
        }

        Ok(self)
    }
}

fn invalid(msg: String) -> ScheduleError {
    ScheduleError::Validation(msg)
}

fn parse_number(raw: &str) -> Result<f64, ScheduleError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| invalid(format!("'{}' is not a number", raw.trim())))
}

impl FromStr for DurationSpec {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(invalid("duration must not be empty".to_string()));
        }

        let Some(caps) = DISTRIBUTION.captures(s) else {
            return DurationSpec::Fixed(parse_number(s)?).validate();
        };

        let kind = caps[1].to_lowercase();
        let args = caps[2]
            .split(',')
            .map(parse_number)
            .collect::<Result<Vec<_>, _>>()?;

        let spec = match (kind.as_str(), args.as_slice()) {
            ("tri", [min, mode, max]) => DurationSpec::Triangular {
                min: *min,
                mode: *mode,
                max: *max,
            },
            ("pert", [min, mode, max]) => DurationSpec::Pert {
                min: *min,
                mode: *mode,
                max: *max,
            },
            ("uniform", [min, max]) => DurationSpec::Uniform {
                min: *min,
                max: *max,
            },
            ("normal", [mean, stddev]) => DurationSpec::Normal {
                mean: *mean,
                stddev: *stddev,
            },
            (other, args) => {
                return Err(invalid(format!(
                    "{other}(...) does not take {} argument(s)",
                    args.len()
                )));
            }
        };

        spec.validate()
    }
}

/// Canonical encoding, stored in the semantic index.
impl fmt::Display for DurationSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DurationSpec::Fixed(v) => write!(f, "{v}"),
            DurationSpec::Triangular { min, mode, max } => write!(f, "tri({min},{mode},{max})"),
            DurationSpec::Pert { min, mode, max } => write!(f, "pert({min},{mode},{max})"),
            DurationSpec::Uniform { min, max } => write!(f, "uniform({min},{max})"),
            DurationSpec::Normal { mean, stddev } => write!(f, "normal({mean},{stddev})"),
        }
    }
}
