//! Acceptance gate: decides whether a completed run is worth keeping.
//!
//! A snapshot where most lots failed to resolve is worse than a gap in the history.
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::status::{CategoryKind, Snapshot};

/// Upper bound on the number of counted lots a run may contain.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Threshold {
    /// Absolute number of lots.
    Count(usize),
    /// Share of all lots in the snapshot, `0.0..=1.0`.
    Ratio(f64),
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct GateConfig {
    /// Categories that count as unreliable reads.
    pub counted: Vec<CategoryKind>,
    /// Runs whose counted lots exceed this are discarded.
    pub threshold: Threshold,
}

impl Default for GateConfig {
    fn default() -> Self {
        GateConfig {
            counted: vec![CategoryKind::Unknown, CategoryKind::Active],
            threshold: Threshold::Count(80),
        }
    }
}

impl GateConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.threshold {
            Threshold::Ratio(ratio) if !(ratio >= 0.0) => Err(ConfigError::Threshold(ratio)),
            _ => Ok(()),
        }
    }

    pub fn evaluate(&self, snapshot: &Snapshot) -> GateDecision {
        let total = snapshot.len();
        if total == 0 {
            return GateDecision::Reject(Rejection::Empty);
        }
        let counted = snapshot.count_kinds(&self.counted);
        let exceeded = match self.threshold {
            Threshold::Count(limit) => counted > limit,
            Threshold::Ratio(ratio) => counted as f64 / total as f64 > ratio,
        };
        if exceeded {
            GateDecision::Reject(Rejection::LowQuality {
                counted,
                total,
                threshold: self.threshold,
            })
        } else {
            GateDecision::Accept
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GateDecision {
    Accept,
    Reject(Rejection),
}

/// Why a run was discarded.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    /// Too many unreliable reads.
    LowQuality {
        counted: usize,
        total: usize,
        threshold: Threshold,
    },
    /// No lot was discovered at all.
    Empty,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Rejection::LowQuality {
                counted,
                total,
                threshold: Threshold::Count(limit),
            } => write!(
                f,
                "low quality: {} of {} lots unreliable (limit {})",
                counted, total, limit
            ),
            Rejection::LowQuality {
                counted,
                total,
                threshold: Threshold::Ratio(ratio),
            } => write!(
                f,
                "low quality: {} of {} lots unreliable (limit {:.0}%)",
                counted,
                total,
                ratio * 100.0
            ),
            Rejection::Empty => f.write_str("nothing to save"),
        }
    }
}
