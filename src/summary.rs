//! Sweet-spot analysis over a solved policy table.

use crate::engine::{SolverResult, StateTable};

/// Columns past this `b` are not sampled.
const SAMPLE_MAX_COLUMN: usize = 20;
/// Roughly how many columns to sample across `0..=B0`.
const SAMPLE_COLUMNS: usize = 5;

/// Smallest winning count at which a sampled column says "continue".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweetSpot {
    pub column: usize,
    pub min_winning: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrategySummary {
    pub sweet_spots: Vec<SweetSpot>,
    /// Rounded mean of the sampled thresholds; `None` when no sampled column
    /// ever continues.
    pub typical_threshold: Option<usize>,
    /// Share of all lattice states whose decision is "continue".
    pub continue_share: f64,
}

/// The smallest `r` for which state `(r, b)` continues.
pub fn continue_threshold(policy: &StateTable<bool>, b: usize) -> Option<usize> {
    (0..policy.rows()).find(|&r| policy.get(r, b))
}

impl StrategySummary {
    pub fn from_result(result: &SolverResult) -> Self {
        let policy = &result.policy;
        let b0 = policy.cols() - 1;
        let step = (b0 / SAMPLE_COLUMNS).max(1);

        let sweet_spots: Vec<SweetSpot> = (0..=b0.min(SAMPLE_MAX_COLUMN))
            .step_by(step)
            .filter_map(|column| {
                continue_threshold(policy, column).map(|min_winning| SweetSpot {
                    column,
                    min_winning,
                })
            })
            .collect();

        let typical_threshold = if sweet_spots.is_empty() {
            None
        } else {
            let sum: usize = sweet_spots.iter().map(|s| s.min_winning).sum();
            Some((sum as f64 / sweet_spots.len() as f64).round() as usize)
        };

        let cells = policy.rows() * policy.cols();
        let continuing = policy.iter().filter(|&&p| p).count();

        StrategySummary {
            sweet_spots,
            typical_threshold,
            continue_share: continuing as f64 / cells as f64,
        }
    }
}
