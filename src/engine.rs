//! State-value engine for the draw-without-replacement stopping game.
//!
//! Fills the (R0+1)x(B0+1) lattice of states `(r, b)` by backward induction:
//! every state reads only `(r-1, b)` and `(r, b-1)`, so a row-major sweep (or
//! a sweep over anti-diagonals `r + b = d`) always finds its predecessors
//! finalized. Value, continue value, decision, expected cost and expected
//! win count are produced in the same pass.

use std::time::Instant;

use rayon::prelude::*;
use serde::{Serialize, Serializer};
use tracing::{debug, info};

use crate::error::{SolverError, SolverOutcome};
use crate::exhaustion::ExhaustionStats;
use crate::params::{Economics, GameParameters};

/// Lattices with at least this many cells are filled diagonal by diagonal
/// on the rayon pool when `FillOrder::auto` is used.
pub const WAVEFRONT_MIN_CELLS: usize = 62_500;

// ---------------------------------------------------------------------------
// Dense state table
// ---------------------------------------------------------------------------

/// Row-major table indexed by `(r, b)`.
#[derive(Debug, Clone, PartialEq)]
pub struct StateTable<T> {
    rows: usize,
    cols: usize,
    cells: Vec<T>,
}

impl<T: Copy + Default> StateTable<T> {
    /// Allocate a zeroed table, or fail if `rows * cols` cells cannot be held.
    pub fn new(rows: usize, cols: usize) -> SolverOutcome<Self> {
        let too_large = || SolverError::LatticeTooLarge {
            r0: rows.saturating_sub(1),
            b0: cols.saturating_sub(1),
        };
        let len = rows.checked_mul(cols).ok_or_else(too_large)?;
        let mut cells = Vec::new();
        cells.try_reserve_exact(len).map_err(|_| too_large())?;
        cells.resize(len, T::default());
        Ok(StateTable { rows, cols, cells })
    }

    #[inline]
    pub fn get(&self, r: usize, b: usize) -> T {
        self.cells[r * self.cols + b]
    }

    #[inline]
    fn set(&mut self, r: usize, b: usize, value: T) {
        self.cells[r * self.cols + b] = value;
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// All cells of row `r`, ordered by `b`.
    pub fn row(&self, r: usize) -> &[T] {
        &self.cells[r * self.cols..(r + 1) * self.cols]
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.cells.iter()
    }
}

/// Serialized as nested rows, `[r][b]`.
impl<T: Serialize> Serialize for StateTable<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.cells.chunks(self.cols))
    }
}

// ---------------------------------------------------------------------------
// Per-state values
// ---------------------------------------------------------------------------

/// Everything the engine knows about one state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StateValue {
    /// Optimal expected net profit from this state onward.
    pub value: f64,
    /// Expected net profit of one more draw followed by optimal play.
    pub continue_value: f64,
    /// True iff `continue_value > 0`.
    pub policy: bool,
    /// Expected future spend under the optimal policy.
    pub expected_cost: f64,
    /// Expected future winning draws under the optimal policy.
    pub expected_wins: f64,
}

impl StateValue {
    /// Terminal stop: nothing more is spent or won.
    pub const STOP: StateValue = StateValue {
        value: 0.0,
        continue_value: 0.0,
        policy: false,
        expected_cost: 0.0,
        expected_wins: 0.0,
    };
}

/// Order in which the lattice is filled. Both produce bit-identical tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillOrder {
    /// Increasing `r`, then increasing `b`, on the calling thread.
    RowMajor,
    /// Anti-diagonals `r + b = d` in increasing `d`, each diagonal in parallel.
    Wavefront,
}

impl FillOrder {
    /// Pick an order for a lattice of `cells` states (see `lattice_cells`).
    pub fn auto(cells: usize) -> Self {
        if cells >= WAVEFRONT_MIN_CELLS {
            FillOrder::Wavefront
        } else {
            FillOrder::RowMajor
        }
    }
}

// ---------------------------------------------------------------------------
// Lattice
// ---------------------------------------------------------------------------

/// The parallel tables filled during one solve. Owned by that solve only.
struct Lattice {
    value: StateTable<f64>,
    continue_value: StateTable<f64>,
    policy: StateTable<bool>,
    expected_cost: StateTable<f64>,
    expected_wins: StateTable<f64>,
}

impl Lattice {
    /// `r0 + 1` and `b0 + 1` must not overflow; `lattice_cells` checks this.
    fn new(r0: usize, b0: usize) -> SolverOutcome<Self> {
        let (rows, cols) = (r0 + 1, b0 + 1);
        Ok(Lattice {
            value: StateTable::new(rows, cols)?,
            continue_value: StateTable::new(rows, cols)?,
            policy: StateTable::new(rows, cols)?,
            expected_cost: StateTable::new(rows, cols)?,
            expected_wins: StateTable::new(rows, cols)?,
        })
    }

    /// Bellman step for `(r, b)`. Predecessors must already be stored.
    fn evaluate(&self, r: usize, b: usize, economics: &Economics) -> StateValue {
        // No winning tokens left (this includes the empty pool): always stop,
        // whatever the sign of g_b.
        if r == 0 {
            return StateValue::STOP;
        }

        let total = (r + b) as f64;
        let p_r = r as f64 / total;
        let p_b = b as f64 / total;

        let mut continue_value = p_r * (economics.g_r + self.value.get(r - 1, b));
        if b > 0 {
            continue_value += p_b * (economics.g_b + self.value.get(r, b - 1));
        }

        let policy = continue_value > 0.0;
        if !policy {
            // Stopping ends the game here; predecessor aggregates are not inherited.
            return StateValue {
                value: continue_value.max(0.0),
                continue_value,
                policy,
                expected_cost: 0.0,
                expected_wins: 0.0,
            };
        }

        let mut expected_cost =
            economics.effective_cost_per_scratch + p_r * self.expected_cost.get(r - 1, b);
        let mut expected_wins = p_r * (1.0 + self.expected_wins.get(r - 1, b));
        if b > 0 {
            expected_cost += p_b * self.expected_cost.get(r, b - 1);
            expected_wins += p_b * self.expected_wins.get(r, b - 1);
        }

        StateValue {
            value: continue_value,
            continue_value,
            policy,
            expected_cost,
            expected_wins,
        }
    }

    fn store(&mut self, r: usize, b: usize, state: StateValue) {
        self.value.set(r, b, state.value);
        self.continue_value.set(r, b, state.continue_value);
        self.policy.set(r, b, state.policy);
        self.expected_cost.set(r, b, state.expected_cost);
        self.expected_wins.set(r, b, state.expected_wins);
    }

    fn fill_row_major(&mut self, economics: &Economics) {
        let (rows, cols) = (self.value.rows(), self.value.cols());
        for r in 0..rows {
            for b in 0..cols {
                let state = self.evaluate(r, b, economics);
                self.store(r, b, state);
            }
        }
    }

    fn fill_wavefront(&mut self, economics: &Economics) {
        let (r0, b0) = (self.value.rows() - 1, self.value.cols() - 1);
        for d in 0..=(r0 + b0) {
            let r_lo = d.saturating_sub(b0);
            let r_hi = d.min(r0);

            // Cells on one diagonal only read the previous diagonal.
            let diagonal: Vec<StateValue> = (r_lo..=r_hi)
                .into_par_iter()
                .map(|r| self.evaluate(r, d - r, economics))
                .collect();

            for (r, state) in (r_lo..=r_hi).zip(diagonal) {
                self.store(r, d - r, state);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// Outcome of one solve: start-state KPIs plus the full tables.
#[derive(Debug, Clone, Serialize)]
pub struct SolverResult {
    #[serde(rename = "V_start")]
    pub v_start: f64,
    pub policy_start: bool,
    pub effective_cost_per_scratch: f64,
    /// `None` when no wins are expected under the optimal policy.
    pub avg_cost_per_win: Option<f64>,
    pub expected_wins: f64,
    pub expected_total_cost: f64,
    /// What drawing until no winning tokens remain would cost and earn.
    pub force_play_all: ExhaustionStats,
    #[serde(rename = "policy_matrix")]
    pub policy: StateTable<bool>,
    #[serde(rename = "V_matrix")]
    pub value: StateTable<f64>,
    #[serde(rename = "Continue_matrix")]
    pub continue_value: StateTable<f64>,
    #[serde(skip)]
    pub expected_cost: StateTable<f64>,
    #[serde(skip)]
    pub expected_win_count: StateTable<f64>,
}

impl SolverResult {
    /// The starting state `(R0, B0)`.
    pub fn start(&self) -> (usize, usize) {
        (self.value.rows() - 1, self.value.cols() - 1)
    }

    /// Look up one state, or fail if it lies outside the solved lattice.
    pub fn state(&self, r: usize, b: usize) -> SolverOutcome<StateValue> {
        let (r0, b0) = self.start();
        if r > r0 || b > b0 {
            return Err(SolverError::StateOutOfRange { r, b, r0, b0 });
        }
        Ok(StateValue {
            value: self.value.get(r, b),
            continue_value: self.continue_value.get(r, b),
            policy: self.policy.get(r, b),
            expected_cost: self.expected_cost.get(r, b),
            expected_wins: self.expected_win_count.get(r, b),
        })
    }

    pub fn to_json(&self) -> SolverOutcome<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

// ---------------------------------------------------------------------------
// Solver
// ---------------------------------------------------------------------------

/// Validate the shape of `params`, derive the economics and solve.
///
/// The `MAX_DIMENSION` ceiling is not applied here; callers that accept
/// untrusted sizes should call `GameParameters::validate` first.
pub fn solve_parameters(params: &GameParameters) -> SolverOutcome<SolverResult> {
    params.validate_shape()?;
    info!(
        r0 = params.r0,
        b0 = params.b0,
        payout_per_win = params.payout_per_win,
        cost_per_grab = params.cost_per_grab,
        q = params.q,
        "solving stopping game"
    );
    solve(params.r0, params.b0, &params.economics())
}

/// Number of states in the lattice rooted at `(r0, b0)`, or
/// `LatticeTooLarge` when `(r0 + 1) * (b0 + 1)` does not fit in `usize`.
pub fn lattice_cells(r0: usize, b0: usize) -> SolverOutcome<usize> {
    r0.checked_add(1)
        .zip(b0.checked_add(1))
        .and_then(|(rows, cols)| rows.checked_mul(cols))
        .ok_or(SolverError::LatticeTooLarge { r0, b0 })
}

/// Solve from `(r0, b0)`, picking the fill order by lattice size.
pub fn solve(r0: usize, b0: usize, economics: &Economics) -> SolverOutcome<SolverResult> {
    let cells = lattice_cells(r0, b0)?;
    solve_with(r0, b0, economics, FillOrder::auto(cells))
}

pub fn solve_with(
    r0: usize,
    b0: usize,
    economics: &Economics,
    order: FillOrder,
) -> SolverOutcome<SolverResult> {
    if r0 == 0 && b0 == 0 {
        return Err(SolverError::EmptyPool);
    }
    let cells = lattice_cells(r0, b0)?;
    if !economics.is_finite() {
        return Err(SolverError::NonFinite { field: "economics" });
    }

    let started = Instant::now();
    debug!(r0, b0, ?order, cells, "filling state lattice");

    let mut lattice = Lattice::new(r0, b0)?;
    match order {
        FillOrder::RowMajor => lattice.fill_row_major(economics),
        FillOrder::Wavefront => lattice.fill_wavefront(economics),
    }

    let v_start = lattice.value.get(r0, b0);
    let policy_start = lattice.policy.get(r0, b0);
    let expected_wins = lattice.expected_wins.get(r0, b0);
    let expected_total_cost = lattice.expected_cost.get(r0, b0);
    let avg_cost_per_win = if expected_wins > 0.0 {
        Some(expected_total_cost / expected_wins)
    } else {
        None
    };

    info!(
        v_start,
        policy_start,
        expected_wins,
        elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
        "solve complete"
    );

    Ok(SolverResult {
        v_start,
        policy_start,
        effective_cost_per_scratch: economics.effective_cost_per_scratch,
        avg_cost_per_win,
        expected_wins,
        expected_total_cost,
        force_play_all: ExhaustionStats::compute(r0, b0, economics),
        policy: lattice.policy,
        value: lattice.value,
        continue_value: lattice.continue_value,
        expected_cost: lattice.expected_cost,
        expected_win_count: lattice.expected_wins,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
