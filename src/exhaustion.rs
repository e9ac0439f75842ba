//! Statistics for ignoring the recommendation and drawing until no winning
//! tokens remain.
//!
//! With `r` winning tokens among `n = r + b`, the last winning token sits at
//! position `r(n+1)/(r+1)` in expectation, so that many draws are paid for.
//! Every winning token is collected; on average `rb/(r+1)` non-winning ones
//! come out along the way.

use serde::Serialize;

use crate::params::Economics;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExhaustionStats {
    pub expected_draws: f64,
    pub expected_wins: f64,
    pub expected_total_cost: f64,
    pub expected_net_profit: f64,
    /// `None` when the pool holds no winning tokens.
    pub avg_cost_per_win: Option<f64>,
}

impl ExhaustionStats {
    pub fn compute(r0: usize, b0: usize, economics: &Economics) -> Self {
        if r0 == 0 {
            return ExhaustionStats {
                expected_draws: 0.0,
                expected_wins: 0.0,
                expected_total_cost: 0.0,
                expected_net_profit: 0.0,
                avg_cost_per_win: None,
            };
        }

        let r = r0 as f64;
        let b = b0 as f64;
        let expected_draws = r * (r + b + 1.0) / (r + 1.0);
        let expected_blanks = r * b / (r + 1.0);
        let expected_total_cost = expected_draws * economics.effective_cost_per_scratch;

        ExhaustionStats {
            expected_draws,
            expected_wins: r,
            expected_total_cost,
            expected_net_profit: r * economics.g_r + expected_blanks * economics.g_b,
            avg_cost_per_win: Some(expected_total_cost / r),
        }
    }
}
