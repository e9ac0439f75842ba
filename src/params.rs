//! Game parameters and the per-draw economics derived from them.
//!
//! `GameParameters` is what a caller hands in; `Economics` is the handful of
//! constants the engine actually consumes. Range checks live here too, since
//! the engine itself only rejects shapes it cannot represent.

use std::path::Path;

use serde::Deserialize;

use crate::error::{SolverError, SolverOutcome};

/// Largest token count accepted per dimension by `validate`.
/// Bounds the (R0+1)x(B0+1) tables to about a quarter million cells.
pub const MAX_DIMENSION: usize = 500;

// ---------------------------------------------------------------------------
// Raw parameters
// ---------------------------------------------------------------------------

/// Starting pool and prices, as supplied by the user.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GameParameters {
    /// Winning tokens in the pool at the start.
    #[serde(rename = "R0")]
    pub r0: usize,
    /// Non-winning tokens in the pool at the start.
    #[serde(rename = "B0")]
    pub b0: usize,
    /// Prize paid on a winning draw.
    pub payout_per_win: f64,
    /// Fee charged per physical attempt.
    pub cost_per_grab: f64,
    /// Consolation paid on a non-winning draw.
    #[serde(default)]
    pub q: f64,
    /// Tokens yielded per successful attempt.
    #[serde(default = "one")]
    pub scratch_per_grab: f64,
    /// Attempts needed, on average, per token obtained.
    #[serde(default = "one")]
    pub grabs_per_scratch: f64,
}

fn one() -> f64 {
    1.0
}

impl GameParameters {
    /// Parameters with no consolation prize and unit multipliers.
    pub fn new(r0: usize, b0: usize, payout_per_win: f64, cost_per_grab: f64) -> Self {
        GameParameters {
            r0,
            b0,
            payout_per_win,
            cost_per_grab,
            q: 0.0,
            scratch_per_grab: 1.0,
            grabs_per_scratch: 1.0,
        }
    }

    pub fn with_consolation(mut self, q: f64) -> Self {
        self.q = q;
        self
    }

    pub fn with_multipliers(mut self, scratch_per_grab: f64, grabs_per_scratch: f64) -> Self {
        self.scratch_per_grab = scratch_per_grab;
        self.grabs_per_scratch = grabs_per_scratch;
        self
    }

    /// Read parameters from a JSON document shaped like the request body
    /// (`{"R0": 3, "B0": 10, "payout_per_win": 100, "cost_per_grab": 10}`).
    pub fn from_json(json: &str) -> SolverOutcome<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> SolverOutcome<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Caller-side checks: finite non-negative money, positive multipliers,
    /// a non-empty pool and both dimensions within `MAX_DIMENSION`.
    pub fn validate(&self) -> SolverOutcome<()> {
        self.validate_shape()?;
        for (field, value) in [("R0", self.r0), ("B0", self.b0)] {
            if value > MAX_DIMENSION {
                return Err(SolverError::DimensionTooLarge {
                    field,
                    value,
                    max: MAX_DIMENSION,
                });
            }
        }
        Ok(())
    }

    /// Everything `validate` checks except the size ceiling.
    pub fn validate_shape(&self) -> SolverOutcome<()> {
        if self.r0 == 0 && self.b0 == 0 {
            return Err(SolverError::EmptyPool);
        }
        for (field, value) in [
            ("payout_per_win", self.payout_per_win),
            ("cost_per_grab", self.cost_per_grab),
            ("q", self.q),
        ] {
            if !value.is_finite() {
                return Err(SolverError::NonFinite { field });
            }
            if value < 0.0 {
                return Err(SolverError::NegativeAmount { field, value });
            }
        }
        for (field, value) in [
            ("scratch_per_grab", self.scratch_per_grab),
            ("grabs_per_scratch", self.grabs_per_scratch),
        ] {
            if !value.is_finite() {
                return Err(SolverError::NonFinite { field });
            }
            if value <= 0.0 {
                return Err(SolverError::NonPositiveMultiplier { field, value });
            }
        }
        Ok(())
    }

    /// Derive the per-draw economics. No rounding is applied.
    pub fn economics(&self) -> Economics {
        Economics::from_parameters(self)
    }
}

// ---------------------------------------------------------------------------
// Derived economics
// ---------------------------------------------------------------------------

/// Per-draw constants read by the engine for the whole solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Economics {
    /// Cost of obtaining one token once the yield multipliers are applied.
    pub effective_cost_per_scratch: f64,
    /// Net payoff of drawing a winning token.
    pub g_r: f64,
    /// Net payoff of drawing a non-winning token.
    pub g_b: f64,
}

impl Economics {
    pub fn from_parameters(params: &GameParameters) -> Self {
        let effective_cost_per_scratch =
            params.cost_per_grab * params.grabs_per_scratch / params.scratch_per_grab;
        Economics {
            effective_cost_per_scratch,
            g_r: params.payout_per_win - effective_cost_per_scratch,
            g_b: params.q - effective_cost_per_scratch,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.effective_cost_per_scratch.is_finite() && self.g_r.is_finite() && self.g_b.is_finite()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_multipliers_leave_cost_unchanged() {
        let e = GameParameters::new(3, 7, 100.0, 10.0).economics();
        assert_eq!(e.effective_cost_per_scratch, 10.0);
        assert_eq!(e.g_r, 90.0);
        assert_eq!(e.g_b, -10.0);
    }

    #[test]
    fn multipliers_scale_effective_cost() {
        // Two tokens per grab, three grabs per token: 12 * 3 / 2 = 18.
        let e = GameParameters::new(1, 1, 50.0, 12.0)
            .with_consolation(5.0)
            .with_multipliers(2.0, 3.0)
            .economics();
        assert_eq!(e.effective_cost_per_scratch, 18.0);
        assert_eq!(e.g_r, 32.0);
        assert_eq!(e.g_b, -13.0);
    }

    #[test]
    fn json_defaults_optional_fields() {
        let p = GameParameters::from_json(
            r#"{"R0": 2, "B0": 4, "payout_per_win": 30, "cost_per_grab": 5}"#,
        )
        .unwrap();
        assert_eq!(p, GameParameters::new(2, 4, 30.0, 5.0));
    }

    #[test]
    fn json_rejects_negative_counts() {
        let err = GameParameters::from_json(
            r#"{"R0": -1, "B0": 4, "payout_per_win": 30, "cost_per_grab": 5}"#,
        );
        assert!(matches!(err, Err(SolverError::JsonError(_))));
    }

    #[test]
    fn validate_rejects_empty_pool() {
        let p = GameParameters::new(0, 0, 100.0, 10.0);
        assert!(matches!(p.validate(), Err(SolverError::EmptyPool)));
    }

    #[test]
    fn validate_rejects_bad_amounts() {
        let p = GameParameters::new(1, 1, -1.0, 10.0);
        assert!(matches!(
            p.validate(),
            Err(SolverError::NegativeAmount { field: "payout_per_win", .. })
        ));

        let p = GameParameters::new(1, 1, 1.0, 10.0).with_consolation(f64::NAN);
        assert!(matches!(p.validate(), Err(SolverError::NonFinite { field: "q" })));

        let p = GameParameters::new(1, 1, 1.0, 10.0).with_multipliers(0.0, 1.0);
        assert!(matches!(
            p.validate(),
            Err(SolverError::NonPositiveMultiplier { field: "scratch_per_grab", .. })
        ));
    }

    #[test]
    fn extreme_counts_do_not_overflow_shape_check() {
        let p = GameParameters::new(usize::MAX, usize::MAX, 100.0, 10.0);
        assert!(p.validate_shape().is_ok());
        assert!(matches!(
            p.validate(),
            Err(SolverError::DimensionTooLarge { field: "R0", .. })
        ));
    }

    #[test]
    fn validate_enforces_ceiling_but_shape_does_not() {
        let p = GameParameters::new(MAX_DIMENSION + 1, 0, 100.0, 10.0);
        assert!(matches!(
            p.validate(),
            Err(SolverError::DimensionTooLarge { field: "R0", .. })
        ));
        assert!(p.validate_shape().is_ok());

        let p = GameParameters::new(MAX_DIMENSION, MAX_DIMENSION, 100.0, 10.0);
        assert!(p.validate().is_ok());
    }
}
