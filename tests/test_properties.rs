//! Randomised checks of the engine invariants over small lattices.

use proptest::prelude::*;

use stop_solver::engine::{solve_parameters, solve_with, FillOrder};
use stop_solver::params::GameParameters;

fn params_strategy() -> impl Strategy<Value = GameParameters> {
    (
        0usize..15,
        0usize..15,
        0.0f64..200.0,
        0.0f64..50.0,
        0.0f64..20.0,
        0.25f64..4.0,
        0.25f64..4.0,
    )
        .prop_filter("pool must be non-empty", |(r, b, ..)| r + b > 0)
        .prop_map(|(r0, b0, payout, cost, q, spg, gps)| {
            GameParameters::new(r0, b0, payout, cost)
                .with_consolation(q)
                .with_multipliers(spg, gps)
        })
}

proptest! {
    #[test]
    fn policy_and_value_agree_everywhere(params in params_strategy()) {
        let result = solve_parameters(&params).unwrap();
        for r in 0..=params.r0 {
            for b in 0..=params.b0 {
                let s = result.state(r, b).unwrap();
                prop_assert!(s.value >= 0.0);
                prop_assert_eq!(s.value, s.continue_value.max(0.0));
                prop_assert_eq!(s.policy, s.continue_value > 0.0);
                if !s.policy {
                    prop_assert_eq!(s.expected_cost, 0.0);
                    prop_assert_eq!(s.expected_wins, 0.0);
                }
                if r == 0 {
                    prop_assert_eq!(s.continue_value, 0.0);
                }
            }
        }
        prop_assert_eq!(result.avg_cost_per_win.is_none(), result.expected_wins == 0.0);
    }

    #[test]
    fn fill_orders_agree(params in params_strategy()) {
        let e = params.economics();
        let a = solve_with(params.r0, params.b0, &e, FillOrder::RowMajor).unwrap();
        let b = solve_with(params.r0, params.b0, &e, FillOrder::Wavefront).unwrap();
        prop_assert_eq!(a.value, b.value);
        prop_assert_eq!(a.policy, b.policy);
        prop_assert_eq!(a.expected_win_count, b.expected_win_count);
    }

    #[test]
    fn monotone_in_winning_tokens(
        r0 in 1usize..15,
        b0 in 0usize..15,
        payout in 10.0f64..200.0,
        cost in 0.0f64..10.0,
    ) {
        // g_r > 0 and g_b <= 0 with q = 0.
        let result = solve_parameters(&GameParameters::new(r0, b0, payout, cost)).unwrap();
        for r in 0..r0 {
            for b in 0..=b0 {
                prop_assert!(result.value.get(r + 1, b) >= result.value.get(r, b) - 1e-9);
            }
        }
    }
}
