use super::types::{MonthlyRecord, SwpInput, SwpResult};

pub fn run_swp_projection(inputs: &SwpInput) -> Result<SwpResult, String> {
    validate_inputs(inputs)?;

    let monthly_rate = inputs.monthly_rate();
    let total_steps = inputs.total_steps();

    let mut schedule = Vec::with_capacity(total_steps as usize);
    let mut balance = inputs.total_investment;
    let mut total_interest = 0.0;

    let mut step = 0;
    while step < total_steps && balance > 0.0 {
        let interest = balance * monthly_rate;
        let beginning_balance = balance + interest;
        let candidate_ending = beginning_balance - inputs.monthly_withdrawal;
        // The terminating step records the full scheduled withdrawal; only
        // the balance is clamped.
        let ending_balance = if candidate_ending < 0.0 {
            0.0
        } else {
            candidate_ending
        };

        total_interest += interest;
        schedule.push(MonthlyRecord {
            month: step + 1,
            beginning_balance,
            withdrawal: inputs.monthly_withdrawal,
            interest,
            ending_balance,
        });

        balance = ending_balance;
        step += 1;
    }

    Ok(SwpResult {
        final_value: balance,
        total_interest_earned: total_interest,
        total_withdrawn: inputs.monthly_withdrawal * schedule.len() as f64,
        schedule,
    })
}

fn validate_inputs(inputs: &SwpInput) -> Result<(), String> {
    if !inputs.total_investment.is_finite() || inputs.total_investment <= 0.0 {
        return Err("total_investment must be > 0".to_string());
    }
    if !inputs.monthly_withdrawal.is_finite() || inputs.monthly_withdrawal < 0.0 {
        return Err("monthly_withdrawal must be >= 0".to_string());
    }
    if !inputs.annual_rate_percent.is_finite() || inputs.annual_rate_percent < 0.0 {
        return Err("annual_rate_percent must be >= 0".to_string());
    }
    if inputs.period_years == 0 {
        return Err("period_years must be >= 1".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn assert_approx_tol(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn sample_inputs() -> SwpInput {
        SwpInput {
            total_investment: 100_000.0,
            monthly_withdrawal: 1_000.0,
            annual_rate_percent: 8.0,
            period_years: 10,
        }
    }

    #[test]
    fn one_year_projection_matches_hand_computed_rows() {
        let inputs = SwpInput {
            total_investment: 100_000.0,
            monthly_withdrawal: 1_000.0,
            annual_rate_percent: 8.0,
            period_years: 1,
        };

        let result = run_swp_projection(&inputs).expect("valid inputs");
        assert_eq!(result.schedule.len(), 12);

        let monthly_rate = 8.0 / 100.0 / 12.0;
        let first = &result.schedule[0];
        assert_eq!(first.month, 1);
        assert_approx(first.interest, 100_000.0 * monthly_rate);
        assert_approx_tol(first.interest, 666.67, 0.01);
        assert_approx_tol(first.beginning_balance, 100_666.67, 0.01);
        assert_approx_tol(first.ending_balance, 99_666.67, 0.01);

        assert_approx(result.total_withdrawn, 12_000.0);
        let last = result.schedule.last().expect("non-empty schedule");
        assert_eq!(last.month, 12);
        assert_approx(result.final_value, last.ending_balance);
        assert!(result.final_value > 0.0);
    }

    #[test]
    fn zero_rate_exhaustion_stops_after_five_months() {
        let inputs = SwpInput {
            total_investment: 5_000.0,
            monthly_withdrawal: 1_000.0,
            annual_rate_percent: 0.0,
            period_years: 10,
        };

        let result = run_swp_projection(&inputs).expect("valid inputs");
        assert_eq!(result.schedule.len(), 5);
        assert_approx(result.schedule[4].ending_balance, 0.0);
        assert_approx(result.final_value, 0.0);
        assert_approx(result.total_withdrawn, 5_000.0);
        assert_approx(result.total_interest_earned, 0.0);
    }

    #[test]
    fn terminating_step_credits_full_withdrawal() {
        let inputs = SwpInput {
            total_investment: 1_000.0,
            monthly_withdrawal: 600.0,
            annual_rate_percent: 0.0,
            period_years: 1,
        };

        let result = run_swp_projection(&inputs).expect("valid inputs");
        assert_eq!(result.schedule.len(), 2);
        assert_approx(result.schedule[0].ending_balance, 400.0);
        assert_approx(result.schedule[1].ending_balance, 0.0);
        assert_approx(result.final_value, 0.0);
        // The last month could only fund 400, but the nominal 600 is still
        // what gets reported.
        assert_approx(result.schedule[1].withdrawal, 600.0);
        assert_approx(result.total_withdrawn, 1_200.0);
    }

    #[test]
    fn growing_balance_runs_the_full_period() {
        let inputs = SwpInput {
            total_investment: 100_000.0,
            monthly_withdrawal: 500.0,
            annual_rate_percent: 8.0,
            period_years: 10,
        };

        let result = run_swp_projection(&inputs).expect("valid inputs");
        assert_eq!(result.schedule.len(), 120);
        assert!(result.final_value >= inputs.total_investment);
    }

    #[test]
    fn zero_withdrawal_compounds_for_the_whole_period() {
        let inputs = SwpInput {
            total_investment: 100_000.0,
            monthly_withdrawal: 0.0,
            annual_rate_percent: 12.0,
            period_years: 1,
        };

        let result = run_swp_projection(&inputs).expect("valid inputs");
        assert_eq!(result.schedule.len(), 12);
        assert_approx(result.total_withdrawn, 0.0);
        assert_approx_tol(result.final_value, 100_000.0 * 1.01f64.powi(12), 1e-4);
    }

    #[test]
    fn schedule_rows_satisfy_the_conservation_law() {
        let result = run_swp_projection(&sample_inputs()).expect("valid inputs");

        let mut prior_ending = sample_inputs().total_investment;
        for row in &result.schedule {
            assert_approx(row.beginning_balance, prior_ending + row.interest);
            assert_approx(row.ending_balance, row.beginning_balance - row.withdrawal);
            prior_ending = row.ending_balance;
        }
        assert_approx(result.final_value, prior_ending);
    }

    #[test]
    fn invalid_inputs_are_rejected() {
        let cases = [
            SwpInput {
                total_investment: 0.0,
                ..sample_inputs()
            },
            SwpInput {
                total_investment: -1.0,
                ..sample_inputs()
            },
            SwpInput {
                total_investment: f64::NAN,
                ..sample_inputs()
            },
            SwpInput {
                monthly_withdrawal: -5.0,
                ..sample_inputs()
            },
            SwpInput {
                annual_rate_percent: -1.0,
                ..sample_inputs()
            },
            SwpInput {
                period_years: 0,
                ..sample_inputs()
            },
        ];

        for inputs in cases {
            assert!(
                run_swp_projection(&inputs).is_err(),
                "must reject {inputs:?}"
            );
        }
    }

    proptest! {
        #[test]
        fn prop_zero_rate_balances_never_increase(
            investment in 1u32..=1_000_000,
            withdrawal in 1u32..=50_000,
            years in 1u32..=30
        ) {
            let inputs = SwpInput {
                total_investment: investment as f64,
                monthly_withdrawal: withdrawal as f64,
                annual_rate_percent: 0.0,
                period_years: years,
            };

            let result = run_swp_projection(&inputs).expect("valid inputs");
            let mut prior = inputs.total_investment;
            for row in &result.schedule {
                prop_assert!(row.ending_balance <= prior + 1e-9);
                if row.ending_balance > 0.0 {
                    prop_assert!(row.ending_balance < prior);
                }
                prior = row.ending_balance;
            }
        }
    }

    proptest! {
        #[test]
        fn prop_schedule_and_totals_are_consistent(
            investment in 1u32..=1_000_000,
            withdrawal in 0u32..=50_000,
            rate_bp in 0u32..=2_400,
            years in 1u32..=40
        ) {
            let inputs = SwpInput {
                total_investment: investment as f64,
                monthly_withdrawal: withdrawal as f64,
                annual_rate_percent: rate_bp as f64 / 100.0,
                period_years: years,
            };

            let result = run_swp_projection(&inputs).expect("valid inputs");
            let steps = result.schedule.len();
            prop_assert!(steps >= 1);
            prop_assert!(steps <= inputs.total_steps() as usize);

            let mut interest_sum = 0.0;
            let mut prior = inputs.total_investment;
            for (idx, row) in result.schedule.iter().enumerate() {
                prop_assert!(row.beginning_balance.is_finite());
                prop_assert!(row.ending_balance.is_finite());
                prop_assert!(row.ending_balance >= 0.0);
                prop_assert!(row.interest >= 0.0);
                prop_assert!((row.month as usize) == idx + 1);

                let tol = 1e-9 * (1.0 + prior.abs());
                prop_assert!((row.beginning_balance - (prior + row.interest)).abs() <= tol);
                if idx + 1 < steps {
                    prop_assert!(
                        (row.ending_balance - (row.beginning_balance - row.withdrawal)).abs()
                            <= tol
                    );
                } else {
                    let expected = (row.beginning_balance - row.withdrawal).max(0.0);
                    prop_assert!((row.ending_balance - expected).abs() <= tol);
                }

                interest_sum += row.interest;
                prior = row.ending_balance;
            }

            let tol = 1e-9 * (1.0 + interest_sum.abs());
            prop_assert!((result.total_interest_earned - interest_sum).abs() <= tol);
            prop_assert!(
                (result.total_withdrawn - inputs.monthly_withdrawal * steps as f64).abs()
                    <= 1e-9 * (1.0 + result.total_withdrawn.abs())
            );
            prop_assert!((result.final_value - prior).abs() <= 1e-9 * (1.0 + prior.abs()));
        }
    }

    proptest! {
        #[test]
        fn prop_zero_withdrawal_always_runs_the_full_period(
            investment in 1u32..=1_000_000,
            rate_bp in 0u32..=2_400,
            years in 1u32..=40
        ) {
            let inputs = SwpInput {
                total_investment: investment as f64,
                monthly_withdrawal: 0.0,
                annual_rate_percent: rate_bp as f64 / 100.0,
                period_years: years,
            };

            let result = run_swp_projection(&inputs).expect("valid inputs");
            prop_assert!(result.schedule.len() == inputs.total_steps() as usize);
            prop_assert!(result.final_value >= inputs.total_investment);
        }
    }
}
