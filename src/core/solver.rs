use super::engine::run_swp_projection;
use super::types::SwpInput;

#[derive(Debug, Clone, Copy)]
pub struct WithdrawalSolveConfig {
    pub target_final_value: f64,
    pub search_min: f64,
    pub search_max: f64,
    pub tolerance: f64,
    pub max_iterations: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct WithdrawalSolveIteration {
    pub iteration: u32,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub candidate_withdrawal: f64,
    pub final_value: f64,
}

#[derive(Debug, Clone)]
pub struct WithdrawalSolveResult {
    pub target_final_value: f64,
    pub search_min: f64,
    pub search_max: f64,
    pub tolerance: f64,
    pub max_iterations: u32,
    pub solved_withdrawal: Option<f64>,
    pub achieved_final_value: Option<f64>,
    pub iterations: Vec<WithdrawalSolveIteration>,
    pub converged: bool,
    pub feasible: bool,
    pub message: String,
}

#[derive(Debug, Clone, Copy)]
struct CandidateEval {
    final_value: f64,
    fully_funded: bool,
}

impl CandidateEval {
    fn sustains(self, target_final_value: f64) -> bool {
        self.fully_funded && self.final_value + 1e-9 >= target_final_value
    }
}

// The projection outcome is monotonically non-increasing in the withdrawal,
// so bisection over the withdrawal is sound.
pub fn solve_sustainable_withdrawal(
    inputs: &SwpInput,
    config: WithdrawalSolveConfig,
) -> Result<WithdrawalSolveResult, String> {
    validate_config(config)?;

    let low_eval = evaluate_candidate(inputs, config.search_min)?;
    let high_eval = evaluate_candidate(inputs, config.search_max)?;

    let mut iterations = Vec::with_capacity(config.max_iterations as usize);
    let mut solved_withdrawal = None;
    let mut converged = false;
    let feasible;
    let message;

    if !low_eval.sustains(config.target_final_value) {
        feasible = false;
        message = "No sustainable withdrawal found within the search bounds.".to_string();
    } else if high_eval.sustains(config.target_final_value) {
        solved_withdrawal = Some(config.search_max);
        converged = true;
        feasible = true;
        message = "Upper withdrawal bound is still sustainable; increase search max for a higher answer."
            .to_string();
    } else {
        let mut lo = config.search_min;
        let mut hi = config.search_max;
        let mut it = 0;
        while it < config.max_iterations {
            it += 1;
            let mid = (lo + hi) * 0.5;
            let eval = evaluate_candidate(inputs, mid)?;
            iterations.push(WithdrawalSolveIteration {
                iteration: it,
                lower_bound: lo,
                upper_bound: hi,
                candidate_withdrawal: mid,
                final_value: eval.final_value,
            });

            if eval.sustains(config.target_final_value) {
                lo = mid;
            } else {
                hi = mid;
            }

            if (hi - lo).abs() <= config.tolerance {
                converged = true;
                solved_withdrawal = Some(lo);
                break;
            }
        }
        if solved_withdrawal.is_none() {
            solved_withdrawal = Some(lo);
        }
        feasible = true;
        message = if converged {
            "Solved maximum sustainable withdrawal.".to_string()
        } else {
            "Reached max iterations before tolerance was met; returning best estimate.".to_string()
        };
    }

    let achieved_final_value = match solved_withdrawal {
        Some(withdrawal) => Some(evaluate_candidate(inputs, withdrawal)?.final_value),
        None => None,
    };

    Ok(WithdrawalSolveResult {
        target_final_value: config.target_final_value,
        search_min: config.search_min,
        search_max: config.search_max,
        tolerance: config.tolerance,
        max_iterations: config.max_iterations,
        solved_withdrawal,
        achieved_final_value,
        iterations,
        converged,
        feasible,
        message,
    })
}

fn evaluate_candidate(base_inputs: &SwpInput, withdrawal: f64) -> Result<CandidateEval, String> {
    let mut inputs = base_inputs.clone();
    inputs.monthly_withdrawal = withdrawal;

    let result = run_swp_projection(&inputs)?;
    // A clamped final month means the scheduled withdrawal could not be
    // funded in full, even though the schedule still spans the period.
    let shortfall = result
        .schedule
        .last()
        .is_some_and(|row| row.beginning_balance - row.withdrawal < 0.0);
    Ok(CandidateEval {
        final_value: result.final_value,
        fully_funded: result.schedule.len() == inputs.total_steps() as usize && !shortfall,
    })
}

fn validate_config(config: WithdrawalSolveConfig) -> Result<(), String> {
    if !config.target_final_value.is_finite() || config.target_final_value < 0.0 {
        return Err("target_final_value must be >= 0".to_string());
    }
    if !config.search_min.is_finite() || !config.search_max.is_finite() {
        return Err("search bounds must be finite".to_string());
    }
    if config.search_min < 0.0 {
        return Err("search_min must be >= 0".to_string());
    }
    if config.search_max <= config.search_min {
        return Err("search_max must be greater than search_min".to_string());
    }
    if !config.tolerance.is_finite() || config.tolerance <= 0.0 {
        return Err("tolerance must be > 0".to_string());
    }
    if config.max_iterations == 0 {
        return Err("max_iterations must be > 0".to_string());
    }
    Ok(())
}
