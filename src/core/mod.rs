mod engine;
mod solver;
mod types;

pub use engine::run_swp_projection;
pub use solver::{
    WithdrawalSolveConfig, WithdrawalSolveIteration, WithdrawalSolveResult,
    solve_sustainable_withdrawal,
};
pub use types::{MonthlyRecord, SwpInput, SwpResult};
