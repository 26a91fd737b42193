pub mod accrual;
pub mod solver;

pub use accrual::{AccrualEngine, AccrualEntry, DayCountConvention};
pub use solver::{
    compute_periodic_payment, compute_totals, resolve_repayment, solve_period_count,
};
