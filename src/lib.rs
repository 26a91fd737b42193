pub mod config;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod interest;
pub mod loan;
pub mod reconcile;
pub mod schedule;
pub mod types;

// re-export key types
pub use config::LoanTerms;
pub use decimal::{Money, Rate};
pub use errors::{LendingError, Result};
pub use events::{Event, EventStore};
pub use interest::{
    compute_periodic_payment, compute_totals, solve_period_count, AccrualEngine, AccrualEntry,
    DayCountConvention,
};
pub use loan::LoanRecord;
pub use reconcile::{
    BankTransaction, InMemoryLedger, MatchCandidate, MatchKey, ReconciliationEngine,
    ReconciliationFilter, ReconciliationSummary, RepaymentLedger, RepaymentRecord,
    TransactionOutcome,
};
pub use schedule::{generate_schedule, RepaymentSchedule, ScheduleRow};
pub use types::{
    DerivedTerms, InterestMethod, LoanId, LoanStatus, PeriodAnchor, RepaymentMethod, ScheduleType,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
