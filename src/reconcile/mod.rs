pub mod engine;
pub mod model;
pub mod store;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub use engine::ReconciliationEngine;
pub use model::{
    BankTransaction, MatchCandidate, MatchKey, ReconciliationSummary, RepaymentRecord,
    TransactionOutcome,
};
pub use store::{InMemoryLedger, RepaymentLedger};

/// which unreconciled transactions a reconciliation pass covers.
///
/// an empty filter covers every unreconciled deposit; the fields narrow
/// by bank account and transaction date. the filter is an explicit
/// argument on every call, a pass holds no ambient scope.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconciliationFilter {
    pub bank_account: Option<String>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
}

impl ReconciliationFilter {
    pub fn for_account(bank_account: impl Into<String>) -> Self {
        Self {
            bank_account: Some(bank_account.into()),
            ..Self::default()
        }
    }

    pub fn with_date_range(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.from_date = Some(from);
        self.to_date = Some(to);
        self
    }
}
