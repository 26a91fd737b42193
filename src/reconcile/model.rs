use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{LendingError, Result};
use crate::types::LoanId;

/// a bank statement line as imported from the feed.
///
/// only submitted deposit lines with an unallocated remainder and a
/// reference number are candidates for loan-repayment matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankTransaction {
    pub id: Uuid,
    pub date: NaiveDate,
    pub deposit: Money,
    pub withdrawal: Money,
    pub reference_number: Option<String>,
    /// bank account the line was imported against
    pub bank_account: String,
    pub unallocated_amount: Money,
    pub submitted: bool,
}

impl BankTransaction {
    /// a submitted deposit, fully unallocated
    pub fn deposit(
        date: NaiveDate,
        amount: Money,
        reference_number: impl Into<String>,
        bank_account: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            deposit: amount,
            withdrawal: Money::ZERO,
            reference_number: Some(reference_number.into()),
            bank_account: bank_account.into(),
            unallocated_amount: amount,
            submitted: true,
        }
    }

    /// true when the line qualifies for repayment matching
    pub fn is_matchable(&self) -> bool {
        self.submitted
            && self.deposit.is_positive()
            && self.unallocated_amount.is_positive()
            && self
                .reference_number
                .as_deref()
                .map(|r| !r.is_empty())
                .unwrap_or(false)
    }
}

/// a loan repayment as recorded against a loan.
///
/// a repayment is unreconciled until a clearance date is set; salary
/// deducted repayments never clear through a bank feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepaymentRecord {
    pub id: Uuid,
    pub loan_id: LoanId,
    pub amount_paid: Money,
    pub reference_number: String,
    pub posting_date: NaiveDate,
    /// GL account the repayment was received into
    pub payment_account: String,
    pub clearance_date: Option<NaiveDate>,
    pub repaid_from_salary: bool,
    pub submitted: bool,
}

impl RepaymentRecord {
    pub fn new(
        loan_id: LoanId,
        amount_paid: Money,
        reference_number: impl Into<String>,
        posting_date: NaiveDate,
        payment_account: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            loan_id,
            amount_paid,
            reference_number: reference_number.into(),
            posting_date,
            payment_account: payment_account.into(),
            clearance_date: None,
            repaid_from_salary: false,
            submitted: true,
        }
    }

    /// true when the repayment can still be cleared against a deposit
    pub fn is_unreconciled(&self) -> bool {
        self.submitted && self.clearance_date.is_none() && !self.repaid_from_salary
    }

    /// exact-match key of this repayment
    pub fn match_key(&self) -> MatchKey {
        MatchKey {
            reference_number: self.reference_number.clone(),
            amount: self.amount_paid,
            date: self.posting_date,
            payment_account: self.payment_account.clone(),
        }
    }
}

/// the four fields a deposit and a repayment must agree on exactly
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MatchKey {
    pub reference_number: String,
    pub amount: Money,
    pub date: NaiveDate,
    pub payment_account: String,
}

impl MatchKey {
    /// key for a bank transaction, resolved through its GL account.
    ///
    /// returns `None` when the transaction carries no reference number.
    pub fn for_transaction(transaction: &BankTransaction, gl_account: &str) -> Option<Self> {
        let reference_number = transaction.reference_number.clone()?;
        Some(Self {
            reference_number,
            amount: transaction.deposit,
            date: transaction.date,
            payment_account: gl_account.to_string(),
        })
    }
}

/// what happened to one bank transaction during a reconciliation pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TransactionOutcome {
    Reconciled {
        transaction_id: Uuid,
        repayment_id: Uuid,
        loan_id: LoanId,
        amount: Money,
        reference_number: String,
    },
    Skipped {
        transaction_id: Uuid,
        reason: String,
    },
    Failed {
        transaction_id: Uuid,
        error: String,
    },
}

impl TransactionOutcome {
    pub fn transaction_id(&self) -> Uuid {
        match self {
            TransactionOutcome::Reconciled { transaction_id, .. }
            | TransactionOutcome::Skipped { transaction_id, .. }
            | TransactionOutcome::Failed { transaction_id, .. } => *transaction_id,
        }
    }
}

/// summary of a reconciliation pass, serializable for operator tooling
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconciliationSummary {
    pub total_processed: usize,
    pub reconciled: usize,
    pub skipped: usize,
    pub failed: usize,
    pub details: Vec<TransactionOutcome>,
}

impl ReconciliationSummary {
    pub fn record(&mut self, outcome: TransactionOutcome) {
        self.total_processed += 1;
        match &outcome {
            TransactionOutcome::Reconciled { .. } => self.reconciled += 1,
            TransactionOutcome::Skipped { .. } => self.skipped += 1,
            TransactionOutcome::Failed { .. } => self.failed += 1,
        }
        self.details.push(outcome);
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| LendingError::CalculationError {
            message: format!("summary serialization failed: {}", e),
        })
    }
}

/// one previewed deposit-to-repayment pairing; nothing is mutated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub transaction_id: Uuid,
    pub transaction_date: NaiveDate,
    pub amount: Money,
    pub reference_number: String,
    pub repayment_id: Uuid,
    pub loan_id: LoanId,
    pub repayment_posting_date: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_transaction_matchability() {
        let mut txn = BankTransaction::deposit(
            date(2024, 1, 5),
            Money::from_decimal(dec!(500)),
            "R1",
            "Main Current",
        );
        assert!(txn.is_matchable());

        txn.unallocated_amount = Money::ZERO;
        assert!(!txn.is_matchable());

        txn.unallocated_amount = Money::from_decimal(dec!(500));
        txn.reference_number = Some(String::new());
        assert!(!txn.is_matchable());

        txn.reference_number = None;
        assert!(!txn.is_matchable());
    }

    #[test]
    fn test_repayment_reconcilability() {
        let mut repayment = RepaymentRecord::new(
            Uuid::new_v4(),
            Money::from_decimal(dec!(500)),
            "R1",
            date(2024, 1, 5),
            "Bank - GL",
        );
        assert!(repayment.is_unreconciled());

        repayment.clearance_date = Some(date(2024, 1, 6));
        assert!(!repayment.is_unreconciled());

        repayment.clearance_date = None;
        repayment.repaid_from_salary = true;
        assert!(!repayment.is_unreconciled());
    }

    #[test]
    fn test_match_keys_agree() {
        let txn = BankTransaction::deposit(
            date(2024, 1, 5),
            Money::from_decimal(dec!(500)),
            "R1",
            "Main Current",
        );
        let repayment = RepaymentRecord::new(
            Uuid::new_v4(),
            Money::from_decimal(dec!(500)),
            "R1",
            date(2024, 1, 5),
            "Bank - GL",
        );

        let key = MatchKey::for_transaction(&txn, "Bank - GL").unwrap();
        assert_eq!(key, repayment.match_key());
    }

    #[test]
    fn test_match_key_requires_reference() {
        let mut txn = BankTransaction::deposit(
            date(2024, 1, 5),
            Money::from_decimal(dec!(500)),
            "R1",
            "Main Current",
        );
        txn.reference_number = None;
        assert_eq!(MatchKey::for_transaction(&txn, "Bank - GL"), None);
    }

    #[test]
    fn test_summary_counts_and_serializes() {
        let mut summary = ReconciliationSummary::default();
        let txn_id = Uuid::new_v4();

        summary.record(TransactionOutcome::Reconciled {
            transaction_id: txn_id,
            repayment_id: Uuid::new_v4(),
            loan_id: Uuid::new_v4(),
            amount: Money::from_decimal(dec!(500)),
            reference_number: "R1".to_string(),
        });
        summary.record(TransactionOutcome::Skipped {
            transaction_id: Uuid::new_v4(),
            reason: "no matching repayment".to_string(),
        });

        assert_eq!(summary.total_processed, 2);
        assert_eq!(summary.reconciled, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 0);

        let json = summary.to_json().unwrap();
        assert!(json.contains("\"total_processed\": 2"));
    }
}
