use std::collections::BTreeMap;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::errors::{LendingError, Result};
use crate::reconcile::model::{BankTransaction, MatchKey, RepaymentRecord};
use crate::reconcile::ReconciliationFilter;

/// maximum transactions a single pass will pull from the store
pub const DEFAULT_TRANSACTION_LIMIT: usize = 1000;

/// the persistent-store seam the reconciliation engine works through.
///
/// embedders back this with their real document store; the in-memory
/// implementation below covers tests and batch tooling. queries return
/// owned rows, mutation happens only through `apply_clearance`.
pub trait RepaymentLedger {
    /// unreconciled deposit transactions matching the filter, date
    /// ordered, at most `limit` rows
    fn unreconciled_transactions(
        &self,
        filter: &ReconciliationFilter,
        limit: usize,
    ) -> Result<Vec<BankTransaction>>;

    /// look up a single transaction by id
    fn transaction(&self, transaction_id: Uuid) -> Result<Option<BankTransaction>>;

    /// GL account a bank account posts to, `None` when unknown
    fn gl_account(&self, bank_account: &str) -> Result<Option<String>>;

    /// unreconciled repayments matching the key exactly
    fn find_repayments(&self, key: &MatchKey) -> Result<Vec<RepaymentRecord>>;

    /// unreconciled repayments carrying any of the reference numbers;
    /// used by preview to batch its candidate lookup
    fn repayments_by_reference(&self, references: &[String]) -> Result<Vec<RepaymentRecord>>;

    /// clear the repayment against the transaction: set the clearance
    /// date and consume the transaction's unallocated amount
    fn apply_clearance(
        &mut self,
        transaction_id: Uuid,
        repayment_id: Uuid,
        clearance_date: NaiveDate,
    ) -> Result<()>;
}

/// in-memory ledger for tests and embedders without a backing store
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    transactions: Vec<BankTransaction>,
    repayments: Vec<RepaymentRecord>,
    gl_accounts: BTreeMap<String, String>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// map a bank account to the GL account it posts to
    pub fn add_bank_account(&mut self, bank_account: impl Into<String>, gl_account: impl Into<String>) {
        self.gl_accounts.insert(bank_account.into(), gl_account.into());
    }

    pub fn add_transaction(&mut self, transaction: BankTransaction) -> Uuid {
        let id = transaction.id;
        self.transactions.push(transaction);
        id
    }

    pub fn add_repayment(&mut self, repayment: RepaymentRecord) -> Uuid {
        let id = repayment.id;
        self.repayments.push(repayment);
        id
    }

    pub fn repayment(&self, repayment_id: Uuid) -> Option<&RepaymentRecord> {
        self.repayments.iter().find(|r| r.id == repayment_id)
    }

    pub fn transactions(&self) -> &[BankTransaction] {
        &self.transactions
    }
}

impl RepaymentLedger for InMemoryLedger {
    fn unreconciled_transactions(
        &self,
        filter: &ReconciliationFilter,
        limit: usize,
    ) -> Result<Vec<BankTransaction>> {
        let mut rows: Vec<BankTransaction> = self
            .transactions
            .iter()
            .filter(|t| t.is_matchable())
            .filter(|t| {
                filter
                    .bank_account
                    .as_deref()
                    .map(|account| t.bank_account == account)
                    .unwrap_or(true)
            })
            .filter(|t| filter.from_date.map(|from| t.date >= from).unwrap_or(true))
            .filter(|t| filter.to_date.map(|to| t.date <= to).unwrap_or(true))
            .cloned()
            .collect();
        rows.sort_by_key(|t| t.date);
        rows.truncate(limit);
        Ok(rows)
    }

    fn transaction(&self, transaction_id: Uuid) -> Result<Option<BankTransaction>> {
        Ok(self
            .transactions
            .iter()
            .find(|t| t.id == transaction_id)
            .cloned())
    }

    fn gl_account(&self, bank_account: &str) -> Result<Option<String>> {
        Ok(self.gl_accounts.get(bank_account).cloned())
    }

    fn find_repayments(&self, key: &MatchKey) -> Result<Vec<RepaymentRecord>> {
        Ok(self
            .repayments
            .iter()
            .filter(|r| r.is_unreconciled() && r.match_key() == *key)
            .cloned()
            .collect())
    }

    fn repayments_by_reference(&self, references: &[String]) -> Result<Vec<RepaymentRecord>> {
        Ok(self
            .repayments
            .iter()
            .filter(|r| r.is_unreconciled() && references.contains(&r.reference_number))
            .cloned()
            .collect())
    }

    fn apply_clearance(
        &mut self,
        transaction_id: Uuid,
        repayment_id: Uuid,
        clearance_date: NaiveDate,
    ) -> Result<()> {
        let repayment = self
            .repayments
            .iter_mut()
            .find(|r| r.id == repayment_id)
            .ok_or_else(|| LendingError::LedgerError {
                message: format!("repayment {} not found", repayment_id),
            })?;
        if repayment.clearance_date.is_some() {
            return Err(LendingError::LedgerError {
                message: format!("repayment {} already cleared", repayment_id),
            });
        }
        let amount = repayment.amount_paid;
        repayment.clearance_date = Some(clearance_date);

        let transaction = self
            .transactions
            .iter_mut()
            .find(|t| t.id == transaction_id)
            .ok_or_else(|| LendingError::LedgerError {
                message: format!("transaction {} not found", transaction_id),
            })?;
        transaction.unallocated_amount =
            (transaction.unallocated_amount - amount).max(crate::decimal::Money::ZERO);
        Ok(())
    }
}
