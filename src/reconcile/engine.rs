use std::collections::BTreeMap;

use hourglass_rs::SafeTimeProvider;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::Result;
use crate::events::{Event, EventStore};
use crate::reconcile::model::{
    BankTransaction, MatchCandidate, MatchKey, ReconciliationSummary, RepaymentRecord,
    TransactionOutcome,
};
use crate::reconcile::store::{RepaymentLedger, DEFAULT_TRANSACTION_LIMIT};
use crate::reconcile::ReconciliationFilter;

/// matches bank deposits against unreconciled loan repayments.
///
/// a pass walks the filtered transactions sequentially and records one
/// outcome per transaction; a ledger failure on one item never aborts
/// the rest of the batch. clearance dates come from the time provider
/// passed into the call.
pub struct ReconciliationEngine {
    transaction_limit: usize,
    events: EventStore,
}

impl Default for ReconciliationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ReconciliationEngine {
    pub fn new() -> Self {
        Self {
            transaction_limit: DEFAULT_TRANSACTION_LIMIT,
            events: EventStore::new(),
        }
    }

    pub fn with_transaction_limit(mut self, limit: usize) -> Self {
        self.transaction_limit = limit;
        self
    }

    /// reconcile every unreconciled deposit the filter covers.
    ///
    /// per-item failures land in the summary; a failure of the batch
    /// query itself has no items to attribute to and propagates.
    pub fn reconcile<L: RepaymentLedger>(
        &mut self,
        ledger: &mut L,
        filter: &ReconciliationFilter,
        time_provider: &SafeTimeProvider,
    ) -> Result<ReconciliationSummary> {
        let transactions = ledger.unreconciled_transactions(filter, self.transaction_limit)?;

        let mut summary = ReconciliationSummary::default();
        for transaction in &transactions {
            let outcome = self.reconcile_one(ledger, transaction, time_provider);
            summary.record(outcome);
        }

        info!(
            total = summary.total_processed,
            reconciled = summary.reconciled,
            skipped = summary.skipped,
            failed = summary.failed,
            "reconciliation pass complete"
        );
        Ok(summary)
    }

    /// reconcile an explicit list of transactions by id.
    ///
    /// unknown ids are recorded as failed; known transactions go
    /// through the same matching as a filtered pass.
    pub fn reconcile_selected<L: RepaymentLedger>(
        &mut self,
        ledger: &mut L,
        transaction_ids: &[Uuid],
        time_provider: &SafeTimeProvider,
    ) -> ReconciliationSummary {
        let mut summary = ReconciliationSummary::default();
        for &transaction_id in transaction_ids {
            let outcome = match ledger.transaction(transaction_id) {
                Ok(Some(transaction)) if transaction.is_matchable() => {
                    self.reconcile_one(ledger, &transaction, time_provider)
                }
                Ok(Some(_)) => TransactionOutcome::Skipped {
                    transaction_id,
                    reason: "transaction is not a matchable deposit".to_string(),
                },
                Ok(None) => TransactionOutcome::Failed {
                    transaction_id,
                    error: "unknown transaction".to_string(),
                },
                Err(e) => TransactionOutcome::Failed {
                    transaction_id,
                    error: e.to_string(),
                },
            };
            summary.record(outcome);
        }
        summary
    }

    /// preview which deposits would reconcile, without mutating anything.
    ///
    /// candidate repayments are fetched in one batch by reference
    /// number and matched on the exact four-field key; ambiguous keys
    /// are left out, a reconcile pass would skip them anyway.
    pub fn preview<L: RepaymentLedger>(
        &self,
        ledger: &L,
        filter: &ReconciliationFilter,
        limit: usize,
    ) -> Result<Vec<MatchCandidate>> {
        let transactions = ledger.unreconciled_transactions(filter, limit)?;

        let references: Vec<String> = transactions
            .iter()
            .filter_map(|t| t.reference_number.clone())
            .collect();
        if references.is_empty() {
            return Ok(Vec::new());
        }
        let repayments = ledger.repayments_by_reference(&references)?;

        let mut by_key: BTreeMap<MatchKey, Vec<&RepaymentRecord>> = BTreeMap::new();
        for repayment in &repayments {
            by_key.entry(repayment.match_key()).or_default().push(repayment);
        }

        let mut candidates = Vec::new();
        for transaction in &transactions {
            let gl_account = match ledger.gl_account(&transaction.bank_account)? {
                Some(account) => account,
                None => continue,
            };
            let Some(key) = MatchKey::for_transaction(transaction, &gl_account) else {
                continue;
            };
            match by_key.get(&key).map(Vec::as_slice) {
                Some([repayment]) => candidates.push(MatchCandidate {
                    transaction_id: transaction.id,
                    transaction_date: transaction.date,
                    amount: transaction.deposit,
                    reference_number: key.reference_number,
                    repayment_id: repayment.id,
                    loan_id: repayment.loan_id,
                    repayment_posting_date: repayment.posting_date,
                }),
                _ => continue,
            }
        }
        Ok(candidates)
    }

    /// drain the events accumulated across passes
    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.take_events()
    }

    fn reconcile_one<L: RepaymentLedger>(
        &mut self,
        ledger: &mut L,
        transaction: &BankTransaction,
        time_provider: &SafeTimeProvider,
    ) -> TransactionOutcome {
        let now = time_provider.now();
        let outcome = self.try_match(ledger, transaction, now.date_naive());

        match &outcome {
            TransactionOutcome::Reconciled {
                repayment_id,
                amount,
                ..
            } => {
                debug!(transaction = %transaction.id, repayment = %repayment_id, %amount, "reconciled");
                self.events.emit(Event::RepaymentReconciled {
                    repayment_id: *repayment_id,
                    transaction_id: transaction.id,
                    amount: *amount,
                    clearance_date: now.date_naive(),
                    timestamp: now,
                });
            }
            TransactionOutcome::Skipped { reason, .. } => {
                debug!(transaction = %transaction.id, reason = %reason, "skipped");
                self.events.emit(Event::TransactionSkipped {
                    transaction_id: transaction.id,
                    reason: reason.clone(),
                    timestamp: now,
                });
            }
            TransactionOutcome::Failed { error, .. } => {
                warn!(transaction = %transaction.id, error = %error, "reconciliation failed");
                self.events.emit(Event::ReconciliationFailed {
                    transaction_id: transaction.id,
                    message: error.clone(),
                    timestamp: now,
                });
            }
        }
        outcome
    }

    fn try_match<L: RepaymentLedger>(
        &self,
        ledger: &mut L,
        transaction: &BankTransaction,
        clearance_date: chrono::NaiveDate,
    ) -> TransactionOutcome {
        let transaction_id = transaction.id;

        let gl_account = match ledger.gl_account(&transaction.bank_account) {
            Ok(Some(account)) => account,
            Ok(None) => {
                return TransactionOutcome::Skipped {
                    transaction_id,
                    reason: format!("bank account {} not found", transaction.bank_account),
                }
            }
            Err(e) => {
                return TransactionOutcome::Failed {
                    transaction_id,
                    error: e.to_string(),
                }
            }
        };

        let Some(key) = MatchKey::for_transaction(transaction, &gl_account) else {
            return TransactionOutcome::Skipped {
                transaction_id,
                reason: "transaction carries no reference number".to_string(),
            };
        };

        let matches = match ledger.find_repayments(&key) {
            Ok(matches) => matches,
            Err(e) => {
                return TransactionOutcome::Failed {
                    transaction_id,
                    error: e.to_string(),
                }
            }
        };

        let repayment = match matches.as_slice() {
            [] => {
                return TransactionOutcome::Skipped {
                    transaction_id,
                    reason: "no matching loan repayment found".to_string(),
                }
            }
            [repayment] => repayment,
            ambiguous => {
                // never pick arbitrarily between duplicate candidates
                return TransactionOutcome::Skipped {
                    transaction_id,
                    reason: format!("{} repayments match, ambiguous", ambiguous.len()),
                };
            }
        };

        match ledger.apply_clearance(transaction_id, repayment.id, clearance_date) {
            Ok(()) => TransactionOutcome::Reconciled {
                transaction_id,
                repayment_id: repayment.id,
                loan_id: repayment.loan_id,
                amount: repayment.amount_paid,
                reference_number: repayment.reference_number.clone(),
            },
            Err(e) => TransactionOutcome::Failed {
                transaction_id,
                error: e.to_string(),
            },
        }
    }
}
