use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::types::LoanId;
use uuid::Uuid;

/// all events emitted by loan servicing operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // origination events
    LoanOriginated {
        loan_id: LoanId,
        principal: Money,
        annual_rate: Rate,
        timestamp: DateTime<Utc>,
    },
    ScheduleGenerated {
        loan_id: LoanId,
        period_count: u32,
        periodic_payment_amount: Money,
        total_interest_payable: Money,
        total_payment: Money,
        timestamp: DateTime<Utc>,
    },

    // accrual events
    InterestAccrued {
        loan_id: LoanId,
        amount: Money,
        posting_date: NaiveDate,
        timestamp: DateTime<Utc>,
    },

    // reconciliation events
    RepaymentReconciled {
        repayment_id: Uuid,
        transaction_id: Uuid,
        amount: Money,
        clearance_date: NaiveDate,
        timestamp: DateTime<Utc>,
    },
    TransactionSkipped {
        transaction_id: Uuid,
        reason: String,
        timestamp: DateTime<Utc>,
    },
    ReconciliationFailed {
        transaction_id: Uuid,
        message: String,
        timestamp: DateTime<Utc>,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
