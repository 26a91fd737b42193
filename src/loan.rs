use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;
use uuid::Uuid;

use crate::config::LoanTerms;
use crate::errors::{LendingError, Result};
use crate::events::{Event, EventStore};
use crate::interest::solver::{compute_totals, resolve_repayment};
use crate::schedule::{generate_schedule, RepaymentSchedule};
use crate::types::{DerivedTerms, LoanId, LoanStatus};

/// a loan record with its derived figures and repayment schedule.
///
/// origination runs a fixed pipeline of named steps; there are no
/// lifecycle hooks and no ambient state, every input arrives as an
/// argument and every output lands on the record.
pub struct LoanRecord {
    pub id: LoanId,
    pub terms: LoanTerms,
    pub derived: DerivedTerms,
    pub schedule: RepaymentSchedule,
    pub status: LoanStatus,
    pub events: EventStore,
    repayment_dates: Vec<NaiveDate>,
}

impl LoanRecord {
    /// originate a loan from validated terms.
    ///
    /// pipeline order: validate terms, resolve the payment amount and
    /// period count from the repayment method, derive the write-back
    /// totals, generate the schedule. any step failing aborts the
    /// origination with no partial record.
    pub fn originate(terms: LoanTerms, time_provider: &SafeTimeProvider) -> Result<Self> {
        let loan_id = Uuid::new_v4();
        let now = time_provider.now();

        terms.validate()?;
        let (payment, period_count) = resolve_repayment(&terms)?;
        let derived = compute_totals(
            terms.principal,
            terms.annual_rate,
            period_count,
            payment,
            terms.interest_method,
        )?;
        let schedule = generate_schedule(loan_id, &terms)?;

        let mut events = EventStore::new();
        events.emit(Event::LoanOriginated {
            loan_id,
            principal: terms.principal,
            annual_rate: terms.annual_rate,
            timestamp: now,
        });
        events.emit(Event::ScheduleGenerated {
            loan_id,
            period_count,
            periodic_payment_amount: derived.periodic_payment_amount,
            total_interest_payable: derived.total_interest_payable,
            total_payment: derived.total_payment,
            timestamp: now,
        });

        Ok(Self {
            id: loan_id,
            terms,
            derived,
            schedule,
            status: LoanStatus::Active,
            events,
            repayment_dates: Vec::new(),
        })
    }

    /// check a repayment posting date against repayments already on the
    /// record.
    ///
    /// a posting earlier than a recorded later repayment is rejected
    /// unless the caller marks it as a correction entry; the flag is an
    /// explicit argument scoped to this call.
    pub fn validate_repayment_date(
        &self,
        posting_date: NaiveDate,
        allow_correction: bool,
    ) -> Result<()> {
        if allow_correction {
            return Ok(());
        }
        if let Some(latest) = self
            .repayment_dates
            .iter()
            .filter(|d| **d > posting_date)
            .max()
        {
            return Err(LendingError::RepaymentAfterLater { latest: *latest });
        }
        Ok(())
    }

    /// record a repayment posting against the loan.
    ///
    /// the record only tracks posting dates for ordering validation;
    /// allocation against schedule rows is the host's concern.
    pub fn record_repayment(
        &mut self,
        posting_date: NaiveDate,
        allow_correction: bool,
    ) -> Result<()> {
        self.validate_repayment_date(posting_date, allow_correction)?;
        self.repayment_dates.push(posting_date);
        if self.repayment_dates.len() as u32 >= self.derived.period_count {
            self.status = LoanStatus::Settled;
        }
        Ok(())
    }

    /// posting dates of repayments recorded so far
    pub fn repayment_dates(&self) -> &[NaiveDate] {
        &self.repayment_dates
    }

    /// drain accumulated events
    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.take_events()
    }
}
