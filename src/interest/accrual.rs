use chrono::{Datelike, Duration, NaiveDate};
use hourglass_rs::SafeTimeProvider;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::events::{Event, EventStore};
use crate::schedule::dates::is_leap_year;
use crate::schedule::RepaymentSchedule;
use crate::types::{InterestMethod, LoanId};

/// day count convention used to spread an annual rate across days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DayCountConvention {
    /// actual days / 365
    Actual365,
    /// 30 days per month / 365
    Thirty365,
    /// actual days / 360
    Actual360,
    /// 30 days per month / 360
    Thirty360,
    /// actual days / actual days in year (handles leap years)
    ActualActual,
}

impl DayCountConvention {
    /// divisor for converting an annual rate to a daily rate
    pub fn year_divisor(&self, year: i32) -> u32 {
        match self {
            DayCountConvention::Actual365 | DayCountConvention::Thirty365 => 365,
            DayCountConvention::Actual360 | DayCountConvention::Thirty360 => 360,
            DayCountConvention::ActualActual => {
                if is_leap_year(year) {
                    366
                } else {
                    365
                }
            }
        }
    }
}

/// one accrual posted against a schedule row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccrualEntry {
    pub loan_id: LoanId,
    pub period_index: u32,
    pub posting_date: NaiveDate,
    pub interest_amount: Money,
    pub principal_amount: Money,
    pub balance_after: Money,
}

/// engine for interest accrual over repayment schedules
pub struct AccrualEngine {
    pub convention: DayCountConvention,
    events: EventStore,
}

impl AccrualEngine {
    pub fn new(convention: DayCountConvention) -> Self {
        Self {
            convention,
            events: EventStore::new(),
        }
    }

    /// daily interest quote on an outstanding principal.
    ///
    /// flat-fee loans charge their interest once at origination and
    /// accrue nothing day to day.
    pub fn per_day_interest(
        &self,
        principal: Money,
        annual_rate: Rate,
        method: InterestMethod,
        posting_date: NaiveDate,
    ) -> Money {
        if method == InterestMethod::OneTimePercentage {
            return Money::ZERO;
        }
        let divisor = self.convention.year_divisor(posting_date.year());
        Money::from_decimal(
            principal.as_decimal() * annual_rate.as_decimal() / Decimal::from(divisor),
        )
    }

    /// walk a date range and accrue every schedule row that has come
    /// due, including rows of loans that have since been settled.
    ///
    /// each row accrues once, on the first walked date on or after its
    /// payment date; zero-valued padding rows never accrue.
    pub fn run_historical(
        &mut self,
        schedule: &RepaymentSchedule,
        from: NaiveDate,
        to: NaiveDate,
        time_provider: &SafeTimeProvider,
    ) -> Vec<AccrualEntry> {
        let now = time_provider.now();
        let mut entries = Vec::new();
        let mut accrued = vec![false; schedule.rows.len()];

        let mut current = from;
        while current <= to {
            for (idx, row) in schedule.rows.iter().enumerate() {
                if accrued[idx]
                    || row.payment_date > current
                    || !row.principal_amount.is_positive()
                {
                    continue;
                }
                accrued[idx] = true;
                self.events.emit(Event::InterestAccrued {
                    loan_id: schedule.loan_id,
                    amount: row.interest_amount,
                    posting_date: current,
                    timestamp: now,
                });
                entries.push(AccrualEntry {
                    loan_id: schedule.loan_id,
                    period_index: row.period_index,
                    posting_date: current,
                    interest_amount: row.interest_amount,
                    principal_amount: row.principal_amount,
                    balance_after: row.balance_after,
                });
            }
            current += Duration::days(1);
        }

        entries
    }

    /// drain the events accumulated across runs
    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.take_events()
    }
}
