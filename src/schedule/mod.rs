pub mod dates;
pub mod generator;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::types::{InterestMethod, LoanId};

pub use dates::{add_single_month, advance_payment_date, last_day_of_month};
pub use generator::generate_schedule;

/// one installment of a repayment schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRow {
    /// 1-based period number
    pub period_index: u32,
    pub payment_date: NaiveDate,
    pub principal_amount: Money,
    pub interest_amount: Money,
    pub total_payment: Money,
    /// outstanding principal after this installment, never negative
    pub balance_after: Money,
    /// elapsed days covered by the period; fixed at 30 where the
    /// interest method does not price by days
    pub day_count: u32,
}

/// full repayment schedule for a loan.
///
/// rows are chronological, one per period, exactly `period_count` of
/// them. totals are sums over the rows as generated; the flat-fee
/// figures written back to the loan record live in `DerivedTerms`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepaymentSchedule {
    pub loan_id: LoanId,
    pub principal: Money,
    pub annual_rate: Rate,
    pub interest_method: InterestMethod,
    pub start_date: NaiveDate,
    pub periodic_payment_amount: Money,
    pub period_count: u32,
    pub rows: Vec<ScheduleRow>,
    pub total_interest: Money,
    pub total_payable: Money,
}

impl RepaymentSchedule {
    /// look up a row by its 1-based period number
    pub fn row(&self, period_index: u32) -> Option<&ScheduleRow> {
        self.rows.iter().find(|r| r.period_index == period_index)
    }

    /// sum of principal portions across all rows
    pub fn principal_total(&self) -> Money {
        self.rows
            .iter()
            .fold(Money::ZERO, |acc, r| acc + r.principal_amount)
    }

    /// outstanding balance after the given period
    pub fn balance_after_period(&self, period_index: u32) -> Money {
        self.row(period_index)
            .map(|r| r.balance_after)
            .unwrap_or(self.principal)
    }

    /// payment date of the last period
    pub fn final_payment_date(&self) -> Option<NaiveDate> {
        self.rows.last().map(|r| r.payment_date)
    }
}
