use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{LendingError, Result};
use crate::types::{InterestMethod, PeriodAnchor, RepaymentMethod, ScheduleType};

/// contractual terms a loan is originated with.
///
/// terms are validated once at construction and again at the start of
/// the origination pipeline, so downstream calculators can assume a
/// positive principal and a non-negative rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanTerms {
    /// disbursed principal
    pub principal: Money,
    /// nominal annual rate
    pub annual_rate: Rate,
    /// how the repayment obligation is expressed
    pub repayment_method: RepaymentMethod,
    /// how interest is charged over the life of the loan
    pub interest_method: InterestMethod,
    /// date the schedule starts from (disbursement date)
    pub start_date: NaiveDate,
    /// how payment dates advance between periods
    pub schedule_type: ScheduleType,
    /// where pro-rated periods land within the month
    pub period_anchor: PeriodAnchor,
}

impl LoanTerms {
    /// terms for a loan repaid over a fixed number of periods.
    pub fn over_periods(
        principal: Money,
        annual_rate: Rate,
        period_count: u32,
        interest_method: InterestMethod,
        start_date: NaiveDate,
    ) -> Result<Self> {
        let terms = Self {
            principal,
            annual_rate,
            repayment_method: RepaymentMethod::OverPeriods { period_count },
            interest_method,
            start_date,
            schedule_type: ScheduleType::FixedMonthly,
            period_anchor: PeriodAnchor::EndOfMonth,
        };
        terms.validate()?;
        Ok(terms)
    }

    /// terms for a loan repaid in installments of a known amount, where
    /// the number of periods is solved for during origination.
    pub fn fixed_amount(
        principal: Money,
        annual_rate: Rate,
        payment: Money,
        interest_method: InterestMethod,
        start_date: NaiveDate,
    ) -> Result<Self> {
        let terms = Self {
            principal,
            annual_rate,
            repayment_method: RepaymentMethod::FixedAmount { payment },
            interest_method,
            start_date,
            schedule_type: ScheduleType::FixedMonthly,
            period_anchor: PeriodAnchor::EndOfMonth,
        };
        terms.validate()?;
        Ok(terms)
    }

    pub fn with_schedule_type(mut self, schedule_type: ScheduleType) -> Self {
        self.schedule_type = schedule_type;
        self
    }

    pub fn with_period_anchor(mut self, anchor: PeriodAnchor) -> Self {
        self.period_anchor = anchor;
        self
    }

    /// checks the numeric preconditions every calculator relies on.
    ///
    /// a zero principal is treated as absent rather than invalid, since
    /// upstream systems routinely default unset amounts to zero. a zero
    /// rate is legal and drives the interest-free branches.
    pub fn validate(&self) -> Result<()> {
        if self.principal.is_zero() {
            return Err(LendingError::MissingPrincipal);
        }
        if self.principal.is_negative() {
            return Err(LendingError::InvalidPrincipal {
                principal: self.principal,
            });
        }
        if self.annual_rate.is_negative() {
            return Err(LendingError::InvalidRate {
                rate: self.annual_rate,
            });
        }
        match self.repayment_method {
            RepaymentMethod::OverPeriods { period_count } => {
                if period_count == 0 {
                    return Err(LendingError::InvalidPeriodCount { count: 0 });
                }
            }
            RepaymentMethod::FixedAmount { payment } => {
                if payment.is_zero() || payment.is_negative() {
                    return Err(LendingError::InvalidPaymentAmount { amount: payment });
                }
            }
        }
        Ok(())
    }
}
