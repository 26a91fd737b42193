use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;

/// unique identifier for a loan
pub type LoanId = Uuid;

/// interest calculation method
///
/// The method is an explicit parameter on the loan terms and is resolved
/// once per calculation; there is no ambient default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterestMethod {
    /// declining-balance amortization, interest recomputed monthly on
    /// outstanding principal
    MonthlyProrated,
    /// flat percentage of principal charged once, spread evenly across
    /// periods
    OneTimePercentage,
}

/// how the repayment obligation is expressed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RepaymentMethod {
    /// period count is given, solve for the periodic payment
    OverPeriods { period_count: u32 },
    /// payment is given, solve for the period count
    FixedAmount { payment: Money },
}

/// how payment dates progress from one period to the next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduleType {
    /// payments land on calendar-month boundaries
    ProRatedCalendarMonths,
    /// payments land on the same day each month (clamped in short months)
    FixedMonthly,
}

/// which day a pro-rated calendar period settles on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeriodAnchor {
    /// last calendar day of the month
    EndOfMonth,
    /// first day of the following month
    StartOfNextMonth,
}

/// lifecycle status of a loan record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanStatus {
    /// schedule generated, repayments outstanding
    Active,
    /// every scheduled installment has been recorded
    Settled,
}

/// derived repayment figures written back to the loan record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedTerms {
    pub period_count: u32,
    pub periodic_payment_amount: Money,
    pub total_interest_payable: Money,
    pub total_payment: Money,
}
