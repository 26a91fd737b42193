use chrono::NaiveDate;
use thiserror::Error;

use crate::decimal::{Money, Rate};

#[derive(Error, Debug)]
pub enum LendingError {
    #[error("invalid period count: {count} (must be at least 1)")]
    InvalidPeriodCount {
        count: i64,
    },

    #[error("principal is missing or zero")]
    MissingPrincipal,

    #[error("invalid principal: {principal}")]
    InvalidPrincipal {
        principal: Money,
    },

    #[error("invalid interest rate: {rate}")]
    InvalidRate {
        rate: Rate,
    },

    #[error("repayment amount must be greater than per-period interest: minimum {minimum}, provided {provided}")]
    PaymentBelowInterest {
        minimum: Money,
        provided: Money,
    },

    #[error("invalid repayment amount: {amount}")]
    InvalidPaymentAmount {
        amount: Money,
    },

    #[error("repayment already recorded on or after {latest}")]
    RepaymentAfterLater {
        latest: NaiveDate,
    },

    #[error("calculation error: {message}")]
    CalculationError {
        message: String,
    },

    #[error("ledger error: {message}")]
    LedgerError {
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, LendingError>;
