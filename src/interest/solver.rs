use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::config::LoanTerms;
use crate::decimal::{Money, Rate};
use crate::errors::{LendingError, Result};
use crate::types::{DerivedTerms, InterestMethod, RepaymentMethod};

/// ceiling on solved schedule length, guards the balance walks against
/// payments that barely exceed the running interest
const MAX_SOLVED_PERIODS: u32 = 10_000;

/// periodic payment for a loan repaid over a fixed number of periods.
///
/// one-time percentage spreads principal plus the flat fee evenly and
/// keeps the fractional part; rounding the payment up would break the
/// principal-sum invariant of the schedule. monthly prorated uses the
/// amortizing-annuity formula rounded up to the whole currency unit so
/// the lender never under-collects.
pub fn compute_periodic_payment(
    principal: Money,
    annual_rate: Rate,
    period_count: u32,
    method: InterestMethod,
) -> Result<Money> {
    validate_amounts(principal, annual_rate)?;
    if period_count == 0 {
        return Err(LendingError::InvalidPeriodCount { count: 0 });
    }

    match method {
        InterestMethod::OneTimePercentage => {
            let total_interest = principal.percentage(annual_rate.as_percentage());
            let total_payable = principal + total_interest;
            Ok(total_payable / Decimal::from(period_count))
        }
        InterestMethod::MonthlyProrated => {
            let monthly_rate = annual_rate.monthly_rate();
            if monthly_rate.is_zero() {
                return Ok((principal / Decimal::from(period_count)).ceil_major());
            }
            let growth = compound_factor(monthly_rate, period_count);
            let payment = principal.as_decimal() * monthly_rate * growth / (growth - Decimal::ONE);
            Ok(Money::from_decimal(payment).ceil_major())
        }
    }
}

/// number of periods needed to repay a fixed payment amount.
///
/// under monthly prorated the payment must exceed the first month's
/// interest or the balance never declines. the prorated count is solved
/// by walking the declining balance instead of the closed-form
/// `ceil((ln p − ln(p − principal·r)) / ln(1+r))`; the walk yields the
/// same count without leaving decimal arithmetic.
pub fn solve_period_count(
    principal: Money,
    annual_rate: Rate,
    payment: Money,
    method: InterestMethod,
) -> Result<u32> {
    validate_amounts(principal, annual_rate)?;
    if payment.is_zero() || payment.is_negative() {
        return Err(LendingError::InvalidPaymentAmount { amount: payment });
    }

    match method {
        InterestMethod::OneTimePercentage => {
            let total_payable = principal + principal.percentage(annual_rate.as_percentage());
            ceil_to_periods(total_payable.as_decimal() / payment.as_decimal())
        }
        InterestMethod::MonthlyProrated => {
            let monthly_rate = annual_rate.monthly_rate();
            if monthly_rate.is_zero() {
                return ceil_to_periods(principal.as_decimal() / payment.as_decimal());
            }
            let minimum = Money::from_decimal(principal.as_decimal() * monthly_rate);
            if payment <= minimum {
                return Err(LendingError::PaymentBelowInterest {
                    minimum,
                    provided: payment,
                });
            }
            // walk the declining balance; equivalent to the closed-form
            // log solve without leaving decimal arithmetic
            let mut balance = principal;
            let mut periods = 0u32;
            while balance.is_positive() {
                periods += 1;
                if periods > MAX_SOLVED_PERIODS {
                    return Err(LendingError::CalculationError {
                        message: format!(
                            "payment {} does not amortize {} within {} periods",
                            payment, principal, MAX_SOLVED_PERIODS
                        ),
                    });
                }
                let interest = Money::from_decimal(balance.as_decimal() * monthly_rate);
                balance = balance + interest - payment;
            }
            Ok(periods)
        }
    }
}

/// totals written back to the loan record at origination.
///
/// one-time percentage charges the flat fee once. monthly prorated
/// accumulates interest over a declining-balance walk; when the final
/// payment overshoots, the overshoot is pulled back out of interest so
/// the totals reflect a reduced final installment.
pub fn compute_totals(
    principal: Money,
    annual_rate: Rate,
    period_count: u32,
    payment: Money,
    method: InterestMethod,
) -> Result<DerivedTerms> {
    validate_amounts(principal, annual_rate)?;

    let total_interest = match method {
        InterestMethod::OneTimePercentage => principal.percentage(annual_rate.as_percentage()),
        InterestMethod::MonthlyProrated => {
            if payment.is_zero() || payment.is_negative() {
                return Err(LendingError::InvalidPaymentAmount { amount: payment });
            }
            let monthly_rate = annual_rate.monthly_rate();
            if !monthly_rate.is_zero() {
                let minimum = Money::from_decimal(principal.as_decimal() * monthly_rate);
                if payment <= minimum {
                    return Err(LendingError::PaymentBelowInterest {
                        minimum,
                        provided: payment,
                    });
                }
            }

            let mut balance = principal;
            let mut total_interest = Money::ZERO;
            let mut guard = 0u32;
            while balance.is_positive() {
                guard += 1;
                if guard > MAX_SOLVED_PERIODS {
                    return Err(LendingError::CalculationError {
                        message: format!(
                            "payment {} does not amortize {} within {} periods",
                            payment, principal, MAX_SOLVED_PERIODS
                        ),
                    });
                }
                let mut interest = Money::from_decimal(balance.as_decimal() * monthly_rate);
                balance = balance + interest - payment;
                if balance.is_negative() {
                    interest = interest + balance;
                    balance = Money::ZERO;
                }
                total_interest += interest;
            }
            total_interest
        }
    };

    Ok(DerivedTerms {
        period_count,
        periodic_payment_amount: payment,
        total_interest_payable: total_interest,
        total_payment: principal + total_interest,
    })
}

/// payment amount and period count implied by the repayment method.
///
/// repaying over periods solves for the payment; repaying a fixed
/// amount solves for the period count.
pub fn resolve_repayment(terms: &LoanTerms) -> Result<(Money, u32)> {
    match terms.repayment_method {
        RepaymentMethod::OverPeriods { period_count } => {
            let payment = compute_periodic_payment(
                terms.principal,
                terms.annual_rate,
                period_count,
                terms.interest_method,
            )?;
            Ok((payment, period_count))
        }
        RepaymentMethod::FixedAmount { payment } => {
            let period_count = solve_period_count(
                terms.principal,
                terms.annual_rate,
                payment,
                terms.interest_method,
            )?;
            Ok((payment, period_count))
        }
    }
}

fn validate_amounts(principal: Money, annual_rate: Rate) -> Result<()> {
    if principal.is_zero() {
        return Err(LendingError::MissingPrincipal);
    }
    if principal.is_negative() {
        return Err(LendingError::InvalidPrincipal { principal });
    }
    if annual_rate.is_negative() {
        return Err(LendingError::InvalidRate { rate: annual_rate });
    }
    Ok(())
}

/// (1 + r)^n by iteration, staying in decimal arithmetic
fn compound_factor(monthly_rate: Decimal, periods: u32) -> Decimal {
    let base = Decimal::ONE + monthly_rate;
    let mut factor = Decimal::ONE;
    for _ in 0..periods {
        factor *= base;
    }
    factor
}

fn ceil_to_periods(quotient: Decimal) -> Result<u32> {
    let periods = quotient.ceil();
    periods
        .to_u32()
        .ok_or_else(|| LendingError::CalculationError {
            message: format!("period count {} out of range", periods),
        })
}
