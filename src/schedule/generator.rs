use rust_decimal::Decimal;

use crate::config::LoanTerms;
use crate::decimal::Money;
use crate::errors::Result;
use crate::interest::solver::resolve_repayment;
use crate::schedule::dates::advance_payment_date;
use crate::schedule::{RepaymentSchedule, ScheduleRow};
use crate::types::{InterestMethod, LoanId};

/// nominal period length recorded where the method does not price by days
const DEFAULT_DAY_COUNT: u32 = 30;

/// build the repayment schedule implied by the loan terms.
///
/// one row per period, dated from the start date and advancing by the
/// terms' calendar rule. generation stops when the balance reaches zero
/// or the period count is exhausted; zero-valued rows then pad the
/// schedule to exactly `period_count` rows so downstream consumers can
/// always index the full term.
pub fn generate_schedule(loan_id: LoanId, terms: &LoanTerms) -> Result<RepaymentSchedule> {
    terms.validate()?;
    let (payment, period_count) = resolve_repayment(terms)?;

    let mut rows = match terms.interest_method {
        InterestMethod::OneTimePercentage => one_time_rows(terms, payment, period_count),
        InterestMethod::MonthlyProrated => prorated_rows(terms, payment, period_count),
    };
    pad_to_period_count(&mut rows, terms, period_count);

    let total_interest = rows
        .iter()
        .fold(Money::ZERO, |acc, r| acc + r.interest_amount);
    let total_payable = rows
        .iter()
        .fold(Money::ZERO, |acc, r| acc + r.total_payment);

    Ok(RepaymentSchedule {
        loan_id,
        principal: terms.principal,
        annual_rate: terms.annual_rate,
        interest_method: terms.interest_method,
        start_date: terms.start_date,
        periodic_payment_amount: payment,
        period_count,
        rows,
        total_interest,
        total_payable,
    })
}

/// flat-fee schedule: constant interest and principal portions, the
/// final row absorbs the division residue and zeroes the balance
fn one_time_rows(terms: &LoanTerms, payment: Money, period_count: u32) -> Vec<ScheduleRow> {
    let total_interest = terms
        .principal
        .percentage(terms.annual_rate.as_percentage());
    let interest_per_period = total_interest / Decimal::from(period_count);
    let principal_per_period = payment - interest_per_period;

    let mut rows = Vec::with_capacity(period_count as usize);
    let mut payment_date = terms.start_date;
    let mut balance = terms.principal;

    for period_index in 1..=period_count {
        let (principal_amount, balance_after) = if period_index == period_count {
            (balance, Money::ZERO)
        } else {
            (principal_per_period, balance - principal_per_period)
        };

        rows.push(ScheduleRow {
            period_index,
            payment_date,
            principal_amount,
            interest_amount: interest_per_period,
            total_payment: principal_amount + interest_per_period,
            balance_after,
            day_count: DEFAULT_DAY_COUNT,
        });

        balance = balance_after;
        payment_date =
            advance_payment_date(payment_date, terms.schedule_type, terms.period_anchor);
    }

    rows
}

/// declining-balance schedule: interest recomputed each period at the
/// monthly rate, the final principal clamped to the open balance
fn prorated_rows(terms: &LoanTerms, payment: Money, period_count: u32) -> Vec<ScheduleRow> {
    let monthly_rate = terms.annual_rate.monthly_rate();

    let mut rows = Vec::with_capacity(period_count as usize);
    let mut payment_date = terms.start_date;
    let mut previous_date = terms.start_date;
    let mut balance = terms.principal;
    let mut period_index = 0u32;

    while balance.is_positive() && period_index < period_count {
        period_index += 1;

        let interest = Money::from_decimal(balance.as_decimal() * monthly_rate);
        let mut principal_amount = payment - interest;
        let mut balance_after = balance - principal_amount;
        if balance_after.is_negative() {
            principal_amount += balance_after;
            balance_after = Money::ZERO;
        }

        // the first period has no predecessor to measure from
        let day_count = if period_index == 1 {
            DEFAULT_DAY_COUNT
        } else {
            (payment_date - previous_date).num_days() as u32
        };

        rows.push(ScheduleRow {
            period_index,
            payment_date,
            principal_amount,
            interest_amount: interest,
            total_payment: principal_amount + interest,
            balance_after,
            day_count,
        });

        balance = balance_after;
        previous_date = payment_date;
        payment_date =
            advance_payment_date(payment_date, terms.schedule_type, terms.period_anchor);
    }

    rows
}

fn pad_to_period_count(rows: &mut Vec<ScheduleRow>, terms: &LoanTerms, period_count: u32) {
    let mut payment_date = match rows.last() {
        Some(last) => {
            advance_payment_date(last.payment_date, terms.schedule_type, terms.period_anchor)
        }
        None => terms.start_date,
    };

    while (rows.len() as u32) < period_count {
        rows.push(ScheduleRow {
            period_index: rows.len() as u32 + 1,
            payment_date,
            principal_amount: Money::ZERO,
            interest_amount: Money::ZERO,
            total_payment: Money::ZERO,
            balance_after: Money::ZERO,
            day_count: DEFAULT_DAY_COUNT,
        });
        payment_date =
            advance_payment_date(payment_date, terms.schedule_type, terms.period_anchor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Rate;
    use crate::types::{PeriodAnchor, RepaymentMethod, ScheduleType};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn one_time_terms() -> LoanTerms {
        LoanTerms::over_periods(
            Money::from_decimal(dec!(100000)),
            Rate::from_percentage(35),
            12,
            InterestMethod::OneTimePercentage,
            date(2024, 1, 15),
        )
        .unwrap()
    }

    #[test]
    fn test_one_time_schedule() {
        let schedule = generate_schedule(Uuid::new_v4(), &one_time_terms()).unwrap();

        assert_eq!(schedule.rows.len(), 12);
        assert_eq!(
            schedule.periodic_payment_amount,
            Money::from_decimal(dec!(11250))
        );

        let first = &schedule.rows[0];
        assert_eq!(first.payment_date, date(2024, 1, 15));
        assert_eq!(
            first.interest_amount,
            Money::from_str_exact("2916.66666667").unwrap()
        );
        assert_eq!(
            first.principal_amount,
            Money::from_str_exact("8333.33333333").unwrap()
        );
        assert_eq!(first.total_payment, Money::from_decimal(dec!(11250)));
        assert_eq!(first.day_count, 30);

        // constant interest on every row, flat fee is never recomputed
        for row in &schedule.rows {
            assert_eq!(
                row.interest_amount,
                Money::from_str_exact("2916.66666667").unwrap()
            );
        }

        // final row absorbs the division residue and zeroes the balance
        let last = &schedule.rows[11];
        assert_eq!(last.payment_date, date(2024, 12, 15));
        assert_eq!(
            last.principal_amount,
            Money::from_str_exact("8333.33333337").unwrap()
        );
        assert_eq!(last.balance_after, Money::ZERO);

        assert_eq!(schedule.principal_total(), Money::from_decimal(dec!(100000)));
    }

    #[test]
    fn test_one_time_balance_monotonic() {
        let schedule = generate_schedule(Uuid::new_v4(), &one_time_terms()).unwrap();

        let mut previous = schedule.principal;
        for row in &schedule.rows {
            assert!(row.balance_after < previous);
            assert!(!row.balance_after.is_negative());
            previous = row.balance_after;
        }
    }

    #[test]
    fn test_one_time_prorated_calendar_dates() {
        let terms = LoanTerms::over_periods(
            Money::from_decimal(dec!(1000)),
            Rate::from_percentage(20),
            4,
            InterestMethod::OneTimePercentage,
            date(2024, 1, 15),
        )
        .unwrap()
        .with_schedule_type(ScheduleType::ProRatedCalendarMonths);

        let schedule = generate_schedule(Uuid::new_v4(), &terms).unwrap();
        let dates: Vec<NaiveDate> = schedule.rows.iter().map(|r| r.payment_date).collect();
        assert_eq!(
            dates,
            vec![
                date(2024, 1, 15),
                date(2024, 1, 31),
                date(2024, 2, 29),
                date(2024, 3, 31),
            ]
        );
    }

    #[test]
    fn test_one_time_start_of_next_month_dates() {
        let terms = LoanTerms::over_periods(
            Money::from_decimal(dec!(1000)),
            Rate::from_percentage(20),
            4,
            InterestMethod::OneTimePercentage,
            date(2024, 1, 15),
        )
        .unwrap()
        .with_schedule_type(ScheduleType::ProRatedCalendarMonths)
        .with_period_anchor(PeriodAnchor::StartOfNextMonth);

        let schedule = generate_schedule(Uuid::new_v4(), &terms).unwrap();
        let dates: Vec<NaiveDate> = schedule.rows.iter().map(|r| r.payment_date).collect();
        assert_eq!(
            dates,
            vec![
                date(2024, 1, 15),
                date(2024, 2, 1),
                date(2024, 3, 1),
                date(2024, 4, 1),
            ]
        );
    }

    #[test]
    fn test_prorated_schedule_declining_balance() {
        let terms = LoanTerms::over_periods(
            Money::from_decimal(dec!(1000)),
            Rate::from_percentage(12),
            3,
            InterestMethod::MonthlyProrated,
            date(2024, 1, 15),
        )
        .unwrap();

        let schedule = generate_schedule(Uuid::new_v4(), &terms).unwrap();
        assert_eq!(schedule.rows.len(), 3);
        assert_eq!(schedule.periodic_payment_amount, Money::from_major(341));

        let r1 = &schedule.rows[0];
        assert_eq!(r1.interest_amount, Money::from_decimal(dec!(10)));
        assert_eq!(r1.principal_amount, Money::from_decimal(dec!(331)));
        assert_eq!(r1.balance_after, Money::from_decimal(dec!(669)));
        assert_eq!(r1.day_count, 30);

        let r2 = &schedule.rows[1];
        assert_eq!(r2.interest_amount, Money::from_str_exact("6.69").unwrap());
        assert_eq!(r2.balance_after, Money::from_str_exact("334.69").unwrap());
        // jan 15 to feb 15 in a leap year
        assert_eq!(r2.day_count, 31);

        // final principal clamps to the open balance
        let r3 = &schedule.rows[2];
        assert_eq!(r3.interest_amount, Money::from_str_exact("3.3469").unwrap());
        assert_eq!(
            r3.principal_amount,
            Money::from_str_exact("334.69").unwrap()
        );
        assert_eq!(r3.balance_after, Money::ZERO);
        assert_eq!(r3.day_count, 29);

        assert_eq!(schedule.principal_total(), Money::from_decimal(dec!(1000)));

        // interest declines with the balance
        assert!(r2.interest_amount < r1.interest_amount);
        assert!(r3.interest_amount < r2.interest_amount);
    }

    #[test]
    fn test_prorated_padding_to_period_count() {
        let terms = LoanTerms::over_periods(
            Money::from_decimal(dec!(10)),
            Rate::from_percentage(0),
            6,
            InterestMethod::MonthlyProrated,
            date(2024, 1, 15),
        )
        .unwrap();

        // payment ceil(10 / 6) = 2 repays in five periods
        let schedule = generate_schedule(Uuid::new_v4(), &terms).unwrap();
        assert_eq!(schedule.rows.len(), 6);

        let r5 = &schedule.rows[4];
        assert_eq!(r5.balance_after, Money::ZERO);
        assert_eq!(r5.payment_date, date(2024, 5, 15));

        let pad = &schedule.rows[5];
        assert_eq!(pad.period_index, 6);
        assert_eq!(pad.principal_amount, Money::ZERO);
        assert_eq!(pad.interest_amount, Money::ZERO);
        assert_eq!(pad.total_payment, Money::ZERO);
        assert_eq!(pad.balance_after, Money::ZERO);
        // padding keeps advancing the calendar
        assert_eq!(pad.payment_date, date(2024, 6, 15));
    }

    #[test]
    fn test_fixed_amount_one_time_schedule() {
        let terms = LoanTerms::fixed_amount(
            Money::from_decimal(dec!(100000)),
            Rate::from_percentage(35),
            Money::from_decimal(dec!(20000)),
            InterestMethod::OneTimePercentage,
            date(2024, 1, 15),
        )
        .unwrap();

        // ceil(135000 / 20000) = 7 periods
        let schedule = generate_schedule(Uuid::new_v4(), &terms).unwrap();
        assert_eq!(schedule.rows.len(), 7);
        assert_eq!(schedule.period_count, 7);

        let interest = Money::from_decimal(dec!(5000));
        for row in &schedule.rows {
            assert_eq!(row.interest_amount, interest);
        }
        for row in &schedule.rows[..6] {
            assert_eq!(row.principal_amount, Money::from_decimal(dec!(15000)));
        }

        // final installment collects only what is left
        let last = &schedule.rows[6];
        assert_eq!(last.principal_amount, Money::from_decimal(dec!(10000)));
        assert_eq!(last.total_payment, Money::from_decimal(dec!(15000)));
        assert_eq!(last.balance_after, Money::ZERO);

        assert_eq!(schedule.principal_total(), Money::from_decimal(dec!(100000)));
    }

    #[test]
    fn test_schedule_lookup_helpers() {
        let schedule = generate_schedule(Uuid::new_v4(), &one_time_terms()).unwrap();

        assert_eq!(schedule.row(1).unwrap().payment_date, date(2024, 1, 15));
        assert_eq!(schedule.row(13), None);
        assert_eq!(schedule.balance_after_period(12), Money::ZERO);
        assert_eq!(schedule.final_payment_date(), Some(date(2024, 12, 15)));
    }

    #[test]
    fn test_invalid_terms_rejected() {
        let mut terms = one_time_terms();
        terms.principal = Money::ZERO;
        let result = generate_schedule(Uuid::new_v4(), &terms);
        assert!(result.is_err());
    }
}
