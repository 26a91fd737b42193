use chrono::{Datelike, Duration, NaiveDate};

use crate::types::{PeriodAnchor, ScheduleType};

/// advance a payment date by one period.
///
/// pro-rated calendar months land on month ends: a mid-month date is
/// broken to the end of its own month, a date already at month end
/// rolls to the end of the next month. the start-of-next-month anchor
/// shifts the month end forward one day. fixed monthly keeps the same
/// calendar day with short-month clamping.
pub fn advance_payment_date(
    date: NaiveDate,
    schedule_type: ScheduleType,
    anchor: PeriodAnchor,
) -> NaiveDate {
    match schedule_type {
        ScheduleType::ProRatedCalendarMonths => {
            let month_end = last_day_of_month(date);
            match anchor {
                PeriodAnchor::EndOfMonth => {
                    if date < month_end {
                        month_end
                    } else {
                        last_day_of_month(month_end + Duration::days(1))
                    }
                }
                PeriodAnchor::StartOfNextMonth => month_end + Duration::days(1),
            }
        }
        ScheduleType::FixedMonthly => add_single_month(date),
    }
}

/// same calendar day one month later, clamped to the target month's length
pub fn add_single_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    let day = date.day().min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// last calendar day of the month containing `date`
pub fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    let day = days_in_month(date.year(), date.month());
    NaiveDate::from_ymd_opt(date.year(), date.month(), day).unwrap()
}

pub(crate) fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        _ => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
    }
}

pub(crate) fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_last_day_of_month() {
        assert_eq!(last_day_of_month(date(2024, 1, 15)), date(2024, 1, 31));
        assert_eq!(last_day_of_month(date(2024, 2, 1)), date(2024, 2, 29));
        assert_eq!(last_day_of_month(date(2023, 2, 10)), date(2023, 2, 28));
        assert_eq!(last_day_of_month(date(2024, 12, 31)), date(2024, 12, 31));
    }

    #[test]
    fn test_add_single_month() {
        assert_eq!(add_single_month(date(2024, 1, 15)), date(2024, 2, 15));
        assert_eq!(add_single_month(date(2024, 1, 31)), date(2024, 2, 29));
        assert_eq!(add_single_month(date(2023, 1, 31)), date(2023, 2, 28));
        assert_eq!(add_single_month(date(2024, 12, 15)), date(2025, 1, 15));
        // clamping only, no snapping back to month ends
        assert_eq!(add_single_month(date(2024, 2, 29)), date(2024, 3, 29));
    }

    #[test]
    fn test_prorated_end_of_month() {
        let advance = |d| {
            advance_payment_date(d, ScheduleType::ProRatedCalendarMonths, PeriodAnchor::EndOfMonth)
        };

        // broken first period lands on the current month end
        assert_eq!(advance(date(2024, 1, 15)), date(2024, 1, 31));
        // subsequent periods roll month to month
        assert_eq!(advance(date(2024, 1, 31)), date(2024, 2, 29));
        assert_eq!(advance(date(2024, 2, 29)), date(2024, 3, 31));
        assert_eq!(advance(date(2024, 12, 31)), date(2025, 1, 31));
    }

    #[test]
    fn test_prorated_start_of_next_month() {
        let advance = |d| {
            advance_payment_date(
                d,
                ScheduleType::ProRatedCalendarMonths,
                PeriodAnchor::StartOfNextMonth,
            )
        };

        assert_eq!(advance(date(2024, 1, 15)), date(2024, 2, 1));
        assert_eq!(advance(date(2024, 2, 1)), date(2024, 3, 1));
        assert_eq!(advance(date(2024, 12, 5)), date(2025, 1, 1));
    }

    #[test]
    fn test_fixed_monthly_ignores_anchor() {
        let eom = advance_payment_date(
            date(2024, 1, 31),
            ScheduleType::FixedMonthly,
            PeriodAnchor::EndOfMonth,
        );
        let som = advance_payment_date(
            date(2024, 1, 31),
            ScheduleType::FixedMonthly,
            PeriodAnchor::StartOfNextMonth,
        );
        assert_eq!(eom, date(2024, 2, 29));
        assert_eq!(som, date(2024, 2, 29));
    }

    #[test]
    fn test_leap_years() {
        assert!(is_leap_year(2024));
        assert!(!is_leap_year(2023));
        assert!(is_leap_year(2000));
        assert!(!is_leap_year(1900));
    }
}
