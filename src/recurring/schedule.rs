//! Next-execution-date computation
//!
//! Pure date math: no clock reads, no store access. The caller supplies
//! `today`, which makes every rule testable with fixed dates.

use chrono::{Datelike, Days, Months, NaiveDate};

use super::models::Frequency;

/// Compute the next execution date for a recurring transfer.
///
/// `base` is the nominal starting point (the start date on creation, or
/// `last execution + 1 day` after a firing); it is clamped to `today` when
/// it lies in the past.
///
/// Rules per frequency:
/// - DAILY: the base date itself.
/// - WEEKLY: next-or-same occurrence of `day_of_week` (1 = Monday).
/// - BIWEEKLY: the weekly occurrence plus one week.
/// - MONTHLY: `day_of_month` clamped to the month's length; rolls to the
///   next month once the anchor day has been reached.
/// - QUARTERLY: three months ahead, `day_of_month` clamped to 28 so the
///   result stays valid in February.
pub fn next_execution_date(
    base: NaiveDate,
    today: NaiveDate,
    frequency: Frequency,
    day_of_week: Option<u32>,
    day_of_month: Option<u32>,
) -> NaiveDate {
    let base = base.max(today);

    match frequency {
        Frequency::Daily => base,
        Frequency::Weekly => next_or_same_weekday(base, anchor_weekday(base, day_of_week)),
        Frequency::Biweekly => {
            next_or_same_weekday(base, anchor_weekday(base, day_of_week)) + Days::new(7)
        }
        Frequency::Monthly => {
            let anchor = day_of_month.unwrap_or_else(|| base.day().min(28));
            let this_month_day = anchor.min(days_in_month(base));
            if base.day() < this_month_day {
                base.with_day(this_month_day).expect("day within month")
            } else {
                let next_month = first_of_next_month(base);
                let day = anchor.min(days_in_month(next_month));
                next_month.with_day(day).expect("day within month")
            }
        }
        Frequency::Quarterly => {
            let anchor = day_of_month.unwrap_or(1).min(28);
            let target = base
                .checked_add_months(Months::new(3))
                .expect("date within chrono range");
            target.with_day(anchor).expect("day <= 28 is always valid")
        }
    }
}

fn anchor_weekday(base: NaiveDate, day_of_week: Option<u32>) -> u32 {
    match day_of_week {
        Some(dow @ 1..=7) => dow,
        _ => base.weekday().number_from_monday(),
    }
}

fn next_or_same_weekday(base: NaiveDate, target_dow: u32) -> NaiveDate {
    let current = base.weekday().number_from_monday();
    let offset = (target_dow + 7 - current) % 7;
    base + Days::new(offset as u64)
}

fn first_of_next_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1)
        .expect("day 1 is always valid")
        .checked_add_months(Months::new(1))
        .expect("date within chrono range")
}

fn days_in_month(date: NaiveDate) -> u32 {
    let first = date.with_day(1).expect("day 1 is always valid");
    let next = first_of_next_month(first);
    next.pred_opt().expect("not at date range minimum").day()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_daily_is_base_date() {
        let d = date(2024, 3, 5);
        assert_eq!(next_execution_date(d, d, Frequency::Daily, None, None), d);
    }

    #[test]
    fn test_base_clamped_to_today() {
        let past = date(2023, 12, 1);
        let today = date(2024, 1, 10);
        assert_eq!(
            next_execution_date(past, today, Frequency::Daily, None, None),
            today
        );
    }

    #[test]
    fn test_weekly_next_occurrence() {
        // 2024-01-15 is a Monday; next Wednesday (3) is the 17th
        let today = date(2024, 1, 15);
        assert_eq!(
            next_execution_date(today, today, Frequency::Weekly, Some(3), None),
            date(2024, 1, 17)
        );
    }

    #[test]
    fn test_weekly_same_day_fires_same_day() {
        // Monday anchored to Monday
        let today = date(2024, 1, 15);
        assert_eq!(
            next_execution_date(today, today, Frequency::Weekly, Some(1), None),
            today
        );
    }

    #[test]
    fn test_weekly_wraps_to_next_week() {
        // Friday 2024-01-19 anchored to Tuesday (2) -> 2024-01-23
        let today = date(2024, 1, 19);
        assert_eq!(
            next_execution_date(today, today, Frequency::Weekly, Some(2), None),
            date(2024, 1, 23)
        );
    }

    #[test]
    fn test_weekly_defaults_to_base_weekday() {
        let today = date(2024, 1, 15);
        assert_eq!(
            next_execution_date(today, today, Frequency::Weekly, None, None),
            today
        );
    }

    #[test]
    fn test_biweekly_is_weekly_plus_seven() {
        let today = date(2024, 1, 15);
        assert_eq!(
            next_execution_date(today, today, Frequency::Biweekly, Some(3), None),
            date(2024, 1, 24)
        );
    }

    #[test]
    fn test_monthly_leap_year_clamp() {
        // Anchor day 31 from Jan 31 rolls into February, clamped to the 29th
        let today = date(2024, 1, 31);
        assert_eq!(
            next_execution_date(today, today, Frequency::Monthly, None, Some(31)),
            date(2024, 2, 29)
        );
    }

    #[test]
    fn test_monthly_non_leap_clamp() {
        let today = date(2023, 1, 31);
        assert_eq!(
            next_execution_date(today, today, Frequency::Monthly, None, Some(31)),
            date(2023, 2, 28)
        );
    }

    #[test]
    fn test_monthly_later_this_month() {
        let today = date(2024, 1, 15);
        assert_eq!(
            next_execution_date(today, today, Frequency::Monthly, None, Some(31)),
            date(2024, 1, 31)
        );
    }

    #[test]
    fn test_monthly_anchor_reached_rolls_over() {
        let today = date(2024, 3, 15);
        assert_eq!(
            next_execution_date(today, today, Frequency::Monthly, None, Some(15)),
            date(2024, 4, 15)
        );
    }

    #[test]
    fn test_monthly_default_anchor_caps_at_28() {
        // Created on the 30th with no anchor: default anchor is min(30, 28)
        let today = date(2024, 1, 30);
        assert_eq!(
            next_execution_date(today, today, Frequency::Monthly, None, None),
            date(2024, 2, 28)
        );
    }

    #[test]
    fn test_quarterly_stride() {
        let today = date(2024, 1, 15);
        assert_eq!(
            next_execution_date(today, today, Frequency::Quarterly, None, Some(15)),
            date(2024, 4, 15)
        );
    }

    #[test]
    fn test_quarterly_clamps_to_28() {
        // Anchor 31 clamps to 28 so the November->February hop stays valid
        let today = date(2023, 11, 30);
        assert_eq!(
            next_execution_date(today, today, Frequency::Quarterly, None, Some(31)),
            date(2024, 2, 28)
        );
    }

    #[test]
    fn test_quarterly_default_anchor_is_first() {
        let today = date(2024, 2, 10);
        assert_eq!(
            next_execution_date(today, today, Frequency::Quarterly, None, None),
            date(2024, 5, 1)
        );
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(date(2024, 2, 10)), 29);
        assert_eq!(days_in_month(date(2023, 2, 10)), 28);
        assert_eq!(days_in_month(date(2024, 4, 1)), 30);
        assert_eq!(days_in_month(date(2024, 12, 31)), 31);
    }
}
