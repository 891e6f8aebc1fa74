//! Payroll periods.
//!
//! The three generation call sites (single week, explicit range, picked
//! days) share one calculation path; the variant only changes the period
//! bounds, membership test and the staff-house proration divisor.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

/// A window over which payroll is aggregated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PeriodSpec {
    /// A fixed 7-day window starting at `start`
    Week { start: NaiveDate },
    /// An inclusive date range
    Range { start: NaiveDate, end: NaiveDate },
    /// An arbitrary, possibly non-contiguous set of dates
    Days {
        #[serde(deserialize_with = "sorted_dates")]
        dates: Vec<NaiveDate>,
    },
}

/// Selected dates arrive from clients in arbitrary order, possibly with
/// repeats; normalize on the way in so day counts stay honest.
fn sorted_dates<'de, D>(deserializer: D) -> Result<Vec<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let mut dates = Vec::<NaiveDate>::deserialize(deserializer)?;
    dates.sort();
    dates.dedup();
    Ok(dates)
}

impl PeriodSpec {
    pub fn week(start: NaiveDate) -> Self {
        Self::Week { start }
    }

    pub fn range(start: NaiveDate, end: NaiveDate) -> Self {
        Self::Range { start, end }
    }

    /// Build a day-set period. The dates are sorted and de-duplicated so
    /// bounds and day counts are stable regardless of selection order.
    pub fn days(mut dates: Vec<NaiveDate>) -> Self {
        dates.sort();
        dates.dedup();
        Self::Days { dates }
    }

    /// First and last date of the period, used as the payslip dedup key.
    ///
    /// For a day-set these are the min/max of the selected dates; the span
    /// between them is not necessarily fully covered. An empty day-set has
    /// no bounds.
    pub fn bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        match self {
            Self::Week { start } => Some((*start, *start + Duration::days(6))),
            Self::Range { start, end } => Some((*start, *end)),
            // Min/max rather than first/last: correct even for a Days
            // variant built directly without the normalizing constructor
            Self::Days { dates } => {
                let first = *dates.iter().min()?;
                let last = *dates.iter().max()?;
                Some((first, last))
            }
        }
    }

    /// Whether a calendar date falls inside the period.
    pub fn contains(&self, date: NaiveDate) -> bool {
        match self {
            Self::Week { start } => date >= *start && date <= *start + Duration::days(6),
            Self::Range { start, end } => date >= *start && date <= *end,
            Self::Days { dates } => dates.contains(&date),
        }
    }

    /// Number of days the period charges for.
    ///
    /// A day-set counts selected dates, not the calendar span between them.
    pub fn day_count(&self) -> i64 {
        match self {
            Self::Week { .. } => 7,
            Self::Range { start, end } => (*end - *start).num_days() + 1,
            Self::Days { dates } => dates.len() as i64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_week_bounds_and_membership() {
        let period = PeriodSpec::week(date("2024-01-15"));

        assert_eq!(period.bounds(), Some((date("2024-01-15"), date("2024-01-21"))));
        assert!(period.contains(date("2024-01-15")));
        assert!(period.contains(date("2024-01-21")));
        assert!(!period.contains(date("2024-01-22")));
        assert_eq!(period.day_count(), 7);
    }

    #[test]
    fn test_range_day_count_is_inclusive() {
        let period = PeriodSpec::range(date("2024-01-15"), date("2024-01-17"));
        assert_eq!(period.day_count(), 3);
        assert!(period.contains(date("2024-01-16")));
        assert!(!period.contains(date("2024-01-18")));
    }

    #[test]
    fn test_day_set_counts_selected_dates_not_span() {
        // Monday, Wednesday, Friday: span is 5 days but only 3 are selected
        let period = PeriodSpec::days(vec![
            date("2024-01-19"),
            date("2024-01-15"),
            date("2024-01-17"),
        ]);

        assert_eq!(period.bounds(), Some((date("2024-01-15"), date("2024-01-19"))));
        assert_eq!(period.day_count(), 3);
        assert!(period.contains(date("2024-01-17")));
        assert!(!period.contains(date("2024-01-16")));
    }

    #[test]
    fn test_day_set_dedups() {
        let period = PeriodSpec::days(vec![date("2024-01-15"), date("2024-01-15")]);
        assert_eq!(period.day_count(), 1);
    }

    #[test]
    fn test_deserialized_day_set_is_normalized() {
        let period: PeriodSpec = serde_json::from_str(
            r#"{"kind":"days","dates":["2024-01-19","2024-01-15","2024-01-17","2024-01-15"]}"#,
        )
        .unwrap();

        assert!(period.contains(date("2024-01-19")));
        assert!(period.contains(date("2024-01-15")));
        assert!(!period.contains(date("2024-01-16")));
        assert_eq!(period.bounds(), Some((date("2024-01-15"), date("2024-01-19"))));
        assert_eq!(period.day_count(), 3);
    }

    #[test]
    fn test_directly_built_day_set_ignores_ordering() {
        let period = PeriodSpec::Days {
            dates: vec![date("2024-01-19"), date("2024-01-15"), date("2024-01-17")],
        };

        assert!(period.contains(date("2024-01-19")));
        assert_eq!(period.bounds(), Some((date("2024-01-15"), date("2024-01-19"))));
    }

    #[test]
    fn test_empty_day_set_has_no_bounds() {
        let period = PeriodSpec::days(vec![]);
        assert_eq!(period.bounds(), None);
        assert_eq!(period.day_count(), 0);
    }
}
