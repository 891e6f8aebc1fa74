//! Payroll domain models.
//!
//! Time entries and user profiles are owned by the time-tracking side of the
//! system; this crate reads them and produces payroll results and payslips.

use chrono::{Duration, NaiveDate, NaiveDateTime, Weekday};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Fixed timestamp codec used for persisted clock times.
///
/// Stored data uses local-time `YYYY-MM-DD HH:MM:SS` strings with no offset;
/// the format has to survive round trips unchanged.
pub mod timestamp {
    use chrono::NaiveDateTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&s, FORMAT).map_err(serde::de::Error::custom)
    }
}

/// Convert a duration to fractional hours.
pub(crate) fn hours_from(duration: Duration) -> Decimal {
    Decimal::from(duration.num_seconds()) / dec!(3600)
}

/// One work session for one user: a clock-in with an optional clock-out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeEntry {
    pub id: Option<i64>,
    pub user_id: i64,
    #[serde(with = "timestamp")]
    pub clock_in: NaiveDateTime,
    /// None while the session is still open
    pub clock_out: Option<NaiveDateTime>,
    pub overtime_requested: bool,
    pub overtime_note: Option<String>,
    /// None = pending, Some(true) = approved, Some(false) = rejected
    pub overtime_approved: Option<bool>,
    pub overtime_approved_by: Option<i64>,
    pub date: NaiveDate,
    pub week_start: NaiveDate,
}

impl TimeEntry {
    /// Create a new entry at clock-in time. The calendar date and the
    /// Monday week anchor are derived from the clock-in timestamp.
    pub fn new(user_id: i64, clock_in: NaiveDateTime) -> Self {
        let date = clock_in.date();
        Self {
            id: None,
            user_id,
            clock_in,
            clock_out: None,
            overtime_requested: false,
            overtime_note: None,
            overtime_approved: None,
            overtime_approved_by: None,
            date,
            week_start: date.week(Weekday::Mon).first_day(),
        }
    }

    /// Raw session length in fractional hours, or None while the session is
    /// still open. Payroll credits sessions in whole hours; see the
    /// calculator.
    pub fn worked_hours(&self) -> Option<Decimal> {
        self.clock_out
            .map(|out| hours_from(out.signed_duration_since(self.clock_in)))
    }

    /// Overtime only counts when it was both requested and approved.
    pub fn overtime_granted(&self) -> bool {
        self.overtime_requested && self.overtime_approved == Some(true)
    }
}

/// Payroll-relevant subset of a user record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub department: String,
    /// Triggers the periodic housing deduction
    pub staff_house: bool,
    /// Inactive users produce no payroll
    pub active: bool,
}

/// The outcome of one calculation pass for one user over one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollResult {
    pub total_hours: Decimal,
    pub overtime_hours: Decimal,
    pub undertime_hours: Decimal,
    pub base_salary: Decimal,
    pub overtime_pay: Decimal,
    pub undertime_deduction: Decimal,
    pub staff_house_deduction: Decimal,
    /// base + overtime - undertime - staff house; deliberately not clamped,
    /// heavy deductions can drive it negative
    pub total_salary: Decimal,
    /// Earliest clock-in across the whole period
    #[serde(with = "timestamp")]
    pub clock_in_time: NaiveDateTime,
    /// Latest clock-out across the whole period
    #[serde(with = "timestamp")]
    pub clock_out_time: NaiveDateTime,
}

/// Release state of a payslip. Releasing is one-way; there is no path back
/// to pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayslipStatus {
    Pending,
    Released,
}

/// A persisted payroll result for one user and period.
///
/// At most one payslip exists per (user_id, period_start, period_end);
/// generation skips instead of overwriting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payslip {
    pub id: Option<i64>,
    pub user_id: i64,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    #[serde(flatten)]
    pub result: PayrollResult,
    pub status: PayslipStatus,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Payslip {
    /// Build a pending payslip from a calculation result.
    pub fn new(user_id: i64, period_start: NaiveDate, period_end: NaiveDate, result: PayrollResult) -> Self {
        Self {
            id: None,
            user_id,
            period_start,
            period_end,
            result,
            status: PayslipStatus::Pending,
            created_at: None,
            updated_at: None,
        }
    }
}

/// Full replacement set for a manual payslip correction.
///
/// There is deliberately no total_salary field: the stored total is always
/// recomputed from the submitted components, never taken from the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayslipUpdate {
    #[serde(with = "timestamp")]
    pub clock_in_time: NaiveDateTime,
    #[serde(with = "timestamp")]
    pub clock_out_time: NaiveDateTime,
    pub total_hours: Decimal,
    pub overtime_hours: Decimal,
    pub undertime_hours: Decimal,
    pub base_salary: Decimal,
    pub overtime_pay: Decimal,
    pub undertime_deduction: Decimal,
    pub staff_house_deduction: Decimal,
}

impl PayslipUpdate {
    /// Total salary derived from the submitted components.
    pub fn recomputed_total(&self) -> Decimal {
        (self.base_salary + self.overtime_pay - self.undertime_deduction
            - self.staff_house_deduction)
            .round_dp(2)
    }
}

/// One row of the payroll report: a payslip joined with its owner's
/// username and department.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayslipReportRow {
    pub payslip: Payslip,
    pub username: String,
    pub department: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn datetime(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_worked_hours() {
        let mut entry = TimeEntry::new(1, datetime("2024-01-15 07:00:00"));
        entry.clock_out = Some(datetime("2024-01-15 15:30:00"));

        assert_eq!(entry.worked_hours(), Some(dec!(8.5)));
    }

    #[test]
    fn test_worked_hours_open_entry() {
        let entry = TimeEntry::new(1, datetime("2024-01-15 07:00:00"));
        assert!(entry.worked_hours().is_none());
    }

    #[test]
    fn test_week_start_is_monday() {
        // 2024-01-17 is a Wednesday
        let entry = TimeEntry::new(1, datetime("2024-01-17 07:00:00"));
        assert_eq!(entry.date, NaiveDate::from_ymd_opt(2024, 1, 17).unwrap());
        assert_eq!(entry.week_start, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    }

    #[test]
    fn test_overtime_granted_requires_request_and_approval() {
        let mut entry = TimeEntry::new(1, datetime("2024-01-15 07:00:00"));
        assert!(!entry.overtime_granted());

        entry.overtime_requested = true;
        assert!(!entry.overtime_granted());

        entry.overtime_approved = Some(false);
        assert!(!entry.overtime_granted());

        entry.overtime_approved = Some(true);
        assert!(entry.overtime_granted());
    }

    #[test]
    fn test_timestamp_format_round_trip() {
        let mut entry = TimeEntry::new(7, datetime("2024-01-15 07:05:09"));
        entry.clock_out = Some(datetime("2024-01-15 15:30:00"));

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["clock_in"], "2024-01-15 07:05:09");

        let back: TimeEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back.clock_in, entry.clock_in);
    }

    #[test]
    fn test_update_recomputed_total() {
        let update = PayslipUpdate {
            clock_in_time: datetime("2024-01-15 07:00:00"),
            clock_out_time: datetime("2024-01-15 15:30:00"),
            total_hours: dec!(8.0),
            overtime_hours: dec!(0),
            undertime_hours: dec!(0.5),
            base_salary: dec!(200.00),
            overtime_pay: dec!(70.00),
            undertime_deduction: dec!(12.50),
            staff_house_deduction: dec!(150.00),
        };

        assert_eq!(update.recomputed_total(), dec!(107.50));
    }
}
