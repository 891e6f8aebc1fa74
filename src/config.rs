//! Payroll configuration.
//!
//! Pay rates and shift boundaries are configuration values, not business
//! rules baked into the calculator. Defaults match the rates the company
//! currently runs with.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Payroll service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayrollConfig {
    /// Base pay per worked hour
    pub hourly_rate: Decimal,

    /// Pay per approved overtime hour
    pub overtime_rate: Decimal,

    /// Staff-house deduction for a full calendar week
    pub staff_house_weekly: Decimal,

    /// Nominal workweek length, used to prorate the staff-house deduction
    pub workweek_days: u32,

    /// Shift start; clocking in later accrues undertime
    pub shift_start: NaiveTime,

    /// Nominal shift end
    pub shift_end: NaiveTime,

    /// Grace period after shift end before overtime starts counting
    pub overtime_grace_mins: i64,
}

impl Default for PayrollConfig {
    fn default() -> Self {
        Self {
            hourly_rate: dec!(25),
            overtime_rate: dec!(35),
            staff_house_weekly: dec!(250),
            workweek_days: 5,
            shift_start: NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
            shift_end: NaiveTime::from_hms_opt(15, 30, 0).unwrap(),
            overtime_grace_mins: 30,
        }
    }
}

impl PayrollConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(rate) = std::env::var("PAYROLL_HOURLY_RATE") {
            if let Ok(d) = Decimal::from_str(&rate) {
                config.hourly_rate = d;
            }
        }

        if let Ok(rate) = std::env::var("PAYROLL_OVERTIME_RATE") {
            if let Ok(d) = Decimal::from_str(&rate) {
                config.overtime_rate = d;
            }
        }

        if let Ok(amount) = std::env::var("PAYROLL_STAFF_HOUSE_WEEKLY") {
            if let Ok(d) = Decimal::from_str(&amount) {
                config.staff_house_weekly = d;
            }
        }

        if let Ok(days) = std::env::var("PAYROLL_WORKWEEK_DAYS") {
            if let Ok(n) = days.parse() {
                config.workweek_days = n;
            }
        }

        if let Ok(time) = std::env::var("PAYROLL_SHIFT_START") {
            if let Ok(t) = NaiveTime::parse_from_str(&time, "%H:%M:%S") {
                config.shift_start = t;
            }
        }

        if let Ok(time) = std::env::var("PAYROLL_SHIFT_END") {
            if let Ok(t) = NaiveTime::parse_from_str(&time, "%H:%M:%S") {
                config.shift_end = t;
            }
        }

        if let Ok(mins) = std::env::var("PAYROLL_OVERTIME_GRACE_MINS") {
            if let Ok(n) = mins.parse() {
                config.overtime_grace_mins = n;
            }
        }

        config
    }

    /// Shift start boundary on a given date
    pub fn shift_start_on(&self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(self.shift_start)
    }

    /// Nominal shift end boundary on a given date
    pub fn shift_end_on(&self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(self.shift_end)
    }

    /// The moment overtime starts counting on a given date (shift end plus grace)
    pub fn overtime_start_on(&self, date: NaiveDate) -> NaiveDateTime {
        self.shift_end_on(date) + Duration::minutes(self.overtime_grace_mins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PayrollConfig::default();
        assert_eq!(config.hourly_rate, dec!(25));
        assert_eq!(config.overtime_rate, dec!(35));
        assert_eq!(config.staff_house_weekly, dec!(250));
        assert_eq!(config.workweek_days, 5);
        assert_eq!(config.shift_start, NaiveTime::from_hms_opt(7, 0, 0).unwrap());
        assert_eq!(config.shift_end, NaiveTime::from_hms_opt(15, 30, 0).unwrap());
    }

    #[test]
    fn test_overtime_start_is_shift_end_plus_grace() {
        let config = PayrollConfig::default();
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let expected = date.and_time(NaiveTime::from_hms_opt(16, 0, 0).unwrap());
        assert_eq!(config.overtime_start_on(date), expected);
    }
}
