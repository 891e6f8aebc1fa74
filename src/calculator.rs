//! Payroll calculator.
//!
//! A pure pass over one user's time entries for one period. No storage, no
//! side effects, safe to run per-user in parallel.
//!
//! Two policy asymmetries are intentional and must not be "fixed":
//! clocking in late always accrues undertime, but clocking out late only
//! pays overtime when the entry carries an approved overtime request.
//! Unapproved late hours are absorbed into total hours at the base rate.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use crate::config::PayrollConfig;
use crate::models::{hours_from, PayrollResult, TimeEntry};
use crate::period::PeriodSpec;

/// Compute a payroll result from one user's entries in a period.
///
/// Entries without a clock-out are open sessions and contribute nothing;
/// returns None when no closed entry exists (the "no data" signal, distinct
/// from a missing user).
pub fn calculate(
    entries: &[TimeEntry],
    staff_house: bool,
    period: &PeriodSpec,
    config: &PayrollConfig,
) -> Option<PayrollResult> {
    let mut closed: Vec<&TimeEntry> = entries.iter().filter(|e| e.clock_out.is_some()).collect();
    closed.sort_by_key(|e| e.clock_in);

    let mut total_hours = Decimal::ZERO;
    let mut overtime_hours = Decimal::ZERO;
    let mut undertime_hours = Decimal::ZERO;
    let mut last_clock_out: Option<NaiveDateTime> = None;

    for entry in &closed {
        let Some(clock_out) = entry.clock_out else {
            continue;
        };
        let date = entry.clock_in.date();

        // Sessions are credited in whole hours, truncated: the standard
        // 07:00-15:30 day pays as eight hours. Undertime and overtime below
        // keep minute precision. The full credited hours always land in the
        // base bucket, even when part of them also counts as overtime.
        let worked = clock_out.signed_duration_since(entry.clock_in);
        total_hours += Decimal::from(worked.num_hours());

        let shift_start = config.shift_start_on(date);
        if entry.clock_in > shift_start {
            undertime_hours += hours_from(entry.clock_in.signed_duration_since(shift_start));
        }

        if entry.overtime_granted() {
            let shift_end = config.shift_end_on(date);
            if clock_out > shift_end {
                let overtime_start = config.overtime_start_on(date);
                // Clock-outs inside the grace window land before the
                // overtime boundary; never count negative overtime.
                let extra = hours_from(clock_out.signed_duration_since(overtime_start));
                if extra > Decimal::ZERO {
                    overtime_hours += extra;
                }
            }
        }

        last_clock_out = Some(match last_clock_out {
            Some(latest) if latest >= clock_out => latest,
            _ => clock_out,
        });
    }

    // Sorted by clock_in, so the first closed entry holds the period minimum.
    let clock_in_time = closed.first().map(|e| e.clock_in)?;
    let clock_out_time = last_clock_out?;

    let base_salary = (total_hours * config.hourly_rate).round_dp(2);
    let overtime_pay = (overtime_hours * config.overtime_rate).round_dp(2);
    let undertime_deduction = (undertime_hours * config.hourly_rate).round_dp(2);
    let staff_house_deduction = if staff_house {
        staff_house_for(period, config)
    } else {
        Decimal::ZERO
    };
    let total_salary = base_salary + overtime_pay - undertime_deduction - staff_house_deduction;

    Some(PayrollResult {
        total_hours: total_hours.round_dp(2),
        overtime_hours: overtime_hours.round_dp(2),
        undertime_hours: undertime_hours.round_dp(2),
        base_salary,
        overtime_pay,
        undertime_deduction,
        staff_house_deduction,
        total_salary,
        clock_in_time,
        clock_out_time,
    })
}

/// Staff-house deduction for the period: flat for a calendar week, prorated
/// by charged day count over the nominal workweek otherwise. A sparse
/// day-set charges per selected day, not per calendar span.
fn staff_house_for(period: &PeriodSpec, config: &PayrollConfig) -> Decimal {
    match period {
        PeriodSpec::Week { .. } => config.staff_house_weekly,
        _ => {
            let days = Decimal::from(period.day_count());
            let workweek = Decimal::from(config.workweek_days);
            (config.staff_house_weekly * days / workweek).round_dp(2)
        }
    }
}
