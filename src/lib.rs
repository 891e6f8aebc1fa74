//! Payroll Service
//!
//! This crate provides the payroll computation core for a time-tracking
//! application: it turns clock-in/clock-out records plus overtime approvals
//! into hours, pay and deductions, generates de-duplicated payslips per
//! period, and supports reporting and manual payslip correction.
//!
//! The HTTP layer, authentication and the relational schema live in other
//! services; this crate only consumes time entries and user profiles through
//! the [`PayrollRepository`] trait and produces payroll results.

pub mod calculator;
pub mod config;
pub mod models;
pub mod period;
pub mod repository;
pub mod service;

pub use calculator::calculate;
pub use config::PayrollConfig;
pub use models::{
    PayrollResult, Payslip, PayslipReportRow, PayslipStatus, PayslipUpdate, TimeEntry, UserProfile,
};
pub use period::PeriodSpec;
pub use repository::{InMemoryRepository, PayrollRepository};
pub use service::PayrollService;
