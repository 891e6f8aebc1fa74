//! Payroll repository.
//!
//! Storage operations the payroll core needs from the time-entry store and
//! the payslip table. The in-memory implementation backs the unit tests and
//! local development; a database-backed implementation lives with the
//! persistence service.

use anyhow::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::{
    Payslip, PayslipReportRow, PayslipStatus, PayslipUpdate, TimeEntry, UserProfile,
};
use crate::period::PeriodSpec;

/// Repository errors
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Payslip not found: {0}")]
    NotFound(i64),

    #[error("Duplicate payslip for user {user_id} over {period_start}..{period_end}")]
    DuplicateEntry {
        user_id: i64,
        period_start: NaiveDate,
        period_end: NaiveDate,
    },

    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// Storage operations for payroll generation and reporting
#[allow(async_fn_in_trait)]
pub trait PayrollRepository: Send + Sync {
    /// Look up one user's payroll profile
    async fn find_user(&self, user_id: i64) -> Result<Option<UserProfile>>;

    /// Active users with at least one time entry dated inside the period
    async fn active_users_in_period(&self, period: &PeriodSpec) -> Result<Vec<UserProfile>>;

    /// One user's time entries whose date falls inside the period
    async fn find_entries_in_period(
        &self,
        user_id: i64,
        period: &PeriodSpec,
    ) -> Result<Vec<TimeEntry>>;

    /// Find an existing payslip by its dedup key
    async fn find_payslip(
        &self,
        user_id: i64,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> Result<Option<Payslip>>;

    /// Insert a payslip. The (user_id, period_start, period_end) key is
    /// unique; inserting an existing key fails with
    /// [`RepositoryError::DuplicateEntry`] instead of overwriting.
    async fn insert_payslip(&self, payslip: &Payslip) -> Result<Payslip>;

    /// Overwrite the editable fields of one payslip, including the
    /// server-side recomputed total
    async fn update_payslip_fields(
        &self,
        payslip_id: i64,
        fields: &PayslipUpdate,
        total_salary: Decimal,
    ) -> Result<()>;

    /// Payslips for a period joined with username and department, ordered
    /// by department then username
    async fn payslips_for_period(
        &self,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> Result<Vec<PayslipReportRow>>;

    /// Set a payslip's release status
    async fn set_payslip_status(&self, payslip_id: i64, status: PayslipStatus) -> Result<Payslip>;
}

/// In-memory repository for testing and development
pub struct InMemoryRepository {
    users: std::sync::RwLock<Vec<UserProfile>>,
    entries: std::sync::RwLock<Vec<TimeEntry>>,
    payslips: std::sync::RwLock<Vec<Payslip>>,
    next_entry_id: std::sync::atomic::AtomicI64,
    next_payslip_id: std::sync::atomic::AtomicI64,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self {
            users: std::sync::RwLock::new(Vec::new()),
            entries: std::sync::RwLock::new(Vec::new()),
            payslips: std::sync::RwLock::new(Vec::new()),
            next_entry_id: std::sync::atomic::AtomicI64::new(1),
            next_payslip_id: std::sync::atomic::AtomicI64::new(1),
        }
    }

    /// Seed a user profile
    pub fn add_user(&self, user: UserProfile) {
        self.users.write().unwrap().push(user);
    }

    /// Seed a time entry, assigning it an id
    pub fn add_entry(&self, entry: TimeEntry) -> TimeEntry {
        let mut entries = self.entries.write().unwrap();
        let mut new_entry = entry;
        new_entry.id = Some(
            self.next_entry_id
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst),
        );
        entries.push(new_entry.clone());
        new_entry
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl PayrollRepository for InMemoryRepository {
    async fn find_user(&self, user_id: i64) -> Result<Option<UserProfile>> {
        let users = self.users.read().unwrap();
        Ok(users.iter().find(|u| u.id == user_id).cloned())
    }

    async fn active_users_in_period(&self, period: &PeriodSpec) -> Result<Vec<UserProfile>> {
        let users = self.users.read().unwrap();
        let entries = self.entries.read().unwrap();
        Ok(users
            .iter()
            .filter(|u| {
                u.active
                    && entries
                        .iter()
                        .any(|e| e.user_id == u.id && period.contains(e.date))
            })
            .cloned()
            .collect())
    }

    async fn find_entries_in_period(
        &self,
        user_id: i64,
        period: &PeriodSpec,
    ) -> Result<Vec<TimeEntry>> {
        let entries = self.entries.read().unwrap();
        Ok(entries
            .iter()
            .filter(|e| e.user_id == user_id && period.contains(e.date))
            .cloned()
            .collect())
    }

    async fn find_payslip(
        &self,
        user_id: i64,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> Result<Option<Payslip>> {
        let payslips = self.payslips.read().unwrap();
        Ok(payslips
            .iter()
            .find(|p| {
                p.user_id == user_id
                    && p.period_start == period_start
                    && p.period_end == period_end
            })
            .cloned())
    }

    async fn insert_payslip(&self, payslip: &Payslip) -> Result<Payslip> {
        // Uniqueness check and insert happen under one write lock, so two
        // concurrent generation runs cannot both insert the same key.
        let mut payslips = self.payslips.write().unwrap();
        let duplicate = payslips.iter().any(|p| {
            p.user_id == payslip.user_id
                && p.period_start == payslip.period_start
                && p.period_end == payslip.period_end
        });
        if duplicate {
            return Err(RepositoryError::DuplicateEntry {
                user_id: payslip.user_id,
                period_start: payslip.period_start,
                period_end: payslip.period_end,
            }
            .into());
        }

        let mut new_payslip = payslip.clone();
        new_payslip.id = Some(
            self.next_payslip_id
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst),
        );
        new_payslip.created_at = Some(chrono::Utc::now());
        new_payslip.updated_at = Some(chrono::Utc::now());
        payslips.push(new_payslip.clone());
        Ok(new_payslip)
    }

    async fn update_payslip_fields(
        &self,
        payslip_id: i64,
        fields: &PayslipUpdate,
        total_salary: Decimal,
    ) -> Result<()> {
        let mut payslips = self.payslips.write().unwrap();
        let Some(existing) = payslips.iter_mut().find(|p| p.id == Some(payslip_id)) else {
            return Err(RepositoryError::NotFound(payslip_id).into());
        };

        existing.result.clock_in_time = fields.clock_in_time;
        existing.result.clock_out_time = fields.clock_out_time;
        existing.result.total_hours = fields.total_hours;
        existing.result.overtime_hours = fields.overtime_hours;
        existing.result.undertime_hours = fields.undertime_hours;
        existing.result.base_salary = fields.base_salary;
        existing.result.overtime_pay = fields.overtime_pay;
        existing.result.undertime_deduction = fields.undertime_deduction;
        existing.result.staff_house_deduction = fields.staff_house_deduction;
        existing.result.total_salary = total_salary;
        existing.updated_at = Some(chrono::Utc::now());
        Ok(())
    }

    async fn payslips_for_period(
        &self,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> Result<Vec<PayslipReportRow>> {
        let payslips = self.payslips.read().unwrap();
        let users = self.users.read().unwrap();

        let mut rows: Vec<PayslipReportRow> = payslips
            .iter()
            .filter(|p| p.period_start == period_start && p.period_end == period_end)
            .map(|p| {
                let profile = users.iter().find(|u| u.id == p.user_id);
                PayslipReportRow {
                    payslip: p.clone(),
                    username: profile.map(|u| u.username.clone()).unwrap_or_default(),
                    department: profile.map(|u| u.department.clone()).unwrap_or_default(),
                }
            })
            .collect();

        rows.sort_by(|a, b| {
            (a.department.as_str(), a.username.as_str())
                .cmp(&(b.department.as_str(), b.username.as_str()))
        });
        Ok(rows)
    }

    async fn set_payslip_status(&self, payslip_id: i64, status: PayslipStatus) -> Result<Payslip> {
        let mut payslips = self.payslips.write().unwrap();
        let Some(existing) = payslips.iter_mut().find(|p| p.id == Some(payslip_id)) else {
            return Err(RepositoryError::NotFound(payslip_id).into());
        };
        existing.status = status;
        existing.updated_at = Some(chrono::Utc::now());
        Ok(existing.clone())
    }
}
