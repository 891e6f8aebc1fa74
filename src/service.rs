//! Payroll service.
//!
//! Business operations on top of the calculator and the repository:
//! per-period payslip generation, reporting, manual correction and release.

use anyhow::Result;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::calculator::calculate;
use crate::config::PayrollConfig;
use crate::models::{
    PayrollResult, Payslip, PayslipReportRow, PayslipStatus, PayslipUpdate, UserProfile,
};
use crate::period::PeriodSpec;
use crate::repository::{PayrollRepository, RepositoryError};

/// Service errors
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("User {user_id} has no profile record")]
    UserNotFound { user_id: i64 },

    #[error("Payslip not found: {0}")]
    PayslipNotFound(i64),

    #[error("Repository error: {0}")]
    RepositoryError(String),
}

/// Payroll service for generation, reporting and correction
pub struct PayrollService<R> {
    repository: R,
    config: PayrollConfig,
}

impl<R: PayrollRepository> PayrollService<R> {
    pub fn new(repository: R, config: PayrollConfig) -> Self {
        Self { repository, config }
    }

    pub fn config(&self) -> &PayrollConfig {
        &self.config
    }

    /// Compute one user's payroll for a period without persisting anything.
    ///
    /// A missing profile is a hard error; a user with no closed entries in
    /// the period yields `Ok(None)`.
    pub async fn calculate_for_user(
        &self,
        user_id: i64,
        period: &PeriodSpec,
    ) -> Result<Option<PayrollResult>, ServiceError> {
        let user = self
            .repository
            .find_user(user_id)
            .await
            .map_err(|e| ServiceError::RepositoryError(e.to_string()))?
            .ok_or(ServiceError::UserNotFound { user_id })?;

        let entries = self
            .repository
            .find_entries_in_period(user_id, period)
            .await
            .map_err(|e| ServiceError::RepositoryError(e.to_string()))?;

        Ok(calculate(&entries, user.staff_house, period, &self.config))
    }

    /// Generate payslips for every eligible user in the period, optionally
    /// restricted to a subset of user ids.
    ///
    /// Generation is idempotent per user: a payslip that already exists for
    /// the (user, period) key is skipped, never overwritten. One user's
    /// failure does not abort the rest of the batch. Returns only the newly
    /// created payslips.
    pub async fn generate(
        &self,
        period: &PeriodSpec,
        user_ids: Option<&[i64]>,
    ) -> Result<Vec<Payslip>, ServiceError> {
        let Some((period_start, period_end)) = period.bounds() else {
            return Ok(Vec::new());
        };

        let users = self
            .repository
            .active_users_in_period(period)
            .await
            .map_err(|e| ServiceError::RepositoryError(e.to_string()))?;

        let mut created = Vec::new();
        for user in users {
            if let Some(ids) = user_ids {
                if !ids.contains(&user.id) {
                    continue;
                }
            }

            match self.generate_for_user(&user, period).await {
                Ok(Some(payslip)) => created.push(payslip),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!("Payroll generation failed for user {}: {}", user.id, e);
                }
            }
        }

        tracing::info!(
            "Generated {} payslips for {}..{}",
            created.len(),
            period_start,
            period_end
        );
        Ok(created)
    }

    async fn generate_for_user(
        &self,
        user: &UserProfile,
        period: &PeriodSpec,
    ) -> Result<Option<Payslip>> {
        let Some((period_start, period_end)) = period.bounds() else {
            return Ok(None);
        };

        let entries = self
            .repository
            .find_entries_in_period(user.id, period)
            .await?;

        let Some(result) = calculate(&entries, user.staff_house, period, &self.config) else {
            return Ok(None);
        };
        if result.total_hours <= Decimal::ZERO {
            return Ok(None);
        }

        if self
            .repository
            .find_payslip(user.id, period_start, period_end)
            .await?
            .is_some()
        {
            tracing::debug!(
                "Payslip already exists for user {} over {}..{}",
                user.id,
                period_start,
                period_end
            );
            return Ok(None);
        }

        let payslip = Payslip::new(user.id, period_start, period_end, result);
        match self.repository.insert_payslip(&payslip).await {
            Ok(inserted) => Ok(Some(inserted)),
            Err(e)
                if matches!(
                    e.downcast_ref::<RepositoryError>(),
                    Some(RepositoryError::DuplicateEntry { .. })
                ) =>
            {
                // Lost the insert race to a concurrent run; the payslip is
                // already generated, which is not a failure.
                tracing::debug!(
                    "Concurrent generation already inserted payslip for user {}",
                    user.id
                );
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Payslips for the period bounds, joined with username and department,
    /// ordered by department then username.
    pub async fn report(&self, period: &PeriodSpec) -> Result<Vec<PayslipReportRow>, ServiceError> {
        let Some((period_start, period_end)) = period.bounds() else {
            return Ok(Vec::new());
        };

        self.repository
            .payslips_for_period(period_start, period_end)
            .await
            .map_err(|e| ServiceError::RepositoryError(e.to_string()))
    }

    /// Overwrite the editable fields of one payslip.
    ///
    /// The stored total is always recomputed from the submitted components;
    /// the edit does not re-derive anything from the underlying time
    /// entries, so corrections and raw entries may diverge by design.
    pub async fn edit_payslip(
        &self,
        payslip_id: i64,
        fields: PayslipUpdate,
    ) -> Result<(), ServiceError> {
        let total_salary = fields.recomputed_total();
        self.repository
            .update_payslip_fields(payslip_id, &fields, total_salary)
            .await
            .map_err(|e| Self::map_payslip_error(e, payslip_id))
    }

    /// Release a payslip to its owner. One-way; releasing an already
    /// released payslip leaves it released.
    pub async fn release_payslip(&self, payslip_id: i64) -> Result<Payslip, ServiceError> {
        self.repository
            .set_payslip_status(payslip_id, PayslipStatus::Released)
            .await
            .map_err(|e| Self::map_payslip_error(e, payslip_id))
    }

    fn map_payslip_error(e: anyhow::Error, payslip_id: i64) -> ServiceError {
        match e.downcast_ref::<RepositoryError>() {
            Some(RepositoryError::NotFound(_)) => ServiceError::PayslipNotFound(payslip_id),
            _ => ServiceError::RepositoryError(e.to_string()),
        }
    }
}
