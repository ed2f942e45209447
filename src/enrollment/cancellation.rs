use std::fmt;

use chrono::NaiveDate;
use tracing::{error, info};

use super::{ClassInfo, Student};
use crate::bff::{BffApi, CancellationReceipt};
use crate::error::{LifecycleError, PainelError};

/// Why the cancel action is not offered for a student.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    OutsideEditPeriod,
    NotProgressive,
    AlreadyCancelled,
    AlreadyRequested,
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenialReason::OutsideEditPeriod => write!(f, "outside the edit period"),
            DenialReason::NotProgressive => write!(f, "progressive certification is disabled"),
            DenialReason::AlreadyCancelled => write!(f, "enrollment is already cancelled"),
            DenialReason::AlreadyRequested => write!(f, "cancellation was already requested"),
        }
    }
}

/// Label shown in the enrollment column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollmentBadge {
    Active,
    Cancelled,
    CancelRequested,
}

impl EnrollmentBadge {
    pub fn for_student(student: &Student) -> Self {
        if !student.is_enrollment_active() {
            EnrollmentBadge::Cancelled
        } else if student.cancel_requested() {
            EnrollmentBadge::CancelRequested
        } else {
            EnrollmentBadge::Active
        }
    }
}

impl fmt::Display for EnrollmentBadge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnrollmentBadge::Active => write!(f, "Matrícula Ativa"),
            EnrollmentBadge::Cancelled => write!(f, "Cancelada"),
            EnrollmentBadge::CancelRequested => write!(f, "Cancelamento Solicitado"),
        }
    }
}

/// Class-level conditions that gate cancellation and activity edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancellationGuard {
    pub within_edit_period: bool,
    pub progressive: bool,
}

impl CancellationGuard {
    pub fn for_class(class: &ClassInfo, today: NaiveDate) -> Self {
        Self {
            within_edit_period: class.edit_period().contains(today),
            progressive: class.enable_certificacao_progressiva,
        }
    }

    /// Class conditions are checked first: outside the window or without
    /// progressive certification nothing is offered, whatever the student's flags.
    pub fn check(&self, student: &Student) -> Result<(), DenialReason> {
        if !self.within_edit_period {
            return Err(DenialReason::OutsideEditPeriod);
        }
        if !self.progressive {
            return Err(DenialReason::NotProgressive);
        }
        if !student.is_enrollment_active() {
            return Err(DenialReason::AlreadyCancelled);
        }
        if student.cancel_requested() {
            return Err(DenialReason::AlreadyRequested);
        }
        Ok(())
    }

    pub fn can_toggle_activity(&self) -> bool {
        self.within_edit_period && self.progressive
    }
}

/// UI-only state of the facilitator's cancellation dialog.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WorkflowState {
    #[default]
    Idle,
    ConfirmPending { student: Student },
    Submitting { enrollment_id: String },
}

/// Drives `Idle → ConfirmPending → Submitting → Idle`.
///
/// A failed request puts the dialog back in `ConfirmPending` so the
/// facilitator can retry or dismiss it; only success closes it.
#[derive(Debug, Default)]
pub struct CancellationWorkflow {
    state: WorkflowState,
}

impl CancellationWorkflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    /// Open the confirmation dialog for `student` if the guard allows it.
    pub fn select(&mut self, student: &Student, guard: &CancellationGuard) -> Result<(), LifecycleError> {
        guard
            .check(student)
            .map_err(LifecycleError::CancellationDenied)?;
        self.state = WorkflowState::ConfirmPending {
            student: student.clone(),
        };
        Ok(())
    }

    pub fn dismiss(&mut self) {
        self.state = WorkflowState::Idle;
    }

    /// Send the cancellation request for the pending student.
    ///
    /// `on_student_update` runs only after the BFF accepted the request.
    pub async fn confirm(
        &mut self,
        api: &impl BffApi,
        on_student_update: impl FnOnce(),
    ) -> Result<CancellationReceipt, PainelError> {
        let WorkflowState::ConfirmPending { student } = std::mem::take(&mut self.state) else {
            return Err(LifecycleError::NothingToConfirm.into());
        };

        self.state = WorkflowState::Submitting {
            enrollment_id: student.enrollment_id.clone(),
        };

        match api.request_enrollment_cancellation(&student.enrollment_id).await {
            Ok(receipt) => {
                info!(enrollment_id = %student.enrollment_id, status = receipt.status, "cancellation requested");
                self.state = WorkflowState::Idle;
                on_student_update();
                Ok(receipt)
            }
            Err(e) => {
                error!(enrollment_id = %student.enrollment_id, error = %e, "cancellation request failed");
                self.state = WorkflowState::ConfirmPending { student };
                Err(e.into())
            }
        }
    }
}
