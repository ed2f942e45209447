use tracing::{error, info};

use crate::bff::{BffApi, Recipient, ResendRequest};
use crate::error::{LifecycleError, PainelError};
use crate::submission::{Submission, SubmissionAction};

/// Two-step confirmation before a submission is cleared for resending.
///
/// A failed delete raises a sticky error flag that stays set until
/// [`dismiss_error`](Self::dismiss_error); there is no automatic retry.
#[derive(Debug, Default)]
pub struct ResubmissionGate {
    confirming: bool,
    error: bool,
}

impl ResubmissionGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_confirming(&self) -> bool {
        self.confirming
    }

    pub fn has_error(&self) -> bool {
        self.error
    }

    /// Open the confirm dialog. Fails if the submission has nothing to release.
    pub fn open(&mut self, submission: &Submission) -> Result<(), LifecycleError> {
        submission.status.apply(SubmissionAction::ReleaseResubmission)?;
        self.confirming = true;
        Ok(())
    }

    pub fn cancel(&mut self) {
        self.confirming = false;
    }

    pub fn dismiss_error(&mut self) {
        self.error = false;
    }

    /// Delete the submission with "resend" semantics. The dialog closes and
    /// `on_change` runs whether or not the request succeeded.
    pub async fn confirm(
        &mut self,
        api: &impl BffApi,
        submission: &Submission,
        recipient: Recipient,
        on_change: impl FnOnce(),
    ) -> Result<(), PainelError> {
        if !self.confirming {
            return Err(LifecycleError::NothingToConfirm.into());
        }

        let body = ResendRequest::new(recipient);
        let result = api.delete_submission(&submission.id, Some(&body)).await;
        match &result {
            Ok(()) => info!(submission_id = %submission.id, "resubmission released"),
            Err(e) => {
                error!(submission_id = %submission.id, error = %e, "failed to release resubmission");
                self.error = true;
            }
        }

        self.confirming = false;
        on_change();
        result.map_err(PainelError::from)
    }
}
