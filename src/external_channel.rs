//! Marcação de submissões recebidas por outro canal (e-mail, papel, etc.).
//!
//! As duas operações são inversas e sempre disparam `on_change`, para que o
//! chamador busque o estado autoritativo no BFF em vez de adivinhá-lo.

use tracing::{error, info};

use crate::bff::{BffApi, ExternalSubmission};
use crate::error::PainelError;
use crate::submission::{Submission, SubmissionAction, SubmissionStatus};

/// `não recebida` → `recebida em outro canal`: creates a submission record.
pub async fn mark_external(
    api: &impl BffApi,
    current: &SubmissionStatus,
    record: &ExternalSubmission,
    on_change: impl FnOnce(),
) -> Result<(), PainelError> {
    current.apply(SubmissionAction::MarkExternal)?;

    let result = api.create_submission(record).await;
    match &result {
        Ok(()) => info!(
            participant_id = %record.participant_id,
            activity_id = %record.activity_id,
            "submission marked as received elsewhere"
        ),
        Err(e) => error!(
            participant_id = %record.participant_id,
            activity_id = %record.activity_id,
            error = %e,
            "failed to mark submission as received elsewhere"
        ),
    }
    on_change();
    result.map_err(PainelError::from)
}

/// `recebida em outro canal` → `não recebida`: deletes the record.
pub async fn revert_to_not_received(
    api: &impl BffApi,
    submission: &Submission,
    on_change: impl FnOnce(),
) -> Result<(), PainelError> {
    submission.status.apply(SubmissionAction::RevertExternal)?;

    let result = api.delete_submission(&submission.id, None).await;
    match &result {
        Ok(()) => info!(submission_id = %submission.id, "submission reverted to not received"),
        Err(e) => error!(submission_id = %submission.id, error = %e, "failed to revert submission"),
    }
    on_change();
    result.map_err(PainelError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bff::BffError;
    use crate::bff::mock::MockBff;
    use crate::error::LifecycleError;
    use crate::submission::fixtures::submission;
    use crate::submission::{SubmissionView, classify};

    fn record() -> ExternalSubmission {
        ExternalSubmission {
            class_id: "c-1".into(),
            participant_id: "p-1".into(),
            activity_id: "a-1".into(),
            title: "Diagnóstico".into(),
            course_id: "course-1".into(),
            cycle_id: "cycle-1".into(),
            facilitator_id: "fac".into(),
        }
    }

    #[tokio::test]
    async fn mark_then_refetch_flips_classifier() {
        let api = MockBff::default();
        let before = submission(SubmissionStatus::NotReceived, vec![]);
        assert_eq!(classify(Some(&before)), SubmissionView::NotReceived);

        let mut changed = false;
        mark_external(&api, &before.status, &record(), || changed = true)
            .await
            .unwrap();
        assert!(changed);
        assert_eq!(api.calls(), vec!["create_submission:p-1"]);
        assert_eq!(api.last_external.lock().unwrap().as_ref(), Some(&record()));

        // What the BFF returns on refetch after the record was created.
        let refetched = MockBff::default()
            .with_submissions(vec![submission(SubmissionStatus::ReceivedElsewhere, vec![])]);
        let subs = refetched.list_submissions("c-1", Some("a-1")).await.unwrap();
        assert_eq!(classify(subs.first()), SubmissionView::ExternalChannel);
    }

    #[tokio::test]
    async fn mark_rejects_already_received() {
        let api = MockBff::default();
        let err = mark_external(&api, &SubmissionStatus::Received, &record(), || {})
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PainelError::Lifecycle(LifecycleError::IllegalTransition { .. })
        ));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn revert_deletes_without_body_and_notifies_on_failure() {
        let api = MockBff::failing(|| BffError::Timeout);
        let sub = submission(SubmissionStatus::ReceivedElsewhere, vec![]);

        let mut changed = false;
        let result = revert_to_not_received(&api, &sub, || changed = true).await;

        assert!(result.is_err());
        assert!(changed);
        assert_eq!(api.calls(), vec!["delete_submission:sub-1:plain"]);
    }
}
