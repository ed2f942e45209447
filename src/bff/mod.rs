pub mod client;
pub mod error;
#[cfg(test)]
pub(crate) mod mock;
pub mod types;

pub use client::{BffClient, Timeouts};
pub use error::BffError;
pub use types::{
    CancelEnrollResponse, CancellationReceipt, EvaluationRequest, ExternalSubmission, FilesQuery,
    Recipient, ResendRequest,
};

use crate::enrollment::{ClassInfo, Student};
use crate::session::SessionGrant;
use crate::submission::Submission;

/// Endpoints of the backend-for-frontend used by the panel.
///
/// [`BffClient`] is the HTTP implementation; workflows take `&impl BffApi`
/// so tests can substitute an in-memory double.
#[allow(async_fn_in_trait)]
pub trait BffApi {
    async fn get_class(&self, class_id: &str) -> Result<ClassInfo, BffError>;

    async fn list_students(&self, class_id: &str) -> Result<Vec<Student>, BffError>;

    async fn list_submissions(
        &self,
        class_id: &str,
        activity_id: Option<&str>,
    ) -> Result<Vec<Submission>, BffError>;

    /// Persist an evaluation.
    async fn update_submission(&self, id: &str, body: &EvaluationRequest) -> Result<(), BffError>;

    /// Clear a submission. A body signals "resend" semantics to the BFF.
    async fn delete_submission(&self, id: &str, body: Option<&ResendRequest>) -> Result<(), BffError>;

    /// Zipped files of one submission.
    async fn get_submission_files(&self, query: &FilesQuery) -> Result<Vec<u8>, BffError>;

    async fn create_submission(&self, submission: &ExternalSubmission) -> Result<(), BffError>;

    /// Succeeds only on HTTP 200/201.
    async fn request_enrollment_cancellation(
        &self,
        enrollment_id: &str,
    ) -> Result<CancellationReceipt, BffError>;

    async fn cancel_enroll(
        &self,
        enroll_id: &str,
        reason: &str,
        token: &str,
    ) -> Result<CancelEnrollResponse, BffError>;

    async fn update_activity(
        &self,
        enrollment_id: &str,
        activity_index: u32,
        completed: bool,
    ) -> Result<(), BffError>;

    /// Credentials for a supervisor to navigate as `participant_id`.
    async fn participant_session(&self, participant_id: &str) -> Result<SessionGrant, BffError>;
}
