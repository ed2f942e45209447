//! In-memory [`BffApi`] double shared by unit tests.

use std::sync::Mutex;

use super::types::{
    CancelEnrollResponse, CancellationReceipt, EvaluationRequest, ExternalSubmission, FilesQuery,
    ResendRequest,
};
use super::{BffApi, BffError};
use crate::enrollment::{ClassInfo, Student};
use crate::session::SessionGrant;
use crate::submission::Submission;

#[derive(Default)]
pub struct MockBff {
    calls: Mutex<Vec<String>>,
    failure: Option<fn() -> BffError>,
    class: Option<ClassInfo>,
    students: Vec<Student>,
    submissions: Vec<Submission>,
    files: Vec<u8>,
    cancel_status: Option<String>,
    grant: Option<SessionGrant>,
    pub last_evaluation: Mutex<Option<EvaluationRequest>>,
    pub last_resend: Mutex<Option<ResendRequest>>,
    pub last_external: Mutex<Option<ExternalSubmission>>,
}

impl MockBff {
    /// Every call fails with the error built by `failure`.
    pub fn failing(failure: fn() -> BffError) -> Self {
        Self {
            failure: Some(failure),
            ..Default::default()
        }
    }

    pub fn with_class(mut self, class: ClassInfo) -> Self {
        self.class = Some(class);
        self
    }

    pub fn with_students(mut self, students: Vec<Student>) -> Self {
        self.students = students;
        self
    }

    pub fn with_submissions(mut self, submissions: Vec<Submission>) -> Self {
        self.submissions = submissions;
        self
    }

    pub fn with_files(mut self, files: &[u8]) -> Self {
        self.files = files.to_vec();
        self
    }

    pub fn with_cancel_status(mut self, status: &str) -> Self {
        self.cancel_status = Some(status.to_string());
        self
    }

    pub fn with_grant(mut self, grant: SessionGrant) -> Self {
        self.grant = Some(grant);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) -> Result<(), BffError> {
        self.calls.lock().unwrap().push(call);
        match self.failure {
            Some(failure) => Err(failure()),
            None => Ok(()),
        }
    }
}

impl BffApi for MockBff {
    async fn get_class(&self, class_id: &str) -> Result<ClassInfo, BffError> {
        self.record(format!("get_class:{class_id}"))?;
        self.class.clone().ok_or(BffError::Api {
            status: 404,
            message: "class not found".into(),
        })
    }

    async fn list_students(&self, class_id: &str) -> Result<Vec<Student>, BffError> {
        self.record(format!("list_students:{class_id}"))?;
        Ok(self.students.clone())
    }

    async fn list_submissions(
        &self,
        class_id: &str,
        activity_id: Option<&str>,
    ) -> Result<Vec<Submission>, BffError> {
        self.record(format!("list_submissions:{class_id}"))?;
        Ok(self
            .submissions
            .iter()
            .filter(|s| activity_id.is_none_or(|a| s.activity_id == a))
            .cloned()
            .collect())
    }

    async fn update_submission(&self, id: &str, body: &EvaluationRequest) -> Result<(), BffError> {
        *self.last_evaluation.lock().unwrap() = Some(body.clone());
        self.record(format!("update_submission:{id}"))
    }

    async fn delete_submission(&self, id: &str, body: Option<&ResendRequest>) -> Result<(), BffError> {
        *self.last_resend.lock().unwrap() = body.cloned();
        let kind = if body.is_some() { "resend" } else { "plain" };
        self.record(format!("delete_submission:{id}:{kind}"))
    }

    async fn get_submission_files(&self, query: &FilesQuery) -> Result<Vec<u8>, BffError> {
        self.record(format!(
            "get_submission_files:{}:{}:{}",
            query.participant_id, query.activity_id, query.class_id
        ))?;
        Ok(self.files.clone())
    }

    async fn create_submission(&self, submission: &ExternalSubmission) -> Result<(), BffError> {
        *self.last_external.lock().unwrap() = Some(submission.clone());
        self.record(format!("create_submission:{}", submission.participant_id))
    }

    async fn request_enrollment_cancellation(
        &self,
        enrollment_id: &str,
    ) -> Result<CancellationReceipt, BffError> {
        self.record(format!("request_enrollment_cancellation:{enrollment_id}"))?;
        Ok(CancellationReceipt {
            status: 200,
            message: None,
        })
    }

    async fn cancel_enroll(
        &self,
        enroll_id: &str,
        reason: &str,
        _token: &str,
    ) -> Result<CancelEnrollResponse, BffError> {
        self.record(format!("cancel_enroll:{enroll_id}:{reason}"))?;
        Ok(CancelEnrollResponse {
            status: self
                .cancel_status
                .clone()
                .unwrap_or_else(|| "cancelled".to_string()),
            message: None,
        })
    }

    async fn update_activity(
        &self,
        enrollment_id: &str,
        activity_index: u32,
        completed: bool,
    ) -> Result<(), BffError> {
        self.record(format!("update_activity:{enrollment_id}:{activity_index}:{completed}"))
    }

    async fn participant_session(&self, participant_id: &str) -> Result<SessionGrant, BffError> {
        self.record(format!("participant_session:{participant_id}"))?;
        self.grant.clone().ok_or(BffError::Api {
            status: 403,
            message: "no grant".into(),
        })
    }
}
