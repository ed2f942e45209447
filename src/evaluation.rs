//! Painel de avaliação de uma submissão.
//!
//! Reúne o formulário de nota e comentário ([`EvaluationForm`]), o download
//! dos arquivos (pacote completo ou arquivo único via proxy `/api/download`)
//! e o carrossel de visualização ([`FileCarousel`]).

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use reqwest::Url;
use tempfile::NamedTempFile;
use tracing::{error, info};

use crate::bff::{BffApi, EvaluationRequest, FilesQuery, Recipient};
use crate::enrollment::{ClassInfo, Student, is_date_within_limit};
use crate::error::{LifecycleError, PainelError};
use crate::session::{Role, UserProfile};
use crate::submission::{FileItem, Submission, SubmissionAction};

pub const MAX_SCORE: u8 = 5;

/// Recipient of the notification the BFF sends after evaluation or resend.
pub fn recipient(student: &Student, class: &ClassInfo) -> Recipient {
    Recipient {
        participant_name: student.name.clone(),
        participant_email: student.email.clone(),
        course_name: class.course_name.clone(),
    }
}

pub fn require_facilitator(user: &UserProfile) -> Result<(), LifecycleError> {
    if user.has_role(Role::Facilitator) {
        Ok(())
    } else {
        Err(LifecycleError::NotFacilitator)
    }
}

/// Nota e comentário em edição pelo facilitador.
#[derive(Debug, Default)]
pub struct EvaluationForm {
    score: Option<u8>,
    comment: String,
    saving: bool,
}

impl EvaluationForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_score(&mut self, score: u8) -> Result<(), LifecycleError> {
        if score > MAX_SCORE {
            return Err(LifecycleError::ScoreOutOfRange(score));
        }
        self.score = Some(score);
        Ok(())
    }

    pub fn set_comment(&mut self, comment: impl Into<String>) {
        self.comment = comment.into();
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    /// Enabled only with a score, a non-blank comment, and nothing in flight.
    pub fn can_submit(&self) -> bool {
        self.score.is_some() && !self.comment.trim().is_empty() && !self.saving
    }

    /// Persist the evaluation. `on_change` runs after the request settles,
    /// whatever its outcome, so the caller can refetch.
    pub async fn submit(
        &mut self,
        api: &impl BffApi,
        submission: &Submission,
        recipient: Recipient,
        user: &UserProfile,
        on_change: impl FnOnce(),
    ) -> Result<(), PainelError> {
        require_facilitator(user)?;
        if self.saving {
            return Err(LifecycleError::AlreadySaving.into());
        }
        let Some(score) = self.score.filter(|_| self.can_submit()) else {
            return Err(LifecycleError::EvaluationIncomplete.into());
        };
        submission.status.apply(SubmissionAction::Evaluate)?;
        // Received without files renders a placeholder, not the rating panel.
        if submission.items.is_empty() {
            return Err(LifecycleError::NothingToEvaluate.into());
        }

        self.saving = true;
        let body = EvaluationRequest::new(score, self.comment.trim().to_string(), recipient);
        let result = api.update_submission(&submission.id, &body).await;
        self.saving = false;

        match &result {
            Ok(()) => info!(submission_id = %submission.id, score, "evaluation saved"),
            Err(e) => error!(submission_id = %submission.id, error = %e, "failed to save evaluation"),
        }
        on_change();
        result.map_err(PainelError::from)
    }
}

/// Download every file of `submission` as one archive into `dest_dir`.
///
/// The archive is written to a temporary file next to the destination and
/// only renamed into place once complete.
pub async fn download_all(
    api: &impl BffApi,
    submission: &Submission,
    class: &ClassInfo,
    today: NaiveDate,
    dest_dir: &Path,
) -> Result<PathBuf, PainelError> {
    if !is_date_within_limit(class.end_date, today) {
        return Err(LifecycleError::DownloadWindowClosed.into());
    }

    let query = FilesQuery {
        participant_id: submission.participant_id.clone(),
        activity_id: submission.activity_id.clone(),
        class_id: submission.class_id.clone(),
    };
    let bytes = api.get_submission_files(&query).await?;

    let target = dest_dir.join(archive_name(&submission.participant_id, &submission.activity_id));
    let mut tmp = NamedTempFile::new_in(dest_dir)?;
    std::io::Write::write_all(&mut tmp, &bytes)?;
    tmp.persist(&target).map_err(|e| PainelError::Io(e.error))?;

    info!(path = %target.display(), bytes = bytes.len(), "submission files downloaded");
    Ok(target)
}

// Ids come from the BFF; keep only characters that cannot leave `dest_dir`.
fn archive_name(participant_id: &str, activity_id: &str) -> String {
    let clean = |id: &str| -> String {
        id.chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect()
    };
    format!("{}-{}.zip", clean(participant_id), clean(activity_id))
}

/// Link through the web app's `/api/download` proxy, which forces a download
/// with a stable file name instead of fetching the storage URL directly.
pub fn download_link(web_origin: &str, file: &FileItem) -> Result<Url, PainelError> {
    let base = format!("{}/api/download", web_origin.trim_end_matches('/'));
    Url::parse_with_params(&base, [("url", file.url.as_str()), ("name", file.name.as_str())])
        .map_err(|e| PainelError::Config(format!("invalid web origin {web_origin}: {e}")))
}

/// Slideshow over a submission's files, independent of the rating controls.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FileCarousel {
    len: usize,
    index: Option<usize>,
}

impl FileCarousel {
    pub fn new(len: usize) -> Self {
        Self { len, index: None }
    }

    pub fn open_at(&mut self, index: usize) {
        if index < self.len {
            self.index = Some(index);
        }
    }

    pub fn close(&mut self) {
        self.index = None;
    }

    pub fn is_open(&self) -> bool {
        self.index.is_some()
    }

    pub fn next(&mut self) {
        if let Some(i) = self.index {
            self.index = Some((i + 1) % self.len);
        }
    }

    pub fn prev(&mut self) {
        if let Some(i) = self.index {
            self.index = Some((i + self.len - 1) % self.len);
        }
    }

    pub fn current<'a>(&self, items: &'a [FileItem]) -> Option<&'a FileItem> {
        self.index.and_then(|i| items.get(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bff::BffError;
    use crate::bff::mock::MockBff;
    use crate::enrollment::fixtures::class;
    use crate::session::fixtures::grant;
    use crate::submission::SubmissionStatus;
    use crate::submission::fixtures::{file, submission};
    use tempfile::TempDir;

    fn facilitator() -> UserProfile {
        grant("fac", vec![Role::Facilitator]).user
    }

    fn to_recipient() -> Recipient {
        Recipient {
            participant_name: "Maria".into(),
            participant_email: "maria@example.com".into(),
            course_name: "Gestão Escolar".into(),
        }
    }

    #[test]
    fn submit_enabled_only_with_score_and_comment() {
        let mut form = EvaluationForm::new();
        assert!(!form.can_submit());

        form.set_score(4).unwrap();
        assert!(!form.can_submit());

        form.set_comment("   ");
        assert!(!form.can_submit());

        form.set_comment("Ótimo trabalho!");
        assert!(form.can_submit());
    }

    #[test]
    fn score_above_five_is_rejected() {
        let mut form = EvaluationForm::new();
        assert_eq!(form.set_score(6), Err(LifecycleError::ScoreOutOfRange(6)));
        form.set_score(0).unwrap();
    }

    #[tokio::test]
    async fn submit_sends_evaluation_and_notifies() {
        let api = MockBff::default();
        let sub = submission(SubmissionStatus::Received, vec![file("f1")]);
        let mut form = EvaluationForm::new();
        form.set_score(4).unwrap();
        form.set_comment("Ótimo trabalho!");

        let mut changed = false;
        form.submit(&api, &sub, to_recipient(), &facilitator(), || changed = true)
            .await
            .unwrap();

        assert!(changed);
        assert!(!form.is_saving());
        let body = api.last_evaluation.lock().unwrap().clone().unwrap();
        assert_eq!(body.status, "evaluated");
        assert_eq!(body.score, 4);
        assert_eq!(body.facilitator_comment, "Ótimo trabalho!");
        assert_eq!(body.recipient.course_name, "Gestão Escolar");
    }

    #[tokio::test]
    async fn submit_failure_still_notifies_and_clears_saving() {
        let api = MockBff::failing(|| BffError::Timeout);
        let sub = submission(SubmissionStatus::Received, vec![file("f1")]);
        let mut form = EvaluationForm::new();
        form.set_score(3).unwrap();
        form.set_comment("Revisar a introdução");

        let mut changed = false;
        let result = form
            .submit(&api, &sub, to_recipient(), &facilitator(), || changed = true)
            .await;

        assert!(matches!(result, Err(PainelError::Bff(BffError::Timeout))));
        assert!(changed);
        assert!(!form.is_saving());
    }

    #[tokio::test]
    async fn submit_requires_facilitator_and_complete_form() {
        let api = MockBff::default();
        let sub = submission(SubmissionStatus::Received, vec![file("f1")]);
        let mut form = EvaluationForm::new();
        form.set_score(5).unwrap();

        let student = grant("p", vec![Role::Student]).user;
        let err = form
            .submit(&api, &sub, to_recipient(), &student, || {})
            .await
            .unwrap_err();
        assert!(matches!(err, PainelError::Lifecycle(LifecycleError::NotFacilitator)));

        let err = form
            .submit(&api, &sub, to_recipient(), &facilitator(), || {})
            .await
            .unwrap_err();
        assert!(matches!(err, PainelError::Lifecycle(LifecycleError::EvaluationIncomplete)));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn evaluated_submission_cannot_be_evaluated_again() {
        let api = MockBff::default();
        let sub = submission(SubmissionStatus::Evaluated, vec![file("f1")]);
        let mut form = EvaluationForm::new();
        form.set_score(5).unwrap();
        form.set_comment("Excelente");

        let err = form
            .submit(&api, &sub, to_recipient(), &facilitator(), || {})
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PainelError::Lifecycle(LifecycleError::IllegalTransition { .. })
        ));
    }

    #[tokio::test]
    async fn received_without_files_cannot_be_evaluated() {
        let api = MockBff::default();
        let sub = submission(SubmissionStatus::Received, vec![]);
        let mut form = EvaluationForm::new();
        form.set_score(4).unwrap();
        form.set_comment("Recebida por e-mail");

        let mut changed = false;
        let err = form
            .submit(&api, &sub, to_recipient(), &facilitator(), || changed = true)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PainelError::Lifecycle(LifecycleError::NothingToEvaluate)
        ));
        assert!(!changed);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn download_all_writes_archive() {
        let dir = TempDir::new().unwrap();
        let api = MockBff::default().with_files(b"PK\x03\x04zip");
        let sub = submission(SubmissionStatus::Received, vec![file("f1")]);
        let class = class(true);
        let today = class.end_date;

        let path = download_all(&api, &sub, &class, today, dir.path()).await.unwrap();

        assert_eq!(path, dir.path().join("p-1-a-1.zip"));
        assert_eq!(std::fs::read(&path).unwrap(), b"PK\x03\x04zip");
        assert_eq!(api.calls(), vec!["get_submission_files:p-1:a-1:c-1"]);
    }

    #[tokio::test]
    async fn download_all_keeps_archive_inside_dest_dir() {
        let dir = TempDir::new().unwrap();
        let api = MockBff::default().with_files(b"zip");
        let mut sub = submission(SubmissionStatus::Received, vec![file("f1")]);
        sub.participant_id = "../../etc".into();
        sub.activity_id = "a/1\\x".into();
        let class = class(true);

        let path = download_all(&api, &sub, &class, class.end_date, dir.path())
            .await
            .unwrap();

        assert_eq!(path.parent(), Some(dir.path()));
        assert_eq!(path.file_name().unwrap(), "______etc-a_1_x.zip");
    }

    #[tokio::test]
    async fn download_all_refuses_after_limit() {
        let dir = TempDir::new().unwrap();
        let api = MockBff::default();
        let sub = submission(SubmissionStatus::Received, vec![file("f1")]);
        let class = class(true);
        let today = NaiveDate::from_ymd_opt(2027, 6, 1).unwrap();

        let err = download_all(&api, &sub, &class, today, dir.path())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PainelError::Lifecycle(LifecycleError::DownloadWindowClosed)
        ));
        assert!(api.calls().is_empty());
    }

    #[test]
    fn download_link_goes_through_proxy() {
        let mut item = file("f1");
        item.name = "relatório final.pdf".into();
        let url = download_link("https://painel.example.com/", &item).unwrap();
        assert_eq!(url.path(), "/api/download");
        let params: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            params,
            vec![
                ("url".to_string(), "https://files.example.com/f1.pdf".to_string()),
                ("name".to_string(), "relatório final.pdf".to_string()),
            ]
        );
    }

    #[test]
    fn carousel_wraps_around() {
        let items = vec![file("a"), file("b"), file("c")];
        let mut carousel = FileCarousel::new(items.len());
        assert!(carousel.current(&items).is_none());

        carousel.open_at(2);
        carousel.next();
        assert_eq!(carousel.current(&items).unwrap().id, "a");
        carousel.prev();
        assert_eq!(carousel.current(&items).unwrap().id, "c");

        carousel.close();
        assert!(!carousel.is_open());
        carousel.open_at(5);
        assert!(!carousel.is_open());
    }
}
