//! Submissões de atividades e o classificador de status.
//!
//! Uma [`Submission`] pertence a um participante em uma atividade de uma
//! turma. O BFF é o dono do registro; aqui mantemos apenas cópias efêmeras
//! e a função [`classify`] que decide o que exibir para cada uma.

mod status;

use serde::{Deserialize, Serialize};

pub use status::{SubmissionAction, SubmissionStatus};

/// Um arquivo enviado pelo participante.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileItem {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub content_type: String,
    pub url: String,
}

/// Avaliação registrada pelo facilitador.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    /// Nota de 0 a 5.
    pub note: f32,
    pub comment: String,
}

/// Submissão de um participante para uma atividade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: String,
    pub status: SubmissionStatus,
    #[serde(default)]
    pub items: Vec<FileItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<Feedback>,
    pub participant_id: String,
    pub activity_id: String,
    pub class_id: String,
    #[serde(default)]
    pub course_id: String,
    #[serde(default)]
    pub cycle_id: String,
}

/// What a front end renders for one student × activity cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SubmissionView<'a> {
    /// File thumbnails plus the evaluation panel.
    Files {
        items: &'a [FileItem],
        panel: PanelMode<'a>,
    },
    /// `recebida` without files: delivered through another channel.
    ReceivedWithoutFiles,
    /// `não recebida`, with the affordance to mark it received elsewhere.
    NotReceived,
    /// `recebida em outro canal`, with the affordance to revert it.
    ExternalChannel,
    /// `avaliada` but the BFF sent no files to show.
    EvaluatedWithoutFiles(Option<&'a Feedback>),
    /// Status string the panel does not know.
    Unrecognized(&'a str),
    /// No submission record exists for this cell.
    NotFound,
}

/// Mode of the evaluation panel shown next to the files.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PanelMode<'a> {
    /// Rating and comment controls are editable.
    Editable,
    /// Read-only summary of the stored evaluation.
    Summary(Option<&'a Feedback>),
}

/// Map a submission to the view the panel should render.
pub fn classify(submission: Option<&Submission>) -> SubmissionView<'_> {
    let Some(submission) = submission else {
        return SubmissionView::NotFound;
    };

    match (&submission.status, submission.items.is_empty()) {
        (SubmissionStatus::Received, false) => SubmissionView::Files {
            items: &submission.items,
            panel: PanelMode::Editable,
        },
        (SubmissionStatus::Evaluated, false) => SubmissionView::Files {
            items: &submission.items,
            panel: PanelMode::Summary(submission.feedback.as_ref()),
        },
        (SubmissionStatus::Received, true) => SubmissionView::ReceivedWithoutFiles,
        (SubmissionStatus::Evaluated, true) => {
            SubmissionView::EvaluatedWithoutFiles(submission.feedback.as_ref())
        }
        (SubmissionStatus::NotReceived, _) => SubmissionView::NotReceived,
        (SubmissionStatus::ReceivedElsewhere, _) => SubmissionView::ExternalChannel,
        (SubmissionStatus::Unknown(raw), _) => SubmissionView::Unrecognized(raw),
    }
}
