//! Corpos de requisição e resposta dos endpoints do BFF.
//!
//! As entidades em si ([`Submission`](crate::submission::Submission),
//! [`Student`](crate::enrollment::Student), ...) vivem nos seus módulos;
//! aqui ficam apenas os formatos de ida e volta de cada chamada.

use serde::{Deserialize, Serialize};

/// Participante que o BFF notifica por e-mail após a operação.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub participant_name: String,
    pub participant_email: String,
    pub course_name: String,
}

/// Corpo de `PATCH /submissions/{id}` ao registrar uma avaliação.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    /// Sempre `"evaluated"`.
    pub status: String,
    pub score: u8,
    pub facilitator_comment: String,
    #[serde(flatten)]
    pub recipient: Recipient,
}

impl EvaluationRequest {
    pub fn new(score: u8, facilitator_comment: String, recipient: Recipient) -> Self {
        Self {
            status: "evaluated".to_string(),
            score,
            facilitator_comment,
            recipient,
        }
    }
}

/// Corpo opcional de `DELETE /submissions/{id}` liberando o reenvio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResendRequest {
    #[serde(flatten)]
    pub recipient: Recipient,
    /// Sempre `"resend"`.
    pub action: String,
}

impl ResendRequest {
    pub fn new(recipient: Recipient) -> Self {
        Self {
            recipient,
            action: "resend".to_string(),
        }
    }
}

/// Chave do pacote de arquivos de uma submissão.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilesQuery {
    pub participant_id: String,
    pub activity_id: String,
    pub class_id: String,
}

/// Registro de submissão recebida fora da plataforma.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalSubmission {
    pub class_id: String,
    pub participant_id: String,
    pub activity_id: String,
    pub title: String,
    pub course_id: String,
    pub cycle_id: String,
    pub facilitator_id: String,
}

impl ExternalSubmission {
    pub const STATUS: &'static str = "submitted_external";

    /// Campos do formulário multipart, na ordem enviada.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("class_id", self.class_id.clone()),
            ("participant_id", self.participant_id.clone()),
            ("activity_id", self.activity_id.clone()),
            ("title", self.title.clone()),
            ("course_id", self.course_id.clone()),
            ("cycle_id", self.cycle_id.clone()),
            ("facilitator_id", self.facilitator_id.clone()),
            ("status", Self::STATUS.to_string()),
        ]
    }
}

/// Resultado de uma solicitação de cancelamento aceita (200/201).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancellationReceipt {
    /// Status HTTP devolvido; preenchido pelo cliente, não pelo corpo.
    #[serde(skip)]
    pub status: u16,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelEnrollRequest {
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelEnrollResponse {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityToggleRequest {
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantSessionRequest {
    pub participant_id: String,
}

/// Corpo de erro padrão do BFF.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(alias = "error")]
    pub message: String,
}
