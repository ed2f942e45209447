use thiserror::Error;

use crate::bff::BffError;

#[derive(Debug, Error)]
pub enum PainelError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("No class selected. Run `painel class select <id>` first.")]
    NoClassSelected,

    #[error("Not signed in")]
    NotSignedIn,

    #[error("BFF error: {0}")]
    Bff(#[from] BffError),

    #[error("{0}")]
    Lifecycle(#[from] LifecycleError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Violations of the client-side rules that guard every mutation.
///
/// These are raised before any request leaves the process, so the backend
/// never sees an action the panel would not have offered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("cannot {action} a submission whose status is \"{from}\"")]
    IllegalTransition { from: String, action: String },

    #[error("score must be between 0 and 5, got {0}")]
    ScoreOutOfRange(u8),

    #[error("evaluation needs both a score and a comment")]
    EvaluationIncomplete,

    #[error("a submission without files has no evaluation panel")]
    NothingToEvaluate,

    #[error("an evaluation is already being saved")]
    AlreadySaving,

    #[error("no confirmation is pending")]
    NothingToConfirm,

    #[error("only facilitators can evaluate submissions")]
    NotFacilitator,

    #[error("only supervisors can navigate as a participant")]
    NotSupervisor,

    #[error("already navigating as a participant")]
    AlreadyInParticipantMode,

    #[error("not navigating as a participant")]
    NotInParticipantMode,

    #[error("the download window for this class has closed")]
    DownloadWindowClosed,

    #[error("cancellation is not available: {0}")]
    CancellationDenied(crate::enrollment::DenialReason),

    #[error("activities can only be edited inside the edit period of a progressive class")]
    ActivityEditDenied,

    #[error("a cancellation reason must be chosen first")]
    ReasonMissing,
}
