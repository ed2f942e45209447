use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::LifecycleError;

/// Status of a student's submission for one activity.
///
/// The BFF sends these as Portuguese strings. Anything it sends that is not
/// one of the four known values is kept verbatim in [`Unknown`](SubmissionStatus::Unknown)
/// so callers have to decide what to do with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SubmissionStatus {
    NotReceived,
    Received,
    ReceivedElsewhere,
    Evaluated,
    Unknown(String),
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &str {
        match self {
            SubmissionStatus::NotReceived => "não recebida",
            SubmissionStatus::Received => "recebida",
            SubmissionStatus::ReceivedElsewhere => "recebida em outro canal",
            SubmissionStatus::Evaluated => "avaliada",
            SubmissionStatus::Unknown(raw) => raw,
        }
    }

    /// Compute the status a submission should land in after `action`.
    ///
    /// The BFF stays authoritative: the result only says whether the action
    /// is legal and what a refetch is expected to show.
    ///
    /// - `não recebida` → `recebida em outro canal` (mark external)
    /// - `recebida em outro canal` → `não recebida` (revert)
    /// - `recebida` → `avaliada` (evaluate)
    /// - any received or evaluated submission → `não recebida` (release resubmission)
    pub fn apply(&self, action: SubmissionAction) -> Result<SubmissionStatus, LifecycleError> {
        use SubmissionAction::{Evaluate, MarkExternal, ReleaseResubmission, RevertExternal};
        use SubmissionStatus::{Evaluated, NotReceived, Received, ReceivedElsewhere};

        match (self, action) {
            (NotReceived, MarkExternal) => Ok(ReceivedElsewhere),
            (ReceivedElsewhere, RevertExternal) => Ok(NotReceived),
            (Received, Evaluate) => Ok(Evaluated),
            (Received | Evaluated | ReceivedElsewhere, ReleaseResubmission) => Ok(NotReceived),
            (from, action) => Err(LifecycleError::IllegalTransition {
                from: from.as_str().to_string(),
                action: action.to_string(),
            }),
        }
    }
}

impl From<String> for SubmissionStatus {
    fn from(raw: String) -> Self {
        match raw.trim() {
            "não recebida" => SubmissionStatus::NotReceived,
            "recebida" => SubmissionStatus::Received,
            // The panel itself writes `evaluated` and `submitted_external`;
            // some BFF views echo them back untranslated.
            "recebida em outro canal" | "submitted_external" => SubmissionStatus::ReceivedElsewhere,
            "avaliada" | "evaluated" => SubmissionStatus::Evaluated,
            _ => SubmissionStatus::Unknown(raw),
        }
    }
}

impl From<SubmissionStatus> for String {
    fn from(status: SubmissionStatus) -> Self {
        match status {
            SubmissionStatus::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mutations a facilitator can perform on a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionAction {
    MarkExternal,
    RevertExternal,
    Evaluate,
    ReleaseResubmission,
}

impl fmt::Display for SubmissionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionAction::MarkExternal => write!(f, "mark as received elsewhere"),
            SubmissionAction::RevertExternal => write!(f, "revert to not received"),
            SubmissionAction::Evaluate => write!(f, "evaluate"),
            SubmissionAction::ReleaseResubmission => write!(f, "release resubmission of"),
        }
    }
}
