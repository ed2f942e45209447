//! Matrículas, período de edição e cancelamento.
//!
//! - [`window`]: período de edição da turma e janela de download
//! - [`cancellation`]: guarda e fluxo de solicitação de cancelamento pelo facilitador
//! - [`self_service`]: cancelamento feito pelo próprio participante, com contagem para logout

pub mod cancellation;
pub mod self_service;
pub mod window;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub use cancellation::{
    CancellationGuard, CancellationWorkflow, DenialReason, EnrollmentBadge, WorkflowState,
};
pub use self_service::{CancelReason, LogoutCountdown, SelfServiceCancellation, SelfServiceStep};
pub use window::{EditPeriod, is_date_within_limit};

/// A student enrolled in a class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub cpf: String,
    #[serde(default)]
    pub phone: String,
    pub enrollment_id: String,
    /// Coarse per-activity completion, keyed by activity index ("1", "2", ...).
    #[serde(default)]
    pub activities: BTreeMap<String, bool>,
    /// `None` is treated as cancelled.
    #[serde(default)]
    pub is_enroll_canceled: Option<bool>,
    #[serde(default)]
    pub is_cancel_requested: Option<bool>,
}

impl Student {
    pub fn is_enrollment_active(&self) -> bool {
        self.is_enroll_canceled == Some(false)
    }

    pub fn cancel_requested(&self) -> bool {
        self.is_cancel_requested == Some(true)
    }

    pub fn completed(&self, activity_index: u32) -> bool {
        self.activities
            .get(&activity_index.to_string())
            .copied()
            .unwrap_or(false)
    }
}

/// An activity inside a class cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    pub title: String,
    /// 1-based position, matching the keys of [`Student::activities`].
    pub index: u32,
}

/// A class as returned by the BFF, with its edit period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub course_id: String,
    #[serde(default)]
    pub course_name: String,
    #[serde(default)]
    pub cycle_id: String,
    #[serde(with = "date_only")]
    pub start_date: NaiveDate,
    #[serde(with = "date_only")]
    pub end_date: NaiveDate,
    #[serde(default)]
    pub enable_certificacao_progressiva: bool,
    #[serde(default)]
    pub activities: Vec<Activity>,
}

impl ClassInfo {
    pub fn edit_period(&self) -> EditPeriod {
        EditPeriod::new(self.start_date, self.end_date)
    }
}

// The BFF sends either `2026-03-01` or a full timestamp; only the date matters.
mod date_only {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format("%Y-%m-%d").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let day = raw.get(..10).unwrap_or(&raw);
        NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(D::Error::custom)
    }
}
