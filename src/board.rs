//! Visões de acompanhamento de uma turma: atividades × participantes.
//!
//! [`ClassBoard`] carrega turma, participantes e submissões e monta, para
//! cada célula, o status classificado, o link de WhatsApp e a ação de
//! "navegar como participante" (só para supervisores). A diferença entre
//! os layouts é apenas de paginação: [`Layout::Paged`] mostra uma atividade
//! por vez, [`Layout::Table`] mostra a matriz inteira.

use tracing::{error, info};

use crate::bff::BffApi;
use crate::enrollment::{
    Activity, CancellationGuard, ClassInfo, DenialReason, EnrollmentBadge, Student,
};
use crate::error::{LifecycleError, PainelError};
use crate::session::{Role, UserProfile};
use crate::submission::{Submission, SubmissionView, classify};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Paged,
    Table,
}

/// Cursor over activities for the paged layout. Does not wrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    index: usize,
    total: usize,
}

impl Pager {
    pub fn new(total: usize) -> Self {
        Self { index: 0, total }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn has_next(&self) -> bool {
        self.index + 1 < self.total
    }

    pub fn has_prev(&self) -> bool {
        self.index > 0
    }

    pub fn next(&mut self) {
        if self.has_next() {
            self.index += 1;
        }
    }

    pub fn prev(&mut self) {
        if self.has_prev() {
            self.index -= 1;
        }
    }

    pub fn go_to(&mut self, index: usize) {
        self.index = index.min(self.total.saturating_sub(1));
    }
}

/// One student × activity cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell<'a> {
    pub student: &'a Student,
    pub submission: Option<&'a Submission>,
    pub view: SubmissionView<'a>,
    pub whatsapp: Option<String>,
    pub can_navigate_as: bool,
}

/// One row of the participation table (coarse activity flags).
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipationRow<'a> {
    pub student: &'a Student,
    pub badge: EnrollmentBadge,
    pub cancel: Result<(), DenialReason>,
    pub activities: Vec<(u32, bool)>,
    pub can_toggle: bool,
}

/// `https://wa.me/` link for a Brazilian phone number, if it looks valid.
pub fn whatsapp_link(phone: &str) -> Option<String> {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    let full = match digits.len() {
        10 | 11 => format!("55{digits}"),
        12 | 13 if digits.starts_with("55") => digits,
        _ => return None,
    };
    Some(format!("https://wa.me/{full}"))
}

#[derive(Debug, Clone)]
pub struct ClassBoard {
    pub class: ClassInfo,
    pub students: Vec<Student>,
    pub submissions: Vec<Submission>,
}

impl ClassBoard {
    pub async fn load(api: &impl BffApi, class_id: &str) -> Result<Self, PainelError> {
        let loaded = tokio::try_join!(
            api.get_class(class_id),
            api.list_students(class_id),
            api.list_submissions(class_id, None),
        );
        match loaded {
            Ok((class, students, submissions)) => {
                info!(
                    class_id,
                    students = students.len(),
                    submissions = submissions.len(),
                    "class board loaded"
                );
                Ok(Self {
                    class,
                    students,
                    submissions,
                })
            }
            Err(e) => {
                error!(class_id, error = %e, "failed to load class board");
                Err(e.into())
            }
        }
    }

    pub fn activities(&self) -> &[Activity] {
        &self.class.activities
    }

    pub fn submission_for(&self, student: &Student, activity: &Activity) -> Option<&Submission> {
        self.submissions
            .iter()
            .find(|s| s.participant_id == student.id && s.activity_id == activity.id)
    }

    pub fn find_student(&self, needle: &str) -> Option<&Student> {
        self.students
            .iter()
            .find(|s| s.id == needle || s.enrollment_id == needle)
    }

    pub fn find_activity(&self, needle: &str) -> Option<&Activity> {
        self.class
            .activities
            .iter()
            .find(|a| a.id == needle || a.index.to_string() == needle)
    }

    /// Cells of one activity, one per student, in roster order.
    pub fn cells<'a>(&'a self, activity: &Activity, viewer: &UserProfile) -> Vec<Cell<'a>> {
        let supervisor = viewer.has_role(Role::Supervisor);
        self.students
            .iter()
            .map(|student| {
                let submission = self.submission_for(student, activity);
                Cell {
                    student,
                    submission,
                    view: classify(submission),
                    whatsapp: whatsapp_link(&student.phone),
                    can_navigate_as: supervisor && student.is_enrollment_active(),
                }
            })
            .collect()
    }

    /// Activities to show for `layout`: the pager's current one, or all of them.
    pub fn visible_activities(&self, layout: Layout, pager: &Pager) -> Vec<&Activity> {
        match layout {
            Layout::Paged => self.class.activities.get(pager.index()).into_iter().collect(),
            Layout::Table => self.class.activities.iter().collect(),
        }
    }

    pub fn participation(&self, guard: &CancellationGuard) -> Vec<ParticipationRow<'_>> {
        self.students
            .iter()
            .map(|student| ParticipationRow {
                student,
                badge: EnrollmentBadge::for_student(student),
                cancel: guard.check(student),
                activities: self
                    .class
                    .activities
                    .iter()
                    .map(|a| (a.index, student.completed(a.index)))
                    .collect(),
                can_toggle: guard.can_toggle_activity() && student.is_enrollment_active(),
            })
            .collect()
    }
}

/// Flip a student's coarse completion flag for one activity.
pub async fn toggle_activity(
    api: &impl BffApi,
    guard: &CancellationGuard,
    student: &Student,
    activity_index: u32,
    on_change: impl FnOnce(),
) -> Result<bool, PainelError> {
    if !guard.can_toggle_activity() || !student.is_enrollment_active() {
        return Err(LifecycleError::ActivityEditDenied.into());
    }
    let completed = !student.completed(activity_index);
    let result = api
        .update_activity(&student.enrollment_id, activity_index, completed)
        .await;
    if let Err(e) = &result {
        error!(enrollment_id = %student.enrollment_id, activity_index, error = %e, "failed to toggle activity");
    }
    on_change();
    result?;
    Ok(completed)
}
