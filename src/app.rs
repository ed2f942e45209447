//! Execução dos subcomandos do painel.
//!
//! [`App`] junta configuração, cliente do BFF, sessão autenticada e o
//! armazenamento local, e traduz cada [`Command`] para os fluxos dos módulos
//! de domínio. Depois de toda mutação a célula afetada é buscada de novo no
//! BFF e reimpressa.

use anyhow::{Context, Result, anyhow, bail};
use chrono::{Local, NaiveDate, Utc};
use console::{Style, Term};
use tracing::{debug, info};

use crate::bff::{BffApi, BffClient, ExternalSubmission};
use crate::board::{ClassBoard, Layout, Pager, toggle_activity};
use crate::cli::{CellArgs, ClassCommand, Command, ParticipantCommand};
use crate::config::PainelConfig;
use crate::enrollment::{
    Activity, CancelReason, CancellationGuard, CancellationWorkflow, LogoutCountdown,
    SelfServiceCancellation, Student,
};
use crate::error::PainelError;
use crate::evaluation::{self, EvaluationForm};
use crate::external_channel;
use crate::resubmission::ResubmissionGate;
use crate::session::{
    self, AuthProvider, FileAuth, LOGOUT_KEYS, ParticipantTarget, SessionGrant, SessionStore,
    UserProfile,
};
use crate::submission::{Submission, SubmissionStatus};
use crate::ui::{self, Progress};

pub struct App {
    config: PainelConfig,
    api: BffClient,
    auth: FileAuth,
    store: SessionStore,
    class_override: Option<String>,
}

impl App {
    pub fn new(config: PainelConfig, class_override: Option<String>) -> Result<Self> {
        let auth = FileAuth::open(&config.credentials_file)
            .with_context(|| format!("failed to read {}", config.credentials_file.display()))?;
        let store = SessionStore::open(&config.state_file)
            .with_context(|| format!("failed to read {}", config.state_file.display()))?;

        let token = if config.token.is_empty() {
            auth.current().map(|g| g.token.clone())
        } else {
            Some(config.token.clone())
        };
        let api = BffClient::with_base_url(&config.base_url, token, config.timeouts())?;

        Ok(Self {
            config,
            api,
            auth,
            store,
            class_override,
        })
    }

    pub async fn run(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Login {
                token,
                id,
                name,
                email,
                roles,
            } => {
                let grant = SessionGrant {
                    token,
                    user: UserProfile {
                        id,
                        name,
                        email,
                        roles: roles.into_iter().map(Into::into).collect(),
                    },
                };
                self.auth.sign_in(&grant).await?;
                self.api.set_token(Some(grant.token.clone()));
                println!("Sessão iniciada como {}", grant.user.name);
            }

            Command::Logout => {
                self.auth.sign_out().await?;
                for key in LOGOUT_KEYS {
                    self.store.remove(key);
                }
                self.store.save()?;
                println!("Sessão encerrada");
            }

            Command::Class(ClassCommand::Select { class_id }) => {
                let progress = Progress::start("Buscando turma...");
                let class = match self.api.get_class(&class_id).await {
                    Ok(class) => class,
                    Err(e) => {
                        progress.failure("Turma não encontrada");
                        return Err(e.into());
                    }
                };
                self.store.select_class(
                    &class.id,
                    Some(class.course_id.as_str()),
                    Utc::now(),
                    self.config.class_ttl(),
                )?;
                self.store.save()?;
                progress.success(&format!("Turma selecionada: {} ({})", class.name, class.id));
            }

            Command::Class(ClassCommand::Current) => match self.store.resolve_class(Utc::now())? {
                Some(class_id) => println!("{class_id}"),
                None => println!("Nenhuma turma selecionada"),
            },

            Command::Board { layout, page } => {
                let board = self.load_board().await?;
                let user = self.user()?;
                let layout = Layout::from(layout);
                let mut pager = Pager::new(board.activities().len());
                pager.go_to(page.saturating_sub(1));

                let columns: Vec<_> = board
                    .visible_activities(layout, &pager)
                    .into_iter()
                    .map(|activity| (activity.title.clone(), board.cells(activity, user)))
                    .collect();
                ui::print_board(&board, &columns, layout, &pager);
            }

            Command::Participation => {
                let board = self.load_board().await?;
                let guard = CancellationGuard::for_class(&board.class, today());
                ui::print_participation(&board.participation(&guard));
            }

            Command::Show(cell) => self.show_cell(&cell).await?,

            Command::Evaluate {
                cell,
                score,
                comment,
            } => {
                let board = self.load_board().await?;
                let (student, activity) = locate(&board, &cell)?;
                let submission = require_submission(&board, student, activity)?;
                let user = self.user()?;

                let mut form = EvaluationForm::new();
                form.set_score(score)?;
                form.set_comment(comment);

                let mut refetch = false;
                let progress = Progress::start("Salvando avaliação...");
                let result = form
                    .submit(
                        &self.api,
                        submission,
                        evaluation::recipient(student, &board.class),
                        user,
                        || refetch = true,
                    )
                    .await;
                report(&progress, &result, "Avaliação salva", "Erro ao salvar avaliação");
                if refetch {
                    self.show_cell(&cell).await?;
                }
                result?;
            }

            Command::Resend { cell, yes } => {
                let board = self.load_board().await?;
                let (student, activity) = locate(&board, &cell)?;
                let submission = require_submission(&board, student, activity)?;

                let mut gate = ResubmissionGate::new();
                gate.open(submission)?;
                if !yes
                    && !ask(&format!(
                        "Liberar o reenvio de {} para \"{}\"?",
                        student.name, activity.title
                    ))?
                {
                    gate.cancel();
                    println!("Operação cancelada");
                    return Ok(());
                }

                let mut refetch = false;
                let progress = Progress::start("Liberando reenvio...");
                let result = gate
                    .confirm(
                        &self.api,
                        submission,
                        evaluation::recipient(student, &board.class),
                        || refetch = true,
                    )
                    .await;
                report(&progress, &result, "Reenvio liberado", "Erro ao liberar reenvio");
                if refetch {
                    self.show_cell(&cell).await?;
                }
                result?;
            }

            Command::MarkExternal(cell) => {
                let board = self.load_board().await?;
                let (student, activity) = locate(&board, &cell)?;
                let user = self.user()?;
                let current = board
                    .submission_for(student, activity)
                    .map(|s| s.status.clone())
                    .unwrap_or(SubmissionStatus::NotReceived);
                let record = ExternalSubmission {
                    class_id: board.class.id.clone(),
                    participant_id: student.id.clone(),
                    activity_id: activity.id.clone(),
                    title: activity.title.clone(),
                    course_id: board.class.course_id.clone(),
                    cycle_id: board.class.cycle_id.clone(),
                    facilitator_id: user.id.clone(),
                };

                let mut refetch = false;
                let progress = Progress::start("Registrando recebimento...");
                let result =
                    external_channel::mark_external(&self.api, &current, &record, || refetch = true)
                        .await;
                report(
                    &progress,
                    &result,
                    "Marcada como recebida em outro canal",
                    "Erro ao registrar recebimento",
                );
                if refetch {
                    self.show_cell(&cell).await?;
                }
                result?;
            }

            Command::RevertExternal(cell) => {
                let board = self.load_board().await?;
                let (student, activity) = locate(&board, &cell)?;
                let submission = require_submission(&board, student, activity)?;

                let mut refetch = false;
                let progress = Progress::start("Desfazendo recebimento...");
                let result = external_channel::revert_to_not_received(&self.api, submission, || {
                    refetch = true
                })
                .await;
                report(
                    &progress,
                    &result,
                    "Submissão voltou para \"não recebida\"",
                    "Erro ao desfazer recebimento",
                );
                if refetch {
                    self.show_cell(&cell).await?;
                }
                result?;
            }

            Command::Download { cell, dest } => {
                let board = self.load_board().await?;
                let (student, activity) = locate(&board, &cell)?;
                let submission = require_submission(&board, student, activity)?;

                let progress = Progress::start("Baixando arquivos...");
                let result =
                    evaluation::download_all(&self.api, submission, &board.class, today(), &dest)
                        .await;
                match &result {
                    Ok(path) => progress.success(&format!("Arquivos salvos em {}", path.display())),
                    Err(_) => progress.failure("Erro ao baixar arquivos"),
                }
                result?;
            }

            Command::DownloadLink(cell) => {
                let board = self.load_board().await?;
                let (student, activity) = locate(&board, &cell)?;
                let submission = require_submission(&board, student, activity)?;
                if submission.items.is_empty() {
                    println!("A submissão não tem arquivos");
                }
                for item in &submission.items {
                    let link = evaluation::download_link(&self.config.web_origin, item)?;
                    println!("{}: {link}", item.name);
                }
            }

            Command::ToggleActivity {
                participant,
                activity_index,
            } => {
                let board = self.load_board().await?;
                let student = find_student(&board, &participant)?;
                let guard = CancellationGuard::for_class(&board.class, today());

                let mut refetch = false;
                let progress = Progress::start("Atualizando atividade...");
                let result =
                    toggle_activity(&self.api, &guard, student, activity_index, || refetch = true)
                        .await;
                match &result {
                    Ok(true) => progress.success(&format!("Atividade {activity_index} concluída")),
                    Ok(false) => progress.success(&format!("Atividade {activity_index} reaberta")),
                    Err(_) => progress.failure("Erro ao atualizar atividade"),
                }
                if refetch {
                    let board = self.load_board().await?;
                    ui::print_participation(&board.participation(&guard));
                }
                result?;
            }

            Command::CancelEnrollment { participant, yes } => {
                let board = self.load_board().await?;
                let student = find_student(&board, &participant)?;
                let guard = CancellationGuard::for_class(&board.class, today());

                let mut workflow = CancellationWorkflow::new();
                workflow.select(student, &guard)?;
                if !yes
                    && !ask(&format!(
                        "Solicitar o cancelamento da matrícula de {}?",
                        student.name
                    ))?
                {
                    workflow.dismiss();
                    println!("Operação cancelada");
                    return Ok(());
                }

                let mut refetch = false;
                let progress = Progress::start("Solicitando cancelamento...");
                let result = workflow.confirm(&self.api, || refetch = true).await;
                match &result {
                    Ok(receipt) => progress.success(
                        receipt
                            .message
                            .as_deref()
                            .unwrap_or("Cancelamento solicitado"),
                    ),
                    Err(_) => progress.failure("Erro ao solicitar cancelamento"),
                }
                if refetch {
                    let board = self.load_board().await?;
                    ui::print_participation(&board.participation(&guard));
                }
                result?;
            }

            Command::CancelRegistration {
                enrollment,
                reason,
                other,
                yes,
            } => self.cancel_registration(&enrollment, reason, other, yes).await?,

            Command::Participant(ParticipantCommand::Enter {
                participant,
                activity,
                page,
            }) => {
                let board = self.load_board().await?;
                let student = find_student(&board, &participant)?;
                if !student.is_enrollment_active() {
                    bail!("{} has no active enrollment", student.name);
                }
                let activity_id = match activity.as_deref() {
                    Some(needle) => Some(find_activity(&board, needle)?.id.clone()),
                    None => None,
                };
                let target = ParticipantTarget {
                    participant_id: student.id.clone(),
                    participant_name: student.name.clone(),
                    activity_id,
                };

                session::enter_participant_mode(
                    &self.api,
                    &mut self.auth,
                    &mut self.store,
                    target,
                    &page,
                )
                .await?;
                self.api
                    .set_token(self.auth.current().map(|g| g.token.clone()));
                println!("Navegando como {}", student.name);
            }

            Command::Participant(ParticipantCommand::Exit) => {
                let page = session::exit_participant_mode(&mut self.auth, &mut self.store).await?;
                self.api
                    .set_token(self.auth.current().map(|g| g.token.clone()));
                match page {
                    Some(page) => println!("Modo participante encerrado. Voltar para {page}"),
                    None => println!("Modo participante encerrado"),
                }
            }
        }
        Ok(())
    }

    fn user(&self) -> Result<&UserProfile, PainelError> {
        self.auth
            .current()
            .map(|g| &g.user)
            .ok_or(PainelError::NotSignedIn)
    }

    fn class_id(&mut self) -> Result<String, PainelError> {
        if let Some(class_id) = &self.class_override {
            return Ok(class_id.clone());
        }
        self.store
            .resolve_class(Utc::now())?
            .ok_or(PainelError::NoClassSelected)
    }

    async fn load_board(&mut self) -> Result<ClassBoard> {
        let class_id = self.class_id()?;
        let progress = Progress::start("Carregando turma...");
        match ClassBoard::load(&self.api, &class_id).await {
            Ok(board) => {
                progress.clear();
                Ok(board)
            }
            Err(e) => {
                progress.failure("Erro ao carregar a turma");
                Err(e.into())
            }
        }
    }

    /// Busca de novo a célula no BFF e imprime o detalhe.
    async fn show_cell(&mut self, cell: &CellArgs) -> Result<()> {
        let board = self.load_board().await?;
        let (student, activity) = locate(&board, cell)?;
        let user = self.user()?;
        let cells = board.cells(activity, user);
        let found = cells
            .iter()
            .find(|c| c.student.id == student.id)
            .ok_or_else(|| anyhow!("participant {} not found", cell.participant))?;
        ui::print_cell(found);
        Ok(())
    }

    async fn cancel_registration(
        &mut self,
        enrollment: &str,
        reason: Option<usize>,
        other: Option<String>,
        yes: bool,
    ) -> Result<()> {
        let token = self
            .auth
            .current()
            .map(|g| g.token.clone())
            .filter(|t| !t.is_empty())
            .or_else(|| Some(self.config.token.clone()).filter(|t| !t.is_empty()))
            .ok_or(PainelError::NotSignedIn)?;

        let reason = match (reason, other) {
            (Some(n), _) => CancelReason::presets()
                .into_iter()
                .nth(n.wrapping_sub(1))
                .ok_or_else(|| anyhow!("reason must be between 1 and 4, got {n}"))?,
            (None, Some(text)) => CancelReason::Other(text),
            (None, None) => {
                for (i, preset) in CancelReason::presets().iter().enumerate() {
                    println!("  {}. {}", i + 1, preset.label());
                }
                bail!("choose a reason with --reason <1-4> or --other <texto>");
            }
        };

        let mut flow = SelfServiceCancellation::new();
        flow.choose_reason(reason);
        flow.proceed()?;
        if !yes && !ask("Tem certeza? O cancelamento da matrícula não pode ser desfeito.")? {
            flow.back();
            println!("Operação cancelada");
            return Ok(());
        }

        let progress = Progress::start("Cancelando matrícula...");
        let result = flow.confirm(&self.api, enrollment, &token).await;
        report(&progress, &result, "Matrícula cancelada", "Erro ao cancelar matrícula");
        result?;

        info!(enrollment, "starting logout countdown");
        let dim = Style::new().dim();
        let term = Term::stdout();
        let leave_now = async {
            if tokio::signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await;
            }
        };
        LogoutCountdown::new(self.config.logout_countdown_secs)
            .run(&mut self.store, &mut self.auth, leave_now, |remaining| {
                let _ = term.clear_line();
                let _ = term.write_str(&format!(
                    "{}",
                    dim.apply_to(format!(
                        "Você será desconectado em {remaining}s (Ctrl+C para sair agora)"
                    ))
                ));
            })
            .await?;
        let _ = term.write_line("");
        debug!("countdown finished");
        println!("Sessão encerrada");
        Ok(())
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn find_student<'a>(board: &'a ClassBoard, needle: &str) -> Result<&'a Student> {
    board
        .find_student(needle)
        .ok_or_else(|| anyhow!("participant {needle} not found in class {}", board.class.id))
}

fn find_activity<'a>(board: &'a ClassBoard, needle: &str) -> Result<&'a Activity> {
    board
        .find_activity(needle)
        .ok_or_else(|| anyhow!("activity {needle} not found in class {}", board.class.id))
}

fn locate<'a>(board: &'a ClassBoard, cell: &CellArgs) -> Result<(&'a Student, &'a Activity)> {
    Ok((
        find_student(board, &cell.participant)?,
        find_activity(board, &cell.activity)?,
    ))
}

fn require_submission<'a>(
    board: &'a ClassBoard,
    student: &Student,
    activity: &Activity,
) -> Result<&'a Submission> {
    board
        .submission_for(student, activity)
        .ok_or_else(|| anyhow!("{} has no submission for \"{}\"", student.name, activity.title))
}

fn report<T>(progress: &Progress, result: &Result<T, PainelError>, ok: &str, failed: &str) {
    match result {
        Ok(_) => progress.success(ok),
        Err(_) => progress.failure(failed),
    }
}

/// Pergunta sim/não no terminal; qualquer coisa além de "s"/"y" é não.
fn ask(prompt: &str) -> Result<bool> {
    let term = Term::stdout();
    term.write_str(&format!("{prompt} [s/N] "))?;
    let answer = term.read_line()?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(
        answer.trim().to_lowercase().as_str(),
        "s" | "sim" | "y" | "yes"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrollment::fixtures::{class, student};
    use crate::submission::fixtures::{file, submission};

    fn board() -> ClassBoard {
        let mut received = submission(SubmissionStatus::Received, vec![file("f1")]);
        received.participant_id = "p-e-1".into();
        ClassBoard {
            class: class(true),
            students: vec![student("e-1"), student("e-2")],
            submissions: vec![received],
        }
    }

    #[test]
    fn yes_answers() {
        assert!(is_yes("s\n"));
        assert!(is_yes(" Sim "));
        assert!(is_yes("y"));
        assert!(!is_yes(""));
        assert!(!is_yes("não"));
    }

    #[test]
    fn locate_accepts_enrollment_and_index() {
        let board = board();
        let cell = CellArgs {
            participant: "e-1".into(),
            activity: "1".into(),
        };
        let (student, activity) = locate(&board, &cell).unwrap();
        assert_eq!(student.id, "p-e-1");
        assert_eq!(activity.id, "a-1");
        assert!(require_submission(&board, student, activity).is_ok());
    }

    #[test]
    fn missing_submission_is_an_error() {
        let board = board();
        let student = find_student(&board, "e-2").unwrap();
        let activity = find_activity(&board, "a-1").unwrap();
        let err = require_submission(&board, student, activity).unwrap_err();
        assert!(err.to_string().contains("has no submission"));
        assert!(find_activity(&board, "9").is_err());
    }
}
