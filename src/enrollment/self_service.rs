//! Cancelamento de matrícula pelo próprio participante.
//!
//! O fluxo tem duas etapas de confirmação (escolha do motivo, depois
//! confirmação explícita). Após o sucesso, uma [`LogoutCountdown`] de 30
//! passos limpa as chaves da turma no armazenamento local e encerra a sessão.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, error, info};

use crate::bff::{BffApi, BffError};
use crate::error::{LifecycleError, PainelError};
use crate::session::{AuthProvider, LOGOUT_KEYS, SessionStore};

/// Motivo informado pelo participante ao cancelar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelReason {
    LackOfTime,
    PersonalReasons,
    ContentMismatch,
    TechnicalProblems,
    Other(String),
}

impl CancelReason {
    /// Motivos pré-definidos, na ordem em que são oferecidos.
    pub fn presets() -> [CancelReason; 4] {
        [
            CancelReason::LackOfTime,
            CancelReason::PersonalReasons,
            CancelReason::ContentMismatch,
            CancelReason::TechnicalProblems,
        ]
    }

    pub fn label(&self) -> &str {
        match self {
            CancelReason::LackOfTime => "Falta de tempo para realizar o curso",
            CancelReason::PersonalReasons => "Motivos pessoais",
            CancelReason::ContentMismatch => "O conteúdo não atendeu às minhas expectativas",
            CancelReason::TechnicalProblems => "Dificuldades técnicas com a plataforma",
            CancelReason::Other(text) => text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelfServiceStep {
    #[default]
    SelectReason,
    Confirm,
    Submitting,
    Done,
}

/// Estado do modal de cancelamento pelo participante.
#[derive(Debug, Default)]
pub struct SelfServiceCancellation {
    step: SelfServiceStep,
    reason: Option<CancelReason>,
}

impl SelfServiceCancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> SelfServiceStep {
        self.step
    }

    pub fn reason(&self) -> Option<&CancelReason> {
        self.reason.as_ref()
    }

    pub fn choose_reason(&mut self, reason: CancelReason) {
        self.reason = Some(reason);
    }

    /// Avança para a segunda confirmação. Exige um motivo não vazio.
    pub fn proceed(&mut self) -> Result<(), LifecycleError> {
        match &self.reason {
            Some(reason) if !reason.label().trim().is_empty() => {
                self.step = SelfServiceStep::Confirm;
                Ok(())
            }
            _ => Err(LifecycleError::ReasonMissing),
        }
    }

    pub fn back(&mut self) {
        if self.step == SelfServiceStep::Confirm {
            self.step = SelfServiceStep::SelectReason;
        }
    }

    /// Envia o cancelamento. Só conta como sucesso `status: "cancelled"`.
    pub async fn confirm(
        &mut self,
        api: &impl BffApi,
        enroll_id: &str,
        token: &str,
    ) -> Result<(), PainelError> {
        let reason = match (&self.step, &self.reason) {
            (SelfServiceStep::Confirm, Some(reason)) => reason.label().to_string(),
            _ => return Err(LifecycleError::NothingToConfirm.into()),
        };

        self.step = SelfServiceStep::Submitting;
        let result = api
            .cancel_enroll(enroll_id, &reason, token)
            .await
            .and_then(|resp| {
                if resp.status == "cancelled" {
                    Ok(())
                } else {
                    Err(BffError::Unexpected(format!(
                        "cancellation status \"{}\"",
                        resp.status
                    )))
                }
            });

        match result {
            Ok(()) => {
                info!(enroll_id, "enrollment cancelled by participant");
                self.step = SelfServiceStep::Done;
                Ok(())
            }
            Err(e) => {
                error!(enroll_id, error = %e, "self-service cancellation failed");
                self.step = SelfServiceStep::Confirm;
                Err(e.into())
            }
        }
    }
}

/// Contagem regressiva até o logout automático.
#[derive(Debug, Clone, Copy)]
pub struct LogoutCountdown {
    remaining: u32,
    period: Duration,
}

impl LogoutCountdown {
    pub const DEFAULT_SECONDS: u32 = 30;

    pub fn new(seconds: u32) -> Self {
        Self {
            remaining: seconds,
            period: Duration::from_secs(1),
        }
    }

    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Roda a contagem até zero (ou até `leave_now` completar), então remove
    /// as chaves da turma de `store` e encerra a sessão uma única vez.
    ///
    /// `on_tick` recebe o valor restante a cada passo, começando pelo inicial.
    /// Descartar o future interrompe a contagem sem efeitos.
    pub async fn run(
        mut self,
        store: &mut SessionStore,
        auth: &mut impl AuthProvider,
        leave_now: impl Future<Output = ()>,
        mut on_tick: impl FnMut(u32),
    ) -> Result<(), PainelError> {
        let mut ticker = tokio::time::interval(self.period);
        ticker.tick().await;
        on_tick(self.remaining);

        tokio::pin!(leave_now);
        while self.remaining > 0 {
            tokio::select! {
                _ = ticker.tick() => {
                    self.remaining -= 1;
                    on_tick(self.remaining);
                }
                _ = &mut leave_now => {
                    debug!(remaining = self.remaining, "logout requested before countdown ended");
                    self.remaining = 0;
                }
            }
        }

        for key in LOGOUT_KEYS {
            store.remove(key);
        }
        // Sign out even if the state file could not be written.
        let saved = store.save();
        if let Err(e) = &saved {
            error!(error = %e, "failed to persist cleared class keys");
        }
        auth.sign_out().await?;
        info!("signed out after enrollment cancellation");
        saved
    }
}
