//! Interface de linha de comando do painel baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] e flags globais
//! (--config, --class, --verbose).

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::board::Layout;
use crate::session::Role;

/// Painel do facilitador: submissões, avaliações e matrículas.
#[derive(Debug, Parser)]
#[command(name = "painel", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Caminho do arquivo de configuração (padrão: ./painel.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Turma a usar nesta chamada, em vez da turma selecionada.
    #[arg(long = "class", global = true)]
    pub class_override: Option<String>,

    /// Habilita saída detalhada (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LayoutArg {
    /// Uma atividade por página.
    Paged,
    /// Matriz completa atividades × participantes.
    Table,
}

impl From<LayoutArg> for Layout {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::Paged => Layout::Paged,
            LayoutArg::Table => Layout::Table,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RoleArg {
    Facilitator,
    Supervisor,
    Student,
    Admin,
}

impl From<RoleArg> for Role {
    fn from(arg: RoleArg) -> Self {
        match arg {
            RoleArg::Facilitator => Role::Facilitator,
            RoleArg::Supervisor => Role::Supervisor,
            RoleArg::Student => Role::Student,
            RoleArg::Admin => Role::Admin,
        }
    }
}

/// Participante (id ou matrícula) e atividade (id ou índice).
#[derive(Debug, Clone, Args)]
pub struct CellArgs {
    pub participant: String,
    pub activity: String,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Salva a sessão autenticada usada nas chamadas ao BFF.
    Login {
        #[arg(long)]
        token: String,
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long = "role", value_enum, required = true)]
        roles: Vec<RoleArg>,
    },

    /// Encerra a sessão salva.
    Logout,

    /// Seleção da turma atual.
    #[command(subcommand)]
    Class(ClassCommand),

    /// Mostra o acompanhamento da turma (atividades × participantes).
    Board {
        #[arg(long, value_enum, default_value = "table")]
        layout: LayoutArg,

        /// Página (1-based) no layout paginado.
        #[arg(long, default_value_t = 1)]
        page: usize,
    },

    /// Tabela de participação com matrícula e atividades concluídas.
    Participation,

    /// Mostra a submissão de um participante em uma atividade.
    Show(CellArgs),

    /// Registra nota (0–5) e comentário para uma submissão recebida.
    Evaluate {
        #[command(flatten)]
        cell: CellArgs,
        #[arg(long)]
        score: u8,
        #[arg(long)]
        comment: String,
    },

    /// Libera o reenvio de uma submissão.
    Resend {
        #[command(flatten)]
        cell: CellArgs,
        /// Confirma sem perguntar.
        #[arg(long)]
        yes: bool,
    },

    /// Marca a submissão como recebida em outro canal.
    MarkExternal(CellArgs),

    /// Volta uma submissão recebida em outro canal para "não recebida".
    RevertExternal(CellArgs),

    /// Baixa todos os arquivos da submissão em um único pacote.
    Download {
        #[command(flatten)]
        cell: CellArgs,
        #[arg(long, default_value = ".")]
        dest: PathBuf,
    },

    /// Imprime os links de download via proxy para cada arquivo.
    DownloadLink(CellArgs),

    /// Alterna a conclusão de uma atividade na tabela de participação.
    ToggleActivity {
        participant: String,
        activity_index: u32,
    },

    /// Solicita o cancelamento da matrícula de um participante.
    CancelEnrollment {
        participant: String,
        #[arg(long)]
        yes: bool,
    },

    /// Cancela a própria matrícula e encerra a sessão após a contagem.
    CancelRegistration {
        /// Matrícula a cancelar.
        #[arg(long)]
        enrollment: String,
        /// Motivo pré-definido (1–4).
        #[arg(long, conflicts_with = "other")]
        reason: Option<usize>,
        /// Motivo livre.
        #[arg(long)]
        other: Option<String>,
        #[arg(long)]
        yes: bool,
    },

    /// Modo participante (supervisor navegando como participante).
    #[command(subcommand)]
    Participant(ParticipantCommand),
}

#[derive(Debug, Subcommand)]
pub enum ClassCommand {
    /// Seleciona a turma por 24h.
    Select { class_id: String },
    /// Mostra a turma selecionada.
    Current,
}

#[derive(Debug, Subcommand)]
pub enum ParticipantCommand {
    /// Entra como o participante informado.
    Enter {
        participant: String,
        /// Atividade em foco, se houver.
        #[arg(long)]
        activity: Option<String>,
        /// Página para onde voltar ao sair.
        #[arg(long, default_value = "/acompanhamento")]
        page: String,
    },
    /// Volta para a sessão do supervisor.
    Exit,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_evaluate_subcommand() {
        let cli = Cli::parse_from([
            "painel",
            "evaluate",
            "p-1",
            "2",
            "--score",
            "4",
            "--comment",
            "Ótimo trabalho!",
        ]);
        match cli.command {
            Command::Evaluate {
                cell,
                score,
                comment,
            } => {
                assert_eq!(cell.participant, "p-1");
                assert_eq!(cell.activity, "2");
                assert_eq!(score, 4);
                assert_eq!(comment, "Ótimo trabalho!");
            }
            _ => panic!("expected Evaluate command"),
        }
    }

    #[test]
    fn cli_parses_global_flags() {
        let cli = Cli::parse_from([
            "painel",
            "--class",
            "c-9",
            "--verbose",
            "board",
            "--layout",
            "paged",
            "--page",
            "2",
        ]);
        assert!(cli.verbose);
        assert_eq!(cli.class_override.as_deref(), Some("c-9"));
        assert!(matches!(
            cli.command,
            Command::Board {
                layout: LayoutArg::Paged,
                page: 2
            }
        ));
    }

    #[test]
    fn cli_parses_login_roles() {
        let cli = Cli::parse_from([
            "painel", "login", "--token", "t", "--id", "u", "--name", "Ana", "--email",
            "ana@example.com", "--role", "facilitator", "--role", "supervisor",
        ]);
        match cli.command {
            Command::Login { roles, .. } => {
                let roles: Vec<Role> = roles.into_iter().map(Role::from).collect();
                assert_eq!(roles, vec![Role::Facilitator, Role::Supervisor]);
            }
            _ => panic!("expected Login command"),
        }
    }

    #[test]
    fn cancel_registration_reason_conflicts_with_other() {
        let result = Cli::try_parse_from([
            "painel",
            "cancel-registration",
            "--enrollment",
            "e-1",
            "--reason",
            "1",
            "--other",
            "mudança de cidade",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_verify() {
        Cli::command().debug_assert();
    }
}
