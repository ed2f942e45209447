//! Painel do facilitador: ciclo de vida das submissões de atividades,
//! avaliação, liberação de reenvio, recebimento por outro canal,
//! cancelamento de matrícula e modo participante, falando com o BFF por HTTP.

pub mod app;
pub mod bff;
pub mod board;
pub mod cli;
pub mod config;
pub mod enrollment;
pub mod error;
pub mod evaluation;
pub mod external_channel;
pub mod resubmission;
pub mod session;
pub mod submission;
pub mod ui;
