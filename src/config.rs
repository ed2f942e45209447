//! Configuração do painel carregada a partir de `painel.toml`.
//!
//! A struct [`PainelConfig`] contém todos os parâmetros configuráveis.
//! Valores não presentes no arquivo usam defaults sensíveis.
//! As variáveis de ambiente `PAINEL_BASE_URL` e `PAINEL_TOKEN` têm
//! precedência sobre o arquivo.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::bff::Timeouts;

pub const DEFAULT_CONFIG_FILE: &str = "painel.toml";

/// Configuração de nível superior carregada de `painel.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct PainelConfig {
    /// URL base do BFF.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Origem do front-end web, usada para montar links `/api/download`.
    #[serde(default = "default_web_origin")]
    pub web_origin: String,

    /// Token fixo; quando vazio, usa a sessão salva em `credentials_file`.
    #[serde(default)]
    pub token: String,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Timeout total por requisição. Mutações não são retentadas.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Arquivo com o armazenamento local (turma selecionada, modo participante).
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,

    /// Arquivo com a sessão autenticada.
    #[serde(default = "default_credentials_file")]
    pub credentials_file: PathBuf,

    /// Validade da turma selecionada, em horas.
    #[serde(default = "default_class_ttl_hours")]
    pub class_ttl_hours: i64,

    /// Duração da contagem para logout após cancelamento, em segundos.
    #[serde(default = "default_logout_countdown_secs")]
    pub logout_countdown_secs: u32,
}

fn default_base_url() -> String {
    "http://localhost:3000/api/bff".to_string()
}

fn default_web_origin() -> String {
    "http://localhost:3000".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_state_file() -> PathBuf {
    PathBuf::from(".painel-state.json")
}

fn default_credentials_file() -> PathBuf {
    PathBuf::from(".painel-credentials.json")
}

// 24h, como a expiração de `class_id` no navegador.
fn default_class_ttl_hours() -> i64 {
    24
}

fn default_logout_countdown_secs() -> u32 {
    30
}

impl Default for PainelConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            web_origin: default_web_origin(),
            token: String::new(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            state_file: default_state_file(),
            credentials_file: default_credentials_file(),
            class_ttl_hours: default_class_ttl_hours(),
            logout_countdown_secs: default_logout_countdown_secs(),
        }
    }
}

impl PainelConfig {
    /// Carrega a configuração de `path` (ou `painel.toml` no diretório atual).
    /// Usa valores padrão se o arquivo não existir.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.unwrap_or(Path::new(DEFAULT_CONFIG_FILE));
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            toml::from_str::<PainelConfig>(&contents)
                .with_context(|| format!("failed to parse {}", path.display()))?
        } else {
            Self::default()
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    // Variáveis de ambiente têm precedência sobre o arquivo.
    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var("PAINEL_BASE_URL").filter(|v| !v.is_empty()) {
            self.base_url = url;
        }
        if let Some(token) = var("PAINEL_TOKEN").filter(|v| !v.is_empty()) {
            self.token = token;
        }
    }

    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            connect: Duration::from_secs(self.connect_timeout_secs),
            request: Duration::from_secs(self.request_timeout_secs),
        }
    }

    pub fn class_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.class_ttl_hours)
    }
}
