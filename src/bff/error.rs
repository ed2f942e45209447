//! Tipos de erro para o cliente do BFF.
//!
//! Define [`BffError`] com variantes para respostas não-2xx, timeouts,
//! falhas de rede e corpos inesperados. Usa `thiserror` para derivar
//! `Display` e `Error` a partir dos atributos `#[error(...)]`.

use thiserror::Error;

/// Erros que podem ocorrer ao falar com o backend-for-frontend.
///
/// - [`Api`](BffError::Api): o BFF respondeu com status fora da faixa 2xx
/// - [`Timeout`](BffError::Timeout): a requisição excedeu o timeout configurado
/// - [`Network`](BffError::Network): falha na camada de rede (DNS, conexão recusada)
/// - [`Unexpected`](BffError::Unexpected): 2xx com corpo que não confirma a operação
#[derive(Debug, Error)]
pub enum BffError {
    /// Status HTTP e a mensagem devolvida no corpo, se houver.
    #[error("BFF returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("request timed out")]
    Timeout,

    #[error("invalid BFF base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("network error: {0}")]
    Network(reqwest::Error),

    /// A chamada respondeu 2xx mas o corpo não confirma o resultado esperado
    /// (ex.: cancelamento sem `status: "cancelled"`).
    #[error("unexpected response: {0}")]
    Unexpected(String),
}

impl From<reqwest::Error> for BffError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            BffError::Timeout
        } else if err.is_decode() {
            BffError::Unexpected(err.to_string())
        } else {
            BffError::Network(err)
        }
    }
}

impl BffError {
    /// Status HTTP associado ao erro, quando o BFF chegou a responder.
    pub fn status(&self) -> Option<u16> {
        match self {
            BffError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_display() {
        let err = BffError::Api {
            status: 422,
            message: "enrollment already cancelled".into(),
        };
        assert_eq!(
            err.to_string(),
            "BFF returned status 422: enrollment already cancelled"
        );
        assert_eq!(err.status(), Some(422));
    }

    #[test]
    fn timeout_has_no_status() {
        assert_eq!(BffError::Timeout.to_string(), "request timed out");
        assert_eq!(BffError::Timeout.status(), None);
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<BffError>();
    }
}
