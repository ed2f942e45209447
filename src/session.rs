//! Estado local do painel: armazenamento chave-valor, sessão autenticada e
//! modo participante.
//!
//! [`SessionStore`] guarda em um arquivo JSON as mesmas chaves que o front-end
//! mantinha no navegador (turma selecionada com validade de 24h, contexto do
//! modo participante). [`FileAuth`] é o provedor de autenticação: guarda o
//! token e o perfil do usuário em um arquivo próprio.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::bff::BffApi;
use crate::error::{LifecycleError, PainelError};

/// Chaves usadas no armazenamento local.
pub mod keys {
    pub const CLASS_ID: &str = "class_id";
    pub const CLASS_ID_EXPIRATION: &str = "class_id_expiration";
    pub const COURSE_ID: &str = "course_id";
    pub const IS_PARTICIPANT_MODE: &str = "isParticipantMode";
    pub const PARTICIPANT_MODE_STORAGE: &str = "participantModeStorage";
    pub const ORIGINAL_PAGE: &str = "originalPage";
}

/// Chaves removidas quando a sessão termina por cancelamento de matrícula.
pub const LOGOUT_KEYS: [&str; 3] = [keys::CLASS_ID, keys::CLASS_ID_EXPIRATION, keys::COURSE_ID];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Facilitator,
    Supervisor,
    Student,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub roles: Vec<Role>,
}

impl UserProfile {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

/// Credenciais de uma sessão autenticada.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionGrant {
    pub token: String,
    pub user: UserProfile,
}

/// Provedor de autenticação (login/logout).
#[allow(async_fn_in_trait)]
pub trait AuthProvider {
    fn current(&self) -> Option<&SessionGrant>;
    async fn sign_in(&mut self, grant: &SessionGrant) -> Result<(), PainelError>;
    async fn sign_out(&mut self) -> Result<(), PainelError>;
}

/// Armazenamento chave-valor persistido em JSON.
#[derive(Debug, Default)]
pub struct SessionStore {
    path: Option<PathBuf>,
    values: BTreeMap<String, serde_json::Value>,
}

impl SessionStore {
    /// Abre o arquivo de estado; um arquivo ausente começa vazio.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PainelError> {
        let path = path.into();
        let values = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path: Some(path),
            values,
        })
    }

    /// Store que nunca toca o disco.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Valor com tipo `T`; valores que não desserializam contam como ausentes.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.values.get(key)?;
        match serde_json::from_value(value.clone()) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(key, error = %e, "ignoring malformed stored value");
                None
            }
        }
    }

    pub fn set<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<(), PainelError> {
        self.values.insert(key.to_string(), serde_json::to_value(value)?);
        Ok(())
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.values.remove(key).is_some()
    }

    /// Grava o estado de forma atômica (arquivo temporário + rename).
    pub fn save(&self) -> Result<(), PainelError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        write_json_atomically(path, &self.values)
    }

    /// Seleciona a turma atual por `ttl` a partir de `now`.
    pub fn select_class(
        &mut self,
        class_id: &str,
        course_id: Option<&str>,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<(), PainelError> {
        let expires_at = (now + ttl).timestamp_millis();
        self.set(keys::CLASS_ID, class_id)?;
        self.set(keys::CLASS_ID_EXPIRATION, &expires_at)?;
        if let Some(course_id) = course_id {
            self.set(keys::COURSE_ID, course_id)?;
        }
        debug!(class_id, expires_at, "class selected");
        Ok(())
    }

    /// Turma selecionada, se ainda válida. Uma seleção expirada é descartada.
    pub fn current_class(&mut self, now: DateTime<Utc>) -> Option<String> {
        let class_id = self.get::<String>(keys::CLASS_ID)?;
        let expires_at = self.get::<i64>(keys::CLASS_ID_EXPIRATION)?;
        if now.timestamp_millis() >= expires_at {
            self.remove(keys::CLASS_ID);
            self.remove(keys::CLASS_ID_EXPIRATION);
            return None;
        }
        Some(class_id)
    }

    /// Like [`current_class`](Self::current_class), but writes the store back
    /// when an expired selection was dropped.
    pub fn resolve_class(&mut self, now: DateTime<Utc>) -> Result<Option<String>, PainelError> {
        let had_selection = self.values.contains_key(keys::CLASS_ID);
        let current = self.current_class(now);
        if had_selection && current.is_none() {
            debug!("expired class selection removed");
            self.save()?;
        }
        Ok(current)
    }

    pub fn is_participant_mode(&self) -> bool {
        self.get::<bool>(keys::IS_PARTICIPANT_MODE).unwrap_or(false)
    }

    pub fn participant_context(&self) -> Option<ParticipantModeContext> {
        self.get(keys::PARTICIPANT_MODE_STORAGE)
    }
}

fn write_json_atomically<T: Serialize>(path: &Path, value: &T) -> Result<(), PainelError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&mut tmp, value)?;
    tmp.persist(path).map_err(|e| PainelError::Io(e.error))?;
    Ok(())
}

/// Provedor de autenticação baseado em arquivo.
#[derive(Debug)]
pub struct FileAuth {
    path: PathBuf,
    current: Option<SessionGrant>,
}

impl FileAuth {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PainelError> {
        let path = path.into();
        let current = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Some(serde_json::from_str(&contents)?)
        } else {
            None
        };
        Ok(Self { path, current })
    }
}

impl AuthProvider for FileAuth {
    fn current(&self) -> Option<&SessionGrant> {
        self.current.as_ref()
    }

    async fn sign_in(&mut self, grant: &SessionGrant) -> Result<(), PainelError> {
        write_json_atomically(&self.path, grant)?;
        self.current = Some(grant.clone());
        info!(user = %grant.user.email, "signed in");
        Ok(())
    }

    async fn sign_out(&mut self) -> Result<(), PainelError> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        if let Some(grant) = self.current.take() {
            info!(user = %grant.user.email, "signed out");
        }
        Ok(())
    }
}

/// Participante a ser "visitado" por um supervisor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantTarget {
    pub participant_id: String,
    pub participant_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_id: Option<String>,
}

/// Contexto salvo enquanto o supervisor navega como participante.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantModeContext {
    pub supervisor: SessionGrant,
    pub target: ParticipantTarget,
}

/// Entra no modo participante: troca a sessão do supervisor pela do participante.
///
/// Se o login como participante falhar, a sessão do supervisor é restaurada
/// e o armazenamento local volta ao estado anterior.
pub async fn enter_participant_mode(
    api: &impl BffApi,
    auth: &mut impl AuthProvider,
    store: &mut SessionStore,
    target: ParticipantTarget,
    original_page: &str,
) -> Result<(), PainelError> {
    if store.is_participant_mode() {
        return Err(LifecycleError::AlreadyInParticipantMode.into());
    }
    let supervisor = auth.current().cloned().ok_or(PainelError::NotSignedIn)?;
    if !supervisor.user.has_role(Role::Supervisor) {
        return Err(LifecycleError::NotSupervisor.into());
    }

    let grant = api.participant_session(&target.participant_id).await?;

    let context = ParticipantModeContext {
        supervisor: supervisor.clone(),
        target,
    };
    store.set(keys::PARTICIPANT_MODE_STORAGE, &context)?;
    store.set(keys::IS_PARTICIPANT_MODE, &true)?;
    store.set(keys::ORIGINAL_PAGE, original_page)?;
    store.save()?;

    auth.sign_out().await?;
    if let Err(e) = auth.sign_in(&grant).await {
        warn!(error = %e, "participant sign-in failed, restoring supervisor session");
        clear_participant_keys(store);
        store.save()?;
        auth.sign_in(&supervisor).await?;
        return Err(e);
    }

    info!(participant = %context.target.participant_id, "entered participant mode");
    Ok(())
}

/// Sai do modo participante e devolve a página onde o supervisor estava.
pub async fn exit_participant_mode(
    auth: &mut impl AuthProvider,
    store: &mut SessionStore,
) -> Result<Option<String>, PainelError> {
    let context = store
        .participant_context()
        .ok_or(LifecycleError::NotInParticipantMode)?;
    let original_page = store.get::<String>(keys::ORIGINAL_PAGE);

    auth.sign_out().await?;
    auth.sign_in(&context.supervisor).await?;

    clear_participant_keys(store);
    store.save()?;
    info!(participant = %context.target.participant_id, "left participant mode");
    Ok(original_page)
}

fn clear_participant_keys(store: &mut SessionStore) {
    store.remove(keys::IS_PARTICIPANT_MODE);
    store.remove(keys::PARTICIPANT_MODE_STORAGE);
    store.remove(keys::ORIGINAL_PAGE);
}


#[cfg(test)]
mod tests {
    use super::fixtures::{MemoryAuth, grant};
    use super::*;
    use crate::bff::mock::MockBff;
    use tempfile::TempDir;

    fn target() -> ParticipantTarget {
        ParticipantTarget {
            participant_id: "p-1".into(),
            participant_name: "Maria".into(),
            activity_id: Some("a-1".into()),
        }
    }

    #[test]
    fn class_selection_expires_after_ttl() {
        let mut store = SessionStore::in_memory();
        let now = Utc::now();
        store
            .select_class("c-1", Some("course-1"), now, Duration::hours(24))
            .unwrap();

        assert_eq!(store.current_class(now + Duration::hours(23)).as_deref(), Some("c-1"));
        assert_eq!(store.current_class(now + Duration::hours(24)), None);
        assert_eq!(store.get::<String>(keys::CLASS_ID), None);
        assert_eq!(store.get::<String>(keys::COURSE_ID).as_deref(), Some("course-1"));
    }

    #[test]
    fn store_roundtrips_through_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");

        let mut store = SessionStore::open(&path).unwrap();
        store.set(keys::ORIGINAL_PAGE, "/atividades").unwrap();
        store.save().unwrap();

        let reopened = SessionStore::open(&path).unwrap();
        assert_eq!(reopened.get::<String>(keys::ORIGINAL_PAGE).as_deref(), Some("/atividades"));
    }

    #[test]
    fn expired_selection_is_removed_from_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        let now = Utc::now();

        let mut store = SessionStore::open(&path).unwrap();
        store
            .select_class("c-1", None, now - Duration::hours(25), Duration::hours(24))
            .unwrap();
        store.save().unwrap();

        let mut store = SessionStore::open(&path).unwrap();
        assert_eq!(store.resolve_class(now).unwrap(), None);

        let reopened = SessionStore::open(&path).unwrap();
        assert_eq!(reopened.get::<String>(keys::CLASS_ID), None);
        assert_eq!(reopened.get::<i64>(keys::CLASS_ID_EXPIRATION), None);
    }

    #[test]
    fn valid_selection_resolves_without_changes() {
        let mut store = SessionStore::in_memory();
        let now = Utc::now();
        store.select_class("c-1", None, now, Duration::hours(24)).unwrap();
        assert_eq!(store.resolve_class(now).unwrap().as_deref(), Some("c-1"));
    }

    #[test]
    fn malformed_value_reads_as_absent() {
        let mut store = SessionStore::in_memory();
        store.set(keys::CLASS_ID_EXPIRATION, "amanhã").unwrap();
        assert_eq!(store.get::<i64>(keys::CLASS_ID_EXPIRATION), None);
    }

    #[tokio::test]
    async fn file_auth_sign_in_and_out() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credentials.json");
        let mut auth = FileAuth::open(&path).unwrap();
        assert!(auth.current().is_none());

        auth.sign_in(&grant("sup", vec![Role::Supervisor])).await.unwrap();
        let reopened = FileAuth::open(&path).unwrap();
        assert_eq!(reopened.current().unwrap().token, "token-sup");

        auth.sign_out().await.unwrap();
        assert!(auth.current().is_none());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn enter_and_exit_participant_mode() {
        let api = MockBff::default().with_grant(grant("p-1", vec![Role::Student]));
        let mut auth = MemoryAuth {
            current: Some(grant("sup", vec![Role::Supervisor])),
            ..Default::default()
        };
        let mut store = SessionStore::in_memory();

        enter_participant_mode(&api, &mut auth, &mut store, target(), "/acompanhamento")
            .await
            .unwrap();

        assert!(store.is_participant_mode());
        assert_eq!(auth.current().unwrap().user.id, "p-1");
        assert_eq!(auth.log, vec!["sign_out", "sign_in:p-1"]);
        assert_eq!(store.participant_context().unwrap().supervisor.user.id, "sup");

        let page = exit_participant_mode(&mut auth, &mut store).await.unwrap();
        assert_eq!(page.as_deref(), Some("/acompanhamento"));
        assert_eq!(auth.current().unwrap().user.id, "sup");
        assert!(!store.is_participant_mode());
        assert!(store.participant_context().is_none());
    }

    #[tokio::test]
    async fn only_supervisors_enter_participant_mode() {
        let api = MockBff::default();
        let mut auth = MemoryAuth {
            current: Some(grant("fac", vec![Role::Facilitator])),
            ..Default::default()
        };
        let mut store = SessionStore::in_memory();

        let err = enter_participant_mode(&api, &mut auth, &mut store, target(), "/")
            .await
            .unwrap_err();
        assert!(matches!(err, PainelError::Lifecycle(LifecycleError::NotSupervisor)));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn failed_participant_sign_in_restores_supervisor() {
        let api = MockBff::default().with_grant(grant("p-1", vec![Role::Student]));
        let mut auth = MemoryAuth {
            current: Some(grant("sup", vec![Role::Supervisor])),
            fail_sign_in_for: Some("p-1".into()),
            ..Default::default()
        };
        let mut store = SessionStore::in_memory();

        let result = enter_participant_mode(&api, &mut auth, &mut store, target(), "/").await;

        assert!(result.is_err());
        assert_eq!(auth.current().unwrap().user.id, "sup");
        assert!(!store.is_participant_mode());
    }

    #[tokio::test]
    async fn exit_without_participant_mode_fails() {
        let mut auth = MemoryAuth::default();
        let mut store = SessionStore::in_memory();
        let err = exit_participant_mode(&mut auth, &mut store).await.unwrap_err();
        assert!(matches!(err, PainelError::Lifecycle(LifecycleError::NotInParticipantMode)));
    }
}
