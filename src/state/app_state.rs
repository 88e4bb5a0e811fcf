use super::{Session, SessionPhase};
use crate::api::{ApiClient, ClientError};
use crate::applications::{ApplicationDraft, ApplicationStore, DraftError, ResumeFile};
use crate::auth::AuthService;
use crate::config::ClientConfig;
use crate::jobs::JobsService;
use crate::store::{FileStore, KeyValueStore, KeyringStore, MemoryStore, SplitStore, StoreError};
use crate::types::{Job, JobApplication, User};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Which surface the app should show for the current session.
#[derive(Debug, Clone, PartialEq)]
pub enum Landing {
    SignIn,
    JobSeeker(User),
    Admin(User),
}

#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("position is closed")]
    JobClosed,
    #[error("already applied to this job")]
    AlreadyApplied,
    #[error(transparent)]
    Draft(#[from] DraftError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Everything the UI layer talks to, wired over one key-value store.
#[derive(Clone)]
pub struct AppState {
    pub session: Session,
    pub api: Arc<ApiClient>,
    pub auth: Arc<AuthService>,
    pub jobs: Arc<JobsService>,
    pub applications: ApplicationStore,
}

impl AppState {
    pub fn new(config: ClientConfig, store: Arc<dyn KeyValueStore>) -> Result<Self, ClientError> {
        let session = Session::new(store);
        let api = Arc::new(ApiClient::new(config, session.clone())?);
        Ok(Self {
            applications: ApplicationStore::for_session(&session),
            session,
            auth: Arc::new(AuthService::new(api.clone())),
            jobs: Arc::new(JobsService::new(api.clone())),
            api,
        })
    }

    /// State persisted to a JSON file at `path`.
    pub async fn open(config: ClientConfig, path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let store = FileStore::open(path).await?;
        info!(path = %store.path().display(), "using file store");
        Self::new(config, Arc::new(store))
    }

    /// Like [`AppState::open`], but tokens go to the OS keychain when one is
    /// reachable. Everything else stays in the file.
    pub async fn open_with_keychain(
        config: ClientConfig,
        path: impl AsRef<Path>,
    ) -> Result<Self, ClientError> {
        Self::open_with_secrets(config, path, KeyringStore::default()).await
    }

    async fn open_with_secrets(
        config: ClientConfig,
        path: impl AsRef<Path>,
        keychain: KeyringStore,
    ) -> Result<Self, ClientError> {
        let file = FileStore::open(path).await?;
        if !keychain.is_available() {
            warn!(path = %file.path().display(), "keychain unavailable, tokens stay in the file store");
            return Self::new(config, Arc::new(file));
        }
        info!(path = %file.path().display(), "using keychain for tokens and file store for the rest");
        Self::new(config, Arc::new(SplitStore::new(Arc::new(keychain), Arc::new(file))))
    }

    pub fn in_memory(config: ClientConfig) -> Result<Self, ClientError> {
        Self::new(config, Arc::new(MemoryStore::new()))
    }

    /// Picks up a previous session at start-up.
    pub async fn landing(&self) -> Result<Landing, StoreError> {
        if self.session.restore().await? != SessionPhase::Authenticated {
            return Ok(Landing::SignIn);
        }
        Ok(match self.session.stored_user().await {
            Some(user) if user.is_admin() => Landing::Admin(user),
            Some(user) => Landing::JobSeeker(user),
            None => {
                self.session.set_phase(SessionPhase::Anonymous).await;
                Landing::SignIn
            }
        })
    }

    /// Records an application for `job`. Closed jobs and jobs already applied
    /// to are rejected.
    pub async fn apply(
        &self,
        job: &Job,
        resume: Option<ResumeFile>,
        cover_letter: &str,
    ) -> Result<JobApplication, ApplyError> {
        if !job.is_active() {
            return Err(ApplyError::JobClosed);
        }
        let application = ApplicationDraft {
            job_id: job.id.clone(),
            job_title: job.title.clone(),
            company_name: job.created_by.clone(),
            resume,
            cover_letter: cover_letter.to_string(),
        }
        .into_application()?;

        if !self.applications.add_if_not_applied(application.clone()).await? {
            return Err(ApplyError::AlreadyApplied);
        }
        info!(job_id = %job.id, id = %application.id, "application submitted");
        Ok(application)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{KEY_ACCESS_TOKEN, KEY_USER};

    fn job(id: &str, status: u8) -> Job {
        Job {
            id: id.to_string(),
            title: "Mobile Engineer".to_string(),
            description: "Ship the app".to_string(),
            location: "Remote".to_string(),
            salary: "$110k".to_string(),
            status,
            created_by: "Acme".to_string(),
            created_day: "2025-02-01".to_string(),
        }
    }

    fn resume() -> Option<ResumeFile> {
        Some(ResumeFile {
            uri: "file:///cache/cv.pdf".to_string(),
            name: "cv.pdf".to_string(),
        })
    }

    #[tokio::test]
    async fn apply_twice_to_same_job_is_rejected() {
        let state = AppState::in_memory(ClientConfig::default()).unwrap();

        state.apply(&job("42", 1), resume(), "").await.unwrap();
        let err = state.apply(&job("42", 1), resume(), "again").await.unwrap_err();

        assert!(matches!(err, ApplyError::AlreadyApplied));
        assert_eq!(state.applications.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn apply_rejects_closed_job_and_missing_resume() {
        let state = AppState::in_memory(ClientConfig::default()).unwrap();

        let err = state.apply(&job("7", 0), resume(), "").await.unwrap_err();
        assert!(matches!(err, ApplyError::JobClosed));

        let err = state.apply(&job("7", 1), None, "").await.unwrap_err();
        assert!(matches!(err, ApplyError::Draft(DraftError::MissingResume)));
        assert!(state.applications.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn landing_without_stored_user_resets_phase() {
        let store = MemoryStore::new();
        store.set(KEY_ACCESS_TOKEN, "token").await.unwrap();
        let state = AppState::new(ClientConfig::default(), Arc::new(store)).unwrap();

        assert_eq!(state.landing().await.unwrap(), Landing::SignIn);
        assert_eq!(state.session.phase().await, SessionPhase::Anonymous);
    }

    #[tokio::test]
    async fn landing_routes_job_seeker() {
        let store = MemoryStore::new();
        store.set(KEY_ACCESS_TOKEN, "token").await.unwrap();
        store
            .set(
                KEY_USER,
                r#"{"id":5,"username":"sam","email":"s@x.com","firstName":"Sam","lastName":"Lee","gender":"male","image":"","role":"user"}"#,
            )
            .await
            .unwrap();
        let state = AppState::new(ClientConfig::default(), Arc::new(store)).unwrap();

        assert!(matches!(state.landing().await.unwrap(), Landing::JobSeeker(user) if user.username == "sam"));
        assert_eq!(state.session.phase().await, SessionPhase::Authenticated);
    }

    #[tokio::test]
    async fn keychain_holds_tokens_and_file_holds_the_rest() {
        keyring::set_default_credential_builder(keyring::mock::default_credential_builder());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let state = AppState::open_with_secrets(
            ClientConfig::default(),
            &path,
            KeyringStore::new("com.softaworks.jobboard.test"),
        )
        .await
        .unwrap();

        state.session.save_tokens("access-1", Some("refresh-1")).await.unwrap();
        state.apply(&job("42", 1), resume(), "").await.unwrap();

        assert_eq!(state.session.access_token().await.unwrap().as_deref(), Some("access-1"));
        let on_disk = std::fs::read_to_string(&path).unwrap();
        assert!(!on_disk.contains("access-1"));
        assert!(!on_disk.contains("refresh-1"));
        assert!(on_disk.contains("@job_applications"));
    }
}
