use crate::state::Session;
use crate::store::{KeyValueStore, StoreError, KEY_APPLICATIONS};
use crate::types::{ApplicationStatus, JobApplication};
use std::sync::Arc;
use thiserror::Error;
use time::macros::format_description;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::{debug, error};

/// On-device list of submitted applications, stored as one JSON array.
///
/// Every call reads the whole list; mutations rewrite it. The write lock
/// serializes read-modify-write cycles between tasks sharing the store.
/// Built with [`ApplicationStore::for_session`], it shares that lock with
/// logout.
#[derive(Clone)]
pub struct ApplicationStore {
    store: Arc<dyn KeyValueStore>,
    write_lock: Arc<Mutex<()>>,
}

impl ApplicationStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn for_session(session: &Session) -> Self {
        Self {
            store: session.store().clone(),
            write_lock: session.applications_lock(),
        }
    }

    pub async fn list(&self) -> Result<Vec<JobApplication>, StoreError> {
        let Some(raw) = self.store.get(KEY_APPLICATIONS).await? else {
            return Ok(vec![]);
        };
        if raw.trim().is_empty() {
            return Ok(vec![]);
        }
        serde_json::from_str(&raw).map_err(|e| {
            error!(error = %e, "stored applications are not valid json");
            StoreError::from(e)
        })
    }

    async fn write(&self, applications: &[JobApplication]) -> Result<(), StoreError> {
        let json = serde_json::to_string(applications)?;
        self.store.set(KEY_APPLICATIONS, &json).await
    }

    pub async fn add(&self, application: JobApplication) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut applications = self.list().await?;
        debug!(id = %application.id, job_id = %application.job_id, "adding application");
        applications.push(application);
        self.write(&applications).await.inspect_err(|e| {
            error!(error = %e, "error adding application");
        })
    }

    /// Adds `application` unless one for the same job is already stored.
    /// Returns whether it was added.
    pub async fn add_if_not_applied(&self, application: JobApplication) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut applications = self.list().await?;
        if applications.iter().any(|app| app.job_id == application.job_id) {
            debug!(job_id = %application.job_id, "already applied");
            return Ok(false);
        }
        applications.push(application);
        self.write(&applications).await.inspect_err(|e| {
            error!(error = %e, "error adding application");
        })?;
        Ok(true)
    }

    pub async fn find_by_job_id(&self, job_id: &str) -> Result<Option<JobApplication>, StoreError> {
        let applications = self.list().await?;
        Ok(applications.into_iter().find(|app| app.job_id == job_id))
    }

    pub async fn has_applied(&self, job_id: &str) -> Result<bool, StoreError> {
        Ok(self.find_by_job_id(job_id).await?.is_some())
    }

    /// Removes the application with `id`. Returns whether anything was removed.
    pub async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock().await;
        let applications = self.list().await?;
        let before = applications.len();
        let remaining: Vec<_> = applications.into_iter().filter(|app| app.id != id).collect();
        let removed = remaining.len() != before;
        self.write(&remaining).await.inspect_err(|e| {
            error!(error = %e, "error deleting application");
        })?;
        Ok(removed)
    }

    pub async fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        self.store.remove(KEY_APPLICATIONS).await.inspect_err(|e| {
            error!(error = %e, "error clearing applications");
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeFile {
    pub uri: String,
    pub name: String,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DraftError {
    #[error("Please upload your resume")]
    MissingResume,
}

/// What the apply form collects before it becomes a [`JobApplication`].
#[derive(Debug, Clone, Default)]
pub struct ApplicationDraft {
    pub job_id: String,
    pub job_title: String,
    pub company_name: String,
    pub resume: Option<ResumeFile>,
    pub cover_letter: String,
}

impl ApplicationDraft {
    pub fn into_application(self) -> Result<JobApplication, DraftError> {
        self.into_application_at(OffsetDateTime::now_utc())
    }

    fn into_application_at(self, now: OffsetDateTime) -> Result<JobApplication, DraftError> {
        let resume = self.resume.ok_or(DraftError::MissingResume)?;
        let cover_letter = self.cover_letter.trim();
        let millis = now.unix_timestamp_nanos() / 1_000_000;
        let date = now.date();

        Ok(JobApplication {
            id: format!("app_{millis}"),
            job_id: self.job_id,
            job_title: self.job_title,
            company_name: self.company_name,
            applied_date: date
                .format(format_description!("[year]-[month]-[day]"))
                .unwrap_or_else(|_| date.to_string()),
            resume_uri: resume.uri,
            resume_name: resume.name,
            cover_letter: (!cover_letter.is_empty()).then(|| cover_letter.to_string()),
            status: ApplicationStatus::Pending,
        })
    }
}
