use crate::api::{ApiClient, ClientError};
use crate::types::{AdminJob, DirectoryUser, Job, JOB_STATUS_ACTIVE, JOB_STATUS_INACTIVE};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::error;

/// Jobs in their original order whose status is active.
pub fn filter_active(jobs: Vec<Job>) -> Vec<Job> {
    jobs.into_iter().filter(Job::is_active).collect()
}

/// Case-insensitive title match on the query as typed. An empty query keeps
/// everything.
pub fn search_jobs<'a>(jobs: &'a [Job], query: &str) -> Vec<&'a Job> {
    let needle = query.to_lowercase();
    jobs.iter()
        .filter(|job| job.title.to_lowercase().contains(&needle))
        .collect()
}

/// Read-only accessors for the fixed job and user collections.
pub struct JobsService {
    api: Arc<ApiClient>,
}

impl JobsService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    pub async fn all_jobs(&self) -> Result<Vec<Job>, ClientError> {
        let url = &self.api.config().jobs_url;
        self.api.get_public(url).await.inspect_err(|e| {
            error!(error = %e, "error fetching jobs");
        })
    }

    pub async fn job_by_id(&self, id: &str) -> Result<Option<Job>, ClientError> {
        let jobs = self.all_jobs().await?;
        Ok(jobs.into_iter().find(|job| job.id == id))
    }

    pub async fn active_jobs(&self) -> Result<Vec<Job>, ClientError> {
        Ok(filter_active(self.all_jobs().await?))
    }

    pub async fn admin_jobs(&self) -> Result<Vec<AdminJob>, ClientError> {
        let url = &self.api.config().admin_jobs_url;
        self.api.get_public(url).await.inspect_err(|e| {
            error!(error = %e, "error fetching admin jobs");
        })
    }

    pub async fn admin_job_by_id(&self, id: &str) -> Result<Option<AdminJob>, ClientError> {
        let jobs = self.admin_jobs().await?;
        Ok(jobs.into_iter().find(|job| job.job.id == id))
    }

    pub async fn users(&self) -> Result<Vec<DirectoryUser>, ClientError> {
        let url = &self.api.config().users_url;
        self.api.get_public(url).await.inspect_err(|e| {
            error!(error = %e, "error fetching users");
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobField {
    Title,
    Location,
    Salary,
    Description,
    Status,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    pub fields: BTreeMap<JobField, &'static str>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, field: JobField) -> Option<&'static str> {
        self.fields.get(&field).copied()
    }
}

/// Admin create/edit form. Checked locally only; nothing is sent anywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDraft {
    pub title: String,
    pub location: String,
    pub salary: String,
    pub description: String,
    pub status: u8,
}

impl Default for JobDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            location: String::new(),
            salary: String::new(),
            description: String::new(),
            status: JOB_STATUS_ACTIVE,
        }
    }
}

impl From<&Job> for JobDraft {
    fn from(job: &Job) -> Self {
        let status = match job.status {
            JOB_STATUS_ACTIVE | JOB_STATUS_INACTIVE => job.status,
            _ => JOB_STATUS_ACTIVE,
        };
        Self {
            title: job.title.clone(),
            location: job.location.clone(),
            salary: job.salary.clone(),
            description: job.description.clone(),
            status,
        }
    }
}

impl JobDraft {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let required = [
            (JobField::Title, &self.title, "Job title is required"),
            (JobField::Location, &self.location, "Location is required"),
            (JobField::Salary, &self.salary, "Salary is required"),
            (JobField::Description, &self.description, "Description is required"),
        ];
        for (field, value, message) in required {
            if value.trim().is_empty() {
                errors.fields.insert(field, message);
            }
        }
        if !matches!(self.status, JOB_STATUS_ACTIVE | JOB_STATUS_INACTIVE) {
            errors.fields.insert(JobField::Status, "Status must be active or closed");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
