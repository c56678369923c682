use crate::models::job::JobStatus;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateJobPayload {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 200))]
    pub school_name: String,
    #[validate(length(min = 1, max = 200))]
    pub location: String,
    pub salary: Option<String>,
    pub job_type: Option<String>,
    pub description: Option<String>,
    pub department: Option<String>,
    pub requirements: Option<String>,
    pub responsibilities: Option<String>,
    pub benefits: Option<String>,
    pub subjects: Option<Vec<String>>,
    pub application_deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateJobPayload {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub school_name: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub location: Option<String>,
    pub salary: Option<String>,
    pub job_type: Option<String>,
    pub description: Option<String>,
    pub department: Option<String>,
    pub requirements: Option<String>,
    pub responsibilities: Option<String>,
    pub benefits: Option<String>,
    pub subjects: Option<Vec<String>>,
    pub application_deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct ModerateJobPayload {
    pub status: JobStatus,
}

/// Admin posting on behalf of a college.
#[derive(Debug, Deserialize, Validate)]
pub struct AdminCreateJobPayload {
    #[serde(flatten)]
    #[validate(nested)]
    pub job: CreateJobPayload,
    pub posted_by: uuid::Uuid,
}
