use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "job_status", rename_all = "snake_case")]
pub enum JobStatus {
    PendingApproval,
    Active,
    Rejected,
    Closed,
    Draft,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::PendingApproval => "pending_approval",
            JobStatus::Active => "active",
            JobStatus::Rejected => "rejected",
            JobStatus::Closed => "closed",
            JobStatus::Draft => "draft",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Job {
    pub id: Uuid,
    pub title: String,
    pub school_name: String,
    pub location: String,
    pub salary: Option<String>,
    pub job_type: Option<String>,
    pub description: Option<String>,
    pub department: String,
    pub requirements: String,
    pub responsibilities: String,
    pub benefits: String,
    pub subjects: Vec<String>,
    pub application_deadline: Option<DateTime<Utc>>,
    pub posted_by: Uuid,
    pub approved_by: Option<Uuid>,
    pub status: JobStatus,
    pub views: i32,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// College dashboard row: a posted job with its applicant count.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct JobWithApplicants {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub job: Job,
    pub applicants: i64,
}
