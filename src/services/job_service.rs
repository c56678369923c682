use crate::dto::job_dto::{CreateJobPayload, UpdateJobPayload};
use crate::error::{Error, Result};
use crate::models::job::{Job, JobStatus, JobWithApplicants};
use sqlx::PgPool;
use uuid::Uuid;

const JOB_COLUMNS: &str = "id, title, school_name, location, salary, job_type, description, \
     department, requirements, responsibilities, benefits, subjects, application_deadline, \
     posted_by, approved_by, status, views, created_at, updated_at";

#[derive(Clone)]
pub struct JobService {
    pool: PgPool,
}

impl JobService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// College-created postings start in moderation; admin-created postings
    /// go live immediately with the admin recorded as approver.
    pub async fn create(
        &self,
        posted_by: Uuid,
        payload: &CreateJobPayload,
        approved_by: Option<Uuid>,
    ) -> Result<Job> {
        let status = if approved_by.is_some() {
            JobStatus::Active
        } else {
            JobStatus::PendingApproval
        };
        let job = sqlx::query_as::<_, Job>(&format!(
            r#"
            INSERT INTO jobs (title, school_name, location, salary, job_type, description,
                              department, requirements, responsibilities, benefits, subjects,
                              application_deadline, posted_by, approved_by, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(&payload.title)
        .bind(&payload.school_name)
        .bind(&payload.location)
        .bind(&payload.salary)
        .bind(&payload.job_type)
        .bind(&payload.description)
        .bind(payload.department.clone().unwrap_or_default())
        .bind(payload.requirements.clone().unwrap_or_default())
        .bind(payload.responsibilities.clone().unwrap_or_default())
        .bind(payload.benefits.clone().unwrap_or_default())
        .bind(payload.subjects.clone().unwrap_or_default())
        .bind(payload.application_deadline)
        .bind(posted_by)
        .bind(approved_by)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;
        Ok(job)
    }

    /// A college's own postings with their applicant counts.
    pub async fn list_for_college(&self, college_id: Uuid) -> Result<Vec<JobWithApplicants>> {
        let jobs = sqlx::query_as::<_, JobWithApplicants>(
            r#"
            SELECT j.*, COUNT(a.id) AS applicants
            FROM jobs j
            LEFT JOIN applications a ON a.job_id = j.id
            WHERE j.posted_by = $1
            GROUP BY j.id
            ORDER BY j.created_at DESC
            "#,
        )
        .bind(college_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(jobs)
    }

    pub async fn get_for_college(&self, college_id: Uuid, job_id: Uuid) -> Result<Job> {
        let job = sqlx::query_as::<_, Job>(&format!(
            r#"SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1 AND posted_by = $2"#
        ))
        .bind(job_id)
        .bind(college_id)
        .fetch_optional(&self.pool)
        .await?;
        job.ok_or_else(|| {
            Error::NotFound("Job not found or you do not have permission to view it.".into())
        })
    }

    /// Update a posting. `college_id = None` is the admin path with no
    /// ownership filter.
    pub async fn update(
        &self,
        job_id: Uuid,
        college_id: Option<Uuid>,
        payload: &UpdateJobPayload,
    ) -> Result<Job> {
        let job = sqlx::query_as::<_, Job>(&format!(
            r#"
            UPDATE jobs SET
                title = COALESCE($3, title),
                school_name = COALESCE($4, school_name),
                location = COALESCE($5, location),
                salary = COALESCE($6, salary),
                job_type = COALESCE($7, job_type),
                description = COALESCE($8, description),
                department = COALESCE($9, department),
                requirements = COALESCE($10, requirements),
                responsibilities = COALESCE($11, responsibilities),
                benefits = COALESCE($12, benefits),
                subjects = COALESCE($13, subjects),
                application_deadline = COALESCE($14, application_deadline),
                updated_at = NOW()
            WHERE id = $1 AND ($2::uuid IS NULL OR posted_by = $2)
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(job_id)
        .bind(college_id)
        .bind(&payload.title)
        .bind(&payload.school_name)
        .bind(&payload.location)
        .bind(&payload.salary)
        .bind(&payload.job_type)
        .bind(&payload.description)
        .bind(&payload.department)
        .bind(&payload.requirements)
        .bind(&payload.responsibilities)
        .bind(&payload.benefits)
        .bind(&payload.subjects)
        .bind(payload.application_deadline)
        .fetch_optional(&self.pool)
        .await?;
        job.ok_or_else(|| {
            Error::NotFound("Job not found or you do not have permission to update it.".into())
        })
    }

    /// Delete a posting. The applications FK cascades, so every application
    /// against the job goes with it.
    pub async fn delete(&self, job_id: Uuid, college_id: Option<Uuid>) -> Result<()> {
        let res = sqlx::query(r#"DELETE FROM jobs WHERE id = $1 AND ($2::uuid IS NULL OR posted_by = $2)"#)
            .bind(job_id)
            .bind(college_id)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(Error::NotFound(
                "Job not found or you do not have permission to delete it.".into(),
            ));
        }
        Ok(())
    }

    pub async fn get(&self, job_id: Uuid) -> Result<Job> {
        let job = sqlx::query_as::<_, Job>(&format!(
            r#"SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1"#
        ))
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?;
        job.ok_or_else(|| Error::NotFound("Job not found.".into()))
    }

    pub async fn list_all(&self) -> Result<Vec<JobWithApplicants>> {
        let jobs = sqlx::query_as::<_, JobWithApplicants>(
            r#"
            SELECT j.*, COUNT(a.id) AS applicants
            FROM jobs j
            LEFT JOIN applications a ON a.job_id = j.id
            GROUP BY j.id
            ORDER BY j.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(jobs)
    }

    pub async fn list_pending(&self) -> Result<Vec<Job>> {
        let jobs = sqlx::query_as::<_, Job>(&format!(
            r#"SELECT {JOB_COLUMNS} FROM jobs WHERE status = 'pending_approval' ORDER BY created_at DESC"#
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(jobs)
    }

    /// Admin moderation of a posting's lifecycle
    /// (pending_approval -> active/rejected -> closed).
    pub async fn moderate(&self, job_id: Uuid, status: JobStatus, admin_id: Uuid) -> Result<Job> {
        let job = sqlx::query_as::<_, Job>(&format!(
            r#"
            UPDATE jobs SET status = $2, approved_by = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(job_id)
        .bind(status)
        .bind(admin_id)
        .fetch_optional(&self.pool)
        .await?;
        job.ok_or_else(|| Error::NotFound("Job not found.".into()))
    }
}
