use crate::error::{Error, Result};
use crate::models::application::{
    AcceptanceDocument, Application, ApplicationCategory, ApplicationStatus, ApplicationWithJob,
    FileRef, InterviewDetails, OfferDetails, OfferLetter,
};
use crate::workflow::{Change, Transition};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

/// Ownership relation under which a caller may touch an application.
/// Candidate operations see only their own rows, college operations only
/// rows whose job they posted, admin operations see everything. The scope
/// is applied inside every query, so "not yours" and "does not exist" are
/// indistinguishable to the caller.
#[derive(Debug, Clone, Copy)]
pub enum OwnerScope {
    Candidate(Uuid),
    College(Uuid),
    Admin,
}

impl OwnerScope {
    fn candidate_id(&self) -> Option<Uuid> {
        match self {
            OwnerScope::Candidate(id) => Some(*id),
            _ => None,
        }
    }

    fn college_id(&self) -> Option<Uuid> {
        match self {
            OwnerScope::College(id) => Some(*id),
            _ => None,
        }
    }
}

/// Bind set derived from a planned [`Change`]; one UPDATE statement covers
/// every transition so the prior-status re-check stays atomic with the
/// mutation.
#[derive(Default)]
struct ChangeBinds {
    interview: Option<Json<InterviewDetails>>,
    confirm_interview: bool,
    offer_details: Option<Json<OfferDetails>>,
    offer_letter: Option<Json<OfferLetter>>,
    agreement: Option<Json<FileRef>>,
    forward_offer: bool,
    accept_terms: bool,
    acceptance_documents: Option<Json<Vec<AcceptanceDocument>>>,
}

impl From<&Change> for ChangeBinds {
    fn from(change: &Change) -> Self {
        let mut binds = ChangeBinds::default();
        match change {
            Change::None => {}
            Change::SetInterview(details) => binds.interview = Some(Json(details.clone())),
            Change::ConfirmInterview => binds.confirm_interview = true,
            Change::SetOffer { letter, details } => {
                binds.offer_letter = Some(Json(letter.clone()));
                binds.offer_details = details.clone().map(Json);
            }
            Change::ForwardOffer { agreement } => {
                binds.agreement = Some(Json(agreement.clone()));
                binds.forward_offer = true;
            }
            Change::SetAcceptance { documents } => {
                binds.accept_terms = true;
                binds.acceptance_documents = Some(Json(documents.clone()));
            }
        }
        binds
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DashboardStats {
    pub total_users: i64,
    pub total_jobs: i64,
    pub pending_jobs: i64,
    pub total_applications: i64,
    pub new_users_last_7_days: i64,
}

#[derive(Clone)]
pub struct ApplicationService {
    pool: PgPool,
}

impl ApplicationService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn job_exists(&self, job_id: Uuid) -> Result<()> {
        let row: Option<(Uuid,)> = sqlx::query_as(r#"SELECT id FROM jobs WHERE id = $1"#)
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await?;
        if row.is_none() {
            return Err(Error::NotFound("Job not found.".into()));
        }
        Ok(())
    }

    /// Save a job for later. Upsert: if the pair already exists (saved or
    /// applied), the existing row is returned untouched.
    pub async fn save_job(&self, user_id: Uuid, job_id: Uuid) -> Result<Application> {
        self.job_exists(job_id).await?;
        let application = sqlx::query_as::<_, Application>(
            r#"
            INSERT INTO applications (user_id, job_id, status, category)
            VALUES ($1, $2, 'saved', 'saved')
            ON CONFLICT (user_id, job_id) DO UPDATE SET job_id = EXCLUDED.job_id -- dummy update to return row
            RETURNING id, user_id, job_id, status, category, applied_date, interview_details,
                      offer_details, offer_letter, agreement_letter, terms_and_conditions_accepted,
                      acceptance_documents, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(job_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(application)
    }

    /// Apply to a job. Promotes an existing saved row in place; a second
    /// apply on a non-saved row is a conflict. The unique (user_id, job_id)
    /// index makes concurrent applies safe.
    pub async fn apply_to_job(&self, user_id: Uuid, job_id: Uuid) -> Result<Application> {
        self.job_exists(job_id).await?;

        let existing: Option<(ApplicationCategory,)> = sqlx::query_as(
            r#"SELECT category FROM applications WHERE user_id = $1 AND job_id = $2"#,
        )
        .bind(user_id)
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?;
        if let Some((category,)) = existing {
            if category != ApplicationCategory::Saved {
                return Err(Error::Conflict(
                    "You have already applied for this job.".into(),
                ));
            }
        }

        let application = sqlx::query_as::<_, Application>(
            r#"
            INSERT INTO applications (user_id, job_id, status, category, applied_date)
            VALUES ($1, $2, 'pending_admin_approval', 'applied', NOW())
            ON CONFLICT (user_id, job_id) DO UPDATE
            SET status = 'pending_admin_approval', category = 'applied',
                applied_date = NOW(), updated_at = NOW()
            RETURNING id, user_id, job_id, status, category, applied_date, interview_details,
                      offer_details, offer_letter, agreement_letter, terms_and_conditions_accepted,
                      acceptance_documents, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(job_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(application)
    }

    /// Remove a saved job. The `category = 'saved'` filter excludes live
    /// applications, which must go through `withdraw` instead.
    pub async fn unsave(&self, user_id: Uuid, application_id: Uuid) -> Result<()> {
        let res = sqlx::query(
            r#"DELETE FROM applications WHERE id = $1 AND user_id = $2 AND category = 'saved'"#,
        )
        .bind(application_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        if res.rows_affected() == 0 {
            return Err(Error::NotFound("Saved job not found.".into()));
        }
        Ok(())
    }

    /// Withdraw a live application (anything past `saved`).
    pub async fn withdraw(&self, user_id: Uuid, application_id: Uuid) -> Result<()> {
        let res = sqlx::query(
            r#"DELETE FROM applications WHERE id = $1 AND user_id = $2 AND category <> 'saved'"#,
        )
        .bind(application_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        if res.rows_affected() == 0 {
            return Err(Error::NotFound("Application not found.".into()));
        }
        Ok(())
    }

    /// Candidate's own applications, filtered by category bucket. The
    /// offers tab only shows offers the admin has already forwarded.
    pub async fn list_for_candidate(
        &self,
        user_id: Uuid,
        category: ApplicationCategory,
    ) -> Result<Vec<ApplicationWithJob>> {
        let rows = if category == ApplicationCategory::Offers {
            sqlx::query_as::<_, ApplicationWithJob>(
                r#"
                SELECT a.id, a.user_id, a.job_id, a.status, a.category, a.applied_date,
                       a.interview_details, a.offer_details, a.offer_letter, a.agreement_letter,
                       a.terms_and_conditions_accepted, a.acceptance_documents, a.created_at, a.updated_at,
                       j.title AS job_title, j.school_name, NULL::text AS applicant_email
                FROM applications a
                JOIN jobs j ON j.id = a.job_id
                WHERE a.user_id = $1
                  AND a.status = 'offer_extended'
                  AND (a.offer_letter->>'forwarded_by_admin')::boolean IS TRUE
                ORDER BY a.updated_at DESC
                "#,
            )
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query_as::<_, ApplicationWithJob>(
                r#"
                SELECT a.id, a.user_id, a.job_id, a.status, a.category, a.applied_date,
                       a.interview_details, a.offer_details, a.offer_letter, a.agreement_letter,
                       a.terms_and_conditions_accepted, a.acceptance_documents, a.created_at, a.updated_at,
                       j.title AS job_title, j.school_name, NULL::text AS applicant_email
                FROM applications a
                JOIN jobs j ON j.id = a.job_id
                WHERE a.user_id = $1 AND a.category = $2
                ORDER BY a.updated_at DESC
                "#,
            )
            .bind(user_id)
            .bind(category)
            .fetch_all(&self.pool)
            .await?
        };
        Ok(rows)
    }

    /// Active pipeline for a college: every non-final application against
    /// its jobs. Saved-only rows are invisible to the college.
    pub async fn list_active_for_college(
        &self,
        college_id: Uuid,
    ) -> Result<Vec<ApplicationWithJob>> {
        let rows = sqlx::query_as::<_, ApplicationWithJob>(
            r#"
            SELECT a.id, a.user_id, a.job_id, a.status, a.category, a.applied_date,
                   a.interview_details, a.offer_details, a.offer_letter, a.agreement_letter,
                   a.terms_and_conditions_accepted, a.acceptance_documents, a.created_at, a.updated_at,
                   j.title AS job_title, j.school_name, u.email AS applicant_email
            FROM applications a
            JOIN jobs j ON j.id = a.job_id
            JOIN users u ON u.id = a.user_id
            WHERE j.posted_by = $1 AND a.status NOT IN ('saved', 'hired')
            ORDER BY a.updated_at DESC
            "#,
        )
        .bind(college_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// College stage views (shortlisted / offer stage), selected by an
    /// explicit status set.
    pub async fn list_for_college_in(
        &self,
        college_id: Uuid,
        statuses: &[ApplicationStatus],
    ) -> Result<Vec<ApplicationWithJob>> {
        let rows = sqlx::query_as::<_, ApplicationWithJob>(
            r#"
            SELECT a.id, a.user_id, a.job_id, a.status, a.category, a.applied_date,
                   a.interview_details, a.offer_details, a.offer_letter, a.agreement_letter,
                   a.terms_and_conditions_accepted, a.acceptance_documents, a.created_at, a.updated_at,
                   j.title AS job_title, j.school_name, u.email AS applicant_email
            FROM applications a
            JOIN jobs j ON j.id = a.job_id
            JOIN users u ON u.id = a.user_id
            WHERE j.posted_by = $1 AND a.status = ANY($2)
            ORDER BY a.updated_at DESC
            "#,
        )
        .bind(college_id)
        .bind(statuses)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Admin list views. `statuses = None` returns everything.
    pub async fn list_for_admin(
        &self,
        statuses: Option<&[ApplicationStatus]>,
    ) -> Result<Vec<ApplicationWithJob>> {
        let rows = sqlx::query_as::<_, ApplicationWithJob>(
            r#"
            SELECT a.id, a.user_id, a.job_id, a.status, a.category, a.applied_date,
                   a.interview_details, a.offer_details, a.offer_letter, a.agreement_letter,
                   a.terms_and_conditions_accepted, a.acceptance_documents, a.created_at, a.updated_at,
                   j.title AS job_title, j.school_name, u.email AS applicant_email
            FROM applications a
            JOIN jobs j ON j.id = a.job_id
            JOIN users u ON u.id = a.user_id
            WHERE $1::application_status[] IS NULL OR a.status = ANY($1)
            ORDER BY a.updated_at DESC
            "#,
        )
        .bind(statuses)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Admin interview board, ordered by the scheduled slot.
    pub async fn list_interviews_for_admin(&self) -> Result<Vec<ApplicationWithJob>> {
        let rows = sqlx::query_as::<_, ApplicationWithJob>(
            r#"
            SELECT a.id, a.user_id, a.job_id, a.status, a.category, a.applied_date,
                   a.interview_details, a.offer_details, a.offer_letter, a.agreement_letter,
                   a.terms_and_conditions_accepted, a.acceptance_documents, a.created_at, a.updated_at,
                   j.title AS job_title, j.school_name, u.email AS applicant_email
            FROM applications a
            JOIN jobs j ON j.id = a.job_id
            JOIN users u ON u.id = a.user_id
            WHERE a.status IN ('interview_scheduled', 'offer_extended', 'hired')
            ORDER BY a.interview_details->>'scheduled_on' DESC NULLS LAST
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Fetch one application under the caller's ownership scope.
    pub async fn find_scoped(
        &self,
        application_id: Uuid,
        scope: OwnerScope,
    ) -> Result<Application> {
        let application = sqlx::query_as::<_, Application>(
            r#"
            SELECT a.id, a.user_id, a.job_id, a.status, a.category, a.applied_date,
                   a.interview_details, a.offer_details, a.offer_letter, a.agreement_letter,
                   a.terms_and_conditions_accepted, a.acceptance_documents, a.created_at, a.updated_at
            FROM applications a
            JOIN jobs j ON j.id = a.job_id
            WHERE a.id = $1
              AND ($2::uuid IS NULL OR a.user_id = $2)
              AND ($3::uuid IS NULL OR j.posted_by = $3)
            "#,
        )
        .bind(application_id)
        .bind(scope.candidate_id())
        .bind(scope.college_id())
        .fetch_optional(&self.pool)
        .await?;
        application.ok_or_else(|| Error::NotFound("Application not found.".into()))
    }

    /// Commit a planned transition. The WHERE clause re-checks ownership
    /// and the expected prior status atomically with the mutation; a row
    /// that raced away (or was never the caller's) yields not-found.
    pub async fn commit(
        &self,
        application_id: Uuid,
        scope: OwnerScope,
        expected: ApplicationStatus,
        transition: &Transition,
    ) -> Result<Application> {
        let binds = ChangeBinds::from(&transition.change);
        let application = sqlx::query_as::<_, Application>(
            r#"
            UPDATE applications a SET
                status = $4,
                category = $5,
                interview_details = CASE
                    WHEN $7 THEN jsonb_set(a.interview_details, '{confirmed_by_admin}', 'true'::jsonb)
                    ELSE COALESCE($8::jsonb, a.interview_details)
                END,
                offer_details = COALESCE($9::jsonb, a.offer_details),
                offer_letter = CASE
                    WHEN $11 THEN jsonb_set(a.offer_letter, '{forwarded_by_admin}', 'true'::jsonb)
                    ELSE COALESCE($10::jsonb, a.offer_letter)
                END,
                agreement_letter = COALESCE($12::jsonb, a.agreement_letter),
                terms_and_conditions_accepted = a.terms_and_conditions_accepted OR $13,
                acceptance_documents = COALESCE($14::jsonb, a.acceptance_documents),
                updated_at = NOW()
            FROM jobs j
            WHERE a.id = $1
              AND j.id = a.job_id
              AND a.status = $6
              AND ($2::uuid IS NULL OR a.user_id = $2)
              AND ($3::uuid IS NULL OR j.posted_by = $3)
            RETURNING a.id, a.user_id, a.job_id, a.status, a.category, a.applied_date,
                      a.interview_details, a.offer_details, a.offer_letter, a.agreement_letter,
                      a.terms_and_conditions_accepted, a.acceptance_documents, a.created_at, a.updated_at
            "#,
        )
        .bind(application_id)
        .bind(scope.candidate_id())
        .bind(scope.college_id())
        .bind(transition.status)
        .bind(transition.category)
        .bind(expected)
        .bind(binds.confirm_interview)
        .bind(binds.interview)
        .bind(binds.offer_details)
        .bind(binds.offer_letter)
        .bind(binds.forward_offer)
        .bind(binds.agreement)
        .bind(binds.accept_terms)
        .bind(binds.acceptance_documents)
        .fetch_optional(&self.pool)
        .await?;
        application.ok_or_else(|| Error::NotFound("Application not found.".into()))
    }

    pub async fn dashboard_stats(&self) -> Result<DashboardStats> {
        let stats = sqlx::query_as::<_, DashboardStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users) AS total_users,
                (SELECT COUNT(*) FROM jobs) AS total_jobs,
                (SELECT COUNT(*) FROM jobs WHERE status = 'pending_approval') AS pending_jobs,
                (SELECT COUNT(*) FROM applications) AS total_applications,
                (SELECT COUNT(*) FROM users WHERE created_at > NOW() - INTERVAL '7 days') AS new_users_last_7_days
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(stats)
    }
}
