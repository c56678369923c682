use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Fine-grained workflow state of an application. The allowed movements
/// between these states live in `crate::workflow`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "application_status", rename_all = "snake_case")]
pub enum ApplicationStatus {
    Saved,
    PendingAdminApproval,
    Applied,
    Viewed,
    Shortlisted,
    InterviewScheduled,
    OfferExtended,
    PendingDocumentApproval,
    DocumentsApproved,
    Hired,
    Rejected,
}

impl sqlx::postgres::PgHasArrayType for ApplicationStatus {
    fn array_type_info() -> sqlx::postgres::PgTypeInfo {
        sqlx::postgres::PgTypeInfo::with_name("_application_status")
    }
}

/// Coarse candidate-facing bucket stored alongside `status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "application_category", rename_all = "snake_case")]
pub enum ApplicationCategory {
    Saved,
    Applied,
    Interviews,
    Offers,
    Hired,
    Archived,
}

impl ApplicationCategory {
    /// Single derivation point for the category bucket. `Rejected` always
    /// lands in `Archived`; `PendingDocumentApproval` is provisionally
    /// `Hired` because the candidate has already accepted the offer.
    pub fn for_status(status: ApplicationStatus) -> Self {
        match status {
            ApplicationStatus::Saved => ApplicationCategory::Saved,
            ApplicationStatus::PendingAdminApproval
            | ApplicationStatus::Applied
            | ApplicationStatus::Viewed
            | ApplicationStatus::Shortlisted => ApplicationCategory::Applied,
            ApplicationStatus::InterviewScheduled => ApplicationCategory::Interviews,
            ApplicationStatus::OfferExtended => ApplicationCategory::Offers,
            ApplicationStatus::PendingDocumentApproval
            | ApplicationStatus::DocumentsApproved
            | ApplicationStatus::Hired => ApplicationCategory::Hired,
            ApplicationStatus::Rejected => ApplicationCategory::Archived,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterviewType {
    Online,
    #[serde(rename = "In-Person")]
    InPerson,
    Telephonic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewDetails {
    pub scheduled_on: DateTime<Utc>,
    pub interview_type: InterviewType,
    pub notes: Option<String>,
    pub meeting_link: Option<String>,
    pub confirmed_by_admin: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferDetails {
    pub offer_text: Option<String>,
    pub joining_date: Option<DateTime<Utc>>,
    pub salary: Option<String>,
}

/// Stable reference to an object in the upload store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRef {
    pub public_id: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferLetter {
    pub public_id: String,
    pub url: String,
    pub forwarded_by_admin: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DocumentType {
    Aadhar,
    Pan,
    Result,
    Experience,
    SignedAgreement,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceptanceDocument {
    pub name: String,
    pub document_type: DocumentType,
    pub public_id: String,
    pub url: String,
}

/// One candidate's relationship to one job. Unique per (user_id, job_id).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Application {
    pub id: Uuid,
    pub user_id: Uuid,
    pub job_id: Uuid,
    pub status: ApplicationStatus,
    pub category: ApplicationCategory,
    pub applied_date: Option<DateTime<Utc>>,
    pub interview_details: Option<Json<InterviewDetails>>,
    pub offer_details: Option<Json<OfferDetails>>,
    pub offer_letter: Option<Json<OfferLetter>>,
    pub agreement_letter: Option<Json<FileRef>>,
    pub terms_and_conditions_accepted: bool,
    pub acceptance_documents: Option<Json<Vec<AcceptanceDocument>>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// List-view row joining the referenced job (and applicant email for the
/// college/admin screens).
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ApplicationWithJob {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub application: Application,
    pub job_title: String,
    pub school_name: String,
    pub applicant_email: Option<String>,
}
