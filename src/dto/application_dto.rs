use crate::models::application::{ApplicationCategory, InterviewDetails, InterviewType};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize)]
pub struct CategoryQuery {
    pub category: ApplicationCategory,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ScheduleInterviewPayload {
    pub scheduled_on: DateTime<Utc>,
    pub interview_type: InterviewType,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    #[validate(url)]
    pub meeting_link: Option<String>,
}

impl ScheduleInterviewPayload {
    pub fn into_details(self) -> InterviewDetails {
        InterviewDetails {
            scheduled_on: self.scheduled_on,
            interview_type: self.interview_type,
            notes: self.notes,
            meeting_link: self.meeting_link,
            confirmed_by_admin: false,
        }
    }
}

/// College pipeline review: the only statuses a college may set directly.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CollegeReviewStatus {
    Viewed,
    Shortlisted,
}

#[derive(Debug, Deserialize)]
pub struct CollegeStatusPayload {
    pub status: CollegeReviewStatus,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AdminReviewStatus {
    Applied,
    Rejected,
}

#[derive(Debug, Deserialize)]
pub struct AdminReviewPayload {
    pub status: AdminReviewStatus,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FinalStatus {
    Hired,
    Rejected,
}

#[derive(Debug, Deserialize)]
pub struct FinalizePayload {
    pub status: FinalStatus,
}

/// Document verification input. `documents_rejected` is accepted on the
/// wire but normalized to the canonical `rejected` application status by
/// the workflow engine.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DocumentDecision {
    DocumentsApproved,
    DocumentsRejected,
}

impl DocumentDecision {
    pub fn approved(&self) -> bool {
        matches!(self, DocumentDecision::DocumentsApproved)
    }
}

#[derive(Debug, Deserialize)]
pub struct VerifyDocumentsPayload {
    pub status: DocumentDecision,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EmployerOfferAction {
    DeclineOffer,
}

#[derive(Debug, Deserialize)]
pub struct EmployerOfferPayload {
    pub action: EmployerOfferAction,
}

#[derive(Debug, Deserialize, Validate)]
pub struct BroadcastPayload {
    #[validate(length(min = 1, message = "A message is required."))]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_decision_accepts_both_wire_values() {
        let approved: VerifyDocumentsPayload =
            serde_json::from_str(r#"{"status":"documents_approved"}"#).unwrap();
        assert!(approved.status.approved());

        let rejected: VerifyDocumentsPayload =
            serde_json::from_str(r#"{"status":"documents_rejected"}"#).unwrap();
        assert!(!rejected.status.approved());

        // Canonical statuses are not valid document decisions.
        assert!(serde_json::from_str::<VerifyDocumentsPayload>(r#"{"status":"rejected"}"#).is_err());
    }

    #[test]
    fn schedule_payload_never_starts_confirmed() {
        let payload: ScheduleInterviewPayload = serde_json::from_str(
            r#"{"scheduled_on":"2026-04-01T10:00:00Z","interview_type":"Online","notes":null,"meeting_link":"https://meet.example.com/x"}"#,
        )
        .unwrap();
        let details = payload.into_details();
        assert!(!details.confirmed_by_admin);
        assert_eq!(details.interview_type, InterviewType::Online);
    }

    #[test]
    fn college_review_status_is_limited_to_viewed_and_shortlisted() {
        assert!(serde_json::from_str::<CollegeStatusPayload>(r#"{"status":"viewed"}"#).is_ok());
        assert!(serde_json::from_str::<CollegeStatusPayload>(r#"{"status":"shortlisted"}"#).is_ok());
        assert!(serde_json::from_str::<CollegeStatusPayload>(r#"{"status":"hired"}"#).is_err());
    }
}
