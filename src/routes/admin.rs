use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::dto::application_dto::{
    AdminReviewPayload, AdminReviewStatus, BroadcastPayload, VerifyDocumentsPayload,
};
use crate::dto::job_dto::{AdminCreateJobPayload, ModerateJobPayload, UpdateJobPayload};
use crate::error::{Error, Result};
use crate::middleware::auth::Claims;
use crate::models::application::ApplicationStatus;
use crate::services::application_service::OwnerScope;
use crate::workflow::{self, Action, Actor};
use crate::AppState;

pub async fn list_all_applications(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse> {
    let applications = state.application_service.list_for_admin(None).await?;
    Ok(Json(applications))
}

pub async fn list_pending_applications(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse> {
    let applications = state
        .application_service
        .list_for_admin(Some(&[ApplicationStatus::PendingAdminApproval]))
        .await?;
    Ok(Json(applications))
}

pub async fn list_workflow_applications(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse> {
    let applications = state
        .application_service
        .list_for_admin(Some(&[
            ApplicationStatus::InterviewScheduled,
            ApplicationStatus::OfferExtended,
            ApplicationStatus::Hired,
            ApplicationStatus::Rejected,
        ]))
        .await?;
    Ok(Json(applications))
}

pub async fn list_interview_applications(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse> {
    let applications = state.application_service.list_interviews_for_admin().await?;
    Ok(Json(applications))
}

pub async fn list_pending_document_applications(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse> {
    let applications = state
        .application_service
        .list_for_admin(Some(&[ApplicationStatus::PendingDocumentApproval]))
        .await?;
    Ok(Json(applications))
}

async fn run_admin_transition(
    state: &AppState,
    application_id: Uuid,
    action: Action,
) -> Result<crate::models::application::Application> {
    let application = state
        .application_service
        .find_scoped(application_id, OwnerScope::Admin)
        .await?;
    let transition = workflow::plan(application.status, Actor::Admin, &action)?;
    let updated = state
        .application_service
        .commit(application_id, OwnerScope::Admin, application.status, &transition)
        .await?;
    state
        .notification_service
        .dispatch(&updated, &transition.notices)
        .await;
    Ok(updated)
}

/// Admin moderation of an application: release a pending one to the
/// college, or reject it from any state.
pub async fn review_application(
    State(state): State<AppState>,
    Path(application_id): Path<Uuid>,
    Json(payload): Json<AdminReviewPayload>,
) -> Result<impl axum::response::IntoResponse> {
    let action = match payload.status {
        AdminReviewStatus::Applied => Action::Approve,
        AdminReviewStatus::Rejected => Action::Reject,
    };
    let updated = run_admin_transition(&state, application_id, action).await?;
    Ok(Json(updated))
}

/// Confirm a scheduled interview and forward it to the candidate.
pub async fn confirm_interview(
    State(state): State<AppState>,
    Path(application_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse> {
    run_admin_transition(&state, application_id, Action::ConfirmInterview).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Interview details forwarded to employer.",
    })))
}

/// Counter-sign and forward an extended offer. The agreement PDF is
/// mandatory and uploaded before the row is touched.
pub async fn forward_offer(
    State(state): State<AppState>,
    Path(application_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<impl axum::response::IntoResponse> {
    let mut agreement: Option<(String, bytes::Bytes)> = None;

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or_default().to_string();
        if field_name == "agreement" {
            let filename = field.file_name().unwrap_or("agreement.pdf").to_string();
            let data = field.bytes().await?;
            if !data.is_empty() {
                agreement = Some((filename, data));
            }
        }
    }

    let Some((filename, data)) = agreement else {
        return Err(Error::BadRequest("Agreement PDF is required.".into()));
    };

    let application = state
        .application_service
        .find_scoped(application_id, OwnerScope::Admin)
        .await?;

    let stored = state
        .storage_service
        .store(&filename, "agreements", &data)
        .await?;

    // Planning and committing share one failure path so the uploaded
    // agreement never orphans on disk.
    let outcome = async {
        let transition = workflow::plan(
            application.status,
            Actor::Admin,
            &Action::ForwardOffer {
                agreement: stored.clone(),
            },
        )?;
        let updated = state
            .application_service
            .commit(
                application_id,
                OwnerScope::Admin,
                application.status,
                &transition,
            )
            .await?;
        Ok::<_, Error>((updated, transition))
    }
    .await;

    let (updated, transition) = match outcome {
        Ok(v) => v,
        Err(e) => {
            let _ = state.storage_service.delete(&stored.public_id).await;
            return Err(e);
        }
    };
    state
        .notification_service
        .dispatch(&updated, &transition.notices)
        .await;
    Ok(Json(json!({
        "success": true,
        "message": "Offer letter and agreement forwarded to employer.",
    })))
}

pub async fn verify_documents(
    State(state): State<AppState>,
    Path(application_id): Path<Uuid>,
    Json(payload): Json<VerifyDocumentsPayload>,
) -> Result<impl axum::response::IntoResponse> {
    let updated = run_admin_transition(
        &state,
        application_id,
        Action::VerifyDocuments {
            approved: payload.status.approved(),
        },
    )
    .await?;
    Ok(Json(json!({ "success": true, "data": updated })))
}

pub async fn list_all_jobs(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse> {
    let jobs = state.job_service.list_all().await?;
    Ok(Json(jobs))
}

pub async fn list_pending_jobs(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse> {
    let jobs = state.job_service.list_pending().await?;
    Ok(Json(jobs))
}

pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse> {
    let job = state.job_service.get(job_id).await?;
    Ok(Json(job))
}

/// Admin posts a job on behalf of a college; it goes live immediately.
pub async fn create_job(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<AdminCreateJobPayload>,
) -> Result<impl axum::response::IntoResponse> {
    payload.validate()?;
    let admin_id = claims.user_id()?;
    let job = state
        .job_service
        .create(payload.posted_by, &payload.job, Some(admin_id))
        .await?;
    Ok((StatusCode::CREATED, Json(job)))
}

pub async fn update_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Json(payload): Json<UpdateJobPayload>,
) -> Result<impl axum::response::IntoResponse> {
    payload.validate()?;
    let job = state.job_service.update(job_id, None, &payload).await?;
    Ok(Json(job))
}

pub async fn delete_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse> {
    state.job_service.delete(job_id, None).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Job and all associated applications have been deleted.",
    })))
}

/// Posting moderation; the posting college is told the outcome.
pub async fn moderate_job(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(job_id): Path<Uuid>,
    Json(payload): Json<ModerateJobPayload>,
) -> Result<impl axum::response::IntoResponse> {
    let admin_id = claims.user_id()?;
    let job = state
        .job_service
        .moderate(job_id, payload.status, admin_id)
        .await?;
    let message = format!(
        "Your job post '{}' has been {}.",
        job.title,
        payload.status.as_str()
    );
    state
        .notification_service
        .record(job.posted_by, &message, "/college/jobs")
        .await;
    Ok(Json(job))
}

pub async fn dashboard_stats(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse> {
    let stats = state.application_service.dashboard_stats().await?;
    Ok(Json(stats))
}

pub async fn broadcast_notification(
    State(state): State<AppState>,
    Json(payload): Json<BroadcastPayload>,
) -> Result<impl axum::response::IntoResponse> {
    payload.validate()?;
    let count = state.notification_service.broadcast(&payload.message).await?;
    Ok(Json(json!({
        "success": true,
        "message": format!("Notification sent to {} users.", count),
    })))
}
