use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::dto::application_dto::{
    CollegeReviewStatus, CollegeStatusPayload, FinalStatus, FinalizePayload,
    ScheduleInterviewPayload,
};
use crate::dto::job_dto::{CreateJobPayload, UpdateJobPayload};
use crate::error::{Error, Result};
use crate::middleware::auth::Claims;
use crate::models::application::{ApplicationStatus, OfferDetails};
use crate::services::application_service::OwnerScope;
use crate::workflow::{self, Action, Actor};
use crate::AppState;

pub async fn list_applications(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl axum::response::IntoResponse> {
    let college_id = claims.user_id()?;
    let applications = state
        .application_service
        .list_active_for_college(college_id)
        .await?;
    Ok(Json(applications))
}

pub async fn list_shortlisted_applications(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl axum::response::IntoResponse> {
    let college_id = claims.user_id()?;
    let applications = state
        .application_service
        .list_for_college_in(
            college_id,
            &[
                ApplicationStatus::Shortlisted,
                ApplicationStatus::InterviewScheduled,
                ApplicationStatus::OfferExtended,
                ApplicationStatus::Hired,
                ApplicationStatus::DocumentsApproved,
            ],
        )
        .await?;
    Ok(Json(applications))
}

pub async fn list_offer_stage_applications(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl axum::response::IntoResponse> {
    let college_id = claims.user_id()?;
    let applications = state
        .application_service
        .list_for_college_in(
            college_id,
            &[
                ApplicationStatus::InterviewScheduled,
                ApplicationStatus::OfferExtended,
                ApplicationStatus::Hired,
                ApplicationStatus::Rejected,
                ApplicationStatus::DocumentsApproved,
            ],
        )
        .await?;
    Ok(Json(applications))
}

async fn run_college_transition(
    state: &AppState,
    college_id: Uuid,
    application_id: Uuid,
    action: Action,
) -> Result<crate::models::application::Application> {
    let scope = OwnerScope::College(college_id);
    let application = state
        .application_service
        .find_scoped(application_id, scope)
        .await?;
    let transition = workflow::plan(application.status, Actor::College, &action)?;
    let updated = state
        .application_service
        .commit(application_id, scope, application.status, &transition)
        .await?;
    state
        .notification_service
        .dispatch(&updated, &transition.notices)
        .await;
    Ok(updated)
}

/// Pipeline review: mark viewed or shortlist.
pub async fn update_application_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(application_id): Path<Uuid>,
    Json(payload): Json<CollegeStatusPayload>,
) -> Result<impl axum::response::IntoResponse> {
    let college_id = claims.user_id()?;
    let action = match payload.status {
        CollegeReviewStatus::Viewed => Action::MarkViewed,
        CollegeReviewStatus::Shortlisted => Action::Shortlist,
    };
    let updated = run_college_transition(&state, college_id, application_id, action).await?;
    Ok(Json(updated))
}

pub async fn schedule_interview(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(application_id): Path<Uuid>,
    Json(payload): Json<ScheduleInterviewPayload>,
) -> Result<impl axum::response::IntoResponse> {
    payload.validate()?;
    let college_id = claims.user_id()?;
    let action = Action::ScheduleInterview(payload.into_details());
    let updated = run_college_transition(&state, college_id, application_id, action).await?;
    Ok(Json(updated))
}

/// Extend an offer after the interview. The offer letter file is mandatory
/// and uploaded before the status flips.
pub async fn extend_offer(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(application_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<impl axum::response::IntoResponse> {
    let college_id = claims.user_id()?;
    let scope = OwnerScope::College(college_id);

    let mut letter: Option<(String, bytes::Bytes)> = None;
    let mut details: Option<OfferDetails> = None;

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "offer_letter" => {
                let filename = field.file_name().unwrap_or("offer_letter.pdf").to_string();
                let data = field.bytes().await?;
                if !data.is_empty() {
                    letter = Some((filename, data));
                }
            }
            "offer_details" => {
                let raw = field.text().await.unwrap_or_default();
                details = Some(serde_json::from_str(&raw)?);
            }
            _ => {}
        }
    }

    let Some((filename, data)) = letter else {
        return Err(Error::BadRequest("Offer letter file is required.".into()));
    };

    let application = state
        .application_service
        .find_scoped(application_id, scope)
        .await?;

    let stored = state
        .storage_service
        .store(&filename, "offer_letters", &data)
        .await?;

    // Any failure past this point, planning or committing, must not leave
    // the uploaded letter orphaned on disk.
    let outcome = async {
        let transition = workflow::plan(
            application.status,
            Actor::College,
            &Action::ExtendOffer {
                letter: stored.clone(),
                details,
            },
        )?;
        let updated = state
            .application_service
            .commit(application_id, scope, application.status, &transition)
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
    Ok(Json(updated))
}

/// Final decision. Hard-guarded by the engine: only documents_approved
/// applications can be finalized.
pub async fn finalize_hiring(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(application_id): Path<Uuid>,
    Json(payload): Json<FinalizePayload>,
) -> Result<impl axum::response::IntoResponse> {
    let college_id = claims.user_id()?;
    let action = Action::FinalizeHiring {
        hired: payload.status == FinalStatus::Hired,
    };
    let updated = run_college_transition(&state, college_id, application_id, action).await?;
    Ok(Json(json!({ "success": true, "data": updated })))
}

pub async fn create_job(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateJobPayload>,
) -> Result<impl axum::response::IntoResponse> {
    payload.validate()?;
    let college_id = claims.user_id()?;
    let job = state.job_service.create(college_id, &payload, None).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

pub async fn list_my_jobs(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl axum::response::IntoResponse> {
    let college_id = claims.user_id()?;
    let jobs = state.job_service.list_for_college(college_id).await?;
    Ok(Json(jobs))
}

pub async fn get_my_job(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(job_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse> {
    let college_id = claims.user_id()?;
    let job = state.job_service.get_for_college(college_id, job_id).await?;
    Ok(Json(job))
}

pub async fn update_my_job(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(job_id): Path<Uuid>,
    Json(payload): Json<UpdateJobPayload>,
) -> Result<impl axum::response::IntoResponse> {
    payload.validate()?;
    let college_id = claims.user_id()?;
    let job = state
        .job_service
        .update(job_id, Some(college_id), &payload)
        .await?;
    Ok(Json(job))
}

pub async fn delete_my_job(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(job_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse> {
    let college_id = claims.user_id()?;
    state.job_service.delete(job_id, Some(college_id)).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Job and all associated applications have been deleted.",
    })))
}
