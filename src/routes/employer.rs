use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::dto::application_dto::{CategoryQuery, EmployerOfferAction, EmployerOfferPayload};
use crate::error::{Error, Result};
use crate::middleware::auth::Claims;
use crate::models::application::{AcceptanceDocument, DocumentType};
use crate::services::application_service::OwnerScope;
use crate::workflow::{self, Action, Actor};
use crate::AppState;

pub async fn list_my_applications(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<CategoryQuery>,
) -> Result<impl axum::response::IntoResponse> {
    let user_id = claims.user_id()?;
    let applications = state
        .application_service
        .list_for_candidate(user_id, query.category)
        .await?;
    Ok(Json(applications))
}

pub async fn apply_to_job(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(job_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse> {
    let user_id = claims.user_id()?;
    let application = state
        .application_service
        .apply_to_job(user_id, job_id)
        .await?;
    Ok((StatusCode::CREATED, Json(application)))
}

pub async fn save_job(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(job_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse> {
    let user_id = claims.user_id()?;
    let application = state.application_service.save_job(user_id, job_id).await?;
    Ok(Json(application))
}

pub async fn unsave_job(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(application_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse> {
    let user_id = claims.user_id()?;
    state
        .application_service
        .unsave(user_id, application_id)
        .await?;
    Ok(Json(json!({ "message": "Job unsaved successfully." })))
}

pub async fn withdraw_application(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(application_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse> {
    let user_id = claims.user_id()?;
    state
        .application_service
        .withdraw(user_id, application_id)
        .await?;
    Ok(Json(json!({ "message": "Application withdrawn successfully." })))
}

/// Candidate response to a forwarded offer. Acceptance goes through
/// `submit_acceptance`; this endpoint only handles a decline.
pub async fn respond_to_offer(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(application_id): Path<Uuid>,
    Json(payload): Json<EmployerOfferPayload>,
) -> Result<impl axum::response::IntoResponse> {
    let user_id = claims.user_id()?;
    let scope = OwnerScope::Candidate(user_id);
    let action = match payload.action {
        EmployerOfferAction::DeclineOffer => Action::DeclineOffer,
    };

    let application = state
        .application_service
        .find_scoped(application_id, scope)
        .await?;
    let transition = workflow::plan(application.status, Actor::Employer, &action)?;
    let updated = state
        .application_service
        .commit(application_id, scope, application.status, &transition)
        .await?;
    state
        .notification_service
        .dispatch(&updated, &transition.notices)
        .await;
    Ok(Json(updated))
}

fn document_type_for_field(name: &str) -> Option<DocumentType> {
    match name {
        "aadhar" => Some(DocumentType::Aadhar),
        "pan" => Some(DocumentType::Pan),
        "result" => Some(DocumentType::Result),
        "experience" => Some(DocumentType::Experience),
        "signedAgreement" => Some(DocumentType::SignedAgreement),
        _ => None,
    }
}

/// Accept an extended offer: terms checkbox plus verification documents in
/// one multipart request, keyed by document type. Files are uploaded before
/// the state-mutating write; nothing is persisted if an upload fails.
pub async fn submit_acceptance(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(application_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<impl axum::response::IntoResponse> {
    let user_id = claims.user_id()?;
    let scope = OwnerScope::Candidate(user_id);

    let mut terms_accepted = false;
    let mut files: Vec<(DocumentType, String, bytes::Bytes)> = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or_default().to_string();
        if field_name == "terms_and_conditions_accepted" {
            terms_accepted = field.text().await.unwrap_or_default() == "true";
        } else if let Some(document_type) = document_type_for_field(&field_name) {
            let filename = field.file_name().unwrap_or("document.bin").to_string();
            let data = field.bytes().await?;
            if !data.is_empty() {
                files.push((document_type, filename, data));
            }
        }
    }

    if !terms_accepted {
        return Err(Error::BadRequest(
            "You must accept the terms and conditions.".into(),
        ));
    }
    if !files
        .iter()
        .any(|(t, _, _)| *t == DocumentType::SignedAgreement)
    {
        return Err(Error::BadRequest("Signed agreement is mandatory.".into()));
    }

    // Ownership check before any upload happens.
    let application = state
        .application_service
        .find_scoped(application_id, scope)
        .await?;

    let mut documents = Vec::with_capacity(files.len());
    for (document_type, filename, data) in &files {
        let stored = state
            .storage_service
            .store(
                filename,
                &format!("acceptance_documents/{}", application_id),
                data,
            )
            .await?;
        documents.push(AcceptanceDocument {
            name: filename.clone(),
            document_type: *document_type,
            public_id: stored.public_id,
            url: stored.url,
        });
    }

    // Planning and committing share one failure path so the uploaded
    // documents never orphan on disk.
    let outcome = async {
        let transition = workflow::plan(
            application.status,
            Actor::Employer,
            &Action::SubmitAcceptance {
                terms_accepted,
                documents: documents.clone(),
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
            for doc in &documents {
                let _ = state.storage_service.delete(&doc.public_id).await;
            }
            return Err(e);
        }
    };
    state
        .notification_service
        .dispatch(&updated, &transition.notices)
        .await;

    Ok(Json(json!({
        "success": true,
        "message": "Offer accepted and documents submitted for verification.",
        "data": updated,
    })))
}
