//! Storage-level behavior that lives in SQL rather than the pure engine:
//! the save/apply upsert, ownership filtering, and the atomic prior-status
//! re-check. Requires a reachable Postgres; each test skips itself when
//! `DATABASE_URL` is not set.

use axum::extract::{FromRequest, Multipart, Path, State};
use axum::Extension;
use sqlx::PgPool;
use std::path::PathBuf;
use std::sync::OnceLock;
use teacher_portal_backend::error::Error;
use teacher_portal_backend::middleware::auth::Claims;
use teacher_portal_backend::models::application::{ApplicationCategory, ApplicationStatus};
use teacher_portal_backend::routes;
use teacher_portal_backend::services::application_service::{ApplicationService, OwnerScope};
use teacher_portal_backend::workflow::{self, Action, Actor};
use teacher_portal_backend::AppState;
use uuid::Uuid;

async fn connect() -> Option<PgPool> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let pool = PgPool::connect(&url).await.ok()?;
    sqlx::migrate!("./migrations").run(&pool).await.ok()?;
    Some(pool)
}

async fn seed_user(pool: &PgPool, role: &str) -> Uuid {
    sqlx::query_scalar::<_, Uuid>(
        r#"INSERT INTO users (email, role) VALUES ($1, $2::user_role) RETURNING id"#,
    )
    .bind(format!("{}-{}@test.example", role, Uuid::new_v4()))
    .bind(role)
    .fetch_one(pool)
    .await
    .unwrap()
}

async fn seed_job(pool: &PgPool, college_id: Uuid) -> Uuid {
    sqlx::query_scalar::<_, Uuid>(
        r#"INSERT INTO jobs (title, school_name, location, posted_by, status)
           VALUES ('Physics Teacher', 'Test School', 'Pune', $1, 'active') RETURNING id"#,
    )
    .bind(college_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

async fn current_status(pool: &PgPool, application_id: Uuid) -> ApplicationStatus {
    sqlx::query_scalar::<_, ApplicationStatus>(
        r#"SELECT status FROM applications WHERE id = $1"#,
    )
    .bind(application_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

async fn remove_users(pool: &PgPool, ids: &[Uuid]) {
    sqlx::query(r#"DELETE FROM users WHERE id = ANY($1)"#)
        .bind(ids.to_vec())
        .execute(pool)
        .await
        .unwrap();
}

#[tokio::test]
async fn saving_then_applying_promotes_the_same_row() {
    let Some(pool) = connect().await else {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    };
    let candidate = seed_user(&pool, "employer").await;
    let college = seed_user(&pool, "college").await;
    let job = seed_job(&pool, college).await;
    let service = ApplicationService::new(pool.clone());

    let saved = service.save_job(candidate, job).await.unwrap();
    assert_eq!(saved.status, ApplicationStatus::Saved);
    assert_eq!(saved.category, ApplicationCategory::Saved);
    assert!(saved.applied_date.is_none());

    let applied = service.apply_to_job(candidate, job).await.unwrap();
    assert_eq!(applied.id, saved.id, "apply must promote the saved row in place");
    assert_eq!(applied.status, ApplicationStatus::PendingAdminApproval);
    assert_eq!(applied.category, ApplicationCategory::Applied);
    assert!(applied.applied_date.is_some());

    remove_users(&pool, &[candidate, college]).await;
}

#[tokio::test]
async fn applying_twice_is_a_conflict() {
    let Some(pool) = connect().await else {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    };
    let candidate = seed_user(&pool, "employer").await;
    let college = seed_user(&pool, "college").await;
    let job = seed_job(&pool, college).await;
    let service = ApplicationService::new(pool.clone());

    service.apply_to_job(candidate, job).await.unwrap();
    let err = service.apply_to_job(candidate, job).await.unwrap_err();
    assert!(matches!(err, Error::Conflict(_)), "got {:?}", err);

    remove_users(&pool, &[candidate, college]).await;
}

#[tokio::test]
async fn unsave_refuses_a_live_application() {
    let Some(pool) = connect().await else {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    };
    let candidate = seed_user(&pool, "employer").await;
    let college = seed_user(&pool, "college").await;
    let job = seed_job(&pool, college).await;
    let service = ApplicationService::new(pool.clone());

    let application = service.apply_to_job(candidate, job).await.unwrap();
    let err = service.unsave(candidate, application.id).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)), "got {:?}", err);

    // The live row is still withdrawable.
    service.withdraw(candidate, application.id).await.unwrap();

    remove_users(&pool, &[candidate, college]).await;
}

#[tokio::test]
async fn ownership_filter_hides_foreign_applications() {
    let Some(pool) = connect().await else {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    };
    let candidate = seed_user(&pool, "employer").await;
    let stranger = seed_user(&pool, "employer").await;
    let college = seed_user(&pool, "college").await;
    let other_college = seed_user(&pool, "college").await;
    let job = seed_job(&pool, college).await;
    let service = ApplicationService::new(pool.clone());

    let application = service.apply_to_job(candidate, job).await.unwrap();

    let err = service
        .find_scoped(application.id, OwnerScope::Candidate(stranger))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)), "got {:?}", err);

    let err = service
        .find_scoped(application.id, OwnerScope::College(other_college))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)), "got {:?}", err);

    // A foreign scope cannot commit a transition either, and the row stays
    // untouched.
    let transition = workflow::plan(
        ApplicationStatus::PendingAdminApproval,
        Actor::Admin,
        &Action::Approve,
    )
    .unwrap();
    let err = service
        .commit(
            application.id,
            OwnerScope::Candidate(stranger),
            ApplicationStatus::PendingAdminApproval,
            &transition,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)), "got {:?}", err);
    assert_eq!(
        current_status(&pool, application.id).await,
        ApplicationStatus::PendingAdminApproval
    );

    remove_users(&pool, &[candidate, stranger, college, other_college]).await;
}

#[tokio::test]
async fn commit_loses_when_the_prior_status_raced_away() {
    let Some(pool) = connect().await else {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    };
    let candidate = seed_user(&pool, "employer").await;
    let college = seed_user(&pool, "college").await;
    let job = seed_job(&pool, college).await;
    let service = ApplicationService::new(pool.clone());

    let application = service.apply_to_job(candidate, job).await.unwrap();
    let transition = workflow::plan(application.status, Actor::Admin, &Action::Approve).unwrap();

    // Another actor moves the row between plan and commit.
    sqlx::query(
        r#"UPDATE applications SET status = 'rejected', category = 'archived' WHERE id = $1"#,
    )
    .bind(application.id)
    .execute(&pool)
    .await
    .unwrap();

    let err = service
        .commit(
            application.id,
            OwnerScope::Admin,
            application.status,
            &transition,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)), "got {:?}", err);
    assert_eq!(
        current_status(&pool, application.id).await,
        ApplicationStatus::Rejected,
        "losing commit must not overwrite the winner"
    );

    remove_users(&pool, &[candidate, college]).await;
}

static UPLOADS_ROOT: OnceLock<String> = OnceLock::new();

fn ensure_config() -> &'static str {
    let root = UPLOADS_ROOT.get_or_init(|| {
        std::env::temp_dir()
            .join(format!("uploads-{}", Uuid::new_v4()))
            .display()
            .to_string()
    });
    std::env::set_var("SERVER_ADDRESS", "127.0.0.1:0");
    std::env::set_var("JWT_SECRET", "test-secret");
    std::env::set_var("UPLOADS_DIR", root);
    let _ = teacher_portal_backend::config::init_config();
    root
}

fn college_claims(college_id: Uuid) -> Claims {
    Claims {
        sub: college_id.to_string(),
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        role: Some("college".to_string()),
    }
}

async fn offer_letter_multipart() -> Multipart {
    let boundary = "offerletterboundary";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"offer_letter\"; filename=\"letter.pdf\"\r\nContent-Type: application/pdf\r\n\r\n%PDF-1.4 test\r\n--{b}--\r\n",
        b = boundary
    );
    let request = axum::http::Request::builder()
        .header(
            axum::http::header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(axum::body::Body::from(body))
        .unwrap();
    Multipart::from_request(request, &()).await.unwrap()
}

#[tokio::test]
async fn refused_offer_transition_removes_the_uploaded_letter() {
    let Some(pool) = connect().await else {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    };
    let root = ensure_config();
    let candidate = seed_user(&pool, "employer").await;
    let college = seed_user(&pool, "college").await;
    let job = seed_job(&pool, college).await;

    // Shortlisted, not interview_scheduled: the offer transition is refused
    // after the letter has already been written to disk.
    let application_id = sqlx::query_scalar::<_, Uuid>(
        r#"INSERT INTO applications (user_id, job_id, status, category, applied_date)
           VALUES ($1, $2, 'shortlisted', 'applied', NOW()) RETURNING id"#,
    )
    .bind(candidate)
    .bind(job)
    .fetch_one(&pool)
    .await
    .unwrap();

    let state = AppState::new(pool.clone());
    let result = routes::college::extend_offer(
        State(state),
        Extension(college_claims(college)),
        Path(application_id),
        offer_letter_multipart().await,
    )
    .await;
    assert!(result.is_err());
    assert_eq!(
        current_status(&pool, application_id).await,
        ApplicationStatus::Shortlisted
    );

    let letters_dir = PathBuf::from(root).join("offer_letters");
    let leftover = match std::fs::read_dir(&letters_dir) {
        Ok(entries) => entries.count(),
        Err(_) => 0,
    };
    assert_eq!(leftover, 0, "refused transition must not orphan the upload");

    remove_users(&pool, &[candidate, college]).await;
}
