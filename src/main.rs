use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post},
    Router,
};
use std::net::SocketAddr;
use teacher_portal_backend::{
    config::{get_config, init_config},
    database::pool::create_pool,
    middleware::auth, routes, AppState,
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    init_config()?;
    let config = get_config();

    let pool = create_pool().await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let app_state = AppState::new(pool);

    let base_routes = Router::new().route("/health", get(routes::health::health));

    let employer_api = Router::new()
        .route(
            "/api/employer/applications",
            get(routes::employer::list_my_applications),
        )
        .route(
            "/api/employer/jobs/:job_id/apply",
            post(routes::employer::apply_to_job),
        )
        .route(
            "/api/employer/jobs/:job_id/save",
            post(routes::employer::save_job),
        )
        .route(
            "/api/employer/applications/:app_id/save",
            delete(routes::employer::unsave_job),
        )
        .route(
            "/api/employer/applications/:app_id",
            delete(routes::employer::withdraw_application)
                .patch(routes::employer::respond_to_offer),
        )
        .route(
            "/api/employer/applications/:app_id/acceptance",
            post(routes::employer::submit_acceptance),
        )
        .layer(axum::middleware::from_fn(auth::require_employer));

    let college_api = Router::new()
        .route(
            "/api/college/applications",
            get(routes::college::list_applications),
        )
        .route(
            "/api/college/applications/shortlisted",
            get(routes::college::list_shortlisted_applications),
        )
        .route(
            "/api/college/applications/offers",
            get(routes::college::list_offer_stage_applications),
        )
        .route(
            "/api/college/applications/:app_id/status",
            patch(routes::college::update_application_status),
        )
        .route(
            "/api/college/applications/:app_id/interview",
            post(routes::college::schedule_interview),
        )
        .route(
            "/api/college/applications/:app_id/offer",
            post(routes::college::extend_offer),
        )
        .route(
            "/api/college/applications/:app_id/finalize",
            post(routes::college::finalize_hiring),
        )
        .route(
            "/api/college/jobs",
            get(routes::college::list_my_jobs).post(routes::college::create_job),
        )
        .route(
            "/api/college/jobs/:job_id",
            get(routes::college::get_my_job)
                .patch(routes::college::update_my_job)
                .delete(routes::college::delete_my_job),
        )
        .layer(axum::middleware::from_fn(auth::require_college));

    let admin_api = Router::new()
        .route(
            "/api/admin/applications",
            get(routes::admin::list_all_applications),
        )
        .route(
            "/api/admin/applications/pending",
            get(routes::admin::list_pending_applications),
        )
        .route(
            "/api/admin/applications/workflow",
            get(routes::admin::list_workflow_applications),
        )
        .route(
            "/api/admin/applications/interviews",
            get(routes::admin::list_interview_applications),
        )
        .route(
            "/api/admin/applications/documents/pending",
            get(routes::admin::list_pending_document_applications),
        )
        .route(
            "/api/admin/applications/:app_id",
            patch(routes::admin::review_application),
        )
        .route(
            "/api/admin/applications/:app_id/interview/confirm",
            post(routes::admin::confirm_interview),
        )
        .route(
            "/api/admin/applications/:app_id/offer/forward",
            post(routes::admin::forward_offer),
        )
        .route(
            "/api/admin/applications/:app_id/documents",
            post(routes::admin::verify_documents),
        )
        .route(
            "/api/admin/jobs",
            get(routes::admin::list_all_jobs).post(routes::admin::create_job),
        )
        .route(
            "/api/admin/jobs/pending",
            get(routes::admin::list_pending_jobs),
        )
        .route(
            "/api/admin/jobs/:job_id",
            get(routes::admin::get_job)
                .patch(routes::admin::update_job)
                .delete(routes::admin::delete_job),
        )
        .route(
            "/api/admin/jobs/:job_id/moderate",
            patch(routes::admin::moderate_job),
        )
        .route(
            "/api/admin/dashboard/stats",
            get(routes::admin::dashboard_stats),
        )
        .route(
            "/api/admin/notifications/broadcast",
            post(routes::admin::broadcast_notification),
        )
        .layer(axum::middleware::from_fn(auth::require_admin));

    let notification_api = Router::new()
        .route(
            "/api/notifications",
            get(routes::notifications::list_my_notifications),
        )
        .route(
            "/api/notifications/read-all",
            post(routes::notifications::mark_all_read),
        )
        .route(
            "/api/notifications/:notif_id/read",
            post(routes::notifications::mark_one_read),
        )
        .layer(axum::middleware::from_fn(auth::require_auth));

    info!("Serving uploads from: {}", config.uploads_dir);

    let app = base_routes
        .merge(employer_api)
        .merge(college_api)
        .merge(admin_api)
        .merge(notification_api)
        .nest_service(
            "/uploads",
            tower_http::services::ServeDir::new(&config.uploads_dir),
        )
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(50 * 1024 * 1024));

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
