pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod workflow;

use crate::services::{
    application_service::ApplicationService, job_service::JobService,
    notification_service::NotificationService, storage_service::StorageService,
};
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub application_service: ApplicationService,
    pub job_service: JobService,
    pub notification_service: NotificationService,
    pub storage_service: StorageService,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let config = crate::config::get_config();

        let application_service = ApplicationService::new(pool.clone());
        let job_service = JobService::new(pool.clone());
        let notification_service = NotificationService::new(pool.clone());
        let storage_service = StorageService::new(config.uploads_dir.clone());

        Self {
            pool,
            application_service,
            job_service,
            notification_service,
            storage_service,
        }
    }
}
