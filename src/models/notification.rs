use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub recipient: Uuid,
    pub message: String,
    pub link: String,
    pub read: bool,
    pub created_at: Option<DateTime<Utc>>,
}
