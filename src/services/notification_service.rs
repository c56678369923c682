use crate::error::Result;
use crate::models::application::Application;
use crate::models::notification::Notification;
use crate::workflow::{Notice, Recipient};
use sqlx::PgPool;
use uuid::Uuid;

/// Durable log of user-facing alerts. Writes are best-effort: a failed
/// insert is logged and never fails the transition that produced it.
#[derive(Clone)]
pub struct NotificationService {
    pool: PgPool,
}

impl NotificationService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record a single notification. Errors are swallowed after logging.
    pub async fn record(&self, recipient: Uuid, message: &str, link: &str) {
        let res = sqlx::query(
            r#"INSERT INTO notifications (recipient, message, link) VALUES ($1, $2, $3)"#,
        )
        .bind(recipient)
        .bind(message)
        .bind(link)
        .execute(&self.pool)
        .await;

        if let Err(e) = res {
            tracing::error!(recipient = %recipient, error = ?e, "Failed to record notification");
        }
    }

    /// Dispatch the post-commit notices of a workflow transition. Recipient
    /// ids and the job title are resolved here; a missing job (e.g. deleted
    /// concurrently) just drops the notices.
    pub async fn dispatch(&self, application: &Application, notices: &[Notice]) {
        if notices.is_empty() {
            return;
        }

        let job = sqlx::query_as::<_, (String, Uuid)>(
            r#"SELECT title, posted_by FROM jobs WHERE id = $1"#,
        )
        .bind(application.job_id)
        .fetch_optional(&self.pool)
        .await;

        let (title, posted_by) = match job {
            Ok(Some(row)) => row,
            Ok(None) => {
                tracing::warn!(job_id = %application.job_id, "Dropping notices for missing job");
                return;
            }
            Err(e) => {
                tracing::error!(job_id = %application.job_id, error = ?e, "Failed to resolve job for notices");
                return;
            }
        };

        for notice in notices {
            let recipient = match notice.recipient() {
                Recipient::Candidate => application.user_id,
                Recipient::JobPoster => posted_by,
            };
            let (message, link) = notice.render(&title);
            self.record(recipient, &message, link).await;
        }
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Notification>> {
        let rows = sqlx::query_as::<_, Notification>(
            r#"SELECT id, recipient, message, link, read, created_at
               FROM notifications WHERE recipient = $1 ORDER BY created_at DESC"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64> {
        let res = sqlx::query(
            r#"UPDATE notifications SET read = TRUE WHERE recipient = $1 AND read = FALSE"#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected())
    }

    pub async fn mark_read(&self, user_id: Uuid, notification_id: Uuid) -> Result<Notification> {
        let row = sqlx::query_as::<_, Notification>(
            r#"UPDATE notifications SET read = TRUE
               WHERE id = $1 AND recipient = $2
               RETURNING id, recipient, message, link, read, created_at"#,
        )
        .bind(notification_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        row.ok_or_else(|| {
            crate::error::Error::NotFound("Notification not found or permission denied.".into())
        })
    }

    /// Admin broadcast to every employer and college account.
    pub async fn broadcast(&self, message: &str) -> Result<u64> {
        let res = sqlx::query(
            r#"INSERT INTO notifications (recipient, message, link)
               SELECT id, $1, '/notifications' FROM users WHERE role IN ('employer', 'college')"#,
        )
        .bind(message)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected())
    }
}
