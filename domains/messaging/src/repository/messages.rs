//! Postgres message repository
//!
//! Joins sender, receiver and property summaries with LEFT JOINs so that a
//! missing profile surfaces as `None` rather than dropping the row.

use async_trait::async_trait;
use campusnest_common::{Error, Pagination, Result};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::MessageStore;
use crate::domain::entities::{Message, NewMessage, PropertySummary, UserSummary};

/// Projection shared by every read and by insert's RETURNING path
const MESSAGE_PROJECTION: &str = r#"
    m.id, m.content, m.created_at, m.sender_id, m.receiver_id,
    m.property_id, m.read, m.phone_number,
    p.title AS property_title, p.property_images AS property_images,
    s.id AS sender_profile_id, s.full_name AS sender_full_name,
    s.email AS sender_email, s.profile_image_url AS sender_image_url,
    r.id AS receiver_profile_id, r.full_name AS receiver_full_name,
    r.email AS receiver_email, r.profile_image_url AS receiver_image_url
"#;

const MESSAGE_JOINS: &str = r#"
    LEFT JOIN properties p ON p.id = m.property_id
    LEFT JOIN profiles s ON s.id = m.sender_id
    LEFT JOIN profiles r ON r.id = m.receiver_id
"#;

/// Flat row as returned by the joined query
#[derive(Debug, sqlx::FromRow)]
struct MessageRow {
    id: Uuid,
    content: String,
    created_at: DateTime<Utc>,
    sender_id: Uuid,
    receiver_id: Uuid,
    property_id: Option<Uuid>,
    read: bool,
    phone_number: Option<String>,
    property_title: Option<String>,
    property_images: Option<Vec<String>>,
    sender_profile_id: Option<Uuid>,
    sender_full_name: Option<String>,
    sender_email: Option<String>,
    sender_image_url: Option<String>,
    receiver_profile_id: Option<Uuid>,
    receiver_full_name: Option<String>,
    receiver_email: Option<String>,
    receiver_image_url: Option<String>,
}

fn profile(
    id: Option<Uuid>,
    full_name: Option<String>,
    email: Option<String>,
    profile_image_url: Option<String>,
) -> Option<UserSummary> {
    Some(UserSummary {
        id: id?,
        full_name,
        email: email?,
        profile_image_url,
    })
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        let property = match (row.property_id, row.property_title) {
            (Some(id), Some(title)) => Some(PropertySummary {
                id,
                title,
                property_images: row.property_images.unwrap_or_default(),
            }),
            _ => None,
        };

        Message {
            id: row.id,
            content: row.content,
            created_at: row.created_at,
            sender_id: row.sender_id,
            receiver_id: row.receiver_id,
            property_id: row.property_id,
            read: row.read,
            phone_number: row.phone_number,
            property,
            sender: profile(
                row.sender_profile_id,
                row.sender_full_name,
                row.sender_email,
                row.sender_image_url,
            ),
            receiver: profile(
                row.receiver_profile_id,
                row.receiver_full_name,
                row.receiver_email,
                row.receiver_image_url,
            ),
        }
    }
}

#[derive(Clone)]
pub struct MessageRepository {
    pool: PgPool,
}

impl MessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageStore for MessageRepository {
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Message>> {
        let sql = format!(
            "SELECT {MESSAGE_PROJECTION} FROM messages m {MESSAGE_JOINS}
             WHERE m.sender_id = $1 OR m.receiver_id = $1
             ORDER BY m.created_at DESC"
        );

        let rows = sqlx::query_as::<_, MessageRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Message::from).collect())
    }

    async fn insert(&self, message: &NewMessage) -> Result<Message> {
        let sql = format!(
            "WITH m AS (
                INSERT INTO messages (sender_id, receiver_id, property_id, content, phone_number)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *
             )
             SELECT {MESSAGE_PROJECTION} FROM m {MESSAGE_JOINS}"
        );

        let row = sqlx::query_as::<_, MessageRow>(&sql)
            .bind(message.sender_id)
            .bind(message.receiver_id)
            .bind(message.property_id)
            .bind(&message.content)
            .bind(&message.phone_number)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                    Error::NotFound("Receiver or property not found".to_string())
                }
                other => Error::Database(other),
            })?;

        tracing::debug!(message_id = %row.id, receiver_id = %row.receiver_id, "Message inserted");
        Ok(row.into())
    }

    async fn mark_read(&self, receiver_id: Uuid, message_ids: &[Uuid]) -> Result<u64> {
        if message_ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            r#"
            UPDATE messages SET read = TRUE
            WHERE receiver_id = $1 AND id = ANY($2) AND read = FALSE
            "#,
        )
        .bind(receiver_id)
        .bind(message_ids)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn list_for_property(
        &self,
        property_id: Uuid,
        page: Pagination,
    ) -> Result<Vec<Message>> {
        let sql = format!(
            "SELECT {MESSAGE_PROJECTION} FROM messages m {MESSAGE_JOINS}
             WHERE m.property_id = $1
             ORDER BY m.created_at DESC
             OFFSET $2 LIMIT $3"
        );

        let rows = sqlx::query_as::<_, MessageRow>(&sql)
            .bind(property_id)
            .bind(page.offset())
            .bind(page.limit())
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Message::from).collect())
    }

    async fn property_landlord(&self, property_id: Uuid) -> Result<Option<Uuid>> {
        let landlord = sqlx::query_scalar::<_, Uuid>(
            "SELECT landlord_id FROM properties WHERE id = $1",
        )
        .bind(property_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(landlord)
    }
}
