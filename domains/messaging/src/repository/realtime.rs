//! Postgres LISTEN/NOTIFY change feed
//!
//! The `messages` trigger publishes one JSON payload per row change on
//! `REALTIME_CHANNEL`. `PgListener` reconnects on its own after connection loss.

use async_trait::async_trait;
use campusnest_common::Result;
use sqlx::postgres::PgListener;
use sqlx::PgPool;

use super::{ChangeFeed, MessageChange};

/// NOTIFY channel hardcoded in `notify_message_change()`; the two must agree
pub const REALTIME_CHANNEL: &str = "message_changes";

pub struct PgChangeFeed {
    listener: PgListener,
}

impl PgChangeFeed {
    /// Open a dedicated connection and LISTEN on `REALTIME_CHANNEL`
    pub async fn connect(pool: &PgPool) -> Result<Self> {
        let mut listener = PgListener::connect_with(pool).await?;
        listener.listen(REALTIME_CHANNEL).await?;
        tracing::info!(channel = REALTIME_CHANNEL, "Listening for message changes");
        Ok(Self { listener })
    }
}

#[async_trait]
impl ChangeFeed for PgChangeFeed {
    async fn next_change(&mut self) -> Result<Option<MessageChange>> {
        loop {
            let notification = self.listener.recv().await?;
            match serde_json::from_str::<MessageChange>(notification.payload()) {
                Ok(change) => return Ok(Some(change)),
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        channel = %notification.channel(),
                        "Skipping malformed change notification"
                    );
                }
            }
        }
    }
}
