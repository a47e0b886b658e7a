// CampusNest inbox watcher
//
// Follows one user's inbox from the terminal: loads it, then re-aggregates on
// every message change delivered over Postgres LISTEN/NOTIFY.
//
// Usage: inbox-watch <viewer-uuid>

use std::sync::Arc;

use campusnest_common::Config;
use campusnest_messaging::{InboxSession, MessageRepository, PgChangeFeed, RealtimeRefresh};
use tokio::signal;
use tracing::{info, warn};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    campusnest_app::init_tracing(&config);

    let viewer_id: Uuid = std::env::args()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("usage: inbox-watch <viewer-uuid>"))?
        .parse()?;

    let pool = campusnest_app::connect_database(&config).await?;
    let feed = PgChangeFeed::connect(&pool).await?;
    let store = Arc::new(MessageRepository::new(pool));

    let session = Arc::new(InboxSession::new(viewer_id, store));
    let outcome = session.refresh().await;
    info!(?outcome, viewer_id = %viewer_id, "Inbox loaded");

    let mut versions = session.subscribe();
    let handle = RealtimeRefresh::spawn(session.clone(), feed);

    loop {
        tokio::select! {
            changed = versions.changed() => {
                if changed.is_err() {
                    warn!("Session closed");
                    break;
                }
                let snapshot = session.snapshot();
                for conversation in &snapshot.conversations {
                    info!(
                        conversation = %conversation.key,
                        title = conversation.title(),
                        with = %conversation.counterpart.display_name(),
                        messages = conversation.message_count(),
                        unread = conversation.unread_count,
                        last_message_at = %conversation.last_message_at,
                        "Conversation"
                    );
                }
                info!(unread_total = snapshot.unread_total, "Inbox updated");
            }
            _ = signal::ctrl_c() => {
                info!("Stopping inbox watcher");
                break;
            }
        }
    }

    handle.shutdown().await;
    Ok(())
}
