//! Realtime refresh trigger
//!
//! Listens to a change feed and runs a full `InboxSession::refresh` for every
//! change where the viewer is receiver or sender. Refreshes run on their own
//! tasks so that stopping the listener never aborts one already in flight.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use super::session::InboxSession;
use crate::repository::ChangeFeed;

/// Pause after a feed error before reading again
const FEED_RETRY_DELAY: Duration = Duration::from_secs(1);

pub struct RealtimeRefresh;

impl RealtimeRefresh {
    /// Start listening. Dropping the handle stops the listener.
    pub fn spawn<F>(session: Arc<InboxSession>, feed: F) -> RealtimeHandle
    where
        F: ChangeFeed + 'static,
    {
        let (stop_tx, stop_rx) = oneshot::channel();
        let task = tokio::spawn(listen(session, feed, stop_rx));
        RealtimeHandle {
            stop: Some(stop_tx),
            task: Some(task),
        }
    }
}

async fn listen<F: ChangeFeed>(
    session: Arc<InboxSession>,
    mut feed: F,
    mut stop: oneshot::Receiver<()>,
) {
    let viewer_id = session.viewer_id();
    tracing::debug!(viewer_id = %viewer_id, "Realtime refresh started");

    loop {
        tokio::select! {
            _ = &mut stop => {
                tracing::debug!(viewer_id = %viewer_id, "Realtime refresh stopped");
                break;
            }
            next = feed.next_change() => match next {
                Ok(Some(change)) if change.concerns(viewer_id) => {
                    tracing::debug!(op = ?change.op, message_id = %change.id, "Message change, refreshing");
                    let session = session.clone();
                    tokio::spawn(async move {
                        session.refresh().await;
                    });
                }
                Ok(Some(_)) => {}
                Ok(None) => {
                    tracing::info!(viewer_id = %viewer_id, "Change feed closed");
                    break;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Change feed error, retrying");
                    tokio::time::sleep(FEED_RETRY_DELAY).await;
                }
            }
        }
    }
}

/// Owner of a running listener
pub struct RealtimeHandle {
    stop: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl RealtimeHandle {
    /// Stop listening for further changes
    pub fn stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Stop and wait for the listener task to exit
    pub async fn shutdown(mut self) {
        self.stop();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Realtime listener task failed");
            }
        }
    }
}

impl Drop for RealtimeHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
