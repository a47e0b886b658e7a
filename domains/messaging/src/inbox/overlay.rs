//! Floating messaging overlay
//!
//! Any component can open or toggle the overlay by publishing a typed
//! `OverlayEvent` on a shared `OverlayBus`; the overlay owns its own
//! `InboxSession` and refreshes it whenever it is opened.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

use super::session::{InboxSession, RefreshOutcome};

const BUS_CAPACITY: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayEvent {
    Toggle,
    Open,
    Close,
    Minimize,
    Restore,
}

/// Typed broadcast bus for overlay events. Cheap to clone.
#[derive(Clone)]
pub struct OverlayBus {
    sender: broadcast::Sender<OverlayEvent>,
}

impl Default for OverlayBus {
    fn default() -> Self {
        Self::new()
    }
}

impl OverlayBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(BUS_CAPACITY);
        Self { sender }
    }

    /// Publish to every subscribed overlay, returning how many received it
    pub fn publish(&self, event: OverlayEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OverlayEvent> {
        self.sender.subscribe()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OverlayState {
    pub open: bool,
    pub minimized: bool,
}

impl OverlayState {
    /// Apply an event, returning the previous state
    pub fn apply(&mut self, event: OverlayEvent) -> OverlayState {
        let previous = *self;
        match event {
            OverlayEvent::Toggle => {
                self.open = !self.open;
                self.minimized = false;
            }
            OverlayEvent::Open => {
                self.open = true;
                self.minimized = false;
            }
            OverlayEvent::Close => {
                self.open = false;
                self.minimized = false;
            }
            OverlayEvent::Minimize if self.open => self.minimized = true,
            OverlayEvent::Restore if self.open => self.minimized = false,
            OverlayEvent::Minimize | OverlayEvent::Restore => {}
        }
        previous
    }

    /// Open and not minimized
    pub fn is_expanded(&self) -> bool {
        self.open && !self.minimized
    }
}

pub struct MessagingOverlay {
    state: OverlayState,
    events: broadcast::Receiver<OverlayEvent>,
    session: Arc<InboxSession>,
}

impl MessagingOverlay {
    /// Create a closed overlay listening on `bus`
    pub fn new(bus: &OverlayBus, session: Arc<InboxSession>) -> Self {
        Self {
            state: OverlayState::default(),
            events: bus.subscribe(),
            session,
        }
    }

    pub fn state(&self) -> OverlayState {
        self.state
    }

    pub fn session(&self) -> &Arc<InboxSession> {
        &self.session
    }

    /// Unread messages addressed to the viewer, shown on the launcher button
    pub fn badge(&self) -> usize {
        self.session.unread_total()
    }

    /// Apply one event. Opening a closed overlay reloads its inbox.
    pub async fn handle(&mut self, event: OverlayEvent) -> Option<RefreshOutcome> {
        let previous = self.state.apply(event);
        tracing::debug!(?event, open = self.state.open, minimized = self.state.minimized, "Overlay event");

        if !previous.open && self.state.open {
            Some(self.session.refresh().await)
        } else {
            None
        }
    }

    /// Wait for the next published event and apply it. `None` once the bus is gone.
    pub async fn next_event(&mut self) -> Option<OverlayState> {
        loop {
            match self.events.recv().await {
                Ok(event) => {
                    self.handle(event).await;
                    return Some(self.state);
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Overlay events lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Apply every event already published, returning how many were applied
    pub async fn drain_events(&mut self) -> usize {
        let mut applied = 0;
        loop {
            match self.events.try_recv() {
                Ok(event) => {
                    self.handle(event).await;
                    applied += 1;
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Overlay events lagged");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return applied,
            }
        }
    }
}
