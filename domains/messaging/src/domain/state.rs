//! State machine for the message composer
//!
//! Composer states: Idle → Sending → Idle. At most one send is in flight.

pub use campusnest_common::StateError;
use serde::{Deserialize, Serialize};

/// Composer states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ComposerState {
    #[default]
    Idle,
    Sending,
}

impl ComposerState {
    /// Get all valid next states from current state
    pub fn valid_transitions(&self) -> &'static [ComposerState] {
        match self {
            Self::Idle => &[Self::Sending],
            Self::Sending => &[Self::Idle],
        }
    }

    pub fn is_sending(&self) -> bool {
        matches!(self, Self::Sending)
    }
}

impl std::fmt::Display for ComposerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Sending => write!(f, "sending"),
        }
    }
}

/// Events that drive the composer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ComposerEvent {
    /// User submitted the draft
    Submit,
    /// The store accepted the message
    Succeed,
    /// The store rejected the message or was unreachable
    Fail,
}

impl std::fmt::Display for ComposerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Submit => write!(f, "submit"),
            Self::Succeed => write!(f, "succeed"),
            Self::Fail => write!(f, "fail"),
        }
    }
}

/// Composer state machine
pub struct ComposerStateMachine;

impl ComposerStateMachine {
    /// Attempt a state transition
    pub fn transition(
        current: ComposerState,
        event: ComposerEvent,
    ) -> Result<ComposerState, StateError> {
        match (current, event) {
            (ComposerState::Idle, ComposerEvent::Submit) => Ok(ComposerState::Sending),
            (ComposerState::Sending, ComposerEvent::Succeed | ComposerEvent::Fail) => {
                Ok(ComposerState::Idle)
            }
            _ => Err(StateError::InvalidTransition {
                from: current.to_string(),
                event: event.to_string(),
            }),
        }
    }
}
