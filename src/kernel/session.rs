use serde::{Deserialize, Serialize};

use super::time::Timestamp;
use crate::error::SessionError;

/// One running test. Created at start, dropped at stop. Owned by the controller only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub test_id: i64,
    pub device_id: String,
    /// Opaque to this crate; forwarded to the tracking-profile collaborator.
    pub profile_id: u32,
    pub started_at: Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SessionState {
    #[default]
    Idle,
    Active,
}

/// Outcome of a start request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartDecision {
    Begin,
    /// A session is already running; the duplicate start is ignored.
    IgnoreDuplicate { active: i64 },
}

/// The session state machine. Pure: current session + request -> decision.
/// The controller applies the effects.
pub struct SessionGraph;

impl SessionGraph {
    pub fn state(current: Option<&Session>) -> SessionState {
        match current {
            Some(_) => SessionState::Active,
            None => SessionState::Idle,
        }
    }

    pub fn start(current: Option<&Session>) -> StartDecision {
        match current {
            None => StartDecision::Begin,
            Some(session) => StartDecision::IgnoreDuplicate {
                active: session.test_id,
            },
        }
    }

    /// A stop is only valid against the running session's own id.
    pub fn stop(current: Option<&Session>, test_id: i64) -> Result<(), SessionError> {
        match current {
            Some(session) if session.test_id == test_id => Ok(()),
            Some(session) => Err(SessionError::TestIdMismatch {
                active: session.test_id,
                requested: test_id,
            }),
            None => Err(SessionError::NotActive { requested: test_id }),
        }
    }
}
