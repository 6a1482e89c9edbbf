use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::kernel::datapoint::DataPointKind;

/// Which session boundary produced an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Boundary {
    Start,
    Stop,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AgentEvent {
    SessionStarted {
        test_id: i64,
        profile_id: u32,
    },

    SessionStopped {
        test_id: i64,
    },

    DuplicateStart {
        active: i64,
        requested: i64,
    },

    StopRejected {
        requested: i64,
        active: Option<i64>,
    },

    /// A sample arrived while no session was running.
    SampleDropped {
        kind: DataPointKind,
    },

    ListenerFault {
        listener: String,
    },

    UploadDispatched {
        upload_id: Uuid,
        test_id: i64,
        boundary: Boundary,
        points: usize,
    },

    UploadSucceeded {
        upload_id: Uuid,
    },

    UploadFailed {
        upload_id: Uuid,
    },
}
