//! Session-boundary uploads. Fire-and-forget from the state machine's point
//! of view: each record is handed to a spawned task and the transition
//! completes whatever the transport does.

pub mod client;
pub mod record;

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{error, info};
use uuid::Uuid;

use crate::error::UploadError;
use crate::kernel::telemetry::{AgentEvent, Boundary, TelemetryHandle};

pub use client::{HttpUploadClient, UploadClient, UploadFuture};
pub use record::SessionRecord;

/// An upload that has been handed off and may still be in flight.
pub struct PendingUpload {
    pub upload_id: Uuid,
    pub test_id: i64,
    pub boundary: Boundary,
    pub points: usize,
    handle: JoinHandle<Result<(), UploadError>>,
}

impl PendingUpload {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub async fn wait(self) -> UploadOutcome {
        let result = match self.handle.await {
            Ok(result) => result,
            Err(e) => Err(UploadError::Join(e.to_string())),
        };
        UploadOutcome {
            upload_id: self.upload_id,
            test_id: self.test_id,
            boundary: self.boundary,
            points: self.points,
            result,
        }
    }
}

#[derive(Debug)]
pub struct UploadOutcome {
    pub upload_id: Uuid,
    pub test_id: i64,
    pub boundary: Boundary,
    pub points: usize,
    pub result: Result<(), UploadError>,
}

impl UploadOutcome {
    pub fn is_delivered(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Clone)]
pub struct UploadDispatcher {
    client: Arc<dyn UploadClient>,
    telemetry: TelemetryHandle,
}

impl UploadDispatcher {
    pub fn new(client: Arc<dyn UploadClient>, telemetry: TelemetryHandle) -> Self {
        Self { client, telemetry }
    }

    /// Spawns the upload and returns immediately. Without a runtime the
    /// record cannot be sent; it is logged as lost and `None` is returned.
    pub fn dispatch(&self, record: SessionRecord, boundary: Boundary) -> Option<PendingUpload> {
        let upload_id = Uuid::new_v4();
        let test_id = record.test_id;
        let points = record.len();

        let Ok(runtime) = Handle::try_current() else {
            error!(%upload_id, test_id, points, "no async runtime, session data for this boundary is lost");
            self.telemetry.record(AgentEvent::UploadFailed { upload_id });
            return None;
        };

        self.telemetry.record(AgentEvent::UploadDispatched {
            upload_id,
            test_id,
            boundary,
            points,
        });
        info!(%upload_id, test_id, ?boundary, points, "upload dispatched");

        let client = self.client.clone();
        let telemetry = self.telemetry.clone();
        let handle = runtime.spawn(async move {
            let result = client.upload(&record).await;
            match &result {
                Ok(()) => {
                    info!(%upload_id, test_id, "upload delivered");
                    telemetry.record(AgentEvent::UploadSucceeded { upload_id });
                }
                Err(e) => {
                    error!(%upload_id, test_id, "upload failed, data for this boundary is lost: {}", e);
                    telemetry.record(AgentEvent::UploadFailed { upload_id });
                }
            }
            result
        });

        Some(PendingUpload {
            upload_id,
            test_id,
            boundary,
            points,
            handle,
        })
    }
}
