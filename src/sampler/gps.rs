use tokio::sync::broadcast;

use super::{DeactivateFuture, ListenerTask, Subscription};
use crate::device::events::{GPS_EVENT_STARTED, GPS_EVENT_STOPPED};
use crate::device::GpsStatusEvent;
use crate::error::SubscriptionError;
use crate::kernel::datapoint::DataPointKind;
use crate::kernel::handle::RecordHandle;

/// Only engine start/stop are recorded, with the raw status code as value.
/// First-fix and satellite updates are ignored.
pub fn record_gps(recorder: &RecordHandle, event: GpsStatusEvent) -> bool {
    match event.code {
        GPS_EVENT_STARTED | GPS_EVENT_STOPPED => recorder.record(DataPointKind::GpsState, event.code),
        _ => false,
    }
}

pub struct GpsStatusListener {
    recorder: RecordHandle,
    source: broadcast::Sender<GpsStatusEvent>,
    task: ListenerTask,
}

impl GpsStatusListener {
    pub const NAME: &'static str = "gps";

    pub fn new(recorder: RecordHandle, source: broadcast::Sender<GpsStatusEvent>) -> Self {
        Self {
            recorder,
            source,
            task: ListenerTask::new(Self::NAME),
        }
    }
}

impl Subscription for GpsStatusListener {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn activate(&mut self) -> Result<(), SubscriptionError> {
        let recorder = self.recorder.clone();
        self.task.start(&self.source, move |event| {
            record_gps(&recorder, event);
        })
    }

    fn deactivate(&mut self) -> DeactivateFuture<'_> {
        Box::pin(self.task.stop())
    }

    fn is_active(&self) -> bool {
        self.task.is_active()
    }
}
