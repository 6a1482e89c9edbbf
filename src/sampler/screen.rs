use tokio::sync::broadcast;

use super::{DeactivateFuture, ListenerTask, Subscription};
use crate::device::ScreenEvent;
use crate::error::SubscriptionError;
use crate::kernel::datapoint::DataPointKind;
use crate::kernel::handle::RecordHandle;

/// Screen on = 1, off = 0.
pub fn record_screen(recorder: &RecordHandle, event: ScreenEvent) -> bool {
    let value = match event {
        ScreenEvent::On => 1,
        ScreenEvent::Off => 0,
    };
    recorder.record(DataPointKind::ScreenState, value)
}

pub struct ScreenStateListener {
    recorder: RecordHandle,
    source: broadcast::Sender<ScreenEvent>,
    task: ListenerTask,
}

impl ScreenStateListener {
    pub const NAME: &'static str = "screen";

    pub fn new(recorder: RecordHandle, source: broadcast::Sender<ScreenEvent>) -> Self {
        Self {
            recorder,
            source,
            task: ListenerTask::new(Self::NAME),
        }
    }
}

impl Subscription for ScreenStateListener {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn activate(&mut self) -> Result<(), SubscriptionError> {
        let recorder = self.recorder.clone();
        self.task.start(&self.source, move |event| {
            record_screen(&recorder, event);
        })
    }

    fn deactivate(&mut self) -> DeactivateFuture<'_> {
        Box::pin(self.task.stop())
    }

    fn is_active(&self) -> bool {
        self.task.is_active()
    }
}
