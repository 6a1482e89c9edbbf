use tokio::sync::broadcast;

use super::{DeactivateFuture, ListenerTask, Subscription};
use crate::device::SignalStrength;
use crate::error::SubscriptionError;
use crate::kernel::datapoint::{DataPointKind, SampleValue};
use crate::kernel::handle::RecordHandle;

/// Metrics to emit for one signal-strength change.
///
/// GSM is reported alone. Anything else gets both CDMA and EVDO: the radio
/// stack cannot say which of the two carries data, so both go out and
/// downstream analysis discards the one holding the unknown sentinel.
pub fn signal_points(strength: &SignalStrength) -> Vec<(DataPointKind, SampleValue)> {
    if strength.is_gsm {
        vec![(DataPointKind::CellSignalGsm, strength.gsm_signal_strength.into())]
    } else {
        vec![
            (DataPointKind::CellSignalCdma, strength.cdma_dbm.into()),
            (DataPointKind::CellSignalEvdo, strength.evdo_dbm.into()),
        ]
    }
}

pub fn record_signal(recorder: &RecordHandle, strength: &SignalStrength) -> usize {
    signal_points(strength)
        .into_iter()
        .filter(|(kind, value)| recorder.record(*kind, *value))
        .count()
}

pub struct RadioSignalListener {
    recorder: RecordHandle,
    source: broadcast::Sender<SignalStrength>,
    task: ListenerTask,
}

impl RadioSignalListener {
    pub const NAME: &'static str = "radio";

    pub fn new(recorder: RecordHandle, source: broadcast::Sender<SignalStrength>) -> Self {
        Self {
            recorder,
            source,
            task: ListenerTask::new(Self::NAME),
        }
    }
}

impl Subscription for RadioSignalListener {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn activate(&mut self) -> Result<(), SubscriptionError> {
        let recorder = self.recorder.clone();
        self.task.start(&self.source, move |strength: SignalStrength| {
            record_signal(&recorder, &strength);
        })
    }

    fn deactivate(&mut self) -> DeactivateFuture<'_> {
        Box::pin(self.task.stop())
    }

    fn is_active(&self) -> bool {
        self.task.is_active()
    }
}
