use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, warn};

use super::{DeactivateFuture, ListenerTask, Subscription};
use crate::device::{DeviceProbe, TimeTick};
use crate::error::SubscriptionError;
use crate::kernel::datapoint::DataPointKind;
use crate::kernel::handle::RecordHandle;

/// Reads battery and wifi state and records one data point per metric.
/// Cheap to clone; the controller keeps one for the out-of-band samples
/// at session start and stop.
#[derive(Clone)]
pub struct PeriodicReader {
    probe: Arc<dyn DeviceProbe>,
    recorder: RecordHandle,
}

impl PeriodicReader {
    pub fn new(probe: Arc<dyn DeviceProbe>, recorder: RecordHandle) -> Self {
        Self { probe, recorder }
    }

    /// Returns how many points were recorded. An unreadable metric is
    /// skipped; the others are still recorded.
    pub fn sample(&self) -> usize {
        let mut recorded = 0;

        match self.probe.battery() {
            Ok(battery) => {
                recorded += usize::from(self.recorder.record(DataPointKind::BatteryLevel, battery.level));
                recorded += usize::from(self.recorder.record(DataPointKind::BatteryScale, battery.scale));
                match battery.fraction() {
                    Some(percent) => {
                        recorded +=
                            usize::from(self.recorder.record(DataPointKind::BatteryPercent, percent));
                    }
                    None => debug!(
                        level = battery.level,
                        scale = battery.scale,
                        "battery percent undefined, skipped"
                    ),
                }
                recorded += usize::from(
                    self.recorder.record(DataPointKind::BatteryVoltage, battery.voltage_mv),
                );
            }
            Err(e) => warn!("battery read failed, skipping battery metrics: {}", e),
        }

        match self.probe.wifi_enabled() {
            Ok(enabled) => {
                recorded += usize::from(self.recorder.record(DataPointKind::WifiState, enabled));
            }
            Err(e) => warn!("wifi state read failed, skipping: {}", e),
        }

        recorded
    }
}

/// Samples on every coarse tick while active.
pub struct PeriodicSampler {
    reader: PeriodicReader,
    ticks: broadcast::Sender<TimeTick>,
    task: ListenerTask,
}

impl PeriodicSampler {
    pub const NAME: &'static str = "periodic";

    pub fn new(reader: PeriodicReader, ticks: broadcast::Sender<TimeTick>) -> Self {
        Self {
            reader,
            ticks,
            task: ListenerTask::new(Self::NAME),
        }
    }
}

impl Subscription for PeriodicSampler {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn activate(&mut self) -> Result<(), SubscriptionError> {
        let reader = self.reader.clone();
        self.task.start(&self.ticks, move |tick: TimeTick| {
            let recorded = reader.sample();
            debug!(sequence = tick.sequence, recorded, "periodic sample");
        })
    }

    fn deactivate(&mut self) -> DeactivateFuture<'_> {
        Box::pin(self.task.stop())
    }

    fn is_active(&self) -> bool {
        self.task.is_active()
    }
}
