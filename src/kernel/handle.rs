use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use super::datapoint::{DataPoint, DataPointKind, SampleValue};
use super::queue::DataQueue;
use super::session::{Session, SessionGraph, SessionState};
use super::telemetry::{AgentEvent, TelemetryHandle};
use super::time::Clock;

/// Session record plus its queue. Only the controller replaces `session`;
/// samplers reach the queue exclusively through [`RecordHandle::record`].
#[derive(Debug, Default)]
pub struct SessionCore {
    pub(crate) session: Option<Session>,
    pub(crate) queue: DataQueue,
}

/// Cloneable entry point into the controller's queue, injected into every sampler.
///
/// `record` is the single serialization point for all sampler callbacks:
/// the timestamp is taken under the same lock as the append, so queue order
/// and timestamp order never disagree.
#[derive(Clone)]
pub struct RecordHandle {
    core: Arc<Mutex<SessionCore>>,
    clock: Arc<dyn Clock>,
    telemetry: TelemetryHandle,
}

impl RecordHandle {
    pub fn new(clock: Arc<dyn Clock>, telemetry: TelemetryHandle) -> Self {
        Self {
            core: Arc::new(Mutex::new(SessionCore::default())),
            clock,
            telemetry,
        }
    }

    /// Appends one data point to the running session. Returns `false` and
    /// drops the sample when no session is running.
    pub fn record(&self, kind: DataPointKind, value: impl Into<SampleValue>) -> bool {
        let value = value.into();
        let mut core = self.lock();

        if core.session.is_none() {
            drop(core);
            debug!(kind = %kind, %value, "sample arrived with no active session, dropped");
            self.telemetry.record(AgentEvent::SampleDropped { kind });
            return false;
        }

        let timestamp = self.clock.now();
        core.queue.push(DataPoint::new(timestamp, kind, value));
        debug!(kind = %kind, %value, timestamp = timestamp.0, "DATAPOINT");
        true
    }

    pub fn state(&self) -> SessionState {
        SessionGraph::state(self.lock().session.as_ref())
    }

    pub fn queue_len(&self) -> usize {
        self.lock().queue.len()
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub(crate) fn with_core<R>(&self, f: impl FnOnce(&mut SessionCore) -> R) -> R {
        let mut core = self.lock();
        f(&mut core)
    }

    fn lock(&self) -> MutexGuard<'_, SessionCore> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
