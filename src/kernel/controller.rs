use std::sync::Arc;

use tracing::{error, info, warn};

use super::datapoint::{DataPointKind, SampleValue};
use super::handle::RecordHandle;
use super::queue::DataQueue;
use super::session::{Session, SessionGraph, SessionState, StartDecision};
use super::telemetry::{AgentEvent, Boundary, TelemetryHandle, TelemetrySnapshot};
use super::time::Clock;
use crate::config::AgentConfig;
use crate::device::{DeviceInfoProvider, DeviceProbe, DeviceSnapshot, EventSources};
use crate::error::SessionError;
use crate::sampler::{
    GpsStatusListener, PeriodicReader, PeriodicSampler, RadioSignalListener, ScreenStateListener,
    Subscription,
};
use crate::services::profile::ProfileSink;
use crate::services::upload::{PendingUpload, SessionRecord, UploadClient, UploadDispatcher, UploadOutcome};

/// Everything the controller talks to but does not own the behaviour of.
pub struct Collaborators {
    pub probe: Arc<dyn DeviceProbe>,
    pub device_info: Arc<dyn DeviceInfoProvider>,
    pub sources: EventSources,
    pub uploader: Arc<dyn UploadClient>,
    pub profiles: Arc<dyn ProfileSink>,
    pub clock: Arc<dyn Clock>,
}

/// Result of an accepted command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Started { test_id: i64 },
    Stopped { test_id: i64, points: usize },
    /// Duplicate start while a session was running.
    Ignored { active: i64 },
}

/// The session state machine: owns the session and its queue, switches the
/// sampler set on and off as a unit, and flushes the queue at both boundaries.
///
/// Start: record -> initial sample -> activate listeners -> apply profile -> flush -> Active.
/// Stop:  final sample -> deactivate listeners -> flush -> Idle.
pub struct SessionController {
    recorder: RecordHandle,
    periodic: PeriodicReader,
    subscriptions: Vec<Box<dyn Subscription>>,
    device_info: Arc<dyn DeviceInfoProvider>,
    profiles: Arc<dyn ProfileSink>,
    dispatcher: UploadDispatcher,
    telemetry: TelemetryHandle,
    platform: String,
    device_id_override: Option<String>,
    /// Device facts captured at start, reused for the stop upload.
    device: Option<DeviceSnapshot>,
    pending_uploads: Vec<PendingUpload>,
}

impl SessionController {
    pub fn new(config: &AgentConfig, deps: Collaborators) -> Self {
        let telemetry = TelemetryHandle::new();
        let recorder = RecordHandle::new(deps.clock, telemetry.clone());
        let periodic = PeriodicReader::new(deps.probe, recorder.clone());

        let subscriptions: Vec<Box<dyn Subscription>> = vec![
            Box::new(PeriodicSampler::new(periodic.clone(), deps.sources.ticks.clone())),
            Box::new(ScreenStateListener::new(recorder.clone(), deps.sources.screen.clone())),
            Box::new(RadioSignalListener::new(recorder.clone(), deps.sources.signal.clone())),
            Box::new(GpsStatusListener::new(recorder.clone(), deps.sources.gps.clone())),
        ];

        Self {
            recorder,
            periodic,
            subscriptions,
            device_info: deps.device_info,
            profiles: deps.profiles,
            dispatcher: UploadDispatcher::new(deps.uploader, telemetry.clone()),
            telemetry,
            platform: config.platform.clone(),
            device_id_override: config.device_id.clone(),
            device: None,
            pending_uploads: Vec::new(),
        }
    }

    /// Adds another event source to the sampler set. Only allowed while idle,
    /// so the set is never partially active outside a transition.
    pub fn add_subscription(&mut self, subscription: Box<dyn Subscription>) -> bool {
        if self.state() == SessionState::Active {
            warn!(listener = subscription.name(), "cannot add a listener while a session is active");
            return false;
        }
        self.subscriptions.push(subscription);
        true
    }

    pub fn state(&self) -> SessionState {
        self.recorder.state()
    }

    pub fn active_test_id(&self) -> Option<i64> {
        self.recorder
            .with_core(|core| core.session.as_ref().map(|s| s.test_id))
    }

    /// Handle for samplers and other callback contexts.
    pub fn recorder(&self) -> RecordHandle {
        self.recorder.clone()
    }

    /// Same entry point the samplers use; no-op while idle.
    pub fn record_data_point(&self, kind: DataPointKind, value: impl Into<SampleValue>) -> bool {
        self.recorder.record(kind, value)
    }

    pub fn queue_len(&self) -> usize {
        self.recorder.queue_len()
    }

    pub fn listeners_active(&self) -> usize {
        self.subscriptions.iter().filter(|s| s.is_active()).count()
    }

    pub fn telemetry(&self) -> TelemetrySnapshot {
        self.telemetry.snapshot()
    }

    pub fn telemetry_handle(&self) -> TelemetryHandle {
        self.telemetry.clone()
    }

    pub async fn start_session(&mut self, test_id: i64, profile_id: u32) -> Result<Transition, SessionError> {
        let decision = self.recorder.with_core(|core| SessionGraph::start(core.session.as_ref()));
        if let StartDecision::IgnoreDuplicate { active } = decision {
            warn!(test_id, active, "start requested while a session is running, ignoring");
            self.telemetry.record(AgentEvent::DuplicateStart {
                active,
                requested: test_id,
            });
            return Ok(Transition::Ignored { active });
        }

        // (a) fresh session record and empty queue
        let device = self.capture_device();
        let session = Session {
            test_id,
            device_id: device.device_id.clone(),
            profile_id,
            started_at: self.recorder.clock().now(),
        };
        info!(test_id, profile_id, device_id = %session.device_id, "starting session");
        self.recorder.with_core(|core| {
            core.session = Some(session);
            core.queue = DataQueue::new();
        });
        self.device = Some(device);

        // (b) bounding sample
        let initial = self.periodic.sample();

        // (c) all listeners or none
        if let Err(e) = self.activate_all().await {
            error!(test_id, "session start rolled back: {}", e);
            self.recorder.with_core(|core| {
                core.session = None;
                core.queue = DataQueue::new();
            });
            self.device = None;
            return Err(e);
        }
        // a rolled-back start never reaches the tracker
        self.profiles.apply(profile_id);

        // (d)+(e) flush what we have and keep accumulating into a fresh queue
        self.flush(Boundary::Start, false);

        info!(test_id, initial, listeners = self.listeners_active(), "session active");
        self.telemetry.record(AgentEvent::SessionStarted { test_id, profile_id });
        Ok(Transition::Started { test_id })
    }

    pub async fn stop_session(&mut self, test_id: i64) -> Result<Transition, SessionError> {
        let check = self
            .recorder
            .with_core(|core| SessionGraph::stop(core.session.as_ref(), test_id));
        if let Err(e) = check {
            warn!(test_id, "stop rejected: {}", e);
            self.telemetry.record(AgentEvent::StopRejected {
                requested: test_id,
                active: self.active_test_id(),
            });
            return Err(e);
        }

        info!(test_id, "stopping session");

        // (a) bounding sample
        self.periodic.sample();

        // (b) every listener goes down, whatever the others do
        self.deactivate_all().await;

        // (c)+(d) flush and return to idle in one step
        let points = self.flush(Boundary::Stop, true);
        self.device = None;

        info!(test_id, points, "session stopped");
        self.telemetry.record(AgentEvent::SessionStopped { test_id });
        Ok(Transition::Stopped { test_id, points })
    }

    /// Awaits every upload still tracked. Uploads that finished before the
    /// last flush are no longer tracked; their outcome is in telemetry.
    pub async fn drain_uploads(&mut self) -> Vec<UploadOutcome> {
        let mut outcomes = Vec::with_capacity(self.pending_uploads.len());
        for pending in self.pending_uploads.drain(..) {
            outcomes.push(pending.wait().await);
        }
        outcomes
    }

    pub fn pending_uploads(&self) -> usize {
        self.pending_uploads.iter().filter(|p| !p.is_finished()).count()
    }

    /// Snapshot-and-swap of the queue, then hand-off to the uploader.
    /// With `end_session` the session record is taken in the same critical
    /// section, so no sample can land between the flush and going idle.
    fn flush(&mut self, boundary: Boundary, end_session: bool) -> usize {
        let (session, batch) = self.recorder.with_core(|core| {
            let session = if end_session {
                core.session.take()
            } else {
                core.session.clone()
            };
            (session, core.queue.take())
        });

        let Some(session) = session else {
            warn!(?boundary, "flush without a session, nothing uploaded");
            return 0;
        };
        let device = self.device.clone().unwrap_or_else(DeviceSnapshot::unknown);

        let record = SessionRecord::new(&session, &device, &self.platform, batch);
        let points = record.len();
        // finished uploads already logged and counted their outcome
        self.pending_uploads.retain(|p| !p.is_finished());
        if let Some(pending) = self.dispatcher.dispatch(record, boundary) {
            self.pending_uploads.push(pending);
        }
        points
    }

    fn capture_device(&self) -> DeviceSnapshot {
        let mut device = match self.device_info.snapshot() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("device info unavailable, uploading with sentinel values: {}", e);
                DeviceSnapshot::unknown()
            }
        };
        if let Some(id) = &self.device_id_override {
            device.device_id = id.clone();
        }
        device
    }

    async fn activate_all(&mut self) -> Result<(), SessionError> {
        for index in 0..self.subscriptions.len() {
            let subscription = &mut self.subscriptions[index];
            if let Err(source) = subscription.activate() {
                let listener = subscription.name();
                // undo the ones that did come up
                for activated in &mut self.subscriptions[..index] {
                    if let Err(e) = activated.deactivate().await {
                        warn!(listener = activated.name(), "rollback teardown failed: {}", e);
                    }
                }
                return Err(SessionError::Activation { listener, source });
            }
        }
        Ok(())
    }

    async fn deactivate_all(&mut self) {
        for subscription in &mut self.subscriptions {
            if let Err(e) = subscription.deactivate().await {
                warn!(listener = subscription.name(), "listener teardown failed, continuing: {}", e);
                self.telemetry.record(AgentEvent::ListenerFault {
                    listener: subscription.name().to_string(),
                });
            }
        }
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        if let Some(test_id) = self.active_test_id() {
            warn!(test_id, "controller dropped with a session still active, its data is discarded");
        }
        // listener tasks cancel themselves as the subscriptions drop
    }
}
