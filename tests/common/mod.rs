#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use fieldprobe::device::{EventSources, SimulatedDevice};
use fieldprobe::error::UploadError;
use fieldprobe::kernel::time::ManualClock;
use fieldprobe::services::profile::ProfileSink;
use fieldprobe::services::upload::{SessionRecord, UploadClient, UploadFuture};
use fieldprobe::{AgentConfig, Collaborators, SessionController};

/// Keeps every record it is handed, in delivery order.
#[derive(Clone, Default)]
pub struct CapturingUploader {
    pub records: Arc<Mutex<Vec<SessionRecord>>>,
}

impl CapturingUploader {
    pub fn records(&self) -> Vec<SessionRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl UploadClient for CapturingUploader {
    fn upload<'a>(&'a self, record: &'a SessionRecord) -> UploadFuture<'a> {
        let records = self.records.clone();
        let record = record.clone();
        Box::pin(async move {
            records.lock().unwrap().push(record);
            Ok(())
        })
    }
}

/// Collector that always answers 503.
#[derive(Clone, Default)]
pub struct FailingUploader;

impl UploadClient for FailingUploader {
    fn upload<'a>(&'a self, _record: &'a SessionRecord) -> UploadFuture<'a> {
        Box::pin(async { Err(UploadError::Status(503)) })
    }
}

#[derive(Clone, Default)]
pub struct CapturingProfiles {
    pub applied: Arc<Mutex<Vec<u32>>>,
}

impl ProfileSink for CapturingProfiles {
    fn apply(&self, profile_id: u32) {
        self.applied.lock().unwrap().push(profile_id);
    }
}

pub struct Harness {
    pub controller: SessionController,
    pub device: Arc<SimulatedDevice>,
    pub sources: EventSources,
    pub uploads: CapturingUploader,
    pub profiles: CapturingProfiles,
    pub clock: Arc<ManualClock>,
}

pub fn harness() -> Harness {
    harness_with(AgentConfig::default(), None)
}

pub fn harness_with(config: AgentConfig, uploader: Option<Arc<dyn UploadClient>>) -> Harness {
    let device = Arc::new(SimulatedDevice::new());
    let sources = EventSources::default();
    let uploads = CapturingUploader::default();
    let profiles = CapturingProfiles::default();
    let clock = Arc::new(ManualClock::new(1_000));

    let uploader: Arc<dyn UploadClient> = match uploader {
        Some(uploader) => uploader,
        None => Arc::new(uploads.clone()),
    };
    let controller = SessionController::new(
        &config,
        Collaborators {
            probe: device.clone(),
            device_info: device.clone(),
            sources: sources.clone(),
            uploader,
            profiles: Arc::new(profiles.clone()),
            clock: clock.clone(),
        },
    );

    Harness {
        controller,
        device,
        sources,
        uploads,
        profiles,
        clock,
    }
}

/// Polls `condition` until it holds or a second has passed.
pub async fn wait_until<F: Fn() -> bool>(condition: F) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
