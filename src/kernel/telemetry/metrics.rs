use std::collections::VecDeque;

use super::event::AgentEvent;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetrySnapshot {
    pub session_stats: SessionStats,
    pub sample_stats: SampleStats,
    pub listener_stats: ListenerStats,
    pub upload_stats: UploadStats,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionStats {
    pub started: u64,
    pub stopped: u64,
    pub duplicate_starts: u64,
    pub rejected_stops: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleStats {
    pub dropped: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListenerStats {
    pub faults: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadStats {
    pub dispatched: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub points_dispatched: u64,
    pub avg_points_per_upload: f64,
}

pub fn compute_snapshot(events: &VecDeque<AgentEvent>) -> TelemetrySnapshot {
    let mut snap = TelemetrySnapshot::default();

    for event in events {
        match event {
            AgentEvent::SessionStarted { .. } => snap.session_stats.started += 1,
            AgentEvent::SessionStopped { .. } => snap.session_stats.stopped += 1,
            AgentEvent::DuplicateStart { .. } => snap.session_stats.duplicate_starts += 1,
            AgentEvent::StopRejected { .. } => snap.session_stats.rejected_stops += 1,
            AgentEvent::SampleDropped { .. } => snap.sample_stats.dropped += 1,
            AgentEvent::ListenerFault { .. } => snap.listener_stats.faults += 1,
            AgentEvent::UploadDispatched { points, .. } => {
                snap.upload_stats.dispatched += 1;
                snap.upload_stats.points_dispatched += *points as u64;
            }
            AgentEvent::UploadSucceeded { .. } => snap.upload_stats.succeeded += 1,
            AgentEvent::UploadFailed { .. } => snap.upload_stats.failed += 1,
        }
    }

    if snap.upload_stats.dispatched > 0 {
        snap.upload_stats.avg_points_per_upload =
            snap.upload_stats.points_dispatched as f64 / snap.upload_stats.dispatched as f64;
    }

    snap
}
