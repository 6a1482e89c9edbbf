mod common;

use std::sync::Arc;

use common::{harness, harness_with, FailingUploader};
use fieldprobe::device::BatteryReading;
use fieldprobe::error::{SessionError, SubscriptionError};
use fieldprobe::kernel::telemetry::Boundary;
use fieldprobe::sampler::{DeactivateFuture, Subscription};
use fieldprobe::services::upload::{SessionRecord, UploadClient};
use fieldprobe::{AgentConfig, DataPointKind, SampleValue, SessionState, Transition};

const PERIODIC_KINDS: [DataPointKind; 5] = [
    DataPointKind::BatteryLevel,
    DataPointKind::BatteryScale,
    DataPointKind::BatteryPercent,
    DataPointKind::BatteryVoltage,
    DataPointKind::WifiState,
];

fn kinds(record: &SessionRecord) -> Vec<DataPointKind> {
    record.data.iter().map(|p| p.kind()).collect()
}

#[tokio::test]
async fn test_start_then_stop_uploads_twice() {
    let mut h = harness();

    let started = h.controller.start_session(41, 2).await.unwrap();
    assert_eq!(started, Transition::Started { test_id: 41 });
    assert_eq!(h.controller.state(), SessionState::Active);
    assert_eq!(h.controller.listeners_active(), 4);
    // initial flush leaves a fresh queue behind
    assert_eq!(h.controller.queue_len(), 0);

    let stopped = h.controller.stop_session(41).await.unwrap();
    assert_eq!(stopped, Transition::Stopped { test_id: 41, points: 5 });
    assert_eq!(h.controller.state(), SessionState::Idle);
    assert_eq!(h.controller.listeners_active(), 0);

    let outcomes = h.controller.drain_uploads().await;
    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].boundary, Boundary::Start);
    assert_eq!(outcomes[1].boundary, Boundary::Stop);
    assert!(outcomes.iter().all(|o| o.is_delivered()));

    let records = h.uploads.records();
    assert_eq!(records.len(), 2);
    assert_eq!(kinds(&records[0]), PERIODIC_KINDS.to_vec());
    assert_eq!(kinds(&records[1]), PERIODIC_KINDS.to_vec());
    assert!(records.iter().all(|r| r.test_id == 41 && r.uuid == "simulated-device"));
}

#[tokio::test]
async fn test_second_upload_holds_only_post_flush_samples() {
    let mut h = harness();
    h.controller.start_session(7, 0).await.unwrap();

    h.clock.advance(30);
    assert!(h.controller.record_data_point(DataPointKind::ScreenState, 0));
    h.clock.advance(30);
    h.controller.stop_session(7).await.unwrap();
    h.controller.drain_uploads().await;

    let records = h.uploads.records();
    let second = &records[1];
    let mut expected = vec![DataPointKind::ScreenState];
    expected.extend(PERIODIC_KINDS);
    assert_eq!(kinds(second), expected);

    assert_eq!(second.data[0].timestamp().0, 1_030);
    assert!(second.data[1..].iter().all(|p| p.timestamp().0 == 1_060));
    assert!(records[0].data.iter().all(|p| p.timestamp().0 == 1_000));
}

#[tokio::test]
async fn test_mismatched_stop_is_rejected_without_side_effects() {
    let mut h = harness();
    h.controller.start_session(5, 1).await.unwrap();
    h.controller.record_data_point(DataPointKind::GpsState, 1);
    h.controller.drain_uploads().await;
    let uploads_before = h.uploads.records().len();

    let err = h.controller.stop_session(6).await.unwrap_err();
    assert!(matches!(err, SessionError::TestIdMismatch { active: 5, requested: 6 }));

    assert_eq!(h.controller.state(), SessionState::Active);
    assert_eq!(h.controller.active_test_id(), Some(5));
    assert_eq!(h.controller.queue_len(), 1);
    assert_eq!(h.controller.listeners_active(), 4);
    assert!(h.controller.drain_uploads().await.is_empty());
    assert_eq!(h.uploads.records().len(), uploads_before);
    assert_eq!(h.controller.telemetry().session_stats.rejected_stops, 1);
}

#[tokio::test]
async fn test_stop_while_idle_is_rejected() {
    let mut h = harness();
    let err = h.controller.stop_session(1).await.unwrap_err();
    assert!(matches!(err, SessionError::NotActive { requested: 1 }));
    assert!(h.controller.drain_uploads().await.is_empty());
    assert!(h.uploads.records().is_empty());
}

#[tokio::test]
async fn test_record_while_idle_is_a_no_op() {
    let h = harness();
    assert!(!h.controller.record_data_point(DataPointKind::ScreenState, 1));
    assert_eq!(h.controller.queue_len(), 0);
    assert_eq!(h.controller.telemetry().sample_stats.dropped, 1);
}

#[tokio::test]
async fn test_duplicate_start_is_ignored() {
    let mut h = harness();
    h.controller.start_session(3, 1).await.unwrap();

    let again = h.controller.start_session(4, 2).await.unwrap();
    assert_eq!(again, Transition::Ignored { active: 3 });
    assert_eq!(h.controller.active_test_id(), Some(3));
    assert_eq!(h.controller.listeners_active(), 4);

    h.controller.drain_uploads().await;
    assert_eq!(h.uploads.records().len(), 1, "duplicate start must not flush");
    assert_eq!(*h.profiles.applied.lock().unwrap(), vec![1]);
    assert_eq!(h.controller.telemetry().session_stats.duplicate_starts, 1);
}

#[tokio::test]
async fn test_append_order_is_call_order() {
    let mut h = harness();
    h.controller.start_session(9, 0).await.unwrap();

    let sequence: Vec<(DataPointKind, i64)> = (0..100)
        .map(|i| {
            let kind = if i % 3 == 0 {
                DataPointKind::ScreenState
            } else if i % 3 == 1 {
                DataPointKind::GpsState
            } else {
                DataPointKind::CellSignalGsm
            };
            (kind, i)
        })
        .collect();
    for (kind, value) in &sequence {
        h.controller.record_data_point(*kind, *value);
    }

    h.controller.stop_session(9).await.unwrap();
    h.controller.drain_uploads().await;

    let records = h.uploads.records();
    let second = &records[1];
    let recorded: Vec<(DataPointKind, i64)> = second.data[..100]
        .iter()
        .map(|p| match p.value() {
            SampleValue::Integer(v) => (p.kind(), v),
            SampleValue::Float(_) => panic!("integral sample became fractional"),
        })
        .collect();
    assert_eq!(recorded, sequence);
}

#[tokio::test]
async fn test_concurrent_records_are_not_lost() {
    let mut h = harness();
    h.controller.start_session(11, 0).await.unwrap();

    let threads: Vec<_> = (0..8i64)
        .map(|t| {
            let recorder = h.controller.recorder();
            std::thread::spawn(move || {
                for i in 0..100i64 {
                    recorder.record(DataPointKind::CellSignalGsm, t * 1_000 + i);
                }
            })
        })
        .collect();
    for thread in threads {
        thread.join().unwrap();
    }
    assert_eq!(h.controller.queue_len(), 800);

    h.controller.stop_session(11).await.unwrap();
    h.controller.drain_uploads().await;
    let records = h.uploads.records();
    let second = &records[1];
    assert_eq!(second.data.len(), 805);

    // each thread's own samples stay in the order it recorded them
    for t in 0..8i64 {
        let mine: Vec<i64> = second
            .data
            .iter()
            .filter_map(|p| match p.value() {
                SampleValue::Integer(v) if p.kind() == DataPointKind::CellSignalGsm && v / 1_000 == t => Some(v),
                _ => None,
            })
            .collect();
        let expected: Vec<i64> = (0..100).map(|i| t * 1_000 + i).collect();
        assert_eq!(mine, expected);
    }
}

#[tokio::test]
async fn test_double_stop_leaves_idle() {
    let mut h = harness();
    h.controller.start_session(2, 0).await.unwrap();
    h.controller.stop_session(2).await.unwrap();

    assert!(matches!(
        h.controller.stop_session(2).await,
        Err(SessionError::NotActive { requested: 2 })
    ));
    assert_eq!(h.controller.state(), SessionState::Idle);
    assert_eq!(h.controller.telemetry().listener_stats.faults, 0);
}

#[tokio::test]
async fn test_battery_percent_stays_fractional() {
    let mut h = harness();
    h.device.set_battery(Some(BatteryReading {
        level: 50,
        scale: 100,
        voltage_mv: 4012,
    }));

    h.controller.start_session(1, 0).await.unwrap();
    h.controller.drain_uploads().await;

    let records = h.uploads.records();
    let first = &records[0];
    let percent = first
        .data
        .iter()
        .find(|p| p.kind() == DataPointKind::BatteryPercent)
        .unwrap();
    assert_eq!(percent.value(), SampleValue::Float(0.5));

    let json = serde_json::to_value(first).unwrap();
    assert_eq!(json["data"][2]["value"], serde_json::json!(0.5));
    assert_eq!(json["data"][3]["value"], serde_json::json!(4012));
}

#[tokio::test]
async fn test_failed_upload_does_not_block_stop() {
    let mut h = harness_with(AgentConfig::default(), Some(Arc::new(FailingUploader) as Arc<dyn UploadClient>));

    h.controller.start_session(8, 0).await.unwrap();
    assert_eq!(h.controller.state(), SessionState::Active);
    h.controller.stop_session(8).await.unwrap();
    assert_eq!(h.controller.state(), SessionState::Idle);

    let outcomes = h.controller.drain_uploads().await;
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|o| !o.is_delivered()));

    let snap = h.controller.telemetry();
    assert_eq!(snap.upload_stats.dispatched, 2);
    assert_eq!(snap.upload_stats.failed, 2);
    assert_eq!(snap.session_stats.stopped, 1);

    // the next session starts cleanly
    assert!(h.controller.start_session(9, 0).await.is_ok());
}

struct BrokenListener {
    fail_activate: bool,
    active: bool,
}

impl Subscription for BrokenListener {
    fn name(&self) -> &'static str {
        "broken"
    }

    fn activate(&mut self) -> Result<(), SubscriptionError> {
        if self.fail_activate {
            return Err(SubscriptionError::NoRuntime("broken"));
        }
        self.active = true;
        Ok(())
    }

    fn deactivate(&mut self) -> DeactivateFuture<'_> {
        self.active = false;
        Box::pin(async { Err(SubscriptionError::ListenerExited("broken")) })
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

#[tokio::test]
async fn test_activation_failure_rolls_back_to_idle() {
    let mut h = harness();
    assert!(h.controller.add_subscription(Box::new(BrokenListener {
        fail_activate: true,
        active: false,
    })));

    let err = h.controller.start_session(12, 0).await.unwrap_err();
    assert!(matches!(err, SessionError::Activation { listener: "broken", .. }));
    assert_eq!(h.controller.state(), SessionState::Idle);
    assert_eq!(h.controller.listeners_active(), 0);
    assert_eq!(h.controller.queue_len(), 0);
    assert!(h.controller.drain_uploads().await.is_empty());
    assert!(h.profiles.applied.lock().unwrap().is_empty());
    // the listeners that came up before the failure are released again
    assert_eq!(h.sources.screen.receiver_count(), 0);
    assert_eq!(h.sources.ticks.receiver_count(), 0);
}

#[tokio::test]
async fn test_teardown_failure_does_not_stop_the_rest() {
    let mut h = harness();
    h.controller.add_subscription(Box::new(BrokenListener {
        fail_activate: false,
        active: false,
    }));

    h.controller.start_session(13, 0).await.unwrap();
    assert_eq!(h.controller.listeners_active(), 5);

    assert!(h.controller.stop_session(13).await.is_ok());
    assert_eq!(h.controller.listeners_active(), 0);
    assert_eq!(h.controller.state(), SessionState::Idle);
    assert_eq!(h.controller.telemetry().listener_stats.faults, 1);

    h.controller.drain_uploads().await;
    assert_eq!(h.uploads.records().len(), 2);
}

#[tokio::test]
async fn test_cannot_grow_sampler_set_mid_session() {
    let mut h = harness();
    h.controller.start_session(14, 0).await.unwrap();
    assert!(!h.controller.add_subscription(Box::new(BrokenListener {
        fail_activate: false,
        active: false,
    })));
}

#[tokio::test]
async fn test_missing_device_info_uploads_with_sentinels() {
    let mut h = harness();
    h.device.set_snapshot(None);

    h.controller.start_session(15, 0).await.unwrap();
    h.controller.stop_session(15).await.unwrap();
    h.controller.drain_uploads().await;

    let records = h.uploads.records();
    assert_eq!(records.len(), 2);
    for record in records {
        assert_eq!(record.uuid, "unknown");
        assert_eq!(record.carrier, "unknown");
        assert_eq!(record.device_info.hardware_model, "unknown");
        assert!(!record.data.is_empty());
    }
}

#[tokio::test]
async fn test_config_device_id_and_platform_are_used() {
    let config = AgentConfig {
        device_id: Some("bench-rig-3".to_string()),
        platform: "android".to_string(),
        ..AgentConfig::default()
    };
    let mut h = harness_with(config, None);

    h.controller.start_session(16, 4).await.unwrap();
    h.controller.drain_uploads().await;

    let records = h.uploads.records();
    let first = &records[0];
    assert_eq!(first.uuid, "bench-rig-3");
    assert_eq!(first.platform, "android");
    assert_eq!(first.carrier, "Simulated Carrier");
    assert_eq!(first.device_info.api_level, Some(1));
    assert_eq!(*h.profiles.applied.lock().unwrap(), vec![4]);
}

#[tokio::test]
async fn test_finished_uploads_are_not_kept_across_sessions() {
    let mut h = harness();

    for test_id in 0..50 {
        h.controller.start_session(test_id, 0).await.unwrap();
        h.controller.stop_session(test_id).await.unwrap();
        // let the upload tasks run to completion
        assert!(common::wait_until(|| h.controller.pending_uploads() == 0).await);
    }

    assert_eq!(h.uploads.records().len(), 100);
    assert_eq!(h.controller.telemetry().upload_stats.succeeded, 100);
    // only the last session's uploads are still tracked
    assert!(h.controller.drain_uploads().await.len() <= 2);
}
