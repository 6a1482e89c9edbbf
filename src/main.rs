use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use fieldprobe::command::Command;
use fieldprobe::device::{
    DeviceInfoProvider, DeviceProbe, EventSources, HostDevice, SimulatedDevice, TimeTick,
};
use fieldprobe::kernel::time::SystemClock;
use fieldprobe::services::profile::LoggingProfileSink;
use fieldprobe::services::upload::HttpUploadClient;
use fieldprobe::{AgentConfig, Collaborators, SessionController};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")?;

    // 2. Config
    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("FIELDPROBE_CONFIG").ok())
        .map(PathBuf::from);
    let config = AgentConfig::load(config_path.as_deref()).context("loading configuration")?;
    tracing::info!(endpoint = %config.endpoint, tick_secs = config.tick_interval_secs, "fieldprobe agent booting");

    // 3. Device backend
    let simulate = std::env::var("FIELDPROBE_SIMULATE").is_ok_and(|v| v == "1");
    let (probe, device_info): (Arc<dyn DeviceProbe>, Arc<dyn DeviceInfoProvider>) = if simulate {
        tracing::info!("using simulated device");
        let device = Arc::new(SimulatedDevice::new());
        (device.clone(), device)
    } else {
        let device = Arc::new(HostDevice::new());
        (device.clone(), device)
    };

    // 4. Controller
    let sources = EventSources::default();
    let mut controller = SessionController::new(
        &config,
        Collaborators {
            probe,
            device_info,
            sources: sources.clone(),
            uploader: Arc::new(HttpUploadClient::new(config.endpoint.clone(), config.upload_timeout())),
            profiles: Arc::new(LoggingProfileSink),
            clock: Arc::new(SystemClock::new(config.timestamp_unit)),
        },
    );

    // 5. Coarse tick driver. Ticks only matter while the periodic sampler is subscribed.
    let tick_sources = sources.clone();
    let period = config.tick_interval();
    tokio::spawn(async move {
        let mut cadence = interval_at(Instant::now() + period, period);
        cadence.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut sequence = 0u64;
        loop {
            cadence.tick().await;
            sequence += 1;
            tick_sources.tick(TimeTick { sequence });
        }
    });

    // 6. Console reader
    let (tx, mut commands) = mpsc::channel::<Command>(32);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        println!("Commands: start <test> <profile> | stop <test> | status | screen on|off | signal gsm <asu> | signal cdma <dbm> <evdo> | gps <code> | quit");

        while let Ok(Some(line)) = lines.next_line().await {
            if line.trim().is_empty() {
                continue;
            }
            match Command::parse(&line) {
                Some(command) => {
                    if tx.send(command).await.is_err() {
                        break;
                    }
                }
                None => tracing::warn!("unrecognised command: '{}'", line.trim()),
            }
        }
    });

    // 7. Command loop
    loop {
        let command = tokio::select! {
            cmd = commands.recv() => cmd,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(command) = command else { break };

        match command {
            Command::Start { test_id, profile_id } => {
                if let Err(e) = controller.start_session(test_id, profile_id).await {
                    tracing::warn!("start failed: {}", e);
                }
            }
            Command::Stop { test_id } => {
                if let Err(e) = controller.stop_session(test_id).await {
                    tracing::warn!("stop rejected: {}", e);
                }
            }
            Command::Status => {
                let snap = controller.telemetry();
                println!(
                    "state={:?} test={:?} queued={} listeners={} uploads: {} sent, {} ok, {} failed",
                    controller.state(),
                    controller.active_test_id(),
                    controller.queue_len(),
                    controller.listeners_active(),
                    snap.upload_stats.dispatched,
                    snap.upload_stats.succeeded,
                    snap.upload_stats.failed,
                );
            }
            Command::Screen(event) => {
                sources.screen(event);
            }
            Command::Signal(strength) => {
                sources.signal(strength);
            }
            Command::Gps(event) => {
                sources.gps(event);
            }
            Command::Quit => break,
        }
    }

    // 8. Shutdown: close the running session and wait for the uploads
    if let Some(test_id) = controller.active_test_id() {
        tracing::info!(test_id, "shutting down with an active session, stopping it");
        if let Err(e) = controller.stop_session(test_id).await {
            tracing::warn!("final stop failed: {}", e);
        }
    }
    for outcome in controller.drain_uploads().await {
        if let Err(e) = &outcome.result {
            tracing::warn!(upload_id = %outcome.upload_id, test_id = outcome.test_id, "upload lost: {}", e);
        }
    }

    tracing::info!("fieldprobe agent stopped");
    Ok(())
}
