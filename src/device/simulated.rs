use std::sync::{Mutex, PoisonError};

use super::{BatteryReading, DeviceInfo, DeviceInfoProvider, DeviceProbe, DeviceSnapshot};
use crate::error::ProbeError;

#[derive(Debug, Clone)]
struct SimState {
    battery: Option<BatteryReading>,
    wifi: Option<bool>,
    snapshot: Option<DeviceSnapshot>,
}

/// Scriptable in-memory device. `None` in any slot makes that read fail.
#[derive(Debug)]
pub struct SimulatedDevice {
    state: Mutex<SimState>,
}

impl Default for SimulatedDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedDevice {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SimState {
                battery: Some(BatteryReading {
                    level: 80,
                    scale: 100,
                    voltage_mv: 3900,
                }),
                wifi: Some(true),
                snapshot: Some(DeviceSnapshot {
                    device_id: "simulated-device".to_string(),
                    carrier: "Simulated Carrier".to_string(),
                    info: DeviceInfo {
                        hardware_model: "Simulator 1".to_string(),
                        build: "sim-build-1".to_string(),
                        version: "1.0".to_string(),
                        api_level: Some(1),
                    },
                }),
            }),
        }
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut SimState) -> R) -> R {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    pub fn set_battery(&self, battery: Option<BatteryReading>) {
        self.with_state(|s| s.battery = battery);
    }

    pub fn set_wifi(&self, wifi: Option<bool>) {
        self.with_state(|s| s.wifi = wifi);
    }

    pub fn set_snapshot(&self, snapshot: Option<DeviceSnapshot>) {
        self.with_state(|s| s.snapshot = snapshot);
    }
}

impl DeviceProbe for SimulatedDevice {
    fn battery(&self) -> Result<BatteryReading, ProbeError> {
        self.with_state(|s| s.battery).ok_or(ProbeError::Unavailable("battery"))
    }

    fn wifi_enabled(&self) -> Result<bool, ProbeError> {
        self.with_state(|s| s.wifi).ok_or(ProbeError::Unavailable("wifi"))
    }
}

impl DeviceInfoProvider for SimulatedDevice {
    fn snapshot(&self) -> Result<DeviceSnapshot, ProbeError> {
        self.with_state(|s| s.snapshot.clone())
            .ok_or(ProbeError::Unavailable("device info"))
    }
}
