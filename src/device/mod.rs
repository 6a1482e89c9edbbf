//! Device ports: the boundary between the sampling core and whatever is
//! actually reading the battery, the radios and the OS.
//!
//! ```text
//!   HostDevice / SimulatedDevice ──▶ DeviceProbe / DeviceInfoProvider ──▶ samplers, controller
//! ```

pub mod events;
pub mod host;
pub mod simulated;

use serde::{Deserialize, Serialize};

use crate::error::ProbeError;

pub use events::{EventSources, GpsStatusEvent, ScreenEvent, SignalStrength, TimeTick};
pub use host::HostDevice;
pub use simulated::SimulatedDevice;

/// Raw battery figures as the platform reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatteryReading {
    pub level: i32,
    pub scale: i32,
    pub voltage_mv: i32,
}

impl BatteryReading {
    /// `level / scale` as a fraction in [0, 1]. Never truncated to an integer.
    /// `None` when the platform reported an unknown level or scale.
    pub fn fraction(&self) -> Option<f64> {
        battery_fraction(self.level, self.scale)
    }
}

pub fn battery_fraction(level: i32, scale: i32) -> Option<f64> {
    if level < 0 || scale <= 0 {
        return None;
    }
    Some(f64::from(level) / f64::from(scale))
}

/// Read-side port for the periodic sampler.
pub trait DeviceProbe: Send + Sync {
    fn battery(&self) -> Result<BatteryReading, ProbeError>;
    fn wifi_enabled(&self) -> Result<bool, ProbeError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub hardware_model: String,
    pub build: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_level: Option<u32>,
}

/// Read-only facts about the device, captured once per session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    pub device_id: String,
    pub carrier: String,
    pub info: DeviceInfo,
}

pub const UNKNOWN: &str = "unknown";

impl DeviceSnapshot {
    /// Sentinel used when the provider fails; the session still runs and uploads.
    pub fn unknown() -> Self {
        Self {
            device_id: UNKNOWN.to_string(),
            carrier: UNKNOWN.to_string(),
            info: DeviceInfo {
                hardware_model: UNKNOWN.to_string(),
                build: UNKNOWN.to_string(),
                version: UNKNOWN.to_string(),
                api_level: None,
            },
        }
    }
}

pub trait DeviceInfoProvider: Send + Sync {
    fn snapshot(&self) -> Result<DeviceSnapshot, ProbeError>;
}
