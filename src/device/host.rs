//! Best-effort Linux backend. Reads sysfs and `/etc`; anything missing
//! surfaces as a [`ProbeError`] and the caller decides what to skip.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{BatteryReading, DeviceInfo, DeviceInfoProvider, DeviceProbe, DeviceSnapshot, UNKNOWN};
use crate::error::ProbeError;

/// Host device rooted at `/`, or at another directory for fixtures.
#[derive(Debug, Clone)]
pub struct HostDevice {
    root: PathBuf,
}

impl Default for HostDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl HostDevice {
    pub fn new() -> Self {
        Self::with_root("/")
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    fn find_battery(&self) -> Result<PathBuf, ProbeError> {
        let supplies = self.path("sys/class/power_supply");
        let entries = fs::read_dir(&supplies).map_err(|_| ProbeError::Unavailable("battery"))?;

        for entry in entries.flatten() {
            let dir = entry.path();
            if read_trimmed(&dir.join("type")).as_deref() == Some("Battery") {
                return Ok(dir);
            }
        }
        Err(ProbeError::Unavailable("battery"))
    }

    fn os_release(&self) -> Vec<(String, String)> {
        fs::read_to_string(self.path("etc/os-release"))
            .map(|s| parse_os_release(&s))
            .unwrap_or_default()
    }
}

impl DeviceProbe for HostDevice {
    fn battery(&self) -> Result<BatteryReading, ProbeError> {
        let dir = self.find_battery()?;
        let level = narrow(read_number(&dir.join("capacity"), "battery capacity")?, "battery capacity")?;
        // voltage_now is in microvolts
        let voltage_mv = match read_number(&dir.join("voltage_now"), "battery voltage")
            .and_then(|microvolts| narrow(microvolts / 1000, "battery voltage"))
        {
            Ok(millivolts) => millivolts,
            Err(e) => {
                debug!("battery voltage unavailable: {}", e);
                -1
            }
        };

        Ok(BatteryReading {
            level,
            scale: 100,
            voltage_mv,
        })
    }

    fn wifi_enabled(&self) -> Result<bool, ProbeError> {
        let net = self.path("sys/class/net");
        let entries = fs::read_dir(&net)?;

        let mut any_up = false;
        for entry in entries.flatten() {
            let iface = entry.path();
            let wireless = iface.join("wireless").exists() || iface.join("phy80211").exists();
            if wireless && read_trimmed(&iface.join("operstate")).as_deref() == Some("up") {
                any_up = true;
            }
        }
        Ok(any_up)
    }
}

impl DeviceInfoProvider for HostDevice {
    fn snapshot(&self) -> Result<DeviceSnapshot, ProbeError> {
        let device_id = read_trimmed(&self.path("etc/machine-id"))
            .filter(|id| !id.is_empty())
            .ok_or(ProbeError::Unavailable("machine id"))?;

        let vendor = read_trimmed(&self.path("sys/class/dmi/id/sys_vendor"));
        let product = read_trimmed(&self.path("sys/class/dmi/id/product_name"));
        let hardware_model = match (vendor, product) {
            (Some(v), Some(p)) => format!("{} {}", v, p),
            (Some(one), None) | (None, Some(one)) => one,
            (None, None) => UNKNOWN.to_string(),
        };

        let release = self.os_release();
        let lookup = |key: &str| {
            release
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
                .unwrap_or_else(|| UNKNOWN.to_string())
        };

        Ok(DeviceSnapshot {
            device_id,
            // no cellular modem on a host
            carrier: UNKNOWN.to_string(),
            info: DeviceInfo {
                hardware_model,
                build: lookup("PRETTY_NAME"),
                version: lookup("VERSION_ID"),
                api_level: None,
            },
        })
    }
}

fn read_trimmed(path: &Path) -> Option<String> {
    fs::read_to_string(path).ok().map(|s| s.trim().to_string())
}

fn read_number(path: &Path, what: &'static str) -> Result<i64, ProbeError> {
    let raw = fs::read_to_string(path)?;
    raw.trim().parse().map_err(|_| ProbeError::Parse {
        what,
        raw: raw.trim().to_string(),
    })
}

fn narrow(value: i64, what: &'static str) -> Result<i32, ProbeError> {
    i32::try_from(value).map_err(|_| ProbeError::Parse {
        what,
        raw: value.to_string(),
    })
}

fn parse_os_release(contents: &str) -> Vec<(String, String)> {
    contents
        .lines()
        .filter_map(|line| line.split_once('='))
        .map(|(k, v)| (k.trim().to_string(), v.trim().trim_matches('"').to_string()))
        .collect()
}
