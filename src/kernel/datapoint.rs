use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

use super::time::Timestamp;

/// The fixed set of sample kinds a data point can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataPointKind {
    BatteryLevel,
    BatteryScale,
    BatteryPercent,
    BatteryVoltage,
    WifiState,
    ScreenState,
    GpsState,
    CellSignalGsm,
    CellSignalCdma,
    CellSignalEvdo,
}

impl DataPointKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataPointKind::BatteryLevel => "battery_level",
            DataPointKind::BatteryScale => "battery_scale",
            DataPointKind::BatteryPercent => "battery_percent",
            DataPointKind::BatteryVoltage => "battery_voltage",
            DataPointKind::WifiState => "wifi_state",
            DataPointKind::ScreenState => "screen_state",
            DataPointKind::GpsState => "gps_state",
            DataPointKind::CellSignalGsm => "cell_signal_gsm",
            DataPointKind::CellSignalCdma => "cell_signal_cdma",
            DataPointKind::CellSignalEvdo => "cell_signal_evdo",
        }
    }
}

impl fmt::Display for DataPointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Numeric payload of a sample. Keeps whichever kind the sampler produced:
/// counts and 0/1 flags stay integral, ratios and voltages stay fractional.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SampleValue {
    Integer(i64),
    Float(f64),
}

impl SampleValue {
    pub fn as_f64(&self) -> f64 {
        match *self {
            SampleValue::Integer(v) => v as f64,
            SampleValue::Float(v) => v,
        }
    }

    pub fn is_finite(&self) -> bool {
        match *self {
            SampleValue::Integer(_) => true,
            SampleValue::Float(v) => v.is_finite(),
        }
    }
}

// Non-finite floats go out as `null` so one bad reading cannot poison the batch.
impl Serialize for SampleValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match *self {
            SampleValue::Integer(v) => serializer.serialize_i64(v),
            SampleValue::Float(v) if v.is_finite() => serializer.serialize_f64(v),
            SampleValue::Float(_) => serializer.serialize_none(),
        }
    }
}

impl fmt::Display for SampleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleValue::Integer(v) => write!(f, "{}", v),
            SampleValue::Float(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for SampleValue {
    fn from(v: i64) -> Self {
        SampleValue::Integer(v)
    }
}

impl From<i32> for SampleValue {
    fn from(v: i32) -> Self {
        SampleValue::Integer(i64::from(v))
    }
}

impl From<bool> for SampleValue {
    fn from(v: bool) -> Self {
        SampleValue::Integer(i64::from(v))
    }
}

impl From<f64> for SampleValue {
    fn from(v: f64) -> Self {
        SampleValue::Float(v)
    }
}

impl From<f32> for SampleValue {
    fn from(v: f32) -> Self {
        SampleValue::Float(f64::from(v))
    }
}

/// One immutable timestamped sample. Fields are private; build with [`DataPoint::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    timestamp: Timestamp,
    #[serde(rename = "type")]
    kind: DataPointKind,
    value: SampleValue,
}

impl DataPoint {
    pub fn new(timestamp: Timestamp, kind: DataPointKind, value: impl Into<SampleValue>) -> Self {
        Self {
            timestamp,
            kind,
            value: value.into(),
        }
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn kind(&self) -> DataPointKind {
        self.kind
    }

    pub fn value(&self) -> SampleValue {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_names_match_wire_names() {
        for kind in [
            DataPointKind::BatteryPercent,
            DataPointKind::WifiState,
            DataPointKind::CellSignalEvdo,
            DataPointKind::GpsState,
        ] {
            let wire = serde_json::to_value(kind).unwrap();
            assert_eq!(wire, json!(kind.as_str()));
        }
    }

    #[test]
    fn test_integral_and_fractional_values_keep_their_kind() {
        let flag = DataPoint::new(Timestamp(10), DataPointKind::WifiState, true);
        let ratio = DataPoint::new(Timestamp(10), DataPointKind::BatteryPercent, 0.5_f64);

        assert_eq!(
            serde_json::to_value(&flag).unwrap(),
            json!({ "timestamp": 10, "type": "wifi_state", "value": 1 })
        );
        assert_eq!(
            serde_json::to_value(&ratio).unwrap(),
            json!({ "timestamp": 10, "type": "battery_percent", "value": 0.5 })
        );
    }

    #[test]
    fn test_non_finite_value_serializes_as_null() {
        let bad = DataPoint::new(Timestamp(3), DataPointKind::BatteryVoltage, f64::NAN);
        assert!(!bad.value().is_finite());
        assert_eq!(
            serde_json::to_value(&bad).unwrap(),
            json!({ "timestamp": 3, "type": "battery_voltage", "value": null })
        );
    }
}
