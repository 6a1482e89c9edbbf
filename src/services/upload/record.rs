use serde::{Deserialize, Serialize};

use crate::device::{DeviceInfo, DeviceSnapshot};
use crate::error::UploadError;
use crate::kernel::datapoint::DataPoint;
use crate::kernel::queue::DataQueue;
use crate::kernel::session::Session;

/// JSON body posted to the collector at each session boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub uuid: String,
    pub test_id: i64,
    pub platform: String,
    pub carrier: String,
    pub device_info: DeviceInfo,
    pub data: Vec<DataPoint>,
}

impl SessionRecord {
    pub fn new(session: &Session, device: &DeviceSnapshot, platform: &str, batch: DataQueue) -> Self {
        Self {
            uuid: session.device_id.clone(),
            test_id: session.test_id,
            platform: platform.to_string(),
            carrier: device.carrier.clone(),
            device_info: device.info.clone(),
            data: batch.into_points(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn to_json(&self) -> Result<String, UploadError> {
        Ok(serde_json::to_string(self)?)
    }
}
