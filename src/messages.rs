use crate::sensors::Reading;
use serde::{Deserialize, Serialize};

/// Header metadata attached to every published reading
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Header {
    /// Sensor identifier from the configuration (e.g., "tmp007", "tof0")
    pub sensor_id: String,
    /// Bus device path the sensor is attached to
    pub bus: String,
    /// Sequence number of successful reads for this sensor
    pub seq: u64,
    /// UTC timestamp in nanoseconds
    pub t_utc_ns: u64,
}

impl Header {
    /// Create a new header stamped with the current time
    pub fn new(sensor_id: String, bus: String, seq: u64) -> Self {
        use std::time::{SystemTime, UNIX_EPOCH};

        let t_utc_ns = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos() as u64;

        Self { sensor_id, bus, seq, t_utc_ns }
    }
}

/// One successful reading, as printed by the poller
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ReadingMessage {
    pub h: Header,
    #[serde(flatten)]
    pub reading: Reading,
}

impl ReadingMessage {
    pub fn new(h: Header, reading: Reading) -> Self {
        Self { h, reading }
    }

    /// Serialize to a single JSON line
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
