use crate::errors::{SensorError, SensorResult};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tmp007")]
pub mod tmp007;
#[cfg(feature = "vl6180")]
pub mod vl6180;

/// A physical measurement; only ever produced by a successful read
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reading {
    Temperature { fahrenheit: f32 },
    Range { millimeters: u8 },
}

/// A configured sensor. Reads block the calling thread until the bus
/// transaction completes; a driver must not be shared between threads
/// without external locking.
pub trait SensorDriver: Send {
    fn id(&self) -> &str;
    fn bus(&self) -> &str;
    fn read(&mut self) -> SensorResult<Reading>;
    fn close(self: Box<Self>);
}

/// Names accepted by [`create_sensor_driver`]
pub const DRIVER_NAMES: &[&str] = &[
    #[cfg(feature = "tmp007")]
    "tmp007",
    #[cfg(feature = "vl6180")]
    "vl6180",
];

/// Set up a driver by name; returns a fully configured sensor or nothing
pub fn create_sensor_driver(
    driver: &str,
    id: String,
    bus_path: &str,
    address: Option<u8>,
) -> SensorResult<Box<dyn SensorDriver>> {
    match driver {
        #[cfg(feature = "tmp007")]
        "tmp007" => {
            let address = address.unwrap_or(tmp007::DEFAULT_ADDRESS);
            Ok(Box::new(tmp007::Tmp007::setup_at(bus_path, address)?.with_id(id)))
        }
        #[cfg(feature = "vl6180")]
        "vl6180" => {
            let address = address.unwrap_or(vl6180::DEFAULT_ADDRESS);
            Ok(Box::new(vl6180::Vl6180::setup_at(bus_path, address)?.with_id(id)))
        }
        _ => Err(SensorError::UnsupportedDriver { driver: driver.to_string() }),
    }
}
