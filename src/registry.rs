use crate::config::SensorConfig;
use crate::errors::{RegistryError, RegistryResult};
use crate::sensors::{create_sensor_driver, SensorDriver};
use tracing::{error, info};

/// Set up every configured sensor. A sensor whose setup fails is logged and
/// left out; it is an error only when nothing could be set up.
pub fn init_all(sensor_config: &SensorConfig) -> RegistryResult<Vec<Box<dyn SensorDriver>>> {
    let mut sensors: Vec<Box<dyn SensorDriver>> = Vec::new();
    info!("[registry] initializing {} sensors...", sensor_config.sensors.len());

    for s in sensor_config.sensors.iter() {
        match create_sensor_driver(&s.driver, s.id.clone(), &s.bus, s.address) {
            Ok(sensor) => {
                info!("[registry] registered sensor: id={} driver={} bus={}", s.id, s.driver, s.bus);
                sensors.push(sensor);
            }
            Err(source) => {
                let e = RegistryError::SetupError { id: s.id.clone(), source };
                error!("[registry] {}", e);
            }
        }
    }

    if sensors.is_empty() {
        return Err(RegistryError::NoSensors);
    }
    Ok(sensors)
}
