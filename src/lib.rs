//! Register-level drivers for a TMP007 infrared thermopile and a VL6180
//! time-of-flight range sensor on Linux `/dev/i2c-*` buses.

pub mod bus;
pub mod config;
pub mod device;
pub mod errors;
pub mod messages;
pub mod registry;
pub mod scheduler;
pub mod sensors;

// Re-export commonly used types
pub use config::{load_sensor_config, SensorConfig};
pub use device::{DeviceHandle, RawWord};
pub use errors::{SensorError, SensorResult};
pub use registry::init_all;
pub use scheduler::spawn_sensor_tasks;
pub use sensors::{create_sensor_driver, Reading, SensorDriver};

use tracing_subscriber::EnvFilter;

/// Initialize tracing with RUST_LOG support; INFO unless overridden.
/// Every line carries its source location.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_file(true)
        .with_line_number(true)
        .init();
}
