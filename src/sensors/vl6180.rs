use super::{Reading, SensorDriver};
use crate::bus::{I2CBus, I2CTransfer};
use crate::device::DeviceHandle;
use crate::errors::SensorResult;
use tracing::{debug, error, info};

pub const DEFAULT_BUS: &str = "/dev/i2c-1";
pub const DEFAULT_ADDRESS: u8 = 0x29;

// Register indices for the VL6180 (16-bit, sent high byte first)
const SYSRANGE_START: u16 = 0x018;
const SYSTEM_INTERRUPT_CLEAR: u16 = 0x015;
const SYSTEM_FRESH_OUT_OF_RESET: u16 = 0x016;
const RESULT_RANGE_STATUS: u16 = 0x04d;
const RESULT_RANGE_VAL: u16 = 0x063;

// Private registers that must be loaded after every reset (AN4545)
const TUNING_SETTINGS: &[(u16, u8)] = &[
    (0x0207, 0x01),
    (0x0208, 0x01),
    (0x0096, 0x00),
    (0x0097, 0xfd),
    (0x00e3, 0x00),
    (0x00e4, 0x04),
    (0x00e5, 0x02),
    (0x00e6, 0x01),
    (0x00e7, 0x03),
    (0x00f5, 0x02),
    (0x00d9, 0x05),
    (0x00db, 0xce),
    (0x00dc, 0x03),
    (0x00dd, 0xf8),
    (0x009f, 0x00),
    (0x00a3, 0x3c),
    (0x00b7, 0x00),
    (0x00bb, 0x3c),
    (0x00b2, 0x09),
    (0x00ca, 0x09),
    (0x0198, 0x01),
    (0x01b0, 0x17),
    (0x01ad, 0x00),
    (0x00ff, 0x05),
    (0x0100, 0x05),
    (0x0199, 0x05),
    (0x01a6, 0x1b),
    (0x01ac, 0x3e),
    (0x01a7, 0x1f),
    (0x0030, 0x00),
];

// Recommended public register defaults
const DEFAULT_SETTINGS: &[(u16, u8)] = &[
    (0x0011, 0x10), // GPIO1 as interrupt output, active low
    (0x010a, 0x30), // readout averaging period
    (0x003f, 0x46), // ALS analogue gain
    (0x0031, 0xff), // VHV repeat rate
    (0x0040, 0x63), // ALS integration period 100 ms
    (0x002e, 0x01), // VHV recalibration
    (0x001b, 0x09), // range inter-measurement period 100 ms
    (0x003e, 0x31), // ALS inter-measurement period 500 ms
    (0x0014, 0x24), // interrupt on new sample ready
];

const CLEAR_ALL_INTERRUPTS: u8 = 0x07;
const START_CONTINUOUS: u8 = 0x03;

/// Decoded RESULT__RANGE_STATUS
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeStatus {
    pub error_code: u8,
    pub device_ready: bool,
}

impl RangeStatus {
    pub fn from_register(value: u8) -> Self {
        Self {
            error_code: value >> 4,
            device_ready: value & 0x01 != 0,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.error_code == 0
    }

    pub fn description(&self) -> &'static str {
        match self.error_code {
            0 => "no error",
            1 => "VCSEL continuity test",
            2 | 3 => "VCSEL watchdog",
            4 => "PLL1 lock",
            5 => "PLL2 lock",
            6 => "early convergence estimate",
            7 => "max convergence",
            8 => "no target ignore",
            11 => "max signal to noise ratio",
            12 | 14 => "range underflow",
            13 | 15 => "range overflow",
            _ => "reserved",
        }
    }
}

/// VL6180 time-of-flight range sensor
pub struct Vl6180<B = I2CBus> {
    id: String,
    handle: DeviceHandle<B>,
}

impl Vl6180<I2CBus> {
    /// Set up the sensor at its default address on `bus_path`
    pub fn setup(bus_path: &str) -> SensorResult<Self> {
        Self::setup_at(bus_path, DEFAULT_ADDRESS)
    }

    pub fn setup_at(bus_path: &str, address: u8) -> SensorResult<Self> {
        let handle = DeviceHandle::setup(bus_path, address).map_err(|e| {
            error!("[vl6180] opening {} failed: {}", bus_path, e);
            e
        })?;
        Self::configure(handle)
    }
}

impl<B: I2CTransfer> Vl6180<B> {
    /// Load the tuning settings and start continuous ranging.
    /// The handle is released if any write fails.
    pub fn configure(mut handle: DeviceHandle<B>) -> SensorResult<Self> {
        if let Err(e) = Self::write_sequence(&mut handle) {
            error!("[vl6180] configuring {} failed: {}", handle.bus_path(), e);
            handle.close();
            return Err(e);
        }
        info!("[vl6180] configured on {}", handle.bus_path());

        Ok(Self {
            id: "vl6180".to_string(),
            handle,
        })
    }

    fn write_sequence(handle: &mut DeviceHandle<B>) -> SensorResult<()> {
        for &(index, value) in TUNING_SETTINGS.iter().chain(DEFAULT_SETTINGS) {
            handle.write_index8(index, value)?;
        }
        debug!("[vl6180] tuning settings loaded");

        handle.write_index8(SYSTEM_FRESH_OUT_OF_RESET, 0x00)?;
        handle.write_index8(SYSTEM_INTERRUPT_CLEAR, CLEAR_ALL_INTERRUPTS)?;
        handle.write_index8(SYSRANGE_START, START_CONTINUOUS)?;
        Ok(())
    }

    pub fn with_id(mut self, id: String) -> Self {
        self.id = id;
        self
    }

    /// Read the latest range in millimeters
    pub fn read_range(&mut self) -> SensorResult<u8> {
        self.handle.read_index8(RESULT_RANGE_VAL).map_err(|e| {
            error!("[{}] reading range failed: {}", self.id, e);
            e
        })
    }

    pub fn read_range_status(&mut self) -> SensorResult<RangeStatus> {
        let value = self.handle.read_index8(RESULT_RANGE_STATUS)?;
        Ok(RangeStatus::from_register(value))
    }

    pub fn close(self) {
        self.handle.close();
    }
}

impl<B: I2CTransfer + Send> SensorDriver for Vl6180<B> {
    fn id(&self) -> &str {
        &self.id
    }

    fn bus(&self) -> &str {
        self.handle.bus_path()
    }

    fn read(&mut self) -> SensorResult<Reading> {
        let millimeters = self.read_range()?;
        Ok(Reading::Range { millimeters })
    }

    fn close(self: Box<Self>) {
        Vl6180::close(*self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::mock::{MockBus, Transfer};
    use crate::errors::SensorError;

    fn handle(bus: &MockBus) -> DeviceHandle<MockBus> {
        DeviceHandle::with_transfer("/dev/i2c-mock", DEFAULT_ADDRESS, bus.clone())
    }

    #[test]
    fn test_configure_sequence() {
        let bus = MockBus::with_word_index();
        Vl6180::configure(handle(&bus)).unwrap();

        let writes = bus.writes();
        assert_eq!(writes.len(), TUNING_SETTINGS.len() + DEFAULT_SETTINGS.len() + 3);
        assert_eq!(writes[0], vec![0x02, 0x07, 0x01]);
        assert_eq!(
            writes[writes.len() - 3..],
            [
                vec![0x00, 0x16, 0x00],
                vec![0x00, 0x15, 0x07],
                vec![0x00, 0x18, 0x03],
            ]
        );
        assert_eq!(bus.register(0x0018), Some(vec![0x03]));
        assert_eq!(bus.register(0x01b0), Some(vec![0x17]));
    }

    #[test]
    fn test_configure_aborts_on_first_failure() {
        let bus = MockBus::with_word_index();
        bus.fail_write_at(5);

        let result = Vl6180::configure(handle(&bus));
        assert!(matches!(result, Err(SensorError::TransportError { register: 0x00e4, .. })));
        assert_eq!(bus.writes().len(), 6);
        assert_eq!(bus.register(0x0018), None);
    }

    #[test]
    fn test_read_range() {
        let bus = MockBus::with_word_index();
        let mut sensor = Vl6180::configure(handle(&bus)).unwrap();
        bus.set_register(0x0063, &[187]);

        assert_eq!(sensor.read_range().unwrap(), 187);
        let transfers = bus.transfers();
        assert_eq!(
            transfers[transfers.len() - 2..],
            [Transfer::Write(vec![0x00, 0x63]), Transfer::Read(1)]
        );
    }

    #[test]
    fn test_read_range_failure() {
        let bus = MockBus::with_word_index();
        let mut sensor = Vl6180::configure(handle(&bus)).unwrap();
        bus.fail_reads();

        assert!(sensor.read_range().unwrap_err().is_transport());
    }

    #[test]
    fn test_range_status() {
        let bus = MockBus::with_word_index();
        let mut sensor = Vl6180::configure(handle(&bus)).unwrap();

        bus.set_register(0x004d, &[0x01]);
        let status = sensor.read_range_status().unwrap();
        assert!(status.is_valid());
        assert!(status.device_ready);

        bus.set_register(0x004d, &[0xB0]);
        let status = sensor.read_range_status().unwrap();
        assert_eq!(status.error_code, 11);
        assert!(!status.is_valid());
        assert_eq!(status.description(), "max signal to noise ratio");
    }

    #[test]
    fn test_read_through_driver_trait() {
        let bus = MockBus::with_word_index();
        let mut sensor: Box<dyn SensorDriver> =
            Box::new(Vl6180::configure(handle(&bus)).unwrap().with_id("tof0".to_string()));
        bus.set_register(0x0063, &[0]);

        assert_eq!(sensor.id(), "tof0");
        assert_eq!(sensor.read().unwrap(), Reading::Range { millimeters: 0 });
        sensor.close();
    }
}
