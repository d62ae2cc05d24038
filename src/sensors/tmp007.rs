use super::{Reading, SensorDriver};
use crate::bus::{I2CBus, I2CTransfer};
use crate::device::{DeviceHandle, RawWord};
use crate::errors::SensorResult;
use tracing::{error, info, warn};

pub const DEFAULT_BUS: &str = "/dev/i2c-1";
pub const DEFAULT_ADDRESS: u8 = 0x40;

// Register addresses for the TMP007
const CONFIGURATION: u8 = 0x02;
const OBJECT_TEMP: u8 = 0x03;

// Continuous conversion, 4 averaged samples per result
const CONFIGURATION_WORD: [u8; 2] = [0x15, 0x40];

// Low two bits of the object temperature are flags, not data
const DATA_MASK: u8 = 0xFC;
const DATA_INVALID: u8 = 0x01;

const CELSIUS_PER_LSB: f64 = 0.03125;

/// Convert an object temperature word to degrees Fahrenheit
pub fn convert_temperature(word: RawWord) -> f32 {
    let high = u16::from(word.high) << 8;
    let low = u16::from(word.low & DATA_MASK);
    let raw = (high + low) >> 2;

    let celsius = (f64::from(raw) * CELSIUS_PER_LSB) as f32;
    (f64::from(celsius) * 1.8 + 32.0) as f32
}

/// TMP007 infrared thermopile
pub struct Tmp007<B = I2CBus> {
    id: String,
    handle: DeviceHandle<B>,
}

impl Tmp007<I2CBus> {
    /// Set up the sensor at its default address on `bus_path`
    pub fn setup(bus_path: &str) -> SensorResult<Self> {
        Self::setup_at(bus_path, DEFAULT_ADDRESS)
    }

    pub fn setup_at(bus_path: &str, address: u8) -> SensorResult<Self> {
        let handle = DeviceHandle::setup(bus_path, address).map_err(|e| {
            error!("[tmp007] opening {} failed: {}", bus_path, e);
            e
        })?;
        Self::configure(handle)
    }
}

impl<B: I2CTransfer> Tmp007<B> {
    /// Write the configuration word. The handle is released if that fails.
    pub fn configure(mut handle: DeviceHandle<B>) -> SensorResult<Self> {
        if let Err(e) = handle.write_register(CONFIGURATION, &CONFIGURATION_WORD) {
            error!("[tmp007] configuring {} failed: {}", handle.bus_path(), e);
            handle.close();
            return Err(e);
        }
        info!("[tmp007] configured on {}", handle.bus_path());

        Ok(Self {
            id: "tmp007".to_string(),
            handle,
        })
    }

    pub fn with_id(mut self, id: String) -> Self {
        self.id = id;
        self
    }

    /// Read the unconverted object temperature word
    pub fn read_raw(&mut self) -> SensorResult<RawWord> {
        self.handle.read_register16(OBJECT_TEMP)
    }

    /// Read the object temperature in degrees Fahrenheit
    pub fn read_temperature(&mut self) -> SensorResult<f32> {
        let word = self.read_raw().map_err(|e| {
            error!("[{}] reading temperature failed: {}", self.id, e);
            e
        })?;

        if word.status_bits() & DATA_INVALID != 0 {
            warn!("[{}] object temperature flagged invalid", self.id);
        }
        Ok(convert_temperature(word))
    }

    pub fn close(self) {
        self.handle.close();
    }
}

impl<B: I2CTransfer + Send> SensorDriver for Tmp007<B> {
    fn id(&self) -> &str {
        &self.id
    }

    fn bus(&self) -> &str {
        self.handle.bus_path()
    }

    fn read(&mut self) -> SensorResult<Reading> {
        let fahrenheit = self.read_temperature()?;
        Ok(Reading::Temperature { fahrenheit })
    }

    fn close(self: Box<Self>) {
        Tmp007::close(*self);
    }
}
