//! Device handle and register transport.
//!
//! A [`DeviceHandle`] owns one bus connection bound to one 7-bit slave
//! address. All register traffic goes through it: writes are framed as
//! `[register] ++ data` with at most two data bytes, reads select the
//! register with a one byte write and then read the payload back.

use crate::bus::{I2CBus, I2CTransfer};
use crate::errors::{SensorError, SensorResult, TransferOp};
use tracing::{debug, error, info};

/// Registers are at most 16 bits wide
pub const MAX_REGISTER_PAYLOAD: usize = 2;

/// Highest 7-bit slave address
pub const MAX_7BIT_ADDRESS: u8 = 0x7F;

/// Unconverted payload of a 16-bit register read, in wire order (MSB first)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawWord {
    pub high: u8,
    pub low: u8,
}

impl RawWord {
    pub fn from_wire(bytes: [u8; 2]) -> Self {
        Self { high: bytes[0], low: bytes[1] }
    }

    pub fn value(&self) -> u16 {
        u16::from_be_bytes([self.high, self.low])
    }

    /// The two least significant bits, which some sensors use as flags
    pub fn status_bits(&self) -> u8 {
        self.low & 0x03
    }
}

/// One physical sensor bound to one bus
pub struct DeviceHandle<B = I2CBus> {
    bus_path: String,
    address: u8,
    bus: B,
}

impl DeviceHandle<I2CBus> {
    /// Open `bus_path` and bind `address` as the active slave
    pub fn setup(bus_path: &str, address: u8) -> SensorResult<Self> {
        if address > MAX_7BIT_ADDRESS {
            error!("[i2c] {:#04x} is not a 7-bit address", address);
            return Err(SensorError::BindError {
                bus: bus_path.to_string(),
                address: u16::from(address),
                reason: "not a 7-bit address".to_string(),
            });
        }

        let mut bus = I2CBus::open(bus_path).map_err(|source| {
            error!("[i2c] opening {} failed: {}", bus_path, source);
            SensorError::OpenError {
                bus: bus_path.to_string(),
                source,
            }
        })?;
        info!("[i2c] {} opened", bus_path);

        bus.bind(u16::from(address)).map_err(|reason| {
            error!("[i2c] binding {:#04x} on {} failed: {}", address, bus_path, reason);
            SensorError::BindError {
                bus: bus_path.to_string(),
                address: u16::from(address),
                reason,
            }
        })?;
        info!("[i2c] {:#04x} bound on {}", address, bus_path);

        Ok(Self::with_transfer(bus_path, address, bus))
    }
}

impl<B: I2CTransfer> DeviceHandle<B> {
    /// Wrap an already bound transfer
    pub fn with_transfer(bus_path: impl Into<String>, address: u8, bus: B) -> Self {
        Self {
            bus_path: bus_path.into(),
            address,
            bus,
        }
    }

    pub fn bus_path(&self) -> &str {
        &self.bus_path
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Write up to two data bytes to `register` in a single transfer.
    ///
    /// Returns the number of bytes put on the wire, register byte included.
    pub fn write_register(&mut self, register: u8, data: &[u8]) -> SensorResult<usize> {
        if data.len() > MAX_REGISTER_PAYLOAD {
            error!(
                "[{}] write to {:#04x}: {} data bytes requested, registers are 16 bit",
                self.bus_path,
                register,
                data.len()
            );
            return Err(SensorError::PayloadTooLarge {
                register: u16::from(register),
                requested: data.len(),
            });
        }

        let mut frame = [0u8; 1 + MAX_REGISTER_PAYLOAD];
        frame[0] = register;
        frame[1..=data.len()].copy_from_slice(data);
        let frame = &frame[..=data.len()];

        self.transfer_out(TransferOp::Write, u16::from(register), frame)
    }

    /// Select `register` and read its two bytes back
    pub fn read_register16(&mut self, register: u8) -> SensorResult<RawWord> {
        let mut buf = [0u8; 2];
        self.transfer_out(TransferOp::Select, u16::from(register), &[register])?;
        self.transfer_in(u16::from(register), &mut buf)?;
        Ok(RawWord::from_wire(buf))
    }

    /// Select `register` and read a single byte back
    pub fn read_register8(&mut self, register: u8) -> SensorResult<u8> {
        let mut buf = [0u8; 1];
        self.transfer_out(TransferOp::Select, u16::from(register), &[register])?;
        self.transfer_in(u16::from(register), &mut buf)?;
        Ok(buf[0])
    }

    /// Write one byte to a register with a 16-bit index.
    ///
    /// The index high byte takes the register slot of the frame, so this is
    /// `write_register(hi, [lo, value])`.
    pub fn write_index8(&mut self, index: u16, value: u8) -> SensorResult<usize> {
        let [hi, lo] = index.to_be_bytes();
        self.write_register(hi, &[lo, value])
            .map_err(|e| with_register(e, index))
    }

    /// Select a register with a 16-bit index and read one byte back
    pub fn read_index8(&mut self, index: u16) -> SensorResult<u8> {
        let mut buf = [0u8; 1];
        self.transfer_out(TransferOp::Select, index, &index.to_be_bytes())?;
        self.transfer_in(index, &mut buf)?;
        Ok(buf[0])
    }

    /// Release the bus connection
    pub fn close(self) {
        debug!("[i2c] {:#04x} on {} closed", self.address, self.bus_path);
    }

    fn transfer_out(&mut self, op: TransferOp, register: u16, frame: &[u8]) -> SensorResult<usize> {
        let written = self.bus.write(frame).map_err(|e| {
            error!("[{}] {} {:#04x} failed: {}", self.bus_path, op, register, e);
            SensorError::TransportError {
                op,
                register,
                expected: frame.len(),
                transferred: 0,
                detail: Some(e.to_string()),
            }
        })?;

        if written != frame.len() {
            error!(
                "[{}] {} {:#04x}: short transfer {}/{}",
                self.bus_path,
                op,
                register,
                written,
                frame.len()
            );
            return Err(SensorError::TransportError {
                op,
                register,
                expected: frame.len(),
                transferred: written,
                detail: None,
            });
        }

        debug!("[{}] {} {:#04x}: {:02x?}", self.bus_path, op, register, frame);
        Ok(written)
    }

    fn transfer_in(&mut self, register: u16, buf: &mut [u8]) -> SensorResult<()> {
        let op = TransferOp::Read;
        let expected = buf.len();
        let read = self.bus.read(buf).map_err(|e| {
            error!("[{}] {} {:#04x} failed: {}", self.bus_path, op, register, e);
            SensorError::TransportError {
                op,
                register,
                expected,
                transferred: 0,
                detail: Some(e.to_string()),
            }
        })?;

        if read != expected {
            error!(
                "[{}] {} {:#04x}: short transfer {}/{}",
                self.bus_path, op, register, read, expected
            );
            return Err(SensorError::TransportError {
                op,
                register,
                expected,
                transferred: read,
                detail: None,
            });
        }

        debug!("[{}] {} {:#04x}: {:02x?}", self.bus_path, op, register, buf);
        Ok(())
    }
}

// Report indexed writes against the full 16-bit index
fn with_register(err: SensorError, index: u16) -> SensorError {
    match err {
        SensorError::TransportError { op, expected, transferred, detail, .. } => {
            SensorError::TransportError {
                op,
                register: index,
                expected,
                transferred,
                detail,
            }
        }
        other => other,
    }
}
