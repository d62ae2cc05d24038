#[cfg(target_os = "linux")]
use i2cdev::core::I2CDevice;
#[cfg(target_os = "linux")]
use i2cdev::linux::LinuxI2CDevice;
use std::io;

/// Byte-level access to one I2C slave.
///
/// Both calls report how many bytes actually moved; the register
/// transport decides whether a short count is an error.
pub trait I2CTransfer {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize>;
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// I2C bus implementation backed by a `/dev/i2c-*` character device
#[cfg(target_os = "linux")]
pub struct I2CBus {
    device: LinuxI2CDevice,
}

#[cfg(not(target_os = "linux"))]
pub struct I2CBus {
    _phantom: std::marker::PhantomData<()>,
}

#[cfg(target_os = "linux")]
impl I2CBus {
    /// Open the bus character device for read/write
    pub fn open(path: &str) -> io::Result<Self> {
        let device = LinuxI2CDevice::new(path, 0).map_err(io::Error::other)?;
        Ok(Self { device })
    }

    /// Bind the slave address used by every following transfer (I2C_SLAVE ioctl)
    pub fn bind(&mut self, address: u16) -> Result<(), String> {
        self.device
            .set_slave_address(address)
            .map_err(|e| e.to_string())
    }
}

#[cfg(target_os = "linux")]
impl I2CTransfer for I2CBus {
    // i2c-dev either moves the whole message or fails the syscall
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        I2CDevice::write(&mut self.device, bytes).map_err(io::Error::other)?;
        Ok(bytes.len())
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        I2CDevice::read(&mut self.device, buf).map_err(io::Error::other)?;
        Ok(buf.len())
    }
}

#[cfg(not(target_os = "linux"))]
impl I2CBus {
    pub fn open(_path: &str) -> io::Result<Self> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "I2C is only supported on Linux",
        ))
    }

    pub fn bind(&mut self, _address: u16) -> Result<(), String> {
        Err("I2C is only supported on Linux".to_string())
    }
}

#[cfg(not(target_os = "linux"))]
impl I2CTransfer for I2CBus {
    fn write(&mut self, _bytes: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::Unsupported, "I2C is only supported on Linux"))
    }

    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::Unsupported, "I2C is only supported on Linux"))
    }
}
