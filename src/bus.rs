pub mod i2c;
pub mod mock;

pub use i2c::{I2CBus, I2CTransfer};
