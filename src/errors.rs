use thiserror::Error;

/// Errors raised by the device handle, the register transport and the drivers
#[derive(Error, Debug)]
pub enum SensorError {
    #[error("Failed to open I2C bus '{bus}': {source}")]
    OpenError {
        bus: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to bind address {address:#04x} on '{bus}': {reason}")]
    BindError { bus: String, address: u16, reason: String },

    #[error("I2C {op} on register {register:#04x} transferred {transferred} of {expected} byte(s){}", detail_suffix(.detail))]
    TransportError {
        op: TransferOp,
        register: u16,
        expected: usize,
        transferred: usize,
        detail: Option<String>,
    },

    #[error("Write to register {register:#04x} requested {requested} data bytes, registers are at most 16 bit")]
    PayloadTooLarge { register: u16, requested: usize },

    #[error("Unsupported sensor driver: '{driver}'")]
    UnsupportedDriver { driver: String },
}

/// Direction of a failed bus transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOp {
    Write,
    Select,
    Read,
}

impl std::fmt::Display for TransferOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferOp::Write => write!(f, "write"),
            TransferOp::Select => write!(f, "register select"),
            TransferOp::Read => write!(f, "read"),
        }
    }
}

fn detail_suffix(detail: &Option<String>) -> String {
    match detail {
        Some(d) => format!(": {}", d),
        None => String::new(),
    }
}

impl SensorError {
    pub fn is_transport(&self) -> bool {
        matches!(self, SensorError::TransportError { .. })
    }
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration from '{path}': {source}")]
    LoadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration format: {0}")]
    FormatError(#[from] toml::de::Error),

    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Registry and initialization errors
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Sensor '{id}' setup failed: {source}")]
    SetupError {
        id: String,
        #[source]
        source: SensorError,
    },

    #[error("No sensor could be set up")]
    NoSensors,
}

/// Result type aliases for convenience
pub type SensorResult<T> = Result<T, SensorError>;
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type RegistryResult<T> = Result<T, RegistryError>;
