use crate::device::MAX_7BIT_ADDRESS;
use crate::errors::{ConfigError, ConfigResult};
use crate::sensors::DRIVER_NAMES;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Polling rate used when an entry leaves `frequency` out
pub const DEFAULT_FREQUENCY_HZ: u32 = 1;

/// Root configuration struct expecting `[[sensor]]` TOML array format
#[derive(Debug, Deserialize)]
pub struct SensorConfig {
    #[serde(rename = "sensor", default)]
    pub sensors: Vec<SensorEntry>,
}

/// One sensor entry, matching each `[[sensor]]` section
#[derive(Debug, Clone, Deserialize)]
pub struct SensorEntry {
    pub id: String,
    pub driver: String,
    pub bus: String,
    /// Overrides the driver's default slave address
    pub address: Option<u8>,
    /// Polling rate in Hz
    pub frequency: Option<u32>,
}

impl SensorEntry {
    pub fn frequency(&self) -> u32 {
        self.frequency.unwrap_or(DEFAULT_FREQUENCY_HZ)
    }
}

impl SensorConfig {
    /// Both sensors on their default buses and addresses
    pub fn builtin() -> Self {
        let mut sensors = Vec::new();
        #[cfg(feature = "tmp007")]
        sensors.push(SensorEntry {
            id: "tmp007".to_string(),
            driver: "tmp007".to_string(),
            bus: crate::sensors::tmp007::DEFAULT_BUS.to_string(),
            address: None,
            frequency: None,
        });
        #[cfg(feature = "vl6180")]
        sensors.push(SensorEntry {
            id: "vl6180".to_string(),
            driver: "vl6180".to_string(),
            bus: crate::sensors::vl6180::DEFAULT_BUS.to_string(),
            address: None,
            frequency: None,
        });
        Self { sensors }
    }

    pub fn from_toml(content: &str) -> ConfigResult<Self> {
        let parsed: SensorConfig = toml::from_str(content)?;
        parsed.validate()?;
        Ok(parsed)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        for (i, s) in self.sensors.iter().enumerate() {
            if !DRIVER_NAMES.contains(&s.driver.as_str()) {
                return Err(ConfigError::InvalidValue {
                    field: format!("sensor[{}].driver", i),
                    reason: format!("unknown driver '{}', expected one of {:?}", s.driver, DRIVER_NAMES),
                });
            }
            if let Some(address) = s.address {
                if address > MAX_7BIT_ADDRESS {
                    return Err(ConfigError::InvalidValue {
                        field: format!("sensor[{}].address", i),
                        reason: format!("{:#04x} is not a 7-bit address", address),
                    });
                }
            }
            if s.frequency == Some(0) {
                return Err(ConfigError::InvalidValue {
                    field: format!("sensor[{}].frequency", i),
                    reason: "must be at least 1 Hz".to_string(),
                });
            }
            if self.sensors[..i].iter().any(|other| other.id == s.id) {
                return Err(ConfigError::InvalidValue {
                    field: format!("sensor[{}].id", i),
                    reason: format!("duplicate id '{}'", s.id),
                });
            }
        }
        Ok(())
    }
}

/// Loads config from TOML file, falling back to the built-in sensors when
/// the file does not exist
pub fn load_sensor_config(path: &str) -> ConfigResult<SensorConfig> {
    if !Path::new(path).exists() {
        return Ok(SensorConfig::builtin());
    }
    let content = fs::read_to_string(path).map_err(|source| ConfigError::LoadError {
        path: path.to_string(),
        source,
    })?;
    SensorConfig::from_toml(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sensor_entries() {
        let config = SensorConfig::from_toml(
            r#"
            [[sensor]]
            id = "ir0"
            driver = "tmp007"
            bus = "/dev/i2c-1"
            frequency = 4

            [[sensor]]
            id = "tof0"
            driver = "vl6180"
            bus = "/dev/i2c-2"
            address = 0x30
            "#,
        )
        .unwrap();

        assert_eq!(config.sensors.len(), 2);
        assert_eq!(config.sensors[0].frequency(), 4);
        assert_eq!(config.sensors[0].address, None);
        assert_eq!(config.sensors[1].address, Some(0x30));
        assert_eq!(config.sensors[1].frequency(), DEFAULT_FREQUENCY_HZ);
    }

    #[test]
    fn test_rejects_unknown_driver() {
        let err = SensorConfig::from_toml(
            r#"
            [[sensor]]
            id = "baro0"
            driver = "bmp388"
            bus = "/dev/i2c-1"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "sensor[0].driver"));
    }

    #[test]
    fn test_rejects_wide_address_and_zero_frequency() {
        let wide = SensorConfig::from_toml(
            "[[sensor]]\nid = \"a\"\ndriver = \"tmp007\"\nbus = \"/dev/i2c-1\"\naddress = 0x90\n",
        );
        assert!(matches!(wide, Err(ConfigError::InvalidValue { .. })));

        let zero = SensorConfig::from_toml(
            "[[sensor]]\nid = \"a\"\ndriver = \"tmp007\"\nbus = \"/dev/i2c-1\"\nfrequency = 0\n",
        );
        assert!(matches!(zero, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let err = SensorConfig::from_toml(
            r#"
            [[sensor]]
            id = "a"
            driver = "tmp007"
            bus = "/dev/i2c-1"

            [[sensor]]
            id = "a"
            driver = "vl6180"
            bus = "/dev/i2c-1"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("duplicate id"));
    }

    #[test]
    fn test_malformed_toml() {
        let err = SensorConfig::from_toml("[[sensor]]\nid = 3\n").unwrap_err();
        assert!(matches!(err, ConfigError::FormatError(_)));
    }

    #[test]
    fn test_missing_file_uses_builtin() {
        let config = load_sensor_config("/nonexistent/sensors.toml").unwrap();
        assert_eq!(config.sensors.len(), DRIVER_NAMES.len());
        assert!(config.validate().is_ok());
    }
}
