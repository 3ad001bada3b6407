//! Adapter configuration.

use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::ConfigError;

/// Backend device variant the adapter drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    /// The platform's sound card driver (ALSA, CoreAudio, WASAPI).
    #[default]
    Hardware,
    /// Software loopback device; needs no hardware.
    Virtual,
}

impl DeviceKind {
    /// Every variant, in display order.
    pub const ALL: [DeviceKind; 2] = [DeviceKind::Hardware, DeviceKind::Virtual];

    /// Lowercase identifier used in config files and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            DeviceKind::Hardware => "hardware",
            DeviceKind::Virtual => "virtual",
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DeviceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "device",
                reason: format!("unknown device kind '{s}' (expected hardware or virtual)"),
            })
    }
}

/// Configuration passed to the adapter at load time.
///
/// # TOML Format
///
/// ```toml
/// device = "hardware"
/// device_name = "USB"
/// ```
///
/// Every field is optional; an empty document yields [`AdapterConfig::default`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdapterConfig {
    /// Device variant to construct.
    #[serde(default)]
    pub device: DeviceKind,

    /// Substring filter for choosing a hardware device; the system default
    /// device is used when absent.
    #[serde(default)]
    pub device_name: Option<String>,
}

impl AdapterConfig {
    /// Set the device variant.
    pub fn with_device(mut self, device: DeviceKind) -> Self {
        self.device = device;
        self
    }

    /// Set the hardware device name filter.
    pub fn with_device_name(mut self, name: impl Into<String>) -> Self {
        self.device_name = Some(name.into());
        self
    }

    /// Parse the load-time init string handed over by the host.
    ///
    /// A blank string yields the defaults; anything else is read as TOML.
    pub fn parse(init: &str) -> Result<Self, ConfigError> {
        if init.trim().is_empty() {
            return Ok(Self::default());
        }
        Self::from_toml(init)
    }

    /// Load a configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: AdapterConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Check field ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(name) = &self.device_name
            && name.trim().is_empty()
        {
            return Err(ConfigError::InvalidValue {
                field: "device_name",
                reason: "must not be blank".into(),
            });
        }
        Ok(())
    }
}
