//! Backend device contract.
//!
//! A backend device is whatever actually moves samples: a sound card driven
//! through the platform audio API, a software device, or a network transport.
//! The adapter only sees the [`BackendDevice`] trait, takes ownership of one
//! boxed instance, and never inspects which variant it holds.
//!
//! ## Object safety
//!
//! The trait is object-safe so the concrete variant can be chosen at startup
//! and injected as `Box<dyn BackendDevice>`.

/// Parameters every backend device is constructed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceConfig {
    /// Channels captured by the device and delivered to capture ports.
    pub capture_channels: usize,
    /// Channels taken from playback ports and played by the device.
    pub playback_channels: usize,
    /// Host block size in frames.
    pub buffer_size: u32,
    /// Host sample rate in Hz.
    pub sample_rate: u32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            capture_channels: 2,
            playback_channels: 2,
            buffer_size: 512,
            sample_rate: 48000,
        }
    }
}

/// Failure reported by a backend device.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    /// Driver-level status code. Never zero.
    #[error("device returned status {0}")]
    Status(i32),

    /// No device is available on the system.
    #[error("no audio device available")]
    NoDevice,

    /// The requested device does not exist.
    #[error("device not found: {0}")]
    NotFound(String),

    /// The device cannot run with the requested configuration.
    #[error("unsupported configuration: {0}")]
    Unsupported(String),

    /// Backend-specific failure.
    #[error("backend error: {0}")]
    Backend(String),
}

impl DeviceError {
    /// Integer status for host boundaries that only understand codes.
    pub fn status(&self) -> i32 {
        match self {
            DeviceError::Status(code) if *code != 0 => *code,
            _ => 1,
        }
    }
}

/// An audio input/output device behind the adapter.
///
/// `open` and `close` are called from the host's control thread and are
/// expected to return in bounded time. `process` is called from the host's
/// real-time callback once per block and must not block or allocate.
pub trait BackendDevice: Send {
    /// Short identifier of the device variant (e.g. `"cpal"`, `"virtual"`).
    fn name(&self) -> &str;

    /// Start the device.
    fn open(&mut self) -> Result<(), DeviceError>;

    /// Stop the device.
    fn close(&mut self) -> Result<(), DeviceError>;

    /// Whether the device is currently open.
    fn is_open(&self) -> bool;

    /// Exchange one host block.
    ///
    /// `capture` holds one buffer per capture port, to be filled with audio
    /// captured by the device. `playback` holds one buffer per playback port,
    /// to be played by the device. All buffers have the same frame count.
    fn process(&mut self, capture: &mut [&mut [f32]], playback: &[&[f32]]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_are_nonzero() {
        assert_eq!(DeviceError::Status(-3).status(), -3);
        assert_eq!(DeviceError::Status(0).status(), 1);
        assert_eq!(DeviceError::NoDevice.status(), 1);
        assert_eq!(DeviceError::Backend("x".into()).status(), 1);
    }

    #[test]
    fn default_config_is_stereo() {
        let config = DeviceConfig::default();
        assert_eq!(config.capture_channels, 2);
        assert_eq!(config.playback_channels, 2);
    }
}
