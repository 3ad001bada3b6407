//! Software loopback device.
//!
//! [`VirtualDevice`] needs no hardware: whatever the host sends to playback
//! channel `n` comes back on capture channel `n` in the same block. Capture
//! channels without a matching playback channel are silent. It is the
//! backend for headless bring-up and for the test suites.

use portbridge_core::{BackendDevice, DeviceConfig, DeviceError};

/// Loopback device with no external I/O.
#[derive(Debug)]
pub struct VirtualDevice {
    config: DeviceConfig,
    open: bool,
    frames: u64,
}

impl VirtualDevice {
    /// Create a closed loopback device for `config`.
    pub fn new(config: DeviceConfig) -> Self {
        Self {
            config,
            open: false,
            frames: 0,
        }
    }

    /// Frames exchanged since the device was last opened.
    pub fn frames_processed(&self) -> u64 {
        self.frames
    }
}

impl BackendDevice for VirtualDevice {
    fn name(&self) -> &str {
        "virtual"
    }

    fn open(&mut self) -> Result<(), DeviceError> {
        if self.config.sample_rate == 0 {
            return Err(DeviceError::Unsupported("sample rate of 0 Hz".into()));
        }
        if self.config.buffer_size == 0 {
            return Err(DeviceError::Unsupported("buffer size of 0 frames".into()));
        }
        if !self.open {
            self.open = true;
            self.frames = 0;
            tracing::debug!(
                capture = self.config.capture_channels,
                playback = self.config.playback_channels,
                "virtual device opened"
            );
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), DeviceError> {
        if self.open {
            self.open = false;
            tracing::debug!(frames = self.frames, "virtual device closed");
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn process(&mut self, capture: &mut [&mut [f32]], playback: &[&[f32]]) {
        if !self.open {
            for buffer in capture.iter_mut() {
                buffer.fill(0.0);
            }
            return;
        }

        for (index, buffer) in capture.iter_mut().enumerate() {
            match playback.get(index) {
                Some(source) => {
                    let n = buffer.len().min(source.len());
                    buffer[..n].copy_from_slice(&source[..n]);
                    buffer[n..].fill(0.0);
                }
                None => buffer.fill(0.0),
            }
        }
        let frames = capture
            .first()
            .map(|b| b.len())
            .or_else(|| playback.first().map(|b| b.len()))
            .unwrap_or(0);
        self.frames += frames as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(capture: usize, playback: usize) -> DeviceConfig {
        DeviceConfig {
            capture_channels: capture,
            playback_channels: playback,
            ..DeviceConfig::default()
        }
    }

    #[test]
    fn loops_playback_into_capture() {
        let mut device = VirtualDevice::new(config(3, 2));
        device.open().unwrap();

        let a = [0.1f32, 0.2];
        let b = [0.3f32, 0.4];
        let mut c0 = [9.0f32; 2];
        let mut c1 = [9.0f32; 2];
        let mut c2 = [9.0f32; 2];
        device.process(&mut [&mut c0[..], &mut c1[..], &mut c2[..]], &[&a[..], &b[..]]);

        assert_eq!(c0, a);
        assert_eq!(c1, b);
        assert_eq!(c2, [0.0; 2]);
        assert_eq!(device.frames_processed(), 2);
    }

    #[test]
    fn closed_device_is_silent() {
        let mut device = VirtualDevice::new(config(1, 1));
        let a = [1.0f32; 4];
        let mut c = [9.0f32; 4];
        device.process(&mut [&mut c[..]], &[&a[..]]);
        assert_eq!(c, [0.0; 4]);
        assert_eq!(device.frames_processed(), 0);
    }

    #[test]
    fn open_close_cycle() {
        let mut device = VirtualDevice::new(config(2, 2));
        assert!(!device.is_open());
        device.open().unwrap();
        device.open().unwrap();
        assert!(device.is_open());
        device.close().unwrap();
        device.close().unwrap();
        assert!(!device.is_open());
    }

    #[test]
    fn zero_sample_rate_rejected() {
        let mut device = VirtualDevice::new(DeviceConfig {
            sample_rate: 0,
            ..DeviceConfig::default()
        });
        assert!(matches!(device.open(), Err(DeviceError::Unsupported(_))));
        assert!(!device.is_open());
    }

    #[test]
    fn zero_buffer_size_rejected() {
        let mut device = VirtualDevice::new(DeviceConfig {
            buffer_size: 0,
            ..DeviceConfig::default()
        });
        assert!(device.open().is_err());
    }
}
