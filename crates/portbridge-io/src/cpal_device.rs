//! Hardware backend device on top of cpal.
//!
//! [`CpalDevice`] drives the platform's sound card through
//! [cpal](https://crates.io/crates/cpal): ALSA on Linux, CoreAudio on macOS,
//! WASAPI on Windows. The platform is picked by cpal's default host, so one
//! type covers every hardware target.
//!
//! ## Data path
//!
//! ```text
//!  cpal input callback ──push──▶ [capture ring] ──pop──▶ process() ─▶ capture ports
//!  playback ports ─▶ process() ──push──▶ [playback ring] ──pop──▶ cpal output callback
//! ```
//!
//! Both rings carry interleaved f32 frames. Overflow drops samples, underflow
//! yields silence; no resampling is done, so the hardware must run at the
//! host's sample rate.

use crate::interleave::{deinterleave, interleave};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use portbridge_core::{BackendDevice, DeviceConfig, DeviceError};
use ringbuf::HeapRb;
use ringbuf::traits::{Consumer, Producer, Split};

/// Host blocks of headroom held by each ring buffer.
const RING_BLOCKS: usize = 4;

/// Extract device name via `description()` (cpal 0.17+).
fn device_name(device: &cpal::Device) -> Result<String, cpal::DeviceNameError> {
    device.description().map(|d| d.name().to_string())
}

fn stream_error(e: cpal::BuildStreamError) -> DeviceError {
    match e {
        cpal::BuildStreamError::DeviceNotAvailable => DeviceError::NoDevice,
        cpal::BuildStreamError::StreamConfigNotSupported => {
            DeviceError::Unsupported("stream configuration rejected by device".into())
        }
        other => DeviceError::Backend(other.to_string()),
    }
}

/// Running streams and the rings that bridge them to the host block.
struct Streams {
    _input: Option<cpal::Stream>,
    _output: Option<cpal::Stream>,
    captured: ringbuf::HeapCons<f32>,
    to_play: ringbuf::HeapProd<f32>,
    scratch: Vec<f32>,
}

impl Streams {
    fn read_capture(&mut self, capture: &mut [&mut [f32]]) {
        let channels = capture.len();
        let frames = capture.first().map_or(0, |b| b.len());
        if channels == 0 {
            return;
        }

        let chunk = (self.scratch.len() / channels).max(1);
        let mut offset = 0;
        while offset < frames {
            let n = chunk.min(frames - offset);
            let block = &mut self.scratch[..n * channels];
            let popped = self.captured.pop_slice(block);
            block[popped..].fill(0.0);
            deinterleave(block, capture, offset);
            offset += n;
        }
    }

    fn write_playback(&mut self, playback: &[&[f32]]) {
        let channels = playback.len();
        let frames = playback.first().map_or(0, |b| b.len());
        if channels == 0 {
            return;
        }

        let chunk = (self.scratch.len() / channels).max(1);
        let mut offset = 0;
        while offset < frames {
            let n = chunk.min(frames - offset);
            let block = &mut self.scratch[..n * channels];
            interleave(playback, offset, block);
            self.to_play.push_slice(block);
            offset += n;
        }
    }
}

/// Sound card device driven by cpal's default host.
pub struct CpalDevice {
    host: cpal::Host,
    config: DeviceConfig,
    device_name: Option<String>,
    streams: Option<Streams>,
}

impl CpalDevice {
    /// Create a device for `config` on the platform's default audio host.
    ///
    /// `device_name` filters devices by case-insensitive substring; the
    /// system default devices are used when it is `None`. Nothing is opened
    /// until [`BackendDevice::open`].
    pub fn new(config: DeviceConfig, device_name: Option<String>) -> Self {
        let host = cpal::default_host();
        tracing::info!(host = host.id().name(), "cpal device created");
        Self {
            host,
            config,
            device_name,
            streams: None,
        }
    }

    fn find_input_device(&self) -> Result<cpal::Device, DeviceError> {
        match self.device_name.as_deref() {
            Some(search) => {
                let search_lower = search.to_lowercase();
                let devices = self
                    .host
                    .input_devices()
                    .map_err(|e| DeviceError::Backend(e.to_string()))?;

                for device in devices {
                    if let Ok(name) = device_name(&device)
                        && name.to_lowercase().contains(&search_lower)
                    {
                        return Ok(device);
                    }
                }
                Err(DeviceError::NotFound(format!(
                    "no input device matching '{}'",
                    search
                )))
            }
            None => self.host.default_input_device().ok_or(DeviceError::NoDevice),
        }
    }

    fn find_output_device(&self) -> Result<cpal::Device, DeviceError> {
        match self.device_name.as_deref() {
            Some(search) => {
                let search_lower = search.to_lowercase();
                let devices = self
                    .host
                    .output_devices()
                    .map_err(|e| DeviceError::Backend(e.to_string()))?;

                for device in devices {
                    if let Ok(name) = device_name(&device)
                        && name.to_lowercase().contains(&search_lower)
                    {
                        return Ok(device);
                    }
                }
                Err(DeviceError::NotFound(format!(
                    "no output device matching '{}'",
                    search
                )))
            }
            None => self.host.default_output_device().ok_or(DeviceError::NoDevice),
        }
    }

    fn stream_config(&self, channels: usize) -> Result<cpal::StreamConfig, DeviceError> {
        let channels = u16::try_from(channels)
            .map_err(|_| DeviceError::Unsupported(format!("{channels} channels")))?;
        Ok(cpal::StreamConfig {
            channels,
            sample_rate: self.config.sample_rate,
            buffer_size: cpal::BufferSize::Fixed(self.config.buffer_size),
        })
    }

    fn build_input(
        &self,
        mut producer: ringbuf::HeapProd<f32>,
    ) -> Result<cpal::Stream, DeviceError> {
        let device = self.find_input_device()?;
        let stream_config = self.stream_config(self.config.capture_channels)?;

        let stream = device
            .build_input_stream(
                &stream_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    producer.push_slice(data);
                },
                |err| tracing::error!(error = %err, "capture stream error"),
                None,
            )
            .map_err(stream_error)?;

        stream
            .play()
            .map_err(|e| DeviceError::Backend(e.to_string()))?;
        tracing::info!(
            channels = self.config.capture_channels,
            sample_rate = self.config.sample_rate,
            "capture stream started"
        );
        Ok(stream)
    }

    fn build_output(
        &self,
        mut consumer: ringbuf::HeapCons<f32>,
    ) -> Result<cpal::Stream, DeviceError> {
        let device = self.find_output_device()?;
        let stream_config = self.stream_config(self.config.playback_channels)?;

        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let popped = consumer.pop_slice(data);
                    data[popped..].fill(0.0);
                },
                |err| tracing::error!(error = %err, "playback stream error"),
                None,
            )
            .map_err(stream_error)?;

        stream
            .play()
            .map_err(|e| DeviceError::Backend(e.to_string()))?;
        tracing::info!(
            channels = self.config.playback_channels,
            sample_rate = self.config.sample_rate,
            "playback stream started"
        );
        Ok(stream)
    }
}

impl BackendDevice for CpalDevice {
    fn name(&self) -> &str {
        "cpal"
    }

    fn open(&mut self) -> Result<(), DeviceError> {
        if self.streams.is_some() {
            return Ok(());
        }

        let block = self.config.buffer_size.max(1) as usize;
        let capture_len = ring_capacity(block, self.config.capture_channels);
        let playback_len = ring_capacity(block, self.config.playback_channels);

        let (capture_prod, capture_cons) = HeapRb::<f32>::new(capture_len).split();
        let (playback_prod, playback_cons) = HeapRb::<f32>::new(playback_len).split();

        let input = if self.config.capture_channels > 0 {
            Some(self.build_input(capture_prod)?)
        } else {
            None
        };
        let output = if self.config.playback_channels > 0 {
            Some(self.build_output(playback_cons)?)
        } else {
            None
        };

        let widest = self
            .config
            .capture_channels
            .max(self.config.playback_channels)
            .max(1);
        self.streams = Some(Streams {
            _input: input,
            _output: output,
            captured: capture_cons,
            to_play: playback_prod,
            scratch: vec![0.0; block * widest],
        });
        Ok(())
    }

    fn close(&mut self) -> Result<(), DeviceError> {
        if self.streams.take().is_some() {
            tracing::info!("cpal streams stopped");
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.streams.is_some()
    }

    fn process(&mut self, capture: &mut [&mut [f32]], playback: &[&[f32]]) {
        match self.streams.as_mut() {
            Some(streams) => {
                streams.read_capture(capture);
                streams.write_playback(playback);
            }
            None => {
                for buffer in capture.iter_mut() {
                    buffer.fill(0.0);
                }
            }
        }
    }
}

/// Ring length in samples for `channels` interleaved channels.
fn ring_capacity(block_frames: usize, channels: usize) -> usize {
    (block_frames * channels.max(1) * RING_BLOCKS).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpal_device_name() {
        let device = CpalDevice::new(DeviceConfig::default(), None);
        assert_eq!(device.name(), "cpal");
        assert!(!device.is_open());
    }

    #[test]
    fn test_close_when_not_open() {
        let mut device = CpalDevice::new(DeviceConfig::default(), None);
        assert_eq!(device.close(), Ok(()));
    }

    #[test]
    fn test_process_when_closed_is_silent() {
        let mut device = CpalDevice::new(DeviceConfig::default(), None);
        let mut left = [1.0f32; 8];
        let mut right = [1.0f32; 8];
        let out = [0.5f32; 8];
        device.process(&mut [&mut left[..], &mut right[..]], &[&out[..], &out[..]]);
        assert_eq!(left, [0.0; 8]);
        assert_eq!(right, [0.0; 8]);
    }

    #[test]
    fn test_ring_capacity() {
        assert_eq!(ring_capacity(256, 2), 256 * 2 * RING_BLOCKS);
        assert_eq!(ring_capacity(256, 0), 256 * RING_BLOCKS);
    }

    #[test]
    fn test_streams_bridge_rings() {
        let (mut capture_prod, capture_cons) = HeapRb::<f32>::new(64).split();
        let (playback_prod, mut playback_cons) = HeapRb::<f32>::new(64).split();
        let mut streams = Streams {
            _input: None,
            _output: None,
            captured: capture_cons,
            to_play: playback_prod,
            scratch: vec![0.0; 4],
        };

        // three interleaved stereo frames available, four requested
        capture_prod.push_slice(&[1.0, -1.0, 2.0, -2.0, 3.0, -3.0]);
        let mut left = [9.0f32; 4];
        let mut right = [9.0f32; 4];
        streams.read_capture(&mut [&mut left[..], &mut right[..]]);
        assert_eq!(left, [1.0, 2.0, 3.0, 0.0]);
        assert_eq!(right, [-1.0, -2.0, -3.0, 0.0]);

        let a = [0.1f32, 0.2, 0.3];
        let b = [0.4f32, 0.5, 0.6];
        streams.write_playback(&[&a[..], &b[..]]);
        let mut out = [0.0f32; 6];
        assert_eq!(playback_cons.pop_slice(&mut out), 6);
        assert_eq!(out, [0.1, 0.4, 0.2, 0.5, 0.3, 0.6]);
    }
}
