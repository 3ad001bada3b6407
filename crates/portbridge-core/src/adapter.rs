//! The adapter: one backend device bound to one registered port set.

use crate::Result;
use crate::device::{BackendDevice, DeviceError};
use crate::graph::PortGraph;
use crate::ports::{PortSet, register_all, release_all};
use std::sync::Arc;

/// Binds a [`BackendDevice`] to the capture and playback ports it serves.
///
/// Construction registers all ports or fails with none registered, so an
/// `IoAdapter` value always has its device and full port sets.
///
/// ## Teardown contract
///
/// Dropping the adapter drops the device but never unregisters ports. The
/// host is expected to have removed this client's ports already (hosts do
/// so as part of client shutdown, before the adapter is destroyed). Callers
/// that own teardown themselves use [`release_ports`](Self::release_ports)
/// first. Ports still registered at drop time are reported with a warning.
pub struct IoAdapter {
    graph: Arc<dyn PortGraph>,
    device: Box<dyn BackendDevice>,
    capture: PortSet,
    playback: PortSet,
}

impl IoAdapter {
    /// Take ownership of `device` and register `capture_channels` capture
    /// and `playback_channels` playback ports with `graph`.
    pub fn new(
        graph: Arc<dyn PortGraph>,
        device: Box<dyn BackendDevice>,
        capture_channels: usize,
        playback_channels: usize,
    ) -> Result<Self> {
        let (capture, playback) =
            register_all(graph.as_ref(), capture_channels, playback_channels)?;
        tracing::info!(
            device = device.name(),
            capture = capture_channels,
            playback = playback_channels,
            "adapter ports registered"
        );
        Ok(Self {
            graph,
            device,
            capture,
            playback,
        })
    }

    /// Open the device. Returns exactly what the device reports.
    pub fn open(&mut self) -> std::result::Result<(), DeviceError> {
        self.device.open()
    }

    /// Close the device. Returns exactly what the device reports.
    pub fn close(&mut self) -> std::result::Result<(), DeviceError> {
        self.device.close()
    }

    /// Forward one host block to the device.
    ///
    /// `capture` must hold one buffer per capture port and `playback` one per
    /// playback port, in channel order, all of the same length. A block of
    /// any other shape never reaches the device: the capture buffers are
    /// silenced and `false` is returned.
    pub fn process(&mut self, capture: &mut [&mut [f32]], playback: &[&[f32]]) -> bool {
        if !self.block_fits(capture, playback) {
            for buffer in capture.iter_mut() {
                buffer.fill(0.0);
            }
            return false;
        }
        self.device.process(capture, playback);
        true
    }

    fn block_fits(&self, capture: &[&mut [f32]], playback: &[&[f32]]) -> bool {
        if capture.len() != self.capture.len() || playback.len() != self.playback.len() {
            return false;
        }
        let mut lengths = capture
            .iter()
            .map(|b| b.len())
            .chain(playback.iter().map(|b| b.len()));
        match lengths.next() {
            Some(frames) => lengths.all(|len| len == frames),
            None => true,
        }
    }

    /// Unregister every port still held by this adapter.
    ///
    /// Returns the number of ports unregistered. Calling it again is a no-op.
    pub fn release_ports(&mut self) -> usize {
        release_all(self.graph.as_ref(), &mut self.capture, &mut self.playback)
    }

    /// Capture port set.
    pub fn capture_ports(&self) -> &PortSet {
        &self.capture
    }

    /// Playback port set.
    pub fn playback_ports(&self) -> &PortSet {
        &self.playback
    }

    /// Number of capture channels.
    pub fn capture_channels(&self) -> usize {
        self.capture.len()
    }

    /// Number of playback channels.
    pub fn playback_channels(&self) -> usize {
        self.playback.len()
    }

    /// Name of the owned device variant.
    pub fn device_name(&self) -> &str {
        self.device.name()
    }

    /// Whether the owned device is open.
    pub fn is_open(&self) -> bool {
        self.device.is_open()
    }
}

impl std::fmt::Debug for IoAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IoAdapter")
            .field("device", &self.device.name())
            .field("capture", &self.capture)
            .field("playback", &self.playback)
            .finish_non_exhaustive()
    }
}

impl Drop for IoAdapter {
    fn drop(&mut self) {
        self.capture.prune(self.graph.as_ref());
        self.playback.prune(self.graph.as_ref());
        let still_registered = self.capture.ids().count() + self.playback.ids().count();
        if still_registered > 0 {
            tracing::warn!(
                still_registered,
                "adapter destroyed before the host released its ports"
            );
        }
    }
}
