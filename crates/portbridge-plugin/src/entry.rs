//! Load and unload entry points.
//!
//! The host calls [`initialize`] once when it loads the adapter and
//! [`finalize`] once when it unloads it. All state lives in the returned
//! [`AdapterHandle`]; nothing is kept in process-wide storage.

use crate::{Error, Result};
use portbridge_config::{AdapterConfig, DeviceKind};
use portbridge_core::{BackendDevice, DeviceConfig, IoAdapter, PortFlow, PortGraph};
use portbridge_io::{CpalDevice, VirtualDevice};
use std::sync::Arc;

/// Fewest channels the adapter registers in each direction.
pub const STEREO_FLOOR: usize = 2;

/// Channel counts derived from the host's physical ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelCounts {
    /// Capture channels: one per physical output port, floored.
    pub capture: usize,
    /// Playback channels: one per physical input port, floored.
    pub playback: usize,
}

/// Size the adapter from the host's physical port counts.
///
/// Physical *output* ports are capture sources, physical *input* ports are
/// playback sinks. Each count is raised to [`STEREO_FLOOR`] when lower.
pub fn derive_channels(graph: &dyn PortGraph) -> ChannelCounts {
    let outputs = graph.physical_ports(PortFlow::Output).len();
    let inputs = graph.physical_ports(PortFlow::Input).len();
    ChannelCounts {
        capture: outputs.max(STEREO_FLOOR),
        playback: inputs.max(STEREO_FLOOR),
    }
}

/// Construct the device variant named by `config`.
pub fn select_device(config: &AdapterConfig, device: DeviceConfig) -> Box<dyn BackendDevice> {
    match config.device {
        DeviceKind::Hardware => Box::new(CpalDevice::new(device, config.device_name.clone())),
        DeviceKind::Virtual => Box::new(VirtualDevice::new(device)),
    }
}

/// A loaded adapter, owned by the host between [`initialize`] and [`finalize`].
#[derive(Debug)]
pub struct AdapterHandle {
    adapter: IoAdapter,
}

impl AdapterHandle {
    /// The running adapter.
    pub fn adapter(&self) -> &IoAdapter {
        &self.adapter
    }

    /// Forward one host block to the adapter's device.
    ///
    /// Returns `false`, with the capture buffers silenced, when the block
    /// does not match the adapter's port counts.
    pub fn process(&mut self, capture: &mut [&mut [f32]], playback: &[&[f32]]) -> bool {
        self.adapter.process(capture, playback)
    }
}

/// Load the adapter into `graph`, reading configuration from the host's
/// init string (blank for defaults, TOML otherwise).
pub fn initialize(graph: Arc<dyn PortGraph>, init: &str) -> Result<AdapterHandle> {
    let config = AdapterConfig::parse(init)?;
    initialize_with(graph, &config, select_device)
}

/// Load the adapter with an already parsed configuration and a device
/// constructor.
///
/// Derives channel counts, builds the device with those counts and the
/// host's buffer size and sample rate, registers ports, and opens the
/// device. If opening fails the adapter's ports are released, the adapter
/// is destroyed, and the device error is returned.
pub fn initialize_with<F>(
    graph: Arc<dyn PortGraph>,
    config: &AdapterConfig,
    make_device: F,
) -> Result<AdapterHandle>
where
    F: FnOnce(&AdapterConfig, DeviceConfig) -> Box<dyn BackendDevice>,
{
    tracing::info!(device = %config.device, "loading audio adapter");

    let channels = derive_channels(graph.as_ref());
    let device_config = DeviceConfig {
        capture_channels: channels.capture,
        playback_channels: channels.playback,
        buffer_size: graph.buffer_size(),
        sample_rate: graph.sample_rate(),
    };
    tracing::debug!(
        capture = channels.capture,
        playback = channels.playback,
        buffer_size = device_config.buffer_size,
        sample_rate = device_config.sample_rate,
        "adapter sized from host"
    );

    let device = make_device(config, device_config);
    let mut adapter = IoAdapter::new(graph, device, channels.capture, channels.playback)?;

    if let Err(e) = adapter.open() {
        tracing::warn!(error = %e, "device failed to open, unloading adapter");
        adapter.release_ports();
        return Err(Error::Open(e));
    }

    Ok(AdapterHandle { adapter })
}

/// [`initialize`] for hosts that expect an integer status.
///
/// Returns `0` with the handle on success, a nonzero status and no handle on
/// failure.
pub fn initialize_status(graph: Arc<dyn PortGraph>, init: &str) -> (i32, Option<AdapterHandle>) {
    match initialize(graph, init) {
        Ok(handle) => (0, Some(handle)),
        Err(e) => {
            tracing::error!(error = %e, "audio adapter failed to load");
            (e.status(), None)
        }
    }
}

/// Unload an adapter: close its device, then destroy it.
///
/// `None` is a no-op. A close failure is logged and teardown continues.
/// The host is expected to have unregistered the adapter's ports already.
pub fn finalize(handle: Option<AdapterHandle>) {
    let Some(AdapterHandle { mut adapter }) = handle else {
        return;
    };

    tracing::info!(device = adapter.device_name(), "unloading audio adapter");
    if let Err(e) = adapter.close() {
        tracing::warn!(error = %e, "device failed to close");
    }
}
