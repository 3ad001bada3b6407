//! Integration tests for the load/unload entry points.

use portbridge_config::{AdapterConfig, DeviceKind};
use portbridge_core::{BackendDevice, DeviceConfig, DeviceError, MemoryGraph, PortFlow};
use portbridge_plugin::{Error, finalize, initialize, initialize_status, initialize_with};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

const VIRTUAL: &str = r#"device = "virtual""#;

/// Device whose open and close report fixed results.
struct FixedDevice {
    open_result: Result<(), DeviceError>,
    close_result: Result<(), DeviceError>,
    closes: Arc<AtomicUsize>,
}

impl BackendDevice for FixedDevice {
    fn name(&self) -> &str {
        "fixed"
    }

    fn open(&mut self) -> Result<(), DeviceError> {
        self.open_result.clone()
    }

    fn close(&mut self) -> Result<(), DeviceError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.close_result.clone()
    }

    fn is_open(&self) -> bool {
        false
    }

    fn process(&mut self, _capture: &mut [&mut [f32]], _playback: &[&[f32]]) {}
}

fn fixed(
    open_result: Result<(), DeviceError>,
    close_result: Result<(), DeviceError>,
) -> (
    impl FnOnce(&AdapterConfig, DeviceConfig) -> Box<dyn BackendDevice>,
    Arc<AtomicUsize>,
) {
    let closes = Arc::new(AtomicUsize::new(0));
    let counter = closes.clone();
    let factory = move |_: &AdapterConfig, _: DeviceConfig| -> Box<dyn BackendDevice> {
        Box::new(FixedDevice {
            open_result,
            close_result,
            closes: counter,
        })
    };
    (factory, closes)
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

#[test]
fn eight_physical_outputs_no_inputs() {
    let graph = Arc::new(MemoryGraph::new().with_physical_ports(8, 0));
    let handle = initialize(graph.clone(), VIRTUAL).unwrap();

    assert_eq!(handle.adapter().capture_channels(), 8);
    assert_eq!(handle.adapter().playback_channels(), 2);
    assert!(handle.adapter().is_open());

    let expected: Vec<String> = (1..=8)
        .map(|i| format!("capture_{i}"))
        .chain(["playback_1".to_string(), "playback_2".to_string()])
        .collect();
    assert_eq!(graph.port_names(), expected);

    for port in graph.ports() {
        let flow = if port.name.starts_with("capture_") {
            PortFlow::Output
        } else {
            PortFlow::Input
        };
        assert_eq!(port.flow, flow);
    }

    graph.close_client();
    finalize(Some(handle));
}

#[test]
fn no_physical_ports_gives_stereo() {
    let graph = Arc::new(MemoryGraph::new());
    let handle = initialize(graph.clone(), VIRTUAL).unwrap();

    assert_eq!(
        graph.port_names(),
        vec!["capture_1", "capture_2", "playback_1", "playback_2"]
    );
    graph.close_client();
    finalize(Some(handle));
}

#[test]
fn single_physical_port_still_gives_stereo() {
    let graph = Arc::new(MemoryGraph::new().with_physical_ports(1, 1));
    let handle = initialize(graph.clone(), VIRTUAL).unwrap();

    assert_eq!(handle.adapter().capture_channels(), 2);
    assert_eq!(handle.adapter().playback_channels(), 2);
    graph.close_client();
    finalize(Some(handle));
}

#[test]
fn floor_cannot_be_lowered_from_init_string() {
    let graph = Arc::new(MemoryGraph::new());
    let err = initialize(graph.clone(), "device = \"virtual\"\nmin_channels = 1").unwrap_err();

    assert!(matches!(err, Error::Config(_)));
    assert!(graph.ports().is_empty());
}

#[test]
fn invalid_init_string_fails_before_registration() {
    let graph = Arc::new(MemoryGraph::new());
    let err = initialize(graph.clone(), "device = \"fax\"").unwrap_err();

    assert!(matches!(err, Error::Config(_)));
    assert_ne!(err.status(), 0);
    assert!(graph.ports().is_empty());
}

#[test]
fn registration_failure_reports_status() {
    let graph = Arc::new(MemoryGraph::new().with_physical_ports(8, 0));
    graph.refuse_port("capture_3");

    let (status, handle) = initialize_status(graph.clone(), VIRTUAL);
    assert_ne!(status, 0);
    assert!(handle.is_none());
    assert!(graph.ports().is_empty());
}

#[test]
fn success_status_is_zero() {
    let graph = Arc::new(MemoryGraph::new());
    let (status, handle) = initialize_status(graph.clone(), VIRTUAL);
    assert_eq!(status, 0);
    assert!(handle.is_some());
    graph.close_client();
    finalize(handle);
}

#[test]
fn open_failure_unloads_adapter() {
    let graph = Arc::new(MemoryGraph::new().with_physical_ports(2, 2));
    let (factory, closes) = fixed(Err(DeviceError::Status(5)), Ok(()));

    let err = initialize_with(graph.clone(), &AdapterConfig::default(), factory).unwrap_err();

    assert!(matches!(err, Error::Open(DeviceError::Status(5))));
    assert_eq!(err.status(), 5);
    assert!(graph.ports().is_empty());
    assert_eq!(graph.unregister_log().len(), 4);
    assert_eq!(closes.load(Ordering::SeqCst), 0);
}

// ---------------------------------------------------------------------------
// Run and unload
// ---------------------------------------------------------------------------

#[test]
fn blocks_flow_through_loaded_adapter() {
    let graph = Arc::new(MemoryGraph::new().with_buffer_size(4));
    let mut handle = initialize(graph.clone(), VIRTUAL).unwrap();

    let left_out = [0.5f32, 0.25, 0.0, -0.25];
    let right_out = [1.0f32, 0.0, -1.0, 0.0];
    let mut left_in = [0.0f32; 4];
    let mut right_in = [0.0f32; 4];
    assert!(handle.process(
        &mut [&mut left_in[..], &mut right_in[..]],
        &[&left_out[..], &right_out[..]],
    ));

    assert_eq!(left_in, left_out);
    assert_eq!(right_in, right_out);
    graph.close_client();
    finalize(Some(handle));
}

#[test]
fn mismatched_block_is_silenced() {
    let graph = Arc::new(MemoryGraph::new().with_buffer_size(4));
    let mut handle = initialize(graph.clone(), VIRTUAL).unwrap();

    let out = [0.5f32; 4];
    let mut a = [1.0f32; 4];
    let mut b = [1.0f32; 4];
    let mut c = [1.0f32; 4];
    assert!(!handle.process(
        &mut [&mut a[..], &mut b[..], &mut c[..]],
        &[&out[..], &out[..]],
    ));
    assert_eq!(a, [0.0; 4]);
    assert_eq!(b, [0.0; 4]);
    assert_eq!(c, [0.0; 4]);

    graph.close_client();
    finalize(Some(handle));
}

#[test]
fn close_failure_does_not_stop_teardown() {
    let graph = Arc::new(MemoryGraph::new());
    let (factory, closes) = fixed(Ok(()), Err(DeviceError::Backend("hung".into())));
    let config = AdapterConfig::default().with_device(DeviceKind::Virtual);

    let handle = initialize_with(graph.clone(), &config, factory).unwrap();
    graph.close_client();
    finalize(Some(handle));

    assert_eq!(closes.load(Ordering::SeqCst), 1);
}

#[test]
fn finalize_without_handle_does_nothing() {
    finalize(None);
}
