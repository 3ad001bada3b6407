//! Load, run and unload the adapter against a simulated host.

use super::common::{HostArgs, print_ports};
use clap::Args;
use portbridge_config::{AdapterConfig, DeviceKind};
use portbridge_plugin::{AdapterHandle, finalize, initialize_with, select_device};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

#[derive(Args)]
pub struct RunArgs {
    #[command(flatten)]
    host: HostArgs,

    /// Adapter configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Backend device: hardware or virtual (overrides the config file)
    #[arg(long)]
    device: Option<DeviceKind>,

    /// Hardware device name filter (overrides the config file)
    #[arg(long)]
    device_name: Option<String>,

    /// Seconds of host blocks to run; 0 loads and unloads immediately
    #[arg(long, default_value = "0")]
    seconds: f64,
}

pub fn run(args: RunArgs) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => AdapterConfig::load(path)?,
        None => AdapterConfig::default(),
    };
    if let Some(kind) = args.device {
        config.device = kind;
    }
    if let Some(name) = args.device_name {
        config.device_name = Some(name);
    }
    config.validate()?;

    let graph = Arc::new(args.host.graph());
    let mut handle = initialize_with(graph.clone(), &config, select_device)?;

    let adapter = handle.adapter();
    println!(
        "Loaded {} adapter: {} capture, {} playback",
        adapter.device_name(),
        adapter.capture_channels(),
        adapter.playback_channels()
    );
    println!("  Sample rate: {} Hz", args.host.sample_rate);
    println!("  Buffer size: {} frames", args.host.buffer_size);
    print_ports(&graph);

    if args.seconds > 0.0 {
        drive_blocks(&mut handle, &args.host, args.seconds)?;
    }

    // the host drops the client's ports before unloading it
    graph.close_client();
    finalize(Some(handle));
    println!("Unloaded.");
    Ok(())
}

/// Call the adapter once per host block, paced in real time.
fn drive_blocks(handle: &mut AdapterHandle, host: &HostArgs, seconds: f64) -> anyhow::Result<()> {
    anyhow::ensure!(
        host.buffer_size > 0 && host.sample_rate > 0,
        "buffer size and sample rate must be positive"
    );

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        println!("\nStopping...");
        r.store(false, Ordering::SeqCst);
    })?;

    let frames = host.buffer_size as usize;
    let period = Duration::from_secs_f64(frames as f64 / host.sample_rate as f64);
    let total = (seconds / period.as_secs_f64()).ceil() as u64;

    let mut capture = vec![vec![0.0f32; frames]; handle.adapter().capture_channels()];
    let playback = vec![vec![0.0f32; frames]; handle.adapter().playback_channels()];
    let mut peak = 0.0f32;
    let mut blocks = 0u64;

    println!("\nRunning {total} blocks, press Ctrl+C to stop...");
    while running.load(Ordering::SeqCst) && blocks < total {
        let started = Instant::now();
        {
            let mut capture_refs: Vec<&mut [f32]> =
                capture.iter_mut().map(Vec::as_mut_slice).collect();
            let playback_refs: Vec<&[f32]> = playback.iter().map(Vec::as_slice).collect();
            handle.process(&mut capture_refs, &playback_refs);
        }
        peak = capture
            .iter()
            .flatten()
            .fold(peak, |p, &s| p.max(s.abs()));
        blocks += 1;

        if let Some(rest) = period.checked_sub(started.elapsed()) {
            std::thread::sleep(rest);
        }
    }

    println!(
        "Processed {} blocks ({} frames), capture peak {:.3}",
        blocks,
        blocks * frames as u64,
        peak
    );
    Ok(())
}
