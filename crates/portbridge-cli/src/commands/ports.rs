//! Port registration dry run.

use super::common::{HostArgs, print_ports};
use clap::Args;
use portbridge_core::{register_all, release_all};
use portbridge_plugin::derive_channels;

#[derive(Args)]
pub struct PortsArgs {
    #[command(flatten)]
    host: HostArgs,
}

pub fn run(args: PortsArgs) -> anyhow::Result<()> {
    let graph = args.host.graph();
    let counts = derive_channels(&graph);
    println!(
        "Host reports {} physical output(s), {} physical input(s)",
        args.host.physical_outputs, args.host.physical_inputs
    );
    println!(
        "Adapter channels: {} capture, {} playback\n",
        counts.capture, counts.playback
    );

    let (mut capture, mut playback) = register_all(&graph, counts.capture, counts.playback)?;
    print_ports(&graph);
    release_all(&graph, &mut capture, &mut playback);
    Ok(())
}
