//! Host simulation options shared by every command.

use clap::Args;
use portbridge_core::MemoryGraph;

/// Shape of the simulated host graph.
#[derive(Args, Debug, Clone)]
pub struct HostArgs {
    /// Physical output (capture source) ports reported by the host
    #[arg(long, default_value = "2")]
    pub physical_outputs: usize,

    /// Physical input (playback sink) ports reported by the host
    #[arg(long, default_value = "2")]
    pub physical_inputs: usize,

    /// Host block size in frames
    #[arg(long, default_value = "512")]
    pub buffer_size: u32,

    /// Host sample rate in Hz
    #[arg(long, default_value = "48000")]
    pub sample_rate: u32,
}

impl HostArgs {
    /// Build the in-memory host graph.
    pub fn graph(&self) -> MemoryGraph {
        MemoryGraph::new()
            .with_physical_ports(self.physical_outputs, self.physical_inputs)
            .with_buffer_size(self.buffer_size)
            .with_sample_rate(self.sample_rate)
    }
}

/// Print the ports currently registered in `graph`.
pub fn print_ports(graph: &MemoryGraph) {
    let ports = graph.ports();
    println!("Registered ports ({}):", ports.len());
    for port in ports {
        println!("  {:<12} {:<6} {}", port.name, port.flow, port.id);
    }
}
