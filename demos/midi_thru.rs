//! # MIDI Thru
//!
//! Opens a JACK client with two inputs and one output and forwards
//! everything it receives to the output, merging both inputs.
//!
//! **Concepts:** `jack` feature, blocking input loop, port remapping
//!
//! ```bash
//! RUST_LOG=info cargo run --example midi_thru --features jack
//! ```

use midibridge::prelude::*;
use tracing_subscriber::EnvFilter;

fn main() -> midibridge::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut bridge = RealtimeBridge::<Jack>::builder()
        .client_name("midibridge-thru")
        .input_port("in_1")
        .input_port("in_2")
        .output_port("out")
        .build(JackOptions::NO_START_SERVER)?;

    println!(
        "Forwarding {:?} -> {:?}. Connect ports with your JACK patchbay.",
        bridge.input_ports(),
        bridge.output_ports()
    );

    loop {
        let ev = bridge.input_event();
        tracing::info!("{}", ev);
        if !ev.is_none() && !bridge.output_event(ev.with_port(0)) {
            tracing::warn!("Output queue full, dropped {}", ev);
        }
    }
}
