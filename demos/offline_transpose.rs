//! # Offline Transpose
//!
//! Drives the bridge block by block with the in-process dummy client and
//! transposes every note up an octave on the way through.
//!
//! **Concepts:** `Dummy` client, blocking input, next-block output
//!
//! ```bash
//! RUST_LOG=debug cargo run --example offline_transpose
//! ```

use midibridge::prelude::*;
use tracing_subscriber::EnvFilter;

const FRAMES: u32 = 256;

fn transpose(ev: MidiEvent, semitones: u8) -> MidiEvent {
    let kind = match ev.kind {
        EventKind::NoteOn { note, velocity } => EventKind::NoteOn {
            note: note.saturating_add(semitones).min(127),
            velocity,
        },
        EventKind::NoteOff { note, velocity } => EventKind::NoteOff {
            note: note.saturating_add(semitones).min(127),
            velocity,
        },
        other => other,
    };
    MidiEvent { kind, ..ev }
}

fn main() -> midibridge::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let options = DummyOptions::new();
    let device = options.handle();
    let mut bridge = RealtimeBridge::<Dummy>::builder()
        .client_name("transpose")
        .input_port("in")
        .output_port("out")
        .build(options)?;

    // C major arpeggio with a sustain pedal in the middle
    let input: [&[u8]; 5] = [
        &[0x90, 60, 100],
        &[0x90, 64, 100],
        &[0xB0, 64, 127],
        &[0x90, 67, 100],
        &[0x80, 60, 0],
    ];

    for (block, bytes) in input.iter().enumerate() {
        device.push_input_at(0, block as u32 * 16, bytes);
        device.run_block(FRAMES);

        let ev = bridge.input_event();
        println!("in:  {}", ev);
        bridge.output_event(transpose(ev, 12));

        device.run_block(FRAMES);
        for bytes in device.output_bytes(0) {
            println!("out: {:02X?}", bytes);
        }
    }

    println!("{:?}", bridge.stats());
    Ok(())
}
