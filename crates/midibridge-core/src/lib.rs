//! Realtime-safe MIDI primitives for the midibridge engine.
//!
//! Everything here is usable from an audio callback: no locks on the
//! realtime side, no allocation after construction, no blocking.
//!
//! - **Event**: [`MidiEvent`], a `Copy` structured message
//! - **Codec**: wire bytes to events and back ([`codec`])
//! - **Queue**: bounded SPSC ring buffer with drop-newest overflow
//! - **Wake signal**: lets a reader sleep until the realtime side produces
//! - **Config**: [`BridgeConfig`] with validation
//!
//! # Example
//!
//! ```ignore
//! use midibridge_core::{codec, event_queue_with_capacity, MidiEvent};
//!
//! let (mut tx, mut rx) = event_queue_with_capacity(256);
//! tx.write(codec::decode_bytes(&[0x90, 60, 100], 0));
//!
//! let ev = rx.read().unwrap();
//! assert_eq!(codec::encode(&ev).as_bytes(), &[0x90, 60, 100]);
//! ```

pub mod error;
pub use error::{Error, Result};

pub use config::BridgeConfig;
pub use event::{EventKind, MidiEvent, PITCH_BEND_MAX, PITCH_BEND_MIN};
pub use queue::{
    event_queue, event_queue_with_capacity, EventConsumer, EventProducer, DEFAULT_QUEUE_CAPACITY,
};
pub use wake::{WakeSignal, DEFAULT_WAKE_POLL_INTERVAL};

pub mod codec;
pub mod config;
pub(crate) mod event;
pub mod queue;
pub(crate) mod wake;
