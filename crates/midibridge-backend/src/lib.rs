//! Realtime MIDI bridge between an audio-device callback and an application
//! thread.
//!
//! - [`RealtimeBridge`]: application side. Blocking input, non-blocking output.
//! - [`Processor`]: realtime side, run by the device client once per block.
//! - [`DeviceClient`]: the device server boundary. [`Dummy`] runs in process;
//!   `Jack` (feature `jack`) talks to a JACK server.
//!
//! # Example
//!
//! ```ignore
//! use midibridge_backend::{Dummy, DummyOptions, RealtimeBridge};
//!
//! let options = DummyOptions::new();
//! let device = options.handle();
//! let mut bridge = RealtimeBridge::<Dummy>::builder()
//!     .client_name("thru")
//!     .input_port("in")
//!     .output_port("out")
//!     .build(options)?;
//!
//! device.push_input(0, &[0x90, 60, 100]);
//! device.run_block(64);
//! let ev = bridge.input_event();
//! bridge.output_event(ev);
//! device.run_block(64);
//! assert_eq!(device.output_bytes(0), vec![vec![0x90, 60, 100]]);
//! ```

pub mod error;
pub use error::{Error, Result};

mod bridge;
mod client;
mod dummy;
#[cfg(feature = "jack")]
mod jack;
mod processor;

pub use bridge::{BridgeBuilder, BridgeState, BridgeStats, RealtimeBridge};
pub use client::{BlockScope, ClientError, DeviceClient, PortDirection, RawMidi};
pub use dummy::{BufferedEvent, Dummy, DummyHandle, DummyOptions};
pub use processor::Processor;

#[cfg(feature = "jack")]
pub use self::jack::{Jack, JackOptions};

pub use midibridge_core::{BridgeConfig, EventKind, MidiEvent};
