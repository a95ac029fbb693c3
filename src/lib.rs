//! # midibridge - Realtime MIDI Bridge
//!
//! Moves MIDI events between an audio-device callback and an ordinary
//! application thread without locking or allocating on the realtime side.
//!
//! ## Architecture
//!
//! midibridge is an umbrella crate over:
//! - **midibridge-core** - Event type, wire codec, SPSC event queue, wake signal, config
//! - **midibridge-backend** - Device client boundary, per-block processor, bridge, backends
//!
//! ## Quick Start
//!
//! ```ignore
//! use midibridge::prelude::*;
//!
//! let mut bridge = RealtimeBridge::<Jack>::builder()
//!     .client_name("thru")
//!     .input_port("in")
//!     .output_port("out")
//!     .build(JackOptions::NO_START_SERVER)?;
//!
//! loop {
//!     let ev = bridge.input_event();
//!     bridge.output_event(ev.with_port(0));
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `default` - Bridge, codec and the in-process dummy client
//! - `jack` - JACK device client

/// Re-export of midibridge-core for direct access
pub use midibridge_core as core;

/// Wire codec: bytes to events and back.
pub use midibridge_core::codec;

// Core types
pub use midibridge_core::{
    // Queue
    event_queue,
    event_queue_with_capacity,
    // Config
    BridgeConfig,
    EventConsumer,
    // Events
    EventKind,
    EventProducer,
    MidiEvent,
    // Wake
    WakeSignal,
    DEFAULT_QUEUE_CAPACITY,
    DEFAULT_WAKE_POLL_INTERVAL,
    PITCH_BEND_MAX,
    PITCH_BEND_MIN,
};

// Bridge and device clients
pub use midibridge_backend::{
    BlockScope, BridgeBuilder, BridgeState, BridgeStats, BufferedEvent, ClientError,
    DeviceClient, Dummy, DummyHandle, DummyOptions, PortDirection, Processor, RawMidi,
    RealtimeBridge,
};

#[cfg(feature = "jack")]
pub use midibridge_backend::{Jack, JackOptions};

pub mod error;
pub use error::{Error, Result};

/// Convenience prelude for common imports
pub mod prelude {
    // Bridge
    pub use crate::{BridgeBuilder, BridgeConfig, BridgeStats, RealtimeBridge};

    // Events
    pub use crate::{EventKind, MidiEvent};

    // Device clients
    pub use crate::{DeviceClient, Dummy, DummyOptions};

    #[cfg(feature = "jack")]
    pub use crate::{Jack, JackOptions};
}
