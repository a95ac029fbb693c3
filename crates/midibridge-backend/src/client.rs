//! Device client boundary.
//!
//! A device client is the audio/MIDI server connection: it owns the ports,
//! runs the realtime thread and calls the bridge's [`Processor`] once per
//! audio block through a [`BlockScope`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::processor::Processor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortDirection {
    Input,
    Output,
}

impl std::fmt::Display for PortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortDirection::Input => f.write_str("input"),
            PortDirection::Output => f.write_str("output"),
        }
    }
}

/// Failure reported by a device client implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ClientError(pub String);

impl ClientError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// One raw event as captured in an input port's block buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawMidi<'a> {
    /// Frame offset inside the current block.
    pub time: u32,
    pub bytes: &'a [u8],
}

/// Per-block view of the client's port buffers, valid for one callback.
///
/// Port indices are per direction, in registration order.
pub trait BlockScope {
    /// Frames in this block.
    fn frames(&self) -> u32;

    /// Visit every event captured on input `port` this block, in time order.
    fn for_each_input(&mut self, port: usize, visit: &mut dyn FnMut(RawMidi<'_>));

    /// Empty output `port`'s buffer for this block.
    fn clear_output(&mut self, port: usize);

    /// Append a message to output `port` at frame `time`.
    ///
    /// Returns false if the buffer could not take it.
    fn write_output(&mut self, port: usize, time: u32, bytes: &[u8]) -> bool;
}

/// The opaque audio-device client library.
///
/// Implementations must call the processor from exactly one thread at a
/// time and must stop calling it once [`deactivate`](Self::deactivate)
/// returns.
pub trait DeviceClient: Send + Sized {
    /// Implementation-specific open parameters.
    type Options;

    /// Connect to the device server under `name`.
    fn open(name: &str, options: Self::Options) -> Result<Self, ClientError>;

    /// Register a port. Returns its index within `direction`, or `None` if
    /// the server refused it.
    fn register_port(&mut self, name: &str, direction: PortDirection) -> Option<usize>;

    /// Bind the realtime processor and start calling it every block.
    fn activate(&mut self, processor: Processor) -> Result<(), ClientError>;

    /// Stop the realtime callback. Must be a no-op when not active.
    fn deactivate(&mut self);

    /// Release the connection and all ports. Must be a no-op when closed.
    fn close(&mut self);
}
