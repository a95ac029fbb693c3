//! In-process device client with no server behind it.
//!
//! Blocks run only when [`DummyHandle::run_block`] is called, from whatever
//! thread calls it. Useful for tests, offline processing and for exercising
//! construction failures.

use std::sync::Arc;

use parking_lot::Mutex;
use smallvec::SmallVec;

use crate::client::{BlockScope, ClientError, DeviceClient, PortDirection, RawMidi};
use crate::processor::Processor;

/// A message in a dummy port buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferedEvent {
    pub time: u32,
    pub bytes: SmallVec<[u8; 3]>,
}

#[derive(Default)]
struct DummyState {
    client_name: Option<String>,
    input_names: Vec<String>,
    output_names: Vec<String>,
    pending_inputs: Vec<Vec<BufferedEvent>>,
    outputs: Vec<Vec<BufferedEvent>>,
    processor: Option<Processor>,
    closed: bool,
    blocks: u64,
}

/// Open options for [`Dummy`]. Clone a [`DummyHandle`] out of it before
/// handing it to the bridge.
#[derive(Clone, Default)]
pub struct DummyOptions {
    state: Arc<Mutex<DummyState>>,
    fail_open: bool,
    fail_port: Option<String>,
    fail_activate: bool,
}

impl DummyOptions {
    /// Options for a client that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for driving blocks and inspecting buffers.
    pub fn handle(&self) -> DummyHandle {
        DummyHandle {
            state: Arc::clone(&self.state),
        }
    }

    /// Refuse the connection.
    pub fn fail_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    /// Refuse to register the port called `name`.
    pub fn fail_port(mut self, name: impl Into<String>) -> Self {
        self.fail_port = Some(name.into());
        self
    }

    /// Refuse activation.
    pub fn fail_activate(mut self) -> Self {
        self.fail_activate = true;
        self
    }
}

/// The dummy device client.
pub struct Dummy {
    state: Arc<Mutex<DummyState>>,
    fail_port: Option<String>,
    fail_activate: bool,
}

impl DeviceClient for Dummy {
    type Options = DummyOptions;

    fn open(name: &str, options: DummyOptions) -> Result<Self, ClientError> {
        if options.fail_open {
            return Err(ClientError::new("dummy server refused the connection"));
        }
        options.state.lock().client_name = Some(name.to_owned());
        Ok(Self {
            state: options.state,
            fail_port: options.fail_port,
            fail_activate: options.fail_activate,
        })
    }

    fn register_port(&mut self, name: &str, direction: PortDirection) -> Option<usize> {
        if self.fail_port.as_deref() == Some(name) {
            return None;
        }
        let mut state = self.state.lock();
        match direction {
            PortDirection::Input => {
                state.input_names.push(name.to_owned());
                state.pending_inputs.push(Vec::new());
                Some(state.input_names.len() - 1)
            }
            PortDirection::Output => {
                state.output_names.push(name.to_owned());
                state.outputs.push(Vec::new());
                Some(state.output_names.len() - 1)
            }
        }
    }

    fn activate(&mut self, processor: Processor) -> Result<(), ClientError> {
        if self.fail_activate {
            return Err(ClientError::new("dummy server refused activation"));
        }
        self.state.lock().processor = Some(processor);
        Ok(())
    }

    fn deactivate(&mut self) {
        self.state.lock().processor = None;
    }

    fn close(&mut self) {
        let mut state = self.state.lock();
        state.processor = None;
        state.closed = true;
    }
}

/// Test-side view of a [`Dummy`] client.
#[derive(Clone)]
pub struct DummyHandle {
    state: Arc<Mutex<DummyState>>,
}

impl DummyHandle {
    /// Queue a message on input `port` for the next block, at frame 0.
    pub fn push_input(&self, port: usize, bytes: &[u8]) -> bool {
        self.push_input_at(port, 0, bytes)
    }

    /// Queue a message on input `port` for the next block at frame `time`.
    ///
    /// Messages are kept sorted by time; equal times keep push order.
    /// Returns false if the port does not exist.
    pub fn push_input_at(&self, port: usize, time: u32, bytes: &[u8]) -> bool {
        let mut state = self.state.lock();
        let Some(queue) = state.pending_inputs.get_mut(port) else {
            return false;
        };
        let pos = queue.partition_point(|e| e.time <= time);
        queue.insert(
            pos,
            BufferedEvent {
                time,
                bytes: SmallVec::from_slice(bytes),
            },
        );
        true
    }

    /// Run one block of `frames` frames. Returns false if the client is not
    /// active, in which case pending input stays queued.
    pub fn run_block(&self, frames: u32) -> bool {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let Some(processor) = state.processor.as_mut() else {
            return false;
        };

        let mut scope = DummyScope {
            frames,
            inputs: &state.pending_inputs,
            outputs: &mut state.outputs,
        };
        processor.process(&mut scope);

        for pending in &mut state.pending_inputs {
            pending.clear();
        }
        state.blocks += 1;
        true
    }

    /// Output buffer of `port` as left by the last block.
    pub fn output(&self, port: usize) -> Vec<BufferedEvent> {
        self.state
            .lock()
            .outputs
            .get(port)
            .cloned()
            .unwrap_or_default()
    }

    /// Raw bytes of every message in output `port`'s buffer.
    pub fn output_bytes(&self, port: usize) -> Vec<Vec<u8>> {
        self.output(port)
            .into_iter()
            .map(|e| e.bytes.to_vec())
            .collect()
    }

    /// True while a processor is bound.
    pub fn is_active(&self) -> bool {
        self.state.lock().processor.is_some()
    }

    /// True once the client was closed.
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Name passed to `open`, if the client was opened.
    pub fn client_name(&self) -> Option<String> {
        self.state.lock().client_name.clone()
    }

    /// Registered port names for `direction`, in index order.
    pub fn port_names(&self, direction: PortDirection) -> Vec<String> {
        let state = self.state.lock();
        match direction {
            PortDirection::Input => state.input_names.clone(),
            PortDirection::Output => state.output_names.clone(),
        }
    }

    /// Blocks run so far.
    pub fn blocks_run(&self) -> u64 {
        self.state.lock().blocks
    }
}

struct DummyScope<'a> {
    frames: u32,
    inputs: &'a [Vec<BufferedEvent>],
    outputs: &'a mut [Vec<BufferedEvent>],
}

impl BlockScope for DummyScope<'_> {
    fn frames(&self) -> u32 {
        self.frames
    }

    fn for_each_input(&mut self, port: usize, visit: &mut dyn FnMut(RawMidi<'_>)) {
        let Some(events) = self.inputs.get(port) else {
            return;
        };
        for event in events {
            visit(RawMidi {
                time: event.time,
                bytes: &event.bytes,
            });
        }
    }

    fn clear_output(&mut self, port: usize) {
        if let Some(buffer) = self.outputs.get_mut(port) {
            buffer.clear();
        }
    }

    fn write_output(&mut self, port: usize, time: u32, bytes: &[u8]) -> bool {
        if time >= self.frames {
            return false;
        }
        match self.outputs.get_mut(port) {
            Some(buffer) => {
                buffer.push(BufferedEvent {
                    time,
                    bytes: SmallVec::from_slice(bytes),
                });
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_and_register() {
        let options = DummyOptions::new();
        let handle = options.handle();
        let mut client = Dummy::open("test", options).unwrap();

        assert_eq!(client.register_port("in", PortDirection::Input), Some(0));
        assert_eq!(client.register_port("out_a", PortDirection::Output), Some(0));
        assert_eq!(client.register_port("out_b", PortDirection::Output), Some(1));

        assert_eq!(handle.client_name().as_deref(), Some("test"));
        assert_eq!(handle.port_names(PortDirection::Output), vec!["out_a", "out_b"]);
        assert!(!handle.is_active());
        assert!(!handle.run_block(64));
    }

    #[test]
    fn test_failure_injection() {
        assert!(Dummy::open("x", DummyOptions::new().fail_open()).is_err());

        let mut client = Dummy::open("x", DummyOptions::new().fail_port("bad")).unwrap();
        assert_eq!(client.register_port("good", PortDirection::Input), Some(0));
        assert_eq!(client.register_port("bad", PortDirection::Output), None);
    }

    #[test]
    fn test_inputs_sorted_by_time() {
        let options = DummyOptions::new();
        let handle = options.handle();
        let mut client = Dummy::open("x", options).unwrap();
        client.register_port("in", PortDirection::Input);

        assert!(handle.push_input_at(0, 10, &[0x90, 2, 1]));
        assert!(handle.push_input_at(0, 0, &[0x90, 1, 1]));
        assert!(handle.push_input_at(0, 10, &[0x90, 3, 1]));
        assert!(!handle.push_input(4, &[0x90, 3, 1]));

        let state = handle.state.lock();
        let notes: Vec<u8> = state.pending_inputs[0].iter().map(|e| e.bytes[1]).collect();
        assert_eq!(notes, vec![1, 2, 3]);
    }

    #[test]
    fn test_close_marks_closed() {
        let options = DummyOptions::new();
        let handle = options.handle();
        let mut client = Dummy::open("x", options).unwrap();
        client.close();
        assert!(handle.is_closed());
        client.close();
        assert!(handle.is_closed());
    }
}
