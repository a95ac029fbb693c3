//! JACK device client.
//!
//! Ports are registered on an inactive `jack::Client`; activation moves them
//! into the process handler together with the bridge's [`Processor`].
//! JACK clears an output buffer whenever a writer is taken for it, so output
//! is staged during the block and written port by port at the end.

use jack::{
    AsyncClient, Client, ClientOptions, ClientStatus, Control, MidiIn, MidiOut, Port,
    ProcessHandler, ProcessScope,
};

use crate::client::{BlockScope, ClientError, DeviceClient, PortDirection, RawMidi};
use crate::processor::Processor;

/// Open options for [`Jack`].
pub use jack::ClientOptions as JackOptions;

/// Longest message the bridge ever emits.
const MAX_MESSAGE_LEN: usize = 3;

/// JACK MIDI client.
pub struct Jack {
    state: JackState,
}

enum JackState {
    Inactive {
        client: Client,
        inputs: Vec<Port<MidiIn>>,
        outputs: Vec<Port<MidiOut>>,
    },
    Active(AsyncClient<JackNotifications, JackProcess>),
    Closed,
}

impl Jack {
    /// True while the process callback is running.
    pub fn is_active(&self) -> bool {
        matches!(self.state, JackState::Active(_))
    }

    /// Name JACK assigned to the client; may differ from the requested one.
    pub fn name(&self) -> Option<String> {
        match &self.state {
            JackState::Inactive { client, .. } => Some(client.name().to_owned()),
            JackState::Active(active) => Some(active.as_client().name().to_owned()),
            JackState::Closed => None,
        }
    }
}

impl DeviceClient for Jack {
    type Options = ClientOptions;

    fn open(name: &str, options: ClientOptions) -> Result<Self, ClientError> {
        let (client, status) =
            Client::new(name, options).map_err(|e| ClientError::new(e.to_string()))?;
        if status.contains(ClientStatus::NAME_NOT_UNIQUE) {
            tracing::warn!("JACK renamed client '{}' to '{}'", name, client.name());
        }
        Ok(Self {
            state: JackState::Inactive {
                client,
                inputs: Vec::new(),
                outputs: Vec::new(),
            },
        })
    }

    fn register_port(&mut self, name: &str, direction: PortDirection) -> Option<usize> {
        let JackState::Inactive {
            client,
            inputs,
            outputs,
        } = &mut self.state
        else {
            return None;
        };

        let registered = match direction {
            PortDirection::Input => client.register_port(name, MidiIn::default()).map(|port| {
                inputs.push(port);
                inputs.len() - 1
            }),
            PortDirection::Output => client.register_port(name, MidiOut::default()).map(|port| {
                outputs.push(port);
                outputs.len() - 1
            }),
        };
        match registered {
            Ok(index) => Some(index),
            Err(e) => {
                tracing::warn!("JACK refused {} port '{}': {}", direction, name, e);
                None
            }
        }
    }

    fn activate(&mut self, processor: Processor) -> Result<(), ClientError> {
        match std::mem::replace(&mut self.state, JackState::Closed) {
            JackState::Inactive {
                client,
                inputs,
                outputs,
            } => {
                let staged = Vec::with_capacity(processor.outbound_capacity());
                let handler = JackProcess {
                    processor,
                    inputs,
                    outputs,
                    staged,
                };
                let active = client
                    .activate_async(JackNotifications, handler)
                    .map_err(|e| ClientError::new(e.to_string()))?;
                self.state = JackState::Active(active);
                Ok(())
            }
            JackState::Active(active) => {
                self.state = JackState::Active(active);
                Err(ClientError::new("client is already active"))
            }
            JackState::Closed => Err(ClientError::new("client is closed")),
        }
    }

    fn deactivate(&mut self) {
        if !self.is_active() {
            return;
        }
        if let JackState::Active(active) = std::mem::replace(&mut self.state, JackState::Closed) {
            match active.deactivate() {
                Ok((client, _, handler)) => {
                    self.state = JackState::Inactive {
                        client,
                        inputs: handler.inputs,
                        outputs: handler.outputs,
                    };
                }
                Err(e) => tracing::warn!("JACK deactivation failed: {}", e),
            }
        }
    }

    fn close(&mut self) {
        self.deactivate();
        self.state = JackState::Closed;
    }
}

/// Logs server-side events; runs on JACK's notification thread.
struct JackNotifications;

impl jack::NotificationHandler for JackNotifications {
    unsafe fn shutdown(&mut self, status: ClientStatus, reason: &str) {
        tracing::warn!("JACK server shut down the client: {:?} - {}", status, reason);
    }

    fn xrun(&mut self, _: &Client) -> Control {
        tracing::debug!("JACK xrun");
        Control::Continue
    }
}

#[derive(Clone, Copy)]
struct StagedEvent {
    port: usize,
    time: u32,
    data: [u8; MAX_MESSAGE_LEN],
    len: usize,
}

/// Runs in the JACK realtime thread.
struct JackProcess {
    processor: Processor,
    inputs: Vec<Port<MidiIn>>,
    outputs: Vec<Port<MidiOut>>,
    /// Pre-sized to the outbound queue capacity, which bounds one block's output.
    staged: Vec<StagedEvent>,
}

impl ProcessHandler for JackProcess {
    fn process(&mut self, _: &Client, ps: &ProcessScope) -> Control {
        self.staged.clear();
        let mut scope = JackScope {
            ps,
            inputs: &self.inputs,
            staged: &mut self.staged,
        };
        self.processor.process(&mut scope);

        let mut unwritten = 0u64;
        for (index, port) in self.outputs.iter_mut().enumerate() {
            // Taking the writer clears the buffer, even with nothing staged.
            let mut writer = port.writer(ps);
            for event in self.staged.iter().filter(|e| e.port == index) {
                let raw = jack::RawMidi {
                    time: event.time,
                    bytes: &event.data[..event.len],
                };
                if writer.write(&raw).is_err() {
                    unwritten += 1;
                }
            }
        }
        if unwritten > 0 {
            self.processor.record_unwritten(unwritten);
        }
        Control::Continue
    }
}

struct JackScope<'a> {
    ps: &'a ProcessScope,
    inputs: &'a [Port<MidiIn>],
    staged: &'a mut Vec<StagedEvent>,
}

impl BlockScope for JackScope<'_> {
    fn frames(&self) -> u32 {
        self.ps.n_frames()
    }

    fn for_each_input(&mut self, port: usize, visit: &mut dyn FnMut(RawMidi<'_>)) {
        let Some(port) = self.inputs.get(port) else {
            return;
        };
        for raw in port.iter(self.ps) {
            visit(RawMidi {
                time: raw.time,
                bytes: raw.bytes,
            });
        }
    }

    fn clear_output(&mut self, _port: usize) {}

    fn write_output(&mut self, port: usize, time: u32, bytes: &[u8]) -> bool {
        if bytes.len() > MAX_MESSAGE_LEN || self.staged.len() == self.staged.capacity() {
            return false;
        }
        let mut data = [0u8; MAX_MESSAGE_LEN];
        data[..bytes.len()].copy_from_slice(bytes);
        self.staged.push(StagedEvent {
            port,
            time,
            data,
            len: bytes.len(),
        });
        true
    }
}
