//! Realtime half of the bridge, run once per audio block.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use midibridge_core::{codec, EventConsumer, EventProducer, WakeSignal};

use crate::client::BlockScope;

/// Counters the realtime side updates and the application side reads.
#[derive(Debug, Default)]
pub(crate) struct BlockCounters {
    pub(crate) blocks: AtomicU64,
    pub(crate) unwritten: AtomicU64,
}

/// The audio-callback capability handed to a [`DeviceClient`](crate::DeviceClient).
///
/// Owns the producer side of the inbound queue and the consumer side of the
/// outbound queue, so the realtime thread is the only one touching them.
/// [`process`](Self::process) never allocates, locks or blocks.
pub struct Processor {
    inbound: EventProducer,
    outbound: EventConsumer,
    wake: Arc<WakeSignal>,
    input_ports: usize,
    output_ports: usize,
    counters: Arc<BlockCounters>,
}

impl Processor {
    pub(crate) fn new(
        inbound: EventProducer,
        outbound: EventConsumer,
        wake: Arc<WakeSignal>,
        input_ports: usize,
        output_ports: usize,
        counters: Arc<BlockCounters>,
    ) -> Self {
        Self {
            inbound,
            outbound,
            wake,
            input_ports,
            output_ports,
            counters,
        }
    }

    /// Number of input ports read each block.
    pub fn input_ports(&self) -> usize {
        self.input_ports
    }

    /// Number of output ports written each block.
    pub fn output_ports(&self) -> usize {
        self.output_ports
    }

    /// Most events one block can emit.
    pub fn outbound_capacity(&self) -> usize {
        self.outbound.capacity()
    }

    /// Count messages the client failed to hand to the device after `process`.
    #[cfg_attr(not(feature = "jack"), allow(dead_code))]
    pub(crate) fn record_unwritten(&self, count: u64) {
        self.counters.unwritten.fetch_add(count, Ordering::Relaxed);
    }

    /// Run one audio block.
    ///
    /// 1. Decode every captured input event, port by port, into the inbound
    ///    queue and wake the reader once per port that produced anything.
    /// 2. Clear every output buffer.
    /// 3. Drain the outbound queue into the output buffers at frame 0.
    ///
    /// Step 3 reads at most the events queued when it starts, so a producer
    /// that keeps writing cannot hold the callback past its deadline.
    pub fn process<S: BlockScope + ?Sized>(&mut self, scope: &mut S) {
        for port in 0..self.input_ports {
            let inbound = &mut self.inbound;
            let mut written = 0usize;
            scope.for_each_input(port, &mut |raw| {
                if inbound.write(codec::decode_bytes(raw.bytes, port)) {
                    written += 1;
                }
            });
            if written > 0 {
                self.wake.notify();
            }
        }

        for port in 0..self.output_ports {
            scope.clear_output(port);
        }

        let pending = self.outbound.read_space();
        let mut unwritten = 0u64;
        for _ in 0..pending {
            let Some(event) = self.outbound.read() else {
                break;
            };
            let msg = codec::encode(&event);
            if msg.is_empty() {
                continue;
            }
            if msg.port >= self.output_ports || !scope.write_output(msg.port, 0, msg.as_bytes()) {
                unwritten += 1;
            }
        }

        if unwritten > 0 {
            self.record_unwritten(unwritten);
        }
        self.counters.blocks.fetch_add(1, Ordering::Relaxed);
    }
}

impl std::fmt::Debug for Processor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Processor")
            .field("input_ports", &self.input_ports)
            .field("output_ports", &self.output_ports)
            .finish()
    }
}
