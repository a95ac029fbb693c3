//! Application-facing half of the bridge.

use std::marker::PhantomData;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use midibridge_core::{
    event_queue_with_capacity, BridgeConfig, EventConsumer, EventProducer, MidiEvent, WakeSignal,
};
use serde::{Deserialize, Serialize};

use crate::client::{DeviceClient, PortDirection};
use crate::error::{Error, Result};
use crate::processor::{BlockCounters, Processor};

/// Lifecycle of a [`RealtimeBridge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BridgeState {
    /// Client open and ports registered, callback not running.
    Constructed,
    /// Callback running.
    Activated,
    /// Callback stopped; the bridge can no longer exchange events.
    Deactivated,
}

/// Snapshot of the bridge's drop and block counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeStats {
    /// Received events lost because the inbound queue was full.
    pub inbound_dropped: u64,
    /// Outgoing events lost because the outbound queue was full.
    pub outbound_dropped: u64,
    /// Outgoing events addressed to a missing port or refused by its buffer.
    pub outbound_unwritten: u64,
    /// Audio blocks processed so far.
    pub blocks_processed: u64,
}

/// Lock-free MIDI bridge between a realtime device callback and the
/// application thread.
///
/// The device client calls the bridge's [`Processor`] once per audio block.
/// Received events reach [`input_event`](Self::input_event) in order:
/// input-port-major within a block, chronological within a port, block by
/// block. Events passed to [`output_event`](Self::output_event) are written
/// at the start of the next block.
///
/// ```ignore
/// let mut bridge = RealtimeBridge::<Jack>::builder()
///     .client_name("router")
///     .input_port("in")
///     .output_port("out")
///     .build(JackOptions::NO_START_SERVER)?;
///
/// loop {
///     let ev = bridge.input_event();
///     bridge.output_event(ev.with_port(0));
/// }
/// ```
pub struct RealtimeBridge<C: DeviceClient> {
    client: C,
    config: BridgeConfig,
    inbound: EventConsumer,
    outbound: EventProducer,
    wake: Arc<WakeSignal>,
    counters: Arc<BlockCounters>,
    state: BridgeState,
}

impl<C: DeviceClient> RealtimeBridge<C> {
    /// Create a bridge builder.
    pub fn builder() -> BridgeBuilder<C> {
        BridgeBuilder::default()
    }

    /// Open the client, register every port, bind the processor and activate.
    ///
    /// On any failure after the client opened, it is deactivated and closed
    /// before the error is returned.
    pub fn open(config: BridgeConfig, options: C::Options) -> Result<Self> {
        config.validate()?;

        let client = C::open(&config.client_name, options).map_err(Error::Connection)?;
        tracing::debug!("Opened device client '{}'", config.client_name);

        let (in_tx, in_rx) = event_queue_with_capacity(config.queue_capacity);
        let (out_tx, out_rx) = event_queue_with_capacity(config.queue_capacity);
        let wake = Arc::new(WakeSignal::new(config.wake_poll_interval()));
        let counters = Arc::new(BlockCounters::default());

        let mut bridge = Self {
            client,
            config,
            inbound: in_rx,
            outbound: out_tx,
            wake: Arc::clone(&wake),
            counters: Arc::clone(&counters),
            state: BridgeState::Constructed,
        };

        // Drop deactivates and closes the client on the error path.
        bridge.register_ports()?;

        let processor = Processor::new(
            in_tx,
            out_rx,
            wake,
            bridge.config.input_ports.len(),
            bridge.config.output_ports.len(),
            counters,
        );
        bridge
            .client
            .activate(processor)
            .map_err(Error::Activation)?;
        bridge.state = BridgeState::Activated;

        tracing::info!(
            "Activated '{}' with {} input and {} output ports (queue capacity {})",
            bridge.config.client_name,
            bridge.config.input_ports.len(),
            bridge.config.output_ports.len(),
            bridge.config.queue_capacity,
        );
        Ok(bridge)
    }

    fn register_ports(&mut self) -> Result<()> {
        let ports = [
            (PortDirection::Input, &self.config.input_ports),
            (PortDirection::Output, &self.config.output_ports),
        ];
        for (direction, names) in ports {
            for (expected, name) in names.iter().enumerate() {
                match self.client.register_port(name, direction) {
                    Some(index) if index == expected => {
                        tracing::debug!("Registered {} port {}: {}", direction, index, name);
                    }
                    Some(index) => {
                        tracing::warn!(
                            "Client gave {} port '{}' index {}, expected {}",
                            direction,
                            name,
                            index,
                            expected
                        );
                        return Err(Error::PortRegistration {
                            direction,
                            name: name.clone(),
                        });
                    }
                    None => {
                        return Err(Error::PortRegistration {
                            direction,
                            name: name.clone(),
                        })
                    }
                }
            }
        }
        Ok(())
    }

    // ==================== Input ====================

    /// Wait for the next received event and return it.
    ///
    /// Blocks indefinitely while nothing has arrived, including after
    /// deactivation.
    pub fn input_event(&mut self) -> MidiEvent {
        loop {
            self.wake.wait_for_data(|| !self.inbound.is_empty());
            if let Some(event) = self.inbound.read() {
                return event;
            }
        }
    }

    /// Next received event, if one is already queued.
    pub fn try_input_event(&mut self) -> Option<MidiEvent> {
        self.inbound.read()
    }

    /// Like [`input_event`](Self::input_event) but gives up after `timeout`.
    pub fn input_event_timeout(&mut self, timeout: Duration) -> Option<MidiEvent> {
        if self
            .wake
            .wait_for_data_timeout(|| !self.inbound.is_empty(), timeout)
        {
            self.inbound.read()
        } else {
            None
        }
    }

    /// Received events waiting to be read.
    pub fn pending_input(&self) -> usize {
        self.inbound.read_space()
    }

    /// Discard every received event not read yet. Returns how many.
    pub fn drop_input(&mut self) -> usize {
        let dropped = self.inbound.reset();
        if dropped > 0 {
            tracing::debug!("Dropped {} buffered input events", dropped);
        }
        dropped
    }

    // ==================== Output ====================

    /// Queue an event for the next block. Never blocks.
    ///
    /// Returns false if the outbound queue was full and the event was
    /// dropped.
    pub fn output_event(&mut self, event: MidiEvent) -> bool {
        self.outbound.write(event)
    }

    /// Check field ranges and the port index, then queue like
    /// [`output_event`](Self::output_event).
    pub fn try_output_event(&mut self, event: MidiEvent) -> Result<bool> {
        event.validate()?;
        if event.port >= self.config.output_ports.len() {
            return Err(midibridge_core::Error::OutOfRange {
                field: "port",
                value: event.port as i32,
                min: 0,
                max: self.config.output_ports.len() as i32 - 1,
            }
            .into());
        }
        Ok(self.output_event(event))
    }

    /// Does nothing: queued output is written by the next block, and forcing
    /// it earlier would mean waiting on the realtime thread.
    pub fn flush_output(&mut self) {}

    // ==================== Lifecycle ====================

    /// Stop the realtime callback. Idempotent.
    pub fn deactivate(&mut self) {
        if self.state == BridgeState::Activated {
            self.client.deactivate();
            self.state = BridgeState::Deactivated;
            tracing::info!("Deactivated '{}'", self.config.client_name);
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> BridgeState {
        self.state
    }

    /// The underlying device client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Name the client was opened under.
    pub fn client_name(&self) -> &str {
        &self.config.client_name
    }

    /// Input port names, in index order.
    pub fn input_ports(&self) -> &[String] {
        &self.config.input_ports
    }

    /// Output port names, in index order.
    pub fn output_ports(&self) -> &[String] {
        &self.config.output_ports
    }

    /// Configuration the bridge was built from.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Snapshot of the drop and block counters.
    pub fn stats(&self) -> BridgeStats {
        BridgeStats {
            inbound_dropped: self.inbound.dropped(),
            outbound_dropped: self.outbound.dropped(),
            outbound_unwritten: self.counters.unwritten.load(Ordering::Relaxed),
            blocks_processed: self.counters.blocks.load(Ordering::Relaxed),
        }
    }
}

impl<C: DeviceClient> Drop for RealtimeBridge<C> {
    fn drop(&mut self) {
        self.client.deactivate();
        self.client.close();

        let stats = self.stats();
        if stats.inbound_dropped + stats.outbound_dropped + stats.outbound_unwritten > 0 {
            tracing::warn!(
                "Closed '{}' after losing events: {} inbound, {} outbound, {} unwritten",
                self.config.client_name,
                stats.inbound_dropped,
                stats.outbound_dropped,
                stats.outbound_unwritten,
            );
        } else {
            tracing::debug!("Closed '{}'", self.config.client_name);
        }
    }
}

impl<C: DeviceClient> std::fmt::Debug for RealtimeBridge<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeBridge")
            .field("client_name", &self.config.client_name)
            .field("state", &self.state)
            .field("pending_input", &self.pending_input())
            .finish()
    }
}

/// Fluent construction of a [`RealtimeBridge`] on client type `C`.
pub struct BridgeBuilder<C> {
    config: BridgeConfig,
    _client: PhantomData<fn() -> C>,
}

impl<C> Default for BridgeBuilder<C> {
    fn default() -> Self {
        Self::from_config(BridgeConfig::new(""))
    }
}

impl<C> std::fmt::Debug for BridgeBuilder<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl<C> BridgeBuilder<C> {
    /// Start from an existing configuration.
    pub fn from_config(config: BridgeConfig) -> Self {
        Self {
            config,
            _client: PhantomData,
        }
    }

    /// Name to open the device client under.
    pub fn client_name(mut self, name: impl Into<String>) -> Self {
        self.config.client_name = name.into();
        self
    }

    /// Add an input port. Ports are indexed in the order they are added.
    pub fn input_port(mut self, name: impl Into<String>) -> Self {
        self.config.input_ports.push(name.into());
        self
    }

    /// Add an output port. Ports are indexed in the order they are added.
    pub fn output_port(mut self, name: impl Into<String>) -> Self {
        self.config.output_ports.push(name.into());
        self
    }

    /// Capacity of each of the two event queues.
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity;
        self
    }

    /// Upper bound on one sleep of a blocked reader.
    ///
    /// Stored in whole milliseconds, rounded up, so any nonzero interval
    /// stays nonzero.
    pub fn wake_poll_interval(mut self, interval: Duration) -> Self {
        self.config.wake_poll_interval_ms =
            u64::try_from(interval.as_micros().div_ceil(1000)).unwrap_or(u64::MAX);
        self
    }

    /// Configuration assembled so far.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Validate the configuration and open the bridge.
    pub fn build(self, options: C::Options) -> Result<RealtimeBridge<C>>
    where
        C: DeviceClient,
    {
        RealtimeBridge::open(self.config, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dummy::{Dummy, DummyOptions};

    fn builder() -> BridgeBuilder<Dummy> {
        RealtimeBridge::builder()
            .client_name("test")
            .input_port("in")
            .output_port("out")
    }

    #[test]
    fn test_default_build() {
        let options = DummyOptions::new();
        let device = options.handle();
        let bridge = builder().build(options).unwrap();

        assert_eq!(bridge.state(), BridgeState::Activated);
        assert_eq!(bridge.client_name(), "test");
        assert_eq!(bridge.input_ports(), ["in"]);
        assert_eq!(bridge.output_ports(), ["out"]);
        assert_eq!(bridge.config().queue_capacity, midibridge_core::DEFAULT_QUEUE_CAPACITY);
        assert!(device.is_active());
        assert_eq!(bridge.stats(), BridgeStats::default());
    }

    #[test]
    fn test_builder_rejects_invalid_config() {
        let err = RealtimeBridge::<Dummy>::builder()
            .client_name("test")
            .output_port("out")
            .build(DummyOptions::new())
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = builder()
            .queue_capacity(0)
            .build(DummyOptions::new())
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_deactivate_is_idempotent() {
        let options = DummyOptions::new();
        let device = options.handle();
        let mut bridge = builder().build(options).unwrap();

        bridge.deactivate();
        bridge.deactivate();
        assert_eq!(bridge.state(), BridgeState::Deactivated);
        assert!(!device.is_active());
        assert!(!device.is_closed());

        drop(bridge);
        assert!(device.is_closed());
    }

    #[test]
    fn test_try_output_event_validates() {
        let mut bridge = builder().build(DummyOptions::new()).unwrap();

        assert!(bridge.try_output_event(MidiEvent::note_on(0, 0, 60, 100)).unwrap());
        assert!(matches!(
            bridge.try_output_event(MidiEvent::note_on(0, 16, 60, 100)),
            Err(Error::Config(midibridge_core::Error::OutOfRange { field: "channel", .. }))
        ));
        assert!(matches!(
            bridge.try_output_event(MidiEvent::note_on(1, 0, 60, 100)),
            Err(Error::Config(midibridge_core::Error::OutOfRange { field: "port", .. }))
        ));
    }

    #[test]
    fn test_wake_poll_interval_from_builder() {
        let builder = builder().wake_poll_interval(Duration::from_millis(3));
        assert_eq!(builder.config().wake_poll_interval_ms, 3);

        let builder = builder.wake_poll_interval(Duration::from_micros(300));
        assert_eq!(builder.config().wake_poll_interval_ms, 1);

        let builder = builder.wake_poll_interval(Duration::from_micros(2001));
        assert_eq!(builder.config().wake_poll_interval_ms, 3);
    }
}
