//! Bounded lock-free SPSC event queue.
//!
//! The two halves are owned values: whoever holds the [`EventProducer`] is the
//! only writer and whoever holds the [`EventConsumer`] is the only reader.
//! Overflow drops the newest event and bumps a shared counter.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ringbuf::{traits::*, HeapCons, HeapProd, HeapRb};

use crate::event::MidiEvent;

/// Default capacity for both bridge directions.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Producer half. RT-safe: never allocates, locks or blocks.
pub struct EventProducer {
    producer: HeapProd<MidiEvent>,
    dropped: Arc<AtomicU64>,
}

impl EventProducer {
    /// Append an event.
    ///
    /// Returns false if the queue was full; the event is discarded and
    /// counted in [`dropped`](Self::dropped).
    #[inline]
    pub fn write(&mut self, event: MidiEvent) -> bool {
        if self.producer.try_push(event).is_ok() {
            true
        } else {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            false
        }
    }

    /// Number of free slots.
    #[inline]
    pub fn write_space(&self) -> usize {
        self.producer.vacant_len()
    }

    /// Total slots.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.producer.capacity().get()
    }

    /// Events discarded because the queue was full.
    #[inline]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Consumer half. RT-safe: never allocates, locks or blocks.
pub struct EventConsumer {
    consumer: HeapCons<MidiEvent>,
    dropped: Arc<AtomicU64>,
}

impl EventConsumer {
    /// Take the oldest event, or `None` if the queue is empty.
    #[inline]
    pub fn read(&mut self) -> Option<MidiEvent> {
        self.consumer.try_pop()
    }

    /// Number of unread events. Exact for the consumer, may lag a concurrent
    /// producer.
    #[inline]
    pub fn read_space(&self) -> usize {
        self.consumer.occupied_len()
    }

    /// True when nothing is waiting to be read.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.consumer.is_empty()
    }

    /// Total slots.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.consumer.capacity().get()
    }

    /// Discard everything currently buffered. Returns the number discarded.
    ///
    /// Events the producer writes after this call are kept.
    pub fn reset(&mut self) -> usize {
        self.consumer.clear()
    }

    /// Iterator that reads until the queue is empty.
    pub fn drain(&mut self) -> impl Iterator<Item = MidiEvent> + '_ {
        std::iter::from_fn(move || self.consumer.try_pop())
    }

    /// Events the producer discarded because the queue was full.
    #[inline]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Create a queue with the default capacity.
pub fn event_queue() -> (EventProducer, EventConsumer) {
    event_queue_with_capacity(DEFAULT_QUEUE_CAPACITY)
}

/// Create a queue holding at most `capacity` events.
///
/// # Panics
/// If `capacity` is zero. Bridge configuration rejects that before calling.
pub fn event_queue_with_capacity(capacity: usize) -> (EventProducer, EventConsumer) {
    let rb = HeapRb::new(capacity);
    let (producer, consumer) = rb.split();
    let dropped = Arc::new(AtomicU64::new(0));
    (
        EventProducer {
            producer,
            dropped: Arc::clone(&dropped),
        },
        EventConsumer { consumer, dropped },
    )
}

impl std::fmt::Debug for EventProducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventProducer")
            .field("capacity", &self.capacity())
            .field("dropped", &self.dropped())
            .finish()
    }
}

impl std::fmt::Debug for EventConsumer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventConsumer")
            .field("capacity", &self.capacity())
            .field("read_space", &self.read_space())
            .finish()
    }
}
