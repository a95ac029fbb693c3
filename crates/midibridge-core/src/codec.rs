//! Wire codec: raw MIDI bytes to [`MidiEvent`] and back.
//!
//! Stateless and allocation-free; both directions run on the realtime thread.
//! Decoding is tolerant (masks, never fails). Encoding does not validate;
//! use [`MidiEvent::validate`] first when bad input must be refused.

use crate::event::{EventKind, MidiEvent};

pub const NOTE_OFF: u8 = 0x80;
pub const NOTE_ON: u8 = 0x90;
pub const CONTROL_CHANGE: u8 = 0xB0;
pub const PROGRAM_CHANGE: u8 = 0xC0;
pub const PITCH_BEND: u8 = 0xE0;

const STATUS_MASK: u8 = 0xF0;
const CHANNEL_MASK: u8 = 0x0F;
const DATA_MASK: u8 = 0x7F;

/// Offset between the unsigned 14-bit wire value and the signed bend value.
pub const PITCH_BEND_CENTER: i32 = 8192;

/// Encoded wire message: status byte plus up to two data bytes.
///
/// `len == 0` means the event has no wire form and nothing must be emitted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EncodedMessage {
    pub bytes: [u8; 3],
    pub len: usize,
    pub port: usize,
}

impl EncodedMessage {
    /// Wire bytes, `len` long.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    /// True for events with no wire form.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Status byte, or 0 when empty.
    #[inline]
    pub fn status(&self) -> u8 {
        self.bytes[0]
    }
}

/// Decode one wire message.
///
/// The channel comes from the status low nibble; data bytes are masked to
/// seven bits. Unknown status types yield [`EventKind::None`].
#[inline]
pub fn decode(status: u8, data0: u8, data1: u8, port: usize) -> MidiEvent {
    let data0 = data0 & DATA_MASK;
    let data1 = data1 & DATA_MASK;

    let kind = match status & STATUS_MASK {
        NOTE_ON => EventKind::NoteOn {
            note: data0,
            velocity: data1,
        },
        NOTE_OFF => EventKind::NoteOff {
            note: data0,
            velocity: data1,
        },
        CONTROL_CHANGE => EventKind::Control {
            param: data0,
            value: data1,
        },
        PITCH_BEND => EventKind::PitchBend {
            value: (((data1 as i32) << 7 | data0 as i32) - PITCH_BEND_CENTER) as i16,
        },
        PROGRAM_CHANGE => EventKind::Program { value: data0 },
        _ => EventKind::None,
    };

    MidiEvent {
        port,
        channel: status & CHANNEL_MASK,
        kind,
    }
}

/// Decode a message as delivered by a device buffer.
///
/// Only the bytes present are read. Missing data bytes count as zero and an
/// empty slice decodes to [`EventKind::None`] on channel 0.
#[inline]
pub fn decode_bytes(bytes: &[u8], port: usize) -> MidiEvent {
    match bytes {
        &[] => MidiEvent {
            port,
            ..MidiEvent::default()
        },
        &[status] => decode(status, 0, 0, port),
        &[status, data0] => decode(status, data0, 0, port),
        &[status, data0, data1, ..] => decode(status, data0, data1, port),
    }
}

/// Encode an event to its wire form.
///
/// The channel is masked to four bits and data bytes to seven. Pitch bend is
/// offset by [`PITCH_BEND_CENTER`] and split into low and high seven-bit
/// halves, so values outside `-8192..=8191` wrap modulo 16384.
#[inline]
pub fn encode(event: &MidiEvent) -> EncodedMessage {
    let (base, data0, data1, len) = match event.kind {
        EventKind::NoteOn { note, velocity } => (NOTE_ON, note, velocity, 3),
        EventKind::NoteOff { note, velocity } => (NOTE_OFF, note, velocity, 3),
        EventKind::Control { param, value } => (CONTROL_CHANGE, param, value, 3),
        EventKind::PitchBend { value } => {
            let raw = value as i32 + PITCH_BEND_CENTER;
            (PITCH_BEND, (raw & 0x7F) as u8, ((raw >> 7) & 0x7F) as u8, 3)
        }
        EventKind::Program { value } => (PROGRAM_CHANGE, value, 0, 2),
        EventKind::None => {
            return EncodedMessage {
                port: event.port,
                ..EncodedMessage::default()
            }
        }
    };

    EncodedMessage {
        bytes: [
            base | (event.channel & CHANNEL_MASK),
            data0 & DATA_MASK,
            data1 & DATA_MASK,
        ],
        len,
        port: event.port,
    }
}
