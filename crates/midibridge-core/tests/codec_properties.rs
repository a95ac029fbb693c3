//! Property tests for the wire codec.

use midibridge_core::codec::{decode, decode_bytes, encode};
use midibridge_core::{EventKind, MidiEvent, PITCH_BEND_MAX, PITCH_BEND_MIN};
use proptest::prelude::*;

fn representable_kind() -> impl Strategy<Value = EventKind> {
    prop_oneof![
        (0u8..128, 0u8..128).prop_map(|(note, velocity)| EventKind::NoteOn { note, velocity }),
        (0u8..128, 0u8..128).prop_map(|(note, velocity)| EventKind::NoteOff { note, velocity }),
        (0u8..128, 0u8..128).prop_map(|(param, value)| EventKind::Control { param, value }),
        (PITCH_BEND_MIN..=PITCH_BEND_MAX).prop_map(|value| EventKind::PitchBend { value }),
        (0u8..128).prop_map(|value| EventKind::Program { value }),
    ]
}

fn representable_event() -> impl Strategy<Value = MidiEvent> {
    (0usize..16, 0u8..16, representable_kind())
        .prop_map(|(port, channel, kind)| MidiEvent::new(port, channel, kind))
}

proptest! {
    #[test]
    fn encode_then_decode_is_identity(event in representable_event()) {
        let msg = encode(&event);
        prop_assert!(!msg.is_empty());
        prop_assert_eq!(decode_bytes(msg.as_bytes(), msg.port), event);
    }

    #[test]
    fn status_nibbles_match_type_and_channel(event in representable_event()) {
        let msg = encode(&event);
        let base = match event.kind {
            EventKind::NoteOn { .. } => 0x90,
            EventKind::NoteOff { .. } => 0x80,
            EventKind::Control { .. } => 0xB0,
            EventKind::PitchBend { .. } => 0xE0,
            EventKind::Program { .. } => 0xC0,
            EventKind::None => unreachable!(),
        };
        prop_assert_eq!(msg.status() & 0xF0, base);
        prop_assert_eq!(msg.status() & 0x0F, event.channel);
    }

    #[test]
    fn decode_never_fails_and_data_stays_in_range(status: u8, d0: u8, d1: u8) {
        let ev = decode(status, d0, d1, 0);
        prop_assert!(ev.channel < 16);
        prop_assert!(ev.validate().is_ok());
    }

    #[test]
    fn encoded_data_bytes_never_look_like_status(event in representable_event()) {
        let msg = encode(&event);
        for byte in &msg.as_bytes()[1..] {
            prop_assert!(*byte < 0x80);
        }
    }
}

#[test]
fn unsupported_status_types_decode_to_none() {
    for status in [0xA0u8, 0xA5, 0xD0, 0xF0, 0xF8, 0x00, 0x7F] {
        let ev = decode(status, 1, 2, 0);
        assert!(ev.is_none(), "status {status:#04x}");
        assert_eq!(encode(&ev).len, 0);
    }
}
