//! Structured MIDI event carried across the realtime boundary.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Lowest pitch-bend value (wire bytes `0x00 0x00`).
pub const PITCH_BEND_MIN: i16 = -8192;
/// Highest pitch-bend value (wire bytes `0x7F 0x7F`).
pub const PITCH_BEND_MAX: i16 = 8191;

/// Type tag and payload of a [`MidiEvent`].
///
/// Each variant carries exactly the fields its wire message has, so an
/// unrecognized message ([`EventKind::None`]) has nothing to misread.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    NoteOn {
        note: u8,
        velocity: u8,
    },
    NoteOff {
        note: u8,
        velocity: u8,
    },
    Control {
        param: u8,
        value: u8,
    },
    /// Zero-centered bend, `PITCH_BEND_MIN..=PITCH_BEND_MAX`.
    PitchBend {
        value: i16,
    },
    Program {
        value: u8,
    },
    /// Unrecognized or unsupported status byte.
    #[default]
    None,
}

impl EventKind {
    /// Short lowercase name used in log output.
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::NoteOn { .. } => "note-on",
            EventKind::NoteOff { .. } => "note-off",
            EventKind::Control { .. } => "control",
            EventKind::PitchBend { .. } => "pitch-bend",
            EventKind::Program { .. } => "program",
            EventKind::None => "none",
        }
    }
}

/// RT-safe MIDI event. `Copy`, fixed size, no heap data.
///
/// `port` indexes the bridge's input ports for received events and its
/// output ports for events to be sent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MidiEvent {
    pub port: usize,
    pub channel: u8,
    pub kind: EventKind,
}

impl MidiEvent {
    /// Event of any kind. See the typed constructors below for the common ones.
    #[inline]
    pub fn new(port: usize, channel: u8, kind: EventKind) -> Self {
        Self {
            port,
            channel,
            kind,
        }
    }

    #[inline]
    pub fn note_on(port: usize, channel: u8, note: u8, velocity: u8) -> Self {
        Self::new(port, channel, EventKind::NoteOn { note, velocity })
    }

    #[inline]
    pub fn note_off(port: usize, channel: u8, note: u8, velocity: u8) -> Self {
        Self::new(port, channel, EventKind::NoteOff { note, velocity })
    }

    #[inline]
    pub fn control_change(port: usize, channel: u8, param: u8, value: u8) -> Self {
        Self::new(port, channel, EventKind::Control { param, value })
    }

    #[inline]
    pub fn pitch_bend(port: usize, channel: u8, value: i16) -> Self {
        Self::new(port, channel, EventKind::PitchBend { value })
    }

    #[inline]
    pub fn program_change(port: usize, channel: u8, program: u8) -> Self {
        Self::new(port, channel, EventKind::Program { value: program })
    }

    /// Same event addressed to another port.
    #[inline]
    pub fn with_port(self, port: usize) -> Self {
        Self { port, ..self }
    }

    /// Same event on another channel.
    #[inline]
    pub fn with_channel(self, channel: u8) -> Self {
        Self { channel, ..self }
    }

    /// True for events the codec could not map to a supported kind.
    #[inline]
    pub fn is_none(&self) -> bool {
        matches!(self.kind, EventKind::None)
    }

    /// Note-on of any velocity, including 0.
    #[inline]
    pub fn is_note_on(&self) -> bool {
        matches!(self.kind, EventKind::NoteOn { .. })
    }

    /// Note-off. A note-on with velocity 0 is not one; see [`ends_note`](Self::ends_note).
    #[inline]
    pub fn is_note_off(&self) -> bool {
        matches!(self.kind, EventKind::NoteOff { .. })
    }

    /// Note-on with a nonzero velocity.
    #[inline]
    pub fn starts_note(&self) -> bool {
        matches!(self.kind, EventKind::NoteOn { velocity, .. } if velocity > 0)
    }

    /// Note-off, or note-on with velocity 0.
    #[inline]
    pub fn ends_note(&self) -> bool {
        matches!(
            self.kind,
            EventKind::NoteOff { .. } | EventKind::NoteOn { velocity: 0, .. }
        )
    }

    /// Note number of a note-on or note-off.
    #[inline]
    pub fn note(&self) -> Option<u8> {
        match self.kind {
            EventKind::NoteOn { note, .. } | EventKind::NoteOff { note, .. } => Some(note),
            _ => None,
        }
    }

    /// Velocity of a note-on or note-off.
    #[inline]
    pub fn velocity(&self) -> Option<u8> {
        match self.kind {
            EventKind::NoteOn { velocity, .. } | EventKind::NoteOff { velocity, .. } => {
                Some(velocity)
            }
            _ => None,
        }
    }

    /// Checks that every field fits the range its wire encoding can carry.
    ///
    /// The codec masks instead of rejecting, so callers that need to refuse
    /// bad data do it here before enqueueing.
    pub fn validate(&self) -> Result<()> {
        Error::check_range("channel", self.channel as i32, 0, 15)?;
        match self.kind {
            EventKind::NoteOn { note, velocity } | EventKind::NoteOff { note, velocity } => {
                Error::check_range("note", note as i32, 0, 127)?;
                Error::check_range("velocity", velocity as i32, 0, 127)
            }
            EventKind::Control { param, value } => {
                Error::check_range("param", param as i32, 0, 127)?;
                Error::check_range("value", value as i32, 0, 127)
            }
            EventKind::PitchBend { value } => Error::check_range(
                "pitch bend",
                value as i32,
                PITCH_BEND_MIN as i32,
                PITCH_BEND_MAX as i32,
            ),
            EventKind::Program { value } => Error::check_range("program", value as i32, 0, 127),
            EventKind::None => Ok(()),
        }
    }
}

impl std::fmt::Display for MidiEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "port {} ch {} ", self.port, self.channel)?;
        match self.kind {
            EventKind::NoteOn { note, velocity } => write!(f, "note-on {note} {velocity}"),
            EventKind::NoteOff { note, velocity } => write!(f, "note-off {note} {velocity}"),
            EventKind::Control { param, value } => write!(f, "control {param} {value}"),
            EventKind::PitchBend { value } => write!(f, "pitch-bend {value}"),
            EventKind::Program { value } => write!(f, "program {value}"),
            EventKind::None => write!(f, "none"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        let ev = MidiEvent::note_on(1, 2, 60, 100);
        assert_eq!(ev.port, 1);
        assert_eq!(ev.channel, 2);
        assert_eq!(ev.note(), Some(60));
        assert_eq!(ev.velocity(), Some(100));
        assert!(ev.is_note_on());

        let cc = MidiEvent::control_change(0, 0, 7, 127);
        assert_eq!(cc.note(), None);
        assert_eq!(cc.kind, EventKind::Control { param: 7, value: 127 });
    }

    #[test]
    fn test_zero_velocity_note_on_keeps_its_kind() {
        let ev = MidiEvent::note_on(0, 0, 60, 0);
        assert!(ev.is_note_on());
        assert!(!ev.is_note_off());
        assert!(!ev.starts_note());
        assert!(ev.ends_note());

        let off = MidiEvent::note_off(0, 0, 60, 64);
        assert!(off.is_note_off());
        assert!(off.ends_note());
        assert!(!off.starts_note());
    }

    #[test]
    fn test_default_is_none() {
        let ev = MidiEvent::default();
        assert!(ev.is_none());
        assert_eq!(ev.port, 0);
        assert_eq!(ev.kind.name(), "none");
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        assert!(MidiEvent::note_on(0, 15, 127, 127).validate().is_ok());
        assert!(MidiEvent::pitch_bend(0, 0, PITCH_BEND_MIN).validate().is_ok());
        assert!(MidiEvent::pitch_bend(0, 0, PITCH_BEND_MAX).validate().is_ok());

        assert_eq!(
            MidiEvent::note_on(0, 16, 60, 100).validate(),
            Err(Error::OutOfRange {
                field: "channel",
                value: 16,
                min: 0,
                max: 15
            })
        );
        assert!(MidiEvent::note_on(0, 0, 128, 100).validate().is_err());
        assert!(MidiEvent::control_change(0, 0, 1, 200).validate().is_err());
        assert!(MidiEvent::program_change(0, 0, 130).validate().is_err());
        assert!(MidiEvent::pitch_bend(0, 0, 8192).validate().is_err());
        assert!(MidiEvent::pitch_bend(0, 0, -8193).validate().is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            MidiEvent::note_on(0, 3, 60, 90).to_string(),
            "port 0 ch 3 note-on 60 90"
        );
        assert_eq!(
            MidiEvent::pitch_bend(2, 0, -100).to_string(),
            "port 2 ch 0 pitch-bend -100"
        );
    }

    #[test]
    fn test_with_port_and_channel() {
        let ev = MidiEvent::program_change(0, 0, 5)
            .with_port(3)
            .with_channel(9);
        assert_eq!(ev, MidiEvent::program_change(3, 9, 5));
    }

    #[test]
    fn test_serde_roundtrip() {
        let ev = MidiEvent::pitch_bend(1, 4, -4096);
        let bytes = bincode::serialize(&ev).unwrap();
        let back: MidiEvent = bincode::deserialize(&bytes).unwrap();
        assert_eq!(ev, back);
    }
}
