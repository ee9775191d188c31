use serde::{Deserialize, Serialize};

use crate::tonality::{Tonality, KEYS_IN_OCTAVE};

/// A single note of a melodic track, timed in absolute ticks.
///
/// `index` is the note's ordinal position within its track, contiguous
/// from 0. `[tick_on, tick_off)` is half-open; notes in a track are
/// ordered by `tick_on` and never overlap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub index: usize,
    pub key: u8,
    pub tick_on: u64,
    pub tick_off: u64,
    pub lyric: String,
}

impl Note {
    pub fn length(&self) -> u64 {
        self.tick_off.saturating_sub(self.tick_on)
    }

    /// Pitch class expressed as an offset from the given tonality's root.
    pub fn key_relative_to(&self, tonality: Tonality) -> usize {
        let pitch_class = self.key as usize % KEYS_IN_OCTAVE;
        (pitch_class + KEYS_IN_OCTAVE - tonality.ordinal() % KEYS_IN_OCTAVE) % KEYS_IN_OCTAVE
    }
}

/// A time-signature change point: from bar `measure_position` onward,
/// bars are `ticks_in_measure` ticks long.
///
/// A track's time signatures are ordered by `measure_position`, strictly
/// increasing, with the first entry at position 0. This is a caller
/// precondition, not validated here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSignature {
    pub measure_position: usize,
    pub ticks_in_measure: u64,
}

/// A note of a generated harmony voice: the source note plus the pitch
/// delta to apply to it, in semitones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteShift {
    pub note_index: usize,
    pub key_delta: i32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn note(key: u8) -> Note {
        Note {
            index: 0,
            key,
            tick_on: 0,
            tick_off: 480,
            lyric: "la".into(),
        }
    }

    #[test]
    fn length_is_tick_span() {
        assert_eq!(note(60).length(), 480);
    }

    #[test]
    fn relative_key_wraps_below_root() {
        // Middle C relative to A: (0 - 9 + 12) % 12 = 3
        assert_eq!(note(60).key_relative_to(Tonality::A), 3);
        assert_eq!(note(60).key_relative_to(Tonality::C), 0);
        assert_eq!(note(67).key_relative_to(Tonality::C), 7);
        assert_eq!(note(67).key_relative_to(Tonality::G), 0);
    }
}
