use serde::{Deserialize, Serialize};

use crate::note::{Note, TimeSignature};

/// A bar (measure): the half-open tick range `[tick_on, tick_off)` and
/// the notes whose `tick_on` falls inside it.
///
/// Bars within a track are contiguous, non-overlapping and ordered by
/// index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    pub index: usize,
    pub tick_on: u64,
    pub tick_off: u64,
    pub notes: Vec<Note>,
}

impl Bar {
    pub fn length(&self) -> u64 {
        self.tick_off.saturating_sub(self.tick_on)
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Summed duration of the bar's notes.
    pub fn valid_length(&self) -> u64 {
        self.notes.iter().map(Note::length).sum()
    }
}

/// Group a flat note sequence into bars according to a sequence of
/// time-signature change points.
///
/// Walks consecutive pairs of change points (with a sentinel at the
/// "infinite" position) and emits fixed-length bars within each pair's
/// effective range, until the next change point's bar count is reached
/// or the running offset covers the last note's `tick_off`. An empty
/// note list produces no bars.
pub fn build_bars(notes: &[Note], time_signatures: &[TimeSignature]) -> Vec<Bar> {
    let Some(last_tick) = notes.last().map(|note| note.tick_off) else {
        return Vec::new();
    };

    let mut ranges: Vec<(u64, u64)> = Vec::new();
    for (position, signature) in time_signatures.iter().enumerate() {
        let next_position = time_signatures
            .get(position + 1)
            .map(|next| next.measure_position)
            .unwrap_or(usize::MAX);

        loop {
            if ranges.len() == next_position {
                break;
            }
            let start = ranges.last().map(|&(_, end)| end).unwrap_or(0);
            if start >= last_tick {
                break;
            }
            ranges.push((start, start + signature.ticks_in_measure));
        }
    }

    ranges
        .into_iter()
        .enumerate()
        .map(|(index, (tick_on, tick_off))| Bar {
            index,
            tick_on,
            tick_off,
            notes: notes
                .iter()
                .filter(|note| note.tick_on >= tick_on && note.tick_on < tick_off)
                .cloned()
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn note(index: usize, tick_on: u64, tick_off: u64) -> Note {
        Note {
            index,
            key: 60,
            tick_on,
            tick_off,
            lyric: "la".into(),
        }
    }

    fn four_four() -> Vec<TimeSignature> {
        vec![TimeSignature {
            measure_position: 0,
            ticks_in_measure: 1920,
        }]
    }

    #[test]
    fn empty_notes_build_no_bars() {
        assert_eq!(build_bars(&[], &four_four()), Vec::new());
    }

    #[test]
    fn fixed_meter_bars_cover_last_note() {
        let notes = vec![note(0, 0, 480), note(1, 1920, 2400)];
        let bars = build_bars(&notes, &four_four());

        assert_eq!(bars.len(), 2);
        assert_eq!((bars[0].tick_on, bars[0].tick_off), (0, 1920));
        assert_eq!((bars[1].tick_on, bars[1].tick_off), (1920, 3840));
        assert_eq!(bars[0].notes, vec![notes[0].clone()]);
        assert_eq!(bars[1].notes, vec![notes[1].clone()]);
    }

    #[test]
    fn meter_change_switches_bar_length() {
        // 4/4 for two bars, then 2/4 from bar 2 on.
        let signatures = vec![
            TimeSignature {
                measure_position: 0,
                ticks_in_measure: 1920,
            },
            TimeSignature {
                measure_position: 2,
                ticks_in_measure: 960,
            },
        ];
        let notes = vec![note(0, 0, 480), note(1, 4600, 4800)];
        let bars = build_bars(&notes, &signatures);

        let ranges: Vec<_> = bars.iter().map(|b| (b.tick_on, b.tick_off)).collect();
        assert_eq!(ranges, vec![(0, 1920), (1920, 3840), (3840, 4800)]);
    }

    #[test]
    fn note_on_boundary_joins_the_later_bar() {
        let notes = vec![note(0, 0, 960), note(1, 1920, 2880)];
        let bars = build_bars(&notes, &four_four());

        assert!(bars[0].notes.iter().all(|n| n.index == 0));
        assert!(bars[1].notes.iter().all(|n| n.index == 1));
    }

    #[test]
    fn valid_length_sums_note_durations() {
        let notes = vec![note(0, 0, 480), note(1, 480, 720)];
        let bars = build_bars(&notes, &four_four());

        assert_eq!(bars[0].valid_length(), 720);
        assert_eq!(bars[0].length(), 1920);
        assert!(!bars[0].is_empty());
    }
}
