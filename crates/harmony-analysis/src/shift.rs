use score_model::{HarmonicType, NoteShift, Passage, KEYS_IN_OCTAVE};

use crate::config::Config;
use crate::{Error, Result};

/// Per-note pitch deltas for one harmony voice over a resolved passage.
///
/// An atonal passage contributes no notes to any harmonic type; a
/// passage with no tonality at all signals a caller-sequencing bug.
/// Thirds are read from the configured shift tables indexed by each
/// note's scale position relative to the passage key; sixths are the
/// opposite third displaced by an octave.
pub fn note_shifts(
    passage: &Passage,
    harmonic_type: HarmonicType,
    config: &Config,
) -> Result<Vec<NoteShift>> {
    let Some(tonality) = passage.tonality else {
        return Err(Error::Model(score_model::Error::PassageTonalityNotMarked {
            passage_index: passage.index,
        }));
    };
    if !tonality.is_melodic() {
        return Ok(Vec::new());
    }

    let octave = KEYS_IN_OCTAVE as i32;
    let shifts = passage
        .notes()
        .map(|note| {
            let degree = note.key_relative_to(tonality);
            let key_delta = match harmonic_type {
                HarmonicType::Copy => 0,
                HarmonicType::UpperThird => config.key_shift_for_upper_third_harmony[degree],
                HarmonicType::LowerThird => config.key_shift_for_lower_third_harmony[degree],
                HarmonicType::UpperSixth => {
                    config.key_shift_for_lower_third_harmony[degree] + octave
                }
                HarmonicType::LowerSixth => {
                    config.key_shift_for_upper_third_harmony[degree] - octave
                }
                HarmonicType::UpperOctave => octave,
                HarmonicType::LowerOctave => -octave,
            };
            NoteShift {
                note_index: note.index,
                key_delta,
            }
        })
        .collect();
    Ok(shifts)
}
