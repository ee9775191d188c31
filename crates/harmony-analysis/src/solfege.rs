use std::collections::BTreeSet;

use score_model::{Note, KEYS_IN_OCTAVE};

/// Duration-weighted pitch-class distribution of a note span.
///
/// Returns `None` when the span's total note duration is zero; the
/// probability model is undefined there and callers must treat such
/// spans as carrying no tonality evidence.
pub fn pitch_class_weights<'a, I>(notes: I) -> Option<[f64; KEYS_IN_OCTAVE]>
where
    I: IntoIterator<Item = &'a Note>,
{
    let mut lengths = [0u64; KEYS_IN_OCTAVE];
    let mut total = 0u64;
    for note in notes {
        let length = note.length();
        lengths[note.key as usize % KEYS_IN_OCTAVE] += length;
        total += length;
    }
    if total == 0 {
        return None;
    }
    let mut weights = [0.0; KEYS_IN_OCTAVE];
    for (weight, length) in weights.iter_mut().zip(lengths) {
        *weight = length as f64 / total as f64;
    }
    Some(weights)
}

/// Fraction of note duration falling on valid scale degrees of the
/// candidate key: the degree set rotated by the key's semitone offset.
pub fn tonality_probability(
    weights: &[f64; KEYS_IN_OCTAVE],
    degrees: &BTreeSet<u8>,
    key: usize,
) -> f64 {
    degrees
        .iter()
        .map(|&degree| weights[(degree as usize + key) % KEYS_IN_OCTAVE])
        .sum()
}

/// Probability vector over all twelve candidate keys.
pub fn tonality_probabilities(
    weights: &[f64; KEYS_IN_OCTAVE],
    degrees: &BTreeSet<u8>,
) -> [f64; KEYS_IN_OCTAVE] {
    std::array::from_fn(|key| tonality_probability(weights, degrees, key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VALID_SOLFEGE_DEGREES_DEFAULT;

    fn note(key: u8, length: u64) -> Note {
        Note {
            index: 0,
            key,
            tick_on: 0,
            tick_off: length,
            lyric: String::new(),
        }
    }

    fn major_degrees() -> BTreeSet<u8> {
        VALID_SOLFEGE_DEGREES_DEFAULT.iter().copied().collect()
    }

    #[test]
    fn weights_are_duration_fractions() {
        let notes = vec![note(60, 480), note(64, 480), note(67, 960)];
        let weights = pitch_class_weights(notes.iter()).unwrap();
        assert!((weights[0] - 0.25).abs() < 1e-12);
        assert!((weights[4] - 0.25).abs() < 1e-12);
        assert!((weights[7] - 0.5).abs() < 1e-12);
        assert!((weights.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn zero_duration_span_has_no_weights() {
        assert_eq!(pitch_class_weights(std::iter::empty::<&Note>()), None);
        assert_eq!(pitch_class_weights([note(60, 0)].iter()), None);
    }

    #[test]
    fn triad_probability_tracks_scale_membership() {
        let notes = vec![note(60, 480), note(64, 480), note(67, 480)];
        let weights = pitch_class_weights(notes.iter()).unwrap();
        let degrees = major_degrees();

        // All three pitch classes are C-major degrees.
        assert!((tonality_probability(&weights, &degrees, 0) - 1.0).abs() < 1e-12);
        // Only C (degree 11 of C#) falls in the C#-major set.
        let cs = tonality_probability(&weights, &degrees, 1);
        assert!((cs - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn probability_vector_rotates_the_degree_set() {
        let notes = vec![note(62, 480)];
        let weights = pitch_class_weights(notes.iter()).unwrap();
        let probabilities = tonality_probabilities(&weights, &major_degrees());

        // D is a degree of every major key containing pitch class 2.
        for (key, probability) in probabilities.iter().enumerate() {
            let expected = if VALID_SOLFEGE_DEGREES_DEFAULT
                .iter()
                .any(|&d| (d as usize + key) % KEYS_IN_OCTAVE == 2)
            {
                1.0
            } else {
                0.0
            };
            assert!((probability - expected).abs() < 1e-12, "key {key}");
        }
    }
}
