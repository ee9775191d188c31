use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default upper-third shifts, arranged to be usable over most melodies.
pub const UPPER_THIRD_SHIFT_DEFAULT: [i32; 12] = [4, 3, 5, 4, 3, 4, 3, 5, 4, 3, 4, 3];

/// Strictly diatonic upper thirds.
pub const UPPER_THIRD_SHIFT_STANDARD: [i32; 12] = [4, 3, 3, 4, 3, 4, 3, 4, 3, 3, 4, 3];

/// Default lower-third shifts, arranged to be usable over most melodies.
pub const LOWER_THIRD_SHIFT_DEFAULT: [i32; 12] = [-5, -2, -3, -3, -4, -3, -4, -3, -4, -4, -3, -4];

/// Strictly diatonic lower thirds.
pub const LOWER_THIRD_SHIFT_STANDARD: [i32; 12] = [-3, -2, -3, -3, -4, -3, -4, -3, -4, -4, -3, -4];

/// Major-scale degrees, the default evidence set for tonality estimation.
pub const VALID_SOLFEGE_DEGREES_DEFAULT: [u8; 7] = [0, 2, 4, 5, 7, 9, 11];

/// Tunable coefficients for every analysis and shift step. Never
/// mutated by the analysis code, only read.
///
/// - `min_length_ratio_of_note_for_valid_bar` in `[0, 1]`: a bar whose
///   notes occupy a smaller fraction of its length counts as invalid
///   and is treated as a passage boundary, not melodic content.
/// - `min_probability_for_certain_tonality` in `[0, 1]`: if every
///   tonality probability is below this, the estimate is unreliable
///   (inclusive boundary: equal passes).
/// - `max_probability_difference_for_similarly_certain_tonalities` in
///   `[0, 1]`: candidates within this distance of the maximum count as
///   similarly probable.
/// - `min_uncertainty_for_invalid_analysis_result` in `[0, 11]`:
///   results with at least this many candidates beyond the first are
///   discarded as too ambiguous.
/// - `min_score_for_bar_belonging_to_passage` in `[0, 1]`: threshold
///   for extending a growing passage by one bar.
/// - `min_bar_count_for_passage_auto_division` in `[1, 64]`: minimal
///   window seeded for each automatic passage.
/// - `key_shift_for_upper_third_harmony`: 12 entries in `[0, 11]`,
///   indexed by a note's scale position relative to the passage key.
/// - `key_shift_for_lower_third_harmony`: 12 entries in `[-11, 0]`.
/// - `valid_solfege_degrees_in_octave`: 1-12 distinct degrees in
///   `[0, 11]` counted as tonality evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub min_length_ratio_of_note_for_valid_bar: f64,
    pub min_probability_for_certain_tonality: f64,
    pub max_probability_difference_for_similarly_certain_tonalities: f64,
    pub min_uncertainty_for_invalid_analysis_result: usize,
    pub min_score_for_bar_belonging_to_passage: f64,
    pub min_bar_count_for_passage_auto_division: usize,
    pub key_shift_for_upper_third_harmony: Vec<i32>,
    pub key_shift_for_lower_third_harmony: Vec<i32>,
    pub valid_solfege_degrees_in_octave: BTreeSet<u8>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_length_ratio_of_note_for_valid_bar: 0.25,
            min_probability_for_certain_tonality: 0.1,
            max_probability_difference_for_similarly_certain_tonalities: 0.03,
            min_uncertainty_for_invalid_analysis_result: 3,
            min_score_for_bar_belonging_to_passage: 0.5,
            min_bar_count_for_passage_auto_division: 4,
            key_shift_for_upper_third_harmony: UPPER_THIRD_SHIFT_DEFAULT.to_vec(),
            key_shift_for_lower_third_harmony: LOWER_THIRD_SHIFT_DEFAULT.to_vec(),
            valid_solfege_degrees_in_octave: VALID_SOLFEGE_DEGREES_DEFAULT.iter().copied().collect(),
        }
    }
}

impl Config {
    /// Check every coefficient against its documented range. Called
    /// once at configuration-load time, never after.
    pub fn ensure_valid(&self) -> Result<()> {
        check_ratio(
            "min_length_ratio_of_note_for_valid_bar",
            self.min_length_ratio_of_note_for_valid_bar,
        )?;
        check_ratio(
            "min_probability_for_certain_tonality",
            self.min_probability_for_certain_tonality,
        )?;
        check_ratio(
            "max_probability_difference_for_similarly_certain_tonalities",
            self.max_probability_difference_for_similarly_certain_tonalities,
        )?;
        if self.min_uncertainty_for_invalid_analysis_result > 11 {
            return Err(Error::ConfigValueOutOfRange {
                name: "min_uncertainty_for_invalid_analysis_result",
                value: self.min_uncertainty_for_invalid_analysis_result as f64,
                range: "[0, 11]",
            });
        }
        check_ratio(
            "min_score_for_bar_belonging_to_passage",
            self.min_score_for_bar_belonging_to_passage,
        )?;
        if !(1..=64).contains(&self.min_bar_count_for_passage_auto_division) {
            return Err(Error::ConfigValueOutOfRange {
                name: "min_bar_count_for_passage_auto_division",
                value: self.min_bar_count_for_passage_auto_division as f64,
                range: "[1, 64]",
            });
        }
        check_shift_table(
            "key_shift_for_upper_third_harmony",
            &self.key_shift_for_upper_third_harmony,
            0,
            11,
        )?;
        check_shift_table(
            "key_shift_for_lower_third_harmony",
            &self.key_shift_for_lower_third_harmony,
            -11,
            0,
        )?;
        if !(1..=12).contains(&self.valid_solfege_degrees_in_octave.len()) {
            return Err(Error::ConfigWrongLength {
                name: "valid_solfege_degrees_in_octave",
                len: self.valid_solfege_degrees_in_octave.len(),
                expected: "[1, 12]",
            });
        }
        for (index, &degree) in self.valid_solfege_degrees_in_octave.iter().enumerate() {
            if degree > 11 {
                return Err(Error::ConfigEntryOutOfRange {
                    name: "valid_solfege_degrees_in_octave",
                    index,
                    value: degree as i64,
                    range: "[0, 11]",
                });
            }
        }
        Ok(())
    }
}

fn check_ratio(name: &'static str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(Error::ConfigValueOutOfRange {
            name,
            value,
            range: "[0, 1]",
        });
    }
    Ok(())
}

fn check_shift_table(name: &'static str, table: &[i32], min: i32, max: i32) -> Result<()> {
    if table.len() != 12 {
        return Err(Error::ConfigWrongLength {
            name,
            len: table.len(),
            expected: "12",
        });
    }
    for (index, &value) in table.iter().enumerate() {
        if !(min..=max).contains(&value) {
            return Err(Error::ConfigEntryOutOfRange {
                name,
                index,
                value: value as i64,
                range: if min == 0 { "[0, 11]" } else { "[-11, 0]" },
            });
        }
    }
    Ok(())
}
