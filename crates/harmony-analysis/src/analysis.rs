use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use score_model::{Bar, Certainty, Passage, Tonality, Track, KEYS_IN_OCTAVE};

use crate::config::Config;
use crate::solfege::{pitch_class_weights, tonality_probabilities, tonality_probability};

/// Outcome of a track-level tonality analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackAnalysis {
    /// Passages were divided and estimated. Some may still lack a
    /// resolved tonality and need manual selection before harmony
    /// generation.
    Divided {
        passages: Vec<Passage>,
        passage_results: Vec<PassageAnalysis>,
    },
    /// Not enough bars to seed the automatic window. A normal outcome,
    /// not an error; fall back to manual or semi-automatic division.
    TooShort,
}

/// Per-passage detail of a successful analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassageAnalysis {
    /// A single tonality was detected and already marked on the passage.
    Certain(Tonality),
    /// Several similarly probable tonalities, most certain first; the
    /// user has to pick one.
    SimilarlyCertain(Vec<Tonality>),
    /// No viable tonality; the passage is marked atonal and excluded
    /// from harmony generation.
    Unknown,
}

/// Divide a track into passages and estimate each passage's tonality.
///
/// Greedy left-to-right scan: seed a minimal window of
/// `min_bar_count_for_passage_auto_division` bars (skipping leading
/// empty/invalid bars, and pulling a trailing invalid bar out of the
/// previous passage into the new one), then extend one bar at a time
/// while the next bar still fits the running estimate. Adjacent
/// passages with identical certainty maps are merged, indexes are
/// reassigned, and certain results are resolved into tonalities.
pub fn analyze_track_auto(track: &Track, config: &Config) -> TrackAnalysis {
    let bars = &track.bars;
    let bar_total = bars.len();
    let min_bar_count = config.min_bar_count_for_passage_auto_division;
    if bar_total < min_bar_count {
        debug!(track = track.index, bars = bar_total, "track too short for automatic division");
        return TrackAnalysis::TooShort;
    }

    let mut passages: Vec<Passage> = Vec::new();
    let mut next_start = 0usize;

    for passage_index in 0..bar_total {
        let mut start = next_start;
        let mut first = start;

        // A trailing invalid bar is boundary material, not melodic
        // content; move it out of the previous passage into this one.
        if start > 0 && !bar_is_valid(&bars[start - 1], config) {
            first -= 1;
            start -= 1;
            if let Some(previous) = passages.last_mut() {
                previous.bars.pop();
            }
        }

        // Too few bars remain for another full window; the tail becomes
        // the final passage.
        if start + min_bar_count >= bar_total {
            let passage = estimate_tonality(Passage::new(passage_index, bars[first..].to_vec()), config);
            passages.push(passage);
            break;
        }

        let mut pos = start;
        while pos < bar_total && (bars[pos].is_empty() || !bar_is_valid(&bars[pos], config)) {
            pos += 1;
        }
        if pos + min_bar_count - 1 >= bar_total {
            debug!(track = track.index, "not enough valid bars left to seed a passage");
            return TrackAnalysis::TooShort;
        }
        pos += min_bar_count - 1;

        let mut last = pos;
        let mut passage = Passage::new(passage_index, bars[first..=last].to_vec());
        let mut closed = false;
        while pos < bar_total - 1 {
            pos += 1;
            passage = estimate_tonality(passage, config);
            if bar_belongs_to_passage(&bars[pos], &passage, config) {
                last += 1;
                passage.bars = bars[first..=last].to_vec();
            } else {
                pos -= 1;
                passages.push(passage.clone());
                closed = true;
                break;
            }
        }
        if !closed {
            passages.push(passage);
            break;
        }
        next_start = pos + 1;
    }

    // Coalesce runs of passages whose analysis came out identical.
    let mut merged: Vec<Passage> = Vec::new();
    for passage in passages {
        match merged.last_mut() {
            Some(previous)
                if previous.tonality_certainties == passage.tonality_certainties =>
            {
                previous.bars.extend(passage.bars);
            }
            _ => merged.push(passage),
        }
    }

    let passages: Vec<Passage> = merged
        .into_iter()
        .enumerate()
        .map(|(index, passage)| Passage { index, ..passage }.take_certain_tonality())
        .collect();
    let passage_results = passages.iter().map(passage_analysis).collect();
    debug!(track = track.index, passages = passages.len(), "automatic passage division complete");
    TrackAnalysis::Divided {
        passages,
        passage_results,
    }
}

/// Re-estimate the tonality of each already-divided passage without
/// moving any boundary. A track with no division yet is treated as one
/// whole-track passage. Never fails with `TooShort`.
pub fn analyze_track_semi_auto(track: &Track, config: &Config) -> TrackAnalysis {
    let initialized: Vec<Passage>;
    let passages: &[Passage] = match &track.passages {
        Some(passages) => passages,
        None => {
            initialized = vec![Passage::new(0, track.bars.clone())];
            &initialized
        }
    };
    let passages: Vec<Passage> = passages
        .iter()
        .cloned()
        .map(|passage| estimate_tonality(passage, config).take_certain_tonality())
        .collect();
    let passage_results = passages.iter().map(passage_analysis).collect();
    TrackAnalysis::Divided {
        passages,
        passage_results,
    }
}

/// Condense a passage's certainty marks into the reported result shape.
pub fn passage_analysis(passage: &Passage) -> PassageAnalysis {
    if let Some(tonality) = passage.certain_tonality() {
        return PassageAnalysis::Certain(tonality);
    }
    if passage.is_atonal() {
        return PassageAnalysis::Unknown;
    }
    let mut entries: Vec<(Tonality, Certainty)> = passage
        .tonality_certainties
        .as_ref()
        .map(|map| map.iter().map(|(&t, &c)| (t, c)).collect())
        .unwrap_or_default();
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    PassageAnalysis::SimilarlyCertain(entries.into_iter().map(|(tonality, _)| tonality).collect())
}

/// Re-estimate a passage's certainty marks from its current bars.
///
/// A span with no note duration, or one whose best probability falls
/// below the certainty threshold, keeps whatever marks it already had.
fn estimate_tonality(passage: Passage, config: &Config) -> Passage {
    let Some(weights) = pitch_class_weights(passage.notes()) else {
        return passage;
    };
    let probabilities = tonality_probabilities(&weights, &config.valid_solfege_degrees_in_octave);
    match classify(&probabilities, config) {
        Some(certainties) => Passage {
            tonality_certainties: Some(certainties),
            ..passage
        },
        None => passage,
    }
}

/// Turn a probability vector into certainty marks.
///
/// `None` means no candidate reached the certainty threshold. An empty
/// map means the result was too ambiguous and was discarded.
pub(crate) fn classify(
    probabilities: &[f64; KEYS_IN_OCTAVE],
    config: &Config,
) -> Option<BTreeMap<Tonality, Certainty>> {
    let max_probability = probabilities.iter().copied().fold(f64::MIN, f64::max);
    if max_probability < config.min_probability_for_certain_tonality {
        return None;
    }

    let mut certainties: BTreeMap<Tonality, Certainty> = BTreeMap::new();
    let mut uncertainty: isize = -1;
    for (key, &probability) in probabilities.iter().enumerate() {
        if probability == max_probability {
            certainties.insert(Tonality::from_pitch_class(key), Certainty::SamelyPossible);
            uncertainty += 1;
        } else if max_probability - probability
            <= config.max_probability_difference_for_similarly_certain_tonalities
        {
            certainties.insert(Tonality::from_pitch_class(key), Certainty::Possible);
            uncertainty += 1;
        }
    }
    let most_possible = probabilities
        .iter()
        .position(|&p| p == max_probability)
        .unwrap_or(0);

    if uncertainty == 0 {
        certainties.insert(Tonality::from_pitch_class(most_possible), Certainty::Certain);
    } else if uncertainty >= config.min_uncertainty_for_invalid_analysis_result as isize {
        certainties.clear();
    } else {
        // Relative major/minor and dominant keys produce near-identical
        // degree statistics. When the top three candidates line up with
        // the Do-Fa-Sol spacing, collapse the result to the anchor of
        // the matched pattern; the first matching branch wins.
        let mut indexed: Vec<(usize, f64)> = probabilities.iter().copied().enumerate().collect();
        indexed.sort_by(|a, b| b.1.total_cmp(&a.1));
        let mut top: Vec<usize> = indexed.iter().take(3).map(|&(key, _)| key).collect();
        top.sort_unstable();
        let (t1, t2, t3) = (top[0], top[1], top[2]);

        let anchor = if t1 + 5 == t2 || t2 + 2 == t3 {
            Some(t1)
        } else if t2 + 5 == t3 || t3 + 2 == t1 + KEYS_IN_OCTAVE {
            Some(t2)
        } else if t3 + 5 == t1 + KEYS_IN_OCTAVE || t1 + 2 == t2 {
            Some(t3)
        } else {
            None
        };
        if let Some(anchor) = anchor {
            certainties.clear();
            certainties.insert(Tonality::from_pitch_class(anchor), Certainty::Certain);
        }
    }
    Some(certainties)
}

/// A bar is melodic content only when its notes occupy a large enough
/// fraction of its length.
pub(crate) fn bar_is_valid(bar: &Bar, config: &Config) -> bool {
    bar.valid_length() as f64 / bar.length() as f64
        >= config.min_length_ratio_of_note_for_valid_bar
}

/// Judge whether a bar fits a growing passage.
///
/// Empty and invalid bars carry no evidence and always belong, as does
/// any bar when the passage is atonal. A certain passage requires the
/// bar to score against its single key; an ambiguous one accepts the
/// bar if any still-plausible candidate scores.
pub(crate) fn bar_belongs_to_passage(bar: &Bar, passage: &Passage, config: &Config) -> bool {
    if bar.is_empty() || !bar_is_valid(bar, config) {
        return true;
    }
    if passage.is_atonal() {
        return true;
    }
    let Some(weights) = pitch_class_weights(bar.notes.iter()) else {
        return true;
    };
    let degrees = &config.valid_solfege_degrees_in_octave;
    let threshold = config.min_score_for_bar_belonging_to_passage;

    if let Some(tonality) = passage.certain_tonality() {
        tonality_probability(&weights, degrees, tonality.ordinal()) >= threshold
    } else if let Some(certainties) = &passage.tonality_certainties {
        certainties
            .keys()
            .any(|tonality| tonality_probability(&weights, degrees, tonality.ordinal()) >= threshold)
    } else {
        true
    }
}
