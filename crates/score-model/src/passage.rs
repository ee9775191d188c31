use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::bar::Bar;
use crate::note::Note;
use crate::tonality::{Certainty, Tonality};

/// A contiguous, non-empty run of a track's bars sharing one tonal
/// classification. The smallest unit of tonality analysis and harmony
/// generation.
///
/// A passage owns a copy of its bar slice; concatenated in index order,
/// a track's passages reproduce the track's bar sequence exactly.
///
/// `tonality_certainties` records the result of a tonality analysis and
/// should not be set by hand; `tonality` is filled in by analysis or by
/// manual selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    pub index: usize,
    pub bars: Vec<Bar>,
    pub tonality_certainties: Option<BTreeMap<Tonality, Certainty>>,
    pub tonality: Option<Tonality>,
}

impl Passage {
    pub fn new(index: usize, bars: Vec<Bar>) -> Self {
        Self {
            index,
            bars,
            tonality_certainties: None,
            tonality: None,
        }
    }

    pub fn notes(&self) -> impl Iterator<Item = &Note> {
        self.bars.iter().flat_map(|bar| bar.notes.iter())
    }

    pub fn valid_length(&self) -> u64 {
        self.bars.iter().map(Bar::valid_length).sum()
    }

    /// True when no analysis has marked any candidate tonality.
    pub fn is_atonal(&self) -> bool {
        self.tonality_certainties
            .as_ref()
            .map_or(true, |certainties| certainties.is_empty())
    }

    /// True when analysis marked exactly one candidate as `Certain`.
    pub fn is_certain(&self) -> bool {
        self.certain_tonality().is_some()
    }

    /// The single `Certain` candidate, if there is exactly one.
    pub fn certain_tonality(&self) -> Option<Tonality> {
        let certainties = self.tonality_certainties.as_ref()?;
        let mut certain = certainties
            .iter()
            .filter(|(_, &certainty)| certainty == Certainty::Certain)
            .map(|(&tonality, _)| tonality);
        match (certain.next(), certain.next()) {
            (Some(tonality), None) => Some(tonality),
            _ => None,
        }
    }

    /// Resolve the passage's definitive tonality from its certainty
    /// marks: a single `Certain` candidate is taken as the tonality, an
    /// unmarked passage becomes `Atonal`, anything else is left for
    /// manual selection.
    pub fn take_certain_tonality(self) -> Self {
        if let Some(tonality) = self.certain_tonality() {
            Self {
                tonality: Some(tonality),
                ..self
            }
        } else if self.is_atonal() {
            Self {
                tonality: Some(Tonality::Atonal),
                ..self
            }
        } else {
            self
        }
    }

    /// Strip tonality marks before re-analysis.
    pub fn cleared_for_analysis(self) -> Self {
        Self {
            tonality: None,
            tonality_certainties: None,
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn bar(index: usize) -> Bar {
        Bar {
            index,
            tick_on: index as u64 * 1920,
            tick_off: (index as u64 + 1) * 1920,
            notes: vec![],
        }
    }

    fn certainties(entries: &[(Tonality, Certainty)]) -> BTreeMap<Tonality, Certainty> {
        entries.iter().copied().collect()
    }

    #[test]
    fn fresh_passage_is_atonal() {
        let passage = Passage::new(0, vec![bar(0)]);
        assert!(passage.is_atonal());
        assert!(!passage.is_certain());
    }

    #[test]
    fn take_certain_tonality_resolves_single_certain_mark() {
        let passage = Passage {
            tonality_certainties: Some(certainties(&[(Tonality::G, Certainty::Certain)])),
            ..Passage::new(0, vec![bar(0)])
        };
        assert_eq!(passage.take_certain_tonality().tonality, Some(Tonality::G));
    }

    #[test]
    fn take_certain_tonality_marks_unanalyzed_passage_atonal() {
        let passage = Passage::new(0, vec![bar(0)]);
        assert_eq!(
            passage.take_certain_tonality().tonality,
            Some(Tonality::Atonal)
        );
    }

    #[test]
    fn take_certain_tonality_leaves_ambiguous_passage_unresolved() {
        let passage = Passage {
            tonality_certainties: Some(certainties(&[
                (Tonality::C, Certainty::SamelyPossible),
                (Tonality::G, Certainty::SamelyPossible),
            ])),
            ..Passage::new(0, vec![bar(0)])
        };
        assert_eq!(passage.take_certain_tonality().tonality, None);
    }

    #[test]
    fn cleared_for_analysis_strips_marks() {
        let passage = Passage {
            tonality_certainties: Some(certainties(&[(Tonality::C, Certainty::Certain)])),
            tonality: Some(Tonality::C),
            ..Passage::new(0, vec![bar(0)])
        };
        let cleared = passage.cleared_for_analysis();
        assert_eq!(cleared.tonality, None);
        assert_eq!(cleared.tonality_certainties, None);
    }
}
