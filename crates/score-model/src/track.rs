use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::bar::{build_bars, Bar};
use crate::note::{Note, TimeSignature};
use crate::passage::Passage;
use crate::tonality::{HarmonicType, MAX_NOTE_KEY};
use crate::{Error, Result};

/// A melodic track of the project.
///
/// `passages: None` means the track has not been divided yet; once
/// present, every bar belongs to exactly one passage. `harmonies` is
/// the set of harmony voices requested for generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub index: usize,
    pub name: String,
    pub bars: Vec<Bar>,
    pub passages: Option<Vec<Passage>>,
    pub harmonies: Option<BTreeSet<HarmonicType>>,
}

impl Track {
    /// Build a track from raw notes and time signatures, validating all
    /// structural invariants of the result.
    pub fn build(
        index: usize,
        name: impl Into<String>,
        notes: &[Note],
        time_signatures: &[TimeSignature],
    ) -> Result<Track> {
        let track = Track {
            index,
            name: name.into(),
            bars: build_bars(notes, time_signatures),
            passages: None,
            harmonies: None,
        };
        track.ensure_valid()?;
        Ok(track)
    }

    pub fn notes(&self) -> impl Iterator<Item = &Note> {
        self.bars.iter().flat_map(|bar| bar.notes.iter())
    }

    /// True when every passage carries a resolved tonality.
    pub fn is_tonality_marked(&self) -> bool {
        self.passages
            .as_ref()
            .is_some_and(|passages| passages.iter().all(|p| p.tonality.is_some()))
    }

    /// A copy of this track with a single whole-track passage.
    pub fn passages_initialized(&self) -> Track {
        Track {
            passages: Some(vec![Passage::new(0, self.bars.clone())]),
            ..self.clone()
        }
    }

    pub fn passages_initialized_if_needed(self) -> Track {
        if self.passages.is_none() {
            self.passages_initialized()
        } else {
            self
        }
    }

    /// Apply another track's passage boundaries to this track's bars.
    ///
    /// Each incoming passage is mapped to the range of this track's
    /// bars covered by its bar indexes; passages falling entirely
    /// outside this track are dropped and the rest are reindexed.
    pub fn apply_passage_settings(&self, passages_from_other: &[Passage]) -> Track {
        let mut passages: Vec<Passage> = Vec::new();
        for other in passages_from_other {
            let indexes: Vec<usize> = other
                .bars
                .iter()
                .map(|bar| bar.index)
                .filter(|&index| index < self.bars.len())
                .collect();
            let (Some(&first), Some(&last)) = (indexes.iter().min(), indexes.iter().max()) else {
                continue;
            };
            passages.push(Passage {
                index: passages.len(),
                bars: self.bars[first..=last].to_vec(),
                tonality_certainties: other.tonality_certainties.clone(),
                tonality: other.tonality,
            });
        }
        Track {
            passages: Some(passages),
            ..self.clone()
        }
    }

    pub fn ensure_valid(&self) -> Result<()> {
        self.ensure_valid_bars()?;
        self.ensure_valid_notes()?;
        if self.passages.is_some() {
            self.ensure_valid_passages()?;
        }
        Ok(())
    }

    /// Validate the passage division and require every passage to carry
    /// a resolved tonality, as harmony generation demands.
    pub fn ensure_tonality_marked(&self) -> Result<()> {
        self.ensure_valid_passages()?;
        let passages = self
            .passages
            .as_ref()
            .ok_or(Error::PassagesNotInitialized {
                track_index: self.index,
            })?;
        for passage in passages {
            if passage.tonality.is_none() {
                return Err(Error::PassageTonalityNotMarked {
                    passage_index: passage.index,
                });
            }
        }
        Ok(())
    }

    fn ensure_valid_notes(&self) -> Result<()> {
        for note in self.notes() {
            if note.key > MAX_NOTE_KEY {
                return Err(Error::NoteKeyOutOfRange {
                    track_index: self.index,
                    note_index: note.index,
                    key: note.key,
                });
            }
            if note.tick_off <= note.tick_on {
                return Err(Error::InvalidNoteLength {
                    track_index: self.index,
                    note_index: note.index,
                });
            }
        }
        let indexes: Vec<usize> = self.notes().map(|note| note.index).collect();
        if indexes.iter().copied().ne(0..indexes.len()) {
            return Err(Error::InvalidNoteIndexes {
                track_index: self.index,
                found: indexes,
            });
        }
        let notes: Vec<&Note> = self.notes().collect();
        for pair in notes.windows(2) {
            if pair[0].tick_on >= pair[1].tick_on {
                return Err(Error::InvalidNoteOrder {
                    track_index: self.index,
                    first: pair[0].index,
                    second: pair[1].index,
                });
            }
            if pair[0].tick_off > pair[1].tick_on {
                return Err(Error::NoteOverlapping {
                    track_index: self.index,
                    first: pair[0].index,
                    second: pair[1].index,
                });
            }
        }
        Ok(())
    }

    fn ensure_valid_bars(&self) -> Result<()> {
        let indexes: Vec<usize> = self.bars.iter().map(|bar| bar.index).collect();
        if indexes.iter().copied().ne(0..self.bars.len()) {
            return Err(Error::InvalidBarIndexes {
                track_index: self.index,
                found: indexes,
            });
        }
        for pair in self.bars.windows(2) {
            if pair[0].tick_on >= pair[1].tick_on {
                return Err(Error::InvalidBarOrder {
                    track_index: self.index,
                    first: pair[0].index,
                    second: pair[1].index,
                });
            }
            if pair[0].tick_off > pair[1].tick_on {
                return Err(Error::BarOverlapping {
                    track_index: self.index,
                    first: pair[0].index,
                    second: pair[1].index,
                });
            }
        }
        Ok(())
    }

    fn ensure_valid_passages(&self) -> Result<()> {
        let passages = self
            .passages
            .as_ref()
            .ok_or(Error::PassagesNotInitialized {
                track_index: self.index,
            })?;
        let indexes: Vec<usize> = passages.iter().map(|p| p.index).collect();
        if indexes.iter().copied().ne(0..passages.len()) {
            return Err(Error::InvalidPassageIndexes {
                track_index: self.index,
                found: indexes,
            });
        }
        for passage in passages {
            if passage.bars.is_empty() {
                return Err(Error::EmptyPassage {
                    track_index: self.index,
                    passage_index: passage.index,
                });
            }
        }
        let divided: Vec<&Bar> = passages.iter().flat_map(|p| p.bars.iter()).collect();
        if divided.len() != self.bars.len()
            || divided.iter().zip(self.bars.iter()).any(|(a, b)| *a != b)
        {
            return Err(Error::InvalidPassageDivision {
                track_index: self.index,
            });
        }
        Ok(())
    }
}
