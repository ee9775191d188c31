pub mod bar;
pub mod content;
pub mod note;
pub mod passage;
pub mod tonality;
pub mod track;

pub use bar::{build_bars, Bar};
pub use content::Content;
pub use note::{Note, NoteShift, TimeSignature};
pub use passage::Passage;
pub use tonality::{Certainty, HarmonicType, Tonality, KEYS_IN_OCTAVE, MAX_NOTE_KEY};
pub use track::Track;

/// Structural violations in score data.
///
/// Every variant is fatal to the operation that detects it and is
/// surfaced to the caller; nothing is silently repaired.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("track {track_index}: note indexes {found:?} are not contiguous from 0")]
    InvalidNoteIndexes { track_index: usize, found: Vec<usize> },
    #[error("track {track_index}: notes {first} and {second} are out of order")]
    InvalidNoteOrder {
        track_index: usize,
        first: usize,
        second: usize,
    },
    #[error("track {track_index}: notes {first} and {second} overlap")]
    NoteOverlapping {
        track_index: usize,
        first: usize,
        second: usize,
    },
    #[error("track {track_index}: note {note_index} has key {key} above 127")]
    NoteKeyOutOfRange {
        track_index: usize,
        note_index: usize,
        key: u8,
    },
    #[error("track {track_index}: note {note_index} has non-positive length")]
    InvalidNoteLength {
        track_index: usize,
        note_index: usize,
    },
    #[error("track {track_index}: bar indexes {found:?} are not contiguous from 0")]
    InvalidBarIndexes { track_index: usize, found: Vec<usize> },
    #[error("track {track_index}: bars {first} and {second} are out of order")]
    InvalidBarOrder {
        track_index: usize,
        first: usize,
        second: usize,
    },
    #[error("track {track_index}: bars {first} and {second} overlap")]
    BarOverlapping {
        track_index: usize,
        first: usize,
        second: usize,
    },
    #[error("track {track_index}: passage indexes {found:?} are not contiguous from 0")]
    InvalidPassageIndexes { track_index: usize, found: Vec<usize> },
    #[error("track {track_index}: passage {passage_index} has no bars")]
    EmptyPassage {
        track_index: usize,
        passage_index: usize,
    },
    #[error("track {track_index}: passages do not reproduce the track's bars exactly")]
    InvalidPassageDivision { track_index: usize },
    #[error("track {track_index}: passages have not been initialized")]
    PassagesNotInitialized { track_index: usize },
    #[error("passage {passage_index} has no tonality marked")]
    PassageTonalityNotMarked { passage_index: usize },
    #[error("track indexes {found:?} are not contiguous from 0")]
    InvalidTrackIndexes { found: Vec<usize> },
    #[error("track {track_index} does not exist")]
    TrackNotExisting { track_index: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
