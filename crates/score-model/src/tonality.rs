use serde::{Deserialize, Serialize};

/// Number of pitch classes in an octave.
pub const KEYS_IN_OCTAVE: usize = 12;

/// Highest valid note key (MIDI convention).
pub const MAX_NOTE_KEY: u8 = 127;

/// Tonal center of a passage: twelve pitch classes plus an `Atonal`
/// sentinel for passages with no inferable key.
///
/// Hard contract: the ordinal of a melodic tonality equals its semitone
/// offset from C (C = 0, C♯ = 1, ... B = 11, Atonal = 12). Harmony
/// shift tables are indexed by this ordinal, so the declaration order
/// here must never change.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Tonality {
    C,
    Cs,
    D,
    Ds,
    E,
    F,
    Fs,
    G,
    Gs,
    A,
    As,
    B,
    Atonal,
}

impl Tonality {
    /// The twelve melodic tonalities in ascending-semitone order.
    pub const MELODIC: [Tonality; KEYS_IN_OCTAVE] = [
        Tonality::C,
        Tonality::Cs,
        Tonality::D,
        Tonality::Ds,
        Tonality::E,
        Tonality::F,
        Tonality::Fs,
        Tonality::G,
        Tonality::Gs,
        Tonality::A,
        Tonality::As,
        Tonality::B,
    ];

    /// Semitone offset from C; 12 for `Atonal`.
    pub fn ordinal(self) -> usize {
        self as usize
    }

    pub fn from_pitch_class(pitch_class: usize) -> Tonality {
        Self::MELODIC[pitch_class % KEYS_IN_OCTAVE]
    }

    pub fn is_melodic(self) -> bool {
        self != Tonality::Atonal
    }
}

impl std::fmt::Display for Tonality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Tonality::C => "C",
            Tonality::Cs => "C♯",
            Tonality::D => "D",
            Tonality::Ds => "D♯",
            Tonality::E => "E",
            Tonality::F => "F",
            Tonality::Fs => "F♯",
            Tonality::G => "G",
            Tonality::Gs => "G♯",
            Tonality::A => "A",
            Tonality::As => "A♯",
            Tonality::B => "B",
            Tonality::Atonal => "-",
        };
        write!(f, "{}", name)
    }
}

/// How confidently a tonality was inferred for a span.
///
/// Ordered: `Certain > SamelyPossible > Possible`. Only used during
/// analysis; discarded once a passage's final tonality is taken.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Certainty {
    Possible,
    SamelyPossible,
    Certain,
}

/// Interval relationship of a harmony voice to the melody.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum HarmonicType {
    Copy,
    UpperThird,
    LowerThird,
    UpperSixth,
    LowerSixth,
    UpperOctave,
    LowerOctave,
}

impl HarmonicType {
    pub const ALL: [HarmonicType; 7] = [
        HarmonicType::Copy,
        HarmonicType::UpperThird,
        HarmonicType::LowerThird,
        HarmonicType::UpperSixth,
        HarmonicType::LowerSixth,
        HarmonicType::UpperOctave,
        HarmonicType::LowerOctave,
    ];

    /// Short suffix for display and generated track names.
    pub fn simple_name(self) -> &'static str {
        match self {
            HarmonicType::Copy => "copy",
            HarmonicType::UpperThird => "+3rd",
            HarmonicType::LowerThird => "-3rd",
            HarmonicType::UpperSixth => "+6th",
            HarmonicType::LowerSixth => "-6th",
            HarmonicType::UpperOctave => "+8th",
            HarmonicType::LowerOctave => "-8th",
        }
    }

    /// Name for a generated harmony track derived from the source track.
    pub fn harmonic_track_name(self, track_name: &str) -> String {
        format!("{} {}", track_name, self.simple_name())
    }
}
