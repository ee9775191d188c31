pub mod analysis;
pub mod config;
pub mod shift;
pub mod solfege;

pub use analysis::{analyze_track_auto, analyze_track_semi_auto, PassageAnalysis, TrackAnalysis};
pub use config::Config;
pub use shift::note_shifts;

use std::collections::{BTreeMap, BTreeSet};

use tracing::info;

use score_model::{Content, HarmonicType, NoteShift, Passage, Track};

/// Errors from configuration validation and structural checks.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config parameter {name} is {value}, outside {range}")]
    ConfigValueOutOfRange {
        name: &'static str,
        value: f64,
        range: &'static str,
    },
    #[error("config parameter {name} has {len} entries, expected {expected}")]
    ConfigWrongLength {
        name: &'static str,
        len: usize,
        expected: &'static str,
    },
    #[error("config parameter {name}[{index}] is {value}, outside {range}")]
    ConfigEntryOutOfRange {
        name: &'static str,
        index: usize,
        value: i64,
        range: &'static str,
    },
    #[error(transparent)]
    Model(#[from] score_model::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Drives tonality analysis and harmony generation over a content
/// snapshot.
///
/// Holds the current project content and configuration. Every operation
/// takes the full content snapshot and writes back a full new snapshot;
/// no partial mutation is ever exposed. Callers that edit the same
/// content concurrently must serialize their read-modify-write cycles.
pub struct HarmonyEngine {
    content: Content,
    config: Config,
}

impl HarmonyEngine {
    /// Validate and adopt content with the given configuration. Tracks
    /// without a passage division get a single whole-track passage.
    pub fn new(content: Content, config: Config) -> Result<Self> {
        config.ensure_valid()?;
        content.ensure_valid()?;
        Ok(Self {
            content: content.initialize_passages_if_needed(),
            config,
        })
    }

    pub fn with_default_config(content: Content) -> Result<Self> {
        Self::new(content, Config::default())
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Load a new project, replacing the current content.
    pub fn load(&mut self, content: Content) -> Result<()> {
        content.ensure_valid()?;
        self.content = content.initialize_passages_if_needed();
        info!(tracks = self.content.tracks.len(), "content loaded");
        Ok(())
    }

    /// Swap in a new configuration after validating it.
    pub fn reload_config(&mut self, config: Config) -> Result<()> {
        config.ensure_valid()?;
        self.config = config;
        Ok(())
    }

    /// Automatically divide a track into passages and estimate their
    /// tonalities. On success the division is stored on the track; a
    /// `TooShort` outcome leaves the track untouched.
    pub fn set_passages_auto(&mut self, track_index: usize) -> Result<TrackAnalysis> {
        let track = self.content.track(track_index)?;
        let result = analyze_track_auto(track, &self.config);
        if let TrackAnalysis::Divided { passages, .. } = &result {
            let passages = passages.clone();
            self.update_track(track_index, move |track| Track {
                passages: Some(passages),
                ..track
            })?;
        }
        info!(track = track_index, "automatic passage analysis finished");
        Ok(result)
    }

    /// Re-estimate the tonality of passages whose boundaries were fixed
    /// by hand. Prior tonality marks on the given passages are ignored.
    pub fn set_passages_semi_auto(
        &mut self,
        track_index: usize,
        passages: Vec<Passage>,
    ) -> Result<TrackAnalysis> {
        self.update_track(track_index, move |track| Track {
            passages: Some(
                passages
                    .into_iter()
                    .map(Passage::cleared_for_analysis)
                    .collect(),
            ),
            ..track
        })?;
        let track = self.content.track(track_index)?;
        let result = analyze_track_semi_auto(track, &self.config);
        if let TrackAnalysis::Divided { passages, .. } = &result {
            let passages = passages.clone();
            self.update_track(track_index, move |track| Track {
                passages: Some(passages),
                ..track
            })?;
        }
        info!(track = track_index, "semi-automatic passage analysis finished");
        Ok(result)
    }

    /// Store edited passages on a track. Returns whether every passage
    /// now carries a resolved tonality.
    pub fn save_passages(&mut self, track_index: usize, passages: Vec<Passage>) -> Result<bool> {
        self.update_track(track_index, move |track| Track {
            passages: Some(passages),
            ..track
        })?;
        Ok(self.content.track(track_index)?.is_tonality_marked())
    }

    /// Store the set of harmony voices to generate for a track.
    pub fn save_harmonic_types(
        &mut self,
        track_index: usize,
        harmonic_types: BTreeSet<HarmonicType>,
    ) -> Result<()> {
        self.update_track(track_index, move |track| Track {
            harmonies: Some(harmonic_types),
            ..track
        })
    }

    /// Copy one track's passage boundaries onto another track.
    pub fn copy_passages(&mut self, from_index: usize, to_index: usize) -> Result<()> {
        let passages = self.require_passages(from_index)?;
        self.update_track(to_index, move |track| {
            track.apply_passage_settings(&passages)
        })
    }

    /// Copy one track's passage boundaries onto every other track.
    pub fn copy_passages_to_all_tracks(&mut self, from_index: usize) -> Result<()> {
        let passages = self.require_passages(from_index)?;
        for index in 0..self.content.tracks.len() {
            if index == from_index {
                continue;
            }
            let passages = passages.clone();
            self.update_track(index, move |track| track.apply_passage_settings(&passages))?;
        }
        Ok(())
    }

    /// Pitch deltas for one harmony voice over a whole track. Fails
    /// when any passage lacks a resolved tonality.
    pub fn note_shifts(
        &self,
        track_index: usize,
        harmonic_type: HarmonicType,
    ) -> Result<Vec<NoteShift>> {
        let track = self.content.track(track_index)?;
        track.ensure_tonality_marked()?;

        let mut shifts = Vec::new();
        for passage in track.passages.iter().flatten() {
            shifts.extend(shift::note_shifts(passage, harmonic_type, &self.config)?);
        }
        Ok(shifts)
    }

    /// Shift lists for every harmony voice requested on the track.
    pub fn all_harmony_tracks(
        &self,
        track_index: usize,
    ) -> Result<BTreeMap<HarmonicType, Vec<NoteShift>>> {
        let harmonic_types = self
            .content
            .track(track_index)?
            .harmonies
            .clone()
            .unwrap_or_default();
        let mut tracks = BTreeMap::new();
        for harmonic_type in harmonic_types {
            tracks.insert(harmonic_type, self.note_shifts(track_index, harmonic_type)?);
        }
        Ok(tracks)
    }

    fn require_passages(&self, track_index: usize) -> Result<Vec<Passage>> {
        let track = self.content.track(track_index)?;
        track
            .passages
            .clone()
            .ok_or(Error::Model(score_model::Error::PassagesNotInitialized {
                track_index,
            }))
    }

    fn update_track(
        &mut self,
        track_index: usize,
        updater: impl FnOnce(Track) -> Track,
    ) -> Result<()> {
        self.content = self.content.update_track(track_index, updater)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use score_model::{Note, TimeSignature, Tonality};

    const BAR_TICKS: u64 = 1920;
    const C_SCALE: [u8; 7] = [60, 62, 64, 65, 67, 69, 71];

    fn scale_track(index: usize, bar_count: usize) -> Track {
        let mut notes = Vec::new();
        for bar in 0..bar_count {
            let mut tick = bar as u64 * BAR_TICKS;
            for &key in &C_SCALE {
                notes.push(Note {
                    index: notes.len(),
                    key,
                    tick_on: tick,
                    tick_off: tick + 240,
                    lyric: "la".into(),
                });
                tick += 240;
            }
        }
        let signatures = vec![TimeSignature {
            measure_position: 0,
            ticks_in_measure: BAR_TICKS,
        }];
        Track::build(index, format!("track {index}"), &notes, &signatures).unwrap()
    }

    fn engine() -> HarmonyEngine {
        let content = Content::new(vec![scale_track(0, 4), scale_track(1, 4)]);
        HarmonyEngine::with_default_config(content).unwrap()
    }

    #[test]
    fn new_initializes_passages_on_every_track() {
        let engine = engine();
        for track in &engine.content().tracks {
            assert!(track.passages.is_some());
        }
    }

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let content = Content::new(vec![scale_track(0, 4)]);
        let config = Config {
            min_bar_count_for_passage_auto_division: 0,
            ..Config::default()
        };
        assert!(HarmonyEngine::new(content, config).is_err());
    }

    #[test]
    fn auto_analysis_stores_the_division() {
        let mut engine = engine();
        let result = engine.set_passages_auto(0).unwrap();
        let TrackAnalysis::Divided { passages, .. } = result else {
            panic!("four C-major bars divide cleanly");
        };
        assert_eq!(passages.len(), 1);
        assert_eq!(passages[0].tonality, Some(Tonality::C));

        let stored = engine.content().track(0).unwrap();
        assert_eq!(stored.passages.as_ref().unwrap(), &passages);
        assert!(stored.is_tonality_marked());
    }

    #[test]
    fn harmony_generation_requires_resolved_tonalities() {
        let engine = engine();
        // Freshly initialized whole-track passage has no tonality yet.
        assert!(matches!(
            engine.note_shifts(0, HarmonicType::UpperThird),
            Err(Error::Model(
                score_model::Error::PassageTonalityNotMarked { .. }
            ))
        ));
    }

    #[test]
    fn full_flow_produces_shifts_per_requested_type() {
        let mut engine = engine();
        engine.set_passages_auto(0).unwrap();
        engine
            .save_harmonic_types(
                0,
                [HarmonicType::UpperThird, HarmonicType::LowerOctave]
                    .into_iter()
                    .collect(),
            )
            .unwrap();

        let harmony_tracks = engine.all_harmony_tracks(0).unwrap();
        assert_eq!(harmony_tracks.len(), 2);
        let upper = &harmony_tracks[&HarmonicType::UpperThird];
        assert_eq!(upper.len(), 28);
        // Scenario C: a note at relative degree 0 moves up four
        // semitones, C to E.
        assert_eq!(upper[0].key_delta, 4);
        assert!(harmony_tracks[&HarmonicType::LowerOctave]
            .iter()
            .all(|shift| shift.key_delta == -12));
    }

    #[test]
    fn save_passages_reports_whether_all_are_marked() {
        let mut engine = engine();
        let bars = engine.content().track(0).unwrap().bars.clone();

        let unmarked = vec![Passage::new(0, bars.clone())];
        assert!(!engine.save_passages(0, unmarked).unwrap());

        let marked = vec![Passage {
            tonality: Some(Tonality::C),
            ..Passage::new(0, bars)
        }];
        assert!(engine.save_passages(0, marked).unwrap());
    }

    #[test]
    fn copy_passages_transfers_boundaries() {
        let mut engine = engine();
        engine.set_passages_auto(0).unwrap();
        engine.copy_passages(0, 1).unwrap();

        let target = engine.content().track(1).unwrap();
        target.ensure_valid().unwrap();
        let passages = target.passages.as_ref().unwrap();
        assert_eq!(passages.len(), 1);
        assert_eq!(passages[0].tonality, Some(Tonality::C));
    }

    #[test]
    fn semi_auto_respects_manual_boundaries() {
        let mut engine = engine();
        let bars = engine.content().track(0).unwrap().bars.clone();
        let manual = vec![
            Passage::new(0, bars[..2].to_vec()),
            Passage::new(1, bars[2..].to_vec()),
        ];

        let result = engine.set_passages_semi_auto(0, manual).unwrap();
        let TrackAnalysis::Divided { passages, .. } = result else {
            panic!("semi-auto never fails");
        };
        assert_eq!(passages.len(), 2);
        assert!(passages
            .iter()
            .all(|p| p.tonality == Some(Tonality::C)));
    }
}
