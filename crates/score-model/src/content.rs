use serde::{Deserialize, Serialize};

use crate::track::Track;
use crate::{Error, Result};

/// The full project: an index-addressable collection of tracks. A
/// track's index always equals its position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    pub tracks: Vec<Track>,
}

impl Content {
    pub fn new(tracks: Vec<Track>) -> Self {
        Self { tracks }
    }

    pub fn track(&self, index: usize) -> Result<&Track> {
        self.tracks
            .get(index)
            .ok_or(Error::TrackNotExisting { track_index: index })
    }

    /// A copy with one track replaced through `updater`.
    pub fn update_track(
        &self,
        index: usize,
        updater: impl FnOnce(Track) -> Track,
    ) -> Result<Content> {
        let track = self.track(index)?.clone();
        let mut tracks = self.tracks.clone();
        tracks[index] = updater(track);
        Ok(Content { tracks })
    }

    pub fn initialize_passages_if_needed(self) -> Content {
        Content {
            tracks: self
                .tracks
                .into_iter()
                .map(Track::passages_initialized_if_needed)
                .collect(),
        }
    }

    pub fn ensure_valid(&self) -> Result<()> {
        let indexes: Vec<usize> = self.tracks.iter().map(|track| track.index).collect();
        if indexes.iter().copied().ne(0..self.tracks.len()) {
            return Err(Error::InvalidTrackIndexes { found: indexes });
        }
        for track in &self.tracks {
            track.ensure_valid()?;
        }
        Ok(())
    }
}
