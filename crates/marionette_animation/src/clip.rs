use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::tracks::BoneTrack;

/// Immutable animation clip authored against abstract bone keys.
///
/// Key times, `duration` and playback cursors are all measured in clip
/// ticks; `ticks_per_second` converts wall-clock seconds into ticks.
/// Shared read-only (`Arc<AnimationClip>`) between any number of players.
#[derive(Debug, Clone)]
pub struct AnimationClip {
    pub name: String,
    pub duration: f32,
    pub ticks_per_second: f32,

    tracks: Vec<(Arc<str>, BoneTrack)>,
    index: FxHashMap<Arc<str>, usize>,
}

impl AnimationClip {
    /// Creates a clip. A non-positive `ticks_per_second` falls back to 1.0,
    /// i.e. keys measured in seconds.
    ///
    /// When the same key appears twice the later track wins.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        duration: f32,
        ticks_per_second: f32,
        tracks: impl IntoIterator<Item = (impl Into<Arc<str>>, BoneTrack)>,
    ) -> Self {
        let mut list: Vec<(Arc<str>, BoneTrack)> = Vec::new();
        let mut index: FxHashMap<Arc<str>, usize> = FxHashMap::default();

        for (key, track) in tracks {
            let key: Arc<str> = key.into();
            if let Some(&existing) = index.get(&key) {
                list[existing].1 = track;
            } else {
                index.insert(key.clone(), list.len());
                list.push((key, track));
            }
        }

        let ticks_per_second = if ticks_per_second > 0.0 {
            ticks_per_second
        } else {
            1.0
        };

        Self {
            name: name.into(),
            duration,
            ticks_per_second,
            tracks: list,
            index,
        }
    }

    /// Creates a clip keyed in seconds whose duration is the latest key of
    /// any channel.
    #[must_use]
    pub fn from_tracks(
        name: impl Into<String>,
        tracks: impl IntoIterator<Item = (impl Into<Arc<str>>, BoneTrack)>,
    ) -> Self {
        let mut clip = Self::new(name, 0.0, 1.0, tracks);
        clip.duration = clip
            .tracks
            .iter()
            .map(|(_, t)| t.end_time())
            .fold(0.0_f32, f32::max);
        clip
    }

    #[inline]
    #[must_use]
    pub fn track(&self, key: &str) -> Option<&BoneTrack> {
        self.index.get(key).map(|&i| &self.tracks[i].1)
    }

    #[inline]
    #[must_use]
    pub fn track_index(&self, key: &str) -> Option<usize> {
        self.index.get(key).copied()
    }

    #[inline]
    #[must_use]
    pub fn track_at(&self, index: usize) -> Option<&BoneTrack> {
        self.tracks.get(index).map(|(_, t)| t)
    }

    /// Abstract keys animated by this clip, in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.tracks.iter().map(|(k, _)| k.as_ref())
    }

    #[inline]
    #[must_use]
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    #[inline]
    #[must_use]
    pub fn duration_seconds(&self) -> f32 {
        self.duration / self.ticks_per_second
    }
}
