use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::clip::AnimationClip;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LoopMode {
    #[default]
    Loop,
    Once,
    PingPong,
}

/// One clip plus a local playback cursor.
///
/// Knows nothing about bones; it only moves `time` through the clip. An
/// unbound state (no clip) is "invalid" and ignores every advance.
#[derive(Debug, Clone)]
pub struct PlaybackState {
    clip: Option<Arc<AnimationClip>>,

    /// Cursor in clip ticks.
    pub time: f32,
    pub speed: f32,
    pub mode: LoopMode,
    /// Running backwards (ping-pong second half).
    pub reverse: bool,
    /// Cross-fade weight, owned by the layer's transition logic.
    pub weight: f32,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            clip: None,
            time: 0.0,
            speed: 1.0,
            mode: LoopMode::Loop,
            reverse: false,
            weight: 1.0,
        }
    }
}

impl PlaybackState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `clip` and rewinds. The state is valid iff a clip is given.
    pub fn play(&mut self, clip: Option<Arc<AnimationClip>>, speed: f32, mode: LoopMode) {
        self.clip = clip;
        self.speed = speed;
        self.mode = mode;
        self.time = 0.0;
        self.weight = 1.0;
        self.reverse = false;
    }

    pub fn invalidate(&mut self) {
        self.clip = None;
    }

    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.clip.is_some()
    }

    #[inline]
    #[must_use]
    pub fn clip(&self) -> Option<&Arc<AnimationClip>> {
        self.clip.as_ref()
    }

    #[must_use]
    pub fn duration(&self) -> f32 {
        self.clip.as_ref().map_or(0.0, |c| c.duration)
    }

    /// Cursor as a fraction of the clip duration, 0 when unbound.
    #[must_use]
    pub fn normalized_time(&self) -> f32 {
        let duration = self.duration();
        if duration > 0.0 {
            self.time / duration
        } else {
            0.0
        }
    }

    /// Signed speed the cursor moves at. Only the return leg of a ping-pong
    /// runs against `speed`.
    #[inline]
    #[must_use]
    pub fn effective_speed(&self) -> f32 {
        if self.mode == LoopMode::PingPong && self.reverse {
            -self.speed
        } else {
            self.speed
        }
    }

    /// Switches the wrap mode in place. Leaving ping-pong drops its return
    /// leg.
    pub fn set_mode(&mut self, mode: LoopMode) {
        if mode != LoopMode::PingPong {
            self.reverse = false;
        }
        self.mode = mode;
    }

    /// Advances the cursor by `dt` seconds.
    ///
    /// The cursor is measured in clip ticks, so it moves by
    /// `dt × effective speed × ticks_per_second`. Clips keyed in seconds have
    /// a rate of 1 and move by exactly `dt × effective speed`.
    pub fn advance(&mut self, dt: f32) {
        let Some(clip) = &self.clip else {
            return;
        };
        let duration = clip.duration;
        if duration <= 0.0 {
            return;
        }

        let speed = self.effective_speed();
        self.time += dt * speed * clip.ticks_per_second;

        match self.mode {
            LoopMode::Loop => {
                // Wraps in both directions so negative speed works
                self.time = self.time.rem_euclid(duration);
            }
            LoopMode::Once => {
                self.time = self.time.clamp(0.0, duration);
            }
            LoopMode::PingPong => {
                if self.time >= duration {
                    self.time = duration;
                    self.reverse = true;
                } else if self.time <= 0.0 {
                    self.time = 0.0;
                    self.reverse = false;
                }
            }
        }
    }
}
