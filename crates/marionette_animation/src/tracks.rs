use glam::{Quat, Vec3};
use marionette_core::errors::{AnimationError, Result};
use marionette_core::BoneTransform;

use crate::values::Interpolatable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterpolationMode {
    #[default]
    Linear,
    Step,
}

/// Sparse, time-ordered keys of one channel.
///
/// Times are strictly increasing. Channels of the same bone are independent
/// and need not share key times.
#[derive(Debug, Clone)]
pub struct KeyframeTrack<T: Interpolatable> {
    pub times: Vec<f32>,
    pub values: Vec<T>,
    pub interpolation: InterpolationMode,
}

impl<T: Interpolatable> Default for KeyframeTrack<T> {
    fn default() -> Self {
        Self {
            times: Vec::new(),
            values: Vec::new(),
            interpolation: InterpolationMode::Linear,
        }
    }
}

impl<T: Interpolatable> KeyframeTrack<T> {
    /// Builds a track without validating it. Importers that already
    /// guarantee sorted keys use this.
    #[must_use]
    pub fn new(times: Vec<f32>, values: Vec<T>, interpolation: InterpolationMode) -> Self {
        Self {
            times,
            values,
            interpolation,
        }
    }

    /// Builds a track, checking lengths and strictly increasing times.
    pub fn try_new(times: Vec<f32>, values: Vec<T>, interpolation: InterpolationMode) -> Result<Self> {
        if times.len() != values.len() {
            return Err(AnimationError::KeyframeLengthMismatch {
                times: times.len(),
                values: values.len(),
            });
        }
        if let Some(index) = times.windows(2).position(|w| w[1] <= w[0]) {
            return Err(AnimationError::UnsortedKeyframes {
                index: index + 1,
                previous: times[index],
                current: times[index + 1],
            });
        }
        Ok(Self::new(times, values, interpolation))
    }

    /// Builds a linear track from `(time, value)` pairs.
    pub fn from_keys(keys: impl IntoIterator<Item = (f32, T)>) -> Result<Self> {
        let (times, values): (Vec<f32>, Vec<T>) = keys.into_iter().unzip();
        Self::try_new(times, values, InterpolationMode::Linear)
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty() || self.values.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.times.len().min(self.values.len())
    }

    #[inline]
    #[must_use]
    pub fn start_time(&self) -> Option<f32> {
        self.times.first().copied()
    }

    #[inline]
    #[must_use]
    pub fn end_time(&self) -> Option<f32> {
        self.times.get(self.len().checked_sub(1)?).copied()
    }

    /// Samples the track at `time`.
    ///
    /// Returns `None` for an empty track. Outside the keyed range the first or
    /// last value is held.
    #[must_use]
    pub fn sample(&self, time: f32) -> Option<T> {
        let len = self.len();
        if len == 0 {
            return None;
        }

        let last = len - 1;
        if time >= self.times[last] {
            return Some(self.values[last]);
        }

        // First key with t >= time
        let next_idx = self.times[..len].partition_point(|&t| t < time);
        if next_idx == 0 {
            return Some(self.values[0]);
        }

        let prev_idx = next_idx - 1;
        match self.interpolation {
            InterpolationMode::Step => Some(self.values[prev_idx]),
            InterpolationMode::Linear => {
                let t0 = self.times[prev_idx];
                let dt = self.times[next_idx] - t0;
                // Coincident keys: hold the previous value
                let t = if dt > 0.0 { ((time - t0) / dt).clamp(0.0, 1.0) } else { 0.0 };
                Some(T::interpolate_linear(
                    &self.values[prev_idx],
                    &self.values[next_idx],
                    t,
                ))
            }
        }
    }
}

/// Position, rotation and scale channels for one abstract bone.
#[derive(Debug, Clone, Default)]
pub struct BoneTrack {
    pub position: KeyframeTrack<Vec3>,
    pub rotation: KeyframeTrack<Quat>,
    pub scale: KeyframeTrack<Vec3>,
}

impl BoneTrack {
    #[must_use]
    pub fn new(
        position: KeyframeTrack<Vec3>,
        rotation: KeyframeTrack<Quat>,
        scale: KeyframeTrack<Vec3>,
    ) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    #[must_use]
    pub fn with_position(mut self, track: KeyframeTrack<Vec3>) -> Self {
        self.position = track;
        self
    }

    #[must_use]
    pub fn with_rotation(mut self, track: KeyframeTrack<Quat>) -> Self {
        self.rotation = track;
        self
    }

    #[must_use]
    pub fn with_scale(mut self, track: KeyframeTrack<Vec3>) -> Self {
        self.scale = track;
        self
    }

    #[inline]
    #[must_use]
    pub fn sample_position(&self, time: f32) -> Vec3 {
        self.position.sample(time).unwrap_or(Vec3::ZERO)
    }

    #[inline]
    #[must_use]
    pub fn sample_rotation(&self, time: f32) -> Quat {
        self.rotation.sample(time).unwrap_or(Quat::IDENTITY)
    }

    #[inline]
    #[must_use]
    pub fn sample_scale(&self, time: f32) -> Vec3 {
        self.scale.sample(time).unwrap_or(Vec3::ONE)
    }

    #[must_use]
    pub fn sample(&self, time: f32) -> BoneTransform {
        BoneTransform {
            translation: self.sample_position(time),
            rotation: self.sample_rotation(time),
            scale: self.sample_scale(time),
        }
    }

    /// Latest key time across all three channels.
    #[must_use]
    pub fn end_time(&self) -> f32 {
        [
            self.position.end_time(),
            self.rotation.end_time(),
            self.scale.end_time(),
        ]
        .into_iter()
        .flatten()
        .fold(0.0_f32, f32::max)
    }
}
