use glam::{Quat, Vec3};

use crate::playback::{LoopMode, PlaybackState};
use crate::tracks::BoneTrack;

/// Motion of the root bone between two frames, meant to be applied to the
/// character's world placement instead of the skeletal pose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootMotionDelta {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl RootMotionDelta {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    /// Delta of `track` from tick `from` to tick `to`.
    #[must_use]
    pub fn between(track: &BoneTrack, from: f32, to: f32) -> Self {
        let from_rotation = track.sample_rotation(from);
        let to_rotation = track.sample_rotation(to);
        Self {
            translation: track.sample_position(to) - track.sample_position(from),
            rotation: (from_rotation.inverse() * to_rotation).normalize(),
        }
    }

    /// `self` followed by `next`.
    #[must_use]
    pub fn then(&self, next: &Self) -> Self {
        Self {
            translation: self.translation + next.translation,
            rotation: (self.rotation * next.rotation).normalize(),
        }
    }

    /// Moves `self` toward `target` by `alpha` (override blending).
    #[must_use]
    pub fn blend(&self, target: &Self, alpha: f32) -> Self {
        Self {
            translation: self.translation.lerp(target.translation, alpha),
            rotation: self.rotation.slerp(target.rotation, alpha),
        }
    }
}

impl Default for RootMotionDelta {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Delta of `track` between `previous_time` and the current cursor of
/// `state`.
///
/// A looping clip that wrapped during the frame is measured in two segments
/// around the seam, so the delta never jumps by a whole clip length.
pub(crate) fn extract(track: &BoneTrack, state: &PlaybackState, previous_time: f32) -> RootMotionDelta {
    let current_time = state.time;
    let duration = state.duration();

    if state.mode == LoopMode::Loop {
        let forward = state.effective_speed() >= 0.0;
        if forward && current_time < previous_time {
            let tail = RootMotionDelta::between(track, previous_time, duration);
            let head = RootMotionDelta::between(track, 0.0, current_time);
            return tail.then(&head);
        }
        if !forward && current_time > previous_time {
            let head = RootMotionDelta::between(track, previous_time, 0.0);
            let tail = RootMotionDelta::between(track, duration, current_time);
            return head.then(&tail);
        }
    }

    RootMotionDelta::between(track, previous_time, current_time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracks::KeyframeTrack;

    #[test]
    fn then_sums_translation() {
        let a = RootMotionDelta {
            translation: Vec3::X,
            rotation: Quat::IDENTITY,
        };
        let b = RootMotionDelta {
            translation: Vec3::Y,
            rotation: Quat::from_rotation_y(0.5),
        };
        let c = a.then(&b);
        assert!(c.translation.abs_diff_eq(Vec3::new(1.0, 1.0, 0.0), 1e-6));
        assert!(c.rotation.abs_diff_eq(Quat::from_rotation_y(0.5), 1e-6));
    }

    #[test]
    fn between_measures_rotation_delta() {
        let track = BoneTrack::default().with_rotation(
            KeyframeTrack::from_keys([
                (0.0, Quat::from_rotation_y(0.2)),
                (1.0, Quat::from_rotation_y(0.6)),
            ])
            .unwrap(),
        );
        let delta = RootMotionDelta::between(&track, 0.0, 1.0);
        assert!(delta.rotation.abs_diff_eq(Quat::from_rotation_y(0.4), 1e-5));
    }
}
