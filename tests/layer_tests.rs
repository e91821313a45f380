//! Animation Layer Tests
//!
//! Tests for:
//! - Play semantics (null clip, same clip, instant switch)
//! - Cross-fade weights and completion
//! - Per-bone blending with layer weight × mask weight
//! - Root motion extraction across the loop seam

use std::sync::Arc;

use glam::{Quat, Vec3};

use marionette::animation::{
    AnimationClip, AnimationLayer, BoneTrack, KeyframeTrack, LoopMode, Mask, RootMotionDelta,
};
use marionette::BoneTransform;

const EPSILON: f32 = 1e-5;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn position_clip(name: &str, key: &str, from: Vec3, to: Vec3, duration: f32) -> Arc<AnimationClip> {
    Arc::new(AnimationClip::new(
        name,
        duration,
        1.0,
        [(
            key,
            BoneTrack::default()
                .with_position(KeyframeTrack::from_keys([(0.0, from), (duration, to)]).unwrap()),
        )],
    ))
}

fn constant_clip(name: &str, key: &str, position: Vec3) -> Arc<AnimationClip> {
    position_clip(name, key, position, position, 1.0)
}

/// Layer bound to a single bone keyed "Hips".
fn bound_layer() -> AnimationLayer {
    let mut layer = AnimationLayer::new();
    let keys: Vec<Option<Arc<str>>> = vec![Some(Arc::from("Hips"))];
    layer.bind_bone_keys(keys.into());
    layer
}

// ============================================================================
// Play
// ============================================================================

#[test]
fn play_none_is_ignored() {
    let mut layer = bound_layer();
    let clip = constant_clip("a", "Hips", Vec3::X);
    layer.play(Some(clip.clone()), 0.0, LoopMode::Loop, 1.0);
    layer.update(0.25);

    layer.play(None, 0.5, LoopMode::Once, 2.0);
    assert!(Arc::ptr_eq(layer.current_clip().unwrap(), &clip));
    assert!(approx(layer.current().time, 0.25));
    assert!(!layer.is_transitioning());
}

#[test]
fn play_same_clip_is_noop() {
    let mut layer = bound_layer();
    let clip = position_clip("walk", "Hips", Vec3::ZERO, Vec3::X, 2.0);
    layer.play(Some(clip.clone()), 0.0, LoopMode::Loop, 1.0);
    layer.update(0.5);

    layer.play(Some(clip), 0.3, LoopMode::Loop, 1.0);
    assert!(!layer.is_transitioning());
    assert!(approx(layer.current().time, 0.5), "time should not reset");
}

#[test]
fn play_without_blend_switches_instantly() {
    let mut layer = bound_layer();
    let a = constant_clip("a", "Hips", Vec3::X);
    let b = constant_clip("b", "Hips", Vec3::Y);
    layer.play(Some(a), 0.0, LoopMode::Loop, 1.0);
    layer.play(Some(b.clone()), 0.0, LoopMode::Loop, 1.0);

    assert!(!layer.is_transitioning());
    assert!(!layer.previous().is_valid());
    assert!(Arc::ptr_eq(layer.current_clip().unwrap(), &b));
}

#[test]
fn first_play_with_blend_time_does_not_fade() {
    let mut layer = bound_layer();
    layer.play(Some(constant_clip("a", "Hips", Vec3::X)), 0.5, LoopMode::Loop, 1.0);
    assert!(!layer.is_transitioning(), "nothing to fade from");
}

#[test]
fn zero_blend_abandons_transition() {
    let mut layer = bound_layer();
    layer.play(Some(constant_clip("a", "Hips", Vec3::X)), 0.0, LoopMode::Loop, 1.0);
    layer.play(Some(constant_clip("b", "Hips", Vec3::Y)), 1.0, LoopMode::Loop, 1.0);
    layer.update(0.25);
    assert!(layer.is_transitioning());

    layer.play(Some(constant_clip("c", "Hips", Vec3::Z)), 0.0, LoopMode::Loop, 1.0);
    assert!(!layer.is_transitioning());
    assert!(!layer.previous().is_valid());
}

// ============================================================================
// Cross-fade
// ============================================================================

#[test]
fn cross_fade_weights_progress_and_complete() {
    let mut layer = bound_layer();
    layer.play(Some(constant_clip("a", "Hips", Vec3::X)), 0.0, LoopMode::Loop, 1.0);
    layer.play(Some(constant_clip("b", "Hips", Vec3::Y)), 1.0, LoopMode::Loop, 1.0);
    assert!(layer.is_transitioning());

    layer.update(0.25);
    layer.update(0.25);
    assert!(approx(layer.current().weight, 0.5), "got {}", layer.current().weight);
    assert!(approx(layer.previous().weight, 0.5), "got {}", layer.previous().weight);
    assert!(approx(layer.transition_progress(), 0.5));

    layer.update(0.25);
    layer.update(0.25);
    assert_eq!(layer.current().weight, 1.0);
    assert!(!layer.previous().is_valid());
    assert!(!layer.is_transitioning());
    assert_eq!(layer.transition_progress(), 0.0);
}

#[test]
fn cross_fade_blends_samples() {
    let mut layer = bound_layer();
    layer.play(Some(constant_clip("a", "Hips", Vec3::new(2.0, 0.0, 0.0))), 0.0, LoopMode::Loop, 1.0);
    layer.play(Some(constant_clip("b", "Hips", Vec3::new(0.0, 2.0, 0.0))), 1.0, LoopMode::Loop, 1.0);
    layer.update(0.5);

    let mut pose = BoneTransform::IDENTITY;
    assert!(layer.evaluate_and_blend(0, 1.0, &mut pose));
    assert!(
        pose.translation.abs_diff_eq(Vec3::new(1.0, 1.0, 0.0), EPSILON),
        "got {:?}",
        pose.translation
    );
}

#[test]
fn cross_fade_without_previous_track_uses_current_only() {
    let mut layer = bound_layer();
    layer.play(Some(constant_clip("a", "Spine", Vec3::X)), 0.0, LoopMode::Loop, 1.0);
    layer.play(Some(constant_clip("b", "Hips", Vec3::Y)), 1.0, LoopMode::Loop, 1.0);
    layer.update(0.5);

    let mut pose = BoneTransform::IDENTITY;
    assert!(layer.evaluate_and_blend(0, 1.0, &mut pose));
    assert!(pose.translation.abs_diff_eq(Vec3::Y, EPSILON));
}

// ============================================================================
// Blending
// ============================================================================

#[test]
fn blend_moves_accumulator_by_final_alpha() {
    let mut layer = bound_layer();
    layer.play(Some(constant_clip("a", "Hips", Vec3::new(4.0, 0.0, 0.0))), 0.0, LoopMode::Loop, 1.0);
    layer.set_weight(0.5);

    let mut pose = BoneTransform::IDENTITY;
    assert!(layer.evaluate_and_blend(0, 0.5, &mut pose));
    assert!(pose.translation.abs_diff_eq(Vec3::new(1.0, 0.0, 0.0), EPSILON));
}

#[test]
fn blend_skips_negligible_weights() {
    let mut layer = bound_layer();
    layer.play(Some(constant_clip("a", "Hips", Vec3::X)), 0.0, LoopMode::Loop, 1.0);

    let mut pose = BoneTransform::IDENTITY;
    assert!(!layer.evaluate_and_blend(0, 0.0005, &mut pose));

    layer.set_weight(0.03);
    assert!(!layer.evaluate_and_blend(0, 0.03, &mut pose), "product below epsilon");
    assert_eq!(pose, BoneTransform::IDENTITY);
}

#[test]
fn blend_without_track_is_no_contribution() {
    let mut layer = bound_layer();
    layer.play(Some(constant_clip("a", "LeftHand", Vec3::X)), 0.0, LoopMode::Loop, 1.0);

    let mut pose = BoneTransform::IDENTITY;
    assert!(!layer.evaluate_and_blend(0, 1.0, &mut pose));
    assert!(!layer.evaluate_and_blend(5, 1.0, &mut pose), "bone outside the cache");
}

#[test]
fn rebinding_keys_rebuilds_track_cache() {
    let mut layer = AnimationLayer::new();
    layer.play(Some(constant_clip("a", "Hips", Vec3::X)), 0.0, LoopMode::Loop, 1.0);

    let mut pose = BoneTransform::IDENTITY;
    assert!(!layer.evaluate_and_blend(0, 1.0, &mut pose), "no keys bound yet");

    let keys: Vec<Option<Arc<str>>> = vec![Some(Arc::from("Hips"))];
    layer.bind_bone_keys(keys.into());
    assert!(layer.evaluate_and_blend(0, 1.0, &mut pose));
}

#[test]
fn mask_default_asymmetry() {
    let mut layer = AnimationLayer::new();
    let keys: Vec<Option<Arc<str>>> = vec![Some(Arc::from("Hips")), Some(Arc::from("Spine"))];
    layer.bind_bone_keys(keys.into());

    assert_eq!(layer.mask_weight(0), 1.0);
    assert_eq!(layer.mask_weight(1), 1.0);

    layer.set_mask(Some(Arc::new(Mask::from_keys(["Hips"]))));
    assert_eq!(layer.mask_weight(0), 1.0);
    assert_eq!(layer.mask_weight(1), 0.0);

    layer.set_mask(None);
    assert_eq!(layer.mask_weight(1), 1.0);
}

// ============================================================================
// Root Motion
// ============================================================================

#[test]
fn root_motion_disabled_is_identity() {
    let mut layer = bound_layer();
    layer.play(Some(position_clip("walk", "Hips", Vec3::ZERO, Vec3::Z, 1.0)), 0.0, LoopMode::Loop, 1.0);
    layer.update(0.25);
    assert_eq!(layer.root_motion_delta(), RootMotionDelta::IDENTITY);
}

#[test]
fn root_motion_missing_track_is_identity() {
    let mut layer = bound_layer();
    layer.set_root_motion_enabled(true);
    layer.play(Some(position_clip("walk", "Spine", Vec3::ZERO, Vec3::Z, 1.0)), 0.0, LoopMode::Loop, 1.0);
    layer.update(0.25);
    assert_eq!(layer.root_motion_delta(), RootMotionDelta::IDENTITY);
}

#[test]
fn root_motion_per_frame_delta() {
    let mut layer = bound_layer();
    layer.set_root_motion_enabled(true);
    layer.play(
        Some(position_clip("walk", "Hips", Vec3::ZERO, Vec3::new(0.0, 0.0, 4.0), 1.0)),
        0.0,
        LoopMode::Loop,
        1.0,
    );
    layer.update(0.25);
    let delta = layer.root_motion_delta();
    assert!(delta.translation.abs_diff_eq(Vec3::new(0.0, 0.0, 1.0), EPSILON));
}

#[test]
fn root_motion_loop_seam_continuity() {
    let mut layer = bound_layer();
    layer.set_root_motion_enabled(true);
    let clip = Arc::new(AnimationClip::new(
        "turn_walk",
        1.0,
        1.0,
        [(
            "Hips",
            BoneTrack::default()
                .with_position(
                    KeyframeTrack::from_keys([
                        (0.0, Vec3::ZERO),
                        (0.5, Vec3::new(0.5, 0.0, 1.0)),
                        (1.0, Vec3::new(0.0, 0.0, 3.0)),
                    ])
                    .unwrap(),
                )
                .with_rotation(
                    KeyframeTrack::from_keys([(0.0, Quat::IDENTITY), (1.0, Quat::from_rotation_y(0.8))])
                        .unwrap(),
                ),
        )],
    ));
    layer.play(Some(clip.clone()), 0.0, LoopMode::Loop, 1.0);

    let mut translation = Vec3::ZERO;
    let mut rotation = Quat::IDENTITY;
    // Frame steps that do not divide the clip evenly, ending exactly one
    // period later
    for dt in [0.3, 0.3, 0.3, 0.1] {
        layer.update(dt);
        let delta = layer.root_motion_delta();
        translation += delta.translation;
        rotation = rotation * delta.rotation;
    }

    let track = clip.track("Hips").unwrap();
    let expected = RootMotionDelta::between(track, 0.0, 1.0);
    assert!(
        translation.abs_diff_eq(expected.translation, 1e-4),
        "got {translation:?}, expected {:?}",
        expected.translation
    );
    assert!(rotation.angle_between(expected.rotation) < 1e-3);
}

#[test]
fn root_motion_wrap_does_not_spike() {
    let mut layer = bound_layer();
    layer.set_root_motion_enabled(true);
    layer.play(
        Some(position_clip("walk", "Hips", Vec3::ZERO, Vec3::new(0.0, 0.0, 2.0), 1.0)),
        0.0,
        LoopMode::Loop,
        1.0,
    );
    layer.update(0.75);
    layer.update(0.5);

    // 0.75 -> 1.0 plus 0.0 -> 0.25, each a quarter of the stride
    let delta = layer.root_motion_delta();
    assert!(
        delta.translation.abs_diff_eq(Vec3::new(0.0, 0.0, 1.0), 1e-4),
        "got {:?}",
        delta.translation
    );
}

#[test]
fn loop_after_ping_pong_return_leg_runs_forward() {
    let mut layer = bound_layer();
    layer.set_root_motion_enabled(true);
    layer.play(
        Some(position_clip("walk", "Hips", Vec3::ZERO, Vec3::new(0.0, 0.0, 2.0), 2.0)),
        0.0,
        LoopMode::PingPong,
        1.0,
    );
    layer.update(2.5);
    assert!(layer.current().reverse, "bounced at the end");

    layer.set_loop_mode(LoopMode::Loop);
    assert!(!layer.current().reverse);

    // 2.0 -> 2.5 wraps forward to 0.5
    layer.update(0.5);
    assert!(approx(layer.current().time, 0.5), "got {}", layer.current().time);
    let delta = layer.root_motion_delta();
    assert!(
        delta.translation.abs_diff_eq(Vec3::new(0.0, 0.0, 0.5), 1e-4),
        "got {:?}",
        delta.translation
    );

    layer.update(1.6);
    assert!(approx(layer.current().time, 0.1), "got {}", layer.current().time);
    let delta = layer.root_motion_delta();
    assert!(
        delta.translation.abs_diff_eq(Vec3::new(0.0, 0.0, 1.6), 1e-4),
        "got {:?}",
        delta.translation
    );
}

#[test]
fn root_motion_ping_pong_return_leg_moves_backwards() {
    let mut layer = bound_layer();
    layer.set_root_motion_enabled(true);
    layer.play(
        Some(position_clip("walk", "Hips", Vec3::ZERO, Vec3::new(0.0, 0.0, 2.0), 2.0)),
        0.0,
        LoopMode::PingPong,
        1.0,
    );
    layer.update(2.5);
    layer.update(0.5);

    let delta = layer.root_motion_delta();
    assert!(
        delta.translation.abs_diff_eq(Vec3::new(0.0, 0.0, -0.5), 1e-4),
        "got {:?}",
        delta.translation
    );
}

#[test]
fn root_motion_reverse_loop_wrap() {
    let mut layer = bound_layer();
    layer.set_root_motion_enabled(true);
    layer.play(
        Some(position_clip("walk", "Hips", Vec3::ZERO, Vec3::new(0.0, 0.0, 2.0), 1.0)),
        0.0,
        LoopMode::Loop,
        -1.0,
    );
    // 0.0 -> 0.75 going backwards across the seam
    layer.update(0.25);

    let delta = layer.root_motion_delta();
    assert!(
        delta.translation.abs_diff_eq(Vec3::new(0.0, 0.0, -0.5), 1e-4),
        "got {:?}",
        delta.translation
    );
}
