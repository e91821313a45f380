//! Walk Cycle Demo
//!
//! Builds a small leg rig, plays a looping stride with root motion enabled,
//! overlays a masked wave on a second layer and prints the skinning output.
//!
//! Run with `RUST_LOG=debug cargo run --example walk_cycle` to see binding logs.

use std::sync::Arc;

use anyhow::Result;
use glam::{Affine3A, Quat, Vec3};
use marionette::animation::{
    AnimationClip, AnimatorSettings, Avatar, BoneTrack, Definition, KeyframeTrack, LoopMode, Mask,
    PoseEvaluator,
};
use marionette::Skeleton;

fn build_rig() -> Result<Skeleton> {
    let skeleton = Skeleton::from_bind_pose(
        "demo_rig",
        &["pelvis", "spine_01", "upperarm_r", "thigh_l", "calf_l", "thigh_r", "calf_r"],
        &[None, Some(0), Some(1), Some(0), Some(3), Some(0), Some(5)],
        &[
            Affine3A::from_translation(Vec3::new(0.0, 1.0, 0.0)),
            Affine3A::from_translation(Vec3::new(0.0, 0.3, 0.0)),
            Affine3A::from_translation(Vec3::new(-0.2, 0.3, 0.0)),
            Affine3A::from_translation(Vec3::new(0.1, -0.1, 0.0)),
            Affine3A::from_translation(Vec3::new(0.0, -0.45, 0.0)),
            Affine3A::from_translation(Vec3::new(-0.1, -0.1, 0.0)),
            Affine3A::from_translation(Vec3::new(0.0, -0.45, 0.0)),
        ],
    )?;
    Ok(skeleton)
}

fn swing(amplitude: f32, phase: f32) -> Result<KeyframeTrack<Quat>> {
    let keys = (0..=8).map(|i| {
        let t = i as f32 / 8.0;
        let angle = ((t + phase) * std::f32::consts::TAU).sin() * amplitude;
        (t, Quat::from_rotation_x(angle))
    });
    Ok(KeyframeTrack::from_keys(keys)?)
}

fn walk_clip() -> Result<AnimationClip> {
    let hips = KeyframeTrack::from_keys([
        (0.0, Vec3::new(0.0, 1.0, 0.0)),
        (0.5, Vec3::new(0.0, 1.05, 0.6)),
        (1.0, Vec3::new(0.0, 1.0, 1.2)),
    ])?;
    Ok(AnimationClip::from_tracks(
        "walk",
        [
            ("Hips", BoneTrack::default().with_position(hips)),
            ("LeftUpperLeg", BoneTrack::default().with_rotation(swing(0.5, 0.0)?)),
            ("LeftLowerLeg", BoneTrack::default().with_rotation(swing(0.3, 0.25)?)),
            ("RightUpperLeg", BoneTrack::default().with_rotation(swing(0.5, 0.5)?)),
            ("RightLowerLeg", BoneTrack::default().with_rotation(swing(0.3, 0.75)?)),
        ],
    ))
}

fn wave_clip() -> Result<AnimationClip> {
    Ok(AnimationClip::from_tracks(
        "wave",
        [("RightUpperArm", BoneTrack::default().with_rotation(swing(1.2, 0.0)?))],
    ))
}

fn main() -> Result<()> {
    env_logger::init();

    let skeleton = Arc::new(build_rig()?);
    let avatar = Arc::new(Avatar::auto_map(&skeleton, &Definition::humanoid()));
    for (key, bone) in avatar.entries() {
        println!("{key:>16} -> {bone}");
    }

    let mut animator = PoseEvaluator::with_settings(AnimatorSettings {
        layer_count: 2,
        ..Default::default()
    });
    animator.bind(skeleton.clone(), avatar);

    animator.play(0, Some(Arc::new(walk_clip()?)), 0.0, LoopMode::Loop, 1.0);
    animator.set_root_motion_enabled(0, true);

    animator.play(1, Some(Arc::new(wave_clip()?)), 0.0, LoopMode::PingPong, 0.5);
    animator.set_layer_mask(1, Some(Arc::new(Mask::from_keys(["RightUpperArm"]))));
    animator.set_layer_weight(1, 0.8);

    let mut world_position = Vec3::ZERO;
    let mut world_rotation = Quat::IDENTITY;
    let dt = 1.0 / 30.0;

    for frame in 0..60 {
        animator.update(dt);

        let delta = animator.root_motion_delta();
        world_position += world_rotation * delta.translation;
        world_rotation = (world_rotation * delta.rotation).normalize();

        if frame % 15 == 0 {
            println!(
                "frame {frame:3}  t={:.2}  world={world_position:.3}",
                animator.normalized_time(0)
            );
            for (bone, matrix) in skeleton.bones().iter().zip(animator.bone_matrices().as_slice()) {
                let (_, _, translation) = matrix.to_scale_rotation_translation();
                println!("    {:<12} {translation:.3}", bone.name);
            }
        }
    }

    println!(
        "walked {:.3} units over {} frames ({} bytes of skinning data)",
        world_position.length(),
        60,
        animator.bone_matrices().as_bytes().len()
    );
    Ok(())
}
