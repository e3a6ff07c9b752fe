//! Blend Tree & Animator Tests
//!
//! Tests for:
//! - Base + additive layering (half-angle compose on a two-joint chain)
//! - Deferred, clamped blend parameter updates
//! - Node ordering and clip kind rules at insert time
//! - Looping and one-shot node clocks
//! - Bone palette construction (global × inverse bind)
//! - Bit-identical replays for identical inputs
//! - The head-shake layering scenario (keep + make_diff_with on a bind pose)

use std::f32::consts::FRAC_PI_2;

use glam::{Affine3A, Mat4, Quat, Vec3};

use otter::animation::{
    AnimationError, Animator, AnimatorSettings, BlendMode, BlendNodeHandle, BlendTree, ClipProcessor, Joint,
    JointTransform, KeyframeTrack, SkeletalAnim, Skeleton,
};

const EPSILON: f32 = 1e-4;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn vec3_approx(a: Vec3, b: Vec3) -> bool {
    (a - b).abs().max_element() < EPSILON
}

fn quat_approx(a: Quat, b: Quat) -> bool {
    a.angle_between(b) < 1e-3
}

/// root at the origin, child one unit up the Y axis
fn two_joint_chain() -> Skeleton {
    Skeleton::new(
        "chain",
        vec![
            Joint::new("root", None, JointTransform::IDENTITY),
            Joint::new("child", Some(0), JointTransform::from_position(Vec3::Y)),
        ],
    )
    .unwrap()
}

fn static_root_rotation(angle: f32) -> SkeletalAnim {
    SkeletalAnim::new(
        "root_static",
        [(0, KeyframeTrack::linear(
            vec![0.0, 1.0],
            vec![JointTransform::from_rotation(Quat::from_rotation_z(angle)); 2],
        ))],
    )
}

fn child_rotation(angle: f32) -> SkeletalAnim {
    SkeletalAnim::new(
        "child_turn",
        [(1, KeyframeTrack::linear(
            vec![0.0, 1.0],
            vec![JointTransform::from_position_rotation(Vec3::Y, Quat::from_rotation_z(angle)); 2],
        ))],
    )
}

fn layered_animator(param: f32) -> (Animator, BlendNodeHandle) {
    let mut animator = Animator::new(two_joint_chain());
    let diff = ClipProcessor::new(&child_rotation(30f32.to_radians()))
        .make_diff_with(&animator.skeleton().bind_pose());

    let tree = animator.blend_tree_mut();
    tree.insert_base(static_root_rotation(FRAC_PI_2)).unwrap();
    let layer = tree.insert_additive(diff, param).unwrap();
    (animator, layer)
}

// ============================================================================
// Layering
// ============================================================================

#[test]
fn half_parameter_composes_half_angle() {
    let (mut animator, _) = layered_animator(0.5);
    animator.update(0.1);

    let skeleton = animator.skeleton();
    let child = &skeleton.joints()[1];
    assert!(quat_approx(child.local().rotation, Quat::from_rotation_z(15f32.to_radians())));

    let root_global = Affine3A::from_quat(Quat::from_rotation_z(FRAC_PI_2));
    let expected = root_global * child.local().to_affine();
    assert!(child.global().abs_diff_eq(expected, EPSILON));

    let child_world = JointTransform::from_affine(child.global());
    assert!(quat_approx(child_world.rotation, Quat::from_rotation_z(105f32.to_radians())));
    assert!(vec3_approx(child_world.position, Vec3::new(-1.0, 0.0, 0.0)));
}

#[test]
fn zero_parameter_leaves_base_pose() {
    let (mut layered, _) = layered_animator(0.0);
    layered.update(0.1);

    let mut base_only = Animator::new(two_joint_chain());
    base_only
        .blend_tree_mut()
        .insert_base(static_root_rotation(FRAC_PI_2))
        .unwrap();
    base_only.update(0.1);

    assert_eq!(layered.skeleton().local_pose(), base_only.skeleton().local_pose());
    assert_eq!(layered.bone_palette(), base_only.bone_palette());
}

#[test]
fn full_parameter_reaches_source_pose() {
    let (mut animator, _) = layered_animator(1.0);
    animator.update(0.1);

    let child = animator.skeleton().joints()[1].local();
    assert!(quat_approx(child.rotation, Quat::from_rotation_z(30f32.to_radians())));
    assert!(vec3_approx(child.position, Vec3::Y));
}

// ============================================================================
// Blend parameters
// ============================================================================

#[test]
fn set_blend_param_applies_on_next_update() {
    let (mut animator, layer) = layered_animator(0.0);

    let tree = animator.blend_tree_mut();
    tree.set_blend_param(layer, 0.2).unwrap();
    tree.set_blend_param(layer, 0.9).unwrap();
    assert_eq!(tree.blend_param(layer).unwrap(), 0.0);
    assert_eq!(tree.node(layer).unwrap().pending_blend_param(), Some(0.9));

    // The pose is untouched until the tree is evaluated
    assert_eq!(animator.skeleton().local_pose(), animator.skeleton().bind_pose());

    animator.update(0.0);
    let tree = animator.blend_tree();
    assert_eq!(tree.blend_param(layer).unwrap(), 0.9);
    assert_eq!(tree.node(layer).unwrap().pending_blend_param(), None);
}

#[test]
fn blend_param_is_clamped() {
    init_logger();
    let (mut animator, layer) = layered_animator(3.0);
    assert_eq!(animator.blend_tree().blend_param(layer).unwrap(), 1.0);

    let tree = animator.blend_tree_mut();
    tree.set_blend_param(layer, -4.0).unwrap();
    assert_eq!(tree.node(layer).unwrap().pending_blend_param(), Some(0.0));
}

#[test]
fn non_finite_blend_param_is_rejected() {
    let (mut animator, layer) = layered_animator(0.25);
    let tree = animator.blend_tree_mut();

    assert!(matches!(
        tree.set_blend_param(layer, f32::NAN),
        Err(AnimationError::NonFiniteBlendParam(_))
    ));
    assert_eq!(tree.node(layer).unwrap().pending_blend_param(), None);
    assert_eq!(tree.blend_param(layer).unwrap(), 0.25);
}

#[test]
fn unknown_handle_is_rejected() {
    let (mut animator, _) = layered_animator(0.0);
    let tree = animator.blend_tree_mut();
    let bogus = BlendNodeHandle::default();

    assert_eq!(tree.set_blend_param(bogus, 0.5), Err(AnimationError::InvalidNodeHandle));
    assert_eq!(tree.blend_param(bogus), Err(AnimationError::InvalidNodeHandle));
    assert_eq!(tree.set_time(bogus, 0.5), Err(AnimationError::InvalidNodeHandle));
    assert!(tree.node(bogus).is_none());
}

// ============================================================================
// Tree structure
// ============================================================================

#[test]
fn first_node_must_be_base() {
    let skeleton = two_joint_chain();
    let diff = ClipProcessor::new(&child_rotation(0.3)).make_diff_with(&skeleton.bind_pose());

    let mut tree = BlendTree::new();
    assert_eq!(
        tree.insert(diff.clone(), BlendMode::Additive, 0.5),
        Err(AnimationError::BaseNodeMisplaced {
            position: 0,
            mode: BlendMode::Additive
        })
    );

    tree.insert_base(static_root_rotation(0.0)).unwrap();
    assert_eq!(
        tree.insert(static_root_rotation(0.0), BlendMode::Base, 0.0),
        Err(AnimationError::BaseNodeMisplaced {
            position: 1,
            mode: BlendMode::Base
        })
    );
    assert!(tree.insert_additive(diff, 0.5).is_ok());
    assert_eq!(tree.len(), 2);
}

#[test]
fn clip_kind_must_match_mode() {
    let skeleton = two_joint_chain();
    let diff = ClipProcessor::new(&child_rotation(0.3)).make_diff_with(&skeleton.bind_pose());

    let mut tree = BlendTree::new();
    assert_eq!(
        tree.insert_base(diff),
        Err(AnimationError::ClipKindMismatch { mode: BlendMode::Base })
    );

    tree.insert_base(static_root_rotation(0.0)).unwrap();
    assert_eq!(
        tree.insert_additive(child_rotation(0.3), 1.0),
        Err(AnimationError::ClipKindMismatch {
            mode: BlendMode::Additive
        })
    );
    assert!(!tree.is_empty());
    assert_eq!(tree.len(), 1);
}

#[test]
fn handles_follow_insertion_order() {
    let (animator, layer) = layered_animator(0.0);
    let handles: Vec<_> = animator.blend_tree().handles().collect();
    assert_eq!(handles.len(), 2);
    assert_eq!(handles[1], layer);
    assert_eq!(animator.blend_tree().node(handles[0]).unwrap().mode(), BlendMode::Base);
    assert_eq!(animator.blend_tree().node(layer).unwrap().mode(), BlendMode::Additive);
}

// ============================================================================
// Clocks
// ============================================================================

fn sweep() -> SkeletalAnim {
    SkeletalAnim::new(
        "sweep",
        [(0, KeyframeTrack::linear(
            vec![0.0, 1.0],
            vec![
                JointTransform::from_position(Vec3::ZERO),
                JointTransform::from_position(Vec3::new(10.0, 0.0, 0.0)),
            ],
        ))],
    )
}

#[test]
fn looping_node_wraps() {
    let mut animator = Animator::new(two_joint_chain());
    let base = animator.blend_tree_mut().insert_base(sweep()).unwrap();

    animator.update(0.75);
    animator.update(0.5);

    let node = animator.blend_tree().node(base).unwrap();
    assert!((node.time() - 0.25).abs() < EPSILON);
    assert!(!node.is_finished());
    assert!((animator.skeleton().joints()[0].local().position.x - 2.5).abs() < EPSILON);
}

#[test]
fn one_shot_node_holds_last_frame() {
    let mut animator = Animator::new(two_joint_chain());
    let base = animator
        .blend_tree_mut()
        .insert_base(sweep().with_looping(false))
        .unwrap();

    animator.update(0.6);
    animator.update(0.6);

    let node = animator.blend_tree().node(base).unwrap();
    assert_eq!(node.time(), 1.0);
    assert!(node.is_finished());
    assert_eq!(animator.skeleton().joints()[0].local().position, Vec3::new(10.0, 0.0, 0.0));
}

#[test]
fn set_time_seeks_immediately() {
    let mut animator = Animator::new(two_joint_chain());
    let base = animator.blend_tree_mut().insert_base(sweep()).unwrap();

    animator.blend_tree_mut().set_time(base, 2.5).unwrap();
    assert!((animator.blend_tree().node(base).unwrap().time() - 0.5).abs() < EPSILON);

    animator.blend_tree_mut().set_looping(base, false).unwrap();
    animator.blend_tree_mut().set_time(base, 7.0).unwrap();
    assert!(animator.blend_tree().node(base).unwrap().is_finished());
}

#[test]
fn negative_delta_does_not_rewind() {
    let mut animator = Animator::new(two_joint_chain());
    let base = animator.blend_tree_mut().insert_base(sweep()).unwrap();

    animator.update(0.4);
    animator.update(-0.3);
    animator.update(f32::INFINITY);

    assert!((animator.blend_tree().node(base).unwrap().time() - 0.4).abs() < EPSILON);
}

// ============================================================================
// Animator
// ============================================================================

#[test]
fn bind_pose_palette_is_identity() {
    let mut animator = Animator::new(two_joint_chain());
    for matrix in animator.bone_palette() {
        assert!(matrix.abs_diff_eq(Mat4::IDENTITY, EPSILON));
    }

    // An empty tree keeps the bind pose
    animator.update(0.5);
    for matrix in animator.bone_palette() {
        assert!(matrix.abs_diff_eq(Mat4::IDENTITY, EPSILON));
    }
}

#[test]
fn palette_is_global_times_inverse_bind() {
    let (mut animator, _) = layered_animator(0.7);
    animator.update(0.3);

    let skeleton = animator.skeleton();
    assert_eq!(animator.bone_palette().len(), skeleton.joint_count());
    for (index, joint) in skeleton.joints().iter().enumerate() {
        let expected = Mat4::from(*joint.global() * skeleton.inverse_bind_matrices()[index]);
        assert_eq!(animator.bone_palette()[index], expected);
    }

    assert_eq!(
        animator.palette_bytes().len(),
        skeleton.joint_count() * std::mem::size_of::<Mat4>()
    );
}

#[test]
fn debug_transforms_follow_globals() {
    let (mut animator, _) = layered_animator(0.5);
    animator.update(0.1);

    let markers: Vec<JointTransform> = animator.joint_debug_transforms().collect();
    assert_eq!(markers.len(), 2);
    assert!(vec3_approx(markers[1].position, Vec3::new(-1.0, 0.0, 0.0)));
}

#[test]
fn settings_scale_and_clamp_time() {
    let mut animator = Animator::new(two_joint_chain())
        .with_settings(AnimatorSettings::default().with_time_scale(0.5).with_max_delta_time(0.1));
    let base = animator.blend_tree_mut().insert_base(sweep()).unwrap();

    animator.update(0.1); // 0.05
    animator.update(1.0); // 0.5, clamped to 0.1
    assert!((animator.blend_tree().node(base).unwrap().time() - 0.15).abs() < EPSILON);
}

#[test]
fn identical_inputs_give_identical_palettes() {
    let script = [(0.016, 0.0), (0.016, 0.3), (0.033, 0.3), (0.1, 0.9), (0.016, 0.5), (0.25, 1.0)];

    let run = || {
        let (mut animator, layer) = layered_animator(0.0);
        let mut frames = Vec::new();
        for &(dt, param) in &script {
            animator.blend_tree_mut().set_blend_param(layer, param).unwrap();
            animator.update(dt);
            frames.push(animator.bone_palette().to_vec());
        }
        frames
    };

    assert_eq!(run(), run());
}

// ============================================================================
// Head-shake scenario
// ============================================================================

/// A small upper body: hips → spine → neck → head, with arms off the spine.
fn upper_body() -> Skeleton {
    Skeleton::new(
        "boi",
        vec![
            Joint::new("hips", None, JointTransform::from_position(Vec3::new(0.0, 1.0, 0.0))),
            Joint::new("spine", Some(0), JointTransform::from_position(Vec3::new(0.0, 0.3, 0.0))),
            Joint::new("arm_l", Some(1), JointTransform::from_position(Vec3::new(0.2, 0.2, 0.0))),
            Joint::new("arm_r", Some(1), JointTransform::from_position(Vec3::new(-0.2, 0.2, 0.0))),
            Joint::new("neck", Some(1), JointTransform::from_position(Vec3::new(0.0, 0.3, 0.0))),
            Joint::new("head", Some(4), JointTransform::from_position(Vec3::new(0.0, 0.1, 0.0))),
        ],
    )
    .unwrap()
}

fn idle(skeleton: &Skeleton) -> SkeletalAnim {
    let breathe = |joint: usize, amount: f32| {
        let bind = skeleton.bind_pose()[joint];
        let raised = JointTransform {
            position: bind.position + Vec3::new(0.0, amount, 0.0),
            ..bind
        };
        (joint, KeyframeTrack::linear(vec![0.0, 1.0, 2.0], vec![bind, raised, bind]))
    };
    SkeletalAnim::new("idle", (0..6).map(|joint| breathe(joint, 0.01 * joint as f32)))
}

/// A captured clip moving the whole body, arms hanging at the sides.
fn head_shake(skeleton: &Skeleton) -> SkeletalAnim {
    let tracks = (0..6).map(|joint| {
        let bind = skeleton.bind_pose()[joint];
        let values = if joint == 5 {
            vec![
                bind,
                JointTransform { rotation: Quat::from_rotation_y(0.5), ..bind },
                JointTransform { rotation: Quat::from_rotation_y(-0.5), ..bind },
                bind,
            ]
        } else {
            let droop = JointTransform { rotation: Quat::from_rotation_z(1.2), ..bind };
            vec![droop; 4]
        };
        (joint, KeyframeTrack::linear(vec![0.0, 0.5, 1.5, 2.0], values))
    });
    SkeletalAnim::new("head_shake", tracks)
}

#[test]
fn head_shake_layer_moves_only_the_head() -> anyhow::Result<()> {
    init_logger();
    let skeleton = upper_body();
    let head = skeleton.find_joint("head").expect("head joint");
    let idle_clip = idle(&skeleton);
    let shake = ClipProcessor::new(&head_shake(&skeleton))
        .keep([head])
        .make_diff_with(&skeleton.bind_pose());

    let mut reference = Animator::new(skeleton.clone());
    reference.blend_tree_mut().insert_base(idle_clip.clone())?;

    let mut animator = Animator::new(skeleton);
    animator.blend_tree_mut().insert_base(idle_clip)?;
    let layer = animator.blend_tree_mut().insert_additive(shake, 0.0)?;

    // Ramp the layer in over the first half second of the clip
    for frame in 0..15 {
        let param = frame as f32 / 14.0;
        animator.blend_tree_mut().set_blend_param(layer, param)?;
        animator.update(1.0 / 30.0);
        reference.update(1.0 / 30.0);

        let layered = animator.skeleton().local_pose();
        let plain = reference.skeleton().local_pose();
        for (joint, (a, b)) in layered.iter().zip(&plain).enumerate() {
            if joint != head {
                assert_eq!(a, b, "frame {frame}, joint {joint}");
            }
        }
    }

    // At t = 0.5 s with full weight the head has turned to its first extreme
    let turned = animator.skeleton().joints()[head].local().rotation;
    assert!((turned.angle_between(Quat::IDENTITY) - 0.5).abs() < 1e-2);
    Ok(())
}
