use glam::Affine3A;

use crate::errors::{AnimationError, Result};
use crate::transform::BoneTransform;

/// A single bone of an imported skeleton.
///
/// Immutable once the owning [`Skeleton`] is built.
#[derive(Debug, Clone)]
pub struct Bone {
    pub name: String,
    /// Parent bone index, `None` for a root.
    pub parent: Option<usize>,
    /// Rest transform relative to the parent bone.
    pub bind_local: Affine3A,
    /// Inverse of the bone's bind-pose global transform.
    /// Transforms mesh-space vertices into bone space.
    pub inverse_bind: Affine3A,

    // Decomposed `bind_local`, cached so evaluation never decomposes per frame
    bind_pose: BoneTransform,
}

impl Bone {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        parent: Option<usize>,
        bind_local: Affine3A,
        inverse_bind: Affine3A,
    ) -> Self {
        Self {
            name: name.into(),
            parent,
            bind_local,
            inverse_bind,
            bind_pose: BoneTransform::from_affine(&bind_local),
        }
    }

    /// Bind-local transform split into translation/rotation/scale.
    #[inline]
    #[must_use]
    pub fn bind_pose(&self) -> &BoneTransform {
        &self.bind_pose
    }
}

/// Ordered bone hierarchy produced by an importer.
///
/// Bones are topologically sorted: every parent index is smaller than its
/// child's index. This is what allows the pose evaluator to compute global
/// transforms in one forward pass.
#[derive(Debug, Clone)]
pub struct Skeleton {
    pub name: String,
    bones: Vec<Bone>,
}

impl Skeleton {
    /// Builds a skeleton, validating the parent-before-child ordering.
    pub fn new(name: impl Into<String>, bones: Vec<Bone>) -> Result<Self> {
        let count = bones.len();
        for (index, bone) in bones.iter().enumerate() {
            let Some(parent) = bone.parent else {
                continue;
            };
            if parent >= count {
                return Err(AnimationError::ParentOutOfRange {
                    bone: bone.name.clone(),
                    parent,
                    count,
                });
            }
            if parent >= index {
                return Err(AnimationError::UnsortedHierarchy {
                    bone: bone.name.clone(),
                    index,
                    parent,
                });
            }
        }

        let name = name.into();
        log::debug!("Skeleton '{name}' built with {count} bones");

        Ok(Self { name, bones })
    }

    /// Builds a skeleton from parallel arrays, deriving each inverse bind
    /// matrix from the bind-local chain.
    pub fn from_bind_pose(
        name: impl Into<String>,
        names: &[&str],
        parents: &[Option<usize>],
        bind_locals: &[Affine3A],
    ) -> Result<Self> {
        let count = names.len();
        if parents.len() != count {
            return Err(AnimationError::LengthMismatch {
                context: "bone parents",
                expected: count,
                actual: parents.len(),
            });
        }
        if bind_locals.len() != count {
            return Err(AnimationError::LengthMismatch {
                context: "bone bind transforms",
                expected: count,
                actual: bind_locals.len(),
            });
        }

        let bones = names
            .iter()
            .zip(parents)
            .zip(bind_locals)
            .map(|((name, parent), local)| Bone::new(*name, *parent, *local, Affine3A::IDENTITY))
            .collect();

        // Validate ordering before walking parent indices
        let mut skeleton = Self::new(name, bones)?;
        let globals = skeleton.bind_globals();
        for (bone, global) in skeleton.bones.iter_mut().zip(globals) {
            bone.inverse_bind = global.inverse();
        }
        Ok(skeleton)
    }

    #[inline]
    #[must_use]
    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    #[inline]
    #[must_use]
    pub fn bone(&self, index: usize) -> Option<&Bone> {
        self.bones.get(index)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bones.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn parent_of(&self, index: usize) -> Option<usize> {
        self.bones.get(index).and_then(|b| b.parent)
    }

    /// Index of the first bone with the given name.
    #[must_use]
    pub fn find_bone(&self, name: &str) -> Option<usize> {
        self.bones.iter().position(|b| b.name == name)
    }

    /// Index of the first root bone (usually 0).
    #[must_use]
    pub fn root_bone_index(&self) -> Option<usize> {
        self.bones.iter().position(|b| b.parent.is_none())
    }

    /// Global bind-pose transforms, composed in one forward pass.
    #[must_use]
    pub fn bind_globals(&self) -> Vec<Affine3A> {
        let mut globals: Vec<Affine3A> = Vec::with_capacity(self.bones.len());
        for bone in &self.bones {
            let global = match bone.parent {
                Some(parent) => globals[parent] * bone.bind_local,
                None => bone.bind_local,
            };
            globals.push(global);
        }
        globals
    }
}
