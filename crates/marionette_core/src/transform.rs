use glam::{Affine3A, Quat, Vec3};

/// Decomposed local transform of a bone (TRS).
///
/// Composition follows glam's column-vector convention:
/// `matrix = T * R * S`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoneTransform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl BoneTransform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    #[must_use]
    pub fn new(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
        }
    }

    /// Decomposes an affine matrix.
    ///
    /// Shear is lost; bind poses coming out of an importer are expected to be
    /// pure TRS.
    #[must_use]
    pub fn from_affine(matrix: &Affine3A) -> Self {
        let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
        Self {
            translation,
            rotation,
            scale,
        }
    }

    #[inline]
    #[must_use]
    pub fn to_affine(&self) -> Affine3A {
        Affine3A::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Moves `self` toward `target` by `alpha`: lerp for translation and
    /// scale, shortest-path slerp for rotation.
    #[must_use]
    pub fn blend(&self, target: &Self, alpha: f32) -> Self {
        Self {
            translation: self.translation.lerp(target.translation, alpha),
            rotation: self.rotation.slerp(target.rotation, alpha),
            scale: self.scale.lerp(target.scale, alpha),
        }
    }
}

impl Default for BoneTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<Affine3A> for BoneTransform {
    fn from(matrix: Affine3A) -> Self {
        Self::from_affine(&matrix)
    }
}
