//! Skinning output handed to the renderer.
//!
//! [`BoneMatrices`] is the persistent per-bone matrix array written in place
//! by the pose evaluator every frame. [`MeshKind`] tells a renderer whether a
//! mesh needs that array at all.

use std::sync::Arc;

use glam::Mat4;

use crate::skeleton::Skeleton;

/// Final skinning matrices, one per bone.
///
/// Data flow: pose evaluator writes here -> renderer copies into a GPU
/// storage/uniform buffer. The evaluator must finish writing before the
/// renderer reads; there is no double buffering.
#[derive(Debug, Clone, Default)]
pub struct BoneMatrices {
    matrices: Vec<Mat4>,
    version: u64,
}

impl BoneMatrices {
    #[must_use]
    pub fn new(count: usize) -> Self {
        Self {
            matrices: vec![Mat4::IDENTITY; count],
            version: 0,
        }
    }

    /// Resizes the buffer, resetting every entry to identity.
    ///
    /// Only called when a new skeleton is bound.
    pub fn resize(&mut self, count: usize) {
        self.matrices.clear();
        self.matrices.resize(count, Mat4::IDENTITY);
        self.version = self.version.wrapping_add(1);
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.matrices.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matrices.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[Mat4] {
        &self.matrices
    }

    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Mat4> {
        self.matrices.get(index)
    }

    /// Raw bytes for a GPU upload (column-major `mat4x4<f32>` array).
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.matrices)
    }

    /// Incremented on every write; lets a renderer skip redundant uploads.
    #[inline]
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Mutable access for the writer. Bumps the version.
    #[inline]
    pub fn write(&mut self) -> &mut [Mat4] {
        self.version = self.version.wrapping_add(1);
        &mut self.matrices
    }
}

/// Mesh flavour, fixed at import time.
#[derive(Debug, Clone)]
pub enum MeshKind {
    /// Rigid mesh, drawn with its node transform only.
    Static,
    /// Skinned mesh, drawn with the bone matrices of `skeleton`.
    Skinned { skeleton: Arc<Skeleton> },
}

impl MeshKind {
    #[inline]
    #[must_use]
    pub fn is_skinned(&self) -> bool {
        matches!(self, Self::Skinned { .. })
    }

    #[inline]
    #[must_use]
    pub fn skeleton(&self) -> Option<&Arc<Skeleton>> {
        match self {
            Self::Static => None,
            Self::Skinned { skeleton } => Some(skeleton),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_cover_all_matrices() {
        let buffer = BoneMatrices::new(3);
        assert_eq!(buffer.as_bytes().len(), 3 * 64);
    }

    #[test]
    fn write_bumps_version() {
        let mut buffer = BoneMatrices::new(1);
        let v = buffer.version();
        buffer.write()[0] = Mat4::from_scale(glam::Vec3::splat(2.0));
        assert_eq!(buffer.version(), v + 1);
        assert_eq!(buffer.get(0).unwrap().x_axis.x, 2.0);
    }

    #[test]
    fn static_mesh_has_no_skeleton() {
        assert!(!MeshKind::Static.is_skinned());
        assert!(MeshKind::Static.skeleton().is_none());
    }
}
