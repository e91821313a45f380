use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Per-bone influence of a layer, keyed by abstract bone key.
///
/// A mask is an allow-list: keys it does not list get weight 0. A layer
/// without any mask is not restricted at all.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mask {
    weights: FxHashMap<String, f32>,
}

impl Mask {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a mask from `(key, weight)` pairs; weights are clamped to [0, 1].
    #[must_use]
    pub fn from_weights<K: Into<String>>(weights: impl IntoIterator<Item = (K, f32)>) -> Self {
        let mut mask = Self::new();
        for (key, weight) in weights {
            mask.set_weight(key, weight);
        }
        mask
    }

    /// Full weight for each listed key.
    #[must_use]
    pub fn from_keys<K: Into<String>>(keys: impl IntoIterator<Item = K>) -> Self {
        Self::from_weights(keys.into_iter().map(|k| (k, 1.0)))
    }

    pub fn set_weight(&mut self, key: impl Into<String>, weight: f32) {
        self.weights.insert(key.into(), weight.clamp(0.0, 1.0));
    }

    pub fn remove(&mut self, key: &str) -> Option<f32> {
        self.weights.remove(key)
    }

    /// Stored weight, or 0 for keys the mask does not list.
    #[inline]
    #[must_use]
    pub fn weight(&self, key: &str) -> f32 {
        self.weights.get(key).copied().unwrap_or(0.0)
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.weights.contains_key(key)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}
