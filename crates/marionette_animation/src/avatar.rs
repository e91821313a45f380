//! Retargeting: abstract bone keys -> concrete bone names.
//!
//! Clips are authored against abstract keys ("Hips", "LeftHand", ...). An
//! [`Avatar`] maps those keys onto the bone names of one imported skeleton,
//! built once by keyword matching against a [`Definition`].

use std::sync::Arc;

use marionette_core::Skeleton;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// One abstract bone role and the name fragments that identify it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoneDefinition {
    pub key: String,
    /// Lower-cased substrings, tried in order.
    pub keywords: SmallVec<[String; 4]>,
}

impl BoneDefinition {
    #[must_use]
    pub fn new<S: AsRef<str>>(key: impl Into<String>, keywords: &[S]) -> Self {
        Self {
            key: key.into(),
            keywords: keywords.iter().map(|k| k.as_ref().to_lowercase()).collect(),
        }
    }

    // Keywords loaded from config may not be lower-cased yet
    fn matches(&self, lowered_name: &str) -> bool {
        self.keywords
            .iter()
            .any(|k| !k.is_empty() && lowered_name.contains(k.to_lowercase().as_str()))
    }
}

/// Ordered table of abstract bone definitions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Definition {
    pub bones: Vec<BoneDefinition>,
}

impl Definition {
    #[must_use]
    pub fn new(bones: Vec<BoneDefinition>) -> Self {
        Self { bones }
    }

    pub fn push(&mut self, definition: BoneDefinition) {
        self.bones.push(definition);
    }

    /// Humanoid table covering the common Mixamo, Unreal and Blender
    /// naming schemes.
    #[must_use]
    pub fn humanoid() -> Self {
        let table: &[(&str, &[&str])] = &[
            ("Hips", &["hips", "pelvis"]),
            ("Spine", &["spine"]),
            ("Chest", &["spine1", "spine_02", "chest"]),
            ("UpperChest", &["spine2", "spine_03", "upperchest"]),
            ("Neck", &["neck"]),
            ("Head", &["head"]),
            ("LeftShoulder", &["leftshoulder", "clavicle_l", "l_clavicle", "shoulder_l", "shoulder.l"]),
            ("LeftUpperArm", &["leftarm", "leftupperarm", "upperarm_l", "l_upperarm", "upper_arm.l"]),
            ("LeftLowerArm", &["leftforearm", "leftlowerarm", "lowerarm_l", "l_forearm", "forearm.l"]),
            ("LeftHand", &["lefthand", "hand_l", "l_hand", "hand.l"]),
            ("RightShoulder", &["rightshoulder", "clavicle_r", "r_clavicle", "shoulder_r", "shoulder.r"]),
            ("RightUpperArm", &["rightarm", "rightupperarm", "upperarm_r", "r_upperarm", "upper_arm.r"]),
            ("RightLowerArm", &["rightforearm", "rightlowerarm", "lowerarm_r", "r_forearm", "forearm.r"]),
            ("RightHand", &["righthand", "hand_r", "r_hand", "hand.r"]),
            ("LeftUpperLeg", &["leftupleg", "leftupperleg", "thigh_l", "l_thigh", "thigh.l"]),
            ("LeftLowerLeg", &["leftleg", "leftlowerleg", "calf_l", "l_calf", "shin.l"]),
            ("LeftFoot", &["leftfoot", "foot_l", "l_foot", "foot.l"]),
            ("LeftToes", &["lefttoe", "ball_l", "l_toe", "toe.l"]),
            ("RightUpperLeg", &["rightupleg", "rightupperleg", "thigh_r", "r_thigh", "thigh.r"]),
            ("RightLowerLeg", &["rightleg", "rightlowerleg", "calf_r", "r_calf", "shin.r"]),
            ("RightFoot", &["rightfoot", "foot_r", "r_foot", "foot.r"]),
            ("RightToes", &["righttoe", "ball_r", "r_toe", "toe.r"]),
        ];

        Self {
            bones: table
                .iter()
                .map(|(key, keywords)| BoneDefinition::new(*key, *keywords))
                .collect(),
        }
    }
}

/// Abstract key -> bone name table for one skeleton. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct Avatar {
    // (abstract key, bone name) in definition order
    entries: Vec<(String, String)>,
    lookup: FxHashMap<String, usize>,
}

impl Avatar {
    /// Builds an avatar from explicit `(abstract key, bone name)` pairs.
    /// A repeated key keeps its first entry.
    #[must_use]
    pub fn from_entries<K: Into<String>, B: Into<String>>(
        entries: impl IntoIterator<Item = (K, B)>,
    ) -> Self {
        let mut avatar = Self::default();
        for (key, bone) in entries {
            let key = key.into();
            if avatar.lookup.contains_key(&key) {
                continue;
            }
            avatar.lookup.insert(key.clone(), avatar.entries.len());
            avatar.entries.push((key, bone.into()));
        }
        avatar
    }

    /// Maps every definition onto the first bone (in skeleton order) whose
    /// lower-cased name contains one of its keywords.
    #[must_use]
    pub fn auto_map(skeleton: &Skeleton, definition: &Definition) -> Self {
        let lowered: Vec<String> = skeleton
            .bones()
            .iter()
            .map(|b| b.name.to_lowercase())
            .collect();

        let mut entries = Vec::with_capacity(definition.bones.len());
        for bone_def in &definition.bones {
            match lowered.iter().position(|name| bone_def.matches(name)) {
                Some(index) => {
                    entries.push((bone_def.key.clone(), skeleton.bones()[index].name.clone()));
                }
                None => log::debug!(
                    "Avatar auto-map: no bone in '{}' matches '{}'",
                    skeleton.name,
                    bone_def.key
                ),
            }
        }

        let avatar = Self::from_entries(entries);
        log::debug!(
            "Avatar auto-map: {}/{} definitions mapped on '{}'",
            avatar.len(),
            definition.bones.len(),
            skeleton.name
        );
        avatar
    }

    /// Concrete bone name for an abstract key.
    #[inline]
    #[must_use]
    pub fn bone_name(&self, key: &str) -> Option<&str> {
        self.lookup.get(key).map(|&i| self.entries[i].1.as_str())
    }

    /// `(abstract key, bone name)` pairs in definition order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, b)| (k.as_str(), b.as_str()))
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dense bone index -> abstract key table for `skeleton`.
    ///
    /// Bones no key points at stay `None`. When two keys resolve to the same
    /// bone the one earlier in definition order wins.
    #[must_use]
    pub fn bone_keys(&self, skeleton: &Skeleton) -> Vec<Option<Arc<str>>> {
        let mut keys = vec![None; skeleton.len()];
        for (key, bone) in &self.entries {
            let Some(index) = skeleton.find_bone(bone) else {
                continue;
            };
            if keys[index].is_none() {
                keys[index] = Some(Arc::from(key.as_str()));
            } else {
                log::debug!("Avatar: bone '{bone}' already mapped, ignoring key '{key}'");
            }
        }
        keys
    }
}
