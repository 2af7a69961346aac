// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scene node identifiers.

use core::fmt;

/// Opaque node identifier, unique within one scene-graph version.
///
/// The producer must keep ids stable for "the same" logical element across
/// rebuilds; otherwise every edit degrades to remove + add and cached
/// tessellation is lost.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct SceneNodeId(String);

impl SceneNodeId {
    /// Creates an id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SceneNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SceneNodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SceneNodeId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for SceneNodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}
