// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Summary of one build or diff application.

use vellum_scene::SceneNodeId;

use crate::tessellate::TessellateError;

/// A node whose tessellation failed under [`FailurePolicy::Continue`](crate::FailurePolicy::Continue).
///
/// The node keeps its previous buffer (or none, if it is new) and is
/// re-tessellated on its next update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DegradedNode {
    /// Op that triggered the tessellation; `None` during a build.
    pub op_index: Option<usize>,
    /// Affected node.
    pub id: SceneNodeId,
    /// Tessellator error.
    pub error: TessellateError,
}

/// What an apply or build did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Ops applied (always the whole diff on success).
    pub ops_applied: usize,
    /// Tessellator calls that produced a result.
    pub tessellated: usize,
    /// Updated geometry nodes whose cached buffer was kept.
    pub reused: usize,
    /// Tessellation failures tolerated by the failure policy.
    pub degraded: Vec<DegradedNode>,
}

impl ApplyReport {
    /// Whether every tessellation succeeded.
    pub fn is_clean(&self) -> bool {
        self.degraded.is_empty()
    }
}
