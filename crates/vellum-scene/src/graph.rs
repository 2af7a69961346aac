// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scene-graph versions and the operations between them.

use core::fmt;

use crate::changes::NodeChanges;
use crate::id::SceneNodeId;
use crate::node::{Group, SceneNode};

/// Canvas dimensions of a document.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CanvasSize {
    /// Width in document units.
    pub width: f64,
    /// Height in document units.
    pub height: f64,
}

/// One complete version of a document's scene graph.
///
/// The producer bumps `version` strictly between any two values it hands to
/// the differ.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SceneGraph {
    /// Root container.
    pub root: Group,
    /// Canvas width.
    pub width: f64,
    /// Canvas height.
    pub height: f64,
    /// Monotonic version counter.
    pub version: u64,
}

impl SceneGraph {
    /// Assembles a version from its parts.
    pub fn new(root: Group, width: f64, height: f64, version: u64) -> Self {
        Self {
            root,
            width,
            height,
            version,
        }
    }

    /// Canvas dimensions.
    pub fn canvas(&self) -> CanvasSize {
        CanvasSize {
            width: self.width,
            height: self.height,
        }
    }

    /// Root node identity.
    pub fn root_id(&self) -> &SceneNodeId {
        &self.root.base.id
    }

    /// Pre-order iterator over every non-root node.
    pub fn descendants(&self) -> impl Iterator<Item = &SceneNode> + '_ {
        self.root.children.iter().flat_map(SceneNode::walk)
    }

    /// Number of nodes, root included.
    pub fn node_count(&self) -> usize {
        1 + self.descendants().count()
    }

    /// Finds a non-root node by id.
    pub fn find(&self, id: &SceneNodeId) -> Option<&SceneNode> {
        self.descendants().find(|n| n.id() == id)
    }
}

/// Fieldless tag of a [`DiffOp`], used in logs and errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OpKind {
    /// [`DiffOp::Add`].
    Add,
    /// [`DiffOp::Remove`].
    Remove,
    /// [`DiffOp::Update`].
    Update,
    /// [`DiffOp::Reorder`].
    Reorder,
    /// [`DiffOp::ReplaceRoot`].
    ReplaceRoot,
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Update => "update",
            Self::Reorder => "reorder",
            Self::ReplaceRoot => "replace-root",
        })
    }
}

/// One atomic, order-significant mutation.
///
/// Operations are applied strictly in order within a [`SceneGraphDiff`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DiffOp {
    /// Insert a complete subtree under `parent_id`.
    Add {
        /// Container receiving the node.
        parent_id: SceneNodeId,
        /// Full subtree snapshot, not a stub.
        node: SceneNode,
        /// Position in the parent's new child order.
        index: usize,
    },
    /// Delete a node and its entire subtree.
    Remove {
        /// Container currently holding the node.
        parent_id: SceneNodeId,
        /// Node to delete.
        node_id: SceneNodeId,
    },
    /// Change a node's own fields.
    Update {
        /// Node to change.
        node_id: SceneNodeId,
        /// Changed fields (never id or children).
        changes: NodeChanges,
    },
    /// Move a node within its parent's child order.
    Reorder {
        /// Container holding the node.
        parent_id: SceneNodeId,
        /// Node to move.
        node_id: SceneNodeId,
        /// Target position after the move.
        new_index: usize,
    },
    /// Discard everything and rebuild from a new root.
    ///
    /// Only emitted when the root id itself differs between versions.
    ReplaceRoot {
        /// New root with its full subtree.
        root: Group,
    },
}

impl DiffOp {
    /// Tag of this op.
    pub const fn kind(&self) -> OpKind {
        match self {
            Self::Add { .. } => OpKind::Add,
            Self::Remove { .. } => OpKind::Remove,
            Self::Update { .. } => OpKind::Update,
            Self::Reorder { .. } => OpKind::Reorder,
            Self::ReplaceRoot { .. } => OpKind::ReplaceRoot,
        }
    }

    /// The node the op creates, deletes, changes or moves.
    pub fn target(&self) -> &SceneNodeId {
        match self {
            Self::Add { node, .. } => node.id(),
            Self::Remove { node_id, .. }
            | Self::Update { node_id, .. }
            | Self::Reorder { node_id, .. } => node_id,
            Self::ReplaceRoot { root } => &root.base.id,
        }
    }
}

/// Ordered operations turning version `version_from` into `version_to`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SceneGraphDiff {
    /// Operations to apply, in order.
    pub ops: Vec<DiffOp>,
    /// Version the ops apply to.
    pub version_from: u64,
    /// Version reached after all ops.
    pub version_to: u64,
    /// New canvas size, present only when it changed.
    pub canvas: Option<CanvasSize>,
}

impl SceneGraphDiff {
    /// Whether the diff makes no visible change.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty() && self.canvas.is_none()
    }

    /// Number of operations.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Splits off the first `at` ops into an independently applicable prefix.
    ///
    /// The prefix stays at `version_from` (it does not complete the
    /// transition); the remainder carries the target version and canvas.
    /// Applying both in order is equivalent to applying `self`.
    #[must_use]
    pub fn split_at(mut self, at: usize) -> (Self, Self) {
        let rest = self.ops.split_off(at.min(self.ops.len()));
        let head = Self {
            ops: self.ops,
            version_from: self.version_from,
            version_to: self.version_from,
            canvas: None,
        };
        let tail = Self {
            ops: rest,
            version_from: self.version_from,
            version_to: self.version_to,
            canvas: self.canvas,
        };
        (head, tail)
    }

    /// Splits the diff into chunks of at most `size` ops.
    ///
    /// Only the last chunk completes the version transition. A `size` of
    /// zero yields the whole diff as one chunk.
    pub fn into_chunks(self, size: usize) -> Vec<Self> {
        if size == 0 || self.ops.len() <= size {
            return vec![self];
        }
        let mut chunks = Vec::with_capacity(self.ops.len().div_ceil(size));
        let mut rest = self;
        while rest.ops.len() > size {
            let (head, tail) = rest.split_at(size);
            chunks.push(head);
            rest = tail;
        }
        chunks.push(rest);
        chunks
    }
}
