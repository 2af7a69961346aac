// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Errors raised while building or updating a [`SceneState`](crate::SceneState).

use core::fmt;

use thiserror::Error;
use vellum_scene::{NodeKind, OpKind, PropertyMismatch, SceneNodeId};

use crate::tessellate::TessellateError;

/// Where in the input an error arose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpRef {
    /// During [`SceneState::build_from_scene`](crate::SceneState::build_from_scene).
    Build,
    /// At op `index` of the diff being applied.
    Op {
        /// Zero-based op position.
        index: usize,
        /// Tag of the failing op.
        kind: OpKind,
    },
}

impl OpRef {
    /// Op position, when the error came from a diff.
    pub const fn index(self) -> Option<usize> {
        match self {
            Self::Build => None,
            Self::Op { index, .. } => Some(index),
        }
    }
}

impl fmt::Display for OpRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Build => f.write_str("build"),
            Self::Op { index, kind } => write!(f, "op #{index} ({kind})"),
        }
    }
}

/// An op referenced state that does not match the live node table.
///
/// These indicate a producer bug: the diff was not computed against the
/// state it is being applied to.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContractViolation {
    /// The target node is not in the table.
    #[error("unknown node {0}")]
    UnknownNode(SceneNodeId),
    /// The named parent is not in the table.
    #[error("unknown parent {0}")]
    UnknownParent(SceneNodeId),
    /// An added id is already live.
    #[error("node {0} already exists")]
    DuplicateNode(SceneNodeId),
    /// The node is live but not a child of the named parent.
    #[error("{child} is not a child of {parent}")]
    NotAChild {
        /// Parent named by the op.
        parent: SceneNodeId,
        /// Node named by the op.
        child: SceneNodeId,
    },
    /// Children were addressed on a leaf.
    #[error("{0} is a {1} and cannot hold children")]
    NotAContainer(SceneNodeId, NodeKind),
    /// Insert or move position past the end of the child list.
    #[error("index {index} out of bounds for {parent} with {len} children")]
    IndexOutOfBounds {
        /// Parent named by the op.
        parent: SceneNodeId,
        /// Requested position.
        index: usize,
        /// Child count at the time of the op.
        len: usize,
    },
    /// A property change does not apply to the node's kind.
    #[error("cannot update {id}: {source}")]
    Property {
        /// Node being updated.
        id: SceneNodeId,
        /// Underlying mismatch.
        source: PropertyMismatch,
    },
    /// A replacement payload carries a different id than its target.
    #[error("replacement for {expected} carries id {found}")]
    IdMismatch {
        /// Id named by the op.
        expected: SceneNodeId,
        /// Id inside the payload.
        found: SceneNodeId,
    },
    /// The root was replaced by something other than a group.
    #[error("root must stay a group, not a {0}")]
    RootKind(NodeKind),
}

/// Failure of a state operation.
///
/// Whatever the variant, the state is left exactly as it was before the
/// failing op (or before the build, for [`OpRef::Build`]).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StateError {
    /// The input disagreed with the live table.
    #[error("{op}: {violation}")]
    Contract {
        /// Failing op.
        op: OpRef,
        /// What was wrong.
        violation: ContractViolation,
    },
    /// The tessellator rejected a node.
    #[error("{op}: tessellating {id}: {source}")]
    Tessellation {
        /// Failing op.
        op: OpRef,
        /// Node being tessellated.
        id: SceneNodeId,
        /// Tessellator error.
        source: TessellateError,
    },
    /// The diff does not start from the state's version.
    #[error("diff starts at version {found:?} but state is at {expected:?}")]
    VersionMismatch {
        /// Version the state holds, if any scene was built.
        expected: Option<u64>,
        /// `version_from` of the rejected diff.
        found: u64,
    },
}

impl StateError {
    /// Position of the failing op, when applying a diff.
    pub fn op_index(&self) -> Option<usize> {
        match self {
            Self::Contract { op, .. } | Self::Tessellation { op, .. } => op.index(),
            Self::VersionMismatch { .. } => None,
        }
    }

    /// The violated contract, if this is a contract error.
    pub fn violation(&self) -> Option<&ContractViolation> {
        match self {
            Self::Contract { violation, .. } => Some(violation),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_op() {
        let err = StateError::Contract {
            op: OpRef::Op {
                index: 3,
                kind: OpKind::Remove,
            },
            violation: ContractViolation::UnknownNode("r9".into()),
        };
        assert_eq!(err.to_string(), "op #3 (remove): unknown node r9");
        assert_eq!(err.op_index(), Some(3));
    }

    #[test]
    fn version_mismatch_has_no_op_index() {
        let err = StateError::VersionMismatch {
            expected: Some(2),
            found: 5,
        };
        assert_eq!(err.op_index(), None);
        assert!(err.violation().is_none());
    }
}
