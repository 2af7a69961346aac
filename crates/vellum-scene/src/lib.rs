// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scene node model for Vellum incremental rendering.
//!
//! This crate defines the value types that describe one version of a vector
//! document's scene graph, plus the operations that transform one version
//! into another. It contains NO diffing or state logic: the differ lives in
//! `vellum-diff` and the live incremental store in `vellum-state`.
//!
//! # Design Principles
//!
//! - **Ids are the only identity**: [`SceneNodeId`] correlates nodes across
//!   versions; positions never do.
//! - **Closed variants**: [`SceneNode`] is a closed tagged union, so property
//!   comparison is a per-variant comparator rather than key reflection.
//! - **One level deep**: [`NodeProps::diff`] compares a node's own fields,
//!   never the contents of its children.
//!
//! # Crate Features
//!
//! - `serde`: derives `Serialize`/`Deserialize` for all model types.

mod affine;
mod changes;
mod graph;
mod id;
mod node;
mod style;

pub use affine::AffineMatrix;
pub use changes::{NodeChanges, PropertyChange, PropertyKey, PropertyMismatch};
pub use graph::{CanvasSize, DiffOp, OpKind, SceneGraph, SceneGraphDiff};
pub use id::SceneNodeId;
pub use node::{
    Ellipse, FillRule, Frame, Group, Image, NodeBase, NodeKind, NodeProps, OpaquePayload, PathCommand,
    PathData, PathNode, Rect, SceneNode, Text, Walk,
};
pub use style::{Color, Effect, Fill, GradientStop, LineCap, LineJoin, Paint, Stroke};
