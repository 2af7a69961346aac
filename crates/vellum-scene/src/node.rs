// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scene node variants.
//!
//! A [`SceneNode`] is one element of a scene-graph version. Containers
//! ([`Group`], [`Frame`]) own their children by value; everything else is a
//! leaf. [`NodeProps`] is the same data with the children stripped, which is
//! what updates and the live node table carry.

use core::fmt;
use std::sync::Arc;

use crate::affine::AffineMatrix;
use crate::id::SceneNodeId;
use crate::style::{Effect, Fill, Stroke};

/// Format-specific bytes the core treats as an opaque, shareable value.
///
/// Equality checks pointer identity first and falls back to byte
/// comparison, so producers that reuse the same allocation compare in O(1).
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct OpaquePayload(Arc<[u8]>);

impl OpaquePayload {
    /// Wraps `bytes` in a shared payload.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(Arc::from(bytes.into()))
    }

    /// Returns the payload bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Whether both payloads share one allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for OpaquePayload {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.0 == other.0
    }
}

impl Eq for OpaquePayload {}

impl From<&[u8]> for OpaquePayload {
    fn from(value: &[u8]) -> Self {
        Self(Arc::from(value))
    }
}

/// Fields shared by every node variant.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeBase {
    /// Node identity.
    pub id: SceneNodeId,
    /// Local-to-parent transform.
    pub transform: AffineMatrix,
    /// Node opacity in `0..=1`.
    pub opacity: f64,
    /// Hidden nodes hide their entire subtree.
    pub visible: bool,
    /// Ordered post-processing effects.
    pub effects: Vec<Effect>,
}

impl NodeBase {
    /// Visible, fully opaque, untransformed base with no effects.
    pub fn new(id: impl Into<SceneNodeId>) -> Self {
        Self {
            id: id.into(),
            transform: AffineMatrix::IDENTITY,
            opacity: 1.0,
            visible: true,
            effects: Vec::new(),
        }
    }
}

/// Winding rule used to fill a path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FillRule {
    /// Non-zero winding.
    #[default]
    NonZero,
    /// Even-odd parity.
    EvenOdd,
}

/// One path contour command.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PathCommand {
    /// Start a new contour.
    MoveTo([f64; 2]),
    /// Straight segment.
    LineTo([f64; 2]),
    /// Quadratic Bézier segment.
    QuadTo {
        /// Control point.
        ctrl: [f64; 2],
        /// End point.
        to: [f64; 2],
    },
    /// Cubic Bézier segment.
    CubicTo {
        /// First control point.
        ctrl1: [f64; 2],
        /// Second control point.
        ctrl2: [f64; 2],
        /// End point.
        to: [f64; 2],
    },
    /// Close the current contour.
    Close,
}

/// Contour data of a [`PathNode`].
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathData {
    /// Ordered contour commands.
    pub commands: Vec<PathCommand>,
    /// Winding rule.
    pub fill_rule: FillRule,
}

/// Plain container.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Group {
    /// Shared fields.
    pub base: NodeBase,
    /// Ordered children, back to front.
    pub children: Vec<SceneNode>,
}

impl Group {
    /// Group with default base fields.
    pub fn new(id: impl Into<SceneNodeId>, children: Vec<SceneNode>) -> Self {
        Self {
            base: NodeBase::new(id),
            children,
        }
    }

    /// The group's own fields without children.
    pub fn to_props(&self) -> NodeProps {
        NodeProps::Group {
            base: self.base.clone(),
        }
    }
}

/// Container that clips its children to `width` x `height`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Frame {
    /// Shared fields.
    pub base: NodeBase,
    /// Clip width.
    pub width: f64,
    /// Clip height.
    pub height: f64,
    /// Ordered children, back to front.
    pub children: Vec<SceneNode>,
}

/// Axis-aligned rectangle with optional rounded corners.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    /// Shared fields.
    pub base: NodeBase,
    /// Width in local units.
    pub width: f64,
    /// Height in local units.
    pub height: f64,
    /// Corner radius; `0` for sharp corners.
    pub corner_radius: f64,
    /// Fill layers, bottom to top.
    pub fills: Vec<Fill>,
    /// Optional outline.
    pub stroke: Option<Stroke>,
}

impl Rect {
    /// Unfilled, unstroked rectangle.
    pub fn new(id: impl Into<SceneNodeId>, width: f64, height: f64) -> Self {
        Self {
            base: NodeBase::new(id),
            width,
            height,
            corner_radius: 0.0,
            fills: Vec::new(),
            stroke: None,
        }
    }
}

/// Ellipse inscribed in a `width` x `height` box.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ellipse {
    /// Shared fields.
    pub base: NodeBase,
    /// Bounding-box width.
    pub width: f64,
    /// Bounding-box height.
    pub height: f64,
    /// Fill layers, bottom to top.
    pub fills: Vec<Fill>,
    /// Optional outline.
    pub stroke: Option<Stroke>,
}

/// Arbitrary contour geometry.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathNode {
    /// Shared fields.
    pub base: NodeBase,
    /// Contour data, shared between versions when unchanged.
    pub data: Arc<PathData>,
    /// Fill layers, bottom to top.
    pub fills: Vec<Fill>,
    /// Optional outline.
    pub stroke: Option<Stroke>,
}

/// Text run. The layout payload is opaque to this layer.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Text {
    /// Shared fields.
    pub base: NodeBase,
    /// Format-specific text payload.
    pub payload: OpaquePayload,
}

/// Raster image. The pixel/asset payload is opaque to this layer.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Image {
    /// Shared fields.
    pub base: NodeBase,
    /// Format-specific image payload.
    pub payload: OpaquePayload,
}

/// Fieldless node type tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum NodeKind {
    /// [`Group`].
    Group = 0,
    /// [`Frame`].
    Frame = 1,
    /// [`Rect`].
    Rect = 2,
    /// [`Ellipse`].
    Ellipse = 3,
    /// [`PathNode`].
    Path = 4,
    /// [`Text`].
    Text = 5,
    /// [`Image`].
    Image = 6,
}

impl NodeKind {
    /// Whether nodes of this kind hold children.
    pub const fn is_container(self) -> bool {
        matches!(self, Self::Group | Self::Frame)
    }

    /// Whether nodes of this kind are tessellated.
    pub const fn is_geometry(self) -> bool {
        matches!(self, Self::Rect | Self::Ellipse | Self::Path)
    }

    /// Lowercase name used in logs and error messages.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Group => "group",
            Self::Frame => "frame",
            Self::Rect => "rect",
            Self::Ellipse => "ellipse",
            Self::Path => "path",
            Self::Text => "text",
            Self::Image => "image",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One node of a scene-graph version, including its subtree.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SceneNode {
    /// Plain container.
    Group(Group),
    /// Clipping container.
    Frame(Frame),
    /// Rectangle leaf.
    Rect(Rect),
    /// Ellipse leaf.
    Ellipse(Ellipse),
    /// Path leaf.
    Path(PathNode),
    /// Opaque text leaf.
    Text(Text),
    /// Opaque image leaf.
    Image(Image),
}

impl SceneNode {
    /// Shared fields.
    pub fn base(&self) -> &NodeBase {
        match self {
            Self::Group(n) => &n.base,
            Self::Frame(n) => &n.base,
            Self::Rect(n) => &n.base,
            Self::Ellipse(n) => &n.base,
            Self::Path(n) => &n.base,
            Self::Text(n) => &n.base,
            Self::Image(n) => &n.base,
        }
    }

    /// Mutable shared fields.
    pub fn base_mut(&mut self) -> &mut NodeBase {
        match self {
            Self::Group(n) => &mut n.base,
            Self::Frame(n) => &mut n.base,
            Self::Rect(n) => &mut n.base,
            Self::Ellipse(n) => &mut n.base,
            Self::Path(n) => &mut n.base,
            Self::Text(n) => &mut n.base,
            Self::Image(n) => &mut n.base,
        }
    }

    /// Node identity.
    pub fn id(&self) -> &SceneNodeId {
        &self.base().id
    }

    /// Type tag.
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Group(_) => NodeKind::Group,
            Self::Frame(_) => NodeKind::Frame,
            Self::Rect(_) => NodeKind::Rect,
            Self::Ellipse(_) => NodeKind::Ellipse,
            Self::Path(_) => NodeKind::Path,
            Self::Text(_) => NodeKind::Text,
            Self::Image(_) => NodeKind::Image,
        }
    }

    /// Ordered children; empty for leaves.
    pub fn children(&self) -> &[SceneNode] {
        match self {
            Self::Group(n) => &n.children,
            Self::Frame(n) => &n.children,
            _ => &[],
        }
    }

    /// Mutable child list, or `None` for leaves.
    pub fn children_mut(&mut self) -> Option<&mut Vec<SceneNode>> {
        match self {
            Self::Group(n) => Some(&mut n.children),
            Self::Frame(n) => Some(&mut n.children),
            _ => None,
        }
    }

    /// The node's own fields without children.
    pub fn to_props(&self) -> NodeProps {
        match self {
            Self::Group(n) => n.to_props(),
            Self::Frame(n) => NodeProps::Frame {
                base: n.base.clone(),
                width: n.width,
                height: n.height,
            },
            Self::Rect(n) => NodeProps::Rect(n.clone()),
            Self::Ellipse(n) => NodeProps::Ellipse(n.clone()),
            Self::Path(n) => NodeProps::Path(n.clone()),
            Self::Text(n) => NodeProps::Text(n.clone()),
            Self::Image(n) => NodeProps::Image(n.clone()),
        }
    }

    /// Pre-order iterator over this node and all of its descendants.
    pub fn walk(&self) -> Walk<'_> {
        Walk { stack: vec![self] }
    }
}

impl From<Group> for SceneNode {
    fn from(value: Group) -> Self {
        Self::Group(value)
    }
}

impl From<Frame> for SceneNode {
    fn from(value: Frame) -> Self {
        Self::Frame(value)
    }
}

impl From<Rect> for SceneNode {
    fn from(value: Rect) -> Self {
        Self::Rect(value)
    }
}

impl From<Ellipse> for SceneNode {
    fn from(value: Ellipse) -> Self {
        Self::Ellipse(value)
    }
}

impl From<PathNode> for SceneNode {
    fn from(value: PathNode) -> Self {
        Self::Path(value)
    }
}

impl From<Text> for SceneNode {
    fn from(value: Text) -> Self {
        Self::Text(value)
    }
}

impl From<Image> for SceneNode {
    fn from(value: Image) -> Self {
        Self::Image(value)
    }
}

/// Pre-order traversal returned by [`SceneNode::walk`].
#[derive(Debug)]
pub struct Walk<'a> {
    stack: Vec<&'a SceneNode>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a SceneNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children().iter().rev());
        Some(node)
    }
}

/// A node's own fields, without children.
///
/// This is the payload of a type-changing update and the record kept per
/// node by the live state. Leaf variants reuse the leaf structs directly.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeProps {
    /// Group fields.
    Group {
        /// Shared fields.
        base: NodeBase,
    },
    /// Frame fields.
    Frame {
        /// Shared fields.
        base: NodeBase,
        /// Clip width.
        width: f64,
        /// Clip height.
        height: f64,
    },
    /// Rectangle fields.
    Rect(Rect),
    /// Ellipse fields.
    Ellipse(Ellipse),
    /// Path fields.
    Path(PathNode),
    /// Text fields.
    Text(Text),
    /// Image fields.
    Image(Image),
}

impl NodeProps {
    /// Shared fields.
    pub fn base(&self) -> &NodeBase {
        match self {
            Self::Group { base } | Self::Frame { base, .. } => base,
            Self::Rect(n) => &n.base,
            Self::Ellipse(n) => &n.base,
            Self::Path(n) => &n.base,
            Self::Text(n) => &n.base,
            Self::Image(n) => &n.base,
        }
    }

    /// Mutable shared fields.
    pub fn base_mut(&mut self) -> &mut NodeBase {
        match self {
            Self::Group { base } | Self::Frame { base, .. } => base,
            Self::Rect(n) => &mut n.base,
            Self::Ellipse(n) => &mut n.base,
            Self::Path(n) => &mut n.base,
            Self::Text(n) => &mut n.base,
            Self::Image(n) => &mut n.base,
        }
    }

    /// Node identity.
    pub fn id(&self) -> &SceneNodeId {
        &self.base().id
    }

    /// Type tag.
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Group { .. } => NodeKind::Group,
            Self::Frame { .. } => NodeKind::Frame,
            Self::Rect(_) => NodeKind::Rect,
            Self::Ellipse(_) => NodeKind::Ellipse,
            Self::Path(_) => NodeKind::Path,
            Self::Text(_) => NodeKind::Text,
            Self::Image(_) => NodeKind::Image,
        }
    }

    /// Fill layers of geometry nodes; empty otherwise.
    pub fn fills(&self) -> &[Fill] {
        match self {
            Self::Rect(n) => &n.fills,
            Self::Ellipse(n) => &n.fills,
            Self::Path(n) => &n.fills,
            _ => &[],
        }
    }

    /// Stroke of geometry nodes, if any.
    pub fn stroke(&self) -> Option<&Stroke> {
        match self {
            Self::Rect(n) => n.stroke.as_ref(),
            Self::Ellipse(n) => n.stroke.as_ref(),
            Self::Path(n) => n.stroke.as_ref(),
            _ => None,
        }
    }

    /// Reattaches `children` to rebuild a full node.
    ///
    /// Leaves have nowhere to put children; they are dropped.
    pub fn into_node(self, children: Vec<SceneNode>) -> SceneNode {
        match self {
            Self::Group { base } => SceneNode::Group(Group { base, children }),
            Self::Frame {
                base,
                width,
                height,
            } => SceneNode::Frame(Frame {
                base,
                width,
                height,
                children,
            }),
            Self::Rect(n) => SceneNode::Rect(n),
            Self::Ellipse(n) => SceneNode::Ellipse(n),
            Self::Path(n) => SceneNode::Path(n),
            Self::Text(n) => SceneNode::Text(n),
            Self::Image(n) => SceneNode::Image(n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walk_is_preorder() {
        let tree = SceneNode::Group(Group::new(
            "a",
            vec![
                SceneNode::Group(Group::new("b", vec![Rect::new("c", 1.0, 1.0).into()])),
                Rect::new("d", 1.0, 1.0).into(),
            ],
        ));
        let ids: Vec<&str> = tree.walk().map(|n| n.id().as_str()).collect();
        assert_eq!(ids, ["a", "b", "c", "d"]);
    }

    #[test]
    fn props_round_trip_through_into_node() {
        let frame = SceneNode::Frame(Frame {
            base: NodeBase::new("f"),
            width: 10.0,
            height: 20.0,
            children: vec![Rect::new("r", 1.0, 2.0).into()],
        });
        let rebuilt = frame.to_props().into_node(frame.children().to_vec());
        assert_eq!(rebuilt, frame);
    }

    #[test]
    fn payload_equality_falls_back_to_bytes() {
        let a = OpaquePayload::new(vec![1, 2, 3]);
        let b = OpaquePayload::new(vec![1, 2, 3]);
        assert!(!a.ptr_eq(&b));
        assert_eq!(a, b);
        assert_ne!(a, OpaquePayload::new(vec![1, 2]));
    }
}
