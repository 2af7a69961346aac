// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Node fixtures, a [`SceneGraph`] builder and tree surgery helpers.

use std::sync::Arc;

use vellum_scene::{
    Color, Ellipse, Fill, Frame, Group, Image, NodeBase, OpaquePayload, PathCommand, PathData,
    PathNode, Rect, SceneGraph, SceneNode, SceneNodeId, Text,
};

/// Root id used by [`scene`] and [`SceneGraphBuilder`] unless overridden.
pub const ROOT_ID: &str = "root";

/// Canvas used by [`scene`] and [`SceneGraphBuilder`] unless overridden.
pub const CANVAS: (f64, f64) = (800.0, 600.0);

/// Rectangle with one solid fill.
pub fn rect(id: &str, width: f64, height: f64) -> SceneNode {
    let mut node = Rect::new(id, width, height);
    node.fills.push(Fill::solid(Color::rgba(0.2, 0.4, 0.8, 1.0)));
    node.into()
}

/// Ellipse with one solid fill.
pub fn ellipse(id: &str, width: f64, height: f64) -> SceneNode {
    Ellipse {
        base: NodeBase::new(id),
        width,
        height,
        fills: vec![Fill::solid(Color::rgba(0.9, 0.3, 0.1, 1.0))],
        stroke: None,
    }
    .into()
}

/// Closed polygon through `points`, filled black.
pub fn path(id: &str, points: &[[f64; 2]]) -> SceneNode {
    let mut commands: Vec<PathCommand> = points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            if i == 0 {
                PathCommand::MoveTo(*p)
            } else {
                PathCommand::LineTo(*p)
            }
        })
        .collect();
    commands.push(PathCommand::Close);
    PathNode {
        base: NodeBase::new(id),
        data: Arc::new(PathData {
            commands,
            ..PathData::default()
        }),
        fills: vec![Fill::solid(Color::BLACK)],
        stroke: None,
    }
    .into()
}

/// Text leaf carrying `content` as its payload.
pub fn text(id: &str, content: &str) -> SceneNode {
    Text {
        base: NodeBase::new(id),
        payload: OpaquePayload::new(content.as_bytes()),
    }
    .into()
}

/// Image leaf carrying `bytes` as its payload.
pub fn image(id: &str, bytes: &[u8]) -> SceneNode {
    Image {
        base: NodeBase::new(id),
        payload: OpaquePayload::new(bytes),
    }
    .into()
}

/// Plain group.
pub fn group(id: &str, children: Vec<SceneNode>) -> SceneNode {
    Group::new(id, children).into()
}

/// Clipping frame.
pub fn frame(id: &str, width: f64, height: f64, children: Vec<SceneNode>) -> SceneNode {
    Frame {
        base: NodeBase::new(id),
        width,
        height,
        children,
    }
    .into()
}

/// Graph with root [`ROOT_ID`], canvas [`CANVAS`] and the given children.
pub fn scene(version: u64, children: Vec<SceneNode>) -> SceneGraph {
    SceneGraphBuilder::new()
        .version(version)
        .children(children)
        .build()
}

/// Builder for [`SceneGraph`] instances in tests.
///
/// # Example
///
/// ```
/// use vellum_dry_tests::{rect, SceneGraphBuilder};
///
/// let graph = SceneGraphBuilder::new()
///     .version(5)
///     .with_child(rect("r1", 10.0, 20.0))
///     .build();
///
/// assert_eq!(graph.version, 5);
/// assert_eq!(graph.root_id().as_str(), "root");
/// assert_eq!(graph.node_count(), 2);
/// ```
pub struct SceneGraphBuilder {
    root: Group,
    canvas: (f64, f64),
    version: u64,
}

impl Default for SceneGraphBuilder {
    fn default() -> Self {
        Self {
            root: Group::new(ROOT_ID, Vec::new()),
            canvas: CANVAS,
            version: 0,
        }
    }
}

impl SceneGraphBuilder {
    /// Create a new builder with defaults (version 0, empty root).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the version.
    pub fn version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    /// Set the canvas size.
    pub fn canvas(mut self, width: f64, height: f64) -> Self {
        self.canvas = (width, height);
        self
    }

    /// Set the root id.
    pub fn root_id(mut self, id: &str) -> Self {
        self.root.base.id = SceneNodeId::new(id);
        self
    }

    /// Set the root's own base fields, keeping its id.
    pub fn root_base(mut self, base: NodeBase) -> Self {
        let id = std::mem::replace(&mut self.root.base, base).id;
        self.root.base.id = id;
        self
    }

    /// Append one top-level child.
    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.root.children.push(child);
        self
    }

    /// Replace the top-level children.
    pub fn children(mut self, children: Vec<SceneNode>) -> Self {
        self.root.children = children;
        self
    }

    /// Build the graph.
    pub fn build(self) -> SceneGraph {
        SceneGraph::new(self.root, self.canvas.0, self.canvas.1, self.version)
    }
}

/// Mutable access to a non-root node by id.
pub fn find_mut<'a>(graph: &'a mut SceneGraph, id: &str) -> Option<&'a mut SceneNode> {
    let mut stack: Vec<&'a mut SceneNode> = graph.root.children.iter_mut().collect();
    while let Some(node) = stack.pop() {
        if node.id().as_str() == id {
            return Some(node);
        }
        if let Some(children) = node.children_mut() {
            stack.extend(children.iter_mut());
        }
    }
    None
}

/// Child list of the container `parent`, root included.
pub fn children_mut<'a>(graph: &'a mut SceneGraph, parent: &str) -> Option<&'a mut Vec<SceneNode>> {
    if graph.root_id().as_str() == parent {
        return Some(&mut graph.root.children);
    }
    find_mut(graph, parent)?.children_mut()
}

/// Unlinks the non-root node `id` (with its subtree) and returns it.
pub fn detach(graph: &mut SceneGraph, id: &str) -> Option<SceneNode> {
    let mut stack: Vec<&mut Vec<SceneNode>> = vec![&mut graph.root.children];
    while let Some(list) = stack.pop() {
        if let Some(at) = list.iter().position(|n| n.id().as_str() == id) {
            return Some(list.remove(at));
        }
        stack.extend(list.iter_mut().filter_map(SceneNode::children_mut));
    }
    None
}
