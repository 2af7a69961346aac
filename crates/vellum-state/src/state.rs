// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The live, incrementally updated scene.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, instrument, trace, warn};
use vellum_scene::{
    AffineMatrix, CanvasSize, DiffOp, Group, NodeChanges, NodeKind, NodeProps, SceneGraph,
    SceneGraphDiff, SceneNode, SceneNodeId,
};

use crate::config::{FailurePolicy, SyncConfig};
use crate::draw_list::{DrawItem, DrawList};
use crate::error::{ContractViolation, OpRef, StateError};
use crate::report::{ApplyReport, DegradedNode};
use crate::tessellate::{Tessellator, VertexBuffer};

/// Live record of one node.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveNode {
    props: NodeProps,
    children: Vec<SceneNodeId>,
    vertices: Option<Arc<VertexBuffer>>,
    stale: bool,
}

impl LiveNode {
    /// Node identity.
    pub fn id(&self) -> &SceneNodeId {
        self.props.id()
    }

    /// Node type.
    pub fn kind(&self) -> NodeKind {
        self.props.kind()
    }

    /// Current own fields.
    pub fn props(&self) -> &NodeProps {
        &self.props
    }

    /// Ordered child ids; empty for leaves.
    pub fn children(&self) -> &[SceneNodeId] {
        &self.children
    }

    /// Cached geometry, if tessellation produced any.
    pub fn vertices(&self) -> Option<&Arc<VertexBuffer>> {
        self.vertices.as_ref()
    }

    /// Whether the cached geometry predates a failed re-tessellation.
    pub fn is_stale(&self) -> bool {
        self.stale
    }
}

type NodeTable = HashMap<SceneNodeId, LiveNode>;

fn contract(op: OpRef, violation: ContractViolation) -> StateError {
    StateError::Contract { op, violation }
}

enum Tessellation {
    Built(Option<Arc<VertexBuffer>>),
    /// Failure tolerated by [`FailurePolicy::Continue`] and recorded.
    Degraded,
}

/// Incrementally maintained scene: node table, tessellation cache and
/// child order.
///
/// Build it once with [`build_from_scene`](Self::build_from_scene), then
/// feed it the output of `vellum_diff::diff` with
/// [`apply_diff`](Self::apply_diff). After every successful apply the state
/// is indistinguishable from one built fresh from the newer version.
///
/// Single-owner and synchronous; wrap it in a lock to share it.
#[derive(Debug)]
pub struct SceneState<T> {
    tessellator: T,
    config: SyncConfig,
    nodes: NodeTable,
    root: Option<SceneNodeId>,
    version: Option<u64>,
    canvas: Option<CanvasSize>,
}

impl<T> SceneState<T> {
    /// Empty state with the default [`SyncConfig`].
    pub fn new(tessellator: T) -> Self {
        Self::with_config(tessellator, SyncConfig::default())
    }

    /// Empty state with an explicit config.
    pub fn with_config(tessellator: T, config: SyncConfig) -> Self {
        Self {
            tessellator,
            config,
            nodes: HashMap::new(),
            root: None,
            version: None,
            canvas: None,
        }
    }

    /// Active config.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Replaces the config; takes effect on the next call.
    pub fn set_config(&mut self, config: SyncConfig) {
        self.config = config;
    }

    /// The tessellator in use.
    pub fn tessellator(&self) -> &T {
        &self.tessellator
    }

    /// Live record for `id`; `None` for unknown or removed nodes.
    pub fn node(&self, id: &SceneNodeId) -> Option<&LiveNode> {
        self.nodes.get(id)
    }

    /// Whether `id` is live.
    pub fn contains(&self, id: &SceneNodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Root id, once a scene has been built.
    pub fn root_id(&self) -> Option<&SceneNodeId> {
        self.root.as_ref()
    }

    /// Version of the last build or fully applied diff.
    pub fn version(&self) -> Option<u64> {
        self.version
    }

    /// Canvas size of the current version.
    pub fn canvas(&self) -> Option<CanvasSize> {
        self.canvas
    }

    /// Number of live nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether no scene has been built.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Visible nodes in depth-first pre-order from the root.
    ///
    /// A node is drawn only if it and every ancestor are visible; hidden
    /// subtrees are not walked.
    pub fn draw_list(&self) -> DrawList<'_> {
        let mut items = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<&SceneNodeId> = self.root.iter().collect();
        while let Some(id) = stack.pop() {
            let Some(live) = self.nodes.get(id) else {
                continue;
            };
            let base = live.props.base();
            if !base.visible {
                continue;
            }
            items.push(DrawItem {
                id: live.id(),
                kind: live.kind(),
                transform: base.transform,
                opacity: base.opacity,
                vertices: live.vertices.as_ref(),
                fills: live.props.fills(),
                stroke: live.props.stroke(),
            });
            stack.extend(live.children.iter().rev());
        }
        DrawList::from_items(items)
    }

    /// Ids from the root down to the parent of `id`.
    ///
    /// Empty for the root itself; `None` when `id` is not reachable.
    pub fn ancestors(&self, id: &SceneNodeId) -> Option<Vec<&SceneNodeId>> {
        let root = self.root.as_ref()?;
        let mut path: Vec<&SceneNodeId> = Vec::new();
        let mut stack: Vec<(&SceneNodeId, usize)> = vec![(root, 0)];
        while let Some((current, depth)) = stack.pop() {
            path.truncate(depth);
            if current == id {
                return Some(path);
            }
            path.push(current);
            if let Some(live) = self.nodes.get(current) {
                stack.extend(live.children.iter().rev().map(|c| (c, depth + 1)));
            }
        }
        None
    }

    /// Local-to-canvas transform of `id`, composed along its ancestors.
    pub fn world_transform(&self, id: &SceneNodeId) -> Option<AffineMatrix> {
        let chain = self.ancestors(id)?;
        let mut world = AffineMatrix::IDENTITY;
        for step in chain.into_iter().chain(core::iter::once(id)) {
            let live = self.nodes.get(step)?;
            world = live.props.base().transform.then(world);
        }
        Some(world)
    }

    /// Rebuilds the full subtree rooted at `id` from the live table.
    pub fn snapshot(&self, id: &SceneNodeId) -> Option<SceneNode> {
        let mut order: Vec<&SceneNodeId> = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let live = self.nodes.get(current)?;
            order.push(current);
            stack.extend(live.children.iter().rev());
        }
        let mut built: HashMap<&SceneNodeId, SceneNode> = HashMap::with_capacity(order.len());
        for current in order.into_iter().rev() {
            let live = self.nodes.get(current)?;
            let children = live
                .children
                .iter()
                .filter_map(|child| built.remove(child))
                .collect();
            built.insert(current, live.props.clone().into_node(children));
        }
        built.remove(id)
    }

    /// Reconstructs the current version as a [`SceneGraph`].
    pub fn to_graph(&self) -> Option<SceneGraph> {
        let SceneNode::Group(root) = self.snapshot(self.root.as_ref()?)? else {
            return None;
        };
        let canvas = self.canvas?;
        Some(SceneGraph::new(
            root,
            canvas.width,
            canvas.height,
            self.version?,
        ))
    }
}

impl<T: Tessellator> SceneState<T> {
    /// Discards the current state and builds it from `graph`.
    ///
    /// Every node is registered and every geometry node tessellated. On
    /// error the previous state is kept intact.
    #[instrument(skip_all, fields(version = graph.version))]
    pub fn build_from_scene(&mut self, graph: &SceneGraph) -> Result<ApplyReport, StateError> {
        let mut report = ApplyReport::default();
        let nodes = self.build_table(&graph.root, OpRef::Build, &mut report)?;
        self.nodes = nodes;
        self.root = Some(graph.root_id().clone());
        self.version = Some(graph.version);
        self.canvas = Some(graph.canvas());
        debug!(
            nodes = self.nodes.len(),
            tessellated = report.tessellated,
            degraded = report.degraded.len(),
            "scene built"
        );
        Ok(report)
    }

    /// Applies `diff` op by op.
    ///
    /// Each op is atomic: on error, ops before the failing one stay applied,
    /// the failing one leaves no trace, and the version is not advanced.
    /// Rebuild with [`build_from_scene`](Self::build_from_scene) to recover.
    #[instrument(
        skip_all,
        fields(from = diff.version_from, to = diff.version_to, ops = diff.ops.len())
    )]
    pub fn apply_diff(&mut self, diff: &SceneGraphDiff) -> Result<ApplyReport, StateError> {
        if self.config.enforce_versions && self.version != Some(diff.version_from) {
            return Err(StateError::VersionMismatch {
                expected: self.version,
                found: diff.version_from,
            });
        }
        let mut report = ApplyReport::default();
        for (index, op) in diff.ops.iter().enumerate() {
            let at = OpRef::Op {
                index,
                kind: op.kind(),
            };
            trace!(index, op = %op.kind(), target = %op.target(), "applying op");
            self.apply_op(at, op, &mut report)?;
            report.ops_applied += 1;
        }
        self.version = Some(diff.version_to);
        if let Some(canvas) = diff.canvas {
            self.canvas = Some(canvas);
        }
        debug!(
            tessellated = report.tessellated,
            reused = report.reused,
            degraded = report.degraded.len(),
            "diff applied"
        );
        Ok(report)
    }

    fn apply_op(
        &mut self,
        op: OpRef,
        diff_op: &DiffOp,
        report: &mut ApplyReport,
    ) -> Result<(), StateError> {
        match diff_op {
            DiffOp::Add {
                parent_id,
                node,
                index,
            } => self.add(op, parent_id, node, *index, report),
            DiffOp::Remove { parent_id, node_id } => self.remove(op, parent_id, node_id),
            DiffOp::Update { node_id, changes } => self.update(op, node_id, changes, report),
            DiffOp::Reorder {
                parent_id,
                node_id,
                new_index,
            } => self.reorder(op, parent_id, node_id, *new_index),
            DiffOp::ReplaceRoot { root } => {
                self.nodes = self.build_table(root, op, report)?;
                self.root = Some(root.base.id.clone());
                Ok(())
            }
        }
    }

    fn add(
        &mut self,
        op: OpRef,
        parent_id: &SceneNodeId,
        node: &SceneNode,
        index: usize,
        report: &mut ApplyReport,
    ) -> Result<(), StateError> {
        let parent = self
            .nodes
            .get(parent_id)
            .ok_or_else(|| contract(op, ContractViolation::UnknownParent(parent_id.clone())))?;
        if !parent.kind().is_container() {
            return Err(contract(
                op,
                ContractViolation::NotAContainer(parent_id.clone(), parent.kind()),
            ));
        }
        let len = parent.children.len();
        if index > len {
            return Err(contract(
                op,
                ContractViolation::IndexOutOfBounds {
                    parent: parent_id.clone(),
                    index,
                    len,
                },
            ));
        }
        let fresh = self.prepare(node.to_props(), node.children(), true, op, report)?;
        self.nodes.extend(fresh);
        if let Some(parent) = self.nodes.get_mut(parent_id) {
            parent.children.insert(index, node.id().clone());
        }
        Ok(())
    }

    fn remove(
        &mut self,
        op: OpRef,
        parent_id: &SceneNodeId,
        node_id: &SceneNodeId,
    ) -> Result<(), StateError> {
        self.child_position(op, parent_id, node_id)?;
        let mut doomed = vec![node_id.clone()];
        while let Some(id) = doomed.pop() {
            if let Some(live) = self.nodes.remove(&id) {
                doomed.extend(live.children);
            }
        }
        if let Some(parent) = self.nodes.get_mut(parent_id) {
            parent.children.retain(|c| c != node_id);
        }
        Ok(())
    }

    fn update(
        &mut self,
        op: OpRef,
        node_id: &SceneNodeId,
        changes: &NodeChanges,
        report: &mut ApplyReport,
    ) -> Result<(), StateError> {
        let live = self
            .nodes
            .get(node_id)
            .ok_or_else(|| contract(op, ContractViolation::UnknownNode(node_id.clone())))?;
        let (props, retessellate) = match changes {
            NodeChanges::Patch(list) => {
                let mut props = live.props.clone();
                props.apply(list).map_err(|source| {
                    contract(
                        op,
                        ContractViolation::Property {
                            id: node_id.clone(),
                            source,
                        },
                    )
                })?;
                let kind = props.kind();
                let hit = live.stale
                    || list
                        .iter()
                        .any(|change| self.tessellator.affects_geometry(kind, change));
                (props, hit)
            }
            NodeChanges::Replace(next) => {
                if next.id() != node_id {
                    return Err(contract(
                        op,
                        ContractViolation::IdMismatch {
                            expected: node_id.clone(),
                            found: next.id().clone(),
                        },
                    ));
                }
                if self.root.as_ref() == Some(node_id) && next.kind() != NodeKind::Group {
                    return Err(contract(op, ContractViolation::RootKind(next.kind())));
                }
                (next.clone(), true)
            }
        };

        let (vertices, stale) = if !props.kind().is_geometry() {
            (None, false)
        } else if retessellate {
            match self.tessellate(&props, op, report)? {
                Tessellation::Built(vertices) => (vertices, false),
                Tessellation::Degraded if live.kind() == props.kind() => {
                    (live.vertices.clone(), true)
                }
                Tessellation::Degraded => (None, true),
            }
        } else {
            report.reused += 1;
            (live.vertices.clone(), live.stale)
        };

        if let Some(live) = self.nodes.get_mut(node_id) {
            live.props = props;
            live.vertices = vertices;
            live.stale = stale;
        }
        Ok(())
    }

    fn reorder(
        &mut self,
        op: OpRef,
        parent_id: &SceneNodeId,
        node_id: &SceneNodeId,
        new_index: usize,
    ) -> Result<(), StateError> {
        let (at, len) = self.child_position(op, parent_id, node_id)?;
        if new_index >= len {
            return Err(contract(
                op,
                ContractViolation::IndexOutOfBounds {
                    parent: parent_id.clone(),
                    index: new_index,
                    len,
                },
            ));
        }
        if let Some(parent) = self.nodes.get_mut(parent_id) {
            let moved = parent.children.remove(at);
            parent.children.insert(new_index, moved);
        }
        Ok(())
    }

    /// Position of `node_id` under `parent_id`, and the parent's child count.
    fn child_position(
        &self,
        op: OpRef,
        parent_id: &SceneNodeId,
        node_id: &SceneNodeId,
    ) -> Result<(usize, usize), StateError> {
        let parent = self
            .nodes
            .get(parent_id)
            .ok_or_else(|| contract(op, ContractViolation::UnknownParent(parent_id.clone())))?;
        if !self.nodes.contains_key(node_id) {
            return Err(contract(op, ContractViolation::UnknownNode(node_id.clone())));
        }
        let at = parent
            .children
            .iter()
            .position(|c| c == node_id)
            .ok_or_else(|| {
                contract(
                    op,
                    ContractViolation::NotAChild {
                        parent: parent_id.clone(),
                        child: node_id.clone(),
                    },
                )
            })?;
        Ok((at, parent.children.len()))
    }

    fn build_table(
        &self,
        root: &Group,
        op: OpRef,
        report: &mut ApplyReport,
    ) -> Result<NodeTable, StateError> {
        let entries = self.prepare(root.to_props(), &root.children, false, op, report)?;
        Ok(entries.into_iter().collect())
    }

    /// Registers and tessellates a subtree without touching the table.
    ///
    /// With `against_live`, ids already in the table are rejected as well
    /// as ids repeated inside the subtree.
    fn prepare(
        &self,
        top: NodeProps,
        children: &[SceneNode],
        against_live: bool,
        op: OpRef,
        report: &mut ApplyReport,
    ) -> Result<Vec<(SceneNodeId, LiveNode)>, StateError> {
        let mut out = Vec::new();
        let mut seen: HashSet<SceneNodeId> = HashSet::new();
        let mut pending: Vec<(NodeProps, &[SceneNode])> = vec![(top, children)];
        while let Some((props, children)) = pending.pop() {
            let id = props.id().clone();
            if (against_live && self.nodes.contains_key(&id)) || !seen.insert(id.clone()) {
                return Err(contract(op, ContractViolation::DuplicateNode(id)));
            }
            let (vertices, stale) = if props.kind().is_geometry() {
                match self.tessellate(&props, op, report)? {
                    Tessellation::Built(vertices) => (vertices, false),
                    Tessellation::Degraded => (None, true),
                }
            } else {
                (None, false)
            };
            pending.extend(
                children
                    .iter()
                    .rev()
                    .map(|child| (child.to_props(), child.children())),
            );
            out.push((
                id,
                LiveNode {
                    props,
                    children: children.iter().map(|c| c.id().clone()).collect(),
                    vertices,
                    stale,
                },
            ));
        }
        Ok(out)
    }

    fn tessellate(
        &self,
        props: &NodeProps,
        op: OpRef,
        report: &mut ApplyReport,
    ) -> Result<Tessellation, StateError> {
        match self.tessellator.tessellate(props) {
            Ok(buffer) => {
                report.tessellated += 1;
                Ok(Tessellation::Built(buffer.map(Arc::new)))
            }
            Err(source) => match self.config.failure_policy {
                FailurePolicy::Abort => Err(StateError::Tessellation {
                    op,
                    id: props.id().clone(),
                    source,
                }),
                FailurePolicy::Continue => {
                    warn!(%op, id = %props.id(), error = %source, "tessellation failed; keeping previous geometry");
                    report.degraded.push(DegradedNode {
                        op_index: op.index(),
                        id: props.id().clone(),
                        error: source,
                    });
                    Ok(Tessellation::Degraded)
                }
            },
        }
    }
}
