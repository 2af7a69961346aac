// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Keyed structural differ for Vellum scene graphs.
//!
//! [`diff`] compares two versions of a scene graph and produces the ordered
//! list of [`DiffOp`]s that turns the first into the second. Nodes are
//! matched by [`SceneNodeId`] within each container, never by position.
//!
//! # Op order
//!
//! For every container, starting at the root:
//!
//! 1. `Remove` for each previous child missing from the new child list, in
//!    previous order.
//! 2. For each new child, left to right: `Add` (new ids), or `Update` then
//!    `Reorder` (surviving ids), followed immediately by the child's own
//!    container ops when it is a container in either version.
//!
//! Replaying the flat list in order against the previous state reproduces
//! the new version. `Reorder` is emitted when the child is not already at
//! its target index in the replayed order, so replay is exact even when
//! several siblings move at once.
//!
//! Nodes that change parent cannot be moved with `Reorder`; they are
//! removed up front (before any other op except the root update) and
//! re-added under their new parent by the normal walk.

use std::collections::{HashMap, HashSet};

use tracing::{debug, trace};
use vellum_scene::{DiffOp, SceneGraph, SceneGraphDiff, SceneNode, SceneNodeId};

/// Computes the ops turning `prev` into `next`.
///
/// Pure: neither input is modified. A diff with no ops means the two
/// versions are indistinguishable to the renderer.
pub fn diff(prev: &SceneGraph, next: &SceneGraph) -> SceneGraphDiff {
    let canvas = (prev.canvas() != next.canvas()).then(|| next.canvas());
    let ops = if prev.root_id() == next.root_id() {
        Reconciler::new(prev, next).run()
    } else {
        debug!(
            prev_root = %prev.root_id(),
            next_root = %next.root_id(),
            "root identity changed; replacing scene"
        );
        vec![DiffOp::ReplaceRoot {
            root: next.root.clone(),
        }]
    };
    debug!(
        from = prev.version,
        to = next.version,
        ops = ops.len(),
        "scene graph diff computed"
    );
    SceneGraphDiff {
        ops,
        version_from: prev.version,
        version_to: next.version,
        canvas,
    }
}

/// Child-to-parent index of every non-root node.
fn parent_index(graph: &SceneGraph) -> HashMap<&SceneNodeId, &SceneNodeId> {
    let mut parents = HashMap::new();
    let root_id = graph.root_id();
    let mut stack: Vec<&SceneNode> = Vec::with_capacity(graph.root.children.len());
    for child in &graph.root.children {
        parents.insert(child.id(), root_id);
        stack.push(child);
    }
    while let Some(node) = stack.pop() {
        for child in node.children() {
            parents.insert(child.id(), node.id());
            stack.push(child);
        }
    }
    parents
}

/// Reconciliation state for one open container.
struct Frame<'a> {
    parent: &'a SceneNodeId,
    /// Surviving previous children by id.
    prev_by_id: HashMap<&'a SceneNodeId, &'a SceneNode>,
    next_children: &'a [SceneNode],
    /// Surviving previous children, in previous order.
    survivors: Vec<&'a SceneNodeId>,
    /// First entry of `survivors` that may still be unsettled.
    head: usize,
    /// Survivors already placed at their final index.
    settled: HashSet<&'a SceneNodeId>,
    cursor: usize,
}

impl<'a> Frame<'a> {
    /// Settles `id` at the current index and reports whether replay
    /// already has it there.
    ///
    /// After replaying the ops emitted so far, the child order is the
    /// settled children followed by the unsettled survivors in previous
    /// order, so the slot at the current index holds the first unsettled
    /// survivor.
    fn settle(&mut self, id: &'a SceneNodeId) -> bool {
        while self
            .survivors
            .get(self.head)
            .is_some_and(|s| self.settled.contains(s))
        {
            self.head += 1;
        }
        let in_place = self.survivors.get(self.head) == Some(&id);
        self.settled.insert(id);
        in_place
    }
}

struct Reconciler<'a> {
    prev: &'a SceneGraph,
    next: &'a SceneGraph,
    next_parents: HashMap<&'a SceneNodeId, &'a SceneNodeId>,
    hoisted: HashSet<&'a SceneNodeId>,
    ops: Vec<DiffOp>,
}

impl<'a> Reconciler<'a> {
    fn new(prev: &'a SceneGraph, next: &'a SceneGraph) -> Self {
        Self {
            prev,
            next,
            next_parents: parent_index(next),
            hoisted: HashSet::new(),
            ops: Vec::new(),
        }
    }

    fn run(mut self) -> Vec<DiffOp> {
        let (prev, next) = (self.prev, self.next);
        if let Some(changes) = prev.root.to_props().diff(&next.root.to_props()) {
            self.ops.push(DiffOp::Update {
                node_id: next.root_id().clone(),
                changes,
            });
        }
        self.hoist_moves();

        let root = self.open(prev.root_id(), &prev.root.children, &next.root.children);
        let mut stack = vec![root];
        while let Some(frame) = stack.last_mut() {
            let Some(child) = frame.next_children.get(frame.cursor) else {
                stack.pop();
                continue;
            };
            let index = frame.cursor;
            frame.cursor += 1;
            let parent = frame.parent;

            let Some(before) = frame.prev_by_id.get(child.id()).copied() else {
                self.ops.push(DiffOp::Add {
                    parent_id: parent.clone(),
                    node: child.clone(),
                    index,
                });
                continue;
            };

            if let Some(changes) = before.to_props().diff(&child.to_props()) {
                self.ops.push(DiffOp::Update {
                    node_id: child.id().clone(),
                    changes,
                });
            }
            if !frame.settle(child.id()) {
                self.ops.push(DiffOp::Reorder {
                    parent_id: parent.clone(),
                    node_id: child.id().clone(),
                    new_index: index,
                });
            }
            if before.kind().is_container() || child.kind().is_container() {
                let nested = self.open(child.id(), before.children(), child.children());
                stack.push(nested);
            }
        }
        self.ops
    }

    /// Removes, up front, every node whose parent differs between versions.
    ///
    /// Walks `prev` in pre-order and does not descend into hoisted nodes:
    /// their descendants go with them.
    fn hoist_moves(&mut self) {
        let root_id = self.prev.root_id();
        let mut stack: Vec<(&'a SceneNodeId, &'a SceneNode)> = self
            .prev
            .root
            .children
            .iter()
            .rev()
            .map(|child| (root_id, child))
            .collect();
        while let Some((parent, node)) = stack.pop() {
            match self.next_parents.get(node.id()) {
                Some(next_parent) if *next_parent != parent => {
                    trace!(node = %node.id(), from = %parent, to = %next_parent, "hoisting cross-parent move");
                    self.ops.push(DiffOp::Remove {
                        parent_id: parent.clone(),
                        node_id: node.id().clone(),
                    });
                    self.hoisted.insert(node.id());
                }
                _ => stack.extend(node.children().iter().rev().map(|c| (node.id(), c))),
            }
        }
    }

    /// Opens a container: emits its removals and returns its frame.
    fn open(
        &mut self,
        parent: &'a SceneNodeId,
        prev_children: &'a [SceneNode],
        next_children: &'a [SceneNode],
    ) -> Frame<'a> {
        let next_ids: HashSet<&SceneNodeId> = next_children.iter().map(SceneNode::id).collect();
        let mut prev_by_id = HashMap::with_capacity(prev_children.len());
        let mut survivors = Vec::with_capacity(prev_children.len());
        for child in prev_children {
            let id = child.id();
            if next_ids.contains(id) {
                prev_by_id.insert(id, child);
                survivors.push(id);
            } else if !self.hoisted.contains(id) {
                self.ops.push(DiffOp::Remove {
                    parent_id: parent.clone(),
                    node_id: id.clone(),
                });
            }
        }
        Frame {
            parent,
            prev_by_id,
            next_children,
            survivors,
            head: 0,
            settled: HashSet::new(),
            cursor: 0,
        }
    }
}
