// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Seeded random scenes and edits.
//!
//! [`SceneFuzzer`] grows random trees and derives "next versions" from them
//! the way an editor would: inserts, deletes, property tweaks, sibling
//! shuffles, moves between containers and type changes. Fed to the differ
//! and the state, the pair exercises every op kind.

use vellum_scene::{
    AffineMatrix, Color, Fill, NodeBase, NodeKind, SceneGraph, SceneNode, SceneNodeId,
};

use crate::rng::XorShift64;
use crate::scenes::{children_mut, detach, ellipse, find_mut, frame, group, image, path, rect, text};

/// Deterministic generator of scenes and edited successors.
#[derive(Debug, Clone)]
pub struct SceneFuzzer {
    rng: XorShift64,
    next_id: u64,
}

impl SceneFuzzer {
    /// Fuzzer seeded with `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: XorShift64::new(seed),
            next_id: 0,
        }
    }

    /// Underlying PRNG.
    pub fn rng(&mut self) -> &mut XorShift64 {
        &mut self.rng
    }

    fn fresh_id(&mut self) -> String {
        self.next_id += 1;
        format!("n{}", self.next_id)
    }

    /// Random leaf or empty container with a fresh id.
    pub fn node(&mut self) -> SceneNode {
        let id = self.fresh_id();
        let w = 1.0 + self.rng.scalar(64);
        let h = 1.0 + self.rng.scalar(64);
        let mut node = match self.rng.below(7) {
            0 => rect(&id, w, h),
            1 => ellipse(&id, w, h),
            2 => path(&id, &[[0.0, 0.0], [w, 0.0], [w, h], [0.0, h]]),
            3 => text(&id, &id),
            4 => image(&id, id.as_bytes()),
            5 => group(&id, Vec::new()),
            _ => frame(&id, w, h, Vec::new()),
        };
        if self.rng.one_in(4) {
            node.base_mut().transform = AffineMatrix::translate(self.rng.scalar(100), self.rng.scalar(100));
        }
        node
    }

    /// Random scene with `nodes` non-root nodes at `version`.
    pub fn scene(&mut self, nodes: usize, version: u64) -> SceneGraph {
        let mut graph = crate::scenes::scene(version, Vec::new());
        for _ in 0..nodes {
            self.insert_random(&mut graph);
        }
        graph
    }

    /// Successor of `graph` after `edits` random edits, at `version + 1`.
    pub fn edit(&mut self, graph: &SceneGraph, edits: usize) -> SceneGraph {
        let mut next = graph.clone();
        next.version = graph.version + 1;
        for _ in 0..edits {
            match self.rng.below(7) {
                0 => self.insert_random(&mut next),
                1 => self.remove_random(&mut next),
                2 | 3 => self.tweak_random(&mut next),
                4 => self.shuffle_random(&mut next),
                5 => self.move_random(&mut next),
                _ => self.retype_random(&mut next),
            }
        }
        if self.rng.one_in(10) {
            next.width += 1.0;
        }
        next
    }

    fn containers(graph: &SceneGraph) -> Vec<SceneNodeId> {
        std::iter::once(graph.root_id().clone())
            .chain(
                graph
                    .descendants()
                    .filter(|n| n.kind().is_container())
                    .map(|n| n.id().clone()),
            )
            .collect()
    }

    fn non_root(graph: &SceneGraph) -> Vec<SceneNodeId> {
        graph.descendants().map(|n| n.id().clone()).collect()
    }

    fn insert_into(&mut self, graph: &mut SceneGraph, node: SceneNode) {
        let targets = Self::containers(graph);
        let Some(parent) = self.rng.pick(&targets).cloned() else {
            return;
        };
        let at = self.rng.below(usize::MAX);
        if let Some(list) = children_mut(graph, parent.as_str()) {
            let at = at % (list.len() + 1);
            list.insert(at, node);
        }
    }

    fn insert_random(&mut self, graph: &mut SceneGraph) {
        let node = self.node();
        self.insert_into(graph, node);
    }

    fn remove_random(&mut self, graph: &mut SceneGraph) {
        if let Some(id) = self.rng.pick(&Self::non_root(graph)).cloned() {
            detach(graph, id.as_str());
        }
    }

    fn tweak_random(&mut self, graph: &mut SceneGraph) {
        let ids = Self::non_root(graph);
        let Some(id) = self.rng.pick(&ids).cloned() else {
            return;
        };
        let choice = self.rng.below(6);
        let amount = 1.0 + self.rng.scalar(32);
        if let Some(node) = find_mut(graph, id.as_str()) {
            tweak(node, choice, amount);
        }
    }

    fn shuffle_random(&mut self, graph: &mut SceneGraph) {
        let targets = Self::containers(graph);
        let Some(parent) = self.rng.pick(&targets).cloned() else {
            return;
        };
        let mut swaps = Vec::new();
        if let Some(list) = children_mut(graph, parent.as_str()) {
            for i in (1..list.len()).rev() {
                swaps.push((i, self.rng.below(i + 1)));
            }
            for (i, j) in swaps {
                list.swap(i, j);
            }
        }
    }

    fn move_random(&mut self, graph: &mut SceneGraph) {
        let Some(id) = self.rng.pick(&Self::non_root(graph)).cloned() else {
            return;
        };
        if let Some(node) = detach(graph, id.as_str()) {
            self.insert_into(graph, node);
        }
    }

    fn retype_random(&mut self, graph: &mut SceneGraph) {
        let Some(id) = self.rng.pick(&Self::non_root(graph)).cloned() else {
            return;
        };
        let container = self.rng.one_in(2);
        let Some(node) = find_mut(graph, id.as_str()) else {
            return;
        };
        let base: NodeBase = node.base().clone();
        let replacement = match (node.kind(), container) {
            (NodeKind::Group, _) => frame(id.as_str(), 10.0, 10.0, node.children().to_vec()),
            (NodeKind::Frame, _) | (_, false) => ellipse(id.as_str(), 3.0, 3.0),
            (_, true) => group(id.as_str(), Vec::new()),
        };
        *node = replacement;
        *node.base_mut() = base;
    }
}

/// Applies edit `choice` (`0..6`) of size `amount` to one node.
///
/// Choice 4 recolors rects and leaves other geometry alone; choices with no
/// meaning for the node's kind fall back to an opacity change.
fn tweak(node: &mut SceneNode, choice: usize, amount: f64) {
    match (choice, node) {
        (0, node) => node.base_mut().opacity = amount / 32.0,
        (1, node) => {
            let base = node.base_mut();
            base.visible = !base.visible;
        }
        (2, node) => node.base_mut().transform = AffineMatrix::translate(amount, -amount),
        (3, SceneNode::Rect(r)) => r.width = amount,
        (3, SceneNode::Ellipse(e)) => e.height = amount,
        (3, SceneNode::Frame(f)) => f.width = amount,
        (4, SceneNode::Rect(r)) => r.fills = vec![Fill::solid(Color::rgba(0.0, 1.0, 0.0, 1.0))],
        (4, SceneNode::Ellipse(_) | SceneNode::Path(_)) => {}
        (_, node) => node.base_mut().opacity = 0.5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn ids_unique(graph: &SceneGraph) -> bool {
        let mut seen = HashSet::new();
        graph.descendants().all(|n| seen.insert(n.id().clone()))
            && !seen.contains(graph.root_id())
    }

    #[test]
    fn recolor_tweak_only_touches_rects() {
        let mut r = rect("r", 2.0, 2.0);
        tweak(&mut r, 4, 1.0);
        assert_eq!(
            r.to_props().fills(),
            &[Fill::solid(Color::rgba(0.0, 1.0, 0.0, 1.0))]
        );

        let e = ellipse("e", 2.0, 2.0);
        let mut tweaked = e.clone();
        tweak(&mut tweaked, 4, 1.0);
        assert_eq!(tweaked, e);

        let mut t = text("t", "x");
        tweak(&mut t, 4, 1.0);
        assert!((t.base().opacity - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn scenes_are_reproducible() {
        let a = SceneFuzzer::new(11).scene(30, 1);
        let b = SceneFuzzer::new(11).scene(30, 1);
        assert_eq!(a, b);
        assert_eq!(a.node_count(), 31);
    }

    #[test]
    fn edits_keep_ids_unique() {
        let mut fuzz = SceneFuzzer::new(3);
        let mut graph = fuzz.scene(25, 1);
        for _ in 0..50 {
            graph = fuzz.edit(&graph, 4);
            assert!(ids_unique(&graph));
        }
        assert_eq!(graph.version, 51);
    }
}
