// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
#![allow(clippy::expect_used, clippy::unwrap_used)]
//! Geometry cache behaviour: what re-tessellates and what is reused.

use std::sync::Arc;

use vellum_diff::diff;
use vellum_dry_tests::{ellipse, find_mut, group, rect, scene, text, FakeTessellator};
use vellum_scene::{AffineMatrix, Color, Fill, SceneGraph, SceneNode, SceneNodeId};
use vellum_state::{SceneState, VertexBuffer};

fn id(s: &str) -> SceneNodeId {
    s.into()
}

fn base_scene() -> SceneGraph {
    scene(
        1,
        vec![
            rect("r1", 10.0, 10.0),
            group("g", vec![rect("r2", 4.0, 4.0), ellipse("e", 2.0, 2.0), text("t", "hello")]),
            rect("r3", 8.0, 8.0),
        ],
    )
}

fn built(graph: &SceneGraph) -> SceneState<FakeTessellator> {
    let mut state = SceneState::new(FakeTessellator::new());
    state.build_from_scene(graph).unwrap();
    state.tessellator().reset_calls();
    state
}

fn buffer(state: &SceneState<FakeTessellator>, node: &str) -> Arc<VertexBuffer> {
    Arc::clone(state.node(&id(node)).unwrap().vertices().unwrap())
}

fn edited(graph: &SceneGraph, node: &str, edit: impl FnOnce(&mut SceneNode)) -> SceneGraph {
    let mut next = graph.clone();
    next.version += 1;
    edit(find_mut(&mut next, node).unwrap());
    next
}

#[test]
fn build_tessellates_only_geometry() {
    let mut state = SceneState::new(FakeTessellator::new());
    let report = state.build_from_scene(&base_scene()).unwrap();
    assert_eq!(report.tessellated, 4);
    assert_eq!(state.tessellator().calls(), 4);
    assert!(state.node(&id("t")).unwrap().vertices().is_none());
    assert!(state.node(&id("g")).unwrap().vertices().is_none());
}

#[test]
fn opacity_change_reuses_the_same_buffer() {
    let v1 = base_scene();
    let mut state = built(&v1);
    let before = buffer(&state, "r1");

    let v2 = edited(&v1, "r1", |n| n.base_mut().opacity = 0.4);
    let report = state.apply_diff(&diff(&v1, &v2)).unwrap();

    assert_eq!(report.tessellated, 0);
    assert_eq!(report.reused, 1);
    assert_eq!(state.tessellator().calls(), 0);
    assert!(Arc::ptr_eq(&before, &buffer(&state, "r1")));
    assert_eq!(state.node(&id("r1")).unwrap().props().base().opacity, 0.4);
}

#[test]
fn transform_visibility_and_effects_never_retessellate() {
    let v1 = base_scene();
    let mut state = built(&v1);
    let before = buffer(&state, "r2");

    let v2 = edited(&v1, "r2", |n| {
        let base = n.base_mut();
        base.transform = AffineMatrix::translate(5.0, 5.0);
        base.visible = false;
        base.effects.push(vellum_scene::Effect::LayerBlur { radius: 2.0 });
    });
    state.apply_diff(&diff(&v1, &v2)).unwrap();
    assert_eq!(state.tessellator().calls(), 0);
    assert!(Arc::ptr_eq(&before, &buffer(&state, "r2")));
}

#[test]
fn width_change_retessellates_once() {
    let v1 = base_scene();
    let mut state = built(&v1);
    let before = buffer(&state, "r1");

    let v2 = edited(&v1, "r1", |n| {
        if let SceneNode::Rect(r) = n {
            r.width = 20.0;
        }
    });
    let report = state.apply_diff(&diff(&v1, &v2)).unwrap();

    assert_eq!(report.tessellated, 1);
    assert_eq!(state.tessellator().calls(), 1);
    let after = buffer(&state, "r1");
    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(after.vertices[2].position, [20.0, 10.0]);
    // Untouched siblings keep their allocations.
    let untouched = built(&v1);
    assert_eq!(*buffer(&untouched, "r3"), *buffer(&state, "r3"));
}

#[test]
fn fill_change_retessellates() {
    let v1 = base_scene();
    let mut state = built(&v1);
    let v2 = edited(&v1, "e", |n| {
        if let SceneNode::Ellipse(e) = n {
            e.fills = vec![Fill::solid(Color::WHITE)];
        }
    });
    state.apply_diff(&diff(&v1, &v2)).unwrap();
    assert_eq!(state.tessellator().calls(), 1);
    assert_eq!(buffer(&state, "e").vertices[0].color, Color::WHITE.0);
}

#[test]
fn hidden_subtree_leaves_and_returns_to_the_draw_list() {
    let v1 = base_scene();
    let mut state = built(&v1);
    let ids = |s: &SceneState<FakeTessellator>| -> Vec<String> {
        s.draw_list().ids().iter().map(|i| i.to_string()).collect()
    };
    assert_eq!(ids(&state), ["root", "r1", "g", "r2", "e", "t", "r3"]);

    let v2 = edited(&v1, "g", |n| n.base_mut().visible = false);
    state.apply_diff(&diff(&v1, &v2)).unwrap();
    assert_eq!(ids(&state), ["root", "r1", "r3"]);
    assert!(state.node(&id("r2")).is_some());

    let v3 = edited(&v2, "g", |n| n.base_mut().visible = true);
    state.apply_diff(&diff(&v2, &v3)).unwrap();
    assert_eq!(ids(&state), ["root", "r1", "g", "r2", "e", "t", "r3"]);
    assert_eq!(state.tessellator().calls(), 0);
}

#[test]
fn removing_a_container_purges_its_subtree() {
    let v1 = base_scene();
    let mut state = built(&v1);
    let mut v2 = v1.clone();
    v2.version = 2;
    vellum_dry_tests::detach(&mut v2, "g").unwrap();

    state.apply_diff(&diff(&v1, &v2)).unwrap();
    for gone in ["g", "r2", "e", "t"] {
        assert!(state.node(&id(gone)).is_none(), "{gone} still live");
        assert!(state.draw_list().get(&id(gone)).is_none());
    }
    assert_eq!(state.len(), 3);
    assert_eq!(state.node(&id("root")).unwrap().children(), &[id("r1"), id("r3")]);
}

#[test]
fn reorder_moves_without_touching_buffers() {
    let v1 = base_scene();
    let mut state = built(&v1);
    let buffers: Vec<_> = ["r1", "r3"].iter().map(|n| buffer(&state, n)).collect();

    let mut v2 = v1.clone();
    v2.version = 2;
    v2.root.children.reverse();
    state.apply_diff(&diff(&v1, &v2)).unwrap();

    assert_eq!(
        state.node(&id("root")).unwrap().children(),
        &[id("r3"), id("g"), id("r1")]
    );
    assert_eq!(state.tessellator().calls(), 0);
    assert!(Arc::ptr_eq(&buffers[0], &buffer(&state, "r1")));
    assert!(Arc::ptr_eq(&buffers[1], &buffer(&state, "r3")));
}

#[test]
fn world_transform_composes_ancestors() {
    let mut v1 = base_scene();
    find_mut(&mut v1, "g").unwrap().base_mut().transform = AffineMatrix::scale(2.0, 2.0);
    find_mut(&mut v1, "r2").unwrap().base_mut().transform = AffineMatrix::translate(1.0, 1.0);
    let state = built(&v1);

    let world = state.world_transform(&id("r2")).unwrap();
    assert_eq!(world.apply([0.0, 0.0]), [2.0, 2.0]);
    let chain: Vec<String> = state
        .ancestors(&id("r2"))
        .unwrap()
        .iter()
        .map(|i| i.to_string())
        .collect();
    assert_eq!(chain, ["root", "g"]);
    // The draw list carries local transforms only.
    let item = state.draw_list().get(&id("r2")).map(|i| i.transform);
    assert_eq!(item, Some(AffineMatrix::translate(1.0, 1.0)));
}
