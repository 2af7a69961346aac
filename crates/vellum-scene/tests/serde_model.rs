// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
#![allow(clippy::expect_used, clippy::unwrap_used)]
//! JSON encoding of graphs and diffs behind the `serde` feature.

use std::sync::Arc;

use vellum_scene::{
    Color, DiffOp, Fill, Group, NodeBase, NodeChanges, OpaquePayload, PathCommand, PathData,
    PathNode, PropertyChange, Rect, SceneGraph, SceneGraphDiff, SceneNode, Stroke, Text,
};

fn sample() -> SceneGraph {
    let mut rect = Rect::new("r1", 10.0, 4.0);
    rect.fills.push(Fill::solid(Color::WHITE));
    rect.stroke = Some(Stroke::solid(Color::BLACK, 1.5));
    let path = PathNode {
        base: NodeBase::new("p"),
        data: Arc::new(PathData {
            commands: vec![
                PathCommand::MoveTo([0.0, 0.0]),
                PathCommand::QuadTo {
                    ctrl: [1.0, 2.0],
                    to: [3.0, 0.0],
                },
                PathCommand::Close,
            ],
            ..PathData::default()
        }),
        fills: Vec::new(),
        stroke: None,
    };
    let text = Text {
        base: NodeBase::new("t"),
        payload: OpaquePayload::new(b"hello".to_vec()),
    };
    SceneGraph::new(
        Group::new(
            "root",
            vec![
                rect.into(),
                SceneNode::Group(Group::new("g", vec![path.into(), text.into()])),
            ],
        ),
        800.0,
        600.0,
        3,
    )
}

#[test]
fn graph_survives_json() {
    let graph = sample();
    let json = serde_json::to_string(&graph).unwrap();
    let back: SceneGraph = serde_json::from_str(&json).unwrap();
    assert_eq!(back, graph);
}

#[test]
fn ids_encode_as_plain_strings() {
    let value = serde_json::to_value(sample()).unwrap();
    assert_eq!(value["root"]["base"]["id"], "root");
}

#[test]
fn diff_survives_json() {
    let diff = SceneGraphDiff {
        ops: vec![
            DiffOp::Remove {
                parent_id: "root".into(),
                node_id: "g".into(),
            },
            DiffOp::Update {
                node_id: "r1".into(),
                changes: NodeChanges::Patch(vec![
                    PropertyChange::Opacity(0.5),
                    PropertyChange::Stroke(None),
                ]),
            },
        ],
        version_from: 3,
        version_to: 4,
        canvas: None,
    };
    let back: SceneGraphDiff = serde_json::from_slice(&serde_json::to_vec(&diff).unwrap()).unwrap();
    assert_eq!(back, diff);
}
