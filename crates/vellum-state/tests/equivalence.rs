// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
#![allow(clippy::expect_used, clippy::unwrap_used)]
//! Applying `diff(a, b)` to a state built from `a` must match a state built
//! fresh from `b`: same table, same draw list, same graph.

use proptest::prelude::*;
use proptest::test_runner::{Config as PropConfig, RngAlgorithm, TestCaseError, TestRng, TestRunner};

use vellum_diff::diff;
use vellum_dry_tests::{FakeTessellator, SceneFuzzer};
use vellum_scene::SceneGraph;
use vellum_state::SceneState;

fn built(graph: &SceneGraph) -> SceneState<FakeTessellator> {
    let mut state = SceneState::new(FakeTessellator::new());
    state.build_from_scene(graph).expect("fixture scenes tessellate");
    state
}

fn check_equivalent(
    live: &SceneState<FakeTessellator>,
    target: &SceneGraph,
) -> Result<(), TestCaseError> {
    let fresh = built(target);
    prop_assert_eq!(live.len(), fresh.len());
    for node in target.descendants() {
        prop_assert_eq!(live.node(node.id()), fresh.node(node.id()));
    }
    prop_assert_eq!(live.node(target.root_id()), fresh.node(target.root_id()));
    prop_assert_eq!(live.draw_list(), fresh.draw_list());
    prop_assert_eq!(live.draw_list().digest(), fresh.draw_list().digest());
    let rebuilt = live.to_graph();
    prop_assert_eq!(rebuilt.as_ref(), Some(target));
    Ok(())
}

#[test]
fn proptest_seed_pinned_incremental_matches_rebuild() {
    // Pinned for reproducible case generation; change SEED_BYTES or set
    // PROPTEST_SEED locally to explore other cases.
    const SEED_BYTES: [u8; 32] = [
        0x56, 0x45, 0x4c, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
        0, 0, 0, 0, 0,
    ];

    let rng = TestRng::from_seed(RngAlgorithm::ChaCha, &SEED_BYTES);
    let mut runner = TestRunner::new_with_rng(PropConfig::default(), rng);

    let case = (any::<u64>(), 0usize..40, 1usize..6, 1usize..5);

    runner
        .run(&case, |(seed, nodes, edits, steps)| {
            let mut fuzz = SceneFuzzer::new(seed);
            let mut prev = fuzz.scene(nodes, 1);
            let mut state = built(&prev);
            for _ in 0..steps {
                let next = fuzz.edit(&prev, edits);
                let d = diff(&prev, &next);
                let report = state
                    .apply_diff(&d)
                    .map_err(|e| TestCaseError::fail(format!("apply failed: {e}")))?;
                prop_assert_eq!(report.ops_applied, d.ops.len());
                prop_assert_eq!(state.version(), Some(next.version));
                check_equivalent(&state, &next)?;
                prev = next;
            }
            Ok(())
        })
        .expect("incremental state diverged from rebuild");
}

#[test]
fn long_edit_chains_stay_equivalent() {
    for seed in 1..=8u64 {
        let mut fuzz = SceneFuzzer::new(seed);
        let mut prev = fuzz.scene(60, 1);
        let mut state = built(&prev);
        for _ in 0..40 {
            let next = fuzz.edit(&prev, 3);
            state.apply_diff(&diff(&prev, &next)).unwrap();
            prev = next;
        }
        check_equivalent(&state, &prev).unwrap();
    }
}

#[test]
fn unchanged_graph_diff_is_a_no_op() {
    let mut fuzz = SceneFuzzer::new(42);
    let a = fuzz.scene(30, 1);
    let mut same = a.clone();
    same.version = 2;
    let d = diff(&a, &same);
    assert!(d.ops.is_empty());

    let mut state = built(&a);
    let before = state.draw_list().digest();
    state.tessellator().reset_calls();
    let report = state.apply_diff(&d).unwrap();
    assert_eq!(report.tessellated, 0);
    assert_eq!(state.tessellator().calls(), 0);
    assert_eq!(state.draw_list().digest(), before);
    assert_eq!(state.version(), Some(2));
}
