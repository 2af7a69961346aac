// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
#![allow(clippy::expect_used, clippy::unwrap_used)]
//! Applying a diff in prefixes is equivalent to applying it whole.

use vellum_diff::diff;
use vellum_dry_tests::{FakeTessellator, SceneFuzzer};
use vellum_state::SceneState;

#[test]
fn chunked_apply_matches_whole_apply() {
    let mut fuzz = SceneFuzzer::new(0xC0FFEE);
    let a = fuzz.scene(50, 1);
    let mut b = fuzz.edit(&a, 12);
    while diff(&a, &b).len() <= 3 {
        b = fuzz.edit(&b, 4);
        b.version = a.version + 1;
    }
    let d = diff(&a, &b);

    let mut whole = SceneState::new(FakeTessellator::new());
    whole.build_from_scene(&a).unwrap();
    whole.apply_diff(&d).unwrap();

    let mut chunked = SceneState::new(FakeTessellator::new());
    chunked.build_from_scene(&a).unwrap();
    let chunks = d.clone().into_chunks(3);
    let last = chunks.len() - 1;
    for (i, chunk) in chunks.iter().enumerate() {
        chunked.apply_diff(chunk).unwrap();
        let expected = if i == last { b.version } else { a.version };
        assert_eq!(chunked.version(), Some(expected));
    }

    assert_eq!(chunked.draw_list(), whole.draw_list());
    assert_eq!(chunked.to_graph(), Some(b));
}
