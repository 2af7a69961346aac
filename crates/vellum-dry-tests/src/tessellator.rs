// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Deterministic fake [`Tessellator`] for tests.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;

use vellum_scene::{NodeProps, Paint, PathCommand};
use vellum_state::{TessellateError, Tessellator, Vertex, VertexBuffer};

/// Fake tessellator producing small, deterministic buffers.
///
/// Output depends only on the props it is given, so two states built from
/// equal scenes hold equal buffers. Rects and ellipses become quads (the
/// ellipse has one extra center vertex); paths become a fan over their
/// command end points. The vertex color is the first solid fill.
///
/// It counts calls and can be told to fail for chosen ids.
///
/// # Example
///
/// ```
/// use vellum_dry_tests::{rect, FakeTessellator};
/// use vellum_state::Tessellator;
///
/// let tess = FakeTessellator::new();
/// let buf = tess.tessellate(&rect("r1", 2.0, 3.0).to_props()).unwrap();
/// assert_eq!(buf.unwrap().vertices.len(), 4);
/// assert_eq!(tess.calls(), 1);
///
/// tess.fail_on("r1");
/// assert!(tess.tessellate(&rect("r1", 2.0, 3.0).to_props()).is_err());
/// ```
#[derive(Debug, Default)]
pub struct FakeTessellator {
    calls: Cell<usize>,
    failing: RefCell<HashSet<String>>,
}

impl FakeTessellator {
    /// Fake that never fails.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later call for `id` fail.
    pub fn fail_on(&self, id: &str) {
        self.failing.borrow_mut().insert(id.to_owned());
    }

    /// Undoes [`fail_on`](Self::fail_on) for `id`.
    pub fn recover(&self, id: &str) {
        self.failing.borrow_mut().remove(id);
    }

    /// Number of `tessellate` calls so far, failed ones included.
    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    /// Resets the call counter.
    pub fn reset_calls(&self) {
        self.calls.set(0);
    }
}

fn fill_color(props: &NodeProps) -> [f32; 4] {
    match props.fills().first().map(|f| &f.paint) {
        Some(Paint::Solid(color)) => color.0,
        _ => [0.0; 4],
    }
}

fn end_point(command: &PathCommand) -> Option<[f64; 2]> {
    match command {
        PathCommand::MoveTo(p) | PathCommand::LineTo(p) => Some(*p),
        PathCommand::QuadTo { to, .. } | PathCommand::CubicTo { to, .. } => Some(*to),
        PathCommand::Close => None,
    }
}

fn check(value: f64) -> Result<f32, TessellateError> {
    if value.is_finite() {
        Ok(value as f32)
    } else {
        Err(TessellateError::MalformedGeometry(format!(
            "non-finite coordinate {value}"
        )))
    }
}

fn fan(points: &[[f64; 2]], color: [f32; 4]) -> Result<Option<VertexBuffer>, TessellateError> {
    if points.len() < 3 {
        return Ok(None);
    }
    let vertices = points
        .iter()
        .map(|[x, y]| {
            Ok(Vertex {
                position: [check(*x)?, check(*y)?],
                color,
            })
        })
        .collect::<Result<Vec<_>, TessellateError>>()?;
    let last = u32::try_from(vertices.len() - 1).map_err(|_| TessellateError::NumericOverflow)?;
    let indices = (1..last).flat_map(|i| [0, i, i + 1]).collect();
    Ok(Some(VertexBuffer { vertices, indices }))
}

impl Tessellator for FakeTessellator {
    fn tessellate(&self, props: &NodeProps) -> Result<Option<VertexBuffer>, TessellateError> {
        self.calls.set(self.calls.get() + 1);
        if self.failing.borrow().contains(props.id().as_str()) {
            return Err(TessellateError::Other(format!(
                "injected failure for {}",
                props.id()
            )));
        }
        let color = fill_color(props);
        match props {
            NodeProps::Rect(r) => fan(
                &[[0.0, 0.0], [r.width, 0.0], [r.width, r.height], [0.0, r.height]],
                color,
            ),
            NodeProps::Ellipse(e) => {
                let (rx, ry) = (e.width / 2.0, e.height / 2.0);
                fan(
                    &[[rx, ry], [e.width, ry], [rx, e.height], [0.0, ry], [rx, 0.0]],
                    color,
                )
            }
            NodeProps::Path(p) => {
                let points: Vec<[f64; 2]> = p.data.commands.iter().filter_map(end_point).collect();
                fan(&points, color)
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::scenes::{ellipse, path, rect, text};

    #[test]
    fn equal_props_give_equal_buffers() {
        let tess = FakeTessellator::new();
        let a = tess.tessellate(&rect("r", 3.0, 4.0).to_props()).unwrap();
        let b = tess.tessellate(&rect("r", 3.0, 4.0).to_props()).unwrap();
        assert_eq!(a, b);
        assert_eq!(tess.calls(), 2);
    }

    #[test]
    fn width_changes_the_buffer() {
        let tess = FakeTessellator::new();
        let a = tess.tessellate(&rect("r", 3.0, 4.0).to_props()).unwrap();
        let b = tess.tessellate(&rect("r", 5.0, 4.0).to_props()).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn shapes_triangulate_as_fans() {
        let tess = FakeTessellator::new();
        let e = tess.tessellate(&ellipse("e", 2.0, 2.0).to_props()).unwrap().unwrap();
        assert_eq!(e.vertices.len(), 5);
        assert_eq!(e.triangle_count(), 3);
        let p = tess
            .tessellate(&path("p", &[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]).to_props())
            .unwrap()
            .unwrap();
        assert_eq!(p.indices, vec![0, 1, 2]);
        assert!(tess.tessellate(&text("t", "hi").to_props()).unwrap().is_none());
    }

    #[test]
    fn non_finite_geometry_is_malformed() {
        let tess = FakeTessellator::new();
        let err = tess
            .tessellate(&rect("r", f64::NAN, 1.0).to_props())
            .unwrap_err();
        assert!(matches!(err, TessellateError::MalformedGeometry(_)));
    }

    #[test]
    fn injected_failures_can_be_lifted() {
        let tess = FakeTessellator::new();
        tess.fail_on("r");
        assert!(tess.tessellate(&rect("r", 1.0, 1.0).to_props()).is_err());
        tess.recover("r");
        assert!(tess.tessellate(&rect("r", 1.0, 1.0).to_props()).is_ok());
    }
}
