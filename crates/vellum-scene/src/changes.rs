// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-variant property comparison and merging.
//!
//! Comparison is exactly one level deep: a node's own fields are compared
//! (lists by length and per-index equality, records field by field), never
//! its children. Identity, type and children are not properties; a type
//! change is expressed as [`NodeChanges::Replace`].

use core::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::affine::AffineMatrix;
use crate::node::{NodeBase, NodeKind, NodeProps, OpaquePayload, PathData};
use crate::style::{Effect, Fill, Stroke};

/// Name of a mergeable node property.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PropertyKey {
    /// [`NodeBase::transform`].
    Transform,
    /// [`NodeBase::opacity`].
    Opacity,
    /// [`NodeBase::visible`].
    Visible,
    /// [`NodeBase::effects`].
    Effects,
    /// Width of frames, rects and ellipses.
    Width,
    /// Height of frames, rects and ellipses.
    Height,
    /// Rect corner radius.
    CornerRadius,
    /// Fill layers of geometry nodes.
    Fills,
    /// Stroke of geometry nodes.
    Stroke,
    /// Path contour data.
    PathData,
    /// Opaque payload of text and image nodes.
    Payload,
}

impl PropertyKey {
    /// Whether `kind` carries this property.
    pub const fn applies_to(self, kind: NodeKind) -> bool {
        match self {
            Self::Transform | Self::Opacity | Self::Visible | Self::Effects => true,
            Self::Width | Self::Height => matches!(
                kind,
                NodeKind::Frame | NodeKind::Rect | NodeKind::Ellipse
            ),
            Self::CornerRadius => matches!(kind, NodeKind::Rect),
            Self::Fills | Self::Stroke => kind.is_geometry(),
            Self::PathData => matches!(kind, NodeKind::Path),
            Self::Payload => matches!(kind, NodeKind::Text | NodeKind::Image),
        }
    }

    /// Stock re-tessellation predicate.
    ///
    /// Everything a geometry node carries besides its transform, opacity,
    /// visibility and effects feeds tessellation. Non-geometry kinds are
    /// never tessellated.
    pub const fn affects_geometry_by_default(self, kind: NodeKind) -> bool {
        kind.is_geometry()
            && !matches!(
                self,
                Self::Transform | Self::Opacity | Self::Visible | Self::Effects
            )
    }

    /// Lowercase name used in logs and error messages.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Transform => "transform",
            Self::Opacity => "opacity",
            Self::Visible => "visible",
            Self::Effects => "effects",
            Self::Width => "width",
            Self::Height => "height",
            Self::CornerRadius => "corner_radius",
            Self::Fills => "fills",
            Self::Stroke => "stroke",
            Self::PathData => "path_data",
            Self::Payload => "payload",
        }
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// New value for one changed property.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PropertyChange {
    /// New local transform.
    Transform(AffineMatrix),
    /// New opacity.
    Opacity(f64),
    /// New visibility.
    Visible(bool),
    /// New effect list.
    Effects(Vec<Effect>),
    /// New width.
    Width(f64),
    /// New height.
    Height(f64),
    /// New corner radius.
    CornerRadius(f64),
    /// New fill list.
    Fills(Vec<Fill>),
    /// New stroke; `None` unsets it.
    Stroke(Option<Stroke>),
    /// New contour data.
    PathData(Arc<PathData>),
    /// New opaque payload.
    Payload(OpaquePayload),
}

impl PropertyChange {
    /// The property this change targets.
    pub const fn key(&self) -> PropertyKey {
        match self {
            Self::Transform(_) => PropertyKey::Transform,
            Self::Opacity(_) => PropertyKey::Opacity,
            Self::Visible(_) => PropertyKey::Visible,
            Self::Effects(_) => PropertyKey::Effects,
            Self::Width(_) => PropertyKey::Width,
            Self::Height(_) => PropertyKey::Height,
            Self::CornerRadius(_) => PropertyKey::CornerRadius,
            Self::Fills(_) => PropertyKey::Fills,
            Self::Stroke(_) => PropertyKey::Stroke,
            Self::PathData(_) => PropertyKey::PathData,
            Self::Payload(_) => PropertyKey::Payload,
        }
    }
}

/// Payload of an `Update` op.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeChanges {
    /// The node's type changed; these are its complete new fields.
    Replace(NodeProps),
    /// Same type; only the listed properties changed.
    Patch(Vec<PropertyChange>),
}

impl NodeChanges {
    /// Keys touched by a patch; empty for a replacement.
    pub fn keys(&self) -> impl Iterator<Item = PropertyKey> + '_ {
        let changes: &[PropertyChange] = match self {
            Self::Replace(_) => &[],
            Self::Patch(changes) => changes,
        };
        changes.iter().map(PropertyChange::key)
    }
}

/// A [`PropertyChange`] was applied to a node kind that lacks the property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{kind} nodes have no {key} property")]
pub struct PropertyMismatch {
    /// Kind of the target node.
    pub kind: NodeKind,
    /// Offending property.
    pub key: PropertyKey,
}

fn same_scalar(a: f64, b: f64) -> bool {
    a.to_bits() == b.to_bits()
}

fn same_path(a: &Arc<PathData>, b: &Arc<PathData>) -> bool {
    Arc::ptr_eq(a, b) || a == b
}

fn diff_base(prev: &NodeBase, next: &NodeBase, out: &mut Vec<PropertyChange>) {
    if prev.transform.to_bits() != next.transform.to_bits() {
        out.push(PropertyChange::Transform(next.transform));
    }
    if !same_scalar(prev.opacity, next.opacity) {
        out.push(PropertyChange::Opacity(next.opacity));
    }
    if prev.visible != next.visible {
        out.push(PropertyChange::Visible(next.visible));
    }
    if prev.effects != next.effects {
        out.push(PropertyChange::Effects(next.effects.clone()));
    }
}

fn diff_size(prev: [f64; 2], next: [f64; 2], out: &mut Vec<PropertyChange>) {
    if !same_scalar(prev[0], next[0]) {
        out.push(PropertyChange::Width(next[0]));
    }
    if !same_scalar(prev[1], next[1]) {
        out.push(PropertyChange::Height(next[1]));
    }
}

fn diff_style(
    prev: (&[Fill], &Option<Stroke>),
    next: (&[Fill], &Option<Stroke>),
    out: &mut Vec<PropertyChange>,
) {
    if prev.0 != next.0 {
        out.push(PropertyChange::Fills(next.0.to_vec()));
    }
    if prev.1 != next.1 {
        out.push(PropertyChange::Stroke(next.1.clone()));
    }
}

impl NodeProps {
    /// Compares this node's fields with `next`.
    ///
    /// Returns `None` when nothing differs, [`NodeChanges::Replace`] when the
    /// type differs, and otherwise a patch with only the changed keys in a
    /// fixed key order.
    pub fn diff(&self, next: &NodeProps) -> Option<NodeChanges> {
        if self.kind() != next.kind() {
            return Some(NodeChanges::Replace(next.clone()));
        }
        let mut out = Vec::new();
        diff_base(self.base(), next.base(), &mut out);
        match (self, next) {
            (Self::Group { .. }, Self::Group { .. }) => {}
            (
                Self::Frame {
                    width: pw,
                    height: ph,
                    ..
                },
                Self::Frame {
                    width: nw,
                    height: nh,
                    ..
                },
            ) => diff_size([*pw, *ph], [*nw, *nh], &mut out),
            (Self::Rect(p), Self::Rect(n)) => {
                diff_size([p.width, p.height], [n.width, n.height], &mut out);
                if !same_scalar(p.corner_radius, n.corner_radius) {
                    out.push(PropertyChange::CornerRadius(n.corner_radius));
                }
                diff_style(
                    (p.fills.as_slice(), &p.stroke),
                    (n.fills.as_slice(), &n.stroke),
                    &mut out,
                );
            }
            (Self::Ellipse(p), Self::Ellipse(n)) => {
                diff_size([p.width, p.height], [n.width, n.height], &mut out);
                diff_style(
                    (p.fills.as_slice(), &p.stroke),
                    (n.fills.as_slice(), &n.stroke),
                    &mut out,
                );
            }
            (Self::Path(p), Self::Path(n)) => {
                if !same_path(&p.data, &n.data) {
                    out.push(PropertyChange::PathData(Arc::clone(&n.data)));
                }
                diff_style(
                    (p.fills.as_slice(), &p.stroke),
                    (n.fills.as_slice(), &n.stroke),
                    &mut out,
                );
            }
            (Self::Text(p), Self::Text(n)) => {
                if p.payload != n.payload {
                    out.push(PropertyChange::Payload(n.payload.clone()));
                }
            }
            (Self::Image(p), Self::Image(n)) => {
                if p.payload != n.payload {
                    out.push(PropertyChange::Payload(n.payload.clone()));
                }
            }
            // Kinds were checked equal above.
            _ => return Some(NodeChanges::Replace(next.clone())),
        }
        (!out.is_empty()).then_some(NodeChanges::Patch(out))
    }

    /// Merges `changes` into this node in order.
    ///
    /// Stops at the first change the node's kind cannot hold; earlier
    /// changes stay applied, so callers wanting atomicity merge into a copy.
    pub fn apply(&mut self, changes: &[PropertyChange]) -> Result<(), PropertyMismatch> {
        for change in changes {
            self.apply_one(change)?;
        }
        Ok(())
    }

    fn apply_one(&mut self, change: &PropertyChange) -> Result<(), PropertyMismatch> {
        let kind = self.kind();
        let mismatch = PropertyMismatch {
            kind,
            key: change.key(),
        };
        if !mismatch.key.applies_to(kind) {
            return Err(mismatch);
        }
        match change {
            PropertyChange::Transform(t) => self.base_mut().transform = *t,
            PropertyChange::Opacity(o) => self.base_mut().opacity = *o,
            PropertyChange::Visible(v) => self.base_mut().visible = *v,
            PropertyChange::Effects(e) => self.base_mut().effects.clone_from(e),
            PropertyChange::Width(w) => *self.size_mut().ok_or(mismatch)?.0 = *w,
            PropertyChange::Height(h) => *self.size_mut().ok_or(mismatch)?.1 = *h,
            PropertyChange::CornerRadius(r) => match self {
                Self::Rect(n) => n.corner_radius = *r,
                _ => return Err(mismatch),
            },
            PropertyChange::Fills(f) => self.style_mut().ok_or(mismatch)?.0.clone_from(f),
            PropertyChange::Stroke(s) => self.style_mut().ok_or(mismatch)?.1.clone_from(s),
            PropertyChange::PathData(d) => match self {
                Self::Path(n) => n.data = Arc::clone(d),
                _ => return Err(mismatch),
            },
            PropertyChange::Payload(p) => match self {
                Self::Text(n) => n.payload = p.clone(),
                Self::Image(n) => n.payload = p.clone(),
                _ => return Err(mismatch),
            },
        }
        Ok(())
    }

    fn size_mut(&mut self) -> Option<(&mut f64, &mut f64)> {
        match self {
            Self::Frame { width, height, .. } => Some((width, height)),
            Self::Rect(n) => Some((&mut n.width, &mut n.height)),
            Self::Ellipse(n) => Some((&mut n.width, &mut n.height)),
            _ => None,
        }
    }

    fn style_mut(&mut self) -> Option<(&mut Vec<Fill>, &mut Option<Stroke>)> {
        match self {
            Self::Rect(n) => Some((&mut n.fills, &mut n.stroke)),
            Self::Ellipse(n) => Some((&mut n.fills, &mut n.stroke)),
            Self::Path(n) => Some((&mut n.fills, &mut n.stroke)),
            _ => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::node::{Ellipse, Rect, Text};
    use crate::style::Color;

    fn rect(w: f64, h: f64) -> NodeProps {
        NodeProps::Rect(Rect::new("r", w, h))
    }

    #[test]
    fn identical_props_have_no_diff() {
        assert_eq!(rect(10.0, 5.0).diff(&rect(10.0, 5.0)), None);
    }

    #[test]
    fn patch_carries_only_changed_keys() {
        let prev = rect(10.0, 5.0);
        let mut next = rect(10.0, 7.0);
        next.base_mut().opacity = 0.5;

        let Some(NodeChanges::Patch(changes)) = prev.diff(&next) else {
            panic!("expected a patch");
        };
        assert_eq!(
            changes,
            vec![PropertyChange::Opacity(0.5), PropertyChange::Height(7.0)]
        );
    }

    #[test]
    fn removed_stroke_is_an_explicit_unset() {
        let mut prev = Rect::new("r", 1.0, 1.0);
        prev.stroke = Some(Stroke::solid(Color::BLACK, 2.0));
        let next = Rect::new("r", 1.0, 1.0);

        let changes = NodeProps::Rect(prev).diff(&NodeProps::Rect(next));
        assert_eq!(
            changes,
            Some(NodeChanges::Patch(vec![PropertyChange::Stroke(None)]))
        );
    }

    #[test]
    fn type_change_is_a_full_replacement() {
        let next = NodeProps::Ellipse(Ellipse {
            base: NodeBase::new("r"),
            width: 10.0,
            height: 5.0,
            fills: Vec::new(),
            stroke: None,
        });
        assert_eq!(
            rect(10.0, 5.0).diff(&next),
            Some(NodeChanges::Replace(next.clone()))
        );
    }

    #[test]
    fn shared_path_data_compares_by_pointer_first() {
        let data = Arc::new(PathData::default());
        let a = NodeProps::Path(crate::node::PathNode {
            base: NodeBase::new("p"),
            data: Arc::clone(&data),
            fills: Vec::new(),
            stroke: None,
        });
        let b = a.clone();
        assert_eq!(a.diff(&b), None);
    }

    #[test]
    fn apply_round_trips_a_diff() {
        let mut prev = rect(10.0, 5.0);
        let mut next = rect(12.0, 5.0);
        next.base_mut().visible = false;
        if let NodeProps::Rect(r) = &mut next {
            r.fills.push(Fill::solid(Color::WHITE));
            r.corner_radius = 3.0;
        }

        let Some(NodeChanges::Patch(changes)) = prev.diff(&next) else {
            panic!("expected a patch");
        };
        prev.apply(&changes).expect("changes apply to a rect");
        assert_eq!(prev, next);
    }

    #[test]
    fn apply_rejects_properties_the_kind_lacks() {
        let mut text = NodeProps::Text(Text {
            base: NodeBase::new("t"),
            payload: OpaquePayload::new(b"hello".to_vec()),
        });
        let err = text
            .apply(&[PropertyChange::Width(3.0)])
            .expect_err("text has no width");
        assert_eq!(
            err,
            PropertyMismatch {
                kind: NodeKind::Text,
                key: PropertyKey::Width,
            }
        );
    }

    #[test]
    fn default_predicate_ignores_cosmetic_keys() {
        assert!(!PropertyKey::Opacity.affects_geometry_by_default(NodeKind::Rect));
        assert!(!PropertyKey::Visible.affects_geometry_by_default(NodeKind::Rect));
        assert!(!PropertyKey::Transform.affects_geometry_by_default(NodeKind::Path));
        assert!(PropertyKey::Width.affects_geometry_by_default(NodeKind::Rect));
        assert!(PropertyKey::Stroke.affects_geometry_by_default(NodeKind::Ellipse));
        assert!(!PropertyKey::Width.affects_geometry_by_default(NodeKind::Frame));
    }
}
