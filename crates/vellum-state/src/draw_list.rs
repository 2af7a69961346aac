// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Flattened, ordered view of the visible nodes.

use std::sync::Arc;

use vellum_scene::{AffineMatrix, Fill, NodeKind, SceneNodeId, Stroke};

use crate::tessellate::VertexBuffer;

/// One visible node, in paint order.
///
/// Transforms are local; compose with
/// [`SceneState::world_transform`](crate::SceneState::world_transform) when
/// the backend needs absolute placement.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawItem<'a> {
    /// Node identity.
    pub id: &'a SceneNodeId,
    /// Node type.
    pub kind: NodeKind,
    /// Local-to-parent transform.
    pub transform: AffineMatrix,
    /// Node opacity.
    pub opacity: f64,
    /// Cached geometry, for geometry nodes that produced any.
    pub vertices: Option<&'a Arc<VertexBuffer>>,
    /// Fill layers.
    pub fills: &'a [Fill],
    /// Outline.
    pub stroke: Option<&'a Stroke>,
}

/// Depth-first pre-order list of visible nodes, root first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawList<'a> {
    items: Vec<DrawItem<'a>>,
}

impl<'a> DrawList<'a> {
    pub(crate) fn from_items(items: Vec<DrawItem<'a>>) -> Self {
        Self { items }
    }

    /// Items in paint order.
    pub fn iter(&self) -> core::slice::Iter<'_, DrawItem<'a>> {
        self.items.iter()
    }

    /// Ids in paint order.
    pub fn ids(&self) -> Vec<&'a SceneNodeId> {
        self.items.iter().map(|item| item.id).collect()
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing is drawn.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Item for `id`, if visible.
    pub fn get(&self, id: &SceneNodeId) -> Option<&DrawItem<'a>> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Content hash of everything the GPU backend would consume.
    ///
    /// Two lists with equal digests draw the same pixels: ids, kinds,
    /// transforms, opacities, vertex and index bytes are hashed in order.
    /// Fills and strokes are baked into the vertex colors by the
    /// tessellator and are not hashed separately.
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&(self.items.len() as u64).to_le_bytes());
        for item in &self.items {
            let id = item.id.as_str().as_bytes();
            hasher.update(&(id.len() as u64).to_le_bytes());
            hasher.update(id);
            hasher.update(&[item.kind as u8]);
            for bits in item.transform.to_bits() {
                hasher.update(&bits.to_le_bytes());
            }
            hasher.update(&item.opacity.to_bits().to_le_bytes());
            match item.vertices {
                None => {
                    hasher.update(&[0]);
                }
                Some(buf) => {
                    hasher.update(&[1]);
                    hasher.update(&(buf.vertices.len() as u64).to_le_bytes());
                    hasher.update(buf.vertex_bytes());
                    hasher.update(&(buf.indices.len() as u64).to_le_bytes());
                    hasher.update(buf.index_bytes());
                }
            }
        }
        hasher.finalize().into()
    }
}

impl<'a> IntoIterator for DrawList<'a> {
    type Item = DrawItem<'a>;
    type IntoIter = std::vec::IntoIter<DrawItem<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'l, 'a> IntoIterator for &'l DrawList<'a> {
    type Item = &'l DrawItem<'a>;
    type IntoIter = core::slice::Iter<'l, DrawItem<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
