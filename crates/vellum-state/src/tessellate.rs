// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Tessellation port.
//!
//! The state never tessellates on its own; it calls a [`Tessellator`]
//! supplied by the host and caches the returned [`VertexBuffer`].

use thiserror::Error;
use vellum_scene::{NodeKind, NodeProps, PropertyChange};

/// One GPU vertex.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// Position in node-local units.
    pub position: [f32; 2],
    /// Premultiplied RGBA.
    pub color: [f32; 4],
}

/// Triangle list produced for one geometry node.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VertexBuffer {
    /// Vertex data.
    pub vertices: Vec<Vertex>,
    /// Triangle indices into `vertices`.
    pub indices: Vec<u32>,
}

impl VertexBuffer {
    /// Raw vertex bytes, ready for upload.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Raw index bytes, ready for upload.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Tessellation failure reported by a [`Tessellator`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TessellateError {
    /// The node's geometry cannot be triangulated.
    #[error("malformed geometry: {0}")]
    MalformedGeometry(String),
    /// Output would exceed the index range.
    #[error("numeric overflow while tessellating")]
    NumericOverflow,
    /// Backend-specific failure.
    #[error("tessellation failed: {0}")]
    Other(String),
}

/// Converts geometry nodes into vertex buffers.
///
/// `tessellate` must be pure: the same props always produce the same
/// buffer. Returning `Ok(None)` means the node draws nothing (zero area,
/// no fills).
pub trait Tessellator {
    /// Tessellates one node's own geometry and style.
    fn tessellate(&self, props: &NodeProps) -> Result<Option<VertexBuffer>, TessellateError>;

    /// Whether `change` on a node of `kind` invalidates its cached buffer.
    fn affects_geometry(&self, kind: NodeKind, change: &PropertyChange) -> bool {
        change.key().affects_geometry_by_default(kind)
    }
}

impl<T: Tessellator + ?Sized> Tessellator for &T {
    fn tessellate(&self, props: &NodeProps) -> Result<Option<VertexBuffer>, TessellateError> {
        (**self).tessellate(props)
    }

    fn affects_geometry(&self, kind: NodeKind, change: &PropertyChange) -> bool {
        (**self).affects_geometry(kind, change)
    }
}

impl<T: Tessellator + ?Sized> Tessellator for Box<T> {
    fn tessellate(&self, props: &NodeProps) -> Result<Option<VertexBuffer>, TessellateError> {
        (**self).tessellate(props)
    }

    fn affects_geometry(&self, kind: NodeKind, change: &PropertyChange) -> bool {
        (**self).affects_geometry(kind, change)
    }
}
