// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Incremental scene state for Vellum.
//!
//! [`SceneState`] holds the live node table, the tessellation cache and the
//! child order of one document. It is built once from a
//! [`SceneGraph`](vellum_scene::SceneGraph) and then kept current by
//! applying the diffs produced by `vellum-diff`, re-tessellating only the
//! nodes whose geometry actually changed.
//!
//! The tessellator is a host-supplied [`Tessellator`]; the state only caches
//! its output as shared [`VertexBuffer`]s, so an unchanged node keeps the
//! very same allocation across updates.
//!
//! # Example
//!
//! ```
//! use vellum_scene::{Group, NodeProps, Rect, SceneGraph};
//! use vellum_state::{SceneState, TessellateError, Tessellator, VertexBuffer};
//!
//! struct Nothing;
//!
//! impl Tessellator for Nothing {
//!     fn tessellate(&self, _: &NodeProps) -> Result<Option<VertexBuffer>, TessellateError> {
//!         Ok(None)
//!     }
//! }
//!
//! let graph = SceneGraph::new(
//!     Group::new("root", vec![Rect::new("r1", 10.0, 10.0).into()]),
//!     800.0,
//!     600.0,
//!     1,
//! );
//! let mut state = SceneState::new(Nothing);
//! state.build_from_scene(&graph)?;
//! assert_eq!(state.draw_list().len(), 2);
//! # Ok::<(), vellum_state::StateError>(())
//! ```

mod config;
mod draw_list;
mod error;
mod report;
mod state;
mod tessellate;

pub use config::{ConfigError, ConfigStore, FailurePolicy, JsonDirStore, SyncConfig};
pub use draw_list::{DrawItem, DrawList};
pub use error::{ContractViolation, OpRef, StateError};
pub use report::{ApplyReport, DegradedNode};
pub use state::{LiveNode, SceneState};
pub use tessellate::{TessellateError, Tessellator, Vertex, VertexBuffer};
