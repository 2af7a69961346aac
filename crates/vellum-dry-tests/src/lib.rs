// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared test doubles and fixtures for Vellum crates.
#![forbid(unsafe_code)]
//!
//! This crate provides commonly used test utilities to reduce duplication
//! across the Vellum test suite.
//!
//! # Modules
//!
//! - [`config`] - In-memory config store fake for testing without filesystem
//! - [`fuzz`] - Seeded random scene and edit generator
//! - [`rng`] - Small deterministic PRNG
//! - [`scenes`] - Node fixtures, `SceneGraph` builder and tree surgery helpers
//! - [`tessellator`] - Deterministic fake tessellator with call counting

pub mod config;
pub mod fuzz;
pub mod rng;
pub mod scenes;
pub mod tessellator;

// Re-export commonly used items at crate root for convenience
pub use config::InMemoryConfigStore;
pub use fuzz::SceneFuzzer;
pub use rng::XorShift64;
pub use scenes::{
    detach, ellipse, find_mut, frame, group, image, path, rect, scene, text, SceneGraphBuilder,
};
pub use tessellator::FakeTessellator;
