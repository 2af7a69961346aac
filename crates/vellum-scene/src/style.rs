// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Fill, stroke and effect values carried by scene nodes.

use crate::node::OpaquePayload;

/// Linear RGBA color with `f32` components in `0..=1`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Color(pub [f32; 4]);

impl Color {
    /// Opaque black.
    pub const BLACK: Self = Self([0.0, 0.0, 0.0, 1.0]);
    /// Opaque white.
    pub const WHITE: Self = Self([1.0, 1.0, 1.0, 1.0]);

    /// Builds a color from its components.
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self([r, g, b, a])
    }
}

/// One color stop of a gradient.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GradientStop {
    /// Position along the gradient in `0..=1`.
    pub offset: f32,
    /// Color at this stop.
    pub color: Color,
}

/// Paint source for fills and strokes.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Paint {
    /// Uniform color.
    Solid(Color),
    /// Linear gradient between two points in node-local space.
    LinearGradient {
        /// Gradient start point.
        start: [f64; 2],
        /// Gradient end point.
        end: [f64; 2],
        /// Ordered color stops.
        stops: Vec<GradientStop>,
    },
    /// Image pattern referenced by an opaque asset key.
    Image {
        /// Asset key resolved by the GPU backend.
        asset: String,
    },
}

/// One fill layer.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Fill {
    /// Paint source.
    pub paint: Paint,
    /// Fill opacity in `0..=1`, applied on top of node opacity.
    pub opacity: f32,
}

impl Fill {
    /// Fully opaque solid fill.
    pub const fn solid(color: Color) -> Self {
        Self {
            paint: Paint::Solid(color),
            opacity: 1.0,
        }
    }
}

/// Stroke end-cap style.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LineCap {
    /// Flat cap ending at the path end.
    #[default]
    Butt,
    /// Semicircular cap.
    Round,
    /// Square cap projecting half the stroke width.
    Square,
}

/// Stroke corner style.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LineJoin {
    /// Sharp corner, limited by the backend's miter limit.
    #[default]
    Miter,
    /// Rounded corner.
    Round,
    /// Beveled corner.
    Bevel,
}

/// Outline style for geometry nodes.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stroke {
    /// Paint source.
    pub paint: Paint,
    /// Stroke width in local units.
    pub width: f64,
    /// End-cap style.
    pub cap: LineCap,
    /// Corner style.
    pub join: LineJoin,
    /// Dash pattern (alternating on/off lengths); empty for a solid line.
    pub dash: Vec<f64>,
}

impl Stroke {
    /// Solid-colored stroke with default cap and join.
    pub fn solid(color: Color, width: f64) -> Self {
        Self {
            paint: Paint::Solid(color),
            width,
            cap: LineCap::default(),
            join: LineJoin::default(),
            dash: Vec::new(),
        }
    }
}

/// Post-processing effect. Opaque to the diff/state layer beyond equality.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Effect {
    /// Offset, blurred copy of the node's silhouette drawn beneath it.
    DropShadow {
        /// Shadow offset in local units.
        offset: [f64; 2],
        /// Blur radius.
        blur: f64,
        /// Shadow color.
        color: Color,
    },
    /// Gaussian blur of the rendered layer.
    LayerBlur {
        /// Blur radius.
        radius: f64,
    },
    /// Format-specific effect the core does not interpret.
    Custom(OpaquePayload),
}
