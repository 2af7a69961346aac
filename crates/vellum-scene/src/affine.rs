// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! 2D affine transforms.

/// Local-to-parent 2D affine transform.
///
/// Components are `[a, b, c, d, e, f]`, mapping a point `(x, y)` to
/// `(a*x + c*y + e, b*x + d*y + f)`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AffineMatrix(pub [f64; 6]);

impl Default for AffineMatrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl AffineMatrix {
    /// The identity transform.
    pub const IDENTITY: Self = Self([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    /// Pure translation by `(tx, ty)`.
    pub const fn translate(tx: f64, ty: f64) -> Self {
        Self([1.0, 0.0, 0.0, 1.0, tx, ty])
    }

    /// Axis-aligned scale by `(sx, sy)`.
    pub const fn scale(sx: f64, sy: f64) -> Self {
        Self([sx, 0.0, 0.0, sy, 0.0, 0.0])
    }

    /// Returns the transform that applies `self` first and then `outer`.
    ///
    /// A child's world transform is `child_local.then(parent_world)`.
    #[must_use]
    pub fn then(self, outer: Self) -> Self {
        let [a, b, c, d, e, f] = self.0;
        let [oa, ob, oc, od, oe, of] = outer.0;
        Self([
            oa * a + oc * b,
            ob * a + od * b,
            oa * c + oc * d,
            ob * c + od * d,
            oa * e + oc * f + oe,
            ob * e + od * f + of,
        ])
    }

    /// Maps a point through the transform.
    pub fn apply(self, point: [f64; 2]) -> [f64; 2] {
        let [a, b, c, d, e, f] = self.0;
        let [x, y] = point;
        [a * x + c * y + e, b * x + d * y + f]
    }

    /// Bit patterns of the six components, for hashing and exact comparison.
    pub fn to_bits(self) -> [u64; 6] {
        self.0.map(f64::to_bits)
    }
}
