//! Edge policies for reads and writes outside a raster's bounds.
//!
//! [`EdgeType`] is the policy for one axis end, [`Edges`] configures all four ends of a
//! raster, and [`BorderedRaster`] applies them to `isize` coordinate access.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::raster::Raster;

/// What happens when a coordinate falls outside `[0, size)`.
///
/// | Variant | Read | Write |
/// |---|---|---|
/// | `Zero` / `MinusOne` / `One` | that constant | dropped |
/// | `Constant` | the configured default | dropped |
/// | `Clamp` | nearest edge cell | dropped |
/// | `ClampWritable` | nearest edge cell | nearest edge cell |
/// | `Wrap` | coordinate modulo size | dropped |
/// | `WrapWritable` | coordinate modulo size | coordinate modulo size |
/// | `NotAllowed` | error | error |
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EdgeType {
    Zero,
    MinusOne,
    One,
    Constant,
    Clamp,
    ClampWritable,
    Wrap,
    #[default]
    WrapWritable,
    NotAllowed,
}

impl EdgeType {
    pub const ALL: [EdgeType; 9] = [
        EdgeType::Zero,
        EdgeType::MinusOne,
        EdgeType::One,
        EdgeType::Constant,
        EdgeType::Clamp,
        EdgeType::ClampWritable,
        EdgeType::Wrap,
        EdgeType::WrapWritable,
        EdgeType::NotAllowed,
    ];

    /// Whether out-of-bounds writes are redirected and applied.
    pub fn is_writable(self) -> bool {
        matches!(self, EdgeType::ClampWritable | EdgeType::WrapWritable)
    }

    /// Whether out-of-bounds coordinates are remapped to an in-bounds cell.
    pub fn is_redirecting(self) -> bool {
        matches!(
            self,
            EdgeType::Clamp | EdgeType::ClampWritable | EdgeType::Wrap | EdgeType::WrapWritable
        )
    }

    /// Maps `coord` onto `[0, size)`.
    ///
    /// In-range coordinates pass through unchanged. Out-of-range coordinates are remapped by
    /// redirecting policies and yield `None` otherwise. `size` must be positive.
    #[inline]
    pub fn remap(self, coord: isize, size: usize) -> Option<usize> {
        let n = size as isize;
        if (0..n).contains(&coord) {
            return Some(coord as usize);
        }
        match self {
            EdgeType::Clamp | EdgeType::ClampWritable => Some(coord.clamp(0, n - 1) as usize),
            EdgeType::Wrap | EdgeType::WrapWritable => Some(coord.rem_euclid(n) as usize),
            _ => None,
        }
    }

    /// The value read outside the raster for non-redirecting policies.
    ///
    /// `None` for redirecting policies and for `NotAllowed`.
    #[inline]
    pub fn boundary_value(self, default: f32) -> Option<f32> {
        match self {
            EdgeType::Zero => Some(0.0),
            EdgeType::MinusOne => Some(-1.0),
            EdgeType::One => Some(1.0),
            EdgeType::Constant => Some(default),
            _ => None,
        }
    }
}

/// Resolution of one coordinate against one axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AxisAccess {
    /// The coordinate maps to this cell index.
    Cell(usize),
    /// The coordinate is outside and reads the boundary value of this policy.
    Boundary(EdgeType),
    /// The coordinate is outside under [`EdgeType::NotAllowed`].
    Rejected,
}

/// Edge policies for the four ends of a raster.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Edges {
    /// Applies to `x < 0`.
    pub left: EdgeType,
    /// Applies to `x >= size_x`.
    pub right: EdgeType,
    /// Applies to `y < 0`.
    pub top: EdgeType,
    /// Applies to `y >= size_y`.
    pub bottom: EdgeType,
}

impl Edges {
    /// The same policy on every end.
    pub fn uniform(edge: EdgeType) -> Self {
        Self::axes(edge, edge)
    }

    /// One policy for both x ends and one for both y ends.
    pub fn axes(x: EdgeType, y: EdgeType) -> Self {
        Self {
            left: x,
            right: x,
            top: y,
            bottom: y,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = EdgeType> {
        [self.left, self.right, self.top, self.bottom].into_iter()
    }

    pub fn any(&self, f: impl Fn(EdgeType) -> bool) -> bool {
        self.iter().any(f)
    }

    #[inline]
    pub fn resolve_x(&self, x: isize, size_x: usize) -> AxisAccess {
        resolve_axis(x, size_x, self.left, self.right)
    }

    #[inline]
    pub fn resolve_y(&self, y: isize, size_y: usize) -> AxisAccess {
        resolve_axis(y, size_y, self.top, self.bottom)
    }
}

#[inline]
fn resolve_axis(coord: isize, size: usize, low: EdgeType, high: EdgeType) -> AxisAccess {
    let edge = if coord < 0 { low } else { high };
    match edge.remap(coord, size) {
        Some(i) => AxisAccess::Cell(i),
        None if edge == EdgeType::NotAllowed => AxisAccess::Rejected,
        None => AxisAccess::Boundary(edge),
    }
}

#[inline]
fn resolve_axis_write(coord: isize, size: usize, low: EdgeType, high: EdgeType) -> AxisAccess {
    if (0..size as isize).contains(&coord) {
        return AxisAccess::Cell(coord as usize);
    }
    let edge = if coord < 0 { low } else { high };
    match edge {
        EdgeType::NotAllowed => AxisAccess::Rejected,
        e if e.is_writable() => match e.remap(coord, size) {
            Some(i) => AxisAccess::Cell(i),
            None => AxisAccess::Boundary(e),
        },
        e => AxisAccess::Boundary(e),
    }
}

/// A raster whose `isize` accessors apply [`Edges`] policies outside its bounds.
#[derive(Clone, Debug, PartialEq)]
pub struct BorderedRaster<D = Vec<f32>> {
    pub raster: Raster<D>,
    pub edges: Edges,
    /// Value read under [`EdgeType::Constant`].
    pub default_value: f32,
}

impl<D: AsRef<[f32]>> BorderedRaster<D> {
    pub fn new(raster: Raster<D>, edges: Edges) -> Self {
        Self {
            raster,
            edges,
            default_value: 0.0,
        }
    }

    pub fn with_default_value(mut self, value: f32) -> Self {
        self.default_value = value;
        self
    }

    pub fn size(&self) -> (usize, usize) {
        self.raster.size()
    }

    /// Reads `(x, y)`, redirecting or substituting out-of-bounds coordinates.
    pub fn get(&self, x: isize, y: isize) -> Result<f32> {
        let (sx, sy) = self.raster.size();
        let ax = self.edges.resolve_x(x, sx);
        let ay = self.edges.resolve_y(y, sy);
        match (ax, ay) {
            (AxisAccess::Cell(ix), AxisAccess::Cell(iy)) => Ok(self.raster.at(ix, iy)),
            (AxisAccess::Rejected, _) | (_, AxisAccess::Rejected) => {
                Err(Error::out_of_range(x as f64, y as f64, (sx, sy)))
            }
            (AxisAccess::Boundary(edge), _) | (_, AxisAccess::Boundary(edge)) => {
                Ok(edge.boundary_value(self.default_value).unwrap_or(self.default_value))
            }
        }
    }
}

impl<D: AsRef<[f32]> + AsMut<[f32]>> BorderedRaster<D> {
    /// Writes `(x, y)`. Out-of-bounds writes land on the redirected cell for writable
    /// policies and are dropped for the others.
    pub fn set(&mut self, x: isize, y: isize, value: f32) -> Result<()> {
        let (sx, sy) = self.raster.size();
        let e = self.edges;
        let ax = resolve_axis_write(x, sx, e.left, e.right);
        let ay = resolve_axis_write(y, sy, e.top, e.bottom);
        match (ax, ay) {
            (AxisAccess::Cell(ix), AxisAccess::Cell(iy)) => self.raster.set(ix, iy, value),
            (AxisAccess::Rejected, _) | (_, AxisAccess::Rejected) => {
                Err(Error::out_of_range(x as f64, y as f64, (sx, sy)))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn bordered(edges: Edges) -> BorderedRaster {
        let raster = Raster::from_fn(4, 3, |x, y| (x + 10 * y) as f32).unwrap();
        BorderedRaster::new(raster, edges).with_default_value(7.5)
    }

    #[test]
    fn writable_and_redirecting_flags() {
        for edge in EdgeType::ALL {
            if edge.is_writable() {
                assert!(edge.is_redirecting(), "{edge:?}");
            }
        }
        assert!(EdgeType::Clamp.is_redirecting());
        assert!(!EdgeType::Clamp.is_writable());
        assert!(!EdgeType::Constant.is_redirecting());
        assert!(!EdgeType::NotAllowed.is_redirecting());
    }

    #[test]
    fn default_edges_wrap_writable() {
        assert!(Edges::default().iter().all(|e| e == EdgeType::WrapWritable));
    }

    #[test]
    fn wrap_reads_opposite_side() {
        let r = bordered(Edges::uniform(EdgeType::Wrap));
        assert_eq!(r.get(4, 0).unwrap(), r.get(0, 0).unwrap());
        assert_eq!(r.get(-1, 0).unwrap(), r.get(3, 0).unwrap());
        assert_eq!(r.get(0, 3).unwrap(), r.get(0, 0).unwrap());
        assert_eq!(r.get(0, -1).unwrap(), r.get(0, 2).unwrap());
        assert_eq!(r.get(-9, -7).unwrap(), r.get(3, 2).unwrap());
    }

    #[test]
    fn clamp_reads_nearest_edge() {
        let r = bordered(Edges::uniform(EdgeType::Clamp));
        assert_eq!(r.get(4, 1).unwrap(), r.get(3, 1).unwrap());
        assert_eq!(r.get(-5, 1).unwrap(), r.get(0, 1).unwrap());
        assert_eq!(r.get(2, 3).unwrap(), r.get(2, 2).unwrap());
        assert_eq!(r.get(2, -5).unwrap(), r.get(2, 0).unwrap());
    }

    #[test]
    fn constant_policies_return_sentinels() {
        assert_eq!(bordered(Edges::uniform(EdgeType::Zero)).get(-1, 0).unwrap(), 0.0);
        assert_eq!(bordered(Edges::uniform(EdgeType::MinusOne)).get(9, 0).unwrap(), -1.0);
        assert_eq!(bordered(Edges::uniform(EdgeType::One)).get(0, 9).unwrap(), 1.0);
        assert_eq!(bordered(Edges::uniform(EdgeType::Constant)).get(0, -2).unwrap(), 7.5);
    }

    #[test]
    fn not_allowed_rejects_reads_and_writes() {
        let mut r = bordered(Edges::uniform(EdgeType::NotAllowed));
        assert!(matches!(r.get(-1, 0), Err(Error::OutOfRange { .. })));
        assert!(matches!(r.set(0, 3, 1.0), Err(Error::OutOfRange { .. })));
        assert_eq!(r.get(3, 2).unwrap(), 23.0);
    }

    #[test]
    fn per_end_policies_are_independent() {
        let edges = Edges {
            left: EdgeType::Zero,
            right: EdgeType::Clamp,
            top: EdgeType::Wrap,
            bottom: EdgeType::One,
        };
        let r = bordered(edges);
        assert_eq!(r.get(-1, 1).unwrap(), 0.0);
        assert_eq!(r.get(5, 1).unwrap(), 13.0);
        assert_eq!(r.get(1, -1).unwrap(), 21.0);
        assert_eq!(r.get(1, 3).unwrap(), 1.0);
    }

    #[test]
    fn writable_policies_redirect_writes() {
        let mut r = bordered(Edges::uniform(EdgeType::WrapWritable));
        r.set(-1, 0, 100.0).unwrap();
        assert_eq!(r.raster.get(3, 0).unwrap(), 100.0);

        let mut r = bordered(Edges::uniform(EdgeType::ClampWritable));
        r.set(9, 9, 100.0).unwrap();
        assert_eq!(r.raster.get(3, 2).unwrap(), 100.0);
    }

    #[test]
    fn read_only_policies_drop_writes() {
        for edge in [
            EdgeType::Zero,
            EdgeType::MinusOne,
            EdgeType::One,
            EdgeType::Constant,
            EdgeType::Clamp,
            EdgeType::Wrap,
        ] {
            let mut r = bordered(Edges::uniform(edge));
            let before = r.raster.clone();
            r.set(-1, 0, 100.0).unwrap();
            r.set(0, 5, 100.0).unwrap();
            assert_eq!(r.raster, before, "{edge:?}");
        }
    }

    proptest! {
        #[test]
        fn redirecting_remap_stays_in_bounds(coord in -1000isize..1000, size in 1usize..64) {
            for edge in [EdgeType::Clamp, EdgeType::Wrap] {
                let i = edge.remap(coord, size).unwrap();
                prop_assert!(i < size);
            }
        }

        #[test]
        fn wrap_is_periodic(coord in -1000isize..1000, size in 1usize..64) {
            let a = EdgeType::Wrap.remap(coord, size);
            let b = EdgeType::Wrap.remap(coord + size as isize, size);
            prop_assert_eq!(a, b);
        }
    }
}
