//! Rectangles in world and cell space, and the mapping between them.
//!
//! [`Rect`] describes a floating point world area (the source region of a render, or the
//! area a raster covers). [`CellRect`] describes an integer region of raster cells.
//! [`GridArea`] ties a [`Rect`] to a fixed grid resolution and converts between the two.
use glam::Vec2;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Axis-aligned floating point rectangle with `min <= max` on both axes.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    /// The unit square `[0, 1] x [0, 1]`.
    pub const UNIT: Rect = Rect {
        min: Vec2::ZERO,
        max: Vec2::ONE,
    };

    /// Creates a rectangle from two corners, normalizing their order.
    pub fn from_corners(a: impl Into<mint::Vector2<f32>>, b: impl Into<mint::Vector2<f32>>) -> Self {
        let a: mint::Vector2<f32> = a.into();
        let b: mint::Vector2<f32> = b.into();
        let (a, b) = (Vec2::from(a), Vec2::from(b));
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Creates a rectangle from its minimum corner and size.
    pub fn from_min_size(min: Vec2, size: Vec2) -> Self {
        Self::from_corners(min, min + size)
    }

    /// Creates a rectangle centered on `center` with the given extent.
    pub fn from_center_extent(center: Vec2, extent: Vec2) -> Self {
        let half = extent.abs() * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Width and height.
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// Mean of width and height.
    pub fn size_average(&self) -> f32 {
        let s = self.size();
        0.5 * (s.x + s.y)
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Returns `true` if the rectangle has zero area.
    pub fn is_empty(&self) -> bool {
        let s = self.size();
        !(s.x > 0.0 && s.y > 0.0)
    }

    /// Inclusive point containment.
    pub fn contains_point(&self, p: Vec2) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        self.contains_point(other.min) && self.contains_point(other.max)
    }

    /// Maps `p` from this rectangle into `[0, 1]` relative coordinates.
    pub fn to_relative(&self, p: Vec2) -> Vec2 {
        (p - self.min) / self.size()
    }

    /// Maps relative coordinates back into this rectangle.
    pub fn from_relative(&self, rel: Vec2) -> Vec2 {
        self.min + rel * self.size()
    }
}

impl Default for Rect {
    fn default() -> Self {
        Rect::UNIT
    }
}

/// Axis-aligned rectangle of raster cells: `size_x * size_y` cells starting at `(x, y)`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CellRect {
    pub x: usize,
    pub y: usize,
    pub size_x: usize,
    pub size_y: usize,
}

impl CellRect {
    pub fn new(x: usize, y: usize, size_x: usize, size_y: usize) -> Self {
        Self {
            x,
            y,
            size_x,
            size_y,
        }
    }

    /// The full extent of a `size_x * size_y` raster.
    pub fn full(size_x: usize, size_y: usize) -> Self {
        Self::new(0, 0, size_x, size_y)
    }

    /// Exclusive end along x, or `None` if it overflows `usize`.
    pub fn end_x(&self) -> Option<usize> {
        self.x.checked_add(self.size_x)
    }

    /// Exclusive end along y, or `None` if it overflows `usize`.
    pub fn end_y(&self) -> Option<usize> {
        self.y.checked_add(self.size_y)
    }

    pub fn is_empty(&self) -> bool {
        self.size_x == 0 || self.size_y == 0
    }

    /// Whether cell `(x, y)` lies inside.
    pub fn contains_cell(&self, x: usize, y: usize) -> bool {
        let below = |c: usize, end: Option<usize>| end.map_or(true, |e| c < e);
        x >= self.x && y >= self.y && below(x, self.end_x()) && below(y, self.end_y())
    }

    /// Whether `other` lies inside. A rectangle whose end overflows is never contained.
    pub fn contains_rect(&self, other: &CellRect) -> bool {
        let within = |inner: Option<usize>, outer: Option<usize>| match (inner, outer) {
            (Some(i), Some(o)) => i <= o,
            (Some(_), None) => true,
            (None, _) => false,
        };
        other.x >= self.x
            && other.y >= self.y
            && within(other.end_x(), self.end_x())
            && within(other.end_y(), self.end_y())
    }
}

/// A world area covered by a grid of `size_x * size_y` cells.
///
/// Cell `(0, 0)` sits at `area.min` and cell `(size_x - 1, size_y - 1)` at `area.max`, so
/// grid coordinates run over `[0, size - 1]` while world coordinates run over the area.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridArea {
    pub area: Rect,
    pub size_x: usize,
    pub size_y: usize,
}

impl GridArea {
    pub fn new(area: Rect, size_x: usize, size_y: usize) -> Self {
        Self {
            area,
            size_x,
            size_y,
        }
    }

    /// World units per cell along each axis. Zero on axes with a single cell.
    pub fn cell_size(&self) -> Vec2 {
        let size = self.area.size();
        Vec2::new(
            span_step(size.x, self.size_x),
            span_step(size.y, self.size_y),
        )
    }

    /// Converts a world position to fractional grid coordinates.
    pub fn world_to_grid(&self, p: Vec2) -> Vec2 {
        let size = self.area.size();
        let rel = p - self.area.min;
        Vec2::new(
            to_grid_axis(rel.x, size.x, self.size_x),
            to_grid_axis(rel.y, size.y, self.size_y),
        )
    }

    /// Converts fractional grid coordinates to a world position.
    pub fn grid_to_world(&self, g: Vec2) -> Vec2 {
        self.area.min + g * self.cell_size()
    }

    /// Converts a world position to the index of the cell at or below it.
    pub fn world_to_cell(&self, p: Vec2) -> (isize, isize) {
        let g = self.world_to_grid(p).floor();
        (g.x as isize, g.y as isize)
    }

    /// World position of cell `(ix, iy)`.
    pub fn cell_to_world(&self, ix: isize, iy: isize) -> Vec2 {
        self.grid_to_world(Vec2::new(ix as f32, iy as f32))
    }

    /// The smallest cell rectangle covering `rect`, clipped to the grid.
    ///
    /// Returns `None` if `rect` lies entirely outside the grid.
    pub fn cells_covering(&self, rect: &Rect) -> Option<CellRect> {
        if self.size_x == 0 || self.size_y == 0 {
            return None;
        }
        let lo = self.world_to_grid(rect.min).floor();
        let hi = self.world_to_grid(rect.max).ceil();
        let max_x = (self.size_x - 1) as f32;
        let max_y = (self.size_y - 1) as f32;
        if hi.x < 0.0 || hi.y < 0.0 || lo.x > max_x || lo.y > max_y {
            return None;
        }
        let x0 = lo.x.clamp(0.0, max_x) as usize;
        let y0 = lo.y.clamp(0.0, max_y) as usize;
        let x1 = hi.x.clamp(0.0, max_x) as usize;
        let y1 = hi.y.clamp(0.0, max_y) as usize;
        Some(CellRect::new(x0, y0, x1 - x0 + 1, y1 - y0 + 1))
    }
}

fn span_step(world: f32, cells: usize) -> f32 {
    if cells > 1 {
        world / (cells - 1) as f32
    } else {
        0.0
    }
}

fn to_grid_axis(rel: f32, world: f32, cells: usize) -> f32 {
    if cells > 1 && world != 0.0 {
        rel / world * (cells - 1) as f32
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_grid() -> GridArea {
        GridArea::new(
            Rect::from_corners(Vec2::new(-5.0, -5.0), Vec2::new(5.0, 15.0)),
            11,
            5,
        )
    }

    #[test]
    fn rect_normalizes_corners() {
        let r = Rect::from_corners([3.0, 1.0], [1.0, 4.0]);
        assert_eq!(r.min, Vec2::new(1.0, 1.0));
        assert_eq!(r.max, Vec2::new(3.0, 4.0));
        assert_eq!(r.size(), Vec2::new(2.0, 3.0));
        assert_eq!(r.size_average(), 2.5);
    }

    #[test]
    fn rect_empty_when_degenerate() {
        assert!(Rect::from_corners([1.0, 1.0], [1.0, 5.0]).is_empty());
        assert!(!Rect::UNIT.is_empty());
    }

    #[test]
    fn rect_containment_is_inclusive() {
        let r = Rect::UNIT;
        assert!(r.contains_point(Vec2::ONE));
        assert!(!r.contains_point(Vec2::new(1.01, 0.5)));
        assert!(r.contains_rect(&Rect::from_corners([0.25, 0.25], [0.75, 1.0])));
    }

    #[test]
    fn cell_rect_containment() {
        let full = CellRect::full(8, 4);
        assert!(full.contains_rect(&CellRect::new(2, 1, 6, 3)));
        assert!(!full.contains_rect(&CellRect::new(2, 1, 7, 3)));
        assert!(full.contains_cell(7, 3));
        assert!(!full.contains_cell(8, 0));
    }

    #[test]
    fn cell_rect_overflowing_end_is_never_contained() {
        let huge = CellRect::new(usize::MAX, 0, 2, 1);
        assert_eq!(huge.end_x(), None);
        assert!(!CellRect::full(8, 4).contains_rect(&huge));
        assert!(!CellRect::full(usize::MAX, 1).contains_rect(&huge));
        assert!(huge.contains_cell(usize::MAX, 0));
    }

    #[test]
    fn world_grid_roundtrip() {
        let grid = sample_grid();
        assert_eq!(grid.cell_size(), Vec2::new(1.0, 5.0));
        assert_eq!(grid.world_to_cell(Vec2::new(-5.0, -5.0)), (0, 0));
        assert_eq!(grid.world_to_cell(Vec2::new(5.0, 15.0)), (10, 4));
        assert_eq!(grid.world_to_cell(Vec2::new(0.5, 2.0)), (5, 1));

        let back = grid.cell_to_world(5, 1);
        assert_eq!(back, Vec2::new(0.0, 0.0));
    }

    #[test]
    fn cells_covering_clips_to_grid() {
        let grid = sample_grid();
        let rect = Rect::from_corners([-20.0, -1.0], [0.5, 1.0]);
        let cells = grid.cells_covering(&rect).unwrap();
        assert_eq!(cells, CellRect::new(0, 0, 7, 3));

        let outside = Rect::from_corners([20.0, 20.0], [30.0, 30.0]);
        assert!(grid.cells_covering(&outside).is_none());
    }

    #[test]
    fn single_cell_axis_maps_to_zero() {
        let grid = GridArea::new(Rect::UNIT, 1, 3);
        assert_eq!(grid.world_to_grid(Vec2::new(0.7, 0.5)), Vec2::new(0.0, 1.0));
    }
}
