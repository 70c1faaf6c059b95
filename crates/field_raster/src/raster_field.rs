//! Fields backed by rasters.
//!
//! [`RasterField`] turns a [`Raster`] back into a continuous [`Field`] by bilinear
//! interpolation between the four cells around a point, resolving out-of-bounds neighbors
//! through per-end [`Edges`] policies. [`MultiRasterField`] does the same for every channel
//! of a [`MultiRaster`]. Rendering one of these into another raster resamples it.
//!
//! Without an area, fields are sampled in grid coordinates: cell `(x, y)` sits at point
//! `(x, y)`. [`RasterField::with_area`] maps a world rectangle onto the grid instead.
use glam::{FloatExt, Vec2};

use crate::area::{GridArea, Rect};
use crate::channel::ChannelId;
use crate::edge::{AxisAccess, EdgeType, Edges};
use crate::error::{Error, Result};
use crate::field::Field;
use crate::multi_field::MultiField;
use crate::multi_raster::MultiRaster;
use crate::raster::Raster;

/// Edge handling and coordinate mapping shared by the raster-backed fields.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Sampling {
    edges: Edges,
    default_value: f32,
    area: Option<GridArea>,
}

impl Sampling {
    fn new(edges: Edges) -> Result<Self> {
        if edges.any(|e| e == EdgeType::NotAllowed) {
            return Err(Error::InvalidConfig(
                "raster fields need a read policy on every edge, NotAllowed is not one".into(),
            ));
        }
        Ok(Self {
            edges,
            default_value: 0.0,
            area: None,
        })
    }

    #[inline]
    fn to_grid(&self, p: Vec2) -> Vec2 {
        match &self.area {
            Some(area) => area.world_to_grid(p),
            None => p,
        }
    }

    fn full_area(&self, size: (usize, usize)) -> Rect {
        match &self.area {
            Some(area) => area.area,
            None => Rect::from_corners(
                [0.0, 0.0],
                [size.0.saturating_sub(1) as f32, size.1.saturating_sub(1) as f32],
            ),
        }
    }

    /// Value outside the raster when `g` lies wholly beyond a non-redirecting end.
    fn outside_value(&self, g: Vec2, size: (usize, usize)) -> Option<f32> {
        let (sx, sy) = (size.0 as f32, size.1 as f32);
        let e = &self.edges;
        let beyond = [
            (g.x <= -1.0, e.left),
            (g.x >= sx, e.right),
            (g.y <= -1.0, e.top),
            (g.y >= sy, e.bottom),
        ];
        beyond
            .into_iter()
            .filter(|(outside, _)| *outside)
            .find_map(|(_, edge)| edge.boundary_value(self.default_value))
    }

    fn sample<D: AsRef<[f32]>>(&self, raster: &Raster<D>, g: Vec2) -> f32 {
        if !g.is_finite() {
            return self.default_value;
        }
        let size = raster.size();
        if let Some(value) = self.outside_value(g, size) {
            return value;
        }

        let g = Vec2::new(
            fold_axis(g.x, size.0, self.edges.left, self.edges.right),
            fold_axis(g.y, size.1, self.edges.top, self.edges.bottom),
        );
        let lo = g.floor();
        let (fx, fy) = (g.x - lo.x, g.y - lo.y);
        let (x0, y0) = (lo.x as isize, lo.y as isize);
        let xs = [self.edges.resolve_x(x0, size.0), self.edges.resolve_x(x0 + 1, size.0)];
        let ys = [self.edges.resolve_y(y0, size.1), self.edges.resolve_y(y0 + 1, size.1)];

        let cell = |ax: AxisAccess, ay: AxisAccess| match (ax, ay) {
            (AxisAccess::Cell(x), AxisAccess::Cell(y)) => raster.at(x, y),
            (AxisAccess::Boundary(edge), _) | (_, AxisAccess::Boundary(edge)) => {
                edge.boundary_value(self.default_value).unwrap_or(self.default_value)
            }
            _ => self.default_value,
        };

        let top = cell(xs[0], ys[0]).lerp(cell(xs[1], ys[0]), fx);
        let bottom = cell(xs[0], ys[1]).lerp(cell(xs[1], ys[1]), fx);
        top.lerp(bottom, fy)
    }
}

/// Brings a coordinate beyond a redirecting end back into `[-1, size]`, so the neighbor
/// cells around it fit in an `isize`. Wrapping shifts by whole periods.
#[inline]
fn fold_axis(c: f32, size: usize, low: EdgeType, high: EdgeType) -> f32 {
    let n = size as f32;
    if (-1.0..=n).contains(&c) {
        return c;
    }
    let edge = if c < 0.0 { low } else { high };
    match edge {
        EdgeType::Wrap | EdgeType::WrapWritable => {
            let r = c.rem_euclid(n);
            if r < n {
                r
            } else {
                0.0
            }
        }
        _ => c.clamp(-1.0, n),
    }
}

/// A [`Field`] that interpolates a raster.
#[derive(Clone, Debug, PartialEq)]
pub struct RasterField<D = Vec<f32>> {
    raster: Raster<D>,
    sampling: Sampling,
}

impl<D: AsRef<[f32]>> RasterField<D> {
    /// Wraps `raster` with the given edge policies.
    ///
    /// [`EdgeType::NotAllowed`] is rejected on every end, since a field must produce a value
    /// everywhere.
    pub fn new(raster: Raster<D>, edges: Edges) -> Result<Self> {
        Ok(Self {
            raster,
            sampling: Sampling::new(edges)?,
        })
    }

    /// Sets the value read under [`EdgeType::Constant`].
    pub fn with_default_value(mut self, value: f32) -> Self {
        self.sampling.default_value = value;
        self
    }

    /// Maps `area` onto the raster so that its corners land on the corner cells.
    pub fn with_area(mut self, area: Rect) -> Self {
        let (sx, sy) = self.raster.size();
        self.sampling.area = Some(GridArea::new(area, sx, sy));
        self
    }

    pub fn raster(&self) -> &Raster<D> {
        &self.raster
    }

    pub fn into_raster(self) -> Raster<D> {
        self.raster
    }

    pub fn edges(&self) -> Edges {
        self.sampling.edges
    }

    pub fn default_value(&self) -> f32 {
        self.sampling.default_value
    }

    pub fn area(&self) -> Option<&GridArea> {
        self.sampling.area.as_ref()
    }

    /// The source rectangle that spans the raster from its first to its last cell.
    ///
    /// Rendering it into a raster of the same size reproduces the values exactly.
    pub fn full_area(&self) -> Rect {
        self.sampling.full_area(self.raster.size())
    }

    /// Samples at fractional grid coordinates, ignoring any world area.
    pub fn sample_grid(&self, g: Vec2) -> f32 {
        self.sampling.sample(&self.raster, g)
    }
}

impl<D> Field for RasterField<D>
where
    D: AsRef<[f32]> + Send + Sync,
{
    /// The radius hint is ignored; raster fields always interpolate.
    #[inline]
    fn sample(&self, p: Vec2, _sample_radius: f32) -> f32 {
        self.sampling.sample(&self.raster, self.sampling.to_grid(p))
    }
}

/// A [`MultiField`] that interpolates every channel of a multi-raster.
///
/// The channel list is captured at construction.
pub struct MultiRasterField<R> {
    raster: R,
    channels: Vec<ChannelId>,
    sampling: Sampling,
}

impl<R: MultiRaster> MultiRasterField<R> {
    pub fn new(raster: R, edges: Edges) -> Result<Self> {
        let channels = raster.channels();
        Ok(Self {
            raster,
            channels,
            sampling: Sampling::new(edges)?,
        })
    }

    pub fn with_default_value(mut self, value: f32) -> Self {
        self.sampling.default_value = value;
        self
    }

    /// Maps `area` onto the raster so that its corners land on the corner cells.
    pub fn with_area(mut self, area: Rect) -> Self {
        let (sx, sy) = self.raster.size();
        self.sampling.area = Some(GridArea::new(area, sx, sy));
        self
    }

    pub fn raster(&self) -> &R {
        &self.raster
    }

    pub fn into_raster(self) -> R {
        self.raster
    }

    pub fn edges(&self) -> Edges {
        self.sampling.edges
    }

    pub fn full_area(&self) -> Rect {
        self.sampling.full_area(self.raster.size())
    }
}

impl<R> MultiField for MultiRasterField<R>
where
    R: MultiRaster + Send + Sync,
{
    fn channels(&self) -> &[ChannelId] {
        &self.channels
    }

    fn sample(&self, p: Vec2, channel: ChannelId, _sample_radius: f32) -> f32 {
        match self.raster.channel(channel) {
            Ok(raster) => self.sampling.sample(&raster, self.sampling.to_grid(p)),
            Err(_) => 0.0,
        }
    }

    fn sample_channels(&self, p: Vec2, channels: &[ChannelId], _sample_radius: f32, out: &mut [f32]) {
        let g = self.sampling.to_grid(p);
        for (id, value) in channels.iter().zip(out.iter_mut()) {
            *value = match self.raster.channel(*id) {
                Ok(raster) => self.sampling.sample(&raster, g),
                Err(_) => 0.0,
            };
        }
    }
}
