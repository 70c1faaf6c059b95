//! Single-channel raster storage with explicit memory layout.
//!
//! A [`Raster`] is a fixed-size grid of `f32` values over some storage `D`. The
//! [`RasterLayout`] describes where cell `(x, y)` lives in that storage:
//!
//! ```text
//! index(x, y) = offset + y * (size_x * x_step + y_skip) + x * x_step
//! ```
//!
//! The contiguous default (`offset = 0`, `x_step = 1`, `y_skip = 0`) is plain row-major
//! storage. Other layouts let several rasters share one interleaved array, each seeing
//! only its own channel.
//!
//! Storage is generic: [`Raster<Vec<f32>>`] owns its values, while [`RasterRef`] and
//! [`RasterMut`] borrow a slice of someone else's array and cannot outlive it.
use glam::FloatExt;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::area::CellRect;
use crate::error::{Error, Result};

/// A raster borrowing its values immutably.
pub type RasterRef<'a> = Raster<&'a [f32]>;

/// A raster borrowing its values mutably.
pub type RasterMut<'a> = Raster<&'a mut [f32]>;

/// Position of a raster's cells inside its backing array.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RasterLayout {
    /// Number of cells along x.
    pub size_x: usize,
    /// Number of cells along y.
    pub size_y: usize,
    /// Array index of cell `(0, 0)`.
    pub offset: usize,
    /// Index delta per +1 in x. Never zero.
    pub x_step: isize,
    /// Extra index delta per +1 in y beyond `size_x * x_step`.
    pub y_skip: isize,
}

impl RasterLayout {
    /// Row-major layout with no gaps.
    pub fn contiguous(size_x: usize, size_y: usize) -> Self {
        Self {
            size_x,
            size_y,
            offset: 0,
            x_step: 1,
            y_skip: 0,
        }
    }

    /// Layout of channel `channel` in an array holding `channel_count` interleaved channels.
    pub fn interleaved(size_x: usize, size_y: usize, channel: usize, channel_count: usize) -> Self {
        Self {
            size_x,
            size_y,
            offset: channel,
            x_step: channel_count as isize,
            y_skip: 0,
        }
    }

    pub fn size(&self) -> (usize, usize) {
        (self.size_x, self.size_y)
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.size_x * self.size_y
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index delta per +1 in y.
    #[inline]
    pub fn row_stride(&self) -> isize {
        self.size_x as isize * self.x_step + self.y_skip
    }

    /// Array index of cell `(x, y)`. The cell must lie inside the layout.
    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        (self.offset as isize + y as isize * self.row_stride() + x as isize * self.x_step) as usize
    }

    /// Returns `true` for the gap-free row-major layout.
    pub fn is_contiguous(&self) -> bool {
        self.offset == 0 && self.x_step == 1 && self.y_skip == 0
    }

    pub fn extent(&self) -> CellRect {
        CellRect::full(self.size_x, self.size_y)
    }

    /// Checks that the layout is well formed and every cell index falls inside an array of
    /// length `len`.
    pub fn validate(&self, len: usize) -> Result<()> {
        if self.size_x == 0 || self.size_y == 0 {
            return Err(Error::InvalidConfig(format!(
                "raster size must be positive, got {}x{}",
                self.size_x, self.size_y
            )));
        }
        if self.x_step == 0 {
            return Err(Error::InvalidConfig("x_step must not be zero".into()));
        }
        // The index is affine in x and y, so the corners bound every cell.
        let (mx, my) = (self.size_x - 1, self.size_y - 1);
        let base = self.offset as isize;
        let corners = [
            base,
            base + mx as isize * self.x_step,
            base + my as isize * self.row_stride(),
            base + my as isize * self.row_stride() + mx as isize * self.x_step,
        ];
        for idx in corners {
            if idx < 0 || idx as usize >= len {
                return Err(Error::InvalidConfig(format!(
                    "layout {:?} addresses index {} outside array of length {}",
                    self, idx, len
                )));
            }
        }
        Ok(())
    }
}

/// A fixed-size 2D grid of `f32` values over storage `D`.
#[derive(Clone, Debug, PartialEq)]
pub struct Raster<D = Vec<f32>> {
    data: D,
    layout: RasterLayout,
}

impl Raster<Vec<f32>> {
    /// Creates a contiguous raster filled with zeros.
    pub fn new(size_x: usize, size_y: usize) -> Result<Self> {
        Self::filled(size_x, size_y, 0.0)
    }

    /// Creates a contiguous raster filled with `value`.
    pub fn filled(size_x: usize, size_y: usize, value: f32) -> Result<Self> {
        let layout = RasterLayout::contiguous(size_x, size_y);
        let len = size_x
            .checked_mul(size_y)
            .ok_or_else(|| Error::InvalidConfig("raster size overflows usize".into()))?;
        layout.validate(len)?;
        Ok(Self {
            data: vec![value; len],
            layout,
        })
    }

    /// Wraps row-major values; `data.len()` must equal `size_x * size_y`.
    pub fn from_vec(size_x: usize, size_y: usize, data: Vec<f32>) -> Result<Self> {
        if size_x.checked_mul(size_y) != Some(data.len()) {
            return Err(Error::InvalidConfig(format!(
                "expected {} values for a {}x{} raster, got {}",
                size_x.saturating_mul(size_y),
                size_x,
                size_y,
                data.len()
            )));
        }
        Self::with_layout(data, RasterLayout::contiguous(size_x, size_y))
    }

    /// Creates a contiguous raster with `f(x, y)` in every cell.
    pub fn from_fn(size_x: usize, size_y: usize, mut f: impl FnMut(usize, usize) -> f32) -> Result<Self> {
        let mut raster = Self::new(size_x, size_y)?;
        for (i, v) in raster.data.iter_mut().enumerate() {
            *v = f(i % size_x, i / size_x);
        }
        Ok(raster)
    }
}

impl<D: AsRef<[f32]>> Raster<D> {
    /// Wraps existing storage with an explicit layout.
    pub fn with_layout(data: D, layout: RasterLayout) -> Result<Self> {
        layout.validate(data.as_ref().len())?;
        Ok(Self { data, layout })
    }

    pub fn layout(&self) -> &RasterLayout {
        &self.layout
    }

    pub fn size(&self) -> (usize, usize) {
        self.layout.size()
    }

    pub fn size_x(&self) -> usize {
        self.layout.size_x
    }

    pub fn size_y(&self) -> usize {
        self.layout.size_y
    }

    /// The full cell extent `[0, size_x) x [0, size_y)`.
    pub fn extent(&self) -> CellRect {
        self.layout.extent()
    }

    /// The whole backing array, including values of other channels if interleaved.
    pub fn data(&self) -> &[f32] {
        self.data.as_ref()
    }

    pub fn into_inner(self) -> D {
        self.data
    }

    /// Returns `true` unless the storage is exactly `size_x * size_y` values in row-major
    /// order.
    pub fn is_interleaved(&self) -> bool {
        self.data.as_ref().len() != self.layout.len() || !self.layout.is_contiguous()
    }

    /// Borrows this raster immutably.
    pub fn view(&self) -> RasterRef<'_> {
        Raster {
            data: self.data.as_ref(),
            layout: self.layout,
        }
    }

    #[inline]
    pub(crate) fn at(&self, x: usize, y: usize) -> f32 {
        self.data.as_ref()[self.layout.index(x, y)]
    }

    /// Value at `(x, y)`, or [`Error::OutOfRange`] outside the raster.
    pub fn get(&self, x: usize, y: usize) -> Result<f32> {
        if x >= self.layout.size_x || y >= self.layout.size_y {
            return Err(Error::out_of_range(x as f64, y as f64, self.size()));
        }
        Ok(self.at(x, y))
    }

    /// Bilinear interpolation between the four cells surrounding `(x, y)`.
    ///
    /// Coordinates must lie within `[0, size_x - 1] x [0, size_y - 1]`; there is no implicit
    /// clamping. Integer coordinates return the stored value exactly.
    pub fn get_interpolated(&self, x: f32, y: f32) -> Result<f32> {
        let (sx, sy) = self.size();
        let in_range = |c: f32, n: usize| (0.0..=(n - 1) as f32).contains(&c);
        if !in_range(x, sx) || !in_range(y, sy) {
            return Err(Error::out_of_range(x as f64, y as f64, self.size()));
        }
        let (x0, y0) = (x.floor() as usize, y.floor() as usize);
        let (x1, y1) = ((x0 + 1).min(sx - 1), (y0 + 1).min(sy - 1));
        let (fx, fy) = (x - x0 as f32, y - y0 as f32);

        let top = self.at(x0, y0).lerp(self.at(x1, y0), fx);
        let bottom = self.at(x0, y1).lerp(self.at(x1, y1), fx);
        Ok(top.lerp(bottom, fy))
    }

    /// Values in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        let (sx, sy) = self.size();
        (0..sy).flat_map(move |y| (0..sx).map(move |x| self.at(x, y)))
    }

    /// Copies the values into a new contiguous vector.
    pub fn to_vec(&self) -> Vec<f32> {
        if !self.is_interleaved() {
            return self.data.as_ref().to_vec();
        }
        self.iter().collect()
    }

    /// Copies the values into a new contiguous raster.
    pub fn to_contiguous(&self) -> Raster {
        Raster {
            data: self.to_vec(),
            layout: RasterLayout::contiguous(self.size_x(), self.size_y()),
        }
    }

    /// Smallest and largest value, ignoring NaN.
    pub fn value_range(&self) -> Option<(f32, f32)> {
        self.iter()
            .filter(|v| !v.is_nan())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    fn check_same_size<E: AsRef<[f32]>>(&self, other: &Raster<E>) -> Result<()> {
        if self.size() != other.size() {
            return Err(Error::SizeMismatch {
                expected: self.size(),
                found: other.size(),
            });
        }
        Ok(())
    }
}

impl<D: AsRef<[f32]> + AsMut<[f32]>> Raster<D> {
    /// The whole backing array, mutably.
    pub fn data_mut(&mut self) -> &mut [f32] {
        self.data.as_mut()
    }

    /// The backing array together with the layout addressing it.
    pub fn parts_mut(&mut self) -> (&mut [f32], RasterLayout) {
        (self.data.as_mut(), self.layout)
    }

    /// Borrows this raster mutably.
    pub fn view_mut(&mut self) -> RasterMut<'_> {
        Raster {
            data: self.data.as_mut(),
            layout: self.layout,
        }
    }

    /// Sets the value at `(x, y)`, or returns [`Error::OutOfRange`] outside the raster.
    pub fn set(&mut self, x: usize, y: usize, value: f32) -> Result<()> {
        if x >= self.layout.size_x || y >= self.layout.size_y {
            return Err(Error::out_of_range(x as f64, y as f64, self.size()));
        }
        let idx = self.layout.index(x, y);
        self.data.as_mut()[idx] = value;
        Ok(())
    }

    pub fn fill(&mut self, value: f32) {
        self.map_in_place(|_| value);
    }

    /// `self = self * mul + add` for every cell.
    pub fn multiply_add(&mut self, mul: f32, add: f32) {
        self.map_in_place(|v| v * mul + add);
    }

    /// Copies all values from `other`, which must have the same size.
    pub fn copy_from<E: AsRef<[f32]>>(&mut self, other: &Raster<E>) -> Result<()> {
        self.combine(other, |_, b| b)
    }

    /// Adds `other` cell by cell.
    pub fn add<E: AsRef<[f32]>>(&mut self, other: &Raster<E>) -> Result<()> {
        self.combine(other, |a, b| a + b)
    }

    /// Multiplies by `other` cell by cell.
    pub fn multiply<E: AsRef<[f32]>>(&mut self, other: &Raster<E>) -> Result<()> {
        self.combine(other, |a, b| a * b)
    }

    /// Adds `other * factor` cell by cell.
    pub fn add_scaled<E: AsRef<[f32]>>(&mut self, other: &Raster<E>, factor: f32) -> Result<()> {
        self.combine(other, |a, b| a + b * factor)
    }

    fn map_in_place(&mut self, op: impl Fn(f32) -> f32) {
        if !self.is_interleaved() {
            for v in self.data.as_mut().iter_mut() {
                *v = op(*v);
            }
            return;
        }

        let layout = self.layout;
        let data = self.data.as_mut();
        let mut row = layout.offset as isize;
        for _ in 0..layout.size_y {
            let mut idx = row;
            for _ in 0..layout.size_x {
                let v = &mut data[idx as usize];
                *v = op(*v);
                idx += layout.x_step;
            }
            row += layout.row_stride();
        }
    }

    fn combine<E: AsRef<[f32]>>(&mut self, other: &Raster<E>, op: impl Fn(f32, f32) -> f32) -> Result<()> {
        self.check_same_size(other)?;

        if !self.is_interleaved() && !other.is_interleaved() {
            for (a, b) in self.data.as_mut().iter_mut().zip(other.data.as_ref()) {
                *a = op(*a, *b);
            }
            return Ok(());
        }

        let (dst_layout, src_layout) = (self.layout, other.layout);
        let src = other.data.as_ref();
        let dst = self.data.as_mut();
        let mut dst_row = dst_layout.offset as isize;
        let mut src_row = src_layout.offset as isize;
        for _ in 0..dst_layout.size_y {
            let (mut d, mut s) = (dst_row, src_row);
            for _ in 0..dst_layout.size_x {
                let v = &mut dst[d as usize];
                *v = op(*v, src[s as usize]);
                d += dst_layout.x_step;
                s += src_layout.x_step;
            }
            dst_row += dst_layout.row_stride();
            src_row += src_layout.row_stride();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn ramp(size_x: usize, size_y: usize) -> Raster {
        Raster::from_fn(size_x, size_y, |x, y| (x + 10 * y) as f32).unwrap()
    }

    /// Two channels interleaved in one array; returns the array with channel 1 holding `ramp`.
    fn interleaved_ramp(size_x: usize, size_y: usize) -> Vec<f32> {
        let mut data = vec![-1.0; size_x * size_y * 2];
        let layout = RasterLayout::interleaved(size_x, size_y, 1, 2);
        for y in 0..size_y {
            for x in 0..size_x {
                data[layout.index(x, y)] = (x + 10 * y) as f32;
            }
        }
        data
    }

    #[test]
    fn new_initializes_with_zeroes() {
        let raster = Raster::new(3, 2).unwrap();
        assert_eq!(raster.size(), (3, 2));
        assert!(raster.data().iter().all(|v| *v == 0.0));
        assert!(!raster.is_interleaved());
    }

    #[test]
    fn rejects_non_positive_sizes() {
        assert!(matches!(Raster::new(0, 4), Err(Error::InvalidConfig(_))));
        assert!(matches!(Raster::new(4, 0), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn from_vec_checks_length() {
        assert!(Raster::from_vec(2, 2, vec![0.0; 3]).is_err());
        assert!(Raster::from_vec(2, 2, vec![0.0; 4]).is_ok());
    }

    #[test]
    fn layout_rejects_zero_step_and_overflowing_indices() {
        let mut layout = RasterLayout::contiguous(2, 2);
        layout.x_step = 0;
        assert!(layout.validate(4).is_err());

        let layout = RasterLayout::interleaved(2, 2, 2, 3);
        assert!(layout.validate(12).is_ok());
        assert!(layout.validate(11).is_err());
    }

    #[test]
    fn layout_supports_negative_x_step() {
        // Rows stored right to left.
        let layout = RasterLayout {
            size_x: 3,
            size_y: 2,
            offset: 2,
            x_step: -1,
            y_skip: 6,
        };
        let raster = Raster::with_layout(vec![2.0, 1.0, 0.0, 12.0, 11.0, 10.0], layout).unwrap();
        assert_eq!(raster.get(0, 0).unwrap(), 0.0);
        assert_eq!(raster.get(2, 1).unwrap(), 12.0);
        assert!(raster.is_interleaved());
    }

    #[test]
    fn get_and_set_are_bounds_checked() {
        let mut raster = Raster::new(2, 3).unwrap();
        raster.set(1, 2, 5.0).unwrap();
        assert_eq!(raster.get(1, 2).unwrap(), 5.0);
        assert!(matches!(raster.get(2, 0), Err(Error::OutOfRange { .. })));
        assert!(matches!(raster.set(0, 3, 1.0), Err(Error::OutOfRange { .. })));
    }

    #[test]
    fn interleaved_view_reads_its_channel_only() {
        let data = interleaved_ramp(3, 2);
        let view = Raster::with_layout(&data[..], RasterLayout::interleaved(3, 2, 1, 2)).unwrap();
        assert!(view.is_interleaved());
        assert_eq!(view.to_vec(), ramp(3, 2).to_vec());
        assert_eq!(view.get(2, 1).unwrap(), 12.0);
    }

    #[test]
    fn interpolation_is_exact_on_grid_points() {
        let raster = Raster::from_fn(4, 3, |x, y| ((x * 7 + y * 3) % 5) as f32 * 0.37).unwrap();
        for y in 0..3 {
            for x in 0..4 {
                assert_eq!(
                    raster.get_interpolated(x as f32, y as f32).unwrap(),
                    raster.get(x, y).unwrap()
                );
            }
        }
    }

    #[test]
    fn interpolation_blends_neighbors() {
        let raster = Raster::from_vec(2, 2, vec![0.0, 1.0, 2.0, 3.0]).unwrap();
        assert_eq!(raster.get_interpolated(0.5, 0.0).unwrap(), 0.5);
        assert_eq!(raster.get_interpolated(0.5, 0.5).unwrap(), 1.5);
        assert_eq!(raster.get_interpolated(1.0, 1.0).unwrap(), 3.0);
    }

    #[test]
    fn interpolation_outside_range_is_an_error() {
        let raster = Raster::new(2, 2).unwrap();
        assert!(raster.get_interpolated(-0.01, 0.0).is_err());
        assert!(raster.get_interpolated(0.0, 1.01).is_err());
        assert!(raster.get_interpolated(f32::NAN, 0.0).is_err());
    }

    #[test]
    fn bulk_ops_match_between_contiguous_and_interleaved() {
        let mut contiguous = ramp(4, 3);
        let mut backing = interleaved_ramp(4, 3);
        let other = Raster::from_fn(4, 3, |x, y| 0.5 + (x * y) as f32).unwrap();

        {
            let mut strided =
                Raster::with_layout(&mut backing[..], RasterLayout::interleaved(4, 3, 1, 2))
                    .unwrap();
            contiguous.add(&other).unwrap();
            strided.add(&other).unwrap();
            contiguous.multiply(&other).unwrap();
            strided.multiply(&other).unwrap();
            contiguous.multiply_add(2.0, -1.0);
            strided.multiply_add(2.0, -1.0);
            contiguous.add_scaled(&other, 0.25).unwrap();
            strided.add_scaled(&other, 0.25).unwrap();
            assert_eq!(contiguous.to_vec(), strided.to_vec());
        }

        // The other channel is untouched.
        assert!(backing.iter().step_by(2).all(|v| *v == -1.0));
    }

    #[test]
    fn copy_from_strided_into_contiguous() {
        let backing = interleaved_ramp(3, 3);
        let src = Raster::with_layout(&backing[..], RasterLayout::interleaved(3, 3, 1, 2)).unwrap();
        let mut dst = Raster::new(3, 3).unwrap();
        dst.copy_from(&src).unwrap();
        assert_eq!(dst, ramp(3, 3));
    }

    #[test]
    fn binary_ops_reject_size_mismatch() {
        let mut a = Raster::new(2, 2).unwrap();
        let b = Raster::new(2, 3).unwrap();
        let err = a.add(&b).unwrap_err();
        assert_eq!(
            err,
            Error::SizeMismatch {
                expected: (2, 2),
                found: (2, 3)
            }
        );
    }

    #[test]
    fn value_range_skips_nan() {
        let raster = Raster::from_vec(2, 2, vec![3.0, f32::NAN, -1.0, 2.0]).unwrap();
        assert_eq!(raster.value_range(), Some((-1.0, 3.0)));
    }

    proptest! {
        #[test]
        fn interpolation_reproduces_planes(
            a in -10.0f32..10.0,
            b in -10.0f32..10.0,
            c in -10.0f32..10.0,
            x in 0.0f32..5.0,
            y in 0.0f32..3.0,
        ) {
            let raster = Raster::from_fn(6, 4, |ix, iy| a * ix as f32 + b * iy as f32 + c).unwrap();
            let expected = a * x + b * y + c;
            let got = raster.get_interpolated(x, y).unwrap();
            prop_assert!((got - expected).abs() < 1e-3, "got {got}, expected {expected}");
        }

        #[test]
        fn strided_and_contiguous_fill_agree(
            size_x in 1usize..6,
            size_y in 1usize..6,
            mul in -3.0f32..3.0,
            add in -3.0f32..3.0,
        ) {
            let mut contiguous = Raster::from_fn(size_x, size_y, |x, y| (x * 3 + y) as f32).unwrap();
            let mut backing = vec![0.0; size_x * size_y * 3];
            let mut strided = Raster::with_layout(
                &mut backing[..],
                RasterLayout::interleaved(size_x, size_y, 2, 3),
            ).unwrap();
            strided.copy_from(&contiguous).unwrap();
            contiguous.multiply_add(mul, add);
            strided.multiply_add(mul, add);
            prop_assert_eq!(contiguous.to_vec(), strided.to_vec());
        }
    }
}
