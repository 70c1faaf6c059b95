//! Rendering fields into raster storage.
//!
//! A render walks a rectangle of target cells row by row, maps every cell back to a point in
//! a source rectangle of the field, samples the field there, and writes the result into one
//! or more arrays according to each channel's [`RasterLayout`]. The first and last target
//! column/row map exactly onto the source rectangle's min/max.
//!
//! [`render_with`] is the single generic loop. The sampling strategy is a closure that fills
//! one value per channel for a source point, so single-channel fields, multi-channel fields,
//! and custom inner loops all share it. [`render_field`] and [`render_multi_field`] are the
//! convenience entry points over [`Raster`] and [`MultiRaster`].
use std::time::Instant;

use glam::Vec2;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::area::{CellRect, Rect};
use crate::channel::ChannelId;
use crate::error::{Error, Result};
use crate::field::Field;
use crate::multi_field::MultiField;
use crate::multi_raster::MultiRaster;
use crate::progress::ProgressSink;
use crate::raster::{Raster, RasterLayout};

/// Progress is reported roughly this many times per render by default.
pub const DEFAULT_PROGRESS_REPORTS: usize = 20;

/// Which part of a field is rendered into which part of a raster.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RenderRequest {
    /// Source rectangle in field coordinates. Defaults to [`Rect::UNIT`].
    pub source: Option<Rect>,
    /// Target cells. Defaults to the full raster.
    pub target: Option<CellRect>,
    /// Rows between progress reports. Defaults to `rows / 20 + 1`.
    pub progress_interval: Option<usize>,
}

impl RenderRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the source rectangle.
    pub fn with_source(mut self, source: Rect) -> Self {
        self.source = Some(source);
        self
    }

    /// Sets the target cell rectangle.
    pub fn with_target(mut self, target: CellRect) -> Self {
        self.target = Some(target);
        self
    }

    /// Sets the number of rows between progress reports.
    pub fn with_progress_interval(mut self, rows: usize) -> Self {
        self.progress_interval = Some(rows);
        self
    }

    /// Validates the request against a raster of `extent` cells and resolves defaults.
    pub fn resolve(&self, extent: (usize, usize)) -> Result<RenderPlan> {
        RenderPlan::new(self, extent)
    }

    /// Checks the request against a raster of `extent` cells without rendering.
    pub fn validate(&self, extent: (usize, usize)) -> Result<()> {
        self.resolve(extent).map(|_| ())
    }
}

/// How a render call ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderOutcome {
    /// Every target row was rendered.
    Completed,
    /// The progress sink stopped the render after `rows_rendered` rows.
    Cancelled { rows_rendered: usize },
}

impl RenderOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, RenderOutcome::Completed)
    }

    pub fn is_cancelled(&self) -> bool {
        !self.is_completed()
    }
}

/// Destination of one channel: an index into the render's array list plus the layout that
/// addresses the channel's cells inside that array.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelTarget {
    pub array: usize,
    pub layout: RasterLayout,
}

impl ChannelTarget {
    pub fn new(array: usize, layout: RasterLayout) -> Self {
        Self { array, layout }
    }
}

/// Arrays and per-channel destinations lent out by a [`MultiRaster`] for one render.
///
/// Composite storage lends one array per channel; interleaved storage lends a single array
/// that every channel target points into.
pub struct RenderTargets<'a> {
    pub arrays: Vec<&'a mut [f32]>,
    pub channels: Vec<ChannelTarget>,
}

/// Resolved geometry of a render pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderPlan {
    pub source: Rect,
    pub target: CellRect,
    /// Source units per target cell along each axis. Zero on single-cell axes.
    pub step: Vec2,
    /// Mean step scaled by the source's average side length. Zero when both axes are
    /// single-cell.
    pub sample_radius: f32,
    /// Rows between progress reports. Must be at least 1.
    pub progress_interval: usize,
}

impl RenderPlan {
    fn new(request: &RenderRequest, extent: (usize, usize)) -> Result<Self> {
        let source = request.source.unwrap_or(Rect::UNIT);
        if source.is_empty() || !source.size().is_finite() {
            return Err(Error::InvalidConfig(format!(
                "source rectangle must have a positive finite area, got {:?}",
                source
            )));
        }

        let full = CellRect::full(extent.0, extent.1);
        let target = request.target.unwrap_or(full);
        if target.is_empty() {
            return Err(Error::InvalidConfig("target rectangle is empty".into()));
        }
        if !full.contains_rect(&target) {
            return Err(Error::InvalidConfig(format!(
                "target {:?} is not contained in raster extent {}x{}",
                target, extent.0, extent.1
            )));
        }

        let size = source.size();
        let step = Vec2::new(
            axis_step(size.x, target.size_x),
            axis_step(size.y, target.size_y),
        );
        let sample_radius = 0.5 * (step.x + step.y) * source.size_average();

        let progress_interval = request
            .progress_interval
            .unwrap_or(target.size_y / DEFAULT_PROGRESS_REPORTS + 1)
            .max(1);

        Ok(Self {
            source,
            target,
            step,
            sample_radius,
            progress_interval,
        })
    }

    /// Source x of target column `i` (relative to the target rectangle).
    #[inline]
    pub fn source_x(&self, i: usize) -> f32 {
        self.source.min.x + i as f32 * self.step.x
    }

    /// Source y of target row `j` (relative to the target rectangle).
    #[inline]
    pub fn source_y(&self, j: usize) -> f32 {
        self.source.min.y + j as f32 * self.step.y
    }
}

// A single target cell along an axis samples the source start exactly.
fn axis_step(span: f32, cells: usize) -> f32 {
    if cells > 1 {
        span / (cells - 1) as f32
    } else {
        0.0
    }
}

fn validate_targets(plan: &RenderPlan, arrays: &[&mut [f32]], channels: &[ChannelTarget]) -> Result<()> {
    if plan.progress_interval == 0 {
        return Err(Error::InvalidConfig("progress interval must be at least one row".into()));
    }
    let Some(first) = channels.first() else {
        return Err(Error::InvalidConfig("render needs at least one channel target".into()));
    };
    for ch in channels {
        if ch.layout.size() != first.layout.size() {
            return Err(Error::SizeMismatch {
                expected: first.layout.size(),
                found: ch.layout.size(),
            });
        }
        let array = arrays.get(ch.array).ok_or_else(|| {
            Error::InvalidConfig(format!(
                "channel target refers to array {} but only {} arrays were given",
                ch.array,
                arrays.len()
            ))
        })?;
        ch.layout.validate(array.len())?;
        if !ch.layout.extent().contains_rect(&plan.target) {
            return Err(Error::InvalidConfig(format!(
                "target {:?} is not contained in raster extent {}x{}",
                plan.target, ch.layout.size_x, ch.layout.size_y
            )));
        }
    }
    Ok(())
}

/// Renders `plan` into `arrays` using `sampler` for every target cell.
///
/// `sampler(p, sample_radius, out)` must write one value per channel target into `out`, in
/// the order of `channels`. Progress is reported to `progress` every
/// `plan.progress_interval` rows and after the last row.
pub fn render_with<S, P>(
    plan: &RenderPlan,
    arrays: &mut [&mut [f32]],
    channels: &[ChannelTarget],
    mut sampler: S,
    progress: &mut P,
) -> Result<RenderOutcome>
where
    S: FnMut(Vec2, f32, &mut [f32]),
    P: ProgressSink + ?Sized,
{
    validate_targets(plan, arrays, channels)?;

    let target = plan.target;
    let started = Instant::now();
    debug!(
        "Rendering {}x{} cells at ({}, {}) from {:?} into {} channel(s).",
        target.size_x,
        target.size_y,
        target.x,
        target.y,
        plan.source,
        channels.len()
    );

    let xs: Vec<f32> = (0..target.size_x).map(|i| plan.source_x(i)).collect();
    let mut values = vec![0.0f32; channels.len()];
    let mut row_start: Vec<isize> = channels
        .iter()
        .map(|ch| ch.layout.index(target.x, target.y) as isize)
        .collect();
    let mut cursor = row_start.clone();

    for j in 0..target.size_y {
        let y = plan.source_y(j);
        cursor.copy_from_slice(&row_start);

        for &x in &xs {
            sampler(Vec2::new(x, y), plan.sample_radius, &mut values);
            for ((ch, idx), value) in channels.iter().zip(cursor.iter_mut()).zip(&values) {
                arrays[ch.array][*idx as usize] = *value;
                *idx += ch.layout.x_step;
            }
        }

        for (ch, start) in channels.iter().zip(row_start.iter_mut()) {
            *start += ch.layout.row_stride();
        }

        let rows_done = j + 1;
        if rows_done % plan.progress_interval == 0 || rows_done == target.size_y {
            let fraction = rows_done as f32 / target.size_y as f32;
            if progress.report(fraction).is_break() {
                debug!(
                    "Render cancelled after {}/{} rows.",
                    rows_done, target.size_y
                );
                return Ok(RenderOutcome::Cancelled {
                    rows_rendered: rows_done,
                });
            }
        }
    }

    debug!(
        "Rendered {} cells in {:?}.",
        target.size_x * target.size_y,
        started.elapsed()
    );
    Ok(RenderOutcome::Completed)
}

/// Renders a single-channel field into a raster.
pub fn render_field<F, D, P>(
    field: &F,
    raster: &mut Raster<D>,
    request: &RenderRequest,
    progress: &mut P,
) -> Result<RenderOutcome>
where
    F: Field + ?Sized,
    D: AsRef<[f32]> + AsMut<[f32]>,
    P: ProgressSink,
{
    let (data, layout) = raster.parts_mut();
    field.render_to_array(data, layout, request, progress)
}

/// Renders several channels of a multi-field into a multi-raster in one pass.
///
/// With `channels == None` every raster channel the field supports is rendered.
pub fn render_multi_field<M, R, P>(
    field: &M,
    raster: &mut R,
    channels: Option<&[ChannelId]>,
    request: &RenderRequest,
    progress: &mut P,
) -> Result<RenderOutcome>
where
    M: MultiField + ?Sized,
    R: MultiRaster + ?Sized,
    P: ProgressSink,
{
    let selected: Vec<ChannelId> = match channels {
        Some(ids) => ids.to_vec(),
        None => raster
            .channels()
            .into_iter()
            .filter(|id| field.supports(*id))
            .collect(),
    };
    let mut targets = raster.render_targets(&selected)?;
    field.render_to_arrays(
        &selected,
        &mut targets.arrays,
        &targets.channels,
        request,
        progress,
    )
}
