//! Continuous single-channel fields.
//!
//! A [`Field`] is a function `(p, sample_radius) -> value` over a continuous 2D space.
//! `sample_radius == 0` asks for a point sample; a positive radius hints that the caller
//! renders at a resolution where one output cell covers roughly that neighborhood, so the
//! field may return a smoothed value. Fields are free to ignore the hint.
use std::sync::Arc;

use glam::Vec2;

use crate::error::Result;
use crate::progress::ProgressSink;
use crate::raster::RasterLayout;
use crate::render::{render_with, ChannelTarget, RenderOutcome, RenderRequest};

/// A continuous scalar function of 2D coordinates.
pub trait Field: Send + Sync {
    /// Samples the field at `p`, averaging over roughly `sample_radius` if supported.
    fn sample(&self, p: Vec2, sample_radius: f32) -> f32;

    /// Samples the field at `p` with maximum precision.
    #[inline]
    fn sample_point(&self, p: Vec2) -> f32 {
        self.sample(p, 0.0)
    }

    /// Renders the requested source rectangle into the cells of `data` addressed by
    /// `layout`.
    ///
    /// Cells outside the request's target rectangle are left untouched. Returns
    /// [`RenderOutcome::Cancelled`] if `progress` stops the render early.
    fn render_to_array(
        &self,
        data: &mut [f32],
        layout: RasterLayout,
        request: &RenderRequest,
        progress: &mut dyn ProgressSink,
    ) -> Result<RenderOutcome> {
        let plan = request.resolve(layout.size())?;
        render_with(
            &plan,
            &mut [data],
            &[ChannelTarget::new(0, layout)],
            |p, radius, out| out[0] = self.sample(p, radius),
            progress,
        )
    }
}

impl<F: Field + ?Sized> Field for &F {
    #[inline]
    fn sample(&self, p: Vec2, sample_radius: f32) -> f32 {
        (**self).sample(p, sample_radius)
    }

    fn render_to_array(
        &self,
        data: &mut [f32],
        layout: RasterLayout,
        request: &RenderRequest,
        progress: &mut dyn ProgressSink,
    ) -> Result<RenderOutcome> {
        (**self).render_to_array(data, layout, request, progress)
    }
}

impl<F: Field + ?Sized> Field for Box<F> {
    #[inline]
    fn sample(&self, p: Vec2, sample_radius: f32) -> f32 {
        (**self).sample(p, sample_radius)
    }

    fn render_to_array(
        &self,
        data: &mut [f32],
        layout: RasterLayout,
        request: &RenderRequest,
        progress: &mut dyn ProgressSink,
    ) -> Result<RenderOutcome> {
        (**self).render_to_array(data, layout, request, progress)
    }
}

impl<F: Field + ?Sized> Field for Arc<F> {
    #[inline]
    fn sample(&self, p: Vec2, sample_radius: f32) -> f32 {
        (**self).sample(p, sample_radius)
    }

    fn render_to_array(
        &self,
        data: &mut [f32],
        layout: RasterLayout,
        request: &RenderRequest,
        progress: &mut dyn ProgressSink,
    ) -> Result<RenderOutcome> {
        (**self).render_to_array(data, layout, request, progress)
    }
}

/// A field with the same value everywhere.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConstantField(pub f32);

impl Field for ConstantField {
    #[inline]
    fn sample(&self, _p: Vec2, _sample_radius: f32) -> f32 {
        self.0
    }
}

/// A field backed by a closure `f(p, sample_radius)`.
#[derive(Clone)]
pub struct FnField<F>
where
    F: Fn(Vec2, f32) -> f32 + Send + Sync,
{
    f: F,
}

impl<F> FnField<F>
where
    F: Fn(Vec2, f32) -> f32 + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> Field for FnField<F>
where
    F: Fn(Vec2, f32) -> f32 + Send + Sync,
{
    #[inline]
    fn sample(&self, p: Vec2, sample_radius: f32) -> f32 {
        (self.f)(p, sample_radius)
    }
}
