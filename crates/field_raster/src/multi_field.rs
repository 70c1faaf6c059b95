//! Continuous multi-channel fields.
//!
//! A [`MultiField`] samples several named channels at the same point. Rendering evaluates
//! every requested channel per target cell in a single pass over the target area, through
//! [`MultiField::sample_channels`], which implementations may override with a faster inner
//! loop (for example to share work between channels).
//!
//! [`MultiFieldChannels`] exposes each channel of a shared multi-field as an independent
//! [`Field`], creating the per-channel views lazily and caching them.
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use glam::Vec2;
use tracing::trace;

use crate::channel::ChannelId;
use crate::error::{Error, Result};
use crate::field::Field;
use crate::progress::ProgressSink;
use crate::render::{render_with, ChannelTarget, RenderOutcome, RenderRequest};

/// A continuous function of 2D coordinates with several named channels.
pub trait MultiField: Send + Sync {
    /// The channels this field can sample.
    fn channels(&self) -> &[ChannelId];

    fn supports(&self, id: ChannelId) -> bool {
        self.channels().contains(&id)
    }

    /// Samples `channel` at `p`. Unsupported channels sample as `0.0`.
    fn sample(&self, p: Vec2, channel: ChannelId, sample_radius: f32) -> f32;

    /// Samples every channel in `channels` at `p` into `out` (same length and order).
    fn sample_channels(&self, p: Vec2, channels: &[ChannelId], sample_radius: f32, out: &mut [f32]) {
        for (id, value) in channels.iter().zip(out.iter_mut()) {
            *value = self.sample(p, *id, sample_radius);
        }
    }

    /// Renders `channels` into `arrays`, channel `i` going to `targets[i]`.
    ///
    /// `targets` must have one entry per channel, every channel must be supported, and every
    /// target layout must fit inside the array it points at.
    fn render_to_arrays(
        &self,
        channels: &[ChannelId],
        arrays: &mut [&mut [f32]],
        targets: &[ChannelTarget],
        request: &RenderRequest,
        progress: &mut dyn ProgressSink,
    ) -> Result<RenderOutcome> {
        if targets.len() != channels.len() {
            return Err(Error::InvalidConfig(format!(
                "{} channels requested but {} targets given",
                channels.len(),
                targets.len()
            )));
        }
        if let Some(id) = channels.iter().find(|id| !self.supports(**id)) {
            return Err(Error::MissingChannel { id: id.to_string() });
        }
        let Some(first) = targets.first() else {
            return Err(Error::InvalidConfig("no channels requested".into()));
        };
        let plan = request.resolve(first.layout.size())?;
        render_with(
            &plan,
            arrays,
            targets,
            |p, radius, out| self.sample_channels(p, channels, radius, out),
            progress,
        )
    }
}

impl<M: MultiField + ?Sized> MultiField for &M {
    fn channels(&self) -> &[ChannelId] {
        (**self).channels()
    }

    fn supports(&self, id: ChannelId) -> bool {
        (**self).supports(id)
    }

    fn sample(&self, p: Vec2, channel: ChannelId, sample_radius: f32) -> f32 {
        (**self).sample(p, channel, sample_radius)
    }

    fn sample_channels(&self, p: Vec2, channels: &[ChannelId], sample_radius: f32, out: &mut [f32]) {
        (**self).sample_channels(p, channels, sample_radius, out)
    }

    fn render_to_arrays(
        &self,
        channels: &[ChannelId],
        arrays: &mut [&mut [f32]],
        targets: &[ChannelTarget],
        request: &RenderRequest,
        progress: &mut dyn ProgressSink,
    ) -> Result<RenderOutcome> {
        (**self).render_to_arrays(channels, arrays, targets, request, progress)
    }
}

impl<M: MultiField + ?Sized> MultiField for Arc<M> {
    fn channels(&self) -> &[ChannelId] {
        (**self).channels()
    }

    fn supports(&self, id: ChannelId) -> bool {
        (**self).supports(id)
    }

    fn sample(&self, p: Vec2, channel: ChannelId, sample_radius: f32) -> f32 {
        (**self).sample(p, channel, sample_radius)
    }

    fn sample_channels(&self, p: Vec2, channels: &[ChannelId], sample_radius: f32, out: &mut [f32]) {
        (**self).sample_channels(p, channels, sample_radius, out)
    }

    fn render_to_arrays(
        &self,
        channels: &[ChannelId],
        arrays: &mut [&mut [f32]],
        targets: &[ChannelTarget],
        request: &RenderRequest,
        progress: &mut dyn ProgressSink,
    ) -> Result<RenderOutcome> {
        (**self).render_to_arrays(channels, arrays, targets, request, progress)
    }
}

/// One channel of a shared multi-field, viewed as a single-channel [`Field`].
pub struct ChannelField<M: ?Sized> {
    source: Arc<M>,
    channel: ChannelId,
}

impl<M: MultiField + ?Sized> ChannelField<M> {
    pub fn new(source: Arc<M>, channel: ChannelId) -> Self {
        Self { source, channel }
    }

    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    pub fn source(&self) -> &Arc<M> {
        &self.source
    }
}

impl<M: MultiField + ?Sized> Field for ChannelField<M> {
    #[inline]
    fn sample(&self, p: Vec2, sample_radius: f32) -> f32 {
        self.source.sample(p, self.channel, sample_radius)
    }
}

/// A shared multi-field with lazily created, cached per-channel [`Field`] views.
///
/// Concurrent callers asking for the same uncached channel may each build a view; the first
/// one inserted is kept and returned to everyone.
pub struct MultiFieldChannels<M: ?Sized> {
    inner: Arc<M>,
    cache: RwLock<HashMap<ChannelId, Arc<ChannelField<M>>>>,
}

impl<M: MultiField> MultiFieldChannels<M> {
    pub fn new(field: M) -> Self {
        Self::from_arc(Arc::new(field))
    }
}

impl<M: MultiField + ?Sized> MultiFieldChannels<M> {
    pub fn from_arc(inner: Arc<M>) -> Self {
        Self {
            inner,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &Arc<M> {
        &self.inner
    }

    /// The cached field view of channel `id`, or [`Error::MissingChannel`] if the field does
    /// not support it.
    pub fn channel(&self, id: ChannelId) -> Result<Arc<ChannelField<M>>> {
        if !self.inner.supports(id) {
            return Err(Error::MissingChannel { id: id.to_string() });
        }

        {
            let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());
            if let Some(view) = cache.get(&id) {
                return Ok(Arc::clone(view));
            }
        }

        let candidate = Arc::new(ChannelField::new(Arc::clone(&self.inner), id));
        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        let view = cache.entry(id).or_insert_with(|| {
            trace!("Created field view for channel '{}'.", id);
            candidate
        });
        Ok(Arc::clone(view))
    }

    /// Number of channel views created so far.
    pub fn cached_len(&self) -> usize {
        self.cache.read().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl<M: MultiField + ?Sized> MultiField for MultiFieldChannels<M> {
    fn channels(&self) -> &[ChannelId] {
        self.inner.channels()
    }

    fn supports(&self, id: ChannelId) -> bool {
        self.inner.supports(id)
    }

    fn sample(&self, p: Vec2, channel: ChannelId, sample_radius: f32) -> f32 {
        self.inner.sample(p, channel, sample_radius)
    }

    fn sample_channels(&self, p: Vec2, channels: &[ChannelId], sample_radius: f32, out: &mut [f32]) {
        self.inner.sample_channels(p, channels, sample_radius, out)
    }

    fn render_to_arrays(
        &self,
        channels: &[ChannelId],
        arrays: &mut [&mut [f32]],
        targets: &[ChannelTarget],
        request: &RenderRequest,
        progress: &mut dyn ProgressSink,
    ) -> Result<RenderOutcome> {
        self.inner.render_to_arrays(channels, arrays, targets, request, progress)
    }
}

/// A multi-field backed by a closure `f(p, channel, sample_radius)`.
#[derive(Clone)]
pub struct FnMultiField<F>
where
    F: Fn(Vec2, ChannelId, f32) -> f32 + Send + Sync,
{
    channels: Vec<ChannelId>,
    f: F,
}

impl<F> FnMultiField<F>
where
    F: Fn(Vec2, ChannelId, f32) -> f32 + Send + Sync,
{
    pub fn new(channels: impl Into<Vec<ChannelId>>, f: F) -> Self {
        Self {
            channels: channels.into(),
            f,
        }
    }
}

impl<F> MultiField for FnMultiField<F>
where
    F: Fn(Vec2, ChannelId, f32) -> f32 + Send + Sync,
{
    fn channels(&self) -> &[ChannelId] {
        &self.channels
    }

    #[inline]
    fn sample(&self, p: Vec2, channel: ChannelId, sample_radius: f32) -> f32 {
        if !self.supports(channel) {
            return 0.0;
        }
        (self.f)(p, channel, sample_radius)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    use super::*;
    use crate::raster::RasterLayout;

    fn rg() -> (ChannelId, ChannelId) {
        (ChannelId::new("red").unwrap(), ChannelId::new("green").unwrap())
    }

    fn gradient() -> FnMultiField<impl Fn(Vec2, ChannelId, f32) -> f32 + Send + Sync + Clone> {
        let (r, _) = rg();
        FnMultiField::new(vec![rg().0, rg().1], move |p, ch, _| {
            if ch == r {
                p.x
            } else {
                p.y
            }
        })
    }

    #[test]
    fn unsupported_channel_samples_zero() {
        let field = gradient();
        let other = ChannelId::new("blue").unwrap();
        assert!(!field.supports(other));
        assert_eq!(field.sample(Vec2::new(3.0, 4.0), other, 0.0), 0.0);
    }

    #[test]
    fn channel_views_are_cached() {
        let (r, g) = rg();
        let channels = MultiFieldChannels::new(gradient());
        let a = channels.channel(r).unwrap();
        let b = channels.channel(r).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(channels.cached_len(), 1);

        let green = channels.channel(g).unwrap();
        assert_eq!(green.sample_point(Vec2::new(3.0, 4.0)), 4.0);
        assert_eq!(a.sample_point(Vec2::new(3.0, 4.0)), 3.0);
    }

    #[test]
    fn missing_channel_view_is_an_error() {
        let channels = MultiFieldChannels::new(gradient());
        let err = channels.channel(ChannelId::new("blue").unwrap()).err().unwrap();
        assert!(matches!(err, Error::MissingChannel { .. }));
    }

    #[test]
    fn concurrent_channel_requests_share_one_view() {
        let (r, _) = rg();
        let channels = Arc::new(MultiFieldChannels::new(gradient()));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let channels = Arc::clone(&channels);
                thread::spawn(move || channels.channel(r).unwrap())
            })
            .collect();
        let views: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(views.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(channels.cached_len(), 1);
    }

    #[test]
    fn render_to_arrays_checks_target_count() {
        let (r, g) = rg();
        let field = gradient();
        let mut data = vec![0.0; 4];
        let targets = [ChannelTarget::new(0, RasterLayout::contiguous(2, 2))];
        let err = field
            .render_to_arrays(&[r, g], &mut [&mut data[..]], &targets, &RenderRequest::new(), &mut ())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn render_to_arrays_rejects_unsupported_channel() {
        let field = gradient();
        let blue = ChannelId::new("blue").unwrap();
        let mut data = vec![0.0; 4];
        let targets = [ChannelTarget::new(0, RasterLayout::contiguous(2, 2))];
        let err = field
            .render_to_arrays(&[blue], &mut [&mut data[..]], &targets, &RenderRequest::new(), &mut ())
            .unwrap_err();
        assert!(matches!(err, Error::MissingChannel { .. }));
    }

    struct CountingField {
        channels: Vec<ChannelId>,
        batched_calls: AtomicUsize,
    }

    impl MultiField for CountingField {
        fn channels(&self) -> &[ChannelId] {
            &self.channels
        }

        fn sample(&self, _p: Vec2, _channel: ChannelId, _sample_radius: f32) -> f32 {
            unreachable!("rendering goes through sample_channels")
        }

        fn sample_channels(&self, p: Vec2, channels: &[ChannelId], _r: f32, out: &mut [f32]) {
            self.batched_calls.fetch_add(1, Ordering::Relaxed);
            for (i, value) in out.iter_mut().enumerate().take(channels.len()) {
                *value = p.x + i as f32;
            }
        }
    }

    #[test]
    fn render_uses_overridden_inner_loop() {
        let (r, g) = rg();
        let field = CountingField {
            channels: vec![r, g],
            batched_calls: AtomicUsize::new(0),
        };
        let mut data = vec![0.0; 2 * 3 * 2];
        let targets = [
            ChannelTarget::new(0, RasterLayout::interleaved(3, 2, 0, 2)),
            ChannelTarget::new(0, RasterLayout::interleaved(3, 2, 1, 2)),
        ];
        field
            .render_to_arrays(&[r, g], &mut [&mut data[..]], &targets, &RenderRequest::new(), &mut ())
            .unwrap();
        assert_eq!(field.batched_calls.load(Ordering::Relaxed), 6);
        assert_eq!(&data[..6], &[0.0, 1.0, 0.5, 1.5, 1.0, 2.0]);
    }

    struct Sparse {
        listed: Vec<ChannelId>,
    }

    impl MultiField for Sparse {
        fn channels(&self) -> &[ChannelId] {
            &self.listed
        }

        fn supports(&self, _id: ChannelId) -> bool {
            true
        }

        fn sample(&self, p: Vec2, _channel: ChannelId, _sample_radius: f32) -> f32 {
            p.x
        }

        fn render_to_arrays(
            &self,
            _channels: &[ChannelId],
            arrays: &mut [&mut [f32]],
            _targets: &[ChannelTarget],
            _request: &RenderRequest,
            _progress: &mut dyn ProgressSink,
        ) -> Result<RenderOutcome> {
            for array in arrays.iter_mut() {
                array.fill(-2.0);
            }
            Ok(RenderOutcome::Completed)
        }
    }

    #[test]
    fn wrappers_forward_supports_and_render() {
        let blue = ChannelId::new("blue").unwrap();
        let shared = Arc::new(Sparse { listed: Vec::new() });
        let cached = MultiFieldChannels::new(Sparse { listed: Vec::new() });
        fn supports_via<M: MultiField>(field: M, id: ChannelId) -> bool {
            field.supports(id)
        }
        assert!(supports_via(Arc::clone(&shared), blue));
        assert!(supports_via(&*shared, blue));
        assert!(supports_via(&cached, blue));
        assert!(cached.channel(blue).is_ok());

        let targets = [ChannelTarget::new(0, RasterLayout::contiguous(2, 2))];
        let mut data = vec![0.0; 4];
        shared
            .render_to_arrays(&[blue], &mut [&mut data[..]], &targets, &RenderRequest::new(), &mut ())
            .unwrap();
        assert!(data.iter().all(|&v| v == -2.0));

        let mut data = vec![0.0; 4];
        cached
            .render_to_arrays(&[blue], &mut [&mut data[..]], &targets, &RenderRequest::new(), &mut ())
            .unwrap();
        assert!(data.iter().all(|&v| v == -2.0));
    }
}
