//! Progress reporting and cooperative cancellation for render calls.
//!
//! A render loop reports its fractional progress to a [`ProgressSink`] between rows. The
//! sink answers with [`ControlFlow::Continue`] to keep going or [`ControlFlow::Break`] to
//! stop the render early. Stopping is not an error; the render returns
//! [`crate::render::RenderOutcome::Cancelled`].
use std::ops::ControlFlow;

/// Receives render progress in `(0, 1]` and decides whether to continue.
pub trait ProgressSink {
    fn report(&mut self, progress: f32) -> ControlFlow<()>;
}

/// A sink that ignores progress and never cancels.
impl ProgressSink for () {
    #[inline]
    fn report(&mut self, _progress: f32) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }
}

impl<S: ProgressSink + ?Sized> ProgressSink for &mut S {
    #[inline]
    fn report(&mut self, progress: f32) -> ControlFlow<()> {
        (**self).report(progress)
    }
}

/// A sink that forwards to a user-provided closure.
pub struct FnProgress<F>
where
    F: FnMut(f32) -> ControlFlow<()>,
{
    f: F,
}

impl<F> FnProgress<F>
where
    F: FnMut(f32) -> ControlFlow<()>,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> ProgressSink for FnProgress<F>
where
    F: FnMut(f32) -> ControlFlow<()>,
{
    #[inline]
    fn report(&mut self, progress: f32) -> ControlFlow<()> {
        (self.f)(progress)
    }
}

/// A sink that records every report and optionally cancels after a number of them.
#[derive(Debug, Default)]
pub struct VecProgress {
    reports: Vec<f32>,
    cancel_after: Option<usize>,
}

impl VecProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels the render on the `n`-th report (1-based).
    pub fn cancel_after(n: usize) -> Self {
        Self {
            reports: Vec::new(),
            cancel_after: Some(n),
        }
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.reports
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.reports
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn last(&self) -> Option<f32> {
        self.reports.last().copied()
    }
}

impl ProgressSink for VecProgress {
    fn report(&mut self, progress: f32) -> ControlFlow<()> {
        self.reports.push(progress);
        match self.cancel_after {
            Some(n) if self.reports.len() >= n => ControlFlow::Break(()),
            _ => ControlFlow::Continue(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_sink_always_continues() {
        assert_eq!(().report(0.5), ControlFlow::Continue(()));
    }

    #[test]
    fn fn_progress_invokes_callback() {
        let mut seen = Vec::new();
        let mut sink = FnProgress::new(|p| {
            seen.push(p);
            if p >= 0.5 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        assert!(sink.report(0.25).is_continue());
        assert!(sink.report(0.5).is_break());
        drop(sink);
        assert_eq!(seen, vec![0.25, 0.5]);
    }

    #[test]
    fn vec_progress_records_and_cancels() {
        let mut sink = VecProgress::cancel_after(2);
        assert!(sink.is_empty());
        assert!(sink.report(0.1).is_continue());
        assert!(sink.report(0.2).is_break());
        assert_eq!(sink.len(), 2);
        assert_eq!(sink.last(), Some(0.2));
    }

    #[test]
    fn mutable_reference_forwards() {
        fn drive<S: ProgressSink>(mut sink: S) -> ControlFlow<()> {
            sink.report(1.0)
        }

        let mut inner = VecProgress::new();
        assert!(drive(&mut inner).is_continue());
        assert_eq!(inner.as_slice(), &[1.0]);
    }
}
