#![forbid(unsafe_code)]
//! field_raster: Continuous 2D fields rendered into strided float rasters.
//!
//! Modules:
//! - raster: single-channel rasters over owned or borrowed storage with explicit layouts
//! - multi_raster: channel sets stored as separate rasters or one interleaved array
//! - edge: out-of-bounds read/write policies and bordered access
//! - field / multi_field: continuous single- and multi-channel sources
//! - render: the render loop, requests, and progress/cancellation
//! - raster_field: rasters sampled back as fields (bilinear resampling)
//!
//! For examples, see the `field_raster_examples` crate.
pub mod area;
pub mod channel;
pub mod edge;
pub mod error;
pub mod field;
pub mod multi_field;
pub mod multi_raster;
pub mod progress;
pub mod raster;
pub mod raster_field;
pub mod render;

/// Convenient re-exports for common types. Import with `use field_raster::prelude::*;`.
pub mod prelude {
    pub use crate::area::{CellRect, GridArea, Rect};
    pub use crate::channel::ChannelId;
    pub use crate::edge::{BorderedRaster, EdgeType, Edges};
    pub use crate::error::{Error, Result};
    pub use crate::field::{ConstantField, Field, FnField};
    pub use crate::multi_field::{ChannelField, FnMultiField, MultiField, MultiFieldChannels};
    pub use crate::multi_raster::{CompositeRaster, InterleavedRaster, MultiRaster};
    pub use crate::progress::{FnProgress, ProgressSink, VecProgress};
    pub use crate::raster::{Raster, RasterLayout, RasterMut, RasterRef};
    pub use crate::raster_field::{MultiRasterField, RasterField};
    pub use crate::render::{
        render_field, render_multi_field, RenderOutcome, RenderRequest,
    };
}
