//! Multi-channel rasters.
//!
//! A [`MultiRaster`] is a set of same-sized single-channel rasters addressed by
//! [`ChannelId`]. Two storage strategies are provided:
//!
//! - [`CompositeRaster`]: every channel owns a separate contiguous [`Raster`].
//! - [`InterleavedRaster`]: one shared array holds all channels cell by cell; each channel is
//!   a strided view (`offset = channel index`, `x_step = channel count`).
//!
//! Channel views of an interleaved raster borrow the shared array, so they cannot outlive
//! their owner, and a mutable view excludes every other view for its lifetime.
use std::collections::HashMap;

use indexmap::{IndexMap, IndexSet};

use crate::channel::ChannelId;
use crate::error::{Error, Result};
use crate::raster::{Raster, RasterLayout, RasterMut, RasterRef};
use crate::render::{ChannelTarget, RenderTargets};

/// A fixed-size collection of same-sized raster channels.
pub trait MultiRaster {
    /// Size shared by every channel.
    fn size(&self) -> (usize, usize);

    /// Channel identifiers in storage order.
    fn channels(&self) -> Vec<ChannelId>;

    fn has_channel(&self, id: ChannelId) -> bool;

    /// Read-only view of a channel, or [`Error::MissingChannel`].
    fn channel(&self, id: ChannelId) -> Result<RasterRef<'_>>;

    /// Mutable view of a channel, or [`Error::MissingChannel`].
    fn channel_mut(&mut self, id: ChannelId) -> Result<RasterMut<'_>>;

    /// Lends the storage of the given channels to a render call.
    ///
    /// Fails if a channel is missing or listed twice.
    fn render_targets(&mut self, ids: &[ChannelId]) -> Result<RenderTargets<'_>>;

    fn channel_count(&self) -> usize {
        self.channels().len()
    }

    fn get_value(&self, x: usize, y: usize, id: ChannelId) -> Result<f32> {
        self.channel(id)?.get(x, y)
    }

    fn set_value(&mut self, x: usize, y: usize, id: ChannelId, value: f32) -> Result<()> {
        self.channel_mut(id)?.set(x, y, value)
    }

    /// Reads cell `(x, y)` of every channel named in `values`. Entries for channels this
    /// raster does not have are left as they are.
    fn get_values(&self, x: usize, y: usize, values: &mut HashMap<ChannelId, f32>) -> Result<()> {
        check_cell(self.size(), x, y)?;
        for (id, value) in values.iter_mut() {
            if let Ok(raster) = self.channel(*id) {
                *value = raster.get(x, y)?;
            }
        }
        Ok(())
    }

    /// Writes cell `(x, y)` of every channel named in `values`, skipping channels this raster
    /// does not have.
    fn set_values(&mut self, x: usize, y: usize, values: &HashMap<ChannelId, f32>) -> Result<()> {
        check_cell(self.size(), x, y)?;
        for (id, value) in values {
            if self.has_channel(*id) {
                self.set_value(x, y, *id, *value)?;
            }
        }
        Ok(())
    }
}

fn check_cell(size: (usize, usize), x: usize, y: usize) -> Result<()> {
    if x >= size.0 || y >= size.1 {
        return Err(Error::out_of_range(x as f64, y as f64, size));
    }
    Ok(())
}

fn check_size(size_x: usize, size_y: usize) -> Result<()> {
    if size_x == 0 || size_y == 0 {
        return Err(Error::InvalidConfig(format!(
            "raster size must be positive, got {}x{}",
            size_x, size_y
        )));
    }
    Ok(())
}

fn check_unique(ids: &[ChannelId]) -> Result<()> {
    let mut seen = IndexSet::with_capacity(ids.len());
    for id in ids {
        if !seen.insert(*id) {
            return Err(Error::DuplicateChannel { id: id.to_string() });
        }
    }
    Ok(())
}

fn missing(id: ChannelId) -> Error {
    Error::MissingChannel { id: id.to_string() }
}

/// Multi-channel raster with one independently allocated raster per channel.
///
/// Adding channels requires `&mut self`; callers sharing a composite raster across threads
/// must serialize registration against concurrent readers themselves.
#[derive(Clone, Debug, PartialEq)]
pub struct CompositeRaster {
    size_x: usize,
    size_y: usize,
    rasters: IndexMap<ChannelId, Raster>,
}

impl CompositeRaster {
    /// Creates an empty composite raster.
    pub fn new(size_x: usize, size_y: usize) -> Result<Self> {
        check_size(size_x, size_y)?;
        Ok(Self {
            size_x,
            size_y,
            rasters: IndexMap::new(),
        })
    }

    /// Creates a composite raster with zero-filled channels.
    pub fn with_channels(size_x: usize, size_y: usize, ids: &[ChannelId]) -> Result<Self> {
        let mut raster = Self::new(size_x, size_y)?;
        for id in ids {
            raster.add_new_channel(*id)?;
        }
        Ok(raster)
    }

    /// Adds an existing raster as channel `id`.
    pub fn add_channel(&mut self, id: ChannelId, raster: Raster) -> Result<()> {
        if raster.size() != (self.size_x, self.size_y) {
            return Err(Error::SizeMismatch {
                expected: (self.size_x, self.size_y),
                found: raster.size(),
            });
        }
        if self.rasters.contains_key(&id) {
            return Err(Error::DuplicateChannel { id: id.to_string() });
        }
        self.rasters.insert(id, raster);
        Ok(())
    }

    /// Adds a zero-filled channel and returns it.
    pub fn add_new_channel(&mut self, id: ChannelId) -> Result<&mut Raster> {
        self.add_channel(id, Raster::new(self.size_x, self.size_y)?)?;
        self.rasters.get_mut(&id).ok_or_else(|| missing(id))
    }

    pub fn remove_channel(&mut self, id: ChannelId) -> Option<Raster> {
        self.rasters.shift_remove(&id)
    }

    /// The owned raster of channel `id`.
    pub fn raster(&self, id: ChannelId) -> Option<&Raster> {
        self.rasters.get(&id)
    }

    pub fn raster_mut(&mut self, id: ChannelId) -> Option<&mut Raster> {
        self.rasters.get_mut(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ChannelId, &Raster)> {
        self.rasters.iter().map(|(id, r)| (*id, r))
    }

    /// Copies all channels into a single interleaved array.
    pub fn to_interleaved(&self) -> Result<InterleavedRaster> {
        let ids = self.channels();
        let mut out = InterleavedRaster::new(self.size_x, self.size_y, &ids)?;
        for (id, raster) in self.iter() {
            out.channel_mut(id)?.copy_from(raster)?;
        }
        Ok(out)
    }
}

impl MultiRaster for CompositeRaster {
    fn size(&self) -> (usize, usize) {
        (self.size_x, self.size_y)
    }

    fn channels(&self) -> Vec<ChannelId> {
        self.rasters.keys().copied().collect()
    }

    fn has_channel(&self, id: ChannelId) -> bool {
        self.rasters.contains_key(&id)
    }

    fn channel(&self, id: ChannelId) -> Result<RasterRef<'_>> {
        self.rasters
            .get(&id)
            .map(|r| r.view())
            .ok_or_else(|| missing(id))
    }

    fn channel_mut(&mut self, id: ChannelId) -> Result<RasterMut<'_>> {
        self.rasters
            .get_mut(&id)
            .map(|r| r.view_mut())
            .ok_or_else(|| missing(id))
    }

    fn channel_count(&self) -> usize {
        self.rasters.len()
    }

    fn render_targets(&mut self, ids: &[ChannelId]) -> Result<RenderTargets<'_>> {
        check_unique(ids)?;
        if let Some(id) = ids.iter().find(|id| !self.rasters.contains_key(*id)) {
            return Err(missing(*id));
        }

        let mut slots: Vec<Option<(&mut [f32], RasterLayout)>> = ids.iter().map(|_| None).collect();
        for (id, raster) in self.rasters.iter_mut() {
            if let Some(pos) = ids.iter().position(|c| c == id) {
                slots[pos] = Some(raster.parts_mut());
            }
        }

        let mut arrays = Vec::with_capacity(ids.len());
        let mut channels = Vec::with_capacity(ids.len());
        for (slot, id) in slots.into_iter().zip(ids) {
            let (data, layout) = slot.ok_or_else(|| missing(*id))?;
            channels.push(ChannelTarget::new(arrays.len(), layout));
            arrays.push(data);
        }
        Ok(RenderTargets { arrays, channels })
    }
}

/// Multi-channel raster storing all channels in one interleaved array.
///
/// The channel set is fixed at construction. Cell `(x, y)` of channel `c` lives at
/// `(y * size_x + x) * channel_count + c`.
#[derive(Clone, Debug, PartialEq)]
pub struct InterleavedRaster {
    size_x: usize,
    size_y: usize,
    channels: IndexSet<ChannelId>,
    data: Vec<f32>,
}

impl InterleavedRaster {
    /// Creates a zero-filled interleaved raster with the given channels.
    pub fn new(size_x: usize, size_y: usize, ids: &[ChannelId]) -> Result<Self> {
        check_size(size_x, size_y)?;
        check_unique(ids)?;
        if ids.is_empty() {
            return Err(Error::InvalidConfig(
                "interleaved raster needs at least one channel".into(),
            ));
        }
        let len = size_x
            .checked_mul(size_y)
            .and_then(|n| n.checked_mul(ids.len()))
            .ok_or_else(|| Error::InvalidConfig("raster size overflows usize".into()))?;
        Ok(Self {
            size_x,
            size_y,
            channels: ids.iter().copied().collect(),
            data: vec![0.0; len],
        })
    }

    /// Wraps an existing interleaved array of length `size_x * size_y * ids.len()`.
    pub fn from_vec(size_x: usize, size_y: usize, ids: &[ChannelId], data: Vec<f32>) -> Result<Self> {
        let mut raster = Self::new(size_x, size_y, ids)?;
        if data.len() != raster.data.len() {
            return Err(Error::InvalidConfig(format!(
                "expected {} interleaved values, got {}",
                raster.data.len(),
                data.len()
            )));
        }
        raster.data = data;
        Ok(raster)
    }

    /// Layout of channel number `index` inside the shared array.
    pub fn layout(&self, index: usize) -> RasterLayout {
        RasterLayout::interleaved(self.size_x, self.size_y, index, self.channels.len())
    }

    fn index_of(&self, id: ChannelId) -> Result<usize> {
        self.channels.get_index_of(&id).ok_or_else(|| missing(id))
    }

    /// The shared array.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.data
    }

    /// Values of every channel at `(x, y)`, in channel order.
    pub fn cell(&self, x: usize, y: usize) -> Result<&[f32]> {
        check_cell((self.size_x, self.size_y), x, y)?;
        let n = self.channels.len();
        let start = (y * self.size_x + x) * n;
        Ok(&self.data[start..start + n])
    }

    /// Copies every channel into its own contiguous raster.
    pub fn to_composite(&self) -> Result<CompositeRaster> {
        let mut out = CompositeRaster::new(self.size_x, self.size_y)?;
        for id in &self.channels {
            out.add_channel(*id, self.channel(*id)?.to_contiguous())?;
        }
        Ok(out)
    }
}

impl MultiRaster for InterleavedRaster {
    fn size(&self) -> (usize, usize) {
        (self.size_x, self.size_y)
    }

    fn channels(&self) -> Vec<ChannelId> {
        self.channels.iter().copied().collect()
    }

    fn has_channel(&self, id: ChannelId) -> bool {
        self.channels.contains(&id)
    }

    fn channel(&self, id: ChannelId) -> Result<RasterRef<'_>> {
        let layout = self.layout(self.index_of(id)?);
        Raster::with_layout(&self.data[..], layout)
    }

    fn channel_mut(&mut self, id: ChannelId) -> Result<RasterMut<'_>> {
        let layout = self.layout(self.index_of(id)?);
        Raster::with_layout(&mut self.data[..], layout)
    }

    fn channel_count(&self) -> usize {
        self.channels.len()
    }

    fn render_targets(&mut self, ids: &[ChannelId]) -> Result<RenderTargets<'_>> {
        check_unique(ids)?;
        let channels = ids
            .iter()
            .map(|id| Ok(ChannelTarget::new(0, self.layout(self.index_of(*id)?))))
            .collect::<Result<Vec<_>>>()?;
        Ok(RenderTargets {
            arrays: vec![&mut self.data[..]],
            channels,
        })
    }
}
