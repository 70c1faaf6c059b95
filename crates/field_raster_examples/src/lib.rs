#![forbid(unsafe_code)]
//! Shared helpers for the field_raster example binaries: logging setup and PNG output.
use std::path::Path;

use anyhow::Context;
use field_raster::prelude::{ChannelId, MultiRaster, Raster};
use image::{GrayImage, Luma, Rgb, RgbImage};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Installs a formatting subscriber. `RUST_LOG` overrides the default `info` filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,field_raster=debug"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

fn to_byte(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Writes a raster as a grayscale PNG, stretching its value range to black..white.
pub fn write_grayscale_png<D: AsRef<[f32]>>(raster: &Raster<D>, path: impl AsRef<Path>) -> anyhow::Result<()> {
    let path = path.as_ref();
    let (lo, hi) = raster.value_range().unwrap_or((0.0, 1.0));
    let span = if hi > lo { hi - lo } else { 1.0 };
    let (w, h) = raster.size();

    let mut img = GrayImage::new(w as u32, h as u32);
    for (x, y, px) in img.enumerate_pixels_mut() {
        let v = raster.get(x as usize, y as usize)?;
        *px = Luma([to_byte((v - lo) / span)]);
    }
    img.save(path)
        .with_context(|| format!("writing {}", path.display()))?;
    info!("Wrote {}x{} grayscale image to {}.", w, h, path.display());
    Ok(())
}

/// Writes three channels of a multi-raster as an RGB PNG. Values are clamped to `[0, 1]`.
pub fn write_rgb_png<R: MultiRaster + ?Sized>(
    raster: &R,
    channels: [ChannelId; 3],
    path: impl AsRef<Path>,
) -> anyhow::Result<()> {
    let path = path.as_ref();
    let (w, h) = raster.size();
    let views = [
        raster.channel(channels[0])?,
        raster.channel(channels[1])?,
        raster.channel(channels[2])?,
    ];

    let mut img = RgbImage::new(w as u32, h as u32);
    for (x, y, px) in img.enumerate_pixels_mut() {
        let mut rgb = [0u8; 3];
        for (out, view) in rgb.iter_mut().zip(&views) {
            *out = to_byte(view.get(x as usize, y as usize)?);
        }
        *px = Rgb(rgb);
    }
    img.save(path)
        .with_context(|| format!("writing {}", path.display()))?;
    info!("Wrote {}x{} RGB image to {}.", w, h, path.display());
    Ok(())
}
