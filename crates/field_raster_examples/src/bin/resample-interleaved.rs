use field_raster::prelude::*;
use field_raster_examples::{init_tracing, write_rgb_png};
use glam::Vec2;
use tracing::info;

fn main() -> anyhow::Result<()> {
    init_tracing();
    let [r, g, b, a] = ChannelId::rgba();

    // A procedural color field: hue-like bands in r/g/b and a vignette in alpha.
    let field = FnMultiField::new(vec![r, g, b, a], move |p, ch, _| {
        let angle = p.y.atan2(p.x);
        if ch == r {
            0.5 + 0.5 * angle.cos()
        } else if ch == g {
            0.5 + 0.5 * (angle + 2.094).cos()
        } else if ch == b {
            0.5 + 0.5 * (angle + 4.189).cos()
        } else {
            (1.0 - p.length()).clamp(0.0, 1.0)
        }
    });
    let source = Rect::from_corners([-1.0, -1.0], [1.0, 1.0]);

    // Render a small interleaved RGBA tile.
    let mut tile = InterleavedRaster::new(16, 16, &[r, g, b, a])?;
    render_multi_field(&field, &mut tile, None, &RenderRequest::new().with_source(source), &mut ())?;
    info!("Rendered a 16x16 tile into one {}-value array.", tile.data().len());

    // Premultiply alpha through the strided channel views.
    for id in [r, g, b] {
        let alpha = tile.channel(a)?.to_contiguous();
        tile.channel_mut(id)?.multiply(&alpha)?;
    }
    write_rgb_png(&tile, [r, g, b], "resample-interleaved-tile.png")?;

    // Upsample the tile into separate channel rasters through a clamping raster field.
    let tile_field = MultiRasterField::new(tile, Edges::uniform(EdgeType::Clamp))?.with_area(source);
    let mut large = CompositeRaster::with_channels(256, 256, &[r, g, b])?;
    let request = RenderRequest::new().with_source(tile_field.full_area());
    render_multi_field(&tile_field, &mut large, None, &request, &mut ())?;
    write_rgb_png(&large, [r, g, b], "resample-interleaved-upsampled.png")?;

    // Cached single-channel views of the shared field sample one channel at a time.
    let channels = MultiFieldChannels::new(tile_field);
    let red = channels.channel(r)?;
    info!(
        "Red at the center: {:.3}, at the corner: {:.3}.",
        red.sample_point(Vec2::ZERO),
        red.sample_point(Vec2::new(1.0, 1.0))
    );
    Ok(())
}
