use field_raster::prelude::*;
use field_raster_examples::{init_tracing, write_grayscale_png};
use tracing::info;

/// Renders a small checker raster over an area three times its size, once per edge policy.
fn main() -> anyhow::Result<()> {
    init_tracing();

    let checker = Raster::from_fn(8, 8, |x, y| ((x / 2 + y / 2) % 2) as f32)?;
    let (sx, sy) = checker.size();
    let outside = Rect::from_corners(
        [-(sx as f32), -(sy as f32)],
        [2.0 * sx as f32 - 1.0, 2.0 * sy as f32 - 1.0],
    );

    for (name, edges) in [
        ("wrap", Edges::uniform(EdgeType::Wrap)),
        ("clamp", Edges::uniform(EdgeType::Clamp)),
        ("constant", Edges::uniform(EdgeType::Constant)),
        ("mixed", Edges::axes(EdgeType::Wrap, EdgeType::Zero)),
    ] {
        let field = RasterField::new(checker.clone(), edges)?.with_default_value(0.5);
        let mut out = Raster::new(240, 240)?;
        render_field(&field, &mut out, &RenderRequest::new().with_source(outside), &mut ())?;
        write_grayscale_png(&out, format!("edges-compare-{name}.png"))?;
    }

    // Writes through a bordered raster land on the wrapped cell or are dropped.
    let mut bordered = BorderedRaster::new(checker, Edges::axes(EdgeType::WrapWritable, EdgeType::Clamp));
    bordered.set(-1, 0, 5.0)?;
    bordered.set(0, -1, 7.0)?;
    info!(
        "Wrapped write: {}, dropped write left: {}.",
        bordered.raster.get(7, 0)?,
        bordered.raster.get(0, 7)?
    );
    Ok(())
}
