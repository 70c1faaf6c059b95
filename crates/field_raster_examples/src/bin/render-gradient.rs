use std::ops::ControlFlow;

use field_raster::prelude::*;
use field_raster_examples::{init_tracing, write_grayscale_png};
use tracing::info;

fn main() -> anyhow::Result<()> {
    init_tracing();

    // Concentric ripples fading out from the center of a 20x20 world.
    let field = FnField::new(|p, radius| {
        let d = p.length();
        let ripple = 0.5 + 0.5 * (d * 1.5).cos();
        // Coarse renders (larger radius) average out the ripple instead of aliasing it.
        let blur = (radius / 8.0).min(1.0);
        (ripple * (1.0 - blur) + 0.5 * blur) * (-d * 0.08).exp()
    });

    let source = Rect::from_center_extent(glam::Vec2::ZERO, glam::Vec2::splat(20.0));
    let mut raster = Raster::new(512, 512)?;
    let request = RenderRequest::new().with_source(source);
    let mut progress = FnProgress::new(|p| {
        info!("Rendered {:.0}%.", p * 100.0);
        ControlFlow::Continue(())
    });
    render_field(&field, &mut raster, &request, &mut progress)?;
    write_grayscale_png(&raster, "render-gradient.png")?;

    // The same field rendered into the top-left quarter only, over a sentinel background.
    let mut partial = Raster::filled(512, 512, -1.0)?;
    let request = request.with_target(CellRect::new(0, 0, 256, 256));
    render_field(&field, &mut partial, &request, &mut ())?;
    write_grayscale_png(&partial, "render-gradient-partial.png")?;

    // A coarse preview that gives up halfway.
    let mut preview = Raster::new(64, 64)?;
    let mut stop_halfway = FnProgress::new(|p| {
        if p >= 0.5 {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    });
    let outcome = render_field(&field, &mut preview, &request.with_target(CellRect::full(64, 64)), &mut stop_halfway)?;
    info!("Preview render ended with {:?}.", outcome);
    Ok(())
}
