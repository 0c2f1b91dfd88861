use crate::ChartError;
use resvg::{tiny_skia, usvg};
use tracing::debug;

/// Rasterizes an SVG document to PNG bytes at its natural size.
pub fn rasterize(svg: &str) -> Result<Vec<u8>, ChartError> {
    let mut options = usvg::Options::default();
    options.fontdb_mut().load_system_fonts();

    let tree = usvg::Tree::from_str(svg, &options)?;
    let size = tree.size().to_int_size();
    let (width, height) = (size.width(), size.height());

    let mut pixmap =
        tiny_skia::Pixmap::new(width, height).ok_or(ChartError::Canvas { width, height })?;
    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

    let png = pixmap.encode_png().map_err(|e| ChartError::Encode {
        message: e.to_string(),
    })?;
    debug!("Rasterized {}x{} chart into {} bytes", width, height, png.len());
    Ok(png)
}
