//! Export of a capture surface to a transport-ready image.
//!
//! The surface keeps transparent background pixels; the classifier must
//! only ever see black ink on an opaque white canvas. [`flatten`] composites
//! the surface onto white at the same size and encodes the result as PNG.

use std::io::Cursor;

use base64::Engine;
use image::ImageEncoder;
use tiny_skia::{Color, Pixmap, PixmapPaint, Transform};

use crate::error::{RenderError, RenderResult};
use crate::surface::StrokeSurface;

/// Prefix of a PNG data URL.
pub const PNG_DATA_URI_PREFIX: &str = "data:image/png;base64,";

/// A flattened, fully opaque snapshot of a surface, PNG-encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenedImage {
    /// Width in pixels, equal to the surface width.
    pub width: u32,
    /// Height in pixels, equal to the surface height.
    pub height: u32,
    png: Vec<u8>,
}

impl FlattenedImage {
    /// The encoded PNG bytes.
    #[must_use]
    pub fn png(&self) -> &[u8] {
        &self.png
    }

    /// Consume the image, returning the PNG bytes.
    #[must_use]
    pub fn into_png(self) -> Vec<u8> {
        self.png
    }

    /// Standard base64 of the PNG bytes.
    #[must_use]
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.png)
    }

    /// Self-contained `data:image/png;base64,...` string for a single request.
    #[must_use]
    pub fn to_data_uri(&self) -> String {
        format!("{PNG_DATA_URI_PREFIX}{}", self.to_base64())
    }
}

/// Composite the surface onto opaque white and encode it as PNG.
///
/// Pixel alignment is exact: no scaling, no cropping. The output depends only
/// on the surface pixels, so equal surfaces give byte-identical images.
///
/// # Errors
///
/// Returns an error if the output buffer cannot be allocated or encoding fails.
pub fn flatten(surface: &StrokeSurface) -> RenderResult<FlattenedImage> {
    let (width, height) = (surface.width(), surface.height());

    let mut canvas = Pixmap::new(width, height).ok_or(RenderError::Surface { width, height })?;
    canvas.fill(Color::WHITE);
    canvas.draw_pixmap(
        0,
        0,
        surface.pixmap(),
        &PixmapPaint::default(),
        Transform::identity(),
        None,
    );

    // Every pixel is opaque now, so premultiplied bytes are straight RGBA.
    let mut buf = Cursor::new(Vec::new());
    image::codecs::png::PngEncoder::new(&mut buf)
        .write_image(canvas.data(), width, height, image::ExtendedColorType::Rgba8)
        .map_err(|e| RenderError::Export(format!("PNG encoding failed: {e}")))?;

    let png = buf.into_inner();
    tracing::debug!(width, height, bytes = png.len(), "Flattened surface");

    Ok(FlattenedImage { width, height, png })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::SurfaceConfig;
    use doodle_core::SurfacePoint;

    fn decode(image: &FlattenedImage) -> image::RgbaImage {
        image::load_from_memory(image.png())
            .expect("decode png")
            .to_rgba8()
    }

    fn small_surface() -> StrokeSurface {
        StrokeSurface::new(&SurfaceConfig {
            width: 40,
            height: 30,
            ..SurfaceConfig::default()
        })
        .expect("surface")
    }

    #[test]
    fn test_blank_surface_flattens_to_white() {
        let surface = small_surface();
        let flat = flatten(&surface).expect("flatten");
        assert_eq!((flat.width, flat.height), (40, 30));

        let decoded = decode(&flat);
        assert_eq!(decoded.dimensions(), (40, 30));
        assert!(decoded.pixels().all(|p| p.0 == [255, 255, 255, 255]));
    }

    #[test]
    fn test_ink_keeps_its_position() {
        let mut surface = small_surface();
        surface.begin_stroke(SurfacePoint::new(0.0, 15.0));
        surface.extend_stroke(SurfacePoint::new(40.0, 15.0));

        let decoded = decode(&flatten(&surface).expect("flatten"));
        assert_eq!(decoded.get_pixel(20, 15).0, [0, 0, 0, 255]);
        assert_eq!(decoded.get_pixel(20, 2).0, [255, 255, 255, 255]);
        assert!(decoded.pixels().all(|p| p.0[3] == 255));
    }

    #[test]
    fn test_flatten_is_deterministic() {
        let mut surface = small_surface();
        surface.begin_stroke(SurfacePoint::new(3.0, 3.0));
        surface.extend_stroke(SurfacePoint::new(33.0, 21.0));

        let a = flatten(&surface).expect("first");
        let b = flatten(&surface).expect("second");
        assert_eq!(a, b);
    }

    #[test]
    fn test_flatten_leaves_surface_untouched() {
        let surface = small_surface();
        let _ = flatten(&surface).expect("flatten");
        assert!(surface.is_blank());
    }

    #[test]
    fn test_data_uri_shape() {
        let flat = flatten(&small_surface()).expect("flatten");
        let uri = flat.to_data_uri();
        let payload = uri.strip_prefix(PNG_DATA_URI_PREFIX).expect("prefix");

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(payload)
            .expect("base64");
        assert_eq!(bytes, flat.png());
        // PNG magic bytes: \x89PNG
        assert_eq!(&bytes[0..4], &[137, 80, 78, 71]);
    }
}
