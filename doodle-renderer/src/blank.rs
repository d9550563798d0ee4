//! Blank detection for raster surfaces.

/// Returns `true` iff every byte of an RGBA buffer is zero.
///
/// A transparent pixel is all-zero in premultiplied storage, so this is the
/// same as "every pixel is fully transparent".
#[must_use]
pub fn is_blank(pixels: &[u8]) -> bool {
    pixels.iter().all(|&b| b == 0)
}
