//! Square image composition.
//!
//! Turns an arbitrary-aspect image into a square one without scaling: the
//! source is placed at the top-left origin of an opaque white canvas and
//! anything that does not fit is truncated. There is no interpolation step,
//! so output is fully determined by the source pixels.

use std::io::Cursor;

use image::{imageops, ColorType, DynamicImage, GenericImageView, Limits, Rgb, RgbImage};

use crate::models::image::OutputFormat;

/// Edge length of the `square_small` variant.
pub const SMALL_EDGE: u32 = 256;

/// Canvas fill for the padded area.
pub const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

/// Decode raw upload bytes, sniffing the container format from the content.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, CompositorError> {
    image::load_from_memory(bytes).map_err(CompositorError::Decode)
}

/// Place `image` at (0, 0) on a `size`×`size` white canvas.
///
/// No bounds check is made on the source: one wider or taller than `size` is
/// silently truncated to the canvas. The canvas itself must fit the
/// allocation budget of [`Limits::default`].
pub fn pad_to_square(image: &DynamicImage, size: u32) -> Result<RgbImage, CompositorError> {
    Limits::default()
        .reserve_buffer(size, size, ColorType::Rgb8)
        .map_err(|_| CompositorError::TooLarge { edge: size })?;

    let mut canvas = RgbImage::from_pixel(size, size, BACKGROUND);
    imageops::replace(&mut canvas, &image.to_rgb8(), 0, 0);
    Ok(canvas)
}

/// Square canvas whose edge is the longer side of `image`.
pub fn square_from_original(image: &DynamicImage) -> Result<RgbImage, CompositorError> {
    let (width, height) = image.dimensions();
    pad_to_square(image, width.max(height))
}

/// Exactly 256×256: top-left crop of at most 256 on each side, then padded.
///
/// Smaller images are never upscaled.
pub fn square_small(image: &DynamicImage) -> Result<RgbImage, CompositorError> {
    let (width, height) = image.dimensions();
    let cropped = image.crop_imm(0, 0, width.min(SMALL_EDGE), height.min(SMALL_EDGE));
    pad_to_square(&cropped, SMALL_EDGE)
}

/// Encode a composed canvas in the job's output container format.
pub fn encode(canvas: RgbImage, format: OutputFormat) -> Result<Vec<u8>, CompositorError> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(canvas)
        .write_to(&mut Cursor::new(&mut buf), format.image_format())
        .map_err(CompositorError::Encode)?;
    Ok(buf)
}

#[derive(Debug, thiserror::Error)]
pub enum CompositorError {
    #[error("Could not decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("Could not encode image: {0}")]
    Encode(#[source] image::ImageError),

    #[error("Square canvas of {edge}x{edge} exceeds the allocation limit")]
    TooLarge { edge: u32 },
}
