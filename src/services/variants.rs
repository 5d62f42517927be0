//! Variant policy: which images a job kind produces, and how.

use std::str::FromStr;

use image::GenericImageView;

use crate::models::image::{ImageKind, OutputFormat};
use crate::models::job::JobKind;
use crate::services::compositor::{self, CompositorError};

/// How a variant is derived from the uploaded bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// Store the upload byte-for-byte.
    Passthrough,
    SquareFromOriginal,
    SquareSmall,
}

/// One step of a job plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Variant {
    pub kind: ImageKind,
    pub transform: Transform,
}

const ORIGINAL: Variant = Variant {
    kind: ImageKind::Original,
    transform: Transform::Passthrough,
};
const SQUARE_ORIGINAL: Variant = Variant {
    kind: ImageKind::SquareOriginal,
    transform: Transform::SquareFromOriginal,
};
const SQUARE_SMALL: Variant = Variant {
    kind: ImageKind::SquareSmall,
    transform: Transform::SquareSmall,
};

/// Ordered variants for a job kind.
pub fn plan(kind: JobKind) -> &'static [Variant] {
    match kind {
        JobKind::Original => &[ORIGINAL],
        JobKind::SquareOriginal => &[SQUARE_ORIGINAL],
        JobKind::SquareSmall => &[SQUARE_SMALL],
        JobKind::AllThree => &[ORIGINAL, SQUARE_ORIGINAL, SQUARE_SMALL],
    }
}

/// Parse a requested kind, rejecting anything outside the four known names.
pub fn parse_kind(raw: &str) -> Result<JobKind, InvalidKindError> {
    JobKind::from_str(raw.trim()).map_err(|_| InvalidKindError(raw.to_string()))
}

#[derive(Debug, thiserror::Error)]
#[error("Not valid job kind: {0:?}")]
pub struct InvalidKindError(pub String);

/// Bytes and dimensions of a produced variant, ready to be stored.
#[derive(Debug, Clone)]
pub struct Rendered {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl Transform {
    /// Decode `source` and derive this variant from it.
    ///
    /// Passthrough still decodes so that an undecodable upload fails the
    /// same way for every kind, and so the stored dimensions are known.
    pub fn render(self, source: &[u8], format: OutputFormat) -> Result<Rendered, CompositorError> {
        let decoded = compositor::decode(source)?;
        let canvas = match self {
            Transform::Passthrough => {
                let (width, height) = decoded.dimensions();
                return Ok(Rendered {
                    bytes: source.to_vec(),
                    width,
                    height,
                });
            }
            Transform::SquareFromOriginal => compositor::square_from_original(&decoded)?,
            Transform::SquareSmall => compositor::square_small(&decoded)?,
        };
        let (width, height) = canvas.dimensions();
        let bytes = compositor::encode(canvas, format)?;
        Ok(Rendered {
            bytes,
            width,
            height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgb, RgbImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([1, 2, 3]));
        compositor::encode(img, OutputFormat::Png).unwrap()
    }

    #[test]
    fn test_plan_single_kinds() {
        assert_eq!(plan(JobKind::Original), &[ORIGINAL]);
        assert_eq!(plan(JobKind::SquareOriginal), &[SQUARE_ORIGINAL]);
        assert_eq!(plan(JobKind::SquareSmall), &[SQUARE_SMALL]);
    }

    #[test]
    fn test_plan_all_three_order() {
        let kinds: Vec<ImageKind> = plan(JobKind::AllThree).iter().map(|v| v.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ImageKind::Original,
                ImageKind::SquareOriginal,
                ImageKind::SquareSmall
            ]
        );
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!(parse_kind("all_three").unwrap(), JobKind::AllThree);
        assert_eq!(parse_kind(" original ").unwrap(), JobKind::Original);
        let err = parse_kind("baz").unwrap_err();
        assert_eq!(err.0, "baz");
    }

    #[test]
    fn test_passthrough_keeps_bytes() {
        let source = png_bytes(30, 12);
        let out = Transform::Passthrough
            .render(&source, OutputFormat::Jpeg)
            .unwrap();

        assert_eq!(out.bytes, source);
        assert_eq!((out.width, out.height), (30, 12));
    }

    #[test]
    fn test_square_original_render() {
        let source = png_bytes(100, 50);
        let out = Transform::SquareFromOriginal
            .render(&source, OutputFormat::Png)
            .unwrap();

        assert_eq!((out.width, out.height), (100, 100));
        let decoded: DynamicImage = compositor::decode(&out.bytes).unwrap();
        assert_eq!(decoded.dimensions(), (100, 100));
    }

    #[test]
    fn test_square_small_render_as_jpeg() {
        let source = png_bytes(300, 500);
        let out = Transform::SquareSmall
            .render(&source, OutputFormat::Jpeg)
            .unwrap();

        assert_eq!((out.width, out.height), (256, 256));
        assert_eq!(
            image::guess_format(&out.bytes).unwrap(),
            image::ImageFormat::Jpeg
        );
    }

    #[test]
    fn test_render_rejects_undecodable_upload() {
        for transform in [
            Transform::Passthrough,
            Transform::SquareFromOriginal,
            Transform::SquareSmall,
        ] {
            let err = transform.render(b"foobar", OutputFormat::Png).unwrap_err();
            assert!(matches!(err, CompositorError::Decode(_)));
        }
    }
}
