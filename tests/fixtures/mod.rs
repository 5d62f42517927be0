//! Generated test images and the expected outcome of each job kind.

#![allow(dead_code)]

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

/// An upload and the variants its job must produce.
#[derive(Debug, Clone)]
pub struct JobFixture {
    pub kind: &'static str,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    /// (image kind, width, height) in creation order.
    pub expected: &'static [(&'static str, u32, u32)],
    pub description: &'static str,
}

impl JobFixture {
    pub fn mime(&self) -> &'static str {
        self.format.to_mime_type()
    }

    pub fn file_name(&self) -> String {
        format!("upload.{}", self.format.extensions_str()[0])
    }

    pub fn bytes(&self) -> Vec<u8> {
        encoded_image(self.width, self.height, self.format)
    }
}

pub const JOB_FIXTURES: &[JobFixture] = &[
    JobFixture {
        kind: "square_small",
        format: ImageFormat::Png,
        width: 300,
        height: 500,
        expected: &[("square_small", 256, 256)],
        description: "tall PNG larger than 256 on both sides is cropped",
    },
    JobFixture {
        kind: "square_original",
        format: ImageFormat::Jpeg,
        width: 100,
        height: 50,
        expected: &[("square_original", 100, 100)],
        description: "wide JPEG is padded below, not stretched",
    },
    JobFixture {
        kind: "original",
        format: ImageFormat::Png,
        width: 64,
        height: 48,
        expected: &[("original", 64, 48)],
        description: "original keeps its dimensions",
    },
    JobFixture {
        kind: "all_three",
        format: ImageFormat::Png,
        width: 120,
        height: 80,
        expected: &[
            ("original", 120, 80),
            ("square_original", 120, 120),
            ("square_small", 256, 256),
        ],
        description: "all_three expands into the three concrete kinds",
    },
    JobFixture {
        kind: "square_small",
        format: ImageFormat::Jpeg,
        width: 40,
        height: 20,
        expected: &[("square_small", 256, 256)],
        description: "small JPEG is padded up to 256, never upscaled",
    },
];

/// A non-white gradient so padding is distinguishable from content.
pub fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 200) as u8, (y % 200) as u8, 90])
    })
}

pub fn encoded_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(gradient(width, height))
        .write_to(&mut Cursor::new(&mut buf), format)
        .expect("Failed to encode fixture image");
    buf
}
