//! Image output: color frames, binary masks and the keypoint debug overlay.

use crate::error::{CoreError, Result};
use dopegen_env::{ColorFrame, EnvError, SegmentationMap};
use image::{GrayImage, ImageFormat, Luma, Rgb, RgbImage};
use nalgebra::Point2;
use std::path::Path;

/// Marker colors for the 9 cuboid keypoints, cycled when there are more.
pub const MARKER_COLORS: [[u8; 3]; 9] = [
    [255, 255, 0],   // yellow
    [255, 0, 255],   // magenta
    [0, 0, 255],     // blue
    [255, 0, 0],     // red
    [0, 128, 0],     // green
    [255, 165, 0],   // orange
    [165, 42, 42],   // brown
    [0, 255, 255],   // cyan
    [255, 255, 255], // white
];

/// Marker disc radius in pixels.
pub const MARKER_RADIUS: i64 = 2;

/// Encoding used for color frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFormat {
    Jpeg,
    Png,
}

impl FrameFormat {
    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            FrameFormat::Jpeg => "jpg",
            FrameFormat::Png => "png",
        }
    }

    fn image_format(&self) -> ImageFormat {
        match self {
            FrameFormat::Jpeg => ImageFormat::Jpeg,
            FrameFormat::Png => ImageFormat::Png,
        }
    }
}

/// Copies a rendered frame into an `RgbImage`.
pub fn to_rgb_image(frame: &ColorFrame) -> Result<RgbImage> {
    let bytes = frame.as_bytes().to_vec();
    let expected = bytes.len();
    RgbImage::from_raw(frame.width(), frame.height(), bytes).ok_or_else(|| {
        CoreError::Env(EnvError::BufferSize {
            expected: frame.width() as usize * frame.height() as usize * 3,
            actual: expected,
        })
    })
}

/// Saves an image, replacing any existing file.
pub fn save_image(image: &RgbImage, path: impl AsRef<Path>, format: FrameFormat) -> Result<()> {
    let path = path.as_ref();
    image
        .save_with_format(path, format.image_format())
        .map_err(|source| CoreError::Image {
            path: path.to_path_buf(),
            source,
        })
}

/// Saves a rendered frame.
pub fn save_color(frame: &ColorFrame, path: impl AsRef<Path>, format: FrameFormat) -> Result<()> {
    save_image(&to_rgb_image(frame)?, path, format)
}

/// Black/white mask: 255 wherever any instance is visible.
pub fn binary_mask(map: &SegmentationMap) -> GrayImage {
    GrayImage::from_fn(map.width(), map.height(), |x, y| {
        Luma([if map.get(x, y) > 0 { 255 } else { 0 }])
    })
}

/// Saves [`binary_mask`] as PNG.
pub fn save_binary_mask(map: &SegmentationMap, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    binary_mask(map)
        .save_with_format(path, ImageFormat::Png)
        .map_err(|source| CoreError::Image {
            path: path.to_path_buf(),
            source,
        })
}

/// Draws one filled disc per keypoint, colored by keypoint index.
///
/// Off-image parts of a disc are clipped.
pub fn draw_cuboid_markers(image: &mut RgbImage, keypoints: &[Point2<f64>]) {
    let (w, h) = (image.width() as i64, image.height() as i64);
    for (idx, p) in keypoints.iter().enumerate() {
        if !p.x.is_finite() || !p.y.is_finite() {
            continue;
        }
        let color = Rgb(MARKER_COLORS[idx % MARKER_COLORS.len()]);
        let (cx, cy) = (p.x as i64, p.y as i64);
        for y in (cy - MARKER_RADIUS)..=(cy + MARKER_RADIUS) {
            for x in (cx - MARKER_RADIUS)..=(cx + MARKER_RADIUS) {
                let inside = (x - cx).pow(2) + (y - cy).pow(2) <= MARKER_RADIUS.pow(2);
                if inside && (0..w).contains(&x) && (0..h).contains(&y) {
                    image.put_pixel(x as u32, y as u32, color);
                }
            }
        }
    }
}
