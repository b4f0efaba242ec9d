//! Normalized keypoint label files (one line per object).
//!
//! Line layout: `category_id u0 v0 .. u7 v7 fx fy W H cx cy W H`, with the
//! keypoints divided by image width and height.

use crate::error::{CoreError, Result};
use crate::projection::CameraIntrinsics;
use nalgebra::Point2;
use std::path::Path;

/// One object's label line.
#[derive(Debug, Clone, PartialEq)]
pub struct KeypointLabel {
    pub category_id: u32,

    /// Keypoints normalized to [0, 1] for on-screen points
    pub keypoints: Vec<Point2<f64>>,
}

impl KeypointLabel {
    /// Normalizes pixel keypoints by the image size.
    pub fn from_pixels(category_id: u32, pixels: &[Point2<f64>], width: u32, height: u32) -> Self {
        let (w, h) = (width as f64, height as f64);
        Self {
            category_id,
            keypoints: pixels.iter().map(|p| Point2::new(p.x / w, p.y / h)).collect(),
        }
    }

    /// Formats the label line, trailing camera block included.
    pub fn to_line(&self, intrinsics: &CameraIntrinsics, width: u32, height: u32) -> String {
        let mut line = self.category_id.to_string();
        for p in &self.keypoints {
            line.push_str(&format!(" {:?} {:?}", p.x, p.y));
        }
        line.push_str(&format!(
            " {:?} {:?} {width} {height} {:?} {:?} {width} {height}",
            intrinsics.fx, intrinsics.fy, intrinsics.cx, intrinsics.cy
        ));
        line
    }
}

/// Writes all label lines for one frame, replacing any existing file.
pub fn write_labels(
    path: impl AsRef<Path>,
    labels: &[KeypointLabel],
    intrinsics: &CameraIntrinsics,
    width: u32,
    height: u32,
) -> Result<()> {
    let path = path.as_ref();
    let mut text = String::new();
    for label in labels {
        text.push_str(&label.to_line(intrinsics, width, height));
        text.push('\n');
    }
    std::fs::write(path, text).map_err(|e| CoreError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalization() {
        let label = KeypointLabel::from_pixels(
            2,
            &[Point2::new(320.0, 120.0), Point2::new(64.0, 360.0)],
            640,
            480,
        );
        assert_eq!(label.keypoints[0], Point2::new(0.5, 0.25));
        assert_eq!(label.keypoints[1], Point2::new(0.1, 0.75));
    }

    #[test]
    fn test_line_layout() {
        let label = KeypointLabel::from_pixels(1, &[Point2::new(320.0, 240.0)], 640, 480);
        let k = CameraIntrinsics::new(600.0, 600.0, 319.5, 239.5);
        assert_eq!(
            label.to_line(&k, 640, 480),
            "1 0.5 0.5 600.0 600.0 640 480 319.5 239.5 640 480"
        );
    }

    #[test]
    fn test_line_lists_every_keypoint() {
        let pixels = [Point2::new(64.0, 48.0), Point2::new(128.0, 96.0), Point2::new(-32.0, 0.0)];
        let label = KeypointLabel::from_pixels(7, &pixels, 640, 480);
        let line = label.to_line(&CameraIntrinsics::new(1.5, 2.5, 3.0, 4.0), 640, 480);

        let tokens: Vec<&str> = line.split(' ').collect();
        assert_eq!(tokens.len(), 1 + 2 * pixels.len() + 8);
        assert_eq!(&tokens[..7], ["7", "0.1", "0.1", "0.2", "0.2", "-0.05", "0.0"]);
        assert_eq!(&tokens[7..], ["1.5", "2.5", "640", "480", "3.0", "4.0", "640", "480"]);
    }

    #[test]
    fn test_write_labels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("000000_angle_0.txt");
        let labels = vec![
            KeypointLabel::from_pixels(1, &[Point2::new(0.0, 0.0)], 10, 10),
            KeypointLabel::from_pixels(2, &[Point2::new(5.0, 5.0)], 10, 10),
        ];
        write_labels(&path, &labels, &CameraIntrinsics::new(1.0, 1.0, 0.0, 0.0), 10, 10).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("2 0.5 0.5 "));
    }
}
