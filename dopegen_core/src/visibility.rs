//! Visibility filtering by segmentation pixel count.

use dopegen_env::SegmentationMap;

/// Number of pixels in `map` owned by `instance_id`.
pub fn count_pixels(map: &SegmentationMap, instance_id: u32) -> u64 {
    map.as_slice().iter().filter(|&&id| id == instance_id).count() as u64
}

/// Drops objects that cover fewer than `min_pixels` pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VisibilityFilter {
    pub min_pixels: u64,
}

impl VisibilityFilter {
    pub fn new(min_pixels: u64) -> Self {
        Self { min_pixels }
    }

    /// Returns the pixel count when the object passes, `None` when it must
    /// be left out of the frame's annotations.
    pub fn evaluate(&self, map: &SegmentationMap, instance_id: u32) -> Option<u64> {
        let pixels = count_pixels(map, instance_id);
        (pixels >= self.min_pixels).then_some(pixels)
    }
}
