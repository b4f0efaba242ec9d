//! Dataset generation pipelines.

use serde::Serialize;

/// Pipeline identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineId {
    /// One frame per camera-file pose: DOPE JSON + JPEG
    Dope,

    /// Fixed camera, randomized lights, filtered target objects: DOPE JSON + PNG
    Sweep,

    /// Rotating objects under a randomly placed camera: RGB, masks, keypoint labels
    Orbit,
}

impl PipelineId {
    /// Returns a list of all pipelines.
    pub fn all() -> Vec<PipelineId> {
        vec![PipelineId::Dope, PipelineId::Sweep, PipelineId::Orbit]
    }

    /// Returns the pipeline name.
    pub fn name(&self) -> &'static str {
        match self {
            PipelineId::Dope => "dope",
            PipelineId::Sweep => "sweep",
            PipelineId::Orbit => "orbit",
        }
    }

    /// Returns a description of the pipeline.
    pub fn description(&self) -> &'static str {
        match self {
            PipelineId::Dope => "camera file poses → frame_NNNNNN.json + .jpg",
            PipelineId::Sweep => "fixed camera, 1-3 random lights per frame → frame_NNNNNN.json + .png",
            PipelineId::Orbit => "object rotation sweep + random camera → rgb/, masks/, labels/",
        }
    }
}

impl std::fmt::Display for PipelineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_unique() {
        let names: Vec<_> = PipelineId::all().iter().map(|p| p.name()).collect();
        assert_eq!(names, ["dope", "sweep", "orbit"]);
    }

    #[test]
    fn test_descriptions_name_outputs() {
        assert!(PipelineId::Dope.description().contains(".jpg"));
        assert!(PipelineId::Sweep.description().contains(".png"));
        assert!(PipelineId::Orbit.description().contains("labels/"));
    }

    #[test]
    fn test_serializes_as_name() {
        let json = serde_json::to_string(&PipelineId::Orbit).unwrap();
        assert_eq!(json, "\"orbit\"");
        assert_eq!(PipelineId::Sweep.to_string(), "sweep");
    }
}
