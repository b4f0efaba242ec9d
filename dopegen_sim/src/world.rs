//! Scene description - the JSON file `SimRenderer` loads objects from.
//!
//! ```json
//! {
//!     "objects": [
//!         {
//!             "name": "door_0",
//!             "class": "door",
//!             "location": [0.0, 0.0, 1.0],
//!             "rotation_euler": [0.0, 0.0, 0.0],
//!             "half_extents": [0.45, 0.05, 1.0],
//!             "color": [0.55, 0.35, 0.2]
//!         }
//!     ]
//! }
//! ```

use dopegen_core::pose::rotation_from_euler;
use dopegen_env::SceneObject;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading a scene.
#[derive(Debug, Error)]
pub enum SimError {
    /// Scene file could not be read
    #[error("Failed to read scene {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Scene file is not valid JSON for a scene description
    #[error("Invalid scene {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Object with a non-positive extent
    #[error("Object {name}: half extents must be positive")]
    DegenerateObject { name: String },
}

/// One object entry in the scene file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectDescription {
    pub name: String,

    /// Class label; derived from the name when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,

    pub location: [f64; 3],

    /// XYZ Euler angles in radians
    #[serde(default)]
    pub rotation_euler: [f64; 3],

    pub half_extents: [f64; 3],

    #[serde(default = "default_color")]
    pub color: [f32; 3],
}

fn default_color() -> [f32; 3] {
    [0.8, 0.8, 0.8]
}

impl ObjectDescription {
    /// Class label written to annotations.
    ///
    /// Without an explicit class, the name up to the first `_` or `.` is used
    /// (`door_0` → `door`, `Frame.001` → `frame`).
    pub fn class_label(&self) -> String {
        match &self.class {
            Some(class) => class.clone(),
            None => self
                .name
                .split(['_', '.'])
                .next()
                .unwrap_or(&self.name)
                .to_lowercase(),
        }
    }
}

/// A whole scene file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneDescription {
    pub objects: Vec<ObjectDescription>,
}

impl SceneDescription {
    /// Reads a scene description from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SimError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| SimError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Instantiates the objects; instance ids follow file order starting at 1.
    pub fn instantiate(&self) -> Result<Vec<SceneObject>, SimError> {
        self.objects
            .iter()
            .enumerate()
            .map(|(j, desc)| {
                if desc.half_extents.iter().any(|&e| e <= 0.0) {
                    return Err(SimError::DegenerateObject {
                        name: desc.name.clone(),
                    });
                }
                let mut object = SceneObject::new(
                    desc.name.clone(),
                    desc.class_label(),
                    j as u32 + 1,
                    Vector3::from(desc.location),
                    Vector3::from(desc.half_extents),
                );
                let [roll, pitch, yaw] = desc.rotation_euler;
                object.rotation = rotation_from_euler(roll, pitch, yaw);
                object.color = desc.color;
                Ok(object)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENE: &str = r#"{
        "objects": [
            { "name": "door_0", "location": [0, 0, 1], "half_extents": [0.45, 0.05, 1.0] },
            { "name": "Frame.001", "class": "frame", "location": [2, 0, 1],
              "rotation_euler": [0, 0, 1.57], "half_extents": [0.5, 0.1, 1.1],
              "color": [0.2, 0.2, 0.2] }
        ]
    }"#;

    #[test]
    fn test_instantiate_assigns_ids_in_order() {
        let scene: SceneDescription = serde_json::from_str(SCENE).unwrap();
        let objects = scene.instantiate().unwrap();

        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].instance_id, 1);
        assert_eq!(objects[0].class, "door");
        assert_eq!(objects[1].instance_id, 2);
        assert_eq!(objects[1].class, "frame");
        assert_eq!(objects[1].color, [0.2, 0.2, 0.2]);
    }

    #[test]
    fn test_class_from_name() {
        let desc = ObjectDescription {
            name: "Frame.001".into(),
            class: None,
            location: [0.0; 3],
            rotation_euler: [0.0; 3],
            half_extents: [1.0; 3],
            color: default_color(),
        };
        assert_eq!(desc.class_label(), "frame");

        // only the leading token counts
        let desc = ObjectDescription {
            name: "frame_door".into(),
            ..desc
        };
        assert_eq!(desc.class_label(), "frame");
    }

    #[test]
    fn test_degenerate_object_rejected() {
        let scene: SceneDescription = serde_json::from_str(
            r#"{ "objects": [ { "name": "flat", "location": [0, 0, 0], "half_extents": [1, 0, 1] } ] }"#,
        )
        .unwrap();
        assert!(matches!(scene.instantiate(), Err(SimError::DegenerateObject { .. })));
    }

    #[test]
    fn test_load_errors() {
        assert!(matches!(
            SceneDescription::load("/no/such/scene.json"),
            Err(SimError::Read { .. })
        ));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(SceneDescription::load(&path), Err(SimError::Parse { .. })));
    }
}
