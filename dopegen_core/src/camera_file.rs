//! Camera positions file: one `x y z roll pitch yaw` pose per line.

use crate::error::{CoreError, Result};
use crate::pose::{build_transformation_mat, rotation_from_euler};
use nalgebra::{Matrix4, Vector3};
use std::path::Path;

/// A camera pose as written in the positions file (Euler angles in radians).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPosition {
    pub position: Vector3<f64>,
    pub euler: Vector3<f64>,
}

impl CameraPosition {
    /// Camera-to-world transform for this position.
    pub fn to_pose(&self) -> Matrix4<f64> {
        let rotation = rotation_from_euler(self.euler.x, self.euler.y, self.euler.z);
        build_transformation_mat(self.position, &rotation)
    }
}

/// Parses one line (1-based `line_no` is used for errors only).
pub fn parse_line(line: &str, line_no: usize) -> Result<CameraPosition> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() != 6 {
        return Err(CoreError::camera_parse(
            line_no,
            format!("expected 6 values, found {}", tokens.len()),
        ));
    }

    let mut values = [0.0f64; 6];
    for (slot, token) in values.iter_mut().zip(&tokens) {
        *slot = token
            .parse()
            .map_err(|_| CoreError::camera_parse(line_no, format!("not a number: {token:?}")))?;
    }

    Ok(CameraPosition {
        position: Vector3::new(values[0], values[1], values[2]),
        euler: Vector3::new(values[3], values[4], values[5]),
    })
}

/// Parses a whole file's contents. Blank lines are skipped.
pub fn parse_camera_positions(text: &str) -> Result<Vec<CameraPosition>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| parse_line(line, i + 1))
        .collect()
}

/// Reads and parses a camera positions file.
pub fn read_camera_positions(path: impl AsRef<Path>) -> Result<Vec<CameraPosition>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| CoreError::io(path, e))?;
    parse_camera_positions(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_parse_two_lines() {
        let text = "-10.0 -10.0 4.1242 0.0 0.0\n";
        assert!(parse_camera_positions(text).is_err());

        let text = "0 -25 0 1.5707963 0 0\n1.5 2.5 3.5 0.1 0.2 0.3\n\n";
        let poses = parse_camera_positions(text).unwrap();
        assert_eq!(poses.len(), 2);
        assert_eq!(poses[1].position, Vector3::new(1.5, 2.5, 3.5));
        assert_eq!(poses[1].euler, Vector3::new(0.1, 0.2, 0.3));
    }

    #[test]
    fn test_error_reports_line_number() {
        let text = "0 0 0 0 0 0\n0 0 zero 0 0 0\n";
        match parse_camera_positions(text) {
            Err(CoreError::CameraParse { line, reason }) => {
                assert_eq!(line, 2);
                assert!(reason.contains("zero"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_extra_tokens_rejected() {
        assert!(matches!(
            parse_line("1 2 3 4 5 6 7", 9),
            Err(CoreError::CameraParse { line: 9, .. })
        ));
    }

    #[test]
    fn test_to_pose() {
        let pos = parse_line("1 2 3 0 0 0", 1).unwrap();
        let pose = pos.to_pose();
        assert_relative_eq!(pose.fixed_view::<3, 3>(0, 0).into_owned(), nalgebra::Matrix3::identity());
        assert_relative_eq!(pose[(0, 3)], 1.0);
        assert_relative_eq!(pose[(2, 3)], 3.0);
    }

    #[test]
    fn test_missing_file() {
        let err = read_camera_positions("/definitely/not/here").unwrap_err();
        assert!(matches!(err, CoreError::Io { .. }));
    }
}
