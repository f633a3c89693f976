//! Joint angle computation
//!
//! Angles are measured in the image plane from vector directions only, so they are
//! invariant to coordinate scale and translation. An angle whose landmarks were not
//! validated, or whose vectors are degenerate, is omitted from the frame's mapping
//! rather than substituted.

use crate::normalizer::NormalizedPose;
use crate::types::{AngleMap, Landmark, LandmarkName};

/// Reference axis for segment tilt angles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Vertical,
    Horizontal,
}

impl Axis {
    fn unit(&self) -> (f64, f64) {
        match self {
            Axis::Vertical => (0.0, 1.0),
            Axis::Horizontal => (1.0, 0.0),
        }
    }
}

/// How an angle-table entry is derived
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AngleSource {
    /// Angle at `vertex` between the segments to `a` and `b`
    Joint {
        a: LandmarkName,
        vertex: LandmarkName,
        b: LandmarkName,
    },
    /// Tilt of the segment `from → to` away from an axis, folded into [0, 90]
    Segment {
        from: LandmarkName,
        to: LandmarkName,
        axis: Axis,
    },
    /// Mean of two earlier entries
    Mean(&'static str, &'static str),
    /// Smaller of two earlier entries
    Min(&'static str, &'static str),
    /// Larger of two earlier entries
    Max(&'static str, &'static str),
}

/// A named entry of an exercise's angle table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleDefinition {
    pub name: &'static str,
    pub source: AngleSource,
}

impl AngleDefinition {
    pub const fn joint(
        name: &'static str,
        a: LandmarkName,
        vertex: LandmarkName,
        b: LandmarkName,
    ) -> Self {
        Self {
            name,
            source: AngleSource::Joint { a, vertex, b },
        }
    }

    pub const fn segment(
        name: &'static str,
        from: LandmarkName,
        to: LandmarkName,
        axis: Axis,
    ) -> Self {
        Self {
            name,
            source: AngleSource::Segment { from, to, axis },
        }
    }

    pub const fn mean(name: &'static str, left: &'static str, right: &'static str) -> Self {
        Self {
            name,
            source: AngleSource::Mean(left, right),
        }
    }

    pub const fn min(name: &'static str, left: &'static str, right: &'static str) -> Self {
        Self {
            name,
            source: AngleSource::Min(left, right),
        }
    }

    pub const fn max(name: &'static str, left: &'static str, right: &'static str) -> Self {
        Self {
            name,
            source: AngleSource::Max(left, right),
        }
    }
}

/// Angle computer for evaluating an exercise's angle table
pub struct AngleComputer;

impl AngleComputer {
    /// Compute every angle of the table whose inputs are available.
    ///
    /// Derived entries must appear after the entries they reference.
    pub fn compute(
        definitions: &[AngleDefinition],
        pose: &NormalizedPose,
        min_vector_norm: f64,
    ) -> AngleMap {
        let mut angles = AngleMap::new();

        for definition in definitions {
            let value = match definition.source {
                AngleSource::Joint { a, vertex, b } => {
                    match (pose.get(a), pose.get(vertex), pose.get(b)) {
                        (Some(a), Some(vertex), Some(b)) => {
                            joint_angle(a, vertex, b, min_vector_norm)
                        }
                        _ => None,
                    }
                }
                AngleSource::Segment { from, to, axis } => match (pose.get(from), pose.get(to)) {
                    (Some(from), Some(to)) => segment_tilt(from, to, axis, min_vector_norm),
                    _ => None,
                },
                AngleSource::Mean(l, r) => pair(&angles, l, r).map(|(l, r)| (l + r) / 2.0),
                AngleSource::Min(l, r) => pair(&angles, l, r).map(|(l, r)| l.min(r)),
                AngleSource::Max(l, r) => pair(&angles, l, r).map(|(l, r)| l.max(r)),
            };

            if let Some(value) = value {
                angles.insert(definition.name.to_string(), value);
            }
        }

        angles
    }
}

fn pair(angles: &AngleMap, left: &str, right: &str) -> Option<(f64, f64)> {
    Some((*angles.get(left)?, *angles.get(right)?))
}

/// Angle at `vertex` between the segments to `a` and `b`, in degrees
pub fn joint_angle(a: &Landmark, vertex: &Landmark, b: &Landmark, min_norm: f64) -> Option<f64> {
    let v1 = (a.x - vertex.x, a.y - vertex.y);
    let v2 = (b.x - vertex.x, b.y - vertex.y);
    angle_between(v1, v2, min_norm)
}

/// Tilt of a segment from an axis, folded so the segment's direction does not matter
pub fn segment_tilt(from: &Landmark, to: &Landmark, axis: Axis, min_norm: f64) -> Option<f64> {
    let v = (to.x - from.x, to.y - from.y);
    let raw = angle_between(v, axis.unit(), min_norm)?;
    Some(raw.min(180.0 - raw))
}

/// Angle between two vectors in degrees, `None` when either is degenerate
pub fn angle_between(v1: (f64, f64), v2: (f64, f64), min_norm: f64) -> Option<f64> {
    let n1 = v1.0.hypot(v1.1);
    let n2 = v2.0.hypot(v2.1);

    if !(n1.is_finite() && n2.is_finite()) || n1 < min_norm || n2 < min_norm {
        return None;
    }

    let cos = ((v1.0 / n1) * (v2.0 / n2) + (v1.1 / n1) * (v2.1 / n2)).clamp(-1.0, 1.0);
    Some(cos.acos().to_degrees().clamp(0.0, 180.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::LandmarkNormalizer;
    use crate::types::Pose;

    const NORM: f64 = 1e-6;

    fn lm(name: LandmarkName, x: f64, y: f64) -> Landmark {
        Landmark::new(name, x, y, 0.9)
    }

    #[test]
    fn test_right_angle() {
        let angle = angle_between((1.0, 0.0), (0.0, 1.0), NORM).unwrap();
        assert!((angle - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_straight_and_folded() {
        assert!((angle_between((1.0, 0.0), (-1.0, 0.0), NORM).unwrap() - 180.0).abs() < 1e-9);
        assert!(angle_between((1.0, 0.0), (1.0, 0.0), NORM).unwrap().abs() < 1e-6);
    }

    #[test]
    fn test_degenerate_vector_is_omitted() {
        assert_eq!(angle_between((0.0, 0.0), (1.0, 0.0), NORM), None);
        assert_eq!(angle_between((1.0, 0.0), (1e-9, 0.0), NORM), None);
        assert_eq!(angle_between((f64::INFINITY, 0.0), (1.0, 0.0), NORM), None);
    }

    #[test]
    fn test_scale_and_translation_invariance() {
        let a = lm(LandmarkName::LeftHip, 0.3, 0.2);
        let v = lm(LandmarkName::LeftKnee, 0.35, 0.45);
        let b = lm(LandmarkName::LeftAnkle, 0.2, 0.7);
        let base = joint_angle(&a, &v, &b, NORM).unwrap();

        let transform = |l: &Landmark| lm(l.name, l.x * 37.0 + 120.0, l.y * 37.0 - 45.0);
        let moved = joint_angle(&transform(&a), &transform(&v), &transform(&b), NORM).unwrap();
        assert!((base - moved).abs() < 1e-9);
    }

    #[test]
    fn test_angles_stay_in_range() {
        let vectors = [
            (1.0, 0.0),
            (0.3, -0.7),
            (-2.0, 5.0),
            (-1.0, -1.0),
            (0.0, 3.0),
            (1e-3, 4.0),
        ];
        for v1 in vectors {
            for v2 in vectors {
                let angle = angle_between(v1, v2, NORM).unwrap();
                assert!((0.0..=180.0).contains(&angle), "{v1:?} {v2:?} -> {angle}");
            }
        }
    }

    #[test]
    fn test_segment_tilt_ignores_direction() {
        let hip = lm(LandmarkName::LeftHip, 0.5, 0.6);
        let shoulder = lm(LandmarkName::LeftShoulder, 0.6, 0.5);
        let up = segment_tilt(&hip, &shoulder, Axis::Vertical, NORM).unwrap();
        let down = segment_tilt(&shoulder, &hip, Axis::Vertical, NORM).unwrap();
        assert!((up - 45.0).abs() < 1e-9);
        assert!((up - down).abs() < 1e-9);
    }

    #[test]
    fn test_table_omits_missing_and_derives() {
        const TABLE: [AngleDefinition; 3] = [
            AngleDefinition::joint(
                "left_knee",
                LandmarkName::LeftHip,
                LandmarkName::LeftKnee,
                LandmarkName::LeftAnkle,
            ),
            AngleDefinition::joint(
                "right_knee",
                LandmarkName::RightHip,
                LandmarkName::RightKnee,
                LandmarkName::RightAnkle,
            ),
            AngleDefinition::mean("knee", "left_knee", "right_knee"),
        ];

        let pose = Pose::from_landmarks([
            lm(LandmarkName::LeftShoulder, 0.4, 0.2),
            lm(LandmarkName::RightShoulder, 0.6, 0.2),
            lm(LandmarkName::LeftHip, 0.4, 0.5),
            lm(LandmarkName::RightHip, 0.6, 0.5),
            lm(LandmarkName::LeftKnee, 0.4, 0.7),
            lm(LandmarkName::LeftAnkle, 0.4, 0.9),
            lm(LandmarkName::RightKnee, 0.6, 0.7),
        ]);
        let normalized = LandmarkNormalizer::normalize(Some(&pose), 0.5);
        let angles = AngleComputer::compute(&TABLE, &normalized, NORM);

        assert!((angles["left_knee"] - 180.0).abs() < 1e-9);
        assert!(!angles.contains_key("right_knee"));
        assert!(!angles.contains_key("knee"));
    }
}
