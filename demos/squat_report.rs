//! Analyze a synthetic three-repetition squat and print the session report

use formcheck::encoder::ReportEncoder;
use formcheck::{analyze_sequence, ExerciseKind, FrameInput, Landmark, LandmarkName, Pose};

/// Side-view squat skeleton with the given knee angle on both legs
fn squat_pose(knee_deg: f64) -> Pose {
    let half = knee_deg.to_radians() / 2.0;
    let thigh = 0.2;
    let knee_y = 0.7;
    let mut landmarks = vec![Landmark::new(LandmarkName::Nose, 0.5, 0.1, 0.95)];

    for (side_x, shoulder, hip, knee, ankle) in [
        (
            0.45,
            LandmarkName::LeftShoulder,
            LandmarkName::LeftHip,
            LandmarkName::LeftKnee,
            LandmarkName::LeftAnkle,
        ),
        (
            0.55,
            LandmarkName::RightShoulder,
            LandmarkName::RightHip,
            LandmarkName::RightKnee,
            LandmarkName::RightAnkle,
        ),
    ] {
        let hip_pt = (side_x - thigh * half.cos(), knee_y - thigh * half.sin());
        let ankle_pt = (side_x - thigh * half.cos(), knee_y + thigh * half.sin());
        landmarks.push(Landmark::new(shoulder, hip_pt.0, hip_pt.1 - 0.3, 0.9));
        landmarks.push(Landmark::new(hip, hip_pt.0, hip_pt.1, 0.9));
        landmarks.push(Landmark::new(knee, side_x, knee_y, 0.9));
        landmarks.push(Landmark::new(ankle, ankle_pt.0, ankle_pt.1, 0.9));
    }

    Pose::from_landmarks(landmarks)
}

fn main() {
    // stand, descend, hold at the bottom, stand back up
    let one_rep = [170.0, 150.0, 125.0, 100.0, 85.0, 85.0, 85.0, 110.0, 140.0, 170.0];
    let frames: Vec<FrameInput> = one_rep
        .iter()
        .cycle()
        .take(one_rep.len() * 3)
        .enumerate()
        .map(|(i, &knee)| FrameInput::new(i as u64, i as f64 / 30.0, Some(squat_pose(knee))))
        .collect();

    let result = match analyze_sequence(ExerciseKind::Squat, &frames) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Error: {e}");
            return;
        }
    };

    match ReportEncoder::new().encode_to_json(&result.summary, None) {
        Ok(report) => println!("{report}"),
        Err(e) => eprintln!("Error: {e:?}"),
    }
}
