// This file is a small example of how to use the `posture_vision` library.
// The main library entry point is `src/lib.rs`.

use posture_vision::pipeline::{
    LANDMARK_COUNT, Landmark, LandmarkFrame, Mode, PosePoint, PostureSession, SessionConfig,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    println!("Posture Vision Engine - Example Runner");

    // A synthetic desk frame with the head craned forward, standing in for
    // what the pose model would emit from a live camera.
    let mut landmarks = vec![Landmark::default(); LANDMARK_COUNT];
    landmarks[PosePoint::LeftEar.index()] = Landmark::new(0.8, 0.3);
    landmarks[PosePoint::LeftShoulder.index()] = Landmark::new(0.6, 0.5);
    landmarks[PosePoint::LeftHip.index()] = Landmark::new(0.5, 0.9);
    let frame = LandmarkFrame::new(landmarks).ok_or("incomplete landmark set")?;

    let mut session = PostureSession::new(Mode::Desk, SessionConfig::default());
    session.start_camera()?;

    for (index, now_ms) in (0..5u64).map(|n| (n, n * 33)) {
        let report = session.process_frame(Some(&frame), now_ms)?;
        println!(
            "frame {index}: score {:3}  spoke {:5}  {:?}",
            report.evaluation.score, report.spoke, report.evaluation.messages
        );
    }

    session.stop_camera()?;
    println!("history entries: {}", session.history().len());
    Ok(())
}
