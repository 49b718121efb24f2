// THEORY:
// The `pipeline` module is the final, top-level API for the entire posture
// engine. It encapsulates the full stack into a single, easy-to-use interface:
// feed it landmark frames, get back `FrameReport`s for the rendering layer.
//
// Key architectural principles:
// 1.  **One Frame Stream**: a `PostureSession` owns the evaluator, throttle and
//     history, and mutates them from exactly one logical stream of frames. At
//     most one evaluation is ever in flight.
// 2.  **Explicit Source Lifecycle**: the input source (live camera or loaded
//     file) moves through a small state machine. Frames delivered while no
//     source is active are rejected, not silently processed.
// 3.  **Fixed Stage Order**: every frame runs Evaluator -> Throttle -> Recorder.
//     The throttle only sees frames that actually violated a rule, and history
//     only records frames where a person was detected.

use crate::core_modules::history::HistoryRecorder;
use crate::core_modules::throttle::FeedbackThrottle;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, watch};

// Re-export key data structures for the public API.
pub use crate::core_modules::evaluator::{EvaluationResult, Mode, ParseModeError, evaluate};
pub use crate::core_modules::geometry::{GeometryError, angle_at};
pub use crate::core_modules::history::{HISTORY_CAPACITY, HistoryEntry};
pub use crate::core_modules::landmark::{LANDMARK_COUNT, Landmark, LandmarkFrame, PosePoint};
pub use crate::core_modules::throttle::SPEAK_INTERVAL_MS;

/// Configuration for a `PostureSession`, allowing for tunable behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// How many evaluations the trend history retains.
    pub history_capacity: usize,
    /// Minimum quiet period between spoken alerts, in milliseconds.
    pub speak_interval_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history_capacity: HISTORY_CAPACITY,
            speak_interval_ms: SPEAK_INTERVAL_MS,
        }
    }
}

/// Where frames are currently coming from, if anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceState {
    Idle,
    CameraActive,
    FileLoaded,
    Analyzing,
    Paused,
}

impl fmt::Display for SourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceState::Idle => "idle",
            SourceState::CameraActive => "camera-active",
            SourceState::FileLoaded => "file-loaded",
            SourceState::Analyzing => "analyzing",
            SourceState::Paused => "paused",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("cannot {action} while {from}")]
    InvalidTransition {
        from: SourceState,
        action: &'static str,
    },
    #[error("frame delivered while source is {state}")]
    InactiveSource { state: SourceState },
    /// The embedding layer was refused camera access. Fatal for the session;
    /// nothing retries automatically.
    #[error("camera permission denied")]
    CameraPermissionDenied,
    /// The external pose model could not be loaded.
    #[error("pose model failed to load: {0}")]
    ModelLoadFailed(String),
}

/// The primary output of the pipeline for a single frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameReport {
    pub evaluation: EvaluationResult,
    /// Whether an audio alert actually fired for this frame.
    pub spoke: bool,
    /// The message that was vocalized, when one fired.
    pub spoken_message: Option<String>,
    /// 0 when no skeleton was detected, 1 otherwise. The landmark source
    /// tracks a single person.
    pub detected_persons: u8,
}

/// The main, top-level struct for the posture engine.
pub struct PostureSession {
    mode: Mode,
    state: SourceState,
    throttle: FeedbackThrottle,
    history: HistoryRecorder,
    last_feedback: Option<EvaluationResult>,
}

impl PostureSession {
    pub fn new(mode: Mode, config: SessionConfig) -> Self {
        Self {
            mode,
            state: SourceState::Idle,
            throttle: FeedbackThrottle::new(config.speak_interval_ms),
            history: HistoryRecorder::new(config.history_capacity),
            last_feedback: None,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Switches activity mode. Displayed feedback resets; history does not,
    /// so the trend window spans mode changes.
    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
        self.last_feedback = None;
    }

    pub fn state(&self) -> SourceState {
        self.state
    }

    pub fn last_feedback(&self) -> Option<&EvaluationResult> {
        self.last_feedback.as_ref()
    }

    pub fn history(&self) -> &VecDeque<HistoryEntry> {
        self.history.entries()
    }

    pub fn start_camera(&mut self) -> Result<(), SessionError> {
        self.switch_source(SourceState::Idle, SourceState::CameraActive, "start the camera")
    }

    pub fn stop_camera(&mut self) -> Result<(), SessionError> {
        self.switch_source(SourceState::CameraActive, SourceState::Idle, "stop the camera")
    }

    pub fn load_file(&mut self) -> Result<(), SessionError> {
        self.switch_source(SourceState::Idle, SourceState::FileLoaded, "load a file")
    }

    /// Starts or resumes playback analysis.
    pub fn begin_analysis(&mut self) -> Result<(), SessionError> {
        match self.state {
            SourceState::FileLoaded | SourceState::Paused => {
                self.state = SourceState::Analyzing;
                Ok(())
            }
            from => Err(SessionError::InvalidTransition {
                from,
                action: "begin analysis",
            }),
        }
    }

    pub fn pause_analysis(&mut self) -> Result<(), SessionError> {
        match self.state {
            SourceState::Analyzing => {
                self.state = SourceState::Paused;
                Ok(())
            }
            from => Err(SessionError::InvalidTransition {
                from,
                action: "pause analysis",
            }),
        }
    }

    /// Ends playback and returns to idle. Further frames are rejected.
    pub fn finish_analysis(&mut self) -> Result<(), SessionError> {
        match self.state {
            SourceState::Analyzing | SourceState::Paused => {
                self.state = SourceState::Idle;
                self.last_feedback = None;
                Ok(())
            }
            from => Err(SessionError::InvalidTransition {
                from,
                action: "finish analysis",
            }),
        }
    }

    /// Runs one frame through Evaluator -> Throttle -> Recorder.
    ///
    /// `frame` is `None` when the pose model found nobody; such frames still
    /// produce a (neutral) report but are not recorded into history.
    pub fn process_frame(
        &mut self,
        frame: Option<&LandmarkFrame>,
        now_ms: u64,
    ) -> Result<FrameReport, SessionError> {
        if !matches!(
            self.state,
            SourceState::CameraActive | SourceState::Analyzing
        ) {
            return Err(SessionError::InactiveSource { state: self.state });
        }

        let evaluation = evaluate(frame, self.mode);

        let mut spoke = false;
        let detected_persons = match frame {
            Some(_) => {
                if evaluation.bad_posture {
                    spoke = self.throttle.maybe_speak(&evaluation.messages, now_ms);
                }
                self.history.record(HistoryEntry {
                    timestamp_ms: now_ms,
                    score: evaluation.score,
                    mode: self.mode,
                });
                1
            }
            None => 0,
        };

        let spoken_message = if spoke {
            evaluation.messages.first().cloned()
        } else {
            None
        };
        self.last_feedback = Some(evaluation.clone());

        Ok(FrameReport {
            evaluation,
            spoke,
            spoken_message,
            detected_persons,
        })
    }

    fn switch_source(
        &mut self,
        expected: SourceState,
        next: SourceState,
        action: &'static str,
    ) -> Result<(), SessionError> {
        if self.state != expected {
            return Err(SessionError::InvalidTransition {
                from: self.state,
                action,
            });
        }
        self.state = next;
        // Switching input source resets what is on screen, never the trend.
        self.last_feedback = None;
        Ok(())
    }
}

/// A frame paired with its arrival time, as delivered by the capture layer.
#[derive(Debug, Clone)]
pub struct TimedFrame {
    pub frame: Option<LandmarkFrame>,
    pub now_ms: u64,
}

/// Fan-out channel for live `FrameReport`s (renderer, speech, network peers).
#[derive(Clone)]
pub struct FeedbackBus {
    pub reports_tx: broadcast::Sender<FrameReport>,
}

impl FeedbackBus {
    pub fn new(capacity: usize) -> Self {
        let (reports_tx, _) = broadcast::channel::<FrameReport>(capacity.max(1));
        Self { reports_tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FrameReport> {
        self.reports_tx.subscribe()
    }

    /// Lossy by design: a bus with no subscribers simply drops the report.
    pub fn publish(&self, report: FrameReport) {
        let _ = self.reports_tx.send(report);
    }
}

/// Play/pause switch shared between the UI and the frame loop.
#[derive(Clone)]
pub struct ControlHandle {
    pub play_tx: watch::Sender<bool>,
}

impl ControlHandle {
    pub fn new() -> (Self, watch::Receiver<bool>) {
        let (play_tx, play_rx) = watch::channel(true);
        (Self { play_tx }, play_rx)
    }

    pub fn set_playing(&self, playing: bool) {
        let _ = self.play_tx.send(playing);
    }
}

/// Drives a session from a frame channel until the capture side hangs up,
/// publishing every report on the bus. Frames that arrive while playback is
/// paused are dropped, not queued.
pub async fn run_live_session(
    mut session: PostureSession,
    mut frames: mpsc::Receiver<TimedFrame>,
    bus: FeedbackBus,
    play_rx: watch::Receiver<bool>,
) -> Result<PostureSession, SessionError> {
    while let Some(timed) = frames.recv().await {
        if !*play_rx.borrow() {
            continue;
        }
        let report = session.process_frame(timed.frame.as_ref(), timed.now_ms)?;
        bus.publish(report);
    }
    log::info!("frame source closed, session loop ending");
    Ok(session)
}
