use anyhow::{Context, bail};
use posture_vision::pipeline::{
    Landmark, LandmarkFrame, Mode, PostureSession, SessionConfig,
};
use std::env;
use std::fs::File;
use std::io::{BufRead, BufReader};

/// Synthetic frame spacing for replayed traces, matching a 30 fps capture.
const FRAME_INTERVAL_MS: u64 = 33;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    // --- 1. Argument Parsing & Setup ---
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        println!("Usage: session_tester <input_trace.jsonl> [--mode desk|squat]");
        return Ok(());
    }
    let input_path = &args[1];
    let mode = parse_mode_flag(&args[2..])?;

    // --- 2. Session Initialization ---
    let mut session = PostureSession::new(mode, SessionConfig::default());
    session.load_file()?;
    session.begin_analysis()?;

    // --- 3. Trace Replay Loop ---
    // Each line is one video frame: either `null` (no person detected) or a
    // JSON array of {x, y, z} landmarks.
    let file = File::open(input_path).with_context(|| format!("opening trace {input_path}"))?;
    let reader = BufReader::new(file);
    log::info!("replaying {input_path} in {mode} mode");

    let mut alerts_fired = 0u32;
    for (index, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("reading trace line {}", index + 1))?;
        if line.trim().is_empty() {
            continue;
        }

        let landmarks: Option<Vec<Landmark>> = serde_json::from_str(&line)
            .with_context(|| format!("malformed trace line {}", index + 1))?;
        let frame = landmarks.and_then(LandmarkFrame::new);

        let now_ms = index as u64 * FRAME_INTERVAL_MS;
        let report = session.process_frame(frame.as_ref(), now_ms)?;

        let alert = if report.spoke {
            alerts_fired += 1;
            report.spoken_message.as_deref().unwrap_or("")
        } else {
            ""
        };
        println!(
            "frame {index:5}  persons {}  score {:3}  alert [{alert}]  {:?}",
            report.detected_persons, report.evaluation.score, report.evaluation.messages
        );
    }
    session.finish_analysis()?;

    // --- 4. Closing Summary ---
    let history = session.history();
    println!("---");
    println!("mode: {mode}");
    println!("alerts fired: {alerts_fired}");
    println!("history window: {} entries", history.len());
    for entry in history {
        println!("  t={:7}ms  score {:3}  {}", entry.timestamp_ms, entry.score, entry.mode);
    }

    Ok(())
}

fn parse_mode_flag(rest: &[String]) -> anyhow::Result<Mode> {
    match rest {
        [] => Ok(Mode::Desk),
        [flag, value] if flag == "--mode" => value
            .parse::<Mode>()
            .with_context(|| format!("invalid --mode value `{value}`")),
        _ => bail!("unexpected arguments, expected: [--mode desk|squat]"),
    }
}
