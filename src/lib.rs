// THEORY:
// This file is the main entry point for the `posture_vision` library crate.
// It follows the standard Rust convention of using `lib.rs` to define the public
// API that will be exposed to external consumers (like the `posture_server`
// service or the `session_tester` driver).
//
// The primary goal is to export the `PostureSession` and its associated data
// structures (`SessionConfig`, `FrameReport`, etc.) as the clean, high-level
// interface for the entire analysis engine. All the complex internal modules
// (`core_modules`) are encapsulated and hidden from the end-user, providing a
// clean separation of concerns.

pub mod core_modules;
pub mod pipeline;
