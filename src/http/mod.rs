//! Local control API for a presentation shell
//!
//! - GET  /snapshot - Messages, loading and recording flags
//! - GET  /recording - Current recording session
//! - POST /recording/start | stop | cancel | acknowledge - Recording commands
//! - POST /recording/decision - Play, transcribe or discard the last recording
//! - POST /playback/stop - Stop playback
//! - POST /messages - Send typed text
//! - GET  /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
