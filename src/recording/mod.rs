//! Recording lifecycle
//!
//! - `state`: the session value and its transitions
//! - `manager`: permission, audio mode, capture and validation around it

mod manager;
mod state;

pub use manager::{RecordingConfig, RecordingManager, StartOutcome};
pub use state::{AudioArtifact, FailureCause, RecordingSession, RecordingState};
