//! External tool invocation.
//!
//! Everything that starts a Radiance/Accelerad process goes through [`CommandRunner`], so batch
//! logic can be exercised with a [`RecordingRunner`] instead of real binaries.

/// In-memory runner for dry runs and tests.
pub mod recording;
/// Command specs, the runner trait and the system-process runner.
pub mod runner;

pub use recording::RecordingRunner;
pub use runner::{
    CommandOutput, CommandRunner, CommandSpec, StdoutTarget, SystemRunner, ensure_parent_dir,
    locate_executable,
};
