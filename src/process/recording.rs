use std::sync::Mutex;

use crate::foundation::error::ArchilumeResult;
use crate::process::runner::{CommandOutput, CommandRunner, CommandSpec, StdoutTarget};

type FailWhen = Box<dyn Fn(&CommandSpec) -> bool + Send + Sync>;

/// Payload written into files a materializing runner pretends to produce.
pub const PLACEHOLDER_CONTENT: &[u8] = b"#?RADIANCE\nFORMAT=32-bit_rle_rgbe\n\n";

/// Runner that records invocations instead of executing them.
///
/// Used for dry runs and tests. A materializing recorder also creates the files a real tool would
/// have written (stdout redirects and declared products), so existence checks behave as in a real
/// run.
pub struct RecordingRunner {
    calls: Mutex<Vec<CommandSpec>>,
    fail_when: Vec<FailWhen>,
    canned_stdout: Vec<(String, Vec<u8>)>,
    materialize: bool,
}

impl Default for RecordingRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingRunner {
    /// Recorder that never touches the filesystem.
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_when: Vec::new(),
            canned_stdout: Vec::new(),
            materialize: false,
        }
    }

    /// Recorder that writes placeholder outputs for successful calls.
    ///
    /// Failed calls still truncate their stdout file, as a shell redirect would.
    pub fn materializing() -> Self {
        Self {
            materialize: true,
            ..Self::new()
        }
    }

    /// Make every call matching `pred` exit with code 1.
    pub fn fail_when(mut self, pred: impl Fn(&CommandSpec) -> bool + Send + Sync + 'static) -> Self {
        self.fail_when.push(Box::new(pred));
        self
    }

    /// Return `stdout` for captured calls to the program named `program`.
    pub fn with_stdout(mut self, program: impl Into<String>, stdout: impl Into<Vec<u8>>) -> Self {
        self.canned_stdout.push((program.into(), stdout.into()));
        self
    }

    /// Snapshot of recorded calls in order.
    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Number of recorded calls.
    pub fn call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Number of recorded calls to the program named `program`.
    pub fn count_program(&self, program: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.program_name() == program)
            .count()
    }

    fn write_placeholder(path: &std::path::Path, content: &[u8]) -> ArchilumeResult<()> {
        crate::process::runner::ensure_parent_dir(path)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, spec: &CommandSpec) -> ArchilumeResult<CommandOutput> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(spec.clone());

        let failed = self.fail_when.iter().any(|pred| pred(spec));

        if self.materialize
            && let StdoutTarget::File(path) = &spec.stdout
        {
            let content = if failed { &[][..] } else { PLACEHOLDER_CONTENT };
            Self::write_placeholder(path, content)?;
        }

        if failed {
            return Ok(CommandOutput {
                code: Some(1),
                stdout: Vec::new(),
                stderr: format!("simulated failure of {}", spec.program_name()),
            });
        }

        if self.materialize {
            for path in &spec.produces {
                Self::write_placeholder(path, PLACEHOLDER_CONTENT)?;
            }
        }

        let stdout = match spec.stdout {
            StdoutTarget::Capture => self
                .canned_stdout
                .iter()
                .find(|(program, _)| *program == spec.program_name())
                .map(|(_, bytes)| bytes.clone())
                .unwrap_or_default(),
            _ => Vec::new(),
        };

        Ok(CommandOutput {
            code: Some(0),
            stdout,
            stderr: String::new(),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/process/recording.rs"]
mod tests;
