use std::ffi::OsString;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::Context as _;

use crate::foundation::error::{ArchilumeError, ArchilumeResult};

/// Where a child's stdout goes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum StdoutTarget {
    /// Share the parent's stdout.
    #[default]
    Inherit,
    /// Discard.
    Null,
    /// Collect into [`CommandOutput::stdout`].
    Capture,
    /// Redirect into a file, truncating it first (`> path`).
    File(PathBuf),
}

/// One external tool invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandSpec {
    /// Executable path or bare name resolved through `PATH`.
    pub program: PathBuf,
    /// Arguments in order.
    pub args: Vec<OsString>,
    /// Extra environment for the child only.
    pub envs: Vec<(OsString, OsString)>,
    /// Stdout routing.
    pub stdout: StdoutTarget,
    /// Files the tool writes on its own (not through stdout), e.g. an ambient cache.
    pub produces: Vec<PathBuf>,
}

impl CommandSpec {
    /// Start a spec for `program` with no arguments.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
            stdout: StdoutTarget::Inherit,
            produces: Vec::new(),
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Add environment variables for the child.
    pub fn envs<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<OsString>,
        V: Into<OsString>,
    {
        self.envs
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Redirect stdout into `path`.
    pub fn stdout_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.stdout = StdoutTarget::File(path.into());
        self
    }

    /// Throw stdout away.
    pub fn discard_stdout(mut self) -> Self {
        self.stdout = StdoutTarget::Null;
        self
    }

    /// Capture stdout in memory.
    pub fn capture_stdout(mut self) -> Self {
        self.stdout = StdoutTarget::Capture;
        self
    }

    /// Declare a file the tool writes by itself.
    pub fn produces(mut self, path: impl Into<PathBuf>) -> Self {
        self.produces.push(path.into());
        self
    }

    /// Return `true` when any argument equals `needle`.
    pub fn has_arg(&self, needle: &str) -> bool {
        self.args.iter().any(|a| a == needle)
    }

    /// Executable file name, without directories.
    pub fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Shell-like rendering for logs: `prog arg ... > out`.
    pub fn display_line(&self) -> String {
        let mut line = self.program.display().to_string();
        for a in &self.args {
            line.push(' ');
            line.push_str(&a.to_string_lossy());
        }
        if let StdoutTarget::File(p) = &self.stdout {
            line.push_str(" > ");
            line.push_str(&p.display().to_string());
        }
        line
    }
}

/// Result of a finished invocation. A non-zero exit is not an `Err`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; `None` when killed by a signal.
    pub code: Option<i32>,
    /// Captured stdout (empty unless [`StdoutTarget::Capture`]).
    pub stdout: Vec<u8>,
    /// Captured stderr, lossily decoded.
    pub stderr: String,
}

impl CommandOutput {
    /// Exit code 0.
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Captured stdout as text.
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }
}

/// Seam between orchestration and the operating system.
///
/// `Err` means the tool could not be run at all; an unsuccessful exit is reported through
/// [`CommandOutput::code`] so callers decide whether it is fatal.
pub trait CommandRunner: Send + Sync {
    /// Run `spec` to completion.
    fn run(&self, spec: &CommandSpec) -> ArchilumeResult<CommandOutput>;

    /// Run `spec` and turn a non-zero exit into [`ArchilumeError::Process`].
    fn run_checked(&self, spec: &CommandSpec) -> ArchilumeResult<CommandOutput> {
        let out = self.run(spec)?;
        if !out.success() {
            return Err(ArchilumeError::process(format!(
                "'{}' exited with {}: {}",
                spec.program_name(),
                describe_code(out.code),
                out.stderr.trim()
            )));
        }
        Ok(out)
    }
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, spec: &CommandSpec) -> ArchilumeResult<CommandOutput> {
        (**self).run(spec)
    }
}

/// Runs tools with [`std::process::Command`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> ArchilumeResult<CommandOutput> {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .envs(spec.envs.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .stderr(Stdio::piped());

        match &spec.stdout {
            StdoutTarget::Inherit => {
                cmd.stdout(Stdio::inherit());
            }
            StdoutTarget::Null => {
                cmd.stdout(Stdio::null());
            }
            StdoutTarget::Capture => {
                cmd.stdout(Stdio::piped());
            }
            StdoutTarget::File(path) => {
                ensure_parent_dir(path)?;
                let file = File::create(path)
                    .with_context(|| format!("failed to create '{}'", path.display()))?;
                cmd.stdout(Stdio::from(file));
            }
        }

        tracing::debug!(command = %spec.display_line(), "spawn");

        let output = cmd.output().map_err(|e| {
            ArchilumeError::process(format!(
                "failed to spawn '{}' (is it installed?): {e}",
                spec.program.display()
            ))
        })?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: output.stdout,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Human-readable exit code for log lines.
pub fn describe_code(code: Option<i32>) -> String {
    match code {
        Some(c) => format!("exit code {c}"),
        None => "a signal".to_string(),
    }
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> ArchilumeResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Resolve an executable.
///
/// Paths with a directory component are checked directly; bare names are searched on `PATH`.
/// On Windows a missing `.exe` suffix is tried as well.
pub fn locate_executable(program: &Path) -> Option<PathBuf> {
    let has_dir = program
        .parent()
        .is_some_and(|p| !p.as_os_str().is_empty());
    if has_dir || program.is_absolute() {
        return executable_candidate(program);
    }
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var).find_map(|dir| executable_candidate(&dir.join(program)))
}

fn executable_candidate(path: &Path) -> Option<PathBuf> {
    if path.is_file() {
        return Some(path.to_path_buf());
    }
    if cfg!(windows) && path.extension().is_none() {
        let exe = path.with_extension("exe");
        if exe.is_file() {
            return Some(exe);
        }
    }
    None
}

#[cfg(test)]
#[path = "../../tests/unit/process/runner.rs"]
mod tests;
