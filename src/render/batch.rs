use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context as _;

use crate::config::{ProjectLayout, ToolPaths, layout::VIEW_EXT};
use crate::foundation::elapsed::{Stopwatch, format_minutes_seconds};
use crate::foundation::error::{ArchilumeError, ArchilumeResult};
use crate::process::{CommandRunner, locate_executable, runner::describe_code};
use crate::render::gpu::detect_cuda_env;
use crate::render::naming::{SceneName, ViewOutputs, stem_of};
use crate::render::post::{PostFilter, apply_post_filter};
use crate::render::preset::QualityPreset;
use crate::render::rpict::RpictCall;

/// Smallest accepted square resolution.
pub const MIN_RESOLUTION: u32 = 128;
/// Largest accepted square resolution.
pub const MAX_RESOLUTION: u32 = 8192;
/// Resolutions at or above this get a half-resolution filtered copy.
pub const HIGH_RES_THRESHOLD: u32 = 2048;

/// Which renderer build runs the passes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderBackend {
    /// Accelerad `accelerad_rpict`.
    #[default]
    Gpu,
    /// Radiance `rpict`.
    Cpu,
}

impl RenderBackend {
    /// Thread count used when none is given.
    pub fn default_threads(self) -> u32 {
        match self {
            Self::Gpu => 1,
            Self::Cpu => 2,
        }
    }

    /// Renderer executable for this backend.
    pub fn program(self, tools: &ToolPaths) -> PathBuf {
        match self {
            Self::Gpu => tools.accelerad_rpict(),
            Self::Cpu => tools.radiance_tool("rpict"),
        }
    }
}

impl FromStr for RenderBackend {
    type Err = ArchilumeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gpu" => Ok(Self::Gpu),
            "cpu" => Ok(Self::Cpu),
            other => Err(ArchilumeError::validation(format!(
                "unknown backend '{other}' (valid: gpu, cpu)"
            ))),
        }
    }
}

impl fmt::Display for RenderBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Gpu => "gpu",
            Self::Cpu => "cpu",
        })
    }
}

/// Batch render options.
#[derive(Clone, Debug)]
pub struct BatchRenderOpts {
    /// Octree base name under `outputs/octree`.
    pub scene: String,
    /// Resolved quality preset.
    pub preset: QualityPreset,
    /// Square output resolution.
    pub resolution: u32,
    /// Single view name; all views when `None`.
    pub view: Option<String>,
    /// Renderer build.
    pub backend: RenderBackend,
    /// Thread override.
    pub threads: Option<u32>,
    /// High-resolution filter.
    pub post_filter: PostFilter,
    /// Fail pre-flight when the renderer executable cannot be found. Dry runs turn this off.
    pub require_renderer: bool,
}

impl BatchRenderOpts {
    /// Options for `scene` with the given preset and defaults for the rest.
    pub fn new(scene: impl Into<String>, preset: QualityPreset) -> Self {
        Self {
            scene: scene.into(),
            preset,
            resolution: 1024,
            view: None,
            backend: RenderBackend::default(),
            threads: None,
            post_filter: PostFilter::default(),
            require_renderer: true,
        }
    }

    /// Threads passed to `-t`.
    pub fn effective_threads(&self) -> u32 {
        self.threads
            .filter(|t| *t > 0)
            .unwrap_or_else(|| self.backend.default_threads())
    }
}

/// What happened to one view.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ViewOutcome {
    /// Final image already existed.
    Skipped,
    /// Main pass succeeded.
    Rendered {
        /// Filtered copy, when one was produced.
        filtered: Option<PathBuf>,
    },
    /// Main pass failed; the partial image was removed.
    Failed {
        /// Renderer exit code, `None` if it never ran or was killed.
        code: Option<i32>,
        /// Failure description.
        message: String,
    },
}

/// Per-view entry of a [`BatchReport`].
#[derive(Clone, Debug, serde::Serialize)]
pub struct ViewReport {
    /// View base name.
    pub view: String,
    /// Main image path.
    pub image: PathBuf,
    /// Result.
    pub outcome: ViewOutcome,
    /// Recoverable problems (overture or filter failures).
    pub warnings: Vec<String>,
    /// Wall time spent on this view.
    pub elapsed: Duration,
}

/// Summary of a batch.
#[derive(Clone, Debug, Default, serde::Serialize)]
pub struct BatchReport {
    /// Octree base name.
    pub scene: String,
    /// Views in processing order.
    pub views: Vec<ViewReport>,
    /// Batch-level warnings (e.g. GPU query fallback).
    pub warnings: Vec<String>,
    /// Total wall time.
    pub elapsed: Duration,
    /// Renderer processes started (overture and main passes).
    pub invocations: usize,
}

impl BatchReport {
    fn count(&self, pred: impl Fn(&ViewOutcome) -> bool) -> usize {
        self.views.iter().filter(|v| pred(&v.outcome)).count()
    }

    /// Views rendered in this batch.
    pub fn rendered(&self) -> usize {
        self.count(|o| matches!(o, ViewOutcome::Rendered { .. }))
    }

    /// Views skipped because their image existed.
    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, ViewOutcome::Skipped))
    }

    /// Views whose main pass failed.
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, ViewOutcome::Failed { .. }))
    }

    /// Failed view names.
    pub fn failed_views(&self) -> Vec<&str> {
        self.views
            .iter()
            .filter(|v| matches!(v.outcome, ViewOutcome::Failed { .. }))
            .map(|v| v.view.as_str())
            .collect()
    }
}

/// Check resolution bounds.
pub fn validate_resolution(resolution: u32) -> ArchilumeResult<()> {
    if !(MIN_RESOLUTION..=MAX_RESOLUTION).contains(&resolution) {
        return Err(ArchilumeError::validation(format!(
            "resolution {resolution} outside {MIN_RESOLUTION}..={MAX_RESOLUTION}"
        )));
    }
    Ok(())
}

/// Views to render: the named one, or every `*.vp` in `view_dir` sorted by name.
pub fn discover_views(view_dir: &Path, name: Option<&str>) -> ArchilumeResult<Vec<PathBuf>> {
    if let Some(name) = name {
        let name = name.strip_suffix(".vp").unwrap_or(name);
        let path = view_dir.join(format!("{name}.{VIEW_EXT}"));
        if !path.is_file() {
            return Err(ArchilumeError::not_found("view file", path));
        }
        return Ok(vec![path]);
    }

    if !view_dir.is_dir() {
        return Err(ArchilumeError::not_found("view directory", view_dir));
    }
    let mut views = Vec::new();
    for entry in std::fs::read_dir(view_dir)
        .with_context(|| format!("failed to list '{}'", view_dir.display()))?
    {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|e| e == VIEW_EXT) {
            views.push(path);
        }
    }
    if views.is_empty() {
        return Err(ArchilumeError::validation(format!(
            "no .{VIEW_EXT} files in '{}'",
            view_dir.display()
        )));
    }
    views.sort();
    Ok(views)
}

/// Renderer executable for `backend`. A missing one is fatal only when `required`.
pub(crate) fn resolve_renderer(
    backend: RenderBackend,
    tools: &ToolPaths,
    required: bool,
) -> ArchilumeResult<PathBuf> {
    let program = backend.program(tools);
    match locate_executable(&program) {
        Some(found) => Ok(found),
        None if required => Err(ArchilumeError::not_found("renderer executable", program)),
        None => {
            tracing::warn!(program = %program.display(), "renderer not found; continuing");
            Ok(program)
        }
    }
}

/// Render every selected view of a scene.
///
/// Pre-flight problems return `Err` before any renderer runs. Once the loop starts, per-view
/// failures are logged and recorded in the report and the remaining views still render.
#[tracing::instrument(
    skip_all,
    fields(scene = %opts.scene, preset = %opts.preset, resolution = opts.resolution, backend = %opts.backend)
)]
pub fn render_batch(
    runner: &dyn CommandRunner,
    layout: &ProjectLayout,
    tools: &ToolPaths,
    opts: &BatchRenderOpts,
) -> ArchilumeResult<BatchReport> {
    let batch_clock = Stopwatch::start();

    validate_resolution(opts.resolution)?;

    let program = resolve_renderer(opts.backend, tools, opts.require_renderer)?;

    let octree = layout.octree_path(&opts.scene);
    if !octree.is_file() {
        return Err(ArchilumeError::not_found("octree", octree));
    }

    let views = discover_views(&layout.view_dir(), opts.view.as_deref())?;

    let image_dir = layout.image_dir();
    std::fs::create_dir_all(&image_dir)
        .with_context(|| format!("failed to create '{}'", image_dir.display()))?;

    let mut report = BatchReport {
        scene: opts.scene.clone(),
        ..BatchReport::default()
    };

    let mut envs = tools.renderer_env();
    if opts.backend == RenderBackend::Gpu {
        let (cuda, warning) = detect_cuda_env(runner);
        envs.extend(cuda);
        report.warnings.extend(warning);
    }

    let scene = SceneName::parse(&opts.scene);
    if !scene.is_split() {
        tracing::debug!("scene name has no site delimiter; using plain output names");
    }
    let pfilt = tools.radiance_tool("pfilt");
    let ctx = ViewContext {
        runner,
        opts,
        program: &program,
        octree: &octree,
        envs: &envs,
        pfilt: &pfilt,
    };

    tracing::info!(
        views = views.len(),
        threads = opts.effective_threads(),
        started = %batch_clock.started_at(),
        "batch start"
    );

    let total = views.len();
    for (i, view) in views.iter().enumerate() {
        let name = stem_of(view);
        let outputs = scene.outputs(&image_dir, &name);
        tracing::info!(view = %name, "[{}/{total}] {}", i + 1, outputs.image.display());
        let view_report = ctx.render_view(view, name, outputs, &mut report.invocations);
        report.views.push(view_report);
    }

    report.elapsed = batch_clock.elapsed();
    let (finished, wall) = batch_clock.wall_clock();
    tracing::info!(
        rendered = report.rendered(),
        skipped = report.skipped(),
        failed = report.failed(),
        invocations = report.invocations,
        started = %batch_clock.started_at(),
        finished = %finished,
        wall = %format_minutes_seconds(wall),
        "batch finished in {}",
        format_minutes_seconds(report.elapsed)
    );
    Ok(report)
}

struct ViewContext<'a> {
    runner: &'a dyn CommandRunner,
    opts: &'a BatchRenderOpts,
    program: &'a Path,
    octree: &'a Path,
    envs: &'a [(String, String)],
    pfilt: &'a Path,
}

impl ViewContext<'_> {
    fn render_view(
        &self,
        view: &Path,
        name: String,
        outputs: ViewOutputs,
        invocations: &mut usize,
    ) -> ViewReport {
        let clock = Stopwatch::start();
        let mut warnings = Vec::new();

        if outputs.image.exists() {
            tracing::info!(view = %name, "image exists; skipping");
            return ViewReport {
                view: name,
                image: outputs.image,
                outcome: ViewOutcome::Skipped,
                warnings,
                elapsed: clock.elapsed(),
            };
        }

        let call = RpictCall {
            program: self.program.to_path_buf(),
            preset: self.opts.preset,
            view: view.to_path_buf(),
            resolution: self.opts.resolution,
            threads: self.opts.effective_threads(),
            ambient: outputs.ambient.clone(),
            octree: self.octree.to_path_buf(),
            envs: self.envs.to_vec(),
        };

        if !outputs.ambient.exists() {
            tracing::info!(view = %name, "overture pass");
            *invocations += 1;
            if let Err(e) = self.runner.run_checked(&call.overture_spec()) {
                let warning = format!("overture pass failed: {e}");
                tracing::warn!(view = %name, "{warning}");
                warnings.push(warning);
            }
        }

        tracing::info!(view = %name, "main pass");
        *invocations += 1;
        let main = self.runner.run(&call.main_spec(&outputs.image));
        let failure = match main {
            Ok(out) if out.success() => None,
            Ok(out) => Some((
                out.code,
                format!("renderer exited with {}: {}", describe_code(out.code), out.stderr.trim()),
            )),
            Err(e) => Some((None, e.to_string())),
        };
        if let Some((code, message)) = failure {
            tracing::error!(view = %name, "{message}");
            remove_partial(&outputs.image, &mut warnings);
            return ViewReport {
                view: name,
                image: outputs.image,
                outcome: ViewOutcome::Failed { code, message },
                warnings,
                elapsed: clock.elapsed(),
            };
        }

        let filtered = if self.opts.resolution >= HIGH_RES_THRESHOLD {
            match apply_post_filter(
                self.opts.post_filter,
                self.runner,
                self.pfilt,
                self.envs,
                &outputs.image,
                &outputs.filtered,
            ) {
                Ok(()) => Some(outputs.filtered),
                Err(e) => {
                    let warning = format!("post filter failed: {e}");
                    tracing::warn!(view = %name, "{warning}");
                    warnings.push(warning);
                    remove_partial(&outputs.filtered, &mut warnings);
                    None
                }
            }
        } else {
            None
        };

        let elapsed = clock.elapsed();
        tracing::info!(view = %name, "done in {}", format_minutes_seconds(elapsed));
        ViewReport {
            view: name,
            image: outputs.image,
            outcome: ViewOutcome::Rendered { filtered },
            warnings,
            elapsed,
        }
    }
}

pub(crate) fn remove_partial(path: &Path, warnings: &mut Vec<String>) {
    if !path.exists() {
        return;
    }
    if let Err(e) = std::fs::remove_file(path) {
        let warning = format!("could not remove partial '{}': {e}", path.display());
        tracing::warn!("{warning}");
        warnings.push(warning);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/batch.rs"]
mod tests;
