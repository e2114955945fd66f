use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;

use crate::config::{ProjectLayout, ToolPaths};
use crate::foundation::elapsed::{Stopwatch, format_minutes_seconds};
use crate::foundation::error::{ArchilumeError, ArchilumeResult};
use crate::process::{CommandRunner, runner::describe_code};
use crate::render::batch::{
    BatchRenderOpts, BatchReport, RenderBackend, ViewOutcome, discover_views, remove_partial,
    render_batch, resolve_renderer, validate_resolution,
};
use crate::render::gpu::detect_cuda_env;
use crate::render::naming::{combined_path, stem_of, sum_path, sun_image_file_name};
use crate::render::post::{PostFilter, pcomb_sum_spec, pfilt_exposure_spec};
use crate::render::preset::QualityPreset;
use crate::render::rpict::direct_sun_spec;
use crate::scene::octree::{compile_sky_octree, skyless_base, sky_octree_path};

/// Sunlight render options.
#[derive(Clone, Debug)]
pub struct SunlightOpts {
    /// Skyless octree base name under `outputs/octree`, e.g. `tower_with_site_skyless`.
    pub skyless: String,
    /// Overcast sky giving the indirect component.
    pub overcast_sky: PathBuf,
    /// Sunny skies, one direct-sun pass per sky and view.
    pub skies: Vec<PathBuf>,
    /// Preset for the overcast batch.
    pub preset: QualityPreset,
    /// Square output resolution, shared by every pass.
    pub resolution: u32,
    /// Single view name; all views when `None`.
    pub view: Option<String>,
    /// Renderer build.
    pub backend: RenderBackend,
    /// Thread override.
    pub threads: Option<u32>,
    /// High-resolution filter for the overcast batch.
    pub post_filter: PostFilter,
    /// Fail pre-flight when the renderer executable cannot be found.
    pub require_renderer: bool,
}

impl SunlightOpts {
    /// Options with batch defaults for everything but the inputs and preset.
    pub fn new(
        skyless: impl Into<String>,
        overcast_sky: impl Into<PathBuf>,
        skies: Vec<PathBuf>,
        preset: QualityPreset,
    ) -> Self {
        let defaults = BatchRenderOpts::new("", preset);
        Self {
            skyless: skyless.into(),
            overcast_sky: overcast_sky.into(),
            skies,
            preset,
            resolution: defaults.resolution,
            view: None,
            backend: defaults.backend,
            threads: None,
            post_filter: defaults.post_filter,
            require_renderer: true,
        }
    }

    /// Threads passed to `-t`.
    pub fn effective_threads(&self) -> u32 {
        self.threads
            .filter(|t| *t > 0)
            .unwrap_or_else(|| self.backend.default_threads())
    }

    /// Batch options for the overcast octree `scene`.
    pub fn overcast_batch(&self, scene: impl Into<String>) -> BatchRenderOpts {
        BatchRenderOpts {
            scene: scene.into(),
            preset: self.preset,
            resolution: self.resolution,
            view: self.view.clone(),
            backend: self.backend,
            threads: self.threads,
            post_filter: self.post_filter,
            require_renderer: self.require_renderer,
        }
    }
}

/// One sky and view of the direct-sun stage.
#[derive(Clone, Debug, serde::Serialize)]
pub struct SunPassReport {
    /// Sky file stem.
    pub sky: String,
    /// View base name.
    pub view: String,
    /// Direct-sun image.
    pub image: PathBuf,
    /// Direct-sun result. `filtered` is always `None` here.
    pub outcome: ViewOutcome,
    /// Overcast plus direct-sun image, when the merge ran or had already run.
    pub combined: Option<PathBuf>,
    /// Recoverable problems (merge failures, missing overcast image).
    pub warnings: Vec<String>,
    /// Wall time for the pass and its merge.
    pub elapsed: Duration,
}

/// Summary of a sunlight run.
#[derive(Clone, Debug, Default, serde::Serialize)]
pub struct SunlightReport {
    /// The overcast batch.
    pub overcast: BatchReport,
    /// Sunny sky octrees available to the direct-sun stage.
    pub sky_octrees: Vec<PathBuf>,
    /// Direct-sun passes, sky-major.
    pub passes: Vec<SunPassReport>,
    /// Run-level warnings (sky octree failures, GPU query fallback).
    pub warnings: Vec<String>,
    /// Total wall time.
    pub elapsed: Duration,
    /// Direct-sun renderer processes started.
    pub invocations: usize,
}

impl SunlightReport {
    fn count(&self, pred: impl Fn(&SunPassReport) -> bool) -> usize {
        self.passes.iter().filter(|p| pred(p)).count()
    }

    /// Direct-sun images rendered in this run.
    pub fn rendered(&self) -> usize {
        self.count(|p| matches!(p.outcome, ViewOutcome::Rendered { .. }))
    }

    /// Direct-sun images that already existed.
    pub fn skipped(&self) -> usize {
        self.count(|p| matches!(p.outcome, ViewOutcome::Skipped))
    }

    /// Failed direct-sun passes, including those whose sky octree could not be built.
    pub fn failed(&self) -> usize {
        self.count(|p| matches!(p.outcome, ViewOutcome::Failed { .. }))
    }

    /// Passes with a merged image.
    pub fn combined(&self) -> usize {
        self.count(|p| p.combined.is_some())
    }
}

/// Overcast indirect batch, then one direct-sun pass per sunny sky and view, each merged with
/// the overcast image of its view.
///
/// Pre-flight problems and a failed overcast octree return `Err`. After that, failures are
/// recorded per pass and the run continues.
#[tracing::instrument(
    skip_all,
    fields(skyless = %opts.skyless, skies = opts.skies.len(), resolution = opts.resolution, backend = %opts.backend)
)]
pub fn render_sunlight(
    runner: &dyn CommandRunner,
    layout: &ProjectLayout,
    tools: &ToolPaths,
    opts: &SunlightOpts,
) -> ArchilumeResult<SunlightReport> {
    let clock = Stopwatch::start();

    validate_resolution(opts.resolution)?;
    let program = resolve_renderer(opts.backend, tools, opts.require_renderer)?;

    let skyless = layout.octree_path(&opts.skyless);
    if !skyless.is_file() {
        return Err(ArchilumeError::not_found("skyless octree", skyless));
    }
    if opts.skies.is_empty() {
        return Err(ArchilumeError::validation("no sunny sky files given"));
    }
    if !opts.overcast_sky.is_file() {
        return Err(ArchilumeError::not_found("overcast sky", &opts.overcast_sky));
    }
    if let Some(missing) = opts.skies.iter().find(|s| !s.is_file()) {
        return Err(ArchilumeError::not_found("sky file", missing));
    }
    let views = discover_views(&layout.view_dir(), opts.view.as_deref())?;

    let image_dir = layout.image_dir();
    std::fs::create_dir_all(&image_dir)
        .with_context(|| format!("failed to create '{}'", image_dir.display()))?;

    tracing::info!(
        views = views.len(),
        started = %clock.started_at(),
        "sunlight start"
    );

    let overcast_octree = sky_octree(runner, tools, &skyless, &opts.overcast_sky)?;
    let overcast = render_batch(
        runner,
        layout,
        tools,
        &opts.overcast_batch(stem_of(&overcast_octree)),
    )?;
    let overcast_images: BTreeMap<String, PathBuf> = overcast
        .views
        .iter()
        .filter(|v| !matches!(v.outcome, ViewOutcome::Failed { .. }))
        .map(|v| (v.view.clone(), v.image.clone()))
        .collect();

    let mut report = SunlightReport {
        overcast,
        ..SunlightReport::default()
    };

    let mut envs = tools.renderer_env();
    if opts.backend == RenderBackend::Gpu {
        let (cuda, warning) = detect_cuda_env(runner);
        envs.extend(cuda);
        report.warnings.extend(warning);
    }

    let pass_ctx = PassContext {
        runner,
        program: &program,
        resolution: opts.resolution,
        threads: opts.effective_threads(),
        envs: &envs,
        base: skyless_base(&skyless),
        image_dir: &image_dir,
        overcast_images: &overcast_images,
        pcomb: tools.radiance_tool("pcomb"),
        pfilt: tools.radiance_tool("pfilt"),
    };

    for sky in &opts.skies {
        let sky_name = stem_of(sky);
        let octree = match sky_octree(runner, tools, &skyless, sky) {
            Ok(octree) => octree,
            Err(e) => {
                let warning = format!("sky octree for '{sky_name}' failed: {e}");
                tracing::error!("{warning}");
                for view in &views {
                    report.passes.push(SunPassReport {
                        sky: sky_name.clone(),
                        view: stem_of(view),
                        image: image_dir.join(sun_image_file_name(
                            &pass_ctx.base,
                            &stem_of(view),
                            &sky_name,
                        )),
                        outcome: ViewOutcome::Failed {
                            code: None,
                            message: warning.clone(),
                        },
                        combined: None,
                        warnings: Vec::new(),
                        elapsed: Duration::ZERO,
                    });
                }
                report.warnings.push(warning);
                continue;
            }
        };
        report.sky_octrees.push(octree.clone());

        for view in &views {
            let pass = pass_ctx.render_pass(view, &sky_name, &octree, &mut report.invocations);
            report.passes.push(pass);
        }
    }

    report.elapsed = clock.elapsed();
    let (finished, wall) = clock.wall_clock();
    tracing::info!(
        rendered = report.rendered(),
        skipped = report.skipped(),
        failed = report.failed(),
        combined = report.combined(),
        finished = %finished,
        wall = %format_minutes_seconds(wall),
        "sunlight finished in {}",
        format_minutes_seconds(report.elapsed)
    );
    Ok(report)
}

/// Existing sky octree, or a freshly compiled one.
fn sky_octree(
    runner: &dyn CommandRunner,
    tools: &ToolPaths,
    skyless: &Path,
    sky: &Path,
) -> ArchilumeResult<PathBuf> {
    let octree = sky_octree_path(skyless, sky);
    if octree.is_file() {
        tracing::info!(octree = %octree.display(), "sky octree exists; skipping");
        return Ok(octree);
    }
    compile_sky_octree(runner, tools, skyless, sky)
}

struct PassContext<'a> {
    runner: &'a dyn CommandRunner,
    program: &'a Path,
    resolution: u32,
    threads: u32,
    envs: &'a [(String, String)],
    base: String,
    image_dir: &'a Path,
    overcast_images: &'a BTreeMap<String, PathBuf>,
    pcomb: PathBuf,
    pfilt: PathBuf,
}

impl PassContext<'_> {
    fn render_pass(
        &self,
        view: &Path,
        sky: &str,
        octree: &Path,
        invocations: &mut usize,
    ) -> SunPassReport {
        let clock = Stopwatch::start();
        let mut warnings = Vec::new();
        let name = stem_of(view);
        let image = self
            .image_dir
            .join(sun_image_file_name(&self.base, &name, sky));

        let outcome = if image.exists() {
            tracing::info!(view = %name, sky, "direct-sun image exists; skipping");
            ViewOutcome::Skipped
        } else {
            tracing::info!(view = %name, sky, "direct-sun pass");
            *invocations += 1;
            let spec = direct_sun_spec(
                self.program,
                view,
                self.resolution,
                self.threads,
                octree,
                &image,
                self.envs,
            );
            let failure = match self.runner.run(&spec) {
                Ok(out) if out.success() => None,
                Ok(out) => Some((
                    out.code,
                    format!(
                        "renderer exited with {}: {}",
                        describe_code(out.code),
                        out.stderr.trim()
                    ),
                )),
                Err(e) => Some((None, e.to_string())),
            };
            if let Some((code, message)) = failure {
                tracing::error!(view = %name, sky, "{message}");
                remove_partial(&image, &mut warnings);
                return SunPassReport {
                    sky: sky.to_string(),
                    view: name,
                    image,
                    outcome: ViewOutcome::Failed { code, message },
                    combined: None,
                    warnings,
                    elapsed: clock.elapsed(),
                };
            }
            ViewOutcome::Rendered { filtered: None }
        };

        let combined = self.merge(&name, &image, &mut warnings);
        SunPassReport {
            sky: sky.to_string(),
            view: name,
            image,
            outcome,
            combined,
            warnings,
            elapsed: clock.elapsed(),
        }
    }

    /// `pcomb` the overcast and direct-sun images, then `pfilt -1` the sum.
    fn merge(&self, view: &str, direct: &Path, warnings: &mut Vec<String>) -> Option<PathBuf> {
        let combined = combined_path(direct);
        if combined.exists() {
            return Some(combined);
        }
        let Some(overcast) = self.overcast_images.get(view).filter(|p| p.is_file()) else {
            let warning = format!("no overcast image for '{view}'; merge skipped");
            tracing::warn!("{warning}");
            warnings.push(warning);
            return None;
        };

        let sum = sum_path(direct);
        let merged = self
            .runner
            .run_checked(&pcomb_sum_spec(&self.pcomb, overcast, direct, &sum, self.envs))
            .and_then(|_| {
                self.runner
                    .run_checked(&pfilt_exposure_spec(&self.pfilt, &sum, &combined, self.envs))
            });
        remove_partial(&sum, warnings);

        match merged {
            Ok(_) => Some(combined),
            Err(e) => {
                let warning = format!("merge failed: {e}");
                tracing::warn!(view, "{warning}");
                warnings.push(warning);
                remove_partial(&combined, warnings);
                None
            }
        }
    }
}
