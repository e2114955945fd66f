use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use archilume::render::preset::PRESETS;
use archilume::render::{
    BatchRenderOpts, PostFilter, QualityPreset, RenderBackend, SunlightOpts, ViewOutcome,
};
use archilume::scene::SunnySkySeries;
use archilume::scene::sky::OVERCAST_SKY_FILE;
use archilume::{ArchilumeConfig, CommandRunner, RecordingRunner, SystemRunner};

#[derive(Parser, Debug)]
#[command(name = "archilume", version, about = "Radiance/Accelerad render orchestration")]
struct Cli {
    /// Project root holding `outputs/` (defaults to the current directory).
    #[arg(long, global = true)]
    project_root: Option<PathBuf>,

    /// JSON config file (defaults to `<project-root>/archilume.json` when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Accelerad installation root.
    #[arg(long, global = true)]
    accelerad_root: Option<PathBuf>,

    /// Radiance installation root.
    #[arg(long, global = true)]
    radiance_root: Option<PathBuf>,

    /// More log output (-v debug, -vv trace). `RUST_LOG` wins when set.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render every view (or one) of an octree.
    Render(RenderArgs),
    /// Overcast render plus one direct-sun render per sunny sky, merged per view.
    Sunlight(SunlightArgs),
    /// List quality presets.
    Presets(PresetsArgs),
    /// Write sky files into `outputs/sky`.
    Sky(SkyArgs),
    /// Write AOI and plan view files from a room-boundary CSV.
    Views(ViewsArgs),
    /// Convert OBJ/MTL geometry into a skyless octree.
    Octree(OctreeArgs),
    /// Combine a skyless octree with sky files.
    SkyOctree(SkyOctreeArgs),
    /// Tone-map an HDR image to PNG.
    Preview(PreviewArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Octree base name in `outputs/octree` (without `.oct`).
    #[arg(long)]
    octree: String,

    /// Quality preset.
    #[arg(long, default_value = "draft")]
    quality: String,

    /// Square image resolution (128..=8192).
    #[arg(long, default_value_t = 1024)]
    resolution: u32,

    /// Render a single view (base name in `outputs/view`).
    #[arg(long)]
    view: Option<String>,

    /// Renderer build.
    #[arg(long, value_enum, default_value_t = BackendChoice::Gpu)]
    backend: BackendChoice,

    /// Renderer threads (default 1 on GPU, 2 on CPU).
    #[arg(long)]
    threads: Option<u32>,

    /// Filter for high-resolution images.
    #[arg(long, value_enum, default_value_t = FilterChoice::Pfilt)]
    post_filter: FilterChoice,

    /// Print the commands instead of running them.
    #[arg(long)]
    dry_run: bool,

    /// Print the batch report as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Parser, Debug)]
struct SunlightArgs {
    /// Skyless octree base name in `outputs/octree`.
    #[arg(long)]
    skyless: String,

    /// Overcast sky (defaults to `outputs/sky/TenK_cie_overcast.rad`).
    #[arg(long)]
    overcast: Option<PathBuf>,

    /// Sunny sky files (defaults to every `.sky` file in `outputs/sky`).
    #[arg(long = "sky")]
    skies: Vec<PathBuf>,

    /// Quality preset for the overcast pass.
    #[arg(long, default_value = "draft")]
    quality: String,

    /// Square image resolution (128..=8192).
    #[arg(long, default_value_t = 1024)]
    resolution: u32,

    /// Render a single view (base name in `outputs/view`).
    #[arg(long)]
    view: Option<String>,

    /// Renderer build.
    #[arg(long, value_enum, default_value_t = BackendChoice::Gpu)]
    backend: BackendChoice,

    /// Renderer threads (default 1 on GPU, 2 on CPU).
    #[arg(long)]
    threads: Option<u32>,

    /// Print the run report as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BackendChoice {
    Gpu,
    Cpu,
}

impl From<BackendChoice> for RenderBackend {
    fn from(choice: BackendChoice) -> Self {
        match choice {
            BackendChoice::Gpu => RenderBackend::Gpu,
            BackendChoice::Cpu => RenderBackend::Cpu,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FilterChoice {
    Pfilt,
    Native,
}

impl From<FilterChoice> for PostFilter {
    fn from(choice: FilterChoice) -> Self {
        match choice {
            FilterChoice::Pfilt => PostFilter::Pfilt,
            FilterChoice::Native => PostFilter::Native,
        }
    }
}

#[derive(Parser, Debug)]
struct PresetsArgs {
    /// Emit JSON instead of a table.
    #[arg(long)]
    json: bool,
}

#[derive(Parser, Debug)]
struct SkyArgs {
    #[command(subcommand)]
    kind: SkyKind,
}

#[derive(Subcommand, Debug)]
enum SkyKind {
    /// One sunny sky per time step.
    Sunny {
        /// Latitude in decimal degrees, positive north.
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        /// Month (1-12).
        #[arg(long)]
        month: u32,
        /// Day of month.
        #[arg(long)]
        day: u32,
        /// First hour, solar time.
        #[arg(long)]
        start_hour: u32,
        /// Last hour, solar time.
        #[arg(long)]
        end_hour: u32,
        /// Minutes between skies.
        #[arg(long, default_value_t = 5)]
        step: u32,
    },
    /// CIE overcast sky.
    Overcast,
}

#[derive(Parser, Debug)]
struct ViewsArgs {
    /// Room-boundary CSV.
    #[arg(long)]
    csv: PathBuf,

    /// Camera height above floor level, metres.
    #[arg(long, default_value_t = archilume::scene::view::DEFAULT_FFL_OFFSET)]
    ffl_offset: f64,
}

#[derive(Parser, Debug)]
struct OctreeArgs {
    /// OBJ files; the first one names the octree.
    #[arg(long = "obj", required = true)]
    objs: Vec<PathBuf>,

    /// MTL files.
    #[arg(long = "mtl")]
    mtls: Vec<PathBuf>,
}

#[derive(Parser, Debug)]
struct SkyOctreeArgs {
    /// Skyless octree.
    #[arg(long)]
    skyless: PathBuf,

    /// Sky files (defaults to every file in `outputs/sky`).
    #[arg(long = "sky")]
    skies: Vec<PathBuf>,
}

#[derive(Parser, Debug)]
struct PreviewArgs {
    /// Radiance HDR image.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG (defaults to the input with a `.png` extension).
    #[arg(long)]
    out: Option<PathBuf>,

    /// Exposure adjustment in stops.
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    exposure: f32,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new(level),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut cfg = ArchilumeConfig::load(cli.project_root.as_deref(), cli.config.as_deref())
        .context("load configuration")?;
    if let Some(root) = cli.accelerad_root {
        cfg.accelerad_root = root;
    }
    if let Some(root) = cli.radiance_root {
        cfg.radiance_root = root;
    }
    tracing::debug!(?cfg, "configuration");

    match cli.cmd {
        Command::Render(args) => cmd_render(&cfg, args),
        Command::Sunlight(args) => cmd_sunlight(&cfg, args),
        Command::Presets(args) => cmd_presets(args),
        Command::Sky(args) => cmd_sky(&cfg, args),
        Command::Views(args) => cmd_views(&cfg, args),
        Command::Octree(args) => cmd_octree(&cfg, args),
        Command::SkyOctree(args) => cmd_sky_octree(&cfg, args),
        Command::Preview(args) => cmd_preview(args),
    }
}

fn cmd_render(cfg: &ArchilumeConfig, args: RenderArgs) -> anyhow::Result<()> {
    let preset = QualityPreset::lookup(&args.quality)?;
    let mut opts = BatchRenderOpts::new(args.octree, preset);
    opts.resolution = args.resolution;
    opts.view = args.view;
    opts.backend = args.backend.into();
    opts.threads = args.threads;
    opts.post_filter = args.post_filter.into();
    opts.require_renderer = !args.dry_run;

    let layout = cfg.layout();
    let tools = cfg.tools();

    let recorder = RecordingRunner::new();
    let runner: &dyn CommandRunner = if args.dry_run {
        &recorder
    } else {
        &SystemRunner
    };

    let report = archilume::render_batch(runner, &layout, &tools, &opts)
        .with_context(|| format!("render '{}'", opts.scene))?;

    if args.dry_run {
        for call in recorder.calls() {
            println!("{}", call.display_line());
        }
    }

    for view in &report.views {
        match &view.outcome {
            ViewOutcome::Failed { message, .. } => {
                tracing::error!(view = %view.view, "failed: {message}");
            }
            ViewOutcome::Rendered {
                filtered: Some(filtered),
            } => {
                tracing::info!(view = %view.view, filtered = %filtered.display(), "rendered");
            }
            ViewOutcome::Rendered { filtered: None } => {
                tracing::info!(view = %view.view, "rendered");
            }
            ViewOutcome::Skipped => {}
        }
    }
    if report.failed() > 0 {
        tracing::warn!(failed = ?report.failed_views(), "some views failed; re-run to retry them");
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}

fn cmd_sunlight(cfg: &ArchilumeConfig, args: SunlightArgs) -> anyhow::Result<()> {
    let preset = QualityPreset::lookup(&args.quality)?;
    let layout = cfg.layout();
    let sky_dir = layout.sky_dir();
    let skies = if args.skies.is_empty() {
        list_sky_files(&sky_dir, &["sky"])?
    } else {
        args.skies
    };
    let overcast = args
        .overcast
        .unwrap_or_else(|| sky_dir.join(OVERCAST_SKY_FILE));

    let mut opts = SunlightOpts::new(args.skyless, overcast, skies, preset);
    opts.resolution = args.resolution;
    opts.view = args.view;
    opts.backend = args.backend.into();
    opts.threads = args.threads;

    let report = archilume::render_sunlight(&SystemRunner, &layout, &cfg.tools(), &opts)
        .with_context(|| format!("sunlight '{}'", opts.skyless))?;

    for pass in &report.passes {
        if let ViewOutcome::Failed { message, .. } = &pass.outcome {
            tracing::error!(view = %pass.view, sky = %pass.sky, "failed: {message}");
        }
    }
    eprintln!(
        "{} direct-sun images rendered, {} skipped, {} failed, {} merged",
        report.rendered(),
        report.skipped(),
        report.failed(),
        report.combined()
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}

fn cmd_presets(args: PresetsArgs) -> anyhow::Result<()> {
    if args.json {
        println!("{}", serde_json::to_string_pretty(&PRESETS)?);
        return Ok(());
    }
    println!(
        "{:<9} {:>5} {:>3} {:>5} {:>5} {:>5} {:>3} {:>5} {:>3} {:>7}  direct",
        "name", "aa", "ab", "ad", "as", "ar", "ps", "pt", "lr", "lw"
    );
    for p in &PRESETS {
        let direct = match p.direct {
            Some(d) => format!(
                "dj={} ds={} dt={} dc={} dr={} dp={}",
                d.jitter, d.substructure, d.threshold, d.certainty, d.relays, d.pretest_density
            ),
            None => "-".to_string(),
        };
        println!(
            "{:<9} {:>5} {:>3} {:>5} {:>5} {:>5} {:>3} {:>5} {:>3} {:>7}  {direct}",
            p.name,
            p.ambient_accuracy,
            p.ambient_bounces,
            p.ambient_divisions,
            p.ambient_super_samples,
            p.ambient_resolution,
            p.pixel_sample,
            p.pixel_threshold,
            p.limit_reflection,
            p.limit_weight,
        );
    }
    Ok(())
}

fn cmd_sky(cfg: &ArchilumeConfig, args: SkyArgs) -> anyhow::Result<()> {
    let sky_dir = cfg.layout().sky_dir();
    match args.kind {
        SkyKind::Sunny {
            lat,
            month,
            day,
            start_hour,
            end_hour,
            step,
        } => {
            let series = SunnySkySeries {
                latitude: lat,
                month,
                day,
                start_hour,
                end_hour,
                minute_step: step,
            };
            let files = series.write(&sky_dir)?;
            eprintln!("wrote {} sky files to {}", files.len(), sky_dir.display());
        }
        SkyKind::Overcast => {
            let path = archilume::scene::write_overcast_sky(&sky_dir)?;
            eprintln!("wrote {}", path.display());
        }
    }
    Ok(())
}

fn cmd_views(cfg: &ArchilumeConfig, args: ViewsArgs) -> anyhow::Result<()> {
    let layout = cfg.layout();
    let out = archilume::scene::generate_views(
        &args.csv,
        &layout.aoi_dir(),
        &layout.view_dir(),
        args.ffl_offset,
    )?;
    eprintln!(
        "wrote {} AOI files and {} plan views",
        out.aoi_files.len(),
        out.view_files.len()
    );
    Ok(())
}

fn cmd_octree(cfg: &ArchilumeConfig, args: OctreeArgs) -> anyhow::Result<()> {
    let out = archilume::scene::compile_scene_octree(
        &SystemRunner,
        &cfg.layout(),
        &cfg.tools(),
        &args.objs,
        &args.mtls,
    )?;
    if out.reused {
        eprintln!("kept existing {}", out.octree.display());
    } else {
        eprintln!("wrote {}", out.octree.display());
    }
    Ok(())
}

fn list_sky_files(dir: &Path, extensions: &[&str]) -> anyhow::Result<Vec<PathBuf>> {
    let mut skies = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("list '{}'", dir.display()))? {
        let path = entry?.path();
        if path
            .extension()
            .is_some_and(|e| extensions.iter().any(|x| e == *x))
        {
            skies.push(path);
        }
    }
    skies.sort();
    Ok(skies)
}

fn cmd_sky_octree(cfg: &ArchilumeConfig, args: SkyOctreeArgs) -> anyhow::Result<()> {
    let skies = if args.skies.is_empty() {
        list_sky_files(&cfg.layout().sky_dir(), &["sky", "rad"])?
    } else {
        args.skies
    };
    if skies.is_empty() {
        anyhow::bail!("no sky files given and none found in outputs/sky");
    }
    let out =
        archilume::scene::compile_sky_octrees(&SystemRunner, &cfg.tools(), &args.skyless, &skies)?;
    eprintln!("wrote {} octrees", out.len());
    Ok(())
}

fn cmd_preview(args: PreviewArgs) -> anyhow::Result<()> {
    let out = args
        .out
        .unwrap_or_else(|| args.in_path.with_extension("png"));
    archilume::render::post::hdr_to_png(&args.in_path, &out, args.exposure)
        .with_context(|| format!("preview '{}'", args.in_path.display()))?;
    eprintln!("wrote {}", out.display());
    Ok(())
}
