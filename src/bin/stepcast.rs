use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context as _, bail};
use clap::Parser;

use stepcast::{
    AnimationKind, BatchOpts, BatchReport, BuildResult, CaptureKind, ChromiumCaptureOpts,
    MediaTools, MergerKind, Orchestrator, PipelineOpts, Ports, StudioConfig, SynthesizerKind,
    SynthesizerOpts,
};

#[derive(Parser, Debug)]
#[command(
    name = "stepcast",
    version,
    about = "Build narrated algorithm videos from scene files"
)]
struct Cli {
    /// Scene file, or a directory searched for `scene.json` files (with `--all`).
    path: PathBuf,

    /// Build every `scene.json` below PATH.
    #[arg(long)]
    all: bool,

    /// Speech engine.
    #[arg(long, value_enum)]
    tts: Option<SynthesizerKind>,

    /// Engine-specific voice name.
    #[arg(long)]
    voice: Option<String>,

    /// OpenAI speech model.
    #[arg(long)]
    openai_model: Option<String>,

    /// Piper `.onnx` voice model.
    #[arg(long)]
    piper_model: Option<PathBuf>,

    /// Animation renderer.
    #[arg(long, value_enum, default_value_t = AnimationKind::Html)]
    animation: AnimationKind,

    /// Output directory (one sub-directory per scene).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Config file (defaults to `stepcast.toml` in the working directory, if present).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Validate only; nothing is synthesized or written.
    #[arg(long)]
    dry_run: bool,

    /// Synthesize the steps of a scene concurrently.
    #[arg(long)]
    parallel_tts: bool,

    /// Scenes built concurrently with `--all`.
    #[arg(long)]
    jobs: Option<usize>,

    /// Keep existing step audio and only re-measure it.
    #[arg(long)]
    reuse_audio: bool,

    /// Print the results as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,

    /// `ffmpeg` binary.
    #[arg(long)]
    ffmpeg: Option<PathBuf>,

    /// `ffprobe` binary.
    #[arg(long)]
    ffprobe: Option<PathBuf>,

    /// Chromium binary used for capture.
    #[arg(long)]
    chromium: Option<PathBuf>,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cwd = std::env::current_dir().context("resolve working directory")?;
    let mut cfg = StudioConfig::discover(cli.config.as_deref(), &cwd)?;
    apply_overrides(&mut cfg, &cli);
    cfg.validate()?;

    let paths = scene_paths(&cli.path, cli.all)?;
    tracing::info!(scenes = paths.len(), dry_run = cli.dry_run, "starting");

    let report = if cli.dry_run {
        stepcast::dry_run_batch(&paths)?
    } else {
        let orchestrator = build_orchestrator(&cfg, &cli)?;
        let opts = BatchOpts {
            dry_run: false,
            jobs: cli.jobs,
        };
        stepcast::build_batch(&orchestrator, &paths, &opts)?
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(if report.all_succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// CLI flags win over the config file, which wins over defaults.
fn apply_overrides(cfg: &mut StudioConfig, cli: &Cli) {
    if let Some(out) = &cli.output {
        cfg.output_dir = Some(out.clone());
    }
    if let Some(kind) = cli.tts {
        cfg.speech.engine = kind;
    }
    if let Some(voice) = &cli.voice {
        cfg.speech.voice = Some(voice.clone());
    }
    if let Some(model) = &cli.openai_model {
        cfg.speech.openai_model = model.clone();
    }
    if let Some(model) = &cli.piper_model {
        cfg.speech.piper_model = Some(model.clone());
    }
    if cli.parallel_tts {
        cfg.speech.parallel = true;
    }
    if cli.reuse_audio {
        cfg.speech.reuse_audio = true;
    }
    if let Some(p) = &cli.ffmpeg {
        cfg.tools.ffmpeg = p.clone();
    }
    if let Some(p) = &cli.ffprobe {
        cfg.tools.ffprobe = p.clone();
    }
    if let Some(p) = &cli.chromium {
        cfg.tools.chromium = p.clone();
    }
}

fn scene_paths(path: &Path, all: bool) -> anyhow::Result<Vec<PathBuf>> {
    if path.is_dir() {
        if !all {
            bail!(
                "'{}' is a directory; pass --all to build every scene.json below it",
                path.display()
            );
        }
        let found = stepcast::find_scene_files(path)?;
        if found.is_empty() {
            bail!("no {} found below '{}'", stepcast::SCENE_FILE_NAME, path.display());
        }
        return Ok(found);
    }
    if !path.exists() {
        bail!("scene file not found: '{}'", path.display());
    }
    Ok(vec![path.to_path_buf()])
}

fn build_orchestrator(cfg: &StudioConfig, cli: &Cli) -> anyhow::Result<Orchestrator> {
    let tools = MediaTools::from(&cfg.tools);

    let synthesizer = stepcast::create_synthesizer(
        cfg.speech.engine,
        &SynthesizerOpts::from_config(&cfg.speech, &cfg.tools),
    )?;
    let renderer = stepcast::create_renderer(cli.animation)?;
    let capture = stepcast::create_capture(
        CaptureKind::Chromium,
        ChromiumCaptureOpts::from_config(&cfg.tools, &cfg.capture),
    )?;
    let merger = stepcast::create_merger(MergerKind::Ffmpeg, &tools)?;

    let opts = PipelineOpts {
        output_dir: cfg
            .output_dir
            .clone()
            .unwrap_or_else(|| PipelineOpts::default().output_dir),
        parallel_synthesis: cfg.speech.parallel,
        synthesis_threads: cfg.speech.threads,
        reuse_audio: cfg.speech.reuse_audio,
    };

    Ok(Orchestrator::new(
        Ports {
            synthesizer,
            renderer,
            capture,
            merger,
        },
        opts,
    ))
}

fn print_report(report: &BatchReport) {
    for result in &report.results {
        print_result(result);
    }
    println!();
    println!(
        "{} scene(s): {} succeeded, {} failed",
        report.total(),
        report.succeeded(),
        report.failed()
    );
    for failed in report.failures() {
        println!(
            "  {}: {}",
            failed.scene_id,
            failed.error_message().unwrap_or("unknown error")
        );
    }
}

fn print_result(result: &BuildResult) {
    match (&result.failure, result.dry_run) {
        (None, true) => println!("ok    {} (would build)", result.scene_id),
        (None, false) => {
            let out = result
                .output_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            let total = result
                .timing
                .as_ref()
                .map(|t| format!(" {:.2}s", t.total()))
                .unwrap_or_default();
            println!("ok    {}{total} -> {out}", result.scene_id);
        }
        (Some(failure), dry_run) => {
            let verb = if dry_run { "would fail" } else { "failed" };
            println!(
                "FAIL  {} {verb} in {} ({}): {}",
                result.scene_id, failure.stage, failure.kind, failure.message
            );
            for (name, path) in &result.intermediates {
                println!("        {name}: {}", path.display());
            }
        }
    }
}
