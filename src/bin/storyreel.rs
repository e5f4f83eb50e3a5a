use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(name = "storyreel", version)]
struct Cli {
    /// Configuration file (defaults to `$XDG_CONFIG_HOME/storyreel/config.json`).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the detected encoder inventory and the GPU preference options.
    Encoders,
    /// Resolve a GPU preference to the encoder profile a render would use.
    Select(SelectArgs),
    /// Render a scene list to `output.mp4` (requires `ffmpeg` on PATH).
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
struct SelectArgs {
    /// auto, cpu, intel, nvidia or amd.
    #[arg(long, default_value = "auto")]
    gpu: String,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// JSON array of `{image_path, audio_path, narration}` objects.
    #[arg(long)]
    scenes: PathBuf,

    /// Output folder; `output.mp4` is written inside it.
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// 9:16, 16:9 or 1:1.
    #[arg(long)]
    resolution: Option<String>,

    /// fit_screen or center_blur.
    #[arg(long)]
    positioning: Option<String>,

    /// Enable Ken Burns motion.
    #[arg(long)]
    motion: bool,

    /// Effect weight as `name=weight`, e.g. `zoom_in=40`. Repeatable.
    #[arg(long = "effect", value_name = "NAME=WEIGHT")]
    effects: Vec<String>,

    /// Silence after each narration, in seconds.
    #[arg(long)]
    pause: Option<String>,

    /// Motion speed percentage, 2 to 20.
    #[arg(long)]
    speed: Option<String>,

    /// auto, cpu, intel, nvidia or amd.
    #[arg(long)]
    gpu: Option<String>,

    /// Seed for effect selection.
    #[arg(long)]
    seed: Option<u64>,

    /// Delete each scene's narration audio after a successful render.
    #[arg(long)]
    cleanup_audio: bool,
}

#[derive(Serialize)]
struct EncodersReport {
    encoders: storyreel::EncoderInventory,
    preferences: Vec<storyreel::config::PreferenceOption>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut app = storyreel::AppConfig::load(cli.config.as_deref());
    app.logging.json |= cli.log_json;
    storyreel::init_logging(&app.logging);

    match cli.cmd {
        Command::Encoders => cmd_encoders(&app),
        Command::Select(args) => cmd_select(&app, args),
        Command::Render(args) => cmd_render(&app, args),
    }
}

fn cmd_encoders(app: &storyreel::AppConfig) -> anyhow::Result<()> {
    let prober = storyreel::EncoderProber::new(app.probe);
    let report = EncodersReport {
        encoders: prober.detect_available_encoders(&storyreel::SystemRunner),
        preferences: storyreel::encoder_preference_options(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn cmd_select(app: &storyreel::AppConfig, args: SelectArgs) -> anyhow::Result<()> {
    let preference = storyreel::EncoderPreference::parse_lenient(&args.gpu);
    let runner = storyreel::SystemRunner;
    let selector =
        storyreel::EncoderSelector::new(&runner, storyreel::EncoderProber::new(app.probe));
    let spec = selector.encoder_settings(preference);
    println!("{}", serde_json::to_string_pretty(&spec)?);
    Ok(())
}

fn cmd_render(app: &storyreel::AppConfig, args: RenderArgs) -> anyhow::Result<()> {
    let scenes = storyreel::load_scenes(&args.scenes)?;
    anyhow::ensure!(
        storyreel::encode::is_ffmpeg_on_path(),
        "ffmpeg is required for rendering but was not found on PATH"
    );

    let mut request = app.defaults.clone();
    if let Some(v) = args.resolution {
        request.resolution = v;
    }
    if let Some(v) = args.positioning {
        request.image_positioning = v;
    }
    if let Some(v) = args.pause {
        request.pause_duration = v;
    }
    if let Some(v) = args.speed {
        request.movement_speed = v;
    }
    if let Some(v) = args.gpu {
        request.gpu_acceleration = v;
    }
    request.enable_movement |= args.motion;
    for pair in &args.effects {
        let (name, weight) = pair
            .split_once('=')
            .with_context(|| format!("effect '{pair}' is not NAME=WEIGHT"))?;
        request
            .effect_fields
            .insert(format!("effect_{}", name.trim()), weight.trim().to_string());
    }
    let config = storyreel::RenderConfig::from_request(&request);

    let out_dir = args.out_dir.unwrap_or_else(|| app.output_folder.clone());
    let mut pipeline = storyreel::RenderPipeline::new(Arc::new(storyreel::SystemRunner))
        .with_prober(storyreel::EncoderProber::new(app.probe));
    if let Some(seed) = args.seed {
        pipeline = pipeline.with_seed(seed);
    }

    let outcome = pipeline
        .render(&scenes, &out_dir, &config)
        .context("render failed")?;

    if args.cleanup_audio {
        let removed = storyreel::cleanup_scene_audio(&scenes);
        tracing::info!(removed, "narration audio cleaned up");
    }

    eprintln!(
        "rendered {} scene(s) with {}{}",
        outcome.scenes_rendered,
        outcome.encoder.codec(),
        if outcome.used_fallback {
            " (fallback)"
        } else {
            ""
        }
    );
    println!("{}", outcome.output_path.display());
    Ok(())
}
