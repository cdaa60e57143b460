#![deny(warnings)]

use anyhow::Context;
use clap::Parser;
use serenify_core::app::{App, UiEvent};
use serenify_core::capture::{FrameSource, StillFrameSource};
use serenify_core::chart::EmotionChart;
use serenify_core::classify::HttpEmotionClassifier;
use serenify_core::config::{
    resolve_string_with_default, AppConfig, CaptureCadence, Env, PointerSensitivity, StdEnv,
    StorageConfig, DEFAULT_CAPTURE_INTERVAL_MS, DEFAULT_CHART_PATH, DEFAULT_CLASSIFIER_URL,
    DEFAULT_MODEL_PATH, DEFAULT_MOOD, DEFAULT_POINTER_SENSITIVITY, DEFAULT_ROLLUP_INTERVAL_MS,
    DEFAULT_STORAGE_BUCKET, DEFAULT_STORAGE_URL, ENV_CLASSIFIER_URL, ENV_STORAGE_BUCKET,
    ENV_STORAGE_URL,
};
use serenify_core::emotion::EmotionLabel;
use serenify_core::player::RodioAudioOutput;
use serenify_core::scene::GltfModelSource;
use serenify_core::storage::HttpTrackStore;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "serenify")]
#[command(about = "Camera-driven mood jukebox: classifies webcam emotion, charts it, scores the room")]
struct Args {
    #[arg(long)]
    classifier_url: Option<String>,

    #[arg(long)]
    storage_url: Option<String>,

    #[arg(long)]
    storage_bucket: Option<String>,

    #[arg(long, default_value = DEFAULT_MODEL_PATH)]
    model: PathBuf,

    #[arg(long, default_value = DEFAULT_CHART_PATH)]
    chart: PathBuf,

    #[arg(long, default_value_t = DEFAULT_CAPTURE_INTERVAL_MS)]
    capture_interval_ms: u64,

    #[arg(long, default_value_t = DEFAULT_ROLLUP_INTERVAL_MS)]
    rollup_interval_ms: u64,

    #[arg(long, default_value_t = DEFAULT_POINTER_SENSITIVITY)]
    sensitivity: f64,

    #[arg(long, default_value = DEFAULT_MOOD)]
    mood: String,

    #[arg(long, default_value_t = 0)]
    camera_index: i32,

    /// Replay a PNG instead of opening a camera.
    #[arg(long)]
    still_frame: Option<PathBuf>,

    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;

    let env = StdEnv;
    let still_frame = args.still_frame.clone();
    let cfg = build_config(args, &env)?;

    tracing::info!(
        classifier = %cfg.classifier_url,
        storage = %cfg.storage.base_url,
        bucket = %cfg.storage.bucket,
        mood = %cfg.default_mood,
        "config loaded"
    );

    run_app(cfg, still_frame).await
}

async fn run_app(cfg: AppConfig, still_frame: Option<PathBuf>) -> anyhow::Result<()> {
    let frames = acquire_frames(&cfg, still_frame);
    let classifier = HttpEmotionClassifier::new(cfg.classifier_url.clone())?;
    let store = HttpTrackStore::new(cfg.storage.base_url.clone(), cfg.storage.bucket.clone())?;
    let output = RodioAudioOutput::new()?;
    let model = GltfModelSource::new(cfg.model_path.clone());
    let chart = EmotionChart::new(cfg.chart_path.clone());

    let (ui_tx, ui_rx) = mpsc::channel(16);
    tokio::spawn(read_ui_events(ui_tx));

    let app = App {
        frames,
        classifier,
        store,
        output,
        model,
        chart,
        config: cfg,
    };
    app.run(ui_rx).await?;

    Ok(())
}

fn acquire_frames(cfg: &AppConfig, still_frame: Option<PathBuf>) -> Option<Arc<dyn FrameSource>> {
    if let Some(path) = still_frame {
        return match StillFrameSource::open(&path) {
            Ok(source) => {
                let source: Arc<dyn FrameSource> = Arc::new(source);
                Some(source)
            }
            Err(e) => {
                tracing::error!(error = %e, "still frame unavailable; emotion sampling disabled");
                None
            }
        };
    }
    open_camera(cfg)
}

#[cfg(feature = "camera-opencv")]
fn open_camera(cfg: &AppConfig) -> Option<Arc<dyn FrameSource>> {
    match serenify_core::capture::OpenCvFrameSource::open(cfg.camera_index) {
        Ok(source) => {
            let source: Arc<dyn FrameSource> = Arc::new(source);
            Some(source)
        }
        Err(e) => {
            tracing::error!(error = %e, "camera unavailable; emotion sampling disabled");
            None
        }
    }
}

#[cfg(not(feature = "camera-opencv"))]
fn open_camera(_cfg: &AppConfig) -> Option<Arc<dyn FrameSource>> {
    tracing::warn!("built without camera support; emotion sampling disabled");
    None
}

/// Line protocol standing in for the original pointer/button surface:
/// `pointer <x>` (or `m <x>`), `release`, `play`, `quit`.
async fn read_ui_events(tx: mpsc::Sender<UiEvent>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let Some(event) = parse_ui_event(&line) else {
                    tracing::debug!(line = %line.trim(), "unrecognised input line");
                    continue;
                };
                let quit = event == UiEvent::Quit;
                if tx.send(event).await.is_err() || quit {
                    break;
                }
            }
            Ok(None) => {
                let _ = tx.send(UiEvent::Quit).await;
                break;
            }
            Err(e) => {
                tracing::warn!(error = %e, "stdin read failed");
                let _ = tx.send(UiEvent::Quit).await;
                break;
            }
        }
    }
}

fn parse_ui_event(line: &str) -> Option<UiEvent> {
    let mut parts = line.split_whitespace();
    match parts.next()? {
        "play" | "p" => Some(UiEvent::PlayPressed),
        "release" | "r" => Some(UiEvent::PointerReleased),
        "quit" | "q" => Some(UiEvent::Quit),
        "pointer" | "m" => parts
            .next()
            .and_then(|x| x.parse::<f64>().ok())
            .map(|x| UiEvent::PointerMoved { x }),
        _ => None,
    }
}

fn init_tracing(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(
            level
                .parse()
                .with_context(|| format!("invalid --log-level: {level}"))?,
        )
        .from_env_lossy();

    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

fn build_config(args: Args, env: &impl Env) -> anyhow::Result<AppConfig> {
    let classifier_url = Url::parse(&resolve_string_with_default(
        args.classifier_url,
        ENV_CLASSIFIER_URL,
        env,
        DEFAULT_CLASSIFIER_URL,
    ))?;
    let storage = StorageConfig::new(
        &resolve_string_with_default(args.storage_url, ENV_STORAGE_URL, env, DEFAULT_STORAGE_URL),
        resolve_string_with_default(
            args.storage_bucket,
            ENV_STORAGE_BUCKET,
            env,
            DEFAULT_STORAGE_BUCKET,
        ),
    )?;
    let cadence = CaptureCadence::new(args.capture_interval_ms, args.rollup_interval_ms)?;
    let sensitivity = PointerSensitivity::new(args.sensitivity)?;
    let default_mood = EmotionLabel::new(args.mood)?;

    Ok(AppConfig {
        classifier_url,
        storage,
        cadence,
        sensitivity,
        default_mood,
        model_path: args.model,
        chart_path: args.chart,
        camera_index: args.camera_index,
    })
}
