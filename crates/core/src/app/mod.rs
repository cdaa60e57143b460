use crate::capture::FrameSource;
use crate::chart::EmotionChart;
use crate::classify::EmotionClassifier;
use crate::config::AppConfig;
use crate::emotion::{EmotionLabel, EmotionTally, Sampler, SamplerChannels};
use crate::player::{AudioOutput, MusicPlayer};
use crate::scene::{LoadedModel, ModelSource, SceneDriver};
use crate::storage::TrackStore;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{self, Instant, MissedTickBehavior};

const FRAME_TICK: Duration = Duration::from_millis(16);

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("ui event channel closed")]
    ChannelClosed,
}

#[derive(Clone, Debug, PartialEq)]
pub enum UiEvent {
    PointerMoved { x: f64 },
    PointerReleased,
    PlayPressed,
    Quit,
}

/// The one screen of the application: scene, sampler, chart, and player.
///
/// Everything runs on a single cooperative select loop except the sampler's
/// two timers, which hold their own independently cancellable task handles.
/// The sampler is absent when no camera could be acquired; the rest of the
/// screen stays interactive.
pub struct App<C, S, O, M> {
    pub frames: Option<Arc<dyn FrameSource>>,
    pub classifier: C,
    pub store: S,
    pub output: O,
    pub model: M,
    pub chart: EmotionChart,
    pub config: AppConfig,
}

impl<C, S, O, M> App<C, S, O, M>
where
    C: EmotionClassifier + Clone + 'static,
    S: TrackStore,
    O: AudioOutput,
    M: ModelSource,
{
    pub async fn run(self, mut ui_rx: mpsc::Receiver<UiEvent>) -> Result<(), AppError> {
        let App {
            frames,
            classifier,
            store,
            output,
            model,
            mut chart,
            config,
        } = self;

        // Rendering suspends until the asset resolves. A failed load
        // degrades to an empty clip set; the rest stays interactive.
        let mut scene = match SceneDriver::start(&model, config.sensitivity).await {
            Ok(scene) => scene,
            Err(e) => {
                tracing::error!(error = %e, "model load failed; animating nothing");
                SceneDriver::with_model(LoadedModel::default(), config.sensitivity)
            }
        };

        let mut player = MusicPlayer::new(store, output, config.default_mood.clone());
        player.refresh_pool().await;

        let tally = Arc::new(Mutex::new(EmotionTally::new()));
        let (pct_tx, mut pct_rx) = mpsc::channel(8);
        let (mood_tx, mut mood_rx) = watch::channel(EmotionLabel::neutral());

        let sampler = frames.map(|frames| {
            Sampler::spawn(
                frames,
                classifier,
                Arc::clone(&tally),
                SamplerChannels {
                    percentages: pct_tx,
                    dominant: mood_tx,
                },
                config.cadence,
            )
        });

        let mut frame_tick = time::interval(FRAME_TICK);
        frame_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_frame = Instant::now();
        let mut mood_alive = true;
        let mut outcome = Ok(());

        loop {
            tokio::select! {
                maybe_event = ui_rx.recv() => match maybe_event {
                    Some(UiEvent::PointerMoved { x }) => scene.pointer_moved(x),
                    Some(UiEvent::PointerReleased) => scene.pointer_released(),
                    Some(UiEvent::PlayPressed) => {
                        if let Err(e) = player.play_random().await {
                            tracing::warn!(error = %e, "playback failed");
                        }
                    }
                    Some(UiEvent::Quit) => break,
                    None => {
                        outcome = Err(AppError::ChannelClosed);
                        break;
                    }
                },
                _ = frame_tick.tick() => {
                    let now = Instant::now();
                    scene.tick(now - last_frame);
                    last_frame = now;
                }
                changed = mood_rx.changed(), if mood_alive => match changed {
                    Ok(()) => {
                        let mood = mood_rx.borrow_and_update().clone();
                        tracing::info!(mood = %mood, "dominant emotion updated");
                        player.set_mood(mood).await;
                    }
                    Err(_) => mood_alive = false,
                },
                Some(percentages) = pct_rx.recv() => {
                    if let Err(e) = chart.update(&percentages) {
                        tracing::warn!(error = %e, "chart update failed");
                    }
                }
            }
        }

        if let Some(sampler) = sampler {
            sampler.shutdown().await;
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::DummyEmotionClassifier;
    use crate::config::{
        CaptureCadence, PointerSensitivity, StorageConfig, DEFAULT_CLASSIFIER_URL,
        DEFAULT_STORAGE_URL,
    };
    use crate::player::{DummyAudioOutput, OutputEvent};
    use crate::scene::GltfModelSource;
    use crate::storage::{DummyTrackStore, TrackUrl};
    use std::path::PathBuf;
    use url::Url;

    fn config() -> AppConfig {
        AppConfig {
            classifier_url: Url::parse(DEFAULT_CLASSIFIER_URL).expect("valid url"),
            storage: StorageConfig::new(DEFAULT_STORAGE_URL, "test.appspot.com".to_owned())
                .expect("valid storage config"),
            cadence: CaptureCadence::default(),
            sensitivity: PointerSensitivity::default(),
            default_mood: EmotionLabel::new("Happy").expect("valid label"),
            model_path: PathBuf::from("missing.gltf"),
            chart_path: PathBuf::from("unused.png"),
            camera_index: 0,
        }
    }

    fn app(
        store: DummyTrackStore,
        output: DummyAudioOutput,
    ) -> App<DummyEmotionClassifier, DummyTrackStore, DummyAudioOutput, GltfModelSource> {
        App {
            frames: None,
            classifier: DummyEmotionClassifier::new(EmotionLabel::neutral()),
            store,
            output,
            // Missing asset: exercises the degraded empty-clip-set path.
            model: GltfModelSource::new(PathBuf::from("missing.gltf")),
            chart: EmotionChart::new(PathBuf::from("unused.png")),
            config: config(),
        }
    }

    #[tokio::test]
    async fn play_event_reaches_the_player_and_quit_stops_the_loop() {
        let output = DummyAudioOutput::default();
        let track = TrackUrl(Url::parse("https://tracks.example/a.mp3").expect("valid url"));
        let store = DummyTrackStore::with_tracks(vec![track.clone()]);

        let (ui_tx, ui_rx) = mpsc::channel(8);
        let handle = tokio::spawn(app(store, output.clone()).run(ui_rx));

        ui_tx.send(UiEvent::PlayPressed).await.expect("send play");
        ui_tx.send(UiEvent::Quit).await.expect("send quit");

        handle.await.expect("join").expect("clean shutdown");
        assert_eq!(output.events(), vec![OutputEvent::Loaded(track)]);
    }

    #[tokio::test]
    async fn dropping_the_ui_channel_ends_the_run_with_an_error() {
        let (ui_tx, ui_rx) = mpsc::channel::<UiEvent>(8);
        let handle = tokio::spawn(app(DummyTrackStore::default(), DummyAudioOutput::default()).run(ui_rx));

        drop(ui_tx);

        let result = handle.await.expect("join");
        assert!(matches!(result, Err(AppError::ChannelClosed)));
    }
}
