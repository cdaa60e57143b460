use crate::capture::FrameSource;
use crate::classify::EmotionClassifier;
use crate::config::CaptureCadence;
use crate::emotion::{EmotionLabel, EmotionTally};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Outputs the sampler publishes into: the per-sample percentage vector for
/// the chart, and the per-period dominant label for the composition.
pub struct SamplerChannels {
    pub percentages: mpsc::Sender<BTreeMap<String, f64>>,
    pub dominant: watch::Sender<EmotionLabel>,
}

/// The two periodic tasks behind the emotion readout: a capture task that
/// photographs and classifies every few seconds, and a rollup task that
/// reduces the collected labels to one dominant label per period.
///
/// Each task holds its own handle and is cancelled independently at
/// `shutdown`; there are no ambient timer ids.
pub struct Sampler {
    capture_task: JoinHandle<()>,
    rollup_task: JoinHandle<()>,
    frames: Arc<dyn FrameSource>,
}

impl Sampler {
    pub fn spawn<C>(
        frames: Arc<dyn FrameSource>,
        classifier: C,
        tally: Arc<Mutex<EmotionTally>>,
        channels: SamplerChannels,
        cadence: CaptureCadence,
    ) -> Self
    where
        C: EmotionClassifier + Clone + 'static,
    {
        let SamplerChannels {
            percentages,
            dominant,
        } = channels;

        let capture_task = {
            let frames = Arc::clone(&frames);
            let tally = Arc::clone(&tally);
            tokio::spawn(async move {
                let period = cadence.capture_interval();
                let mut ticker = time::interval_at(Instant::now() + period, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;

                    let frame = match frames.capture().await {
                        Ok(frame) => frame,
                        Err(e) => {
                            tracing::warn!(error = %e, "frame capture failed");
                            continue;
                        }
                    };

                    // A slow response may overlap the next scheduled capture;
                    // each classification runs on its own task.
                    let classifier = classifier.clone();
                    let tally = Arc::clone(&tally);
                    let percentages = percentages.clone();
                    tokio::spawn(async move {
                        match classifier.classify(frame).await {
                            Ok(reading) => {
                                lock_tally(&tally).record(reading.dominant);
                                // Receiver may already be gone at teardown.
                                let _ = percentages.send(reading.percentages).await;
                            }
                            Err(e) => {
                                tracing::warn!(
                                    error = %e,
                                    "classification failed; sample skipped"
                                );
                            }
                        }
                    });
                }
            })
        };

        let rollup_task = {
            let tally = Arc::clone(&tally);
            tokio::spawn(async move {
                let period = cadence.rollup_interval();
                let mut ticker = time::interval_at(Instant::now() + period, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;
                    let label = lock_tally(&tally).roll_up();
                    if dominant.send(label).is_err() {
                        break;
                    }
                }
            })
        };

        Self {
            capture_task,
            rollup_task,
            frames,
        }
    }

    /// Cancels both timers and releases the camera stream. Responses of
    /// still-in-flight classifications land as inert no-ops.
    pub async fn shutdown(self) {
        self.capture_task.abort();
        self.rollup_task.abort();
        if let Err(e) = self.frames.release().await {
            tracing::warn!(error = %e, "camera release failed");
        }
    }
}

fn lock_tally(tally: &Mutex<EmotionTally>) -> MutexGuard<'_, EmotionTally> {
    match tally.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
