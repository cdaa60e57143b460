mod gltf;

use crate::config::PointerSensitivity;
use futures::future::BoxFuture;
use std::time::Duration;

pub use gltf::GltfModelSource;

/// One named animation clip found on the loaded asset.
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationClip {
    pub name: String,
    pub duration: Duration,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoadedModel {
    pub clips: Vec<AnimationClip>,
}

#[derive(thiserror::Error, Debug)]
pub enum SceneError {
    #[error("model asset unavailable: {details}")]
    AssetUnavailable { details: String },

    #[error("invalid model asset: {details}")]
    InvalidAsset { details: String },
}

pub trait ModelSource: Send + Sync {
    /// Loads the asset once at startup; the composition suspends on this.
    fn load_model(&self) -> BoxFuture<'_, Result<LoadedModel, SceneError>>;
}

/// Clip clock of the loaded model.
///
/// At most one looping clip is active, the first one found on the asset.
/// Its clock advances by `elapsed × speed` per frame; at zero speed it is
/// frozen, never reset.
#[derive(Clone, Debug)]
pub struct ModelAnimationState {
    clips: Vec<AnimationClip>,
    active: Option<usize>,
    clock: Duration,
}

impl ModelAnimationState {
    pub fn from_model(model: LoadedModel) -> Self {
        let active = if model.clips.is_empty() { None } else { Some(0) };
        Self {
            clips: model.clips,
            active,
            clock: Duration::ZERO,
        }
    }

    pub fn empty() -> Self {
        Self::from_model(LoadedModel::default())
    }

    pub fn active_clip(&self) -> Option<&AnimationClip> {
        self.active.and_then(|i| self.clips.get(i))
    }

    pub fn clock(&self) -> Duration {
        self.clock
    }

    pub fn advance(&mut self, elapsed: Duration, speed: f64) {
        if speed <= 0.0 {
            return;
        }
        let Some(clip) = self.active_clip() else {
            return;
        };

        let duration = clip.duration;
        let advanced = self.clock.as_secs_f64() + elapsed.as_secs_f64() * speed;
        let wrapped = if duration > Duration::ZERO {
            advanced % duration.as_secs_f64()
        } else {
            advanced
        };
        self.clock = Duration::from_secs_f64(wrapped);
    }
}

/// Pointer-derived playback speed: horizontal displacement since the
/// previous event, scaled by a fixed sensitivity, zeroed only by an explicit
/// release. No smoothing, no idle decay.
#[derive(Clone, Debug)]
pub struct PointerTracker {
    sensitivity: f64,
    last_x: Option<f64>,
    speed: f64,
}

impl PointerTracker {
    pub fn new(sensitivity: PointerSensitivity) -> Self {
        Self {
            sensitivity: sensitivity.value(),
            last_x: None,
            speed: 0.0,
        }
    }

    pub fn pointer_moved(&mut self, x: f64) {
        if let Some(prev) = self.last_x {
            self.speed = (x - prev).abs() * self.sensitivity;
        }
        self.last_x = Some(x);
    }

    /// Keeps the baseline x, so a later drag measures from the last known
    /// position.
    pub fn pointer_released(&mut self) {
        self.speed = 0.0;
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }
}

/// Owns the loaded model's animation state and maps pointer movement onto
/// its playback speed, one `tick` per rendered frame.
pub struct SceneDriver {
    animation: ModelAnimationState,
    pointer: PointerTracker,
}

impl SceneDriver {
    pub async fn start<M: ModelSource>(
        source: &M,
        sensitivity: PointerSensitivity,
    ) -> Result<Self, SceneError> {
        let model = source.load_model().await?;
        match model.clips.first() {
            Some(clip) => tracing::info!(
                clip = %clip.name,
                clips = model.clips.len(),
                "model loaded; playing first clip"
            ),
            None => tracing::warn!("model loaded without animation clips"),
        }
        Ok(Self::with_model(model, sensitivity))
    }

    pub fn with_model(model: LoadedModel, sensitivity: PointerSensitivity) -> Self {
        Self {
            animation: ModelAnimationState::from_model(model),
            pointer: PointerTracker::new(sensitivity),
        }
    }

    pub fn pointer_moved(&mut self, x: f64) {
        self.pointer.pointer_moved(x);
    }

    pub fn pointer_released(&mut self) {
        self.pointer.pointer_released();
    }

    pub fn tick(&mut self, elapsed: Duration) {
        self.animation.advance(elapsed, self.pointer.speed());
    }

    pub fn animation(&self) -> &ModelAnimationState {
        &self.animation
    }

    pub fn speed(&self) -> f64 {
        self.pointer.speed()
    }
}
