use crate::scene::{AnimationClip, LoadedModel, ModelSource, SceneError};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Reads the glTF JSON document once and collects its animation clips.
///
/// A clip's duration is the largest keyframe time over its sampler input
/// accessors (their `max` bound), so no binary buffer needs decoding.
#[derive(Clone, Debug)]
pub struct GltfModelSource {
    path: PathBuf,
}

impl GltfModelSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[derive(Deserialize)]
struct GltfDocument {
    #[serde(default)]
    animations: Vec<GltfAnimation>,
    #[serde(default)]
    accessors: Vec<GltfAccessor>,
}

#[derive(Deserialize)]
struct GltfAnimation {
    name: Option<String>,
    #[serde(default)]
    samplers: Vec<GltfSampler>,
}

#[derive(Deserialize)]
struct GltfSampler {
    input: usize,
}

#[derive(Deserialize)]
struct GltfAccessor {
    #[serde(default)]
    max: Vec<f64>,
}

fn clips_from_document(doc: &GltfDocument) -> Vec<AnimationClip> {
    doc.animations
        .iter()
        .enumerate()
        .map(|(index, animation)| {
            let end = animation
                .samplers
                .iter()
                .filter_map(|sampler| doc.accessors.get(sampler.input))
                .filter_map(|accessor| accessor.max.first().copied())
                .fold(0.0f64, f64::max);
            AnimationClip {
                name: animation
                    .name
                    .clone()
                    .unwrap_or_else(|| format!("animation-{index}")),
                duration: Duration::from_secs_f64(end.max(0.0)),
            }
        })
        .collect()
}

impl ModelSource for GltfModelSource {
    fn load_model(&self) -> BoxFuture<'_, Result<LoadedModel, SceneError>> {
        async move {
            let bytes =
                tokio::fs::read(&self.path)
                    .await
                    .map_err(|e| SceneError::AssetUnavailable {
                        details: format!("{}: {e}", self.path.display()),
                    })?;
            let doc: GltfDocument =
                serde_json::from_slice(&bytes).map_err(|e| SceneError::InvalidAsset {
                    details: e.to_string(),
                })?;
            Ok(LoadedModel {
                clips: clips_from_document(&doc),
            })
        }
        .boxed()
    }
}
