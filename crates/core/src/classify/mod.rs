mod dummy;
mod http;

use crate::capture::CameraFrame;
use crate::emotion::EmotionLabel;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use dummy::DummyEmotionClassifier;
pub use http::HttpEmotionClassifier;

/// One classifier response: the dominant label plus the raw per-label
/// percentage vector. Percentages are plotted as-is and need not sum to 100.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct EmotionReading {
    pub dominant: EmotionLabel,
    pub percentages: BTreeMap<String, f64>,
}

#[derive(thiserror::Error, Debug)]
pub enum ClassifyError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("http error {0}: {1}")]
    HttpStatus(u16, String),

    #[error("classifier returned an empty result set")]
    EmptyResponse,

    #[error("unexpected classifier response: {details}")]
    InvalidResponse { details: String },
}

pub trait EmotionClassifier: Send + Sync {
    fn classify(&self, frame: CameraFrame)
        -> BoxFuture<'_, Result<EmotionReading, ClassifyError>>;
}
