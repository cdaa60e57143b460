mod dummy;
mod http;

use crate::emotion::EmotionLabel;
use futures::future::BoxFuture;
use url::Url;

pub use dummy::DummyTrackStore;
pub use http::HttpTrackStore;

/// Directly fetchable location of one stored audio object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackUrl(pub Url);

impl TrackUrl {
    pub fn as_url(&self) -> &Url {
        &self.0
    }
}

#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("http error {0}: {1}")]
    HttpStatus(u16, String),

    #[error("unexpected listing response: {details}")]
    InvalidResponse { details: String },

    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

pub trait TrackStore: Send + Sync {
    /// Every audio object under the mood's folder, resolved to directly
    /// fetchable URLs. No pagination handling.
    fn list_tracks(&self, mood: EmotionLabel)
        -> BoxFuture<'_, Result<Vec<TrackUrl>, StorageError>>;
}
