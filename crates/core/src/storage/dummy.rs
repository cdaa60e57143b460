use crate::emotion::EmotionLabel;
use crate::storage::{StorageError, TrackStore, TrackUrl};
use futures::future::BoxFuture;
use futures::FutureExt;

/// Serves a fixed pool, or fails every listing.
#[derive(Clone, Default)]
pub struct DummyTrackStore {
    tracks: Vec<TrackUrl>,
    fail: bool,
}

impl DummyTrackStore {
    pub fn with_tracks(tracks: Vec<TrackUrl>) -> Self {
        Self {
            tracks,
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            tracks: Vec::new(),
            fail: true,
        }
    }
}

impl TrackStore for DummyTrackStore {
    fn list_tracks(
        &self,
        _mood: EmotionLabel,
    ) -> BoxFuture<'_, Result<Vec<TrackUrl>, StorageError>> {
        let result = if self.fail {
            Err(StorageError::InvalidResponse {
                details: "dummy listing failure".to_owned(),
            })
        } else {
            Ok(self.tracks.clone())
        };
        async move { result }.boxed()
    }
}
