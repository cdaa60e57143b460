use crate::capture::{CameraFrame, CaptureError, FrameSource};
use bytes::Bytes;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

/// Replays a single PNG for every capture. Stands in for a webcam on
/// machines without one, and in tests.
pub struct StillFrameSource {
    png: Bytes,
    sequence: AtomicU64,
}

impl StillFrameSource {
    pub fn open(path: &Path) -> Result<Self, CaptureError> {
        let bytes = std::fs::read(path).map_err(|e| CaptureError::MediaAccess {
            details: format!("{}: {e}", path.display()),
        })?;
        Ok(Self::from_png(Bytes::from(bytes)))
    }

    pub fn from_png(png: Bytes) -> Self {
        Self {
            png,
            sequence: AtomicU64::new(0),
        }
    }
}

impl FrameSource for StillFrameSource {
    fn capture(&self) -> BoxFuture<'_, Result<CameraFrame, CaptureError>> {
        async move {
            Ok(CameraFrame {
                sequence: self.sequence.fetch_add(1, Ordering::Relaxed),
                captured_at: SystemTime::now(),
                png: self.png.clone(),
            })
        }
        .boxed()
    }

    fn release(&self) -> BoxFuture<'_, Result<(), CaptureError>> {
        async move { Ok(()) }.boxed()
    }
}
