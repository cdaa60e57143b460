#[cfg(feature = "camera-opencv")]
mod opencv;
mod still;

use bytes::Bytes;
use futures::future::BoxFuture;
use std::time::SystemTime;

#[cfg(feature = "camera-opencv")]
pub use self::opencv::OpenCvFrameSource;
pub use still::StillFrameSource;

/// One captured video frame, already encoded as a PNG still.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CameraFrame {
    pub sequence: u64,
    pub captured_at: SystemTime,
    pub png: Bytes,
}

#[derive(thiserror::Error, Debug)]
pub enum CaptureError {
    #[error("camera unavailable: {details}")]
    MediaAccess { details: String },

    #[error("frame capture failed: {details}")]
    Frame { details: String },

    #[error("frame encode failed: {details}")]
    Encode { details: String },
}

pub trait FrameSource: Send + Sync {
    fn capture(&self) -> BoxFuture<'_, Result<CameraFrame, CaptureError>>;

    /// Releases the underlying stream. Called once at sampler teardown.
    fn release(&self) -> BoxFuture<'_, Result<(), CaptureError>>;
}
