use crate::capture::{CameraFrame, CaptureError, FrameSource};
use bytes::Bytes;
use futures::future::BoxFuture;
use futures::FutureExt;
use opencv::core::{Mat, Vector};
use opencv::prelude::*;
use opencv::{imgcodecs, videoio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::SystemTime;

/// Webcam frames via OpenCV, encoded to PNG the way the browser original
/// encoded its capture canvas.
pub struct OpenCvFrameSource {
    capture: Mutex<videoio::VideoCapture>,
    sequence: AtomicU64,
}

impl OpenCvFrameSource {
    /// Opens the device at `index`. Failure here is the no-camera case: the
    /// caller reports it once and runs without a sampler.
    pub fn open(index: i32) -> Result<Self, CaptureError> {
        let capture = videoio::VideoCapture::new(index, videoio::CAP_ANY).map_err(|e| {
            CaptureError::MediaAccess {
                details: e.to_string(),
            }
        })?;
        let opened = capture.is_opened().map_err(|e| CaptureError::MediaAccess {
            details: e.to_string(),
        })?;
        if !opened {
            return Err(CaptureError::MediaAccess {
                details: format!("no capture device at index {index}"),
            });
        }
        Ok(Self {
            capture: Mutex::new(capture),
            sequence: AtomicU64::new(0),
        })
    }

    fn grab_png(&self) -> Result<Bytes, CaptureError> {
        let mut capture = match self.capture.lock() {
            Ok(c) => c,
            Err(poisoned) => poisoned.into_inner(),
        };

        let mut frame = Mat::default();
        let got = capture.read(&mut frame).map_err(|e| CaptureError::Frame {
            details: e.to_string(),
        })?;
        if !got || frame.empty() {
            return Err(CaptureError::Frame {
                details: "device returned no frame".to_owned(),
            });
        }

        let mut buf = Vector::<u8>::new();
        imgcodecs::imencode(".png", &frame, &mut buf, &Vector::<i32>::new()).map_err(|e| {
            CaptureError::Encode {
                details: e.to_string(),
            }
        })?;
        Ok(Bytes::from(buf.to_vec()))
    }
}

impl FrameSource for OpenCvFrameSource {
    fn capture(&self) -> BoxFuture<'_, Result<CameraFrame, CaptureError>> {
        async move {
            let png = self.grab_png()?;
            Ok(CameraFrame {
                sequence: self.sequence.fetch_add(1, Ordering::Relaxed),
                captured_at: SystemTime::now(),
                png,
            })
        }
        .boxed()
    }

    fn release(&self) -> BoxFuture<'_, Result<(), CaptureError>> {
        async move {
            let mut capture = match self.capture.lock() {
                Ok(c) => c,
                Err(poisoned) => poisoned.into_inner(),
            };
            capture.release().map_err(|e| CaptureError::Frame {
                details: e.to_string(),
            })
        }
        .boxed()
    }
}
