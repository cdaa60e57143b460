use crate::player::{AudioOutput, PlayerError};
use crate::storage::TrackUrl;
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Client;
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink};
use std::io::Cursor;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// rodio-backed output.
///
/// The [`rodio::OutputStream`] must be kept alive for the duration of
/// playback: opening a new stream per track drops the previous one and
/// truncates whatever was playing. One stream and one sink are therefore
/// created lazily and shared by every clone.
#[derive(Clone)]
pub struct RodioAudioOutput {
    client: Client,
    inner: Arc<Mutex<Option<SinkState>>>,
}

struct SinkState {
    _stream: OutputStream,
    sink: Sink,
}

impl RodioAudioOutput {
    pub fn new() -> Result<Self, PlayerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(PlayerError::Http)?;
        Ok(Self {
            client,
            inner: Arc::new(Mutex::new(None)),
        })
    }

    fn lock_inner(&self) -> MutexGuard<'_, Option<SinkState>> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("audio output state lock was poisoned; recovering and continuing");
                poisoned.into_inner()
            }
        }
    }

    fn with_sink<R>(&self, f: impl FnOnce(&Sink) -> R) -> Result<R, PlayerError> {
        let mut guard = self.lock_inner();

        if guard.is_none() {
            let stream = OutputStreamBuilder::open_default_stream().map_err(|e| {
                PlayerError::AudioOutputUnavailable {
                    details: e.to_string(),
                }
            })?;
            let sink = Sink::connect_new(stream.mixer());
            *guard = Some(SinkState {
                _stream: stream,
                sink,
            });
        }

        match guard.as_ref() {
            Some(state) => Ok(f(&state.sink)),
            None => Err(PlayerError::AudioOutputUnavailable {
                details: "internal error: output state invariant violated".to_owned(),
            }),
        }
    }
}

impl AudioOutput for RodioAudioOutput {
    fn load(&self, track: TrackUrl) -> BoxFuture<'_, Result<(), PlayerError>> {
        let this = self.clone();
        async move {
            let response = this.client.get(track.as_url().clone()).send().await?;
            if !response.status().is_success() {
                let status = response.status();
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                return Err(PlayerError::HttpStatus(status.as_u16(), error_text));
            }
            let bytes = response.bytes().await?;

            let source =
                Decoder::new(Cursor::new(bytes.to_vec())).map_err(|e| {
                    PlayerError::UnsupportedAudio {
                        details: e.to_string(),
                    }
                })?;

            this.with_sink(|sink| {
                sink.stop();
                sink.append(source);
                sink.play();
            })
        }
        .boxed()
    }

    fn pause(&self) -> Result<(), PlayerError> {
        self.with_sink(|sink| sink.pause())
    }

    fn resume(&self) -> Result<(), PlayerError> {
        self.with_sink(|sink| sink.play())
    }
}
