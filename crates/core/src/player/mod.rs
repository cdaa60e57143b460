mod audio;
mod dummy;

use crate::emotion::EmotionLabel;
use crate::storage::{TrackStore, TrackUrl};
use futures::future::BoxFuture;
use rand::Rng;

pub use audio::RodioAudioOutput;
pub use dummy::{DummyAudioOutput, OutputEvent};

#[derive(thiserror::Error, Debug)]
pub enum PlayerError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("http error {0}: {1}")]
    HttpStatus(u16, String),

    #[error("unsupported audio: {details}")]
    UnsupportedAudio { details: String },

    #[error("audio output unavailable: {details}")]
    AudioOutputUnavailable { details: String },
}

/// The single shared audio output, owned explicitly and reused for every
/// track: `load` swaps the source and starts playing, `pause`/`resume`
/// toggle the already-loaded track.
pub trait AudioOutput: Send + Sync {
    fn load(&self, track: TrackUrl) -> BoxFuture<'_, Result<(), PlayerError>>;

    fn pause(&self) -> Result<(), PlayerError>;

    fn resume(&self) -> Result<(), PlayerError>;
}

/// Currently loaded track and whether it is playing. Mutated only by
/// `MusicPlayer::play_random`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlaybackState {
    pub track: TrackUrl,
    pub playing: bool,
}

/// The track picker: owns the mood, the fetched pool, and the playback
/// state. No queueing, no crossfade, no auto-advance.
pub struct MusicPlayer<S, O> {
    store: S,
    output: O,
    mood: EmotionLabel,
    pool: Vec<TrackUrl>,
    state: Option<PlaybackState>,
}

impl<S, O> MusicPlayer<S, O>
where
    S: TrackStore,
    O: AudioOutput,
{
    pub fn new(store: S, output: O, mood: EmotionLabel) -> Self {
        Self {
            store,
            output,
            mood,
            pool: Vec::new(),
            state: None,
        }
    }

    /// Fetches the pool for the current mood. A failed listing leaves the
    /// pool empty, which makes playback a no-op.
    pub async fn refresh_pool(&mut self) {
        match self.store.list_tracks(self.mood.clone()).await {
            Ok(tracks) => {
                tracing::info!(mood = %self.mood, tracks = tracks.len(), "track pool refreshed");
                self.pool = tracks;
            }
            Err(e) => {
                tracing::warn!(
                    mood = %self.mood,
                    error = %e,
                    "track listing failed; pool left empty"
                );
                self.pool = Vec::new();
            }
        }
    }

    pub async fn set_mood(&mut self, mood: EmotionLabel) {
        self.mood = mood;
        self.refresh_pool().await;
    }

    /// Picks a uniformly random track. Re-picking the loaded track toggles
    /// pause/resume; anything else swaps the source and starts playing.
    pub async fn play_random(&mut self) -> Result<(), PlayerError> {
        if self.pool.is_empty() {
            return Ok(());
        }

        let index = rand::rng().random_range(0..self.pool.len());
        let track = self.pool[index].clone();

        match &mut self.state {
            Some(state) if state.track == track => {
                if state.playing {
                    self.output.pause()?;
                } else {
                    self.output.resume()?;
                }
                state.playing = !state.playing;
            }
            _ => {
                self.output.load(track.clone()).await?;
                self.state = Some(PlaybackState {
                    track,
                    playing: true,
                });
            }
        }
        Ok(())
    }

    pub fn playback(&self) -> Option<&PlaybackState> {
        self.state.as_ref()
    }

    pub fn pool_len(&self) -> usize {
        self.pool.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::DummyTrackStore;
    use url::Url;

    fn track(name: &str) -> TrackUrl {
        TrackUrl(Url::parse(&format!("https://tracks.example/{name}")).expect("valid url"))
    }

    fn mood() -> EmotionLabel {
        EmotionLabel::new("Happy").expect("valid label")
    }

    #[tokio::test]
    async fn play_random_with_an_empty_pool_is_a_no_op() {
        let output = DummyAudioOutput::default();
        let mut player = MusicPlayer::new(DummyTrackStore::default(), output.clone(), mood());
        player.refresh_pool().await;

        player.play_random().await.expect("no-op");

        assert!(player.playback().is_none());
        assert!(output.events().is_empty());
    }

    #[tokio::test]
    async fn failed_listing_degrades_playback_to_a_no_op() {
        let output = DummyAudioOutput::default();
        let mut player = MusicPlayer::new(DummyTrackStore::failing(), output.clone(), mood());
        player.refresh_pool().await;

        assert_eq!(player.pool_len(), 0);
        player.play_random().await.expect("no-op");
        assert!(player.playback().is_none());
        assert!(output.events().is_empty());
    }

    #[tokio::test]
    async fn repicking_the_loaded_track_alternates_pause_and_resume() {
        let output = DummyAudioOutput::default();
        let store = DummyTrackStore::with_tracks(vec![track("only.mp3")]);
        let mut player = MusicPlayer::new(store, output.clone(), mood());
        player.refresh_pool().await;

        player.play_random().await.expect("load");
        assert_eq!(
            player.playback(),
            Some(&PlaybackState {
                track: track("only.mp3"),
                playing: true,
            })
        );

        player.play_random().await.expect("pause");
        assert_eq!(player.playback().map(|s| s.playing), Some(false));

        player.play_random().await.expect("resume");
        assert_eq!(player.playback().map(|s| s.playing), Some(true));

        assert_eq!(
            output.events(),
            vec![
                OutputEvent::Loaded(track("only.mp3")),
                OutputEvent::Paused,
                OutputEvent::Resumed,
            ]
        );
    }

    #[tokio::test]
    async fn a_different_pick_replaces_the_loaded_track() {
        let output = DummyAudioOutput::default();
        let store = DummyTrackStore::with_tracks(vec![track("a.mp3")]);
        let mut player = MusicPlayer::new(store, output.clone(), mood());
        player.refresh_pool().await;
        player.play_random().await.expect("load");

        // Same picker, new pool: the stale state can never match a new pick,
        // so the next play loads instead of toggling.
        let store = DummyTrackStore::with_tracks(vec![track("b.mp3")]);
        let mut player = MusicPlayer {
            store,
            output: output.clone(),
            mood: mood(),
            pool: Vec::new(),
            state: player.state.clone(),
        };
        player.refresh_pool().await;
        player.play_random().await.expect("load");

        assert_eq!(
            player.playback(),
            Some(&PlaybackState {
                track: track("b.mp3"),
                playing: true,
            })
        );
    }
}
