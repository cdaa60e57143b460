use crate::player::{AudioOutput, PlayerError};
use crate::storage::TrackUrl;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::{Arc, Mutex};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutputEvent {
    Loaded(TrackUrl),
    Paused,
    Resumed,
}

/// Records calls instead of producing sound.
#[derive(Clone, Default)]
pub struct DummyAudioOutput {
    events: Arc<Mutex<Vec<OutputEvent>>>,
}

impl DummyAudioOutput {
    pub fn events(&self) -> Vec<OutputEvent> {
        match self.events.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn push(&self, event: OutputEvent) {
        match self.events.lock() {
            Ok(mut guard) => guard.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

impl AudioOutput for DummyAudioOutput {
    fn load(&self, track: TrackUrl) -> BoxFuture<'_, Result<(), PlayerError>> {
        self.push(OutputEvent::Loaded(track));
        async move { Ok(()) }.boxed()
    }

    fn pause(&self) -> Result<(), PlayerError> {
        self.push(OutputEvent::Paused);
        Ok(())
    }

    fn resume(&self) -> Result<(), PlayerError> {
        self.push(OutputEvent::Resumed);
        Ok(())
    }
}
