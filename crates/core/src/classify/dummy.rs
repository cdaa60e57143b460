use crate::capture::CameraFrame;
use crate::classify::{ClassifyError, EmotionClassifier, EmotionReading};
use crate::emotion::EmotionLabel;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::BTreeMap;

/// Reports the same reading for every frame.
#[derive(Clone)]
pub struct DummyEmotionClassifier {
    reading: EmotionReading,
}

impl DummyEmotionClassifier {
    pub fn new(label: EmotionLabel) -> Self {
        let mut percentages = BTreeMap::new();
        percentages.insert(label.as_str().to_owned(), 100.0);
        Self {
            reading: EmotionReading {
                dominant: label,
                percentages,
            },
        }
    }
}

impl EmotionClassifier for DummyEmotionClassifier {
    fn classify(
        &self,
        _frame: CameraFrame,
    ) -> BoxFuture<'_, Result<EmotionReading, ClassifyError>> {
        let reading = self.reading.clone();
        async move { Ok(reading) }.boxed()
    }
}
