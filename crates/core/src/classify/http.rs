use crate::capture::CameraFrame;
use crate::classify::{ClassifyError, EmotionClassifier, EmotionReading};
use crate::emotion::EmotionLabel;
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

/// Client for the remote emotion endpoint: one PNG still per request, posted
/// as the single `image` field of a multipart form.
#[derive(Clone)]
pub struct HttpEmotionClassifier {
    client: Client,
    endpoint: Url,
}

impl HttpEmotionClassifier {
    pub fn new(endpoint: Url) -> Result<Self, ClassifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(ClassifyError::Http)?;
        Ok(Self { client, endpoint })
    }
}

// The service answers with an array of per-face results; only the first
// face is used.
#[derive(Deserialize)]
struct ClassifierResult {
    dominant_emotion: String,
    #[serde(default)]
    emotion_percentages: BTreeMap<String, f64>,
}

fn reading_from_results(
    mut results: Vec<ClassifierResult>,
) -> Result<EmotionReading, ClassifyError> {
    if results.is_empty() {
        return Err(ClassifyError::EmptyResponse);
    }
    let first = results.remove(0);
    let dominant =
        EmotionLabel::new(first.dominant_emotion).map_err(|e| ClassifyError::InvalidResponse {
            details: e.to_string(),
        })?;
    Ok(EmotionReading {
        dominant,
        percentages: first.emotion_percentages,
    })
}

impl EmotionClassifier for HttpEmotionClassifier {
    fn classify(
        &self,
        frame: CameraFrame,
    ) -> BoxFuture<'_, Result<EmotionReading, ClassifyError>> {
        let this = self.clone();
        async move {
            let part = Part::bytes(frame.png.to_vec())
                .file_name("photo.png")
                .mime_str("image/png")?;
            let form = Form::new().part("image", part);

            let response = this
                .client
                .post(this.endpoint.clone())
                .multipart(form)
                .send()
                .await?;

            if !response.status().is_success() {
                let status = response.status();
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                return Err(ClassifyError::HttpStatus(status.as_u16(), error_text));
            }

            let results: Vec<ClassifierResult> =
                response
                    .json()
                    .await
                    .map_err(|e| ClassifyError::InvalidResponse {
                        details: format!("Failed to parse JSON: {e}"),
                    })?;

            reading_from_results(results)
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_first_result_of_a_well_formed_payload() {
        let payload = r#"[
            {
                "dominant_emotion": "happy",
                "emotion_percentages": { "happy": 93.4, "neutral": 4.1, "sad": 2.5 }
            },
            { "dominant_emotion": "sad", "emotion_percentages": { "sad": 99.0 } }
        ]"#;

        let results: Vec<ClassifierResult> = serde_json::from_str(payload).expect("valid json");
        let reading = reading_from_results(results).expect("first result");

        assert_eq!(reading.dominant.as_str(), "happy");
        assert_eq!(reading.percentages.len(), 3);
        assert_eq!(reading.percentages["happy"], 93.4);
    }

    #[test]
    fn empty_array_is_an_empty_response() {
        let results: Vec<ClassifierResult> = serde_json::from_str("[]").expect("valid json");
        assert!(matches!(
            reading_from_results(results),
            Err(ClassifyError::EmptyResponse)
        ));
    }

    #[test]
    fn missing_percentages_default_to_an_empty_mapping() {
        let payload = r#"[{ "dominant_emotion": "neutral" }]"#;
        let results: Vec<ClassifierResult> = serde_json::from_str(payload).expect("valid json");
        let reading = reading_from_results(results).expect("first result");

        assert_eq!(reading.dominant.as_str(), "neutral");
        assert!(reading.percentages.is_empty());
    }

    #[test]
    fn blank_dominant_label_is_invalid() {
        let payload = r#"[{ "dominant_emotion": "  " }]"#;
        let results: Vec<ClassifierResult> = serde_json::from_str(payload).expect("valid json");
        assert!(matches!(
            reading_from_results(results),
            Err(ClassifyError::InvalidResponse { .. })
        ));
    }
}
