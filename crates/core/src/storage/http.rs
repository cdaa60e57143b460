use crate::emotion::EmotionLabel;
use crate::storage::{StorageError, TrackStore, TrackUrl};
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// Lists `songs/<mood>/` objects through the storage service's object REST
/// API and resolves each entry to its direct download URL.
#[derive(Clone)]
pub struct HttpTrackStore {
    client: Client,
    base_url: Url,
    bucket: String,
}

#[derive(Deserialize)]
struct ObjectListing {
    #[serde(default)]
    items: Vec<StoredObject>,
}

#[derive(Deserialize)]
struct StoredObject {
    name: String,
}

impl HttpTrackStore {
    pub fn new(base_url: Url, bucket: String) -> Result<Self, StorageError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url,
            bucket,
        })
    }

    fn listing_url(&self, mood: &EmotionLabel) -> Result<Url, StorageError> {
        let prefix = format!("songs/{}/", mood.as_str());
        let url = format!(
            "{}/v0/b/{}/o?prefix={}&delimiter=/",
            self.base_url.as_str().trim_end_matches('/'),
            self.bucket,
            urlencoding::encode(&prefix),
        );
        Ok(Url::parse(&url)?)
    }

    fn download_url(&self, object_name: &str) -> Result<TrackUrl, StorageError> {
        let url = format!(
            "{}/v0/b/{}/o/{}?alt=media",
            self.base_url.as_str().trim_end_matches('/'),
            self.bucket,
            urlencoding::encode(object_name),
        );
        Ok(TrackUrl(Url::parse(&url)?))
    }
}

impl TrackStore for HttpTrackStore {
    fn list_tracks(
        &self,
        mood: EmotionLabel,
    ) -> BoxFuture<'_, Result<Vec<TrackUrl>, StorageError>> {
        let this = self.clone();
        async move {
            let url = this.listing_url(&mood)?;
            let response = this.client.get(url).send().await?;

            if !response.status().is_success() {
                let status = response.status();
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                return Err(StorageError::HttpStatus(status.as_u16(), error_text));
            }

            let listing: ObjectListing =
                response
                    .json()
                    .await
                    .map_err(|e| StorageError::InvalidResponse {
                        details: format!("Failed to parse JSON: {e}"),
                    })?;

            listing
                .items
                .iter()
                .map(|object| this.download_url(&object.name))
                .collect()
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> HttpTrackStore {
        HttpTrackStore::new(
            Url::parse("https://firebasestorage.googleapis.com").expect("valid url"),
            "serenify.appspot.com".to_owned(),
        )
        .expect("client builds")
    }

    #[test]
    fn listing_url_is_namespaced_by_mood() {
        let url = store()
            .listing_url(&EmotionLabel::new("Happy").expect("valid label"))
            .expect("valid url");
        assert_eq!(
            url.as_str(),
            "https://firebasestorage.googleapis.com/v0/b/serenify.appspot.com/o?prefix=songs%2FHappy%2F&delimiter=/"
        );
    }

    #[test]
    fn download_url_escapes_the_object_name() {
        let track = store()
            .download_url("songs/Happy/first track.mp3")
            .expect("valid url");
        assert_eq!(
            track.as_url().as_str(),
            "https://firebasestorage.googleapis.com/v0/b/serenify.appspot.com/o/songs%2FHappy%2Ffirst%20track.mp3?alt=media"
        );
    }

    #[test]
    fn listing_without_items_parses_as_empty() {
        let listing: ObjectListing = serde_json::from_str("{}").expect("valid json");
        assert!(listing.items.is_empty());

        let listing: ObjectListing = serde_json::from_str(
            r#"{ "items": [ { "name": "songs/Happy/a.mp3" }, { "name": "songs/Happy/b.mp3" } ] }"#,
        )
        .expect("valid json");
        assert_eq!(listing.items.len(), 2);
        assert_eq!(listing.items[0].name, "songs/Happy/a.mp3");
    }
}
