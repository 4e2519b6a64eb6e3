use crate::core::resizer;
use crate::domain::model::{CreatedRecord, ImagesEmbed, PostRecord, Session, POST_COLLECTION};
use crate::domain::ports::{BlobStore, RecordStore};
use crate::utils::error::{BotError, Result};
use chrono::Utc;
use image::DynamicImage;

/// Largest blob the PDS accepts for post images: 976 KiB.
pub const MAX_IMAGE_BYTES: usize = 976 * 1024;
pub const IMAGE_CONTENT_TYPE: &str = "image/png";
pub const DEFAULT_ALT_TEXT: &str = "Image Description";

/// Publishes one text + image post: upload the blob, then create the record.
pub struct PostPublisher<A> {
    api: A,
    alt_text: String,
}

impl<A: BlobStore + RecordStore> PostPublisher<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            alt_text: DEFAULT_ALT_TEXT.to_string(),
        }
    }

    pub fn with_alt_text(mut self, alt_text: impl Into<String>) -> Self {
        self.alt_text = alt_text.into();
        self
    }

    /// Adapt `image` to the upload ceiling and publish it with `text`.
    pub async fn publish_image(
        &self,
        text: &str,
        image: &DynamicImage,
        session: &Session,
    ) -> Result<CreatedRecord> {
        let payload = resizer::adapt(image, MAX_IMAGE_BYTES)?;
        tracing::info!(
            "Adapted image to {}x{} at quality {} ({} bytes)",
            payload.width,
            payload.height,
            payload.quality,
            payload.len()
        );
        self.publish(text, payload.into_bytes(), session).await
    }

    /// Publish `text` with an already encoded PNG.
    ///
    /// The record is only built once the upload has returned a blob, so a
    /// failed upload never reaches `createRecord`. A failed `createRecord`
    /// leaves the uploaded blob orphaned.
    pub async fn publish(
        &self,
        text: &str,
        image_bytes: Vec<u8>,
        session: &Session,
    ) -> Result<CreatedRecord> {
        if image_bytes.len() > MAX_IMAGE_BYTES {
            return Err(BotError::SizeLimitExceeded {
                size: image_bytes.len(),
                limit: MAX_IMAGE_BYTES,
            });
        }

        tracing::debug!("Uploading {} byte blob", image_bytes.len());
        let blob = self
            .api
            .upload_blob(image_bytes, IMAGE_CONTENT_TYPE, session)
            .await?;
        tracing::debug!("Uploaded blob: {:?}", blob);

        let record = PostRecord::new(
            text,
            Utc::now(),
            Some(ImagesEmbed::single(self.alt_text.clone(), blob)),
        );
        tracing::debug!("Post record: {}", serde_json::to_string(&record)?);

        let created = self
            .api
            .create_record(POST_COLLECTION, &record, session)
            .await?;
        tracing::info!("Created post {}", created.uri);
        Ok(created)
    }
}
