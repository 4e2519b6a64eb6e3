use crate::core::publisher::PostPublisher;
use crate::domain::model::{CreatedRecord, Session};
use crate::domain::ports::{BlobStore, DescriptionSource, ImageSource, RecordStore, Storage};
use crate::utils::error::Result;
use chrono::{Local, NaiveDate};
use image::ImageFormat;
use std::io::Cursor;

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct JobReport {
    pub description: String,
    pub text_path: String,
    pub image_path: String,
    /// `None` for dry runs.
    pub post: Option<CreatedRecord>,
}

/// One daily run: describe, render, save, publish.
pub struct DailyPostJob<D, I, S, A> {
    describer: D,
    images: I,
    text_storage: S,
    image_storage: S,
    publisher: PostPublisher<A>,
    dry_run: bool,
}

impl<D, I, S, A> DailyPostJob<D, I, S, A>
where
    D: DescriptionSource,
    I: ImageSource,
    S: Storage,
    A: BlobStore + RecordStore,
{
    pub fn new(
        describer: D,
        images: I,
        text_storage: S,
        image_storage: S,
        publisher: PostPublisher<A>,
    ) -> Self {
        Self {
            describer,
            images,
            text_storage,
            image_storage,
            publisher,
            dry_run: false,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub async fn run(&self, session: &Session) -> Result<JobReport> {
        self.run_on(Local::now().date_naive(), session).await
    }

    /// Run with artifacts named after `date`.
    pub async fn run_on(&self, date: NaiveDate, session: &Session) -> Result<JobReport> {
        let stem = date.format("%Y-%m-%d").to_string();

        tracing::info!("Generating description...");
        let description = self.describer.describe().await?;
        tracing::info!("Description ({} chars): {}", description.chars().count(), description);

        let text_path = self
            .text_storage
            .write_file(&format!("{}.txt", stem), description.as_bytes())
            .await?;
        tracing::info!("Saved description to {}", text_path);

        tracing::info!("Generating image...");
        let image = self.images.generate(&description).await?;

        let mut png = Cursor::new(Vec::new());
        image.write_to(&mut png, ImageFormat::Png)?;
        let image_path = self
            .image_storage
            .write_file(&format!("{}.png", stem), png.get_ref())
            .await?;
        tracing::info!("Saved image to {}", image_path);

        if self.dry_run {
            tracing::info!("Dry run, skipping publication");
            return Ok(JobReport {
                description,
                text_path,
                image_path,
                post: None,
            });
        }

        tracing::info!("Publishing post...");
        let post = self
            .publisher
            .publish_image(&description, &image, session)
            .await?;

        Ok(JobReport {
            description,
            text_path,
            image_path,
            post: Some(post),
        })
    }
}
