use crate::domain::model::{BlobRef, CreatedRecord, PostRecord, Session};
use crate::utils::error::Result;
use async_trait::async_trait;
use image::DynamicImage;

pub trait Storage: Send + Sync {
    /// Writes `data` under `path` and returns the full location written.
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<String>> + Send;
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload_blob(&self, bytes: Vec<u8>, content_type: &str, session: &Session) -> Result<BlobRef>;
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn create_record(&self, collection: &str, record: &PostRecord, session: &Session) -> Result<CreatedRecord>;
}

#[async_trait]
pub trait DescriptionSource: Send + Sync {
    async fn describe(&self) -> Result<String>;
}

#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn generate(&self, description: &str) -> Result<DynamicImage>;
}
