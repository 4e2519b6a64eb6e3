pub mod encoder;
pub mod job;
pub mod publisher;
pub mod resizer;

pub use crate::domain::model::{BlobRef, CreatedRecord, EncodedPayload, PostRecord, Session};
pub use crate::domain::ports::{BlobStore, DescriptionSource, ImageSource, RecordStore, Storage};
pub use crate::utils::error::Result;
