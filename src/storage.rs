use std::sync::Arc;

use object_store::aws::AmazonS3Builder;
use object_store::path::Path as StoragePath;
use object_store::{Attribute, Attributes, ObjectStore, PutOptions, PutPayload};

use crate::error::{Error, Result};

/// Bucket-scoped object store. Credentials and region come from the usual
/// `AWS_*` environment variables.
#[derive(Clone)]
pub struct StorageClient {
    store: Arc<dyn ObjectStore>,
    bucket: String,
}

impl StorageClient {
    pub fn new(store: Arc<dyn ObjectStore>, bucket: String) -> Self {
        Self { store, bucket }
    }

    pub fn s3(bucket: &str) -> Result<Self> {
        let store = AmazonS3Builder::from_env()
            .with_bucket_name(bucket)
            .build()
            .map_err(|e| Error::Configuration(format!("object store: {e}")))?;

        Ok(Self::new(Arc::new(store), bucket.to_string()))
    }

    /// `s3://bucket/key`
    pub fn location(&self, key: &str) -> String {
        format!("s3://{}/{}", self.bucket, key)
    }

    /// Writes `data` at `key`, replacing any existing object.
    pub async fn upload(&self, key: &str, data: Vec<u8>, content_type: &'static str) -> Result<()> {
        let path = StoragePath::from(key);
        let size = data.len();

        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, content_type.into());
        let options = PutOptions {
            attributes,
            ..Default::default()
        };

        self.store
            .put_opts(&path, PutPayload::from(data), options)
            .await?;

        log::info!("Uploaded {} ({} bytes)", self.location(key), size);

        Ok(())
    }
}
