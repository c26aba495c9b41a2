use anyhow::Context;
use async_trait::async_trait;
use aws_config::{defaults, BehaviorVersion};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::{Builder as S3ConfigBuilder, Region},
    presigning::PresigningConfig,
    Client,
};
use aws_smithy_types::byte_stream::ByteStream;
use bytes::Bytes;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use crate::config::StorageConfig;

/// Object keys for meal photos live under this prefix.
pub const PHOTO_PREFIX: &str = "meals/";

#[async_trait]
pub trait StorageClient: Send + Sync {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()>;
    async fn delete_object(&self, key: &str) -> anyhow::Result<()>;
    async fn presign_get(&self, key: &str, seconds: u64) -> anyhow::Result<String>;
}

pub fn photo_key(draft_id: Uuid, photo_id: Uuid, content_type: &str) -> String {
    let ext = ext_from_mime(content_type).unwrap_or("bin");
    format!("{PHOTO_PREFIX}{draft_id}/{photo_id}.{ext}")
}

pub fn is_photo_key(uri: &str) -> bool {
    uri.starts_with(PHOTO_PREFIX)
}

/// Matches on the media type only; parameters such as `charset` are ignored.
fn ext_from_mime(ct: &str) -> Option<&'static str> {
    let media_type = ct.split(';').next().unwrap_or_default().trim();
    match media_type.to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}

/// Meal photos in an S3-compatible bucket (MinIO in development).
#[derive(Clone)]
pub struct Storage {
    client: Client,
    bucket: String,
}

impl Storage {
    pub async fn new(cfg: &StorageConfig) -> anyhow::Result<Self> {
        let credentials = Credentials::new(&cfg.access_key, &cfg.secret_key, None, None, "env");
        let shared = defaults(BehaviorVersion::latest())
            .region(Region::new(cfg.region.clone()))
            .credentials_provider(credentials)
            .endpoint_url(&cfg.endpoint)
            .load()
            .await;

        // path-style keeps the bucket out of the hostname, which MinIO needs
        let s3 = S3ConfigBuilder::from(&shared)
            .endpoint_url(&cfg.endpoint)
            .force_path_style(true)
            .build();
        debug!(endpoint = %cfg.endpoint, bucket = %cfg.bucket, "photo storage configured");

        Ok(Self {
            client: Client::from_conf(s3),
            bucket: cfg.bucket.clone(),
        })
    }
}

#[async_trait]
impl StorageClient for Storage {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()> {
        let size = body.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .with_context(|| format!("uploading photo {key} to {}", self.bucket))?;
        debug!(%key, size, "photo uploaded");
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .with_context(|| format!("deleting photo {key} from {}", self.bucket))?;
        Ok(())
    }

    async fn presign_get(&self, key: &str, seconds: u64) -> anyhow::Result<String> {
        let expiry = PresigningConfig::expires_in(Duration::from_secs(seconds))
            .context("photo URL lifetime")?;
        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(expiry)
            .await
            .with_context(|| format!("presigning photo {key}"))?;
        Ok(request.uri().to_string())
    }
}

/// Keeps objects in process memory; used when running tests.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStorage {
    objects: std::sync::Mutex<std::collections::HashMap<String, (Bytes, String)>>,
}

#[cfg(test)]
impl MemoryStorage {
    pub fn object(&self, key: &str) -> Option<(Bytes, String)> {
        self.objects.lock().unwrap().get(key).cloned()
    }
}

#[cfg(test)]
#[async_trait]
impl StorageClient for MemoryStorage {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()> {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (body, content_type.to_string()));
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }

    async fn presign_get(&self, key: &str, seconds: u64) -> anyhow::Result<String> {
        anyhow::ensure!(self.object(key).is_some(), "no object {key}");
        Ok(format!("https://fake.local/{key}?ttl={seconds}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ext_from_mime() {
        assert_eq!(ext_from_mime("image/jpeg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/jpg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/png"), Some("png"));
        assert_eq!(ext_from_mime("image/webp"), Some("webp"));
        assert_eq!(ext_from_mime("image/heic"), Some("heic"));
        assert_eq!(ext_from_mime("application/octet-stream"), None);
    }

    #[test]
    fn ext_from_mime_ignores_parameters_and_case() {
        assert_eq!(ext_from_mime("image/jpeg; charset=binary"), Some("jpg"));
        assert_eq!(ext_from_mime("Image/PNG"), Some("png"));
        assert_eq!(ext_from_mime(""), None);
    }

    #[test]
    fn photo_keys_are_recognised() {
        let draft = Uuid::new_v4();
        let photo = Uuid::new_v4();
        let key = photo_key(draft, photo, "image/png");
        assert_eq!(key, format!("meals/{draft}/{photo}.png"));
        assert!(is_photo_key(&key));
        assert!(!is_photo_key("content://media/external/images/1"));
        assert!(photo_key(draft, photo, "text/plain").ends_with(".bin"));
    }

    #[tokio::test]
    async fn memory_storage_presigns_only_stored_objects() {
        let storage = MemoryStorage::default();
        storage
            .put_object("meals/a/b.jpg", Bytes::from_static(b"jpg"), "image/jpeg")
            .await
            .unwrap();
        let url = storage.presign_get("meals/a/b.jpg", 60).await.unwrap();
        assert!(url.contains("meals/a/b.jpg"));
        assert!(storage.presign_get("meals/missing.jpg", 60).await.is_err());

        storage.delete_object("meals/a/b.jpg").await.unwrap();
        assert!(storage.object("meals/a/b.jpg").is_none());
    }
}
