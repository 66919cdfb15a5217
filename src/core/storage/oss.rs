//! Aliyun OSS object store driver.
//!
//! Uploads use the plain PutObject REST call with header-based signing:
//! `Authorization: OSS {access_key_id}:{signature}` where the signature is
//! the base64 HMAC-SHA1 of the canonical request string. Archive bytes are
//! streamed from disk rather than buffered whole.

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use std::path::Path;
use tokio_util::io::ReaderStream;
use tracing::debug;

use super::{ObjectStore, StorageError};
use crate::config::OssConfig;

type HmacSha1 = Hmac<Sha1>;

const CONTENT_TYPE: &str = "application/zip";

pub struct OssStore {
    client: reqwest::Client,
    endpoint: String,
    bucket: String,
    access_key_id: String,
    access_key_secret: String,
}

impl OssStore {
    pub fn new(config: &OssConfig) -> Result<Self, StorageError> {
        if config.endpoint.is_empty() || config.bucket.is_empty() {
            return Err(StorageError::Construction(
                "oss endpoint and bucket must be configured".to_string(),
            ));
        }
        if config.access_key_id.is_empty() || config.access_key_secret.is_empty() {
            return Err(StorageError::Construction(
                "oss access credentials must be configured".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .build()
            .map_err(|err| StorageError::Construction(err.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            bucket: config.bucket.clone(),
            access_key_id: config.access_key_id.clone(),
            access_key_secret: config.access_key_secret.clone(),
        })
    }

    fn object_url(&self, key: &str) -> String {
        format!("https://{}.{}/{}", self.bucket, self.endpoint, key)
    }

    /// Header signature for a PutObject request on `key` at `date`
    /// (RFC 1123 GMT).
    fn authorization(&self, key: &str, date: &str) -> String {
        let canonical = format!(
            "PUT\n\n{CONTENT_TYPE}\n{date}\n/{}/{key}",
            self.bucket
        );
        let mut mac = HmacSha1::new_from_slice(self.access_key_secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(canonical.as_bytes());
        let signature = BASE64.encode(mac.finalize().into_bytes());
        format!("OSS {}:{signature}", self.access_key_id)
    }
}

#[async_trait]
impl ObjectStore for OssStore {
    async fn put(&self, key: &str, local_path: &Path) -> Result<(), StorageError> {
        let upload_err = |reason: String| StorageError::Upload {
            key: key.to_string(),
            reason,
        };

        let file = tokio::fs::File::open(local_path)
            .await
            .map_err(|err| upload_err(format!("failed to open {}: {err}", local_path.display())))?;
        let content_length = file
            .metadata()
            .await
            .map_err(|err| upload_err(format!("failed to stat {}: {err}", local_path.display())))?
            .len();

        let date = Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string();
        let authorization = self.authorization(key, &date);

        let response = self
            .client
            .put(self.object_url(key))
            .header("Date", date)
            .header("Content-Type", CONTENT_TYPE)
            .header("Content-Length", content_length)
            .header("Authorization", authorization)
            .body(reqwest::Body::wrap_stream(ReaderStream::new(file)))
            .send()
            .await
            .map_err(|err| upload_err(err.to_string()))?;

        if !response.status().is_success() {
            return Err(upload_err(format!("server responded {}", response.status())));
        }

        debug!(key, bytes = content_length, "archive uploaded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> OssConfig {
        OssConfig {
            endpoint: "oss-cn-hangzhou.aliyuncs.com".to_string(),
            access_key_id: "test-id".to_string(),
            access_key_secret: "test-secret".to_string(),
            bucket: "logs".to_string(),
            remote_dir: "backups".to_string(),
        }
    }

    #[test]
    fn builds_virtual_hosted_object_url() {
        let store = OssStore::new(&config()).unwrap();
        assert_eq!(
            store.object_url("backups/app-2026-08-08.zip"),
            "https://logs.oss-cn-hangzhou.aliyuncs.com/backups/app-2026-08-08.zip"
        );
    }

    #[test]
    fn signature_is_deterministic_for_fixed_inputs() {
        let store = OssStore::new(&config()).unwrap();
        let date = "Sat, 08 Aug 2026 00:00:00 GMT";

        let first = store.authorization("backups/app.zip", date);
        let second = store.authorization("backups/app.zip", date);
        assert_eq!(first, second);
        assert!(first.starts_with("OSS test-id:"));

        // Any change to the signed request must change the signature.
        let other_key = store.authorization("backups/db.zip", date);
        assert_ne!(first, other_key);
        let other_date = store.authorization("backups/app.zip", "Sun, 09 Aug 2026 00:00:00 GMT");
        assert_ne!(first, other_date);
    }

    #[test]
    fn construction_requires_endpoint_and_credentials() {
        let mut missing_endpoint = config();
        missing_endpoint.endpoint.clear();
        assert!(matches!(
            OssStore::new(&missing_endpoint),
            Err(StorageError::Construction(_))
        ));

        let mut missing_secret = config();
        missing_secret.access_key_secret.clear();
        assert!(matches!(
            OssStore::new(&missing_secret),
            Err(StorageError::Construction(_))
        ));
    }
}
