use aws_sdk_s3::{Client, config::Region, config::Credentials, config::BehaviorVersion};
use aws_sdk_s3::config::Builder;
use aws_sdk_s3::primitives::ByteStream;
use tracing::info;

#[derive(Clone)]
pub struct StorageService {
    pub client: Client,
    pub bucket: String,
    endpoint: String,
}

impl StorageService {
    pub fn new(
        endpoint: &str,
        bucket: &str,
        access_key: &str,
        secret_key: &str
    ) -> Self {
        let credentials = Credentials::new(access_key, secret_key, None, None, "static");

        let config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .endpoint_url(endpoint)
            .credentials_provider(credentials)
            .force_path_style(true) // Required for MinIO
            .build();

        let client = Client::from_conf(config);

        info!("✅ S3 storage configured (bucket: {})", bucket);

        Self {
            client,
            bucket: bucket.to_string(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    pub async fn put_object(
        &self,
        key: &str,
        body: bytes::Bytes,
        content_type: &str,
    ) -> Result<String, aws_sdk_s3::Error> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await?;

        Ok(self.public_url(key))
    }

    pub async fn delete_object(&self, key: &str) -> Result<(), aws_sdk_s3::Error> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await?;

        Ok(())
    }

    /// Path-style URL, matching the MinIO layout.
    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.endpoint, self.bucket, key)
    }

    /// Inverse of [`StorageService::public_url`] for objects in this bucket.
    pub fn key_from_url<'a>(&self, url: &'a str) -> Option<&'a str> {
        let prefix = format!("{}/{}/", self.endpoint, self.bucket);
        url.strip_prefix(prefix.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_round_trips_to_key() {
        let storage = StorageService::new("http://minio:9000/", "avatars", "a", "b");
        let url = storage.public_url("avatars/u1/x.png");
        assert_eq!(url, "http://minio:9000/avatars/avatars/u1/x.png");
        assert_eq!(storage.key_from_url(&url), Some("avatars/u1/x.png"));
        assert_eq!(storage.key_from_url("https://elsewhere/x.png"), None);
    }
}
