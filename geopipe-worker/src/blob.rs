//! Concrete `BlobFetcher` implementations: a local-filesystem fetcher always
//! available, and an S3 fetcher gated behind the `s3` feature. URI parsing
//! matches the original worker's `download_image` exactly: an `s3://`
//! prefix splits into bucket/key, anything else is a bare path resolved
//! against the configured default bucket (S3) or the filesystem directly.

use geopipe_core::collaborators::{parse_s3_uri, BlobFetcher};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LocalBlobError {
    #[error("local blob read failed for {path}: {source}")]
    Io { path: String, #[source] source: std::io::Error },
}

/// Reads a bare filesystem path. Used when no S3 client is configured, or
/// as the fallback for a task whose `image_url` isn't an `s3://` URI.
pub struct LocalBlobFetcher;

impl BlobFetcher for LocalBlobFetcher {
    type Error = LocalBlobError;

    fn get(&self, uri: &str) -> Result<Vec<u8>, Self::Error> {
        std::fs::read(uri).map_err(|source| LocalBlobError::Io { path: uri.to_string(), source })
    }
}

#[cfg(feature = "s3")]
pub use s3_fetcher::S3BlobFetcher;

#[cfg(feature = "s3")]
mod s3_fetcher {
    use super::*;
    use s3::bucket::Bucket;
    use s3::creds::Credentials;

    #[derive(Debug, Error)]
    pub enum S3BlobError {
        #[error("s3 request failed: {0}")]
        Request(#[from] s3::error::S3Error),
        #[error("no bucket configured and uri {0} has no s3:// scheme")]
        NoBucket(String),
    }

    /// Resolves `s3://bucket/key` URIs directly, and bare keys against
    /// `default_bucket` (`GEOPIPE_S3_BUCKET`).
    pub struct S3BlobFetcher {
        default_bucket: Option<Bucket>,
        region: s3::region::Region,
        credentials: Credentials,
    }

    impl S3BlobFetcher {
        pub fn new(
            default_bucket_name: Option<&str>,
            endpoint: Option<&str>,
            access_key: Option<&str>,
            secret_key: Option<&str>,
        ) -> anyhow::Result<Self> {
            let region = match endpoint {
                Some(endpoint) => s3::region::Region::Custom {
                    region: "custom".to_string(),
                    endpoint: endpoint.to_string(),
                },
                None => s3::region::Region::UsEast1,
            };
            let credentials = Credentials::new(access_key, secret_key, None, None, None)?;

            let default_bucket = default_bucket_name
                .map(|name| Bucket::new(name, region.clone(), credentials.clone()))
                .transpose()?
                .map(|b| b.with_path_style());

            Ok(S3BlobFetcher { default_bucket, region, credentials })
        }

        fn bucket_for(&self, name: &str) -> Result<Bucket, S3BlobError> {
            Ok(Bucket::new(name, self.region.clone(), self.credentials.clone())?.with_path_style())
        }
    }

    impl BlobFetcher for S3BlobFetcher {
        type Error = S3BlobError;

        fn get(&self, uri: &str) -> Result<Vec<u8>, Self::Error> {
            let (bucket, key) = match parse_s3_uri(uri) {
                Some((bucket, key)) => (self.bucket_for(bucket)?, key.to_string()),
                None => {
                    let bucket = self
                        .default_bucket
                        .clone()
                        .ok_or_else(|| S3BlobError::NoBucket(uri.to_string()))?;
                    (bucket, uri.to_string())
                }
            };
            let response = bucket.get_object_blocking(&key)?;
            Ok(response.bytes().to_vec())
        }
    }
}

/// The blob fetcher the worker actually uses, chosen once at startup from
/// the `s3` feature and the configured credentials. `BlobFetcher`'s
/// associated error type keeps it from being trait-object safe, so this
/// enum stands in for a `Box<dyn BlobFetcher>` across the two backends.
pub enum AnyBlobFetcher {
    Local(LocalBlobFetcher),
    #[cfg(feature = "s3")]
    S3(S3BlobFetcher),
}

impl AnyBlobFetcher {
    pub fn fetch(&self, uri: &str) -> anyhow::Result<Vec<u8>> {
        match self {
            AnyBlobFetcher::Local(f) => f.get(uri).map_err(Into::into),
            #[cfg(feature = "s3")]
            AnyBlobFetcher::S3(f) => f.get(uri).map_err(Into::into),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_fetcher_surfaces_missing_file_as_error() {
        let fetcher = LocalBlobFetcher;
        assert!(fetcher.get("/nonexistent/path/does/not/exist.jpg").is_err());
    }
}
