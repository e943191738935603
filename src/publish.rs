//! Publishing result files to the object store.
//!
//! Uploads are independent: each file is uploaded at most once per run, in order, and the first
//! failure stops the sequence. Objects that were already uploaded stay in the bucket. A re-run
//! resolves a new benchmark id and so publishes under new keys.

use std::fmt;
use std::path::{Path, PathBuf};

use failure::Fail;

use serde::Serialize;

use crate::identity::BenchmarkId;
use crate::output::ResultFile;
use crate::store::{Acl, ObjectStore, StoreError};

#[derive(Debug, Fail)]
pub enum BucketError {
    #[fail(display = "\"{}\" bucket does not exist.", _0)]
    NotFound(String),

    #[fail(display = "Access to bucket forbidden.")]
    Forbidden,

    #[fail(display = "An error occurred: {}", _0)]
    Other(#[cause] StoreError),
}

/// Check that `bucket` is reachable before anything is uploaded to it.
pub fn verify_bucket<S: ObjectStore + ?Sized>(store: &S, bucket: &str) -> Result<(), BucketError> {
    match store.head_bucket(bucket) {
        Ok(()) => {
            println!("Successfully connected to the bucket.");
            Ok(())
        }
        Err(StoreError::NotFound) => Err(BucketError::NotFound(bucket.into())),
        Err(StoreError::Forbidden) => Err(BucketError::Forbidden),
        Err(err) => Err(BucketError::Other(err)),
    }
}

#[derive(Debug, Fail)]
pub enum PublishError {
    #[fail(display = "The result file was not found: {}", _0)]
    MissingFile(String),

    #[fail(display = "Credentials not available")]
    NoCredentials,

    #[fail(display = "Upload failed: {}", _0)]
    Store(#[cause] StoreError),
}

/// A publication that stopped part way. `published` keys are in the bucket; `pending` files were
/// never attempted (the first of them is the one that failed).
#[derive(Debug)]
pub struct PartialPublish {
    pub error: PublishError,
    pub published: Vec<String>,
    pub pending: Vec<String>,
}

impl fmt::Display for PartialPublish {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} of {} result files published)",
            self.error,
            self.published.len(),
            self.published.len() + self.pending.len()
        )
    }
}

impl Fail for PartialPublish {
    fn cause(&self) -> Option<&dyn Fail> {
        Some(&self.error)
    }
}

/// The objects created by a complete publication, in upload order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PublishReport {
    pub published: Vec<String>,
}

/// Upload each of `files` from `dir` to `bucket` with public-read access, keyed by `id`.
pub fn publish<S: ObjectStore + ?Sized>(
    store: &S,
    bucket: &str,
    files: &[ResultFile],
    id: &BenchmarkId,
    dir: &Path,
) -> Result<PublishReport, PartialPublish> {
    let mut report = PublishReport::default();

    for (i, file) in files.iter().enumerate() {
        let path: PathBuf = dir.join(file.file_name());
        let key = file.object_key(id);

        let result = if path.is_file() {
            store
                .put_object(bucket, &key, &path, Acl::PublicRead)
                .map_err(|err| match err {
                    StoreError::NoCredentials => PublishError::NoCredentials,
                    err => PublishError::Store(err),
                })
        } else {
            Err(PublishError::MissingFile(path.display().to_string()))
        };

        match result {
            Ok(()) => {
                println!("Uploaded {} as s3://{}/{}", file, bucket, key);
                report.published.push(key);
            }
            Err(error) => {
                return Err(PartialPublish {
                    error,
                    published: report.published,
                    pending: files[i..].iter().map(ResultFile::file_name).collect(),
                });
            }
        }
    }

    Ok(report)
}
