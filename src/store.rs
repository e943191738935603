//! Access to the object store that results are published to.

use std::path::Path;
use std::process::Command;

use failure::Fail;

use crate::config::Credentials;
use crate::process::{run_captured, ProcessError};

/// The default `aws` command line client.
pub const DEFAULT_AWS_CLI: &str = "aws";

#[derive(Debug, Fail, Clone, PartialEq)]
pub enum StoreError {
    #[fail(display = "bucket does not exist")]
    NotFound,

    #[fail(display = "access forbidden")]
    Forbidden,

    #[fail(display = "credentials not available")]
    NoCredentials,

    #[fail(display = "{}", _0)]
    Other(String),
}

/// Canned access control lists applied to uploaded objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acl {
    PublicRead,
}

impl Acl {
    pub fn as_str(self) -> &'static str {
        match self {
            Acl::PublicRead => "public-read",
        }
    }
}

/// The two object-store operations publishing needs.
pub trait ObjectStore {
    /// Check that `bucket` exists and that we may access it.
    fn head_bucket(&self, bucket: &str) -> Result<(), StoreError>;

    /// Upload the file at `body` as `key` in `bucket`.
    fn put_object(&self, bucket: &str, key: &str, body: &Path, acl: Acl)
        -> Result<(), StoreError>;
}

/// An S3 store reached through the `aws` command line client. The region and credentials are
/// handed to the client through its environment.
#[derive(Debug, Clone)]
pub struct AwsCli {
    program: String,
    args: Vec<String>,
    region: String,
    credentials: Credentials,
}

impl AwsCli {
    /// `command` is the client's whitespace-separated command line, e.g. `aws` or
    /// `aws --profile bench`.
    pub fn new(command: &str, region: &str, credentials: Credentials) -> Self {
        let mut words = command.split_whitespace().map(str::to_owned);
        AwsCli {
            program: words.next().unwrap_or_else(|| DEFAULT_AWS_CLI.into()),
            args: words.collect(),
            region: region.into(),
            credentials,
        }
    }

    fn s3api(&self, args: &[&str]) -> Result<String, StoreError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg("s3api")
            .args(args)
            .args(&["--region", self.region.as_str(), "--output", "json"])
            .env("AWS_DEFAULT_REGION", &self.region);
        for (key, value) in self.credentials.env_vars().iter() {
            cmd.env(key, value);
        }

        let out = run_captured(&mut cmd).map_err(|e| match e {
            ProcessError::NotFound { program } => {
                StoreError::Other(format!("{} command not found", program))
            }
            e => StoreError::Other(e.to_string()),
        })?;

        if out.status.success() {
            Ok(out.stdout)
        } else {
            Err(classify(&out.stderr))
        }
    }
}

impl ObjectStore for AwsCli {
    fn head_bucket(&self, bucket: &str) -> Result<(), StoreError> {
        self.s3api(&["head-bucket", "--bucket", bucket]).map(|_| ())
    }

    fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: &Path,
        acl: Acl,
    ) -> Result<(), StoreError> {
        let body = body.to_string_lossy().into_owned();
        let out = self.s3api(&[
            "put-object",
            "--bucket",
            bucket,
            "--key",
            key,
            "--body",
            body.as_str(),
            "--acl",
            acl.as_str(),
        ])?;
        log::debug!("put-object {}: {}", key, out.trim());
        Ok(())
    }
}

/// Classify an error printed by the `aws` client, e.g.
/// `An error occurred (404) when calling the HeadBucket operation: Not Found`.
pub fn classify(stderr: &str) -> StoreError {
    let stderr = stderr.trim();

    if stderr.contains("(404)") || stderr.contains("(NoSuchBucket)") {
        StoreError::NotFound
    } else if stderr.contains("(403)") || stderr.contains("(AccessDenied)") {
        StoreError::Forbidden
    } else if stderr.contains("Unable to locate credentials") {
        StoreError::NoCredentials
    } else if stderr.is_empty() {
        StoreError::Other("aws exited with an error but printed nothing".into())
    } else {
        StoreError::Other(stderr.into())
    }
}
