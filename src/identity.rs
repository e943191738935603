//! Resolving the benchmark identifier, which namespaces the uploaded object keys.
//!
//! On a cloud instance the identifier is the instance id reported by the host metadata command,
//! without its `i-` prefix. Anywhere else (or if the command misbehaves) a random token is used.

use std::fmt;
use std::process::Command;
use std::time::Duration;

use rand::Rng;

use serde::Serialize;

use crate::process::{run_with_timeout, ProcessError};

/// The default metadata command and its arguments.
pub const DEFAULT_METADATA_COMMAND: &[&str] = &["ec2metadata", "--instance-id"];

/// The default bound on how long to wait for the metadata command.
pub const DEFAULT_METADATA_TIMEOUT: Duration = Duration::from_secs(3);

/// The number of characters of prefix on an instance id (i.e. `i-`).
const INSTANCE_ID_PREFIX_LEN: usize = 2;

/// A non-empty identifier for this run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BenchmarkId(String);

impl BenchmarkId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Build an identifier from metadata command output. Returns `None` if nothing is left after
    /// stripping the prefix.
    pub fn from_instance_id(output: &str) -> Option<Self> {
        let id: String = output.trim().chars().skip(INSTANCE_ID_PREFIX_LEN).collect();
        if id.is_empty() {
            None
        } else {
            Some(BenchmarkId(id))
        }
    }

    /// A random token: a 48-bit node value rendered in decimal.
    pub fn random() -> Self {
        let node: u64 = rand::thread_rng().gen::<u64>() & 0xFFFF_FFFF_FFFF;
        BenchmarkId(node.to_string())
    }
}

impl fmt::Display for BenchmarkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A command that prints the host's instance id.
#[derive(Debug, Clone)]
pub struct MetadataCommand {
    pub program: String,
    pub args: Vec<String>,
    pub timeout: Duration,
}

impl Default for MetadataCommand {
    fn default() -> Self {
        MetadataCommand {
            program: DEFAULT_METADATA_COMMAND[0].into(),
            args: DEFAULT_METADATA_COMMAND[1..]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            timeout: DEFAULT_METADATA_TIMEOUT,
        }
    }
}

impl MetadataCommand {
    /// Query the instance id. `Ok(None)` means the command ran fine but printed nothing usable.
    fn query(&self) -> Result<Option<BenchmarkId>, ProcessError> {
        let out = run_with_timeout(
            Command::new(&self.program).args(&self.args),
            self.timeout,
        )?;

        if !out.status.success() {
            log::debug!("metadata command stderr: {}", out.stderr.trim());
            println!("Failed to retrieve instance ID.");
            return Ok(None);
        }

        Ok(BenchmarkId::from_instance_id(&out.stdout))
    }
}

/// Resolve the benchmark identifier. Never fails: every problem with the metadata command is
/// reported on stdout and answered with a random identifier.
pub fn resolve(cmd: &MetadataCommand) -> BenchmarkId {
    match cmd.query() {
        Ok(Some(id)) => {
            log::info!("Using instance id {} as benchmark id", id);
            return id;
        }
        Ok(None) => {}
        Err(ProcessError::Timeout { program, .. }) => println!(
            "The {} command timed out. It seems not to be running on an EC2 instance.",
            program
        ),
        Err(ProcessError::NotFound { program }) => println!("{} command not found.", program),
        Err(err) => println!("Failed to retrieve instance ID: {}", err),
    }

    println!("use uuid instead of instance id");
    BenchmarkId::random()
}
