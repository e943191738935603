//! Naming of result files and of the objects they are published as.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::identity::BenchmarkId;

/// Extension of the result files written by the benchmarks.
pub const RESULT_EXT: &str = "json";

/// A result file produced by one benchmark, identified by the parameters baked into its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultFile {
    pub tag: &'static str,
    pub key: String,
    pub users: u64,
    pub currencies: String,
}

impl ResultFile {
    /// The local file name, e.g. `v1_k17_u131072_c1.json`.
    pub fn file_name(&self) -> String {
        format!(
            "{}_k{}_u{}_c{}.{}",
            self.tag, self.key, self.users, self.currencies, RESULT_EXT
        )
    }

    /// The object key this file is published under.
    pub fn object_key(&self, id: &BenchmarkId) -> String {
        object_key(&self.file_name(), id)
    }

    /// Check the contents of the result file in `dir` against its name. Returns a description of
    /// each discrepancy. A missing file yields no discrepancies; that is for the publisher to
    /// report.
    pub fn validate(&self, dir: &Path) -> Vec<String> {
        let path = dir.join(self.file_name());
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(_) => return vec![],
        };

        let summary: ResultSummary = match serde_json::from_str(&contents) {
            Ok(summary) => summary,
            Err(err) => return vec![format!("{} is not a benchmark result: {}", path.display(), err)],
        };

        let mut problems = vec![];
        if !same_number(summary.k, &self.key) {
            problems.push(format!("{}: k is {}, expected {}", path.display(), summary.k, self.key));
        }
        if summary.n_users != self.users {
            problems.push(format!(
                "{}: n_users is {}, expected {}",
                path.display(),
                summary.n_users,
                self.users
            ));
        }
        if !same_number(summary.n_currencies, &self.currencies) {
            problems.push(format!(
                "{}: n_currencies is {}, expected {}",
                path.display(),
                summary.n_currencies,
                self.currencies
            ));
        }
        problems
    }
}

impl fmt::Display for ResultFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file_name())
    }
}

/// Whether the name component `text` spells `n`, allowing leading zeros.
fn same_number(n: u64, text: &str) -> bool {
    text.parse::<u64>().ok() == Some(n)
}

/// Splice `_<id>` in front of the final extension of `file_name` (`name.ext` → `name_<id>.ext`).
/// A name without an extension gets the suffix appended.
pub fn object_key(file_name: &str, id: &BenchmarkId) -> String {
    match file_name.rfind('.') {
        Some(dot) => format!("{}_{}{}", &file_name[..dot], id, &file_name[dot..]),
        None => format!("{}_{}", file_name, id),
    }
}

/// The fields of a benchmark result that are reflected in its file name.
#[derive(Debug, Deserialize)]
struct ResultSummary {
    k: u64,
    n_users: u64,
    n_currencies: u64,
}

/// A point in time, serialized in RFC 3339 form.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Timestamp(chrono::DateTime<chrono::Local>);

impl Timestamp {
    pub fn now() -> Self {
        Timestamp(chrono::Local::now())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d-%H-%M-%S"))
    }
}

#[cfg(test)]
mod test {
    use std::io::Write;

    use super::*;

    fn id() -> BenchmarkId {
        BenchmarkId::from_instance_id("i-0abc").unwrap()
    }

    fn v2() -> ResultFile {
        ResultFile {
            tag: "v2",
            key: "3".into(),
            users: 2,
            currencies: "2".into(),
        }
    }

    #[test]
    fn file_and_object_names() {
        let file = v2();
        assert_eq!(file.file_name(), "v2_k3_u2_c2.json");
        assert_eq!(file.object_key(&id()), "v2_k3_u2_c2_0abc.json");
    }

    #[test]
    fn splices_before_last_extension() {
        assert_eq!(object_key("a.b.json", &id()), "a.b_0abc.json");
        assert_eq!(object_key("noext", &id()), "noext_0abc");
    }

    #[test]
    fn validate_matching_result() {
        let dir = tempfile::tempdir().unwrap();
        let mut f = fs::File::create(dir.path().join("v2_k3_u2_c2.json")).unwrap();
        write!(
            f,
            r#"{{"k": 3, "n_users": 2, "n_currencies": 2,
                "commitment_generation_time": 10, "inclusion_generation_time": 5,
                "time_unit": "Milliseconds"}}"#
        )
        .unwrap();

        assert!(v2().validate(dir.path()).is_empty());
    }

    #[test]
    fn validate_reports_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("v2_k3_u2_c2.json"),
            r#"{"k": 3, "n_users": 8, "n_currencies": 2}"#,
        )
        .unwrap();

        let problems = v2().validate(dir.path());
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("n_users is 8, expected 2"));
    }

    #[test]
    fn validate_accepts_zero_padded_names() {
        let dir = tempfile::tempdir().unwrap();
        let file = ResultFile {
            key: "03".into(),
            ..v2()
        };
        fs::write(
            dir.path().join("v2_k03_u2_c2.json"),
            r#"{"k": 3, "n_users": 2, "n_currencies": 2}"#,
        )
        .unwrap();

        assert!(file.validate(dir.path()).is_empty());
    }

    #[test]
    fn validate_reports_garbage_and_ignores_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(v2().validate(dir.path()).is_empty());

        fs::write(dir.path().join("v2_k3_u2_c2.json"), "not json").unwrap();
        assert_eq!(v2().validate(dir.path()).len(), 1);
    }
}
