//! Run parameters and credentials, read once from the environment at startup.

use std::fmt;

use failure::Fail;

use serde::Serialize;

/// Environment variables holding the object-store credentials.
pub const AWS_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
pub const AWS_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
pub const AWS_SESSION_TOKEN: &str = "AWS_SESSION_TOKEN";

/// Largest level count for which `2^levels` still fits in a `u64`.
pub const MAX_LEVELS: u32 = 63;

#[derive(Debug, Fail, PartialEq)]
pub enum ConfigError {
    #[fail(display = "Environment variable '{}' not found", key)]
    Missing { key: String },

    #[fail(
        display = "Environment variable '{}' must be a level count between {} and {}, got \"{}\"",
        key, min, max, value
    )]
    InvalidLevels {
        key: String,
        value: String,
        min: u32,
        max: u32,
    },
}

/// The names of the environment variables a suite reads its parameters from, in the order in
/// which they are checked.
#[derive(Debug, Clone, Copy)]
pub struct ParamKeys {
    /// A separate `k` value, if the suite has one. Otherwise the level count doubles as `k`.
    pub primary: Option<&'static str>,
    pub levels: &'static str,
    pub currencies: &'static str,
    pub region: &'static str,
    pub bucket: &'static str,
}

/// Parameters controlling which benchmarks run and how their results are named.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunParameters {
    /// The level count. The number of users is `2^levels`.
    pub levels: u32,
    /// The level count as given (trimmed), which is how the benchmarks spell it in their result
    /// names: `LEVELS=04` yields `k04`.
    pub levels_key: String,
    /// The `k` component of result names that do not use the level count.
    pub primary_key: String,
    /// Not coerced: it only ever ends up in file names.
    pub currencies: String,
    pub region: String,
    pub bucket: String,
}

fn require<F>(lookup: &F, key: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).ok_or_else(|| ConfigError::Missing { key: key.into() })
}

impl RunParameters {
    /// Read the parameters named by `keys` using `lookup`. Fails on the first missing key.
    ///
    /// `min_levels` is the smallest level count the suite can name results for (i.e. one where
    /// `2^levels` is not smaller than any user-count offset).
    pub fn load<F>(keys: &ParamKeys, min_levels: u32, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let primary_key = match keys.primary {
            Some(key) => Some(require(&lookup, key)?),
            None => None,
        };
        let levels_raw = require(&lookup, keys.levels)?;
        let currencies = require(&lookup, keys.currencies)?;
        let region = require(&lookup, keys.region)?;
        let bucket = require(&lookup, keys.bucket)?;

        let levels_key = levels_raw.trim().to_owned();
        let levels = levels_key
            .parse::<u32>()
            .ok()
            .filter(|l| (min_levels..=MAX_LEVELS).contains(l))
            .ok_or_else(|| ConfigError::InvalidLevels {
                key: keys.levels.into(),
                value: levels_raw.clone(),
                min: min_levels,
                max: MAX_LEVELS,
            })?;

        Ok(RunParameters {
            levels,
            primary_key: primary_key.unwrap_or_else(|| levels_key.clone()),
            levels_key,
            currencies,
            region,
            bucket,
        })
    }

    /// Read the parameters from the process environment.
    pub fn from_env(keys: &ParamKeys, min_levels: u32) -> Result<Self, ConfigError> {
        Self::load(keys, min_levels, |key| std::env::var(key).ok())
    }

    /// The number of users for the configured level count, `2^levels`.
    pub fn user_count(&self) -> u64 {
        1u64 << self.levels
    }
}

/// Object-store credentials.
#[derive(Clone, PartialEq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
}

impl Credentials {
    pub fn load<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Credentials {
            access_key_id: require(&lookup, AWS_ACCESS_KEY_ID)?,
            secret_access_key: require(&lookup, AWS_SECRET_ACCESS_KEY)?,
            session_token: require(&lookup, AWS_SESSION_TOKEN)?,
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(|key| std::env::var(key).ok())
    }

    /// The credentials as environment variables for a child process.
    pub fn env_vars(&self) -> [(&'static str, &str); 3] {
        [
            (AWS_ACCESS_KEY_ID, self.access_key_id.as_str()),
            (AWS_SECRET_ACCESS_KEY, self.secret_access_key.as_str()),
            (AWS_SESSION_TOKEN, self.session_token.as_str()),
        ]
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &"<redacted>")
            .finish()
    }
}
