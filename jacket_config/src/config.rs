//! The [`Config`] module contract.

use std::{collections::BTreeMap, time::Duration};

use chrono::{DateTime, Utc};
use figment::value::Dict;
use jacket_core::Module;

use crate::error::Result;

/// [`Config`] is the configuration module a container bootstraps with.
///
/// Getters never fail: a missing or unconvertible value yields the given default. String
/// values have `$VAR` / `${VAR}` references expanded against the process environment.
pub trait Config: Module {
    /// (Re)reads the backing sources.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file is missing, has an unsupported format or cannot be
    /// parsed. Environment values stay available in every case.
    fn load(&self) -> Result<()>;

    fn is_set(&self, key: &str) -> bool;

    fn get_bool(&self, key: &str, default: bool) -> bool;

    /// Returns the expanded value of `key`.
    ///
    /// If the value references an unset variable, the expanded `default` is returned instead.
    fn get_string(&self, key: &str, default: &str) -> String;

    fn get_int(&self, key: &str, default: i64) -> i64;

    fn get_int32(&self, key: &str, default: i32) -> i32;

    fn get_int64(&self, key: &str, default: i64) -> i64;

    fn get_uint(&self, key: &str, default: u64) -> u64;

    fn get_uint32(&self, key: &str, default: u32) -> u32;

    fn get_uint64(&self, key: &str, default: u64) -> u64;

    fn get_float64(&self, key: &str, default: f64) -> f64;

    /// Reads an RFC 3339 timestamp or a number of Unix seconds.
    fn get_time(&self, key: &str, default: DateTime<Utc>) -> DateTime<Utc>;

    /// Reads a human-readable duration such as `1m 30s`, or a number of nanoseconds.
    fn get_duration(&self, key: &str, default: Duration) -> Duration;

    /// Reads a list, or a whitespace-separated string.
    fn get_int_slice(&self, key: &str, default: &[i64]) -> Vec<i64>;

    /// Reads a list, or a whitespace-separated string.
    fn get_string_slice(&self, key: &str, default: &[&str]) -> Vec<String>;

    fn get_string_map(&self, key: &str, default: Dict) -> Dict;

    fn get_string_map_string(
        &self,
        key: &str,
        default: BTreeMap<String, String>,
    ) -> BTreeMap<String, String>;

    fn get_string_map_slice(
        &self,
        key: &str,
        default: BTreeMap<String, Vec<String>>,
    ) -> BTreeMap<String, Vec<String>>;
}
