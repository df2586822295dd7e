//! [`LayeredConfig`], the figment-backed [`Config`] implementation.

use std::{
    collections::BTreeMap,
    ffi::OsStr,
    fmt,
    path::{Path, PathBuf},
    sync::{PoisonError, RwLock},
    time::Duration,
};

use chrono::{DateTime, Utc};
use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    value::{Dict, Value},
};
use jacket_core::{BoxError, Module};
use serde::Deserialize;

use crate::{
    args::ConfigArgs,
    config::Config,
    error::{ConfigError, Result},
    expand::{expand, expand_lossy},
};

/// [`LayeredConfig`] reads, lowest priority first:
///
/// 1. the config file, once [`Config::load`] succeeds;
/// 2. the process environment, with lower-cased variable names;
/// 3. values set through [`LayeredConfig::with_value`].
///
/// The file format follows the extension: `.json`, `.toml`, `.yaml` / `.yml`, and env-style
/// `KEY=value` lines for `.conf`, `.env` or no extension. Keys are looked up lower-cased.
pub struct LayeredConfig {
    path: Option<PathBuf>,
    env: bool,
    overrides: Dict,
    file: RwLock<Figment>,
}

impl LayeredConfig {
    /// Creates a config without file or environment layer.
    pub fn empty() -> Self {
        Self {
            path: None,
            env: false,
            overrides: Dict::new(),
            file: RwLock::new(Figment::new()),
        }
    }

    /// Creates a config backed by `path` and the environment. The file is read on
    /// [`Config::load`].
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            env: true,
            ..Self::empty()
        }
    }

    pub fn from_args(args: &ConfigArgs, service_name: Option<&str>) -> Self {
        Self::new(args.config_path(service_name))
    }

    /// Uses `--config` from the process arguments, or the default file for `service_name`.
    pub fn from_process(service_name: Option<&str>) -> Self {
        Self::from_args(&ConfigArgs::from_process(), service_name)
    }

    #[must_use]
    pub fn with_env(mut self, env: bool) -> Self {
        self.env = env;
        self
    }

    /// Sets `key` above every other layer.
    ///
    /// # Examples
    ///
    /// ```
    /// use jacket_config::{Config, LayeredConfig};
    ///
    /// let config = LayeredConfig::empty()
    ///     .with_value("port", 8080)
    ///     .with_value("modules", "db server");
    /// assert_eq!(config.get_int("port", 0), 8080);
    /// assert_eq!(config.get_string_slice("modules", &[]), ["db", "server"]);
    /// assert_eq!(config.get_string("missing", "fallback"), "fallback");
    /// ```
    #[must_use]
    pub fn with_value(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.overrides.insert(key.to_lowercase(), value.into());
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn figment(&self) -> Figment {
        let mut figment = self
            .file
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if self.env {
            figment = figment.merge(Env::raw());
        }
        figment.merge(Serialized::defaults(&self.overrides))
    }

    fn raw(&self, key: &str) -> Option<Raw> {
        self.figment().extract_inner(&key.to_lowercase()).ok()
    }

    fn integer<T: TryFrom<i128>>(&self, key: &str, default: T) -> T {
        self.raw(key)
            .as_ref()
            .and_then(Raw::to_i128)
            .and_then(|value| T::try_from(value).ok())
            .unwrap_or(default)
    }
}

impl Default for LayeredConfig {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for LayeredConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayeredConfig")
            .field("path", &self.path)
            .field("env", &self.env)
            .field("overrides", &self.overrides)
            .finish_non_exhaustive()
    }
}

impl Module for LayeredConfig {
    fn close(&self) -> Result<(), BoxError> {
        Ok(())
    }
}

impl Config for LayeredConfig {
    fn load(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let file = read_file(path)?;
        file.extract::<Dict>()?;
        *self.file.write().unwrap_or_else(PoisonError::into_inner) = file;
        debug!(path = %path.display(), "config file loaded");
        Ok(())
    }

    fn is_set(&self, key: &str) -> bool {
        self.figment().find_value(&key.to_lowercase()).is_ok()
    }

    fn get_bool(&self, key: &str, default: bool) -> bool {
        self.raw(key)
            .as_ref()
            .and_then(Raw::to_bool)
            .unwrap_or(default)
    }

    fn get_string(&self, key: &str, default: &str) -> String {
        if let Some(value) = self.raw(key).as_ref().and_then(Raw::to_text) {
            let (expanded, complete) = expand(&value);
            if complete {
                return expanded;
            }
            debug!(key, "config value references an unset variable, using default");
        }
        expand_lossy(default)
    }

    fn get_int(&self, key: &str, default: i64) -> i64 {
        self.integer(key, default)
    }

    fn get_int32(&self, key: &str, default: i32) -> i32 {
        self.integer(key, default)
    }

    fn get_int64(&self, key: &str, default: i64) -> i64 {
        self.integer(key, default)
    }

    fn get_uint(&self, key: &str, default: u64) -> u64 {
        self.integer(key, default)
    }

    fn get_uint32(&self, key: &str, default: u32) -> u32 {
        self.integer(key, default)
    }

    fn get_uint64(&self, key: &str, default: u64) -> u64 {
        self.integer(key, default)
    }

    fn get_float64(&self, key: &str, default: f64) -> f64 {
        self.raw(key)
            .as_ref()
            .and_then(Raw::to_f64)
            .unwrap_or(default)
    }

    fn get_time(&self, key: &str, default: DateTime<Utc>) -> DateTime<Utc> {
        let parsed = match self.raw(key) {
            Some(Raw::Str(text)) => {
                let text = text.trim();
                DateTime::parse_from_rfc3339(text)
                    .map(|time| time.with_timezone(&Utc))
                    .ok()
                    .or_else(|| text.parse().ok().and_then(|secs| DateTime::from_timestamp(secs, 0)))
            }
            Some(Raw::Int(secs)) => DateTime::from_timestamp(secs, 0),
            _ => None,
        };
        parsed.unwrap_or(default)
    }

    fn get_duration(&self, key: &str, default: Duration) -> Duration {
        let parsed = match self.raw(key) {
            Some(Raw::Str(text)) => {
                let text = text.trim();
                humantime::parse_duration(text)
                    .ok()
                    .or_else(|| text.parse().ok().map(Duration::from_nanos))
            }
            Some(Raw::Int(nanos)) => u64::try_from(nanos).ok().map(Duration::from_nanos),
            Some(Raw::Uint(nanos)) => Some(Duration::from_nanos(nanos)),
            _ => None,
        };
        parsed.unwrap_or(default)
    }

    fn get_int_slice(&self, key: &str, default: &[i64]) -> Vec<i64> {
        let parsed = match self.raw(key) {
            Some(Raw::List(items)) => items
                .iter()
                .map(|item| item.to_i128().and_then(|value| i64::try_from(value).ok()))
                .collect::<Option<Vec<_>>>(),
            Some(Raw::Str(text)) => text
                .split_whitespace()
                .map(|item| item.parse().ok())
                .collect(),
            _ => None,
        };
        parsed.unwrap_or_else(|| default.to_vec())
    }

    fn get_string_slice(&self, key: &str, default: &[&str]) -> Vec<String> {
        match self.raw(key).as_ref().and_then(Raw::to_strings) {
            Some(items) => items.iter().map(|item| expand_lossy(item)).collect(),
            None => default.iter().map(|item| expand_lossy(item)).collect(),
        }
    }

    fn get_string_map(&self, key: &str, default: Dict) -> Dict {
        self.figment()
            .extract_inner(&key.to_lowercase())
            .unwrap_or(default)
    }

    fn get_string_map_string(
        &self,
        key: &str,
        default: BTreeMap<String, String>,
    ) -> BTreeMap<String, String> {
        let parsed = match self.raw(key) {
            Some(Raw::Map(entries)) => entries
                .into_iter()
                .map(|(name, value)| Some((name, value.to_text()?)))
                .collect::<Option<BTreeMap<_, _>>>(),
            _ => None,
        };
        parsed
            .unwrap_or(default)
            .into_iter()
            .map(|(name, value)| (name, expand_lossy(&value)))
            .collect()
    }

    fn get_string_map_slice(
        &self,
        key: &str,
        default: BTreeMap<String, Vec<String>>,
    ) -> BTreeMap<String, Vec<String>> {
        let parsed = match self.raw(key) {
            Some(Raw::Map(entries)) => entries
                .into_iter()
                .map(|(name, value)| Some((name, value.to_strings()?)))
                .collect::<Option<BTreeMap<_, _>>>(),
            _ => None,
        };
        parsed
            .unwrap_or(default)
            .into_iter()
            .map(|(name, items)| (name, items.iter().map(|item| expand_lossy(item)).collect()))
            .collect()
    }
}

fn read_file(path: &Path) -> Result<Figment> {
    if !path.is_file() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }
    let extension = path
        .extension()
        .and_then(OsStr::to_str)
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    let figment = match extension.as_str() {
        "" | "conf" | "env" => Figment::from(Serialized::defaults(read_env_file(path)?)),
        "json" => Figment::from(Json::file(path)),
        "toml" => Figment::from(Toml::file(path)),
        "yaml" | "yml" => Figment::from(Yaml::file(path)),
        other => return Err(ConfigError::UnsupportedFormat(other.to_owned())),
    };
    Ok(figment)
}

fn read_env_file(path: &Path) -> Result<Dict> {
    let parse_error = |source: dotenvy::Error| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    };
    dotenvy::from_path_iter(path)
        .map_err(parse_error)?
        .map(|item| {
            item.map(|(key, value)| (key.to_lowercase(), Value::from(value)))
                .map_err(parse_error)
        })
        .collect()
}

/// Untyped view of a config value.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Raw {
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Str(String),
    List(Vec<Raw>),
    Map(BTreeMap<String, Raw>),
}

impl Raw {
    fn to_text(&self) -> Option<String> {
        match self {
            Self::Bool(value) => Some(value.to_string()),
            Self::Int(value) => Some(value.to_string()),
            Self::Uint(value) => Some(value.to_string()),
            Self::Float(value) => Some(value.to_string()),
            Self::Str(value) => Some(value.clone()),
            Self::List(_) | Self::Map(_) => None,
        }
    }

    fn to_i128(&self) -> Option<i128> {
        match self {
            Self::Int(value) => Some(i128::from(*value)),
            Self::Uint(value) => Some(i128::from(*value)),
            Self::Str(value) => value.trim().parse().ok(),
            _ => None,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn to_f64(&self) -> Option<f64> {
        match self {
            Self::Int(value) => Some(*value as f64),
            Self::Uint(value) => Some(*value as f64),
            Self::Float(value) => Some(*value),
            Self::Str(value) => value.trim().parse().ok(),
            _ => None,
        }
    }

    fn to_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            Self::Int(value) => Some(*value != 0),
            Self::Uint(value) => Some(*value != 0),
            Self::Str(value) => match value.trim() {
                "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
                "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    fn to_strings(&self) -> Option<Vec<String>> {
        match self {
            Self::List(items) => items.iter().map(Self::to_text).collect(),
            Self::Str(value) => Some(value.split_whitespace().map(str::to_owned).collect()),
            Self::Map(_) => None,
            scalar => scalar.to_text().map(|text| vec![text]),
        }
    }
}

#[cfg(test)]
mod tests {
    use figment::Jail;

    use super::*;

    fn load(config: &LayeredConfig) -> figment::error::Result<()> {
        config.load().map_err(|err| err.to_string().into())
    }

    #[test]
    fn test_env_file_under_environment() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "app.conf",
                "JACKET_PORT=8080\njacket_modules=\"db chain\"\njacket_debug=true\n",
            )?;
            jail.set_env("JACKET_PORT", "9090");

            let config = LayeredConfig::new("app.conf");
            load(&config)?;
            assert_eq!(config.get_int("jacket_port", 0), 9090);
            assert_eq!(config.get_string_slice("jacket_modules", &[]), ["db", "chain"]);
            assert!(config.get_bool("JACKET_DEBUG", false));
            assert!(!config.is_set("jacket_nothing"));
            Ok(())
        });
    }

    #[test]
    fn test_missing_file() {
        Jail::expect_with(|jail| {
            jail.set_env("JACKET_ADDRESS", "db:3306");

            let config = LayeredConfig::new("absent.conf");
            let err = config.load().unwrap_err();
            assert!(err.is_not_found());
            assert_eq!(config.get_string("jacket_address", ""), "db:3306");
            Ok(())
        });
    }

    #[test]
    fn test_yaml_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "svc.yaml",
                r"
ports: [80, 443]
names: [api, web]
labels:
  tier: backend
  zone: eu
routes:
  api: [/v1, /v2]
timeout: 1m 30s
started: 2024-01-02T03:04:05Z
ratio: 0.5
",
            )?;

            let config = LayeredConfig::new("svc.yaml").with_env(false);
            load(&config)?;
            assert_eq!(config.get_int_slice("ports", &[]), [80, 443]);
            assert_eq!(config.get_string_slice("names", &[]), ["api", "web"]);
            assert_eq!(
                config.get_string_map_string("labels", BTreeMap::new()),
                BTreeMap::from([
                    ("tier".to_owned(), "backend".to_owned()),
                    ("zone".to_owned(), "eu".to_owned()),
                ])
            );
            assert_eq!(
                config.get_string_map_slice("routes", BTreeMap::new()),
                BTreeMap::from([("api".to_owned(), vec!["/v1".to_owned(), "/v2".to_owned()])])
            );
            assert_eq!(config.get_string_map("labels", Dict::new()).len(), 2);
            assert_eq!(config.get_duration("timeout", Duration::ZERO), Duration::from_secs(90));
            assert_eq!(
                config.get_time("started", DateTime::UNIX_EPOCH).timestamp(),
                1_704_164_645
            );
            assert!((config.get_float64("ratio", 0.0) - 0.5).abs() < f64::EPSILON);
            Ok(())
        });
    }

    #[test]
    fn test_toml_and_json_files() {
        Jail::expect_with(|jail| {
            jail.create_file("svc.toml", "port = 7000\nname = \"explorer\"\n")?;
            jail.create_file("svc.json", r#"{ "port": 7001, "enabled": false }"#)?;

            let toml = LayeredConfig::new("svc.toml").with_env(false);
            load(&toml)?;
            assert_eq!(toml.get_uint32("port", 0), 7000);
            assert_eq!(toml.get_string("name", ""), "explorer");

            let json = LayeredConfig::new("svc.json").with_env(false);
            load(&json)?;
            assert_eq!(json.get_uint64("port", 0), 7001);
            assert!(!json.get_bool("enabled", true));
            Ok(())
        });
    }

    #[test]
    fn test_bad_files() {
        Jail::expect_with(|jail| {
            jail.create_file("svc.ini", "port = 1")?;
            jail.create_file("broken.json", "{ \"port\": ")?;

            let err = LayeredConfig::new("svc.ini").load().unwrap_err();
            assert!(matches!(err, ConfigError::UnsupportedFormat(ref ext) if ext == "ini"));

            let err = LayeredConfig::new("broken.json").load().unwrap_err();
            assert!(matches!(err, ConfigError::Figment(_)));
            Ok(())
        });
    }

    #[test]
    fn test_expansion_falls_back_to_default() {
        Jail::expect_with(|jail| {
            jail.set_env("JACKET_DB_HOST", "db.local");

            let config = LayeredConfig::empty()
                .with_value("set", "${JACKET_DB_HOST}:3306")
                .with_value("unset", "${JACKET_NO_SUCH_HOST}:3306")
                .with_value("list", "${JACKET_DB_HOST} ${JACKET_NO_SUCH_HOST}x");
            assert_eq!(config.get_string("set", "localhost:3306"), "db.local:3306");
            assert_eq!(config.get_string("unset", "localhost:3306"), "localhost:3306");
            assert_eq!(config.get_string("absent", "$JACKET_DB_HOST"), "db.local");
            assert_eq!(config.get_string_slice("list", &[]), ["db.local", "x"]);
            Ok(())
        });
    }

    #[test]
    fn test_defaults_on_mismatch() {
        let config = LayeredConfig::empty()
            .with_value("port", "eighty")
            .with_value("big", 5_000_000_000_i64)
            .with_value("nanos", 1500)
            .with_value("epoch", 86_400);
        assert_eq!(config.get_int("port", 80), 80);
        assert_eq!(config.get_int32("big", -1), -1);
        assert_eq!(config.get_int64("big", -1), 5_000_000_000);
        assert_eq!(config.get_uint("port", 1), 1);
        assert_eq!(config.get_duration("nanos", Duration::ZERO), Duration::from_nanos(1500));
        assert_eq!(config.get_time("epoch", DateTime::UNIX_EPOCH).timestamp(), 86_400);
        assert_eq!(config.get_int_slice("absent", &[1, 2]), [1, 2]);
        assert!(config.is_set("PORT"));
    }

    #[test]
    fn test_empty_config_loads() {
        let config = LayeredConfig::empty();
        assert!(config.load().is_ok());
        assert!(config.close().is_ok());
        assert_eq!(config.get_string_slice("modules", &["db"]), ["db"]);
    }
}
