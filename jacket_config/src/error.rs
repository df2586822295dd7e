//! Error types.

use std::path::PathBuf;

/// [`ConfigError`] is raised while loading a config file.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("config file `{}` not found", .0.display())]
    NotFound(PathBuf),

    #[error("unsupported config file format `{0}`")]
    UnsupportedFormat(String),

    #[error("failed to parse `{}`: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: dotenvy::Error,
    },

    #[error(transparent)]
    Figment(Box<figment::Error>),
}

impl ConfigError {
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

/// [`Result`] is an alias to [`core::result::Result`] with [`ConfigError`] as the
/// default error type.
pub type Result<T, E = ConfigError> = core::result::Result<T, E>;
