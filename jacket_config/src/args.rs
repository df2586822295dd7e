//! Command-line selection of the config file.

use std::{ffi::OsString, path::PathBuf};

use clap::Parser;

/// [`ConfigArgs`] picks up `--config <PATH>` from the command line.
///
/// `--config` may appear anywhere on the command line. Any other argument is ignored, so the
/// host binary keeps ownership of its own flags and subcommands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Parser)]
#[command(
    ignore_errors = true,
    args_override_self = true,
    disable_help_flag = true,
    disable_version_flag = true
)]
pub struct ConfigArgs {
    /// Config file to load.
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl ConfigArgs {
    /// Parses `args`, the first item being the binary name.
    ///
    /// # Examples
    ///
    /// ```
    /// use jacket_config::ConfigArgs;
    ///
    /// let args = ConfigArgs::from_args(["svc", "--config", "svc.yaml"]);
    /// assert_eq!(args.config_path(None).to_str(), Some("svc.yaml"));
    /// ```
    pub fn from_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::try_parse_from(config_flags(args)).unwrap_or_default()
    }

    pub fn from_process() -> Self {
        Self::from_args(std::env::args_os())
    }

    /// Returns the selected config file, or [`default_config_file`] for `service_name`.
    pub fn config_path(&self, service_name: Option<&str>) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| default_config_file(service_name))
    }
}

/// Keeps the binary name and every `--config <PATH>` / `--config=<PATH>` occurrence.
fn config_flags<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let mut args = args.into_iter().map(Into::into);
    let mut kept: Vec<OsString> = args.next().into_iter().collect();
    while let Some(arg) = args.next() {
        match arg.to_str() {
            Some("--config") => {
                kept.push(arg);
                kept.extend(args.next());
            }
            Some(flag) if flag.starts_with("--config=") => kept.push(arg),
            _ => {}
        }
    }
    kept
}

/// Default config file: `{service}.conf`, or `app.conf` without a service name.
pub fn default_config_file(service_name: Option<&str>) -> PathBuf {
    match service_name {
        Some(name) if !name.trim().is_empty() => PathBuf::from(format!("{}.conf", name.trim())),
        _ => PathBuf::from("app.conf"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_flag() {
        let args = ConfigArgs::from_args(["svc", "--config=/etc/svc.toml"]);
        assert_eq!(args.config, Some(PathBuf::from("/etc/svc.toml")));
    }

    #[test]
    fn test_config_flag_after_foreign_args() {
        let args = ConfigArgs::from_args(["svc", "--port", "80", "--config", "x.conf"]);
        assert_eq!(args.config, Some(PathBuf::from("x.conf")));

        let args = ConfigArgs::from_args(["svc", "run", "--config", "y.conf"]);
        assert_eq!(args.config, Some(PathBuf::from("y.conf")));

        let args = ConfigArgs::from_args(["svc", "serve", "--config=prod.yaml", "--verbose"]);
        assert_eq!(args.config, Some(PathBuf::from("prod.yaml")));
    }

    #[test]
    fn test_last_config_flag_wins() {
        let args = ConfigArgs::from_args(["svc", "--config", "a.conf", "--config=b.conf"]);
        assert_eq!(args.config, Some(PathBuf::from("b.conf")));
    }

    #[test]
    fn test_no_flag() {
        let args = ConfigArgs::from_args(["svc", "run", "--port", "80"]);
        assert_eq!(args.config, None);
        assert_eq!(args.config_path(None), PathBuf::from("app.conf"));
        assert_eq!(args.config_path(Some("explorer")), PathBuf::from("explorer.conf"));
    }

    #[test]
    fn test_default_config_file() {
        assert_eq!(default_config_file(Some("  ")), PathBuf::from("app.conf"));
        assert_eq!(default_config_file(Some("api")), PathBuf::from("api.conf"));
    }
}
