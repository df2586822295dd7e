//! The allow-list of modules that may be built.

use jacket_config::Config;

/// The name of the config module. It is always activated.
pub const BOOTSTRAP_MODULE: &str = "viperconfig";

/// An ordered set of activated module names.
///
/// Only activated modules are built, and only activated modules are handed out as
/// dependencies. [`BOOTSTRAP_MODULE`] is implicitly part of every activation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Activation {
    names: Vec<String>,
}

impl Activation {
    /// Creates an activation from names, dropping duplicates but keeping the first occurrence.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut activation = Self::default();
        for name in names {
            activation.insert(name);
        }
        activation
    }

    /// The config key listing activated modules: `modules`, or `{service_name}_modules`.
    pub fn config_key(service_name: Option<&str>) -> String {
        match service_name {
            Some(service) if !service.trim().is_empty() => {
                let service = service.trim().to_lowercase().replace(char::is_whitespace, "_");
                format!("{service}_modules")
            }
            _ => "modules".to_owned(),
        }
    }

    /// Reads the activated modules from `config`, see [`config_key`](Self::config_key).
    ///
    /// The value is either a whitespace-separated string or a list of names.
    pub fn from_config(config: &dyn Config, service_name: Option<&str>) -> Self {
        Self::new(config.get_string_slice(&Self::config_key(service_name), &[]))
    }

    pub fn insert(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.names.contains(&name) {
            self.names.push(name);
        }
    }

    /// Returns `true` if `name` may be built.
    pub fn contains(&self, name: &str) -> bool {
        name == BOOTSTRAP_MODULE || self.names.iter().any(|n| n == name)
    }

    /// Returns `true` if nothing but the bootstrap module is activated.
    pub fn is_empty(&self) -> bool {
        self.names.iter().all(|n| n == BOOTSTRAP_MODULE)
    }

    /// The explicitly activated names, in order.
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl<S> FromIterator<S> for Activation
where
    S: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}
