//! Configuration options for the watcher

use std::path::PathBuf;

use crate::resolver::ResolvePolicy;
use crate::sink::DEFAULT_CONDITION_ID;

/// Default condition document path on Windows hosts.
pub const WINDOWS_CONDITION_PATH: &str = "C:/admira/conditions/biomax.xml";

/// Default condition document path on Unix-family hosts.
pub const UNIX_CONDITION_PATH: &str = "/opt/Admira/share/conditions/biomax.xml";

/// Default alias store file, relative to the working directory.
pub const DEFAULT_ALIAS_PATH: &str = "aliases.json";

/// Platform default for the condition document location.
pub fn default_condition_path() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from(WINDOWS_CONDITION_PATH)
    } else {
        PathBuf::from(UNIX_CONDITION_PATH)
    }
}

/// Configuration options for a watch session
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the JSON alias store
    pub alias_path: PathBuf,

    /// Path to the condition XML document
    pub condition_path: PathBuf,

    /// Value written to the `id` attribute of `<condition>`
    pub condition_id: String,

    /// Policy applied to UIDs with no stored alias
    pub policy: ResolvePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            alias_path: PathBuf::from(DEFAULT_ALIAS_PATH),
            condition_path: default_condition_path(),
            condition_id: DEFAULT_CONDITION_ID.to_owned(),
            policy: ResolvePolicy::default(),
        }
    }
}

impl Config {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the alias store path
    pub fn with_alias_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.alias_path = path.into();
        self
    }

    /// Set the condition document path
    pub fn with_condition_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.condition_path = path.into();
        self
    }

    /// Set the condition id attribute value
    pub fn with_condition_id(mut self, id: impl Into<String>) -> Self {
        self.condition_id = id.into();
        self
    }

    /// Set the alias resolution policy
    pub const fn with_policy(mut self, policy: ResolvePolicy) -> Self {
        self.policy = policy;
        self
    }
}
