//! Discovery of an application's configuration files.
//!
//! # Search Order
//!
//! For every search path (by default the current directory, then
//! `<user config dir>/<app>`):
//!
//! 1. Profile-specific files: `<app>.<profile>.<ext>` for every enabled extension
//! 2. Base files: `<app>.<ext>` for every enabled extension
//!
//! The search stops at the first path that holds a base file. Located files
//! come back in precedence order, so the profile file shadows the base file
//! when both are bound.
//!
//! # Example
//!
//! ```rust,ignore
//! use bindery::source::FileLocator;
//!
//! let files = FileLocator::new("gateway")
//!     .profile("production")
//!     .search_path("/etc/gateway")
//!     .sources()?;
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::file::{FileSource, Format};
use crate::error::SourceResult;

/// Configuration profile for environment-specific files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Profile {
    /// Development profile (default).
    #[default]
    Development,
    /// Production profile.
    Production,
    /// Custom profile name.
    Custom(String),
}

impl Profile {
    /// Returns the profile name as a string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Custom(name) => name,
        }
    }

    /// Parses a profile name, accepting the short forms `dev` and `prod`.
    pub fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "development" | "dev" => Self::Development,
            other => Self::Custom(other.to_string()),
        }
    }

    /// Reads `<APP>_PROFILE`, defaulting to [`Profile::Development`].
    pub fn from_env(app: &str) -> Self {
        std::env::var(profile_var(app))
            .map(|p| Self::parse(&p))
            .unwrap_or_default()
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn profile_var(app: &str) -> String {
    format!("{}_PROFILE", app.to_uppercase().replace(['-', '.'], "_"))
}

/// Finds the configuration files of an application.
#[derive(Debug, Clone)]
pub struct FileLocator {
    app: String,
    profile: Profile,
    search_paths: Vec<PathBuf>,
}

impl FileLocator {
    /// Creates a locator for `app`, with the profile taken from `<APP>_PROFILE`.
    pub fn new(app: impl Into<String>) -> Self {
        let app = app.into();
        Self {
            profile: Profile::from_env(&app),
            app,
            search_paths: Vec::new(),
        }
    }

    /// Sets the configuration profile.
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.profile = Profile::parse(profile.as_ref());
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Adds the current directory to the search paths.
    pub fn with_current_dir(self) -> Self {
        if let Ok(cwd) = std::env::current_dir() {
            self.search_path(cwd)
        } else {
            self
        }
    }

    /// Adds `<user config dir>/<app>` to the search paths.
    pub fn with_user_config_dir(self) -> Self {
        if let Some(config_dir) = dirs::config_dir() {
            let dir = config_dir.join(&self.app);
            self.search_path(dir)
        } else {
            self
        }
    }

    pub fn app(&self) -> &str {
        &self.app
    }

    pub fn current_profile(&self) -> &Profile {
        &self.profile
    }

    fn resolve_search_paths(&self) -> Vec<PathBuf> {
        if !self.search_paths.is_empty() {
            return self.search_paths.clone();
        }
        let mut paths = Vec::new();
        if let Ok(cwd) = std::env::current_dir() {
            paths.push(cwd);
        }
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join(&self.app));
        }
        paths
    }

    /// Lists existing configuration files, highest precedence first.
    pub fn locate(&self) -> Vec<PathBuf> {
        let mut found = Vec::new();
        for search_path in self.resolve_search_paths() {
            for ext in Self::extensions() {
                let profile_path = search_path.join(format!("{}.{}.{ext}", self.app, self.profile));
                if profile_path.is_file() {
                    debug!(path = %profile_path.display(), "Found profile-specific config");
                    found.push(profile_path);
                }
            }

            let mut has_base = false;
            for ext in Self::extensions() {
                let base_path = search_path.join(format!("{}.{ext}", self.app));
                if base_path.is_file() {
                    debug!(path = %base_path.display(), "Found configuration file");
                    found.push(base_path);
                    has_base = true;
                }
            }
            if has_base {
                return found;
            }
        }

        if found.is_empty() {
            warn!(app = %self.app, profile = %self.profile, "No configuration file found");
        }
        found
    }

    fn extensions() -> impl Iterator<Item = &'static str> {
        Format::enabled()
            .into_iter()
            .flat_map(|format| format.extensions().iter().copied())
    }

    /// Opens every located file as a source, highest precedence first.
    pub fn sources(&self) -> SourceResult<Vec<FileSource>> {
        self.locate().into_iter().map(FileSource::open).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_profile_parse() {
        assert_eq!(Profile::parse("PROD"), Profile::Production);
        assert_eq!(Profile::parse("dev"), Profile::Development);
        assert_eq!(Profile::parse("staging"), Profile::Custom("staging".into()));
        assert_eq!(Profile::Custom("qa".into()).to_string(), "qa");
    }

    #[test]
    fn test_profile_from_env() {
        // SAFETY: the variable name is unique to this test
        unsafe {
            std::env::set_var("BINDERY_LOCATOR_TEST_PROFILE", "production");
        }
        assert_eq!(
            Profile::from_env("bindery-locator-test"),
            Profile::Production
        );
        unsafe {
            std::env::remove_var("BINDERY_LOCATOR_TEST_PROFILE");
        }
        assert_eq!(
            Profile::from_env("bindery-locator-test"),
            Profile::Development
        );
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_locate_profile_before_base() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("svc.toml"), "name = \"base\"\n").unwrap();
        fs::write(dir.path().join("svc.production.toml"), "name = \"prod\"\n").unwrap();
        fs::write(dir.path().join("svc.staging.toml"), "name = \"staging\"\n").unwrap();

        let located = FileLocator::new("svc")
            .profile("prod")
            .search_path(dir.path())
            .locate();
        assert_eq!(
            located,
            vec![
                dir.path().join("svc.production.toml"),
                dir.path().join("svc.toml"),
            ]
        );
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_locate_stops_at_first_base() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        fs::write(first.path().join("svc.toml"), "a = 1\n").unwrap();
        fs::write(second.path().join("svc.toml"), "a = 2\n").unwrap();

        let locator = FileLocator::new("svc")
            .profile("dev")
            .search_path(first.path())
            .search_path(second.path());
        assert_eq!(locator.locate(), vec![first.path().join("svc.toml")]);

        let sources = locator.sources().unwrap();
        assert_eq!(sources.len(), 1);
    }

    #[cfg(all(feature = "toml-config", feature = "yaml-config"))]
    #[test]
    fn test_profile_files_shadow_every_base_format() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("svc.toml"), "a = 1\n").unwrap();
        fs::write(dir.path().join("svc.production.yml"), "a: 2\n").unwrap();

        let located = FileLocator::new("svc")
            .profile("production")
            .search_path(dir.path())
            .locate();
        assert_eq!(
            located,
            vec![
                dir.path().join("svc.production.yml"),
                dir.path().join("svc.toml"),
            ]
        );
    }

    #[test]
    fn test_locate_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let locator = FileLocator::new("svc").search_path(dir.path());
        assert!(locator.locate().is_empty());
        assert!(locator.sources().unwrap().is_empty());
    }
}
