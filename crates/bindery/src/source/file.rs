//! A source backed by a parsed configuration document.
//!
//! Parsing is delegated to figment; the resulting tree is served by a
//! [`MapSource`].
//!
//! # Feature Flags
//!
//! - `toml-config` *(default)*: `.toml` documents
//! - `yaml-config`: `.yaml` / `.yml` documents

use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(any(feature = "toml-config", feature = "yaml-config"))]
use figment::providers::Format as _;
#[cfg(feature = "toml-config")]
use figment::providers::Toml;
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;
use tracing::{debug, info};

use super::Source;
use super::map::MapSource;
use crate::error::{LoadError, SourceError, SourceResult};
use crate::key::Key;
use crate::shape::Shape;
use crate::value::{Mapping, Value};

/// A configuration document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Toml,
    Yaml,
}

impl Format {
    /// Picks the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Some(Self::Toml),
            Some("yaml" | "yml") => Some(Self::Yaml),
            _ => None,
        }
    }

    /// File extensions of this format, preferred first.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::Toml => &["toml"],
            Self::Yaml => &["yaml", "yml"],
        }
    }

    /// Whether the cargo feature for this format is enabled.
    pub fn is_enabled(self) -> bool {
        match self {
            Self::Toml => cfg!(feature = "toml-config"),
            Self::Yaml => cfg!(feature = "yaml-config"),
        }
    }

    /// All formats compiled into this build.
    pub fn enabled() -> Vec<Self> {
        [Self::Toml, Self::Yaml]
            .into_iter()
            .filter(|format| format.is_enabled())
            .collect()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Toml => "toml",
            Self::Yaml => "yaml",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

enum Input<'a> {
    File(&'a Path),
    Text(&'a str),
}

/// Serves the contents of a TOML or YAML document.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: Option<PathBuf>,
    format: Format,
    inner: MapSource,
}

impl FileSource {
    /// Opens and parses the file at `path`. The format follows the extension.
    pub fn open<P: AsRef<Path>>(path: P) -> SourceResult<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(SourceError::FileNotFound(path.to_path_buf()));
        }
        let format = Format::from_path(path).ok_or_else(|| {
            SourceError::UnsupportedFormat(format!(
                ".{}",
                path.extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or_default()
            ))
        })?;

        info!(path = %path.display(), format = %format, "Loading configuration file");
        let name = path.display().to_string();
        let root = parse(format, Input::File(path), &name)?;
        Ok(Self {
            path: Some(path.to_path_buf()),
            format,
            inner: MapSource::new(root).named(name),
        })
    }

    /// Like [`FileSource::open`], but a missing file yields `Ok(None)`.
    ///
    /// `None` is itself a [`Source`] that never has a value, so the result can
    /// be handed to a bind as-is.
    pub fn open_optional<P: AsRef<Path>>(path: P) -> SourceResult<Option<Self>> {
        match Self::open(path) {
            Ok(source) => Ok(Some(source)),
            Err(SourceError::FileNotFound(path)) => {
                debug!(path = %path.display(), "Optional configuration file not found");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Parses an in-memory document.
    pub fn parse(name: impl Into<String>, format: Format, contents: &str) -> SourceResult<Self> {
        let name = name.into();
        let root = parse(format, Input::Text(contents), &name)?;
        Ok(Self {
            path: None,
            format,
            inner: MapSource::new(root).named(name),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn format(&self) -> Format {
        self.format
    }

    /// The parsed document tree.
    pub fn root(&self) -> &Value {
        self.inner.root()
    }
}

impl Source for FileSource {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn load(&self, shape: &Shape, key: &Key) -> Result<Value, LoadError> {
        self.inner.load(shape, key)
    }
}

fn parse(format: Format, input: Input<'_>, name: &str) -> SourceResult<Mapping> {
    let figment = provider(format, input)?;
    figment.extract::<Mapping>().map_err(|e| SourceError::Parse {
        name: name.to_string(),
        message: e.to_string(),
    })
}

#[cfg_attr(
    not(all(feature = "toml-config", feature = "yaml-config")),
    allow(unused_variables)
)]
fn provider(format: Format, input: Input<'_>) -> SourceResult<Figment> {
    match format {
        #[cfg(feature = "toml-config")]
        Format::Toml => Ok(match input {
            Input::File(path) => Figment::from(Toml::file_exact(path)),
            Input::Text(text) => Figment::from(Toml::string(text)),
        }),
        #[cfg(feature = "yaml-config")]
        Format::Yaml => Ok(match input {
            Input::File(path) => Figment::from(Yaml::file_exact(path)),
            Input::Text(text) => Figment::from(Yaml::string(text)),
        }),
        #[allow(unreachable_patterns)]
        other => Err(SourceError::UnsupportedFormat(format!(
            "{other} (enable the `{other}-config` feature)"
        ))),
    }
}
