//! The source contract and the bundled source adapters.
//!
//! A [`Source`] answers one question per node: "what do you hold for this key,
//! given a slot of this shape?" Sources are queried in caller order and the
//! first one that produces a value wins.
//!
//! | Source         | Backing data                                  |
//! |----------------|-----------------------------------------------|
//! | [`MapSource`]  | An in-memory [`Value`] tree                   |
//! | [`EnvSource`]  | Process environment or a snapshot of it       |
//! | [`FileSource`] | A TOML/YAML document parsed into a tree       |
//!
//! [`FileLocator`] finds the files of an application across search paths and
//! profiles.

pub mod env;
pub mod file;
pub mod locator;
pub mod map;

pub use env::EnvSource;
pub use file::{FileSource, Format};
pub use locator::{FileLocator, Profile};
pub use map::MapSource;

use crate::error::LoadError;
use crate::key::Key;
use crate::shape::Shape;
use crate::value::Value;

/// A provider of raw configuration values.
pub trait Source {
    /// Name used in error messages and provenance.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Looks up `key` for a slot of the given shape.
    ///
    /// Records and sequences are an allocation step: return an empty mapping
    /// for a record and a sequence of the right length for a sequence.
    /// Anything missing is [`LoadError::NotPresent`]; only that outcome lets the
    /// driver fall through to the next source.
    fn load(&self, shape: &Shape, key: &Key) -> Result<Value, LoadError>;
}

/// An absent source never has a value.
impl<S: Source> Source for Option<S> {
    fn name(&self) -> &str {
        match self {
            Some(source) => source.name(),
            None => "none",
        }
    }

    fn load(&self, shape: &Shape, key: &Key) -> Result<Value, LoadError> {
        match self {
            Some(source) => source.load(shape, key),
            None => Err(LoadError::NotPresent),
        }
    }
}

impl<S: Source + ?Sized> Source for &S {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn load(&self, shape: &Shape, key: &Key) -> Result<Value, LoadError> {
        (**self).load(shape, key)
    }
}

impl<S: Source + ?Sized> Source for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn load(&self, shape: &Shape, key: &Key) -> Result<Value, LoadError> {
        (**self).load(shape, key)
    }
}
