//! Bindery - bind typed configuration records from layered, ordered sources.
//!
//! A destination is a tree of [`Configurable`] slots: records (structs with
//! `#[derive(Configurable)]`), sequences (`Vec<T>`), indirections (`Option<T>`,
//! `Box<T>`), tables of primitives and leaves. A bind walks that tree
//! breadth-first and asks every [`Source`] in turn for the value of each key.
//! The first source that has one wins.
//!
//! This crate provides:
//! - The `Configurable` trait and its derive macro
//! - Source adapters: [`MapSource`], [`EnvSource`], [`FileSource`] and the
//!   [`FileLocator`] that finds an application's files
//! - The resolution driver ([`bind`], [`resolve`], [`Binder`])
//! - Logging setup ([`logging`])
//!
//! # Declaring Keys
//!
//! ```rust,ignore
//! use bindery::Configurable;
//!
//! #[derive(Debug, Default, Configurable)]
//! pub struct Gateway {
//!     // `listen.host`, `listen.port`
//!     #[config("listen")]
//!     pub listen: Listen,
//!     // `upstreams`, may be absent
//!     #[config("upstreams,optional")]
//!     pub upstreams: Vec<Upstream>,
//!     // `request-timeout`, derived from the field name
//!     pub request_timeout: u64,
//!     // never bound
//!     #[config("-")]
//!     pub started_at: Option<std::time::Instant>,
//! }
//! ```
//!
//! # Binding
//!
//! ```rust,ignore
//! use bindery::{Binder, EnvSource, FileSource};
//!
//! let mut gateway = Gateway::default();
//! Binder::new()
//!     .source(EnvSource::new("gateway"))
//!     .source(FileSource::open("gateway.toml")?)
//!     .bind(&mut gateway)?;
//! ```
//!
//! # Errors
//!
//! A bind does not stop at the first bad key. Missing required keys, values a
//! source cannot express and values that do not fit their slot are all
//! collected into one [`ErrorReport`] inside [`BindError::Unresolved`].
//!
//! # Feature Flags
//!
//! - `toml-config` *(default)*: TOML files
//! - `yaml-config`: YAML files
//! - `json-log`: JSON log output

// Lets `#[derive(Configurable)]` expand to `::bindery::...` inside this crate.
extern crate self as bindery;

pub mod configurable;
pub mod driver;
pub mod error;
pub mod key;
pub mod logging;
pub mod shape;
pub mod source;
pub mod traverse;
pub mod value;

// Re-exports
pub use bindery_macros::Configurable;
pub use configurable::{Children, Configurable, Field};
pub use driver::{Binder, LoadStatus, Origin, Provenance, bind, resolve};
pub use error::{
    BindError, BindResult, ErrorReport, LoadError, Mismatch, ResolveError, SourceError,
    SourceResult,
};
pub use key::{Key, Segment};
pub use logging::{LoggingBuilder, LoggingConfig};
pub use shape::Shape;
pub use source::{EnvSource, FileLocator, FileSource, Format, MapSource, Profile, Source};
pub use value::{Mapping, Value};

// Re-export tracing for consumers that log alongside the binder
pub use tracing;

/// Common imports for declaring and binding configuration.
pub mod prelude {
    pub use crate::{
        BindError, Binder, Configurable, EnvSource, FileLocator, FileSource, MapSource, Source,
        bind, resolve,
    };
}
