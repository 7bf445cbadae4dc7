//! The resolution driver.
//!
//! A bind walks the destination breadth-first with an explicit work queue:
//!
//! ```text
//!   expand(dest) ──▶ queue ──▶ pop node ──▶ S1.load ─ not present ─▶ S2.load ─▶ …
//!                      ▲                      │ value                  │ invalid / unsupported
//!                      │                      ▼                        ▼
//!                      └──── expand(node) ◀── assign            record failure
//! ```
//!
//! The first source that produces a value wins. Failures never stop the walk;
//! they are collected and returned together once the queue is empty.

use std::collections::VecDeque;

use indexmap::IndexMap;
use tracing::{debug, instrument, trace};

use crate::configurable::Configurable;
use crate::error::{BindError, BindResult, ErrorReport, LoadError, ResolveError, SourceResult};
use crate::key::Key;
use crate::source::{EnvSource, FileLocator, Source};
use crate::traverse::{Node, expand};

/// Resolution state of one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    /// Still looking; an error if no source answers.
    RequiredPending,
    /// Still looking; left at its default if no source answers.
    OptionalPending,
    /// A source supplied the value.
    Satisfied,
    /// A source answered with an unusable value.
    Failed,
}

impl LoadStatus {
    fn pending(key: &Key) -> Self {
        if key.is_optional() {
            Self::OptionalPending
        } else {
            Self::RequiredPending
        }
    }
}

/// Where the value of a key came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// Supplied by the named source.
    Source(String),
    /// Optional and absent from every source.
    Unset,
}

/// Per-key record of a successful bind, in resolution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Provenance {
    entries: IndexMap<String, Origin>,
}

impl Provenance {
    /// Name of the source that supplied `key`.
    pub fn source_of(&self, key: &str) -> Option<&str> {
        match self.entries.get(key)? {
            Origin::Source(name) => Some(name.as_str()),
            Origin::Unset => None,
        }
    }

    pub fn origin(&self, key: &str) -> Option<&Origin> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Origin)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn record(&mut self, key: String, origin: Origin) {
        self.entries.insert(key, origin);
    }
}

/// Binds `dest` from `sources`, highest precedence first.
///
/// Returns every failure at once in [`BindError::Unresolved`].
pub fn bind<T: Configurable>(dest: &mut T, sources: &[&dyn Source]) -> BindResult<()> {
    resolve(dest, sources).map(|_| ())
}

/// Like [`bind`], and also reports where every value came from.
#[instrument(level = "debug", skip_all, fields(destination = std::any::type_name::<T>(), sources = sources.len()))]
pub fn resolve<T: Configurable>(dest: &mut T, sources: &[&dyn Source]) -> BindResult<Provenance> {
    let shape = dest.shape();
    if !shape.is_structured() {
        return Err(BindError::NotStructured {
            type_name: std::any::type_name::<T>(),
            shape,
        });
    }

    let mut queue: VecDeque<Node<'_>> = expand(dest, &Key::root()).into();
    let mut provenance = Provenance::default();
    let mut report = ErrorReport::new();

    while let Some(Node { key, slot }) = queue.pop_front() {
        let rendered = key.render();
        match resolve_node(slot, &key, &rendered, sources) {
            Ok(Some(origin)) => {
                debug!(key = %rendered, source = %origin, "value bound");
                provenance.record(rendered, Origin::Source(origin));
            }
            Ok(None) => {
                debug!(key = %rendered, "optional value absent from every source");
                provenance.record(rendered, Origin::Unset);
            }
            Err(error) => {
                debug!(key = %rendered, %error, "node failed");
                report.push(error);
            }
        }

        queue.extend(expand(slot, &key));
    }

    if report.is_empty() {
        debug!(bound = provenance.len(), "bind complete");
        Ok(provenance)
    } else {
        Err(BindError::Unresolved(report))
    }
}

/// Runs the source loop for one node. Returns the satisfying source's name,
/// `None` for an optional miss, or the node's terminal error.
fn resolve_node(
    slot: &mut dyn Configurable,
    key: &Key,
    rendered: &str,
    sources: &[&dyn Source],
) -> Result<Option<String>, ResolveError> {
    let shape = slot.shape();
    let mut status = LoadStatus::pending(key);
    let mut failure = None;
    let mut origin = None;

    for source in sources {
        trace!(key = %rendered, source = source.name(), %shape, "querying source");
        match source.load(&shape, key) {
            Ok(value) => {
                match slot.assign(value) {
                    Ok(()) => {
                        status = LoadStatus::Satisfied;
                        origin = Some(source.name().to_string());
                    }
                    Err(mismatch) => {
                        status = LoadStatus::Failed;
                        failure = Some(ResolveError::InvalidValue {
                            key: rendered.to_string(),
                            origin: source.name().to_string(),
                            shape,
                            reason: mismatch.to_string(),
                        });
                    }
                }
                break;
            }
            Err(LoadError::NotPresent) => continue,
            Err(LoadError::Unsupported) => {
                status = LoadStatus::Failed;
                failure = Some(ResolveError::Unsupported {
                    key: rendered.to_string(),
                    origin: source.name().to_string(),
                    shape,
                });
                break;
            }
            Err(LoadError::Invalid { reason }) => {
                status = LoadStatus::Failed;
                failure = Some(ResolveError::InvalidValue {
                    key: rendered.to_string(),
                    origin: source.name().to_string(),
                    shape,
                    reason,
                });
                break;
            }
        }
    }

    match status {
        LoadStatus::Satisfied => Ok(origin),
        LoadStatus::OptionalPending => Ok(None),
        LoadStatus::RequiredPending => Err(ResolveError::NotPresent {
            key: rendered.to_string(),
        }),
        LoadStatus::Failed => Err(failure.unwrap_or_else(|| ResolveError::NotPresent {
            key: rendered.to_string(),
        })),
    }
}

/// An owned, ordered list of sources.
///
/// # Example
///
/// ```rust,ignore
/// use bindery::{Binder, EnvSource, FileSource, MapSource};
///
/// let binder = Binder::new()
///     .source(EnvSource::new("gateway"))
///     .source(FileSource::open_optional("gateway.toml")?)
///     .source(MapSource::from_json(defaults).named("defaults"));
///
/// let mut config = GatewayConfig::default();
/// binder.bind(&mut config)?;
/// ```
#[derive(Default)]
pub struct Binder {
    sources: Vec<Box<dyn Source>>,
}

impl Binder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The usual stack for an application: `<APP>_*` environment variables
    /// first, then the files found by [`FileLocator::new`] for `app`.
    pub fn layered(app: &str) -> SourceResult<Self> {
        let files = FileLocator::new(app).sources()?;
        Ok(Self::new().source(EnvSource::new(app)).sources(files))
    }

    /// Appends a source with lower precedence than those already added.
    pub fn source<S: Source + 'static>(mut self, source: S) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Appends several sources, in order.
    pub fn sources<S, I>(mut self, sources: I) -> Self
    where
        S: Source + 'static,
        I: IntoIterator<Item = S>,
    {
        for source in sources {
            self.sources.push(Box::new(source));
        }
        self
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Source names, highest precedence first.
    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    pub fn bind<T: Configurable>(&self, dest: &mut T) -> BindResult<()> {
        bind(dest, &self.borrowed())
    }

    pub fn resolve<T: Configurable>(&self, dest: &mut T) -> BindResult<Provenance> {
        resolve(dest, &self.borrowed())
    }

    fn borrowed(&self) -> Vec<&dyn Source> {
        self.sources.iter().map(|s| s.as_ref()).collect()
    }
}

impl std::fmt::Debug for Binder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binder")
            .field("sources", &self.source_names())
            .finish()
    }
}
