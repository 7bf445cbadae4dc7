//! Hierarchical lookup keys and field declaration parsing.
//!
//! Every field that takes part in binding carries a *declaration* string:
//!
//! ```text
//! segment[.segment...][,option[,option...]]
//! ```
//!
//! | Declaration            | Segments          | Optional |
//! |------------------------|-------------------|----------|
//! | `"port"`               | `port`            | no       |
//! | `"server.listen.port"` | `server`, `listen`, `port` | no |
//! | `"volumes,optional"`   | `volumes`         | yes      |
//! | `",optional"`          | derived from the field name | yes |
//! | `"-"`                  | field is excluded | n/a      |
//!
//! Fields without a declaration bind under their identifier in kebab-case
//! (`max_connections` → `max-connections`).

use std::fmt;

use heck::ToKebabCase;

/// Declaration that excludes a field from binding.
pub const EXCLUDED: &str = "-";

const OPTION_SEPARATOR: char = ',';
const PATH_SEPARATOR: char = '.';

/// One step of a [`Key`] path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// A named entry, from a field declaration or a derived field name.
    Name(String),
    /// A sequence position.
    Index(usize),
}

impl Segment {
    /// Returns the name for named segments.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Name(name) => Some(name),
            Self::Index(_) => None,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Index(index) => write!(f, "[{index}]"),
        }
    }
}

/// A hierarchical key identifying one node of a bind.
///
/// The `optional` flag belongs to the leaf declaration that produced the key;
/// [`Key::push`] takes it from the child, so ancestors never change whether a
/// descendant is required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Key {
    segments: Vec<Segment>,
    optional: bool,
}

impl Key {
    /// The empty key that the top-level destination is expanded from.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parses a declaration string into a key.
    ///
    /// Unknown option tokens are ignored. Empty path segments are dropped, so
    /// `""` and `",optional"` produce keys without segments.
    pub fn parse(declaration: &str) -> Self {
        let mut parts = declaration.split(OPTION_SEPARATOR);
        let path = parts.next().unwrap_or_default();

        let mut optional = false;
        for option in parts {
            if option.trim() == "optional" {
                optional = true;
            }
        }

        let segments = path
            .split(PATH_SEPARATOR)
            .filter(|segment| !segment.is_empty())
            .map(|segment| Segment::Name(segment.to_string()))
            .collect();

        Self { segments, optional }
    }

    /// Builds the key of a struct field.
    ///
    /// Returns `None` when the field is excluded with `"-"`. A missing
    /// declaration, or one without path segments, binds the field under its
    /// identifier in kebab-case.
    pub fn for_field(ident: &str, declaration: Option<&str>) -> Option<Self> {
        let declaration = declaration.unwrap_or_default();
        if declaration.trim() == EXCLUDED {
            return None;
        }

        let mut key = Self::parse(declaration);
        if key.segments.is_empty() {
            key.segments.push(Segment::Name(default_name(ident)));
        }
        Some(key)
    }

    /// A single index segment, as pushed for sequence elements.
    pub fn index(index: usize) -> Self {
        Self {
            segments: vec![Segment::Index(index)],
            optional: false,
        }
    }

    /// Appends `child` to this key. The result keeps the child's optional flag.
    pub fn push(&self, child: &Key) -> Key {
        let mut segments = Vec::with_capacity(self.segments.len() + child.segments.len());
        segments.extend_from_slice(&self.segments);
        segments.extend_from_slice(&child.segments);
        Key {
            segments,
            optional: child.optional,
        }
    }

    /// Marks the key optional or required.
    pub fn with_optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// The last segment of the path.
    pub fn leaf(&self) -> Option<&Segment> {
        self.segments.last()
    }

    /// Only the named segments, in order. Index segments are skipped.
    pub fn named_segments(&self) -> impl Iterator<Item = &str> + '_ {
        self.segments.iter().filter_map(Segment::as_name)
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Renders the path as a single string, `a.b.[0].c`.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

/// Derives the binding name of an undeclared field.
pub fn default_name(ident: &str) -> String {
    ident.trim_start_matches("r#").to_kebab_case()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(key: &Key) -> Vec<&str> {
        key.named_segments().collect()
    }

    #[test]
    fn test_parse_path() {
        let key = Key::parse("path.segment.key");
        assert_eq!(names(&key), vec!["path", "segment", "key"]);
        assert_eq!(key.leaf(), Some(&Segment::Name("key".into())));
        assert!(!key.is_optional());
    }

    #[test]
    fn test_parse_optional() {
        let key = Key::parse("path.segment.key,optional");
        assert_eq!(names(&key), vec!["path", "segment", "key"]);
        assert_eq!(key.leaf(), Some(&Segment::Name("key".into())));
        assert!(key.is_optional());
    }

    #[test]
    fn test_parse_ignores_unknown_options() {
        let key = Key::parse("name,flatten, optional");
        assert_eq!(names(&key), vec!["name"]);
        assert!(key.is_optional());

        let key = Key::parse("name,flatten");
        assert!(!key.is_optional());
    }

    #[test]
    fn test_parse_drops_empty_segments() {
        assert_eq!(names(&Key::parse("a..b.")), vec!["a", "b"]);
        assert!(Key::parse("").is_root());
    }

    #[test]
    fn test_for_field_excluded() {
        assert!(Key::for_field("secret", Some("-")).is_none());
    }

    #[test]
    fn test_for_field_derives_name() {
        let key = Key::for_field("max_connections", None).unwrap();
        assert_eq!(key.render(), "max-connections");
        assert!(!key.is_optional());

        let key = Key::for_field("r#type", Some(",optional")).unwrap();
        assert_eq!(key.render(), "type");
        assert!(key.is_optional());
    }

    #[test]
    fn test_for_field_keeps_declared_path() {
        let key = Key::for_field("image", Some("container.image")).unwrap();
        assert_eq!(key.render(), "container.image");
    }

    #[test]
    fn test_push_takes_child_optional_flag() {
        let parent = Key::parse("spec,optional");
        let child = Key::parse("container.image");
        let pushed = parent.push(&child);
        assert_eq!(pushed.render(), "spec.container.image");
        assert!(!pushed.is_optional());

        let pushed = Key::parse("spec").push(&Key::parse("volumes,optional"));
        assert!(pushed.is_optional());
    }

    #[test]
    fn test_render_index_segments() {
        let key = Key::parse("upstreams")
            .push(&Key::index(2))
            .push(&Key::parse("url"));
        assert_eq!(key.render(), "upstreams.[2].url");
        assert_eq!(names(&key), vec!["upstreams", "url"]);
    }

    #[test]
    fn test_root_renders_empty() {
        assert_eq!(Key::root().render(), "");
        assert!(Key::root().is_root());
    }
}
