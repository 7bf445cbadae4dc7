//! A source backed by environment variables.
//!
//! # Variable Naming
//!
//! The variable for a key is built from the optional prefix and the key's named
//! segments (index segments are skipped), joined with `_`, upper-cased, with
//! `-` and `.` mapped to `_`:
//!
//! | Prefix  | Key                     | Variable                  |
//! |---------|-------------------------|---------------------------|
//! | `""`    | `key-with-hyphen`       | `KEY_WITH_HYPHEN`         |
//! | `"xyz"` | `path.key-name`         | `XYZ_PATH_KEY_NAME`       |
//! | `"app"` | `server.listen.port`    | `APP_SERVER_LISTEN_PORT`  |

use std::collections::HashMap;
use std::ffi::OsString;

use tracing::trace;

use super::Source;
use crate::error::LoadError;
use crate::key::Key;
use crate::shape::Shape;
use crate::value::Value;

#[derive(Debug, Clone)]
enum Backend {
    Process,
    Snapshot(HashMap<String, String>),
}

/// Reads leaf values from environment variables.
///
/// Records are always allocated, so nested leaves can come from the
/// environment even when no other source mentions their parent. A variable
/// set for a sequence or table key is unsupported; an unset one is not present.
#[derive(Debug, Clone)]
pub struct EnvSource {
    prefix: String,
    name: String,
    backend: Backend,
}

impl EnvSource {
    /// Reads from the live process environment.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self::with_backend(prefix.into(), Backend::Process)
    }

    /// Reads from a fixed set of variables instead of the process environment.
    pub fn from_vars<I, K, V>(prefix: impl Into<String>, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::with_backend(prefix.into(), Backend::Snapshot(vars))
    }

    fn with_backend(prefix: String, backend: Backend) -> Self {
        let name = if prefix.is_empty() {
            "env".to_string()
        } else {
            format!("env:{}", prefix.to_uppercase())
        };
        Self {
            prefix,
            name,
            backend,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The variable name looked up for `key`.
    pub fn var_name(&self, key: &Key) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if !self.prefix.is_empty() {
            parts.push(&self.prefix);
        }
        parts.extend(key.named_segments());
        parts.join("_").to_uppercase().replace(['-', '.'], "_")
    }

    fn lookup(&self, name: &str) -> Result<Option<String>, LoadError> {
        match &self.backend {
            Backend::Process => match std::env::var_os(name) {
                Some(raw) => raw
                    .into_string()
                    .map(Some)
                    .map_err(|raw: OsString| {
                        LoadError::invalid(format!("{name} is not valid unicode: {raw:?}"))
                    }),
                None => Ok(None),
            },
            Backend::Snapshot(vars) => Ok(vars.get(name).cloned()),
        }
    }
}

impl Source for EnvSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn load(&self, shape: &Shape, key: &Key) -> Result<Value, LoadError> {
        match shape {
            Shape::Record => return Ok(Value::empty_mapping()),
            Shape::Sequence | Shape::Table => {
                let var = self.var_name(key);
                return match self.lookup(&var)? {
                    Some(_) => {
                        trace!(
                            source = %self.name,
                            key = %key,
                            var = %var,
                            %shape,
                            "variable set for a structured key"
                        );
                        Err(LoadError::Unsupported)
                    }
                    None => Err(LoadError::NotPresent),
                };
            }
            Shape::String | Shape::Integer | Shape::Float | Shape::Boolean => {}
        }

        let var = self.var_name(key);
        let raw = self.lookup(&var)?.ok_or(LoadError::NotPresent)?;
        trace!(source = %self.name, key = %key, var = %var, "environment variable found");

        parse_leaf(*shape, &var, raw)
    }
}

fn parse_leaf(shape: Shape, var: &str, raw: String) -> Result<Value, LoadError> {
    match shape {
        Shape::Integer => raw
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|_| LoadError::invalid(format!("{var}=`{raw}` is not an integer"))),
        Shape::Float => raw
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| LoadError::invalid(format!("{var}=`{raw}` is not a number"))),
        Shape::Boolean => match raw.to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(Value::Boolean(true)),
            "false" | "0" => Ok(Value::Boolean(false)),
            _ => Err(LoadError::invalid(format!(
                "{var}=`{raw}` is not a boolean (expected true/false/1/0)"
            ))),
        },
        _ => Ok(Value::String(raw)),
    }
}
