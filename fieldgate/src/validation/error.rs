//! Structured, mergeable validation errors.

use indexmap::map::Entry;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Validation failure with flat messages and alias-keyed children.
///
/// Children keep the order in which failures were first reported.
///
/// An error with neither messages nor children is the identity for
/// [`merge`](Self::merge) and is never raised.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Messages about the object as a whole.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<String>,
    /// Nested errors keyed by field alias.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub children: IndexMap<String, ValidationError>,
}

impl ValidationError {
    /// Creates an empty error.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an error with a single message.
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            messages: vec![message.into()],
            children: IndexMap::new(),
        }
    }

    /// Creates an error with several messages.
    #[must_use]
    pub fn messages<S: Into<String>>(messages: impl IntoIterator<Item = S>) -> Self {
        Self {
            messages: messages.into_iter().map(Into::into).collect(),
            children: IndexMap::new(),
        }
    }

    /// Creates an error nested under `loc`.
    #[must_use]
    pub fn at<S: Into<String>>(
        loc: impl IntoIterator<Item = S>,
        message: impl Into<String>,
    ) -> Self {
        let loc: Vec<String> = loc.into_iter().map(Into::into).collect();
        loc.into_iter()
            .rev()
            .fold(Self::message(message), |inner, key| Self::new().with_child(key, inner))
    }

    /// Adds a child error, merging with any existing one under `key`.
    #[must_use]
    pub fn with_child(self, key: impl Into<String>, child: ValidationError) -> Self {
        let mut children = IndexMap::new();
        children.insert(key.into(), child);
        self.merge(Self {
            messages: Vec::new(),
            children,
        })
    }

    /// Returns true if there is nothing to report.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty() && self.children.is_empty()
    }

    /// Returns the child under `key`.
    #[must_use]
    pub fn child(&self, key: &str) -> Option<&ValidationError> {
        self.children.get(key)
    }

    /// Concatenates messages and deep-merges children.
    #[must_use]
    pub fn merge(mut self, other: Self) -> Self {
        self.messages.extend(other.messages);
        for (key, child) in other.children {
            match self.children.entry(key) {
                Entry::Occupied(mut slot) => {
                    let existing = std::mem::take(slot.get_mut());
                    *slot.get_mut() = existing.merge(child);
                }
                Entry::Vacant(slot) => {
                    slot.insert(child);
                }
            }
        }
        self
    }

    /// Flattens into located messages, depth first.
    #[must_use]
    pub fn flatten(&self) -> Vec<LocalizedError> {
        let mut out = Vec::new();
        self.flatten_into(&mut Vec::new(), &mut out);
        out
    }

    fn flatten_into(&self, loc: &mut Vec<String>, out: &mut Vec<LocalizedError>) {
        for message in &self.messages {
            out.push(LocalizedError {
                loc: loc.clone(),
                err: message.clone(),
            });
        }
        for (key, child) in &self.children {
            loc.push(key.clone());
            child.flatten_into(loc, out);
            loc.pop();
        }
    }

    /// Rebuilds an error from located messages.
    #[must_use]
    pub fn from_errors(errors: impl IntoIterator<Item = LocalizedError>) -> Self {
        errors
            .into_iter()
            .fold(Self::new(), |acc, e| acc.merge(Self::at(e.loc, e.err)))
    }

    /// Collects the items produced by a yielding check.
    #[must_use]
    pub fn from_yielded(items: impl IntoIterator<Item = YieldedError>) -> Self {
        items.into_iter().fold(Self::new(), |acc, item| {
            acc.merge(match item {
                YieldedError::Message(message) => Self::message(message),
                YieldedError::At { loc, message } => Self::at(loc, message),
            })
        })
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines: Vec<String> = self.flatten().iter().map(ToString::to_string).collect();
        write!(f, "{}", lines.join("\n"))
    }
}

impl std::error::Error for ValidationError {}

/// Merges `error` into an optional accumulator.
#[must_use]
pub fn merge_errors(acc: Option<ValidationError>, error: ValidationError) -> ValidationError {
    match acc {
        Some(acc) => acc.merge(error),
        None => error,
    }
}

/// A message together with the alias path it applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedError {
    /// Alias path from the root object.
    pub loc: Vec<String>,
    /// The message.
    pub err: String,
}

impl fmt::Display for LocalizedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.loc.is_empty() {
            write!(f, "{}", self.err)
        } else {
            write!(f, "{}: {}", self.loc.join("."), self.err)
        }
    }
}

/// One problem reported by a yielding check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum YieldedError {
    /// A message about the object as a whole.
    Message(String),
    /// A message nested under an alias path.
    At {
        /// Alias path.
        loc: Vec<String>,
        /// The message.
        message: String,
    },
}

impl YieldedError {
    /// Creates a located item.
    #[must_use]
    pub fn at<S: Into<String>>(
        loc: impl IntoIterator<Item = S>,
        message: impl Into<String>,
    ) -> Self {
        Self::At {
            loc: loc.into_iter().map(Into::into).collect(),
            message: message.into(),
        }
    }
}

impl From<&str> for YieldedError {
    fn from(message: &str) -> Self {
        Self::Message(message.to_string())
    }
}

impl From<String> for YieldedError {
    fn from(message: String) -> Self {
        Self::Message(message)
    }
}
