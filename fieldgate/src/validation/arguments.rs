//! Keyword arguments forwarded to validators.

use super::CheckError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Named values passed alongside the instance under validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Arguments(BTreeMap<String, serde_json::Value>);

impl Arguments {
    /// Creates an empty argument set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an argument.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.0.insert(name.into(), value);
        self
    }

    /// Inserts an argument, returning the previous value.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: serde_json::Value,
    ) -> Option<serde_json::Value> {
        self.0.insert(name.into(), value)
    }

    /// Returns the argument `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&serde_json::Value> {
        self.0.get(name)
    }

    /// Returns the argument `name`, or a check failure naming it.
    pub fn require(&self, name: &str) -> Result<&serde_json::Value, CheckError> {
        self.0
            .get(name)
            .ok_or_else(|| CheckError::other(format!("missing required argument '{name}'")))
    }

    /// Deserializes the argument `name`.
    pub fn require_as<T: DeserializeOwned>(&self, name: &str) -> Result<T, CheckError> {
        let value = self.require(name)?;
        serde_json::from_value(value.clone())
            .map_err(|e| CheckError::other(format!("invalid argument '{name}': {e}")))
    }

    /// Returns true if `name` is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Iterates argument names in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Returns true if the argument names are exactly `names`.
    #[must_use]
    pub fn has_exactly(&self, names: &BTreeSet<String>) -> bool {
        self.0.len() == names.len() && names.iter().all(|n| self.0.contains_key(n))
    }

    /// Returns the arguments whose names are in `names`.
    #[must_use]
    pub fn subset(&self, names: &BTreeSet<String>) -> Self {
        Self(
            self.0
                .iter()
                .filter(|(k, _)| names.contains(*k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }

    /// Returns the number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no arguments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, serde_json::Value)> for Arguments {
    fn from_iter<T: IntoIterator<Item = (K, serde_json::Value)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn names(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_require() {
        let args = Arguments::new().with("limit", json!(10));
        assert_eq!(args.require("limit").unwrap(), &json!(10));
        assert_eq!(args.require_as::<u32>("limit").unwrap(), 10);

        let err = args.require("offset").unwrap_err();
        assert!(err.to_string().contains("offset"));
        assert!(args.require_as::<String>("limit").is_err());
    }

    #[test]
    fn test_subset_and_exact_match() {
        let args: Arguments = [("a", json!(1)), ("b", json!(2))].into_iter().collect();

        let sub = args.subset(&names(&["a"]));
        assert_eq!(sub.keys().collect::<Vec<_>>(), vec!["a"]);
        assert!(args.has_exactly(&names(&["a", "b"])));
        assert!(!args.has_exactly(&names(&["a"])));
        assert!(!args.has_exactly(&names(&["a", "c"])));
    }
}
