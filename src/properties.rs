use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::mem;

/// String-keyed property map attached to an event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Properties {
  inner: Map<String, Value>,
}

impl Properties {
  pub fn new() -> Self {
    Self { inner: Map::new() }
  }

  /// Inserts `value` under `key`; `None` leaves the map untouched.
  pub fn insert<T>(&mut self, key: impl ToString, value: Option<T>) -> &mut Self
  where
    T: Into<Value>,
  {
    if let Some(value) = value {
      self.inner.insert(key.to_string(), value.into());
    }
    self
  }

  pub fn insert_with<K, V, RV, F>(&mut self, k: K, v: V, f: F) -> &mut Self
  where
    K: ToString,
    F: FnOnce(V) -> Option<RV>,
    RV: Into<Value>,
  {
    self.insert::<RV>(k, f(v));
    self
  }

  pub fn with(mut self, key: impl ToString, value: impl Into<Value>) -> Self {
    self.inner.insert(key.to_string(), value.into());
    self
  }

  pub fn get(&self, key: &str) -> Option<&Value> {
    self.inner.get(key)
  }

  pub fn len(&self) -> usize {
    self.inner.len()
  }

  pub fn is_empty(&self) -> bool {
    self.inner.is_empty()
  }

  /// Writes every default into `self`. A default replaces a value already
  /// present under the same key.
  pub fn apply_defaults(&mut self, defaults: &Properties) -> &mut Self {
    for (key, value) in &defaults.inner {
      self.inner.insert(key.clone(), value.clone());
    }
    self
  }

  pub fn as_map(&self) -> &Map<String, Value> {
    &self.inner
  }

  pub fn into_map(self) -> Map<String, Value> {
    self.inner
  }

  pub fn take(&mut self) -> Self {
    mem::take(self)
  }
}

impl From<Map<String, Value>> for Properties {
  fn from(inner: Map<String, Value>) -> Self {
    Self { inner }
  }
}

impl From<Properties> for Map<String, Value> {
  fn from(value: Properties) -> Self {
    value.inner
  }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Properties {
  fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
    Self {
      inner: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_insert_skips_none() {
    let mut props = Properties::new();
    props
      .insert("present", Some("yes"))
      .insert::<&str>("absent", None);

    assert_eq!(props.len(), 1);
    assert_eq!(props.get("present"), Some(&json!("yes")));
    assert!(props.get("absent").is_none());
  }

  #[test]
  fn test_insert_with_maps_value() {
    let mut props = Properties::new();
    props.insert_with("count", "42", |s: &str| s.parse::<u64>().ok());
    props.insert_with("bad", "nope", |s: &str| s.parse::<u64>().ok());

    assert_eq!(props.get("count"), Some(&json!(42)));
    assert!(props.get("bad").is_none());
  }

  #[test]
  fn test_defaults_overwrite_existing_keys() {
    let mut props = Properties::new().with("env", "dev").with("x", 1);
    let defaults = Properties::new().with("env", "prod");

    props.apply_defaults(&defaults);

    assert_eq!(Value::Object(props.into_map()), json!({"env": "prod", "x": 1}));
  }

  #[test]
  fn test_from_iter_and_serialize() {
    let props: Properties = vec![("a", json!(1)), ("b", json!([true, "two"]))]
      .into_iter()
      .collect();

    assert_eq!(
      serde_json::to_value(&props).unwrap(),
      json!({"a": 1, "b": [true, "two"]})
    );
  }

  #[test]
  fn test_take_leaves_empty() {
    let mut props = Properties::new().with("k", "v");
    let taken = props.take();

    assert!(props.is_empty());
    assert_eq!(taken.len(), 1);
  }
}
