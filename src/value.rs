//! Dynamic value tree that the traversal engine walks.
//!
//! Unlike `serde_json::Value`, objects are shared handles ([`ObjectRef`]) with
//! an identity, so a tree may contain cycles. Arrays are owned vectors; only
//! objects carry identity.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;

/// Key/value storage behind an [`ObjectRef`].
pub type Object = BTreeMap<String, Value>;

/// Errors raised when converting a [`Value`] back to plain JSON.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValueError {
    /// The tree references an object from inside itself.
    #[error("cyclic reference at '{path}' cannot be represented as JSON")]
    Cycle { path: String },
}

/// A node in a translatable data tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    Array(Vec<Value>),
    Object(ObjectRef),
    /// A translated leaf: one string per configured language.
    Multilingual(MultilingualValue),
}

impl Value {
    /// Build an object value from key/value pairs.
    pub fn object<K, I>(entries: I) -> Value
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Object(ObjectRef::from_entries(entries))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_multilingual(&self) -> Option<&MultilingualValue> {
        match self {
            Value::Multilingual(m) => Some(m),
            _ => None,
        }
    }

    /// Short name of the variant, for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Multilingual(_) => "multilingual",
        }
    }

    /// Convert to plain JSON.
    ///
    /// Multilingual values become objects keyed by language code. Fails if an
    /// object is reachable from itself.
    pub fn to_json(&self) -> Result<serde_json::Value, ValueError> {
        let mut stack = HashSet::new();
        self.to_json_inner("", &mut stack)
    }

    fn to_json_inner(
        &self,
        path: &str,
        stack: &mut HashSet<usize>,
    ) -> Result<serde_json::Value, ValueError> {
        Ok(match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Value::Number(n.clone()),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Array(items) => serde_json::Value::Array(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| item.to_json_inner(&format!("{}[{}]", path, i), stack))
                    .collect::<Result<Vec<_>, ValueError>>()?,
            ),
            Value::Object(obj) => {
                if !stack.insert(obj.id()) {
                    return Err(ValueError::Cycle {
                        path: path.to_string(),
                    });
                }
                let mut map = serde_json::Map::new();
                for (key, child) in obj.entries() {
                    let child_path = if path.is_empty() {
                        key.clone()
                    } else {
                        format!("{}.{}", path, key)
                    };
                    map.insert(key, child.to_json_inner(&child_path, stack)?);
                }
                stack.remove(&obj.id());
                serde_json::Value::Object(map)
            }
            Value::Multilingual(m) => serde_json::Value::Object(
                m.iter()
                    .map(|(lang, text)| (lang.to_string(), serde_json::Value::String(text.to_string())))
                    .collect(),
            ),
        })
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::object(map.into_iter().map(|(k, v)| (k, Value::from(v))))
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n.into())
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Number(n.into())
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<ObjectRef> for Value {
    fn from(obj: ObjectRef) -> Self {
        Value::Object(obj)
    }
}

impl From<MultilingualValue> for Value {
    fn from(m: MultilingualValue) -> Self {
        Value::Multilingual(m)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json()
            .map_err(serde::ser::Error::custom)?
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

/// Shared handle to an object node.
///
/// Clones share the same storage; two handles are equal only when they point
/// at the same object.
#[derive(Clone, Default)]
pub struct ObjectRef(Arc<RwLock<Object>>);

impl ObjectRef {
    pub fn new(object: Object) -> Self {
        Self(Arc::new(RwLock::new(object)))
    }

    pub fn from_entries<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Self::new(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Identity of the underlying allocation.
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }

    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Insert or replace a field. Used to wire up shared or cyclic trees.
    pub fn insert(&self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Snapshot of all fields in key order.
    pub fn entries(&self) -> Vec<(String, Value)> {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn keys(&self) -> Vec<String> {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.0.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

// Contents are not printed: a cyclic object would recurse forever.
impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectRef")
            .field("id", &format_args!("{:#x}", self.id()))
            .field("keys", &self.keys())
            .finish()
    }
}

/// Per-language strings produced for one translated leaf.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MultilingualValue(BTreeMap<String, String>);

impl MultilingualValue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, language: impl Into<String>, text: impl Into<String>) {
        self.0.insert(language.into(), text.into());
    }

    pub fn get(&self, language: &str) -> Option<&str> {
        self.0.get(language).map(String::as_str)
    }

    pub fn contains(&self, language: &str) -> bool {
        self.0.contains_key(language)
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MultilingualValue {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_roundtrips_plain_data() {
        let json = json!({"id": 1, "title": "Hello", "tags": ["a", "b"], "draft": false, "x": null});
        let value = Value::from(json.clone());
        assert_eq!(value.to_json().unwrap(), json);
    }

    #[test]
    fn test_object_clone_shares_identity() {
        let obj = ObjectRef::from_entries([("a", Value::from("x"))]);
        let alias = obj.clone();
        alias.insert("b", Value::from(true));

        assert!(obj.ptr_eq(&alias));
        assert_eq!(obj.len(), 2);
        assert_eq!(obj.get("b"), Some(Value::Bool(true)));
    }

    #[test]
    fn test_distinct_objects_with_same_contents_are_not_equal() {
        let a = ObjectRef::from_entries([("k", Value::from("v"))]);
        let b = ObjectRef::from_entries([("k", Value::from("v"))]);
        assert_ne!(a, b);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_to_json_reports_cycle_path() {
        let child = ObjectRef::default();
        let root = ObjectRef::from_entries([("child", Value::Object(child.clone()))]);
        child.insert("parent", Value::Object(root.clone()));

        let err = Value::Object(root).to_json().unwrap_err();
        assert_eq!(
            err,
            ValueError::Cycle {
                path: "child.parent".to_string()
            }
        );
    }

    #[test]
    fn test_shared_subtree_is_not_a_cycle() {
        let shared = ObjectRef::from_entries([("name", Value::from("n"))]);
        let root = Value::object([
            ("left", Value::Object(shared.clone())),
            ("right", Value::Object(shared)),
        ]);
        assert_eq!(
            root.to_json().unwrap(),
            json!({"left": {"name": "n"}, "right": {"name": "n"}})
        );
    }

    #[test]
    fn test_debug_does_not_recurse_into_cycles() {
        let obj = ObjectRef::default();
        obj.insert("me", Value::Object(obj.clone()));
        let debug = format!("{:?}", Value::Object(obj));
        assert!(debug.contains("ObjectRef"));
        assert!(debug.contains("me"));
    }

    #[test]
    fn test_multilingual_serializes_as_plain_object() {
        let m: MultilingualValue = [("en", "Hello"), ("fr", "Bonjour")].into_iter().collect();
        let json = serde_json::to_value(Value::Multilingual(m)).unwrap();
        assert_eq!(json, json!({"en": "Hello", "fr": "Bonjour"}));
    }

    #[test]
    fn test_serialize_cyclic_value_fails() {
        let obj = ObjectRef::default();
        obj.insert("me", Value::Object(obj.clone()));
        assert!(serde_json::to_string(&Value::Object(obj)).is_err());
    }

    #[test]
    fn test_deserialize_from_json_text() {
        let value: Value = serde_json::from_str(r#"{"a": [1, "two"]}"#).unwrap();
        let a = value.as_object().unwrap().get("a").unwrap();
        assert_eq!(a.as_array().unwrap()[1].as_str(), Some("two"));
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(Value::Null.kind(), "null");
        assert_eq!(Value::from("s").kind(), "string");
        assert_eq!(Value::Array(Vec::new()).kind(), "array");
        assert_eq!(Value::Multilingual(MultilingualValue::new()).kind(), "multilingual");
    }
}
