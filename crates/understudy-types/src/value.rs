//! Dynamic values passed to and returned from members of host types

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

use crate::instance::Instance;

/// A dynamically typed host value
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// The null value
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// 64-bit integer
    Int(i64),
    /// 64-bit float
    Float(f64),
    /// UTF-8 string
    Str(String),
    /// Ordered list of values
    List(Vec<Value>),
    /// Handle to a live object
    #[serde(skip_deserializing)]
    Object(ObjectRef),
}

/// Shared handle to a live object and the types it satisfies
///
/// Made by [`TargetType::object`](crate::TargetType::object). Two handles
/// are equal only when they point at the same object.
#[derive(Debug, Clone)]
pub struct ObjectRef {
    instance: Arc<Instance>,
    /// The object's own type first, then every supertype
    types: Arc<[String]>,
}

impl ObjectRef {
    pub(crate) fn new(instance: Instance, types: Vec<String>) -> Self {
        Self {
            instance: Arc::new(instance),
            types: types.into(),
        }
    }

    pub fn type_name(&self) -> &str {
        self.instance.type_name()
    }

    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    /// Whether the object satisfies `name` (case-insensitive)
    pub fn instance_of(&self, name: &str) -> bool {
        self.types.iter().any(|t| t.eq_ignore_ascii_case(name))
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.instance, &other.instance)
    }
}

impl Serialize for ObjectRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.type_name())
    }
}

impl Value {
    /// Name of the host type this value belongs to
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::List(_) => "array",
            Value::Object(_) => "object",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => write!(f, "{}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Object(object) => write!(f, "object({})", object.type_name()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<ObjectRef> for Value {
    fn from(object: ObjectRef) -> Self {
        Value::Object(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names() {
        assert_eq!(Value::Null.type_name(), "null");
        assert_eq!(Value::from(true).type_name(), "bool");
        assert_eq!(Value::from(3).type_name(), "int");
        assert_eq!(Value::from(1.5).type_name(), "float");
        assert_eq!(Value::from("x").type_name(), "string");
        assert_eq!(Value::from(vec![]).type_name(), "array");
    }

    #[test]
    fn test_int_widens_to_float() {
        assert_eq!(Value::Int(2).as_float(), Some(2.0));
        assert_eq!(Value::Str("2".into()).as_float(), None);
    }

    #[test]
    fn test_display_list() {
        let v = Value::from(vec![Value::from(1), Value::Null, Value::from("a")]);
        assert_eq!(v.to_string(), "[1, null, a]");
    }

    #[test]
    fn test_objects_compare_by_identity() {
        let object = ObjectRef::new(
            Instance::new("app::User"),
            vec!["app::User".into(), "app::Model".into()],
        );
        let same = Value::Object(object.clone());
        let other = Value::Object(ObjectRef::new(
            Instance::new("app::User"),
            vec!["app::User".into()],
        ));

        assert_eq!(same, Value::Object(object.clone()));
        assert_ne!(same, other);
        assert!(object.instance_of("APP::MODEL"));
        assert!(!object.instance_of("app::Post"));
        assert_eq!(same.type_name(), "object");
        assert_eq!(same.to_string(), "object(app::User)");
        assert_eq!(serde_json::to_string(&same).unwrap(), r#""app::User""#);
    }

    #[test]
    fn test_serde_untagged() {
        let v: Value = serde_json::from_str(r#"[1, "two", null, true]"#).unwrap();
        assert_eq!(
            v,
            Value::List(vec![
                Value::Int(1),
                Value::Str("two".to_string()),
                Value::Null,
                Value::Bool(true),
            ])
        );
    }
}
