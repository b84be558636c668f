//! Live objects of host types

use rustc_hash::FxHashMap;

use crate::value::Value;

/// A live object: the name of its type plus named field storage
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Instance {
    type_name: String,
    fields: FxHashMap<String, Value>,
}

impl Instance {
    /// Create an instance with no fields set
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: FxHashMap::default(),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Read a field
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Write a field, returning the previous value
    pub fn set(&mut self, field: impl Into<String>, value: Value) -> Option<Value> {
        self.fields.insert(field.into(), value)
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Field names in sorted order
    pub fn field_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.fields.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields() {
        let mut obj = Instance::new("Point");
        assert!(obj.set("x", Value::Int(1)).is_none());
        assert_eq!(obj.set("x", Value::Int(2)), Some(Value::Int(1)));
        obj.set("y", Value::Int(3));

        assert_eq!(obj.type_name(), "Point");
        assert_eq!(obj.get("x"), Some(&Value::Int(2)));
        assert!(obj.has_field("y"));
        assert_eq!(obj.field_names(), vec!["x", "y"]);
    }
}
