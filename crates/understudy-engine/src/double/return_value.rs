//! Return values derived from declared return types

use understudy_types::Value;

/// Split a declared type into its nullability and union members
fn members(declared: &str) -> (bool, Vec<&str>) {
    let (nullable, rest) = match declared.strip_prefix('?') {
        Some(rest) => (true, rest),
        None => (false, declared),
    };
    (nullable, rest.split('|').map(str::trim).collect())
}

/// Default value returned by an unconfigured method
///
/// `None` means no value can be made up for the type (class types,
/// `static`, `self`), so the call needs a configured behavior.
pub fn default_return_value(declared: Option<&str>) -> Option<Value> {
    let Some(declared) = declared else {
        return Some(Value::Null);
    };
    let (nullable, members) = members(declared);
    if nullable
        || members
            .iter()
            .any(|m| matches!(m.to_ascii_lowercase().as_str(), "void" | "null" | "mixed" | "never"))
    {
        return Some(Value::Null);
    }

    members.iter().find_map(|member| match member.to_ascii_lowercase().as_str() {
        "int" => Some(Value::Int(0)),
        "float" => Some(Value::Float(0.0)),
        "string" => Some(Value::Str(String::new())),
        "bool" | "false" => Some(Value::Bool(false)),
        "true" => Some(Value::Bool(true)),
        "array" | "iterable" | "list" => Some(Value::List(Vec::new())),
        _ => None,
    })
}

/// Whether `value` may be returned from a method declared to return `declared`
///
/// `self` and `static` resolve to `self_type`. Objects satisfy a class or
/// interface member when they are instances of it.
pub fn is_compatible(value: &Value, declared: Option<&str>, self_type: &str) -> bool {
    let Some(declared) = declared else {
        return true;
    };
    let (nullable, members) = members(declared);
    if value.is_null() && nullable {
        return true;
    }

    members.iter().any(|member| {
        match (member.to_ascii_lowercase().as_str(), value) {
            ("mixed", _) => true,
            ("void" | "null" | "never", Value::Null) => true,
            ("int", Value::Int(_)) => true,
            ("float", Value::Float(_) | Value::Int(_)) => true,
            ("string" | "callable", Value::Str(_)) => true,
            ("bool", Value::Bool(_)) => true,
            ("false", Value::Bool(false)) => true,
            ("true", Value::Bool(true)) => true,
            ("array" | "iterable" | "list", Value::List(_)) => true,
            ("object", Value::Object(_)) => true,
            ("self" | "static", Value::Object(object)) => object.instance_of(self_type),
            (_, Value::Object(object)) => object.instance_of(member),
            _ => false,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use understudy_types::{Instance, Introspector, TypeDecl, TypeRegistry};

    #[test]
    fn test_defaults_by_type() {
        let cases = [
            (None, Some(Value::Null)),
            (Some("void"), Some(Value::Null)),
            (Some("mixed"), Some(Value::Null)),
            (Some("?Mailer"), Some(Value::Null)),
            (Some("Mailer|null"), Some(Value::Null)),
            (Some("int"), Some(Value::Int(0))),
            (Some("float"), Some(Value::Float(0.0))),
            (Some("string"), Some(Value::from(""))),
            (Some("bool"), Some(Value::Bool(false))),
            (Some("false"), Some(Value::Bool(false))),
            (Some("true"), Some(Value::Bool(true))),
            (Some("array"), Some(Value::List(vec![]))),
            (Some("iterable"), Some(Value::List(vec![]))),
            (Some("int|string"), Some(Value::Int(0))),
            (Some("Mailer"), None),
            (Some("static"), None),
        ];
        for (declared, expected) in cases {
            assert_eq!(default_return_value(declared), expected, "{:?}", declared);
        }
    }

    #[test]
    fn test_compatibility() {
        let cases = [
            (Value::Int(1), Some("int"), true),
            (Value::Int(1), Some("float"), true),
            (Value::Float(1.0), Some("int"), false),
            (Value::Null, Some("?string"), true),
            (Value::Null, Some("string"), false),
            (Value::from("x"), Some("int|string"), true),
            (Value::Bool(true), Some("false"), false),
            (Value::Bool(true), None, true),
            (Value::Null, Some("void"), true),
            (Value::Int(0), Some("void"), false),
            (Value::Int(0), Some("Mailer"), false),
        ];
        for (value, declared, expected) in cases {
            assert_eq!(
                is_compatible(&value, declared, "Owner"),
                expected,
                "{} as {:?}",
                value,
                declared
            );
        }
    }

    #[test]
    fn test_object_compatibility() {
        let registry = TypeRegistry::new();
        registry
            .declare_all(vec![
                TypeDecl::interface("Mailer"),
                TypeDecl::class("SmtpMailer").implements("Mailer"),
                TypeDecl::class("Owner"),
            ])
            .unwrap();
        let introspector = Introspector::new(&registry);
        let smtp = introspector.describe("SmtpMailer", false).unwrap();
        let owner = introspector.describe("Owner", false).unwrap();

        let mailer = Value::from(smtp.object(Instance::new("SmtpMailer")));
        assert!(is_compatible(&mailer, Some("Mailer"), "Owner"));
        assert!(is_compatible(&mailer, Some("?mailer"), "Owner"));
        assert!(is_compatible(&mailer, Some("int|SmtpMailer"), "Owner"));
        assert!(is_compatible(&mailer, Some("object"), "Owner"));
        assert!(!is_compatible(&mailer, Some("Owner"), "Owner"));
        assert!(!is_compatible(&mailer, Some("static"), "Owner"));
        assert!(!is_compatible(&mailer, Some("string"), "Owner"));

        let own = Value::from(owner.object(Instance::new("Owner")));
        assert!(is_compatible(&own, Some("self"), "Owner"));
        assert!(is_compatible(&own, Some("static"), "Owner"));
    }
}
