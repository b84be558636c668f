//! Configurable methods of a generated double

use understudy_types::{MethodDescriptor, Value};

/// A method or property-hook pseudo-method that accepts configured behavior
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigurableMethod {
    signature: MethodDescriptor,
    is_hook: bool,
}

impl ConfigurableMethod {
    /// An intercepted method
    pub fn method(signature: MethodDescriptor) -> Self {
        Self {
            signature,
            is_hook: false,
        }
    }

    /// A `$property::get` or `$property::set` pseudo-method
    pub fn hook(signature: MethodDescriptor) -> Self {
        Self {
            signature,
            is_hook: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.signature.name
    }

    pub fn signature(&self) -> &MethodDescriptor {
        &self.signature
    }

    pub fn is_hook(&self) -> bool {
        self.is_hook
    }

    pub fn arity(&self) -> usize {
        self.signature.arity()
    }

    pub fn return_type(&self) -> Option<&str> {
        self.signature.return_type.as_deref()
    }

    /// Declared default of each parameter, in order
    pub fn default_values(&self) -> Vec<Option<Value>> {
        self.signature
            .parameters
            .iter()
            .map(|p| p.default.clone())
            .collect()
    }

    /// Method names ignore case; hook names keep the property's case
    pub fn matches(&self, name: &str) -> bool {
        if self.is_hook {
            self.signature.name == name
        } else {
            self.signature.is_named(name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use understudy_types::ParameterDescriptor;

    #[test]
    fn test_matching() {
        let method = ConfigurableMethod::method(MethodDescriptor::new("send"));
        assert!(method.matches("SEND"));

        let hook = ConfigurableMethod::hook(MethodDescriptor::new("$title::get"));
        assert!(hook.matches("$title::get"));
        assert!(!hook.matches("$Title::get"));
    }

    #[test]
    fn test_defaults() {
        let method = ConfigurableMethod::method(
            MethodDescriptor::new("send")
                .with_param(ParameterDescriptor::new("to"))
                .with_param(ParameterDescriptor::new("retries").with_default(Value::Int(3)))
                .returns("bool"),
        );
        assert_eq!(method.arity(), 2);
        assert_eq!(method.default_values(), vec![None, Some(Value::Int(3))]);
        assert_eq!(method.return_type(), Some("bool"));
    }
}
