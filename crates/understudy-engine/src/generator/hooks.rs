//! Property hook extraction
//!
//! Hooked properties are intercepted through pseudo-methods named
//! `$<property>::get` and `$<property>::set`.

use understudy_types::{MethodDescriptor, ParameterDescriptor, TargetType, Value, Visibility};

/// Name of the pseudo-method intercepting reads of `property`
pub fn get_hook_name(property: &str) -> String {
    format!("${}::get", property)
}

/// Name of the pseudo-method intercepting writes of `property`
pub fn set_hook_name(property: &str) -> String {
    format!("${}::set", property)
}

/// A property whose accessors the double intercepts
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyHookDescriptor {
    pub property: String,
    pub type_name: Option<String>,
    /// Carried over so the double's storage starts from the same value
    pub default: Option<Value>,
    pub has_get_hook: bool,
    pub has_set_hook: bool,
}

impl PropertyHookDescriptor {
    /// Pseudo-methods for the intercepted accessors, get before set
    pub fn pseudo_methods(&self) -> Vec<MethodDescriptor> {
        let mut methods = Vec::with_capacity(2);
        if self.has_get_hook {
            let mut get = MethodDescriptor::new(get_hook_name(&self.property));
            get.return_type = self.type_name.clone();
            methods.push(get);
        }
        if self.has_set_hook {
            let value = match &self.type_name {
                Some(ty) => ParameterDescriptor::typed("value", ty.clone()),
                None => ParameterDescriptor::new("value"),
            };
            methods.push(
                MethodDescriptor::new(set_hook_name(&self.property))
                    .with_param(value)
                    .returns("void"),
            );
        }
        methods
    }
}

/// Hooked properties of `target` the double can intercept
///
/// Only public, non-final, non-static properties qualify, and of those only
/// the accessors whose hook is not final.
pub fn extract(target: Option<&TargetType>) -> Vec<PropertyHookDescriptor> {
    let Some(target) = target else {
        return Vec::new();
    };

    target
        .properties()
        .iter()
        .filter(|p| p.visibility == Visibility::Public && !p.is_final && !p.is_static)
        .filter_map(|p| {
            let has_get_hook = p.get_hook.is_some_and(|h| !h.is_final);
            let has_set_hook = p.set_hook.is_some_and(|h| !h.is_final);
            (has_get_hook || has_set_hook).then(|| PropertyHookDescriptor {
                property: p.name.clone(),
                type_name: p.type_name.clone(),
                default: p.default.clone(),
                has_get_hook,
                has_set_hook,
            })
        })
        .collect()
}
