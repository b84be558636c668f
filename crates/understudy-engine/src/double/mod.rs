//! Live test doubles
//!
//! Every double, whatever its target, is a [`TestDouble`]: one dispatch
//! point routing each call by name. Intercepted names are resolved through
//! the double's [`TestDoubleState`]; any other name falls through to the
//! body the generated type inherits.

pub mod behavior;
pub mod configurable;
pub mod return_value;

use std::sync::Arc;

use rustc_hash::FxHashMap;
use understudy_types::{Instance, TargetType, Value, CLONE};

use crate::error::InvocationError;
use crate::generator::hooks::{get_hook_name, set_hook_name};
use crate::generator::{ClonePolicy, GeneratedTypeDefinition};

pub use behavior::Behavior;
pub use configurable::ConfigurableMethod;
pub use return_value::{default_return_value, is_compatible};

/// A recorded call
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub method: String,
    /// Arguments after default padding
    pub arguments: Vec<Value>,
}

/// Real object intercepted calls are delegated to
#[derive(Debug, Clone)]
pub struct ProxyTarget {
    target: TargetType,
    instance: Instance,
}

impl ProxyTarget {
    pub fn new(target: TargetType, instance: Instance) -> Self {
        Self { target, instance }
    }

    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    fn call(
        &mut self,
        method: &ConfigurableMethod,
        args: &[Value],
    ) -> Result<Value, InvocationError> {
        let name = method.name();
        if method.is_hook() {
            if let Some(property) = name.strip_prefix('$').and_then(|n| n.strip_suffix("::get")) {
                return Ok(self.instance.get(property).cloned().unwrap_or_default());
            }
            if let Some(property) = name.strip_prefix('$').and_then(|n| n.strip_suffix("::set")) {
                self.instance
                    .set(property.to_string(), args.first().cloned().unwrap_or_default());
                return Ok(Value::Null);
            }
        }
        Ok(self.target.call(&mut self.instance, name, args)?)
    }
}

/// Per-instance interception state
#[derive(Debug, Clone)]
pub struct TestDoubleState {
    /// Behaviors keyed by configurable method name
    behaviors: FxHashMap<String, Behavior>,
    invocations: Vec<Invocation>,
    return_value_generation: bool,
    proxy: Option<ProxyTarget>,
}

impl TestDoubleState {
    pub fn new(return_value_generation: bool, proxy: Option<ProxyTarget>) -> Self {
        Self {
            behaviors: FxHashMap::default(),
            invocations: Vec::new(),
            return_value_generation,
            proxy,
        }
    }
}

/// A live double of a generated type
#[derive(Debug, Clone)]
pub struct TestDouble {
    definition: Arc<GeneratedTypeDefinition>,
    instance: Instance,
    state: TestDoubleState,
}

impl TestDouble {
    pub fn new(
        definition: Arc<GeneratedTypeDefinition>,
        instance: Instance,
        state: TestDoubleState,
    ) -> Self {
        Self {
            definition,
            instance,
            state,
        }
    }

    pub fn definition(&self) -> &Arc<GeneratedTypeDefinition> {
        &self.definition
    }

    /// Name of the generated type
    pub fn type_name(&self) -> &str {
        self.definition.name()
    }

    /// The double's own storage
    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    pub fn proxy(&self) -> Option<&ProxyTarget> {
        self.state.proxy.as_ref()
    }

    pub fn is_mock(&self) -> bool {
        self.definition.is_mock_object()
    }

    /// Whether the double satisfies `type_name`
    pub fn instance_of(&self, type_name: &str) -> bool {
        self.definition.live_type().instance_of(type_name)
    }

    /// Snapshot of the double's storage as a value of its generated type
    pub fn to_value(&self) -> Value {
        Value::from(self.definition.live_type().object(self.instance.clone()))
    }

    /// Set what an intercepted method does
    pub fn configure(
        &mut self,
        name: &str,
        behavior: Behavior,
    ) -> Result<&mut Self, InvocationError> {
        let method = self
            .definition
            .configurable(name)
            .ok_or_else(|| InvocationError::UnknownMethod {
                type_name: self.definition.name().to_string(),
                method: name.to_string(),
            })?;

        let self_type = self.definition.target_name();
        for value in behavior.fixed_values() {
            if !is_compatible(value, method.return_type(), self_type) {
                return Err(InvocationError::IncompatibleReturnValue {
                    method: method.name().to_string(),
                    value_type: value.type_name().to_string(),
                    return_type: method.return_type().unwrap_or("mixed").to_string(),
                });
            }
        }

        self.state.behaviors.insert(method.name().to_string(), behavior);
        Ok(self)
    }

    /// Call a method on the double
    pub fn invoke(&mut self, name: &str, args: &[Value]) -> Result<Value, InvocationError> {
        let definition = Arc::clone(&self.definition);
        match definition.configurable(name) {
            Some(method) => self.intercept(method, args),
            None => self.call_inherited(&definition, name, args),
        }
    }

    fn intercept(
        &mut self,
        method: &ConfigurableMethod,
        args: &[Value],
    ) -> Result<Value, InvocationError> {
        let bound = method
            .signature()
            .bind_arguments(args)
            .ok_or_else(|| InvocationError::TooFewArguments {
                method: method.name().to_string(),
                passed: args.len(),
                required: method.signature().required_arity(),
            })?;

        self.state.invocations.push(Invocation {
            method: method.name().to_string(),
            arguments: bound.clone(),
        });

        if let Some(behavior) = self.state.behaviors.get_mut(method.name()) {
            let value = behavior.resolve(&bound)?;
            if !is_compatible(&value, method.return_type(), self.definition.target_name()) {
                return Err(InvocationError::IncompatibleReturnValue {
                    method: method.name().to_string(),
                    value_type: value.type_name().to_string(),
                    return_type: method.return_type().unwrap_or("mixed").to_string(),
                });
            }
            return Ok(value);
        }

        if let Some(proxy) = self.state.proxy.as_mut() {
            return proxy.call(method, &bound);
        }

        if self.state.return_value_generation {
            if let Some(value) = default_return_value(method.return_type()) {
                return Ok(value);
            }
        }

        Err(InvocationError::ReturnValueNotConfigured {
            type_name: self.definition.name().to_string(),
            method: method.name().to_string(),
        })
    }

    fn call_inherited(
        &mut self,
        definition: &GeneratedTypeDefinition,
        name: &str,
        args: &[Value],
    ) -> Result<Value, InvocationError> {
        let live = definition.live_type();
        let method = live.method(name).ok_or_else(|| InvocationError::UndefinedMethod {
            type_name: definition.name().to_string(),
            method: name.to_string(),
        })?;
        if live.body(name).is_none() {
            return Err(InvocationError::AbstractMethod {
                type_name: method.declaring_type.clone(),
                method: method.name.clone(),
            });
        }
        Ok(live.call(&mut self.instance, name, args)?)
    }

    /// Read a property, through its get hook when intercepted
    pub fn get_property(&mut self, property: &str) -> Result<Value, InvocationError> {
        let hook = get_hook_name(property);
        if self.definition.configurable(&hook).is_some() {
            return self.invoke(&hook, &[]);
        }
        Ok(self.instance.get(property).cloned().unwrap_or_default())
    }

    /// Write a property, through its set hook when intercepted
    pub fn set_property(&mut self, property: &str, value: Value) -> Result<(), InvocationError> {
        let hook = set_hook_name(property);
        if self.definition.configurable(&hook).is_some() {
            self.invoke(&hook, &[value])?;
            return Ok(());
        }
        self.instance.set(property.to_string(), value);
        Ok(())
    }

    /// Clone the double according to its clone policy
    pub fn duplicate(&self) -> Result<TestDouble, InvocationError> {
        let mut copy = self.clone();
        match self.definition.clone_policy() {
            ClonePolicy::Proxied => {
                let live = self.definition.live_type();
                if live.body(CLONE).is_some() {
                    live.call(&mut copy.instance, CLONE, &[])?;
                }
            }
            ClonePolicy::Doubled => copy.state.invocations.push(Invocation {
                method: CLONE.to_string(),
                arguments: Vec::new(),
            }),
        }
        Ok(copy)
    }

    /// Every recorded call, oldest first
    pub fn invocations(&self) -> &[Invocation] {
        &self.state.invocations
    }

    /// Number of recorded calls of `method`
    ///
    /// Names are matched the way [`TestDouble::invoke`] matches them, so
    /// method names ignore case and hook names do not.
    pub fn invocation_count(&self, method: &str) -> usize {
        let invocations = self.state.invocations.iter();
        match self.definition.configurable(method) {
            Some(configurable) => invocations.filter(|i| i.method == configurable.name()).count(),
            None => invocations
                .filter(|i| {
                    i.method.eq_ignore_ascii_case(method)
                        && self.definition.configurable(&i.method).is_none()
                })
                .count(),
        }
    }
}
