//! Instantiation of generated doubles

use std::sync::Arc;

use tracing::trace;
use understudy_types::{Instance, Introspector, TypeError, TypeRegistry, Value, CONSTRUCTOR};

use crate::double::{ProxyTarget, TestDouble, TestDoubleState};
use crate::error::DoubleError;
use crate::generator::GeneratedTypeDefinition;

/// How a double is brought to life
#[derive(Debug, Clone, Default)]
pub struct InstantiateOptions {
    /// Run the inherited constructor against the double's storage
    pub call_original_constructor: bool,
    /// Constructor arguments, for the double and for a constructed proxy
    pub arguments: Vec<Value>,
    /// Real object to delegate to instead of constructing one
    pub proxy_target: Option<Instance>,
    /// Overrides `defaults.return_value_generation`
    pub return_value_generation: Option<bool>,
}

impl InstantiateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call_original_constructor(mut self, enabled: bool) -> Self {
        self.call_original_constructor = enabled;
        self
    }

    pub fn with_arguments(mut self, arguments: Vec<Value>) -> Self {
        self.arguments = arguments;
        self
    }

    pub fn with_proxy_target(mut self, target: Instance) -> Self {
        self.proxy_target = Some(target);
        self
    }

    pub fn return_value_generation(mut self, enabled: bool) -> Self {
        self.return_value_generation = Some(enabled);
        self
    }
}

/// Fail early for option combinations no target can satisfy
pub fn check_options(
    call_original_methods: bool,
    options: &InstantiateOptions,
) -> Result<(), DoubleError> {
    if call_original_methods && !options.call_original_constructor {
        return Err(DoubleError::OriginalConstructorRequired);
    }
    Ok(())
}

/// Creates live doubles of generated types
pub struct Instantiator<'a> {
    registry: &'a TypeRegistry,
    return_value_generation: bool,
}

impl<'a> Instantiator<'a> {
    /// `return_value_generation` is the default for options that leave it unset
    pub fn new(registry: &'a TypeRegistry, return_value_generation: bool) -> Self {
        Self {
            registry,
            return_value_generation,
        }
    }

    pub fn instantiate(
        &self,
        definition: Arc<GeneratedTypeDefinition>,
        options: InstantiateOptions,
    ) -> Result<TestDouble, DoubleError> {
        check_options(definition.call_original_methods(), &options)?;

        let live = definition.live_type();
        let mut instance = live.blank_instance();
        trace!(double = %definition.name(), "created blank double instance");

        let proxy = if definition.call_original_methods() {
            Some(self.proxy(&definition, &options)?)
        } else {
            None
        };

        if options.call_original_constructor && live.body(CONSTRUCTOR).is_some() {
            live.call(&mut instance, CONSTRUCTOR, &options.arguments)
                .map_err(DoubleError::ReflectionFailure)?;
            trace!(double = %definition.name(), "ran original constructor");
        }

        let state = TestDoubleState::new(
            options
                .return_value_generation
                .unwrap_or(self.return_value_generation),
            proxy,
        );
        Ok(TestDouble::new(definition, instance, state))
    }

    fn proxy(
        &self,
        definition: &GeneratedTypeDefinition,
        options: &InstantiateOptions,
    ) -> Result<ProxyTarget, DoubleError> {
        let target = definition.target().ok_or_else(|| {
            DoubleError::ReflectionFailure(TypeError::NotInstantiable {
                name: definition.target_name().to_string(),
                reason: "type does not exist".to_string(),
            })
        })?;

        match &options.proxy_target {
            Some(instance) => {
                let actual = Introspector::new(self.registry)
                    .describe(instance.type_name(), false)
                    .map_err(DoubleError::ReflectionFailure)?;
                if !actual.instance_of(target.name()) {
                    return Err(DoubleError::ReflectionFailure(TypeError::NotInstantiable {
                        name: target.name().to_string(),
                        reason: format!("proxy target is a {}", actual.name()),
                    }));
                }
                Ok(ProxyTarget::new(actual, instance.clone()))
            }
            None => {
                let instance = target
                    .instantiate(&options.arguments)
                    .map_err(DoubleError::ReflectionFailure)?;
                trace!(target = %target.name(), "constructed proxy target");
                Ok(ProxyTarget::new(target.clone(), instance))
            }
        }
    }
}
