//! Test double generation
//!
//! A [`DoubleRequest`] names a target type and the options that shape its
//! double. [`Generator::generate`] turns it into a [`GeneratedTypeDefinition`]:
//!
//! 1. the explicit method list is validated
//! 2. the [`GenerationCache`] is consulted; a hit ends generation here
//! 3. the target is introspected and checked for finality
//! 4. the [method set](method_set) and [hooks] are computed
//! 5. a [name](naming) is allocated and the declaration [rendered](template)
//! 6. the declaration is [compiled](compiler), activating the new type

pub mod cache;
pub mod compiler;
pub mod hooks;
pub mod intersection;
pub mod method_set;
pub mod naming;
pub mod template;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::trace;
use understudy_types::{
    builtin, simple_name, Introspector, TargetType, TypeError, TypeRegistry, CLONE,
};

use crate::config::EngineConfig;
use crate::double::ConfigurableMethod;
use crate::error::DoubleError;
use crate::events::{report_deprecation, EventReporter};

pub use cache::{GenerationCache, GenerationKey};
pub use hooks::PropertyHookDescriptor;
pub use method_set::{MethodSet, MethodSetBuilder};

/// What cloning a double does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClonePolicy {
    /// The clone hook is intercepted and only recorded
    Doubled,
    /// The target's own clone hook runs on the copy
    Proxied,
}

impl ClonePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClonePolicy::Doubled => "doubled",
            ClonePolicy::Proxied => "proxied",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "doubled" => Some(ClonePolicy::Doubled),
            "proxied" => Some(ClonePolicy::Proxied),
            _ => None,
        }
    }

    /// Policy for a double of `target`
    ///
    /// Only a real class with a non-final clone hook, doubled with the
    /// original clone requested, gets a proxied clone.
    pub fn for_target(target: Option<&TargetType>, call_original_clone: bool) -> Self {
        match target {
            Some(t)
                if call_original_clone
                    && !t.is_synthetic()
                    && !t.is_interface()
                    && t.method(CLONE).is_some_and(|m| !m.is_final()) =>
            {
                ClonePolicy::Proxied
            }
            _ => ClonePolicy::Doubled,
        }
    }
}

/// Request for a double of one type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoubleRequest {
    pub type_name: String,
    /// Mock objects are verified later; stubs only answer calls
    pub mock_object: bool,
    /// `None` intercepts every doubleable method, otherwise exactly these
    pub methods: Option<Vec<String>>,
    /// Name for the generated type instead of a generated one
    pub class_name: Option<String>,
    pub call_original_clone: bool,
    /// Delegate intercepted calls to a real instance of the target
    pub call_original_methods: bool,
    /// Overrides `defaults.allow_unknown_types`
    pub allow_unknown_types: Option<bool>,
    /// Overrides `defaults.autoload`
    pub autoload: Option<bool>,
}

impl DoubleRequest {
    fn new(type_name: impl Into<String>, mock_object: bool) -> Self {
        Self {
            type_name: type_name.into(),
            mock_object,
            methods: None,
            class_name: None,
            call_original_clone: true,
            call_original_methods: false,
            allow_unknown_types: None,
            autoload: None,
        }
    }

    /// Request a mock object of `type_name`
    pub fn mock(type_name: impl Into<String>) -> Self {
        Self::new(type_name, true)
    }

    /// Request a test stub of `type_name`
    pub fn stub(type_name: impl Into<String>) -> Self {
        Self::new(type_name, false)
    }

    /// Intercept exactly these methods
    pub fn only_methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.methods = Some(methods.into_iter().map(Into::into).collect());
        self
    }

    pub fn named(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    pub fn call_original_clone(mut self, enabled: bool) -> Self {
        self.call_original_clone = enabled;
        self
    }

    pub fn call_original_methods(mut self, enabled: bool) -> Self {
        self.call_original_methods = enabled;
        self
    }

    pub fn allow_unknown_types(mut self, enabled: bool) -> Self {
        self.allow_unknown_types = Some(enabled);
        self
    }

    pub fn autoload(mut self, enabled: bool) -> Self {
        self.autoload = Some(enabled);
        self
    }
}

/// A generated and activated double type
///
/// Created once per fingerprint and shared by every double of that type.
#[derive(Debug)]
pub struct GeneratedTypeDefinition {
    name: String,
    source: String,
    target_name: String,
    mock_object: bool,
    clone_policy: ClonePolicy,
    call_original_methods: bool,
    configurable: Vec<ConfigurableMethod>,
    /// The activated double type
    live_type: TargetType,
    /// The doubled type, `None` behind a placeholder
    target: Option<TargetType>,
    deprecations: Vec<String>,
}

impl GeneratedTypeDefinition {
    /// Name of the generated type
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rendered declaration the type was compiled from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Requested target name
    pub fn target_name(&self) -> &str {
        &self.target_name
    }

    pub fn is_mock_object(&self) -> bool {
        self.mock_object
    }

    pub fn clone_policy(&self) -> ClonePolicy {
        self.clone_policy
    }

    pub fn call_original_methods(&self) -> bool {
        self.call_original_methods
    }

    pub fn configurable_methods(&self) -> &[ConfigurableMethod] {
        &self.configurable
    }

    /// Configurable method by name
    pub fn configurable(&self, name: &str) -> Option<&ConfigurableMethod> {
        self.configurable.iter().find(|m| m.matches(name))
    }

    pub fn live_type(&self) -> &TargetType {
        &self.live_type
    }

    pub fn target(&self) -> Option<&TargetType> {
        self.target.as_ref()
    }

    /// Deprecation notices raised by this definition's method set
    pub fn deprecations(&self) -> &[String] {
        &self.deprecations
    }
}

/// Generates doubles against one registry
pub struct Generator<'a> {
    registry: &'a TypeRegistry,
    cache: &'a GenerationCache,
    config: &'a EngineConfig,
    reporter: &'a dyn EventReporter,
}

impl<'a> Generator<'a> {
    pub fn new(
        registry: &'a TypeRegistry,
        cache: &'a GenerationCache,
        config: &'a EngineConfig,
        reporter: &'a dyn EventReporter,
    ) -> Self {
        Self {
            registry,
            cache,
            config,
            reporter,
        }
    }

    /// Generate (or fetch from cache) the double type for `request`
    pub fn generate(
        &self,
        request: &DoubleRequest,
    ) -> Result<Arc<GeneratedTypeDefinition>, DoubleError> {
        if let Some(methods) = &request.methods {
            method_set::validate_explicit(methods)?;
        }

        let key = self.key(request);
        let definition = self.cache.get_or_create(&key, || self.build(request))?;

        if self.config.events.report_deprecations {
            for message in definition.deprecations() {
                report_deprecation(self.reporter, message);
            }
        }
        Ok(definition)
    }

    /// Cache key of `request` with configuration defaults applied
    pub fn key(&self, request: &DoubleRequest) -> GenerationKey {
        GenerationKey {
            type_name: request.type_name.to_ascii_lowercase(),
            mock_object: request.mock_object,
            methods: request.methods.clone(),
            class_name: request.class_name.clone(),
            call_original_clone: request.call_original_clone,
            call_original_methods: request.call_original_methods,
            allow_unknown_types: self.allow_unknown_types(request),
        }
    }

    fn allow_unknown_types(&self, request: &DoubleRequest) -> bool {
        request
            .allow_unknown_types
            .unwrap_or(self.config.defaults.allow_unknown_types)
    }

    fn build(&self, request: &DoubleRequest) -> Result<GeneratedTypeDefinition, DoubleError> {
        let autoload = request.autoload.unwrap_or(self.config.defaults.autoload);
        let introspector = Introspector::new(self.registry);

        let target = match introspector.describe(&request.type_name, autoload) {
            Ok(target) => Some(target),
            Err(TypeError::UnknownType { name })
                if self.allow_unknown_types(request)
                    && name.eq_ignore_ascii_case(&request.type_name) =>
            {
                None
            }
            Err(err) => return Err(err.into()),
        };

        if let Some(target) = &target {
            if target.is_enum() {
                return Err(DoubleError::structural(
                    target.name(),
                    "enumerations cannot be doubled",
                ));
            }
            if target.is_final() {
                return Err(DoubleError::structural(target.name(), "class is final"));
            }
        }

        let set = MethodSetBuilder::new(self.registry).build(
            &request.type_name,
            target.as_ref(),
            request.methods.as_deref(),
        )?;
        let hooks = hooks::extract(target.as_ref());
        let clone_policy = ClonePolicy::for_target(target.as_ref(), request.call_original_clone);

        let (prefix, marker) = if request.mock_object {
            (&self.config.naming.mock_prefix, builtin::MOCK_OBJECT)
        } else {
            (&self.config.naming.stub_prefix, builtin::STUB)
        };
        let target_simple = target
            .as_ref()
            .map(|t| t.simple_name())
            .unwrap_or_else(|| simple_name(&request.type_name));
        let name = naming::allocate(
            self.registry,
            prefix,
            target_simple,
            request.class_name.as_deref(),
        )?;

        let source = template::DoubleTemplate {
            name: &name,
            readonly: target.as_ref().is_some_and(|t| t.is_readonly()),
            parent: set.parent.as_deref(),
            interfaces: &set.interfaces,
            marker,
            clone_policy,
            methods: &set.methods,
            hooks: &hooks,
            placeholder: target.is_none().then_some(request.type_name.as_str()),
        }
        .render();
        trace!(double = %name, source = %source, "rendered double");

        let unit = compiler::compile(self.registry, &source)?;
        let live_type = introspector.describe(&name, false)?;

        let mut configurable: Vec<ConfigurableMethod> = live_type
            .decl()
            .methods
            .iter()
            .cloned()
            .map(ConfigurableMethod::method)
            .collect();
        for property in &live_type.decl().properties {
            let hook = PropertyHookDescriptor {
                property: property.name.clone(),
                type_name: property.type_name.clone(),
                default: property.default.clone(),
                has_get_hook: property.get_hook.is_some(),
                has_set_hook: property.set_hook.is_some(),
            };
            configurable.extend(hook.pseudo_methods().into_iter().map(ConfigurableMethod::hook));
        }

        let deprecations = set
            .configuration_collisions()
            .into_iter()
            .map(|method| {
                format!(
                    "Doubling method \"{}\" of {} is deprecated, \
                     it collides with the {}() configuration method of test doubles",
                    method,
                    request.type_name,
                    method.to_ascii_lowercase()
                )
            })
            .collect();

        Ok(GeneratedTypeDefinition {
            clone_policy: unit.clone_policy(&name).unwrap_or(clone_policy),
            name,
            source,
            target_name: request.type_name.clone(),
            mock_object: request.mock_object,
            call_original_methods: request.call_original_methods,
            configurable,
            live_type,
            target,
            deprecations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use understudy_types::{MethodDescriptor, TypeDecl};

    #[test]
    fn test_clone_policy() {
        let registry = TypeRegistry::new();
        registry
            .declare(TypeDecl::class("Cloneable").with_method(MethodDescriptor::new("__clone")))
            .unwrap();
        registry
            .declare(
                TypeDecl::class("Sealed").with_method(MethodDescriptor::new("__clone").as_final()),
            )
            .unwrap();
        registry.declare(TypeDecl::class("Plain")).unwrap();
        let introspector = Introspector::new(&registry);
        let cloneable = introspector.describe("Cloneable", false).unwrap();
        let sealed = introspector.describe("Sealed", false).unwrap();
        let plain = introspector.describe("Plain", false).unwrap();

        assert_eq!(ClonePolicy::for_target(Some(&cloneable), true), ClonePolicy::Proxied);
        assert_eq!(ClonePolicy::for_target(Some(&cloneable), false), ClonePolicy::Doubled);
        assert_eq!(ClonePolicy::for_target(Some(&sealed), true), ClonePolicy::Doubled);
        assert_eq!(ClonePolicy::for_target(Some(&plain), true), ClonePolicy::Doubled);
        assert_eq!(ClonePolicy::for_target(None, true), ClonePolicy::Doubled);
    }

    #[test]
    fn test_request_builders() {
        let request = DoubleRequest::stub("Mailer")
            .only_methods(["send"])
            .named("MailerStub")
            .call_original_clone(false)
            .allow_unknown_types(true);

        assert!(!request.mock_object);
        assert_eq!(request.methods, Some(vec!["send".to_string()]));
        assert_eq!(request.class_name.as_deref(), Some("MailerStub"));
        assert!(!request.call_original_clone);
        assert_eq!(request.allow_unknown_types, Some(true));
        assert_eq!(request.autoload, None);
    }
}
