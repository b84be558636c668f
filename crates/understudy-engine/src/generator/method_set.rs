//! Method set construction
//!
//! Decides which methods of a target a double intercepts, and which base
//! type and interfaces the double declares to make those methods fit.

use rustc_hash::FxHashSet;
use understudy_types::{
    builtin, Introspector, MethodDescriptor, ParameterDescriptor, TargetType, TypeRegistry, CLONE,
    CONSTRUCTOR, DESTRUCTOR,
};

use crate::error::DoubleError;
use crate::generator::naming::is_valid_identifier;

/// Names starting with this prefix belong to the engine itself
pub const RESERVED_PREFIX: &str = "__understudy_";

/// Names used by the configuration surface of a double
pub const CONFIGURATION_NAMES: &[&str] = &["method", "expects"];

/// Whether a method name is reserved for the engine
pub fn is_reserved(name: &str) -> bool {
    name.get(..RESERVED_PREFIX.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(RESERVED_PREFIX))
}

/// Whether a method can be intercepted by a double
///
/// The clone hook is never intercepted as a method; the double's clone
/// policy decides what cloning does.
pub fn is_doubleable(method: &MethodDescriptor) -> bool {
    !method.is_constructor()
        && !method.is_destructor()
        && !method.is_named(CLONE)
        && !method.is_final()
        && !method.is_private()
        && !is_reserved(&method.name)
}

/// Check an explicit method list before anything else is looked at
pub fn validate_explicit(methods: &[String]) -> Result<(), DoubleError> {
    let mut seen = FxHashSet::default();
    for name in methods {
        if !is_valid_identifier(name) {
            return Err(DoubleError::invalid_methods(format!(
                "{:?} is not a valid method name",
                name
            )));
        }
        if !seen.insert(name.to_ascii_lowercase()) {
            return Err(DoubleError::invalid_methods(format!(
                "method {} is listed more than once",
                name
            )));
        }
        if is_reserved(name) {
            return Err(DoubleError::invalid_methods(format!(
                "method {} uses the reserved prefix {}",
                name, RESERVED_PREFIX
            )));
        }
    }
    Ok(())
}

/// Descriptor used for explicitly named methods the target does not declare
pub fn synthesized(name: &str) -> MethodDescriptor {
    MethodDescriptor::new(name).with_param(ParameterDescriptor::new("arguments").variadic())
}

/// Intercepted methods plus the supertypes the double declares
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MethodSet {
    /// Base class of the double
    pub parent: Option<String>,
    /// Interfaces the double implements, marker excluded
    pub interfaces: Vec<String>,
    /// Intercepted methods, unique by case-insensitive name
    pub methods: Vec<MethodDescriptor>,
}

impl MethodSet {
    fn push(&mut self, method: MethodDescriptor) {
        if !self.contains(&method.name) {
            self.methods.push(method);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.methods.iter().any(|m| m.is_named(name))
    }

    /// Intercepted methods whose names collide with the configuration surface
    pub fn configuration_collisions(&self) -> Vec<String> {
        self.methods
            .iter()
            .filter(|m| CONFIGURATION_NAMES.iter().any(|c| m.is_named(c)))
            .map(|m| m.name.clone())
            .collect()
    }
}

/// Builds the method set for one target
pub struct MethodSetBuilder<'a> {
    registry: &'a TypeRegistry,
}

impl<'a> MethodSetBuilder<'a> {
    pub fn new(registry: &'a TypeRegistry) -> Self {
        Self { registry }
    }

    /// Compute the method set
    ///
    /// `target` is `None` when the requested type does not exist and a
    /// placeholder named `type_name` stands in for it. `explicit` is `None`
    /// for every doubleable method, or the exact list of names to intercept.
    pub fn build(
        &self,
        type_name: &str,
        target: Option<&TargetType>,
        explicit: Option<&[String]>,
    ) -> Result<MethodSet, DoubleError> {
        if let Some(names) = explicit {
            self.check_explicit(type_name, target, names)?;
        }

        let mut set = MethodSet::default();
        let Some(target) = target else {
            set.parent = Some(type_name.to_string());
            for name in explicit.unwrap_or_default() {
                set.push(synthesized(name));
            }
            return Ok(set);
        };

        if target.is_interface() {
            if target.instance_of(builtin::THROWABLE) {
                self.throwable_interface(&mut set, target)?;
            } else {
                self.interface(&mut set, target)?;
            }
        } else {
            set.parent = Some(target.name().to_string());
            match explicit {
                None => {
                    for method in target.methods().iter().filter(|m| is_doubleable(m)) {
                        set.push(method.clone());
                    }
                }
                Some(_) => {
                    // Abstract members need an implementation in any mode
                    for method in target.methods().iter().filter(|m| m.modifiers.is_abstract) {
                        set.push(method.clone());
                    }
                }
            }
        }

        for name in explicit.unwrap_or_default() {
            match target.method(name).filter(|m| is_doubleable(m)) {
                Some(method) => set.push(method.clone()),
                None => set.push(synthesized(name)),
            }
        }

        Ok(set)
    }

    fn check_explicit(
        &self,
        type_name: &str,
        target: Option<&TargetType>,
        names: &[String],
    ) -> Result<(), DoubleError> {
        // Throwable interfaces are doubled as subclasses of Exception
        let exception = match target {
            Some(t) if t.is_interface() && t.instance_of(builtin::THROWABLE) => {
                Some(Introspector::new(self.registry).describe(builtin::EXCEPTION, false)?)
            }
            _ => None,
        };

        for name in names {
            let special = [CONSTRUCTOR, DESTRUCTOR, CLONE];
            if special.iter().any(|s| name.eq_ignore_ascii_case(s)) {
                return Err(DoubleError::structural(
                    type_name,
                    format!("{} cannot be doubled", name),
                ));
            }
            let inherited = exception.as_ref().and_then(|e| e.method(name));
            let method = target
                .and_then(|t| t.method(name))
                .filter(|m| m.is_final())
                .or_else(|| inherited.filter(|m| m.is_final()));
            if let Some(method) = method {
                return Err(DoubleError::structural(
                    type_name,
                    format!(
                        "final method {}::{}() cannot be doubled",
                        method.declaring_type, method.name
                    ),
                ));
            }
        }
        Ok(())
    }

    fn interface(&self, set: &mut MethodSet, target: &TargetType) -> Result<(), DoubleError> {
        set.interfaces.push(target.name().to_string());
        for method in target.methods() {
            set.push(method.clone());
        }

        let iteration_only = target.instance_of(builtin::TRAVERSABLE)
            && !target.instance_of(builtin::ITERATOR)
            && !target.instance_of(builtin::ITERATOR_AGGREGATE);
        if iteration_only {
            let iterator = Introspector::new(self.registry).describe(builtin::ITERATOR, false)?;
            set.interfaces.push(iterator.name().to_string());
            for method in iterator.methods() {
                set.push(method.clone());
            }
        }
        Ok(())
    }

    fn throwable_interface(
        &self,
        set: &mut MethodSet,
        target: &TargetType,
    ) -> Result<(), DoubleError> {
        let exception = Introspector::new(self.registry).describe(builtin::EXCEPTION, false)?;
        set.parent = Some(exception.name().to_string());
        set.interfaces.push(target.name().to_string());

        for method in target.methods() {
            let builtin_member = self
                .registry
                .get(&method.declaring_type)
                .is_some_and(|d| d.is_builtin);
            if builtin_member {
                continue;
            }
            if exception.method(&method.name).is_some_and(|m| !is_doubleable(m)) {
                continue;
            }
            set.push(method.clone());
        }
        Ok(())
    }
}
