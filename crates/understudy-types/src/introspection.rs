//! Type introspection
//!
//! [`Introspector`] resolves a type name against the [`TypeRegistry`] and
//! produces a [`TargetType`]: a read-only snapshot with inherited members
//! flattened in. Snapshots are built per call and never cached, so a type
//! that becomes active later is always seen by the next lookup.
//!
//! Flattening order is most-derived first: the type's own methods, then
//! those of each ancestor class up the chain, then interface methods. A
//! method declared by a derived class shadows every ancestor declaration
//! of the same name, including its body.

use std::fmt;
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::decl::{NativeMethod, TypeDecl};
use crate::error::TypeError;
use crate::instance::Instance;
use crate::registry::TypeRegistry;
use crate::ty::{simple_name, MethodDescriptor, PropertyDescriptor, TypeKind, CONSTRUCTOR};
use crate::value::{ObjectRef, Value};

/// Resolves names into flattened type snapshots
pub struct Introspector<'a> {
    registry: &'a TypeRegistry,
}

impl<'a> Introspector<'a> {
    pub fn new(registry: &'a TypeRegistry) -> Self {
        Self { registry }
    }

    /// Describe a type, loading it (and its ancestors) when `autoload` is set
    pub fn describe(&self, name: &str, autoload: bool) -> Result<TargetType, TypeError> {
        let decl = self.registry.lookup(name, autoload)?;

        let mut methods = Vec::new();
        let mut properties = Vec::new();
        let mut bodies = FxHashMap::default();
        let mut supertypes = Vec::new();
        let mut seen_methods = FxHashSet::default();
        let mut seen_types = FxHashSet::default();
        seen_types.insert(decl.name.to_ascii_lowercase());

        // Class chain first, collecting interfaces as we go
        let mut pending_interfaces: Vec<String> = Vec::new();
        let mut current = Some(Arc::clone(&decl));
        while let Some(ty) = current.take() {
            absorb(&ty, &mut methods, &mut bodies, &mut seen_methods);
            for property in &ty.properties {
                if !properties.iter().any(|p: &PropertyDescriptor| p.name == property.name) {
                    properties.push(property.clone());
                }
            }
            pending_interfaces.extend(ty.interfaces.iter().cloned());

            if let Some(parent) = &ty.parent {
                if !seen_types.insert(parent.to_ascii_lowercase()) {
                    return Err(TypeError::InvalidDeclaration {
                        name: decl.name.clone(),
                        reason: format!("inheritance cycle through {}", parent),
                    });
                }
                let parent = self.registry.lookup(parent, autoload)?;
                supertypes.push(parent.name.clone());
                current = Some(parent);
            }
        }

        // Interfaces breadth-first, each visited once
        let mut queue = std::collections::VecDeque::from(pending_interfaces);
        while let Some(name) = queue.pop_front() {
            if !seen_types.insert(name.to_ascii_lowercase()) {
                continue;
            }
            let iface = self.registry.lookup(&name, autoload)?;
            supertypes.push(iface.name.clone());
            absorb(&iface, &mut methods, &mut bodies, &mut seen_methods);
            queue.extend(iface.interfaces.iter().cloned());
        }

        Ok(TargetType {
            decl,
            methods,
            properties,
            supertypes,
            bodies,
        })
    }

    /// Whether `name` is `ancestor` or one of its subtypes
    pub fn is_subtype(&self, name: &str, ancestor: &str) -> Result<bool, TypeError> {
        Ok(self.describe(name, false)?.instance_of(ancestor))
    }
}

fn absorb(
    ty: &TypeDecl,
    methods: &mut Vec<MethodDescriptor>,
    bodies: &mut FxHashMap<String, NativeMethod>,
    seen: &mut FxHashSet<String>,
) {
    for method in &ty.methods {
        let key = method.name.to_ascii_lowercase();
        if !seen.insert(key.clone()) {
            continue;
        }
        if let Some(body) = ty.body(&method.name) {
            bodies.insert(key, Arc::clone(body));
        }
        methods.push(method.clone());
    }
}

/// Read-only snapshot of a live type with inherited members flattened in
#[derive(Clone)]
pub struct TargetType {
    decl: Arc<TypeDecl>,
    methods: Vec<MethodDescriptor>,
    properties: Vec<PropertyDescriptor>,
    /// Ancestor classes nearest first, then interfaces
    supertypes: Vec<String>,
    bodies: FxHashMap<String, NativeMethod>,
}

impl TargetType {
    pub fn name(&self) -> &str {
        &self.decl.name
    }

    pub fn simple_name(&self) -> &str {
        simple_name(&self.decl.name)
    }

    pub fn kind(&self) -> TypeKind {
        self.decl.kind
    }

    /// The type's own declaration
    pub fn decl(&self) -> &Arc<TypeDecl> {
        &self.decl
    }

    pub fn is_final(&self) -> bool {
        self.decl.is_final
    }

    pub fn is_readonly(&self) -> bool {
        self.decl.is_readonly
    }

    /// Declared abstract, or left with abstract members
    pub fn is_abstract(&self) -> bool {
        self.decl.is_abstract || self.methods.iter().any(|m| m.modifiers.is_abstract)
    }

    pub fn is_enum(&self) -> bool {
        self.decl.kind == TypeKind::Enum
    }

    pub fn is_interface(&self) -> bool {
        self.decl.kind == TypeKind::Interface
    }

    pub fn is_class(&self) -> bool {
        self.decl.kind == TypeKind::Class
    }

    pub fn is_builtin(&self) -> bool {
        self.decl.is_builtin
    }

    pub fn is_synthetic(&self) -> bool {
        self.decl.is_synthetic
    }

    pub fn parent(&self) -> Option<&str> {
        self.decl.parent.as_deref()
    }

    /// All methods, own and inherited, most-derived first
    pub fn methods(&self) -> &[MethodDescriptor] {
        &self.methods
    }

    /// Method by name (case-insensitive)
    pub fn method(&self, name: &str) -> Option<&MethodDescriptor> {
        self.methods.iter().find(|m| m.is_named(name))
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.method(name).is_some()
    }

    /// All properties, own and inherited
    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Every ancestor class and implemented interface
    pub fn supertypes(&self) -> &[String] {
        &self.supertypes
    }

    /// Whether `name` is an ancestor class or an implemented interface
    pub fn implements(&self, name: &str) -> bool {
        self.supertypes.iter().any(|s| s.eq_ignore_ascii_case(name))
    }

    /// Whether values of this type satisfy `name`
    pub fn instance_of(&self, name: &str) -> bool {
        self.decl.name.eq_ignore_ascii_case(name) || self.implements(name)
    }

    /// Native body the type resolves `name` to, if any
    pub fn body(&self, name: &str) -> Option<&NativeMethod> {
        self.bodies.get(&name.to_ascii_lowercase())
    }

    /// Fresh storage with property defaults applied, no constructor run
    pub fn blank_instance(&self) -> Instance {
        let mut instance = Instance::new(self.decl.name.clone());
        for property in self.properties.iter().filter(|p| !p.is_static) {
            if let Some(default) = &property.default {
                instance.set(property.name.clone(), default.clone());
            }
        }
        instance
    }

    /// Wrap `instance` as a value that satisfies this type and its supertypes
    pub fn object(&self, instance: Instance) -> ObjectRef {
        let mut types = Vec::with_capacity(self.supertypes.len() + 1);
        types.push(self.decl.name.clone());
        types.extend(self.supertypes.iter().cloned());
        ObjectRef::new(instance, types)
    }

    /// Create an instance and run its constructor with `args`
    pub fn instantiate(&self, args: &[Value]) -> Result<Instance, TypeError> {
        if !self.is_class() || self.is_abstract() {
            let reason = if self.is_class() {
                "type is abstract".to_string()
            } else {
                format!("type is an {}", self.decl.kind.as_str())
            };
            return Err(TypeError::NotInstantiable {
                name: self.decl.name.clone(),
                reason,
            });
        }

        let mut instance = self.blank_instance();
        if self.method(CONSTRUCTOR).is_some() {
            self.call(&mut instance, CONSTRUCTOR, args)?;
        }
        Ok(instance)
    }

    /// Run the resolved body of `name` against `instance`
    ///
    /// Omitted trailing arguments are filled from declared defaults.
    pub fn call(
        &self,
        instance: &mut Instance,
        name: &str,
        args: &[Value],
    ) -> Result<Value, TypeError> {
        let undefined = || TypeError::UndefinedMethod {
            type_name: self.decl.name.clone(),
            method: name.to_string(),
        };
        let method = self.method(name).ok_or_else(undefined)?;
        let body = self.body(name).ok_or_else(undefined)?;
        let bound = method.bind_arguments(args).ok_or_else(|| {
            TypeError::thrown(
                "ArgumentCountError",
                format!(
                    "Too few arguments to {}::{}(), {} passed and at least {} expected",
                    self.decl.name,
                    method.name,
                    args.len(),
                    method.required_arity()
                ),
            )
        })?;
        body(instance, &bound)
    }
}

impl fmt::Debug for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetType")
            .field("name", &self.decl.name)
            .field("kind", &self.decl.kind)
            .field("methods", &self.methods.iter().map(|m| &m.name).collect::<Vec<_>>())
            .field("properties", &self.properties.iter().map(|p| &p.name).collect::<Vec<_>>())
            .field("supertypes", &self.supertypes)
            .finish()
    }
}
