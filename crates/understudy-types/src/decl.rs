//! Type declarations
//!
//! A [`TypeDecl`] is what gets activated in the [`TypeRegistry`](crate::TypeRegistry):
//! the type's own members plus the native bodies that implement them.
//! Inherited members are resolved by [`Introspector`](crate::Introspector).

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::error::TypeError;
use crate::instance::Instance;
use crate::ty::{
    simple_name, MethodDescriptor, ParameterDescriptor, PropertyDescriptor, TypeKind, CONSTRUCTOR,
};
use crate::value::Value;

/// Native implementation of a method, invoked against the receiver's storage
pub type NativeMethod =
    Arc<dyn Fn(&mut Instance, &[Value]) -> Result<Value, TypeError> + Send + Sync>;

/// Declaration of a class, interface or enumeration
#[derive(Clone)]
pub struct TypeDecl {
    pub name: String,
    pub kind: TypeKind,
    pub is_final: bool,
    pub is_readonly: bool,
    pub is_abstract: bool,
    /// Provided by the host rather than by user code
    pub is_builtin: bool,
    /// Produced by code generation (test doubles, placeholders, intersections)
    pub is_synthetic: bool,
    /// Parent class (classes only)
    pub parent: Option<String>,
    /// Implemented interfaces (classes) or extended interfaces (interfaces)
    pub interfaces: Vec<String>,
    pub methods: Vec<MethodDescriptor>,
    pub properties: Vec<PropertyDescriptor>,
    /// Method bodies keyed by lowercase method name
    bodies: FxHashMap<String, NativeMethod>,
}

impl TypeDecl {
    fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            is_final: false,
            is_readonly: false,
            is_abstract: false,
            is_builtin: false,
            is_synthetic: false,
            parent: None,
            interfaces: Vec::new(),
            methods: Vec::new(),
            properties: Vec::new(),
            bodies: FxHashMap::default(),
        }
    }

    /// Declare a class
    pub fn class(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Class)
    }

    /// Declare an interface
    pub fn interface(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Interface)
    }

    /// Declare an enumeration
    pub fn enumeration(name: impl Into<String>) -> Self {
        let mut decl = Self::new(name, TypeKind::Enum);
        decl.is_final = true;
        decl
    }

    /// Set the parent class
    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Add an implemented (or, for interfaces, extended) interface
    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    pub fn as_final(mut self) -> Self {
        self.is_final = true;
        self
    }

    pub fn as_readonly(mut self) -> Self {
        self.is_readonly = true;
        self
    }

    pub fn as_abstract(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn as_builtin(mut self) -> Self {
        self.is_builtin = true;
        self
    }

    pub fn as_synthetic(mut self) -> Self {
        self.is_synthetic = true;
        self
    }

    /// Declare a method without a body
    ///
    /// Interface methods are always abstract; class methods without a body
    /// are treated as abstract by the runtime.
    pub fn with_method(mut self, method: MethodDescriptor) -> Self {
        self.push_method(method);
        self
    }

    /// Declare a method together with its native body
    pub fn with_method_body<F>(mut self, method: MethodDescriptor, body: F) -> Self
    where
        F: Fn(&mut Instance, &[Value]) -> Result<Value, TypeError> + Send + Sync + 'static,
    {
        let key = method.name.to_ascii_lowercase();
        self.push_method(method);
        self.bodies.insert(key, Arc::new(body));
        self
    }

    /// Declare a constructor with the given parameters and body
    pub fn with_constructor<F>(self, parameters: Vec<ParameterDescriptor>, body: F) -> Self
    where
        F: Fn(&mut Instance, &[Value]) -> Result<(), TypeError> + Send + Sync + 'static,
    {
        let mut method = MethodDescriptor::new(CONSTRUCTOR);
        method.parameters = parameters;
        self.with_method_body(method, move |obj, args| body(obj, args).map(|_| Value::Null))
    }

    /// Declare a property
    pub fn with_property(mut self, property: PropertyDescriptor) -> Self {
        self.properties.push(property);
        self
    }

    fn push_method(&mut self, mut method: MethodDescriptor) {
        method.declaring_type = self.name.clone();
        if self.kind == TypeKind::Interface {
            method.modifiers.is_abstract = true;
        }
        self.methods.push(method);
    }

    pub fn simple_name(&self) -> &str {
        simple_name(&self.name)
    }

    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }

    pub fn is_enum(&self) -> bool {
        self.kind == TypeKind::Enum
    }

    /// Own method by name (case-insensitive)
    pub fn method(&self, name: &str) -> Option<&MethodDescriptor> {
        self.methods.iter().find(|m| m.is_named(name))
    }

    /// Own property by name
    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Native body of an own method
    pub fn body(&self, name: &str) -> Option<&NativeMethod> {
        self.bodies.get(&name.to_ascii_lowercase())
    }

    /// Check the declaration against rules that need no other types
    pub fn validate(&self) -> Result<(), TypeError> {
        let invalid = |reason: String| TypeError::InvalidDeclaration {
            name: self.name.clone(),
            reason,
        };

        if self.name.is_empty() {
            return Err(invalid("type name must not be empty".to_string()));
        }
        if self.kind != TypeKind::Class && self.parent.is_some() {
            return Err(invalid(format!(
                "{} types cannot extend a class",
                self.kind.as_str()
            )));
        }
        if self.is_final && self.is_abstract {
            return Err(invalid("a type cannot be both final and abstract".to_string()));
        }

        let mut seen = rustc_hash::FxHashSet::default();
        for method in &self.methods {
            if !seen.insert(method.name.to_ascii_lowercase()) {
                return Err(invalid(format!("method {} is declared twice", method.name)));
            }
        }
        let mut seen = rustc_hash::FxHashSet::default();
        for property in &self.properties {
            if !seen.insert(property.name.as_str()) {
                return Err(invalid(format!(
                    "property ${} is declared twice",
                    property.name
                )));
            }
        }
        if self.kind == TypeKind::Interface && !self.bodies.is_empty() {
            return Err(invalid("interface methods cannot have bodies".to_string()));
        }
        Ok(())
    }
}

impl fmt::Debug for TypeDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut bodies: Vec<&str> = self.bodies.keys().map(String::as_str).collect();
        bodies.sort_unstable();
        f.debug_struct("TypeDecl")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("is_final", &self.is_final)
            .field("is_readonly", &self.is_readonly)
            .field("is_abstract", &self.is_abstract)
            .field("is_synthetic", &self.is_synthetic)
            .field("parent", &self.parent)
            .field("interfaces", &self.interfaces)
            .field("methods", &self.methods)
            .field("properties", &self.properties)
            .field("bodies", &bodies)
            .finish()
    }
}
