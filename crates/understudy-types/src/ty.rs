//! Member descriptors for host types
//!
//! Descriptors are plain data: they describe the shape of a method or
//! property without carrying any behavior. Native bodies live on
//! [`TypeDecl`](crate::TypeDecl).

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Name of the constructor member
pub const CONSTRUCTOR: &str = "__construct";
/// Name of the destructor member
pub const DESTRUCTOR: &str = "__destruct";
/// Name of the clone hook member
pub const CLONE: &str = "__clone";

/// Separator between namespace segments of a type name
pub const NAMESPACE_SEPARATOR: &str = "::";

/// Last segment of a namespaced type name (`app::mail::Mailer` -> `Mailer`)
pub fn simple_name(name: &str) -> &str {
    name.rsplit(NAMESPACE_SEPARATOR).next().unwrap_or(name)
}

/// Namespace part of a type name, if any (`app::mail::Mailer` -> `app::mail`)
pub fn namespace_of(name: &str) -> Option<&str> {
    name.rfind(NAMESPACE_SEPARATOR).map(|idx| &name[..idx])
}

/// Kind of a declared type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeKind {
    /// Concrete or abstract class
    Class,
    /// Interface (no bodies, no instances)
    Interface,
    /// Enumeration (never extended)
    Enum,
}

impl TypeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeKind::Class => "class",
            TypeKind::Interface => "interface",
            TypeKind::Enum => "enum",
        }
    }
}

/// Member visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Private => "private",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "public" => Some(Visibility::Public),
            "protected" => Some(Visibility::Protected),
            "private" => Some(Visibility::Private),
            _ => None,
        }
    }
}

/// Modifier flags for methods
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    /// Cannot be overridden
    pub is_final: bool,
    /// Belongs to the type rather than to instances
    pub is_static: bool,
    /// Declared without a body
    pub is_abstract: bool,
}

/// Parameter of a method signature
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDescriptor {
    /// Parameter name (without sigil)
    pub name: String,
    /// Declared type, `None` when untyped
    pub type_name: Option<String>,
    /// Default value used when the argument is omitted
    pub default: Option<Value>,
    /// Collects all remaining arguments
    pub is_variadic: bool,
}

impl ParameterDescriptor {
    /// Untyped, required parameter
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: None,
            default: None,
            is_variadic: false,
        }
    }

    /// Typed, required parameter
    pub fn typed(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            type_name: Some(type_name.into()),
            ..Self::new(name)
        }
    }

    /// Set the default value
    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Mark as variadic
    pub fn variadic(mut self) -> Self {
        self.is_variadic = true;
        self
    }

    /// Whether a caller must supply this argument
    pub fn is_required(&self) -> bool {
        self.default.is_none() && !self.is_variadic
    }
}

/// Method signature and modifiers
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDescriptor {
    pub name: String,
    pub parameters: Vec<ParameterDescriptor>,
    /// Declared return type, `None` when untyped
    pub return_type: Option<String>,
    pub visibility: Visibility,
    pub modifiers: Modifiers,
    /// Type that declares this method (filled in on declaration)
    pub declaring_type: String,
}

impl MethodDescriptor {
    /// Public, non-final instance method without parameters
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            return_type: None,
            visibility: Visibility::Public,
            modifiers: Modifiers::default(),
            declaring_type: String::new(),
        }
    }

    /// Add a parameter
    pub fn with_param(mut self, param: ParameterDescriptor) -> Self {
        self.parameters.push(param);
        self
    }

    /// Set return type
    pub fn returns(mut self, type_name: impl Into<String>) -> Self {
        self.return_type = Some(type_name.into());
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn protected(self) -> Self {
        self.with_visibility(Visibility::Protected)
    }

    pub fn private(self) -> Self {
        self.with_visibility(Visibility::Private)
    }

    pub fn as_final(mut self) -> Self {
        self.modifiers.is_final = true;
        self
    }

    pub fn as_static(mut self) -> Self {
        self.modifiers.is_static = true;
        self
    }

    pub fn as_abstract(mut self) -> Self {
        self.modifiers.is_abstract = true;
        self
    }

    /// Number of declared parameters
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    /// Number of parameters a caller must supply
    pub fn required_arity(&self) -> usize {
        self.parameters.iter().filter(|p| p.is_required()).count()
    }

    /// Fill omitted trailing arguments with declared defaults
    ///
    /// Returns `None` when a required parameter has no argument.
    pub fn bind_arguments(&self, args: &[Value]) -> Option<Vec<Value>> {
        let mut bound = args.to_vec();
        for param in self.parameters.iter().skip(args.len()) {
            if param.is_variadic {
                break;
            }
            bound.push(param.default.clone()?);
        }
        Some(bound)
    }

    /// Whether the name matches, ignoring ASCII case
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    pub fn is_constructor(&self) -> bool {
        self.is_named(CONSTRUCTOR)
    }

    pub fn is_destructor(&self) -> bool {
        self.is_named(DESTRUCTOR)
    }

    pub fn is_final(&self) -> bool {
        self.modifiers.is_final
    }

    pub fn is_private(&self) -> bool {
        self.visibility == Visibility::Private
    }
}

/// Accessor hook on a property
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HookDescriptor {
    /// Hook cannot be overridden
    pub is_final: bool,
}

/// Property declaration
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDescriptor {
    pub name: String,
    pub type_name: Option<String>,
    pub visibility: Visibility,
    pub is_final: bool,
    pub is_static: bool,
    pub is_readonly: bool,
    /// Initial value for fresh instances
    pub default: Option<Value>,
    pub get_hook: Option<HookDescriptor>,
    pub set_hook: Option<HookDescriptor>,
}

impl PropertyDescriptor {
    /// Public, untyped, unhooked property
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: None,
            visibility: Visibility::Public,
            is_final: false,
            is_static: false,
            is_readonly: false,
            default: None,
            get_hook: None,
            set_hook: None,
        }
    }

    pub fn typed(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn as_final(mut self) -> Self {
        self.is_final = true;
        self
    }

    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn as_readonly(mut self) -> Self {
        self.is_readonly = true;
        self
    }

    /// Attach a get hook
    pub fn with_get_hook(mut self, hook: HookDescriptor) -> Self {
        self.get_hook = Some(hook);
        self
    }

    /// Attach a set hook
    pub fn with_set_hook(mut self, hook: HookDescriptor) -> Self {
        self.set_hook = Some(hook);
        self
    }

    pub fn has_hooks(&self) -> bool {
        self.get_hook.is_some() || self.set_hook.is_some()
    }
}
