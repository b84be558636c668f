//! Understudy host type system
//!
//! Declared types, live objects and the process-wide registry that test
//! doubles are generated against and activated into.
//!
//! # Overview
//!
//! - [`TypeDecl`]: declaration of a class, interface or enumeration, with
//!   native method bodies
//! - [`TypeRegistry`]: the set of active types; activation is irreversible
//! - [`Introspector`] / [`TargetType`]: flattened, read-only views of a type
//! - [`Instance`] / [`Value`]: live objects and the values they hold

#![warn(rust_2018_idioms)]

pub mod decl;
pub mod error;
pub mod instance;
pub mod introspection;
pub mod registry;
pub mod ty;
pub mod value;

pub use decl::{NativeMethod, TypeDecl};
pub use error::TypeError;
pub use instance::Instance;
pub use introspection::{Introspector, TargetType};
pub use registry::{builtin, TypeLoader, TypeRegistry};
pub use ty::{
    namespace_of, simple_name, HookDescriptor, MethodDescriptor, Modifiers, ParameterDescriptor,
    PropertyDescriptor, TypeKind, Visibility, CLONE, CONSTRUCTOR, DESTRUCTOR, NAMESPACE_SEPARATOR,
};
pub use value::{ObjectRef, Value};
