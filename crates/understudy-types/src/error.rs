//! Type system errors

use thiserror::Error;

/// Errors raised by the type registry, introspection, and native member bodies
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TypeError {
    /// Type name does not resolve to a declared (or loadable) type
    #[error("Unknown type: {name}")]
    UnknownType {
        /// Type name that was not found
        name: String,
    },

    /// A type with this name is already active
    #[error("Type {name} is already declared")]
    DuplicateType {
        /// Conflicting type name
        name: String,
    },

    /// Declaration violates a structural rule of the type system
    #[error("Invalid declaration of {name}: {reason}")]
    InvalidDeclaration {
        /// Declared type name
        name: String,
        /// Rule that was violated
        reason: String,
    },

    /// Interfaces, enumerations and abstract classes have no instances
    #[error("Cannot instantiate {name}: {reason}")]
    NotInstantiable {
        /// Type name
        name: String,
        /// Why no instance can be created
        reason: String,
    },

    /// Method has no native body reachable from the type
    #[error("Call to undefined method {type_name}::{method}()")]
    UndefinedMethod {
        /// Receiver type
        type_name: String,
        /// Method name
        method: String,
    },

    /// A native body raised an exception of a host type
    #[error("{type_name}: {message}")]
    Thrown {
        /// Exception type name
        type_name: String,
        /// Exception message
        message: String,
    },
}

impl TypeError {
    /// Convenience constructor for exceptions raised from native bodies
    pub fn thrown(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        TypeError::Thrown {
            type_name: type_name.into(),
            message: message.into(),
        }
    }
}
