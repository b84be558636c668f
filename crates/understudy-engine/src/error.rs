//! Engine error types

use thiserror::Error;
use understudy_types::TypeError;

use crate::config::ConfigError;

/// Errors raised while generating or instantiating a test double
///
/// Generation is all-or-nothing: when any of these is returned, no type
/// has been activated and nothing has been cached.
#[derive(Debug, Error)]
pub enum DoubleError {
    /// The target (or the requested method list) cannot be doubled
    #[error("Cannot double {type_name}: {reason}")]
    StructuralViolation {
        /// Type the double was requested for
        type_name: String,
        /// Rule that prevents doubling
        reason: String,
    },

    /// The requested type name is already in use
    #[error("Type name {name} is already in use")]
    NameConflict {
        /// Conflicting name
        name: String,
    },

    /// The explicit method list is malformed
    #[error("Invalid method list: {reason}")]
    InvalidMethodSpec {
        /// What is wrong with the list
        reason: String,
    },

    /// A referenced type does not exist
    #[error("Unknown type: {name}")]
    UnknownType {
        /// Name that did not resolve
        name: String,
    },

    /// Introspection, compilation or construction failed in the type system
    #[error("Reflection failure: {0}")]
    ReflectionFailure(TypeError),

    /// Delegating to original methods needs the original constructor to run
    #[error("Original methods can only be called when the original constructor is called")]
    OriginalConstructorRequired,

    /// Request is inconsistent with the live types it names
    #[error("Runtime conflict: {reason}")]
    RuntimeConflict {
        /// Description of the conflict
        reason: String,
    },

    /// Engine configuration could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl DoubleError {
    pub(crate) fn structural(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        DoubleError::StructuralViolation {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_methods(reason: impl Into<String>) -> Self {
        DoubleError::InvalidMethodSpec {
            reason: reason.into(),
        }
    }

    pub(crate) fn conflict(reason: impl Into<String>) -> Self {
        DoubleError::RuntimeConflict {
            reason: reason.into(),
        }
    }
}

impl From<TypeError> for DoubleError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::UnknownType { name } => DoubleError::UnknownType { name },
            other => DoubleError::ReflectionFailure(other),
        }
    }
}

/// Errors raised by calls on a live test double
#[derive(Debug, Clone, Error, PartialEq)]
pub enum InvocationError {
    /// Method is not among the double's configurable methods
    #[error("Method {method} cannot be configured on {type_name}")]
    UnknownMethod {
        /// Double type name
        type_name: String,
        /// Requested method
        method: String,
    },

    /// Method does not exist on the double at all
    #[error("Call to undefined method {type_name}::{method}()")]
    UndefinedMethod {
        /// Double type name
        type_name: String,
        /// Requested method
        method: String,
    },

    /// Configured return value does not fit the declared return type
    #[error(
        "Method {method} may not return value of type {value_type}, \
         its declared return type is \"{return_type}\""
    )]
    IncompatibleReturnValue {
        /// Configured method
        method: String,
        /// Type of the offending value
        value_type: String,
        /// Declared return type
        return_type: String,
    },

    /// No behavior was configured and no default return value can be made
    #[error(
        "Return value for {type_name}::{method}() cannot be generated, \
         configure a return value"
    )]
    ReturnValueNotConfigured {
        /// Double type name
        type_name: String,
        /// Invoked method
        method: String,
    },

    /// Fewer arguments than required parameters
    #[error("Too few arguments to {method}(), {passed} passed and at least {required} expected")]
    TooFewArguments {
        /// Invoked method
        method: String,
        /// Number of arguments supplied
        passed: usize,
        /// Number of required parameters
        required: usize,
    },

    /// Non-intercepted method has no body to run
    #[error("Cannot call abstract method {type_name}::{method}()")]
    AbstractMethod {
        /// Declaring type
        type_name: String,
        /// Invoked method
        method: String,
    },

    /// A configured behavior raised an exception
    #[error("{type_name}: {message}")]
    Thrown {
        /// Exception type name
        type_name: String,
        /// Exception message
        message: String,
    },

    /// An original body failed
    #[error(transparent)]
    Original(#[from] TypeError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_error_mapping() {
        let unknown: DoubleError = TypeError::UnknownType {
            name: "Ghost".to_string(),
        }
        .into();
        assert!(matches!(unknown, DoubleError::UnknownType { ref name } if name == "Ghost"));

        let duplicate: DoubleError = TypeError::DuplicateType {
            name: "Taken".to_string(),
        }
        .into();
        assert!(matches!(duplicate, DoubleError::ReflectionFailure(_)));
    }

    #[test]
    fn test_messages() {
        let err = DoubleError::structural("Money", "class is final");
        assert_eq!(err.to_string(), "Cannot double Money: class is final");

        let err = InvocationError::TooFewArguments {
            method: "send".to_string(),
            passed: 0,
            required: 1,
        };
        assert_eq!(
            err.to_string(),
            "Too few arguments to send(), 0 passed and at least 1 expected"
        );
    }
}
