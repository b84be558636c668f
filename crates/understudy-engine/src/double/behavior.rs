//! Configured behaviors of intercepted methods

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use understudy_types::Value;

use crate::error::InvocationError;

/// Callback receiving the bound arguments of a call
pub type ReturnCallback = Arc<dyn Fn(&[Value]) -> Result<Value, InvocationError> + Send + Sync>;

/// What an intercepted method does when called
#[derive(Clone)]
pub enum Behavior {
    /// Return the same value on every call
    Return(Value),
    /// Return the values in order, then null once exhausted
    ReturnConsecutive(VecDeque<Value>),
    /// Return the argument at this position
    ReturnArgument(usize),
    /// Compute the result from the arguments
    ReturnCallback(ReturnCallback),
    /// Raise an exception
    Throw { type_name: String, message: String },
}

impl Behavior {
    pub fn returns(value: impl Into<Value>) -> Self {
        Behavior::Return(value.into())
    }

    pub fn consecutive<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Behavior::ReturnConsecutive(values.into_iter().map(Into::into).collect())
    }

    pub fn argument(index: usize) -> Self {
        Behavior::ReturnArgument(index)
    }

    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, InvocationError> + Send + Sync + 'static,
    {
        Behavior::ReturnCallback(Arc::new(f))
    }

    pub fn throws(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Behavior::Throw {
            type_name: type_name.into(),
            message: message.into(),
        }
    }

    /// Values known before any call, checked against the return type up front
    pub(crate) fn fixed_values(&self) -> Vec<&Value> {
        match self {
            Behavior::Return(value) => vec![value],
            Behavior::ReturnConsecutive(values) => values.iter().collect(),
            _ => Vec::new(),
        }
    }

    /// Produce the result for one call
    pub(crate) fn resolve(&mut self, args: &[Value]) -> Result<Value, InvocationError> {
        match self {
            Behavior::Return(value) => Ok(value.clone()),
            Behavior::ReturnConsecutive(values) => Ok(values.pop_front().unwrap_or_default()),
            Behavior::ReturnArgument(index) => Ok(args.get(*index).cloned().unwrap_or_default()),
            Behavior::ReturnCallback(callback) => callback(args),
            Behavior::Throw { type_name, message } => Err(InvocationError::Thrown {
                type_name: type_name.clone(),
                message: message.clone(),
            }),
        }
    }
}

impl fmt::Debug for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Behavior::Return(value) => f.debug_tuple("Return").field(value).finish(),
            Behavior::ReturnConsecutive(values) => {
                f.debug_tuple("ReturnConsecutive").field(values).finish()
            }
            Behavior::ReturnArgument(index) => {
                f.debug_tuple("ReturnArgument").field(index).finish()
            }
            Behavior::ReturnCallback(_) => f.write_str("ReturnCallback(..)"),
            Behavior::Throw { type_name, message } => f
                .debug_struct("Throw")
                .field("type_name", type_name)
                .field("message", message)
                .finish(),
        }
    }
}
