//! Understudy: runtime test double synthesis
//!
//! Generates mocks and stubs for types of the [`understudy_types`] host
//! type system. Each double is a new type, rendered as a declaration,
//! compiled and activated in the shared registry, then instantiated as a
//! [`TestDouble`] whose calls all pass through one dispatch point.
//!
//! ```ignore
//! let engine = DoubleEngine::new(Arc::new(registry));
//! let mut mailer = engine.create_mock("app::Mailer")?;
//! mailer.configure("send", Behavior::returns(true))?;
//! assert_eq!(mailer.invoke("send", &[Value::from("ops@example.com")])?, Value::Bool(true));
//! assert_eq!(mailer.invocation_count("send"), 1);
//! ```

pub mod config;
pub mod double;
pub mod engine;
pub mod error;
pub mod events;
pub mod generator;
pub mod instantiator;

pub use config::{ConfigError, EngineConfig};
pub use double::{
    Behavior, ConfigurableMethod, Invocation, ProxyTarget, TestDouble, TestDoubleState,
};
pub use engine::DoubleEngine;
pub use error::{DoubleError, InvocationError};
pub use events::{CollectingReporter, Deprecation, EventReporter, TracingReporter};
pub use generator::{
    ClonePolicy, DoubleRequest, GeneratedTypeDefinition, GenerationCache, GenerationKey, Generator,
};
pub use instantiator::{InstantiateOptions, Instantiator};
