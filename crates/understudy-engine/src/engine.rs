//! Engine facade
//!
//! [`DoubleEngine`] owns everything with process lifetime: the shared type
//! registry, the generation cache, configuration and the event reporter.
//! Construct one per test process and pass it by reference.

use std::path::Path;
use std::sync::Arc;

use understudy_types::TypeRegistry;

use crate::config::EngineConfig;
use crate::double::TestDouble;
use crate::error::DoubleError;
use crate::events::{EventReporter, TracingReporter};
use crate::generator::{DoubleRequest, GeneratedTypeDefinition, GenerationCache, Generator};
use crate::instantiator::{check_options, InstantiateOptions, Instantiator};

pub struct DoubleEngine {
    registry: Arc<TypeRegistry>,
    cache: GenerationCache,
    config: EngineConfig,
    reporter: Arc<dyn EventReporter>,
}

impl DoubleEngine {
    /// Engine with default configuration, logging notices through `tracing`
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self {
            registry,
            cache: GenerationCache::new(),
            config: EngineConfig::default(),
            reporter: Arc::new(TracingReporter),
        }
    }

    /// Engine configured from an understudy.toml file
    pub fn from_config_file(registry: Arc<TypeRegistry>, path: &Path) -> Result<Self, DoubleError> {
        let config = EngineConfig::from_file(path)?;
        Ok(Self::new(registry).with_config(config))
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn EventReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    pub fn cache(&self) -> &GenerationCache {
        &self.cache
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn generator(&self) -> Generator<'_> {
        Generator::new(&self.registry, &self.cache, &self.config, self.reporter.as_ref())
    }

    fn instantiator(&self) -> Instantiator<'_> {
        Instantiator::new(&self.registry, self.config.defaults.return_value_generation)
    }

    /// Generate the double type for `request` without instantiating it
    pub fn generate(
        &self,
        request: &DoubleRequest,
    ) -> Result<Arc<GeneratedTypeDefinition>, DoubleError> {
        self.generator().generate(request)
    }

    /// Generate the double type for `request` and instantiate it
    pub fn create_double(
        &self,
        request: &DoubleRequest,
        options: InstantiateOptions,
    ) -> Result<TestDouble, DoubleError> {
        check_options(request.call_original_methods, &options)?;
        let definition = self.generate(request)?;
        self.instantiator().instantiate(definition, options)
    }

    /// Mock object of `type_name` intercepting every doubleable method
    pub fn create_mock(&self, type_name: &str) -> Result<TestDouble, DoubleError> {
        self.create_double(&DoubleRequest::mock(type_name), InstantiateOptions::default())
    }

    /// Test stub of `type_name` intercepting every doubleable method
    pub fn create_stub(&self, type_name: &str) -> Result<TestDouble, DoubleError> {
        self.create_double(&DoubleRequest::stub(type_name), InstantiateOptions::default())
    }

    /// Generate a double type implementing all of `interfaces`
    pub fn generate_intersection(
        &self,
        interfaces: &[&str],
        mock_object: bool,
    ) -> Result<Arc<GeneratedTypeDefinition>, DoubleError> {
        self.generator().generate_intersection(interfaces, mock_object)
    }

    /// Double implementing all of `interfaces`
    pub fn create_intersection_double(
        &self,
        interfaces: &[&str],
        mock_object: bool,
    ) -> Result<TestDouble, DoubleError> {
        let definition = self.generate_intersection(interfaces, mock_object)?;
        self.instantiator()
            .instantiate(definition, InstantiateOptions::default())
    }
}

impl std::fmt::Debug for DoubleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DoubleEngine")
            .field("registry", &self.registry)
            .field("cache", &self.cache.len())
            .field("config", &self.config)
            .finish()
    }
}
