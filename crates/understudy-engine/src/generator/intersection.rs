//! Doubles of interface intersections
//!
//! A double satisfying several interfaces at once is generated in two
//! steps: a synthetic interface extending all of them is activated (once
//! per sorted interface list), then that interface is doubled normally.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use understudy_types::{Introspector, TargetType};

use crate::error::DoubleError;
use crate::generator::{
    compiler, naming, template, DoubleRequest, GeneratedTypeDefinition, Generator,
};

impl Generator<'_> {
    /// Generate a double implementing every interface in `interfaces`
    pub fn generate_intersection(
        &self,
        interfaces: &[&str],
        mock_object: bool,
    ) -> Result<Arc<GeneratedTypeDefinition>, DoubleError> {
        let name = self.intersection_interface(interfaces)?;
        let request = if mock_object {
            DoubleRequest::mock(name)
        } else {
            DoubleRequest::stub(name)
        };
        self.generate(&request)
    }

    /// Name of the synthetic interface extending every one of `interfaces`
    pub fn intersection_interface(&self, interfaces: &[&str]) -> Result<String, DoubleError> {
        if interfaces.len() < 2 {
            return Err(DoubleError::conflict(
                "an intersection needs at least two interfaces",
            ));
        }

        let introspector = Introspector::new(self.registry);
        let mut resolved: Vec<TargetType> = Vec::with_capacity(interfaces.len());
        for name in interfaces {
            let ty = introspector.describe(name, self.config.defaults.autoload)?;
            if !ty.is_interface() {
                return Err(DoubleError::UnknownType {
                    name: ty.name().to_string(),
                });
            }
            if resolved.iter().any(|r| r.name() == ty.name()) {
                return Err(DoubleError::conflict(format!(
                    "interface {} is listed more than once",
                    ty.name()
                )));
            }
            resolved.push(ty);
        }

        let mut owners: FxHashMap<String, &str> = FxHashMap::default();
        for ty in &resolved {
            for method in ty.methods() {
                if let Some(owner) = owners.insert(method.name.to_ascii_lowercase(), ty.name()) {
                    return Err(DoubleError::conflict(format!(
                        "interfaces {} and {} both declare a method named {}",
                        owner,
                        ty.name(),
                        method.name
                    )));
                }
            }
        }

        resolved.sort_by_key(|t| t.name().to_ascii_lowercase());
        let names: Vec<String> = resolved.iter().map(|t| t.name().to_string()).collect();
        let mut simple_names: Vec<&str> = resolved.iter().map(|t| t.simple_name()).collect();
        simple_names.sort_by_key(|n| n.to_ascii_lowercase());

        self.cache.intersection_or_create(&names, || {
            let name = naming::intersection_name(
                self.registry,
                &self.config.naming.intersection_prefix,
                &simple_names,
            );
            let source = template::render_intersection(&name, &names);
            compiler::compile(self.registry, &source)?;
            Ok(name)
        })
    }
}

