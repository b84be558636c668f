//! Generation cache
//!
//! Memoizes generated definitions by a fingerprint of every input that
//! affects the generated declaration. The cache lives as long as the engine
//! that owns it; entries are never evicted because their types can never be
//! deactivated.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::DoubleError;
use crate::generator::GeneratedTypeDefinition;

/// Inputs that determine a generated definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationKey {
    /// Target name, lowercased
    pub type_name: String,
    pub mock_object: bool,
    /// Explicit method list, `None` for every doubleable method
    pub methods: Option<Vec<String>>,
    pub class_name: Option<String>,
    pub call_original_clone: bool,
    pub call_original_methods: bool,
    pub allow_unknown_types: bool,
}

impl GenerationKey {
    /// Hex-encoded SHA-256 of the key's canonical JSON form
    pub fn fingerprint(&self) -> String {
        // Serializing plain strings, bools and lists cannot fail
        let canonical = serde_json::to_vec(self).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(&canonical);
        hex::encode(hasher.finalize())
    }
}

/// Process-scoped store of generated definitions
#[derive(Debug, Default)]
pub struct GenerationCache {
    definitions: Mutex<FxHashMap<String, Arc<GeneratedTypeDefinition>>>,
    /// Sorted, lowercased interface list -> synthetic interface name
    intersections: Mutex<FxHashMap<String, String>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl GenerationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the definition for `key`, creating it on first request
    ///
    /// The lock is held while `create` runs, so concurrent requests for the
    /// same key activate at most one type. A failed `create` caches nothing.
    pub fn get_or_create<F>(
        &self,
        key: &GenerationKey,
        create: F,
    ) -> Result<Arc<GeneratedTypeDefinition>, DoubleError>
    where
        F: FnOnce() -> Result<GeneratedTypeDefinition, DoubleError>,
    {
        let fingerprint = key.fingerprint();
        let mut definitions = self.definitions.lock();

        if let Some(existing) = definitions.get(&fingerprint) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(type_name = %key.type_name, double = %existing.name(), "generation cache hit");
            return Ok(Arc::clone(existing));
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(type_name = %key.type_name, fingerprint = %fingerprint, "generation cache miss");
        let definition = Arc::new(create()?);
        definitions.insert(fingerprint, Arc::clone(&definition));
        Ok(definition)
    }

    /// Return the synthetic interface for a sorted interface list, creating it once
    pub fn intersection_or_create<F>(
        &self,
        interfaces: &[String],
        create: F,
    ) -> Result<String, DoubleError>
    where
        F: FnOnce() -> Result<String, DoubleError>,
    {
        let key = interfaces
            .iter()
            .map(|i| i.to_ascii_lowercase())
            .collect::<Vec<_>>()
            .join(",");
        let mut intersections = self.intersections.lock();
        if let Some(name) = intersections.get(&key) {
            debug!(interface = %name, "intersection cache hit");
            return Ok(name.clone());
        }
        let name = create()?;
        intersections.insert(key, name.clone());
        Ok(name)
    }

    pub fn contains(&self, key: &GenerationKey) -> bool {
        self.definitions.lock().contains_key(&key.fingerprint())
    }

    /// Number of cached definitions
    pub fn len(&self) -> usize {
        self.definitions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.lock().is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}
