//! Live type registry
//!
//! The registry is the process-wide set of active types. Activation is
//! one-way: a declared name stays declared for the lifetime of the
//! registry and is never replaced. Lookups are ASCII case-insensitive.
//!
//! Types that are not yet active can be supplied on demand by a
//! [`TypeLoader`]; loading only happens when a lookup asks for it.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::decl::TypeDecl;
use crate::error::TypeError;
use crate::ty::{MethodDescriptor, ParameterDescriptor, PropertyDescriptor, Visibility};
use crate::value::Value;

/// Names of the built-in types every registry starts with
pub mod builtin {
    /// Base iteration protocol
    pub const TRAVERSABLE: &str = "Traversable";
    /// External iteration refinement of `Traversable`
    pub const ITERATOR: &str = "Iterator";
    /// Aggregate iteration refinement of `Traversable`
    pub const ITERATOR_AGGREGATE: &str = "IteratorAggregate";
    /// Root of everything that can be thrown
    pub const THROWABLE: &str = "Throwable";
    /// Concrete base exception
    pub const EXCEPTION: &str = "Exception";
    /// Marker implemented by every test stub
    pub const STUB: &str = "understudy::Stub";
    /// Marker implemented by every mock object
    pub const MOCK_OBJECT: &str = "understudy::MockObject";
}

/// Supplies type declarations that are not active yet
pub trait TypeLoader: Send + Sync {
    /// Whether this loader can supply `name`, without loading it
    fn provides(&self, name: &str) -> bool;

    /// Produce the declaration for `name`
    fn load(&self, name: &str) -> Option<TypeDecl>;
}

fn key(name: &str) -> String {
    name.to_ascii_lowercase()
}

/// Process-wide registry of active types
pub struct TypeRegistry {
    types: RwLock<FxHashMap<String, Arc<TypeDecl>>>,
    loader: Option<Box<dyn TypeLoader>>,
}

impl TypeRegistry {
    /// Create a registry holding only the built-in types
    pub fn new() -> Self {
        let registry = Self::empty();
        {
            let mut types = registry.types.write();
            for decl in builtin_types() {
                types.insert(key(&decl.name), Arc::new(decl));
            }
        }
        registry
    }

    /// Create a registry without any types, built-ins included
    pub fn empty() -> Self {
        Self {
            types: RwLock::new(FxHashMap::default()),
            loader: None,
        }
    }

    /// Attach a loader consulted for names that are not active
    pub fn with_loader(mut self, loader: impl TypeLoader + 'static) -> Self {
        self.loader = Some(Box::new(loader));
        self
    }

    /// Activate a type
    ///
    /// Fails with [`TypeError::DuplicateType`] if the name is already
    /// active; the existing type is never replaced.
    pub fn declare(&self, decl: TypeDecl) -> Result<Arc<TypeDecl>, TypeError> {
        let mut declared = self.declare_all(vec![decl])?;
        Ok(declared.remove(0))
    }

    /// Activate several types as one unit
    ///
    /// Every declaration is validated and every name checked before the
    /// first one is inserted, so either all of them become active or none.
    pub fn declare_all(&self, decls: Vec<TypeDecl>) -> Result<Vec<Arc<TypeDecl>>, TypeError> {
        let mut types = self.types.write();

        let mut pending = rustc_hash::FxHashSet::default();
        for decl in &decls {
            decl.validate()?;
            let k = key(&decl.name);
            if types.contains_key(&k) || !pending.insert(k) {
                return Err(TypeError::DuplicateType {
                    name: decl.name.clone(),
                });
            }
        }

        let mut declared = Vec::with_capacity(decls.len());
        for decl in decls {
            debug!(type_name = %decl.name, kind = decl.kind.as_str(), "declared type");
            let decl = Arc::new(decl);
            types.insert(key(&decl.name), Arc::clone(&decl));
            declared.push(decl);
        }
        Ok(declared)
    }

    /// Active type by name, never loading
    pub fn get(&self, name: &str) -> Option<Arc<TypeDecl>> {
        self.types.read().get(&key(name)).cloned()
    }

    /// Type by name, loading it through the loader when `autoload` is set
    pub fn lookup(&self, name: &str, autoload: bool) -> Result<Arc<TypeDecl>, TypeError> {
        if let Some(decl) = self.get(name) {
            return Ok(decl);
        }
        if autoload {
            if let Some(loader) = &self.loader {
                if let Some(decl) = loader.load(name) {
                    if !decl.name.eq_ignore_ascii_case(name) {
                        return Err(TypeError::InvalidDeclaration {
                            name: decl.name,
                            reason: format!("loader returned it for {}", name),
                        });
                    }
                    debug!(type_name = %name, "autoloaded type");
                    return match self.declare(decl) {
                        Ok(decl) => Ok(decl),
                        // Loaded by a nested lookup in the meantime
                        Err(TypeError::DuplicateType { .. }) => self.get(name).ok_or_else(|| {
                            TypeError::UnknownType {
                                name: name.to_string(),
                            }
                        }),
                        Err(e) => Err(e),
                    };
                }
            }
        }
        Err(TypeError::UnknownType {
            name: name.to_string(),
        })
    }

    /// Whether the type exists, loading it when `autoload` is set
    pub fn exists(&self, name: &str, autoload: bool) -> bool {
        self.lookup(name, autoload).is_ok()
    }

    /// Whether the name is active or could be activated by the loader
    ///
    /// This is the authoritative check for handing out new type names:
    /// a name the loader provides would collide as soon as it is loaded.
    pub fn is_taken(&self, name: &str) -> bool {
        self.types.read().contains_key(&key(name))
            || self.loader.as_ref().is_some_and(|l| l.provides(name))
    }

    /// Number of active types
    pub fn len(&self) -> usize {
        self.types.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.read().is_empty()
    }

    /// Declared names of all active types, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.types.read().values().map(|d| d.name.clone()).collect();
        names.sort();
        names
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.len())
            .field("has_loader", &self.loader.is_some())
            .finish()
    }
}

/// Declarations of the built-in types
fn builtin_types() -> Vec<TypeDecl> {
    use builtin::*;

    let traversable = TypeDecl::interface(TRAVERSABLE).as_builtin();

    let iterator = TypeDecl::interface(ITERATOR)
        .implements(TRAVERSABLE)
        .as_builtin()
        .with_method(MethodDescriptor::new("current").returns("mixed"))
        .with_method(MethodDescriptor::new("key").returns("mixed"))
        .with_method(MethodDescriptor::new("next").returns("void"))
        .with_method(MethodDescriptor::new("rewind").returns("void"))
        .with_method(MethodDescriptor::new("valid").returns("bool"));

    let aggregate = TypeDecl::interface(ITERATOR_AGGREGATE)
        .implements(TRAVERSABLE)
        .as_builtin()
        .with_method(MethodDescriptor::new("getIterator").returns(TRAVERSABLE));

    let throwable = TypeDecl::interface(THROWABLE)
        .as_builtin()
        .with_method(MethodDescriptor::new("getMessage").returns("string"))
        .with_method(MethodDescriptor::new("getCode").returns("int"))
        .with_method(MethodDescriptor::new("getPrevious").returns("?Throwable"));

    let exception = TypeDecl::class(EXCEPTION)
        .implements(THROWABLE)
        .as_builtin()
        .with_property(
            PropertyDescriptor::new("message")
                .typed("string")
                .with_visibility(Visibility::Protected)
                .with_default(Value::Str(String::new())),
        )
        .with_property(
            PropertyDescriptor::new("code")
                .typed("int")
                .with_visibility(Visibility::Protected)
                .with_default(Value::Int(0)),
        )
        .with_constructor(
            vec![
                ParameterDescriptor::typed("message", "string")
                    .with_default(Value::Str(String::new())),
                ParameterDescriptor::typed("code", "int").with_default(Value::Int(0)),
            ],
            |obj, args| {
                if let Some(message) = args.first() {
                    obj.set("message", message.clone());
                }
                if let Some(code) = args.get(1) {
                    obj.set("code", code.clone());
                }
                Ok(())
            },
        )
        .with_method_body(
            MethodDescriptor::new("getMessage").returns("string").as_final(),
            |obj, _| Ok(obj.get("message").cloned().unwrap_or_default()),
        )
        .with_method_body(
            MethodDescriptor::new("getCode").returns("int").as_final(),
            |obj, _| Ok(obj.get("code").cloned().unwrap_or(Value::Int(0))),
        )
        .with_method_body(
            MethodDescriptor::new("getPrevious").returns("?Throwable").as_final(),
            |_, _| Ok(Value::Null),
        )
        .with_method_body(
            MethodDescriptor::new("__toString").returns("string"),
            |obj, _| {
                let message = obj.get("message").cloned().unwrap_or_default();
                Ok(Value::Str(format!("{}: {}", obj.type_name(), message)))
            },
        );

    let stub = TypeDecl::interface(STUB).as_builtin();
    let mock = TypeDecl::interface(MOCK_OBJECT).implements(STUB).as_builtin();

    vec![traversable, iterator, aggregate, throwable, exception, stub, mock]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingLoader {
        loads: Arc<AtomicUsize>,
    }

    impl TypeLoader for CountingLoader {
        fn provides(&self, name: &str) -> bool {
            name.eq_ignore_ascii_case("lazy::Widget")
        }

        fn load(&self, name: &str) -> Option<TypeDecl> {
            if !self.provides(name) {
                return None;
            }
            self.loads.fetch_add(1, Ordering::SeqCst);
            Some(TypeDecl::class("lazy::Widget"))
        }
    }

    #[test]
    fn test_builtins_present() {
        let registry = TypeRegistry::new();
        for name in [
            builtin::TRAVERSABLE,
            builtin::ITERATOR,
            builtin::ITERATOR_AGGREGATE,
            builtin::THROWABLE,
            builtin::EXCEPTION,
            builtin::STUB,
            builtin::MOCK_OBJECT,
        ] {
            assert!(registry.get(name).is_some(), "missing builtin {}", name);
        }
        assert!(TypeRegistry::empty().is_empty());
    }

    #[test]
    fn test_declare_is_case_insensitive() {
        let registry = TypeRegistry::empty();
        registry.declare(TypeDecl::class("app::Mailer")).unwrap();

        assert_eq!(registry.get("APP::MAILER").unwrap().name, "app::Mailer");
        assert!(matches!(
            registry.declare(TypeDecl::class("app::mailer")),
            Err(TypeError::DuplicateType { .. })
        ));
    }

    #[test]
    fn test_declare_all_is_atomic() {
        let registry = TypeRegistry::empty();
        registry.declare(TypeDecl::class("Taken")).unwrap();

        let result = registry.declare_all(vec![TypeDecl::class("Fresh"), TypeDecl::class("Taken")]);
        assert!(result.is_err());
        assert!(registry.get("Fresh").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_declare_all_rejects_invalid_declaration() {
        let registry = TypeRegistry::empty();
        let result = registry.declare_all(vec![
            TypeDecl::class("Good"),
            TypeDecl::interface("Bad").extends("Good"),
        ]);
        assert!(matches!(result, Err(TypeError::InvalidDeclaration { .. })));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_autoload_only_when_requested() {
        let loads = Arc::new(AtomicUsize::new(0));
        let registry = TypeRegistry::empty().with_loader(CountingLoader {
            loads: Arc::clone(&loads),
        });

        assert!(!registry.exists("lazy::Widget", false));
        assert_eq!(loads.load(Ordering::SeqCst), 0);
        assert!(registry.is_taken("lazy::Widget"));

        assert!(registry.exists("lazy::Widget", true));
        assert!(registry.exists("lazy::Widget", true));
        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert!(registry.get("lazy::Widget").is_some());
    }

    #[test]
    fn test_unknown_type() {
        let registry = TypeRegistry::new();
        assert_eq!(
            registry.lookup("Nope", true).unwrap_err(),
            TypeError::UnknownType {
                name: "Nope".to_string()
            }
        );
        assert!(!registry.is_taken("Nope"));
    }
}
