use std::sync::Arc;

use understudy_types::*;

struct ModelLoader;

impl TypeLoader for ModelLoader {
    fn provides(&self, name: &str) -> bool {
        matches!(name.to_ascii_lowercase().as_str(), "app::model" | "app::user")
    }

    fn load(&self, name: &str) -> Option<TypeDecl> {
        match name.to_ascii_lowercase().as_str() {
            "app::model" => Some(
                TypeDecl::class("app::Model")
                    .as_abstract()
                    .with_method(MethodDescriptor::new("save").returns("bool").as_abstract()),
            ),
            "app::user" => Some(
                TypeDecl::class("app::User")
                    .extends("app::Model")
                    .with_method_body(MethodDescriptor::new("save").returns("bool"), |_, _| {
                        Ok(Value::Bool(true))
                    }),
            ),
            _ => None,
        }
    }
}

// ============================================================================
// Registry Tests
// ============================================================================

#[test]
fn test_activation_is_irreversible() {
    let registry = TypeRegistry::new();
    let first = registry.declare(TypeDecl::class("Clock")).unwrap();

    let err = registry
        .declare(TypeDecl::class("clock").as_final())
        .unwrap_err();
    assert_eq!(
        err,
        TypeError::DuplicateType {
            name: "clock".to_string()
        }
    );

    let current = registry.get("CLOCK").unwrap();
    assert!(Arc::ptr_eq(&first, &current));
    assert!(!current.is_final);
}

#[test]
fn test_names_keep_declared_spelling() {
    let registry = TypeRegistry::empty();
    registry.declare(TypeDecl::class("b::Second")).unwrap();
    registry.declare(TypeDecl::class("a::First")).unwrap();
    assert_eq!(registry.names(), vec!["a::First", "b::Second"]);
}

#[test]
fn test_autoload_resolves_ancestors() {
    let registry = TypeRegistry::new().with_loader(ModelLoader);
    let introspector = Introspector::new(&registry);

    assert!(introspector.describe("app::User", false).is_err());

    let user = introspector.describe("app::User", true).unwrap();
    assert!(user.implements("app::Model"));
    assert!(!user.is_abstract());
    assert!(registry.get("app::Model").is_some());
}

#[test]
fn test_loader_names_are_taken_before_loading() {
    let registry = TypeRegistry::new().with_loader(ModelLoader);
    assert!(registry.is_taken("app::user"));
    assert!(registry.get("app::user").is_none());
}

// ============================================================================
// Introspection Tests
// ============================================================================

#[test]
fn test_derived_declaration_shadows_body() {
    let registry = TypeRegistry::new().with_loader(ModelLoader);
    registry
        .declare(
            TypeDecl::class("app::Admin")
                .extends("app::User")
                .as_abstract()
                .with_method(MethodDescriptor::new("save").returns("bool").as_abstract()),
        )
        .unwrap();

    let admin = Introspector::new(&registry).describe("app::Admin", true).unwrap();
    assert!(admin.body("save").is_none());
    assert!(admin.is_abstract());
    assert_eq!(admin.method("save").unwrap().declaring_type, "app::Admin");
}

#[test]
fn test_hooked_properties_are_inherited() {
    let registry = TypeRegistry::new();
    registry
        .declare(
            TypeDecl::class("Post").with_property(
                PropertyDescriptor::new("title")
                    .typed("string")
                    .with_get_hook(HookDescriptor::default())
                    .with_set_hook(HookDescriptor { is_final: true }),
            ),
        )
        .unwrap();
    registry
        .declare(TypeDecl::class("DraftPost").extends("Post"))
        .unwrap();

    let draft = Introspector::new(&registry).describe("DraftPost", false).unwrap();
    let title = draft.property("title").unwrap();
    assert!(title.has_hooks());
    assert!(title.set_hook.unwrap().is_final);
}

#[test]
fn test_iterator_refines_traversable() {
    let registry = TypeRegistry::new();
    let introspector = Introspector::new(&registry);

    assert!(introspector.is_subtype(builtin::ITERATOR, builtin::TRAVERSABLE).unwrap());
    assert!(introspector
        .is_subtype(builtin::ITERATOR_AGGREGATE, builtin::TRAVERSABLE)
        .unwrap());
    assert!(introspector
        .is_subtype(builtin::MOCK_OBJECT, builtin::STUB)
        .unwrap());

    let iterator = introspector.describe(builtin::ITERATOR, false).unwrap();
    let names: Vec<&str> = iterator.methods().iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["current", "key", "next", "rewind", "valid"]);
}
