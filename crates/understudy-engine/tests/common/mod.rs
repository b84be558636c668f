#![allow(dead_code)]

use std::sync::Arc;

use understudy_engine::DoubleEngine;
use understudy_types::{
    builtin, HookDescriptor, MethodDescriptor, ParameterDescriptor, PropertyDescriptor, TypeDecl,
    TypeLoader, TypeRegistry, Value,
};

/// Loads `app::Lazy` on demand
pub struct LazyLoader;

impl TypeLoader for LazyLoader {
    fn provides(&self, name: &str) -> bool {
        name.eq_ignore_ascii_case("app::Lazy")
    }

    fn load(&self, name: &str) -> Option<TypeDecl> {
        self.provides(name).then(|| {
            TypeDecl::class("app::Lazy").with_method_body(
                MethodDescriptor::new("wake").returns("string"),
                |_, _| Ok(Value::from("awake")),
            )
        })
    }
}

/// Registry with the types the tests double
pub fn registry() -> TypeRegistry {
    let registry = TypeRegistry::new().with_loader(LazyLoader);

    registry
        .declare(
            TypeDecl::interface("app::Mailer")
                .with_method(
                    MethodDescriptor::new("send")
                        .with_param(ParameterDescriptor::typed("to", "string"))
                        .with_param(
                            ParameterDescriptor::typed("subject", "string")
                                .with_default(Value::from("hi")),
                        )
                        .returns("bool"),
                )
                .with_method(MethodDescriptor::new("queueSize").returns("int")),
        )
        .unwrap();

    registry
        .declare(
            TypeDecl::class("app::SmtpMailer")
                .implements("app::Mailer")
                .with_property(
                    PropertyDescriptor::new("sent").typed("int").with_default(Value::Int(0)),
                )
                .with_property(
                    PropertyDescriptor::new("subject")
                        .typed("string")
                        .with_get_hook(HookDescriptor::default())
                        .with_set_hook(HookDescriptor::default()),
                )
                .with_constructor(
                    vec![ParameterDescriptor::typed("host", "string")
                        .with_default(Value::from("localhost"))],
                    |obj, args| {
                        obj.set("host", args[0].clone());
                        Ok(())
                    },
                )
                .with_method_body(
                    MethodDescriptor::new("send")
                        .with_param(ParameterDescriptor::typed("to", "string"))
                        .with_param(
                            ParameterDescriptor::typed("subject", "string")
                                .with_default(Value::from("hi")),
                        )
                        .returns("bool"),
                    |obj, _| {
                        let sent = obj.get("sent").and_then(Value::as_int).unwrap_or(0);
                        obj.set("sent", Value::Int(sent + 1));
                        Ok(Value::Bool(true))
                    },
                )
                .with_method_body(MethodDescriptor::new("queueSize").returns("int"), |obj, _| {
                    Ok(obj.get("sent").cloned().unwrap_or(Value::Int(0)))
                })
                .with_method_body(MethodDescriptor::new("host").returns("?string"), |obj, _| {
                    Ok(obj.get("host").cloned().unwrap_or_default())
                })
                .with_method_body(
                    MethodDescriptor::new("transport").returns("string").as_final(),
                    |_, _| Ok(Value::from("smtp")),
                )
                .with_method_body(MethodDescriptor::new("connect").private(), |_, _| {
                    Ok(Value::Null)
                })
                .with_method_body(MethodDescriptor::new("__clone"), |obj, _| {
                    obj.set("cloned", Value::Bool(true));
                    Ok(Value::Null)
                }),
        )
        .unwrap();

    registry
        .declare(
            TypeDecl::class("app::Legacy")
                .with_method(MethodDescriptor::new("method"))
                .with_method(MethodDescriptor::new("expects"))
                .with_method(MethodDescriptor::new("run").returns("?string"))
                .with_method(MethodDescriptor::new("report").returns("app::Mailer"))
                .with_method(MethodDescriptor::new("unfinished").returns("int")),
        )
        .unwrap();

    registry
        .declare(TypeDecl::class("app::Money").as_final())
        .unwrap();
    registry.declare(TypeDecl::enumeration("app::Suit")).unwrap();
    registry
        .declare(
            TypeDecl::class("app::Point")
                .as_readonly()
                .with_method(MethodDescriptor::new("x").returns("int")),
        )
        .unwrap();

    registry
        .declare(
            TypeDecl::interface("app::Countable")
                .with_method(MethodDescriptor::new("count").returns("int")),
        )
        .unwrap();
    registry
        .declare(
            TypeDecl::interface("app::Sized")
                .with_method(MethodDescriptor::new("count").returns("int")),
        )
        .unwrap();
    registry
        .declare(
            TypeDecl::interface("app::Named")
                .with_method(MethodDescriptor::new("name").returns("string")),
        )
        .unwrap();
    registry
        .declare(
            TypeDecl::interface("app::Feed")
                .implements(builtin::TRAVERSABLE)
                .with_method(MethodDescriptor::new("title").returns("string")),
        )
        .unwrap();
    registry
        .declare(
            TypeDecl::interface("app::DomainError")
                .implements(builtin::THROWABLE)
                .with_method(MethodDescriptor::new("context").returns("array")),
        )
        .unwrap();
    registry
        .declare(TypeDecl::class("app::ConcreteList").implements("app::Countable"))
        .unwrap();
    registry
        .declare(
            TypeDecl::class("app::Kw")
                .with_method(MethodDescriptor::new("static").returns("int"))
                .with_method(MethodDescriptor::new("list").returns("array")),
        )
        .unwrap();
    registry
        .declare(
            TypeDecl::class("app::Post")
                .with_property(
                    PropertyDescriptor::new("title")
                        .typed("string")
                        .with_default(Value::from("untitled"))
                        .with_get_hook(HookDescriptor::default()),
                )
                .with_method_body(
                    MethodDescriptor::new("heading").returns("string").as_final(),
                    |obj, _| Ok(obj.get("title").cloned().unwrap_or_default()),
                ),
        )
        .unwrap();
    registry
        .declare(TypeDecl::interface("z::Alpha").with_method(MethodDescriptor::new("alpha")))
        .unwrap();
    registry
        .declare(TypeDecl::interface("a::Beta").with_method(MethodDescriptor::new("beta")))
        .unwrap();

    registry
}

pub fn engine() -> DoubleEngine {
    DoubleEngine::new(Arc::new(registry()))
}
