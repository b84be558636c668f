//! Declaration rendering
//!
//! Doubles are produced as text in a small declaration language and then
//! handed to the [compiler](super::compiler). Rendering is deterministic:
//! identical inputs always yield identical text.
//!
//! ```text
//! // Generated by understudy. Do not edit.
//! class Legacy {}
//!
//! readonly class MockObject_Legacy_0c1d2e3f extends Legacy implements understudy::MockObject
//! {
//!     clone doubled;
//!     method public send(string $to, int $retries = 3, ...$rest): bool;
//!     hook $title: string get set;
//! }
//! ```

use understudy_types::{MethodDescriptor, ParameterDescriptor, Value};

use crate::generator::hooks::PropertyHookDescriptor;
use crate::generator::ClonePolicy;

/// First line of every rendered unit
pub const HEADER: &str = "// Generated by understudy. Do not edit.";

const INDENT: &str = "    ";

/// Everything the declaration of one double is rendered from
#[derive(Debug, Clone)]
pub struct DoubleTemplate<'a> {
    pub name: &'a str,
    pub readonly: bool,
    pub parent: Option<&'a str>,
    pub interfaces: &'a [String],
    /// Engine marker interface, listed last
    pub marker: &'a str,
    pub clone_policy: ClonePolicy,
    pub methods: &'a [MethodDescriptor],
    pub hooks: &'a [PropertyHookDescriptor],
    /// Empty class declared ahead of the double for targets that do not exist
    pub placeholder: Option<&'a str>,
}

impl DoubleTemplate<'_> {
    pub fn render(&self) -> String {
        let mut out = vec![HEADER.to_string()];
        if let Some(placeholder) = self.placeholder {
            out.push(format!("class {} {{}}", placeholder));
        }
        out.push(String::new());

        let mut head = String::new();
        if self.readonly {
            head.push_str("readonly ");
        }
        head.push_str("class ");
        head.push_str(self.name);
        if let Some(parent) = self.parent {
            head.push_str(" extends ");
            head.push_str(parent);
        }
        let mut implemented: Vec<&str> = self.interfaces.iter().map(String::as_str).collect();
        implemented.push(self.marker);
        head.push_str(" implements ");
        head.push_str(&implemented.join(", "));
        out.push(head);

        out.push("{".to_string());
        out.push(format!("{}clone {};", INDENT, self.clone_policy.as_str()));
        for method in self.methods {
            out.push(format!("{}{}", INDENT, render_method(method)));
        }
        for hook in self.hooks {
            out.push(format!("{}{}", INDENT, render_hook(hook)));
        }
        out.push("}".to_string());

        let mut text = out.join("\n");
        text.push('\n');
        text
    }
}

/// Render the synthetic interface extending every one of `interfaces`
pub fn render_intersection(name: &str, interfaces: &[String]) -> String {
    format!(
        "{}\n\ninterface {} extends {}\n{{\n}}\n",
        HEADER,
        name,
        interfaces.join(", ")
    )
}

/// One `method` line, without indentation
pub fn render_method(method: &MethodDescriptor) -> String {
    let mut line = format!("method {} ", method.visibility.as_str());
    if method.modifiers.is_static {
        line.push_str("static ");
    }
    line.push_str(&method.name);
    line.push('(');
    let params: Vec<String> = method.parameters.iter().map(render_parameter).collect();
    line.push_str(&params.join(", "));
    line.push(')');
    if let Some(ret) = &method.return_type {
        line.push_str(": ");
        line.push_str(ret);
    }
    line.push(';');
    line
}

fn render_parameter(param: &ParameterDescriptor) -> String {
    let mut out = String::new();
    if let Some(ty) = &param.type_name {
        out.push_str(ty);
        out.push(' ');
    }
    if param.is_variadic {
        out.push_str("...");
    }
    out.push('$');
    out.push_str(&param.name);
    if let Some(default) = &param.default {
        out.push_str(" = ");
        out.push_str(&render_value(default));
    }
    out
}

fn render_hook(hook: &PropertyHookDescriptor) -> String {
    let mut line = format!("hook ${}", hook.property);
    if let Some(ty) = &hook.type_name {
        line.push_str(": ");
        line.push_str(ty);
    }
    if let Some(default) = &hook.default {
        line.push_str(" = ");
        line.push_str(&render_value(default));
    }
    if hook.has_get_hook {
        line.push_str(" get");
    }
    if hook.has_set_hook {
        line.push_str(" set");
    }
    line.push(';');
    line
}

/// Literal text of a default value
///
/// Non-finite floats and objects have no literal form and render as `null`.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(x) if x.is_finite() => format!("{:?}", x),
        Value::Float(_) => "null".to_string(),
        Value::Str(s) => quote(s),
        Value::List(items) => {
            let items: Vec<String> = items.iter().map(render_value).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(_) => "null".to_string(),
    }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
