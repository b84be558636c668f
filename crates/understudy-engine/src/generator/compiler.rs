//! Declaration compiler
//!
//! Turns rendered declaration text into live types: lex (logos), parse
//! (recursive descent), check every declaration of the unit against the
//! registry, then activate the whole unit at once. Nothing is declared
//! unless the entire unit is valid.

use std::ops::Range;
use std::sync::Arc;

use logos::Logos;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;
use understudy_types::{
    HookDescriptor, Introspector, MethodDescriptor, ParameterDescriptor, PropertyDescriptor,
    TypeDecl, TypeError, TypeKind, TypeRegistry, Value, Visibility,
};

use crate::error::DoubleError;
use crate::generator::naming::is_valid_type_name;
use crate::generator::ClonePolicy;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"([ \t\r\n\f]+|//[^\n]*)")]
enum Token {
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Word(String),

    #[regex(r"\$[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice()[1..].to_string())]
    Variable(String),

    #[regex(r"-?[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Int(i64),

    #[regex(r"-?[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?", parse_float)]
    #[regex(r"-?[0-9]+[eE][+-]?[0-9]+", parse_float)]
    Float(f64),

    #[regex(r#""([^"\\]|\\.)*""#, parse_string)]
    Str(String),

    #[token("::")]
    PathSep,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token("=")]
    Equals,
    #[token("?")]
    Question,
    #[token("|")]
    Pipe,
    #[token("...")]
    Ellipsis,
}

fn parse_float(lex: &mut logos::Lexer<Token>) -> Option<f64> {
    lex.slice().parse().ok()
}

fn parse_string(lex: &mut logos::Lexer<Token>) -> Option<String> {
    let s = lex.slice();
    unescape(&s[1..s.len() - 1])
}

fn unescape(s: &str) -> Option<String> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next()? {
            'n' => result.push('\n'),
            'r' => result.push('\r'),
            't' => result.push('\t'),
            '\\' => result.push('\\'),
            '"' => result.push('"'),
            _ => return None,
        }
    }
    Some(result)
}

/// One declaration of a parsed unit
#[derive(Debug, Clone)]
pub struct ParsedType {
    pub decl: TypeDecl,
    /// Declared clone policy (double classes only)
    pub clone_policy: Option<ClonePolicy>,
}

/// Parse declaration text without touching the registry
pub fn parse(source: &str) -> Result<Vec<ParsedType>, DoubleError> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next() {
        match token {
            Ok(token) => tokens.push((token, lexer.span())),
            Err(()) => {
                return Err(syntax_error(
                    source,
                    lexer.span().start,
                    format!("unexpected input {:?}", lexer.slice()),
                ))
            }
        }
    }

    let mut parser = Parser {
        source,
        tokens,
        pos: 0,
    };
    parser.unit()
}

fn syntax_error(source: &str, offset: usize, message: String) -> DoubleError {
    let line = source[..offset.min(source.len())].matches('\n').count() + 1;
    DoubleError::ReflectionFailure(TypeError::InvalidDeclaration {
        name: "<generated>".to_string(),
        reason: format!("line {}: {}", line, message),
    })
}

struct Parser<'s> {
    source: &'s str,
    tokens: Vec<(Token, Range<usize>)>,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn at_word(&self, word: &str) -> bool {
        matches!(self.peek(), Some(Token::Word(w)) if w == word)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(t, _)| t.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn error(&self, message: impl Into<String>) -> DoubleError {
        let offset = self
            .tokens
            .get(self.pos)
            .map(|(_, span)| span.start)
            .unwrap_or(self.source.len());
        syntax_error(self.source, offset, message.into())
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_word(&mut self, word: &str) -> bool {
        if self.at_word(word) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: Token, what: &str) -> Result<(), DoubleError> {
        if self.eat(&expected) {
            Ok(())
        } else {
            Err(self.error(format!("expected {}", what)))
        }
    }

    fn expect_word(&mut self, word: &str) -> Result<(), DoubleError> {
        if self.eat_word(word) {
            Ok(())
        } else {
            Err(self.error(format!("expected `{}`", word)))
        }
    }

    fn ident(&mut self, what: &str) -> Result<String, DoubleError> {
        match self.peek() {
            Some(Token::Word(_)) => match self.advance() {
                Some(Token::Word(w)) => Ok(w),
                _ => Err(self.error(format!("expected {}", what))),
            },
            _ => Err(self.error(format!("expected {}", what))),
        }
    }

    fn variable(&mut self, what: &str) -> Result<String, DoubleError> {
        match self.peek() {
            Some(Token::Variable(_)) => match self.advance() {
                Some(Token::Variable(name)) => Ok(name),
                _ => Err(self.error(format!("expected {}", what))),
            },
            _ => Err(self.error(format!("expected {}", what))),
        }
    }

    fn path(&mut self) -> Result<String, DoubleError> {
        let mut path = self.ident("type name")?;
        while self.eat(&Token::PathSep) {
            path.push_str("::");
            path.push_str(&self.ident("type name segment")?);
        }
        Ok(path)
    }

    fn path_list(&mut self) -> Result<Vec<String>, DoubleError> {
        let mut paths = vec![self.path()?];
        while self.eat(&Token::Comma) {
            paths.push(self.path()?);
        }
        Ok(paths)
    }

    fn type_expr(&mut self) -> Result<String, DoubleError> {
        let mut ty = String::new();
        if self.eat(&Token::Question) {
            ty.push('?');
        }
        ty.push_str(&self.path()?);
        while self.eat(&Token::Pipe) {
            ty.push('|');
            ty.push_str(&self.path()?);
        }
        Ok(ty)
    }

    fn literal(&mut self) -> Result<Value, DoubleError> {
        match self.advance() {
            Some(Token::Word(w)) if w == "null" => Ok(Value::Null),
            Some(Token::Word(w)) if w == "true" => Ok(Value::Bool(true)),
            Some(Token::Word(w)) if w == "false" => Ok(Value::Bool(false)),
            Some(Token::Int(i)) => Ok(Value::Int(i)),
            Some(Token::Float(x)) => Ok(Value::Float(x)),
            Some(Token::Str(s)) => Ok(Value::Str(s)),
            Some(Token::LBracket) => {
                let mut items = Vec::new();
                if !self.eat(&Token::RBracket) {
                    loop {
                        items.push(self.literal()?);
                        if self.eat(&Token::RBracket) {
                            break;
                        }
                        self.expect(Token::Comma, "`,` or `]`")?;
                    }
                }
                Ok(Value::List(items))
            }
            Some(_) => {
                self.pos -= 1;
                Err(self.error("expected a literal"))
            }
            None => Err(self.error("expected a literal")),
        }
    }

    fn unit(&mut self) -> Result<Vec<ParsedType>, DoubleError> {
        let mut types = Vec::new();
        while self.peek().is_some() {
            types.push(self.declaration()?);
        }
        Ok(types)
    }

    fn declaration(&mut self) -> Result<ParsedType, DoubleError> {
        let readonly = self.eat_word("readonly");
        if self.eat_word("interface") {
            if readonly {
                return Err(self.error("interfaces cannot be readonly"));
            }
            let mut decl = TypeDecl::interface(self.path()?);
            if self.eat_word("extends") {
                for parent in self.path_list()? {
                    decl = decl.implements(parent);
                }
            }
            let mut parsed = ParsedType {
                decl,
                clone_policy: None,
            };
            self.body(&mut parsed)?;
            return Ok(parsed);
        }

        self.expect_word("class")?;
        let mut decl = TypeDecl::class(self.path()?);
        if readonly {
            decl = decl.as_readonly();
        }
        if self.eat_word("extends") {
            decl = decl.extends(self.path()?);
        }
        if self.eat_word("implements") {
            for iface in self.path_list()? {
                decl = decl.implements(iface);
            }
        }
        let mut parsed = ParsedType {
            decl,
            clone_policy: None,
        };
        self.body(&mut parsed)?;
        Ok(parsed)
    }

    fn body(&mut self, parsed: &mut ParsedType) -> Result<(), DoubleError> {
        self.expect(Token::LBrace, "`{`")?;
        while !self.eat(&Token::RBrace) {
            if self.peek().is_none() {
                return Err(self.error("expected `}`"));
            }
            self.member(parsed)?;
        }
        Ok(())
    }

    fn member(&mut self, parsed: &mut ParsedType) -> Result<(), DoubleError> {
        if self.eat_word("clone") {
            if parsed.decl.is_interface() {
                return Err(self.error("interfaces have no clone policy"));
            }
            let policy = self.ident("clone policy")?;
            let policy = ClonePolicy::parse(&policy)
                .ok_or_else(|| self.error(format!("unknown clone policy `{}`", policy)))?;
            if parsed.clone_policy.replace(policy).is_some() {
                return Err(self.error("clone policy declared twice"));
            }
            return self.expect(Token::Semicolon, "`;`");
        }

        if self.eat_word("method") {
            let method = self.method()?;
            let decl = std::mem::replace(&mut parsed.decl, TypeDecl::class(""));
            parsed.decl = decl.with_method(method);
            return Ok(());
        }

        if self.eat_word("hook") {
            let property = self.hook()?;
            let decl = std::mem::replace(&mut parsed.decl, TypeDecl::class(""));
            parsed.decl = decl.with_property(property);
            return Ok(());
        }

        Err(self.error("expected `clone`, `method` or `hook`"))
    }

    fn method(&mut self) -> Result<MethodDescriptor, DoubleError> {
        let visibility = self.ident("visibility")?;
        let visibility = Visibility::parse(&visibility)
            .ok_or_else(|| self.error(format!("unknown visibility `{}`", visibility)))?;
        // `static` is a modifier only when a method name follows it
        let is_static = self.at_word("static")
            && matches!(self.tokens.get(self.pos + 1), Some((Token::Word(_), _)))
            && self.eat_word("static");

        let mut method =
            MethodDescriptor::new(self.ident("method name")?).with_visibility(visibility);
        if is_static {
            method = method.as_static();
        }

        self.expect(Token::LParen, "`(`")?;
        if !self.eat(&Token::RParen) {
            loop {
                method = method.with_param(self.parameter()?);
                if self.eat(&Token::RParen) {
                    break;
                }
                self.expect(Token::Comma, "`,` or `)`")?;
            }
        }
        if self.eat(&Token::Colon) {
            method = method.returns(self.type_expr()?);
        }
        self.expect(Token::Semicolon, "`;`")?;
        Ok(method)
    }

    fn parameter(&mut self) -> Result<ParameterDescriptor, DoubleError> {
        let type_name = match self.peek() {
            Some(Token::Variable(_)) | Some(Token::Ellipsis) => None,
            _ => Some(self.type_expr()?),
        };
        let is_variadic = self.eat(&Token::Ellipsis);
        let name = self.variable("parameter name")?;

        let mut param = ParameterDescriptor::new(name);
        param.type_name = type_name;
        if is_variadic {
            param = param.variadic();
        }
        if self.eat(&Token::Equals) {
            param = param.with_default(self.literal()?);
        }
        Ok(param)
    }

    fn hook(&mut self) -> Result<PropertyDescriptor, DoubleError> {
        let name = self.variable("property name")?;
        let mut property = PropertyDescriptor::new(name);
        if self.eat(&Token::Colon) {
            property = property.typed(self.type_expr()?);
        }
        if self.eat(&Token::Equals) {
            property = property.with_default(self.literal()?);
        }
        if self.eat_word("get") {
            property = property.with_get_hook(HookDescriptor::default());
        }
        if self.eat_word("set") {
            property = property.with_set_hook(HookDescriptor::default());
        }
        if !property.has_hooks() {
            return Err(self.error("expected `get` or `set`"));
        }
        self.expect(Token::Semicolon, "`;`")?;
        Ok(property)
    }
}

/// Types activated from one unit
#[derive(Debug)]
pub struct CompiledUnit {
    pub types: Vec<Arc<TypeDecl>>,
    clone_policies: FxHashMap<String, ClonePolicy>,
}

impl CompiledUnit {
    /// Declaration activated under `name`
    pub fn get(&self, name: &str) -> Option<&Arc<TypeDecl>> {
        self.types.iter().find(|t| t.name.eq_ignore_ascii_case(name))
    }

    /// Clone policy declared by the class `name`
    pub fn clone_policy(&self, name: &str) -> Option<ClonePolicy> {
        self.clone_policies.get(&name.to_ascii_lowercase()).copied()
    }
}

/// Parse, check and activate a unit of declarations
pub fn compile(registry: &TypeRegistry, source: &str) -> Result<CompiledUnit, DoubleError> {
    let unit = parse(source)?;
    check_unit(registry, &unit)?;

    let mut clone_policies = FxHashMap::default();
    let mut decls = Vec::with_capacity(unit.len());
    for parsed in unit {
        if let Some(policy) = parsed.clone_policy {
            clone_policies.insert(parsed.decl.name.to_ascii_lowercase(), policy);
        }
        decls.push(parsed.decl.as_synthetic());
    }

    let types = registry.declare_all(decls).map_err(|err| match err {
        TypeError::DuplicateType { name } => DoubleError::NameConflict { name },
        other => other.into(),
    })?;
    for ty in &types {
        debug!(type_name = %ty.name, "activated generated type");
    }

    Ok(CompiledUnit {
        types,
        clone_policies,
    })
}

/// Shape of a supertype, whether declared earlier in the unit or live
struct Supertype {
    name: String,
    kind: TypeKind,
    is_final: bool,
    is_readonly: bool,
    final_methods: Vec<(String, String)>,
}

fn resolve(
    registry: &TypeRegistry,
    local: &FxHashMap<String, &TypeDecl>,
    name: &str,
) -> Result<Supertype, DoubleError> {
    if let Some(decl) = local.get(&name.to_ascii_lowercase()) {
        return Ok(Supertype {
            name: decl.name.clone(),
            kind: decl.kind,
            is_final: decl.is_final,
            is_readonly: decl.is_readonly,
            final_methods: Vec::new(),
        });
    }

    let ty = Introspector::new(registry).describe(name, false)?;
    Ok(Supertype {
        name: ty.name().to_string(),
        kind: ty.kind(),
        is_final: ty.is_final(),
        is_readonly: ty.is_readonly(),
        final_methods: ty
            .methods()
            .iter()
            .filter(|m| m.is_final())
            .map(|m| (m.name.clone(), m.declaring_type.clone()))
            .collect(),
    })
}

fn check_unit(registry: &TypeRegistry, unit: &[ParsedType]) -> Result<(), DoubleError> {
    let mut local: FxHashMap<String, &TypeDecl> = FxHashMap::default();

    for parsed in unit {
        let decl = &parsed.decl;
        let violation = |reason: String| DoubleError::structural(decl.name.clone(), reason);

        if !is_valid_type_name(&decl.name) {
            return Err(violation("not a valid type name".to_string()));
        }
        let key = decl.name.to_ascii_lowercase();
        if local.contains_key(&key) || registry.is_taken(&decl.name) {
            return Err(DoubleError::NameConflict {
                name: decl.name.clone(),
            });
        }

        let mut seen = FxHashSet::default();
        for method in &decl.methods {
            if !seen.insert(method.name.to_ascii_lowercase()) {
                return Err(violation(format!("method {} is declared twice", method.name)));
            }
        }
        let mut seen = FxHashSet::default();
        for property in &decl.properties {
            if !seen.insert(property.name.as_str()) {
                return Err(violation(format!("hook ${} is declared twice", property.name)));
            }
        }

        if let Some(parent) = &decl.parent {
            let parent = resolve(registry, &local, parent)?;
            match parent.kind {
                TypeKind::Class => {}
                TypeKind::Interface => {
                    return Err(violation(format!("cannot extend interface {}", parent.name)))
                }
                TypeKind::Enum => {
                    return Err(violation(format!("cannot extend enumeration {}", parent.name)))
                }
            }
            if parent.is_final {
                return Err(violation(format!("cannot extend final class {}", parent.name)));
            }
            if parent.is_readonly != decl.is_readonly {
                return Err(violation(format!(
                    "readonly and non-readonly classes cannot extend each other ({})",
                    parent.name
                )));
            }
            for method in &decl.methods {
                if let Some((name, declaring)) =
                    parent.final_methods.iter().find(|(name, _)| method.is_named(name))
                {
                    return Err(violation(format!(
                        "cannot override final method {}::{}()",
                        declaring, name
                    )));
                }
            }
        }

        for iface in &decl.interfaces {
            let iface = resolve(registry, &local, iface)?;
            if iface.kind != TypeKind::Interface {
                return Err(violation(format!("{} is not an interface", iface.name)));
            }
        }

        local.insert(key, decl);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOUBLE: &str = "\
// Generated by understudy. Do not edit.
class Legacy {}

class MockObject_Legacy_0000000a extends Legacy implements understudy::MockObject
{
    clone proxied;
    method public send(
        ?string $to, int $retries = -3, float $ratio = 1.5e-7, ...$rest
    ): bool|null;
    method protected static reset($flags = [1, \"two\", null]);
    hook $title: string get set;
}
";

    #[test]
    fn test_parse_unit() {
        let unit = parse(DOUBLE).unwrap();
        assert_eq!(unit.len(), 2);

        assert_eq!(unit[0].decl.name, "Legacy");
        assert!(unit[0].decl.methods.is_empty());

        let double = &unit[1];
        assert_eq!(double.decl.parent.as_deref(), Some("Legacy"));
        assert_eq!(double.decl.interfaces, vec!["understudy::MockObject"]);
        assert_eq!(double.clone_policy, Some(ClonePolicy::Proxied));

        let send = double.decl.method("send").unwrap();
        assert_eq!(send.parameters.len(), 4);
        assert_eq!(send.parameters[0].type_name.as_deref(), Some("?string"));
        assert_eq!(send.parameters[1].default, Some(Value::Int(-3)));
        assert_eq!(send.parameters[2].default, Some(Value::Float(1.5e-7)));
        assert!(send.parameters[3].is_variadic);
        assert_eq!(send.return_type.as_deref(), Some("bool|null"));

        let reset = double.decl.method("reset").unwrap();
        assert_eq!(reset.visibility, Visibility::Protected);
        assert!(reset.modifiers.is_static);
        assert_eq!(
            reset.parameters[0].default,
            Some(Value::List(vec![Value::Int(1), Value::from("two"), Value::Null]))
        );

        let title = double.decl.property("title").unwrap();
        assert!(title.get_hook.is_some() && title.set_hook.is_some());
    }

    #[test]
    fn test_method_named_static() {
        let source = "\
class Kw {
    method public static(): int;
    method public static static(int $n);
}
";
        let unit = parse(source).unwrap();
        let methods = &unit[0].decl.methods;
        assert_eq!(methods.len(), 2);

        assert_eq!(methods[0].name, "static");
        assert!(!methods[0].modifiers.is_static);
        assert_eq!(methods[0].return_type.as_deref(), Some("int"));

        assert_eq!(methods[1].name, "static");
        assert!(methods[1].modifiers.is_static);
        assert_eq!(methods[1].parameters.len(), 1);
    }

    #[test]
    fn test_hook_default() {
        let unit = parse("class Post {\n    hook $title: string = \"untitled\" get;\n}\n").unwrap();
        let title = unit[0].decl.property("title").unwrap();
        assert_eq!(title.default, Some(Value::from("untitled")));
        assert!(title.get_hook.is_some() && title.set_hook.is_none());

        assert!(parse("class Post { hook $title = get; }").is_err());
    }

    #[test]
    fn test_syntax_errors_report_line() {
        let err = parse("class A {\n    method public f(;\n}\n").unwrap_err();
        match err {
            DoubleError::ReflectionFailure(TypeError::InvalidDeclaration { reason, .. }) => {
                assert!(reason.starts_with("line 2:"), "{}", reason);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(parse("class A { clone sideways; }").is_err());
        assert!(parse("class A { method public f(): int }").is_err());
        assert!(parse("class A { hook $x: int; }").is_err());
        assert!(parse("class A # {}").is_err());
    }

    #[test]
    fn test_compile_activates_whole_unit() {
        let registry = TypeRegistry::new();
        let unit = compile(&registry, DOUBLE).unwrap();

        assert_eq!(unit.types.len(), 2);
        assert!(unit.get("legacy").unwrap().is_synthetic);
        assert_eq!(
            unit.clone_policy("MockObject_Legacy_0000000a"),
            Some(ClonePolicy::Proxied)
        );
        assert!(registry.get("MockObject_Legacy_0000000a").is_some());
    }

    #[test]
    fn test_compile_is_all_or_nothing() {
        let registry = TypeRegistry::new();
        let source =
            "class Fresh {}\nclass Broken extends Missing implements understudy::Stub {}\n";

        assert!(matches!(
            compile(&registry, source),
            Err(DoubleError::UnknownType { ref name }) if name == "Missing"
        ));
        assert!(registry.get("Fresh").is_none());
    }

    #[test]
    fn test_structural_rules() {
        let registry = TypeRegistry::new();
        registry.declare(TypeDecl::class("Sealed").as_final()).unwrap();
        registry.declare(TypeDecl::enumeration("Suit")).unwrap();
        registry.declare(TypeDecl::class("Frozen").as_readonly()).unwrap();
        registry
            .declare(
                TypeDecl::class("Base").with_method(MethodDescriptor::new("locked").as_final()),
            )
            .unwrap();

        for source in [
            "class A extends Sealed {}",
            "class A extends Suit {}",
            "class A extends Traversable {}",
            "class A extends Frozen {}",
            "class A extends Base { method public LOCKED(); }",
            "class A implements Exception {}",
            "class A { method public f(); method public F(); }",
        ] {
            assert!(
                matches!(compile(&registry, source), Err(DoubleError::StructuralViolation { .. })),
                "accepted: {}",
                source
            );
        }
        assert!(registry.get("A").is_none());
    }

    #[test]
    fn test_name_conflict() {
        let registry = TypeRegistry::new();
        assert!(matches!(
            compile(&registry, "class exception {}"),
            Err(DoubleError::NameConflict { .. })
        ));
        assert!(matches!(
            compile(&registry, "class A {}\nclass a {}"),
            Err(DoubleError::NameConflict { .. })
        ));
    }

    #[test]
    fn test_intersection_interface() {
        let registry = TypeRegistry::new();
        let unit = compile(
            &registry,
            "interface Intersection_Iterator_Throwable_00000001 \
             extends Iterator, Throwable\n{\n}\n",
        )
        .unwrap();
        let iface = &unit.types[0];
        assert!(iface.is_interface());
        assert_eq!(iface.interfaces, vec!["Iterator", "Throwable"]);
    }
}
