//! Template parser and renderer.
//!
//! Turns lexer [`Token`]s into a tree of [`Node`]s and renders that tree
//! against a [`Context`]. Besides the handful of built-in tags (`if`, `with`,
//! `include`, `comment`, `load`), every block tag must come from a
//! [`Library`](crate::library::Library) enabled by `{% load %}` earlier in
//! the same template.

use std::collections::HashMap;

use djformtags_core::error::{FormTagsError, FormTagsResult};

use crate::context::{conditional_escape, Context, ContextValue};
use crate::engine::TemplateRenderer;
use crate::filters::default_registry;
use crate::lexer::{Token, TokenKind};
use crate::library::{CompileFn, LibraryRegistry, TagNode};

fn syntax_error(msg: impl Into<String>) -> FormTagsError {
    FormTagsError::TemplateSyntaxError(msg.into())
}

/// Returns the text inside one layer of matching single or double quotes.
pub fn unquote(s: &str) -> Option<&str> {
    let quote = s.chars().next().filter(|c| matches!(c, '"' | '\''))?;
    (s.len() >= 2 && s.ends_with(quote)).then(|| &s[1..s.len() - 1])
}

/// Splits a `key=value` bit. The key must be a bare identifier.
pub fn split_kwarg(bit: &str) -> Option<(&str, &str)> {
    let (key, value) = bit.split_once('=')?;
    let is_ident = !key.is_empty() && key.chars().all(|c| c.is_alphanumeric() || c == '_');
    is_ident.then_some((key, value))
}

/// Finds the first `needle` that is not inside a quoted run.
fn find_unquoted(s: &str, needle: char) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, ch) in s.char_indices() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None if ch == '"' || ch == '\'' => quote = Some(ch),
            None if ch == needle => return Some(i),
            None => {}
        }
    }
    None
}

/// A variable reference or a literal.
#[derive(Debug, Clone)]
pub enum Expression {
    /// A dotted lookup path such as `form.email.label`.
    Variable(String),
    /// A quoted string, number, `True`, `False`, or `None`.
    Literal(ContextValue),
}

impl Expression {
    /// Parses a single expression.
    ///
    /// Quoted strings become safe string literals, as in Django.
    pub fn parse(s: &str) -> FormTagsResult<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(syntax_error("Empty expression"));
        }

        if let Some(inner) = unquote(s) {
            let quote = &s[..1];
            let text = inner.replace(&format!("\\{quote}"), quote).replace("\\\\", "\\");
            return Ok(Self::Literal(ContextValue::SafeString(text)));
        }

        match s {
            "True" => return Ok(Self::Literal(ContextValue::Bool(true))),
            "False" => return Ok(Self::Literal(ContextValue::Bool(false))),
            "None" => return Ok(Self::Literal(ContextValue::None)),
            _ => {}
        }

        if s.starts_with(|c: char| c.is_ascii_digit() || matches!(c, '-' | '+' | '.')) {
            if let Ok(i) = s.parse::<i64>() {
                return Ok(Self::Literal(ContextValue::Integer(i)));
            }
            if let Ok(f) = s.parse::<f64>() {
                return Ok(Self::Literal(ContextValue::Float(f)));
            }
        }

        if s.split('.').any(|part| part.is_empty() || part.starts_with('_')) {
            return Err(syntax_error(format!(
                "Variables and attributes may not be empty or begin with underscores: '{s}'"
            )));
        }
        if s.contains(|c: char| c.is_whitespace() || matches!(c, '"' | '\'')) {
            return Err(syntax_error(format!("Could not parse the remainder: '{s}'")));
        }

        Ok(Self::Variable(s.to_string()))
    }

    /// Resolves against a context; anything missing resolves to `None`.
    pub fn resolve(&self, context: &Context) -> ContextValue {
        match self {
            Self::Variable(path) => context.get(path).unwrap_or(ContextValue::None),
            Self::Literal(value) => value.clone(),
        }
    }

    /// Returns the variable path, if this is a variable.
    pub fn as_variable(&self) -> Option<&str> {
        match self {
            Self::Variable(path) => Some(path),
            Self::Literal(_) => None,
        }
    }
}

/// A filter applied in a variable expression, like `default:"n/a"`.
#[derive(Debug, Clone)]
pub struct FilterCall {
    pub name: String,
    pub arg: Option<Expression>,
}

/// An expression followed by zero or more filters: `field.label|upper`.
#[derive(Debug, Clone)]
pub struct FilterExpression {
    pub expression: Expression,
    pub filters: Vec<FilterCall>,
}

impl FilterExpression {
    /// Parses `expr|filter|filter:arg`. Unknown filters are rejected here,
    /// at parse time.
    pub fn parse(s: &str) -> FormTagsResult<Self> {
        let mut rest = s.trim();
        let mut parts = Vec::new();
        while let Some(i) = find_unquoted(rest, '|') {
            parts.push(&rest[..i]);
            rest = &rest[i + 1..];
        }
        parts.push(rest);

        let expression = Expression::parse(parts[0])?;
        let mut filters = Vec::with_capacity(parts.len() - 1);
        for part in &parts[1..] {
            let part = part.trim();
            let (name, arg) = match find_unquoted(part, ':') {
                Some(i) => (part[..i].trim(), Some(Expression::parse(&part[i + 1..])?)),
                None => (part, None),
            };
            if !default_registry().contains(name) {
                return Err(syntax_error(format!("Invalid filter: '{name}'")));
            }
            filters.push(FilterCall {
                name: name.to_string(),
                arg,
            });
        }

        Ok(Self {
            expression,
            filters,
        })
    }

    /// Resolves the expression and applies the filters in order.
    pub fn resolve(&self, context: &Context) -> FormTagsResult<ContextValue> {
        let mut value = self.expression.resolve(context);
        for filter in &self.filters {
            let args: Vec<ContextValue> = filter
                .arg
                .iter()
                .map(|arg| arg.resolve(context))
                .collect();
            value = default_registry().apply(&filter.name, &value, &args)?;
        }
        Ok(value)
    }
}

/// Comparison operators supported by `{% if %}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
}

/// A condition in an `{% if %}` or `{% elif %}` branch.
#[derive(Debug, Clone)]
pub enum IfCondition {
    Expr(FilterExpression),
    Not(Box<IfCondition>),
    And(Box<IfCondition>, Box<IfCondition>),
    Or(Box<IfCondition>, Box<IfCondition>),
    Compare(FilterExpression, CompareOp, FilterExpression),
    /// The `{% else %}` branch.
    Else,
}

impl IfCondition {
    pub fn evaluate(&self, context: &Context) -> FormTagsResult<bool> {
        Ok(match self {
            Self::Expr(expr) => expr.resolve(context)?.is_truthy(),
            Self::Not(inner) => !inner.evaluate(context)?,
            Self::And(left, right) => left.evaluate(context)? && right.evaluate(context)?,
            Self::Or(left, right) => left.evaluate(context)? || right.evaluate(context)?,
            Self::Compare(left, op, right) => {
                let equal = left.resolve(context)? == right.resolve(context)?;
                match op {
                    CompareOp::Eq => equal,
                    CompareOp::Ne => !equal,
                }
            }
            Self::Else => true,
        })
    }

    /// Parses the bits after `if` / `elif`.
    fn parse(args: &[String]) -> FormTagsResult<Self> {
        if args.is_empty() {
            return Err(syntax_error("'if' statement requires a condition"));
        }
        let mut pos = 0;
        let condition = Self::parse_or(args, &mut pos)?;
        match args.get(pos) {
            Some(extra) => Err(syntax_error(format!(
                "Unused '{extra}' at end of if expression"
            ))),
            None => Ok(condition),
        }
    }

    fn parse_or(args: &[String], pos: &mut usize) -> FormTagsResult<Self> {
        let left = Self::parse_and(args, pos)?;
        if args.get(*pos).is_some_and(|a| a == "or") {
            *pos += 1;
            let right = Self::parse_or(args, pos)?;
            return Ok(Self::Or(Box::new(left), Box::new(right)));
        }
        Ok(left)
    }

    fn parse_and(args: &[String], pos: &mut usize) -> FormTagsResult<Self> {
        let left = Self::parse_not(args, pos)?;
        if args.get(*pos).is_some_and(|a| a == "and") {
            *pos += 1;
            let right = Self::parse_and(args, pos)?;
            return Ok(Self::And(Box::new(left), Box::new(right)));
        }
        Ok(left)
    }

    fn parse_not(args: &[String], pos: &mut usize) -> FormTagsResult<Self> {
        if args.get(*pos).is_some_and(|a| a == "not") {
            *pos += 1;
            return Ok(Self::Not(Box::new(Self::parse_not(args, pos)?)));
        }
        Self::parse_comparison(args, pos)
    }

    fn parse_comparison(args: &[String], pos: &mut usize) -> FormTagsResult<Self> {
        let operand = |pos: &mut usize| -> FormTagsResult<FilterExpression> {
            let bit = args
                .get(*pos)
                .ok_or_else(|| syntax_error("Unexpected end of if expression"))?;
            *pos += 1;
            FilterExpression::parse(bit)
        };

        let left = operand(pos)?;
        let op = match args.get(*pos).map(String::as_str) {
            Some("==") => CompareOp::Eq,
            Some("!=") => CompareOp::Ne,
            _ => return Ok(Self::Expr(left)),
        };
        *pos += 1;
        let right = operand(pos)?;
        Ok(Self::Compare(left, op, right))
    }
}

/// A node in the parsed template tree.
pub enum Node {
    Text(String),
    Variable(FilterExpression),
    If {
        branches: Vec<(IfCondition, Vec<Node>)>,
    },
    With {
        assignments: Vec<(String, FilterExpression)>,
        body: Vec<Node>,
    },
    Include {
        template: FilterExpression,
        extra: Vec<(String, FilterExpression)>,
        only: bool,
    },
    /// A tag compiled by a loaded library.
    Custom {
        name: String,
        node: Box<dyn TagNode>,
    },
}

/// Parses a token stream, tracking which library tags are loaded.
pub struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    libraries: &'a LibraryRegistry,
    tags: HashMap<String, CompileFn>,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token], libraries: &'a LibraryRegistry) -> Self {
        Self {
            tokens,
            pos: 0,
            libraries,
            tags: HashMap::new(),
        }
    }

    /// Parses the whole token stream.
    pub fn parse(mut self) -> FormTagsResult<Vec<Node>> {
        self.parse_nodes(&[])
    }

    /// Parses until one of `end_tags` is reached. The end tag itself is left
    /// for the caller to consume. Running out of tokens while an end tag is
    /// expected is an error.
    fn parse_nodes(&mut self, end_tags: &[&str]) -> FormTagsResult<Vec<Node>> {
        let tokens = self.tokens;
        let mut nodes = Vec::new();

        while let Some(token) = tokens.get(self.pos) {
            match &token.kind {
                TokenKind::Text(text) => {
                    nodes.push(Node::Text(text.clone()));
                    self.pos += 1;
                }
                TokenKind::Comment(_) => self.pos += 1,
                TokenKind::Variable(expr) => {
                    if expr.is_empty() {
                        return Err(syntax_error(format!(
                            "Empty variable tag on line {}",
                            token.lineno
                        )));
                    }
                    nodes.push(Node::Variable(FilterExpression::parse(expr)?));
                    self.pos += 1;
                }
                TokenKind::Block(bits) => {
                    let Some(name) = bits.first() else {
                        return Err(syntax_error(format!(
                            "Empty block tag on line {}",
                            token.lineno
                        )));
                    };
                    if end_tags.contains(&name.as_str()) {
                        return Ok(nodes);
                    }
                    self.pos += 1;
                    if let Some(node) = self.parse_block(name, bits, token.lineno)? {
                        nodes.push(node);
                    }
                }
            }
        }

        if end_tags.is_empty() {
            Ok(nodes)
        } else {
            Err(syntax_error(format!(
                "Unclosed tag: expected one of {}",
                end_tags.join(", ")
            )))
        }
    }

    /// Consumes the end tag `parse_nodes` stopped at and returns its bits.
    fn take_end_tag(&mut self) -> &'a [String] {
        let tokens = self.tokens;
        let bits = match tokens.get(self.pos).map(|t| &t.kind) {
            Some(TokenKind::Block(bits)) => bits.as_slice(),
            _ => &[],
        };
        self.pos += 1;
        bits
    }

    fn parse_block(
        &mut self,
        name: &str,
        bits: &[String],
        lineno: usize,
    ) -> FormTagsResult<Option<Node>> {
        let args = &bits[1..];
        match name {
            "if" => self.parse_if(args).map(Some),
            "with" => self.parse_with(args).map(Some),
            "include" => Self::parse_include(args).map(Some),
            "comment" => {
                self.skip_comment()?;
                Ok(None)
            }
            "load" => {
                self.load(args)?;
                Ok(None)
            }
            _ => {
                let compile = self.tags.get(name).ok_or_else(|| {
                    syntax_error(format!(
                        "Invalid block tag on line {lineno}: '{name}'. \
                         Did you forget to register or load this tag?"
                    ))
                })?;
                tracing::trace!(tag = name, line = lineno, "compiling library tag");
                Ok(Some(Node::Custom {
                    name: name.to_string(),
                    node: compile(bits)?,
                }))
            }
        }
    }

    fn parse_if(&mut self, args: &[String]) -> FormTagsResult<Node> {
        let mut branches = Vec::new();
        let mut condition = IfCondition::parse(args)?;

        loop {
            let body = self.parse_nodes(&["elif", "else", "endif"])?;
            branches.push((condition, body));

            let end = self.take_end_tag();
            match end.first().map(String::as_str) {
                Some("elif") => condition = IfCondition::parse(&end[1..])?,
                Some("else") => {
                    let body = self.parse_nodes(&["endif"])?;
                    self.take_end_tag();
                    branches.push((IfCondition::Else, body));
                    break;
                }
                _ => break,
            }
        }

        Ok(Node::If { branches })
    }

    fn parse_with(&mut self, args: &[String]) -> FormTagsResult<Node> {
        let assignments = if args.len() == 3 && args[1] == "as" {
            vec![(args[2].clone(), FilterExpression::parse(&args[0])?)]
        } else {
            parse_assignments(args)?
        };
        if assignments.is_empty() {
            return Err(syntax_error("'with' expected at least one variable assignment"));
        }

        let body = self.parse_nodes(&["endwith"])?;
        self.take_end_tag();
        Ok(Node::With { assignments, body })
    }

    fn parse_include(args: &[String]) -> FormTagsResult<Node> {
        let (first, rest) = args
            .split_first()
            .ok_or_else(|| syntax_error("'include' tag takes at least one argument"))?;

        let mut extra = Vec::new();
        let mut only = false;
        let mut rest = rest.iter().peekable();
        while let Some(option) = rest.next() {
            match option.as_str() {
                "only" => only = true,
                "with" => {
                    let mut kwargs = Vec::new();
                    while let Some(bit) = rest.next_if(|b| split_kwarg(b).is_some()) {
                        kwargs.push(bit.clone());
                    }
                    extra = parse_assignments(&kwargs)?;
                    if extra.is_empty() {
                        return Err(syntax_error(
                            "'with' in 'include' tag needs at least one keyword argument",
                        ));
                    }
                }
                other => {
                    return Err(syntax_error(format!(
                        "Unknown argument for 'include' tag: '{other}'"
                    )))
                }
            }
        }

        Ok(Node::Include {
            template: FilterExpression::parse(first)?,
            extra,
            only,
        })
    }

    /// Skips everything up to and including `{% endcomment %}`, unparsed.
    fn skip_comment(&mut self) -> FormTagsResult<()> {
        let tokens = self.tokens;
        while let Some(token) = tokens.get(self.pos) {
            self.pos += 1;
            if token.tag_name() == Some("endcomment") {
                return Ok(());
            }
        }
        Err(syntax_error("Unclosed tag: expected endcomment"))
    }

    /// Handles `{% load lib1 lib2 %}` and `{% load tag1 tag2 from lib %}`.
    fn load(&mut self, args: &[String]) -> FormTagsResult<()> {
        if args.is_empty() {
            return Err(syntax_error("'load' statement takes at least one argument"));
        }

        let library = |name: &str| {
            self.libraries.get(name).ok_or_else(|| {
                syntax_error(format!("'{name}' is not a registered tag library"))
            })
        };

        if args.len() >= 3 && args[args.len() - 2] == "from" {
            let lib = library(&args[args.len() - 1])?;
            for tag in &args[..args.len() - 2] {
                let compile = lib.tag(tag).ok_or_else(|| {
                    syntax_error(format!(
                        "'{tag}' is not a valid tag in library '{}'",
                        lib.name()
                    ))
                })?;
                self.tags.insert(tag.clone(), compile);
            }
        } else {
            let libs = args
                .iter()
                .map(|name| library(name))
                .collect::<FormTagsResult<Vec<_>>>()?;
            for lib in libs {
                tracing::trace!(library = lib.name(), "loading tag library");
                for (tag, compile) in lib.tags() {
                    self.tags.insert(tag.to_string(), compile);
                }
            }
        }
        Ok(())
    }
}

/// Parses `key=value` bits into assignments.
fn parse_assignments(bits: &[String]) -> FormTagsResult<Vec<(String, FilterExpression)>> {
    bits.iter()
        .map(|bit| {
            let (key, value) = split_kwarg(bit)
                .ok_or_else(|| syntax_error(format!("Expected key=value, got '{bit}'")))?;
            Ok((key.to_string(), FilterExpression::parse(value)?))
        })
        .collect()
}

/// Renders a node list into a string.
pub fn render_nodes(
    nodes: &[Node],
    context: &mut Context,
    engine: &dyn TemplateRenderer,
) -> FormTagsResult<String> {
    let mut output = String::new();
    for node in nodes {
        output.push_str(&render_node(node, context, engine)?);
    }
    Ok(output)
}

fn render_node(
    node: &Node,
    context: &mut Context,
    engine: &dyn TemplateRenderer,
) -> FormTagsResult<String> {
    match node {
        Node::Text(text) => Ok(text.clone()),
        Node::Variable(expr) => {
            let value = expr.resolve(context)?;
            Ok(conditional_escape(&value, context.auto_escape()))
        }
        Node::If { branches } => {
            for (condition, body) in branches {
                if condition.evaluate(context)? {
                    return render_nodes(body, context, engine);
                }
            }
            Ok(String::new())
        }
        Node::With { assignments, body } => {
            let values = assignments
                .iter()
                .map(|(key, expr)| Ok((key, expr.resolve(context)?)))
                .collect::<FormTagsResult<Vec<_>>>()?;
            context.push();
            for (key, value) in values {
                context.set(key.as_str(), value);
            }
            let result = render_nodes(body, context, engine);
            context.pop();
            result
        }
        Node::Include {
            template,
            extra,
            only,
        } => {
            let name = template.resolve(context)?.to_display_string();
            let values = extra
                .iter()
                .map(|(key, expr)| Ok((key, expr.resolve(context)?)))
                .collect::<FormTagsResult<Vec<_>>>()?;

            if *only {
                let mut isolated = Context::new();
                isolated.set_auto_escape(context.auto_escape());
                for (key, value) in values {
                    isolated.set(key.as_str(), value);
                }
                engine.render_template(&name, &mut isolated)
            } else {
                context.push();
                for (key, value) in values {
                    context.set(key.as_str(), value);
                }
                let result = engine.render_template(&name, context);
                context.pop();
                result
            }
        }
        Node::Custom { name, node } => {
            tracing::trace!(tag = name.as_str(), "rendering library tag");
            node.render(context, engine)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::library::Library;

    fn parse(source: &str) -> FormTagsResult<Vec<Node>> {
        let tokens = tokenize(source);
        Parser::new(&tokens, &LibraryRegistry::new()).parse()
    }

    fn parse_err(source: &str) -> String {
        match parse(source) {
            Ok(_) => panic!("expected a syntax error for {source:?}"),
            Err(e) => e.to_string(),
        }
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("\"a b\""), Some("a b"));
        assert_eq!(unquote("'a'"), Some("a"));
        assert_eq!(unquote("\"a'"), None);
        assert_eq!(unquote("'"), None);
        assert_eq!(unquote("plain"), None);
    }

    #[test]
    fn test_split_kwarg() {
        assert_eq!(split_kwarg("label=\"x=y\""), Some(("label", "\"x=y\"")));
        assert_eq!(split_kwarg("x=1"), Some(("x", "1")));
        assert_eq!(split_kwarg("\"Some arg\""), None);
        assert_eq!(split_kwarg("=1"), None);
        assert_eq!(split_kwarg("a.b=1"), None);
    }

    #[test]
    fn test_expression_literals() {
        let ctx = Context::new();
        let resolve = |s: &str| Expression::parse(s).unwrap().resolve(&ctx);

        assert_eq!(resolve("\"hi\""), ContextValue::from("hi"));
        assert!(resolve("'hi'").is_safe());
        assert_eq!(resolve("42"), ContextValue::Integer(42));
        assert_eq!(resolve("-1.5"), ContextValue::Float(-1.5));
        assert_eq!(resolve("True"), ContextValue::Bool(true));
        assert!(resolve("None").is_none());
        assert_eq!(resolve(r#""say \"hi\"""#), ContextValue::from("say \"hi\""));
    }

    #[test]
    fn test_expression_variable() {
        let mut ctx = Context::new();
        ctx.set("nan", "not a number");
        let expr = Expression::parse("nan").unwrap();
        assert_eq!(expr.as_variable(), Some("nan"));
        assert_eq!(expr.resolve(&ctx), ContextValue::from("not a number"));
        assert!(Expression::parse("missing.path").unwrap().resolve(&ctx).is_none());
    }

    #[test]
    fn test_expression_rejects_bad_names() {
        assert!(Expression::parse("_private").is_err());
        assert!(Expression::parse("form._meta").is_err());
        assert!(Expression::parse("form..x").is_err());
        assert!(Expression::parse("").is_err());
    }

    #[test]
    fn test_filter_expression() {
        let mut ctx = Context::new();
        ctx.set("name", "Email");
        let expr = FilterExpression::parse("name|lower|upper").unwrap();
        assert_eq!(expr.filters.len(), 2);
        assert_eq!(expr.resolve(&ctx).unwrap(), ContextValue::from("EMAIL"));

        let expr = FilterExpression::parse("missing|default:\"a|b:c\"").unwrap();
        assert_eq!(expr.resolve(&ctx).unwrap(), ContextValue::from("a|b:c"));
    }

    #[test]
    fn test_unknown_filter_is_parse_error() {
        let err = FilterExpression::parse("x|bogus").unwrap_err();
        assert_eq!(err.to_string(), "Template syntax error: Invalid filter: 'bogus'");
    }

    #[test]
    fn test_if_condition_parsing() {
        let mut ctx = Context::new();
        ctx.set("a", true);
        ctx.set("b", false);
        ctx.set("kind", "text");
        let eval = |src: &str| {
            let bits: Vec<String> = src.split_whitespace().map(String::from).collect();
            IfCondition::parse(&bits).unwrap().evaluate(&ctx).unwrap()
        };

        assert!(eval("a"));
        assert!(!eval("b"));
        assert!(eval("not b"));
        assert!(eval("a and not b"));
        assert!(eval("b or a"));
        assert!(!eval("b and a"));
        assert!(eval("kind == \"text\""));
        assert!(eval("kind != \"select\""));
        assert!(!eval("missing"));
    }

    #[test]
    fn test_if_condition_errors() {
        assert!(IfCondition::parse(&[]).is_err());
        let bits: Vec<String> = ["a", "==" ].iter().map(ToString::to_string).collect();
        assert!(IfCondition::parse(&bits).is_err());
        let bits: Vec<String> = ["a", "b"].iter().map(ToString::to_string).collect();
        assert!(IfCondition::parse(&bits).is_err());
    }

    #[test]
    fn test_unknown_tag() {
        let msg = parse_err("line\n{% formrow form.field %}");
        assert!(msg.contains("Invalid block tag on line 2: 'formrow'"));
    }

    #[test]
    fn test_unclosed_block() {
        assert!(parse_err("{% if a %}yes").contains("expected one of elif, else, endif"));
        assert!(parse_err("{% with a=1 %}").contains("endwith"));
        assert!(parse_err("{% comment %}never closed").contains("endcomment"));
    }

    #[test]
    fn test_stray_end_tag() {
        assert!(parse_err("{% endif %}").contains("'endif'"));
    }

    #[test]
    fn test_comment_body_is_not_parsed() {
        let nodes = parse("a{% comment %}{% bogus %}{{ x|nope }}{% endcomment %}b").unwrap();
        assert_eq!(nodes.len(), 2);
    }

    #[test]
    fn test_with_forms() {
        let nodes = parse("{% with 'x.html' as field_template %}{% endwith %}").unwrap();
        let Node::With { assignments, .. } = &nodes[0] else {
            panic!("expected a with node");
        };
        assert_eq!(assignments[0].0, "field_template");

        assert!(parse("{% with a=1 b=2 %}{% endwith %}").is_ok());
        assert!(parse_err("{% with %}{% endwith %}").contains("at least one"));
    }

    #[test]
    fn test_include_arguments() {
        assert!(parse("{% include 'a.html' with x=1 y=2 only %}").is_ok());
        assert!(parse_err("{% include %}").contains("at least one argument"));
        assert!(parse_err("{% include 'a.html' with %}").contains("keyword argument"));
        assert!(parse_err("{% include 'a.html' bogus %}").contains("'bogus'"));
    }

    #[test]
    fn test_load_errors() {
        assert!(parse_err("{% load %}").contains("at least one argument"));
        assert!(parse_err("{% load nope %}").contains("'nope' is not a registered tag library"));
    }

    #[test]
    fn test_load_from_enables_only_named_tags() {
        struct Empty;
        impl TagNode for Empty {
            fn render(&self, _: &mut Context, _: &dyn TemplateRenderer) -> FormTagsResult<String> {
                Ok(String::new())
            }
        }
        fn compile(_: &[String]) -> FormTagsResult<Box<dyn TagNode>> {
            Ok(Box::new(Empty))
        }

        let mut lib = Library::new("pair");
        lib.register_tag("one", compile);
        lib.register_tag("two", compile);
        let mut registry = LibraryRegistry::new();
        registry.register(lib);

        let parse_with = |src: &str| {
            let tokens = tokenize(src);
            Parser::new(&tokens, &registry).parse().map(|nodes| nodes.len())
        };

        assert_eq!(parse_with("{% load one from pair %}{% one %}").unwrap(), 1);
        assert!(parse_with("{% load one from pair %}{% two %}").is_err());
        assert!(parse_with("{% load three from pair %}").is_err());
        assert_eq!(parse_with("{% load pair %}{% one %}{% two %}").unwrap(), 2);
        assert!(parse_with("{% one %}{% load pair %}").is_err());
    }
}
