//! Document parser for Lumen.
//!
//! Parses a stream of source-level tokens (from `lumen-lexer`) into a list
//! of top-level AST nodes. Top-level parsing dispatches on the leading
//! keyword; block structure comes from the lexer's Indent/Dedent markers;
//! a shared block routine has one specialization for declaration/statement
//! children and one for UI-element children, because the two contexts allow
//! different keyword sets at the same nesting level.
//!
//! Inline-property lists are read as `key` / `key=value` pairs until a stop
//! set; constructs that may be followed by an action (`button ... -> ...`)
//! add the arrow to their stop set via a per-call-site configuration value.
//!
//! Expression parsing lives in [`crate::expr`].

use crate::ast::{
    is_widget, ChartSeries, ConfigBlock, ConfigEntry, Decl, Domain, Element, ElementKind,
    Endpoint, Expr, FnDecl, FormField, FormSubmit, Item, LayoutDirection, Loc, Model, ModelField,
    NavItem, Node, Param, Property, Route, Scope, Stmt, StmtBlock, StmtKind, StoreField,
    TableColumn,
};
use crate::ParseError;
use lumen_lexer::{Scanner, Token, TokenKind, KEYWORDS};

/// Stop set for inline-property parsing. Every property list stops at
/// `:`, newline, indent, dedent, and end of input; constructs followed by
/// an action additionally stop at `->`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct StopSet {
    pub arrow: bool,
}

pub(crate) const STOP_DEFAULT: StopSet = StopSet { arrow: false };
pub(crate) const STOP_AT_ARROW: StopSet = StopSet { arrow: true };

/// Config-style top-level keywords that take an identifier name
/// (`queue emails:`, `env production:`).
const CONFIG_IDENT_NAMED: &[&str] = &[
    "automation", "env", "queue", "migrate", "seed", "mock", "fixture", "locale",
];

/// Config-style top-level keywords that take a string name
/// (`webhook "/stripe":`, `e2e "checkout flow":`).
const CONFIG_STRING_NAMED: &[&str] = &["webhook", "e2e"];

/// Config-style top-level keywords that take no name.
const CONFIG_BARE: &[&str] = &[
    "auth", "roles", "dev", "deploy", "docker", "ci", "cdn", "monitor", "backup", "cache",
    "storage", "i18n", "rtl",
];

/// Declaration keywords that are illegal in statement position; matching
/// them early yields a pointed message instead of an expression error.
const DECL_ONLY_KEYWORDS: &[&str] = &[
    "state", "derived", "prop", "store", "api", "fn", "watch", "check", "style", "on",
];

/// Lumen document parser.
///
/// Converts a flat token stream from the lexer into a list of top-level
/// AST nodes using recursive descent. Fails fast on the first structural
/// mismatch; every error carries the expected and actual token plus the
/// exact source position.
pub struct Parser {
    pub(crate) tokens: Vec<Token>,
    pub(crate) pos: usize,
}

impl Parser {
    /// Create a new parser for the given tokens.
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    /// Parse source code into top-level AST nodes.
    pub fn parse(source: &str) -> Result<Vec<Node>, ParseError> {
        let tokens = Scanner::tokenize(source).map_err(|e| ParseError {
            message: e.message,
            line: e.line,
            column: e.column,
        })?;

        Parser::new(tokens).parse_program()
    }

    /// Parse a full source unit.
    pub fn parse_program(&mut self) -> Result<Vec<Node>, ParseError> {
        let mut nodes = Vec::new();

        while !self.is_at_end() {
            self.skip_newlines();
            if self.is_at_end() {
                break;
            }

            match &self.peek().kind {
                TokenKind::Comment(text) => {
                    let text = text.clone();
                    self.advance();
                    nodes.push(Node::Comment(text));
                }
                TokenKind::Keyword(k) => {
                    let k = k.clone();
                    nodes.push(self.parse_top_level(&k)?);
                }
                TokenKind::Identifier(word) => {
                    let word = word.clone();
                    return Err(self.error(format!(
                        "Unknown top-level declaration '{word}'{}",
                        lumen_diagnostics::suggestion_suffix(&word, KEYWORDS)
                    )));
                }
                _ => return Err(self.expected("a top-level declaration")),
            }
        }

        Ok(nodes)
    }

    /// Dispatch one top-level declaration on its leading keyword.
    fn parse_top_level(&mut self, keyword: &str) -> Result<Node, ParseError> {
        match keyword {
            "app" => self.parse_scope_decl(ScopeKind::App),
            "page" => self.parse_scope_decl(ScopeKind::Page),
            "component" => self.parse_scope_decl(ScopeKind::Component),
            "model" => self.parse_model(),
            "route" => self.parse_route(),
            "domain" => self.parse_domain(),
            "endpoint" => self.parse_endpoint(),
            "middleware" => self.parse_named_stmt_block(Node::Middleware),
            "cron" => self.parse_string_stmt_block(Node::Cron),
            "test" => self.parse_string_stmt_block(Node::Test),
            k if CONFIG_BARE.contains(&k)
                || CONFIG_IDENT_NAMED.contains(&k)
                || CONFIG_STRING_NAMED.contains(&k) =>
            {
                self.parse_config(k.to_string())
            }
            k => Err(self.error(format!(
                "'{k}' is not allowed at the top level{}",
                lumen_diagnostics::suggestion_suffix(k, KEYWORDS)
            ))),
        }
    }

    // =========================================================================
    // Pages, apps, components
    // =========================================================================

    fn parse_scope_decl(&mut self, kind: ScopeKind) -> Result<Node, ParseError> {
        let loc = self.loc();
        self.advance(); // consume `app` / `page` / `component`

        let name = self.expect_identifier()?;

        let path = if matches!(kind, ScopeKind::Page) && self.peek().is_keyword("at") {
            self.advance();
            Some(self.expect_string()?)
        } else {
            None
        };

        let params = if matches!(kind, ScopeKind::Component)
            && matches!(self.peek().kind, TokenKind::LParen)
        {
            self.parse_params()?
        } else {
            Vec::new()
        };

        self.expect_colon()?;
        let body = self.parse_block(|p| p.parse_body_item())?;

        let scope = Scope {
            name,
            path,
            params,
            body,
            loc,
        };

        Ok(match kind {
            ScopeKind::App => Node::App(scope),
            ScopeKind::Page => Node::Page(scope),
            ScopeKind::Component => Node::Component(scope),
        })
    }

    /// Parse a parenthesized parameter list: `(name: type = default, ...)`.
    fn parse_params(&mut self) -> Result<Vec<Param>, ParseError> {
        self.advance(); // consume `(`
        let mut params = Vec::new();

        while !matches!(self.peek().kind, TokenKind::RParen) {
            let name = self.expect_identifier()?;

            let ty = if matches!(self.peek().kind, TokenKind::Colon) {
                self.advance();
                Some(self.parse_type()?)
            } else {
                None
            };

            let default = if self.peek().is_operator("=") {
                self.advance();
                Some(self.parse_expression()?)
            } else {
                None
            };

            params.push(Param { name, ty, default });

            match &self.peek().kind {
                TokenKind::Comma => self.advance(),
                TokenKind::RParen => break,
                _ => return Err(self.expected("',' or ')' in parameter list")),
            }
        }

        self.advance(); // consume `)`
        Ok(params)
    }

    /// Parse one item of a page/app/component body: a declaration, a UI
    /// element, or a comment.
    fn parse_body_item(&mut self) -> Result<Option<Item>, ParseError> {
        match &self.peek().kind {
            TokenKind::Comment(text) => {
                let text = text.clone();
                self.advance();
                Ok(Some(Item::Comment(text)))
            }
            TokenKind::Keyword(k) => match k.as_str() {
                "state" => self.parse_state().map(|d| Some(Item::Decl(d))),
                "derived" => self.parse_derived().map(|d| Some(Item::Decl(d))),
                "prop" => self.parse_prop().map(|d| Some(Item::Decl(d))),
                "type" => self.parse_type_alias().map(|d| Some(Item::Decl(d))),
                "store" => self.parse_store().map(|d| Some(Item::Decl(d))),
                "api" => self.parse_api().map(|d| Some(Item::Decl(d))),
                "fn" => self.parse_fn().map(|d| Some(Item::Decl(d))),
                "on" => self.parse_lifecycle().map(|d| Some(Item::Decl(d))),
                "watch" => self.parse_watch().map(|d| Some(Item::Decl(d))),
                "check" => self.parse_check().map(|d| Some(Item::Decl(d))),
                "style" => self.parse_style().map(|d| Some(Item::Decl(d))),
                "layout" | "text" | "button" | "input" | "image" | "link" | "toggle"
                | "select" | "if" | "elif" | "else" | "for" | "show" | "hide" => {
                    self.parse_element().map(|e| Some(Item::Element(e)))
                }
                k => {
                    let k = k.to_string();
                    Err(self.error(format!(
                        "'{k}' is not allowed inside a page or component body{}",
                        lumen_diagnostics::suggestion_suffix(&k, KEYWORDS)
                    )))
                }
            },
            TokenKind::Identifier(w) => {
                if is_widget(w) || w.chars().next().map(|c| c.is_uppercase()) == Some(true) {
                    self.parse_element().map(|e| Some(Item::Element(e)))
                } else {
                    let w = w.clone();
                    let candidates: Vec<&str> = KEYWORDS
                        .iter()
                        .chain(crate::ast::WIDGETS.iter())
                        .copied()
                        .collect();
                    Err(self.error(format!(
                        "Unknown element or declaration '{w}'{}",
                        lumen_diagnostics::suggestion_suffix(&w, &candidates)
                    )))
                }
            }
            _ => Err(self.brace_hint(self.expected("a declaration or element"))),
        }
    }

    // =========================================================================
    // Body declarations
    // =========================================================================

    /// `state name: type = expr`
    fn parse_state(&mut self) -> Result<Decl, ParseError> {
        let loc = self.loc();
        self.advance(); // consume `state`

        let name = self.expect_identifier()?;
        let ty = self.parse_optional_annotation()?;
        self.expect_operator("=")?;
        let value = self.parse_expression()?;
        self.expect_line_end()?;

        Ok(Decl::State {
            name,
            ty,
            value,
            loc,
        })
    }

    /// `derived name = expr`
    fn parse_derived(&mut self) -> Result<Decl, ParseError> {
        let loc = self.loc();
        self.advance(); // consume `derived`

        let name = self.expect_identifier()?;
        let ty = self.parse_optional_annotation()?;
        self.expect_operator("=")?;
        let expr = self.parse_expression()?;
        self.expect_line_end()?;

        Ok(Decl::Derived { name, ty, expr, loc })
    }

    /// `prop name: type = default`
    fn parse_prop(&mut self) -> Result<Decl, ParseError> {
        let loc = self.loc();
        self.advance(); // consume `prop`

        let name = self.expect_identifier()?;
        self.expect_colon()?;
        let ty = self.parse_type()?;

        let default = if self.peek().is_operator("=") {
            self.advance();
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.expect_line_end()?;

        Ok(Decl::Prop {
            name,
            ty,
            default,
            loc,
        })
    }

    /// `type Name = type-expr`
    fn parse_type_alias(&mut self) -> Result<Decl, ParseError> {
        let loc = self.loc();
        self.advance(); // consume `type`

        let name = self.expect_identifier()?;
        self.expect_operator("=")?;
        let ty = self.parse_type()?;
        self.expect_line_end()?;

        Ok(Decl::TypeAlias { name, ty, loc })
    }

    /// `store Name:` with `name: type = expr` field lines.
    fn parse_store(&mut self) -> Result<Decl, ParseError> {
        let loc = self.loc();
        self.advance(); // consume `store`

        let name = self.expect_identifier()?;
        self.expect_colon()?;

        let fields = self.parse_block(|p| {
            if p.skip_comment() {
                return Ok(None);
            }
            let loc = p.loc();
            let name = p.expect_identifier()?;
            let ty = p.parse_optional_annotation()?;
            p.expect_operator("=")?;
            let value = p.parse_expression()?;
            p.expect_line_end()?;
            Ok(Some(StoreField {
                name,
                ty,
                value,
                loc,
            }))
        })?;

        Ok(Decl::Store { name, fields, loc })
    }

    /// `api name:` with config entries.
    fn parse_api(&mut self) -> Result<Decl, ParseError> {
        let loc = self.loc();
        self.advance(); // consume `api`

        let name = self.expect_identifier()?;
        self.expect_colon()?;
        let entries = self.parse_config_entries()?;

        Ok(Decl::Api { name, entries, loc })
    }

    /// `fn name(params) -> type:` with a statement body.
    fn parse_fn(&mut self) -> Result<Decl, ParseError> {
        let loc = self.loc();
        self.advance(); // consume `fn`

        let name = self.expect_identifier()?;

        if !matches!(self.peek().kind, TokenKind::LParen) {
            return Err(self.expected("'(' after function name"));
        }
        let params = self.parse_params()?;

        let ret = if self.peek().is_operator("->") {
            self.advance();
            Some(self.parse_type()?)
        } else {
            None
        };

        self.expect_colon()?;
        let body = self.parse_stmt_body()?;

        Ok(Decl::Function(FnDecl {
            name,
            params,
            ret,
            body,
            loc,
        }))
    }

    /// `on mount:` / `on destroy:` lifecycle hooks.
    fn parse_lifecycle(&mut self) -> Result<Decl, ParseError> {
        let loc = self.loc();
        self.advance(); // consume `on`

        let hook = match self.peek().word() {
            Some("mount") => true,
            Some("destroy") => false,
            _ => return Err(self.expected("'mount' or 'destroy' after 'on'")),
        };
        self.advance();

        self.expect_colon()?;
        let body = self.parse_stmt_body()?;

        Ok(if hook {
            Decl::OnMount { body, loc }
        } else {
            Decl::OnDestroy { body, loc }
        })
    }

    /// `watch name:` with a statement body.
    fn parse_watch(&mut self) -> Result<Decl, ParseError> {
        let loc = self.loc();
        self.advance(); // consume `watch`

        let target = self.expect_identifier()?;
        self.expect_colon()?;
        let body = self.parse_stmt_body()?;

        Ok(Decl::Watch { target, body, loc })
    }

    /// `check expr` one-line assertion.
    fn parse_check(&mut self) -> Result<Decl, ParseError> {
        let loc = self.loc();
        self.advance(); // consume `check`

        let condition = self.parse_expression()?;
        self.expect_line_end()?;

        Ok(Decl::Check { condition, loc })
    }

    /// `style:` with config entries (values may be color literals).
    fn parse_style(&mut self) -> Result<Decl, ParseError> {
        let loc = self.loc();
        self.advance(); // consume `style`
        self.expect_colon()?;
        let entries = self.parse_config_entries()?;
        Ok(Decl::Style { entries, loc })
    }

    // =========================================================================
    // Top-level backend declarations
    // =========================================================================

    /// `model Name:` with `field: type = default` lines.
    fn parse_model(&mut self) -> Result<Node, ParseError> {
        let loc = self.loc();
        self.advance(); // consume `model`

        let name = self.expect_identifier()?;
        self.expect_colon()?;

        let fields = self.parse_block(|p| {
            if p.skip_comment() {
                return Ok(None);
            }
            let loc = p.loc();
            let name = p.expect_identifier()?;
            p.expect_colon()?;
            let ty = p.parse_type()?;
            let default = if p.peek().is_operator("=") {
                p.advance();
                Some(p.parse_expression()?)
            } else {
                None
            };
            p.expect_line_end()?;
            Ok(Some(ModelField {
                name,
                ty,
                default,
                loc,
            }))
        })?;

        Ok(Node::Model(Model { name, fields, loc }))
    }

    /// `route "/path" -> PageName`
    fn parse_route(&mut self) -> Result<Node, ParseError> {
        let loc = self.loc();
        self.advance(); // consume `route`

        let path = self.expect_string()?;
        self.expect_operator("->")?;
        let target = self.expect_identifier()?;
        self.expect_line_end()?;

        Ok(Node::Route(Route { path, target, loc }))
    }

    /// `domain "example.com"`
    fn parse_domain(&mut self) -> Result<Node, ParseError> {
        let loc = self.loc();
        self.advance(); // consume `domain`

        let name = self.expect_string()?;
        self.expect_line_end()?;

        Ok(Node::Domain(Domain { name, loc }))
    }

    /// `endpoint METHOD "/path":` with a statement body.
    fn parse_endpoint(&mut self) -> Result<Node, ParseError> {
        let loc = self.loc();
        self.advance(); // consume `endpoint`

        let method = match &self.peek().kind {
            TokenKind::HttpMethod(m) => {
                let m = m.clone();
                self.advance();
                m
            }
            _ => return Err(self.expected("an HTTP method (GET, POST, PUT, DELETE, PATCH)")),
        };

        let path = self.expect_string()?;
        self.expect_colon()?;
        let body = self.parse_stmt_body()?;

        Ok(Node::Endpoint(Endpoint {
            method,
            path,
            body,
            loc,
        }))
    }

    /// Identifier-named statement block: `middleware require_auth:`.
    fn parse_named_stmt_block(
        &mut self,
        build: fn(StmtBlock) -> Node,
    ) -> Result<Node, ParseError> {
        let loc = self.loc();
        self.advance(); // consume keyword

        let name = self.expect_identifier()?;
        self.expect_colon()?;
        let body = self.parse_stmt_body()?;

        Ok(build(StmtBlock { name, body, loc }))
    }

    /// String-named statement block: `cron "0 * * * *":`, `test "name":`.
    fn parse_string_stmt_block(
        &mut self,
        build: fn(StmtBlock) -> Node,
    ) -> Result<Node, ParseError> {
        let loc = self.loc();
        self.advance(); // consume keyword

        let name = self.expect_string()?;
        self.expect_colon()?;
        let body = self.parse_stmt_body()?;

        Ok(build(StmtBlock { name, body, loc }))
    }

    /// Config-style declaration: keyword, optional name, entries block.
    fn parse_config(&mut self, kind: String) -> Result<Node, ParseError> {
        let loc = self.loc();
        self.advance(); // consume the config keyword

        let name = if CONFIG_IDENT_NAMED.contains(&kind.as_str()) {
            Some(self.expect_identifier()?)
        } else if CONFIG_STRING_NAMED.contains(&kind.as_str()) {
            Some(self.expect_string()?)
        } else {
            None
        };

        self.expect_colon()?;
        let entries = self.parse_config_entries()?;

        Ok(Node::Config(ConfigBlock {
            kind,
            name,
            entries,
            loc,
        }))
    }

    /// Parse a block of `key: value` / bare-flag entries. Keys may be
    /// identifiers, keywords used as plain words, or at-keywords
    /// (`@mobile: ...`).
    fn parse_config_entries(&mut self) -> Result<Vec<ConfigEntry>, ParseError> {
        self.parse_block(|p| {
            if p.skip_comment() {
                return Ok(None);
            }
            let loc = p.loc();
            let key = match &p.peek().kind {
                TokenKind::Identifier(w) | TokenKind::Keyword(w) => {
                    let w = w.clone();
                    p.advance();
                    w
                }
                TokenKind::AtKeyword(a) => {
                    let key = format!("@{a}");
                    p.advance();
                    key
                }
                _ => return Err(p.expected("a configuration key")),
            };

            let value = if matches!(p.peek().kind, TokenKind::Colon) {
                p.advance();
                Some(p.parse_expression()?)
            } else {
                None
            };
            p.expect_line_end()?;

            Ok(Some(ConfigEntry { key, value, loc }))
        })
    }

    // =========================================================================
    // Statements
    // =========================================================================

    /// Parse an indented statement body (after the `:` has been consumed).
    pub(crate) fn parse_stmt_body(&mut self) -> Result<Vec<Stmt>, ParseError> {
        self.parse_block(|p| p.parse_stmt_item())
    }

    fn parse_stmt_item(&mut self) -> Result<Option<Stmt>, ParseError> {
        if self.skip_comment() {
            return Ok(None);
        }

        let loc = self.loc();
        match &self.peek().kind {
            TokenKind::Keyword(k) => match k.as_str() {
                "let" => {
                    self.advance();
                    let name = self.expect_identifier()?;
                    let ty = self.parse_optional_annotation()?;
                    self.expect_operator("=")?;
                    let value = self.parse_expression()?;
                    self.expect_line_end()?;
                    Ok(Some(Stmt {
                        kind: StmtKind::Let { name, ty, value },
                        loc,
                    }))
                }
                "return" => {
                    self.advance();
                    let value = if self.at_line_end() {
                        None
                    } else {
                        Some(self.parse_expression()?)
                    };
                    self.expect_line_end()?;
                    Ok(Some(Stmt {
                        kind: StmtKind::Return(value),
                        loc,
                    }))
                }
                "if" => {
                    let (arms, else_body) =
                        self.parse_conditional(|p| p.parse_stmt_body())?;
                    Ok(Some(Stmt {
                        kind: StmtKind::If { arms, else_body },
                        loc,
                    }))
                }
                "for" => {
                    self.advance();
                    let var = self.expect_identifier()?;
                    if !self.peek().is_keyword("in") {
                        return Err(self.expected("'in' after the loop variable"));
                    }
                    self.advance();
                    let iterable = self.parse_expression()?;
                    self.expect_colon()?;
                    let body = self.parse_stmt_body()?;
                    Ok(Some(Stmt {
                        kind: StmtKind::For {
                            var,
                            iterable,
                            body,
                        },
                        loc,
                    }))
                }
                k if DECL_ONLY_KEYWORDS.contains(&k) => {
                    let k = k.to_string();
                    Err(self.error(format!(
                        "'{k}' declarations are not allowed inside a function body"
                    )))
                }
                _ => self.parse_expr_stmt(loc),
            },
            _ => self.parse_expr_stmt(loc),
        }
    }

    fn parse_expr_stmt(&mut self, loc: Loc) -> Result<Option<Stmt>, ParseError> {
        let expr = self.parse_expression()?;
        self.expect_line_end()?;
        Ok(Some(Stmt {
            kind: StmtKind::Expr(expr),
            loc,
        }))
    }

    /// Shared `if cond:` / `elif cond:` / `else:` parsing for both
    /// statement and element bodies. The caller supplies the body parser.
    fn parse_conditional<T>(
        &mut self,
        mut parse_body: impl FnMut(&mut Self) -> Result<Vec<T>, ParseError>,
    ) -> Result<(Vec<(Expr, Vec<T>)>, Option<Vec<T>>), ParseError> {
        self.advance(); // consume `if`
        let cond = self.parse_expression()?;
        self.expect_colon()?;
        let body = parse_body(self)?;

        let mut arms = vec![(cond, body)];
        let mut else_body = None;

        loop {
            // The matching dedent has been consumed; elif/else sit at the
            // same level, possibly after blank lines.
            let checkpoint = self.pos;
            self.skip_newlines();
            if self.peek().is_keyword("elif") {
                self.advance();
                let cond = self.parse_expression()?;
                self.expect_colon()?;
                let body = parse_body(self)?;
                arms.push((cond, body));
            } else if self.peek().is_keyword("else") {
                self.advance();
                self.expect_colon()?;
                else_body = Some(parse_body(self)?);
                break;
            } else {
                self.pos = checkpoint;
                break;
            }
        }

        Ok((arms, else_body))
    }

    // =========================================================================
    // UI elements
    // =========================================================================

    /// Parse an indented element body (after the `:` has been consumed).
    fn parse_element_body(&mut self) -> Result<Vec<Element>, ParseError> {
        self.parse_block(|p| p.parse_element_item())
    }

    fn parse_element_item(&mut self) -> Result<Option<Element>, ParseError> {
        if self.skip_comment() {
            return Ok(None);
        }
        self.parse_element().map(Some)
    }

    /// Parse one UI element.
    pub(crate) fn parse_element(&mut self) -> Result<Element, ParseError> {
        let loc = self.loc();

        match &self.peek().kind {
            TokenKind::Keyword(k) => match k.as_str() {
                "layout" => self.parse_layout(loc),
                "text" => self.parse_text(loc),
                "button" => self.parse_button(loc),
                "input" => self.parse_input(loc),
                "image" => self.parse_image(loc),
                "link" => self.parse_link(loc),
                "toggle" => self.parse_bound_element(loc, true),
                "select" => self.parse_bound_element(loc, false),
                "if" => {
                    let (arms, else_children) =
                        self.parse_conditional(|p| p.parse_element_body())?;
                    Ok(Element {
                        kind: ElementKind::If {
                            arms,
                            else_children,
                        },
                        loc,
                    })
                }
                "elif" | "else" => {
                    Err(self.error(format!("'{k}' without a matching 'if'")))
                }
                "for" => self.parse_for_element(loc),
                "show" => self.parse_visibility(loc, true),
                "hide" => self.parse_visibility(loc, false),
                k => {
                    let k = k.to_string();
                    Err(self.error(format!(
                        "'{k}' is not a UI element{}",
                        lumen_diagnostics::suggestion_suffix(&k, KEYWORDS)
                    )))
                }
            },
            TokenKind::Identifier(w) => {
                let w = w.clone();
                if w.chars().next().map(|c| c.is_uppercase()) == Some(true) {
                    self.parse_component_call(loc, w)
                } else if is_widget(&w) {
                    self.parse_widget(loc, w)
                } else {
                    let candidates: Vec<&str> = KEYWORDS
                        .iter()
                        .chain(crate::ast::WIDGETS.iter())
                        .copied()
                        .collect();
                    Err(self.error(format!(
                        "Unknown element '{w}'{}",
                        lumen_diagnostics::suggestion_suffix(&w, &candidates)
                    )))
                }
            }
            _ => Err(self.brace_hint(self.expected("a UI element"))),
        }
    }

    /// `layout row|col props:` with element children.
    fn parse_layout(&mut self, loc: Loc) -> Result<Element, ParseError> {
        self.advance(); // consume `layout`

        let direction = match self.peek().word() {
            Some("row") => LayoutDirection::Row,
            Some("col") => LayoutDirection::Col,
            _ => return Err(self.expected("'row' or 'col' after 'layout'")),
        };
        self.advance();

        let props = self.parse_props(STOP_DEFAULT)?;
        self.expect_colon()?;
        let children = self.parse_element_body()?;

        Ok(Element {
            kind: ElementKind::Layout {
                direction,
                props,
                children,
            },
            loc,
        })
    }

    /// `text "..."` or `text expr`, with optional trailing props.
    fn parse_text(&mut self, loc: Loc) -> Result<Element, ParseError> {
        self.advance(); // consume `text`
        let content = self.parse_string_or_expr()?;
        let props = self.parse_props(STOP_DEFAULT)?;
        self.expect_line_end()?;

        Ok(Element {
            kind: ElementKind::Text { content, props },
            loc,
        })
    }

    /// `button "label" props -> action`
    fn parse_button(&mut self, loc: Loc) -> Result<Element, ParseError> {
        self.advance(); // consume `button`
        let label = self.parse_string_or_expr()?;
        let props = self.parse_props(STOP_AT_ARROW)?;

        let action = if self.peek().is_operator("->") {
            self.advance();
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.expect_line_end()?;

        Ok(Element {
            kind: ElementKind::Button {
                label,
                props,
                action,
            },
            loc,
        })
    }

    /// `input binding props` — the binding is optional, so a leading
    /// identifier followed by `=` is a property, not a binding.
    fn parse_input(&mut self, loc: Loc) -> Result<Element, ParseError> {
        self.advance(); // consume `input`

        let binding = match &self.peek().kind {
            TokenKind::Identifier(name) if !self.next_is_operator("=") => {
                let name = name.clone();
                self.advance();
                Some(name)
            }
            _ => None,
        };

        let props = self.parse_props(STOP_DEFAULT)?;
        self.expect_line_end()?;

        Ok(Element {
            kind: ElementKind::Input { binding, props },
            loc,
        })
    }

    /// `image "src" props`
    fn parse_image(&mut self, loc: Loc) -> Result<Element, ParseError> {
        self.advance(); // consume `image`
        let source = self.parse_string_or_expr()?;
        let props = self.parse_props(STOP_DEFAULT)?;
        self.expect_line_end()?;

        Ok(Element {
            kind: ElementKind::Image { source, props },
            loc,
        })
    }

    /// `link "label" to="/path" props`
    fn parse_link(&mut self, loc: Loc) -> Result<Element, ParseError> {
        self.advance(); // consume `link`
        let label = self.parse_string_or_expr()?;
        let props = self.parse_props(STOP_DEFAULT)?;
        self.expect_line_end()?;

        Ok(Element {
            kind: ElementKind::Link { label, props },
            loc,
        })
    }

    /// `toggle binding props` / `select binding props`
    fn parse_bound_element(&mut self, loc: Loc, toggle: bool) -> Result<Element, ParseError> {
        self.advance(); // consume keyword
        let binding = self.expect_identifier()?;
        let props = self.parse_props(STOP_DEFAULT)?;
        self.expect_line_end()?;

        let kind = if toggle {
            ElementKind::Toggle { binding, props }
        } else {
            ElementKind::Select { binding, props }
        };
        Ok(Element { kind, loc })
    }

    /// `for name in expr:` over element children.
    fn parse_for_element(&mut self, loc: Loc) -> Result<Element, ParseError> {
        self.advance(); // consume `for`
        let var = self.expect_identifier()?;
        if !self.peek().is_keyword("in") {
            return Err(self.expected("'in' after the loop variable"));
        }
        self.advance();
        let iterable = self.parse_expression()?;
        self.expect_colon()?;
        let children = self.parse_element_body()?;

        Ok(Element {
            kind: ElementKind::For {
                var,
                iterable,
                children,
            },
            loc,
        })
    }

    /// `show cond:` / `hide cond:` element blocks.
    fn parse_visibility(&mut self, loc: Loc, show: bool) -> Result<Element, ParseError> {
        self.advance(); // consume keyword
        let condition = self.parse_expression()?;
        self.expect_colon()?;
        let children = self.parse_element_body()?;

        let kind = if show {
            ElementKind::Show {
                condition,
                children,
            }
        } else {
            ElementKind::Hide {
                condition,
                children,
            }
        };
        Ok(Element { kind, loc })
    }

    /// `Name(args)` — component instantiation.
    fn parse_component_call(&mut self, loc: Loc, name: String) -> Result<Element, ParseError> {
        self.advance(); // consume the name

        let args = if matches!(self.peek().kind, TokenKind::LParen) {
            self.advance();
            self.parse_call_args()?
        } else {
            Vec::new()
        };
        self.expect_line_end()?;

        Ok(Element {
            kind: ElementKind::ComponentCall { name, args },
            loc,
        })
    }

    // =========================================================================
    // Composite widgets
    // =========================================================================

    /// Dispatch a composite widget. Table, form, nav, chart, and modal have
    /// dedicated mini-grammars; everything else takes the generic shape.
    fn parse_widget(&mut self, loc: Loc, name: String) -> Result<Element, ParseError> {
        self.advance(); // consume the widget name
        match name.as_str() {
            "table" => self.parse_table(loc),
            "form" => self.parse_form(loc),
            "nav" => self.parse_nav(loc),
            "chart" => self.parse_chart(loc),
            "modal" => self.parse_modal(loc),
            _ => self.parse_generic_widget(loc, name),
        }
    }

    /// `table rows=expr props:` with `column "Header" = expr` lines.
    fn parse_table(&mut self, loc: Loc) -> Result<Element, ParseError> {
        let props = self.parse_props(STOP_DEFAULT)?;
        self.expect_colon()?;

        let columns = self.parse_block(|p| {
            if p.skip_comment() {
                return Ok(None);
            }
            let loc = p.loc();
            if p.peek().word() != Some("column") {
                return Err(p.expected("'column' in table block"));
            }
            p.advance();
            let header = p.expect_string()?;
            p.expect_operator("=")?;
            let value = p.parse_expression()?;
            p.expect_line_end()?;
            Ok(Some(TableColumn { header, value, loc }))
        })?;

        Ok(Element {
            kind: ElementKind::Table { props, columns },
            loc,
        })
    }

    /// `form props:` with `field name: type props` lines and an optional
    /// `submit "Label" -> action` line.
    fn parse_form(&mut self, loc: Loc) -> Result<Element, ParseError> {
        let props = self.parse_props(STOP_DEFAULT)?;
        self.expect_colon()?;

        let mut submit = None;
        let fields = self.parse_block(|p| {
            if p.skip_comment() {
                return Ok(None);
            }
            let entry_loc = p.loc();
            match p.peek().word() {
                Some("field") => {
                    p.advance();
                    let name = p.expect_identifier()?;
                    let ty = p.parse_optional_annotation()?;
                    let props = p.parse_props(STOP_DEFAULT)?;
                    p.expect_line_end()?;
                    Ok(Some(FormField {
                        name,
                        ty,
                        props,
                        loc: entry_loc,
                    }))
                }
                Some("submit") => {
                    if submit.is_some() {
                        return Err(p.error("Duplicate 'submit' in form block".into()));
                    }
                    p.advance();
                    let label = p.expect_string()?;
                    p.expect_operator("->")?;
                    let action = p.parse_expression()?;
                    p.expect_line_end()?;
                    submit = Some(FormSubmit {
                        label,
                        action,
                        loc: entry_loc,
                    });
                    Ok(None)
                }
                _ => Err(p.expected("'field' or 'submit' in form block")),
            }
        })?;

        Ok(Element {
            kind: ElementKind::Form {
                props,
                fields,
                submit,
            },
            loc,
        })
    }

    /// `nav props:` with `item "Label" -> target` lines.
    fn parse_nav(&mut self, loc: Loc) -> Result<Element, ParseError> {
        let props = self.parse_props(STOP_DEFAULT)?;
        self.expect_colon()?;

        let items = self.parse_block(|p| {
            if p.skip_comment() {
                return Ok(None);
            }
            let loc = p.loc();
            if p.peek().word() != Some("item") {
                return Err(p.expected("'item' in nav block"));
            }
            p.advance();
            let label = p.expect_string()?;
            p.expect_operator("->")?;
            let target = p.parse_expression()?;
            p.expect_line_end()?;
            Ok(Some(NavItem { label, target, loc }))
        })?;

        Ok(Element {
            kind: ElementKind::Nav { props, items },
            loc,
        })
    }

    /// `chart kind=bar props:` with `series "Label" = expr` lines.
    fn parse_chart(&mut self, loc: Loc) -> Result<Element, ParseError> {
        let props = self.parse_props(STOP_DEFAULT)?;
        self.expect_colon()?;

        let series = self.parse_block(|p| {
            if p.skip_comment() {
                return Ok(None);
            }
            let loc = p.loc();
            if p.peek().word() != Some("series") {
                return Err(p.expected("'series' in chart block"));
            }
            p.advance();
            let label = p.expect_string()?;
            p.expect_operator("=")?;
            let value = p.parse_expression()?;
            p.expect_line_end()?;
            Ok(Some(ChartSeries { label, value, loc }))
        })?;

        Ok(Element {
            kind: ElementKind::Chart { props, series },
            loc,
        })
    }

    /// `modal "Title" props:` with element children.
    fn parse_modal(&mut self, loc: Loc) -> Result<Element, ParseError> {
        let title = match &self.peek().kind {
            TokenKind::Str(_) => Some(self.parse_string_or_expr()?),
            _ => None,
        };
        let props = self.parse_props(STOP_DEFAULT)?;
        self.expect_colon()?;
        let children = self.parse_element_body()?;

        Ok(Element {
            kind: ElementKind::Modal {
                title,
                props,
                children,
            },
            loc,
        })
    }

    /// Generic widget: `name "text" props` with an optional child block.
    fn parse_generic_widget(&mut self, loc: Loc, name: String) -> Result<Element, ParseError> {
        let text = match &self.peek().kind {
            TokenKind::Str(_) => Some(self.parse_string_or_expr()?),
            _ => None,
        };
        let props = self.parse_props(STOP_DEFAULT)?;

        let children = if matches!(self.peek().kind, TokenKind::Colon) {
            self.advance();
            self.parse_element_body()?
        } else {
            self.expect_line_end()?;
            Vec::new()
        };

        Ok(Element {
            kind: ElementKind::Widget {
                name,
                text,
                props,
                children,
            },
            loc,
        })
    }

    // =========================================================================
    // Inline properties
    // =========================================================================

    /// Read `key` / `key=value` pairs until the stop set for this call site.
    /// Keys may be identifiers, keywords used as plain words, or
    /// at-keywords (`@mobile`).
    pub(crate) fn parse_props(&mut self, stops: StopSet) -> Result<Vec<Property>, ParseError> {
        let mut props = Vec::new();

        loop {
            match &self.peek().kind {
                TokenKind::Colon
                | TokenKind::Newline
                | TokenKind::Indent
                | TokenKind::Dedent
                | TokenKind::Comment(_)
                | TokenKind::Eof => break,
                TokenKind::Operator("->") if stops.arrow => break,
                TokenKind::Identifier(_) | TokenKind::Keyword(_) | TokenKind::AtKeyword(_) => {
                    let loc = self.loc();
                    let key = match &self.peek().kind {
                        TokenKind::AtKeyword(a) => format!("@{a}"),
                        other => other_word(other),
                    };
                    self.advance();

                    let value = if self.peek().is_operator("=") {
                        self.advance();
                        Some(self.parse_expression()?)
                    } else {
                        None
                    };
                    props.push(Property { key, value, loc });
                }
                _ => return Err(self.expected("a property name")),
            }
        }

        Ok(props)
    }

    // =========================================================================
    // Shared block machinery
    // =========================================================================

    /// Generic indented-block parser: consume INDENT, run the item parser
    /// until the matching DEDENT, consume the DEDENT. An item parser may
    /// return `Ok(None)` for lines it absorbed itself (comments,
    /// side-channel entries like a form's submit).
    pub(crate) fn parse_block<T>(
        &mut self,
        mut parse_item: impl FnMut(&mut Self) -> Result<Option<T>, ParseError>,
    ) -> Result<Vec<T>, ParseError> {
        self.skip_newlines();

        let mut items = Vec::new();
        if !matches!(self.peek().kind, TokenKind::Indent) {
            // Empty block: the next line did not indent.
            return Ok(items);
        }
        self.advance(); // consume INDENT

        while !self.is_at_end() && !matches!(self.peek().kind, TokenKind::Dedent) {
            self.skip_newlines();
            if self.is_at_end() || matches!(self.peek().kind, TokenKind::Dedent) {
                break;
            }
            if let Some(item) = parse_item(self)? {
                items.push(item);
            }
        }

        if matches!(self.peek().kind, TokenKind::Dedent) {
            self.advance();
        }

        Ok(items)
    }

    // =========================================================================
    // Small parsing helpers
    // =========================================================================

    /// Optional `: type` annotation.
    fn parse_optional_annotation(&mut self) -> Result<Option<crate::ast::TypeExpr>, ParseError> {
        if matches!(self.peek().kind, TokenKind::Colon) {
            self.advance();
            Ok(Some(self.parse_type()?))
        } else {
            Ok(None)
        }
    }

    /// A string (split into template parts if it interpolates) or any
    /// other expression.
    pub(crate) fn parse_string_or_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_expression()
    }

    // =========================================================================
    // Token navigation
    // =========================================================================

    pub(crate) fn peek(&self) -> &Token {
        static EOF: std::sync::LazyLock<Token> = std::sync::LazyLock::new(|| {
            Token::new(TokenKind::Eof, lumen_lexer::Span::new(0, 0, 0, 0))
        });
        self.tokens.get(self.pos).unwrap_or(&EOF)
    }

    pub(crate) fn peek_kind_at(&self, offset: usize) -> Option<&TokenKind> {
        self.tokens.get(self.pos + offset).map(|t| &t.kind)
    }

    fn next_is_operator(&self, op: &str) -> bool {
        matches!(self.peek_kind_at(1), Some(TokenKind::Operator(o)) if *o == op)
    }

    pub(crate) fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len() || matches!(self.peek().kind, TokenKind::Eof)
    }

    pub(crate) fn skip_newlines(&mut self) {
        while matches!(self.peek().kind, TokenKind::Newline) {
            self.advance();
        }
    }

    /// Consume a comment token if one is next. Returns whether it did.
    fn skip_comment(&mut self) -> bool {
        if matches!(self.peek().kind, TokenKind::Comment(_)) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn loc(&self) -> Loc {
        let span = self.peek().span;
        Loc::new(span.line, span.column)
    }

    fn at_line_end(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::Newline | TokenKind::Dedent | TokenKind::Eof | TokenKind::Comment(_)
        )
    }

    /// Expect the logical end of a line: a trailing comment is fine, a
    /// newline is consumed, a dedent/EOF is left for the block parser.
    pub(crate) fn expect_line_end(&mut self) -> Result<(), ParseError> {
        if matches!(self.peek().kind, TokenKind::Comment(_)) {
            self.advance();
        }
        match self.peek().kind {
            TokenKind::Newline => {
                self.advance();
                Ok(())
            }
            TokenKind::Dedent | TokenKind::Eof => Ok(()),
            _ => Err(self.expected("end of line")),
        }
    }

    pub(crate) fn expect_colon(&mut self) -> Result<(), ParseError> {
        if matches!(self.peek().kind, TokenKind::Colon) {
            self.advance();
            Ok(())
        } else {
            Err(self.brace_hint(self.expected("':'")))
        }
    }

    pub(crate) fn expect_operator(&mut self, op: &str) -> Result<(), ParseError> {
        if self.peek().is_operator(op) {
            self.advance();
            Ok(())
        } else {
            Err(self.expected(&format!("'{op}'")))
        }
    }

    pub(crate) fn expect_identifier(&mut self) -> Result<String, ParseError> {
        if let TokenKind::Identifier(name) = &self.peek().kind {
            let name = name.clone();
            self.advance();
            Ok(name)
        } else {
            Err(self.expected("an identifier"))
        }
    }

    /// Expect a plain string literal; escaped braces are unescaped.
    pub(crate) fn expect_string(&mut self) -> Result<String, ParseError> {
        if let TokenKind::Str(raw) = &self.peek().kind {
            let text = unescape_braces(raw);
            self.advance();
            Ok(text)
        } else {
            Err(self.expected("a string"))
        }
    }

    pub(crate) fn error(&self, message: String) -> ParseError {
        let token = self.peek();
        ParseError {
            message,
            line: token.span.line,
            column: token.span.column,
        }
    }

    pub(crate) fn expected(&self, what: &str) -> ParseError {
        self.error(format!(
            "Expected {what}, got {}",
            describe(&self.peek().kind)
        ))
    }

    /// Append the false-friend hint when the offending token is `{` or `}`.
    fn brace_hint(&self, mut err: ParseError) -> ParseError {
        let hint = match self.peek().kind {
            TokenKind::LBrace => lumen_diagnostics::framework_hint("{"),
            TokenKind::RBrace => lumen_diagnostics::framework_hint("}"),
            _ => None,
        };
        if let Some(hint) = hint {
            err.message.push_str(&format!(" ({hint})"));
        }
        err
    }
}

enum ScopeKind {
    App,
    Page,
    Component,
}

/// Extract the word from an identifier/keyword kind. Callers guarantee the
/// variant.
fn other_word(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Identifier(w) | TokenKind::Keyword(w) => w.clone(),
        _ => unreachable!("caller matched a word token"),
    }
}

/// Turn `\{` and `\}` back into literal braces (the lexer keeps them
/// escaped so the template splitter can tell them from interpolation).
pub(crate) fn unescape_braces(raw: &str) -> String {
    raw.replace("\\{", "{").replace("\\}", "}")
}

/// Human-readable token description for expected-vs-actual messages.
pub(crate) fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Keyword(k) => format!("keyword '{k}'"),
        TokenKind::Identifier(i) => format!("identifier '{i}'"),
        TokenKind::AtKeyword(a) => format!("'@{a}'"),
        TokenKind::HttpMethod(m) => format!("'{m}'"),
        TokenKind::Number(n) => format!("number {n}"),
        TokenKind::Str(_) => "a string".into(),
        TokenKind::Boolean(b) => format!("'{b}'"),
        TokenKind::Null => "'null'".into(),
        TokenKind::Color(c) => format!("color '#{c}'"),
        TokenKind::Operator(o) => format!("'{o}'"),
        TokenKind::Colon => "':'".into(),
        TokenKind::Comma => "','".into(),
        TokenKind::Dot => "'.'".into(),
        TokenKind::LParen => "'('".into(),
        TokenKind::RParen => "')'".into(),
        TokenKind::LBracket => "'['".into(),
        TokenKind::RBracket => "']'".into(),
        TokenKind::LBrace => "'{'".into(),
        TokenKind::RBrace => "'}'".into(),
        TokenKind::Indent => "an indented block".into(),
        TokenKind::Dedent => "the end of the block".into(),
        TokenKind::Newline => "end of line".into(),
        TokenKind::Comment(_) => "a comment".into(),
        TokenKind::Eof => "end of input".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::*;
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> Vec<Node> {
        Parser::parse(source).unwrap()
    }

    fn parse_err(source: &str) -> ParseError {
        Parser::parse(source).unwrap_err()
    }

    fn first_page(nodes: &[Node]) -> &Scope {
        match &nodes[0] {
            Node::Page(p) => p,
            other => panic!("Expected Page, got {other:?}"),
        }
    }

    fn page_decls(scope: &Scope) -> Vec<&Decl> {
        scope
            .body
            .iter()
            .filter_map(|i| match i {
                Item::Decl(d) => Some(d),
                _ => None,
            })
            .collect()
    }

    fn page_elements(scope: &Scope) -> Vec<&Element> {
        scope
            .body
            .iter()
            .filter_map(|i| match i {
                Item::Element(e) => Some(e),
                _ => None,
            })
            .collect()
    }

    // =========================================================================
    // Empty / top level
    // =========================================================================

    #[test]
    fn test_empty_source() {
        assert!(parse("").is_empty());
    }

    #[test]
    fn test_top_level_comment() {
        let nodes = parse("// the app");
        assert!(matches!(&nodes[0], Node::Comment(t) if t == "the app"));
    }

    #[test]
    fn test_unknown_top_level_keyword_suggests() {
        let err = parse_err("layot Home:\n  a");
        assert!(err.message.contains("layot"), "{}", err.message);
        assert!(err.message.contains("layout"), "{}", err.message);
    }

    #[test]
    fn test_top_level_false_friend() {
        let err = parse_err("useState count");
        assert!(err.message.contains("state name: type = value"), "{}", err.message);
    }

    #[test]
    fn test_brace_instead_of_colon_hint() {
        let err = parse_err("page Home {\n  text \"hi\"");
        assert!(err.message.contains("Expected ':'"), "{}", err.message);
        assert!(
            err.message.contains("blocks are opened with `:` and indentation"),
            "{}",
            err.message
        );
    }

    #[test]
    fn test_stray_closing_brace_hint() {
        let err = parse_err("page Home:\n  text \"hi\"\n  }");
        assert!(
            err.message.contains("blocks are closed by dedenting"),
            "{}",
            err.message
        );
    }

    // =========================================================================
    // Pages and components
    // =========================================================================

    #[test]
    fn test_empty_page() {
        let nodes = parse("page Home:\n");
        let page = first_page(&nodes);
        assert_eq!(page.name, "Home");
        assert!(page.body.is_empty());
    }

    #[test]
    fn test_page_with_path() {
        let nodes = parse("page About at \"/about\":\n  text \"hi\"");
        let page = first_page(&nodes);
        assert_eq!(page.path.as_deref(), Some("/about"));
    }

    #[test]
    fn test_component_with_params() {
        let nodes = parse("component Card(title: string, width: int = 300):\n  text title");
        let comp = match &nodes[0] {
            Node::Component(c) => c,
            other => panic!("Expected Component, got {other:?}"),
        };
        assert_eq!(comp.params.len(), 2);
        assert_eq!(comp.params[0].name, "title");
        assert_eq!(comp.params[0].ty, Some(TypeExpr::Named("string".into())));
        assert!(comp.params[1].default.is_some());
    }

    #[test]
    fn test_node_locations() {
        let nodes = parse("\n\npage Home:\n  state x = 1");
        let page = first_page(&nodes);
        assert_eq!(page.loc, Loc::new(3, 1));
        match page_decls(page)[0] {
            Decl::State { loc, .. } => assert_eq!(*loc, Loc::new(4, 3)),
            other => panic!("Expected state, got {other:?}"),
        }
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    #[test]
    fn test_state_with_type() {
        let nodes = parse("page P:\n  state count: int = 0");
        let decls = page_decls(first_page(&nodes));
        match decls[0] {
            Decl::State {
                name, ty, value, ..
            } => {
                assert_eq!(name, "count");
                assert_eq!(*ty, Some(TypeExpr::Named("int".into())));
                assert!(matches!(value.kind, ExprKind::Number(n) if n == 0.0));
            }
            other => panic!("Expected state, got {other:?}"),
        }
    }

    #[test]
    fn test_state_without_type() {
        let nodes = parse("page P:\n  state loading = false");
        match page_decls(first_page(&nodes))[0] {
            Decl::State { ty, value, .. } => {
                assert_eq!(*ty, None);
                assert!(matches!(value.kind, ExprKind::Boolean(false)));
            }
            other => panic!("Expected state, got {other:?}"),
        }
    }

    #[test]
    fn test_derived() {
        let nodes = parse("page P:\n  derived doubled = count * 2");
        match page_decls(first_page(&nodes))[0] {
            Decl::Derived { name, expr, .. } => {
                assert_eq!(name, "doubled");
                assert!(matches!(
                    expr.kind,
                    ExprKind::Binary {
                        op: BinaryOp::Mul,
                        ..
                    }
                ));
            }
            other => panic!("Expected derived, got {other:?}"),
        }
    }

    #[test]
    fn test_prop_with_default() {
        let nodes = parse("component C:\n  prop title: string = \"Untitled\"");
        let comp = match &nodes[0] {
            Node::Component(c) => c,
            _ => panic!(),
        };
        match &comp.body[0] {
            Item::Decl(Decl::Prop { name, default, .. }) => {
                assert_eq!(name, "title");
                assert!(default.is_some());
            }
            other => panic!("Expected prop, got {other:?}"),
        }
    }

    #[test]
    fn test_type_alias() {
        let nodes = parse("page P:\n  type Items = list[string]");
        match page_decls(first_page(&nodes))[0] {
            Decl::TypeAlias { name, ty, .. } => {
                assert_eq!(name, "Items");
                assert_eq!(*ty, TypeExpr::List(Box::new(TypeExpr::Named("string".into()))));
            }
            other => panic!("Expected type alias, got {other:?}"),
        }
    }

    #[test]
    fn test_store() {
        let nodes = parse("page P:\n  store Cart:\n    items: list[string] = []\n    total = 0");
        match page_decls(first_page(&nodes))[0] {
            Decl::Store { name, fields, .. } => {
                assert_eq!(name, "Cart");
                assert_eq!(fields.len(), 2);
                assert_eq!(fields[1].name, "total");
            }
            other => panic!("Expected store, got {other:?}"),
        }
    }

    #[test]
    fn test_api_decl() {
        let nodes = parse("page P:\n  api users:\n    method: \"GET\"\n    url: \"/api/users\"");
        match page_decls(first_page(&nodes))[0] {
            Decl::Api { name, entries, .. } => {
                assert_eq!(name, "users");
                assert_eq!(entries.len(), 2);
                assert_eq!(entries[0].key, "method");
            }
            other => panic!("Expected api, got {other:?}"),
        }
    }

    #[test]
    fn test_fn_with_params_and_return_type() {
        let nodes = parse("page P:\n  fn add(a: int, b: int) -> int:\n    return a + b");
        match page_decls(first_page(&nodes))[0] {
            Decl::Function(f) => {
                assert_eq!(f.name, "add");
                assert_eq!(f.params.len(), 2);
                assert_eq!(f.ret, Some(TypeExpr::Named("int".into())));
                assert_eq!(f.body.len(), 1);
                assert!(matches!(f.body[0].kind, StmtKind::Return(Some(_))));
            }
            other => panic!("Expected fn, got {other:?}"),
        }
    }

    #[test]
    fn test_lifecycle_hooks() {
        let nodes = parse("page P:\n  on mount:\n    load()\n  on destroy:\n    save()");
        let decls = page_decls(first_page(&nodes));
        assert!(matches!(decls[0], Decl::OnMount { .. }));
        assert!(matches!(decls[1], Decl::OnDestroy { .. }));
    }

    #[test]
    fn test_lifecycle_bad_hook() {
        let err = parse_err("page P:\n  on click:\n    x()");
        assert!(err.message.contains("'mount' or 'destroy'"));
    }

    #[test]
    fn test_watch() {
        let nodes = parse("page P:\n  watch query:\n    refresh()");
        match page_decls(first_page(&nodes))[0] {
            Decl::Watch { target, body, .. } => {
                assert_eq!(target, "query");
                assert_eq!(body.len(), 1);
            }
            other => panic!("Expected watch, got {other:?}"),
        }
    }

    #[test]
    fn test_check_with_old() {
        let nodes = parse("page P:\n  check count >= old(count)");
        match page_decls(first_page(&nodes))[0] {
            Decl::Check { condition, .. } => {
                assert!(matches!(
                    condition.kind,
                    ExprKind::Binary {
                        op: BinaryOp::Gte,
                        ..
                    }
                ));
            }
            other => panic!("Expected check, got {other:?}"),
        }
    }

    #[test]
    fn test_style_with_color() {
        let nodes = parse("page P:\n  style:\n    background: #1a2b3c\n    rounded");
        match page_decls(first_page(&nodes))[0] {
            Decl::Style { entries, .. } => {
                assert_eq!(entries.len(), 2);
                assert!(matches!(
                    entries[0].value.as_ref().unwrap().kind,
                    ExprKind::Color(ref c) if c == "1a2b3c"
                ));
                assert_eq!(entries[1].value, None);
            }
            other => panic!("Expected style, got {other:?}"),
        }
    }

    // =========================================================================
    // Backend declarations
    // =========================================================================

    #[test]
    fn test_model() {
        let nodes = parse("model User:\n  name: string\n  age: int = 0");
        match &nodes[0] {
            Node::Model(m) => {
                assert_eq!(m.name, "User");
                assert_eq!(m.fields.len(), 2);
                assert_eq!(m.fields[0].ty, TypeExpr::Named("string".into()));
                assert!(m.fields[1].default.is_some());
            }
            other => panic!("Expected model, got {other:?}"),
        }
    }

    #[test]
    fn test_route() {
        let nodes = parse("route \"/users\" -> UserList");
        match &nodes[0] {
            Node::Route(r) => {
                assert_eq!(r.path, "/users");
                assert_eq!(r.target, "UserList");
            }
            other => panic!("Expected route, got {other:?}"),
        }
    }

    #[test]
    fn test_endpoint() {
        let nodes = parse("endpoint GET \"/api/items\":\n  return items");
        match &nodes[0] {
            Node::Endpoint(e) => {
                assert_eq!(e.method, "GET");
                assert_eq!(e.path, "/api/items");
                assert_eq!(e.body.len(), 1);
            }
            other => panic!("Expected endpoint, got {other:?}"),
        }
    }

    #[test]
    fn test_endpoint_requires_method() {
        let err = parse_err("endpoint \"/api/items\":\n  return 1");
        assert!(err.message.contains("HTTP method"));
    }

    #[test]
    fn test_config_blocks() {
        let nodes = parse("deploy:\n  provider: \"fly\"\n  region: \"fra\"");
        match &nodes[0] {
            Node::Config(c) => {
                assert_eq!(c.kind, "deploy");
                assert_eq!(c.name, None);
                assert_eq!(c.entries.len(), 2);
            }
            other => panic!("Expected config, got {other:?}"),
        }
    }

    #[test]
    fn test_named_config_block() {
        let nodes = parse("queue emails:\n  workers: 4");
        match &nodes[0] {
            Node::Config(c) => {
                assert_eq!(c.kind, "queue");
                assert_eq!(c.name.as_deref(), Some("emails"));
            }
            other => panic!("Expected config, got {other:?}"),
        }
    }

    #[test]
    fn test_webhook_string_named() {
        let nodes = parse("webhook \"/stripe\":\n  secret: env_secret");
        match &nodes[0] {
            Node::Config(c) => {
                assert_eq!(c.kind, "webhook");
                assert_eq!(c.name.as_deref(), Some("/stripe"));
            }
            other => panic!("Expected config, got {other:?}"),
        }
    }

    #[test]
    fn test_config_at_keyword_entry() {
        let nodes = parse("i18n:\n  @mobile: true\n  default: \"en\"");
        match &nodes[0] {
            Node::Config(c) => assert_eq!(c.entries[0].key, "@mobile"),
            other => panic!("Expected config, got {other:?}"),
        }
    }

    #[test]
    fn test_middleware_and_cron() {
        let nodes = parse("middleware auth_required:\n  check_token()\ncron \"0 3 * * *\":\n  cleanup()");
        assert!(matches!(&nodes[0], Node::Middleware(b) if b.name == "auth_required"));
        assert!(matches!(&nodes[1], Node::Cron(b) if b.name == "0 3 * * *"));
    }

    // =========================================================================
    // Statements
    // =========================================================================

    #[test]
    fn test_let_and_assignment() {
        let nodes = parse("page P:\n  fn go():\n    let x: int = 1\n    x += 2");
        match page_decls(first_page(&nodes))[0] {
            Decl::Function(f) => {
                assert!(matches!(f.body[0].kind, StmtKind::Let { .. }));
                match &f.body[1].kind {
                    StmtKind::Expr(e) => assert!(matches!(
                        e.kind,
                        ExprKind::Assign {
                            op: AssignOp::AddAssign,
                            ..
                        }
                    )),
                    other => panic!("Expected expr stmt, got {other:?}"),
                }
            }
            other => panic!("Expected fn, got {other:?}"),
        }
    }

    #[test]
    fn test_if_elif_else_stmt() {
        let nodes = parse(
            "page P:\n  fn f():\n    if x > 0:\n      a()\n    elif x < 0:\n      b()\n    else:\n      c()",
        );
        match page_decls(first_page(&nodes))[0] {
            Decl::Function(f) => match &f.body[0].kind {
                StmtKind::If { arms, else_body } => {
                    assert_eq!(arms.len(), 2);
                    assert!(else_body.is_some());
                }
                other => panic!("Expected if, got {other:?}"),
            },
            other => panic!("Expected fn, got {other:?}"),
        }
    }

    #[test]
    fn test_for_stmt() {
        let nodes = parse("page P:\n  fn f():\n    for item in items:\n      push(item)");
        match page_decls(first_page(&nodes))[0] {
            Decl::Function(f) => {
                assert!(matches!(f.body[0].kind, StmtKind::For { ref var, .. } if var == "item"));
            }
            other => panic!("Expected fn, got {other:?}"),
        }
    }

    #[test]
    fn test_bare_return() {
        let nodes = parse("page P:\n  fn f():\n    return");
        match page_decls(first_page(&nodes))[0] {
            Decl::Function(f) => assert!(matches!(f.body[0].kind, StmtKind::Return(None))),
            other => panic!("Expected fn, got {other:?}"),
        }
    }

    #[test]
    fn test_state_inside_fn_rejected() {
        let err = parse_err("page P:\n  fn f():\n    state x = 1");
        assert!(err.message.contains("not allowed inside a function body"));
    }

    // =========================================================================
    // Elements
    // =========================================================================

    #[test]
    fn test_layout_with_children() {
        let nodes = parse("page P:\n  layout col gap=4:\n    text \"a\"\n    text \"b\"");
        let els = page_elements(first_page(&nodes));
        match &els[0].kind {
            ElementKind::Layout {
                direction,
                props,
                children,
            } => {
                assert_eq!(*direction, LayoutDirection::Col);
                assert_eq!(props[0].key, "gap");
                assert_eq!(children.len(), 2);
            }
            other => panic!("Expected layout, got {other:?}"),
        }
    }

    #[test]
    fn test_layout_requires_direction() {
        let err = parse_err("page P:\n  layout grid:\n    text \"a\"");
        assert!(err.message.contains("'row' or 'col'"));
    }

    #[test]
    fn test_text_interpolation_split() {
        let nodes = parse("page P:\n  layout col:\n    text \"Count: {count}!\"");
        let els = page_elements(first_page(&nodes));
        let layout_children = match &els[0].kind {
            ElementKind::Layout { children, .. } => children,
            other => panic!("Expected layout, got {other:?}"),
        };
        match &layout_children[0].kind {
            ElementKind::Text { content, .. } => match &content.kind {
                ExprKind::Template(parts) => {
                    assert_eq!(parts.len(), 3);
                    assert!(matches!(&parts[0], TemplatePart::Text(t) if t == "Count: "));
                    assert!(matches!(&parts[1], TemplatePart::Expr(e)
                        if matches!(e.kind, ExprKind::Identifier(ref i) if i == "count")));
                    assert!(matches!(&parts[2], TemplatePart::Text(t) if t == "!"));
                }
                other => panic!("Expected template, got {other:?}"),
            },
            other => panic!("Expected text, got {other:?}"),
        }
    }

    #[test]
    fn test_button_with_action() {
        let nodes = parse("page P:\n  button \"+1\" -> increment()");
        let els = page_elements(first_page(&nodes));
        match &els[0].kind {
            ElementKind::Button { label, action, .. } => {
                assert!(matches!(label.kind, ExprKind::Str(ref s) if s == "+1"));
                assert!(matches!(
                    action.as_ref().unwrap().kind,
                    ExprKind::Call { .. }
                ));
            }
            other => panic!("Expected button, got {other:?}"),
        }
    }

    #[test]
    fn test_button_props_stop_at_arrow() {
        let nodes = parse("page P:\n  button \"Del\" variant=\"danger\" disabled -> remove(id)");
        let els = page_elements(first_page(&nodes));
        match &els[0].kind {
            ElementKind::Button { props, action, .. } => {
                assert_eq!(props.len(), 2);
                assert_eq!(props[0].key, "variant");
                assert_eq!(props[1].key, "disabled");
                assert_eq!(props[1].value, None);
                assert!(action.is_some());
            }
            other => panic!("Expected button, got {other:?}"),
        }
    }

    #[test]
    fn test_input_binding_vs_prop() {
        let nodes = parse("page P:\n  input name placeholder=\"Your name\"\n  input placeholder=\"No binding\"");
        let els = page_elements(first_page(&nodes));
        match &els[0].kind {
            ElementKind::Input { binding, props } => {
                assert_eq!(binding.as_deref(), Some("name"));
                assert_eq!(props[0].key, "placeholder");
            }
            other => panic!("Expected input, got {other:?}"),
        }
        match &els[1].kind {
            ElementKind::Input { binding, .. } => assert_eq!(*binding, None),
            other => panic!("Expected input, got {other:?}"),
        }
    }

    #[test]
    fn test_toggle_and_select() {
        let nodes = parse("page P:\n  toggle dark_mode\n  select plan options=plans");
        let els = page_elements(first_page(&nodes));
        assert!(matches!(&els[0].kind, ElementKind::Toggle { binding, .. } if binding == "dark_mode"));
        assert!(matches!(&els[1].kind, ElementKind::Select { binding, .. } if binding == "plan"));
    }

    #[test]
    fn test_element_if_elif_else() {
        let nodes = parse(
            "page P:\n  if ready:\n    text \"go\"\n  elif loading:\n    spinner\n  else:\n    text \"wait\"",
        );
        let els = page_elements(first_page(&nodes));
        match &els[0].kind {
            ElementKind::If {
                arms,
                else_children,
            } => {
                assert_eq!(arms.len(), 2);
                assert!(else_children.is_some());
            }
            other => panic!("Expected if element, got {other:?}"),
        }
    }

    #[test]
    fn test_element_for() {
        let nodes = parse("page P:\n  for todo in todos:\n    text \"{todo.title}\"");
        let els = page_elements(first_page(&nodes));
        match &els[0].kind {
            ElementKind::For { var, children, .. } => {
                assert_eq!(var, "todo");
                assert_eq!(children.len(), 1);
            }
            other => panic!("Expected for element, got {other:?}"),
        }
    }

    #[test]
    fn test_show_hide() {
        let nodes = parse("page P:\n  show expanded:\n    text \"details\"\n  hide busy:\n    button \"Go\" -> go()");
        let els = page_elements(first_page(&nodes));
        assert!(matches!(&els[0].kind, ElementKind::Show { .. }));
        assert!(matches!(&els[1].kind, ElementKind::Hide { .. }));
    }

    #[test]
    fn test_component_call() {
        let nodes = parse("page P:\n  Card(title: \"Hello\", width: 300)");
        let els = page_elements(first_page(&nodes));
        match &els[0].kind {
            ElementKind::ComponentCall { name, args } => {
                assert_eq!(name, "Card");
                // named args folded into one object literal
                assert_eq!(args.len(), 1);
                assert!(matches!(args[0].kind, ExprKind::Object(ref f) if f.len() == 2));
            }
            other => panic!("Expected component call, got {other:?}"),
        }
    }

    #[test]
    fn test_elif_without_if() {
        let err = parse_err("page P:\n  elif x:\n    text \"a\"");
        assert!(err.message.contains("'elif' without a matching 'if'"));
    }

    #[test]
    fn test_else_without_if() {
        let err = parse_err("page P:\n  else:\n    text \"a\"");
        assert!(err.message.contains("'else' without a matching 'if'"));
    }

    // =========================================================================
    // Composite widgets
    // =========================================================================

    #[test]
    fn test_table_mini_grammar() {
        let nodes = parse(
            "page P:\n  table rows=users:\n    column \"Name\" = row.name\n    column \"Age\" = row.age",
        );
        let els = page_elements(first_page(&nodes));
        match &els[0].kind {
            ElementKind::Table { props, columns } => {
                assert_eq!(props[0].key, "rows");
                assert_eq!(columns.len(), 2);
                assert_eq!(columns[0].header, "Name");
            }
            other => panic!("Expected table, got {other:?}"),
        }
    }

    #[test]
    fn test_table_rejects_stray_lines() {
        let err = parse_err("page P:\n  table rows=users:\n    header \"Name\"");
        assert!(err.message.contains("'column'"));
    }

    #[test]
    fn test_form_mini_grammar() {
        let nodes = parse(
            "page P:\n  form:\n    field email: string required\n    field age: int\n    submit \"Sign up\" -> register()",
        );
        let els = page_elements(first_page(&nodes));
        match &els[0].kind {
            ElementKind::Form {
                fields, submit, ..
            } => {
                assert_eq!(fields.len(), 2);
                assert_eq!(fields[0].name, "email");
                assert_eq!(fields[0].props[0].key, "required");
                let submit = submit.as_ref().unwrap();
                assert_eq!(submit.label, "Sign up");
            }
            other => panic!("Expected form, got {other:?}"),
        }
    }

    #[test]
    fn test_nav_mini_grammar() {
        let nodes = parse("page P:\n  nav:\n    item \"Home\" -> go(\"/\")\n    item \"About\" -> go(\"/about\")");
        let els = page_elements(first_page(&nodes));
        match &els[0].kind {
            ElementKind::Nav { items, .. } => {
                assert_eq!(items.len(), 2);
                assert_eq!(items[0].label, "Home");
            }
            other => panic!("Expected nav, got {other:?}"),
        }
    }

    #[test]
    fn test_chart_mini_grammar() {
        let nodes = parse("page P:\n  chart kind=bar:\n    series \"Sales\" = sales_data");
        let els = page_elements(first_page(&nodes));
        match &els[0].kind {
            ElementKind::Chart { series, .. } => {
                assert_eq!(series.len(), 1);
                assert_eq!(series[0].label, "Sales");
            }
            other => panic!("Expected chart, got {other:?}"),
        }
    }

    #[test]
    fn test_modal_with_children() {
        let nodes = parse("page P:\n  modal \"Confirm\" open=confirming:\n    text \"Sure?\"\n    button \"Yes\" -> confirm()");
        let els = page_elements(first_page(&nodes));
        match &els[0].kind {
            ElementKind::Modal {
                title, children, ..
            } => {
                assert!(title.is_some());
                assert_eq!(children.len(), 2);
            }
            other => panic!("Expected modal, got {other:?}"),
        }
    }

    #[test]
    fn test_generic_widget_inline() {
        let nodes = parse("page P:\n  badge \"New\" color=#f00");
        let els = page_elements(first_page(&nodes));
        match &els[0].kind {
            ElementKind::Widget {
                name, text, props, ..
            } => {
                assert_eq!(name, "badge");
                assert!(text.is_some());
                assert!(matches!(
                    props[0].value.as_ref().unwrap().kind,
                    ExprKind::Color(ref c) if c == "f00"
                ));
            }
            other => panic!("Expected widget, got {other:?}"),
        }
    }

    #[test]
    fn test_generic_widget_with_children() {
        let nodes = parse("page P:\n  card:\n    text \"inside\"");
        let els = page_elements(first_page(&nodes));
        match &els[0].kind {
            ElementKind::Widget { name, children, .. } => {
                assert_eq!(name, "card");
                assert_eq!(children.len(), 1);
            }
            other => panic!("Expected widget, got {other:?}"),
        }
    }

    #[test]
    fn test_widget_at_keyword_prop() {
        let nodes = parse("page P:\n  sidebar @mobile collapsed:\n    text \"menu\"");
        let els = page_elements(first_page(&nodes));
        match &els[0].kind {
            ElementKind::Widget { props, .. } => {
                assert_eq!(props[0].key, "@mobile");
                assert_eq!(props[1].key, "collapsed");
            }
            other => panic!("Expected widget, got {other:?}"),
        }
    }

    // =========================================================================
    // Full example and determinism
    // =========================================================================

    const COUNTER: &str = "page Counter:\n  state count: int = 0\n  derived doubled = count * 2\n  fn increment():\n    count += 1\n  layout col:\n    text \"{count}\"\n    button \"+1\" -> increment()";

    #[test]
    fn test_counter_example() {
        let nodes = parse(COUNTER);
        let page = first_page(&nodes);
        assert_eq!(page.name, "Counter");
        assert_eq!(page_decls(page).len(), 3);
        assert_eq!(page_elements(page).len(), 1);
    }

    #[test]
    fn test_reparse_deterministic() {
        assert_eq!(parse(COUNTER), parse(COUNTER));
    }

    // =========================================================================
    // Failure semantics
    // =========================================================================

    #[test]
    fn test_expected_actual_in_message() {
        let err = parse_err("page P:\n  state = 1");
        assert!(err.message.contains("Expected an identifier"), "{}", err.message);
        assert!(err.message.contains("'='"), "{}", err.message);
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_error_carries_position() {
        let err = parse_err("page P:\n  derived x 5");
        assert_eq!(err.line, 2);
        assert!(err.column > 1);
    }

    #[test]
    fn test_lexer_error_propagates() {
        let err = parse_err("page P:\n  text \"oops");
        assert!(err.message.contains("Unterminated string"));
    }
}
