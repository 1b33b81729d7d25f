//! Abstract Syntax Tree for Lumen.
//!
//! Four node families, mutually exclusive at the top of a body:
//! declarations, UI elements, statements, and expressions. Every node
//! carries a source location so downstream diagnostics and generated-code
//! trace comments can point back at the exact line and column.
//!
//! The parser constructs the tree bottom-up; each composite node owns its
//! children outright and nothing mutates the tree after construction.

/// A source location (1-based line and column).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Loc {
    pub line: usize,
    pub column: usize,
}

impl Loc {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

// ---------------------------------------------------------------------------
// Top-level nodes
// ---------------------------------------------------------------------------

/// A top-level declaration in a source unit.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    App(Scope),
    Page(Scope),
    Component(Scope),
    Model(Model),
    Route(Route),
    Domain(Domain),
    Endpoint(Endpoint),
    Middleware(StmtBlock),
    Cron(StmtBlock),
    Test(StmtBlock),
    /// Config-style declarations (auth, deploy, docker, queue, i18n, ...):
    /// a keyword, an optional name, and key/value entries.
    Config(ConfigBlock),
    Comment(String),
}

/// A page, app, or component: a named scope whose body mixes declarations
/// and UI elements. Pages may carry a route path; components may declare
/// parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Scope {
    pub name: String,
    pub path: Option<String>,
    pub params: Vec<Param>,
    pub body: Vec<Item>,
    pub loc: Loc,
}

/// A data model declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub name: String,
    pub fields: Vec<ModelField>,
    pub loc: Loc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelField {
    pub name: String,
    pub ty: TypeExpr,
    pub default: Option<Expr>,
    pub loc: Loc,
}

/// `route "/path" -> PageName`
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub path: String,
    pub target: String,
    pub loc: Loc,
}

/// `domain "example.com"`
#[derive(Debug, Clone, PartialEq)]
pub struct Domain {
    pub name: String,
    pub loc: Loc,
}

/// `endpoint GET "/api/items":` with a statement body.
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    pub method: String,
    pub path: String,
    pub body: Vec<Stmt>,
    pub loc: Loc,
}

/// A named statement block (middleware, cron, test).
#[derive(Debug, Clone, PartialEq)]
pub struct StmtBlock {
    pub name: String,
    pub body: Vec<Stmt>,
    pub loc: Loc,
}

/// A config-style block: `deploy:`, `queue emails:`, `locale de:`, ...
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigBlock {
    pub kind: String,
    pub name: Option<String>,
    pub entries: Vec<ConfigEntry>,
    pub loc: Loc,
}

/// One line inside a config block: `key: value` or a bare flag `key`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigEntry {
    pub key: String,
    pub value: Option<Expr>,
    pub loc: Loc,
}

// ---------------------------------------------------------------------------
// Scope body items
// ---------------------------------------------------------------------------

/// One item inside a page/app/component body.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Decl(Decl),
    Element(Element),
    Comment(String),
}

/// Declarations allowed inside a scope body.
#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    /// `state name: type = expr`
    State {
        name: String,
        ty: Option<TypeExpr>,
        value: Expr,
        loc: Loc,
    },
    /// `derived name = expr`
    Derived {
        name: String,
        ty: Option<TypeExpr>,
        expr: Expr,
        loc: Loc,
    },
    /// `prop name: type = default`
    Prop {
        name: String,
        ty: TypeExpr,
        default: Option<Expr>,
        loc: Loc,
    },
    /// `type Name = type-expr`
    TypeAlias {
        name: String,
        ty: TypeExpr,
        loc: Loc,
    },
    /// `store Name:` with state-like fields.
    Store {
        name: String,
        fields: Vec<StoreField>,
        loc: Loc,
    },
    /// `api name:` with config entries (method, url, headers, ...).
    Api {
        name: String,
        entries: Vec<ConfigEntry>,
        loc: Loc,
    },
    /// `fn name(params) -> type:` with a statement body.
    Function(FnDecl),
    /// `on mount:` lifecycle hook.
    OnMount { body: Vec<Stmt>, loc: Loc },
    /// `on destroy:` lifecycle hook.
    OnDestroy { body: Vec<Stmt>, loc: Loc },
    /// `watch name:` with a statement body run when the binding changes.
    Watch {
        target: String,
        body: Vec<Stmt>,
        loc: Loc,
    },
    /// `check expr` assertion; the condition may use `old(...)`.
    Check { condition: Expr, loc: Loc },
    /// `style:` with config entries (values may be color literals).
    Style {
        entries: Vec<ConfigEntry>,
        loc: Loc,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoreField {
    pub name: String,
    pub ty: Option<TypeExpr>,
    pub value: Expr,
    pub loc: Loc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FnDecl {
    pub name: String,
    pub params: Vec<Param>,
    pub ret: Option<TypeExpr>,
    pub body: Vec<Stmt>,
    pub loc: Loc,
}

/// A function or component parameter: `name: type = default`.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: Option<TypeExpr>,
    pub default: Option<Expr>,
}

// ---------------------------------------------------------------------------
// UI elements
// ---------------------------------------------------------------------------

/// A UI element node.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub kind: ElementKind,
    pub loc: Loc,
}

/// Element variants. Core elements carry typed fields; composite widgets
/// carry a generic string-keyed property list of unevaluated expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    /// `layout row|col props:` with element children.
    Layout {
        direction: LayoutDirection,
        props: Vec<Property>,
        children: Vec<Element>,
    },
    /// `text "..."` or `text expr`.
    Text { content: Expr, props: Vec<Property> },
    /// `button "label" props -> action`.
    Button {
        label: Expr,
        props: Vec<Property>,
        action: Option<Expr>,
    },
    /// `input binding props`.
    Input {
        binding: Option<String>,
        props: Vec<Property>,
    },
    /// `image "src" props`.
    Image { source: Expr, props: Vec<Property> },
    /// `link "label" to="/path" props`.
    Link { label: Expr, props: Vec<Property> },
    /// `toggle binding props`.
    Toggle {
        binding: String,
        props: Vec<Property>,
    },
    /// `select binding props`.
    Select {
        binding: String,
        props: Vec<Property>,
    },
    /// `if cond:` / `elif cond:` / `else:` over element children.
    /// The first arm is the `if`; the rest are `elif`s.
    If {
        arms: Vec<(Expr, Vec<Element>)>,
        else_children: Option<Vec<Element>>,
    },
    /// `for name in expr:` over element children.
    For {
        var: String,
        iterable: Expr,
        children: Vec<Element>,
    },
    /// `show cond:` element block.
    Show {
        condition: Expr,
        children: Vec<Element>,
    },
    /// `hide cond:` element block.
    Hide {
        condition: Expr,
        children: Vec<Element>,
    },
    /// `Name(args)` — an instantiation of a user-defined component.
    ComponentCall { name: String, args: Vec<Expr> },
    /// `table props:` with `column "Header" = expr` lines.
    Table {
        props: Vec<Property>,
        columns: Vec<TableColumn>,
    },
    /// `form props:` with `field name: type` lines and an optional submit.
    Form {
        props: Vec<Property>,
        fields: Vec<FormField>,
        submit: Option<FormSubmit>,
    },
    /// `nav props:` with `item "Label" -> target` lines.
    Nav {
        props: Vec<Property>,
        items: Vec<NavItem>,
    },
    /// `chart props:` with `series "Label" = expr` lines.
    Chart {
        props: Vec<Property>,
        series: Vec<ChartSeries>,
    },
    /// `modal "Title" props:` with element children.
    Modal {
        title: Option<Expr>,
        props: Vec<Property>,
        children: Vec<Element>,
    },
    /// Any other composite widget (card, tabs, badge, carousel, ...):
    /// a name, optional leading text, generic properties, and children.
    Widget {
        name: String,
        text: Option<Expr>,
        props: Vec<Property>,
        children: Vec<Element>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutDirection {
    Row,
    Col,
}

/// An inline property: `key=value` or a bare boolean flag `key`.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub key: String,
    pub value: Option<Expr>,
    pub loc: Loc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableColumn {
    pub header: String,
    pub value: Expr,
    pub loc: Loc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub name: String,
    pub ty: Option<TypeExpr>,
    pub props: Vec<Property>,
    pub loc: Loc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormSubmit {
    pub label: String,
    pub action: Expr,
    pub loc: Loc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NavItem {
    pub label: String,
    pub target: Expr,
    pub loc: Loc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub label: String,
    pub value: Expr,
    pub loc: Loc,
}

/// Composite widgets recognized by name in element position. Not reserved
/// words: outside element position these spellings are plain identifiers.
pub const WIDGETS: &[&str] = &[
    "table",
    "form",
    "modal",
    "chart",
    "nav",
    "card",
    "list",
    "grid",
    "tabs",
    "tab",
    "accordion",
    "dropdown",
    "menu",
    "sidebar",
    "header",
    "footer",
    "hero",
    "badge",
    "avatar",
    "alert",
    "toast",
    "tooltip",
    "progress",
    "spinner",
    "slider",
    "stepper",
    "carousel",
    "gallery",
    "video",
    "audio",
    "calendar",
    "datepicker",
    "timeline",
    "rating",
    "search",
    "pagination",
    "breadcrumb",
    "divider",
    "markdown",
    "code",
    "upload",
];

/// Check if a name is a composite widget.
pub fn is_widget(name: &str) -> bool {
    WIDGETS.contains(&name)
}

// ---------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------

/// A statement inside a function, lifecycle, watch, or endpoint body.
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub loc: Loc,
}

/// Statement variants — a small closed set, independent of the element set.
#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// `let name: type = expr`
    Let {
        name: String,
        ty: Option<TypeExpr>,
        value: Expr,
    },
    /// `return` or `return expr`
    Return(Option<Expr>),
    /// `if cond:` / `elif cond:` / `else:` over statement bodies.
    If {
        arms: Vec<(Expr, Vec<Stmt>)>,
        else_body: Option<Vec<Stmt>>,
    },
    /// `for name in expr:` over a statement body.
    For {
        var: String,
        iterable: Expr,
        body: Vec<Stmt>,
    },
    /// A bare expression (assignments included: `count += 1`).
    Expr(Expr),
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

/// An expression node.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub loc: Loc,
}

/// Expression variants.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Numeric literal: `42`, `3.14`
    Number(f64),

    /// String literal with no interpolation: `"hello"`
    Str(String),

    /// String with `{expr}` interpolation, split into parts.
    Template(Vec<TemplatePart>),

    /// Boolean literal
    Boolean(bool),

    /// Null literal
    Null,

    /// Color literal: `#1a2b3c` (hex digits, no `#`)
    Color(String),

    /// Identifier: `count`, `is_active`
    Identifier(String),

    /// Member access: `user.name`
    Member { object: Box<Expr>, property: String },

    /// Indexed access: `items[0]`
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },

    /// Function call: `save()`, `items.push(item)`
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },

    /// Binary operation: `a + b`, `count > 0`
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },

    /// Unary operation: `!active`, `-count`
    Unary { op: UnaryOp, operand: Box<Expr> },

    /// Ternary: `count > 0 ? "yes" : "no"`
    Ternary {
        condition: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },

    /// Lambda: `x => x + 1`, `(a, b) => a * b`
    Lambda { params: Vec<String>, body: Box<Expr> },

    /// Array literal: `[1, 2, 3]`
    Array(Vec<Expr>),

    /// Object literal: `{ count: 0, name: "test" }`
    Object(Vec<ObjectField>),

    /// Assignment as an expression: `count = 5`, `count += 1`
    Assign {
        target: Box<Expr>,
        op: AssignOp,
        value: Box<Expr>,
    },

    /// `await expr`
    Await(Box<Expr>),

    /// `old(expr)` — pre-change value inside `check` conditions.
    Old(Box<Expr>),

    /// Explicitly parenthesized expression, preserved so generated code
    /// keeps the author's grouping.
    Group(Box<Expr>),
}

/// One segment of an interpolated string.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    Text(String),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectField {
    pub key: String,
    pub value: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Neq,
    Lt,
    Gt,
    Lte,
    Gte,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
}

// ---------------------------------------------------------------------------
// Type expressions
// ---------------------------------------------------------------------------

/// A type annotation: primitives and named references, `list[T]`,
/// `map[K, V]`, `set[T]`, inline object shapes, and postfix `?`.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    Named(String),
    List(Box<TypeExpr>),
    Map(Box<TypeExpr>, Box<TypeExpr>),
    Set(Box<TypeExpr>),
    Object(Vec<(String, TypeExpr)>),
    Optional(Box<TypeExpr>),
}
