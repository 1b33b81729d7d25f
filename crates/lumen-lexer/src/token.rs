/// A position in source text, tracking line and column for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, line: usize, column: usize) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }
}

/// Token classification for Lumen source.
///
/// Data-carrying variants embed their value directly (no separate `value`
/// field on Token). Keywords share one variant carrying their spelling; the
/// parser decides whether a spelling is structural in context, which is what
/// lets `type` be a declaration in one position and a plain identifier in
/// another without re-lexing.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Structure
    Indent,
    Dedent,
    Newline,

    // Words
    Keyword(String),
    Identifier(String),
    AtKeyword(String),
    HttpMethod(String),

    // Literals (carry data)
    Number(f64),
    Str(String),
    Boolean(bool),
    Null,
    Color(String),
    Comment(String),

    // Operators (two-character forms matched greedily by the scanner)
    Operator(&'static str),

    // Punctuation
    Colon,
    Comma,
    Dot,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,

    // End of input
    Eof,
}

/// A token produced by the Lumen lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Check for a specific operator token.
    pub fn is_operator(&self, op: &str) -> bool {
        matches!(&self.kind, TokenKind::Operator(o) if *o == op)
    }

    /// Check for a specific keyword token.
    pub fn is_keyword(&self, kw: &str) -> bool {
        matches!(&self.kind, TokenKind::Keyword(k) if k == kw)
    }

    /// The word carried by an identifier or keyword token, if any.
    /// Keywords double as identifiers outside structural position.
    pub fn word(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Identifier(s) | TokenKind::Keyword(s) => Some(s),
            _ => None,
        }
    }
}

/// The full reserved-word table. A spelling in this table lexes as
/// `Keyword`; everything else is an `Identifier`. Also the candidate set
/// for typo suggestions in error messages.
pub const KEYWORDS: &[&str] = &[
    // Top-level declarations
    "app",
    "page",
    "component",
    "model",
    "auth",
    "route",
    "roles",
    "automation",
    "dev",
    "deploy",
    "env",
    "docker",
    "ci",
    "domain",
    "cdn",
    "monitor",
    "backup",
    "endpoint",
    "middleware",
    "queue",
    "cron",
    "cache",
    "migrate",
    "seed",
    "webhook",
    "storage",
    "test",
    "e2e",
    "mock",
    "fixture",
    "i18n",
    "locale",
    "rtl",
    // Body declarations
    "state",
    "derived",
    "prop",
    "type",
    "store",
    "api",
    "fn",
    "on",
    "mount",
    "destroy",
    "watch",
    "check",
    "style",
    // Statements
    "let",
    "return",
    "if",
    "elif",
    "else",
    "for",
    "in",
    // UI elements
    "layout",
    "text",
    "button",
    "input",
    "image",
    "link",
    "toggle",
    "select",
    "show",
    "hide",
    // Connectives and expression keywords
    "at",
    "to",
    "await",
    "old",
];

/// Check if a spelling is in the reserved-word table.
pub fn is_reserved(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

/// HTTP-method literals recognized in endpoint declarations.
pub const HTTP_METHODS: &[&str] = &["GET", "POST", "PUT", "DELETE", "PATCH"];
