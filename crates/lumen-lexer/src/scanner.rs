use crate::token::{Span, Token, TokenKind, HTTP_METHODS};
use crate::LexerError;

/// Lumen source scanner.
///
/// Tokenizes `.lum` source files into a stream of tokens in a single
/// left-to-right pass:
/// - `Vec<char>` source for index-based navigation
/// - Stack-based indentation tracking with synthetic dedents at EOF
/// - Greedy two-character operator matching
/// - Position tracking on every token
pub struct Scanner {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    tokens: Vec<Token>,
    indent_stack: Vec<usize>,
    at_line_start: bool,
}

impl Scanner {
    /// Create a new scanner for the given source.
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            tokens: Vec::new(),
            indent_stack: vec![0],
            at_line_start: true,
        }
    }

    /// Tokenize the entire source into a vector of tokens.
    pub fn tokenize(source: &str) -> Result<Vec<Token>, LexerError> {
        let mut scanner = Scanner::new(source);
        scanner.scan_tokens()?;
        Ok(scanner.tokens)
    }

    /// Scan all tokens from the source.
    fn scan_tokens(&mut self) -> Result<(), LexerError> {
        while !self.is_at_end() {
            self.scan_token()?;
        }

        // Close all pending indents at EOF
        while self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            self.emit(TokenKind::Dedent);
        }

        self.emit(TokenKind::Eof);
        Ok(())
    }

    /// Scan the next token.
    fn scan_token(&mut self) -> Result<(), LexerError> {
        if self.at_line_start {
            self.handle_indentation()?;
            self.at_line_start = false;
            if self.is_at_end() {
                return Ok(());
            }
        }

        let ch = self.peek();

        match ch {
            // Whitespace (mid-line, skip)
            ' ' | '\t' => {
                self.advance();
                Ok(())
            }

            // Newlines
            '\n' => {
                self.emit(TokenKind::Newline);
                self.advance();
                self.line += 1;
                self.column = 1;
                self.at_line_start = true;
                Ok(())
            }
            '\r' => {
                self.advance();
                // Handle \r\n as single newline
                if !self.is_at_end() && self.peek() == '\n' {
                    self.advance();
                }
                self.emit(TokenKind::Newline);
                self.line += 1;
                self.column = 1;
                self.at_line_start = true;
                Ok(())
            }

            // Comments
            '/' if self.peek_next() == '/' => self.scan_comment(),

            // Strings
            '"' | '\'' => self.scan_string(),

            // Numbers
            '0'..='9' => self.scan_number(),

            // Color literals: # followed by 3 or 6 hex digits
            '#' => self.scan_color(),

            // At-keywords: @mobile, @keypress, ...
            '@' => self.scan_at_keyword(),

            // Punctuation
            ':' => self.emit_single(TokenKind::Colon),
            ',' => self.emit_single(TokenKind::Comma),
            '.' => self.emit_single(TokenKind::Dot),
            '(' => self.emit_single(TokenKind::LParen),
            ')' => self.emit_single(TokenKind::RParen),
            '[' => self.emit_single(TokenKind::LBracket),
            ']' => self.emit_single(TokenKind::RBracket),
            '{' => self.emit_single(TokenKind::LBrace),
            '}' => self.emit_single(TokenKind::RBrace),

            // Operators, two-character forms first
            '=' => match self.peek_next() {
                '=' => self.emit_operator("==", 2),
                '>' => self.emit_operator("=>", 2),
                _ => self.emit_operator("=", 1),
            },
            '!' => match self.peek_next() {
                '=' => self.emit_operator("!=", 2),
                _ => self.emit_operator("!", 1),
            },
            '<' => match self.peek_next() {
                '=' => self.emit_operator("<=", 2),
                _ => self.emit_operator("<", 1),
            },
            '>' => match self.peek_next() {
                '=' => self.emit_operator(">=", 2),
                _ => self.emit_operator(">", 1),
            },
            '+' => match self.peek_next() {
                '=' => self.emit_operator("+=", 2),
                _ => self.emit_operator("+", 1),
            },
            '-' => match self.peek_next() {
                '=' => self.emit_operator("-=", 2),
                '>' => self.emit_operator("->", 2),
                _ => self.emit_operator("-", 1),
            },
            '&' if self.peek_next() == '&' => self.emit_operator("&&", 2),
            '|' if self.peek_next() == '|' => self.emit_operator("||", 2),
            '*' => self.emit_operator("*", 1),
            '/' => self.emit_operator("/", 1),
            '%' => self.emit_operator("%", 1),
            '?' => self.emit_operator("?", 1),

            // Identifiers and keywords
            c if c.is_alphabetic() || c == '_' => self.scan_word(),

            _ => Err(self.unexpected_character(ch)),
        }
    }

    // --- Indentation ---

    /// Handle indentation at the start of a line.
    /// Counts leading spaces, compares with indent stack, emits Indent/Dedent.
    fn handle_indentation(&mut self) -> Result<(), LexerError> {
        let mut spaces = 0;

        while !self.is_at_end() && self.peek() == ' ' {
            self.advance();
            spaces += 1;
        }

        if !self.is_at_end() && self.peek() == '\t' {
            return Err(self.error("Tabs are not allowed for indentation, use spaces".into()));
        }

        // Blank lines (just whitespace then newline or EOF) never affect indentation
        if self.is_at_end() || self.peek() == '\n' || self.peek() == '\r' {
            return Ok(());
        }

        // Comment-only lines don't affect indentation either
        if self.peek() == '/' && self.peek_next() == '/' {
            return Ok(());
        }

        let current_indent = *self.indent_stack.last().expect("indent stack never empty");

        if spaces > current_indent {
            self.indent_stack.push(spaces);
            self.emit(TokenKind::Indent);
        } else if spaces < current_indent {
            // Pop multiple levels if needed
            while self.indent_stack.len() > 1
                && *self.indent_stack.last().expect("indent stack never empty") > spaces
            {
                self.indent_stack.pop();
                self.emit(TokenKind::Dedent);
            }

            // Validate alignment against an existing level
            if *self.indent_stack.last().expect("indent stack never empty") != spaces {
                return Err(self.error(format!(
                    "Inconsistent indentation: {spaces} spaces does not match any outer level"
                )));
            }
        }

        Ok(())
    }

    // --- Scanners ---

    /// Scan a string literal. Strings carry raw content including `{expr}`
    /// spans, copied verbatim without interpretation; the parser splits
    /// interpolation segments later, tracking brace depth as it does.
    fn scan_string(&mut self) -> Result<(), LexerError> {
        let quote = self.peek();
        let start_line = self.line;
        let start_col = self.column;
        let start_pos = self.pos;
        self.advance(); // consume opening quote

        let mut value = String::new();

        while !self.is_at_end() && self.peek() != quote {
            match self.peek() {
                '\n' | '\r' => break,
                '\\' => {
                    self.advance(); // consume backslash
                    if self.is_at_end() {
                        return Err(LexerError {
                            message: "Unterminated escape sequence".into(),
                            line: self.line,
                            column: self.column,
                        });
                    }
                    match self.peek() {
                        'n' => value.push('\n'),
                        't' => value.push('\t'),
                        'r' => value.push('\r'),
                        '\\' => value.push('\\'),
                        // Escaped braces stay escaped in the raw token so the
                        // parser's template splitter can tell them apart from
                        // `{expr}` interpolation; it unescapes them.
                        '{' => value.push_str("\\{"),
                        '}' => value.push_str("\\}"),
                        c if c == quote => value.push(c),
                        c => {
                            value.push('\\');
                            value.push(c);
                        }
                    }
                    self.advance();
                }
                c => {
                    value.push(c);
                    self.advance();
                }
            }
        }

        if self.is_at_end() || self.peek() != quote {
            return Err(LexerError {
                message: "Unterminated string".into(),
                line: start_line,
                column: start_col,
            });
        }

        self.advance(); // consume closing quote

        let span = Span::new(start_pos, self.pos, start_line, start_col);
        self.tokens.push(Token::new(TokenKind::Str(value), span));
        Ok(())
    }

    /// Scan a color literal: `#` followed by exactly 3 or 6 hex digits.
    /// Tagged distinctly from strings so downstream code can treat it as a
    /// value without quotes.
    fn scan_color(&mut self) -> Result<(), LexerError> {
        let start_line = self.line;
        let start_col = self.column;
        let start_pos = self.pos;
        self.advance(); // consume `#`

        let mut digits = String::new();
        while !self.is_at_end() && self.peek().is_ascii_hexdigit() {
            digits.push(self.peek());
            self.advance();
        }

        if digits.len() != 3 && digits.len() != 6 {
            return Err(LexerError {
                message: format!("Invalid color literal '#{digits}': expected 3 or 6 hex digits"),
                line: start_line,
                column: start_col,
            });
        }

        let span = Span::new(start_pos, self.pos, start_line, start_col);
        self.tokens.push(Token::new(TokenKind::Color(digits), span));
        Ok(())
    }

    /// Scan an at-keyword: `@` followed by a word (`@mobile`, `@keypress`).
    fn scan_at_keyword(&mut self) -> Result<(), LexerError> {
        let start_line = self.line;
        let start_col = self.column;
        let start_pos = self.pos;
        self.advance(); // consume `@`

        if self.is_at_end() || !(self.peek().is_alphabetic() || self.peek() == '_') {
            return Err(LexerError {
                message: "Expected a name after '@'".into(),
                line: start_line,
                column: start_col,
            });
        }

        let mut name = String::new();
        while !self.is_at_end() && (self.peek().is_alphanumeric() || self.peek() == '_') {
            name.push(self.peek());
            self.advance();
        }

        let span = Span::new(start_pos, self.pos, start_line, start_col);
        self.tokens.push(Token::new(TokenKind::AtKeyword(name), span));
        Ok(())
    }

    /// Scan an identifier, keyword, literal word, or HTTP-method literal.
    fn scan_word(&mut self) -> Result<(), LexerError> {
        let start_line = self.line;
        let start_col = self.column;
        let start_pos = self.pos;

        let mut word = String::new();
        word.push(self.peek());
        self.advance();

        while !self.is_at_end() && (self.peek().is_alphanumeric() || self.peek() == '_') {
            word.push(self.peek());
            self.advance();
        }

        let kind = match word.as_str() {
            "true" => TokenKind::Boolean(true),
            "false" => TokenKind::Boolean(false),
            "null" => TokenKind::Null,
            w if HTTP_METHODS.contains(&w) => TokenKind::HttpMethod(word),
            w if crate::token::is_reserved(w) => TokenKind::Keyword(word),
            _ => TokenKind::Identifier(word),
        };

        let span = Span::new(start_pos, self.pos, start_line, start_col);
        self.tokens.push(Token::new(kind, span));
        Ok(())
    }

    /// Scan a number literal (integer or float).
    fn scan_number(&mut self) -> Result<(), LexerError> {
        let start_line = self.line;
        let start_col = self.column;
        let start_pos = self.pos;

        while !self.is_at_end() && self.peek().is_ascii_digit() {
            self.advance();
        }
        if !self.is_at_end() && self.peek() == '.' && self.peek_next().is_ascii_digit() {
            self.advance(); // consume `.`
            while !self.is_at_end() && self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let text: String = self.chars[start_pos..self.pos].iter().collect();
        let value: f64 = text.parse().map_err(|_| LexerError {
            message: format!("Invalid number: '{text}'"),
            line: start_line,
            column: start_col,
        })?;

        let span = Span::new(start_pos, self.pos, start_line, start_col);
        self.tokens.push(Token::new(TokenKind::Number(value), span));
        Ok(())
    }

    /// Scan a line comment (`// ...`).
    fn scan_comment(&mut self) -> Result<(), LexerError> {
        let start_line = self.line;
        let start_col = self.column;
        let start_pos = self.pos;

        // Skip the two `/` characters
        self.advance();
        self.advance();

        // Skip optional space after //
        if !self.is_at_end() && self.peek() == ' ' {
            self.advance();
        }

        let mut content = String::new();
        while !self.is_at_end() && self.peek() != '\n' && self.peek() != '\r' {
            content.push(self.peek());
            self.advance();
        }

        let span = Span::new(start_pos, self.pos, start_line, start_col);
        self.tokens
            .push(Token::new(TokenKind::Comment(content), span));
        Ok(())
    }

    // --- Helpers ---

    fn emit(&mut self, kind: TokenKind) {
        let span = Span::new(self.pos, self.pos, self.line, self.column);
        self.tokens.push(Token::new(kind, span));
    }

    fn emit_single(&mut self, kind: TokenKind) -> Result<(), LexerError> {
        let span = Span::new(self.pos, self.pos + 1, self.line, self.column);
        self.tokens.push(Token::new(kind, span));
        self.advance();
        Ok(())
    }

    fn emit_operator(&mut self, op: &'static str, width: usize) -> Result<(), LexerError> {
        let span = Span::new(self.pos, self.pos + width, self.line, self.column);
        self.tokens.push(Token::new(TokenKind::Operator(op), span));
        for _ in 0..width {
            self.advance();
        }
        Ok(())
    }

    fn peek(&self) -> char {
        if self.is_at_end() {
            '\0'
        } else {
            self.chars[self.pos]
        }
    }

    fn peek_next(&self) -> char {
        if self.pos + 1 >= self.chars.len() {
            '\0'
        } else {
            self.chars[self.pos + 1]
        }
    }

    fn advance(&mut self) {
        if !self.is_at_end() {
            self.pos += 1;
            self.column += 1;
        }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn error(&self, message: String) -> LexerError {
        LexerError {
            message,
            line: self.line,
            column: self.column,
        }
    }

    fn unexpected_character(&self, ch: char) -> LexerError {
        let mut message = format!("Unexpected character: '{ch}'");
        if let Some(hint) = lumen_diagnostics::framework_hint(&ch.to_string()) {
            message.push_str(&format!(" ({hint})"));
        }
        self.error(message)
    }
}
