//! Expression and type-expression parsing.
//!
//! Precedence climbing, loosest to tightest: assignment and lambdas,
//! ternary, `||`, `&&`, equality, comparison, additive, multiplicative,
//! unary, postfix (member access, indexing, calls), primary.
//!
//! String literals are split here into template parts: `{expr}` segments
//! are re-lexed and parsed as embedded expressions, `\{` and `\}` become
//! literal braces.

use crate::ast::{
    AssignOp, BinaryOp, Expr, ExprKind, Loc, ObjectField, TemplatePart, TypeExpr, UnaryOp,
};
use crate::parser::Parser;
use crate::ParseError;
use lumen_lexer::{Scanner, TokenKind};

impl Parser {
    /// Parse a full expression, assignments and lambdas included.
    pub(crate) fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.parse_assign()
    }

    /// Assignment (`=`, `+=`, `-=`) and single-parameter lambdas. Both are
    /// right-associative and hang off an already-parsed operand.
    fn parse_assign(&mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_ternary()?;

        if self.peek().is_operator("=>") {
            let ExprKind::Identifier(param) = &expr.kind else {
                return Err(self.error("Lambda parameters must be plain identifiers".into()));
            };
            let param = param.clone();
            let loc = expr.loc;
            self.advance();
            let body = self.parse_assign()?;
            return Ok(Expr {
                kind: ExprKind::Lambda {
                    params: vec![param],
                    body: Box::new(body),
                },
                loc,
            });
        }

        let op = match &self.peek().kind {
            TokenKind::Operator("=") => Some(AssignOp::Assign),
            TokenKind::Operator("+=") => Some(AssignOp::AddAssign),
            TokenKind::Operator("-=") => Some(AssignOp::SubAssign),
            _ => None,
        };

        if let Some(op) = op {
            if !matches!(
                expr.kind,
                ExprKind::Identifier(_) | ExprKind::Member { .. } | ExprKind::Index { .. }
            ) {
                return Err(self.error("Invalid assignment target".into()));
            }
            let loc = expr.loc;
            self.advance();
            let value = self.parse_assign()?;
            return Ok(Expr {
                kind: ExprKind::Assign {
                    target: Box::new(expr),
                    op,
                    value: Box::new(value),
                },
                loc,
            });
        }

        Ok(expr)
    }

    /// `cond ? then : otherwise`, right-associative.
    fn parse_ternary(&mut self) -> Result<Expr, ParseError> {
        let condition = self.parse_or()?;

        if self.peek().is_operator("?") {
            let loc = condition.loc;
            self.advance();
            let then = self.parse_ternary()?;
            self.expect_colon()?;
            let otherwise = self.parse_ternary()?;
            return Ok(Expr {
                kind: ExprKind::Ternary {
                    condition: Box::new(condition),
                    then: Box::new(then),
                    otherwise: Box::new(otherwise),
                },
                loc,
            });
        }

        Ok(condition)
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_and()?;
        while let Some(op) = self.match_binary(&[("||", BinaryOp::Or)]) {
            left = self.binary(left, op, Self::parse_and)?;
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_equality()?;
        while let Some(op) = self.match_binary(&[("&&", BinaryOp::And)]) {
            left = self.binary(left, op, Self::parse_equality)?;
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_comparison()?;
        while let Some(op) = self.match_binary(&[("==", BinaryOp::Eq), ("!=", BinaryOp::Neq)]) {
            left = self.binary(left, op, Self::parse_comparison)?;
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_additive()?;
        while let Some(op) = self.match_binary(&[
            ("<=", BinaryOp::Lte),
            (">=", BinaryOp::Gte),
            ("<", BinaryOp::Lt),
            (">", BinaryOp::Gt),
        ]) {
            left = self.binary(left, op, Self::parse_additive)?;
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_multiplicative()?;
        while let Some(op) = self.match_binary(&[("+", BinaryOp::Add), ("-", BinaryOp::Sub)]) {
            left = self.binary(left, op, Self::parse_multiplicative)?;
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;
        while let Some(op) = self.match_binary(&[
            ("*", BinaryOp::Mul),
            ("/", BinaryOp::Div),
            ("%", BinaryOp::Mod),
        ]) {
            left = self.binary(left, op, Self::parse_unary)?;
        }
        Ok(left)
    }

    /// Consume one of the given operators if it is next.
    fn match_binary(&mut self, ops: &[(&str, BinaryOp)]) -> Option<BinaryOp> {
        if let TokenKind::Operator(o) = self.peek().kind {
            for (sym, op) in ops {
                if o == *sym {
                    self.advance();
                    return Some(*op);
                }
            }
        }
        None
    }

    fn binary(
        &mut self,
        left: Expr,
        op: BinaryOp,
        parse_right: fn(&mut Self) -> Result<Expr, ParseError>,
    ) -> Result<Expr, ParseError> {
        let loc = left.loc;
        let right = parse_right(self)?;
        Ok(Expr {
            kind: ExprKind::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
            },
            loc,
        })
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let loc = self.loc();

        let op = match &self.peek().kind {
            TokenKind::Operator("!") => Some(UnaryOp::Not),
            TokenKind::Operator("-") => Some(UnaryOp::Neg),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(Expr {
                kind: ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
                loc,
            });
        }

        if self.peek().is_keyword("await") {
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(Expr {
                kind: ExprKind::Await(Box::new(operand)),
                loc,
            });
        }

        self.parse_postfix()
    }

    /// Member access, indexing, and calls, left-associative.
    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;

        loop {
            match &self.peek().kind {
                TokenKind::Dot => {
                    self.advance();
                    let Some(property) = self.peek().word() else {
                        return Err(self.expected("a property name after '.'"));
                    };
                    let property = property.to_string();
                    self.advance();
                    let loc = expr.loc;
                    expr = Expr {
                        kind: ExprKind::Member {
                            object: Box::new(expr),
                            property,
                        },
                        loc,
                    };
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expression()?;
                    if !matches!(self.peek().kind, TokenKind::RBracket) {
                        return Err(self.expected("']' after index"));
                    }
                    self.advance();
                    let loc = expr.loc;
                    expr = Expr {
                        kind: ExprKind::Index {
                            object: Box::new(expr),
                            index: Box::new(index),
                        },
                        loc,
                    };
                }
                TokenKind::LParen => {
                    self.advance();
                    let args = self.parse_call_args()?;
                    let loc = expr.loc;
                    expr = Expr {
                        kind: ExprKind::Call {
                            callee: Box::new(expr),
                            args,
                        },
                        loc,
                    };
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    /// Parse call arguments after the `(` has been consumed. A trailing
    /// group of `name: value` pairs is folded into a single object-literal
    /// argument, so `Card(title: "Hi", width: 300)` carries one argument.
    pub(crate) fn parse_call_args(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut args = Vec::new();

        loop {
            if matches!(self.peek().kind, TokenKind::RParen) {
                self.advance();
                break;
            }

            if self.at_named_arg() {
                let loc = self.loc();
                let mut fields = Vec::new();
                loop {
                    let key = match self.peek().word() {
                        Some(w) => w.to_string(),
                        None => return Err(self.expected("an argument name")),
                    };
                    self.advance();
                    self.expect_colon()?;
                    let value = self.parse_expression()?;
                    fields.push(ObjectField { key, value });

                    if matches!(self.peek().kind, TokenKind::Comma) {
                        self.advance();
                        if !self.at_named_arg() {
                            return Err(self.error(
                                "Positional arguments must come before named arguments".into(),
                            ));
                        }
                    } else {
                        break;
                    }
                }
                args.push(Expr {
                    kind: ExprKind::Object(fields),
                    loc,
                });
                if !matches!(self.peek().kind, TokenKind::RParen) {
                    return Err(self.expected("')' after named arguments"));
                }
                self.advance();
                break;
            }

            args.push(self.parse_expression()?);
            match self.peek().kind {
                TokenKind::Comma => self.advance(),
                TokenKind::RParen => {
                    self.advance();
                    break;
                }
                _ => return Err(self.expected("',' or ')' in argument list")),
            }
        }

        Ok(args)
    }

    /// Whether the next tokens start a `name: value` named argument.
    fn at_named_arg(&self) -> bool {
        self.peek().word().is_some()
            && matches!(self.peek_kind_at(1), Some(TokenKind::Colon))
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let loc = self.loc();

        match &self.peek().kind {
            TokenKind::Number(n) => {
                let n = *n;
                self.advance();
                Ok(Expr {
                    kind: ExprKind::Number(n),
                    loc,
                })
            }
            TokenKind::Str(raw) => {
                let raw = raw.clone();
                self.advance();
                self.template_expr(&raw, loc)
            }
            TokenKind::Boolean(b) => {
                let b = *b;
                self.advance();
                Ok(Expr {
                    kind: ExprKind::Boolean(b),
                    loc,
                })
            }
            TokenKind::Null => {
                self.advance();
                Ok(Expr {
                    kind: ExprKind::Null,
                    loc,
                })
            }
            TokenKind::Color(hex) => {
                let hex = hex.clone();
                self.advance();
                Ok(Expr {
                    kind: ExprKind::Color(hex),
                    loc,
                })
            }
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(Expr {
                    kind: ExprKind::Identifier(name),
                    loc,
                })
            }
            TokenKind::Keyword(k) if k == "old" => {
                self.advance();
                if !matches!(self.peek().kind, TokenKind::LParen) {
                    return Err(self.expected("'(' after 'old'"));
                }
                self.advance();
                let inner = self.parse_expression()?;
                if !matches!(self.peek().kind, TokenKind::RParen) {
                    return Err(self.expected("')' after 'old(...)'"));
                }
                self.advance();
                Ok(Expr {
                    kind: ExprKind::Old(Box::new(inner)),
                    loc,
                })
            }
            // Keywords are only reserved in structural position; as an
            // expression operand they demote to plain identifiers, so
            // `text.length` or `state` as a variable still parse.
            TokenKind::Keyword(k) => {
                let name = k.clone();
                self.advance();
                Ok(Expr {
                    kind: ExprKind::Identifier(name),
                    loc,
                })
            }
            TokenKind::LParen => self.parse_paren(loc),
            TokenKind::LBracket => self.parse_array(loc),
            TokenKind::LBrace => self.parse_object(loc),
            _ => Err(self.expected("an expression")),
        }
    }

    /// A parenthesized group or a lambda parameter list.
    fn parse_paren(&mut self, loc: Loc) -> Result<Expr, ParseError> {
        self.advance(); // consume `(`

        if matches!(self.peek().kind, TokenKind::RParen) {
            self.advance();
            self.expect_operator("=>")?;
            let body = self.parse_assign()?;
            return Ok(Expr {
                kind: ExprKind::Lambda {
                    params: Vec::new(),
                    body: Box::new(body),
                },
                loc,
            });
        }

        let mut items = vec![self.parse_expression()?];
        while matches!(self.peek().kind, TokenKind::Comma) {
            self.advance();
            items.push(self.parse_expression()?);
        }
        if !matches!(self.peek().kind, TokenKind::RParen) {
            return Err(self.expected("')'"));
        }
        self.advance();

        if self.peek().is_operator("=>") {
            let params = items
                .iter()
                .map(|e| match &e.kind {
                    ExprKind::Identifier(name) => Ok(name.clone()),
                    _ => Err(self.error("Lambda parameters must be plain identifiers".into())),
                })
                .collect::<Result<Vec<_>, _>>()?;
            self.advance();
            let body = self.parse_assign()?;
            return Ok(Expr {
                kind: ExprKind::Lambda {
                    params,
                    body: Box::new(body),
                },
                loc,
            });
        }

        if items.len() == 1 {
            let inner = items.remove(0);
            Ok(Expr {
                kind: ExprKind::Group(Box::new(inner)),
                loc,
            })
        } else {
            Err(self.expected("'=>' after parameter list"))
        }
    }

    fn parse_array(&mut self, loc: Loc) -> Result<Expr, ParseError> {
        self.advance(); // consume `[`
        let mut items = Vec::new();

        while !matches!(self.peek().kind, TokenKind::RBracket) {
            items.push(self.parse_expression()?);
            match self.peek().kind {
                TokenKind::Comma => self.advance(),
                TokenKind::RBracket => break,
                _ => return Err(self.expected("',' or ']' in array literal")),
            }
        }
        self.advance(); // consume `]`

        Ok(Expr {
            kind: ExprKind::Array(items),
            loc,
        })
    }

    fn parse_object(&mut self, loc: Loc) -> Result<Expr, ParseError> {
        self.advance(); // consume `{`
        let mut fields = Vec::new();

        while !matches!(self.peek().kind, TokenKind::RBrace) {
            let key = match self.peek().word() {
                Some(w) => w.to_string(),
                None => return Err(self.expected("a field name in object literal")),
            };
            self.advance();
            self.expect_colon()?;
            let value = self.parse_expression()?;
            fields.push(ObjectField { key, value });

            match self.peek().kind {
                TokenKind::Comma => self.advance(),
                TokenKind::RBrace => break,
                _ => return Err(self.expected("',' or '}' in object literal")),
            }
        }
        self.advance(); // consume `}`

        Ok(Expr {
            kind: ExprKind::Object(fields),
            loc,
        })
    }

    // =========================================================================
    // String templates
    // =========================================================================

    /// Split a raw string literal into template parts. `{expr}` segments
    /// are re-lexed and parsed; `\{` and `\}` become literal braces. A
    /// string with no interpolation stays a plain `Str`.
    pub(crate) fn template_expr(&mut self, raw: &str, loc: Loc) -> Result<Expr, ParseError> {
        let at = |message: String| ParseError {
            message,
            line: loc.line,
            column: loc.column,
        };

        let chars: Vec<char> = raw.chars().collect();
        let mut parts: Vec<TemplatePart> = Vec::new();
        let mut text = String::new();
        let mut i = 0;

        while i < chars.len() {
            match chars[i] {
                '\\' if i + 1 < chars.len() && (chars[i + 1] == '{' || chars[i + 1] == '}') => {
                    text.push(chars[i + 1]);
                    i += 2;
                }
                '{' => {
                    // Find the matching close brace, nesting-aware so
                    // object literals inside interpolation survive.
                    let start = i + 1;
                    let mut depth = 1usize;
                    let mut j = start;
                    while j < chars.len() && depth > 0 {
                        match chars[j] {
                            '\\' if j + 1 < chars.len() => j += 1,
                            '{' => depth += 1,
                            '}' => depth -= 1,
                            _ => {}
                        }
                        j += 1;
                    }
                    if depth > 0 {
                        return Err(at("Unterminated '{' interpolation in string".into()));
                    }

                    let inner: String = chars[start..j - 1].iter().collect();
                    if inner.trim().is_empty() {
                        return Err(at("Empty interpolation in string".into()));
                    }

                    if !text.is_empty() {
                        parts.push(TemplatePart::Text(std::mem::take(&mut text)));
                    }
                    parts.push(TemplatePart::Expr(parse_embedded(&inner, loc)?));
                    i = j;
                }
                c => {
                    text.push(c);
                    i += 1;
                }
            }
        }

        if parts.is_empty() {
            return Ok(Expr {
                kind: ExprKind::Str(text),
                loc,
            });
        }
        if !text.is_empty() {
            parts.push(TemplatePart::Text(text));
        }
        Ok(Expr {
            kind: ExprKind::Template(parts),
            loc,
        })
    }

    // =========================================================================
    // Type expressions
    // =========================================================================

    /// Parse a type annotation: named types, `list[T]`, `map[K, V]`,
    /// `set[T]`, inline object shapes, and postfix `?` for optionals.
    pub(crate) fn parse_type(&mut self) -> Result<TypeExpr, ParseError> {
        let mut ty = match &self.peek().kind {
            TokenKind::Identifier(w) | TokenKind::Keyword(w) => {
                let w = w.clone();
                self.advance();
                match w.as_str() {
                    "list" if matches!(self.peek().kind, TokenKind::LBracket) => {
                        TypeExpr::List(Box::new(self.parse_bracketed_type()?))
                    }
                    "set" if matches!(self.peek().kind, TokenKind::LBracket) => {
                        TypeExpr::Set(Box::new(self.parse_bracketed_type()?))
                    }
                    "map" if matches!(self.peek().kind, TokenKind::LBracket) => {
                        self.advance(); // consume `[`
                        let key = self.parse_type()?;
                        if !matches!(self.peek().kind, TokenKind::Comma) {
                            return Err(self.expected("',' between map key and value types"));
                        }
                        self.advance();
                        let value = self.parse_type()?;
                        if !matches!(self.peek().kind, TokenKind::RBracket) {
                            return Err(self.expected("']' after map value type"));
                        }
                        self.advance();
                        TypeExpr::Map(Box::new(key), Box::new(value))
                    }
                    _ => TypeExpr::Named(w),
                }
            }
            TokenKind::LBrace => {
                self.advance();
                let mut fields = Vec::new();
                while !matches!(self.peek().kind, TokenKind::RBrace) {
                    let name = match self.peek().word() {
                        Some(w) => w.to_string(),
                        None => return Err(self.expected("a field name in object type")),
                    };
                    self.advance();
                    self.expect_colon()?;
                    let field_ty = self.parse_type()?;
                    fields.push((name, field_ty));

                    match self.peek().kind {
                        TokenKind::Comma => self.advance(),
                        TokenKind::RBrace => break,
                        _ => return Err(self.expected("',' or '}' in object type")),
                    }
                }
                self.advance(); // consume `}`
                TypeExpr::Object(fields)
            }
            _ => return Err(self.expected("a type")),
        };

        while self.peek().is_operator("?") {
            self.advance();
            ty = TypeExpr::Optional(Box::new(ty));
        }

        Ok(ty)
    }

    /// `[T]` after `list` / `set`.
    fn parse_bracketed_type(&mut self) -> Result<TypeExpr, ParseError> {
        self.advance(); // consume `[`
        let inner = self.parse_type()?;
        if !matches!(self.peek().kind, TokenKind::RBracket) {
            return Err(self.expected("']' after element type"));
        }
        self.advance();
        Ok(inner)
    }
}

/// Re-lex and parse one `{expr}` interpolation segment.
fn parse_embedded(source: &str, loc: Loc) -> Result<Expr, ParseError> {
    let at = |message: String| ParseError {
        message,
        line: loc.line,
        column: loc.column,
    };

    let tokens = Scanner::tokenize(source)
        .map_err(|e| at(format!("In string interpolation: {}", e.message)))?;
    let mut parser = Parser::new(tokens);
    let expr = parser
        .parse_expression()
        .map_err(|e| at(format!("In string interpolation: {}", e.message)))?;

    parser.skip_newlines();
    if !parser.is_at_end() {
        return Err(at("Unexpected tokens after interpolated expression".into()));
    }
    Ok(expr)
}
