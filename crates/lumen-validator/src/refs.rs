//! Reference collection.
//!
//! Walks a scope body and records every identifier that appears in
//! expression position: element contents, inline property values, widget
//! mini-grammar entries, bindings, statement bodies, derived expressions,
//! check conditions, and config-entry values. Member chains contribute
//! their base identifier (`cart.total` references `cart`).

use std::collections::HashSet;

use lumen_parser::ast::{
    ConfigEntry, Decl, Element, ElementKind, Expr, ExprKind, Item, Stmt, StmtKind, TemplatePart,
};

/// Every name referenced anywhere in a scope body.
#[derive(Debug, Default)]
pub(crate) struct Refs {
    pub used: HashSet<String>,
}

impl Refs {
    pub fn collect(body: &[Item]) -> Self {
        let mut refs = Refs::default();
        for item in body {
            match item {
                Item::Decl(decl) => refs.walk_decl(decl),
                Item::Element(element) => refs.walk_element(element),
                Item::Comment(_) => {}
            }
        }
        refs
    }

    fn walk_decl(&mut self, decl: &Decl) {
        match decl {
            Decl::State { value, .. } => self.walk_expr(value),
            Decl::Derived { expr, .. } => self.walk_expr(expr),
            Decl::Prop { default, .. } => {
                if let Some(default) = default {
                    self.walk_expr(default);
                }
            }
            Decl::TypeAlias { .. } => {}
            Decl::Store { fields, .. } => {
                for field in fields {
                    self.walk_expr(&field.value);
                }
            }
            Decl::Api { entries, .. } => self.walk_entries(entries),
            Decl::Function(f) => {
                for param in &f.params {
                    if let Some(default) = &param.default {
                        self.walk_expr(default);
                    }
                }
                self.walk_stmts(&f.body);
            }
            Decl::OnMount { body, .. } | Decl::OnDestroy { body, .. } => self.walk_stmts(body),
            Decl::Watch { target, body, .. } => {
                // Watching a binding is a use of it.
                self.used.insert(target.clone());
                self.walk_stmts(body);
            }
            Decl::Check { condition, .. } => self.walk_expr(condition),
            Decl::Style { entries, .. } => self.walk_entries(entries),
        }
    }

    fn walk_entries(&mut self, entries: &[ConfigEntry]) {
        for entry in entries {
            if let Some(value) = &entry.value {
                self.walk_expr(value);
            }
        }
    }

    fn walk_props(&mut self, props: &[lumen_parser::ast::Property]) {
        for prop in props {
            if let Some(value) = &prop.value {
                self.walk_expr(value);
            }
        }
    }

    fn walk_elements(&mut self, elements: &[Element]) {
        for element in elements {
            self.walk_element(element);
        }
    }

    fn walk_element(&mut self, element: &Element) {
        match &element.kind {
            ElementKind::Layout {
                props, children, ..
            } => {
                self.walk_props(props);
                self.walk_elements(children);
            }
            ElementKind::Text { content, props } => {
                self.walk_expr(content);
                self.walk_props(props);
            }
            ElementKind::Button {
                label,
                props,
                action,
            } => {
                self.walk_expr(label);
                self.walk_props(props);
                if let Some(action) = action {
                    self.walk_expr(action);
                }
            }
            ElementKind::Input { binding, props } => {
                if let Some(binding) = binding {
                    self.used.insert(binding.clone());
                }
                self.walk_props(props);
            }
            ElementKind::Image { source, props } => {
                self.walk_expr(source);
                self.walk_props(props);
            }
            ElementKind::Link { label, props } => {
                self.walk_expr(label);
                self.walk_props(props);
            }
            ElementKind::Toggle { binding, props } | ElementKind::Select { binding, props } => {
                self.used.insert(binding.clone());
                self.walk_props(props);
            }
            ElementKind::If {
                arms,
                else_children,
            } => {
                for (cond, children) in arms {
                    self.walk_expr(cond);
                    self.walk_elements(children);
                }
                if let Some(children) = else_children {
                    self.walk_elements(children);
                }
            }
            ElementKind::For {
                iterable, children, ..
            } => {
                self.walk_expr(iterable);
                self.walk_elements(children);
            }
            ElementKind::Show {
                condition,
                children,
            }
            | ElementKind::Hide {
                condition,
                children,
            } => {
                self.walk_expr(condition);
                self.walk_elements(children);
            }
            ElementKind::ComponentCall { args, .. } => {
                for arg in args {
                    self.walk_expr(arg);
                }
            }
            ElementKind::Table { props, columns } => {
                self.walk_props(props);
                for column in columns {
                    self.walk_expr(&column.value);
                }
            }
            ElementKind::Form {
                props,
                fields,
                submit,
            } => {
                self.walk_props(props);
                for field in fields {
                    self.walk_props(&field.props);
                }
                if let Some(submit) = submit {
                    self.walk_expr(&submit.action);
                }
            }
            ElementKind::Nav { props, items } => {
                self.walk_props(props);
                for item in items {
                    self.walk_expr(&item.target);
                }
            }
            ElementKind::Chart { props, series } => {
                self.walk_props(props);
                for entry in series {
                    self.walk_expr(&entry.value);
                }
            }
            ElementKind::Modal {
                title,
                props,
                children,
            } => {
                if let Some(title) = title {
                    self.walk_expr(title);
                }
                self.walk_props(props);
                self.walk_elements(children);
            }
            ElementKind::Widget {
                text,
                props,
                children,
                ..
            } => {
                if let Some(text) = text {
                    self.walk_expr(text);
                }
                self.walk_props(props);
                self.walk_elements(children);
            }
        }
    }

    fn walk_stmts(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            match &stmt.kind {
                StmtKind::Let { value, .. } => self.walk_expr(value),
                StmtKind::Return(value) => {
                    if let Some(value) = value {
                        self.walk_expr(value);
                    }
                }
                StmtKind::If { arms, else_body } => {
                    for (cond, body) in arms {
                        self.walk_expr(cond);
                        self.walk_stmts(body);
                    }
                    if let Some(body) = else_body {
                        self.walk_stmts(body);
                    }
                }
                StmtKind::For { iterable, body, .. } => {
                    self.walk_expr(iterable);
                    self.walk_stmts(body);
                }
                StmtKind::Expr(expr) => self.walk_expr(expr),
            }
        }
    }

    pub fn walk_expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Identifier(name) => {
                self.used.insert(name.clone());
            }
            ExprKind::Member { object, .. } => self.walk_expr(object),
            ExprKind::Index { object, index } => {
                self.walk_expr(object);
                self.walk_expr(index);
            }
            ExprKind::Call { callee, args } => {
                self.walk_expr(callee);
                for arg in args {
                    self.walk_expr(arg);
                }
            }
            ExprKind::Binary { left, right, .. } => {
                self.walk_expr(left);
                self.walk_expr(right);
            }
            ExprKind::Unary { operand, .. } => self.walk_expr(operand),
            ExprKind::Ternary {
                condition,
                then,
                otherwise,
            } => {
                self.walk_expr(condition);
                self.walk_expr(then);
                self.walk_expr(otherwise);
            }
            ExprKind::Lambda { body, .. } => self.walk_expr(body),
            ExprKind::Array(items) => {
                for item in items {
                    self.walk_expr(item);
                }
            }
            ExprKind::Object(fields) => {
                for field in fields {
                    self.walk_expr(&field.value);
                }
            }
            ExprKind::Assign { target, value, .. } => {
                self.walk_expr(target);
                self.walk_expr(value);
            }
            ExprKind::Await(inner) | ExprKind::Old(inner) | ExprKind::Group(inner) => {
                self.walk_expr(inner)
            }
            ExprKind::Template(parts) => {
                for part in parts {
                    if let TemplatePart::Expr(e) = part {
                        self.walk_expr(e);
                    }
                }
            }
            ExprKind::Number(_)
            | ExprKind::Str(_)
            | ExprKind::Boolean(_)
            | ExprKind::Null
            | ExprKind::Color(_) => {}
        }
    }
}
