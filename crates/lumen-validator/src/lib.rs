//! Lumen Validator
//!
//! Semantic checks that run after parsing: duplicate declaration names
//! within a scope, dependency cycles between derived values, and unused
//! state/store bindings. Problems are collected, not thrown: a run yields
//! every error and warning found, each with a position, so editors and
//! the build pipeline can show them all at once.

mod refs;

use std::collections::HashMap;

use lumen_parser::ast::{Decl, Item, Loc, Node, Scope};
use lumen_parser::{ParseError, Parser};
use refs::Refs;

/// A single validation finding.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Diagnostic {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl Diagnostic {
    fn at(message: String, loc: Loc) -> Self {
        Self {
            message,
            line: loc.line,
            column: loc.column,
        }
    }
}

/// The outcome of validating a program: hard errors and advisory
/// warnings, in source order per scope.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct Validation {
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
}

impl Validation {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }
}

/// Validate a parsed program.
pub fn validate(nodes: &[Node]) -> Validation {
    let mut out = Validation::default();
    for node in nodes {
        match node {
            Node::App(scope) | Node::Page(scope) | Node::Component(scope) => {
                check_scope(scope, &mut out);
            }
            _ => {}
        }
    }
    out
}

/// Parse and validate in one step.
pub fn validate_source(source: &str) -> Result<Validation, ParseError> {
    let nodes = Parser::parse(source)?;
    Ok(validate(&nodes))
}

fn check_scope(scope: &Scope, out: &mut Validation) {
    check_duplicates(scope, out);
    check_derived_cycles(scope, out);
    check_unused(scope, out);
}

// =============================================================================
// Duplicate declarations
// =============================================================================

/// State, derived, and prop declarations share one namespace per scope.
/// The error points at the second occurrence and names the first.
fn check_duplicates(scope: &Scope, out: &mut Validation) {
    let mut seen: HashMap<&str, (&'static str, Loc)> = HashMap::new();

    for item in &scope.body {
        let Item::Decl(decl) = item else { continue };
        let (name, kind, loc) = match decl {
            Decl::State { name, loc, .. } => (name, "state", *loc),
            Decl::Derived { name, loc, .. } => (name, "derived", *loc),
            Decl::Prop { name, loc, .. } => (name, "prop", *loc),
            _ => continue,
        };

        if let Some((first_kind, first_loc)) = seen.get(name.as_str()) {
            out.errors.push(Diagnostic::at(
                format!(
                    "Duplicate declaration of '{name}' (first declared as {first_kind} at line {})",
                    first_loc.line
                ),
                loc,
            ));
        } else {
            seen.insert(name, (kind, loc));
        }
    }
}

// =============================================================================
// Derived-dependency cycles
// =============================================================================

/// Detect cycles among derived values. Edges go from a derived value to
/// the derived names its expression references; a self-reference is a
/// one-node cycle. Each cycle is reported once, at its first member in
/// declaration order.
fn check_derived_cycles(scope: &Scope, out: &mut Validation) {
    let mut order: Vec<&str> = Vec::new();
    let mut exprs: HashMap<&str, (&lumen_parser::ast::Expr, Loc)> = HashMap::new();

    for item in &scope.body {
        if let Item::Decl(Decl::Derived {
            name, expr, loc, ..
        }) = item
        {
            if !exprs.contains_key(name.as_str()) {
                order.push(name);
                exprs.insert(name, (expr, *loc));
            }
        }
    }

    // Dependency edges, sorted so traversal order is stable.
    let mut deps: HashMap<&str, Vec<&str>> = HashMap::new();
    for &name in &order {
        let (expr, _) = exprs[name];
        let mut refs = Refs::default();
        refs.walk_expr(expr);
        let mut targets: Vec<&str> = order
            .iter()
            .copied()
            .filter(|candidate| refs.used.contains(*candidate))
            .collect();
        targets.sort_unstable();
        deps.insert(name, targets);
    }

    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        InProgress,
        Done,
    }

    fn visit<'a>(
        name: &'a str,
        deps: &HashMap<&'a str, Vec<&'a str>>,
        exprs: &HashMap<&'a str, (&lumen_parser::ast::Expr, Loc)>,
        marks: &mut HashMap<&'a str, Mark>,
        stack: &mut Vec<&'a str>,
        out: &mut Validation,
    ) {
        match marks.get(name) {
            Some(Mark::Done) => return,
            Some(Mark::InProgress) => {
                let start = stack.iter().position(|n| *n == name).unwrap_or(0);
                let cycle = &stack[start..];
                let (_, loc) = exprs[name];
                let message = if cycle.len() == 1 {
                    format!("Derived value '{name}' depends on itself")
                } else {
                    format!(
                        "Cycle in derived values: {} -> {name}",
                        cycle.join(" -> ")
                    )
                };
                out.errors.push(Diagnostic::at(message, loc));
                // Close out the cycle so it is only reported once.
                for &member in cycle {
                    marks.insert(member, Mark::Done);
                }
                return;
            }
            None => {}
        }

        marks.insert(name, Mark::InProgress);
        stack.push(name);
        for dep in &deps[name] {
            visit(dep, deps, exprs, marks, stack, out);
        }
        stack.pop();
        marks.insert(name, Mark::Done);
    }

    let mut marks: HashMap<&str, Mark> = HashMap::new();
    let mut stack: Vec<&str> = Vec::new();
    for &name in &order {
        visit(name, &deps, &exprs, &mut marks, &mut stack, out);
    }
}

// =============================================================================
// Unused bindings
// =============================================================================

/// Warn about state variables and stores that nothing in the scope ever
/// references. When a referenced-but-undeclared name is a close spelling
/// of the unused binding, the warning points at the likely typo.
fn check_unused(scope: &Scope, out: &mut Validation) {
    let refs = Refs::collect(&scope.body);

    let mut declared: Vec<&str> = Vec::new();
    let mut bindings: Vec<(&str, &'static str, Loc)> = Vec::new();

    for item in &scope.body {
        let Item::Decl(decl) = item else { continue };
        match decl {
            Decl::State { name, loc, .. } => {
                declared.push(name);
                bindings.push((name, "State", *loc));
            }
            Decl::Store { name, loc, .. } => {
                declared.push(name);
                bindings.push((name, "Store", *loc));
            }
            Decl::Derived { name, .. } | Decl::Api { name, .. } => declared.push(name),
            Decl::Prop { name, .. } => declared.push(name),
            Decl::Function(f) => declared.push(&f.name),
            _ => {}
        }
    }
    for param in &scope.params {
        declared.push(&param.name);
    }

    // Names referenced but declared nowhere in this scope: typo candidates.
    let undeclared: Vec<&str> = refs
        .used
        .iter()
        .map(String::as_str)
        .filter(|name| !declared.contains(name))
        .collect();

    for (name, kind, loc) in bindings {
        if refs.used.contains(name) {
            continue;
        }
        let hint = match lumen_diagnostics::closest(name, &undeclared) {
            Some(similar) => format!(" (a reference to '{similar}' may be a typo)"),
            None => String::new(),
        };
        out.warnings.push(Diagnostic::at(
            format!("{kind} '{name}' is declared but never used{hint}"),
            loc,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn check(source: &str) -> Validation {
        validate_source(source).unwrap()
    }

    fn messages(diags: &[Diagnostic]) -> Vec<&str> {
        diags.iter().map(|d| d.message.as_str()).collect()
    }

    // =========================================================================
    // Clean programs
    // =========================================================================

    #[test]
    fn test_clean_counter() {
        let v = check(
            "page Counter:\n  state count: int = 0\n  derived doubled = count * 2\n  fn increment():\n    count += 1\n  layout col:\n    text \"{doubled}\"\n    button \"+1\" -> increment()",
        );
        assert!(v.is_clean(), "{v:?}");
    }

    #[test]
    fn test_empty_program() {
        assert!(check("").is_clean());
    }

    #[test]
    fn test_non_scope_nodes_skipped() {
        let v = check("model User:\n  name: string\nroute \"/\" -> Home");
        assert!(v.is_clean());
    }

    // =========================================================================
    // Duplicates
    // =========================================================================

    #[test]
    fn test_duplicate_state() {
        let v = check("page P:\n  state count = 0\n  state count = 1\n  text \"{count}\"");
        assert_eq!(v.errors.len(), 1);
        assert_eq!(
            v.errors[0].message,
            "Duplicate declaration of 'count' (first declared as state at line 2)"
        );
        assert_eq!(v.errors[0].line, 3);
    }

    #[test]
    fn test_duplicate_across_kinds() {
        let v = check("page P:\n  state total = 0\n  derived total = 1 + 2\n  text \"{total}\"");
        assert_eq!(v.errors.len(), 1);
        assert!(v.errors[0].message.contains("first declared as state"));
    }

    #[test]
    fn test_prop_and_state_clash() {
        let v = check("component C:\n  prop title: string\n  state title = \"x\"\n  text title");
        assert_eq!(v.errors.len(), 1);
        assert!(v.errors[0].message.contains("first declared as prop"));
    }

    #[test]
    fn test_same_name_in_different_scopes_is_fine() {
        let v = check(
            "page A:\n  state count = 0\n  text \"{count}\"\npage B:\n  state count = 0\n  text \"{count}\"",
        );
        assert!(v.is_clean());
    }

    // =========================================================================
    // Derived cycles
    // =========================================================================

    #[test]
    fn test_self_referencing_derived() {
        let v = check("page P:\n  derived total = total + 1\n  text \"{total}\"");
        assert_eq!(
            messages(&v.errors),
            vec!["Derived value 'total' depends on itself"]
        );
        assert_eq!(v.errors[0].line, 2);
    }

    #[test]
    fn test_two_node_cycle() {
        let v = check(
            "page P:\n  derived a = b + 1\n  derived b = a + 1\n  text \"{a} {b}\"",
        );
        assert_eq!(v.errors.len(), 1);
        assert!(v.errors[0].message.contains("Cycle in derived values"), "{}", v.errors[0].message);
        assert!(v.errors[0].message.contains("a -> b"));
    }

    #[test]
    fn test_cycle_reported_once() {
        let v = check(
            "page P:\n  derived a = b\n  derived b = c\n  derived c = a\n  text \"{a} {b} {c}\"",
        );
        assert_eq!(v.errors.len(), 1);
    }

    #[test]
    fn test_derived_chain_is_not_a_cycle() {
        let v = check(
            "page P:\n  state base = 1\n  derived a = base * 2\n  derived b = a * 2\n  derived c = b * 2\n  text \"{c}\"",
        );
        assert!(v.is_clean(), "{v:?}");
    }

    #[test]
    fn test_cycle_through_member_access() {
        // `b.length` still references `b`.
        let v = check("page P:\n  derived a = b.length\n  derived b = a + 1\n  text \"{a}\"");
        assert_eq!(v.errors.len(), 1);
    }

    // =========================================================================
    // Unused bindings
    // =========================================================================

    #[test]
    fn test_unused_state_warns() {
        let v = check("page P:\n  state draft = \"\"\n  text \"hello\"");
        assert_eq!(
            messages(&v.warnings),
            vec!["State 'draft' is declared but never used"]
        );
        assert!(v.errors.is_empty());
    }

    #[test]
    fn test_state_used_in_check_condition() {
        let v = check("page P:\n  state count = 0\n  check count >= 0\n  text \"ok\"");
        assert!(v.warnings.is_empty(), "{v:?}");
    }

    #[test]
    fn test_state_used_only_as_binding() {
        let v = check("page P:\n  state dark = false\n  toggle dark");
        assert!(v.warnings.is_empty(), "{v:?}");
    }

    #[test]
    fn test_state_used_in_widget_column() {
        let v = check(
            "page P:\n  state users = []\n  table rows=users:\n    column \"Name\" = row.name",
        );
        assert!(v.warnings.is_empty(), "{v:?}");
    }

    #[test]
    fn test_watch_target_counts_as_use() {
        let v = check("page P:\n  state query = \"\"\n  watch query:\n    refresh()\n  text \"x\"");
        assert!(v.warnings.is_empty(), "{v:?}");
    }

    #[test]
    fn test_unused_store_warns() {
        let v = check("page P:\n  store Cart:\n    total = 0\n  text \"hi\"");
        assert_eq!(
            messages(&v.warnings),
            vec!["Store 'Cart' is declared but never used"]
        );
    }

    #[test]
    fn test_store_used_via_member_access() {
        let v = check("page P:\n  store Cart:\n    total = 0\n  text \"{Cart.total}\"");
        assert!(v.warnings.is_empty(), "{v:?}");
    }

    #[test]
    fn test_typo_hint_on_unused_state() {
        let v = check("page P:\n  state count = 0\n  text \"{cuont}\"");
        assert_eq!(v.warnings.len(), 1);
        assert_eq!(
            v.warnings[0].message,
            "State 'count' is declared but never used (a reference to 'cuont' may be a typo)"
        );
    }

    #[test]
    fn test_no_typo_hint_when_nothing_similar() {
        let v = check("page P:\n  state count = 0\n  text \"hello\"");
        assert_eq!(
            v.warnings[0].message,
            "State 'count' is declared but never used"
        );
    }

    #[test]
    fn test_unused_props_do_not_warn() {
        // Props are a component's public API; they stay quiet.
        let v = check("component C:\n  prop title: string\n  text \"fixed\"");
        assert!(v.warnings.is_empty(), "{v:?}");
    }

    // =========================================================================
    // Aggregation
    // =========================================================================

    #[test]
    fn test_multiple_findings_collected() {
        let v = check(
            "page P:\n  state a = 0\n  state a = 1\n  state lonely = 2\n  derived loop = loop\n  text \"{a}\"",
        );
        assert_eq!(v.errors.len(), 2);
        assert_eq!(v.warnings.len(), 1);
    }

    #[test]
    fn test_deterministic_output() {
        let source =
            "page P:\n  state x = 0\n  state y = 0\n  derived a = b\n  derived b = a\n  text \"hi\"";
        assert_eq!(check(source), check(source));
    }
}
